//! Volume collection contract tests: identity preservation, scoping and
//! lookup diagnostics.

use std::any::Any;
use std::sync::Arc;

use ember_render::{RenderError, RenderVolume, RenderVolumeCollection};

#[derive(Debug)]
struct MarkerVolume(u32);

impl RenderVolume for MarkerVolume {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[test]
fn lookup_returns_the_published_arc_untouched() {
    let mut volumes = RenderVolumeCollection::new();
    let published: Arc<dyn RenderVolume> = Arc::new(MarkerVolume(7));
    volumes.insert("marker", published.clone());

    let fetched = volumes.get("marker").expect("just inserted");
    assert!(Arc::ptr_eq(fetched, &published));
}

#[test]
fn typed_lookup_downcasts_or_names_the_expected_type() {
    let mut volumes = RenderVolumeCollection::new();
    volumes.insert("marker", Arc::new(MarkerVolume(3)));

    assert_eq!(volumes.get_as::<MarkerVolume>("marker").unwrap().0, 3);

    let error = volumes
        .get_as::<ember_render::FramebufferVolume>("marker")
        .unwrap_err();
    assert!(matches!(error, RenderError::VolumeTypeMismatch { .. }));
}

#[test]
fn missing_volume_error_lists_present_names() {
    let mut volumes = RenderVolumeCollection::new();
    volumes.insert("gBufferVolume", Arc::new(MarkerVolume(0)));
    volumes.insert("lightAccumulationVolume", Arc::new(MarkerVolume(1)));

    match volumes.get("shadowMapVolume").unwrap_err() {
        RenderError::MissingVolume { name, present } => {
            assert_eq!(name, "shadowMapVolume");
            assert_eq!(present, vec!["gBufferVolume", "lightAccumulationVolume"]);
        }
        other => panic!("expected MissingVolume, got {other}"),
    }
}

#[test]
fn republishing_replaces_without_touching_other_entries() {
    let mut volumes = RenderVolumeCollection::new();
    volumes.insert("rolling", Arc::new(MarkerVolume(1)));
    volumes.insert("fixed", Arc::new(MarkerVolume(9)));
    volumes.insert("rolling", Arc::new(MarkerVolume(2)));

    assert_eq!(volumes.get_as::<MarkerVolume>("rolling").unwrap().0, 2);
    assert_eq!(volumes.get_as::<MarkerVolume>("fixed").unwrap().0, 9);
    assert_eq!(volumes.len(), 2);
}

#[test]
fn scoped_entries_shadow_then_restore_frame_globals() {
    let mut volumes = RenderVolumeCollection::new();
    let outer: Arc<dyn RenderVolume> = Arc::new(MarkerVolume(1));
    volumes.insert("shadowMapVolume", outer.clone());

    volumes.push_scope();
    volumes.insert_scoped("shadowMapVolume", Arc::new(MarkerVolume(2)));
    assert_eq!(
        volumes.get_as::<MarkerVolume>("shadowMapVolume").unwrap().0,
        2
    );
    volumes.pop_scope();

    let restored = volumes.get("shadowMapVolume").expect("restored global");
    assert!(Arc::ptr_eq(restored, &outer));
}

#[test]
fn global_insert_inside_a_scope_survives_the_scope() {
    let mut volumes = RenderVolumeCollection::new();
    volumes.push_scope();
    volumes.insert("brightPixelsMapVolume", Arc::new(MarkerVolume(5)));
    volumes.insert_scoped("currentLight", Arc::new(MarkerVolume(0)));
    volumes.pop_scope();

    assert!(volumes.contains("brightPixelsMapVolume"));
    assert!(!volumes.contains("currentLight"));
}

#[test]
fn nested_scopes_unwind_in_order() {
    let mut volumes = RenderVolumeCollection::new();
    volumes.push_scope();
    volumes.insert_scoped("currentLight", Arc::new(MarkerVolume(1)));
    volumes.push_scope();
    volumes.insert_scoped("currentLight", Arc::new(MarkerVolume(2)));
    assert_eq!(volumes.get_as::<MarkerVolume>("currentLight").unwrap().0, 2);
    volumes.pop_scope();
    assert_eq!(volumes.get_as::<MarkerVolume>("currentLight").unwrap().0, 1);
    volumes.pop_scope();
    assert!(!volumes.contains("currentLight"));
}
