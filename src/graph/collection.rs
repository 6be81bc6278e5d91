//! Render Volume Collection
//!
//! The only mutable shared state threaded across passes within one frame:
//! an ordered, name-keyed mapping from volume name to live volume. Stages
//! read required inputs from it and publish produced outputs into it; the
//! strictly sequential walk over the pass tree is what makes single-writer
//! access safe without locking.
//!
//! # Scoping
//!
//! Two insertion modes reflect the two lifetimes the pass tree needs:
//!
//! - [`insert`](RenderVolumeCollection::insert) publishes frame-globally.
//!   This is deliberate upward visibility: the ambient-occlusion map created
//!   inside the SSAO container is read by the ambient light pass outside it.
//! - [`insert_scoped`](RenderVolumeCollection::insert_scoped) binds the
//!   entry to the innermost iteration scope. Containers push a scope per
//!   iteration; when it pops, scoped entries vanish and any shadowed outer
//!   entry reappears. The current light and its shadow map volume live here.
//!
//! # Contract
//!
//! A missing required name is a programmer/configuration error, never a
//! silent substitution. [`get`](RenderVolumeCollection::get) fails fast and
//! lists the present keys so the broken producer/consumer ordering is
//! visible in the diagnostic. Expected absences go through
//! [`try_get`](RenderVolumeCollection::try_get).

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::errors::{RenderError, Result};
use crate::graph::volume::RenderVolume;

/// One iteration scope: the keys inserted in it and, for each, the entry it
/// shadowed (restored on pop).
#[derive(Default)]
struct ScopeFrame {
    entries: Vec<(String, Option<Arc<dyn RenderVolume>>)>,
}

/// Name-keyed set of live volumes for one frame.
#[derive(Default)]
pub struct RenderVolumeCollection {
    volumes: FxHashMap<String, Arc<dyn RenderVolume>>,
    scopes: Vec<ScopeFrame>,
}

impl RenderVolumeCollection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ── Insertion ──────────────────────────────────────────────────────────

    /// Publishes a volume frame-globally. Re-inserting a name replaces the
    /// entry; producers that refine a volume in stages (blur, temporal
    /// filter) rely on this.
    pub fn insert(&mut self, name: impl Into<String>, volume: Arc<dyn RenderVolume>) {
        self.volumes.insert(name.into(), volume);
    }

    /// Publishes a volume bound to the innermost iteration scope.
    ///
    /// Outside any scope this degrades to a frame-global insert with a
    /// warning, since there is no boundary to expire the entry at.
    pub fn insert_scoped(&mut self, name: impl Into<String>, volume: Arc<dyn RenderVolume>) {
        let name = name.into();
        let previous = self.volumes.insert(name.clone(), volume);
        if let Some(scope) = self.scopes.last_mut() {
            scope.entries.push((name, previous));
        } else {
            log::warn!("scoped insert of '{name}' outside any iteration scope");
        }
    }

    // ── Lookup ─────────────────────────────────────────────────────────────

    /// Looks up a required volume.
    ///
    /// # Errors
    ///
    /// [`RenderError::MissingVolume`] when the name is absent; the error
    /// lists the names currently present.
    pub fn get(&self, name: &str) -> Result<&Arc<dyn RenderVolume>> {
        self.volumes
            .get(name)
            .ok_or_else(|| RenderError::MissingVolume {
                name: name.to_owned(),
                present: self.volume_names(),
            })
    }

    /// Looks up a required volume and downcasts it to its concrete type.
    ///
    /// # Errors
    ///
    /// [`RenderError::MissingVolume`] when absent,
    /// [`RenderError::VolumeTypeMismatch`] when present under a different
    /// concrete type.
    pub fn get_as<T: RenderVolume>(&self, name: &str) -> Result<&T> {
        let volume = self.get(name)?;
        volume
            .as_any()
            .downcast_ref::<T>()
            .ok_or_else(|| RenderError::VolumeTypeMismatch {
                name: name.to_owned(),
                expected: std::any::type_name::<T>(),
            })
    }

    /// Optional lookup for expected absences (disabled features).
    #[must_use]
    pub fn try_get(&self, name: &str) -> Option<&Arc<dyn RenderVolume>> {
        self.volumes.get(name)
    }

    /// Optional typed lookup; `None` covers both absence and type mismatch.
    #[must_use]
    pub fn try_get_as<T: RenderVolume>(&self, name: &str) -> Option<&T> {
        self.volumes.get(name)?.as_any().downcast_ref::<T>()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.volumes.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.volumes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty()
    }

    /// Sorted listing of present names, for diagnostics.
    #[must_use]
    pub fn volume_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.volumes.keys().cloned().collect();
        names.sort();
        names
    }

    // ── Scopes ─────────────────────────────────────────────────────────────

    /// Opens an iteration scope. Containers call this once per sweep.
    pub fn push_scope(&mut self) {
        self.scopes.push(ScopeFrame::default());
    }

    /// Closes the innermost scope, expiring its entries and restoring
    /// whatever they shadowed. A pop without a matching push is ignored.
    pub fn pop_scope(&mut self) {
        let Some(scope) = self.scopes.pop() else {
            log::warn!("pop_scope without a matching push_scope");
            return;
        };
        for (name, previous) in scope.entries.into_iter().rev() {
            match previous {
                Some(shadowed) => {
                    self.volumes.insert(name, shadowed);
                }
                None => {
                    self.volumes.remove(&name);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::volume::LightVolume;
    use crate::scene::Light;
    use glam::Vec3;

    fn light_volume(index: usize) -> Arc<dyn RenderVolume> {
        Arc::new(LightVolume::new(
            Light::directional(Vec3::ONE, 1.0, Vec3::NEG_Y),
            index,
        ))
    }

    #[test]
    fn scoped_insert_expires_on_pop() {
        let mut collection = RenderVolumeCollection::new();
        collection.push_scope();
        collection.insert_scoped("currentLight", light_volume(0));
        assert!(collection.contains("currentLight"));
        collection.pop_scope();
        assert!(!collection.contains("currentLight"));
    }

    #[test]
    fn scoped_insert_shadows_and_restores_outer_entry() {
        let mut collection = RenderVolumeCollection::new();
        let outer = light_volume(7);
        collection.insert("currentLight", outer.clone());

        collection.push_scope();
        collection.insert_scoped("currentLight", light_volume(1));
        let shadowing = collection
            .get_as::<LightVolume>("currentLight")
            .expect("present");
        assert_eq!(shadowing.index(), 1);
        collection.pop_scope();

        let restored = collection.get("currentLight").expect("restored");
        assert!(Arc::ptr_eq(restored, &outer));
    }

    #[test]
    fn global_insert_inside_scope_survives_pop() {
        let mut collection = RenderVolumeCollection::new();
        collection.push_scope();
        collection.insert("ambientOcclusionMapVolume", light_volume(0));
        collection.pop_scope();
        assert!(collection.contains("ambientOcclusionMapVolume"));
    }

    #[test]
    fn missing_volume_error_lists_present_keys() {
        let mut collection = RenderVolumeCollection::new();
        collection.insert("gBufferVolume", light_volume(0));
        let err = collection.get("shadowMapVolume").unwrap_err();
        match err {
            RenderError::MissingVolume { name, present } => {
                assert_eq!(name, "shadowMapVolume");
                assert_eq!(present, vec!["gBufferVolume".to_owned()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
