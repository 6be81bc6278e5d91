//! Full-tree scenarios against the stock deferred module.

mod common;

use common::{GpuEvent, RecordingDevice};
use ember_render::graph::stats::{BloomStatistics, ShadowMapStatistics, SsaoStatistics};
use ember_render::{
    Camera, FramebufferVolume, Light, RenderError, RenderModule, RenderScene, RenderSettings,
    SceneLayers,
};
use glam::Vec3;

fn test_camera() -> Camera {
    Camera::perspective(
        Vec3::new(0.0, 2.0, 6.0),
        Vec3::ZERO,
        std::f32::consts::FRAC_PI_3,
        16.0 / 9.0,
        0.1,
        100.0,
    )
}

fn test_scene() -> RenderScene {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut scene = RenderScene::new();
    scene.add_renderable("terrain", SceneLayers::STATIC);
    scene.add_renderable("character", SceneLayers::ANIMATED);
    scene.add_light(Light::directional(Vec3::ONE, 3.0, Vec3::new(-0.3, -1.0, -0.2)).with_shadows());
    scene
}

fn minimal_settings() -> RenderSettings {
    RenderSettings {
        ssao_enabled: false,
        ssao_temporal_filter_enabled: false,
        bloom_enabled: false,
        hdr_enabled: false,
        gamma_correction_enabled: false,
        ..RenderSettings::default()
    }
}

#[test]
fn default_frame_runs_the_expected_stages() {
    let scene = test_scene();
    let settings = RenderSettings::default();
    let mut device = RecordingDevice::new();
    let mut module = RenderModule::deferred();

    module.init(&mut device, &settings).expect("init succeeds");
    let frame = module
        .execute(&mut device, &scene, &test_camera(), &settings)
        .expect("frame renders");

    let framebuffer = frame
        .as_any()
        .downcast_ref::<FramebufferVolume>()
        .expect("final volume is a framebuffer");
    assert_eq!(framebuffer.label(), "lightAccumulationVolume");

    let passes = device.executed_passes();
    for expected in [
        "deferredGeometry",
        "ssaoSamplesGeneration",
        "ssao",
        "ssaoBlur",
        "ssaoTemporalFilter",
        "ambientLight",
        "directionalLightShadowMap",
        "directionalLight",
        "idle",
        "bloomBrightExtraction",
        "hdr",
        "gammaCorrection",
        "deferredBlit",
        "forward",
        "windowBlit",
    ] {
        assert!(passes.contains(&expected), "missing pass '{expected}'");
    }
    for disabled in [
        "vctAmbientOcclusion",
        "ssdo",
        "ssrTrace",
        "temporalAntialiasing",
        "textureLut",
        "gizmos",
        "spotLightShadowMap",
    ] {
        assert!(!passes.contains(&disabled), "pass '{disabled}' should be skipped");
    }

    device.assert_balanced();
}

#[test]
fn geometry_runs_before_lighting_and_composite_after() {
    let scene = test_scene();
    let settings = RenderSettings::default();
    let mut device = RecordingDevice::new();
    let mut module = RenderModule::deferred();
    module.init(&mut device, &settings).expect("init succeeds");
    module
        .execute(&mut device, &scene, &test_camera(), &settings)
        .expect("frame renders");

    let passes = device.executed_passes();
    let position = |name: &str| {
        passes
            .iter()
            .position(|pass| *pass == name)
            .unwrap_or_else(|| panic!("pass '{name}' did not run"))
    };
    assert!(position("deferredGeometry") < position("ambientLight"));
    assert!(position("ambientLight") < position("directionalLight"));
    assert!(position("directionalLightShadowMap") < position("directionalLight"));
    assert!(position("directionalLight") < position("idle"));
    assert!(position("hdr") < position("gammaCorrection"));
    assert!(position("gammaCorrection") < position("deferredBlit"));
    assert!(position("deferredBlit") < position("forward"));
    assert!(position("forward") < position("windowBlit"));
}

#[test]
fn bloom_blur_ping_pongs_the_configured_number_of_rounds() {
    let scene = test_scene();
    let settings = RenderSettings::default();
    let mut device = RecordingDevice::new();
    let mut module = RenderModule::deferred();
    module.init(&mut device, &settings).expect("init succeeds");
    module
        .execute(&mut device, &scene, &test_camera(), &settings)
        .expect("frame renders");

    assert_eq!(device.executions_of("bloomHorizontalBlur"), 5);
    assert_eq!(device.executions_of("bloomVerticalBlur"), 5);

    let bloom = module
        .statistics()
        .get::<BloomStatistics>()
        .expect("bloom ran");
    assert!(bloom.bright_pixels_volume.is_some());
    assert!(bloom.bloom_map_volume.is_some());
}

#[test]
fn all_effects_disabled_still_produces_the_frame_without_copies() {
    let scene = test_scene();
    let settings = minimal_settings();
    let mut device = RecordingDevice::new();
    let mut module = RenderModule::deferred();
    module.init(&mut device, &settings).expect("init succeeds");
    module
        .execute(&mut device, &scene, &test_camera(), &settings)
        .expect("frame renders");

    // The idle seed kept both names on the same framebuffer, so the final
    // composite copy is elided.
    assert!(
        !device
            .events
            .iter()
            .any(|event| matches!(event, GpuEvent::Blit { .. })),
        "no effect ran, nothing to copy back"
    );
    assert_eq!(device.executions_of("ssao"), 0);
    assert_eq!(device.executions_of("bloomBrightExtraction"), 0);
    assert!(device
        .events
        .iter()
        .any(|event| matches!(event, GpuEvent::BlitToWindow(_))));
    device.assert_balanced();
}

#[test]
fn shadow_casting_spot_light_gets_its_shadow_pass() {
    let mut scene = test_scene();
    scene.add_light(
        Light::spot(
            Vec3::ONE,
            2.0,
            Vec3::new(0.0, 3.0, 0.0),
            Vec3::NEG_Y,
            10.0,
            std::f32::consts::FRAC_PI_4,
        )
        .with_shadows(),
    );
    scene.add_light(Light::spot(
        Vec3::ONE,
        2.0,
        Vec3::new(2.0, 3.0, 0.0),
        Vec3::NEG_Y,
        10.0,
        std::f32::consts::FRAC_PI_4,
    ));

    let settings = RenderSettings::default();
    let mut device = RecordingDevice::new();
    let mut module = RenderModule::deferred();
    module.init(&mut device, &settings).expect("init succeeds");
    module
        .execute(&mut device, &scene, &test_camera(), &settings)
        .expect("frame renders");

    // Two spot lights, but only the shadow-casting one runs the depth pass.
    assert_eq!(device.executions_of("spotLight"), 2);
    assert_eq!(device.executions_of("spotLightShadowMap"), 1);
    assert!(
        module
            .statistics()
            .get::<ShadowMapStatistics>()
            .and_then(|stats| stats.spot_shadow_map_volume.as_ref())
            .is_some()
    );
}

#[test]
fn ssao_statistics_expose_the_chain_intermediates() {
    let scene = test_scene();
    let settings = RenderSettings::default();
    let mut device = RecordingDevice::new();
    let mut module = RenderModule::deferred();
    module.init(&mut device, &settings).expect("init succeeds");
    module
        .execute(&mut device, &scene, &test_camera(), &settings)
        .expect("frame renders");

    let ssao = module
        .statistics()
        .get::<SsaoStatistics>()
        .expect("ssao ran");
    assert!(ssao.samples_volume.is_some());
    assert!(ssao.noise_volume.is_some());
    assert!(ssao.ssao_map_volume.is_some());
    assert!(ssao.blur_map_volume.is_some());
    assert!(ssao.temporal_filter_map_volume.is_some());
}

#[test]
fn ssao_chain_runs_once_each_in_order() {
    let scene = test_scene();
    let settings = RenderSettings::default();
    let mut device = RecordingDevice::new();
    let mut module = RenderModule::deferred();
    module.init(&mut device, &settings).expect("init succeeds");
    module
        .execute(&mut device, &scene, &test_camera(), &settings)
        .expect("frame renders");

    let chain = [
        "ssaoSamplesGeneration",
        "ssaoNoiseGeneration",
        "ssao",
        "ssaoBlur",
        "ssaoTemporalFilter",
    ];
    let passes = device.executed_passes();
    let positions: Vec<usize> = chain
        .iter()
        .map(|name| {
            assert_eq!(device.executions_of(name), 1, "'{name}' must run once");
            passes.iter().position(|pass| pass == name).unwrap()
        })
        .collect();
    assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
    // The container brackets the chain under its own name, leaving the
    // occlusion pass the only "ssao" group.
    assert_eq!(device.executions_of("ssaoContainer"), 1);
}

#[test]
fn ssdo_chain_generates_its_sampling_kernel_first() {
    let scene = test_scene();
    let settings = RenderSettings {
        ssdo_enabled: true,
        ..RenderSettings::default()
    };
    let mut device = RecordingDevice::new();
    let mut module = RenderModule::deferred();
    module.init(&mut device, &settings).expect("init succeeds");
    module
        .execute(&mut device, &scene, &test_camera(), &settings)
        .expect("frame renders");

    let chain = [
        "ssdoSourceMipmaps",
        "ssdoSamplesGeneration",
        "ssdo",
        "ssdoBlur",
        "ssdoCombine",
    ];
    let passes = device.executed_passes();
    let positions: Vec<usize> = chain
        .iter()
        .map(|name| {
            assert_eq!(device.executions_of(name), 1, "'{name}' must run once");
            passes.iter().position(|pass| pass == name).unwrap()
        })
        .collect();
    assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
    // Temporal filtering stays off unless asked for.
    assert_eq!(device.executions_of("ssdoTemporalFilter"), 0);
}

#[test]
fn disabled_ssao_leaves_no_occlusion_volume_behind() {
    let scene = test_scene();
    let settings = RenderSettings {
        ssao_enabled: false,
        ..RenderSettings::default()
    };
    let mut device = RecordingDevice::new();
    let mut module = RenderModule::deferred();
    module.init(&mut device, &settings).expect("init succeeds");
    module
        .execute(&mut device, &scene, &test_camera(), &settings)
        .expect("frame renders");

    for name in [
        "ssaoSamplesGeneration",
        "ssaoNoiseGeneration",
        "ssao",
        "ssaoBlur",
        "ssaoTemporalFilter",
    ] {
        assert_eq!(device.executions_of(name), 0, "'{name}' must be skipped");
    }
    // The ambient pass must not bind the absent occlusion map.
    assert!(!device.events.iter().any(|event| matches!(
        event,
        GpuEvent::SetAttribute(name) if name == "ambientOcclusionMapVolume"
    )));
    assert!(module.statistics().get::<SsaoStatistics>().is_none());
}

#[test]
fn consumer_ordered_before_its_producer_fails_loudly() {
    // Ambient lighting reads the G-buffer; with no geometry pass in front
    // of it the missing input surfaces as a contract violation, not as a
    // silently black frame.
    use ember_render::graph::passes::framebuffer::FramebufferGenerationPass;
    use ember_render::graph::passes::lighting::ambient_light;
    use ember_render::graph::passes::post_process::OutputResolution;

    let settings = RenderSettings::default();
    let mut device = RecordingDevice::new();
    let mut module = RenderModule::new(vec![
        Box::new(
            FramebufferGenerationPass::new(
                "resultFramebufferGeneration",
                "lightAccumulationVolume",
                &[wgpu::TextureFormat::Rgba16Float],
                OutputResolution::Window,
            )
            .with_depth(),
        ),
        Box::new(ambient_light()),
    ]);
    module.init(&mut device, &settings).expect("init succeeds");

    let error = module
        .execute(&mut device, &test_scene(), &test_camera(), &settings)
        .expect_err("missing producer must fail");
    match error {
        RenderError::PassFailed { pass, source } => {
            assert_eq!(pass, "ambientLight");
            match *source {
                RenderError::MissingVolume { name, present } => {
                    assert_eq!(name, "gBufferVolume");
                    assert!(present.contains(&"lightAccumulationVolume".to_owned()));
                }
                other => panic!("expected MissingVolume, got {other}"),
            }
        }
        other => panic!("expected PassFailed, got {other}"),
    }
    device.assert_balanced();
}

#[test]
fn failed_shader_load_aborts_init_with_pass_and_path() {
    let settings = RenderSettings::default();
    let mut device = RecordingDevice::failing(vec!["ssao"]);
    let mut module = RenderModule::deferred();

    let error = module.init(&mut device, &settings).expect_err("init fails");
    match error {
        RenderError::PassFailed { source, .. } => match *source {
            RenderError::ShaderLoadFailed { pass, path, .. } => {
                assert_eq!(pass, "ssao");
                assert!(path.contains("ssao"));
            }
            other => panic!("expected ShaderLoadFailed, got {other}"),
        },
        other => panic!("expected PassFailed, got {other}"),
    }

    // A failed init leaves the module unusable.
    let error = module
        .execute(&mut device, &test_scene(), &test_camera(), &settings)
        .expect_err("execute after failed init");
    assert!(matches!(error, RenderError::NotInitialized { .. }));
}

#[test]
fn execute_before_init_is_rejected() {
    let mut device = RecordingDevice::new();
    let mut module = RenderModule::deferred();
    let error = module
        .execute(
            &mut device,
            &test_scene(),
            &test_camera(),
            &RenderSettings::default(),
        )
        .expect_err("uninitialized module");
    assert!(matches!(error, RenderError::NotInitialized { .. }));
    assert!(device.events.is_empty());
}

#[test]
fn repeated_frames_run_the_same_pass_sequence() {
    let scene = test_scene();
    let settings = RenderSettings::default();
    let mut device = RecordingDevice::new();
    let mut module = RenderModule::deferred();
    module.init(&mut device, &settings).expect("init succeeds");

    module
        .execute(&mut device, &scene, &test_camera(), &settings)
        .expect("first frame");
    let first: Vec<String> = device
        .executed_passes()
        .iter()
        .map(|s| (*s).to_owned())
        .collect();

    device.events.clear();
    module
        .execute(&mut device, &scene, &test_camera(), &settings)
        .expect("second frame");
    let second: Vec<String> = device
        .executed_passes()
        .iter()
        .map(|s| (*s).to_owned())
        .collect();

    assert_eq!(first, second);
}

#[test]
fn clear_tears_down_for_reinit_at_a_new_resolution() {
    let scene = test_scene();
    let mut settings = RenderSettings::default();
    let mut device = RecordingDevice::new();
    let mut module = RenderModule::deferred();
    module.init(&mut device, &settings).expect("init succeeds");

    module.clear(&mut device);
    let error = module
        .execute(&mut device, &scene, &test_camera(), &settings)
        .expect_err("cleared module must be re-initialized");
    assert!(matches!(error, RenderError::NotInitialized { .. }));

    settings.resolution.width = 1920;
    settings.resolution.height = 1080;
    module.init(&mut device, &settings).expect("re-init succeeds");
    module
        .execute(&mut device, &scene, &test_camera(), &settings)
        .expect("frame at the new resolution");
    device.assert_balanced();
}
