use super::*;
use crate::native::mock_context::MockContext;

fn firefox(os: Os, version: f32) -> PlatformInfo {
    PlatformInfo {
        os,
        browser: Some(BrowserInfo { name: BrowserName::Firefox, version }),
        user_agent: String::new(),
    }
}

// ===== PROBE =====

#[test]
fn test_modern_probe_uses_core_paths() {
    let (mut context, state) = MockContext::new(ApiGeneration::Modern);
    let caps = Capabilities::probe(&mut context, &PlatformInfo::default());

    assert!(caps.is_modern());
    assert_eq!(caps.shims.instancing, ShimPath::Core);
    assert_eq!(caps.shims.vertex_arrays, ShimPath::Core);
    assert!(caps.instancing);
    assert!(caps.texture_float_renderable);
    assert!(caps.transform_feedback);
    assert_eq!(caps.max_samples, 4);
    assert_eq!(caps.max_combined_textures, 32);
    assert_eq!(caps.max_anisotropy, 16.0);
    assert!(caps.compressed.s3tc);
    assert!(!caps.compressed.astc);
    // Modern generation never runs the read-back probe
    assert_eq!(state.borrow().count("read_pixels"), 0);
}

#[test]
fn test_legacy_probe_installs_extension_shims() {
    let (mut context, state) = MockContext::new(ApiGeneration::Legacy);
    let caps = Capabilities::probe(&mut context, &PlatformInfo::default());

    assert_eq!(caps.shims.instancing, ShimPath::Extension("ANGLE_instanced_arrays"));
    assert_eq!(caps.shims.vertex_arrays, ShimPath::Extension("OES_vertex_array_object"));
    assert_eq!(caps.shims.draw_buffers, ShimPath::Extension("WEBGL_draw_buffers"));
    assert!(caps.multiple_render_targets);
    assert_eq!(caps.max_samples, 1);
    assert!(!caps.transform_feedback);
    assert!(state.borrow().enabled_extensions.contains(&"OES_texture_float".to_string()));
}

#[test]
fn test_legacy_probe_without_instancing_extension() {
    let (mut context, state) = MockContext::new(ApiGeneration::Legacy);
    state.borrow_mut().extensions.retain(|e| e != "ANGLE_instanced_arrays" && e != "WEBGL_draw_buffers");

    let caps = Capabilities::probe(&mut context, &PlatformInfo::default());

    assert_eq!(caps.shims.instancing, ShimPath::Unavailable);
    assert!(!caps.instancing);
    assert!(!caps.multiple_render_targets);
    assert_eq!(caps.max_draw_buffers, 1);
}

#[test]
fn test_legacy_float_renderability_probe_passes_on_exact_readback() {
    let (mut context, state) = MockContext::new(ApiGeneration::Legacy);
    let caps = Capabilities::probe(&mut context, &PlatformInfo::default());

    assert!(caps.texture_float_renderable);
    assert!(caps.texture_half_float_renderable);
    let state = state.borrow();
    // One probe per float format, each cleaned up
    assert_eq!(state.count("read_pixels"), 2);
    assert_eq!(state.count("delete_framebuffer"), 2);
    assert_eq!(state.count("delete_texture"), 2);
    assert_eq!(state.count_exact("bind_framebuffer(Framebuffer, None)"), 2);
}

#[test]
fn test_legacy_float_renderability_probe_fails_on_mismatch() {
    let (mut context, state) = MockContext::new(ApiGeneration::Legacy);
    state.borrow_mut().exact_readback = false;

    let caps = Capabilities::probe(&mut context, &PlatformInfo::default());

    assert!(caps.texture_float);
    assert!(!caps.texture_float_renderable);
}

#[test]
fn test_legacy_float_probe_skips_readback_on_incomplete_framebuffer() {
    let (mut context, state) = MockContext::new(ApiGeneration::Legacy);
    state.borrow_mut().framebuffer_complete = false;

    let caps = Capabilities::probe(&mut context, &PlatformInfo::default());

    assert!(!caps.texture_float_renderable);
    assert_eq!(state.borrow().count("read_pixels"), 0);
    assert_eq!(state.borrow().count("delete_texture"), 2);
}

#[test]
fn test_high_precision_probe() {
    let (mut context, state) = MockContext::new(ApiGeneration::Modern);
    assert!(probe_float_high_precision(&mut context));

    state.borrow_mut().exact_readback = false;
    assert!(!probe_float_high_precision(&mut context));
}

#[test]
fn test_renderer_strings_masked_without_debug_extension() {
    let (mut context, state) = MockContext::new(ApiGeneration::Modern);
    state.borrow_mut().extensions.retain(|e| e != "WEBGL_debug_renderer_info");

    let caps = Capabilities::probe(&mut context, &PlatformInfo::default());

    assert!(!caps.debug_renderer_info);
    assert_eq!(caps.renderer.vendor, "Mock");
}

#[test]
fn test_supports_format() {
    let (mut context, state) = MockContext::new(ApiGeneration::Legacy);
    state.borrow_mut().extensions.retain(|e| e != "WEBGL_depth_texture");
    let caps = Capabilities::probe(&mut context, &PlatformInfo::default());

    assert!(caps.supports_format(PixelFormat::RGBA8));
    assert!(caps.supports_format(PixelFormat::RGBA32F));
    assert!(!caps.supports_format(PixelFormat::Depth16));
    assert!(!caps.supports_format(PixelFormat::DXT1));
}

// ===== WORKAROUNDS =====

#[test]
fn test_samsung_model_detection() {
    assert!(has_samsung_model("Mozilla/5.0 (Linux; Android 13; SM-S918B)"));
    assert!(!has_samsung_model("Mozilla/5.0 (Linux; Android 13; Pixel 7)"));
    assert!(!has_samsung_model("trailing SM-"));
}

#[test]
fn test_arm_on_samsung_disables_gpu_particles() {
    let renderer = RendererStrings { vendor: "ARM".to_string(), renderer: "Mali-G710".to_string() };
    let platform = PlatformInfo {
        os: Os::Android,
        browser: None,
        user_agent: "Mozilla/5.0 (Linux; Android 13; SM-S918B)".to_string(),
    };
    assert_eq!(matching_workarounds(&renderer, &platform), vec![Workaround::DisableGpuParticles]);

    let other_phone = PlatformInfo { user_agent: "Mozilla/5.0 (Linux; Android 13; Pixel 7)".to_string(), ..platform };
    assert!(matching_workarounds(&renderer, &other_phone).is_empty());
}

#[test]
fn test_mali_g52_disables_gpu_particles_anywhere() {
    let platform = PlatformInfo { user_agent: "Mozilla/5.0 (Linux; Android 12; KFRAWI)".to_string(), ..PlatformInfo::default() };
    let g52 = RendererStrings { vendor: "ARM".to_string(), renderer: "Mali-G52 MC2".to_string() };
    let g57 = RendererStrings { vendor: "ARM".to_string(), renderer: "Mali-G57 MC2".to_string() };
    let mali_400 = RendererStrings { vendor: "ARM".to_string(), renderer: "Mali-400 MP".to_string() };

    assert_eq!(matching_workarounds(&g52, &platform), vec![Workaround::DisableGpuParticles]);
    assert!(matching_workarounds(&g57, &platform).is_empty());
    assert!(matching_workarounds(&mali_400, &platform).is_empty());
}

#[test]
fn test_probe_applies_particle_workaround() {
    let (mut context, state) = MockContext::new(ApiGeneration::Modern);
    state.borrow_mut().unmasked.vendor = "ARM".to_string();
    let platform = PlatformInfo { user_agent: "Android; SM-A536B".to_string(), ..PlatformInfo::default() };

    let caps = Capabilities::probe(&mut context, &platform);

    assert!(!caps.supports_gpu_particles);
    assert!(caps.supports_msaa);
}

#[test]
fn test_firefox_windows_msaa_blocklist() {
    assert!(msaa_blocked(&firefox(Os::Windows, 120.0)));
    assert!(msaa_blocked(&firefox(Os::Windows, 131.0)));
    assert!(msaa_blocked(&firefox(Os::Windows, 115.0)));
    assert!(!msaa_blocked(&firefox(Os::Windows, 116.0)));
    assert!(!msaa_blocked(&firefox(Os::Linux, 131.0)));
    assert!(!msaa_blocked(&PlatformInfo::default()));
}
