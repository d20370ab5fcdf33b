use super::*;
use crate::capabilities::{Capabilities, PlatformInfo};
use crate::native::ApiGeneration;
use crate::native::mock_context::{MockContext, MockHandle};

fn setup(generation: ApiGeneration) -> (MockContext, MockHandle, Capabilities) {
    let (mut context, state) = MockContext::new(generation);
    let caps = Capabilities::probe(&mut context, &PlatformInfo::default());
    state.borrow_mut().clear_calls();
    (context, state, caps)
}

fn initialized(context: &mut MockContext, desc: TextureDesc) -> Texture {
    let mut texture = Texture::new(desc);
    texture.initialize(context, DeviceId::next(), 1).unwrap();
    texture
}

#[test]
fn test_new_texture_is_fully_dirty() {
    let texture = Texture::new(TextureDesc::default());
    assert_eq!(texture.dirty(), TextureDirty::all());
    assert!(texture.native_handle().is_none());
}

#[test]
fn test_cube_map_has_six_faces() {
    let (mut context, state, caps) = setup(ApiGeneration::Modern);
    let mut texture = initialized(&mut context, TextureDesc { target: TextureTarget::CubeMap, ..TextureDesc::default() });

    texture.upload(&mut context, &caps);

    assert_eq!(state.borrow().count("tex_image_2d"), 6);
    assert_eq!(state.borrow().count("generate_mipmap"), 1);
}

#[test]
fn test_setters_mark_only_changed_bits() {
    let (mut context, _state, caps) = setup(ApiGeneration::Modern);
    let mut texture = initialized(&mut context, TextureDesc::default());
    texture.apply_parameters(&mut context, &caps);
    texture.upload(&mut context, &caps);
    assert!(texture.dirty().is_empty());

    texture.set_mag_filter(FilterMode::Nearest);
    texture.set_mag_filter(FilterMode::Nearest);
    texture.set_address_modes(AddressMode::Repeat, AddressMode::ClampToEdge, AddressMode::Repeat);

    assert_eq!(texture.dirty(), TextureDirty::MAG_FILTER | TextureDirty::ADDRESS_V);
}

#[test]
fn test_apply_parameters_only_touches_dirty_bits() {
    let (mut context, state, caps) = setup(ApiGeneration::Modern);
    let mut texture = initialized(&mut context, TextureDesc::default());
    texture.apply_parameters(&mut context, &caps);
    state.borrow_mut().clear_calls();

    texture.set_anisotropy(8.0);
    texture.apply_parameters(&mut context, &caps);

    let state = state.borrow();
    assert_eq!(state.calls, vec!["tex_parameter(Texture2D, MaxAnisotropy(8.0))".to_string()]);
}

#[test]
fn test_anisotropy_clamped_to_capability() {
    let (mut context, state, caps) = setup(ApiGeneration::Modern);
    let mut texture = initialized(&mut context, TextureDesc { anisotropy: 64.0, ..TextureDesc::default() });

    texture.apply_parameters(&mut context, &caps);

    assert_eq!(state.borrow().count_exact("tex_parameter(Texture2D, MaxAnisotropy(16.0))"), 1);
}

#[test]
fn test_legacy_npot_clamps_and_drops_mips() {
    let (mut context, state, caps) = setup(ApiGeneration::Legacy);
    let desc = TextureDesc { width: 100, height: 60, ..TextureDesc::default() };
    let mut texture = initialized(&mut context, desc);

    texture.apply_parameters(&mut context, &caps);
    texture.upload(&mut context, &caps);

    let state = state.borrow();
    assert_eq!(state.count_exact("tex_parameter(Texture2D, MinFilter(Linear))"), 1);
    assert_eq!(state.count_exact("tex_parameter(Texture2D, WrapS(ClampToEdge))"), 1);
    assert_eq!(state.count_exact("tex_parameter(Texture2D, WrapT(ClampToEdge))"), 1);
    // Compare mode and R wrap do not exist on the legacy generation
    assert_eq!(state.count("generate_mipmap"), 0);
    assert!(!state.calls.iter().any(|c| c.contains("CompareMode") || c.contains("WrapR")));
}

#[test]
fn test_modern_npot_keeps_mips() {
    let (mut context, state, caps) = setup(ApiGeneration::Modern);
    let mut texture = initialized(&mut context, TextureDesc { width: 100, height: 60, ..TextureDesc::default() });

    texture.apply_parameters(&mut context, &caps);
    texture.upload(&mut context, &caps);

    let state = state.borrow();
    assert_eq!(state.count_exact("tex_parameter(Texture2D, MinFilter(LinearMipmapLinear))"), 1);
    assert_eq!(state.count("generate_mipmap"), 1);
}

#[test]
fn test_set_pixels_marks_upload() {
    let (mut context, state, caps) = setup(ApiGeneration::Modern);
    let mut texture = initialized(&mut context, TextureDesc { width: 2, height: 2, mipmaps: false, ..TextureDesc::default() });
    texture.upload(&mut context, &caps);

    texture.set_pixels(0, vec![255; 16]);
    assert!(texture.dirty().contains(TextureDirty::UPLOAD));
    texture.upload(&mut context, &caps);

    assert_eq!(state.borrow().count_exact("tex_image_2d(Texture2D, 0, 0, RGBA8, 2, 2, 16)"), 1);
}

#[test]
fn test_lose_context_keeps_cpu_data() {
    let (mut context, _state, _caps) = setup(ApiGeneration::Modern);
    let mut texture = initialized(&mut context, TextureDesc::default());
    texture.set_pixels(0, vec![1; 64]);

    texture.lose_context();

    assert!(texture.native_handle().is_none());
    assert_eq!(texture.dirty(), TextureDirty::all());
    assert!(texture.faces[0].is_some());
}

#[test]
fn test_destroy_deletes_native_texture() {
    let (mut context, state, _caps) = setup(ApiGeneration::Modern);
    let mut texture = initialized(&mut context, TextureDesc::default());

    texture.destroy(&mut context);
    texture.destroy(&mut context);

    assert_eq!(state.borrow().count("delete_texture"), 1);
    assert!(texture.native_handle().is_none());
}
