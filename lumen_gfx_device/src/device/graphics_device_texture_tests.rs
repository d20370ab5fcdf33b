use std::cell::RefCell;
use std::rc::Rc;

use crate::device::{ContextSource, DeviceOptions, GraphicsDevice};
use crate::native::mock_context::{MockContext, MockHandle};
use crate::native::{ApiGeneration, FilterMode, TextureTarget};
use crate::resource::{Texture, TextureDesc, TextureDirty, TextureRef};
use crate::state::BlendState;

fn device() -> (GraphicsDevice, MockHandle) {
    let (context, state) = MockContext::new(ApiGeneration::Modern);
    let device = GraphicsDevice::new(DeviceOptions::default(), ContextSource::External(Box::new(context))).unwrap();
    state.borrow_mut().clear_calls();
    (device, state)
}

fn texture() -> TextureRef {
    Rc::new(RefCell::new(Texture::new(TextureDesc::default())))
}

#[test]
fn test_first_set_creates_and_uploads() {
    let (mut device, state) = device();
    let albedo = texture();

    assert!(device.set_texture(&albedo, 0));

    let state = state.borrow();
    assert_eq!(state.count("create_texture"), 1);
    assert_eq!(state.count("tex_image_2d"), 1);
    assert_eq!(state.count("generate_mipmap"), 1);
    assert_eq!(device.stats().texture_uploads, 1);
    assert!(albedo.borrow().dirty().is_empty());
}

#[test]
fn test_same_texture_same_unit_is_free() {
    let (mut device, state) = device();
    let albedo = texture();
    device.set_texture(&albedo, 2);
    let calls = state.borrow().calls.len();

    device.set_texture(&albedo, 2);
    device.bind_texture_on_unit(&albedo, 2);

    assert_eq!(state.borrow().calls.len(), calls);
    assert_eq!(device.texture_units().active_unit(), 2);
}

#[test]
fn test_parameter_change_skips_upload() {
    let (mut device, state) = device();
    let albedo = texture();
    device.set_texture(&albedo, 0);
    state.borrow_mut().clear_calls();

    albedo.borrow_mut().set_min_filter(FilterMode::Nearest);
    device.set_texture(&albedo, 0);

    let state = state.borrow();
    assert_eq!(state.count("tex_parameter"), 1);
    assert_eq!(state.count("tex_image_2d"), 0);
    assert_eq!(state.count("bind_texture"), 0);
    assert_eq!(device.stats().texture_uploads, 1);
}

#[test]
fn test_new_pixels_upload_again() {
    let (mut device, state) = device();
    let albedo = texture();
    device.set_texture(&albedo, 0);

    albedo.borrow_mut().set_pixels(0, vec![255; 64]);
    device.set_texture(&albedo, 0);

    assert_eq!(state.borrow().count_exact("tex_image_2d(Texture2D, 0, 0, RGBA8, 4, 4, 64)"), 1);
    assert_eq!(device.stats().texture_uploads, 2);
}

#[test]
fn test_destroy_unbinds_from_every_unit() {
    let (mut device, state) = device();
    let albedo = texture();
    device.set_texture(&albedo, 0);
    device.set_texture(&albedo, 5);
    let handle = albedo.borrow().native_handle().unwrap();

    device.destroy_texture(&albedo);

    assert_eq!(state.borrow().count_exact(&format!("delete_texture({})", handle.0)), 1);
    assert_eq!(device.texture_units().bound(0, TextureTarget::Texture2D), None);
    assert_eq!(device.texture_units().bound(5, TextureTarget::Texture2D), None);
    assert!(albedo.borrow().native_handle().is_none());
}

#[test]
fn test_float_precision_check_is_memoized() {
    let (mut device, state) = device();

    assert!(device.texture_float_high_precision());
    assert!(device.texture_float_high_precision());

    let state = state.borrow();
    assert_eq!(state.count("read_pixels_f32"), 1);
    // The probe's clear color is not left behind
    assert_eq!(state.last_clear_color, device.state().clear_color());
}

#[test]
fn test_float_precision_check_detects_loss() {
    let (mut device, state) = device();
    state.borrow_mut().exact_readback = false;

    assert!(!device.texture_float_high_precision());
}

#[test]
fn test_out_of_range_unit_touches_nothing() {
    let (mut device, state) = device();
    let albedo = texture();
    let units = device.texture_units().unit_count();

    assert!(!device.set_texture(&albedo, units));
    assert!(!device.bind_texture_on_unit(&albedo, units + 32));

    assert!(state.borrow().calls.is_empty());
    assert_eq!(device.texture_units().active_unit(), 0);
    assert!(albedo.borrow().dirty().contains(TextureDirty::UPLOAD));
}

#[test]
fn test_float_precision_check_ignores_user_masks() {
    let (mut device, state) = device();
    device.set_scissor([10, 10, 4, 4]);
    device.set_blend_state(BlendState::NOWRITE);
    device.set_rasterization(false);
    state.borrow_mut().clear_calls();

    assert!(device.texture_float_high_precision());

    let state = state.borrow();
    let position = |call: &str| state.calls.iter().position(|c| c == call).unwrap();
    let clear = position("clear(ClearFlags(COLOR))");
    assert!(position("disable(ScissorTest)") < clear);
    assert!(position("disable(RasterizerDiscard)") < clear);
    assert!(position("color_mask(true, true, true, true)") < clear);

    let readback = position("read_pixels_f32(0, 0, 1, 1)");
    assert!(position("enable(ScissorTest)") > readback);
    assert!(position("enable(RasterizerDiscard)") > readback);
    assert!(position("color_mask(false, false, false, false)") > readback);
    assert_eq!(state.last_clear_color, device.state().clear_color());
}
