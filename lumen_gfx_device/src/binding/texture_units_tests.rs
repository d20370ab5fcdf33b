use std::num::NonZeroU32;

use super::*;
use crate::native::mock_context::MockContext;
use crate::native::ApiGeneration;

fn texture(id: u32) -> Option<NativeTexture> {
    Some(NativeTexture(NonZeroU32::new(id).unwrap()))
}

#[test]
fn test_scratch_unit_is_last() {
    let table = TextureUnitTable::new(16);
    assert_eq!(table.unit_count(), 16);
    assert_eq!(table.scratch_unit(), 15);
    assert_eq!(table.active_unit(), 0);
}

#[test]
fn test_bind_same_texture_twice_is_one_call() {
    let (mut context, state) = MockContext::new(ApiGeneration::Modern);
    let mut table = TextureUnitTable::new(8);

    table.bind_on_unit(&mut context, 3, TextureTarget::Texture2D, texture(1));
    table.bind_on_unit(&mut context, 3, TextureTarget::Texture2D, texture(1));

    let state = state.borrow();
    assert_eq!(state.count("active_texture"), 1);
    assert_eq!(state.count("bind_texture"), 1);
}

#[test]
fn test_targets_are_tracked_independently() {
    let (mut context, state) = MockContext::new(ApiGeneration::Modern);
    let mut table = TextureUnitTable::new(8);

    table.bind(&mut context, TextureTarget::Texture2D, texture(1));
    table.bind(&mut context, TextureTarget::CubeMap, texture(2));

    assert_eq!(table.bound(0, TextureTarget::Texture2D), texture(1));
    assert_eq!(table.bound(0, TextureTarget::CubeMap), texture(2));
    assert_eq!(state.borrow().count("bind_texture"), 2);
    // Unit 0 is already active
    assert_eq!(state.borrow().count("active_texture"), 0);
}

#[test]
fn test_rebinding_replaces_slot() {
    let (mut context, state) = MockContext::new(ApiGeneration::Modern);
    let mut table = TextureUnitTable::new(4);

    table.bind_on_unit(&mut context, 1, TextureTarget::Texture2D, texture(1));
    table.bind_on_unit(&mut context, 1, TextureTarget::Texture2D, texture(2));

    assert_eq!(table.bound(1, TextureTarget::Texture2D), texture(2));
    assert_eq!(state.borrow().count("bind_texture"), 2);
}

#[test]
fn test_unbind_everywhere() {
    let (mut context, state) = MockContext::new(ApiGeneration::Modern);
    let mut table = TextureUnitTable::new(4);
    table.bind_on_unit(&mut context, 0, TextureTarget::Texture2D, texture(5));
    table.bind_on_unit(&mut context, 2, TextureTarget::Texture2D, texture(5));
    state.borrow_mut().clear_calls();

    table.unbind_everywhere(&mut context, NativeTexture(NonZeroU32::new(5).unwrap()));

    assert_eq!(table.bound(0, TextureTarget::Texture2D), None);
    assert_eq!(table.bound(2, TextureTarget::Texture2D), None);
    assert_eq!(state.borrow().count_exact("bind_texture(Texture2D, None)"), 2);
}

#[test]
fn test_forget_active() {
    let (mut context, _state) = MockContext::new(ApiGeneration::Modern);
    let mut table = TextureUnitTable::new(2);
    table.bind(&mut context, TextureTarget::Texture2D, texture(1));

    table.forget_active(TextureTarget::Texture2D);

    assert_eq!(table.bound(0, TextureTarget::Texture2D), None);
}

#[test]
fn test_out_of_range_unit_is_rejected() {
    let (mut context, state) = MockContext::new(ApiGeneration::Modern);
    let mut table = TextureUnitTable::new(4);

    assert!(!table.activate(&mut context, 4));
    assert!(!table.bind_on_unit(&mut context, 64, TextureTarget::Texture2D, texture(1)));

    assert_eq!(table.active_unit(), 0);
    assert!(state.borrow().calls.is_empty());
}
