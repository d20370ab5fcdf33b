use super::*;
use crate::native::mock_context::{MockContext, MockHandle};
use crate::native::{ApiGeneration, BlendFactor, CompareFunc, StencilOp};

fn setup() -> (StateCache, MockContext, MockHandle) {
    let (mut context, state) = MockContext::new(ApiGeneration::Modern);
    let cache = StateCache::reset(&mut context, true, (800, 600));
    state.borrow_mut().clear_calls();
    (cache, context, state)
}

// ===== RESET =====

#[test]
fn test_reset_submits_defaults() {
    let (mut context, state) = MockContext::new(ApiGeneration::Modern);
    let cache = StateCache::reset(&mut context, true, (640, 480));

    let state = state.borrow();
    assert_eq!(state.count_exact("disable(Blend)"), 1);
    assert_eq!(state.count_exact("enable(DepthTest)"), 1);
    assert_eq!(state.count_exact("disable(RasterizerDiscard)"), 1);
    assert_eq!(state.count_exact("viewport(0, 0, 640, 480)"), 1);
    assert_eq!(cache.depth_state(), DepthState::DEFAULT);
    assert_eq!(cache.cull_mode(), CullMode::Back);
    assert!(!cache.stencil_test());
}

#[test]
fn test_reset_legacy_skips_rasterizer_discard() {
    let (mut context, state) = MockContext::new(ApiGeneration::Legacy);
    StateCache::reset(&mut context, false, (1, 1));
    assert_eq!(state.borrow().count_exact("disable(RasterizerDiscard)"), 0);
}

// ===== IDEMPOTENCE =====

#[test]
fn test_blend_state_idempotent() {
    let (mut cache, mut context, state) = setup();

    cache.set_blend_state(&mut context, BlendState::ALPHA_BLEND);
    let after_first = state.borrow().calls.len();
    cache.set_blend_state(&mut context, BlendState::ALPHA_BLEND);

    assert!(after_first > 0);
    assert_eq!(state.borrow().calls.len(), after_first);
}

#[test]
fn test_blend_only_changed_aspects_are_submitted() {
    let (mut cache, mut context, state) = setup();

    let masked = BlendState::NOBLEND.with_color_mask(true, true, true, false);
    cache.set_blend_state(&mut context, masked);

    let state = state.borrow();
    assert_eq!(state.calls, vec!["color_mask(true, true, true, false)".to_string()]);
}

#[test]
fn test_blend_factors_without_equation_change() {
    let (mut cache, mut context, state) = setup();

    cache.set_blend_state(&mut context, BlendState::new(BlendFactor::One, BlendFactor::One, crate::native::BlendEquation::Add));

    let state = state.borrow();
    assert_eq!(state.count("enable"), 1);
    assert_eq!(state.count("blend_func_separate"), 1);
    assert_eq!(state.count("blend_equation_separate"), 0);
    assert_eq!(state.count("color_mask"), 0);
}

#[test]
fn test_depth_state_idempotent() {
    let (mut cache, mut context, state) = setup();

    cache.set_depth_state(&mut context, DepthState::NODEPTH);
    cache.set_depth_state(&mut context, DepthState::NODEPTH);

    let state = state.borrow();
    assert_eq!(state.count_exact("disable(DepthTest)"), 1);
    assert_eq!(state.count_exact("depth_mask(false)"), 1);
}

#[test]
fn test_cull_viewport_scissor_idempotent() {
    let (mut cache, mut context, state) = setup();

    for _ in 0..2 {
        cache.set_cull_mode(&mut context, CullMode::Front);
        cache.set_viewport(&mut context, [0, 0, 128, 64]);
        cache.set_scissor(&mut context, [8, 8, 16, 16]);
    }

    let state = state.borrow();
    assert_eq!(state.count("cull_face"), 1);
    assert_eq!(state.count("viewport"), 1);
    assert_eq!(state.count("scissor"), 1);
}

#[test]
fn test_misc_setters_idempotent() {
    let (mut cache, mut context, state) = setup();

    for _ in 0..2 {
        cache.set_blend_color(&mut context, [0.5; 4]);
        cache.set_front_face(&mut context, FrontFace::Clockwise);
        cache.set_alpha_to_coverage(&mut context, true);
        cache.set_rasterization(&mut context, false);
        cache.set_depth_bias(&mut context, true);
        cache.set_depth_bias_values(&mut context, 1.0, 2.0);
        cache.set_scissor_test(&mut context, false);
    }

    let state = state.borrow();
    assert_eq!(state.count("blend_color"), 1);
    assert_eq!(state.count("front_face"), 1);
    assert_eq!(state.count_exact("enable(SampleAlphaToCoverage)"), 1);
    assert_eq!(state.count_exact("enable(RasterizerDiscard)"), 1);
    assert_eq!(state.count_exact("enable(PolygonOffsetFill)"), 1);
    assert_eq!(state.count_exact("polygon_offset(2, 1)"), 1);
    assert_eq!(state.count_exact("disable(ScissorTest)"), 1);
}

// ===== DEPTH OVERRIDE =====

#[test]
fn test_depth_write_forces_always_pass_test() {
    let (mut cache, mut context, state) = setup();

    cache.set_depth_state(&mut context, DepthState::NODEPTH);
    state.borrow_mut().clear_calls();
    cache.set_depth_state(&mut context, DepthState::WRITEDEPTH);

    assert_eq!(cache.depth_state(), DepthState { test: true, write: true, func: CompareFunc::Always });
    let state = state.borrow();
    assert_eq!(state.count_exact("enable(DepthTest)"), 1);
    assert_eq!(state.count_exact("depth_func(Always)"), 1);
    assert_eq!(state.count_exact("depth_mask(true)"), 1);
}

#[test]
fn test_depth_disabled_without_write_leaves_test_off() {
    let (mut cache, mut context, _state) = setup();

    cache.set_depth_state(&mut context, DepthState { test: false, write: false, func: CompareFunc::Less });

    assert!(!cache.depth_state().test);
    assert!(!cache.depth_state().write);
}

// ===== STENCIL =====

#[test]
fn test_stencil_matching_faces_use_combined_calls() {
    let (mut cache, mut context, state) = setup();
    let params = StencilParameters { func: CompareFunc::Equal, reference: 1, zpass: StencilOp::Replace, ..StencilParameters::DEFAULT };

    cache.set_stencil_state(&mut context, Some(params), Some(params));
    cache.set_stencil_state(&mut context, Some(params), Some(params));

    let state = state.borrow();
    assert_eq!(state.count_exact("enable(StencilTest)"), 1);
    assert_eq!(state.count_exact("stencil_func_separate(FrontAndBack, Equal, 1, 255)"), 1);
    assert_eq!(state.count_exact("stencil_op_separate(FrontAndBack, Keep, Keep, Replace)"), 1);
    // Write mask unchanged from the default
    assert_eq!(state.count("stencil_mask_separate"), 0);
}

#[test]
fn test_stencil_distinct_faces_use_separate_calls() {
    let (mut cache, mut context, state) = setup();
    let front = StencilParameters { func: CompareFunc::Less, ..StencilParameters::DEFAULT };
    let back = StencilParameters { write_mask: 0x0F, ..StencilParameters::DEFAULT };

    cache.set_stencil_state(&mut context, Some(front), Some(back));

    let state = state.borrow();
    assert_eq!(state.count_exact("stencil_func_separate(Front, Less, 0, 255)"), 1);
    assert_eq!(state.count_exact("stencil_mask_separate(Back, 15)"), 1);
    assert_eq!(state.count("stencil_func_separate"), 1);
    assert_eq!(cache.stencil_faces(), (front, back));
}

#[test]
fn test_stencil_none_disables_test_only() {
    let (mut cache, mut context, state) = setup();
    let params = StencilParameters { reference: 3, ..StencilParameters::DEFAULT };
    cache.set_stencil_state(&mut context, Some(params), None);
    state.borrow_mut().clear_calls();

    cache.set_stencil_state(&mut context, None, None);

    assert_eq!(state.borrow().calls, vec!["disable(StencilTest)".to_string()]);
    assert!(!cache.stencil_test());
}

// ===== CULL =====

#[test]
fn test_cull_enable_tracked_separately_from_face() {
    let (mut cache, mut context, state) = setup();

    cache.set_cull_mode(&mut context, CullMode::None);
    cache.set_cull_mode(&mut context, CullMode::Back);

    let state = state.borrow();
    assert_eq!(state.count_exact("disable(CullFace)"), 1);
    assert_eq!(state.count_exact("enable(CullFace)"), 1);
    // Face was already Back, no cull_face call needed
    assert_eq!(state.count("cull_face"), 0);
}

// ===== CLEAR =====

#[test]
fn test_clear_twice_sets_color_once_but_clears_twice() {
    let (mut cache, mut context, state) = setup();
    let options = ClearOptions { color: [1.0, 0.0, 0.0, 1.0], flags: ClearFlags::COLOR, ..ClearOptions::default() };

    cache.clear(&mut context, &options);
    cache.clear(&mut context, &options);

    let state = state.borrow();
    assert_eq!(state.count("clear_color"), 1);
    assert_eq!(state.count("clear"), 2);
}

#[test]
fn test_clear_color_disables_blending() {
    let (mut cache, mut context, state) = setup();
    cache.set_blend_state(&mut context, BlendState::ALPHA_BLEND);
    state.borrow_mut().clear_calls();

    cache.clear(&mut context, &ClearOptions { flags: ClearFlags::COLOR, ..ClearOptions::default() });

    assert_eq!(cache.blend_state(), BlendState::NOBLEND);
    assert_eq!(state.borrow().count_exact("disable(Blend)"), 1);
}

#[test]
fn test_clear_depth_forces_depth_write() {
    let (mut cache, mut context, _state) = setup();
    cache.set_depth_state(&mut context, DepthState::NODEPTH);

    cache.clear(&mut context, &ClearOptions { flags: ClearFlags::DEPTH, depth: 0.5, ..ClearOptions::default() });

    assert!(cache.depth_state().write);
    assert_eq!(cache.depth_state().func, CompareFunc::Always);
}

#[test]
fn test_clear_without_flags_is_noop() {
    let (mut cache, mut context, state) = setup();
    cache.clear(&mut context, &ClearOptions { flags: ClearFlags::empty(), ..ClearOptions::default() });
    assert!(state.borrow().calls.is_empty());
}
