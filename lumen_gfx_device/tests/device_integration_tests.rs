//! Integration tests for a complete device frame
//!
//! These tests drive the public device API against the recording mock
//! context. No GPU required.
//!
//! Run with: cargo test --test device_integration_tests

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use lumen_gfx_device::lumen::device::{ColorOps, DepthStencilOps, Primitive, RenderPassDesc};
use lumen_gfx_device::lumen::native::mock_context::{MockFactory, MockHandle};
use lumen_gfx_device::lumen::native::{ApiGeneration, BufferUsage, DataType, IndexFormat, PixelFormat, PrimitiveType};
use lumen_gfx_device::lumen::resource::{
    IndexBuffer, RenderTarget, RenderTargetDesc, RenderTargetRef, Shader, ShaderDesc, ShaderRef,
    Texture, TextureDesc, VertexBuffer, VertexBufferRef, VertexElement, VertexFormat, VertexSemantic,
};
use lumen_gfx_device::lumen::{ContextSource, DeviceOptions, GraphicsDevice};

// ============================================================================
// HELPERS
// ============================================================================

fn create_device(factory: &MockFactory) -> (GraphicsDevice, MockHandle) {
    let device = GraphicsDevice::new(DeviceOptions::default(), ContextSource::Factory(factory)).unwrap();
    let state = factory.last().unwrap();
    state.borrow_mut().clear_calls();
    (device, state)
}

fn create_shader() -> ShaderRef {
    Rc::new(RefCell::new(Shader::new(ShaderDesc {
        name: "unlit".to_string(),
        attributes: vec![VertexSemantic::Position],
        ..ShaderDesc::default()
    })))
}

fn create_positions() -> VertexBufferRef {
    let format = VertexFormat::new(vec![VertexElement::new(VertexSemantic::Position, 3, DataType::Float32)], false);
    Rc::new(RefCell::new(VertexBuffer::new(format, 3, BufferUsage::Static, None)))
}

fn create_target() -> RenderTargetRef {
    let color = Rc::new(RefCell::new(Texture::new(TextureDesc {
        name: "scene_color".to_string(),
        width: 128,
        height: 128,
        format: PixelFormat::RGBA8,
        mipmaps: false,
        ..TextureDesc::default()
    })));
    Rc::new(RefCell::new(RenderTarget::new(RenderTargetDesc {
        name: "scene".to_string(),
        color_buffers: vec![color],
        ..RenderTargetDesc::default()
    })))
}

fn scene_pass(target: Option<&RenderTargetRef>) -> RenderPassDesc {
    RenderPassDesc {
        name: "scene".to_string(),
        render_target: target.cloned(),
        color_ops: vec![ColorOps { clear: true, ..ColorOps::default() }],
        depth_stencil_ops: DepthStencilOps { clear_depth: true, ..DepthStencilOps::default() },
        full_size_clear_rect: true,
    }
}

// ============================================================================
// FRAME TESTS
// ============================================================================

#[test]
fn test_integration_full_frame() {
    let factory = MockFactory::new(true, true);
    let (mut device, state) = create_device(&factory);
    let shader = create_shader();
    let positions = create_positions();
    let target = create_target();

    device.frame_start();

    let offscreen = scene_pass(Some(&target));
    device.start_pass(&offscreen);
    assert!(device.set_shader(&shader));
    device.set_vertex_buffer(&positions);
    assert!(device.draw(Primitive::new(PrimitiveType::Triangles, 0, 3), 0, false));
    device.end_pass(&offscreen);

    let onscreen = scene_pass(None);
    device.start_pass(&onscreen);
    device.set_vertex_buffer(&positions);
    assert!(device.draw(Primitive::new(PrimitiveType::Triangles, 0, 3), 0, false));
    device.end_pass(&onscreen);

    device.frame_end();

    let stats = device.last_frame_stats();
    assert_eq!(stats.render_passes, 2);
    assert_eq!(stats.draw_calls, 2);
    assert_eq!(stats.shader_switches, 1);
    assert_eq!(stats.total_primitives(), 6);

    let state = state.borrow();
    assert_eq!(state.count("draw_arrays"), 2);
    assert_eq!(state.count("create_program"), 1);
    assert_eq!(state.count_exact("viewport(0, 0, 128, 128)"), 1);
    assert_eq!(state.count_exact("viewport(0, 0, 800, 600)"), 1);
}

#[test]
fn test_integration_indexed_draw() {
    let factory = MockFactory::new(true, true);
    let (mut device, state) = create_device(&factory);
    let shader = create_shader();
    let positions = create_positions();
    let indices = Rc::new(RefCell::new(IndexBuffer::new(IndexFormat::U16, 3, BufferUsage::Static, None)));

    assert!(device.set_shader(&shader));
    device.set_vertex_buffer(&positions);
    device.set_index_buffer(Some(&indices));

    assert!(device.draw(Primitive::indexed(PrimitiveType::Triangles, 0, 3), 0, false));
    assert_eq!(state.borrow().count_exact("draw_elements(Triangles, 3, U16, 0)"), 1);
}

#[test]
fn test_integration_legacy_fallback_frame() {
    let factory = MockFactory::new(false, true);
    let (mut device, state) = create_device(&factory);
    let shader = create_shader();
    let positions = create_positions();

    assert!(!device.is_modern());
    assert_eq!(device.capabilities().generation, ApiGeneration::Legacy);

    let pass = scene_pass(None);
    device.start_pass(&pass);
    assert!(device.set_shader(&shader));
    device.set_vertex_buffer(&positions);
    assert!(device.draw(Primitive::new(PrimitiveType::Triangles, 0, 3), 0, false));
    device.end_pass(&pass);

    assert_eq!(state.borrow().count("draw_arrays"), 1);
    assert_eq!(state.borrow().count("invalidate_framebuffer"), 0);
}

#[test]
fn test_integration_frame_survives_context_loss() {
    let factory = MockFactory::new(true, true);
    let (mut device, state) = create_device(&factory);
    let shader = create_shader();
    let positions = create_positions();

    assert!(device.set_shader(&shader));
    device.set_vertex_buffer(&positions);
    assert!(device.draw(Primitive::new(PrimitiveType::Triangles, 0, 3), 0, false));

    assert!(device.debug_lose_context(Duration::ZERO));
    device.pump();

    // Same caller-owned objects, rebuilt on the new context
    assert!(device.set_shader(&shader));
    device.set_vertex_buffer(&positions);
    assert!(device.draw(Primitive::new(PrimitiveType::Triangles, 0, 3), 0, false));

    let state = state.borrow();
    assert_eq!(state.count("create_program"), 2);
    assert_eq!(state.count("draw_arrays"), 2);
}
