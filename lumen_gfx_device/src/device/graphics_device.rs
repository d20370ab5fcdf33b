/// GraphicsDevice - stateful wrapper around one native context
///
/// Owns the native context, the capability table, every state cache and the
/// binding tables. Resources are caller-owned; the device only tracks which
/// shader and render target are active through weak references.
///
/// The implementation is split across several files:
/// - `graphics_device.rs`: construction, configuration, state setters, buffers, shaders
/// - `graphics_device_texture.rs`: texture binding and upload
/// - `graphics_device_pass.rs`: render targets, passes, clears and copies
/// - `graphics_device_draw.rs`: draw submission
/// - `graphics_device_context.rs`: context loss and restore
/// - `graphics_device_readback.rs`: asynchronous pixel read-back

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Instant;
use rustc_hash::FxHashSet;

use crate::binding::{TextureUnitTable, VertexArrayCache};
use crate::capabilities::{msaa_blocked, Capabilities, PlatformInfo};
use crate::error::{Error, Result};
use crate::native::{
    ApiGeneration, ContextAttributes, ContextFactory, FrontFace, NativeContext, NativeFramebuffer,
    NativeProgram, NativeVertexArray, PowerPreference, PrimitiveType,
};
use crate::resource::{
    DeviceId, DeviceLink, IndexBufferRef, ResourceId, RenderTarget, ScopeId, Shader, ShaderRef, UniformScope, UniformValue,
    VertexBufferRef,
};
use crate::state::{BlendState, CullMode, DepthState, Rect, StateCache, StencilParameters};

pub(super) const SOURCE: &str = "lumen::GraphicsDevice";

// ============================================================================
// Configuration
// ============================================================================

/// Device construction options
#[derive(Debug, Clone)]
pub struct DeviceOptions {
    /// Drawing buffer has an alpha channel
    pub alpha: bool,
    pub depth: bool,
    pub stencil: bool,
    /// Request a multisampled drawing buffer (may be vetoed by a platform workaround)
    pub antialias: bool,
    pub premultiplied_alpha: bool,
    pub preserve_drawing_buffer: bool,
    pub power_preference: PowerPreference,
    pub fail_if_major_performance_caveat: bool,
    /// Try a modern context before falling back to a legacy one
    pub prefer_modern: bool,
    pub desynchronized: bool,
    /// Ratio of drawing-buffer pixels to surface units
    pub device_pixel_ratio: f32,
    /// Upper bound applied to `device_pixel_ratio`
    pub max_pixel_ratio: f32,
    /// Host platform, used by the workaround blocklist
    pub platform: PlatformInfo,
}

impl Default for DeviceOptions {
    fn default() -> Self {
        Self {
            alpha: true,
            depth: true,
            stencil: true,
            antialias: true,
            premultiplied_alpha: true,
            preserve_drawing_buffer: false,
            power_preference: PowerPreference::Default,
            fail_if_major_performance_caveat: false,
            prefer_modern: true,
            desynchronized: false,
            device_pixel_ratio: 1.0,
            max_pixel_ratio: 2.0,
            platform: PlatformInfo::default(),
        }
    }
}

impl DeviceOptions {
    pub(super) fn context_attributes(&self, antialias: bool) -> ContextAttributes {
        ContextAttributes {
            alpha: self.alpha,
            depth: self.depth,
            stencil: self.stencil,
            antialias,
            premultiplied_alpha: self.premultiplied_alpha,
            preserve_drawing_buffer: self.preserve_drawing_buffer,
            power_preference: self.power_preference,
            fail_if_major_performance_caveat: self.fail_if_major_performance_caveat,
            desynchronized: self.desynchronized,
        }
    }

    pub(super) fn pixel_ratio(&self) -> f32 {
        self.device_pixel_ratio.min(self.max_pixel_ratio)
    }
}

/// Where the native context comes from
pub enum ContextSource<'a> {
    /// Externally supplied context; no creation is attempted
    External(Box<dyn NativeContext>),
    /// Create a context through the factory
    Factory(&'a dyn ContextFactory),
}

/// Context lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceStatus {
    Live,
    /// Native handles are invalid; draws are skipped
    Lost,
    /// Capabilities and caches are being rebuilt
    Restoring,
}

/// Lifecycle events delivered to listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceEvent {
    ContextLost,
    ContextRestored,
    /// Drawing buffer resized (in pixels)
    Resized { width: u32, height: u32 },
}

pub type EventListener = Box<dyn FnMut(&DeviceEvent)>;

/// Per-frame counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceStats {
    pub draw_calls: u32,
    /// Primitive count per `PrimitiveType`
    pub primitives: [u32; PrimitiveType::COUNT],
    pub shader_switches: u32,
    pub render_passes: u32,
    pub vaos_created: u32,
    pub texture_uploads: u32,
}

impl DeviceStats {
    pub fn primitives_of(&self, kind: PrimitiveType) -> u32 {
        self.primitives[kind.index()]
    }

    pub fn total_primitives(&self) -> u32 {
        self.primitives.iter().fold(0, |total, count| total.saturating_add(*count))
    }

    /// Counters saturate instead of wrapping on huge instanced draws
    pub(super) fn record_draw(&mut self, kind: PrimitiveType, primitives: u32) {
        self.draw_calls = self.draw_calls.saturating_add(1);
        let slot = &mut self.primitives[kind.index()];
        *slot = slot.saturating_add(primitives);
    }
}

// ============================================================================
// GraphicsDevice
// ============================================================================

pub struct GraphicsDevice {
    pub(super) id: DeviceId,
    pub(super) native: Box<dyn NativeContext>,
    pub(super) options: DeviceOptions,
    pub(super) caps: Capabilities,
    pub(super) status: DeviceStatus,
    /// Context generation; bumped on every loss
    pub(super) generation: u64,

    // Caches
    pub(super) state: StateCache,
    pub(super) units: TextureUnitTable,
    pub(super) vertex_arrays: VertexArrayCache,
    pub(super) bound_vertex_array: Option<NativeVertexArray>,
    pub(super) bound_framebuffer: Option<NativeFramebuffer>,
    pub(super) active_program: Option<NativeProgram>,

    // Caller-owned objects
    pub(super) active_shader: Option<Weak<RefCell<Shader>>>,
    pub(super) render_target: Option<Weak<RefCell<RenderTarget>>>,
    pub(super) vertex_buffers: Vec<VertexBufferRef>,
    pub(super) index_buffer: Option<IndexBufferRef>,
    pub(super) feedback_buffer: Option<VertexBufferRef>,
    pub(super) scope: UniformScope,

    // Frame
    pub(super) inside_pass: bool,
    pub(super) stats: DeviceStats,
    pub(super) last_frame_stats: DeviceStats,
    /// Sampler names already reported missing
    pub(super) reported_samplers: FxHashSet<String>,

    pub(super) listeners: Vec<EventListener>,
    pub(super) restore_deadline: Option<Instant>,
    /// Memoized float precision probe (per context lifetime)
    pub(super) high_precision: Option<bool>,
}

impl GraphicsDevice {
    /// Create a device
    ///
    /// # Errors
    ///
    /// `Error::InitializationFailed` when the factory cannot create a context
    /// of any requested generation.
    pub fn new(options: DeviceOptions, source: ContextSource<'_>) -> Result<Self> {
        let antialias = options.antialias && !msaa_blocked(&options.platform);
        if options.antialias && !antialias {
            crate::gfx_info!(SOURCE, "Antialiasing disabled on this platform");
        }
        let attributes = options.context_attributes(antialias);

        let mut native = match source {
            ContextSource::External(native) => native,
            ContextSource::Factory(factory) => create_native(factory, options.prefer_modern, &attributes)?,
        };

        let caps = Capabilities::probe(native.as_mut(), &options.platform);
        let size = native.drawing_buffer_size();
        let state = StateCache::reset(native.as_mut(), caps.is_modern(), size);
        let units = TextureUnitTable::new(caps.max_combined_textures);

        crate::gfx_info!(
            SOURCE,
            "Device created: {:?} context, {}x{} drawing buffer, renderer '{}'",
            caps.generation,
            size.0,
            size.1,
            caps.renderer.renderer
        );

        Ok(Self {
            id: DeviceId::next(),
            native,
            options,
            caps,
            status: DeviceStatus::Live,
            generation: 1,
            state,
            units,
            vertex_arrays: VertexArrayCache::new(),
            bound_vertex_array: None,
            bound_framebuffer: None,
            active_program: None,
            active_shader: None,
            render_target: None,
            vertex_buffers: Vec::new(),
            index_buffer: None,
            feedback_buffer: None,
            scope: UniformScope::new(),
            inside_pass: false,
            stats: DeviceStats::default(),
            last_frame_stats: DeviceStats::default(),
            reported_samplers: FxHashSet::default(),
            listeners: Vec::new(),
            restore_deadline: None,
            high_precision: None,
        })
    }

    // ===== ACCESSORS =====

    pub fn id(&self) -> DeviceId {
        self.id
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    pub fn options(&self) -> &DeviceOptions {
        &self.options
    }

    pub fn status(&self) -> DeviceStatus {
        self.status
    }

    pub fn is_modern(&self) -> bool {
        self.caps.is_modern()
    }

    /// Drawing-buffer width in pixels
    pub fn width(&self) -> u32 {
        self.native.drawing_buffer_size().0
    }

    /// Drawing-buffer height in pixels
    pub fn height(&self) -> u32 {
        self.native.drawing_buffer_size().1
    }

    pub fn state(&self) -> &StateCache {
        &self.state
    }

    pub fn texture_units(&self) -> &TextureUnitTable {
        &self.units
    }

    pub fn vertex_array_cache(&self) -> &VertexArrayCache {
        &self.vertex_arrays
    }

    pub fn scope(&self) -> &UniformScope {
        &self.scope
    }

    pub fn scope_mut(&mut self) -> &mut UniformScope {
        &mut self.scope
    }

    /// Publish a uniform or sampler value by name
    pub fn set_uniform(&mut self, name: &str, value: UniformValue) -> ScopeId {
        self.scope.set(name, value)
    }

    /// Direct access to the native context
    ///
    /// Calls made through it bypass every cache; callers must restore any
    /// state they touch.
    pub fn native_mut(&mut self) -> &mut dyn NativeContext {
        self.native.as_mut()
    }

    // ===== FIXED-FUNCTION STATE =====

    pub fn set_blend_state(&mut self, blend: BlendState) {
        self.debug_assert_live();
        self.state.set_blend_state(self.native.as_mut(), blend);
    }

    pub fn set_blend_color(&mut self, color: [f32; 4]) {
        self.debug_assert_live();
        self.state.set_blend_color(self.native.as_mut(), color);
    }

    pub fn set_alpha_to_coverage(&mut self, enabled: bool) {
        self.debug_assert_live();
        self.state.set_alpha_to_coverage(self.native.as_mut(), enabled);
    }

    pub fn set_depth_state(&mut self, depth: DepthState) {
        self.debug_assert_live();
        self.state.set_depth_state(self.native.as_mut(), depth);
    }

    pub fn set_depth_bias(&mut self, enabled: bool) {
        self.debug_assert_live();
        self.state.set_depth_bias(self.native.as_mut(), enabled);
    }

    pub fn set_depth_bias_values(&mut self, constant: f32, slope: f32) {
        self.debug_assert_live();
        self.state.set_depth_bias_values(self.native.as_mut(), constant, slope);
    }

    pub fn set_stencil_test(&mut self, enabled: bool) {
        self.debug_assert_live();
        self.state.set_stencil_test(self.native.as_mut(), enabled);
    }

    /// `None` for both faces disables the stencil test
    pub fn set_stencil_state(&mut self, front: Option<StencilParameters>, back: Option<StencilParameters>) {
        self.debug_assert_live();
        self.state.set_stencil_state(self.native.as_mut(), front, back);
    }

    pub fn set_cull_mode(&mut self, mode: CullMode) {
        self.debug_assert_live();
        self.state.set_cull_mode(self.native.as_mut(), mode);
    }

    pub fn set_front_face(&mut self, front_face: FrontFace) {
        self.debug_assert_live();
        self.state.set_front_face(self.native.as_mut(), front_face);
    }

    /// Disable rasterization (transform feedback only passes). Modern contexts only.
    pub fn set_rasterization(&mut self, enabled: bool) {
        self.debug_assert_live();
        if self.caps.is_modern() {
            self.state.set_rasterization(self.native.as_mut(), enabled);
        }
    }

    pub fn set_viewport(&mut self, rect: Rect) {
        self.debug_assert_live();
        self.state.set_viewport(self.native.as_mut(), rect);
    }

    pub fn set_scissor(&mut self, rect: Rect) {
        self.debug_assert_live();
        self.state.set_scissor(self.native.as_mut(), rect);
    }

    pub fn set_scissor_test(&mut self, enabled: bool) {
        self.debug_assert_live();
        self.state.set_scissor_test(self.native.as_mut(), enabled);
    }

    // ===== SHADERS =====

    /// Make `shader` the active program, linking it on first use
    ///
    /// Returns `false` when the shader failed to link; the previous program
    /// stays active.
    pub fn set_shader(&mut self, shader: &ShaderRef) -> bool {
        self.debug_assert_live();
        let mut borrowed = shader.borrow_mut();
        if !self.check_owner(borrowed.link, "Shader", borrowed.id()) {
            return false;
        }

        if !borrowed.link.is_current(self.id, self.generation) {
            borrowed.lose_context();
        }
        if borrowed.failed() {
            return false;
        }
        if !borrowed.is_linked() && borrowed.link(self.native.as_mut(), &mut self.scope, self.id, self.generation).is_err() {
            return false;
        }

        let program = borrowed.program();
        if self.active_program != program {
            self.native.use_program(program);
            self.active_program = program;
            self.stats.shader_switches += 1;
        }
        self.active_shader = Some(Rc::downgrade(shader));
        true
    }

    pub fn destroy_shader(&mut self, shader: &ShaderRef) {
        let mut shader = shader.borrow_mut();
        if !self.check_owner(shader.link, "Shader", shader.id()) {
            return;
        }
        if shader.program().is_some() && shader.program() == self.active_program {
            self.native.use_program(None);
            self.active_program = None;
            self.active_shader = None;
        }
        if shader.link.is_current(self.id, self.generation) {
            shader.destroy(self.native.as_mut());
        } else {
            shader.lose_context();
        }
    }

    // ===== BUFFERS =====

    /// Queue a vertex buffer for the next draw
    pub fn set_vertex_buffer(&mut self, buffer: &VertexBufferRef) {
        self.debug_assert_live();
        let link = buffer.borrow().link();
        if self.check_owner(link, "Vertex buffer", buffer.borrow().id()) {
            self.vertex_buffers.push(buffer.clone());
        }
    }

    /// Index buffer for the next indexed draw (`None` to clear)
    pub fn set_index_buffer(&mut self, buffer: Option<&IndexBufferRef>) {
        self.debug_assert_live();
        if let Some(buffer) = buffer {
            let buffer = buffer.borrow();
            if !self.check_owner(buffer.link(), "Index buffer", buffer.id()) {
                return;
            }
        }
        self.index_buffer = buffer.cloned();
    }

    /// Output buffer captured by transform feedback on the next draws
    pub fn set_transform_feedback_buffer(&mut self, buffer: Option<&VertexBufferRef>) {
        self.debug_assert_live();
        if buffer.is_some() && !self.caps.transform_feedback {
            crate::gfx_warn!(SOURCE, "Transform feedback is not supported by this context");
            return;
        }
        self.feedback_buffer = buffer.cloned();
    }

    pub fn clear_vertex_buffers(&mut self) {
        self.vertex_buffers.clear();
    }

    pub fn destroy_vertex_buffer(&mut self, buffer: &VertexBufferRef) {
        let mut buffer = buffer.borrow_mut();
        if !self.check_owner(buffer.link(), "Vertex buffer", buffer.id()) {
            return;
        }
        if !buffer.link().is_current(self.id, self.generation) {
            buffer.lose_context();
            return;
        }
        if buffer.vertex_array().is_some() && buffer.vertex_array() == self.bound_vertex_array {
            self.bind_vertex_array(None);
        }
        if self.vertex_arrays.remove_buffer(self.native.as_mut(), buffer.id()) {
            self.bind_vertex_array(None);
        }
        buffer.destroy(self.native.as_mut());
    }

    pub fn destroy_index_buffer(&mut self, buffer: &IndexBufferRef) {
        let mut buffer = buffer.borrow_mut();
        if !self.check_owner(buffer.link(), "Index buffer", buffer.id()) {
            return;
        }
        if buffer.link().is_current(self.id, self.generation) {
            buffer.destroy(self.native.as_mut());
        } else {
            buffer.lose_context();
        }
    }

    pub(super) fn bind_vertex_array(&mut self, vertex_array: Option<NativeVertexArray>) {
        if self.bound_vertex_array != vertex_array {
            self.native.bind_vertex_array(vertex_array);
            self.bound_vertex_array = vertex_array;
        }
    }

    /// Unbind any vertex array so element-array uploads do not leak into it
    pub(super) fn unbind_vertex_array_for_upload(&mut self) {
        if self.caps.vertex_arrays {
            self.bind_vertex_array(None);
        }
    }

    // ===== SIZE =====

    /// Resize the surface (in surface units)
    ///
    /// The drawing buffer is scaled by the device pixel ratio, capped by
    /// `max_pixel_ratio`. Fires `Resized` when the drawing buffer changed.
    pub fn resize(&mut self, width: u32, height: u32) {
        let ratio = self.options.pixel_ratio();
        let pixel_width = (width as f32 * ratio).floor() as u32;
        let pixel_height = (height as f32 * ratio).floor() as u32;

        if self.native.drawing_buffer_size() != (pixel_width, pixel_height) {
            self.native.resize_drawing_buffer(pixel_width, pixel_height);
            let (width, height) = self.native.drawing_buffer_size();
            crate::gfx_debug!(SOURCE, "Drawing buffer resized to {}x{}", width, height);
            self.fire(DeviceEvent::Resized { width, height });
        }
    }

    pub fn set_device_pixel_ratio(&mut self, ratio: f32) {
        self.options.device_pixel_ratio = ratio;
    }

    // ===== EVENTS =====

    pub fn on_event(&mut self, listener: EventListener) {
        self.listeners.push(listener);
    }

    pub(super) fn fire(&mut self, event: DeviceEvent) {
        for listener in &mut self.listeners {
            listener(&event);
        }
    }

    // ===== FRAME STATS =====

    /// Reset the per-frame counters
    pub fn frame_start(&mut self) {
        self.stats = DeviceStats::default();
    }

    /// Publish the counters of the frame that just ended
    pub fn frame_end(&mut self) {
        self.last_frame_stats = self.stats;
    }

    /// Counters of the frame in progress
    pub fn stats(&self) -> &DeviceStats {
        &self.stats
    }

    pub fn last_frame_stats(&self) -> &DeviceStats {
        &self.last_frame_stats
    }

    // ===== DESTRUCTION =====

    /// Release the device-owned GPU objects (vertex arrays, bindings)
    ///
    /// Caller-owned resources are released through their `destroy_*` calls.
    pub fn destroy(&mut self) {
        self.bind_vertex_array(None);
        self.vertex_arrays.destroy(self.native.as_mut());
        self.native.use_program(None);
        self.active_program = None;
        self.active_shader = None;
        self.render_target = None;
        self.vertex_buffers.clear();
        self.index_buffer = None;
        self.feedback_buffer = None;
        crate::gfx_debug!(SOURCE, "Device destroyed");
    }

    // ===== INTERNAL =====

    /// `false` (with a debug diagnostic) when a resource belongs to another device
    pub(super) fn check_owner(&self, link: DeviceLink, kind: &str, id: ResourceId) -> bool {
        if link.accepts(self.id) {
            return true;
        }
        if cfg!(debug_assertions) {
            crate::gfx_warn!(SOURCE, "{} #{} belongs to another device; ignored", kind, id.value());
        }
        false
    }

    pub(super) fn debug_assert_live(&self) {
        debug_assert!(
            self.status == DeviceStatus::Live,
            "device state changed while the context is {:?}",
            self.status
        );
    }
}

/// Ask the factory for a modern context (when preferred), then a legacy one
fn create_native(
    factory: &dyn ContextFactory,
    prefer_modern: bool,
    attributes: &ContextAttributes,
) -> Result<Box<dyn NativeContext>> {
    let generations: &[ApiGeneration] = if prefer_modern {
        &[ApiGeneration::Modern, ApiGeneration::Legacy]
    } else {
        &[ApiGeneration::Legacy]
    };

    for &generation in generations {
        if let Some(native) = factory.create_context(generation, attributes) {
            return Ok(native);
        }
        crate::gfx_warn!(SOURCE, "{:?} context unavailable", generation);
    }

    let message = String::from("No compatible graphics context could be created");
    crate::gfx_error!(SOURCE, "{}", message);
    Err(Error::InitializationFailed(message))
}

#[cfg(test)]
#[path = "graphics_device_tests.rs"]
mod tests;
