//! Recording native context for tests and headless runs (no GPU required)
//!
//! Every call is appended to a shared call log as `name(args)` so tests can
//! count how many native calls a device operation issued.

use std::cell::RefCell;
use std::num::NonZeroU32;
use std::rc::Rc;
use rustc_hash::FxHashMap;

use crate::native::context::{ContextAttributes, ContextFactory, NativeContext};
use crate::native::types::*;

/// Mutable state shared between a `MockContext` and the test that created it
pub struct MockState {
    pub calls: Vec<String>,
    pub generation: ApiGeneration,
    pub extensions: Vec<String>,
    pub enabled_extensions: Vec<String>,
    pub limits: FxHashMap<Limit, i32>,
    pub max_anisotropy: f32,
    pub masked: RendererStrings,
    pub unmasked: RendererStrings,
    pub drawing_buffer: (u32, u32),
    pub lost: bool,
    pub supports_lose_context: bool,
    /// Uniforms reported for every linked program
    pub program_uniforms: Vec<ActiveUniform>,
    pub fail_program_link: bool,
    pub fail_renderbuffer_creation: bool,
    pub framebuffer_complete: bool,
    /// When false, read-backs return garbage instead of the last clear color
    pub exact_readback: bool,
    /// Number of `client_wait_sync` polls before a fence signals
    pub fence_polls_before_signal: u32,
    pub fence_polls: u32,
    pub last_clear_color: [f32; 4],
    next_handle: u32,
}

impl MockState {
    fn new(generation: ApiGeneration) -> Self {
        let mut limits = FxHashMap::default();
        limits.insert(Limit::MaxTextureSize, 4096);
        limits.insert(Limit::MaxCubeMapSize, 4096);
        limits.insert(Limit::MaxRenderbufferSize, 4096);
        limits.insert(Limit::MaxTextureImageUnits, 16);
        limits.insert(Limit::MaxCombinedTextureImageUnits, 32);
        limits.insert(Limit::MaxVertexTextureImageUnits, 16);
        limits.insert(Limit::MaxVertexUniformVectors, 256);
        limits.insert(Limit::MaxFragmentUniformVectors, 224);
        limits.insert(Limit::MaxDrawBuffers, 8);
        limits.insert(Limit::MaxColorAttachments, 8);
        limits.insert(Limit::MaxSamples, 4);
        limits.insert(Limit::Max3dTextureSize, 2048);
        limits.insert(Limit::MaxArrayTextureLayers, 256);

        let extensions = match generation {
            ApiGeneration::Modern => vec![
                "EXT_color_buffer_float",
                "EXT_texture_filter_anisotropic",
                "WEBGL_compressed_texture_s3tc",
                "WEBGL_debug_renderer_info",
                "OES_texture_float_linear",
                "WEBGL_lose_context",
            ],
            ApiGeneration::Legacy => vec![
                "ANGLE_instanced_arrays",
                "OES_vertex_array_object",
                "WEBGL_draw_buffers",
                "OES_texture_float",
                "OES_texture_half_float",
                "WEBGL_depth_texture",
                "OES_element_index_uint",
                "EXT_texture_filter_anisotropic",
                "WEBGL_debug_renderer_info",
                "WEBGL_lose_context",
            ],
        };

        Self {
            calls: Vec::new(),
            generation,
            extensions: extensions.into_iter().map(String::from).collect(),
            enabled_extensions: Vec::new(),
            limits,
            max_anisotropy: 16.0,
            masked: RendererStrings { vendor: "Mock".to_string(), renderer: "Mock Renderer".to_string() },
            unmasked: RendererStrings { vendor: "Mock Vendor".to_string(), renderer: "Mock GPU 1000".to_string() },
            drawing_buffer: (800, 600),
            lost: false,
            supports_lose_context: true,
            program_uniforms: Vec::new(),
            fail_program_link: false,
            fail_renderbuffer_creation: false,
            framebuffer_complete: true,
            exact_readback: true,
            fence_polls_before_signal: 2,
            fence_polls: 0,
            last_clear_color: [0.0; 4],
            next_handle: 1,
        }
    }

    /// Number of recorded calls to the named entry point
    pub fn count(&self, name: &str) -> usize {
        self.calls
            .iter()
            .filter(|call| call.as_str() == name || call.strip_prefix(name).is_some_and(|rest| rest.starts_with('(')))
            .count()
    }

    /// Number of recorded calls exactly matching `call`
    pub fn count_exact(&self, call: &str) -> usize {
        self.calls.iter().filter(|c| c.as_str() == call).count()
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    fn handle(&mut self) -> NonZeroU32 {
        let id = self.next_handle;
        self.next_handle += 1;
        NonZeroU32::new(id).unwrap_or(NonZeroU32::MIN)
    }
}

/// Shared handle to a mock's state
pub type MockHandle = Rc<RefCell<MockState>>;

/// Recording `NativeContext`
pub struct MockContext {
    state: MockHandle,
}

impl MockContext {
    pub fn new(generation: ApiGeneration) -> (Self, MockHandle) {
        let state = Rc::new(RefCell::new(MockState::new(generation)));
        (Self { state: state.clone() }, state)
    }

    fn record(&self, call: String) {
        self.state.borrow_mut().calls.push(call);
    }
}

impl NativeContext for MockContext {
    fn api_generation(&self) -> ApiGeneration {
        self.state.borrow().generation
    }

    fn supported_extensions(&self) -> Vec<String> {
        self.state.borrow().extensions.clone()
    }

    fn enable_extension(&mut self, name: &str) -> bool {
        let mut state = self.state.borrow_mut();
        if state.extensions.iter().any(|e| e == name) {
            state.enabled_extensions.push(name.to_string());
            true
        } else {
            false
        }
    }

    fn limit(&self, limit: Limit) -> i32 {
        self.state.borrow().limits.get(&limit).copied().unwrap_or(0)
    }

    fn max_anisotropy(&self) -> f32 {
        self.state.borrow().max_anisotropy
    }

    fn renderer_strings(&self, unmasked: bool) -> RendererStrings {
        let state = self.state.borrow();
        if unmasked { state.unmasked.clone() } else { state.masked.clone() }
    }

    fn drawing_buffer_size(&self) -> (u32, u32) {
        self.state.borrow().drawing_buffer
    }

    fn resize_drawing_buffer(&mut self, width: u32, height: u32) {
        self.record(format!("resize_drawing_buffer({}, {})", width, height));
        self.state.borrow_mut().drawing_buffer = (width, height);
    }

    fn is_context_lost(&self) -> bool {
        self.state.borrow().lost
    }

    fn lose_context(&mut self) -> bool {
        self.record("lose_context".to_string());
        let mut state = self.state.borrow_mut();
        if state.supports_lose_context {
            state.lost = true;
        }
        state.supports_lose_context
    }

    fn restore_context(&mut self) -> bool {
        self.record("restore_context".to_string());
        let mut state = self.state.borrow_mut();
        state.lost = false;
        true
    }

    fn enable(&mut self, capability: Capability) {
        self.record(format!("enable({:?})", capability));
    }

    fn disable(&mut self, capability: Capability) {
        self.record(format!("disable({:?})", capability));
    }

    fn blend_equation_separate(&mut self, color: BlendEquation, alpha: BlendEquation) {
        self.record(format!("blend_equation_separate({:?}, {:?})", color, alpha));
    }

    fn blend_func_separate(&mut self, src_color: BlendFactor, dst_color: BlendFactor, src_alpha: BlendFactor, dst_alpha: BlendFactor) {
        self.record(format!("blend_func_separate({:?}, {:?}, {:?}, {:?})", src_color, dst_color, src_alpha, dst_alpha));
    }

    fn blend_color(&mut self, color: [f32; 4]) {
        self.record(format!("blend_color({:?})", color));
    }

    fn color_mask(&mut self, red: bool, green: bool, blue: bool, alpha: bool) {
        self.record(format!("color_mask({}, {}, {}, {})", red, green, blue, alpha));
    }

    fn depth_mask(&mut self, write: bool) {
        self.record(format!("depth_mask({})", write));
    }

    fn depth_func(&mut self, func: CompareFunc) {
        self.record(format!("depth_func({:?})", func));
    }

    fn polygon_offset(&mut self, factor: f32, units: f32) {
        self.record(format!("polygon_offset({}, {})", factor, units));
    }

    fn stencil_func_separate(&mut self, face: Face, func: CompareFunc, reference: i32, mask: u32) {
        self.record(format!("stencil_func_separate({:?}, {:?}, {}, {})", face, func, reference, mask));
    }

    fn stencil_op_separate(&mut self, face: Face, fail: StencilOp, zfail: StencilOp, zpass: StencilOp) {
        self.record(format!("stencil_op_separate({:?}, {:?}, {:?}, {:?})", face, fail, zfail, zpass));
    }

    fn stencil_mask_separate(&mut self, face: Face, mask: u32) {
        self.record(format!("stencil_mask_separate({:?}, {})", face, mask));
    }

    fn cull_face(&mut self, face: Face) {
        self.record(format!("cull_face({:?})", face));
    }

    fn front_face(&mut self, front_face: FrontFace) {
        self.record(format!("front_face({:?})", front_face));
    }

    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.record(format!("viewport({}, {}, {}, {})", x, y, width, height));
    }

    fn scissor(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.record(format!("scissor({}, {}, {}, {})", x, y, width, height));
    }

    fn clear_color(&mut self, color: [f32; 4]) {
        self.record(format!("clear_color({:?})", color));
        self.state.borrow_mut().last_clear_color = color;
    }

    fn clear_depth(&mut self, depth: f32) {
        self.record(format!("clear_depth({})", depth));
    }

    fn clear_stencil(&mut self, stencil: i32) {
        self.record(format!("clear_stencil({})", stencil));
    }

    fn clear(&mut self, flags: ClearFlags) {
        self.record(format!("clear({:?})", flags));
    }

    fn create_texture(&mut self) -> Result<NativeTexture, String> {
        self.record("create_texture".to_string());
        Ok(NativeTexture(self.state.borrow_mut().handle()))
    }

    fn delete_texture(&mut self, texture: NativeTexture) {
        self.record(format!("delete_texture({})", texture.0));
    }

    fn active_texture(&mut self, unit: u32) {
        self.record(format!("active_texture({})", unit));
    }

    fn bind_texture(&mut self, target: TextureTarget, texture: Option<NativeTexture>) {
        self.record(format!("bind_texture({:?}, {:?})", target, texture.map(|t| t.0)));
    }

    fn tex_parameter(&mut self, target: TextureTarget, parameter: TextureParameter) {
        self.record(format!("tex_parameter({:?}, {:?})", target, parameter));
    }

    fn tex_image_2d(&mut self, target: TextureTarget, face: u32, level: u32, format: PixelFormat, width: u32, height: u32, data: Option<&[u8]>) {
        self.record(format!(
            "tex_image_2d({:?}, {}, {}, {:?}, {}, {}, {})",
            target, face, level, format, width, height, data.map_or(0, |d| d.len())
        ));
    }

    fn tex_image_3d(&mut self, target: TextureTarget, level: u32, format: PixelFormat, width: u32, height: u32, depth: u32, data: Option<&[u8]>) {
        self.record(format!(
            "tex_image_3d({:?}, {}, {:?}, {}, {}, {}, {})",
            target, level, format, width, height, depth, data.map_or(0, |d| d.len())
        ));
    }

    fn generate_mipmap(&mut self, target: TextureTarget) {
        self.record(format!("generate_mipmap({:?})", target));
    }

    fn copy_tex_sub_image_2d(&mut self, target: TextureTarget, level: u32, width: u32, height: u32) {
        self.record(format!("copy_tex_sub_image_2d({:?}, {}, {}, {})", target, level, width, height));
    }

    fn create_buffer(&mut self) -> Result<NativeBuffer, String> {
        self.record("create_buffer".to_string());
        Ok(NativeBuffer(self.state.borrow_mut().handle()))
    }

    fn delete_buffer(&mut self, buffer: NativeBuffer) {
        self.record(format!("delete_buffer({})", buffer.0));
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<NativeBuffer>) {
        self.record(format!("bind_buffer({:?}, {:?})", target, buffer.map(|b| b.0)));
    }

    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], usage: BufferUsage) {
        self.record(format!("buffer_data({:?}, {}, {:?})", target, data.len(), usage));
    }

    fn buffer_storage(&mut self, target: BufferTarget, size: usize, usage: BufferUsage) {
        self.record(format!("buffer_storage({:?}, {}, {:?})", target, size, usage));
    }

    fn get_buffer_sub_data(&mut self, target: BufferTarget, offset: usize, dst: &mut [u8]) {
        self.record(format!("get_buffer_sub_data({:?}, {}, {})", target, offset, dst.len()));
        dst.fill(7);
    }

    fn bind_buffer_base(&mut self, target: BufferTarget, index: u32, buffer: Option<NativeBuffer>) {
        self.record(format!("bind_buffer_base({:?}, {}, {:?})", target, index, buffer.map(|b| b.0)));
    }

    fn create_vertex_array(&mut self) -> Result<NativeVertexArray, String> {
        self.record("create_vertex_array".to_string());
        Ok(NativeVertexArray(self.state.borrow_mut().handle()))
    }

    fn delete_vertex_array(&mut self, vertex_array: NativeVertexArray) {
        self.record(format!("delete_vertex_array({})", vertex_array.0));
    }

    fn bind_vertex_array(&mut self, vertex_array: Option<NativeVertexArray>) {
        self.record(format!("bind_vertex_array({:?})", vertex_array.map(|v| v.0)));
    }

    fn enable_vertex_attrib_array(&mut self, location: u32) {
        self.record(format!("enable_vertex_attrib_array({})", location));
    }

    fn vertex_attrib_pointer(&mut self, location: u32, components: u32, data_type: DataType, normalize: bool, stride: u32, offset: u32) {
        self.record(format!(
            "vertex_attrib_pointer({}, {}, {:?}, {}, {}, {})",
            location, components, data_type, normalize, stride, offset
        ));
    }

    fn vertex_attrib_i_pointer(&mut self, location: u32, components: u32, data_type: DataType, stride: u32, offset: u32) {
        self.record(format!("vertex_attrib_i_pointer({}, {}, {:?}, {}, {})", location, components, data_type, stride, offset));
    }

    fn vertex_attrib_divisor(&mut self, location: u32, divisor: u32) {
        self.record(format!("vertex_attrib_divisor({}, {})", location, divisor));
    }

    fn create_framebuffer(&mut self) -> Result<NativeFramebuffer, String> {
        self.record("create_framebuffer".to_string());
        Ok(NativeFramebuffer(self.state.borrow_mut().handle()))
    }

    fn delete_framebuffer(&mut self, framebuffer: NativeFramebuffer) {
        self.record(format!("delete_framebuffer({})", framebuffer.0));
    }

    fn bind_framebuffer(&mut self, target: FramebufferTarget, framebuffer: Option<NativeFramebuffer>) {
        self.record(format!("bind_framebuffer({:?}, {:?})", target, framebuffer.map(|f| f.0)));
    }

    fn framebuffer_texture_2d(&mut self, attachment: Attachment, target: TextureTarget, face: u32, texture: Option<NativeTexture>, level: u32) {
        self.record(format!(
            "framebuffer_texture_2d({:?}, {:?}, {}, {:?}, {})",
            attachment, target, face, texture.map(|t| t.0), level
        ));
    }

    fn create_renderbuffer(&mut self) -> Result<NativeRenderbuffer, String> {
        self.record("create_renderbuffer".to_string());
        let mut state = self.state.borrow_mut();
        if state.fail_renderbuffer_creation {
            return Err("mock renderbuffer failure".to_string());
        }
        Ok(NativeRenderbuffer(state.handle()))
    }

    fn delete_renderbuffer(&mut self, renderbuffer: NativeRenderbuffer) {
        self.record(format!("delete_renderbuffer({})", renderbuffer.0));
    }

    fn renderbuffer_storage(&mut self, renderbuffer: NativeRenderbuffer, samples: u32, format: PixelFormat, width: u32, height: u32) {
        self.record(format!(
            "renderbuffer_storage({}, {}, {:?}, {}, {})",
            renderbuffer.0, samples, format, width, height
        ));
    }

    fn framebuffer_renderbuffer(&mut self, attachment: Attachment, renderbuffer: Option<NativeRenderbuffer>) {
        self.record(format!("framebuffer_renderbuffer({:?}, {:?})", attachment, renderbuffer.map(|r| r.0)));
    }

    fn check_framebuffer_status(&mut self) -> bool {
        self.record("check_framebuffer_status".to_string());
        self.state.borrow().framebuffer_complete
    }

    fn draw_buffers(&mut self, attachments: &[Attachment]) {
        self.record(format!("draw_buffers({:?})", attachments));
    }

    fn read_buffer(&mut self, attachment: Attachment) {
        self.record(format!("read_buffer({:?})", attachment));
    }

    fn invalidate_framebuffer(&mut self, target: FramebufferTarget, attachments: &[Attachment]) {
        self.record(format!("invalidate_framebuffer({:?}, {:?})", target, attachments));
    }

    fn blit_framebuffer(&mut self, src: [i32; 4], dst: [i32; 4], mask: ClearFlags, filter: BlitFilter) {
        self.record(format!("blit_framebuffer({:?}, {:?}, {:?}, {:?})", src, dst, mask, filter));
    }

    fn read_pixels(&mut self, x: i32, y: i32, width: u32, height: u32, dst: &mut [u8]) {
        self.record(format!("read_pixels({}, {}, {}, {})", x, y, width, height));
        let state = self.state.borrow();
        let color = state.last_clear_color;
        for pixel in dst.chunks_mut(4) {
            for (channel, value) in pixel.iter_mut().zip(color.iter()) {
                *channel = if state.exact_readback { (value.clamp(0.0, 1.0) * 255.0).round() as u8 } else { 3 };
            }
        }
    }

    fn read_pixels_f32(&mut self, x: i32, y: i32, width: u32, height: u32, dst: &mut [f32]) {
        self.record(format!("read_pixels_f32({}, {}, {}, {})", x, y, width, height));
        let state = self.state.borrow();
        for pixel in dst.chunks_mut(4) {
            for (channel, value) in pixel.iter_mut().zip(state.last_clear_color.iter()) {
                *channel = if state.exact_readback { *value } else { 0.0 };
            }
        }
    }

    fn read_pixels_to_buffer(&mut self, x: i32, y: i32, width: u32, height: u32, offset: usize) {
        self.record(format!("read_pixels_to_buffer({}, {}, {}, {}, {})", x, y, width, height, offset));
    }

    fn create_program(&mut self, desc: &ProgramDesc<'_>) -> Result<NativeProgram, String> {
        self.record(format!("create_program({})", desc.attributes.len()));
        let mut state = self.state.borrow_mut();
        if state.fail_program_link {
            return Err("mock link failure".to_string());
        }
        Ok(NativeProgram(state.handle()))
    }

    fn delete_program(&mut self, program: NativeProgram) {
        self.record(format!("delete_program({})", program.0));
    }

    fn use_program(&mut self, program: Option<NativeProgram>) {
        self.record(format!("use_program({:?})", program.map(|p| p.0)));
    }

    fn active_uniforms(&mut self, _program: NativeProgram) -> Vec<ActiveUniform> {
        self.state.borrow().program_uniforms.clone()
    }

    fn uniform_f32(&mut self, location: UniformLocation, components: u32, values: &[f32]) {
        self.record(format!("uniform_f32({}, {}, {:?})", location.0, components, values));
    }

    fn uniform_i32(&mut self, location: UniformLocation, components: u32, values: &[i32]) {
        self.record(format!("uniform_i32({}, {}, {:?})", location.0, components, values));
    }

    fn uniform_u32(&mut self, location: UniformLocation, components: u32, values: &[u32]) {
        self.record(format!("uniform_u32({}, {}, {:?})", location.0, components, values));
    }

    fn uniform_matrix_f32(&mut self, location: UniformLocation, dimension: u32, values: &[f32]) {
        self.record(format!("uniform_matrix_f32({}, {}, {})", location.0, dimension, values.len()));
    }

    fn draw_arrays(&mut self, mode: PrimitiveType, first: u32, count: u32) {
        self.record(format!("draw_arrays({:?}, {}, {})", mode, first, count));
    }

    fn draw_elements(&mut self, mode: PrimitiveType, count: u32, format: IndexFormat, offset: u32) {
        self.record(format!("draw_elements({:?}, {}, {:?}, {})", mode, count, format, offset));
    }

    fn draw_arrays_instanced(&mut self, mode: PrimitiveType, first: u32, count: u32, instances: u32) {
        self.record(format!("draw_arrays_instanced({:?}, {}, {}, {})", mode, first, count, instances));
    }

    fn draw_elements_instanced(&mut self, mode: PrimitiveType, count: u32, format: IndexFormat, offset: u32, instances: u32) {
        self.record(format!(
            "draw_elements_instanced({:?}, {}, {:?}, {}, {})",
            mode, count, format, offset, instances
        ));
    }

    fn begin_transform_feedback(&mut self, mode: PrimitiveType) {
        self.record(format!("begin_transform_feedback({:?})", mode));
    }

    fn end_transform_feedback(&mut self) {
        self.record("end_transform_feedback".to_string());
    }

    fn fence_sync(&mut self) -> Option<NativeSync> {
        self.record("fence_sync".to_string());
        let mut state = self.state.borrow_mut();
        state.fence_polls = 0;
        Some(NativeSync(state.handle().get() as u64))
    }

    fn client_wait_sync(&mut self, sync: NativeSync) -> SyncStatus {
        self.record(format!("client_wait_sync({})", sync.0));
        let mut state = self.state.borrow_mut();
        if state.lost {
            return SyncStatus::Failed;
        }
        state.fence_polls += 1;
        if state.fence_polls > state.fence_polls_before_signal {
            SyncStatus::Signaled
        } else {
            SyncStatus::Pending
        }
    }

    fn delete_sync(&mut self, sync: NativeSync) {
        self.record(format!("delete_sync({})", sync.0));
    }

    fn flush(&mut self) {
        self.record("flush".to_string());
    }
}

/// Factory handing out mock contexts for the generations it supports
pub struct MockFactory {
    pub modern: bool,
    pub legacy: bool,
    pub created: RefCell<Vec<(ApiGeneration, ContextAttributes, MockHandle)>>,
}

impl MockFactory {
    pub fn new(modern: bool, legacy: bool) -> Self {
        Self { modern, legacy, created: RefCell::new(Vec::new()) }
    }

    /// State of the most recently created context
    pub fn last(&self) -> Option<MockHandle> {
        self.created.borrow().last().map(|(_, _, handle)| handle.clone())
    }
}

impl ContextFactory for MockFactory {
    fn create_context(&self, generation: ApiGeneration, attributes: &ContextAttributes) -> Option<Box<dyn NativeContext>> {
        let available = match generation {
            ApiGeneration::Modern => self.modern,
            ApiGeneration::Legacy => self.legacy,
        };
        if !available {
            return None;
        }
        let (context, handle) = MockContext::new(generation);
        self.created.borrow_mut().push((generation, attributes.clone(), handle));
        Some(Box::new(context))
    }
}
