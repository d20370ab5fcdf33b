//! The native context seam.
//!
//! `NativeContext` is the only way the device talks to the driver. It exposes
//! a generation-agnostic call surface: on the legacy generation the backend
//! routes instancing, vertex-array and draw-buffer calls to the extension
//! entry points enabled during the capability probe.

use crate::native::types::*;

/// Immediate-mode native graphics context
///
/// Implemented by backends (see `lumen_gfx_device_glow`) and by the
/// recording mock used in tests. All methods execute synchronously on the
/// calling thread.
pub trait NativeContext {
    // ===== QUERIES =====

    /// Generation of the API this context implements
    fn api_generation(&self) -> ApiGeneration;

    /// Names of all extensions the driver advertises
    fn supported_extensions(&self) -> Vec<String>;

    /// Enable an extension, returning whether it is now active
    fn enable_extension(&mut self, name: &str) -> bool;

    /// Query a numeric limit
    fn limit(&self, limit: Limit) -> i32;

    /// Maximum anisotropy (1.0 when anisotropic filtering is unavailable)
    fn max_anisotropy(&self) -> f32;

    /// Vendor / renderer strings. `unmasked` requests the debug-info strings.
    fn renderer_strings(&self, unmasked: bool) -> RendererStrings;

    /// Size of the default framebuffer in physical pixels
    fn drawing_buffer_size(&self) -> (u32, u32);

    /// Resize the default framebuffer
    fn resize_drawing_buffer(&mut self, width: u32, height: u32);

    /// Whether the context is currently lost
    fn is_context_lost(&self) -> bool;

    /// Force a context loss (debug hook). Returns false if unsupported.
    fn lose_context(&mut self) -> bool;

    /// Restore a context lost through `lose_context`
    fn restore_context(&mut self) -> bool;

    // ===== RENDER STATE =====

    fn enable(&mut self, capability: Capability);
    fn disable(&mut self, capability: Capability);
    fn blend_equation_separate(&mut self, color: BlendEquation, alpha: BlendEquation);
    fn blend_func_separate(
        &mut self,
        src_color: BlendFactor,
        dst_color: BlendFactor,
        src_alpha: BlendFactor,
        dst_alpha: BlendFactor,
    );
    fn blend_color(&mut self, color: [f32; 4]);
    fn color_mask(&mut self, red: bool, green: bool, blue: bool, alpha: bool);
    fn depth_mask(&mut self, write: bool);
    fn depth_func(&mut self, func: CompareFunc);
    fn polygon_offset(&mut self, factor: f32, units: f32);
    fn stencil_func_separate(&mut self, face: Face, func: CompareFunc, reference: i32, mask: u32);
    fn stencil_op_separate(&mut self, face: Face, fail: StencilOp, zfail: StencilOp, zpass: StencilOp);
    fn stencil_mask_separate(&mut self, face: Face, mask: u32);
    fn cull_face(&mut self, face: Face);
    fn front_face(&mut self, front_face: FrontFace);
    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32);
    fn scissor(&mut self, x: i32, y: i32, width: i32, height: i32);
    fn clear_color(&mut self, color: [f32; 4]);
    fn clear_depth(&mut self, depth: f32);
    fn clear_stencil(&mut self, stencil: i32);
    fn clear(&mut self, flags: ClearFlags);

    // ===== TEXTURES =====

    fn create_texture(&mut self) -> Result<NativeTexture, String>;
    fn delete_texture(&mut self, texture: NativeTexture);
    /// Select the active texture unit (0-based)
    fn active_texture(&mut self, unit: u32);
    fn bind_texture(&mut self, target: TextureTarget, texture: Option<NativeTexture>);
    fn tex_parameter(&mut self, target: TextureTarget, parameter: TextureParameter);
    /// Upload one level of a 2D texture or of one cube face (`face` is ignored for 2D)
    #[allow(clippy::too_many_arguments)]
    fn tex_image_2d(
        &mut self,
        target: TextureTarget,
        face: u32,
        level: u32,
        format: PixelFormat,
        width: u32,
        height: u32,
        data: Option<&[u8]>,
    );
    /// Upload one level of a 2D-array or 3D texture
    #[allow(clippy::too_many_arguments)]
    fn tex_image_3d(
        &mut self,
        target: TextureTarget,
        level: u32,
        format: PixelFormat,
        width: u32,
        height: u32,
        depth: u32,
        data: Option<&[u8]>,
    );
    fn generate_mipmap(&mut self, target: TextureTarget);
    /// Copy from the bound read framebuffer into the bound texture
    fn copy_tex_sub_image_2d(&mut self, target: TextureTarget, level: u32, width: u32, height: u32);

    // ===== BUFFERS =====

    fn create_buffer(&mut self) -> Result<NativeBuffer, String>;
    fn delete_buffer(&mut self, buffer: NativeBuffer);
    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<NativeBuffer>);
    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], usage: BufferUsage);
    /// Allocate uninitialized storage for the bound buffer
    fn buffer_storage(&mut self, target: BufferTarget, size: usize, usage: BufferUsage);
    fn get_buffer_sub_data(&mut self, target: BufferTarget, offset: usize, dst: &mut [u8]);
    fn bind_buffer_base(&mut self, target: BufferTarget, index: u32, buffer: Option<NativeBuffer>);

    // ===== VERTEX ARRAYS =====

    fn create_vertex_array(&mut self) -> Result<NativeVertexArray, String>;
    fn delete_vertex_array(&mut self, vertex_array: NativeVertexArray);
    fn bind_vertex_array(&mut self, vertex_array: Option<NativeVertexArray>);
    fn enable_vertex_attrib_array(&mut self, location: u32);
    fn vertex_attrib_pointer(
        &mut self,
        location: u32,
        components: u32,
        data_type: DataType,
        normalize: bool,
        stride: u32,
        offset: u32,
    );
    /// Integer attribute pointer (modern generation only)
    fn vertex_attrib_i_pointer(&mut self, location: u32, components: u32, data_type: DataType, stride: u32, offset: u32);
    fn vertex_attrib_divisor(&mut self, location: u32, divisor: u32);

    // ===== FRAMEBUFFERS =====

    fn create_framebuffer(&mut self) -> Result<NativeFramebuffer, String>;
    fn delete_framebuffer(&mut self, framebuffer: NativeFramebuffer);
    fn bind_framebuffer(&mut self, target: FramebufferTarget, framebuffer: Option<NativeFramebuffer>);
    /// Attach a texture level to the bound framebuffer
    fn framebuffer_texture_2d(
        &mut self,
        attachment: Attachment,
        target: TextureTarget,
        face: u32,
        texture: Option<NativeTexture>,
        level: u32,
    );
    fn create_renderbuffer(&mut self) -> Result<NativeRenderbuffer, String>;
    fn delete_renderbuffer(&mut self, renderbuffer: NativeRenderbuffer);
    /// Allocate renderbuffer storage. `samples <= 1` allocates single-sampled storage.
    fn renderbuffer_storage(
        &mut self,
        renderbuffer: NativeRenderbuffer,
        samples: u32,
        format: PixelFormat,
        width: u32,
        height: u32,
    );
    fn framebuffer_renderbuffer(&mut self, attachment: Attachment, renderbuffer: Option<NativeRenderbuffer>);
    /// Completeness of the bound framebuffer
    fn check_framebuffer_status(&mut self) -> bool;
    fn draw_buffers(&mut self, attachments: &[Attachment]);
    fn read_buffer(&mut self, attachment: Attachment);
    fn invalidate_framebuffer(&mut self, target: FramebufferTarget, attachments: &[Attachment]);
    /// Copy between the bound read and draw framebuffers. Rectangles are `[x0, y0, x1, y1]`.
    fn blit_framebuffer(&mut self, src: [i32; 4], dst: [i32; 4], mask: ClearFlags, filter: BlitFilter);
    /// Read RGBA8 pixels from the bound read framebuffer
    fn read_pixels(&mut self, x: i32, y: i32, width: u32, height: u32, dst: &mut [u8]);
    /// Read RGBA32F pixels from the bound read framebuffer
    fn read_pixels_f32(&mut self, x: i32, y: i32, width: u32, height: u32, dst: &mut [f32]);
    /// Read RGBA8 pixels into the bound pixel-pack buffer at `offset`
    fn read_pixels_to_buffer(&mut self, x: i32, y: i32, width: u32, height: u32, offset: usize);

    // ===== PROGRAMS =====

    /// Compile and link a program
    fn create_program(&mut self, desc: &ProgramDesc<'_>) -> Result<NativeProgram, String>;
    fn delete_program(&mut self, program: NativeProgram);
    fn use_program(&mut self, program: Option<NativeProgram>);
    /// Reflect the active uniforms of a linked program
    fn active_uniforms(&mut self, program: NativeProgram) -> Vec<ActiveUniform>;
    fn uniform_f32(&mut self, location: UniformLocation, components: u32, values: &[f32]);
    fn uniform_i32(&mut self, location: UniformLocation, components: u32, values: &[i32]);
    fn uniform_u32(&mut self, location: UniformLocation, components: u32, values: &[u32]);
    fn uniform_matrix_f32(&mut self, location: UniformLocation, dimension: u32, values: &[f32]);

    // ===== DRAWING =====

    fn draw_arrays(&mut self, mode: PrimitiveType, first: u32, count: u32);
    fn draw_elements(&mut self, mode: PrimitiveType, count: u32, format: IndexFormat, offset: u32);
    fn draw_arrays_instanced(&mut self, mode: PrimitiveType, first: u32, count: u32, instances: u32);
    fn draw_elements_instanced(
        &mut self,
        mode: PrimitiveType,
        count: u32,
        format: IndexFormat,
        offset: u32,
        instances: u32,
    );
    fn begin_transform_feedback(&mut self, mode: PrimitiveType);
    fn end_transform_feedback(&mut self);

    // ===== SYNC =====

    /// Insert a fence after all previously submitted commands
    fn fence_sync(&mut self) -> Option<NativeSync>;
    /// Poll a fence without blocking
    fn client_wait_sync(&mut self, sync: NativeSync) -> SyncStatus;
    fn delete_sync(&mut self, sync: NativeSync);
    fn flush(&mut self);
}

/// Power preference hint forwarded to context creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PowerPreference {
    #[default]
    Default,
    HighPerformance,
    LowPower,
}

/// Attributes requested when creating a native context
#[derive(Debug, Clone, PartialEq)]
pub struct ContextAttributes {
    pub alpha: bool,
    pub depth: bool,
    pub stencil: bool,
    pub antialias: bool,
    pub premultiplied_alpha: bool,
    pub preserve_drawing_buffer: bool,
    pub power_preference: PowerPreference,
    pub fail_if_major_performance_caveat: bool,
    pub desynchronized: bool,
}

/// Creates native contexts for a surface
///
/// Returns `None` when a context of the requested generation cannot be
/// created; the device then tries the next generation.
pub trait ContextFactory {
    fn create_context(
        &self,
        generation: ApiGeneration,
        attributes: &ContextAttributes,
    ) -> Option<Box<dyn NativeContext>>;
}
