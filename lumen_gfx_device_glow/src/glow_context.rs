/// GlowContext - `NativeContext` implementation over a glow GL context
///
/// Handles are the driver's object names wrapped in the device's typed
/// handles. Fences are raw sync pointers, so they live in a slot map and
/// cross the seam as slot keys.

use glow::HasContext;
use slotmap::{DefaultKey, Key, KeyData, SlotMap};

use lumen_gfx_device::lumen::native::{
    ActiveUniform, ApiGeneration, Attachment, BlendEquation, BlendFactor, BlitFilter, BufferTarget, BufferUsage,
    Capability, ClearFlags, CompareFunc, DataType, Face, FramebufferTarget, FrontFace, IndexFormat, Limit,
    NativeBuffer, NativeContext, NativeFramebuffer, NativeProgram, NativeRenderbuffer, NativeSync, NativeTexture,
    NativeVertexArray, PixelFormat, PrimitiveType, ProgramDesc, RendererStrings, StencilOp, SyncStatus,
    TextureParameter, TextureTarget, UniformLocation,
};

use crate::glow_extensions::extension_aliases;
use crate::glow_format as conv;

const SOURCE: &str = "lumen::GlowContext";

type GlFence = <glow::Context as HasContext>::Fence;

pub struct GlowContext {
    gl: glow::Context,
    generation: ApiGeneration,
    /// OpenGL ES (or WebGL) rather than desktop GL
    embedded: bool,
    size: (u32, u32),
    /// WebGL-style names of the features this driver provides
    extensions: Vec<String>,
    invalidate_supported: bool,
    fences: SlotMap<DefaultKey, GlFence>,
}

impl GlowContext {
    /// Wrap a current GL context; GL 3 / GLES 3 and newer run as the modern generation
    pub fn new(gl: glow::Context, width: u32, height: u32) -> Self {
        let generation = if gl.version().major >= 3 { ApiGeneration::Modern } else { ApiGeneration::Legacy };
        Self::with_generation(gl, generation, width, height)
    }

    /// Wrap a current GL context and force the API generation
    pub fn with_generation(gl: glow::Context, generation: ApiGeneration, width: u32, height: u32) -> Self {
        let (major, minor, embedded) = {
            let version = gl.version();
            (version.major, version.minor, version.is_embedded)
        };
        let extensions = extension_aliases(gl.supported_extensions().iter().map(String::as_str));
        // glInvalidateFramebuffer is core in GLES 3.0 and GL 4.3
        let invalidate_supported = generation == ApiGeneration::Modern && (embedded || (major, minor) >= (4, 3));

        lumen_gfx_device::gfx_info!(
            SOURCE,
            "Wrapped {} {}.{} as a {:?} context ({} extensions)",
            if embedded { "GLES" } else { "GL" },
            major,
            minor,
            generation,
            extensions.len()
        );

        Self {
            gl,
            generation,
            embedded,
            size: (width, height),
            extensions,
            invalidate_supported,
            fences: SlotMap::new(),
        }
    }

    /// The wrapped glow context
    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }

    fn has_extension(&self, name: &str) -> bool {
        self.extensions.iter().any(|e| e == name)
    }

    fn compile_shader(&self, kind: u32, source: &str) -> Result<glow::NativeShader, String> {
        unsafe {
            let shader = self.gl.create_shader(kind)?;
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);
            if self.gl.get_shader_compile_status(shader) {
                Ok(shader)
            } else {
                let log = self.gl.get_shader_info_log(shader);
                self.gl.delete_shader(shader);
                Err(log)
            }
        }
    }
}

// ===== HANDLE CONVERSIONS =====

fn gl_texture(texture: NativeTexture) -> glow::NativeTexture {
    glow::NativeTexture(texture.0)
}

fn gl_buffer(buffer: NativeBuffer) -> glow::NativeBuffer {
    glow::NativeBuffer(buffer.0)
}

fn gl_vertex_array(vertex_array: NativeVertexArray) -> glow::NativeVertexArray {
    glow::NativeVertexArray(vertex_array.0)
}

fn gl_framebuffer(framebuffer: NativeFramebuffer) -> glow::NativeFramebuffer {
    glow::NativeFramebuffer(framebuffer.0)
}

fn gl_renderbuffer(renderbuffer: NativeRenderbuffer) -> glow::NativeRenderbuffer {
    glow::NativeRenderbuffer(renderbuffer.0)
}

fn gl_program(program: NativeProgram) -> glow::NativeProgram {
    glow::NativeProgram(program.0)
}

fn gl_location(location: UniformLocation) -> glow::NativeUniformLocation {
    glow::NativeUniformLocation(location.0)
}

impl NativeContext for GlowContext {
    // ===== QUERIES =====

    fn api_generation(&self) -> ApiGeneration {
        self.generation
    }

    fn supported_extensions(&self) -> Vec<String> {
        self.extensions.clone()
    }

    // Native extensions are active as soon as the driver advertises them
    fn enable_extension(&mut self, name: &str) -> bool {
        self.has_extension(name)
    }

    fn limit(&self, limit: Limit) -> i32 {
        let value = unsafe { self.gl.get_parameter_i32(conv::limit(limit, self.embedded)) };
        value / conv::limit_scale(limit, self.embedded)
    }

    fn max_anisotropy(&self) -> f32 {
        if !self.has_extension("EXT_texture_filter_anisotropic") {
            return 1.0;
        }
        unsafe { self.gl.get_parameter_f32(conv::MAX_TEXTURE_MAX_ANISOTROPY) }
    }

    fn renderer_strings(&self, _unmasked: bool) -> RendererStrings {
        unsafe {
            RendererStrings {
                vendor: self.gl.get_parameter_string(glow::VENDOR),
                renderer: self.gl.get_parameter_string(glow::RENDERER),
            }
        }
    }

    fn drawing_buffer_size(&self) -> (u32, u32) {
        self.size
    }

    // The window layer owns the surface; only the size is tracked here
    fn resize_drawing_buffer(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    fn is_context_lost(&self) -> bool {
        false
    }

    fn lose_context(&mut self) -> bool {
        false
    }

    fn restore_context(&mut self) -> bool {
        false
    }

    // ===== RENDER STATE =====

    fn enable(&mut self, capability: Capability) {
        unsafe { self.gl.enable(conv::capability(capability)) }
    }

    fn disable(&mut self, capability: Capability) {
        unsafe { self.gl.disable(conv::capability(capability)) }
    }

    fn blend_equation_separate(&mut self, color: BlendEquation, alpha: BlendEquation) {
        unsafe { self.gl.blend_equation_separate(conv::blend_equation(color), conv::blend_equation(alpha)) }
    }

    fn blend_func_separate(
        &mut self,
        src_color: BlendFactor,
        dst_color: BlendFactor,
        src_alpha: BlendFactor,
        dst_alpha: BlendFactor,
    ) {
        unsafe {
            self.gl.blend_func_separate(
                conv::blend_factor(src_color),
                conv::blend_factor(dst_color),
                conv::blend_factor(src_alpha),
                conv::blend_factor(dst_alpha),
            )
        }
    }

    fn blend_color(&mut self, color: [f32; 4]) {
        unsafe { self.gl.blend_color(color[0], color[1], color[2], color[3]) }
    }

    fn color_mask(&mut self, red: bool, green: bool, blue: bool, alpha: bool) {
        unsafe { self.gl.color_mask(red, green, blue, alpha) }
    }

    fn depth_mask(&mut self, write: bool) {
        unsafe { self.gl.depth_mask(write) }
    }

    fn depth_func(&mut self, func: CompareFunc) {
        unsafe { self.gl.depth_func(conv::compare_func(func)) }
    }

    fn polygon_offset(&mut self, factor: f32, units: f32) {
        unsafe { self.gl.polygon_offset(factor, units) }
    }

    fn stencil_func_separate(&mut self, face: Face, func: CompareFunc, reference: i32, mask: u32) {
        unsafe { self.gl.stencil_func_separate(conv::face(face), conv::compare_func(func), reference, mask) }
    }

    fn stencil_op_separate(&mut self, face: Face, fail: StencilOp, zfail: StencilOp, zpass: StencilOp) {
        unsafe {
            self.gl.stencil_op_separate(
                conv::face(face),
                conv::stencil_op(fail),
                conv::stencil_op(zfail),
                conv::stencil_op(zpass),
            )
        }
    }

    fn stencil_mask_separate(&mut self, face: Face, mask: u32) {
        unsafe { self.gl.stencil_mask_separate(conv::face(face), mask) }
    }

    fn cull_face(&mut self, face: Face) {
        unsafe { self.gl.cull_face(conv::face(face)) }
    }

    fn front_face(&mut self, front_face: FrontFace) {
        unsafe { self.gl.front_face(conv::front_face(front_face)) }
    }

    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { self.gl.viewport(x, y, width, height) }
    }

    fn scissor(&mut self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { self.gl.scissor(x, y, width, height) }
    }

    fn clear_color(&mut self, color: [f32; 4]) {
        unsafe { self.gl.clear_color(color[0], color[1], color[2], color[3]) }
    }

    fn clear_depth(&mut self, depth: f32) {
        unsafe { self.gl.clear_depth_f32(depth) }
    }

    fn clear_stencil(&mut self, stencil: i32) {
        unsafe { self.gl.clear_stencil(stencil) }
    }

    fn clear(&mut self, flags: ClearFlags) {
        unsafe { self.gl.clear(conv::clear_mask(flags)) }
    }

    // ===== TEXTURES =====

    fn create_texture(&mut self) -> Result<NativeTexture, String> {
        unsafe { self.gl.create_texture() }.map(|texture| NativeTexture(texture.0))
    }

    fn delete_texture(&mut self, texture: NativeTexture) {
        unsafe { self.gl.delete_texture(gl_texture(texture)) }
    }

    fn active_texture(&mut self, unit: u32) {
        unsafe { self.gl.active_texture(glow::TEXTURE0 + unit) }
    }

    fn bind_texture(&mut self, target: TextureTarget, texture: Option<NativeTexture>) {
        unsafe { self.gl.bind_texture(conv::texture_target(target), texture.map(gl_texture)) }
    }

    fn tex_parameter(&mut self, target: TextureTarget, parameter: TextureParameter) {
        let target = conv::texture_target(target);
        unsafe {
            match parameter {
                TextureParameter::MinFilter(mode) => {
                    self.gl.tex_parameter_i32(target, glow::TEXTURE_MIN_FILTER, conv::filter(mode))
                }
                TextureParameter::MagFilter(mode) => {
                    self.gl.tex_parameter_i32(target, glow::TEXTURE_MAG_FILTER, conv::filter(mode))
                }
                TextureParameter::WrapS(mode) => {
                    self.gl.tex_parameter_i32(target, glow::TEXTURE_WRAP_S, conv::address(mode))
                }
                TextureParameter::WrapT(mode) => {
                    self.gl.tex_parameter_i32(target, glow::TEXTURE_WRAP_T, conv::address(mode))
                }
                TextureParameter::WrapR(mode) => {
                    self.gl.tex_parameter_i32(target, glow::TEXTURE_WRAP_R, conv::address(mode))
                }
                TextureParameter::CompareMode(enabled) => {
                    let mode = if enabled { glow::COMPARE_REF_TO_TEXTURE } else { glow::NONE };
                    self.gl.tex_parameter_i32(target, glow::TEXTURE_COMPARE_MODE, mode as i32)
                }
                TextureParameter::CompareFunc(func) => {
                    self.gl.tex_parameter_i32(target, glow::TEXTURE_COMPARE_FUNC, conv::compare_func(func) as i32)
                }
                TextureParameter::MaxAnisotropy(value) => {
                    self.gl.tex_parameter_f32(target, conv::TEXTURE_MAX_ANISOTROPY, value)
                }
            }
        }
    }

    fn tex_image_2d(
        &mut self,
        target: TextureTarget,
        face: u32,
        level: u32,
        format: PixelFormat,
        width: u32,
        height: u32,
        data: Option<&[u8]>,
    ) {
        let layout = conv::texture_format(format, self.generation);
        let image = conv::image_target(target, face);
        unsafe {
            if format.is_compressed() {
                // Compressed storage cannot be allocated without its blocks
                if let Some(data) = data {
                    self.gl.compressed_tex_image_2d(
                        image,
                        level as i32,
                        layout.internal as i32,
                        width as i32,
                        height as i32,
                        0,
                        data.len() as i32,
                        data,
                    );
                }
            } else {
                self.gl.tex_image_2d(
                    image,
                    level as i32,
                    layout.internal as i32,
                    width as i32,
                    height as i32,
                    0,
                    layout.format,
                    layout.ty,
                    data,
                );
            }
        }
    }

    fn tex_image_3d(
        &mut self,
        target: TextureTarget,
        level: u32,
        format: PixelFormat,
        width: u32,
        height: u32,
        depth: u32,
        data: Option<&[u8]>,
    ) {
        let layout = conv::texture_format(format, self.generation);
        let target = conv::texture_target(target);
        unsafe {
            if format.is_compressed() {
                if let Some(data) = data {
                    self.gl.compressed_tex_image_3d(
                        target,
                        level as i32,
                        layout.internal as i32,
                        width as i32,
                        height as i32,
                        depth as i32,
                        0,
                        data.len() as i32,
                        data,
                    );
                }
            } else {
                self.gl.tex_image_3d(
                    target,
                    level as i32,
                    layout.internal as i32,
                    width as i32,
                    height as i32,
                    depth as i32,
                    0,
                    layout.format,
                    layout.ty,
                    data,
                );
            }
        }
    }

    fn generate_mipmap(&mut self, target: TextureTarget) {
        unsafe { self.gl.generate_mipmap(conv::texture_target(target)) }
    }

    fn copy_tex_sub_image_2d(&mut self, target: TextureTarget, level: u32, width: u32, height: u32) {
        unsafe {
            self.gl.copy_tex_sub_image_2d(
                conv::texture_target(target),
                level as i32,
                0,
                0,
                0,
                0,
                width as i32,
                height as i32,
            )
        }
    }

    // ===== BUFFERS =====

    fn create_buffer(&mut self) -> Result<NativeBuffer, String> {
        unsafe { self.gl.create_buffer() }.map(|buffer| NativeBuffer(buffer.0))
    }

    fn delete_buffer(&mut self, buffer: NativeBuffer) {
        unsafe { self.gl.delete_buffer(gl_buffer(buffer)) }
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<NativeBuffer>) {
        unsafe { self.gl.bind_buffer(conv::buffer_target(target), buffer.map(gl_buffer)) }
    }

    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], usage: BufferUsage) {
        unsafe {
            self.gl.buffer_data_u8_slice(conv::buffer_target(target), data, conv::buffer_usage(target, usage))
        }
    }

    fn buffer_storage(&mut self, target: BufferTarget, size: usize, usage: BufferUsage) {
        unsafe {
            self.gl.buffer_data_size(conv::buffer_target(target), size as i32, conv::buffer_usage(target, usage))
        }
    }

    fn get_buffer_sub_data(&mut self, target: BufferTarget, offset: usize, dst: &mut [u8]) {
        unsafe { self.gl.get_buffer_sub_data(conv::buffer_target(target), offset as i32, dst) }
    }

    fn bind_buffer_base(&mut self, target: BufferTarget, index: u32, buffer: Option<NativeBuffer>) {
        unsafe { self.gl.bind_buffer_base(conv::buffer_target(target), index, buffer.map(gl_buffer)) }
    }

    // ===== VERTEX ARRAYS =====
    // On the legacy generation glow resolves these through the
    // OES / ARB / APPLE aliases when the core entry points are missing.

    fn create_vertex_array(&mut self) -> Result<NativeVertexArray, String> {
        unsafe { self.gl.create_vertex_array() }.map(|vertex_array| NativeVertexArray(vertex_array.0))
    }

    fn delete_vertex_array(&mut self, vertex_array: NativeVertexArray) {
        unsafe { self.gl.delete_vertex_array(gl_vertex_array(vertex_array)) }
    }

    fn bind_vertex_array(&mut self, vertex_array: Option<NativeVertexArray>) {
        unsafe { self.gl.bind_vertex_array(vertex_array.map(gl_vertex_array)) }
    }

    fn enable_vertex_attrib_array(&mut self, location: u32) {
        unsafe { self.gl.enable_vertex_attrib_array(location) }
    }

    fn vertex_attrib_pointer(
        &mut self,
        location: u32,
        components: u32,
        data_type: DataType,
        normalize: bool,
        stride: u32,
        offset: u32,
    ) {
        unsafe {
            self.gl.vertex_attrib_pointer_f32(
                location,
                components as i32,
                conv::data_type(data_type, self.generation),
                normalize,
                stride as i32,
                offset as i32,
            )
        }
    }

    fn vertex_attrib_i_pointer(&mut self, location: u32, components: u32, data_type: DataType, stride: u32, offset: u32) {
        unsafe {
            self.gl.vertex_attrib_pointer_i32(
                location,
                components as i32,
                conv::data_type(data_type, self.generation),
                stride as i32,
                offset as i32,
            )
        }
    }

    fn vertex_attrib_divisor(&mut self, location: u32, divisor: u32) {
        unsafe { self.gl.vertex_attrib_divisor(location, divisor) }
    }

    // ===== FRAMEBUFFERS =====

    fn create_framebuffer(&mut self) -> Result<NativeFramebuffer, String> {
        unsafe { self.gl.create_framebuffer() }.map(|framebuffer| NativeFramebuffer(framebuffer.0))
    }

    fn delete_framebuffer(&mut self, framebuffer: NativeFramebuffer) {
        unsafe { self.gl.delete_framebuffer(gl_framebuffer(framebuffer)) }
    }

    fn bind_framebuffer(&mut self, target: FramebufferTarget, framebuffer: Option<NativeFramebuffer>) {
        unsafe { self.gl.bind_framebuffer(conv::framebuffer_target(target), framebuffer.map(gl_framebuffer)) }
    }

    fn framebuffer_texture_2d(
        &mut self,
        attachment: Attachment,
        target: TextureTarget,
        face: u32,
        texture: Option<NativeTexture>,
        level: u32,
    ) {
        let attachment = conv::attachment(attachment);
        let texture = texture.map(gl_texture);
        unsafe {
            match target {
                // Layered textures attach one layer (`face` selects it)
                TextureTarget::Texture2DArray | TextureTarget::Texture3D => {
                    self.gl.framebuffer_texture_layer(glow::FRAMEBUFFER, attachment, texture, level as i32, face as i32)
                }
                _ => self.gl.framebuffer_texture_2d(
                    glow::FRAMEBUFFER,
                    attachment,
                    conv::image_target(target, face),
                    texture,
                    level as i32,
                ),
            }
        }
    }

    fn create_renderbuffer(&mut self) -> Result<NativeRenderbuffer, String> {
        unsafe { self.gl.create_renderbuffer() }.map(|renderbuffer| NativeRenderbuffer(renderbuffer.0))
    }

    fn delete_renderbuffer(&mut self, renderbuffer: NativeRenderbuffer) {
        unsafe { self.gl.delete_renderbuffer(gl_renderbuffer(renderbuffer)) }
    }

    fn renderbuffer_storage(
        &mut self,
        renderbuffer: NativeRenderbuffer,
        samples: u32,
        format: PixelFormat,
        width: u32,
        height: u32,
    ) {
        let internal = conv::renderbuffer_format(format);
        unsafe {
            self.gl.bind_renderbuffer(glow::RENDERBUFFER, Some(gl_renderbuffer(renderbuffer)));
            if samples > 1 {
                self.gl.renderbuffer_storage_multisample(
                    glow::RENDERBUFFER,
                    samples as i32,
                    internal,
                    width as i32,
                    height as i32,
                );
            } else {
                self.gl.renderbuffer_storage(glow::RENDERBUFFER, internal, width as i32, height as i32);
            }
            self.gl.bind_renderbuffer(glow::RENDERBUFFER, None);
        }
    }

    fn framebuffer_renderbuffer(&mut self, attachment: Attachment, renderbuffer: Option<NativeRenderbuffer>) {
        unsafe {
            self.gl.framebuffer_renderbuffer(
                glow::FRAMEBUFFER,
                conv::attachment(attachment),
                glow::RENDERBUFFER,
                renderbuffer.map(gl_renderbuffer),
            )
        }
    }

    fn check_framebuffer_status(&mut self) -> bool {
        unsafe { self.gl.check_framebuffer_status(glow::FRAMEBUFFER) == glow::FRAMEBUFFER_COMPLETE }
    }

    fn draw_buffers(&mut self, attachments: &[Attachment]) {
        let buffers: Vec<u32> = attachments.iter().map(|a| conv::attachment(*a)).collect();
        unsafe { self.gl.draw_buffers(&buffers) }
    }

    fn read_buffer(&mut self, attachment: Attachment) {
        unsafe { self.gl.read_buffer(conv::attachment(attachment)) }
    }

    fn invalidate_framebuffer(&mut self, target: FramebufferTarget, attachments: &[Attachment]) {
        // A hint only: skipping it is always correct
        if !self.invalidate_supported {
            return;
        }
        let attachments: Vec<u32> = attachments.iter().map(|a| conv::attachment(*a)).collect();
        unsafe { self.gl.invalidate_framebuffer(conv::framebuffer_target(target), &attachments) }
    }

    fn blit_framebuffer(&mut self, src: [i32; 4], dst: [i32; 4], mask: ClearFlags, filter: BlitFilter) {
        unsafe {
            self.gl.blit_framebuffer(
                src[0],
                src[1],
                src[2],
                src[3],
                dst[0],
                dst[1],
                dst[2],
                dst[3],
                conv::clear_mask(mask),
                conv::blit_filter(filter),
            )
        }
    }

    fn read_pixels(&mut self, x: i32, y: i32, width: u32, height: u32, dst: &mut [u8]) {
        unsafe {
            self.gl.read_pixels(
                x,
                y,
                width as i32,
                height as i32,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelPackData::Slice(dst),
            )
        }
    }

    fn read_pixels_f32(&mut self, x: i32, y: i32, width: u32, height: u32, dst: &mut [f32]) {
        unsafe {
            self.gl.read_pixels(
                x,
                y,
                width as i32,
                height as i32,
                glow::RGBA,
                glow::FLOAT,
                glow::PixelPackData::Slice(bytemuck::cast_slice_mut(dst)),
            )
        }
    }

    fn read_pixels_to_buffer(&mut self, x: i32, y: i32, width: u32, height: u32, offset: usize) {
        unsafe {
            self.gl.read_pixels(
                x,
                y,
                width as i32,
                height as i32,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelPackData::BufferOffset(offset as u32),
            )
        }
    }

    // ===== PROGRAMS =====

    fn create_program(&mut self, desc: &ProgramDesc<'_>) -> Result<NativeProgram, String> {
        let vertex = self.compile_shader(glow::VERTEX_SHADER, desc.vertex)?;
        let fragment = match self.compile_shader(glow::FRAGMENT_SHADER, desc.fragment) {
            Ok(fragment) => fragment,
            Err(log) => {
                unsafe { self.gl.delete_shader(vertex) };
                return Err(log);
            }
        };

        unsafe {
            let program = match self.gl.create_program() {
                Ok(program) => program,
                Err(message) => {
                    self.gl.delete_shader(vertex);
                    self.gl.delete_shader(fragment);
                    return Err(message);
                }
            };
            self.gl.attach_shader(program, vertex);
            self.gl.attach_shader(program, fragment);
            for (name, location) in desc.attributes {
                self.gl.bind_attrib_location(program, *location, name);
            }
            if self.generation == ApiGeneration::Modern && !desc.feedback_varyings.is_empty() {
                let varyings: Vec<&str> = desc.feedback_varyings.iter().map(String::as_str).collect();
                self.gl.transform_feedback_varyings(program, &varyings, glow::INTERLEAVED_ATTRIBS);
            }
            self.gl.link_program(program);

            self.gl.detach_shader(program, vertex);
            self.gl.detach_shader(program, fragment);
            self.gl.delete_shader(vertex);
            self.gl.delete_shader(fragment);

            if self.gl.get_program_link_status(program) {
                Ok(NativeProgram(program.0))
            } else {
                let log = self.gl.get_program_info_log(program);
                self.gl.delete_program(program);
                Err(log)
            }
        }
    }

    fn delete_program(&mut self, program: NativeProgram) {
        unsafe { self.gl.delete_program(gl_program(program)) }
    }

    fn use_program(&mut self, program: Option<NativeProgram>) {
        unsafe { self.gl.use_program(program.map(gl_program)) }
    }

    fn active_uniforms(&mut self, program: NativeProgram) -> Vec<ActiveUniform> {
        let program = gl_program(program);
        let mut uniforms = Vec::new();
        unsafe {
            for index in 0..self.gl.get_active_uniforms(program) {
                let Some(active) = self.gl.get_active_uniform(program, index) else {
                    continue;
                };
                let Some(ty) = conv::active_uniform_type(active.utype) else {
                    lumen_gfx_device::gfx_debug!(SOURCE, "Skipping uniform '{}' of unsupported type", active.name);
                    continue;
                };
                // Block members have no location
                let Some(location) = self.gl.get_uniform_location(program, &active.name) else {
                    continue;
                };
                uniforms.push(ActiveUniform {
                    name: active.name,
                    ty,
                    size: active.size.max(1) as u32,
                    location: UniformLocation(location.0),
                });
            }
        }
        uniforms
    }

    fn uniform_f32(&mut self, location: UniformLocation, components: u32, values: &[f32]) {
        let location = Some(gl_location(location));
        let location = location.as_ref();
        unsafe {
            match components {
                1 => self.gl.uniform_1_f32_slice(location, values),
                2 => self.gl.uniform_2_f32_slice(location, values),
                3 => self.gl.uniform_3_f32_slice(location, values),
                _ => self.gl.uniform_4_f32_slice(location, values),
            }
        }
    }

    fn uniform_i32(&mut self, location: UniformLocation, components: u32, values: &[i32]) {
        let location = Some(gl_location(location));
        let location = location.as_ref();
        unsafe {
            match components {
                1 => self.gl.uniform_1_i32_slice(location, values),
                2 => self.gl.uniform_2_i32_slice(location, values),
                3 => self.gl.uniform_3_i32_slice(location, values),
                _ => self.gl.uniform_4_i32_slice(location, values),
            }
        }
    }

    fn uniform_u32(&mut self, location: UniformLocation, components: u32, values: &[u32]) {
        let location = Some(gl_location(location));
        let location = location.as_ref();
        unsafe {
            match components {
                1 => self.gl.uniform_1_u32_slice(location, values),
                2 => self.gl.uniform_2_u32_slice(location, values),
                3 => self.gl.uniform_3_u32_slice(location, values),
                _ => self.gl.uniform_4_u32_slice(location, values),
            }
        }
    }

    fn uniform_matrix_f32(&mut self, location: UniformLocation, dimension: u32, values: &[f32]) {
        let location = Some(gl_location(location));
        let location = location.as_ref();
        unsafe {
            match dimension {
                2 => self.gl.uniform_matrix_2_f32_slice(location, false, values),
                3 => self.gl.uniform_matrix_3_f32_slice(location, false, values),
                _ => self.gl.uniform_matrix_4_f32_slice(location, false, values),
            }
        }
    }

    // ===== DRAWING =====

    fn draw_arrays(&mut self, mode: PrimitiveType, first: u32, count: u32) {
        unsafe { self.gl.draw_arrays(conv::primitive(mode), first as i32, count as i32) }
    }

    fn draw_elements(&mut self, mode: PrimitiveType, count: u32, format: IndexFormat, offset: u32) {
        unsafe {
            self.gl.draw_elements(conv::primitive(mode), count as i32, conv::index_format(format), offset as i32)
        }
    }

    fn draw_arrays_instanced(&mut self, mode: PrimitiveType, first: u32, count: u32, instances: u32) {
        unsafe {
            self.gl.draw_arrays_instanced(conv::primitive(mode), first as i32, count as i32, instances as i32)
        }
    }

    fn draw_elements_instanced(
        &mut self,
        mode: PrimitiveType,
        count: u32,
        format: IndexFormat,
        offset: u32,
        instances: u32,
    ) {
        unsafe {
            self.gl.draw_elements_instanced(
                conv::primitive(mode),
                count as i32,
                conv::index_format(format),
                offset as i32,
                instances as i32,
            )
        }
    }

    fn begin_transform_feedback(&mut self, mode: PrimitiveType) {
        unsafe { self.gl.begin_transform_feedback(conv::primitive(mode)) }
    }

    fn end_transform_feedback(&mut self) {
        unsafe { self.gl.end_transform_feedback() }
    }

    // ===== SYNC =====

    fn fence_sync(&mut self) -> Option<NativeSync> {
        match unsafe { self.gl.fence_sync(glow::SYNC_GPU_COMMANDS_COMPLETE, 0) } {
            Ok(fence) => Some(NativeSync(self.fences.insert(fence).data().as_ffi())),
            Err(message) => {
                lumen_gfx_device::gfx_warn!(SOURCE, "fence_sync failed: {}", message);
                None
            }
        }
    }

    fn client_wait_sync(&mut self, sync: NativeSync) -> SyncStatus {
        let key: DefaultKey = KeyData::from_ffi(sync.0).into();
        let Some(fence) = self.fences.get(key) else {
            return SyncStatus::Failed;
        };
        match unsafe { self.gl.client_wait_sync(*fence, 0, 0) } {
            glow::ALREADY_SIGNALED | glow::CONDITION_SATISFIED => SyncStatus::Signaled,
            glow::TIMEOUT_EXPIRED => SyncStatus::Pending,
            _ => SyncStatus::Failed,
        }
    }

    fn delete_sync(&mut self, sync: NativeSync) {
        let key: DefaultKey = KeyData::from_ffi(sync.0).into();
        if let Some(fence) = self.fences.remove(key) {
            unsafe { self.gl.delete_sync(fence) }
        }
    }

    fn flush(&mut self) {
        unsafe { self.gl.flush() }
    }
}

impl Drop for GlowContext {
    fn drop(&mut self) {
        for (_, fence) in self.fences.drain() {
            unsafe { self.gl.delete_sync(fence) }
        }
    }
}
