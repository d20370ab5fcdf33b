//! Conversions from device enums to raw GL values

use lumen_gfx_device::lumen::native::{
    ActiveUniformType, AddressMode, ApiGeneration, Attachment, BlendEquation, BlendFactor, BlitFilter,
    BufferTarget, BufferUsage, Capability, ClearFlags, CompareFunc, DataType, Face, FilterMode, FramebufferTarget,
    FrontFace, IndexFormat, Limit, PixelFormat, PrimitiveType, StencilOp, TextureTarget,
};

// Extension enums (not part of every glow constant set)
pub(crate) const TEXTURE_MAX_ANISOTROPY: u32 = 0x84FE;
pub(crate) const MAX_TEXTURE_MAX_ANISOTROPY: u32 = 0x84FF;
pub(crate) const HALF_FLOAT_OES: u32 = 0x8D61;
const LUMINANCE: u32 = 0x1909;
const LUMINANCE_ALPHA: u32 = 0x190A;
const COMPRESSED_RGBA_S3TC_DXT1: u32 = 0x83F1;
const COMPRESSED_RGBA_S3TC_DXT5: u32 = 0x83F3;
const ETC1_RGB8: u32 = 0x8D64;
const COMPRESSED_RGBA8_ETC2_EAC: u32 = 0x9278;
const COMPRESSED_RGBA_ASTC_4X4: u32 = 0x93B0;
const COMPRESSED_RGBA_PVRTC_4BPPV1: u32 = 0x8C02;

/// Upload layout of a pixel format: internal format, format, component type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TextureFormat {
    pub internal: u32,
    pub format: u32,
    pub ty: u32,
}

const fn layout(internal: u32, format: u32, ty: u32) -> TextureFormat {
    TextureFormat { internal, format, ty }
}

/// Upload layout for `format`
///
/// The legacy generation only accepts unsized internal formats, so the
/// internal format repeats the pixel format there.
pub(crate) fn texture_format(format: PixelFormat, generation: ApiGeneration) -> TextureFormat {
    if format.is_compressed() {
        return layout(compressed_format(format), 0, 0);
    }

    match generation {
        ApiGeneration::Modern => match format {
            PixelFormat::R8 => layout(glow::R8, glow::RED, glow::UNSIGNED_BYTE),
            PixelFormat::RG8 => layout(glow::RG8, glow::RG, glow::UNSIGNED_BYTE),
            PixelFormat::RGB8 => layout(glow::RGB8, glow::RGB, glow::UNSIGNED_BYTE),
            PixelFormat::SRGBA8 => layout(glow::SRGB8_ALPHA8, glow::RGBA, glow::UNSIGNED_BYTE),
            PixelFormat::R16F => layout(glow::R16F, glow::RED, glow::HALF_FLOAT),
            PixelFormat::RGBA16F => layout(glow::RGBA16F, glow::RGBA, glow::HALF_FLOAT),
            PixelFormat::R32F => layout(glow::R32F, glow::RED, glow::FLOAT),
            PixelFormat::RGBA32F => layout(glow::RGBA32F, glow::RGBA, glow::FLOAT),
            PixelFormat::Depth16 => layout(glow::DEPTH_COMPONENT16, glow::DEPTH_COMPONENT, glow::UNSIGNED_SHORT),
            PixelFormat::Depth32F => layout(glow::DEPTH_COMPONENT32F, glow::DEPTH_COMPONENT, glow::FLOAT),
            PixelFormat::Depth24Stencil8 => {
                layout(glow::DEPTH24_STENCIL8, glow::DEPTH_STENCIL, glow::UNSIGNED_INT_24_8)
            }
            _ => layout(glow::RGBA8, glow::RGBA, glow::UNSIGNED_BYTE),
        },
        ApiGeneration::Legacy => match format {
            PixelFormat::R8 => layout(LUMINANCE, LUMINANCE, glow::UNSIGNED_BYTE),
            PixelFormat::RG8 => layout(LUMINANCE_ALPHA, LUMINANCE_ALPHA, glow::UNSIGNED_BYTE),
            PixelFormat::RGB8 => layout(glow::RGB, glow::RGB, glow::UNSIGNED_BYTE),
            PixelFormat::R16F => layout(LUMINANCE, LUMINANCE, HALF_FLOAT_OES),
            PixelFormat::RGBA16F => layout(glow::RGBA, glow::RGBA, HALF_FLOAT_OES),
            PixelFormat::R32F => layout(LUMINANCE, LUMINANCE, glow::FLOAT),
            PixelFormat::RGBA32F => layout(glow::RGBA, glow::RGBA, glow::FLOAT),
            PixelFormat::Depth16 => layout(glow::DEPTH_COMPONENT, glow::DEPTH_COMPONENT, glow::UNSIGNED_SHORT),
            PixelFormat::Depth32F => layout(glow::DEPTH_COMPONENT, glow::DEPTH_COMPONENT, glow::UNSIGNED_INT),
            PixelFormat::Depth24Stencil8 => {
                layout(glow::DEPTH_STENCIL, glow::DEPTH_STENCIL, glow::UNSIGNED_INT_24_8)
            }
            _ => layout(glow::RGBA, glow::RGBA, glow::UNSIGNED_BYTE),
        },
    }
}

fn compressed_format(format: PixelFormat) -> u32 {
    match format {
        PixelFormat::DXT1 => COMPRESSED_RGBA_S3TC_DXT1,
        PixelFormat::DXT5 => COMPRESSED_RGBA_S3TC_DXT5,
        PixelFormat::ETC1 => ETC1_RGB8,
        PixelFormat::ETC2_RGBA => COMPRESSED_RGBA8_ETC2_EAC,
        PixelFormat::ASTC_4x4 => COMPRESSED_RGBA_ASTC_4X4,
        _ => COMPRESSED_RGBA_PVRTC_4BPPV1,
    }
}

/// Sized internal format used for renderbuffer storage
pub(crate) fn renderbuffer_format(format: PixelFormat) -> u32 {
    match format {
        PixelFormat::Depth16 => glow::DEPTH_COMPONENT16,
        PixelFormat::Depth32F => glow::DEPTH_COMPONENT32F,
        PixelFormat::Depth24Stencil8 => glow::DEPTH24_STENCIL8,
        PixelFormat::RGBA16F => glow::RGBA16F,
        PixelFormat::RGBA32F => glow::RGBA32F,
        PixelFormat::SRGBA8 => glow::SRGB8_ALPHA8,
        _ => glow::RGBA8,
    }
}

pub(crate) fn texture_target(target: TextureTarget) -> u32 {
    match target {
        TextureTarget::Texture2D => glow::TEXTURE_2D,
        TextureTarget::CubeMap => glow::TEXTURE_CUBE_MAP,
        TextureTarget::Texture2DArray => glow::TEXTURE_2D_ARRAY,
        TextureTarget::Texture3D => glow::TEXTURE_3D,
    }
}

/// Image target of one level upload: the cube face for cube maps
pub(crate) fn image_target(target: TextureTarget, face: u32) -> u32 {
    match target {
        TextureTarget::CubeMap => glow::TEXTURE_CUBE_MAP_POSITIVE_X + face.min(5),
        other => texture_target(other),
    }
}

pub(crate) fn capability(capability: Capability) -> u32 {
    match capability {
        Capability::Blend => glow::BLEND,
        Capability::CullFace => glow::CULL_FACE,
        Capability::DepthTest => glow::DEPTH_TEST,
        Capability::StencilTest => glow::STENCIL_TEST,
        Capability::ScissorTest => glow::SCISSOR_TEST,
        Capability::PolygonOffsetFill => glow::POLYGON_OFFSET_FILL,
        Capability::SampleAlphaToCoverage => glow::SAMPLE_ALPHA_TO_COVERAGE,
        Capability::RasterizerDiscard => glow::RASTERIZER_DISCARD,
    }
}

pub(crate) fn blend_equation(equation: BlendEquation) -> u32 {
    match equation {
        BlendEquation::Add => glow::FUNC_ADD,
        BlendEquation::Subtract => glow::FUNC_SUBTRACT,
        BlendEquation::ReverseSubtract => glow::FUNC_REVERSE_SUBTRACT,
        BlendEquation::Min => glow::MIN,
        BlendEquation::Max => glow::MAX,
    }
}

pub(crate) fn blend_factor(factor: BlendFactor) -> u32 {
    match factor {
        BlendFactor::Zero => glow::ZERO,
        BlendFactor::One => glow::ONE,
        BlendFactor::SrcColor => glow::SRC_COLOR,
        BlendFactor::OneMinusSrcColor => glow::ONE_MINUS_SRC_COLOR,
        BlendFactor::DstColor => glow::DST_COLOR,
        BlendFactor::OneMinusDstColor => glow::ONE_MINUS_DST_COLOR,
        BlendFactor::SrcAlpha => glow::SRC_ALPHA,
        BlendFactor::SrcAlphaSaturate => glow::SRC_ALPHA_SATURATE,
        BlendFactor::OneMinusSrcAlpha => glow::ONE_MINUS_SRC_ALPHA,
        BlendFactor::DstAlpha => glow::DST_ALPHA,
        BlendFactor::OneMinusDstAlpha => glow::ONE_MINUS_DST_ALPHA,
        BlendFactor::ConstantColor => glow::CONSTANT_COLOR,
        BlendFactor::OneMinusConstantColor => glow::ONE_MINUS_CONSTANT_COLOR,
    }
}

pub(crate) fn compare_func(func: CompareFunc) -> u32 {
    match func {
        CompareFunc::Never => glow::NEVER,
        CompareFunc::Less => glow::LESS,
        CompareFunc::Equal => glow::EQUAL,
        CompareFunc::LessEqual => glow::LEQUAL,
        CompareFunc::Greater => glow::GREATER,
        CompareFunc::NotEqual => glow::NOTEQUAL,
        CompareFunc::GreaterEqual => glow::GEQUAL,
        CompareFunc::Always => glow::ALWAYS,
    }
}

pub(crate) fn stencil_op(op: StencilOp) -> u32 {
    match op {
        StencilOp::Keep => glow::KEEP,
        StencilOp::Zero => glow::ZERO,
        StencilOp::Replace => glow::REPLACE,
        StencilOp::Increment => glow::INCR,
        StencilOp::IncrementWrap => glow::INCR_WRAP,
        StencilOp::Decrement => glow::DECR,
        StencilOp::DecrementWrap => glow::DECR_WRAP,
        StencilOp::Invert => glow::INVERT,
    }
}

pub(crate) fn face(face: Face) -> u32 {
    match face {
        Face::Front => glow::FRONT,
        Face::Back => glow::BACK,
        Face::FrontAndBack => glow::FRONT_AND_BACK,
    }
}

pub(crate) fn front_face(front_face: FrontFace) -> u32 {
    match front_face {
        FrontFace::CounterClockwise => glow::CCW,
        FrontFace::Clockwise => glow::CW,
    }
}

pub(crate) fn clear_mask(flags: ClearFlags) -> u32 {
    let mut mask = 0;
    if flags.contains(ClearFlags::COLOR) {
        mask |= glow::COLOR_BUFFER_BIT;
    }
    if flags.contains(ClearFlags::DEPTH) {
        mask |= glow::DEPTH_BUFFER_BIT;
    }
    if flags.contains(ClearFlags::STENCIL) {
        mask |= glow::STENCIL_BUFFER_BIT;
    }
    mask
}

pub(crate) fn filter(mode: FilterMode) -> i32 {
    let value = match mode {
        FilterMode::Nearest => glow::NEAREST,
        FilterMode::Linear => glow::LINEAR,
        FilterMode::NearestMipmapNearest => glow::NEAREST_MIPMAP_NEAREST,
        FilterMode::NearestMipmapLinear => glow::NEAREST_MIPMAP_LINEAR,
        FilterMode::LinearMipmapNearest => glow::LINEAR_MIPMAP_NEAREST,
        FilterMode::LinearMipmapLinear => glow::LINEAR_MIPMAP_LINEAR,
    };
    value as i32
}

pub(crate) fn address(mode: AddressMode) -> i32 {
    let value = match mode {
        AddressMode::Repeat => glow::REPEAT,
        AddressMode::ClampToEdge => glow::CLAMP_TO_EDGE,
        AddressMode::MirroredRepeat => glow::MIRRORED_REPEAT,
    };
    value as i32
}

pub(crate) fn buffer_target(target: BufferTarget) -> u32 {
    match target {
        BufferTarget::Array => glow::ARRAY_BUFFER,
        BufferTarget::ElementArray => glow::ELEMENT_ARRAY_BUFFER,
        BufferTarget::PixelPack => glow::PIXEL_PACK_BUFFER,
        BufferTarget::TransformFeedback => glow::TRANSFORM_FEEDBACK_BUFFER,
    }
}

/// Usage hint; pixel-pack buffers are read back by the CPU
pub(crate) fn buffer_usage(target: BufferTarget, usage: BufferUsage) -> u32 {
    match (target, usage) {
        (BufferTarget::PixelPack, BufferUsage::Static) => glow::STATIC_READ,
        (BufferTarget::PixelPack, BufferUsage::Dynamic) => glow::DYNAMIC_READ,
        (BufferTarget::PixelPack, BufferUsage::Stream) => glow::STREAM_READ,
        (_, BufferUsage::Static) => glow::STATIC_DRAW,
        (_, BufferUsage::Dynamic) => glow::DYNAMIC_DRAW,
        (_, BufferUsage::Stream) => glow::STREAM_DRAW,
    }
}

pub(crate) fn data_type(data_type: DataType, generation: ApiGeneration) -> u32 {
    match data_type {
        DataType::Int8 => glow::BYTE,
        DataType::UInt8 => glow::UNSIGNED_BYTE,
        DataType::Int16 => glow::SHORT,
        DataType::UInt16 => glow::UNSIGNED_SHORT,
        DataType::Int32 => glow::INT,
        DataType::UInt32 => glow::UNSIGNED_INT,
        DataType::Float16 if generation == ApiGeneration::Legacy => HALF_FLOAT_OES,
        DataType::Float16 => glow::HALF_FLOAT,
        DataType::Float32 => glow::FLOAT,
    }
}

pub(crate) fn index_format(format: IndexFormat) -> u32 {
    match format {
        IndexFormat::U8 => glow::UNSIGNED_BYTE,
        IndexFormat::U16 => glow::UNSIGNED_SHORT,
        IndexFormat::U32 => glow::UNSIGNED_INT,
    }
}

pub(crate) fn primitive(kind: PrimitiveType) -> u32 {
    match kind {
        PrimitiveType::Points => glow::POINTS,
        PrimitiveType::Lines => glow::LINES,
        PrimitiveType::LineLoop => glow::LINE_LOOP,
        PrimitiveType::LineStrip => glow::LINE_STRIP,
        PrimitiveType::Triangles => glow::TRIANGLES,
        PrimitiveType::TriangleStrip => glow::TRIANGLE_STRIP,
        PrimitiveType::TriangleFan => glow::TRIANGLE_FAN,
    }
}

pub(crate) fn framebuffer_target(target: FramebufferTarget) -> u32 {
    match target {
        FramebufferTarget::Framebuffer => glow::FRAMEBUFFER,
        FramebufferTarget::Read => glow::READ_FRAMEBUFFER,
        FramebufferTarget::Draw => glow::DRAW_FRAMEBUFFER,
    }
}

pub(crate) fn attachment(attachment: Attachment) -> u32 {
    match attachment {
        Attachment::Color(index) => glow::COLOR_ATTACHMENT0 + index,
        Attachment::Depth => glow::DEPTH_ATTACHMENT,
        Attachment::Stencil => glow::STENCIL_ATTACHMENT,
        Attachment::DepthStencil => glow::DEPTH_STENCIL_ATTACHMENT,
        Attachment::None => glow::NONE,
    }
}

pub(crate) fn blit_filter(filter: BlitFilter) -> u32 {
    match filter {
        BlitFilter::Nearest => glow::NEAREST,
        BlitFilter::Linear => glow::LINEAR,
    }
}

/// GL parameter queried for a limit
pub(crate) fn limit(limit: Limit, embedded: bool) -> u32 {
    match limit {
        Limit::MaxTextureSize => glow::MAX_TEXTURE_SIZE,
        Limit::MaxCubeMapSize => glow::MAX_CUBE_MAP_TEXTURE_SIZE,
        Limit::MaxRenderbufferSize => glow::MAX_RENDERBUFFER_SIZE,
        Limit::MaxTextureImageUnits => glow::MAX_TEXTURE_IMAGE_UNITS,
        Limit::MaxCombinedTextureImageUnits => glow::MAX_COMBINED_TEXTURE_IMAGE_UNITS,
        Limit::MaxVertexTextureImageUnits => glow::MAX_VERTEX_TEXTURE_IMAGE_UNITS,
        // Desktop GL reports components instead of vectors
        Limit::MaxVertexUniformVectors if !embedded => glow::MAX_VERTEX_UNIFORM_COMPONENTS,
        Limit::MaxFragmentUniformVectors if !embedded => glow::MAX_FRAGMENT_UNIFORM_COMPONENTS,
        Limit::MaxVertexUniformVectors => glow::MAX_VERTEX_UNIFORM_VECTORS,
        Limit::MaxFragmentUniformVectors => glow::MAX_FRAGMENT_UNIFORM_VECTORS,
        Limit::MaxDrawBuffers => glow::MAX_DRAW_BUFFERS,
        Limit::MaxColorAttachments => glow::MAX_COLOR_ATTACHMENTS,
        Limit::MaxSamples => glow::MAX_SAMPLES,
        Limit::Max3dTextureSize => glow::MAX_3D_TEXTURE_SIZE,
        Limit::MaxArrayTextureLayers => glow::MAX_ARRAY_TEXTURE_LAYERS,
    }
}

/// Divisor applied to the raw query result (components to vectors)
pub(crate) fn limit_scale(limit: Limit, embedded: bool) -> i32 {
    match limit {
        Limit::MaxVertexUniformVectors | Limit::MaxFragmentUniformVectors if !embedded => 4,
        _ => 1,
    }
}

pub(crate) fn active_uniform_type(ty: u32) -> Option<ActiveUniformType> {
    let ty = match ty {
        glow::FLOAT => ActiveUniformType::Float,
        glow::FLOAT_VEC2 => ActiveUniformType::FloatVec2,
        glow::FLOAT_VEC3 => ActiveUniformType::FloatVec3,
        glow::FLOAT_VEC4 => ActiveUniformType::FloatVec4,
        glow::INT => ActiveUniformType::Int,
        glow::INT_VEC2 => ActiveUniformType::IntVec2,
        glow::INT_VEC3 => ActiveUniformType::IntVec3,
        glow::INT_VEC4 => ActiveUniformType::IntVec4,
        glow::UNSIGNED_INT => ActiveUniformType::UInt,
        glow::UNSIGNED_INT_VEC2 => ActiveUniformType::UIntVec2,
        glow::UNSIGNED_INT_VEC3 => ActiveUniformType::UIntVec3,
        glow::UNSIGNED_INT_VEC4 => ActiveUniformType::UIntVec4,
        glow::BOOL => ActiveUniformType::Bool,
        glow::BOOL_VEC2 => ActiveUniformType::BoolVec2,
        glow::BOOL_VEC3 => ActiveUniformType::BoolVec3,
        glow::BOOL_VEC4 => ActiveUniformType::BoolVec4,
        glow::FLOAT_MAT2 => ActiveUniformType::FloatMat2,
        glow::FLOAT_MAT3 => ActiveUniformType::FloatMat3,
        glow::FLOAT_MAT4 => ActiveUniformType::FloatMat4,
        glow::SAMPLER_2D => ActiveUniformType::Sampler2D,
        glow::SAMPLER_CUBE => ActiveUniformType::SamplerCube,
        glow::SAMPLER_2D_SHADOW => ActiveUniformType::Sampler2DShadow,
        glow::SAMPLER_CUBE_SHADOW => ActiveUniformType::SamplerCubeShadow,
        glow::SAMPLER_2D_ARRAY => ActiveUniformType::Sampler2DArray,
        glow::SAMPLER_2D_ARRAY_SHADOW => ActiveUniformType::Sampler2DArrayShadow,
        glow::SAMPLER_3D => ActiveUniformType::Sampler3D,
        glow::INT_SAMPLER_2D => ActiveUniformType::IntSampler2D,
        glow::UNSIGNED_INT_SAMPLER_2D => ActiveUniformType::UIntSampler2D,
        _ => return None,
    };
    Some(ty)
}

#[cfg(test)]
#[path = "glow_format_tests.rs"]
mod tests;
