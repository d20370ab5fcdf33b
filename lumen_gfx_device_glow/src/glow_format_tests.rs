//! Unit tests for GL enum conversion functions
//!
//! Pure conversions, no GL context required.

use super::*;

// ============================================================================
// PIXEL FORMATS
// ============================================================================

#[test]
fn test_modern_formats_are_sized() {
    assert_eq!(
        texture_format(PixelFormat::RGBA16F, ApiGeneration::Modern),
        TextureFormat { internal: glow::RGBA16F, format: glow::RGBA, ty: glow::HALF_FLOAT }
    );
    assert_eq!(
        texture_format(PixelFormat::Depth24Stencil8, ApiGeneration::Modern),
        TextureFormat { internal: glow::DEPTH24_STENCIL8, format: glow::DEPTH_STENCIL, ty: glow::UNSIGNED_INT_24_8 }
    );
    assert_eq!(texture_format(PixelFormat::SRGBA8, ApiGeneration::Modern).internal, glow::SRGB8_ALPHA8);
}

#[test]
fn test_legacy_formats_are_unsized() {
    let rgba = texture_format(PixelFormat::RGBA8, ApiGeneration::Legacy);
    assert_eq!(rgba.internal, rgba.format);
    assert_eq!(rgba.internal, glow::RGBA);

    // Half floats use the extension enum on this generation
    assert_eq!(texture_format(PixelFormat::RGBA16F, ApiGeneration::Legacy).ty, HALF_FLOAT_OES);
    assert_eq!(texture_format(PixelFormat::R8, ApiGeneration::Legacy).format, LUMINANCE);
}

#[test]
fn test_compressed_formats() {
    let dxt1 = texture_format(PixelFormat::DXT1, ApiGeneration::Modern);
    assert_eq!(dxt1.internal, COMPRESSED_RGBA_S3TC_DXT1);
    assert_eq!(texture_format(PixelFormat::ASTC_4x4, ApiGeneration::Legacy).internal, COMPRESSED_RGBA_ASTC_4X4);
}

#[test]
fn test_renderbuffer_formats_are_sized() {
    assert_eq!(renderbuffer_format(PixelFormat::Depth16), glow::DEPTH_COMPONENT16);
    assert_eq!(renderbuffer_format(PixelFormat::RGBA8), glow::RGBA8);
    assert_eq!(renderbuffer_format(PixelFormat::RGBA16F), glow::RGBA16F);
}

// ============================================================================
// TARGETS & ATTACHMENTS
// ============================================================================

#[test]
fn test_cube_faces_select_image_targets() {
    assert_eq!(image_target(TextureTarget::CubeMap, 0), glow::TEXTURE_CUBE_MAP_POSITIVE_X);
    assert_eq!(image_target(TextureTarget::CubeMap, 5), glow::TEXTURE_CUBE_MAP_NEGATIVE_Z);
    assert_eq!(image_target(TextureTarget::Texture2D, 3), glow::TEXTURE_2D);
}

#[test]
fn test_color_attachments_are_offset() {
    assert_eq!(attachment(Attachment::Color(0)), glow::COLOR_ATTACHMENT0);
    assert_eq!(attachment(Attachment::Color(3)), glow::COLOR_ATTACHMENT3);
    assert_eq!(attachment(Attachment::DepthStencil), glow::DEPTH_STENCIL_ATTACHMENT);
}

#[test]
fn test_pixel_pack_buffers_use_read_hints() {
    assert_eq!(buffer_usage(BufferTarget::PixelPack, BufferUsage::Stream), glow::STREAM_READ);
    assert_eq!(buffer_usage(BufferTarget::Array, BufferUsage::Stream), glow::STREAM_DRAW);
    assert_eq!(buffer_usage(BufferTarget::ElementArray, BufferUsage::Static), glow::STATIC_DRAW);
}

// ============================================================================
// STATE
// ============================================================================

#[test]
fn test_clear_mask_combines_bits() {
    assert_eq!(clear_mask(ClearFlags::empty()), 0);
    assert_eq!(
        clear_mask(ClearFlags::COLOR | ClearFlags::DEPTH),
        glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT
    );
    assert_eq!(clear_mask(ClearFlags::all()), glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT | glow::STENCIL_BUFFER_BIT);
}

#[test]
fn test_compare_and_stencil_enums() {
    assert_eq!(compare_func(CompareFunc::LessEqual), glow::LEQUAL);
    assert_eq!(compare_func(CompareFunc::GreaterEqual), glow::GEQUAL);
    assert_eq!(stencil_op(StencilOp::IncrementWrap), glow::INCR_WRAP);
    assert_eq!(face(Face::FrontAndBack), glow::FRONT_AND_BACK);
}

#[test]
fn test_half_float_attributes_per_generation() {
    assert_eq!(data_type(DataType::Float16, ApiGeneration::Modern), glow::HALF_FLOAT);
    assert_eq!(data_type(DataType::Float16, ApiGeneration::Legacy), HALF_FLOAT_OES);
    assert_eq!(data_type(DataType::UInt8, ApiGeneration::Legacy), glow::UNSIGNED_BYTE);
}

// ============================================================================
// LIMITS & REFLECTION
// ============================================================================

#[test]
fn test_desktop_uniform_limits_report_components() {
    assert_eq!(limit(Limit::MaxVertexUniformVectors, false), glow::MAX_VERTEX_UNIFORM_COMPONENTS);
    assert_eq!(limit_scale(Limit::MaxVertexUniformVectors, false), 4);
    assert_eq!(limit(Limit::MaxVertexUniformVectors, true), glow::MAX_VERTEX_UNIFORM_VECTORS);
    assert_eq!(limit_scale(Limit::MaxVertexUniformVectors, true), 1);
    assert_eq!(limit_scale(Limit::MaxTextureSize, false), 1);
}

#[test]
fn test_active_uniform_types() {
    assert_eq!(active_uniform_type(glow::FLOAT_MAT4), Some(ActiveUniformType::FloatMat4));
    assert_eq!(active_uniform_type(glow::SAMPLER_2D_SHADOW), Some(ActiveUniformType::Sampler2DShadow));
    assert_eq!(active_uniform_type(glow::UNSIGNED_INT_SAMPLER_2D), Some(ActiveUniformType::UIntSampler2D));
    // Image uniforms have no device counterpart
    assert_eq!(active_uniform_type(glow::IMAGE_2D), None);
}

#[test]
fn test_filters_and_primitives() {
    assert_eq!(filter(FilterMode::LinearMipmapLinear), glow::LINEAR_MIPMAP_LINEAR as i32);
    assert_eq!(address(AddressMode::MirroredRepeat), glow::MIRRORED_REPEAT as i32);
    assert_eq!(primitive(PrimitiveType::TriangleFan), glow::TRIANGLE_FAN);
    assert_eq!(index_format(IndexFormat::U32), glow::UNSIGNED_INT);
}
