//! Extension names
//!
//! The capability probe asks for WebGL extension names. Native drivers
//! advertise the same features under GL / GLES names, or as core features.

use rustc_hash::FxHashSet;

/// Native name that is always present, for features every GL driver has
const ALWAYS: &str = "";

/// WebGL extension name and the native names that provide it
const ALIASES: &[(&str, &[&str])] = &[
    ("ANGLE_instanced_arrays", &["GL_ARB_instanced_arrays", "GL_ANGLE_instanced_arrays", "GL_EXT_instanced_arrays"]),
    (
        "OES_vertex_array_object",
        &["GL_ARB_vertex_array_object", "GL_OES_vertex_array_object", "GL_APPLE_vertex_array_object"],
    ),
    ("WEBGL_draw_buffers", &["GL_ARB_draw_buffers", "GL_EXT_draw_buffers", "GL_NV_draw_buffers"]),
    ("EXT_color_buffer_float", &["GL_EXT_color_buffer_float", "GL_ARB_color_buffer_float"]),
    ("EXT_color_buffer_half_float", &["GL_EXT_color_buffer_half_float", "GL_ARB_color_buffer_float"]),
    ("WEBGL_color_buffer_float", &["GL_ARB_color_buffer_float", "GL_EXT_color_buffer_float"]),
    ("OES_texture_float", &["GL_ARB_texture_float", "GL_OES_texture_float"]),
    ("OES_texture_float_linear", &["GL_ARB_texture_float", "GL_OES_texture_float_linear"]),
    ("OES_texture_half_float", &["GL_ARB_half_float_pixel", "GL_OES_texture_half_float"]),
    ("OES_texture_half_float_linear", &["GL_ARB_half_float_pixel", "GL_OES_texture_half_float_linear"]),
    ("EXT_float_blend", &["GL_ARB_color_buffer_float", "GL_EXT_float_blend"]),
    (
        "EXT_texture_filter_anisotropic",
        &["GL_EXT_texture_filter_anisotropic", "GL_ARB_texture_filter_anisotropic"],
    ),
    ("WEBGL_depth_texture", &["GL_ARB_depth_texture", "GL_OES_depth_texture"]),
    ("OES_element_index_uint", &[ALWAYS]),
    // Vendor and renderer strings are never masked natively
    ("WEBGL_debug_renderer_info", &[ALWAYS]),
    ("WEBGL_compressed_texture_s3tc", &["GL_EXT_texture_compression_s3tc"]),
    ("WEBGL_compressed_texture_s3tc_srgb", &["GL_EXT_texture_sRGB", "GL_EXT_texture_compression_s3tc_srgb"]),
    ("WEBGL_compressed_texture_etc1", &["GL_OES_compressed_ETC1_RGB8_texture"]),
    ("WEBGL_compressed_texture_etc", &["GL_ARB_ES3_compatibility", "GL_OES_compressed_ETC2_RGBA8_texture"]),
    ("WEBGL_compressed_texture_astc", &["GL_KHR_texture_compression_astc_ldr"]),
    ("WEBGL_compressed_texture_pvrtc", &["GL_IMG_texture_compression_pvrtc"]),
];

/// WebGL extension names provided by a driver advertising `native`
pub fn extension_aliases<'a>(native: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let native: FxHashSet<&str> = native.into_iter().collect();
    ALIASES
        .iter()
        .filter(|(_, sources)| sources.iter().any(|name| *name == ALWAYS || native.contains(name)))
        .map(|(name, _)| name.to_string())
        .collect()
}

#[cfg(test)]
#[path = "glow_extensions_tests.rs"]
mod tests;
