use super::*;

#[test]
fn test_core_features_always_reported() {
    let names = extension_aliases(std::iter::empty());

    assert_eq!(names, vec!["OES_element_index_uint".to_string(), "WEBGL_debug_renderer_info".to_string()]);
}

#[test]
fn test_desktop_names_map_to_webgl_names() {
    let names = extension_aliases(["GL_ARB_instanced_arrays", "GL_ARB_vertex_array_object", "GL_ARB_texture_float"]);

    assert!(names.iter().any(|n| n == "ANGLE_instanced_arrays"));
    assert!(names.iter().any(|n| n == "OES_vertex_array_object"));
    assert!(names.iter().any(|n| n == "OES_texture_float"));
    assert!(names.iter().any(|n| n == "OES_texture_float_linear"));
    assert!(!names.iter().any(|n| n == "WEBGL_draw_buffers"));
}

#[test]
fn test_gles_names_map_to_webgl_names() {
    let names = extension_aliases(["GL_OES_vertex_array_object", "GL_KHR_texture_compression_astc_ldr"]);

    assert!(names.iter().any(|n| n == "OES_vertex_array_object"));
    assert!(names.iter().any(|n| n == "WEBGL_compressed_texture_astc"));
    assert!(!names.iter().any(|n| n == "WEBGL_compressed_texture_s3tc"));
}

#[test]
fn test_context_loss_never_advertised() {
    let names = extension_aliases(["GL_KHR_robustness", "GL_EXT_texture_filter_anisotropic"]);

    assert!(names.iter().any(|n| n == "EXT_texture_filter_anisotropic"));
    assert!(!names.iter().any(|n| n == "WEBGL_lose_context"));
}
