//! Capability probe
//!
//! Queries the native context once per context lifetime and produces an
//! immutable `Capabilities` value. The table is rebuilt wholesale after a
//! context restore, never patched field by field.

use crate::native::{
    AddressMode, ApiGeneration, Attachment, ClearFlags, FilterMode, FramebufferTarget, Limit, NativeContext,
    PixelFormat, RendererStrings, TextureParameter, TextureTarget,
};

const SOURCE: &str = "lumen::Capabilities";

/// Color written and read back by the renderability probe
const PROBE_COLOR: [f32; 4] = [0.25, 0.5, 0.75, 1.0];

/// Value written and read back by the float precision probe
const PRECISION_PROBE_VALUE: f32 = 0.000_01;

// ===== PLATFORM =====

/// Operating system hosting the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Os {
    Windows,
    MacOs,
    Linux,
    Android,
    Ios,
    #[default]
    Other,
}

/// Browser family (when running inside a browser)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserName {
    Chrome,
    Firefox,
    Safari,
    Edge,
    Other,
}

/// Browser identification
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrowserInfo {
    pub name: BrowserName,
    pub version: f32,
}

/// Host platform description used by the workaround blocklist
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlatformInfo {
    pub os: Os,
    pub browser: Option<BrowserInfo>,
    pub user_agent: String,
}

// ===== VENDOR WORKAROUNDS =====

/// Effect of a matched blocklist entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workaround {
    DisableGpuParticles,
    DisableMsaa,
}

struct WorkaroundRule {
    name: &'static str,
    applies: fn(&RendererStrings, &PlatformInfo) -> bool,
    effect: Workaround,
}

const WORKAROUNDS: &[WorkaroundRule] = &[
    // Exynos GPUs on Samsung phones crash or corrupt GPU-driven particle updates
    WorkaroundRule {
        name: "arm-samsung-gpu-particles",
        applies: |renderer, platform| renderer.vendor == "ARM" && has_samsung_model(&platform.user_agent),
        effect: Workaround::DisableGpuParticles,
    },
    // Mali-G52 renders GPU particles incorrectly on every vendor that ships it
    WorkaroundRule {
        name: "mali-g52-gpu-particles",
        applies: |renderer, _| renderer.renderer.starts_with("Mali-G52"),
        effect: Workaround::DisableGpuParticles,
    },
    // Multisampled back buffers render black on these Firefox builds on Windows
    WorkaroundRule {
        name: "firefox-windows-msaa",
        applies: |_, platform| {
            platform.os == Os::Windows
                && platform.browser.is_some_and(|b| {
                    b.name == BrowserName::Firefox && (b.version >= 120.0 || b.version == 115.0)
                })
        },
        effect: Workaround::DisableMsaa,
    },
];

/// `SM-` followed by an alphanumeric model code
fn has_samsung_model(user_agent: &str) -> bool {
    user_agent.match_indices("SM-").any(|(index, _)| {
        user_agent[index + 3..].chars().next().is_some_and(|c| c.is_ascii_alphanumeric())
    })
}

/// Workarounds matching the given renderer and platform
pub fn matching_workarounds(renderer: &RendererStrings, platform: &PlatformInfo) -> Vec<Workaround> {
    WORKAROUNDS
        .iter()
        .filter(|rule| (rule.applies)(renderer, platform))
        .inspect(|rule| crate::gfx_info!(SOURCE, "Applying workaround '{}'", rule.name))
        .map(|rule| rule.effect)
        .collect()
}

/// Whether multisampling must be disabled before the context is even created
pub fn msaa_blocked(platform: &PlatformInfo) -> bool {
    matching_workarounds(&RendererStrings::default(), platform).contains(&Workaround::DisableMsaa)
}

// ===== EXTENSION SHIMS =====

/// How a generation-agnostic entry point reaches the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShimPath {
    /// Core entry point of the modern generation
    Core,
    /// Routed through the named legacy extension
    Extension(&'static str),
    /// Not available on this context
    Unavailable,
}

impl ShimPath {
    pub fn is_available(self) -> bool {
        self != ShimPath::Unavailable
    }
}

/// Which path each polyfilled entry point family uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtensionShims {
    pub instancing: ShimPath,
    pub vertex_arrays: ShimPath,
    pub draw_buffers: ShimPath,
}

impl ExtensionShims {
    fn install(native: &mut dyn NativeContext, generation: ApiGeneration) -> Self {
        if generation == ApiGeneration::Modern {
            return Self {
                instancing: ShimPath::Core,
                vertex_arrays: ShimPath::Core,
                draw_buffers: ShimPath::Core,
            };
        }

        let shim = |native: &mut dyn NativeContext, name: &'static str| {
            if native.enable_extension(name) { ShimPath::Extension(name) } else { ShimPath::Unavailable }
        };

        Self {
            instancing: shim(native, "ANGLE_instanced_arrays"),
            vertex_arrays: shim(native, "OES_vertex_array_object"),
            draw_buffers: shim(native, "WEBGL_draw_buffers"),
        }
    }
}

/// Compressed texture families the context can sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompressedFormats {
    pub s3tc: bool,
    pub s3tc_srgb: bool,
    pub etc1: bool,
    pub etc2: bool,
    pub astc: bool,
    pub pvrtc: bool,
}

impl CompressedFormats {
    pub fn supports(&self, format: PixelFormat) -> bool {
        match format {
            PixelFormat::DXT1 | PixelFormat::DXT5 => self.s3tc,
            PixelFormat::ETC1 => self.etc1,
            PixelFormat::ETC2_RGBA => self.etc2,
            PixelFormat::ASTC_4x4 => self.astc,
            PixelFormat::PVRTC_4BPP_RGBA => self.pvrtc,
            _ => true,
        }
    }
}

// ===== CAPABILITY TABLE =====

/// Immutable snapshot of what the native context supports
#[derive(Debug, Clone, PartialEq)]
pub struct Capabilities {
    pub generation: ApiGeneration,
    pub shims: ExtensionShims,
    /// Extensions successfully enabled during the probe
    pub enabled_extensions: Vec<String>,

    // Features
    pub instancing: bool,
    pub vertex_arrays: bool,
    pub multiple_render_targets: bool,
    pub depth_textures: bool,
    pub uint_indices: bool,
    pub texture_float: bool,
    pub texture_half_float: bool,
    pub texture_float_linear: bool,
    pub texture_half_float_linear: bool,
    pub texture_float_renderable: bool,
    pub texture_half_float_renderable: bool,
    pub float_blend: bool,
    pub anisotropic_filtering: bool,
    pub compressed: CompressedFormats,
    pub transform_feedback: bool,
    pub volume_textures: bool,
    pub debug_renderer_info: bool,
    pub lose_context: bool,

    // Limits
    pub max_texture_size: u32,
    pub max_cube_map_size: u32,
    pub max_renderbuffer_size: u32,
    pub max_textures: u32,
    pub max_combined_textures: u32,
    pub max_vertex_textures: u32,
    pub vertex_uniform_vectors: u32,
    pub fragment_uniform_vectors: u32,
    pub max_draw_buffers: u32,
    pub max_color_attachments: u32,
    pub max_samples: u32,
    pub max_volume_size: u32,
    pub max_anisotropy: f32,

    // Identification and workarounds
    pub renderer: RendererStrings,
    pub supports_gpu_particles: bool,
    pub supports_msaa: bool,
}

impl Capabilities {
    /// Probe the context. Runs at construction and after every restore.
    pub fn probe(native: &mut dyn NativeContext, platform: &PlatformInfo) -> Self {
        let generation = native.api_generation();
        let modern = generation == ApiGeneration::Modern;
        let mut enabled = Vec::new();

        let shims = ExtensionShims::install(native, generation);
        for path in [shims.instancing, shims.vertex_arrays, shims.draw_buffers] {
            if let ShimPath::Extension(name) = path {
                enabled.push(name.to_string());
            }
        }

        let mut enable = |native: &mut dyn NativeContext, names: &[&str]| -> bool {
            for name in names {
                if native.enable_extension(name) {
                    enabled.push(name.to_string());
                    return true;
                }
            }
            false
        };

        let color_buffer_float = enable(native, &["EXT_color_buffer_float"]);
        let texture_float_linear = enable(native, &["OES_texture_float_linear"]);
        let float_blend = enable(native, &["EXT_float_blend"]);
        let anisotropic_filtering = enable(native, &["EXT_texture_filter_anisotropic", "WEBKIT_EXT_texture_filter_anisotropic"]);
        let debug_renderer_info = enable(native, &["WEBGL_debug_renderer_info"]);
        let lose_context = enable(native, &["WEBGL_lose_context"]);
        let compressed = CompressedFormats {
            s3tc: enable(native, &["WEBGL_compressed_texture_s3tc", "WEBKIT_WEBGL_compressed_texture_s3tc"]),
            s3tc_srgb: enable(native, &["WEBGL_compressed_texture_s3tc_srgb"]),
            etc1: enable(native, &["WEBGL_compressed_texture_etc1"]),
            etc2: enable(native, &["WEBGL_compressed_texture_etc"]),
            astc: enable(native, &["WEBGL_compressed_texture_astc"]),
            pvrtc: enable(native, &["WEBGL_compressed_texture_pvrtc", "WEBKIT_WEBGL_compressed_texture_pvrtc"]),
        };

        let texture_float = modern || enable(native, &["OES_texture_float"]);
        let texture_half_float = modern || enable(native, &["OES_texture_half_float"]);
        let texture_half_float_linear = modern || enable(native, &["OES_texture_half_float_linear"]);
        let depth_textures = modern || enable(native, &["WEBGL_depth_texture"]);
        let uint_indices = modern || enable(native, &["OES_element_index_uint"]);
        let color_buffer_half_float = enable(native, &["EXT_color_buffer_half_float"]);
        if !modern {
            enable(native, &["WEBGL_color_buffer_float"]);
        }

        let (texture_float_renderable, texture_half_float_renderable) = if modern {
            (color_buffer_float, color_buffer_float || color_buffer_half_float)
        } else {
            // No capability bit on this generation: render into one and read it back
            (
                texture_float && probe_renderable(native, PixelFormat::RGBA32F),
                texture_half_float && probe_renderable(native, PixelFormat::RGBA16F),
            )
        };

        let max_draw_buffers = if shims.draw_buffers.is_available() { query(native, Limit::MaxDrawBuffers).max(1) } else { 1 };
        let max_color_attachments = if shims.draw_buffers.is_available() { query(native, Limit::MaxColorAttachments).max(1) } else { 1 };

        let renderer = native.renderer_strings(debug_renderer_info);
        let workarounds = matching_workarounds(&renderer, platform);

        let caps = Self {
            generation,
            shims,
            enabled_extensions: enabled,
            instancing: shims.instancing.is_available(),
            vertex_arrays: shims.vertex_arrays.is_available(),
            multiple_render_targets: shims.draw_buffers.is_available() && max_draw_buffers > 1,
            depth_textures,
            uint_indices,
            texture_float,
            texture_half_float,
            texture_float_linear,
            texture_half_float_linear,
            texture_float_renderable,
            texture_half_float_renderable,
            float_blend,
            anisotropic_filtering,
            compressed,
            transform_feedback: modern,
            volume_textures: modern,
            debug_renderer_info,
            lose_context,
            max_texture_size: query(native, Limit::MaxTextureSize),
            max_cube_map_size: query(native, Limit::MaxCubeMapSize),
            max_renderbuffer_size: query(native, Limit::MaxRenderbufferSize),
            max_textures: query(native, Limit::MaxTextureImageUnits),
            max_combined_textures: query(native, Limit::MaxCombinedTextureImageUnits).max(1),
            max_vertex_textures: query(native, Limit::MaxVertexTextureImageUnits),
            vertex_uniform_vectors: query(native, Limit::MaxVertexUniformVectors),
            fragment_uniform_vectors: query(native, Limit::MaxFragmentUniformVectors),
            max_draw_buffers,
            max_color_attachments,
            max_samples: if modern { query(native, Limit::MaxSamples).max(1) } else { 1 },
            max_volume_size: if modern { query(native, Limit::Max3dTextureSize) } else { 1 },
            max_anisotropy: if anisotropic_filtering { native.max_anisotropy().max(1.0) } else { 1.0 },
            renderer,
            supports_gpu_particles: !workarounds.contains(&Workaround::DisableGpuParticles),
            supports_msaa: !workarounds.contains(&Workaround::DisableMsaa),
        };

        crate::gfx_info!(
            SOURCE,
            "{:?} context on '{}' / '{}': {} combined texture units, {} samples, {} extensions",
            caps.generation,
            caps.renderer.vendor,
            caps.renderer.renderer,
            caps.max_combined_textures,
            caps.max_samples,
            caps.enabled_extensions.len()
        );

        caps
    }

    pub fn is_modern(&self) -> bool {
        self.generation == ApiGeneration::Modern
    }

    /// Whether textures of this format can be created on this context
    pub fn supports_format(&self, format: PixelFormat) -> bool {
        if format.is_compressed() {
            return self.compressed.supports(format);
        }
        if format.is_float() {
            return self.texture_float;
        }
        if format.is_half_float() {
            return self.texture_half_float;
        }
        if format.is_depth() {
            return self.depth_textures;
        }
        true
    }
}

fn query(native: &dyn NativeContext, limit: Limit) -> u32 {
    native.limit(limit).max(0) as u32
}

// ===== RENDERABILITY PROBES =====

/// Create a 1x1 color target of `format`, clear it to `PROBE_COLOR` and
/// compare the read-back. A mismatch counts as unsupported.
pub fn probe_renderable(native: &mut dyn NativeContext, format: PixelFormat) -> bool {
    with_probe_target(native, format, |native| {
        native.clear_color(PROBE_COLOR);
        native.clear(ClearFlags::COLOR);

        let mut pixel = [0u8; 4];
        native.read_pixels(0, 0, 1, 1, &mut pixel);
        pixel
            .iter()
            .zip(PROBE_COLOR.iter())
            .all(|(&actual, &expected)| (actual as f32 - expected * 255.0).abs() <= 1.0)
    })
}

/// Check that a 32-bit float target keeps a value below half-float precision
pub fn probe_float_high_precision(native: &mut dyn NativeContext) -> bool {
    with_probe_target(native, PixelFormat::RGBA32F, |native| {
        native.clear_color([PRECISION_PROBE_VALUE; 4]);
        native.clear(ClearFlags::COLOR);

        let mut pixel = [0.0f32; 4];
        native.read_pixels_f32(0, 0, 1, 1, &mut pixel);
        (pixel[0] - PRECISION_PROBE_VALUE).abs() < PRECISION_PROBE_VALUE * 0.01
    })
}

fn with_probe_target(
    native: &mut dyn NativeContext,
    format: PixelFormat,
    test: impl FnOnce(&mut dyn NativeContext) -> bool,
) -> bool {
    let Ok(texture) = native.create_texture() else {
        return false;
    };
    native.bind_texture(TextureTarget::Texture2D, Some(texture));
    for parameter in [
        TextureParameter::MinFilter(FilterMode::Nearest),
        TextureParameter::MagFilter(FilterMode::Nearest),
        TextureParameter::WrapS(AddressMode::ClampToEdge),
        TextureParameter::WrapT(AddressMode::ClampToEdge),
    ] {
        native.tex_parameter(TextureTarget::Texture2D, parameter);
    }
    native.tex_image_2d(TextureTarget::Texture2D, 0, 0, format, 1, 1, None);

    let result = match native.create_framebuffer() {
        Ok(framebuffer) => {
            native.bind_framebuffer(FramebufferTarget::Framebuffer, Some(framebuffer));
            native.framebuffer_texture_2d(Attachment::Color(0), TextureTarget::Texture2D, 0, Some(texture), 0);
            let result = native.check_framebuffer_status() && test(native);
            native.bind_framebuffer(FramebufferTarget::Framebuffer, None);
            native.delete_framebuffer(framebuffer);
            result
        }
        Err(_) => false,
    };

    native.bind_texture(TextureTarget::Texture2D, None);
    native.delete_texture(texture);
    result
}

#[cfg(test)]
#[path = "capabilities_tests.rs"]
mod tests;
