//! Typed handles and enums shared by the device and native backends.
//!
//! Every value that crosses the `NativeContext` seam is expressed with one of
//! these types. Backends translate them to their raw driver enums.

use std::num::NonZeroU32;
use bitflags::bitflags;

macro_rules! native_handle {
    ($($(#[$meta:meta])* $name:ident;)*) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
            pub struct $name(pub NonZeroU32);
        )*
    };
}

native_handle! {
    /// Native texture object
    NativeTexture;
    /// Native buffer object
    NativeBuffer;
    /// Native vertex array object
    NativeVertexArray;
    /// Native framebuffer object
    NativeFramebuffer;
    /// Native renderbuffer object
    NativeRenderbuffer;
    /// Native linked program
    NativeProgram;
}

/// Native fence object (backend-assigned key)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeSync(pub u64);

/// Location of an active uniform inside a linked program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

// ===== API GENERATION =====

/// Native API generation backing the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiGeneration {
    /// WebGL 1 / OpenGL ES 2 class API (features come from extensions)
    Legacy,
    /// WebGL 2 / OpenGL ES 3 class API
    Modern,
}

/// Numeric limits that can be queried from a native context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Limit {
    MaxTextureSize,
    MaxCubeMapSize,
    MaxRenderbufferSize,
    MaxTextureImageUnits,
    MaxCombinedTextureImageUnits,
    MaxVertexTextureImageUnits,
    MaxVertexUniformVectors,
    MaxFragmentUniformVectors,
    MaxDrawBuffers,
    MaxColorAttachments,
    MaxSamples,
    Max3dTextureSize,
    MaxArrayTextureLayers,
}

/// Vendor and renderer identification strings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RendererStrings {
    pub vendor: String,
    pub renderer: String,
}

// ===== RENDER STATE =====

/// Toggleable fixed-function capabilities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Blend,
    CullFace,
    DepthTest,
    StencilTest,
    ScissorTest,
    PolygonOffsetFill,
    SampleAlphaToCoverage,
    RasterizerDiscard,
}

/// Blend equation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendEquation {
    Add,
    Subtract,
    ReverseSubtract,
    Min,
    Max,
}

/// Blend factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    DstColor,
    OneMinusDstColor,
    SrcAlpha,
    SrcAlphaSaturate,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
    ConstantColor,
    OneMinusConstantColor,
}

/// Comparison function for depth, stencil and shadow sampling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareFunc {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

/// Stencil operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StencilOp {
    Keep,
    Zero,
    Replace,
    Increment,
    IncrementWrap,
    Decrement,
    DecrementWrap,
    Invert,
}

/// Polygon face selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Face {
    Front,
    Back,
    FrontAndBack,
}

/// Winding order of front-facing polygons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrontFace {
    CounterClockwise,
    Clockwise,
}

bitflags! {
    /// Buffers affected by a clear or a framebuffer blit
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u32 {
        const COLOR = 1;
        const DEPTH = 2;
        const STENCIL = 4;
    }
}

// ===== TEXTURES =====

/// Texture binding target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureTarget {
    Texture2D,
    CubeMap,
    Texture2DArray,
    Texture3D,
}

impl TextureTarget {
    /// Number of distinct targets (size of a texture-unit slot)
    pub const COUNT: usize = 4;

    /// Dense index used by per-unit binding tables
    pub fn index(self) -> usize {
        match self {
            TextureTarget::Texture2D => 0,
            TextureTarget::CubeMap => 1,
            TextureTarget::Texture2DArray => 2,
            TextureTarget::Texture3D => 3,
        }
    }

    /// Whether the target only exists on the modern generation
    pub fn requires_modern(self) -> bool {
        matches!(self, TextureTarget::Texture2DArray | TextureTarget::Texture3D)
    }
}

/// Pixel formats understood by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum PixelFormat {
    R8,
    RG8,
    RGB8,
    RGBA8,
    SRGBA8,
    R16F,
    RGBA16F,
    R32F,
    RGBA32F,
    Depth16,
    Depth32F,
    Depth24Stencil8,
    // Compressed formats
    DXT1,
    DXT5,
    ETC1,
    ETC2_RGBA,
    ASTC_4x4,
    PVRTC_4BPP_RGBA,
}

impl PixelFormat {
    pub fn is_compressed(self) -> bool {
        matches!(
            self,
            PixelFormat::DXT1
                | PixelFormat::DXT5
                | PixelFormat::ETC1
                | PixelFormat::ETC2_RGBA
                | PixelFormat::ASTC_4x4
                | PixelFormat::PVRTC_4BPP_RGBA
        )
    }

    pub fn is_depth(self) -> bool {
        matches!(self, PixelFormat::Depth16 | PixelFormat::Depth32F | PixelFormat::Depth24Stencil8)
    }

    pub fn has_stencil(self) -> bool {
        self == PixelFormat::Depth24Stencil8
    }

    /// 32-bit float color format
    pub fn is_float(self) -> bool {
        matches!(self, PixelFormat::R32F | PixelFormat::RGBA32F)
    }

    /// 16-bit float color format
    pub fn is_half_float(self) -> bool {
        matches!(self, PixelFormat::R16F | PixelFormat::RGBA16F)
    }

    /// Size of one pixel in bytes (0 for block-compressed formats)
    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            PixelFormat::R8 => 1,
            PixelFormat::RG8 | PixelFormat::R16F | PixelFormat::Depth16 => 2,
            PixelFormat::RGB8 => 3,
            PixelFormat::RGBA8
            | PixelFormat::SRGBA8
            | PixelFormat::R32F
            | PixelFormat::Depth32F
            | PixelFormat::Depth24Stencil8 => 4,
            PixelFormat::RGBA16F => 8,
            PixelFormat::RGBA32F => 16,
            _ => 0,
        }
    }
}

/// Texture minification / magnification filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterMode {
    Nearest,
    Linear,
    NearestMipmapNearest,
    NearestMipmapLinear,
    LinearMipmapNearest,
    LinearMipmapLinear,
}

impl FilterMode {
    /// Equivalent filter that does not sample the mip chain
    pub fn without_mipmaps(self) -> FilterMode {
        match self {
            FilterMode::NearestMipmapNearest | FilterMode::NearestMipmapLinear => FilterMode::Nearest,
            FilterMode::LinearMipmapNearest | FilterMode::LinearMipmapLinear => FilterMode::Linear,
            other => other,
        }
    }
}

/// Texture coordinate addressing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressMode {
    Repeat,
    ClampToEdge,
    MirroredRepeat,
}

/// A single sampler parameter written with `tex_parameter`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TextureParameter {
    MinFilter(FilterMode),
    MagFilter(FilterMode),
    WrapS(AddressMode),
    WrapT(AddressMode),
    WrapR(AddressMode),
    /// `true` enables depth comparison on read
    CompareMode(bool),
    CompareFunc(CompareFunc),
    MaxAnisotropy(f32),
}

// ===== BUFFERS & VERTICES =====

/// Buffer binding target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    Array,
    ElementArray,
    PixelPack,
    TransformFeedback,
}

/// Buffer update frequency hint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    Static,
    Dynamic,
    Stream,
}

/// Scalar component type of a vertex attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Float16,
    Float32,
}

impl DataType {
    pub fn size_bytes(self) -> u32 {
        match self {
            DataType::Int8 | DataType::UInt8 => 1,
            DataType::Int16 | DataType::UInt16 | DataType::Float16 => 2,
            DataType::Int32 | DataType::UInt32 | DataType::Float32 => 4,
        }
    }
}

/// Index element type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexFormat {
    U8,
    U16,
    U32,
}

impl IndexFormat {
    pub fn size_bytes(self) -> u32 {
        match self {
            IndexFormat::U8 => 1,
            IndexFormat::U16 => 2,
            IndexFormat::U32 => 4,
        }
    }
}

/// Primitive assembly mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    Triangles,
    TriangleStrip,
    TriangleFan,
}

impl PrimitiveType {
    pub const COUNT: usize = 7;

    pub fn index(self) -> usize {
        self as usize
    }

    /// Base mode accepted by transform feedback for this primitive
    pub fn feedback_mode(self) -> PrimitiveType {
        match self {
            PrimitiveType::Points => PrimitiveType::Points,
            PrimitiveType::Lines | PrimitiveType::LineLoop | PrimitiveType::LineStrip => PrimitiveType::Lines,
            _ => PrimitiveType::Triangles,
        }
    }
}

// ===== FRAMEBUFFERS =====

/// Framebuffer binding point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FramebufferTarget {
    Framebuffer,
    Read,
    Draw,
}

/// Framebuffer attachment point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attachment {
    Color(u32),
    Depth,
    Stencil,
    DepthStencil,
    None,
}

/// Filter used when a blit scales
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlitFilter {
    Nearest,
    Linear,
}

/// Result of a non-blocking fence query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncStatus {
    Signaled,
    Pending,
    Failed,
}

// ===== PROGRAMS =====

/// Type of an active uniform as reported by program reflection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActiveUniformType {
    Float,
    FloatVec2,
    FloatVec3,
    FloatVec4,
    Int,
    IntVec2,
    IntVec3,
    IntVec4,
    UInt,
    UIntVec2,
    UIntVec3,
    UIntVec4,
    Bool,
    BoolVec2,
    BoolVec3,
    BoolVec4,
    FloatMat2,
    FloatMat3,
    FloatMat4,
    Sampler2D,
    SamplerCube,
    Sampler2DShadow,
    SamplerCubeShadow,
    Sampler2DArray,
    Sampler2DArrayShadow,
    Sampler3D,
    IntSampler2D,
    UIntSampler2D,
}

/// An active uniform reported by a linked program
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveUniform {
    /// Uniform name, possibly with a trailing `[0]` for arrays
    pub name: String,
    pub ty: ActiveUniformType,
    /// Array length (1 for non-arrays)
    pub size: u32,
    pub location: UniformLocation,
}

/// Everything needed to build a native program
#[derive(Debug, Clone, Copy)]
pub struct ProgramDesc<'a> {
    pub vertex: &'a str,
    pub fragment: &'a str,
    /// Attribute name to location bindings applied before linking
    pub attributes: &'a [(String, u32)],
    /// Varyings captured by transform feedback (modern generation only)
    pub feedback_varyings: &'a [String],
}
