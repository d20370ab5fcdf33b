/// Texture resource
///
/// Keeps the sampler parameters and the CPU-side pixels of every face so the
/// texture can be rebuilt after a context loss. Parameter changes only set
/// `TextureDirty` bits; the device applies them the next time it binds the
/// texture.

use bitflags::bitflags;

use crate::capabilities::Capabilities;
use crate::error::Result;
use crate::native::{
    AddressMode, CompareFunc, FilterMode, NativeContext, NativeTexture, PixelFormat, TextureParameter, TextureTarget,
};
use crate::resource::{ensure_context, DeviceId, DeviceLink, ResourceId};

bitflags! {
    /// Pending work for a texture
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TextureDirty: u16 {
        const MIN_FILTER = 1 << 0;
        const MAG_FILTER = 1 << 1;
        const ADDRESS_U = 1 << 2;
        const ADDRESS_V = 1 << 3;
        const ADDRESS_W = 1 << 4;
        const COMPARE_ON_READ = 1 << 5;
        const COMPARE_FUNC = 1 << 6;
        const ANISOTROPY = 1 << 7;
        /// Pixel data (or storage) must be re-specified
        const UPLOAD = 1 << 8;

        const PARAMETERS = Self::MIN_FILTER.bits()
            | Self::MAG_FILTER.bits()
            | Self::ADDRESS_U.bits()
            | Self::ADDRESS_V.bits()
            | Self::ADDRESS_W.bits()
            | Self::COMPARE_ON_READ.bits()
            | Self::COMPARE_FUNC.bits()
            | Self::ANISOTROPY.bits();
    }
}

/// Descriptor for creating a texture
#[derive(Debug, Clone)]
pub struct TextureDesc {
    pub name: String,
    pub target: TextureTarget,
    pub width: u32,
    pub height: u32,
    /// Layers for 2D arrays, slices for 3D textures, 1 otherwise
    pub depth: u32,
    pub format: PixelFormat,
    /// Allocate and generate a full mip chain
    pub mipmaps: bool,
    pub min_filter: FilterMode,
    pub mag_filter: FilterMode,
    pub address_u: AddressMode,
    pub address_v: AddressMode,
    pub address_w: AddressMode,
    /// Depth comparison when sampled (shadow maps)
    pub compare_on_read: bool,
    pub compare_func: CompareFunc,
    pub anisotropy: f32,
}

impl Default for TextureDesc {
    fn default() -> Self {
        Self {
            name: String::from("texture"),
            target: TextureTarget::Texture2D,
            width: 4,
            height: 4,
            depth: 1,
            format: PixelFormat::RGBA8,
            mipmaps: true,
            min_filter: FilterMode::LinearMipmapLinear,
            mag_filter: FilterMode::Linear,
            address_u: AddressMode::Repeat,
            address_v: AddressMode::Repeat,
            address_w: AddressMode::Repeat,
            compare_on_read: false,
            compare_func: CompareFunc::Less,
            anisotropy: 1.0,
        }
    }
}

#[derive(Debug)]
pub struct Texture {
    id: ResourceId,
    desc: TextureDesc,
    /// Level-0 pixels per face (6 for cube maps, 1 otherwise)
    faces: Vec<Option<Vec<u8>>>,
    dirty: TextureDirty,
    native: Option<NativeTexture>,
    pub(crate) link: DeviceLink,
}

impl Texture {
    pub fn new(desc: TextureDesc) -> Self {
        let face_count = if desc.target == TextureTarget::CubeMap { 6 } else { 1 };
        Self {
            id: ResourceId::next(),
            desc,
            faces: vec![None; face_count],
            dirty: TextureDirty::all(),
            native: None,
            link: DeviceLink::default(),
        }
    }

    // ===== ACCESSORS =====

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.desc.name
    }

    pub fn desc(&self) -> &TextureDesc {
        &self.desc
    }

    pub fn target(&self) -> TextureTarget {
        self.desc.target
    }

    pub fn format(&self) -> PixelFormat {
        self.desc.format
    }

    pub fn width(&self) -> u32 {
        self.desc.width
    }

    pub fn height(&self) -> u32 {
        self.desc.height
    }

    pub fn mipmaps(&self) -> bool {
        self.desc.mipmaps
    }

    /// Both dimensions are powers of two
    pub fn is_pot(&self) -> bool {
        self.desc.width.is_power_of_two() && self.desc.height.is_power_of_two()
    }

    pub fn dirty(&self) -> TextureDirty {
        self.dirty
    }

    pub fn native_handle(&self) -> Option<NativeTexture> {
        self.native
    }

    // ===== MUTATION =====

    /// Replace the level-0 pixels of one face
    pub fn set_pixels(&mut self, face: usize, pixels: Vec<u8>) {
        if let Some(slot) = self.faces.get_mut(face) {
            *slot = Some(pixels);
            self.dirty |= TextureDirty::UPLOAD;
        }
    }

    /// Change the size; storage is re-specified on next bind
    pub fn resize(&mut self, width: u32, height: u32) {
        if (self.desc.width, self.desc.height) != (width, height) {
            self.desc.width = width;
            self.desc.height = height;
            self.faces.iter_mut().for_each(|face| *face = None);
            self.dirty |= TextureDirty::UPLOAD;
        }
    }

    pub fn set_min_filter(&mut self, filter: FilterMode) {
        if self.desc.min_filter != filter {
            self.desc.min_filter = filter;
            self.dirty |= TextureDirty::MIN_FILTER;
        }
    }

    pub fn set_mag_filter(&mut self, filter: FilterMode) {
        if self.desc.mag_filter != filter {
            self.desc.mag_filter = filter;
            self.dirty |= TextureDirty::MAG_FILTER;
        }
    }

    pub fn set_address_modes(&mut self, u: AddressMode, v: AddressMode, w: AddressMode) {
        if self.desc.address_u != u {
            self.desc.address_u = u;
            self.dirty |= TextureDirty::ADDRESS_U;
        }
        if self.desc.address_v != v {
            self.desc.address_v = v;
            self.dirty |= TextureDirty::ADDRESS_V;
        }
        if self.desc.address_w != w {
            self.desc.address_w = w;
            self.dirty |= TextureDirty::ADDRESS_W;
        }
    }

    pub fn set_compare(&mut self, compare_on_read: bool, func: CompareFunc) {
        if self.desc.compare_on_read != compare_on_read {
            self.desc.compare_on_read = compare_on_read;
            self.dirty |= TextureDirty::COMPARE_ON_READ;
        }
        if self.desc.compare_func != func {
            self.desc.compare_func = func;
            self.dirty |= TextureDirty::COMPARE_FUNC;
        }
    }

    pub fn set_anisotropy(&mut self, anisotropy: f32) {
        if self.desc.anisotropy != anisotropy {
            self.desc.anisotropy = anisotropy;
            self.dirty |= TextureDirty::ANISOTROPY;
        }
    }

    // ===== DEVICE INTERFACE =====

    /// Create the native texture object
    pub(crate) fn initialize(&mut self, native: &mut dyn NativeContext, device: DeviceId, generation: u64) -> Result<()> {
        ensure_context(native)?;
        let texture = match native.create_texture() {
            Ok(texture) => texture,
            Err(e) => crate::gfx_bail!("lumen::Texture", "Failed to create texture '{}': {}", self.desc.name, e),
        };
        self.native = Some(texture);
        self.link = DeviceLink { device: Some(device), generation };
        self.dirty = TextureDirty::all();
        Ok(())
    }

    /// Apply the dirty sampler parameters to the texture bound on the active unit
    pub(crate) fn apply_parameters(&mut self, native: &mut dyn NativeContext, caps: &Capabilities) {
        let target = self.desc.target;
        let dirty = self.dirty;
        // Legacy contexts cannot repeat or mip-sample non-power-of-two textures
        let npot_limited = !caps.is_modern() && !self.is_pot();
        let address = |mode: AddressMode| if npot_limited { AddressMode::ClampToEdge } else { mode };

        if dirty.contains(TextureDirty::MIN_FILTER) {
            let mut filter = self.desc.min_filter;
            if npot_limited || !self.desc.mipmaps {
                filter = filter.without_mipmaps();
            }
            native.tex_parameter(target, TextureParameter::MinFilter(filter));
        }
        if dirty.contains(TextureDirty::MAG_FILTER) {
            native.tex_parameter(target, TextureParameter::MagFilter(self.desc.mag_filter.without_mipmaps()));
        }
        if dirty.contains(TextureDirty::ADDRESS_U) {
            native.tex_parameter(target, TextureParameter::WrapS(address(self.desc.address_u)));
        }
        if dirty.contains(TextureDirty::ADDRESS_V) {
            native.tex_parameter(target, TextureParameter::WrapT(address(self.desc.address_v)));
        }
        if caps.is_modern() {
            if dirty.contains(TextureDirty::ADDRESS_W) {
                native.tex_parameter(target, TextureParameter::WrapR(self.desc.address_w));
            }
            if dirty.contains(TextureDirty::COMPARE_ON_READ) {
                native.tex_parameter(target, TextureParameter::CompareMode(self.desc.compare_on_read));
            }
            if dirty.contains(TextureDirty::COMPARE_FUNC) {
                native.tex_parameter(target, TextureParameter::CompareFunc(self.desc.compare_func));
            }
        }
        if dirty.contains(TextureDirty::ANISOTROPY) && caps.anisotropic_filtering {
            let anisotropy = self.desc.anisotropy.clamp(1.0, caps.max_anisotropy);
            native.tex_parameter(target, TextureParameter::MaxAnisotropy(anisotropy));
        }

        self.dirty.remove(TextureDirty::PARAMETERS);
    }

    /// Specify storage and pixels for the texture bound on the active unit
    pub(crate) fn upload(&mut self, native: &mut dyn NativeContext, caps: &Capabilities) {
        let desc = &self.desc;
        match desc.target {
            TextureTarget::Texture2D | TextureTarget::CubeMap => {
                for (face, pixels) in self.faces.iter().enumerate() {
                    native.tex_image_2d(desc.target, face as u32, 0, desc.format, desc.width, desc.height, pixels.as_deref());
                }
            }
            TextureTarget::Texture2DArray | TextureTarget::Texture3D => {
                native.tex_image_3d(desc.target, 0, desc.format, desc.width, desc.height, desc.depth, self.faces[0].as_deref());
            }
        }

        if desc.mipmaps && !desc.format.is_compressed() && (caps.is_modern() || self.is_pot()) {
            native.generate_mipmap(desc.target);
        }

        self.dirty.remove(TextureDirty::UPLOAD);
    }

    /// Forget the native handle (it died with the context). CPU data stays.
    pub(crate) fn lose_context(&mut self) {
        self.native = None;
        self.link.generation = 0;
        self.dirty = TextureDirty::all();
    }

    pub(crate) fn destroy(&mut self, native: &mut dyn NativeContext) {
        if let Some(texture) = self.native.take() {
            native.delete_texture(texture);
        }
        self.link = DeviceLink::default();
        self.dirty = TextureDirty::all();
    }
}

#[cfg(test)]
#[path = "texture_tests.rs"]
mod tests;
