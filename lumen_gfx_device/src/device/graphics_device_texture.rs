/// GraphicsDevice texture binding
///
/// `set_texture` is the full contract: lazy creation, dirty sampler
/// parameters, dirty pixel upload. When nothing is dirty it degrades to a
/// cached bind that costs nothing if the texture is already on the unit.

use crate::capabilities::probe_float_high_precision;
use crate::native::{FramebufferTarget, TextureTarget};
use crate::resource::{Texture, TextureDirty, TextureRef};

use super::graphics_device::{GraphicsDevice, SOURCE};

impl GraphicsDevice {
    /// Bind `texture` to `unit`, creating and uploading it first if needed
    ///
    /// Returns `false` when the texture cannot be used (unit out of range,
    /// other device, native creation failure).
    pub fn set_texture(&mut self, texture: &TextureRef, unit: u32) -> bool {
        self.debug_assert_live();
        if !self.check_unit(unit) {
            return false;
        }
        let mut texture = texture.borrow_mut();
        if !self.prepare_texture(&mut texture) {
            return false;
        }

        let target = texture.target();
        let handle = texture.native_handle();
        let dirty = texture.dirty();

        if dirty.is_empty() {
            self.units.bind_on_unit(self.native.as_mut(), unit, target, handle);
            return true;
        }

        self.units.activate(self.native.as_mut(), unit);
        self.units.bind(self.native.as_mut(), target, handle);
        if dirty.intersects(TextureDirty::PARAMETERS) {
            texture.apply_parameters(self.native.as_mut(), &self.caps);
        }
        if dirty.contains(TextureDirty::UPLOAD) {
            texture.upload(self.native.as_mut(), &self.caps);
            self.stats.texture_uploads += 1;
        }
        true
    }

    /// Bind on the active unit unless already bound there
    pub fn bind_texture(&mut self, texture: &TextureRef) {
        self.debug_assert_live();
        let texture = texture.borrow();
        self.units.bind(self.native.as_mut(), texture.target(), texture.native_handle());
    }

    /// Activate `unit` if needed, then bind unless already bound there
    pub fn bind_texture_on_unit(&mut self, texture: &TextureRef, unit: u32) -> bool {
        self.debug_assert_live();
        if !self.check_unit(unit) {
            return false;
        }
        let texture = texture.borrow();
        self.units.bind_on_unit(self.native.as_mut(), unit, texture.target(), texture.native_handle())
    }

    pub fn destroy_texture(&mut self, texture: &TextureRef) {
        let mut texture = texture.borrow_mut();
        if !self.check_owner(texture.link, "Texture", texture.id()) {
            return;
        }
        if !texture.link.is_current(self.id, self.generation) {
            texture.lose_context();
            return;
        }
        if let Some(handle) = texture.native_handle() {
            self.units.unbind_everywhere(self.native.as_mut(), handle);
        }
        texture.destroy(self.native.as_mut());
    }

    /// Whether 32-bit float render targets keep full precision
    ///
    /// Runs a render + read-back probe on first query and memoizes the result
    /// until the context is lost.
    pub fn texture_float_high_precision(&mut self) -> bool {
        if let Some(result) = self.high_precision {
            return result;
        }

        let modern = self.caps.is_modern();
        let result = self.caps.texture_float_renderable
            && self.state.with_unmasked_clear(self.native.as_mut(), modern, |native| probe_float_high_precision(native));

        // The check used raw texture and framebuffer calls
        self.units.forget_active(TextureTarget::Texture2D);
        self.native.bind_framebuffer(FramebufferTarget::Framebuffer, self.bound_framebuffer);

        crate::gfx_debug!(SOURCE, "Float texture high precision: {}", result);
        self.high_precision = Some(result);
        result
    }

    fn check_unit(&self, unit: u32) -> bool {
        if unit < self.units.unit_count() {
            return true;
        }
        if cfg!(debug_assertions) {
            crate::gfx_warn!(SOURCE, "Texture unit {} out of range ({} units)", unit, self.units.unit_count());
        }
        false
    }

    /// Make sure the texture has a native object in the current context
    pub(super) fn prepare_texture(&mut self, texture: &mut Texture) -> bool {
        if !self.check_owner(texture.link, "Texture", texture.id()) {
            return false;
        }
        if texture.link.is_current(self.id, self.generation) {
            return true;
        }
        texture.lose_context();
        texture.initialize(self.native.as_mut(), self.id, self.generation).is_ok()
    }
}

#[cfg(test)]
#[path = "graphics_device_texture_tests.rs"]
mod tests;
