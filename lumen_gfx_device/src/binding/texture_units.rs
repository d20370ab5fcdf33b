/// Texture unit table
///
/// Mirrors which native texture is bound to every (unit, target) pair and
/// which unit is active. Binding through the table skips the native call
/// when the texture is already there.

use crate::native::{NativeContext, NativeTexture, TextureTarget};

type UnitSlots = [Option<NativeTexture>; TextureTarget::COUNT];

#[derive(Debug, Clone)]
pub struct TextureUnitTable {
    units: Vec<UnitSlots>,
    active: u32,
}

impl TextureUnitTable {
    /// Table for `count` units, all empty, unit 0 active
    pub fn new(count: u32) -> Self {
        Self {
            units: vec![[None; TextureTarget::COUNT]; count.max(1) as usize],
            active: 0,
        }
    }

    pub fn unit_count(&self) -> u32 {
        self.units.len() as u32
    }

    /// Last unit, used for mip generation and copies so user units are not disturbed
    pub fn scratch_unit(&self) -> u32 {
        self.unit_count() - 1
    }

    pub fn active_unit(&self) -> u32 {
        self.active
    }

    pub fn bound(&self, unit: u32, target: TextureTarget) -> Option<NativeTexture> {
        self.units.get(unit as usize).and_then(|slots| slots[target.index()])
    }

    /// Make `unit` active; `false` (and no native call) when it is out of range
    pub fn activate(&mut self, native: &mut dyn NativeContext, unit: u32) -> bool {
        if unit >= self.unit_count() {
            return false;
        }
        if self.active != unit {
            native.active_texture(unit);
            self.active = unit;
        }
        true
    }

    /// Bind on the active unit unless already bound there
    pub fn bind(&mut self, native: &mut dyn NativeContext, target: TextureTarget, texture: Option<NativeTexture>) {
        let Some(slots) = self.units.get_mut(self.active as usize) else {
            return;
        };
        let slot = &mut slots[target.index()];
        if *slot != texture {
            native.bind_texture(target, texture);
            *slot = texture;
        }
    }

    /// Activate `unit` if needed, then bind unless already bound there
    pub fn bind_on_unit(
        &mut self,
        native: &mut dyn NativeContext,
        unit: u32,
        target: TextureTarget,
        texture: Option<NativeTexture>,
    ) -> bool {
        if unit >= self.unit_count() {
            return false;
        }
        if self.bound(unit, target) != texture {
            self.activate(native, unit);
            self.bind(native, target, texture);
        }
        true
    }

    /// Record that a raw native call left `target` on the active unit empty
    pub fn forget_active(&mut self, target: TextureTarget) {
        if let Some(slots) = self.units.get_mut(self.active as usize) {
            slots[target.index()] = None;
        }
    }

    /// Unbind a texture from every unit it is bound to (before deleting it)
    pub fn unbind_everywhere(&mut self, native: &mut dyn NativeContext, texture: NativeTexture) {
        for unit in 0..self.unit_count() {
            for target in [TextureTarget::Texture2D, TextureTarget::CubeMap, TextureTarget::Texture2DArray, TextureTarget::Texture3D] {
                if self.bound(unit, target) == Some(texture) {
                    self.activate(native, unit);
                    self.bind(native, target, None);
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "texture_units_tests.rs"]
mod tests;
