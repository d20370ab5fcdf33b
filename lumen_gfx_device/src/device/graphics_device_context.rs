/// GraphicsDevice context loss and restore
///
/// Loss bumps the context generation. Resources are not visited: each one
/// compares its generation with the device's on next use, drops its dead
/// handles and is re-created from its CPU-side data. Device-owned caches are
/// rebuilt here.

use std::time::{Duration, Instant};

use crate::binding::TextureUnitTable;
use crate::capabilities::Capabilities;
use crate::state::StateCache;

use super::graphics_device::{DeviceEvent, DeviceStatus, GraphicsDevice, SOURCE};

impl GraphicsDevice {
    /// Check the native context for loss or restoration
    ///
    /// Call once per frame. Also performs a pending `debug_lose_context` restore.
    pub fn pump(&mut self) {
        if let Some(deadline) = self.restore_deadline {
            if Instant::now() >= deadline {
                self.restore_deadline = None;
                self.native.restore_context();
            }
        }

        match (self.status, self.native.is_context_lost()) {
            (DeviceStatus::Live, true) => self.handle_context_lost(),
            (DeviceStatus::Lost, false) => self.handle_context_restored(),
            _ => {}
        }
    }

    /// Force a context loss, restored by `pump` once `delay` has elapsed
    ///
    /// Returns `false` when the context cannot simulate a loss.
    pub fn debug_lose_context(&mut self, delay: Duration) -> bool {
        if self.status != DeviceStatus::Live {
            return false;
        }
        if !self.caps.lose_context || !self.native.lose_context() {
            crate::gfx_warn!(SOURCE, "Context loss cannot be simulated on this context");
            return false;
        }
        crate::gfx_debug!(SOURCE, "Simulating context loss for {:?}", delay);
        self.restore_deadline = Some(Instant::now() + delay);
        self.handle_context_lost();
        true
    }

    pub(super) fn handle_context_lost(&mut self) {
        if self.status == DeviceStatus::Lost {
            return;
        }
        crate::gfx_warn!(SOURCE, "Graphics context lost");

        self.status = DeviceStatus::Lost;
        self.generation += 1;

        // Handles died with the context; nothing to delete
        self.vertex_arrays.clear();
        self.bound_vertex_array = None;
        self.bound_framebuffer = None;
        self.active_program = None;
        self.active_shader = None;
        self.inside_pass = false;
        self.high_precision = None;

        self.fire(DeviceEvent::ContextLost);
    }

    pub(super) fn handle_context_restored(&mut self) {
        self.status = DeviceStatus::Restoring;
        crate::gfx_info!(SOURCE, "Graphics context restored, rebuilding device state");

        self.caps = Capabilities::probe(self.native.as_mut(), &self.options.platform);
        let size = self.native.drawing_buffer_size();
        self.state = StateCache::reset(self.native.as_mut(), self.caps.is_modern(), size);
        self.units = TextureUnitTable::new(self.caps.max_combined_textures);
        self.reported_samplers.clear();

        self.status = DeviceStatus::Live;
        self.fire(DeviceEvent::ContextRestored);
    }

    /// Context generation; changes on every loss
    pub fn context_generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
#[path = "graphics_device_context_tests.rs"]
mod tests;
