/// Asynchronous pixel read-back
///
/// On modern contexts the pixels are copied into a pixel-pack buffer behind a
/// fence and fetched once the fence signals; the caller polls cooperatively,
/// typically once per frame. Legacy contexts read synchronously.

use std::task::Poll;

use crate::native::{BufferTarget, BufferUsage, NativeBuffer, NativeSync, SyncStatus};

use super::graphics_device::{GraphicsDevice, SOURCE};

enum ReadbackState {
    Pending { buffer: NativeBuffer, sync: NativeSync },
    Ready(Vec<u8>),
    Finished,
}

/// In-flight read of an RGBA8 region
///
/// Must not be polled after its device is destroyed.
pub struct PixelReadback {
    state: ReadbackState,
    size: usize,
    generation: u64,
}

impl PixelReadback {
    /// Advance the read-back
    ///
    /// Yields `Ready(Some(pixels))` once, then `Ready(None)`. A fence failure
    /// or a context loss while pending yields `Ready(None)`.
    pub fn poll(&mut self, device: &mut GraphicsDevice) -> Poll<Option<Vec<u8>>> {
        let (buffer, sync) = match std::mem::replace(&mut self.state, ReadbackState::Finished) {
            ReadbackState::Ready(pixels) => return Poll::Ready(Some(pixels)),
            ReadbackState::Finished => return Poll::Ready(None),
            ReadbackState::Pending { buffer, sync } => (buffer, sync),
        };

        if device.generation != self.generation {
            crate::gfx_warn!(SOURCE, "Pixel read-back abandoned: context lost");
            return Poll::Ready(None);
        }

        let native = device.native.as_mut();
        match native.client_wait_sync(sync) {
            SyncStatus::Pending => {
                self.state = ReadbackState::Pending { buffer, sync };
                Poll::Pending
            }
            SyncStatus::Failed => {
                native.delete_sync(sync);
                native.delete_buffer(buffer);
                crate::gfx_warn!(SOURCE, "Pixel read-back fence failed");
                Poll::Ready(None)
            }
            SyncStatus::Signaled => {
                native.delete_sync(sync);
                let mut pixels = vec![0u8; self.size];
                native.bind_buffer(BufferTarget::PixelPack, Some(buffer));
                native.get_buffer_sub_data(BufferTarget::PixelPack, 0, &mut pixels);
                native.bind_buffer(BufferTarget::PixelPack, None);
                native.delete_buffer(buffer);
                Poll::Ready(Some(pixels))
            }
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, ReadbackState::Pending { .. })
    }
}

impl GraphicsDevice {
    /// Start reading a `width` x `height` RGBA8 region of the bound framebuffer
    pub fn read_pixels_async(&mut self, x: i32, y: i32, width: u32, height: u32) -> PixelReadback {
        let size = width as usize * height as usize * 4;
        let generation = self.generation;

        if self.caps.is_modern() {
            if let Ok(buffer) = self.native.create_buffer() {
                self.native.bind_buffer(BufferTarget::PixelPack, Some(buffer));
                self.native.buffer_storage(BufferTarget::PixelPack, size, BufferUsage::Stream);
                self.native.read_pixels_to_buffer(x, y, width, height, 0);
                self.native.bind_buffer(BufferTarget::PixelPack, None);

                if let Some(sync) = self.native.fence_sync() {
                    self.native.flush();
                    return PixelReadback { state: ReadbackState::Pending { buffer, sync }, size, generation };
                }
                self.native.delete_buffer(buffer);
            }
        }

        let mut pixels = vec![0u8; size];
        self.native.read_pixels(x, y, width, height, &mut pixels);
        PixelReadback { state: ReadbackState::Ready(pixels), size, generation }
    }
}

#[cfg(test)]
#[path = "graphics_device_readback_tests.rs"]
mod tests;
