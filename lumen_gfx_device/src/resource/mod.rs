//! Device resources
//!
//! Caller-owned GPU objects shared as `Rc<RefCell<T>>`. Each one keeps its
//! CPU-side description and data so it can be re-created after a context
//! loss. The device only sees them through the small implementation-detail
//! surface (`initialize`, `upload`, `lose_context`, native handles).

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{Error, Result};
use crate::native::NativeContext;

pub mod buffer;
pub mod render_target;
pub mod shader;
pub mod texture;
pub mod uniform;
pub mod vertex_format;

pub use buffer::*;
pub use render_target::*;
pub use shader::*;
pub use texture::*;
pub use uniform::*;
pub use vertex_format::*;

/// Native objects cannot be created while the context is lost
pub(crate) fn ensure_context(native: &dyn NativeContext) -> Result<()> {
    if native.is_context_lost() {
        return Err(Error::ContextLost);
    }
    Ok(())
}

static NEXT_RESOURCE_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_DEVICE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique resource identity (stable across context loss)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(u64);

impl ResourceId {
    pub(crate) fn next() -> Self {
        Self(NEXT_RESOURCE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

/// Process-unique device identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId(u64);

impl DeviceId {
    pub(crate) fn next() -> Self {
        Self(NEXT_DEVICE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

pub type TextureRef = Rc<RefCell<Texture>>;
pub type VertexBufferRef = Rc<RefCell<VertexBuffer>>;
pub type IndexBufferRef = Rc<RefCell<IndexBuffer>>;
pub type RenderTargetRef = Rc<RefCell<RenderTarget>>;
pub type ShaderRef = Rc<RefCell<Shader>>;

/// Device binding shared by every resource
///
/// `generation` is the context generation the native handles were created
/// in; a mismatch with the device means the handles died with the context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct DeviceLink {
    pub device: Option<DeviceId>,
    pub generation: u64,
}

impl DeviceLink {
    pub fn is_current(&self, device: DeviceId, generation: u64) -> bool {
        self.device == Some(device) && self.generation == generation
    }

    /// `false` when the resource was initialized by another device
    pub fn accepts(&self, device: DeviceId) -> bool {
        self.device.map_or(true, |owner| owner == device)
    }
}
