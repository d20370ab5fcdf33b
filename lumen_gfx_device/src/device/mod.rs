//! The graphics device and its frame, pass and draw operations

pub mod graphics_device;
mod graphics_device_context;
pub mod graphics_device_draw;
pub mod graphics_device_pass;
pub mod graphics_device_readback;
mod graphics_device_texture;

pub use graphics_device::{
    ContextSource, DeviceEvent, DeviceOptions, DeviceStats, DeviceStatus, EventListener, GraphicsDevice,
};
pub use graphics_device_draw::Primitive;
pub use graphics_device_pass::{ColorOps, DepthStencilOps, RenderPassDesc};
pub use graphics_device_readback::PixelReadback;
