/*!
# Lumen Graphics Device

Stateful graphics-device layer over an immediate-mode, WebGL-class native API.

The device wraps one native context and makes it cheap and safe to drive from
a renderer: every fixed-function state change goes through a shadow cache, so
redundant calls never reach the driver, and resources survive context loss by
re-creating themselves from their CPU-side data.

## Architecture

- **NativeContext**: the only seam to the driver (implemented by backends)
- **Capabilities**: one-shot probe of extensions, limits and vendor workarounds
- **StateCache**: blend, depth, stencil, cull, viewport and clear-value shadows
- **TextureUnitTable / VertexArrayCache**: binding tables
- **GraphicsDevice**: shaders, buffers, textures, render passes, draw submission
  and context loss handling

Backends live in their own crates (see `lumen_gfx_device_glow`).
*/

// Internal modules
mod error;
pub mod log;
pub mod binding;
pub mod capabilities;
pub mod device;
pub mod native;
pub mod resource;
pub mod state;

// Main lumen namespace module
pub mod lumen {
    // Error types
    pub use crate::error::{Error, Result};

    // The device itself
    pub use crate::device::{GraphicsDevice, DeviceOptions, ContextSource};

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger, set_logger, reset_logger};
    }

    // Device sub-module with passes, draws and events
    pub mod device {
        pub use crate::device::*;
    }

    // Native seam sub-module
    pub mod native {
        pub use crate::native::*;
    }

    // Capability probe sub-module
    pub mod capabilities {
        pub use crate::capabilities::*;
    }

    // State cache sub-module
    pub mod state {
        pub use crate::state::*;
    }

    // Binding tables sub-module
    pub mod binding {
        pub use crate::binding::*;
    }

    // Resource sub-module
    pub mod resource {
        pub use crate::resource::*;
    }
}

// Re-export math library at crate root
pub use glam;
