/*!
# Lumen Graphics Device - glow backend

OpenGL / OpenGL ES implementation of the `NativeContext` seam, built on
[glow](https://docs.rs/glow).

The backend maps the device's typed handles and enums onto raw GL values and
answers extension queries with the WebGL-style names the capability probe
asks for, so the same device code drives desktop GL, GLES and WebGL.

# Safety

A `GlowContext` wraps a `glow::Context` that must stay current on the calling
thread for as long as the device uses it.
*/

mod glow_context;
mod glow_extensions;
mod glow_format;

pub use glow_context::GlowContext;
pub use glow_extensions::extension_aliases;
