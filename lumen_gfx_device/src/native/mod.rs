//! Native API seam - handles, enums and the `NativeContext` trait

pub mod context;
pub mod types;

pub use context::*;
pub use types::*;

// Recording context for tests and headless runs (no GPU required)
pub mod mock_context;
