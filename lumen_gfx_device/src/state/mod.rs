pub mod render_state;
pub mod state_cache;

pub use render_state::*;
pub use state_cache::*;
