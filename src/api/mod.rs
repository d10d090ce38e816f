//! Public entry points: the dashboard page and its JSON mirror.

pub mod http;
pub mod page;
pub mod state;

pub use http::{router, serve, SharedState};
pub use state::AppState;
