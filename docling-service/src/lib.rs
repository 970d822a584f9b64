pub mod app;
pub mod error;
pub mod handlers;
pub mod state;

pub use app::{build_router, build_router_with_config};
