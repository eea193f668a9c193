pub mod app;
pub mod cli;
pub mod error;
pub mod handlers;
pub mod shutdown;
pub mod startup;
pub mod state;
pub mod tracing_setup;
pub mod validation;

pub use app::{build_health_router, build_router};
