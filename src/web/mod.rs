//! HTTP API module.

mod server;

pub use server::{ApiError, AppServer, ServerHandle, build_router, start_server};
