//! Web administration interface
//!
//! HTTP surface over [`Introspection`](crate::introspection::Introspection):
//! key browsing, key inspection, server config and a health check.

mod handlers;
mod server;

pub use handlers::AppState;
pub use server::{router, run_web_server};
