//! HTTP surface for the avatar backend.

pub mod server;

pub use server::{build_router, AppState};
