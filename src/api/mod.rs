//! HTTP JSON API over the board service.
//!
//! The session layer in front of this server authenticates callers and
//! forwards the actor context in `x-actor-id`, `x-actor-role`,
//! `x-tenant-id` and optionally `x-can-edit` headers.

mod server;

pub use server::{ApiState, ServerHandle, actor_from_headers, build_router, start_server};
