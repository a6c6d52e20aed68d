//! Request middleware.

pub mod tenant;

pub use tenant::{request_context, TenantPolicy};
