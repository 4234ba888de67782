//! HTTP API handlers for praxis-ma

pub mod admin;
pub mod auth;
pub mod health;
pub mod oracle;
pub mod progress;
pub mod review;
pub mod sse;
pub mod submissions;

pub use admin::{force_progress, lock_module, unlock_module, update_auto_unlock_config};
pub use auth::auth_middleware;
pub use health::health;
pub use oracle::can_access;
pub use progress::get_progress;
pub use review::{get_pending_assignments, review_assignment};
pub use sse::event_stream;
pub use submissions::{mark_lesson_complete, submit_assignment};
