//! Module access engine core
//!
//! `decision` is the pure state machine; `apply` drives it against the
//! store with optimistic concurrency; `oracle` answers access queries.

pub mod apply;
pub mod decision;
pub mod oracle;
