//! Request admission: auth gate, sliding-window rate limiting, and the
//! bounded-concurrency gate for heavy inference endpoints.

pub mod auth;
pub mod concurrency;
pub mod rate_limit;
