//! Role clustering: membership listing and nearest-role adjacency.

pub mod adjacency;
pub mod handlers;
