//! Skill-gap analysis between user-declared skills and a role's top terms.

pub mod analyzer;
pub mod handlers;
