//! Questline — Quest bounded context.
//!
//! Responsible for the quest lifecycle: creation, posting, assignment and
//! completion, each step recorded as a domain event.

pub mod application;
pub mod domain;
