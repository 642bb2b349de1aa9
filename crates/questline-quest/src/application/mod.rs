//! Application services for the Quest context.

pub mod command_handlers;
pub mod query_handlers;
