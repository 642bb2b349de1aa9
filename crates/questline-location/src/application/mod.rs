//! Application services for the Location context.

pub mod command_handlers;
pub mod query_handlers;
