//! Questline Core — shared domain abstractions.
//!
//! This crate defines the traits and value types every bounded context
//! depends on: errors, events, the geographic value object, and the
//! transactional unit of work with its event outbox. It contains no
//! database code.

pub mod aggregate;
pub mod clock;
pub mod command;
pub mod context;
pub mod error;
pub mod event;
pub mod geo;
pub mod outbox;
pub mod unit_of_work;
