//! Questline Store — transactional persistence.
//!
//! Two interchangeable backends implement the unit-of-work ports declared by
//! the bounded contexts: [`pg::PgStore`] on `PostgreSQL` and
//! [`memory::MemoryStore`] for tests and local runs. Both bound the number
//! of concurrently open transactions with a semaphore.

pub mod config;
pub mod memory;
pub mod pg;
pub mod unit_of_work;

pub use config::StoreConfig;
pub use unit_of_work::{UnitOfWork, UnitOfWorkFactory};
