//! Questline — Location bounded context.
//!
//! Responsible for named places on the map that quests can point at, and
//! for searching them by distance.

pub mod application;
pub mod domain;
