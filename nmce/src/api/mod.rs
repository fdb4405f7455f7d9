//! Public API module.
//!
//! This module contains the user-facing API of the `nmce` crate: the data
//! model, configuration, the frontend seam and the coordinator.

pub mod config;
pub mod coordinator;
pub mod frontend;
pub mod models;
