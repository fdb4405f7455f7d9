//! Constants and the connection type registry.

pub mod constants;
pub mod setting_type_registry;
