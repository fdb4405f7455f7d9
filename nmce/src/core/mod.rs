//! Core activation logic.
//!
//! Request routing, delegation to a running instance and VPN plugin
//! discovery. These are building blocks of [`crate::Coordinator`].

pub mod delegation;
pub mod dispatch;
pub mod vpn_plugins;
