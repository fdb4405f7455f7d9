//! Single-instance activation for a NetworkManager connection editor.
//!
//! Only one editor should own the UI in a login session. This crate
//! implements the handshake that makes this so:
//!
//! - A new invocation asks the session bus who owns
//!   `org.gnome.nm_connection_editor`
//! - If someone does, the invocation's arguments are forwarded with a
//!   `Start` call and the new process exits
//! - Otherwise the process claims the name, answers `Start` calls at `/`
//!   and hands every request to its UI layer
//!
//! # Example
//!
//! ```no_run
//! use nmce::{ActivationConfig, ActivationRequest, Coordinator, TypeSelector};
//!
//! # async fn example() {
//! let request = ActivationRequest {
//!     connection_type: Some(TypeSelector::parse("vpn:openvpn")),
//!     create: true,
//!     ..Default::default()
//! };
//!
//! let mut coordinator = Coordinator::connect(ActivationConfig::default()).await;
//! if coordinator.try_delegate_to_existing_instance(&request).await {
//!     println!("Handed over to the running editor");
//! }
//! # }
//! ```
//!
//! # Error Handling
//!
//! Fallible operations return `Result<T, ActivationError>`. The coordinator
//! itself treats bus failures as non-fatal: they are logged and the process
//! falls back to running as its own active instance.
//!
//! # Logging
//!
//! This crate uses the [`log`](https://docs.rs/log) facade for logging. To see
//! log output, add a logging implementation like `env_logger`. For example:

//! ```no_run,ignore
//! env_logger::init();
//! // ...
//! ```

// Internal implementation modules
mod core;
mod dbus;
mod types;

// Public API modules
pub mod api;

// Re-exported public API
pub use crate::api::config::ActivationConfig;
pub use crate::api::coordinator::{Coordinator, StopHandle};
pub use crate::api::frontend::{Frontend, UiEventSender};
pub use crate::api::models::{
    ActivationError, ActivationRequest, ExitDirective, InstanceState, NameClaim, TypeSelector,
    UiEvent,
};
pub use crate::core::delegation::try_delegate;
pub use crate::core::dispatch::handle_request;
pub use crate::core::vpn_plugins::{VpnPluginInfo, VpnPluginRegistry};
pub use crate::dbus::{
    ActivationBus, NMConnectionEditorProxy, RequestSink, SessionBus, decode_start_call,
    invalid_arguments_error,
};
pub use crate::types::constants;
pub use crate::types::setting_type_registry::{self, SettingTypeInfo};

/// A specialized `Result` type for activation operations.
pub type Result<T> = std::result::Result<T, ActivationError>;
