//! Session bus plumbing for the single-instance handshake.
//!
//! The coordinator talks to the bus through the [`ActivationBus`] trait so
//! the handshake can run against something other than a live session bus.
//! [`SessionBus`] is the implementation backed by `zbus`.
//!
//! # Bus Surface
//!
//! - `org.gnome.nm_connection_editor` - well-known name of the active instance
//! - `/` - object path exposing the `Start` method
//! - `org.gnome.nm_connection_editor.Start(a{sv})` - forwards an invocation

mod editor;
mod service;
mod session;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::Result;
use crate::api::models::{ActivationRequest, NameClaim};

pub use editor::NMConnectionEditorProxy;
pub use service::{decode_start_call, invalid_arguments_error};
pub use session::SessionBus;

/// Bus operations needed to find, reach and become the active instance.
#[async_trait]
pub trait ActivationBus: Send + Sync {
    /// Returns the unique name currently owning the editor's well-known
    /// name, or `None` if nobody owns it.
    async fn name_owner(&self) -> Result<Option<String>>;

    /// Calls `Start` on the owner with the fields set in `request`.
    async fn call_start(&self, request: &ActivationRequest) -> Result<()>;

    /// Starts answering `Start` calls, queueing decoded requests on `sink`.
    async fn serve_start(&self, sink: RequestSink) -> Result<()>;

    /// Attempts to take the well-known name.
    async fn claim_name(&self) -> Result<NameClaim>;

    /// Stops serving and gives up the well-known name.
    async fn release_name(&self) -> Result<()>;
}

/// Queue of requests received from other invocations.
#[derive(Debug, Clone)]
pub struct RequestSink {
    tx: mpsc::UnboundedSender<ActivationRequest>,
}

impl RequestSink {
    pub(crate) fn new(tx: mpsc::UnboundedSender<ActivationRequest>) -> Self {
        Self { tx }
    }

    /// Hands a request to the active instance's event loop.
    ///
    /// Returns `false` if the event loop is gone.
    pub fn dispatch(&self, request: ActivationRequest) -> bool {
        self.tx.send(request).is_ok()
    }
}
