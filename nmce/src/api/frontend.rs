//! The UI layer driven by the coordinator.
//!
//! Rendering is not part of this crate. A frontend receives the decoded
//! requests as method calls and reports back through a [`UiEventSender`].

use std::path::Path;
use tokio::sync::mpsc;

use crate::api::models::UiEvent;
use crate::types::setting_type_registry::SettingTypeInfo;

/// Operations the coordinator asks of the connection list UI.
///
/// All calls are fire-and-forget: the frontend may open dialogs
/// asynchronously and report completion later via [`UiEvent::EditingDone`].
pub trait Frontend {
    /// Brings the connection list to the foreground.
    fn present(&mut self);

    /// Shows the page for `setting`, or every page when `None`.
    fn show_type(&mut self, setting: Option<&'static dyn SettingTypeInfo>);

    /// Asks the user which kind of connection to add.
    fn add(&mut self);

    /// Opens the editor for a new connection of the given type.
    fn create(&mut self, setting: &'static dyn SettingTypeInfo, detail: Option<&str>);

    /// Imports a VPN connection from `path` and opens it in the editor.
    fn import(&mut self, path: &Path, detail: Option<&str>);

    /// Opens the editor for the connection with `uuid`.
    fn edit(&mut self, uuid: &str);
}

/// Handle a frontend uses to report [`UiEvent`]s.
#[derive(Debug, Clone)]
pub struct UiEventSender {
    tx: mpsc::UnboundedSender<UiEvent>,
}

impl UiEventSender {
    pub(crate) fn new(tx: mpsc::UnboundedSender<UiEvent>) -> Self {
        Self { tx }
    }

    /// Reports that the connection list was closed.
    pub fn done(&self) {
        self.send(UiEvent::Done);
    }

    /// Reports that an editing session finished.
    pub fn editing_done(&self) {
        self.send(UiEvent::EditingDone);
    }

    /// Sends an arbitrary event. Ignored once the coordinator is gone.
    pub fn send(&self, event: UiEvent) {
        let _ = self.tx.send(event);
    }
}
