//! Proxy for a running editor instance.

use std::collections::HashMap;
use zbus::proxy;
use zvariant::Value;

/// Proxy for the editor's single-instance interface.
///
/// The service and path are overridden from [`crate::ActivationConfig`]
/// when built through [`super::SessionBus`].
#[proxy(
    interface = "org.gnome.nm_connection_editor",
    default_service = "org.gnome.nm_connection_editor",
    default_path = "/"
)]
pub trait NMConnectionEditor {
    /// Forwards an invocation's arguments to the running instance.
    ///
    /// Recognized keys: `type` (s), `create` (b), `show` (b), `uuid` (s)
    /// and `import` (s).
    fn start(&self, args: HashMap<&str, Value<'_>>) -> zbus::Result<()>;
}
