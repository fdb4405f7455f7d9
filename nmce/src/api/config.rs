//! Configuration for instance activation.

use std::path::PathBuf;
use std::time::Duration;

use crate::types::constants::{bus, timeouts, vpn};

/// Settings for the single-instance handshake.
///
/// The defaults talk to `org.gnome.nm_connection_editor` at `/` and bound the
/// forwarding call to an existing instance by 25 seconds.
///
/// # Example
///
/// ```rust
/// use nmce::ActivationConfig;
/// use std::time::Duration;
///
/// let config = ActivationConfig::new()
///     .with_bus_name("org.example.editor")
///     .with_delegation_timeout(Duration::from_secs(5));
///
/// assert_eq!(config.bus_name, "org.example.editor");
/// assert_eq!(config.delegation_timeout, Some(Duration::from_secs(5)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationConfig {
    /// Well-known name owned by the active instance
    pub bus_name: String,
    /// Interface the `Start` method is exposed on
    pub interface: String,
    /// Object path the `Start` method is exposed at
    pub object_path: String,
    /// Upper bound for the `Start` call; `None` waits indefinitely
    pub delegation_timeout: Option<Duration>,
    /// Directories searched for VPN plugin descriptions
    pub vpn_plugin_dirs: Vec<PathBuf>,
}

impl Default for ActivationConfig {
    fn default() -> Self {
        Self {
            bus_name: bus::SERVICE.to_string(),
            interface: bus::INTERFACE.to_string(),
            object_path: bus::OBJECT_PATH.to_string(),
            delegation_timeout: Some(timeouts::delegation_timeout()),
            vpn_plugin_dirs: vpn::DEFAULT_PLUGIN_DIRS
                .iter()
                .map(PathBuf::from)
                .collect(),
        }
    }
}

impl ActivationConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the well-known bus name.
    ///
    /// The interface name follows the bus name, as the editor uses one
    /// identifier for both.
    #[must_use]
    pub fn with_bus_name(mut self, name: impl Into<String>) -> Self {
        self.bus_name = name.into();
        self.interface = self.bus_name.clone();
        self
    }

    /// Sets the object path of the `Start` method.
    #[must_use]
    pub fn with_object_path(mut self, path: impl Into<String>) -> Self {
        self.object_path = path.into();
        self
    }

    /// Bounds the forwarding call to an existing instance.
    #[must_use]
    pub fn with_delegation_timeout(mut self, timeout: Duration) -> Self {
        self.delegation_timeout = Some(timeout);
        self
    }

    /// Waits for the existing instance without a time limit.
    #[must_use]
    pub fn without_delegation_timeout(mut self) -> Self {
        self.delegation_timeout = None;
        self
    }

    /// Replaces the VPN plugin search path.
    #[must_use]
    pub fn with_vpn_plugin_dirs<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.vpn_plugin_dirs = dirs.into_iter().map(Into::into).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_editor_bus_surface() {
        let config = ActivationConfig::default();
        assert_eq!(config.bus_name, "org.gnome.nm_connection_editor");
        assert_eq!(config.interface, "org.gnome.nm_connection_editor");
        assert_eq!(config.object_path, "/");
        assert_eq!(config.delegation_timeout, Some(Duration::from_secs(25)));
        assert_eq!(config.vpn_plugin_dirs.len(), 2);
    }

    #[test]
    fn unbounded_delegation() {
        let config = ActivationConfig::new().without_delegation_timeout();
        assert!(config.delegation_timeout.is_none());
    }

    #[test]
    fn custom_plugin_dirs() {
        let config = ActivationConfig::new().with_vpn_plugin_dirs(["/tmp/vpn"]);
        assert_eq!(config.vpn_plugin_dirs, vec![PathBuf::from("/tmp/vpn")]);
    }
}
