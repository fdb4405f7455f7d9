//! Constants for the editor's D-Bus surface and NetworkManager setting names.

/// Well-known bus name, interface and object path of a running editor.
pub mod bus {
    /// Name owned by the active instance on the session bus.
    pub const SERVICE: &str = "org.gnome.nm_connection_editor";

    /// Interface carrying the `Start` method. Shares the service name.
    pub const INTERFACE: &str = "org.gnome.nm_connection_editor";

    /// Object path the `Start` method is exposed at.
    pub const OBJECT_PATH: &str = "/";

    /// Method used to forward an invocation to the active instance.
    pub const START_METHOD: &str = "Start";
}

/// Keys of the `a{sv}` dictionary passed to `Start`.
pub mod start_args {
    pub const TYPE: &str = "type";
    pub const CREATE: &str = "create";
    pub const SHOW: &str = "show";
    pub const UUID: &str = "uuid";
    pub const IMPORT: &str = "import";
}

/// NetworkManager setting names that need special handling.
pub mod setting_name {
    pub const CDMA: &str = "cdma";
    pub const GSM: &str = "gsm";
    pub const VPN: &str = "vpn";
}

/// VPN plugin discovery.
pub mod vpn {
    /// Prefix NetworkManager uses for VPN service types.
    pub const SERVICE_PREFIX: &str = "org.freedesktop.NetworkManager.";

    /// Extension of plugin description files.
    pub const NAME_FILE_EXTENSION: &str = "name";

    /// Keyfile group holding the plugin identity.
    pub const CONNECTION_GROUP: &str = "VPN Connection";

    /// Short names resolved to `SERVICE_PREFIX` + name even when the plugin
    /// is not installed.
    pub const KNOWN_SHORT_NAMES: &[&str] = &[
        "openvpn",
        "vpnc",
        "pptp",
        "openconnect",
        "openswan",
        "libreswan",
        "strongswan",
        "ssh",
        "l2tp",
        "iodine",
        "fortisslvpn",
    ];

    /// Directories searched for plugin description files, in priority order.
    pub const DEFAULT_PLUGIN_DIRS: &[&str] =
        &["/etc/NetworkManager/VPN", "/usr/lib/NetworkManager/VPN"];
}

/// Timeout constants for bus calls.
pub mod timeouts {
    use std::time::Duration;

    /// Upper bound for forwarding a request to an existing instance (25 seconds).
    ///
    /// Matches the reference D-Bus default reply timeout.
    const DELEGATION_TIMEOUT_SECS: u64 = 25;

    /// Returns the default delegation timeout.
    pub fn delegation_timeout() -> Duration {
        Duration::from_secs(DELEGATION_TIMEOUT_SECS)
    }
}
