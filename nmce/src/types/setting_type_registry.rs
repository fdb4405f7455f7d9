//! Connection type registry.
//!
//! Maps the NetworkManager setting names accepted by `--type` (and by the
//! `type` key of a forwarded `Start` call) to the editor page that handles
//! them. The registry is built once on first access and is immutable
//! thereafter.

use std::collections::HashMap;
use std::sync::OnceLock;

/// Trait for connection type metadata.
///
/// Implement this trait to make a new connection type selectable from the
/// command line.
pub trait SettingTypeInfo: Send + Sync {
    /// Returns the NetworkManager setting name (e.g. "802-3-ethernet").
    fn setting_name(&self) -> &'static str;

    /// Returns the human-readable name of this connection type.
    fn display_name(&self) -> &'static str;

    /// Extra names accepted for this type on the command line.
    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    /// Returns whether connections of this type describe a software device.
    fn is_virtual(&self) -> bool {
        false
    }
}

/// Declares a unit struct implementing [`SettingTypeInfo`].
macro_rules! setting_type {
    ($ty:ident, $name:expr, $display:expr) => {
        setting_type!($ty, $name, $display, [], false);
    };
    ($ty:ident, $name:expr, $display:expr, [$($alias:expr),*], $virt:expr) => {
        struct $ty;

        impl SettingTypeInfo for $ty {
            fn setting_name(&self) -> &'static str {
                $name
            }

            fn display_name(&self) -> &'static str {
                $display
            }

            fn aliases(&self) -> &'static [&'static str] {
                &[$($alias),*]
            }

            fn is_virtual(&self) -> bool {
                $virt
            }
        }
    };
}

setting_type!(EthernetType, "802-3-ethernet", "Ethernet", ["ethernet", "wired"], false);
setting_type!(WifiType, "802-11-wireless", "Wi-Fi", ["wifi", "wireless"], false);
setting_type!(WifiP2PType, "wifi-p2p", "Wi-Fi P2P");
setting_type!(GsmType, "gsm", "Mobile Broadband");
setting_type!(CdmaType, "cdma", "Mobile Broadband (CDMA)");
setting_type!(BluetoothType, "bluetooth", "Bluetooth");
setting_type!(AdslType, "adsl", "DSL/ADSL");
setting_type!(PppoeType, "pppoe", "DSL/PPPoE");
setting_type!(InfinibandType, "infiniband", "InfiniBand");
setting_type!(BondType, "bond", "Bond", [], true);
setting_type!(BridgeType, "bridge", "Bridge", [], true);
setting_type!(TeamType, "team", "Team", [], true);
setting_type!(VlanType, "vlan", "VLAN", [], true);
setting_type!(IpTunnelType, "ip-tunnel", "IP tunnel", [], true);
setting_type!(MacsecType, "macsec", "MACsec", [], true);
setting_type!(MacvlanType, "macvlan", "MACVLAN", [], true);
setting_type!(VxlanType, "vxlan", "VXLAN", [], true);
setting_type!(WireGuardType, "wireguard", "WireGuard", [], true);
setting_type!(VpnType, "vpn", "VPN", [], true);

/// Global registry of connection types, keyed by setting name and alias.
static SETTING_TYPE_REGISTRY: OnceLock<HashMap<&'static str, &'static dyn SettingTypeInfo>> =
    OnceLock::new();

static ALL_TYPES: &[&dyn SettingTypeInfo] = &[
    &EthernetType,
    &WifiType,
    &WifiP2PType,
    &GsmType,
    &CdmaType,
    &BluetoothType,
    &AdslType,
    &PppoeType,
    &InfinibandType,
    &BondType,
    &BridgeType,
    &TeamType,
    &VlanType,
    &IpTunnelType,
    &MacsecType,
    &MacvlanType,
    &VxlanType,
    &WireGuardType,
    &VpnType,
];

fn registry() -> &'static HashMap<&'static str, &'static dyn SettingTypeInfo> {
    SETTING_TYPE_REGISTRY.get_or_init(|| {
        let mut map: HashMap<&'static str, &'static dyn SettingTypeInfo> = HashMap::new();

        for &type_info in ALL_TYPES {
            map.insert(type_info.setting_name(), type_info);
            for &alias in type_info.aliases() {
                map.insert(alias, type_info);
            }
        }

        map
    })
}

/// Looks up connection type information by setting name or alias.
///
/// Returns `None` if the name is not recognized.
pub fn lookup(name: &str) -> Option<&'static dyn SettingTypeInfo> {
    registry().get(name).copied()
}

/// Iterates over every registered connection type once.
pub fn all() -> impl Iterator<Item = &'static dyn SettingTypeInfo> {
    ALL_TYPES.iter().copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setting_name_of(name: &str) -> Option<&'static str> {
        lookup(name).map(|info| info.setting_name())
    }

    #[test]
    fn ethernet_by_setting_name_and_alias() {
        let info = lookup("802-3-ethernet").expect("ethernet should be registered");
        assert_eq!(info.display_name(), "Ethernet");
        assert!(!info.is_virtual());

        assert_eq!(setting_name_of("ethernet"), Some("802-3-ethernet"));
        assert_eq!(setting_name_of("wired"), Some("802-3-ethernet"));
    }

    #[test]
    fn wifi_aliases() {
        assert_eq!(setting_name_of("wifi"), Some("802-11-wireless"));
        assert_eq!(setting_name_of("wireless"), Some("802-11-wireless"));
    }

    #[test]
    fn vpn_is_virtual() {
        let info = lookup("vpn").expect("vpn should be registered");
        assert!(info.is_virtual());
    }

    #[test]
    fn unknown_type() {
        assert!(lookup("openvpn").is_none());
        assert!(lookup("").is_none());
    }

    #[test]
    fn lookup_is_case_sensitive() {
        assert!(lookup("VPN").is_none());
    }

    #[test]
    fn registry_is_consistent() {
        for info in all() {
            let found = lookup(info.setting_name()).expect("every type resolves by name");
            assert_eq!(found.setting_name(), info.setting_name());
        }
    }

    #[test]
    fn aliases_do_not_collide_with_setting_names() {
        let names: Vec<_> = all().map(|info| info.setting_name()).collect();
        for info in all() {
            for alias in info.aliases() {
                assert!(!names.contains(alias), "alias '{alias}' shadows a setting name");
            }
        }
    }
}
