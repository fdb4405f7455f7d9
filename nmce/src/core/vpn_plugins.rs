//! VPN plugin discovery.
//!
//! NetworkManager VPN plugins install a keyfile with the `.name` extension
//! describing the plugin:
//!
//! ```text
//! [VPN Connection]
//! name=openvpn
//! service=org.freedesktop.NetworkManager.openvpn
//! aliases=org.freedesktop.NetworkManager.openvpn-legacy;
//! ```
//!
//! The editor uses these to accept `--type openvpn` as a shorthand for
//! `--type vpn:openvpn`.

use log::{debug, warn};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::Result;
use crate::types::constants::vpn;

/// A single installed VPN plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VpnPluginInfo {
    /// Short plugin name (e.g. "openvpn")
    pub name: String,
    /// Full service type (e.g. "org.freedesktop.NetworkManager.openvpn")
    pub service: String,
    /// Additional service types the plugin answers to
    pub aliases: Vec<String>,
}

impl VpnPluginInfo {
    /// Parses a plugin description file.
    ///
    /// Returns `None` if the `[VPN Connection]` group lacks a name or service.
    pub fn parse(contents: &str) -> Option<Self> {
        let groups = parse_keyfile(contents);
        let group = groups.get(vpn::CONNECTION_GROUP)?;

        let name = group.get("name").filter(|v| !v.is_empty())?.clone();
        let service = group.get("service").filter(|v| !v.is_empty())?.clone();
        let aliases = group
            .get("aliases")
            .map(|list| {
                list.split(';')
                    .map(str::trim)
                    .filter(|alias| !alias.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Some(Self {
            name,
            service,
            aliases,
        })
    }

    fn answers_to_service(&self, service: &str) -> bool {
        self.service == service || self.aliases.iter().any(|alias| alias == service)
    }
}

/// Splits keyfile text into `group -> key -> value`.
///
/// Comments and blank lines are skipped. Localized keys (`name[de]`) are
/// ignored. Later duplicates win.
fn parse_keyfile(contents: &str) -> HashMap<String, HashMap<String, String>> {
    let mut groups: HashMap<String, HashMap<String, String>> = HashMap::new();
    let mut current: Option<String> = None;

    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(group) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            current = Some(group.to_string());
            groups.entry(group.to_string()).or_default();
            continue;
        }

        let Some(group) = current.as_ref() else {
            continue;
        };
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.contains('[') {
            continue;
        }

        groups
            .entry(group.clone())
            .or_default()
            .insert(key.to_string(), value.trim().to_string());
    }

    groups
}

/// The set of VPN plugins installed on the system.
#[derive(Debug, Clone, Default)]
pub struct VpnPluginRegistry {
    plugins: Vec<VpnPluginInfo>,
}

impl VpnPluginRegistry {
    /// Creates a registry from already parsed plugins.
    pub fn new(plugins: Vec<VpnPluginInfo>) -> Self {
        Self { plugins }
    }

    /// Loads plugin descriptions from `dirs`.
    ///
    /// Directories listed first take precedence: a plugin whose name was
    /// already seen is skipped. Missing directories are not an error.
    pub fn load<P: AsRef<Path>>(dirs: &[P]) -> Self {
        let mut plugins: Vec<VpnPluginInfo> = Vec::new();

        for dir in dirs {
            let dir = dir.as_ref();
            match load_dir(dir) {
                Ok(found) => {
                    for plugin in found {
                        if plugins.iter().any(|p| p.name == plugin.name) {
                            debug!("Skipping duplicate VPN plugin '{}' in {}", plugin.name, dir.display());
                            continue;
                        }
                        plugins.push(plugin);
                    }
                }
                Err(e) => debug!("Cannot read VPN plugin directory {}: {e}", dir.display()),
            }
        }

        debug!("Loaded {} VPN plugin(s)", plugins.len());
        Self { plugins }
    }

    /// Resolves `name` to a VPN service type.
    ///
    /// Tries, in order: a service type or alias (returned as given), a
    /// plugin name, one of NetworkManager's well-known short names, and
    /// finally the name appended to the service prefix if an installed
    /// plugin answers to that.
    pub fn find_service_type(&self, name: &str) -> Option<String> {
        if name.is_empty() {
            return None;
        }

        if self.plugins.iter().any(|p| p.answers_to_service(name)) {
            return Some(name.to_string());
        }

        if let Some(plugin) = self.plugins.iter().find(|p| p.name == name) {
            return Some(plugin.service.clone());
        }

        if vpn::KNOWN_SHORT_NAMES.contains(&name) {
            return Some(format!("{}{name}", vpn::SERVICE_PREFIX));
        }

        if !name.contains('.') {
            let service = format!("{}{name}", vpn::SERVICE_PREFIX);
            if self.plugins.iter().any(|p| p.answers_to_service(&service)) {
                return Some(service);
            }
        }

        None
    }
}

fn load_dir(dir: &Path) -> Result<Vec<VpnPluginInfo>> {
    let mut entries: Vec<_> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext == vpn::NAME_FILE_EXTENSION)
        })
        .collect();
    entries.sort();

    let mut plugins = Vec::new();
    for path in entries {
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Failed to read VPN plugin file {}: {e}", path.display());
                continue;
            }
        };

        match VpnPluginInfo::parse(&contents) {
            Some(plugin) => plugins.push(plugin),
            None => warn!("Ignoring invalid VPN plugin file {}", path.display()),
        }
    }

    Ok(plugins)
}
