//! Routing of activation requests to the frontend.

use log::{debug, warn};

use crate::api::frontend::Frontend;
use crate::api::models::{ActivationError, ActivationRequest, TypeSelector};
use crate::core::vpn_plugins::VpnPluginRegistry;
use crate::types::constants::setting_name;
use crate::types::setting_type_registry::{self, SettingTypeInfo};

/// A `--type` value resolved against the registry and VPN plugins.
#[derive(Clone, Copy)]
pub(crate) struct ResolvedType<'a> {
    pub setting: &'static dyn SettingTypeInfo,
    pub detail: Option<&'a str>,
}

impl std::fmt::Debug for ResolvedType<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedType")
            .field("setting", &self.setting.setting_name())
            .field("detail", &self.detail)
            .finish()
    }
}

/// Resolves a selector to a connection type.
///
/// A bare name that is not a setting may name a VPN plugin, in which case
/// the type is VPN and the name becomes the detail.
pub(crate) fn resolve_type<'a>(
    selector: &'a TypeSelector,
    plugins: &VpnPluginRegistry,
) -> Result<ResolvedType<'a>, ActivationError> {
    if let Some(setting) = setting_type_registry::lookup(&selector.name) {
        return Ok(ResolvedType {
            setting,
            detail: selector.detail.as_deref(),
        });
    }

    if !selector.has_detail()
        && let Some(service) = plugins.find_service_type(&selector.name)
    {
        debug!("'{}' is the VPN plugin {service}", selector.name);
        let setting = setting_type_registry::lookup(setting_name::VPN)
            .ok_or_else(|| ActivationError::UnknownConnectionType(setting_name::VPN.into()))?;
        return Ok(ResolvedType {
            setting,
            detail: Some(selector.name.as_str()),
        });
    }

    Err(ActivationError::UnknownConnectionType(selector.name.clone()))
}

/// Hands `request` to the frontend.
///
/// Returns `true` when the connection list should be presented afterwards,
/// which is the case unless a single editing session was started.
pub fn handle_request<F: Frontend + ?Sized>(
    frontend: &mut F,
    request: &ActivationRequest,
    plugins: &VpnPluginRegistry,
) -> bool {
    let resolved = match request.connection_type.as_ref() {
        Some(selector) => match resolve_type(selector, plugins) {
            Ok(resolved) => Some(resolved),
            Err(e) => {
                debug!("Type resolution failed: {e}");
                warn!("Unknown connection type '{}'", selector.name);
                return true;
            }
        },
        None => None,
    };

    if request.show {
        frontend.show_type(resolved.map(|r| r.setting));
        return true;
    }

    if request.create {
        match resolved {
            Some(r) => frontend.create(r.setting, r.detail),
            None => frontend.add(),
        }
        return false;
    }

    if let Some(path) = request.import.as_deref() {
        frontend.import(path, resolved.and_then(|r| r.detail));
        return false;
    }

    if let Some(uuid) = request.uuid.as_deref() {
        frontend.edit(uuid);
        return false;
    }

    true
}
