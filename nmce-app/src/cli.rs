//! Command line of the connection editor.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use nmce::{ActivationConfig, ActivationRequest, TypeSelector};

#[derive(Parser, Debug)]
#[command(name = "nm-connection-editor")]
#[command(about = "Allows users to view and edit network connection settings")]
#[command(version)]
pub struct Args {
    /// Type of connection to show or create
    #[arg(short = 't', long = "type", value_name = "802-3-ethernet")]
    pub connection_type: Option<String>,

    /// Create a new connection
    #[arg(short = 'c', long)]
    pub create: bool,

    /// Show a given connection type page
    #[arg(short = 's', long)]
    pub show: bool,

    /// Edit an existing connection with a given UUID
    #[arg(short = 'e', long = "edit", value_name = "UUID")]
    pub uuid: Option<String>,

    /// Import a VPN connection from given file
    #[arg(short = 'i', long)]
    pub import: Option<PathBuf>,

    // Not passed over D-Bus.
    #[arg(long, hide = true)]
    pub keep_above: bool,

    /// Seconds to wait for a running editor to accept the request (0 waits forever)
    #[arg(long, hide = true, value_name = "SECS")]
    pub delegation_timeout: Option<u64>,
}

impl Args {
    /// Builds the request forwarded to, or handled by, the active editor.
    pub fn to_request(&self) -> ActivationRequest {
        ActivationRequest {
            connection_type: self.connection_type.as_deref().map(TypeSelector::parse),
            create: self.create,
            show: self.show,
            uuid: self.uuid.clone(),
            import: self.import.clone(),
        }
        .without_empty_fields()
        // Just one page for both CDMA & GSM
        .normalize_mobile_broadband()
    }

    /// Activation settings, with the command line overrides applied.
    pub fn config(&self) -> ActivationConfig {
        let config = ActivationConfig::default();
        match self.delegation_timeout {
            Some(0) => config.without_delegation_timeout(),
            Some(secs) => config.with_delegation_timeout(Duration::from_secs(secs)),
            None => config,
        }
    }
}
