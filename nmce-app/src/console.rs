//! Headless frontend that reports what the editor would open.
//!
//! Editing sessions complete as soon as they are announced, so a
//! single-profile invocation exits right after printing its session.

use log::{debug, warn};
use std::io::{self, Write};
use std::path::Path;

use nmce::{Frontend, SettingTypeInfo, UiEventSender};

pub struct ConsoleFrontend<W: Write = io::Stdout> {
    out: W,
    events: UiEventSender,
    keep_above: bool,
}

impl ConsoleFrontend {
    pub fn new(events: UiEventSender, keep_above: bool) -> Self {
        Self::with_writer(io::stdout(), events, keep_above)
    }
}

impl<W: Write> ConsoleFrontend<W> {
    pub fn with_writer(out: W, events: UiEventSender, keep_above: bool) -> Self {
        Self {
            out,
            events,
            keep_above,
        }
    }

    fn line(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{text}") {
            warn!("Failed to write to the console: {e}");
        }
    }

    fn session(&mut self, text: &str) {
        self.line(text);
        self.events.editing_done();
    }
}

impl<W: Write> Frontend for ConsoleFrontend<W> {
    fn present(&mut self) {
        let hint = if self.keep_above { " (kept above)" } else { "" };
        self.line(&format!("Network Connections{hint}"));
    }

    fn show_type(&mut self, setting: Option<&'static dyn SettingTypeInfo>) {
        match setting {
            Some(setting) => self.line(&format!("Showing {} connections", setting.display_name())),
            None => self.line("Showing all connections"),
        }
    }

    fn add(&mut self) {
        let (virtual_types, hardware_types): (Vec<_>, Vec<_>) =
            nmce::setting_type_registry::all().partition(|setting| setting.is_virtual());
        let names = |types: Vec<&'static dyn SettingTypeInfo>| {
            types
                .iter()
                .map(|setting| setting.setting_name())
                .collect::<Vec<_>>()
                .join(", ")
        };

        self.line("Choose a connection type");
        self.line(&format!("  Hardware: {}", names(hardware_types)));
        self.session(&format!("  Virtual: {}", names(virtual_types)));
    }

    fn create(&mut self, setting: &'static dyn SettingTypeInfo, detail: Option<&str>) {
        let text = match detail {
            Some(detail) => format!("New {} connection ({detail})", setting.display_name()),
            None => format!("New {} connection", setting.display_name()),
        };
        self.session(&text);
    }

    fn import(&mut self, path: &Path, detail: Option<&str>) {
        if !path.is_file() {
            warn!("Failed to import VPN connection from {}", path.display());
        }
        debug!("Import plugin hint: {detail:?}");
        self.session(&format!("Importing VPN connection from {}", path.display()));
    }

    fn edit(&mut self, uuid: &str) {
        self.session(&format!("Editing connection {uuid}"));
    }
}
