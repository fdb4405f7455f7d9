use std::collections::HashMap;
use std::fmt::{self, Display};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use zvariant::Value;

use crate::types::constants::{setting_name, start_args};

/// A connection type selector as given to `--type`.
///
/// The part after the first `:` is a detail string interpreted by the
/// page handling the type, e.g. the VPN service for `vpn:openvpn`.
///
/// # Example
///
/// ```rust
/// use nmce::TypeSelector;
///
/// let selector = TypeSelector::parse("vpn:myvpn");
/// assert_eq!(selector.name, "vpn");
/// assert_eq!(selector.detail.as_deref(), Some("myvpn"));
/// assert_eq!(selector.to_string(), "vpn:myvpn");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSelector {
    /// Setting name, alias or VPN plugin name
    pub name: String,
    /// Optional detail following the first `:`
    pub detail: Option<String>,
}

impl TypeSelector {
    /// Splits `raw` at the first `:` into name and detail.
    pub fn parse(raw: &str) -> Self {
        match raw.split_once(':') {
            Some((name, detail)) => Self {
                name: name.to_string(),
                detail: Some(detail.to_string()),
            },
            None => Self {
                name: raw.to_string(),
                detail: None,
            },
        }
    }

    /// Returns `true` when the selector carried an explicit `:` separator.
    pub fn has_detail(&self) -> bool {
        self.detail.is_some()
    }
}

impl Display for TypeSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{}:{}", self.name, detail),
            None => write!(f, "{}", self.name),
        }
    }
}

/// What an editor invocation asks the active instance to do.
///
/// Built from the command line of a new process or decoded from a forwarded
/// `Start` call. At most one of `create`, `show`, `uuid` and `import` is
/// meaningful at a time; combining them is not rejected, the dispatcher picks
/// the first in that order of precedence: `show`, `create`/`import`, `uuid`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivationRequest {
    /// Connection type to show or create
    pub connection_type: Option<TypeSelector>,
    /// Create a new connection
    pub create: bool,
    /// Show the page of the given connection type
    pub show: bool,
    /// UUID of an existing connection to edit
    pub uuid: Option<String>,
    /// VPN connection file to import
    pub import: Option<PathBuf>,
}

impl ActivationRequest {
    /// Returns `true` if the request names a single editing session rather
    /// than the plain connection list.
    pub fn is_single_profile(&self) -> bool {
        self.create
            || self.show
            || self.uuid.as_deref().is_some_and(|uuid| !uuid.is_empty())
            || self.import.as_ref().is_some_and(|path| !path.as_os_str().is_empty())
    }

    /// Drops empty strings so they count as unset.
    ///
    /// `--edit ""` asks for nothing, the same as leaving `--edit` out.
    pub fn without_empty_fields(mut self) -> Self {
        if self.connection_type.as_ref().is_some_and(|t| t.to_string().is_empty()) {
            self.connection_type = None;
        }
        if self.uuid.as_deref().is_some_and(str::is_empty) {
            self.uuid = None;
        }
        if self.import.as_ref().is_some_and(|p| p.as_os_str().is_empty()) {
            self.import = None;
        }
        self
    }

    /// Returns `true` if nothing was requested beyond showing the list.
    pub fn is_empty(&self) -> bool {
        self.connection_type.is_none() && !self.is_single_profile()
    }

    /// Maps the CDMA type onto GSM; both share one mobile broadband page.
    ///
    /// Only applied to command-line invocations.
    pub fn normalize_mobile_broadband(mut self) -> Self {
        if let Some(selector) = self.connection_type.as_mut()
            && selector.detail.is_none()
            && selector.name == setting_name::CDMA
        {
            selector.name = setting_name::GSM.to_string();
        }
        self
    }

    /// Builds the `a{sv}` payload of a `Start` call.
    ///
    /// Only fields that are set end up in the dictionary: strings when
    /// present and non-empty, booleans only when `true`.
    pub fn to_start_args(&self) -> HashMap<&'static str, Value<'_>> {
        let mut args = HashMap::new();

        if let Some(selector) = &self.connection_type {
            let selector = selector.to_string();
            if !selector.is_empty() {
                args.insert(start_args::TYPE, Value::from(selector));
            }
        }
        if self.create {
            args.insert(start_args::CREATE, Value::from(true));
        }
        if self.show {
            args.insert(start_args::SHOW, Value::from(true));
        }
        if let Some(uuid) = self.uuid.as_deref().filter(|u| !u.is_empty()) {
            args.insert(start_args::UUID, Value::from(uuid));
        }
        if let Some(import) = self.import.as_ref().filter(|p| !p.as_os_str().is_empty()) {
            args.insert(
                start_args::IMPORT,
                Value::from(import.to_string_lossy().into_owned()),
            );
        }

        args
    }

    /// Decodes the dictionary received by a `Start` call.
    ///
    /// Unknown keys are ignored and empty strings count as unset. A known key
    /// holding a value of the wrong type fails the whole request with
    /// [`ActivationError::InvalidArguments`].
    pub fn from_start_args<K>(args: &HashMap<K, Value<'_>>) -> Result<Self, ActivationError>
    where
        K: AsRef<str> + Eq + std::hash::Hash,
    {
        let mut request = Self::default();

        for (key, value) in args {
            match key.as_ref() {
                start_args::TYPE => {
                    request.connection_type = Some(TypeSelector::parse(expect_str(key, value)?));
                }
                start_args::CREATE => request.create = expect_bool(key, value)?,
                start_args::SHOW => request.show = expect_bool(key, value)?,
                start_args::UUID => request.uuid = Some(expect_str(key, value)?.to_string()),
                start_args::IMPORT => {
                    request.import = Some(PathBuf::from(expect_str(key, value)?));
                }
                _ => {}
            }
        }

        Ok(request.without_empty_fields())
    }
}

fn unwrap_variant<'a, 'v>(value: &'a Value<'v>) -> &'a Value<'v> {
    match value {
        Value::Value(inner) => unwrap_variant(inner),
        other => other,
    }
}

fn expect_str<'a, K: AsRef<str>>(key: &K, value: &'a Value<'_>) -> Result<&'a str, ActivationError> {
    match unwrap_variant(value) {
        Value::Str(s) => Ok(s.as_str()),
        other => Err(ActivationError::InvalidArguments(format!(
            "'{}' must be a string, got '{}'",
            key.as_ref(),
            other.value_signature()
        ))),
    }
}

fn expect_bool<K: AsRef<str>>(key: &K, value: &Value<'_>) -> Result<bool, ActivationError> {
    match unwrap_variant(value) {
        Value::Bool(b) => Ok(*b),
        other => Err(ActivationError::InvalidArguments(format!(
            "'{}' must be a boolean, got '{}'",
            key.as_ref(),
            other.value_signature()
        ))),
    }
}

/// How long the active instance keeps running after its initial request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitDirective {
    /// Quit once the single editing session of the initial request ends.
    ExitWhenEditingDone,
    /// Run until a signal arrives or the UI quits.
    RunUntilQuit,
    /// The request was handed to another instance; exit right away.
    ExitNow,
}

impl Display for ExitDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExitWhenEditingDone => write!(f, "exit when editing is done"),
            Self::RunUntilQuit => write!(f, "run until quit"),
            Self::ExitNow => write!(f, "exit now"),
        }
    }
}

/// Lifecycle of an editor process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceState {
    /// Process started, nothing checked yet.
    Startup,
    /// Looking for an existing instance to delegate to.
    DelegatingCheck,
    /// Request forwarded to another instance. Terminal.
    Delegated,
    /// This process is the active instance.
    Active,
    /// Event loop running.
    AwaitingRequests,
    /// Event loop stopped, releasing bus resources.
    ShuttingDown,
    /// Torn down. Terminal.
    Terminated,
}

impl InstanceState {
    /// Returns `true` for states the process exits from.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Delegated | Self::Terminated)
    }
}

impl Display for InstanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Startup => write!(f, "Startup"),
            Self::DelegatingCheck => write!(f, "Delegating check"),
            Self::Delegated => write!(f, "Delegated"),
            Self::Active => write!(f, "Active"),
            Self::AwaitingRequests => write!(f, "Awaiting requests"),
            Self::ShuttingDown => write!(f, "Shutting down"),
            Self::Terminated => write!(f, "Terminated"),
        }
    }
}

/// Outcome of claiming the well-known bus name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameClaim {
    /// This process now owns the name.
    PrimaryOwner,
    /// This process already owned the name.
    AlreadyOwner,
    /// Queued behind the current owner.
    InQueue,
    /// Another process owns the name.
    Exists,
}

impl NameClaim {
    /// Returns `true` if this process owns the name after the claim.
    pub fn is_owner(self) -> bool {
        matches!(self, Self::PrimaryOwner | Self::AlreadyOwner)
    }
}

impl From<zbus::fdo::RequestNameReply> for NameClaim {
    fn from(reply: zbus::fdo::RequestNameReply) -> Self {
        match reply {
            zbus::fdo::RequestNameReply::PrimaryOwner => Self::PrimaryOwner,
            zbus::fdo::RequestNameReply::AlreadyOwner => Self::AlreadyOwner,
            zbus::fdo::RequestNameReply::InQueue => Self::InQueue,
            zbus::fdo::RequestNameReply::Exists => Self::Exists,
        }
    }
}

/// Events the UI layer reports back to the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEvent {
    /// The user closed the connection list.
    Done,
    /// An editing session started by a request finished.
    EditingDone,
}

/// Errors that can occur while coordinating editor instances.
#[derive(Debug, Error)]
pub enum ActivationError {
    /// A D-Bus communication error occurred.
    #[error("D-Bus error: {0}")]
    Dbus(#[from] zbus::Error),

    /// The bus or the peer answered with a standard D-Bus error.
    #[error("D-Bus error reply: {0}")]
    Fdo(#[from] zbus::fdo::Error),

    /// A `Start` payload did not have the expected shape.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// The connection type is neither a known setting nor a VPN plugin.
    #[error("unknown connection type '{0}'")]
    UnknownConnectionType(String),

    /// The existing instance did not answer in time.
    #[error("no reply from existing instance within {0:?}")]
    Timeout(Duration),

    /// No session bus connection is available.
    #[error("session bus unavailable")]
    BusUnavailable,

    /// Reading VPN plugin descriptions failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
