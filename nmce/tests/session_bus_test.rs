//! End-to-end tests of the handshake over a private `dbus-daemon`.
//!
//! Each test starts its own bus so the well-known name is never shared with
//! a real editor. Tests return early when `dbus-daemon` is not installed.

use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use nmce::constants::bus;
use nmce::{
    ActivationBus, ActivationConfig, ActivationRequest, Coordinator, ExitDirective, Frontend,
    InstanceState, NameClaim, SessionBus, SettingTypeInfo, UiEventSender, VpnPluginRegistry,
};
use zbus::Connection;

const BUS_CONFIG: &str = r#"<!DOCTYPE busconfig PUBLIC "-//freedesktop//DTD D-Bus Bus Configuration 1.0//EN"
 "http://www.freedesktop.org/standards/dbus/1.0/busconfig.dtd">
<busconfig>
  <type>session</type>
  <listen>unix:tmpdir=/tmp</listen>
  <auth>EXTERNAL</auth>
  <policy context="default">
    <allow send_destination="*" eavesdrop="true"/>
    <allow eavesdrop="true"/>
    <allow own="*"/>
  </policy>
</busconfig>
"#;

const CALL_LIMIT: Duration = Duration::from_secs(5);

/// A `dbus-daemon` killed on drop.
struct PrivateBus {
    daemon: Child,
    address: String,
    _config: tempfile::NamedTempFile,
}

impl PrivateBus {
    fn start() -> Option<Self> {
        let mut config = tempfile::NamedTempFile::new().ok()?;
        config.write_all(BUS_CONFIG.as_bytes()).ok()?;

        let mut daemon = match Command::new("dbus-daemon")
            .arg(format!("--config-file={}", config.path().display()))
            .args(["--nofork", "--print-address"])
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(daemon) => daemon,
            Err(e) => {
                eprintln!("skipping, cannot start dbus-daemon: {e}");
                return None;
            }
        };

        let mut address = String::new();
        let stdout = daemon.stdout.take()?;
        BufReader::new(stdout).read_line(&mut address).ok()?;

        Some(Self {
            daemon,
            address: address.trim().to_string(),
            _config: config,
        })
    }

    async fn connect(&self) -> Connection {
        zbus::connection::Builder::address(self.address.as_str())
            .unwrap()
            .build()
            .await
            .unwrap()
    }

    async fn session_bus(&self) -> SessionBus {
        SessionBus::with_connection(self.connect().await, &config())
    }

    async fn coordinator(&self) -> Coordinator<SessionBus> {
        Coordinator::with_bus(config(), Some(self.session_bus().await))
            .with_vpn_plugins(VpnPluginRegistry::default())
    }
}

impl Drop for PrivateBus {
    fn drop(&mut self) {
        let _ = self.daemon.kill();
        let _ = self.daemon.wait();
    }
}

fn config() -> ActivationConfig {
    ActivationConfig::new()
        .with_vpn_plugin_dirs(Vec::<String>::new())
        .with_delegation_timeout(CALL_LIMIT)
}

/// Records edits and closes the list after the first one.
struct QuitAfterEdit {
    edits: Vec<String>,
    events: UiEventSender,
}

impl Frontend for QuitAfterEdit {
    fn present(&mut self) {}

    fn show_type(&mut self, _setting: Option<&'static dyn SettingTypeInfo>) {}

    fn add(&mut self) {}

    fn create(&mut self, _setting: &'static dyn SettingTypeInfo, _detail: Option<&str>) {}

    fn import(&mut self, _path: &Path, _detail: Option<&str>) {}

    fn edit(&mut self, uuid: &str) {
        self.edits.push(uuid.to_string());
        self.events.done();
    }
}

/// Calls a method on the editor object, failing the test instead of hanging.
async fn call<B>(
    conn: &Connection,
    interface: Option<&str>,
    member: &str,
    body: &B,
) -> zbus::Result<zbus::Message>
where
    B: serde::Serialize + zvariant::DynamicType,
{
    tokio::time::timeout(
        CALL_LIMIT,
        conn.call_method(Some(bus::SERVICE), bus::OBJECT_PATH, interface, member, body),
    )
    .await
    .expect("the editor should answer every method call")
}

fn error_name(result: zbus::Result<zbus::Message>) -> (String, Option<String>) {
    match result {
        Err(zbus::Error::MethodError(name, desc, _)) => (name.to_string(), desc),
        other => panic!("expected an error reply, got {other:?}"),
    }
}

#[tokio::test]
async fn name_ownership_round_trip() {
    let Some(daemon) = PrivateBus::start() else {
        return;
    };
    let a = daemon.session_bus().await;
    let b = daemon.session_bus().await;

    assert_eq!(a.name_owner().await.unwrap(), None);

    assert_eq!(a.claim_name().await.unwrap(), NameClaim::PrimaryOwner);
    assert_eq!(b.claim_name().await.unwrap(), NameClaim::Exists);
    assert!(b.name_owner().await.unwrap().is_some());

    a.release_name().await.unwrap();
    assert_eq!(b.name_owner().await.unwrap(), None);
}

#[tokio::test]
async fn second_invocation_is_forwarded_over_the_bus() {
    let Some(daemon) = PrivateBus::start() else {
        return;
    };

    let mut a = daemon.coordinator().await;
    let mut frontend = QuitAfterEdit {
        edits: Vec::new(),
        events: a.ui_events(),
    };

    assert!(!a.try_delegate_to_existing_instance(&ActivationRequest::default()).await);
    let directive = a
        .become_active_instance(&ActivationRequest::default(), &mut frontend)
        .await;
    assert_eq!(directive, ExitDirective::RunUntilQuit);
    assert!(a.owns_name());

    let mut b = daemon.coordinator().await;
    let request = ActivationRequest {
        uuid: Some("UUID-123".into()),
        ..Default::default()
    };
    assert!(b.try_delegate_to_existing_instance(&request).await);
    assert_eq!(b.state(), InstanceState::Delegated);
    b.shutdown().await;

    tokio::time::timeout(CALL_LIMIT, a.run(&mut frontend, directive))
        .await
        .expect("the forwarded edit should end the loop");
    assert_eq!(frontend.edits, vec!["UUID-123"]);

    a.shutdown().await;
    assert_eq!(a.state(), InstanceState::Terminated);

    let observer = daemon.session_bus().await;
    assert_eq!(observer.name_owner().await.unwrap(), None);
}

#[tokio::test]
async fn start_replies_on_the_wire() {
    let Some(daemon) = PrivateBus::start() else {
        return;
    };

    let mut a = daemon.coordinator().await;
    let mut frontend = QuitAfterEdit {
        edits: Vec::new(),
        events: a.ui_events(),
    };
    a.become_active_instance(&ActivationRequest::default(), &mut frontend)
        .await;

    let client = daemon.connect().await;

    let reply = call(
        &client,
        Some(bus::INTERFACE),
        bus::START_METHOD,
        &std::collections::HashMap::<&str, zvariant::Value<'_>>::new(),
    )
    .await
    .unwrap();
    assert!(reply.body().is_empty());

    let (name, desc) = error_name(
        call(&client, Some(bus::INTERFACE), bus::START_METHOD, &"UUID-123").await,
    );
    assert_eq!(name, "org.freedesktop.DBus.Error.InvalidArgs");
    assert_eq!(desc.as_deref(), Some("Invalid argument type (not a dict)"));
}

#[tokio::test]
async fn other_method_calls_are_answered() {
    let Some(daemon) = PrivateBus::start() else {
        return;
    };

    let mut a = daemon.coordinator().await;
    let mut frontend = QuitAfterEdit {
        edits: Vec::new(),
        events: a.ui_events(),
    };
    a.become_active_instance(&ActivationRequest::default(), &mut frontend)
        .await;

    let client = daemon.connect().await;

    call(&client, Some("org.freedesktop.DBus.Peer"), "Ping", &())
        .await
        .unwrap();

    let xml: String = call(
        &client,
        Some("org.freedesktop.DBus.Introspectable"),
        "Introspect",
        &(),
    )
    .await
    .unwrap()
    .body()
    .deserialize()
    .unwrap();
    assert!(xml.contains(bus::INTERFACE));
    assert!(xml.contains(r#"<method name="Start">"#));

    let (name, _) = error_name(call(&client, Some(bus::INTERFACE), "Stop", &()).await);
    assert_eq!(name, "org.freedesktop.DBus.Error.UnknownMethod");
}
