//! Handler for `Start` calls from other editor invocations.
//!
//! Method calls are read straight off the connection's message stream so
//! the payload shape can be checked before anything is dispatched. A call
//! is answered as soon as its request is queued for the UI; the reply does
//! not wait for the UI to present anything.
//!
//! Every other method call addressed to this connection gets a reply too:
//! `org.freedesktop.DBus.Peer` on any path, `Introspect` on the editor
//! object, and an `Unknown*` error for anything else.

use futures::StreamExt;
use log::{debug, warn};
use std::collections::HashMap;
use std::fs;
use zbus::fdo;
use zbus::message::{Flags, Header, Type as MessageType};
use zbus::{Connection, Message, MessageStream};
use zvariant::Value;

use crate::Result;
use crate::api::models::{ActivationError, ActivationRequest};
use crate::dbus::RequestSink;
use crate::types::constants::bus;

const NOT_A_DICT: &str = "Invalid argument type (not a dict)";

const PEER_INTERFACE: &str = "org.freedesktop.DBus.Peer";
const INTROSPECTABLE_INTERFACE: &str = "org.freedesktop.DBus.Introspectable";

const MACHINE_ID_FILES: &[&str] = &["/var/lib/dbus/machine-id", "/etc/machine-id"];

/// Where the `Start` method lives.
#[derive(Debug, Clone)]
pub(crate) struct StartEndpoint {
    pub path: String,
    pub interface: String,
}

/// What an incoming method call is answered with.
#[derive(Debug, Clone, PartialEq)]
enum Route {
    Start,
    Ping,
    MachineId,
    Introspect,
    Reject(fdo::Error),
}

impl StartEndpoint {
    fn route(&self, hdr: &Header<'_>) -> Route {
        let member = hdr.member().map(|m| m.as_str()).unwrap_or_default();
        let interface = hdr.interface().map(|i| i.as_str());
        let path = hdr.path().map(|p| p.as_str()).unwrap_or_default();

        // Peer works on any path.
        if interface == Some(PEER_INTERFACE) {
            return match member {
                "Ping" => Route::Ping,
                "GetMachineId" => Route::MachineId,
                _ => unknown_method(member),
            };
        }

        if path != self.path {
            return Route::Reject(fdo::Error::UnknownObject(format!(
                "No such object path '{path}'"
            )));
        }

        match interface {
            Some(i) if i == self.interface => match member {
                bus::START_METHOD => Route::Start,
                _ => unknown_method(member),
            },
            Some(INTROSPECTABLE_INTERFACE) => match member {
                "Introspect" => Route::Introspect,
                _ => unknown_method(member),
            },
            Some(other) => Route::Reject(fdo::Error::UnknownInterface(format!(
                "No such interface '{other}' on object at path {path}"
            ))),
            // The interface is optional on method calls.
            None => match member {
                bus::START_METHOD => Route::Start,
                "Introspect" => Route::Introspect,
                "Ping" => Route::Ping,
                "GetMachineId" => Route::MachineId,
                _ => unknown_method(member),
            },
        }
    }

    fn introspection_xml(&self) -> String {
        format!(
            r#"<!DOCTYPE node PUBLIC "-//freedesktop//DTD D-BUS Object Introspection 1.0//EN"
 "http://www.freedesktop.org/standards/dbus/1.0/introspect.dtd">
<node>
  <interface name="{PEER_INTERFACE}">
    <method name="Ping"/>
    <method name="GetMachineId">
      <arg type="s" name="machine_uuid" direction="out"/>
    </method>
  </interface>
  <interface name="{INTROSPECTABLE_INTERFACE}">
    <method name="Introspect">
      <arg type="s" name="xml_data" direction="out"/>
    </method>
  </interface>
  <interface name="{}">
    <method name="{}">
      <arg type="a{{sv}}" name="args" direction="in"/>
    </method>
  </interface>
</node>
"#,
            self.interface,
            bus::START_METHOD
        )
    }
}

fn unknown_method(member: &str) -> Route {
    Route::Reject(fdo::Error::UnknownMethod(format!(
        "No such method '{member}'"
    )))
}

fn machine_id() -> std::result::Result<String, fdo::Error> {
    MACHINE_ID_FILES
        .iter()
        .find_map(|path| fs::read_to_string(path).ok())
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| fdo::Error::IOError("Failed to read the machine ID".into()))
}

/// Decodes the body of a `Start` call into a request.
///
/// Fails with [`ActivationError::InvalidArguments`] when the body is not a
/// single `a{sv}` dictionary or a known key has the wrong value type.
pub fn decode_start_call(msg: &Message) -> Result<ActivationRequest> {
    let body = msg.body();
    let args: HashMap<String, Value<'_>> = body
        .deserialize()
        .map_err(|_| ActivationError::InvalidArguments(NOT_A_DICT.into()))?;

    ActivationRequest::from_start_args(&args)
}

/// The error reply sent for a malformed `Start` call.
pub fn invalid_arguments_error(err: &ActivationError) -> fdo::Error {
    match err {
        ActivationError::InvalidArguments(msg) => fdo::Error::InvalidArgs(msg.clone()),
        other => fdo::Error::InvalidArgs(other.to_string()),
    }
}

/// Answers method calls until the connection closes.
pub(crate) async fn serve(
    conn: Connection,
    mut stream: MessageStream,
    endpoint: StartEndpoint,
    sink: RequestSink,
) {
    debug!(
        "Serving {}.{} at {}",
        endpoint.interface,
        bus::START_METHOD,
        endpoint.path
    );

    while let Some(msg) = stream.next().await {
        let msg = match msg {
            Ok(msg) => msg,
            Err(e) => {
                warn!("Failed to read message from the session bus: {e}");
                continue;
            }
        };

        if msg.message_type() != MessageType::MethodCall {
            continue;
        }

        let hdr = msg.header();
        let reply = match endpoint.route(&hdr) {
            Route::Start => match decode_start_call(&msg) {
                Ok(request) => {
                    debug!("Start request from {:?}: {request:?}", hdr.sender());
                    if !sink.dispatch(request) {
                        warn!("Dropping Start request, event loop is gone");
                    }
                    Ok(None)
                }
                Err(e) => {
                    warn!("Rejecting Start call: {e}");
                    Err(invalid_arguments_error(&e))
                }
            },
            Route::Ping => Ok(None),
            Route::MachineId => machine_id().map(Some),
            Route::Introspect => Ok(Some(endpoint.introspection_xml())),
            Route::Reject(e) => {
                debug!(
                    "Rejecting {:?}.{:?} on {:?}: {e}",
                    hdr.interface(),
                    hdr.member(),
                    hdr.path()
                );
                Err(e)
            }
        };

        if msg.primary_header().flags().contains(Flags::NoReplyExpected) {
            continue;
        }

        let sent = match reply {
            Ok(None) => conn.reply(&hdr, &()).await,
            Ok(Some(text)) => conn.reply(&hdr, &text).await,
            Err(e) => conn.reply_dbus_error(&hdr, e).await,
        };

        if let Err(e) = sent {
            warn!("Failed to reply to {:?}: {e}", hdr.member());
        }
    }

    debug!("Session bus message stream ended");
}
