//! [`ActivationBus`] backed by the user's session bus.

use async_trait::async_trait;
use log::debug;
use std::sync::Mutex;
use tokio::task::JoinHandle;
use zbus::fdo::{DBusProxy, RequestNameFlags};
use zbus::names::BusName;
use zbus::proxy::CacheProperties;
use zbus::{Connection, MessageStream};

use crate::Result;
use crate::api::config::ActivationConfig;
use crate::api::models::{ActivationRequest, NameClaim};
use crate::dbus::editor::NMConnectionEditorProxy;
use crate::dbus::service::{self, StartEndpoint};
use crate::dbus::{ActivationBus, RequestSink};

/// Session bus connection used for the single-instance handshake.
///
/// Cloning the underlying [`Connection`] is cheap; the `Start` handler task
/// shares it with this value.
#[derive(Debug)]
pub struct SessionBus {
    conn: Connection,
    config: ActivationConfig,
    service: Mutex<Option<JoinHandle<()>>>,
}

impl SessionBus {
    /// Connects to the session bus.
    pub async fn connect(config: &ActivationConfig) -> Result<Self> {
        let conn = Connection::session().await?;
        debug!("Connected to the session bus as {:?}", conn.unique_name());
        Ok(Self::with_connection(conn, config))
    }

    /// Wraps an existing connection.
    pub fn with_connection(conn: Connection, config: &ActivationConfig) -> Self {
        Self {
            conn,
            config: config.clone(),
            service: Mutex::new(None),
        }
    }

    async fn editor_proxy(&self) -> Result<NMConnectionEditorProxy<'_>> {
        let proxy = NMConnectionEditorProxy::builder(&self.conn)
            .destination(self.config.bus_name.as_str())?
            .path(self.config.object_path.as_str())?
            .interface(self.config.interface.as_str())?
            .cache_properties(CacheProperties::No)
            .build()
            .await?;
        Ok(proxy)
    }

    fn stop_service(&self) {
        if let Ok(mut slot) = self.service.lock()
            && let Some(handle) = slot.take()
        {
            handle.abort();
        }
    }
}

#[async_trait]
impl ActivationBus for SessionBus {
    async fn name_owner(&self) -> Result<Option<String>> {
        let dbus = DBusProxy::new(&self.conn).await?;
        let name = BusName::try_from(self.config.bus_name.as_str()).map_err(zbus::Error::from)?;

        match dbus.get_name_owner(name).await {
            Ok(owner) => Ok(Some(owner.to_string())),
            Err(zbus::fdo::Error::NameHasNoOwner(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn call_start(&self, request: &ActivationRequest) -> Result<()> {
        let proxy = self.editor_proxy().await?;
        proxy.start(request.to_start_args()).await?;
        Ok(())
    }

    async fn serve_start(&self, sink: RequestSink) -> Result<()> {
        // Subscribe before the name is claimed so no early call is missed.
        let stream = MessageStream::from(&self.conn);
        let endpoint = StartEndpoint {
            path: self.config.object_path.clone(),
            interface: self.config.interface.clone(),
        };

        let handle = tokio::spawn(service::serve(self.conn.clone(), stream, endpoint, sink));

        self.stop_service();
        if let Ok(mut slot) = self.service.lock() {
            *slot = Some(handle);
        }
        Ok(())
    }

    async fn claim_name(&self) -> Result<NameClaim> {
        let reply = self
            .conn
            .request_name_with_flags(
                self.config.bus_name.as_str(),
                RequestNameFlags::DoNotQueue.into(),
            )
            .await;

        match reply {
            Ok(reply) => Ok(reply.into()),
            Err(zbus::Error::NameTaken) => Ok(NameClaim::Exists),
            Err(e) => Err(e.into()),
        }
    }

    async fn release_name(&self) -> Result<()> {
        self.stop_service();
        let released = self
            .conn
            .release_name(self.config.bus_name.as_str())
            .await?;
        debug!("Released {}: {released}", self.config.bus_name);
        Ok(())
    }
}
