use log::{debug, info, warn};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

use crate::api::config::ActivationConfig;
use crate::api::frontend::{Frontend, UiEventSender};
use crate::api::models::{ActivationRequest, ExitDirective, InstanceState, UiEvent};
use crate::core::delegation::try_delegate;
use crate::core::dispatch::handle_request;
use crate::core::vpn_plugins::VpnPluginRegistry;
use crate::dbus::{ActivationBus, RequestSink, SessionBus};

/// Cloneable handle that stops a running [`Coordinator::run`] loop.
#[derive(Debug, Clone)]
pub struct StopHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl StopHandle {
    /// Asks the event loop to stop. Safe to call more than once.
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }
}

/// Decides whether this process is the active editor and runs it.
///
/// One coordinator is built at process start and torn down with
/// [`Coordinator::shutdown`] on the way out. It owns the bus connection,
/// the channel forwarded requests arrive on, and the UI event channel.
///
/// # Example
///
/// ```no_run
/// use nmce::{ActivationConfig, ActivationRequest, Coordinator, ExitDirective, Frontend};
///
/// # async fn example<F: Frontend>(frontend: &mut F) {
/// let request = ActivationRequest::default();
/// let mut coordinator = Coordinator::connect(ActivationConfig::default()).await;
///
/// if coordinator.try_delegate_to_existing_instance(&request).await {
///     return; // another editor took it
/// }
///
/// let directive = coordinator.become_active_instance(&request, frontend).await;
/// if directive != ExitDirective::ExitNow {
///     coordinator.run(frontend, directive).await;
/// }
/// coordinator.shutdown().await;
/// # }
/// ```
///
/// # Bus Unavailable
///
/// Without a session bus the coordinator never delegates and never serves
/// `Start`; the process simply runs as its own active instance.
#[derive(Debug)]
pub struct Coordinator<B: ActivationBus = SessionBus> {
    config: ActivationConfig,
    bus: Option<B>,
    plugins: VpnPluginRegistry,
    state: InstanceState,
    owns_name: bool,
    requests_tx: mpsc::UnboundedSender<ActivationRequest>,
    requests_rx: mpsc::UnboundedReceiver<ActivationRequest>,
    ui_tx: mpsc::UnboundedSender<UiEvent>,
    ui_rx: mpsc::UnboundedReceiver<UiEvent>,
    stop_tx: Arc<watch::Sender<bool>>,
    stop_rx: watch::Receiver<bool>,
}

impl Coordinator<SessionBus> {
    /// Creates a coordinator on the session bus.
    ///
    /// A failed connection is logged and the coordinator falls back to
    /// running without a bus.
    pub async fn connect(config: ActivationConfig) -> Self {
        let bus = match SessionBus::connect(&config).await {
            Ok(bus) => Some(bus),
            Err(e) => {
                warn!("Session bus unavailable, not checking for other editors: {e}");
                None
            }
        };
        Self::with_bus(config, bus)
    }
}

impl<B: ActivationBus> Coordinator<B> {
    /// Creates a coordinator over `bus`, loading VPN plugins from the
    /// configured directories.
    pub fn with_bus(config: ActivationConfig, bus: Option<B>) -> Self {
        let plugins = VpnPluginRegistry::load(&config.vpn_plugin_dirs);
        let (requests_tx, requests_rx) = mpsc::unbounded_channel();
        let (ui_tx, ui_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = watch::channel(false);

        Self {
            config,
            bus,
            plugins,
            state: InstanceState::Startup,
            owns_name: false,
            requests_tx,
            requests_rx,
            ui_tx,
            ui_rx,
            stop_tx: Arc::new(stop_tx),
            stop_rx,
        }
    }

    /// Replaces the VPN plugins used to resolve `--type` names.
    #[must_use]
    pub fn with_vpn_plugins(mut self, plugins: VpnPluginRegistry) -> Self {
        self.plugins = plugins;
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> InstanceState {
        self.state
    }

    /// Whether this process owns the well-known bus name.
    pub fn owns_name(&self) -> bool {
        self.owns_name
    }

    /// Whether a bus connection is available.
    pub fn has_bus(&self) -> bool {
        self.bus.is_some()
    }

    /// The configuration in use.
    pub fn config(&self) -> &ActivationConfig {
        &self.config
    }

    /// Sender the frontend reports [`UiEvent`]s through.
    pub fn ui_events(&self) -> UiEventSender {
        UiEventSender::new(self.ui_tx.clone())
    }

    /// Handle for stopping the event loop, e.g. from a signal handler.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            tx: Arc::clone(&self.stop_tx),
        }
    }

    /// Forwards `request` to an instance already owning the bus name.
    ///
    /// Returns `true` if it was accepted, in which case the caller should
    /// exit successfully. Returns `false` without a bus, without an owner,
    /// or when the forwarding call fails.
    pub async fn try_delegate_to_existing_instance(&mut self, request: &ActivationRequest) -> bool {
        self.state = InstanceState::DelegatingCheck;

        let Some(bus) = self.bus.as_ref() else {
            debug!("No session bus, skipping existing instance check");
            self.state = InstanceState::Active;
            return false;
        };

        if try_delegate(bus, request, self.config.delegation_timeout).await {
            self.state = InstanceState::Delegated;
            true
        } else {
            self.state = InstanceState::Active;
            false
        }
    }

    /// Makes this process the active instance and dispatches `request`.
    ///
    /// Serving `Start` and claiming the name are best effort. If the name
    /// turns out to be taken, the request is forwarded to the winner once
    /// more and [`ExitDirective::ExitNow`] is returned on success; otherwise
    /// this process keeps running undiscoverable.
    pub async fn become_active_instance<F: Frontend + ?Sized>(
        &mut self,
        request: &ActivationRequest,
        frontend: &mut F,
    ) -> ExitDirective {
        self.state = InstanceState::Active;

        if let Some(bus) = self.bus.as_ref() {
            if let Err(e) = bus.serve_start(RequestSink::new(self.requests_tx.clone())).await {
                warn!("Failed to register the editor service: {e}");
            }

            match bus.claim_name().await {
                Ok(claim) if claim.is_owner() => {
                    debug!("Acquired {}", self.config.bus_name);
                    self.owns_name = true;
                }
                Ok(claim) => {
                    warn!(
                        "{} is already owned ({claim:?}), forwarding to the other editor",
                        self.config.bus_name
                    );
                    if try_delegate(bus, request, self.config.delegation_timeout).await {
                        self.state = InstanceState::Delegated;
                        return ExitDirective::ExitNow;
                    }
                    warn!("Continuing as a standalone editor instance");
                }
                Err(e) => warn!("Failed to acquire {}: {e}", self.config.bus_name),
            }
        }

        let show_list = handle_request(frontend, request, &self.plugins);
        if show_list {
            frontend.present();
        }

        // Only editing a single connection: exit when done with it.
        if !show_list && request.is_single_profile() {
            ExitDirective::ExitWhenEditingDone
        } else {
            ExitDirective::RunUntilQuit
        }
    }

    /// Runs the event loop until a stop request, a UI quit, or the end of
    /// the initial editing session when `directive` asks for it.
    pub async fn run<F: Frontend + ?Sized>(&mut self, frontend: &mut F, directive: ExitDirective) {
        if directive == ExitDirective::ExitNow || self.state.is_terminal() {
            debug!("Not running the event loop, instance is {}", self.state);
            return;
        }

        self.state = InstanceState::AwaitingRequests;
        debug!("Event loop running ({directive})");

        loop {
            if *self.stop_rx.borrow_and_update() {
                debug!("Stop requested");
                break;
            }

            tokio::select! {
                changed = self.stop_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                Some(event) = self.ui_rx.recv() => match event {
                    UiEvent::Done => {
                        debug!("Connection list closed");
                        break;
                    }
                    UiEvent::EditingDone if directive == ExitDirective::ExitWhenEditingDone => {
                        debug!("Editing session finished");
                        break;
                    }
                    UiEvent::EditingDone => {}
                },
                Some(request) = self.requests_rx.recv() => {
                    info!("Handling request from another editor invocation");
                    if handle_request(frontend, &request, &self.plugins) {
                        frontend.present();
                    }
                }
            }
        }

        self.state = InstanceState::ShuttingDown;
    }

    /// Releases the bus name and stops serving `Start`.
    pub async fn shutdown(&mut self) {
        if self.state != InstanceState::Delegated {
            self.state = InstanceState::ShuttingDown;
        }

        if let Some(bus) = self.bus.as_ref()
            && let Err(e) = bus.release_name().await
        {
            debug!("Failed to release {}: {e}", self.config.bus_name);
        }
        self.owns_name = false;

        if self.state != InstanceState::Delegated {
            self.state = InstanceState::Terminated;
        }
    }
}
