//! Forwarding an invocation to an already running editor.
//!
//! The owner lookup and the `Start` call are made in sequence. An optional
//! deadline bounds the `Start` call; without one a hung owner stalls
//! startup until it answers or drops off the bus.

use futures::{FutureExt, select};
use futures_timer::Delay;
use log::{debug, warn};
use std::pin::pin;
use std::time::Duration;

use crate::Result;
use crate::api::models::{ActivationError, ActivationRequest};
use crate::dbus::ActivationBus;

/// Calls `Start` on the owner, giving up after `timeout` if one is set.
async fn call_start_within<B: ActivationBus + ?Sized>(
    bus: &B,
    request: &ActivationRequest,
    timeout: Option<Duration>,
) -> Result<()> {
    let Some(limit) = timeout else {
        return bus.call_start(request).await;
    };

    let mut call = pin!(bus.call_start(request).fuse());
    let mut deadline = pin!(Delay::new(limit).fuse());

    select! {
        result = call => result,
        _ = deadline => Err(ActivationError::Timeout(limit)),
    }
}

/// Tries to hand `request` to an existing instance.
///
/// Returns `true` if the existing instance accepted it and this process
/// should exit. Every failure returns `false` so the caller starts its own
/// UI; only failures other than "no owner" are logged as warnings.
pub async fn try_delegate<B: ActivationBus + ?Sized>(
    bus: &B,
    request: &ActivationRequest,
    timeout: Option<Duration>,
) -> bool {
    let owner = match bus.name_owner().await {
        Ok(Some(owner)) => owner,
        Ok(None) => {
            debug!("No existing editor instance");
            return false;
        }
        Err(e) => {
            warn!("Failed to get editor name owner: {e}");
            return false;
        }
    };

    debug!("Existing editor instance found at {owner}");
    match call_start_within(bus, request, timeout).await {
        Ok(()) => {
            debug!("Request forwarded to {owner}");
            true
        }
        Err(e) => {
            warn!("Failed to send arguments to existing editor instance: {e}");
            false
        }
    }
}
