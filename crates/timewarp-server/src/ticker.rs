// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! The 1 Hz ticker that advances virtual clocks.

use std::time::Duration;

use log::debug;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::state::SharedState;

/// Spawn the ticker task.
///
/// Every second the task takes the write lock and ticks all registered
/// timers. When a value arrives on `shutdown` the task returns; the select
/// loop terminates for real rather than skipping a single iteration.
pub fn spawn(state: SharedState, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        // The first tick of a tokio interval fires immediately; ticking all
        // timers once at startup is harmless.
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Ok(mut state) = state.write() {
                        state.tick_all();
                    }
                }
                _ = shutdown.changed() => {
                    debug!("ticker shutting down");
                    return;
                }
            }
        }
    })
}
