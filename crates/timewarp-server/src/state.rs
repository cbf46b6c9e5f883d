// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Shared server state: the timer registry and routing table behind one lock.
//!
//! Request handlers, the 1 Hz ticker, and the control plane all touch the
//! same two structures, and some control operations must observe both at
//! once (deleting a timer requires knowing no route references it). A single
//! `RwLock` over [`ServerState`] makes those cross-structure mutations
//! atomic. The lock is synchronous and must never be held across an await
//! point; handlers copy a [`ClockSnapshot`] out and release it before
//! serializing or sending.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::{Arc, RwLock};

use crate::error::{RegistryError, RoutingError};
use crate::registry::TimerRegistry;
use crate::routing::{IpNet, RouteEntry, RoutingTable};
use crate::timer::{ClockSnapshot, ReplyTemplate, Timer};
use timewarp::unix_time::Instant;

/// The timer registry and routing table of a running server.
#[derive(Clone, Debug, Default)]
pub struct ServerState {
    timers: TimerRegistry,
    routes: RoutingTable,
}

/// Shared handle to the server state.
pub type SharedState = Arc<RwLock<ServerState>>;

impl ServerState {
    /// Build the boot-time state: a default system timer bound to the
    /// default route (`0.0.0.0/0`) plus the IPv4 and IPv6 loopback covers,
    /// so every client address resolves to a timer from the start.
    pub fn bootstrap(template: ReplyTemplate) -> ServerState {
        let mut timers = TimerRegistry::new();
        let default_timer = timers.add(Timer::system(template));

        let mut routes = RoutingTable::new();
        let covers = [
            IpNet::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
            IpNet::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 0)), 24),
            IpNet::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 120),
        ];
        for cover in covers {
            routes
                .add(cover, default_timer)
                .expect("default covers are distinct");
        }

        ServerState { timers, routes }
    }

    /// Wrap the state for sharing between tasks.
    pub fn shared(self) -> SharedState {
        Arc::new(RwLock::new(self))
    }

    // ── Timer operations ────────────────────────────────────────────

    /// Register a timer and return its id.
    pub fn add_timer(&mut self, timer: Timer) -> u32 {
        self.timers.add(timer)
    }

    /// Look up a timer by id.
    pub fn timer(&self, id: u32) -> Option<&Timer> {
        self.timers.get(id)
    }

    /// Iterate over all `(id, timer)` pairs in insertion order.
    pub fn timers(&self) -> impl Iterator<Item = (u32, &Timer)> {
        self.timers.iter()
    }

    /// Number of registered timers.
    pub fn timer_count(&self) -> usize {
        self.timers.len()
    }

    /// Set the stored instant of a frozen or advancing timer.
    pub fn set_timer(&mut self, id: u32, at: Instant) -> Result<(), RegistryError> {
        let timer = self
            .timers
            .get_mut(id)
            .ok_or(RegistryError::NotFound { id })?;
        if !timer.is_settable() {
            return Err(RegistryError::Immutable {
                id,
                kind: timer.kind(),
            });
        }
        timer.set(at);
        Ok(())
    }

    /// Delete a timer, refusing while any route still references it.
    pub fn delete_timer(&mut self, id: u32) -> Result<(), RegistryError> {
        let referencing = self
            .routes
            .entries()
            .iter()
            .filter(|entry| entry.timer_id == id)
            .count();
        if referencing > 0 {
            return Err(RegistryError::InUse {
                id,
                routes: referencing,
            });
        }
        self.timers.delete(id)
    }

    /// Tick every registered timer once.
    pub fn tick_all(&mut self) {
        self.timers.tick_all();
    }

    // ── Route operations ────────────────────────────────────────────

    /// All routes in insertion order.
    pub fn routes(&self) -> &[RouteEntry] {
        self.routes.entries()
    }

    /// Look up a route by id.
    pub fn route(&self, id: u32) -> Option<&RouteEntry> {
        self.routes.get(id)
    }

    /// Bind a network to an existing timer.
    pub fn add_route(&mut self, net: IpNet, timer_id: u32) -> Result<u32, RoutingError> {
        if self.timers.get(timer_id).is_none() {
            return Err(RoutingError::UnknownTimer { id: timer_id });
        }
        self.routes.add(net, timer_id)
    }

    /// Point an existing route at a different existing timer.
    pub fn retarget_route(&mut self, route_id: u32, timer_id: u32) -> Result<(), RoutingError> {
        if self.timers.get(timer_id).is_none() {
            return Err(RoutingError::UnknownTimer { id: timer_id });
        }
        self.routes.retarget(route_id, timer_id)
    }

    /// Point every default cover at a different existing timer.
    ///
    /// All covers move under the same write lock acquisition, so readers
    /// never observe a half-retargeted default set.
    pub fn retarget_default_routes(&mut self, timer_id: u32) -> Result<(), RoutingError> {
        if self.timers.get(timer_id).is_none() {
            return Err(RoutingError::UnknownTimer { id: timer_id });
        }
        let default_ids: Vec<u32> = self
            .routes
            .entries()
            .iter()
            .filter(|entry| entry.net.is_default_cover())
            .map(|entry| entry.id)
            .collect();
        for id in default_ids {
            self.routes.retarget(id, timer_id)?;
        }
        Ok(())
    }

    /// Delete a route by id. Default covers are protected.
    pub fn remove_route(&mut self, route_id: u32) -> Result<(), RoutingError> {
        self.routes.remove(route_id)
    }

    // ── Dispatch ────────────────────────────────────────────────────

    /// Resolve a client address to a snapshot of its timer.
    ///
    /// Returns `None` when no route covers the address or the matched route
    /// references a deleted timer; a bootstrapped table with the in-use
    /// deletion guard prevents both by construction, so callers treat `None`
    /// as an internal error and drop the request.
    pub fn resolve(&self, ip: IpAddr) -> Option<ClockSnapshot> {
        let timer_id = self.routes.resolve(ip)?;
        let timer = self.timers.get(timer_id)?;
        Some(timer.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::TimerKind;

    fn state() -> ServerState {
        ServerState::bootstrap(ReplyTemplate::default())
    }

    fn net(s: &str) -> IpNet {
        s.parse().unwrap()
    }

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn bootstrap_installs_default_timer_and_covers() {
        let state = state();
        assert_eq!(state.timer_count(), 1);
        assert_eq!(state.routes().len(), 3);
        assert!(state.routes().iter().all(|r| r.timer_id == 0));
        assert!(state.routes().iter().all(|r| r.net.is_default_cover()));
    }

    #[test]
    fn every_address_resolves_after_bootstrap() {
        let state = state();
        for addr in ["127.0.0.1", "8.8.8.8", "192.168.1.1", "::1", "2001:db8::1"] {
            assert!(state.resolve(ip(addr)).is_some(), "unresolved {}", addr);
        }
    }

    #[test]
    fn add_route_requires_known_timer() {
        let mut state = state();
        let err = state.add_route(net("10.0.0.0/8"), 42).unwrap_err();
        assert_eq!(err, RoutingError::UnknownTimer { id: 42 });
    }

    #[test]
    fn routed_clients_resolve_to_their_timer() {
        let mut state = state();
        let frozen = state.add_timer(Timer::frozen(
            ReplyTemplate::default(),
            Instant::new(946_684_800, 0),
        ));
        state.add_route(net("10.0.0.0/8"), frozen).unwrap();

        let snapshot = state.resolve(ip("10.0.0.5")).unwrap();
        assert_eq!(snapshot.kind, TimerKind::Frozen);
        assert_eq!(snapshot.now(), Instant::new(946_684_800, 0));

        let other = state.resolve(ip("11.0.0.5")).unwrap();
        assert_eq!(other.kind, TimerKind::System);
    }

    #[test]
    fn delete_timer_refused_while_routed() {
        let mut state = state();
        let frozen = state.add_timer(Timer::frozen(
            ReplyTemplate::default(),
            Instant::new(0, 0),
        ));
        state.add_route(net("10.0.0.0/8"), frozen).unwrap();

        let err = state.delete_timer(frozen).unwrap_err();
        assert_eq!(
            err,
            RegistryError::InUse {
                id: frozen,
                routes: 1
            }
        );

        // Removing the route unblocks the deletion.
        let route_id = state
            .routes()
            .iter()
            .find(|r| r.timer_id == frozen)
            .map(|r| r.id)
            .unwrap();
        state.remove_route(route_id).unwrap();
        state.delete_timer(frozen).unwrap();
    }

    #[test]
    fn default_timer_delete_refused_with_route_count() {
        let mut state = state();
        let err = state.delete_timer(0).unwrap_err();
        assert_eq!(err, RegistryError::InUse { id: 0, routes: 3 });
    }

    #[test]
    fn set_timer_only_for_settable_kinds() {
        let mut state = state();
        let frozen = state.add_timer(Timer::frozen(
            ReplyTemplate::default(),
            Instant::new(0, 0),
        ));

        state.set_timer(frozen, Instant::new(500, 0)).unwrap();
        assert_eq!(state.timer(frozen).unwrap().now(), Instant::new(500, 0));

        let err = state.set_timer(0, Instant::new(500, 0)).unwrap_err();
        assert_eq!(
            err,
            RegistryError::Immutable {
                id: 0,
                kind: TimerKind::System
            }
        );

        let err = state.set_timer(99, Instant::new(500, 0)).unwrap_err();
        assert_eq!(err, RegistryError::NotFound { id: 99 });
    }

    #[test]
    fn retarget_default_routes_moves_all_covers() {
        let mut state = state();
        let frozen = state.add_timer(Timer::frozen(
            ReplyTemplate::default(),
            Instant::new(946_684_800, 0),
        ));
        state.retarget_default_routes(frozen).unwrap();

        assert!(
            state
                .routes()
                .iter()
                .filter(|r| r.net.is_default_cover())
                .all(|r| r.timer_id == frozen)
        );
        let snapshot = state.resolve(ip("127.0.0.1")).unwrap();
        assert_eq!(snapshot.kind, TimerKind::Frozen);
    }

    #[test]
    fn retarget_default_routes_requires_known_timer() {
        let mut state = state();
        let err = state.retarget_default_routes(42).unwrap_err();
        assert_eq!(err, RoutingError::UnknownTimer { id: 42 });
    }

    #[test]
    fn resolve_none_for_dangling_timer_reference() {
        // Build the inconsistency manually; the public operations refuse to
        // create it.
        let mut state = ServerState::default();
        let id = state.add_timer(Timer::system(ReplyTemplate::default()));
        state.add_route(net("10.0.0.0/8"), id).unwrap();
        state.timers.delete(id).unwrap();
        assert!(state.resolve(ip("10.0.0.1")).is_none());
    }
}
