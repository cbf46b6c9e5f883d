// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Custom error types for the timer registry and routing table.
//!
//! The NTP datapath is fire-and-forget and never surfaces these errors to
//! clients; they exist for the control plane, which maps them onto HTTP
//! status codes. All types are hand-rolled enums implementing
//! [`std::error::Error`].

use std::fmt;

use crate::timer::TimerKind;

/// Errors that can occur while mutating the timer registry.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RegistryError {
    /// No timer is registered under the given id.
    NotFound {
        /// The id that was looked up.
        id: u32,
    },
    /// The timer is still referenced by one or more routes and cannot be
    /// deleted.
    InUse {
        /// The id of the timer.
        id: u32,
        /// Number of routes that reference the timer.
        routes: usize,
    },
    /// The timer's clock cannot be set (only frozen and advancing timers
    /// hold a settable instant).
    Immutable {
        /// The id of the timer.
        id: u32,
        /// The kind of the timer.
        kind: TimerKind,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::NotFound { id } => {
                write!(f, "no timer found with id {}", id)
            }
            RegistryError::InUse { id, routes } => {
                write!(f, "timer {} is referenced by {} route(s)", id, routes)
            }
            RegistryError::Immutable { id, kind } => {
                write!(f, "timer {} of kind {} can not be modified", id, kind)
            }
        }
    }
}

impl std::error::Error for RegistryError {}

/// Errors that can occur while mutating or querying the routing table.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RoutingError {
    /// No route is registered under the given id.
    NotFound {
        /// The id that was looked up.
        id: u32,
    },
    /// A route with the same network address already exists.
    DuplicateNetwork {
        /// CIDR representation of the conflicting network.
        network: String,
    },
    /// The route is a default route and is protected from deletion.
    DefaultRoute {
        /// The id of the protected route.
        id: u32,
    },
    /// The route references a timer id that is not registered.
    UnknownTimer {
        /// The timer id that was not found.
        id: u32,
    },
}

impl fmt::Display for RoutingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingError::NotFound { id } => {
                write!(f, "no route found with id {}", id)
            }
            RoutingError::DuplicateNetwork { network } => {
                write!(f, "route with network {} already exists", network)
            }
            RoutingError::DefaultRoute { id } => {
                write!(f, "route {} is a default route and can not be deleted", id)
            }
            RoutingError::UnknownTimer { id } => {
                write!(f, "no timer found with id {}", id)
            }
        }
    }
}

impl std::error::Error for RoutingError {}
