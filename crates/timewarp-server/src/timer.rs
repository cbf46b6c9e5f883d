// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Time sources for response generation.
//!
//! A [`Timer`] answers "what time is it?" for the clients routed to it. The
//! answer may come from the host clock, from a frozen instant, or from a
//! virtual clock that advances one second per tick. Every timer carries a
//! [`ReplyTemplate`] with the header fields stamped into its responses.

use std::fmt;
use std::str::FromStr;

use timewarp::protocol::{LeapIndicator, Mode, ReferenceId, ShortFormat, Stratum, Version};
use timewarp::unix_time::Instant;

/// Discriminator for the timer variants, used for reporting and for the
/// control plane's create operation.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TimerKind {
    /// Answers with the host wall clock.
    System,
    /// Answers with a fixed instant until it is set again.
    Frozen,
    /// Answers with a virtual clock advancing one second per tick.
    Advancing,
    /// Placeholder for a caching proxy of an upstream NTP server.
    Upstream,
}

impl TimerKind {
    /// The lowercase string form used in the control-plane JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerKind::System => "system",
            TimerKind::Frozen => "frozen",
            TimerKind::Advancing => "advancing",
            TimerKind::Upstream => "upstream",
        }
    }
}

impl fmt::Display for TimerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown timer kind.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UnknownTimerKind {
    /// The string that failed to parse.
    pub input: String,
}

impl fmt::Display for UnknownTimerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown timer kind: {}", self.input)
    }
}

impl std::error::Error for UnknownTimerKind {}

impl FromStr for TimerKind {
    type Err = UnknownTimerKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(TimerKind::System),
            "frozen" => Ok(TimerKind::Frozen),
            "advancing" => Ok(TimerKind::Advancing),
            "upstream" => Ok(TimerKind::Upstream),
            _ => Err(UnknownTimerKind {
                input: s.to_string(),
            }),
        }
    }
}

/// Header and metadata fields copied into every response a timer produces.
///
/// The four packet timestamps are not part of the template; they are derived
/// from the timer's clock and the request at dispatch time.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ReplyTemplate {
    /// Leap indicator stamped into responses.
    pub leap_indicator: LeapIndicator,
    /// NTP version stamped into responses.
    pub version: Version,
    /// Association mode stamped into responses.
    pub mode: Mode,
    /// Stratum level stamped into responses.
    pub stratum: Stratum,
    /// Poll exponent stamped into responses.
    pub poll: i8,
    /// Clock precision exponent stamped into responses.
    pub precision: i8,
    /// Root delay stamped into responses.
    pub root_delay: ShortFormat,
    /// Root dispersion stamped into responses.
    pub root_dispersion: ShortFormat,
    /// Reference identifier stamped into responses.
    pub reference_id: ReferenceId,
}

impl Default for ReplyTemplate {
    fn default() -> Self {
        ReplyTemplate {
            leap_indicator: LeapIndicator::NoWarning,
            version: Version::V3,
            mode: Mode::Server,
            stratum: Stratum::PRIMARY,
            poll: 0,
            precision: -20,
            root_delay: ShortFormat::default(),
            root_dispersion: ShortFormat::default(),
            reference_id: ReferenceId::new(*b"NICO"),
        }
    }
}

/// The clock behind a timer.
#[derive(Clone, Copy, Debug)]
enum TimeSource {
    System,
    Frozen(Instant),
    Advancing(Instant),
    // TODO: query the configured upstream server and cache its offset
    // instead of falling back to the host clock.
    Upstream,
}

/// A time source with its embedded reply template.
///
/// Timers are owned by the registry and mutated by the control plane and the
/// 1 Hz ticker. None of the observations can fail.
#[derive(Clone, Debug)]
pub struct Timer {
    template: ReplyTemplate,
    source: TimeSource,
}

impl Timer {
    /// Create a timer that reads the host wall clock.
    pub fn system(template: ReplyTemplate) -> Timer {
        Timer {
            template,
            source: TimeSource::System,
        }
    }

    /// Create a timer frozen at `at` until it is set again.
    pub fn frozen(template: ReplyTemplate, at: Instant) -> Timer {
        Timer {
            template,
            source: TimeSource::Frozen(at),
        }
    }

    /// Create a virtual clock starting at `at`, advancing one second per
    /// [`tick`](Timer::tick).
    pub fn advancing(template: ReplyTemplate, at: Instant) -> Timer {
        Timer {
            template,
            source: TimeSource::Advancing(at),
        }
    }

    /// Create an upstream-proxy placeholder timer.
    pub fn upstream(template: ReplyTemplate) -> Timer {
        Timer {
            template,
            source: TimeSource::Upstream,
        }
    }

    /// Create a timer of the given kind with `at` as the initial instant for
    /// the kinds that hold one.
    pub fn of_kind(kind: TimerKind, template: ReplyTemplate, at: Instant) -> Timer {
        match kind {
            TimerKind::System => Timer::system(template),
            TimerKind::Frozen => Timer::frozen(template, at),
            TimerKind::Advancing => Timer::advancing(template, at),
            TimerKind::Upstream => Timer::upstream(template),
        }
    }

    /// The current instant according to this timer.
    pub fn now(&self) -> Instant {
        match self.source {
            TimeSource::System | TimeSource::Upstream => Instant::now(),
            TimeSource::Frozen(at) | TimeSource::Advancing(at) => at,
        }
    }

    /// Advance the timer by one second.
    ///
    /// Must be called at a one-second interval; only advancing timers hold
    /// state that moves.
    pub fn tick(&mut self) {
        if let TimeSource::Advancing(at) = self.source {
            self.source = TimeSource::Advancing(at.add_secs(1));
        }
    }

    /// Overwrite the stored instant. A no-op for kinds without one.
    pub fn set(&mut self, at: Instant) {
        match self.source {
            TimeSource::Frozen(_) => self.source = TimeSource::Frozen(at),
            TimeSource::Advancing(_) => self.source = TimeSource::Advancing(at),
            TimeSource::System | TimeSource::Upstream => {}
        }
    }

    /// Whether [`set`](Timer::set) has any effect on this timer.
    pub fn is_settable(&self) -> bool {
        matches!(
            self.source,
            TimeSource::Frozen(_) | TimeSource::Advancing(_)
        )
    }

    /// The discriminator of this timer.
    pub fn kind(&self) -> TimerKind {
        match self.source {
            TimeSource::System => TimerKind::System,
            TimeSource::Frozen(_) => TimerKind::Frozen,
            TimeSource::Advancing(_) => TimerKind::Advancing,
            TimeSource::Upstream => TimerKind::Upstream,
        }
    }

    /// The reply template embedded in this timer.
    pub fn template(&self) -> &ReplyTemplate {
        &self.template
    }

    /// Copy out everything a request handler needs so the registry lock can
    /// be released before serialization and I/O.
    pub fn snapshot(&self) -> ClockSnapshot {
        let held = match self.source {
            TimeSource::Frozen(at) | TimeSource::Advancing(at) => Some(at),
            TimeSource::System | TimeSource::Upstream => None,
        };
        ClockSnapshot {
            kind: self.kind(),
            template: self.template,
            held,
        }
    }
}

/// A point-in-time copy of a timer, detached from the registry.
///
/// For timers backed by the host clock the snapshot re-samples the clock on
/// every [`now`](ClockSnapshot::now) call, so the transmit timestamp can be
/// taken as late as possible; for virtual timers it returns the instant
/// captured under the lock.
#[derive(Clone, Copy, Debug)]
pub struct ClockSnapshot {
    /// The discriminator of the snapshotted timer.
    pub kind: TimerKind,
    /// The reply template of the snapshotted timer.
    pub template: ReplyTemplate,
    held: Option<Instant>,
}

impl ClockSnapshot {
    /// The current instant according to the snapshotted timer.
    pub fn now(&self) -> Instant {
        match self.held {
            Some(at) => at,
            None => Instant::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_timer_tracks_host_clock() {
        let timer = Timer::system(ReplyTemplate::default());
        let before = Instant::now();
        let sampled = timer.now();
        let after = Instant::now();
        assert!(before <= sampled && sampled <= after);
    }

    #[test]
    fn system_timer_ignores_set_and_tick() {
        let mut timer = Timer::system(ReplyTemplate::default());
        timer.set(Instant::new(0, 0));
        timer.tick();
        assert!(timer.now().secs() > 1_000_000);
        assert!(!timer.is_settable());
    }

    #[test]
    fn frozen_timer_holds_instant() {
        let at = Instant::new(946_684_800, 0);
        let mut timer = Timer::frozen(ReplyTemplate::default(), at);
        assert_eq!(timer.now(), at);
        timer.tick();
        assert_eq!(timer.now(), at, "tick must not move a frozen timer");
    }

    #[test]
    fn frozen_timer_set_overwrites() {
        let mut timer = Timer::frozen(ReplyTemplate::default(), Instant::new(100, 0));
        let target = Instant::new(200, 0);
        timer.set(target);
        assert_eq!(timer.now(), target);
        assert!(timer.is_settable());
    }

    #[test]
    fn advancing_timer_gains_one_second_per_tick() {
        let start = Instant::new(946_684_800, 0);
        let mut timer = Timer::advancing(ReplyTemplate::default(), start);
        for _ in 0..3 {
            timer.tick();
        }
        assert_eq!(timer.now(), start.add_secs(3));
    }

    #[test]
    fn advancing_timer_set_restarts() {
        let mut timer = Timer::advancing(ReplyTemplate::default(), Instant::new(100, 0));
        timer.tick();
        timer.set(Instant::new(500, 0));
        timer.tick();
        assert_eq!(timer.now(), Instant::new(501, 0));
    }

    #[test]
    fn kind_reporting() {
        let tmpl = ReplyTemplate::default();
        let at = Instant::new(0, 0);
        assert_eq!(Timer::system(tmpl).kind(), TimerKind::System);
        assert_eq!(Timer::frozen(tmpl, at).kind(), TimerKind::Frozen);
        assert_eq!(Timer::advancing(tmpl, at).kind(), TimerKind::Advancing);
        assert_eq!(Timer::upstream(tmpl).kind(), TimerKind::Upstream);
    }

    #[test]
    fn kind_parse_roundtrip() {
        for kind in [
            TimerKind::System,
            TimerKind::Frozen,
            TimerKind::Advancing,
            TimerKind::Upstream,
        ] {
            assert_eq!(kind.as_str().parse::<TimerKind>().unwrap(), kind);
        }
        assert!("modify".parse::<TimerKind>().is_err());
    }

    #[test]
    fn snapshot_of_virtual_timer_is_stable() {
        let at = Instant::new(946_684_800, 250_000_000);
        let timer = Timer::frozen(ReplyTemplate::default(), at);
        let snap = timer.snapshot();
        assert_eq!(snap.now(), at);
        assert_eq!(snap.now(), at);
        assert_eq!(snap.kind, TimerKind::Frozen);
    }

    #[test]
    fn snapshot_of_system_timer_resamples() {
        let timer = Timer::system(ReplyTemplate::default());
        let snap = timer.snapshot();
        let first = snap.now();
        let second = snap.now();
        assert!(second >= first);
    }
}
