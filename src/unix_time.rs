use crate::protocol;
use std::time;

/// The number of seconds from 1st January 1900 UTC to the start of the Unix epoch.
pub const EPOCH_DELTA: i64 = 2_208_988_800;

/// The number of nanoseconds in one second.
const NANOS_PER_SEC: u32 = 1_000_000_000;

/// Describes an instant relative to the `UNIX_EPOCH` - 00:00:00 Coordinated Universal Time (UTC),
/// Thursday, 1 January 1970. The instant is the sum of a (possibly negative) whole-second
/// component and a non-negative nanosecond component in `0..1_000_000_000`, i.e. instants are
/// normalized toward negative infinity.
///
/// The sole purpose of this type is for retrieving the "current" time using the `std::time`
/// module and for converting between the NTP timestamp format and Unix time. For converting to
/// a human readable format, see the chrono crate.
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Instant {
    secs: i64,
    subsec_nanos: u32,
}

impl Instant {
    /// Create a new **Instant** given its `secs` and `subsec_nanos` components.
    ///
    /// `subsec_nanos` values of one second or more are carried into `secs`.
    pub fn new(secs: i64, subsec_nanos: u32) -> Instant {
        let carry = subsec_nanos / NANOS_PER_SEC;
        Instant {
            secs: secs + carry as i64,
            subsec_nanos: subsec_nanos % NANOS_PER_SEC,
        }
    }

    /// Uses `std::time::SystemTime::now` and `std::time::UNIX_EPOCH` to determine the current
    /// **Instant**.
    pub fn now() -> Self {
        match time::SystemTime::now().duration_since(time::UNIX_EPOCH) {
            Ok(duration) => Instant::new(duration.as_secs() as i64, duration.subsec_nanos()),
            Err(sys_time_err) => {
                // A host clock before 1970; normalize the backwards duration.
                let pre_epoch = sys_time_err.duration();
                let secs = -(pre_epoch.as_secs() as i64);
                match pre_epoch.subsec_nanos() {
                    0 => Instant::new(secs, 0),
                    nanos => Instant::new(secs - 1, NANOS_PER_SEC - nanos),
                }
            }
        }
    }

    /// The whole-second component of the **Instant**.
    pub fn secs(&self) -> i64 {
        self.secs
    }

    /// The fractional component of the **Instant** in nanoseconds (`0..1_000_000_000`).
    pub fn subsec_nanos(&self) -> u32 {
        self.subsec_nanos
    }

    /// The instant `secs` whole seconds later.
    pub fn add_secs(&self, secs: i64) -> Instant {
        Instant {
            secs: self.secs + secs,
            subsec_nanos: self.subsec_nanos,
        }
    }
}

// Conversion implementations.
//
// The 32-bit fraction field is a binary fraction of one second in both
// directions. Encoding quantizes the fractional part to whole microseconds
// first, so round-trips are exact to roughly one microsecond.

impl From<Instant> for protocol::TimestampFormat {
    /// Converts a Unix [`Instant`] to a 32-bit NTP timestamp.
    ///
    /// The seconds component truncates to 32 bits, losing era information;
    /// this is correct for NTPv4 on-wire use within era 0.
    fn from(t: Instant) -> Self {
        let seconds = (t.secs() + EPOCH_DELTA) as u32;
        let micros = (t.subsec_nanos() / 1_000) as u64;
        let fraction = ((micros << 32) / 1_000_000) as u32;
        protocol::TimestampFormat { seconds, fraction }
    }
}

impl From<protocol::TimestampFormat> for Instant {
    /// Converts a 32-bit NTP timestamp to a Unix [`Instant`].
    ///
    /// A zero seconds component denotes the unset timestamp and maps to the
    /// prime epoch offset of zero seconds from `UNIX_EPOCH`.
    fn from(ts: protocol::TimestampFormat) -> Self {
        let secs = match ts.seconds {
            0 => 0,
            s => s as i64 - EPOCH_DELTA,
        };
        let subsec_nanos = ((ts.fraction as u64 * NANOS_PER_SEC as u64) >> 32) as u32;
        Instant::new(secs, subsec_nanos)
    }
}
