/*! Time structures.

The `time` module contains structures used to represent both
absolute and relative time.

 - [Instant] is used to represent absolute time.
 - [Duration] is used to represet relative time.
 - [Timer] is a cancelable deadline, driven by polling.

[Instant]: struct.Instant.html
[Duration]: struct.Duration.html
[Timer]: struct.Timer.html
*/
use core::{cmp, fmt, ops};
pub use core::time::Duration;

/// A representation of an absolute time value.
///
/// The `Instant` type is a wrapper around a `i64` value that
/// represents a number of milliseconds, monotonically increasing
/// since an arbitrary moment in time, such as system startup.
///
/// * A value of `0` is inherently arbitrary.
/// * A value less than `0` indicates a time before the starting
///   point.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Instant {
    /// The milliseconds since the arbitrary starting point.
    pub millis: i64,
}

/// An expiration time, inversion of `Option`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiration {
    /// Expires at the contained instant.
    When(Instant),
    /// Does not expire.
    Never,
}

use Expiration::{When, Never};

/// A one-shot deadline that can be cancelled.
///
/// The timer never calls back by itself. Instead, its owner asks it with [`poll`] whether the
/// deadline has passed at the current time. A timer fires at most once per [`start`] and a
/// cancelled timer never fires.
///
/// [`poll`]: #method.poll
/// [`start`]: #method.start
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timer {
    deadline: Expiration,
}

impl Instant {
    /// Create a new `Instant` from a number of milliseconds.
    pub fn from_millis<T: Into<i64>>(millis: T) -> Instant {
        Instant { millis: millis.into() }
    }

    /// Create a new `Instant` from a number of seconds.
    pub fn from_secs<T: Into<i64>>(secs: T) -> Instant {
        Instant { millis: secs.into() * 1000 }
    }

    /// Create a new `Instant` from the current [std::time::SystemTime].
    ///
    /// See [std::time::SystemTime::now]
    ///
    /// [std::time::SystemTime]: https://doc.rust-lang.org/std/time/struct.SystemTime.html
    /// [std::time::SystemTime::now]: https://doc.rust-lang.org/std/time/struct.SystemTime.html#method.now
    pub fn now() -> Instant {
        Self::from(::std::time::SystemTime::now())
    }

    /// The fractional number of milliseconds that have passed
    /// since the beginning of time.
    pub fn millis(&self) -> i64 {
        self.millis % 1000
    }

    /// The number of whole seconds that have passed since the
    /// beginning of time.
    pub fn secs(&self) -> i64 {
        self.millis / 1000
    }

    /// The total number of milliseconds that have passed since
    /// the biginning of time.
    pub fn total_millis(&self) -> i64 {
        self.millis
    }
}

impl From<::std::time::SystemTime> for Instant {
    fn from(other: ::std::time::SystemTime) -> Instant {
        // Clocks before the epoch are clamped to it.
        let n = other.duration_since(::std::time::UNIX_EPOCH)
            .unwrap_or(Duration::from_secs(0));
        Self::from_millis(n.as_secs() as i64 * 1000 + (n.subsec_nanos() / 1000000) as i64)
    }
}

impl fmt::Display for Instant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{:03}s", self.secs(), self.millis())
    }
}

impl ops::Add<Duration> for Instant {
    type Output = Instant;

    fn add(self, rhs: Duration) -> Instant {
        Instant::from_millis(self.millis + rhs.as_millis() as i64)
    }
}

impl ops::AddAssign<Duration> for Instant {
    fn add_assign(&mut self, rhs: Duration) {
        self.millis += rhs.as_millis() as i64;
    }
}

impl ops::Sub<Duration> for Instant {
    type Output = Instant;

    fn sub(self, rhs: Duration) -> Instant {
        Instant::from_millis(self.millis - rhs.as_millis() as i64)
    }
}

impl ops::Sub<Instant> for Instant {
    type Output = Duration;

    fn sub(self, rhs: Instant) -> Duration {
        Duration::from_millis((self.millis - rhs.millis).abs() as u64)
    }
}

impl Default for Expiration {
    fn default() -> Self {
        Expiration::Never
    }
}

impl From<Option<Instant>> for Expiration {
    fn from(opt: Option<Instant>) -> Self {
        match opt {
            Some(instant) => When(instant),
            None => Never,
        }
    }
}

impl From<Expiration> for Option<Instant> {
    fn from(opt: Expiration) -> Self {
        match opt {
            When(instant) => Some(instant),
            Never => None,
        }
    }
}

impl cmp::PartialOrd<Self> for Expiration {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl cmp::Ord for Expiration {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        match (*self, *other) {
            (Never, Never) => cmp::Ordering::Equal,
            (Never, When(_)) => cmp::Ordering::Greater,
            (When(_), Never) => cmp::Ordering::Less,
            (When(ref a), When(ref b)) => a.cmp(b),
        }
    }
}

impl Timer {
    /// Arm the timer to fire `after` the given time.
    ///
    /// Replaces any previously armed deadline.
    pub fn start(&mut self, now: Instant, after: Duration) {
        self.deadline = When(now + after);
    }

    /// Disarm the timer.
    pub fn cancel(&mut self) {
        self.deadline = Never;
    }

    /// Query if a deadline is armed.
    pub fn is_running(&self) -> bool {
        self.deadline != Never
    }

    /// The armed deadline, if any.
    pub fn deadline(&self) -> Expiration {
        self.deadline
    }

    /// Check the deadline against the current time.
    ///
    /// Returns `true` exactly once when the deadline has been reached and disarms the timer.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            When(deadline) if deadline <= now => {
                self.deadline = Never;
                true
            },
            _ => false,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_instant_ops() {
        // std::ops::Add
        assert_eq!(Instant::from_millis(4) + Duration::from_millis(6), Instant::from_millis(10));
        // std::ops::Sub
        assert_eq!(Instant::from_millis(7) - Duration::from_millis(5), Instant::from_millis(2));
        assert_eq!(Instant::from_millis(7) - Instant::from_millis(5), Duration::from_millis(2));
    }

    #[test]
    fn test_instant_getters() {
        let instant = Instant::from_millis(5674);
        assert_eq!(instant.secs(), 5);
        assert_eq!(instant.millis(), 674);
        assert_eq!(instant.total_millis(), 5674);
    }

    #[test]
    fn test_instant_display() {
        assert_eq!(format!("{}", Instant::from_millis(5674)), "5.674s");
        assert_eq!(format!("{}", Instant::from_millis(5007)), "5.007s");
    }

    #[test]
    fn test_instant_conversions() {
        assert_eq!(Instant::from(::std::time::UNIX_EPOCH),
                   Instant::from_millis(0));
        let later = ::std::time::UNIX_EPOCH + Duration::from_secs(2085955200);
        assert_eq!(Instant::from(later), Instant::from_secs(2085955200));
    }

    #[test]
    fn test_expiration_order() {
        let soon = Expiration::When(Instant::from_millis(10));
        let late = Expiration::When(Instant::from_millis(20));
        assert!(soon < late);
        assert!(late < Expiration::Never);
        assert_eq!(soon.min(Expiration::Never), soon);
    }

    #[test]
    fn timer_fires_once() {
        let mut timer = Timer::default();
        assert!(!timer.is_running());
        assert!(!timer.poll(Instant::from_millis(0)));

        timer.start(Instant::from_millis(100), Duration::from_millis(200));
        assert!(timer.is_running());
        assert_eq!(timer.deadline(), Expiration::When(Instant::from_millis(300)));
        assert!(!timer.poll(Instant::from_millis(299)));
        assert!(timer.poll(Instant::from_millis(300)));
        assert!(!timer.poll(Instant::from_millis(301)));
        assert!(!timer.is_running());
    }

    #[test]
    fn timer_cancelled_never_fires() {
        let mut timer = Timer::default();
        timer.start(Instant::from_millis(0), Duration::from_millis(10));
        timer.cancel();
        assert!(!timer.poll(Instant::from_millis(10)));
        assert!(!timer.poll(Instant::from_millis(10_000)));
        assert_eq!(timer.deadline(), Expiration::Never);
    }

    #[test]
    fn timer_restart_replaces_deadline() {
        let mut timer = Timer::default();
        timer.start(Instant::from_millis(0), Duration::from_millis(10));
        timer.start(Instant::from_millis(5), Duration::from_millis(10));
        assert!(!timer.poll(Instant::from_millis(10)));
        assert!(timer.poll(Instant::from_millis(15)));
    }
}
