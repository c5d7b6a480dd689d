//! Clock and Measurement Environment
//!
//! Monotonic timestamps with microsecond differences, the environment
//! cleanup hook run between phases, and optional CPU pinning.

use std::time::Duration;

// ─── Instant ─────────────────────────────────────────────────────────────────

/// Monotonic timestamp used by the measurement loops
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Instant {
    instant: std::time::Instant,
}

impl Instant {
    /// Capture current instant
    #[inline(always)]
    pub fn now() -> Self {
        Self {
            instant: std::time::Instant::now(),
        }
    }

    /// Re-read the clock in place
    #[inline(always)]
    pub fn update(&mut self) {
        self.instant = std::time::Instant::now();
    }

    /// Microseconds from `self` to `later`.
    ///
    /// Saturates to zero if `later` was taken before `self`.
    #[inline(always)]
    pub fn diff(&self, later: &Instant) -> u64 {
        let micros = later.instant.saturating_duration_since(self.instant).as_micros();
        u64::try_from(micros).unwrap_or(u64::MAX)
    }

    /// Whether at least `threshold` passed between `self` and `current`
    #[inline(always)]
    pub fn elapsed(&self, current: &Instant, threshold: Duration) -> bool {
        u128::from(self.diff(current)) >= threshold.as_micros()
    }
}

// ─── Environment cleanup ─────────────────────────────────────────────────────

/// Hook invoked before the warmup and measurement phases of every item.
///
/// Implementations reduce interference between items and must not fail.
pub trait EnvCleaner {
    /// Tidy up the process before the next timed phase
    fn clean(&mut self);
}

/// Cleaner that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCleaner;

impl EnvCleaner for NoopCleaner {
    fn clean(&mut self) {}
}

/// Cleaner that hands freed heap pages back to the OS.
///
/// Uses `malloc_trim` on Linux with glibc; a no-op everywhere else.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrimCleaner;

impl EnvCleaner for TrimCleaner {
    #[cfg(all(target_os = "linux", target_env = "gnu"))]
    fn clean(&mut self) {
        // SAFETY: malloc_trim only walks allocator-owned free lists.
        unsafe {
            libc::malloc_trim(0);
        }
    }

    #[cfg(not(all(target_os = "linux", target_env = "gnu")))]
    fn clean(&mut self) {}
}

impl<F: FnMut()> EnvCleaner for F {
    fn clean(&mut self) {
        self()
    }
}

/// Set CPU affinity to pin the current thread to a specific core
///
/// Avoids core migrations between batches.
#[cfg(target_os = "linux")]
pub fn pin_to_cpu(cpu: usize) -> Result<(), std::io::Error> {
    use std::mem::MaybeUninit;

    unsafe {
        let mut set = MaybeUninit::<libc::cpu_set_t>::zeroed();
        let set_ref = set.assume_init_mut();

        libc::CPU_ZERO(set_ref);
        libc::CPU_SET(cpu, set_ref);

        let result = libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), set_ref);

        if result == 0 {
            Ok(())
        } else {
            Err(std::io::Error::last_os_error())
        }
    }
}

/// CPU pinning is not supported on this platform; always succeeds.
#[cfg(not(target_os = "linux"))]
pub fn pin_to_cpu(_cpu: usize) -> Result<(), std::io::Error> {
    Ok(())
}
