//! Timer facility seam of the SD server.
//!
//! The server never keeps time itself. It arms and cancels timers through a
//! [`TimerFacility`] and is told about expirations via
//! [`SdServer::on_timer_expired`](crate::sd::SdServer::on_timer_expired), carrying the
//! handle that fired. Handles are never reused, so a handle doubles as the generation
//! token that lets the server discard expirations of timers it already cancelled.

use crate::error::TimerError;
use std::collections::BTreeMap;
use std::time::Duration;

/// Identifies one armed timer. Unique per facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub fn new(id: u64) -> Self {
        TimerHandle(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

pub trait TimerFacility {
    fn arm_one_shot(&mut self, delay: Duration) -> Result<TimerHandle, TimerError>;

    /// First expiry after one `period`, then every `period` until cancelled.
    fn arm_periodic(&mut self, period: Duration) -> Result<TimerHandle, TimerError>;

    /// Cancelling an unknown or already expired handle is a no-op.
    fn cancel(&mut self, handle: TimerHandle);
}

#[derive(Debug, Clone, Copy)]
struct VirtualEntry {
    deadline: Duration,
    period: Option<Duration>,
}

/// Deterministic timer facility on a virtual clock starting at zero.
///
/// Nothing fires on its own: the owner pulls expirations with
/// [`fire_next`](Self::fire_next) and hands them to the server.
#[derive(Debug, Default)]
pub struct VirtualTimer {
    now: Duration,
    next_id: u64,
    armed: BTreeMap<TimerHandle, VirtualEntry>,
    refuse_arming: bool,
}

impl VirtualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn armed(&self) -> usize {
        self.armed.len()
    }

    pub fn is_armed(&self, handle: TimerHandle) -> bool {
        self.armed.contains_key(&handle)
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.armed.values().map(|e| e.deadline).min()
    }

    /// Make every following arm request fail with [`TimerError::Unavailable`].
    pub fn set_refuse_arming(&mut self, refuse: bool) {
        self.refuse_arming = refuse;
    }

    /// Fire the earliest timer due at or before `limit`, moving the clock to its deadline.
    ///
    /// Ties go to the timer armed first. Periodic timers are rescheduled one period later.
    pub fn fire_next(&mut self, limit: Duration) -> Option<TimerHandle> {
        let (handle, entry) = self
            .armed
            .iter()
            .filter(|(_, e)| e.deadline <= limit)
            .min_by_key(|(h, e)| (e.deadline, **h))
            .map(|(h, e)| (*h, *e))?;

        self.now = self.now.max(entry.deadline);
        match entry.period {
            Some(period) => {
                if let Some(slot) = self.armed.get_mut(&handle) {
                    slot.deadline = entry.deadline.saturating_add(period);
                }
            }
            None => {
                self.armed.remove(&handle);
            }
        }
        Some(handle)
    }

    /// Move the clock forward without firing anything.
    ///
    /// Timers due before `to` should be collected with `fire_next` first.
    pub fn advance_to(&mut self, to: Duration) {
        self.now = self.now.max(to);
    }

    fn arm(&mut self, delay: Duration, period: Option<Duration>) -> Result<TimerHandle, TimerError> {
        if self.refuse_arming {
            return Err(TimerError::Unavailable);
        }
        let deadline = self.now.checked_add(delay).ok_or(TimerError::DeadlineOverflow)?;
        self.next_id += 1;
        let handle = TimerHandle(self.next_id);
        self.armed.insert(handle, VirtualEntry { deadline, period });
        Ok(handle)
    }
}

impl TimerFacility for VirtualTimer {
    fn arm_one_shot(&mut self, delay: Duration) -> Result<TimerHandle, TimerError> {
        self.arm(delay, None)
    }

    fn arm_periodic(&mut self, period: Duration) -> Result<TimerHandle, TimerError> {
        if period.is_zero() {
            return Err(TimerError::ZeroPeriod);
        }
        self.arm(period, Some(period))
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.armed.remove(&handle);
    }
}
