use crate::error::ConfigError;
use std::time::Duration;

/// Longest delay any timer may be armed with (2^32 - 1 seconds).
pub const MAX_DELAY: Duration = Duration::from_secs(u32::MAX as u64);

/// Announcement timing of one server instance.
///
/// Defaults follow AUTOSAR CP R20-11: 10..100 ms initial wait, 100 ms repetition
/// base, 3 repetitions, 1 s cyclic offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingConfig {
    pub initial_delay_min: Duration,
    pub initial_delay_max: Duration,
    /// Doubled per repetition step
    pub repetition_base_delay: Duration,
    pub cycle_offer_delay: Duration,
    /// Repetition-phase offers before the main phase
    pub repetition_max: u32,
}

impl TimingConfig {
    pub fn new(
        initial_delay_min: Duration,
        initial_delay_max: Duration,
        repetition_base_delay: Duration,
        cycle_offer_delay: Duration,
        repetition_max: u32,
    ) -> Result<Self, ConfigError> {
        let timing = TimingConfig {
            initial_delay_min,
            initial_delay_max,
            repetition_base_delay,
            cycle_offer_delay,
            repetition_max,
        };
        timing.validate()?;
        Ok(timing)
    }

    pub fn from_millis(
        initial_delay_min_ms: u64,
        initial_delay_max_ms: u64,
        repetition_base_delay_ms: u64,
        cycle_offer_delay_ms: u64,
        repetition_max: u32,
    ) -> Result<Self, ConfigError> {
        Self::new(
            Duration::from_millis(initial_delay_min_ms),
            Duration::from_millis(initial_delay_max_ms),
            Duration::from_millis(repetition_base_delay_ms),
            Duration::from_millis(cycle_offer_delay_ms),
            repetition_max,
        )
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_delay_min > self.initial_delay_max {
            return Err(ConfigError::InitialDelayRange {
                min: self.initial_delay_min,
                max: self.initial_delay_max,
            });
        }
        if self.cycle_offer_delay.is_zero() {
            return Err(ConfigError::ZeroCycleOfferDelay);
        }
        if self.repetition_max > 0 {
            if self.repetition_base_delay.is_zero() {
                return Err(ConfigError::ZeroRepetitionBaseDelay(self.repetition_max));
            }
            // The longest wait is before the last repetition offer
            match self.checked_repetition_delay(self.repetition_max - 1) {
                Some(longest) => check_delay(longest)?,
                None => return Err(ConfigError::RepetitionDelayOverflow(self.repetition_max)),
            }
        }
        check_delay(self.initial_delay_max)?;
        check_delay(self.cycle_offer_delay)
    }

    /// Wait before the repetition offer that follows `counter` earlier ones:
    /// `repetition_base_delay * 2^counter`, saturating.
    pub fn repetition_delay(&self, counter: u32) -> Duration {
        self.checked_repetition_delay(counter).unwrap_or(Duration::MAX)
    }

    fn checked_repetition_delay(&self, counter: u32) -> Option<Duration> {
        1u32.checked_shl(counter)
            .and_then(|factor| self.repetition_base_delay.checked_mul(factor))
    }
}

fn check_delay(delay: Duration) -> Result<(), ConfigError> {
    if delay > MAX_DELAY {
        return Err(ConfigError::DelayTooLong { delay, max: MAX_DELAY });
    }
    Ok(())
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            initial_delay_min: Duration::from_millis(10),
            initial_delay_max: Duration::from_millis(100),
            repetition_base_delay: Duration::from_millis(100),
            cycle_offer_delay: Duration::from_secs(1),
            repetition_max: 3,
        }
    }
}
