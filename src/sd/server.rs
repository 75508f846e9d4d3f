//! # SD Server State Machine
//!
//! Announcement lifecycle of one service instance:
//!
//! ```text
//!            start() + service up + link up
//! NotReady ─────────────────────────────────▶ InitialWaitPhase ── random [min, max]
//!    ▲                                              │ expiry: OFFER
//!    │ stop() / service down / link down            ▼
//!    │ (STOP-OFFER if an OFFER went out       RepetitionPhase ── base * 2^n, n < repetition_max
//!    │  and the link is up)
//!    │                                              │ expiry: OFFER, n += 1
//!    └──────────────────────────────────────  MainPhase ── every cycle_offer_delay: OFFER
//! ```
//!
//! Every active phase owns exactly one armed timer, recorded in the phase itself.
//! An expiry whose handle does not match the current phase's timer is stale and dropped.
//!
//! The machine is not thread-safe by itself; callers serialize access, either by
//! owning it on a single task (see [`runtime`](crate::runtime)) or behind a mutex.

use crate::error::{Error, Result, TimerError};
use crate::logging::{LogFacade, LogLevel, SdLogger};
use crate::sd::buffer::MessageBuffer;
use crate::sd::descriptor::ServiceInstanceDescriptor;
use crate::sd::message::SdMessage;
use crate::sd::timer::{TimerFacility, TimerHandle};
use crate::sd::timing::TimingConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

const COMPONENT: &str = "SdServer";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdServerState {
    /// Not started, or service or link is down
    NotReady,
    InitialWaitPhase,
    RepetitionPhase,
    MainPhase,
}

/// What `start()` does while the service or link is still down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartPolicy {
    /// Remember the start request and begin announcing once both are up.
    #[default]
    AutoResume,
    /// Ignore the request; `start()` must be called again once available.
    RequireExplicitStart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    NotReady,
    InitialWait { timer: TimerHandle },
    Repetition { timer: TimerHandle, counter: u32 },
    Main { timer: TimerHandle },
}

impl Phase {
    fn state(&self) -> SdServerState {
        match self {
            Phase::NotReady => SdServerState::NotReady,
            Phase::InitialWait { .. } => SdServerState::InitialWaitPhase,
            Phase::Repetition { .. } => SdServerState::RepetitionPhase,
            Phase::Main { .. } => SdServerState::MainPhase,
        }
    }

    fn timer(&self) -> Option<TimerHandle> {
        match *self {
            Phase::NotReady => None,
            Phase::InitialWait { timer } | Phase::Repetition { timer, .. } | Phase::Main { timer } => Some(timer),
        }
    }

    /// An OFFER has gone out since the last activation, so leaving owes a STOP-OFFER.
    fn announced(&self) -> bool {
        matches!(self, Phase::Repetition { .. } | Phase::Main { .. })
    }
}

enum Schedule {
    OneShot(Duration),
    Periodic(Duration),
}

pub struct SdServer<T: TimerFacility> {
    descriptor: ServiceInstanceDescriptor,
    timing: TimingConfig,
    timer: T,
    phase: Phase,
    started: bool,
    service_available: bool,
    link_available: bool,
    policy: StartPolicy,
    messages: MessageBuffer,
    rng: StdRng,
    logger: Arc<dyn SdLogger>,
}

impl<T: TimerFacility> SdServer<T> {
    /// Create a server in `NotReady`. Invalid timing is rejected.
    pub fn new(descriptor: ServiceInstanceDescriptor, timing: TimingConfig, timer: T) -> Result<Self> {
        timing.validate()?;
        Ok(SdServer {
            descriptor,
            timing,
            timer,
            phase: Phase::NotReady,
            started: false,
            service_available: true,
            link_available: true,
            policy: StartPolicy::default(),
            messages: MessageBuffer::new(),
            rng: StdRng::from_entropy(),
            logger: LogFacade::new(),
        })
    }

    pub fn with_service_available(mut self, available: bool) -> Self {
        self.service_available = available;
        self
    }

    pub fn with_link_available(mut self, available: bool) -> Self {
        self.link_available = available;
        self
    }

    pub fn with_start_policy(mut self, policy: StartPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Seed the initial-delay jitter, for reproducible runs.
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn SdLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Begin announcing. Idempotent while started.
    ///
    /// If the service or link is down, the request is kept or dropped per [`StartPolicy`].
    pub fn start(&mut self) -> Result<()> {
        if self.started {
            self.log(LogLevel::Debug, "start ignored, already started");
            return Ok(());
        }
        if !self.is_ready() && self.policy == StartPolicy::RequireExplicitStart {
            self.log(LogLevel::Warn, "start ignored, service or link unavailable");
            return Ok(());
        }
        self.started = true;
        self.activate()
    }

    /// Stop announcing. Idempotent.
    ///
    /// Cancels the armed timer; the only message that can follow is the STOP-OFFER
    /// enqueued here when an OFFER had already gone out.
    pub fn stop(&mut self) {
        if !self.started {
            return;
        }
        self.started = false;
        self.deactivate("stopped");
    }

    /// Redundant calls with an unchanged value are no-ops.
    pub fn set_service_availability(&mut self, available: bool) -> Result<()> {
        if self.service_available == available {
            return Ok(());
        }
        self.service_available = available;
        self.availability_changed(if available { "service up" } else { "service down" })
    }

    /// Network link notification. Redundant calls with an unchanged value are no-ops.
    pub fn set_link_availability(&mut self, available: bool) -> Result<()> {
        if self.link_available == available {
            return Ok(());
        }
        self.link_available = available;
        self.availability_changed(if available { "link up" } else { "link down" })
    }

    /// Drive the machine with an expired timer.
    ///
    /// Expirations of cancelled timers are dropped. When arming the next timer fails the
    /// server falls back to `NotReady`, drops the start request and returns the error.
    pub fn on_timer_expired(&mut self, handle: TimerHandle) -> Result<()> {
        if self.phase.timer() != Some(handle) {
            self.log(LogLevel::Debug, &format!("dropping stale timer {}", handle.id()));
            return Ok(());
        }

        match self.phase {
            Phase::NotReady => {}
            Phase::InitialWait { .. } => {
                self.phase = if self.timing.repetition_max == 0 {
                    self.enter_main()?
                } else {
                    let timer = self.schedule(Schedule::OneShot(self.timing.repetition_delay(0)))?;
                    self.log(LogLevel::Info, "entering repetition phase");
                    Phase::Repetition { timer, counter: 0 }
                };
                self.offer();
            }
            Phase::Repetition { counter, .. } => {
                let counter = counter + 1;
                self.phase = if counter < self.timing.repetition_max {
                    let timer = self.schedule(Schedule::OneShot(self.timing.repetition_delay(counter)))?;
                    Phase::Repetition { timer, counter }
                } else {
                    self.enter_main()?
                };
                self.offer();
            }
            Phase::Main { .. } => self.offer(),
        }
        Ok(())
    }

    pub fn state(&self) -> SdServerState {
        self.phase.state()
    }

    /// Repetition offers sent since the last activation.
    pub fn repetition_counter(&self) -> u32 {
        match self.phase {
            Phase::NotReady | Phase::InitialWait { .. } => 0,
            Phase::Repetition { counter, .. } => counter,
            Phase::Main { .. } => self.timing.repetition_max,
        }
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn service_available(&self) -> bool {
        self.service_available
    }

    pub fn link_available(&self) -> bool {
        self.link_available
    }

    pub fn descriptor(&self) -> &ServiceInstanceDescriptor {
        &self.descriptor
    }

    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    pub fn messages(&self) -> &MessageBuffer {
        &self.messages
    }

    pub fn messages_mut(&mut self) -> &mut MessageBuffer {
        &mut self.messages
    }

    pub fn take_messages(&mut self) -> Vec<SdMessage> {
        self.messages.drain().collect()
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }

    fn is_ready(&self) -> bool {
        self.service_available && self.link_available
    }

    fn availability_changed(&mut self, reason: &str) -> Result<()> {
        if self.is_ready() {
            self.activate()
        } else {
            self.deactivate(reason);
            Ok(())
        }
    }

    /// Enter the initial wait if started, available and not already active.
    ///
    /// Re-activation after an outage always restarts the full announcement burst.
    fn activate(&mut self) -> Result<()> {
        if !self.started || !self.is_ready() || self.phase != Phase::NotReady {
            return Ok(());
        }
        let delay = self.initial_delay();
        let timer = self.schedule(Schedule::OneShot(delay))?;
        self.phase = Phase::InitialWait { timer };
        self.log(LogLevel::Info, &format!("entering initial wait phase ({:?})", delay));
        Ok(())
    }

    fn deactivate(&mut self, reason: &str) {
        let left = std::mem::replace(&mut self.phase, Phase::NotReady);
        if let Some(timer) = left.timer() {
            self.timer.cancel(timer);
        }
        // Nothing goes out while the link is down, not even the stop offer
        if left.announced() && self.link_available {
            self.messages.push(SdMessage::stop_offer(&self.descriptor));
        }
        if left != Phase::NotReady {
            self.log(LogLevel::Info, &format!("not ready ({})", reason));
        }
    }

    fn enter_main(&mut self) -> Result<Phase> {
        let timer = self.schedule(Schedule::Periodic(self.timing.cycle_offer_delay))?;
        self.log(LogLevel::Info, "entering main phase");
        Ok(Phase::Main { timer })
    }

    fn schedule(&mut self, schedule: Schedule) -> Result<TimerHandle> {
        let armed = match schedule {
            Schedule::OneShot(delay) => self.timer.arm_one_shot(delay),
            Schedule::Periodic(period) => self.timer.arm_periodic(period),
        };
        armed.map_err(|err| self.arm_failed(err))
    }

    fn arm_failed(&mut self, err: TimerError) -> Error {
        self.log(LogLevel::Error, &format!("failed to arm timer: {}", err));
        self.started = false;
        self.deactivate("timer failure");
        Error::Timer(err)
    }

    fn initial_delay(&mut self) -> Duration {
        let (min, max) = (self.timing.initial_delay_min, self.timing.initial_delay_max);
        if min == max {
            return min;
        }
        self.rng.gen_range(min..=max)
    }

    fn offer(&mut self) {
        self.messages.push(SdMessage::offer(&self.descriptor));
    }

    fn log(&self, level: LogLevel, msg: &str) {
        self.logger.log(level, COMPONENT, &format!("[{}] {}", self.descriptor, msg));
    }
}
