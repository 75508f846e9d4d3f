use crate::error::TimerError;
use crate::sd::timer::{TimerFacility, TimerHandle};
use std::collections::HashMap;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Timer facility backed by tokio tasks.
///
/// Each armed timer is a task that sends its handle on the expiry channel. Cancelling
/// aborts the task, but an expiry already sitting in the channel is still delivered;
/// the server's handle check discards it.
pub struct TokioTimer {
    expiries: mpsc::UnboundedSender<TimerHandle>,
    tasks: HashMap<TimerHandle, JoinHandle<()>>,
    next_id: u64,
}

impl TokioTimer {
    pub fn new(expiries: mpsc::UnboundedSender<TimerHandle>) -> Self {
        TokioTimer {
            expiries,
            tasks: HashMap::new(),
            next_id: 0,
        }
    }

    /// Timers that have not fired or been cancelled yet.
    pub fn pending(&self) -> usize {
        self.tasks.values().filter(|task| !task.is_finished()).count()
    }

    fn spawn<F>(&mut self, body: impl FnOnce(TimerHandle, mpsc::UnboundedSender<TimerHandle>) -> F) -> Result<TimerHandle, TimerError>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let runtime = Handle::try_current().map_err(|_| TimerError::NoRuntime)?;
        // Finished one-shots are never cancelled, so prune them here
        self.tasks.retain(|_, task| !task.is_finished());

        self.next_id += 1;
        let handle = TimerHandle::new(self.next_id);
        let task = runtime.spawn(body(handle, self.expiries.clone()));
        self.tasks.insert(handle, task);
        Ok(handle)
    }
}

impl TimerFacility for TokioTimer {
    fn arm_one_shot(&mut self, delay: Duration) -> Result<TimerHandle, TimerError> {
        let deadline = deadline_after(delay)?;
        self.spawn(move |handle, expiries| async move {
            time::sleep_until(deadline).await;
            let _ = expiries.send(handle);
        })
    }

    fn arm_periodic(&mut self, period: Duration) -> Result<TimerHandle, TimerError> {
        if period.is_zero() {
            return Err(TimerError::ZeroPeriod);
        }
        let first = deadline_after(period)?;
        self.spawn(move |handle, expiries| async move {
            let mut ticker = time::interval_at(first, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if expiries.send(handle).is_err() {
                    break;
                }
            }
        })
    }

    fn cancel(&mut self, handle: TimerHandle) {
        if let Some(task) = self.tasks.remove(&handle) {
            task.abort();
        }
    }
}

fn deadline_after(delay: Duration) -> Result<Instant, TimerError> {
    Instant::now().checked_add(delay).ok_or(TimerError::DeadlineOverflow)
}

impl Drop for TokioTimer {
    fn drop(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
    }
}
