//! Tokio driver
//!
//! Runs a [`Simulation`] in real (or paused test) time. Timers are spawned
//! tokio tasks that send their fires back over a channel, so the playhead
//! itself is only ever touched from the driver's loop.

use super::{SimCommand, Simulation, SimulationReport};
use crate::error::{Error, Result};
use crate::timer::{TimerHandle, TimerService, TimerTask};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Simulation step size
pub const SIM_TICK: Duration = Duration::from_millis(50);

type Fired = (TimerHandle, TimerTask);

/// [`TimerService`] backed by tokio sleeps and intervals
///
/// Must be used from within a tokio runtime. Fires are delivered through the
/// receiver returned by [`TokioTimers::new`].
pub struct TokioTimers {
    tx: mpsc::UnboundedSender<Fired>,
    next_id: AtomicU64,
    tasks: Arc<Mutex<HashMap<TimerHandle, AbortHandle>>>,
}

impl TokioTimers {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Fired>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                next_id: AtomicU64::new(1),
                tasks: Arc::new(Mutex::new(HashMap::new())),
            },
            rx,
        )
    }

    fn tasks(&self) -> MutexGuard<'_, HashMap<TimerHandle, AbortHandle>> {
        self.tasks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Number of timers still scheduled
    pub fn pending(&self) -> usize {
        self.tasks().len()
    }

    fn next_handle(&self) -> TimerHandle {
        TimerHandle::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }
}

impl TimerService for TokioTimers {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }

    fn schedule_once(&self, delay: Duration, task: TimerTask) -> TimerHandle {
        let handle = self.next_handle();
        let tx = self.tx.clone();
        let tasks = self.tasks.clone();

        // Hold the map lock across the spawn so the task cannot remove its
        // entry before it is inserted
        let mut map = self.tasks();
        let join = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tasks
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .remove(&handle);
            let _ = tx.send((handle, task));
        });
        map.insert(handle, join.abort_handle());
        handle
    }

    fn schedule_repeating(&self, period: Duration, task: TimerTask) -> TimerHandle {
        let handle = self.next_handle();
        let tx = self.tx.clone();
        let join = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut interval = tokio::time::interval_at(start, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send((handle, task)).is_err() {
                    break;
                }
            }
        });
        self.tasks().insert(handle, join.abort_handle());
        handle
    }

    fn cancel(&self, handle: TimerHandle) {
        if let Some(abort) = self.tasks().remove(&handle) {
            abort.abort();
        }
    }
}

/// Requests sent to a running driver
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DriverCommand {
    Apply(SimCommand),
    Shutdown,
}

/// Cloneable control handle for a running [`PlayheadDriver`]
#[derive(Debug, Clone)]
pub struct DriverHandle {
    tx: mpsc::UnboundedSender<DriverCommand>,
}

impl DriverHandle {
    fn send(&self, command: DriverCommand) -> Result<()> {
        self.tx
            .send(command)
            .map_err(|_| Error::Driver("driver is no longer running".to_string()))
    }

    pub fn set_rate(&self, rate: f64) -> Result<()> {
        self.send(DriverCommand::Apply(SimCommand::SetRate(rate)))
    }

    pub fn seek(&self, time: f64) -> Result<()> {
        self.send(DriverCommand::Apply(SimCommand::Seek(time)))
    }

    pub fn set_start_time(&self, time: f64) -> Result<()> {
        self.send(DriverCommand::Apply(SimCommand::SetStartTime(time)))
    }

    pub fn pause(&self) -> Result<()> {
        self.send(DriverCommand::Apply(SimCommand::Pause))
    }

    pub fn play(&self) -> Result<()> {
        self.send(DriverCommand::Apply(SimCommand::Play))
    }

    pub fn shutdown(&self) -> Result<()> {
        self.send(DriverCommand::Shutdown)
    }
}

/// Event loop owning a [`Simulation`]
pub struct PlayheadDriver {
    sim: Simulation,
    timers: Arc<TokioTimers>,
    fired: mpsc::UnboundedReceiver<Fired>,
    commands: mpsc::UnboundedReceiver<DriverCommand>,
}

impl PlayheadDriver {
    /// Build the driver; `build` receives the timer service to hand to the
    /// playhead
    pub fn new(
        build: impl FnOnce(Arc<dyn TimerService>) -> Result<Simulation>,
    ) -> Result<(Self, DriverHandle)> {
        let (timers, fired) = TokioTimers::new();
        let timers = Arc::new(timers);
        let sim = build(timers.clone())?;
        let (tx, commands) = mpsc::unbounded_channel();

        Ok((
            Self {
                sim,
                timers,
                fired,
                commands,
            },
            DriverHandle { tx },
        ))
    }

    /// Run until `run_for` elapses or a shutdown is requested
    pub async fn run(self, run_for: Duration) -> Result<SimulationReport> {
        let PlayheadDriver {
            mut sim,
            timers,
            mut fired,
            mut commands,
        } = self;

        sim.start();
        info!("Driver running for {:.1}s", run_for.as_secs_f64());

        let deadline = tokio::time::sleep(run_for);
        tokio::pin!(deadline);

        let mut tick = tokio::time::interval(SIM_TICK);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = &mut deadline => {
                    debug!("Run time elapsed");
                    break;
                }
                Some(command) = commands.recv() => match command {
                    DriverCommand::Apply(command) => sim.apply(command),
                    DriverCommand::Shutdown => {
                        info!("Shutdown requested");
                        break;
                    }
                },
                Some((handle, task)) = fired.recv() => sim.on_timer(handle, task),
                _ = tick.tick() => sim.step(SIM_TICK.as_secs_f64()),
            }
        }

        let report = sim.finish();
        debug!("{} timer(s) left after shutdown", timers.pending());
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_one_shot_fires_after_delay() {
        let (timers, mut rx) = TokioTimers::new();
        let handle = timers.schedule_once(Duration::from_millis(100), TimerTask::EarlySeek);

        let start = tokio::time::Instant::now();
        let (fired, task) = rx.recv().await.unwrap();
        assert_eq!(fired, handle);
        assert_eq!(task, TimerTask::EarlySeek);
        assert!(start.elapsed() >= Duration::from_millis(100));

        tokio::task::yield_now().await;
        assert_eq!(timers.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_never_fires() {
        let (timers, mut rx) = TokioTimers::new();
        let handle = timers.schedule_repeating(Duration::from_millis(250), TimerTask::TrickPlay);
        timers.cancel(handle);
        assert_eq!(timers.pending(), 0);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeating_timer_keeps_firing() {
        let (timers, mut rx) = TokioTimers::new();
        let handle = timers.schedule_repeating(Duration::from_millis(250), TimerTask::GapJump);

        for _ in 0..3 {
            assert_eq!(rx.recv().await, Some((handle, TimerTask::GapJump)));
        }
        timers.cancel(handle);
    }
}
