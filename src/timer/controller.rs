use std::{sync::Arc, time::Duration};

use anyhow::{bail, Result};
use serde::Serialize;
use tokio::{
    sync::{mpsc, Mutex},
    task::JoinHandle,
    time::{self, Instant},
};

use super::{TickOutcome, TimerState};

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub state: TimerState,
    pub display: String,
    pub is_warning_threshold: bool,
}

impl From<&TimerState> for TimerSnapshot {
    fn from(state: &TimerState) -> Self {
        Self {
            display: state.display(),
            is_warning_threshold: state.is_warning_threshold(),
            state: state.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    Tick(TimerSnapshot),
    Expired(TimerSnapshot),
}

/// Countdown state plus the id of the run cycle whose ticker may mutate it.
/// Bumping `run` retires whatever ticker is currently scheduled.
#[derive(Debug, Default)]
struct Clock {
    state: TimerState,
    run: u64,
}

#[derive(Clone)]
pub struct TimerController {
    clock: Arc<Mutex<Clock>>,
    ticker: Arc<Mutex<Option<JoinHandle<()>>>>,
    tick_interval: Duration,
    events: mpsc::UnboundedSender<TimerEvent>,
}

impl TimerController {
    pub fn new(tick_interval: Duration) -> (Self, mpsc::UnboundedReceiver<TimerEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let controller = Self {
            clock: Arc::new(Mutex::new(Clock::default())),
            ticker: Arc::new(Mutex::new(None)),
            tick_interval,
            events,
        };
        (controller, events_rx)
    }

    pub async fn get_state(&self) -> TimerState {
        self.clock.lock().await.state.clone()
    }

    pub async fn get_snapshot(&self) -> TimerSnapshot {
        TimerSnapshot::from(&self.clock.lock().await.state)
    }

    pub async fn start(&self, time_limit_minutes: u32) -> Result<TimerState> {
        if time_limit_minutes == 0 {
            bail!("time limit must be greater than zero minutes");
        }

        let (run, state) = {
            let mut clock = self.clock.lock().await;
            clock.run = clock.run.wrapping_add(1);
            clock.state.start(time_limit_minutes);
            (clock.run, clock.state.clone())
        };

        log_info!(
            "countdown started: {} minute(s), {} seconds",
            time_limit_minutes,
            state.remaining_seconds
        );
        self.spawn_ticker(run).await;
        Ok(state)
    }

    /// Returns whether the countdown was running, with the resulting state.
    pub async fn pause(&self) -> (bool, TimerState) {
        let (changed, state) = {
            let mut clock = self.clock.lock().await;
            clock.run = clock.run.wrapping_add(1);
            (clock.state.pause(), clock.state.clone())
        };
        self.cancel_ticker().await;
        if changed {
            log_info!("countdown paused at {}", state.display());
        }
        (changed, state)
    }

    /// Returns whether the countdown was restarted, with the resulting state.
    pub async fn resume(&self) -> (bool, TimerState) {
        let (run, state) = {
            let mut clock = self.clock.lock().await;
            let run = if clock.state.resume() {
                clock.run = clock.run.wrapping_add(1);
                Some(clock.run)
            } else {
                None
            };
            (run, clock.state.clone())
        };

        if let Some(run) = run {
            log_info!("countdown resumed at {}", state.display());
            self.spawn_ticker(run).await;
        }
        (run.is_some(), state)
    }

    pub async fn reset(&self, time_limit_minutes: u32) -> Result<TimerState> {
        if time_limit_minutes == 0 {
            bail!("time limit must be greater than zero minutes");
        }

        let state = {
            let mut clock = self.clock.lock().await;
            clock.run = clock.run.wrapping_add(1);
            clock.state.reset(time_limit_minutes);
            clock.state.clone()
        };
        self.cancel_ticker().await;
        Ok(state)
    }

    /// Halts the countdown where it is and cancels the ticker. Called on every
    /// session end path.
    pub async fn stop(&self) -> TimerState {
        let state = {
            let mut clock = self.clock.lock().await;
            clock.run = clock.run.wrapping_add(1);
            clock.state.halt();
            clock.state.clone()
        };
        self.cancel_ticker().await;
        state
    }

    pub async fn is_ticking(&self) -> bool {
        self.ticker
            .lock()
            .await
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    async fn spawn_ticker(&self, run: u64) {
        let mut ticker_guard = self.ticker.lock().await;
        if let Some(handle) = ticker_guard.take() {
            handle.abort();
        }

        let clock = self.clock.clone();
        let events = self.events.clone();
        let tick_interval = self.tick_interval;

        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + tick_interval, tick_interval);
            loop {
                interval.tick().await;

                let mut guard = clock.lock().await;
                if guard.run != run {
                    break;
                }

                match guard.state.tick() {
                    TickOutcome::Ticked => {
                        let _ = events.send(TimerEvent::Tick(TimerSnapshot::from(&guard.state)));
                    }
                    TickOutcome::Expired => {
                        log_info!("countdown expired");
                        let _ = events.send(TimerEvent::Expired(TimerSnapshot::from(&guard.state)));
                        break;
                    }
                    TickOutcome::Ignored => {
                        log_warn!("ticker woke for a stopped countdown; exiting");
                        break;
                    }
                }
            }
        });

        *ticker_guard = Some(handle);
    }

    async fn cancel_ticker(&self) {
        if let Some(handle) = self.ticker.lock().await.take() {
            handle.abort();
        }
    }
}
