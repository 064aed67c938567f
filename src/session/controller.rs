use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{broadcast, mpsc, oneshot, watch, Mutex};
use uuid::Uuid;

use crate::{
    camera::CameraClearance,
    models::{EndReason, SessionOutcome},
    report::ViolationReport,
    settings::ProctorSettings,
    timer::{TimerController, TimerEvent, TimerSnapshot, TimerState},
    violations::{
        Decision, EscalationPolicy, RawSignal, ViolationEvent, ViolationKind, ViolationStatus,
        ViolationTracker,
    },
};

use super::SessionEvent;

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

const COMMAND_QUEUE_DEPTH: usize = 64;
const EVENT_BUFFER: usize = 256;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RecordReply {
    pub event: ViolationEvent,
    pub count: u32,
    pub decision: Decision,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: String,
    pub timer: TimerSnapshot,
    pub violation_count: u32,
    pub violation_status: ViolationStatus,
    pub last_kind: Option<ViolationKind>,
    pub ended: bool,
}

enum Command {
    Record {
        kind: ViolationKind,
        reply: oneshot::Sender<Option<RecordReply>>,
    },
    Acknowledge {
        reply: oneshot::Sender<bool>,
    },
    Pause {
        reply: oneshot::Sender<TimerState>,
    },
    Resume {
        reply: oneshot::Sender<TimerState>,
    },
    Reset {
        minutes: u32,
        reply: oneshot::Sender<Result<TimerState>>,
    },
    End {
        reason: EndReason,
        reply: oneshot::Sender<SessionOutcome>,
    },
}

/// Handle to a running proctored attempt. Clones share the same session.
///
/// All mutations go through one supervisor task, which also receives the
/// countdown's ticks, so violations, acknowledgements and expiry are applied
/// strictly one at a time. When the last handle is dropped the supervisor
/// ends the session as `Abandoned`.
#[derive(Clone)]
pub struct ProctorSession {
    id: String,
    started_at: DateTime<Utc>,
    commands: mpsc::Sender<Command>,
    timer: TimerController,
    tracker: Arc<Mutex<ViolationTracker>>,
    events: broadcast::Sender<SessionEvent>,
    outcome: watch::Receiver<Option<SessionOutcome>>,
}

impl ProctorSession {
    pub async fn start(clearance: CameraClearance, settings: &ProctorSettings) -> Result<Self> {
        settings.validate()?;

        let id = Uuid::new_v4().to_string();
        let started_at = Utc::now();

        let (timer, timer_events) = TimerController::new(settings.tick_interval());
        timer.start(settings.time_limit_minutes).await?;

        let (commands, commands_rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        let (outcome_tx, outcome) = watch::channel(None);
        let tracker = Arc::new(Mutex::new(ViolationTracker::new()));

        let supervisor = Supervisor {
            session_id: id.clone(),
            started_at,
            policy: settings.policy.clone(),
            timer: timer.clone(),
            tracker: tracker.clone(),
            events: events.clone(),
            outcome: outcome_tx,
            time_warning_sent: false,
        };
        tokio::spawn(supervisor.run(commands_rx, timer_events));

        log_info!(
            "session {} started: {} minute(s), camera granted at {} (stream {})",
            id,
            settings.time_limit_minutes,
            clearance.granted_at(),
            clearance.stream_id()
        );

        Ok(Self {
            id,
            started_at,
            commands,
            timer,
            tracker,
            events,
            outcome,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn record(&self, kind: ViolationKind) -> Result<Option<RecordReply>> {
        self.request(|reply| Command::Record { kind, reply }).await
    }

    /// Classifies a raw host signal and records it. Allowed signals return `Ok(None)`.
    pub async fn report_signal(&self, signal: &RawSignal) -> Result<Option<RecordReply>> {
        match signal.classify() {
            Some(kind) => self.record(kind).await,
            None => Ok(None),
        }
    }

    pub async fn acknowledge(&self) -> Result<bool> {
        self.request(|reply| Command::Acknowledge { reply }).await
    }

    pub async fn pause(&self) -> Result<TimerState> {
        self.request(|reply| Command::Pause { reply }).await
    }

    pub async fn resume(&self) -> Result<TimerState> {
        self.request(|reply| Command::Resume { reply }).await
    }

    /// Puts a new time limit on the clock and leaves it paused. The time
    /// warning is re-armed for the new countdown.
    pub async fn reset(&self, minutes: u32) -> Result<TimerState> {
        self.request(|reply| Command::Reset { minutes, reply }).await?
    }

    pub async fn submit(&self) -> Result<SessionOutcome> {
        self.end(EndReason::Submitted).await
    }

    pub async fn exit(&self) -> Result<SessionOutcome> {
        self.end(EndReason::StudentExit).await
    }

    /// Ends the session. If it already ended, returns the first outcome.
    pub async fn end(&self, reason: EndReason) -> Result<SessionOutcome> {
        match self.request(|reply| Command::End { reason, reply }).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => self.outcome().ok_or(err),
        }
    }

    pub fn outcome(&self) -> Option<SessionOutcome> {
        self.outcome.borrow().clone()
    }

    pub async fn wait_ended(&self) -> Result<SessionOutcome> {
        let mut outcome = self.outcome.clone();
        let ended = outcome
            .wait_for(|value| value.is_some())
            .await
            .map_err(|_| anyhow!("session {} supervisor exited without an outcome", self.id))?;
        ended
            .clone()
            .ok_or_else(|| anyhow!("session {} has no outcome", self.id))
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let timer = self.timer.get_snapshot().await;
        let tracker = self.tracker.lock().await;
        SessionSnapshot {
            session_id: self.id.clone(),
            timer,
            violation_count: tracker.count(),
            violation_status: tracker.status(),
            last_kind: tracker.session().last_kind(),
            ended: self.outcome.borrow().is_some(),
        }
    }

    pub async fn report(&self) -> ViolationReport {
        let ended = self
            .outcome
            .borrow()
            .as_ref()
            .map(|outcome| (outcome.ended_at, outcome.reason));
        let tracker = self.tracker.lock().await;
        ViolationReport::new(&self.id, self.started_at, tracker.session(), ended)
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| anyhow!("session {} has ended", self.id))?;
        response
            .await
            .map_err(|_| anyhow!("session {} has ended", self.id))
    }
}

struct Supervisor {
    session_id: String,
    started_at: DateTime<Utc>,
    policy: EscalationPolicy,
    timer: TimerController,
    tracker: Arc<Mutex<ViolationTracker>>,
    events: broadcast::Sender<SessionEvent>,
    outcome: watch::Sender<Option<SessionOutcome>>,
    time_warning_sent: bool,
}

impl Supervisor {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut timer_events: mpsc::UnboundedReceiver<TimerEvent>,
    ) {
        let outcome = loop {
            tokio::select! {
                Some(event) = timer_events.recv() => {
                    if let Some(outcome) = self.on_timer(event).await {
                        break outcome;
                    }
                }
                command = commands.recv() => {
                    let Some(command) = command else {
                        break self.end_session(EndReason::Abandoned).await;
                    };
                    if let Some(outcome) = self.on_command(command).await {
                        break outcome;
                    }
                }
            }
        };

        commands.close();
        log_info!(
            "session {} supervisor exiting ({})",
            outcome.session_id,
            outcome.reason.as_str()
        );
    }

    async fn on_timer(&mut self, event: TimerEvent) -> Option<SessionOutcome> {
        match event {
            TimerEvent::Tick(timer) => {
                if timer.is_warning_threshold && !self.time_warning_sent {
                    self.time_warning_sent = true;
                    log_info!("session {}: {} remaining", self.session_id, timer.display);
                    self.emit(SessionEvent::TimeWarning {
                        timer: timer.clone(),
                    });
                }
                self.emit(SessionEvent::TimerTick { timer });
                None
            }
            TimerEvent::Expired(timer) => {
                self.emit(SessionEvent::TimerTick { timer });
                Some(self.end_session(EndReason::TimeExpired).await)
            }
        }
    }

    async fn on_command(&mut self, command: Command) -> Option<SessionOutcome> {
        match command {
            Command::Record { kind, reply } => {
                let recorded = self.tracker.lock().await.record(kind);
                let Some(recorded) = recorded else {
                    let _ = reply.send(None);
                    return None;
                };

                let decision = self.policy.evaluate(&recorded);
                log_warn!(
                    "session {}: violation #{} ({})",
                    self.session_id,
                    recorded.count,
                    kind.as_str()
                );
                self.emit(SessionEvent::ViolationRecorded {
                    kind,
                    count: recorded.count,
                });

                let ended = match decision {
                    Decision::Warn(warning) => {
                        self.emit(SessionEvent::ViolationWarning {
                            kind: warning.kind,
                            count: warning.count,
                            message: warning.message().to_string(),
                        });
                        None
                    }
                    Decision::Continue => None,
                    Decision::ForceExit { kind, count } => {
                        log_warn!(
                            "session {}: escalation policy forcing exit after {}",
                            self.session_id,
                            kind.as_str()
                        );
                        Some(
                            self.end_session(EndReason::PolicyTerminated { kind, count })
                                .await,
                        )
                    }
                };

                let _ = reply.send(Some(RecordReply {
                    event: recorded.event,
                    count: recorded.count,
                    decision,
                }));
                ended
            }
            Command::Acknowledge { reply } => {
                let cleared = self.tracker.lock().await.acknowledge();
                if cleared {
                    self.emit(SessionEvent::WarningAcknowledged);
                }
                let _ = reply.send(cleared);
                None
            }
            Command::Pause { reply } => {
                let (changed, state) = self.timer.pause().await;
                if changed {
                    self.emit(SessionEvent::Paused {
                        timer: TimerSnapshot::from(&state),
                    });
                }
                let _ = reply.send(state);
                None
            }
            Command::Resume { reply } => {
                let (changed, state) = self.timer.resume().await;
                if changed {
                    self.emit(SessionEvent::Resumed {
                        timer: TimerSnapshot::from(&state),
                    });
                }
                let _ = reply.send(state);
                None
            }
            Command::Reset { minutes, reply } => {
                let reset = self.timer.reset(minutes).await;
                if let Ok(state) = &reset {
                    self.time_warning_sent = false;
                    log_info!(
                        "session {}: countdown reset to {}",
                        self.session_id,
                        state.display()
                    );
                    self.emit(SessionEvent::TimerReset {
                        timer: TimerSnapshot::from(state),
                    });
                }
                let _ = reply.send(reset);
                None
            }
            Command::End { reason, reply } => {
                let outcome = self.end_session(reason).await;
                let _ = reply.send(outcome.clone());
                Some(outcome)
            }
        }
    }

    /// The single exit path. Stops the countdown, freezes the violation log
    /// and publishes the outcome.
    async fn end_session(&mut self, reason: EndReason) -> SessionOutcome {
        let timer = self.timer.stop().await;
        let violation_count = {
            let mut tracker = self.tracker.lock().await;
            tracker.terminate();
            tracker.count()
        };

        let outcome = SessionOutcome {
            session_id: self.session_id.clone(),
            reason,
            started_at: self.started_at,
            ended_at: Utc::now(),
            remaining_seconds: timer.remaining_seconds,
            violation_count,
        };

        log_info!(
            "session {} ended: {} with {} violation(s), {} left",
            self.session_id,
            reason.as_str(),
            violation_count,
            timer.display()
        );

        self.outcome.send_replace(Some(outcome.clone()));
        self.emit(SessionEvent::Ended {
            outcome: outcome.clone(),
        });
        outcome
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }
}
