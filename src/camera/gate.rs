use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;

use super::{CameraConstraints, CameraError, CameraProvider, CameraState, MediaStream};

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

/// Proof that the camera was granted when the student confirmed. Only the
/// gate can mint one, and a session cannot start without it.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CameraClearance {
    granted_at: DateTime<Utc>,
    stream_id: String,
}

impl CameraClearance {
    pub fn granted_at(&self) -> DateTime<Utc> {
        self.granted_at
    }

    pub fn stream_id(&self) -> &str {
        &self.stream_id
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        Self {
            granted_at: Utc::now(),
            stream_id: "test-stream".into(),
        }
    }
}

struct InFlight {
    token: CancellationToken,
    done: watch::Receiver<bool>,
}

struct GateInner {
    state: CameraState,
    stream: Option<Box<dyn MediaStream>>,
    granted_at: Option<DateTime<Utc>>,
    /// Incremented by every acquire and release. An acquisition whose number
    /// no longer matches has been superseded and must not touch the gate.
    attempt: u64,
    in_flight: Option<InFlight>,
}

impl GateInner {
    fn stop_stream(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            log_info!("stopping camera stream {}", stream.id());
            stream.stop();
        }
        self.granted_at = None;
    }

    fn cancel_in_flight(&mut self) -> Option<InFlight> {
        let in_flight = self.in_flight.take();
        if let Some(pending) = &in_flight {
            pending.token.cancel();
        }
        in_flight
    }
}

pub struct CameraGate<P: CameraProvider> {
    provider: Arc<P>,
    constraints: CameraConstraints,
    inner: Mutex<GateInner>,
    state_tx: watch::Sender<CameraState>,
}

impl<P: CameraProvider> CameraGate<P> {
    pub fn new(provider: Arc<P>, constraints: CameraConstraints) -> Self {
        let (state_tx, _) = watch::channel(CameraState::Requesting);
        Self {
            provider,
            constraints,
            inner: Mutex::new(GateInner {
                state: CameraState::Requesting,
                stream: None,
                granted_at: None,
                attempt: 0,
                in_flight: None,
            }),
            state_tx,
        }
    }

    pub async fn state(&self) -> CameraState {
        self.inner.lock().await.state
    }

    pub async fn has_stream(&self) -> bool {
        self.inner.lock().await.stream.is_some()
    }

    pub fn watch_state(&self) -> watch::Receiver<CameraState> {
        self.state_tx.subscribe()
    }

    pub fn constraints(&self) -> &CameraConstraints {
        &self.constraints
    }

    /// Requests a fresh stream. Any held stream is stopped and any pending
    /// request is cancelled and fully wound down before the new request is
    /// issued, so two streams never coexist.
    pub async fn acquire(&self) -> CameraState {
        let (attempt, token, done_tx, previous) = {
            let mut inner = self.inner.lock().await;
            let previous = inner.cancel_in_flight();
            inner.stop_stream();
            inner.attempt = inner.attempt.wrapping_add(1);

            let token = CancellationToken::new();
            let (done_tx, done_rx) = watch::channel(false);
            inner.in_flight = Some(InFlight {
                token: token.clone(),
                done: done_rx,
            });
            self.transition(&mut inner, CameraState::Requesting);
            (inner.attempt, token, done_tx, previous)
        };

        if let Some(previous) = previous {
            log_info!("superseding pending camera request");
            wait_until_done(previous.done).await;
        }

        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => None,
            result = self.provider.request_stream(&self.constraints) => Some(result),
        };

        let state = {
            let mut inner = self.inner.lock().await;
            let current = inner.attempt == attempt;
            if current {
                inner.in_flight = None;
            }

            match outcome {
                Some(Ok(stream)) if current => {
                    log_info!("camera granted (stream {})", stream.id());
                    inner.stream = Some(stream);
                    inner.granted_at = Some(Utc::now());
                    self.transition(&mut inner, CameraState::Granted);
                }
                Some(Ok(mut stream)) => {
                    log_info!("discarding stream {} from a superseded request", stream.id());
                    stream.stop();
                }
                Some(Err(err)) if current => {
                    match &err {
                        CameraError::Other(_) => log_error!("camera request failed: {}", err),
                        _ => log_warn!("camera request failed: {}", err),
                    }
                    self.transition(&mut inner, err.classify());
                }
                Some(Err(_)) | None => {}
            }
            inner.state
        };

        let _ = done_tx.send(true);
        state
    }

    /// Stops the held stream, if any, and abandons a pending request. A
    /// granted gate falls back to `Requesting`.
    pub async fn release(&self) {
        let mut inner = self.inner.lock().await;
        inner.cancel_in_flight();
        inner.attempt = inner.attempt.wrapping_add(1);
        inner.stop_stream();
        if inner.state == CameraState::Granted {
            self.transition(&mut inner, CameraState::Requesting);
        }
    }

    /// Releases the preview stream and hands back a clearance. Ignored unless
    /// the camera is granted.
    pub async fn confirm_and_proceed(&self) -> Option<CameraClearance> {
        let mut inner = self.inner.lock().await;
        if inner.state != CameraState::Granted {
            log_warn!(
                "confirm ignored: camera is {}, not granted",
                inner.state.as_str()
            );
            return None;
        }

        let stream_id = inner
            .stream
            .as_ref()
            .map(|stream| stream.id().to_string())
            .unwrap_or_default();
        let granted_at = inner.granted_at.unwrap_or_else(Utc::now);

        inner.cancel_in_flight();
        inner.attempt = inner.attempt.wrapping_add(1);
        inner.stop_stream();
        self.transition(&mut inner, CameraState::Requesting);

        log_info!("camera confirmed; preview released");
        Some(CameraClearance {
            granted_at,
            stream_id,
        })
    }

    pub async fn cancel(&self) {
        self.release().await;
        log_info!("camera permission flow cancelled");
    }

    fn transition(&self, inner: &mut GateInner, next: CameraState) {
        if inner.state != next {
            log_info!("camera state {} -> {}", inner.state.as_str(), next.as_str());
        }
        inner.state = next;
        self.state_tx.send_replace(next);
    }
}

impl<P: CameraProvider> Drop for CameraGate<P> {
    fn drop(&mut self) {
        let inner = self.inner.get_mut();
        inner.cancel_in_flight();
        inner.stop_stream();
    }
}

async fn wait_until_done(mut done: watch::Receiver<bool>) {
    while !*done.borrow_and_update() {
        if done.changed().await.is_err() {
            break;
        }
    }
}
