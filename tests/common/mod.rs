//! Scripted camera provider shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use proctor::camera::{CameraConstraints, CameraError, CameraProvider, MediaStream};
use tokio::sync::oneshot;

pub enum Step {
    Grant,
    Fail(CameraError),
    /// Waits until the test answers on the paired sender.
    Gated(oneshot::Receiver<Result<(), CameraError>>),
}

#[derive(Default)]
pub struct StreamCounters {
    pub active: AtomicUsize,
    pub peak: AtomicUsize,
    pub opened: AtomicUsize,
}

pub struct MockStream {
    id: String,
    counters: Arc<StreamCounters>,
    stopped: bool,
}

impl MediaStream for MockStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.counters.active.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

#[derive(Default)]
pub struct MockProvider {
    script: Mutex<VecDeque<Step>>,
    pub counters: Arc<StreamCounters>,
    pub requests: AtomicUsize,
}

impl MockProvider {
    pub fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(steps.into()),
            ..Self::default()
        })
    }

    pub fn push(&self, step: Step) {
        self.script.lock().unwrap().push_back(step);
    }

    pub fn active(&self) -> usize {
        self.counters.active.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.counters.peak.load(Ordering::SeqCst)
    }

    fn open(&self) -> Box<dyn MediaStream> {
        let n = self.counters.opened.fetch_add(1, Ordering::SeqCst) + 1;
        let active = self.counters.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.peak.fetch_max(active, Ordering::SeqCst);
        Box::new(MockStream {
            id: format!("stream-{n}"),
            counters: self.counters.clone(),
            stopped: false,
        })
    }
}

#[async_trait]
impl CameraProvider for MockProvider {
    async fn request_stream(
        &self,
        constraints: &CameraConstraints,
    ) -> Result<Box<dyn MediaStream>, CameraError> {
        assert!(!constraints.audio);
        self.requests.fetch_add(1, Ordering::SeqCst);

        let step = self.script.lock().unwrap().pop_front();
        match step {
            Some(Step::Grant) => Ok(self.open()),
            Some(Step::Fail(err)) => Err(err),
            Some(Step::Gated(answer)) => match answer.await {
                Ok(Ok(())) => Ok(self.open()),
                Ok(Err(err)) => Err(err),
                Err(_) => Err(CameraError::Other("permission prompt dismissed".into())),
            },
            None => Err(CameraError::NotFound),
        }
    }
}
