//! Scripted [`JobBackend`] for unit tests.

use super::backend::JobBackend;
use crate::error::JobError;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A mock backend with per-model submission answers and a queue of poll answers.
///
/// Models without a scripted answer reply "model does not exist". The last
/// poll answer repeats once the queue is drained.
pub(crate) struct MockBackend {
    creates: HashMap<String, Result<Value, JobError>>,
    polls: Mutex<VecDeque<Result<Value, JobError>>>,
    last_poll: Mutex<Option<Result<Value, JobError>>>,
    created: Mutex<Vec<String>>,
    poll_count: Arc<AtomicU32>,
    delay: Option<Duration>,
}

impl MockBackend {
    pub(crate) fn new() -> Self {
        Self {
            creates: HashMap::new(),
            polls: Mutex::new(VecDeque::new()),
            last_poll: Mutex::new(None),
            created: Mutex::new(Vec::new()),
            poll_count: Arc::new(AtomicU32::new(0)),
            delay: None,
        }
    }

    pub(crate) fn on_create(mut self, model: &str, answer: Result<Value, JobError>) -> Self {
        self.creates.insert(model.to_string(), answer);
        self
    }

    pub(crate) fn on_poll(self, answer: Result<Value, JobError>) -> Self {
        self.polls.lock().unwrap().push_back(answer);
        self
    }

    pub(crate) fn on_poll_times(mut self, answer: Value, times: usize) -> Self {
        for _ in 0..times {
            self = self.on_poll(Ok(answer.clone()));
        }
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn created_models(&self) -> Vec<String> {
        self.created.lock().unwrap().clone()
    }

    pub(crate) fn poll_count(&self) -> u32 {
        self.poll_count.load(Ordering::SeqCst)
    }

    pub(crate) fn poll_count_handle(&self) -> Arc<AtomicU32> {
        self.poll_count.clone()
    }
}

#[async_trait]
impl JobBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn create_task(&self, model: &str, _input: &Map<String, Value>) -> Result<Value, JobError> {
        self.created.lock().unwrap().push(model.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.creates
            .get(model)
            .cloned()
            .unwrap_or_else(|| Ok(json!({"code": 404, "msg": "model does not exist"})))
    }

    async fn get_task(&self, _id: &str) -> Result<Value, JobError> {
        self.poll_count.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.polls.lock().unwrap().pop_front();
        let mut last = self.last_poll.lock().unwrap();
        match next {
            Some(answer) => {
                *last = Some(answer.clone());
                answer
            }
            None => last
                .clone()
                .unwrap_or_else(|| Ok(json!({"status": "processing"}))),
        }
    }
}
