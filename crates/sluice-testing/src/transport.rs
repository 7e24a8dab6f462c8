//! Scripted in-memory topic transport.

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;
use sluice_core::MessageId;
use sluice_publish::{PublishError, TopicTransport};

/// In-memory transport that replays a scripted response sequence.
///
/// Each publish call pops the next scripted response; once the script is
/// exhausted every further call is accepted with a generated message id.
/// Call counts are tracked so tests can assert exactly how many times the
/// transport was touched (or that it never was).
pub struct ScriptedTransport {
    publish_script: Mutex<VecDeque<Result<MessageId, PublishError>>>,
    repeat_last_error: bool,
    describe_response: Mutex<Option<PublishError>>,
    publish_calls: AtomicUsize,
    describe_calls: AtomicUsize,
    accepted: AtomicUsize,
}

impl ScriptedTransport {
    /// Transport that accepts every publish.
    pub fn always_accepting() -> Self {
        Self::scripted(Vec::new())
    }

    /// Transport that fails every publish with clones of `error`.
    pub fn always_failing(error: PublishError) -> Self {
        let mut transport = Self::scripted(vec![Err(error)]);
        transport.repeat_last_error = true;
        transport
    }

    /// Transport that replays `script`, then accepts everything after.
    pub fn scripted(script: Vec<Result<MessageId, PublishError>>) -> Self {
        Self {
            publish_script: Mutex::new(script.into()),
            repeat_last_error: false,
            describe_response: Mutex::new(None),
            publish_calls: AtomicUsize::new(0),
            describe_calls: AtomicUsize::new(0),
            accepted: AtomicUsize::new(0),
        }
    }

    /// Convenience: a script of `count` copies of `error`.
    pub fn failing_n_times(error: PublishError, count: usize) -> Self {
        Self::scripted((0..count).map(|_| Err(error.clone())).collect())
    }

    /// Makes the health-probe lookup fail with `error`.
    pub fn fail_describe(&self, error: PublishError) {
        *self.describe_response.lock().unwrap() = Some(error);
    }

    /// Number of publish calls that reached the transport.
    pub fn publish_calls(&self) -> usize {
        self.publish_calls.load(Ordering::SeqCst)
    }

    /// Number of metadata lookups that reached the transport.
    pub fn describe_calls(&self) -> usize {
        self.describe_calls.load(Ordering::SeqCst)
    }

    fn next_publish_response(&self) -> Result<MessageId, PublishError> {
        let mut script = self.publish_script.lock().unwrap();

        if self.repeat_last_error {
            if let Some(Err(error)) = script.front() {
                return Err(error.clone());
            }
        }

        match script.pop_front() {
            Some(response) => response,
            None => {
                let n = self.accepted.fetch_add(1, Ordering::SeqCst) + 1;
                Ok(MessageId(format!("msg-{n}")))
            },
        }
    }
}

#[async_trait]
impl TopicTransport for ScriptedTransport {
    async fn publish(&self, _topic_arn: &str, _body: &str) -> Result<MessageId, PublishError> {
        self.publish_calls.fetch_add(1, Ordering::SeqCst);
        self.next_publish_response()
    }

    async fn describe_topic(&self, _topic_arn: &str) -> Result<(), PublishError> {
        self.describe_calls.fetch_add(1, Ordering::SeqCst);
        match &*self.describe_response.lock().unwrap() {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

/// Transport whose publish future never resolves.
///
/// Exercises the per-attempt timeout: the publisher must give up on the
/// hung call, not wait for it.
pub struct StalledTransport {
    publish_calls: AtomicUsize,
}

impl StalledTransport {
    /// Creates a stalled transport.
    pub fn new() -> Self {
        Self { publish_calls: AtomicUsize::new(0) }
    }

    /// Number of publish calls that reached the transport before hanging.
    pub fn publish_calls(&self) -> usize {
        self.publish_calls.load(Ordering::SeqCst)
    }
}

impl Default for StalledTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TopicTransport for StalledTransport {
    async fn publish(&self, _topic_arn: &str, _body: &str) -> Result<MessageId, PublishError> {
        self.publish_calls.fetch_add(1, Ordering::SeqCst);
        std::future::pending::<()>().await;
        unreachable!("pending future never resolves")
    }

    async fn describe_topic(&self, _topic_arn: &str) -> Result<(), PublishError> {
        Ok(())
    }
}
