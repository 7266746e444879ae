#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::RwLock;

use jobctl::jobs::{Editor, SecretPrompt, Sleeper};
use jobctl::{JobError, JobResource, Result, Transport};

/// A request seen by the mock transport
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Debug, Clone)]
enum MockReply {
    Json(Value),
    Status(u16),
}

/// Mock job-management server keyed by method and path.
///
/// A registered sequence is served front to back; its last reply repeats.
pub struct MockTransport {
    responses: Arc<RwLock<HashMap<(String, String), VecDeque<MockReply>>>>,
    requests: Arc<RwLock<Vec<RecordedRequest>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(RwLock::new(HashMap::new())),
            requests: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn register_json(&self, method: &str, path: &str, body: Value) {
        self.register(method, path, vec![MockReply::Json(body)]).await;
    }

    pub async fn register_sequence(&self, method: &str, path: &str, bodies: Vec<Value>) {
        let replies = bodies.into_iter().map(MockReply::Json).collect();
        self.register(method, path, replies).await;
    }

    pub async fn register_status(&self, method: &str, path: &str, status: u16) {
        self.register(method, path, vec![MockReply::Status(status)])
            .await;
    }

    async fn register(&self, method: &str, path: &str, replies: Vec<MockReply>) {
        self.responses
            .write()
            .await
            .insert((method.to_string(), path.to_string()), replies.into());
    }

    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.read().await.clone()
    }

    pub async fn request_count(&self) -> usize {
        self.requests.read().await.len()
    }

    async fn reply(&self, method: &str, path: &str, body: Option<&Value>) -> Result<Value> {
        self.requests.write().await.push(RecordedRequest {
            method: method.to_string(),
            path: path.to_string(),
            body: body.cloned(),
        });

        let mut responses = self.responses.write().await;
        let queue = responses
            .get_mut(&(method.to_string(), path.to_string()))
            .ok_or_else(|| JobError::from_status(404, format!("{} {} not mocked", method, path)))?;

        let reply = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };

        match reply {
            Some(MockReply::Json(value)) => Ok(value),
            Some(MockReply::Status(status)) => Err(JobError::from_status(status, "mocked status")),
            None => Ok(Value::Null),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, path: &str) -> Result<Value> {
        self.reply("GET", path, None).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        self.reply("POST", path, Some(body)).await
    }
}

/// Editor stand-in returning a fixed reply and remembering its input
pub struct ScriptedEditor {
    reply: String,
    calls: Mutex<Vec<String>>,
}

impl ScriptedEditor {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Editor for ScriptedEditor {
    fn edit(&self, initial: &str) -> Result<String> {
        self.calls.lock().unwrap().push(initial.to_string());
        Ok(self.reply.clone())
    }
}

/// Secret prompt stand-in answering every label with the same value
pub struct ScriptedSecretPrompt {
    answer: String,
    labels: Mutex<Vec<String>>,
}

impl ScriptedSecretPrompt {
    pub fn new(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            labels: Mutex::new(Vec::new()),
        }
    }

    pub fn labels(&self) -> Vec<String> {
        self.labels.lock().unwrap().clone()
    }
}

impl SecretPrompt for ScriptedSecretPrompt {
    fn prompt_secret(&self, label: &str) -> Result<String> {
        self.labels.lock().unwrap().push(label.to_string());
        Ok(self.answer.clone())
    }
}

/// Sleeper that records requested delays without waiting
#[derive(Default)]
pub struct RecordingSleeper {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

/// In-memory writer shared between the renderer and the test
#[derive(Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.inner.lock().unwrap()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// A job resource wired to mocks
pub struct Harness {
    pub transport: Arc<MockTransport>,
    pub editor: Arc<ScriptedEditor>,
    pub secrets: Arc<ScriptedSecretPrompt>,
    pub sleeper: Arc<RecordingSleeper>,
    pub output: SharedBuffer,
    pub jobs: JobResource,
}

impl Harness {
    pub fn new(is_tty: bool) -> Self {
        Self::with_editor_reply(is_tty, "")
    }

    pub fn with_editor_reply(is_tty: bool, reply: &str) -> Self {
        Self::build(is_tty, reply, "bar")
    }

    pub fn with_secret_answer(answer: &str) -> Self {
        Self::build(false, "", answer)
    }

    fn build(is_tty: bool, editor_reply: &str, secret_answer: &str) -> Self {
        let transport = Arc::new(MockTransport::new());
        let editor = Arc::new(ScriptedEditor::new(editor_reply));
        let secrets = Arc::new(ScriptedSecretPrompt::new(secret_answer));
        let sleeper = Arc::new(RecordingSleeper::default());
        let output = SharedBuffer::default();

        let sink = output.clone();
        let jobs = JobResource::new(transport.clone())
            .with_editor(editor.clone())
            .with_secret_prompt(secrets.clone())
            .with_sleeper(sleeper.clone())
            .with_tty_predicate(move || is_tty)
            .with_output(move || -> Box<dyn Write + Send> { Box::new(sink.clone()) });

        Self {
            transport,
            editor,
            secrets,
            sleeper,
            output,
            jobs,
        }
    }

    /// Register a template with a launch link and an empty launch reply
    pub async fn register_launchable_template(&self, template: Value) {
        self.transport
            .register_json("GET", "/job_templates/1/", template)
            .await;
        self.transport
            .register_json("GET", "/job_templates/1/launch/", serde_json::json!({}))
            .await;
        self.transport
            .register_json(
                "POST",
                "/job_templates/1/launch/",
                serde_json::json!({"job": 42}),
            )
            .await;
    }
}
