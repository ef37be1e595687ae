//! Test double that replays canned responses and records every request.

use crate::llm::{GenerateRequest, GenerationClient, Provider};
use anyhow::anyhow;
use std::collections::VecDeque;
use std::sync::Mutex;

type Responder = Box<dyn Fn(&GenerateRequest) -> Result<String, String> + Send + Sync>;

#[derive(Default)]
pub struct ScriptedClient {
    replies: Mutex<VecDeque<Result<String, String>>>,
    responder: Option<Responder>,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers from the request itself once the queued replies run out. Useful when
    /// calls are issued concurrently and arrival order is not fixed.
    pub fn responding(
        f: impl Fn(&GenerateRequest) -> Result<String, String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Some(Box::new(f)),
            ..Self::default()
        }
    }

    pub fn replying(text: impl Into<String>) -> Self {
        let client = Self::new();
        client.push_reply(text);
        client
    }

    pub fn failing(message: impl Into<String>) -> Self {
        let client = Self::new();
        client.push_error(message);
        client
    }

    pub fn push_reply(&self, text: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Ok(text.into()));
    }

    pub fn push_error(&self, message: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Err(message.into()));
    }

    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl GenerationClient for ScriptedClient {
    fn provider(&self) -> Provider {
        Provider::Gemini
    }

    async fn generate(&self, request: GenerateRequest) -> anyhow::Result<String> {
        let queued = self.replies.lock().unwrap().pop_front();
        let reply = match (queued, &self.responder) {
            (Some(reply), _) => reply,
            (None, Some(responder)) => responder(&request),
            (None, None) => Err("scripted client has no reply left".to_string()),
        };
        self.requests.lock().unwrap().push(request);
        reply.map_err(|message| anyhow!(message))
    }
}
