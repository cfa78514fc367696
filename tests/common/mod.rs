//! Shared test utilities

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use parley::llm::{ChatCompletionClient, ChatRequest, SessionClient, SessionHandle};
use parley::protocol::Literal;
use parley::{Error, Result, Tool};

/// Chat client that replays canned replies and records every request
#[derive(Default)]
pub struct ScriptedChat {
    replies: Mutex<VecDeque<Vec<String>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedChat {
    /// Each reply is the list of segments for one call
    pub fn new<I, R, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let replies = replies
            .into_iter()
            .map(|reply| reply.into_iter().map(Into::into).collect())
            .collect();
        Self {
            replies: Mutex::new(replies),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatCompletionClient for ScriptedChat {
    async fn complete(&self, request: &ChatRequest) -> Result<Vec<String>> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::Backend("script exhausted".to_string()))
    }
}

/// Session client that replays canned replies and records every message
pub struct ScriptedSession {
    replies: Mutex<VecDeque<String>>,
    messages: Mutex<Vec<String>>,
    sessions_created: Mutex<u32>,
}

impl ScriptedSession {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            messages: Mutex::new(Vec::new()),
            sessions_created: Mutex::new(0),
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    pub fn sessions_created(&self) -> u32 {
        *self.sessions_created.lock().unwrap()
    }
}

#[async_trait]
impl SessionClient for ScriptedSession {
    async fn create_session(&self) -> Result<SessionHandle> {
        *self.sessions_created.lock().unwrap() += 1;
        Ok(SessionHandle::new("session-test"))
    }

    async fn chat(&self, session: &SessionHandle, message: &str) -> Result<String> {
        assert_eq!(session.as_str(), "session-test");
        self.messages.lock().unwrap().push(message.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::Session("script exhausted".to_string()))
    }
}

/// `add(a,b)` returning the integer sum
pub fn add_tool() -> Tool {
    Tool::from_fn("add", "Add two integers.", |args: &[Literal]| match args {
        [a, b] => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => Ok(Literal::Int(a + b)),
            _ => Err(Error::Tool("add expects integers".to_string())),
        },
        _ => Err(Error::Tool("add expects two arguments".to_string())),
    })
    .with_parameter("a", "First addend.", "number")
    .with_parameter("b", "Second addend.", "number")
}

/// `add(a,b)` without a callable
pub fn advertised_add() -> Tool {
    Tool::advertised("add", "Add two integers.")
        .with_parameter("a", "First addend.", "number")
        .with_parameter("b", "Second addend.", "number")
}
