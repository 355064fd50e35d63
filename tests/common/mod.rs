#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures_util::stream;
use llm_switchboard::LLMError;
use llm_switchboard::http::{HttpRequest, HttpResponse, HttpStreamResponse, HttpTransport};
use serde_json::Value;

pub enum Reply {
    Json(u16, Value),
    Sse(Vec<&'static str>),
}

/// In-memory transport answering from a scripted queue and recording every request.
#[derive(Default)]
pub struct MemoryTransport {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MemoryTransport {
    pub fn new(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn silent() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn request(&self, index: usize) -> HttpRequest {
        self.requests.lock().unwrap()[index].clone()
    }

    pub fn body(&self, index: usize) -> Value {
        serde_json::from_slice(&self.request(index).body).expect("request body is JSON")
    }

    fn next(&self, request: HttpRequest) -> Reply {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected request: no scripted reply left")
    }
}

#[async_trait]
impl HttpTransport for MemoryTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, LLMError> {
        match self.next(request) {
            Reply::Json(status, body) => Ok(HttpResponse {
                status,
                headers: Default::default(),
                body: body.to_string().into_bytes(),
            }),
            Reply::Sse(_) => panic!("streaming reply scripted for a blocking call"),
        }
    }

    async fn send_stream(&self, request: HttpRequest) -> Result<HttpStreamResponse, LLMError> {
        let (status, chunks) = match self.next(request) {
            Reply::Sse(chunks) => (
                200,
                chunks
                    .into_iter()
                    .map(|chunk| Ok(chunk.as_bytes().to_vec()))
                    .collect::<Vec<_>>(),
            ),
            Reply::Json(status, body) => (status, vec![Ok(body.to_string().into_bytes())]),
        };
        Ok(HttpStreamResponse {
            status,
            headers: Default::default(),
            body: Box::pin(stream::iter(chunks)),
        })
    }
}
