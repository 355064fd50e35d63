//! Server-Sent Events decoding and conversion into text fragment streams.

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use futures_util::StreamExt;

use crate::error::LLMError;
use crate::http::HttpBodyStream;
use crate::provider::ChatStream;

/// One decoded SSE event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// `data:` payload, with the preceding `event:` name when the server sent one.
    Data { event: Option<String>, data: String },
    /// Terminal `[DONE]` marker.
    Done,
}

/// Splits a raw HTTP body into [`StreamEvent`] values.
pub struct StreamDecoder {
    body: HttpBodyStream,
    buffer: Vec<u8>,
    event_name: Option<String>,
    data_lines: Vec<Vec<u8>>,
    pending: VecDeque<Result<StreamEvent, LLMError>>,
    provider: &'static str,
    body_closed: bool,
    done_received: bool,
}

impl StreamDecoder {
    pub fn new(body: HttpBodyStream, provider: &'static str) -> Self {
        Self {
            body,
            buffer: Vec::new(),
            event_name: None,
            data_lines: Vec::new(),
            pending: VecDeque::new(),
            provider,
            body_closed: false,
            done_received: false,
        }
    }

    fn handle_line(&mut self, line: &[u8]) {
        if let Some(rest) = line.strip_prefix(b"data:") {
            self.data_lines.push(strip_leading_space(rest).to_vec());
        } else if let Some(rest) = line.strip_prefix(b"event:") {
            self.event_name = Some(String::from_utf8_lossy(strip_leading_space(rest)).into_owned());
        }
        // `id:`, `retry:` and `:` comment lines carry nothing we need.
    }

    fn flush_event(&mut self) -> Result<(), LLMError> {
        let event = self.event_name.take();
        if self.data_lines.is_empty() {
            return Ok(());
        }

        let joined = self.data_lines.drain(..).collect::<Vec<_>>().join(&b'\n');
        if joined.is_empty() {
            return Ok(());
        }

        let data = String::from_utf8(joined).map_err(|err| {
            LLMError::provider(self.provider, format!("invalid UTF-8 in stream chunk: {err}"))
        })?;

        if data.trim() == "[DONE]" {
            if !self.done_received {
                self.done_received = true;
                self.pending.push_back(Ok(StreamEvent::Done));
            }
        } else {
            self.pending.push_back(Ok(StreamEvent::Data { event, data }));
        }
        Ok(())
    }

    fn drain_line(buffer: &mut Vec<u8>) -> Option<Vec<u8>> {
        buffer.iter().position(|b| *b == b'\n').map(|pos| {
            let mut line: Vec<u8> = buffer.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            line
        })
    }

    fn consume_buffer(&mut self) -> Result<(), LLMError> {
        while let Some(line) = Self::drain_line(&mut self.buffer) {
            if line.is_empty() {
                self.flush_event()?;
            } else {
                self.handle_line(&line);
            }
        }
        Ok(())
    }
}

fn strip_leading_space(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(b" ").unwrap_or(bytes)
}

impl Stream for StreamDecoder {
    type Item = Result<StreamEvent, LLMError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if let Some(event) = this.pending.pop_front() {
                return Poll::Ready(Some(event));
            }
            if this.done_received || this.body_closed {
                return Poll::Ready(None);
            }

            match this.body.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    this.buffer.extend_from_slice(&bytes);
                    if let Err(err) = this.consume_buffer() {
                        return Poll::Ready(Some(Err(err)));
                    }
                }
                Poll::Ready(Some(Err(err))) => return Poll::Ready(Some(Err(err))),
                Poll::Ready(None) => {
                    this.body_closed = true;
                    // A server may close without the trailing blank line.
                    if !this.buffer.is_empty() {
                        let line = std::mem::take(&mut this.buffer);
                        this.handle_line(&line);
                    }
                    if let Err(err) = this.flush_event() {
                        return Poll::Ready(Some(Err(err)));
                    }
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// What a vendor-specific parser makes of one SSE payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Frame {
    /// New output text.
    Text(String),
    /// Structural or control event without text.
    Skip,
    /// Vendor signalled the end of the message.
    Stop,
}

pub(crate) type FrameParser = fn(Option<&str>, &str, &'static str) -> Result<Frame, LLMError>;

/// Wraps an SSE body into a [`ChatStream`] of text fragments.
///
/// The stream ends on `[DONE]`, on [`Frame::Stop`], on the first error, or when the body
/// closes. Dropping it drops the body and releases the connection.
pub(crate) fn text_stream(
    body: HttpBodyStream,
    provider: &'static str,
    parser: FrameParser,
) -> ChatStream {
    Box::pin(TextStream {
        decoder: StreamDecoder::new(body, provider),
        parser,
        provider,
        finished: false,
    })
}

struct TextStream {
    decoder: StreamDecoder,
    parser: FrameParser,
    provider: &'static str,
    finished: bool,
}

impl Stream for TextStream {
    type Item = Result<String, LLMError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(None);
        }

        loop {
            let event = match this.decoder.poll_next_unpin(cx) {
                Poll::Ready(Some(Ok(event))) => event,
                Poll::Ready(Some(Err(err))) => {
                    this.finished = true;
                    return Poll::Ready(Some(Err(err)));
                }
                Poll::Ready(None) => {
                    this.finished = true;
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            };

            let (event, data) = match event {
                StreamEvent::Data { event, data } => (event, data),
                StreamEvent::Done => {
                    this.finished = true;
                    return Poll::Ready(None);
                }
            };

            match (this.parser)(event.as_deref(), &data, this.provider) {
                Ok(Frame::Text(text)) if !text.is_empty() => return Poll::Ready(Some(Ok(text))),
                Ok(Frame::Text(_)) | Ok(Frame::Skip) => continue,
                Ok(Frame::Stop) => {
                    this.finished = true;
                    return Poll::Ready(None);
                }
                Err(err) => {
                    this.finished = true;
                    return Poll::Ready(Some(Err(err)));
                }
            }
        }
    }
}

/// Concatenates every fragment of a stream, stopping at the first error.
///
/// # Examples
///
/// ```
/// # use llm_switchboard::stream::collect_text;
/// # use llm_switchboard::ChatStream;
/// # use futures_util::stream;
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let fragments: ChatStream = Box::pin(stream::iter(vec![Ok("Hel".to_string()), Ok("lo".to_string())]));
/// assert_eq!(collect_text(fragments).await.unwrap(), "Hello");
/// # });
/// ```
pub async fn collect_text(mut stream: ChatStream) -> Result<String, LLMError> {
    let mut text = String::new();
    while let Some(fragment) = stream.next().await {
        text.push_str(&fragment?);
    }
    Ok(text)
}
