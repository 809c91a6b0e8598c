// SPDX-FileCopyrightText: 2026 WADI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SSE parser for streaming chat completions.
//!
//! Converts a reqwest response byte stream into non-empty text fragments
//! using the `eventsource-stream` crate for SSE protocol compliance. The
//! stream ends at the `[DONE]` sentinel or when the body closes.

use eventsource_stream::Eventsource;
use futures::future;
use futures::stream::StreamExt;
use wadi_core::{TextStream, WadiError};

use crate::types::{ApiErrorResponse, ChatCompletionChunk};

/// Sentinel payload marking the end of an OpenAI stream.
const DONE_SENTINEL: &str = "[DONE]";

/// One decoded `data:` frame.
#[derive(Debug, PartialEq)]
enum Frame {
    Text(String),
    Empty,
    Done,
}

/// Decodes one `data:` payload.
fn decode_frame(data: &str) -> Result<Frame, WadiError> {
    let data = data.trim();
    if data == DONE_SENTINEL {
        return Ok(Frame::Done);
    }
    if data.is_empty() {
        return Ok(Frame::Empty);
    }

    // Errors can arrive mid-stream as an error envelope.
    if let Ok(api_err) = serde_json::from_str::<ApiErrorResponse>(data) {
        return Err(WadiError::Provider {
            message: format!("provider stream error: {}", api_err.error.message),
            retryable: api_err.error.type_.as_deref() == Some("rate_limit_exceeded"),
            source: None,
        });
    }

    let chunk: ChatCompletionChunk =
        serde_json::from_str(data).map_err(|e| WadiError::Provider {
            message: format!("failed to parse stream chunk: {e}"),
            retryable: false,
            source: Some(Box::new(e)),
        })?;

    let text: String = chunk
        .choices
        .into_iter()
        .filter_map(|c| c.delta.content)
        .collect();
    if text.is_empty() {
        Ok(Frame::Empty)
    } else {
        Ok(Frame::Text(text))
    }
}

/// Parses a streaming chat-completion response into text fragments.
///
/// Role-only and finish frames are skipped, so every yielded item is a
/// non-empty string. The first error terminates the stream.
pub fn parse_chat_stream(response: reqwest::Response) -> TextStream {
    let frames = response.bytes_stream().eventsource().map(|result| match result {
        Ok(event) => decode_frame(&event.data),
        Err(e) => Err(WadiError::Provider {
            message: format!("SSE stream error: {e}"),
            retryable: false,
            source: None,
        }),
    });

    let mut failed = false;
    let texts = frames
        .take_while(move |frame| {
            let keep = !failed && !matches!(frame, Ok(Frame::Done));
            if frame.is_err() {
                failed = true;
                return future::ready(true);
            }
            future::ready(keep)
        })
        .filter_map(|frame| {
            future::ready(match frame {
                Ok(Frame::Text(text)) => Some(Ok(text)),
                Ok(Frame::Empty) | Ok(Frame::Done) => None,
                Err(e) => Some(Err(e)),
            })
        });

    Box::pin(texts)
}
