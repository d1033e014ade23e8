//! Answer generation: the opaque text-generation boundary and the sanitized
//! streaming pipeline on top of it.
//!
//! * [`prompt`] — the retrieval-augmented prompt template.
//! * [`http`] — HTTP client for a text-generation inference endpoint.
//! * [`AnswerStreamer`] — truncates the model's fragment stream at the
//!   first end-of-turn marker and converts mid-stream failures into a
//!   single in-band error fragment.

pub mod http;
pub mod prompt;

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream::BoxStream;

use crate::config::END_OF_TURN;
use crate::types::RagError;

pub use http::HttpGenerator;
pub use prompt::format_rag_prompt;

/// Boundary to an external text-generation service.
#[async_trait]
pub trait GenerationModel: Send + Sync {
    /// Runs a prompt to completion and returns the full response text.
    async fn complete(&self, prompt: &str) -> Result<String, RagError>;

    /// Streams response fragments for a prompt.
    async fn stream(
        &self,
        prompt: &str,
    ) -> Result<BoxStream<'static, Result<String, RagError>>, RagError>;
}

/// Streams sanitized answer fragments for a query grounded in retrieved
/// context.
pub struct AnswerStreamer {
    model: Arc<dyn GenerationModel>,
}

impl AnswerStreamer {
    pub fn new(model: Arc<dyn GenerationModel>) -> Self {
        Self { model }
    }

    /// Produces a finite, non-restartable fragment stream.
    ///
    /// Output ends at the first end-of-turn marker (marker excluded, later
    /// fragments never yielded, a marker split across fragment boundaries is
    /// still caught). A service failure — at connect time or mid-stream —
    /// ends the stream after one in-band `{"error": …}` fragment instead of
    /// crossing the streaming boundary as an error.
    pub fn stream(&self, query: &str, context: &str) -> BoxStream<'static, String> {
        let prompt = prompt::format_rag_prompt(query, context);
        let model = Arc::clone(&self.model);

        let output = async_stream::stream! {
            let mut fragments = match model.stream(&prompt).await {
                Ok(fragments) => fragments,
                Err(err) => {
                    yield error_fragment(&err);
                    return;
                }
            };

            let mut guard = EndOfTurnGuard::new();
            while let Some(item) = fragments.next().await {
                match item {
                    Ok(fragment) => {
                        if let Some(text) = guard.push(&fragment) {
                            yield text;
                        }
                        if guard.is_done() {
                            return;
                        }
                    }
                    Err(err) => {
                        yield error_fragment(&err);
                        return;
                    }
                }
            }
            if let Some(tail) = guard.finish() {
                yield tail;
            }
        };
        output.boxed()
    }
}

/// In-band terminal error payload, kept as JSON so transports can forward
/// it verbatim.
pub(crate) fn error_fragment(err: &RagError) -> String {
    serde_json::json!({ "error": err.to_string() }).to_string()
}

/// Truncates a fragment stream at the first end-of-turn marker.
///
/// The marker may arrive split across fragment boundaries, so up to
/// `marker.len() - 1` trailing bytes are held back until the next fragment
/// proves they are not a marker prefix; [`finish`](Self::finish) flushes the
/// held-back tail when the stream ends without a marker.
struct EndOfTurnGuard {
    marker: &'static str,
    carry: String,
    done: bool,
}

impl EndOfTurnGuard {
    fn new() -> Self {
        Self {
            marker: END_OF_TURN,
            carry: String::new(),
            done: false,
        }
    }

    /// Feeds one fragment; returns text safe to yield, if any.
    fn push(&mut self, fragment: &str) -> Option<String> {
        if self.done {
            return None;
        }
        self.carry.push_str(fragment);

        if let Some(pos) = self.carry.find(self.marker) {
            self.done = true;
            let head = self.carry[..pos].to_string();
            self.carry.clear();
            return (!head.is_empty()).then_some(head);
        }

        let keep = longest_marker_prefix(&self.carry, self.marker);
        let emit_len = self.carry.len() - keep;
        if emit_len == 0 {
            return None;
        }
        let emitted: String = self.carry.drain(..emit_len).collect();
        Some(emitted)
    }

    /// Flushes any held-back tail once the underlying stream ends.
    fn finish(&mut self) -> Option<String> {
        if self.done || self.carry.is_empty() {
            return None;
        }
        Some(std::mem::take(&mut self.carry))
    }

    fn is_done(&self) -> bool {
        self.done
    }
}

/// Length in bytes of the longest suffix of `text` that is a proper prefix
/// of `marker`.
fn longest_marker_prefix(text: &str, marker: &str) -> usize {
    let max = marker.len().saturating_sub(1).min(text.len());
    for len in (1..=max).rev() {
        if !text.is_char_boundary(text.len() - len) {
            continue;
        }
        if marker.as_bytes().starts_with(&text.as_bytes()[text.len() - len..]) {
            return len;
        }
    }
    0
}
