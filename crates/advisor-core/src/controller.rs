//! Chat turn controller
//!
//! Owns the lifecycle of one submitted message: read the input, show the
//! user's text and a "Thinking..." placeholder, lock the input, call the
//! worker once, interpret whatever comes back and show exactly one assistant
//! message. Every way out of a turn removes the placeholder and unlocks the
//! input again.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, error, info, warn};

use crate::client::{CompletionTransport, WorkerResponse};
use crate::persona::{SYSTEM_PROMPT, THINKING_PLACEHOLDER};
use crate::render::add_message;
use crate::state::ChatRole;
use crate::surface::{ChatSurface, EntryHandle};
use crate::wire::{ChatRequest, Envelope};

pub const MALFORMED_BODY_MESSAGE: &str =
    "Unexpected response format from the worker. Check browser console for details.";
pub const MISSING_REPLY_MESSAGE: &str = "Sorry, I couldn't get a response.";
pub const TRANSPORT_FAILURE_MESSAGE: &str = "Sorry, something went wrong. Please try again later.";

/// How a submission ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Empty or whitespace-only input; nothing happened.
    Ignored,
    /// Another turn was still in flight; nothing happened.
    Busy,
    /// The worker replied with text.
    Replied,
    /// 2xx response without a usable completion.
    MissingReply,
    /// Non-2xx HTTP status.
    HttpFailure { status: u16 },
    /// 2xx response whose body is not valid JSON.
    MalformedBody,
    /// The worker returned an error object.
    ServiceError { code: String },
    /// No usable exchange: no HTTP response, the body read timed out, or the
    /// reply content was not text.
    TransportFailure,
}

impl TurnOutcome {
    /// Whether the submission produced a turn at all.
    pub fn is_turn(&self) -> bool {
        !matches!(self, TurnOutcome::Ignored | TurnOutcome::Busy)
    }
}

/// Drives chat turns against a worker transport.
///
/// Cloning is cheap and clones share the in-flight flag, so a clone handed
/// to a background task still rejects overlapping submissions.
pub struct ChatTurnController<T> {
    transport: Arc<T>,
    system_prompt: String,
    in_flight: Arc<AtomicBool>,
}

impl<T> Clone for ChatTurnController<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            system_prompt: self.system_prompt.clone(),
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

/// Clears the in-flight flag when the turn ends, however it ends.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn lock<S: ?Sized>(surface: &Mutex<S>) -> MutexGuard<'_, S> {
    surface.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<T: CompletionTransport> ChatTurnController<T> {
    pub fn new(transport: T) -> Self {
        Self::with_system_prompt(transport, SYSTEM_PROMPT)
    }

    pub fn with_system_prompt(transport: T, system_prompt: &str) -> Self {
        Self {
            transport: Arc::new(transport),
            system_prompt: system_prompt.to_string(),
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Submit whatever is in the surface's input control as one turn.
    ///
    /// The surface lock is only held between awaits, never across the
    /// network call, so a front end can keep drawing while the turn runs.
    pub async fn submit<S>(&self, surface: &Mutex<S>) -> TurnOutcome
    where
        S: ChatSurface + ?Sized,
    {
        let user_text = lock(surface).input_text().trim().to_string();
        if user_text.is_empty() {
            return TurnOutcome::Ignored;
        }

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Submission ignored, a turn is already in flight");
            return TurnOutcome::Busy;
        }
        let _guard = InFlightGuard(&self.in_flight);

        let loader = {
            let mut s = lock(surface);
            add_message(&mut *s, ChatRole::User.label(), Some(user_text.as_str()));
            s.clear_input();
            s.set_input_enabled(false);
            add_message(&mut *s, ChatRole::Assistant.label(), Some(THINKING_PLACEHOLDER))
        };

        let request = ChatRequest::with_system_prompt(&self.system_prompt, &user_text);
        debug!(?request, "Sending request to worker");

        let outcome = match self.transport.send(&request).await {
            Ok(response) => {
                {
                    let mut s = lock(surface);
                    s.remove(loader);
                    s.set_input_enabled(true);
                }
                let (outcome, reply) = interpret(response).await;
                add_message(&mut *lock(surface), ChatRole::Assistant.label(), Some(reply.as_str()));
                outcome
            }
            Err(err) => {
                let mut s = lock(surface);
                release(&mut *s, loader);
                error!(error = %err, "Fetch error");
                add_message(&mut *s, ChatRole::Assistant.label(), Some(TRANSPORT_FAILURE_MESSAGE));
                TurnOutcome::TransportFailure
            }
        };

        info!(?outcome, "Chat turn finished");
        outcome
    }
}

/// Remove the placeholder and unlock the input after a transport failure.
/// A placeholder that is already gone is not an error.
fn release<S: ChatSurface + ?Sized>(surface: &mut S, loader: EntryHandle) {
    if !surface.remove(loader) {
        warn!("Loading placeholder was already removed");
    }
    surface.set_input_enabled(true);
}

/// Map a worker response to the outcome and the assistant text to show.
async fn interpret(response: WorkerResponse) -> (TurnOutcome, String) {
    let status = response.status;

    if !response.is_success() {
        let status_text = response.status_text.clone();
        let body = response.read_text().await.unwrap_or_default();
        error!(status, %status_text, %body, "Worker request failed");
        return (
            TurnOutcome::HttpFailure { status },
            format!("Error: {} {}", status, status_text),
        );
    }

    let raw = match response.read_text().await {
        Ok(raw) => raw,
        Err(err) if err.is_timeout() => {
            error!(error = %err, "Timed out reading worker response body");
            return (TurnOutcome::TransportFailure, TRANSPORT_FAILURE_MESSAGE.to_string());
        }
        Err(err) => {
            warn!(error = %err, "Could not read worker response body");
            String::new()
        }
    };
    debug!(%raw, "Worker raw response");

    let data = if raw.is_empty() {
        None
    } else {
        match serde_json::from_str::<serde_json::Value>(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                error!(error = %err, %raw, "Failed to parse worker JSON response");
                return (TurnOutcome::MalformedBody, MALFORMED_BODY_MESSAGE.to_string());
            }
        }
    };

    match Envelope::interpret(data.as_ref()) {
        Envelope::ServiceError { code, message } => {
            let payload = data.as_ref().and_then(|d| d.get("error"));
            error!(?payload, "API returned error payload");
            let text = format!("Error ({}): {}", code, message);
            (TurnOutcome::ServiceError { code }, text)
        }
        Envelope::Reply(content) => (TurnOutcome::Replied, content),
        Envelope::NonTextContent => {
            error!(data = ?data, "Worker reply content is not text");
            (TurnOutcome::TransportFailure, TRANSPORT_FAILURE_MESSAGE.to_string())
        }
        Envelope::Missing => {
            warn!(data = ?data, "Missing choices in worker response");
            (TurnOutcome::MissingReply, MISSING_REPLY_MESSAGE.to_string())
        }
    }
}
