//! Chat orchestration: one prompt/reply exchange against the endpoint
//!
//! The orchestrator owns the outbound message assembly, the request time
//! bound, the reply splitting, and the failure-to-sentinel mapping. It never
//! touches storage; persisting the exchange is the caller's job, which keeps
//! it testable against any `ChatEndpoint`.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use stembot_core::session::{Message, Role};
use stembot_providers::{ChatEndpoint, Message as WireMessage, ProviderError};

use crate::splitter::split_reply;

/// Sentinel answer when the request exceeded its time bound
pub const TIMEOUT_ANSWER: &str = "Sorry, the request to the model server timed out.";
/// Sentinel answer when the endpoint could not be reached
pub const CONNECTION_ANSWER: &str = "Sorry, there was a problem reaching the model server.";
/// Sentinel answer when the response body was not JSON
pub const MALFORMED_ANSWER: &str =
    "Sorry, the response from the model server was not in the expected format.";
/// Sentinel answer when the response JSON was missing the expected fields
pub const STRUCTURE_ANSWER: &str =
    "Sorry, the response from the model server was missing the expected data.";

/// How a single exchange ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeOutcome {
    Succeeded,
    TimedOut,
    ConnectionFailed,
    ServerError,
    MalformedResponse,
    UnexpectedStructure,
}

impl ExchangeOutcome {
    /// True when a real model answer came back
    pub fn is_success(&self) -> bool {
        matches!(self, ExchangeOutcome::Succeeded)
    }
}

/// Result of one prompt/reply exchange.
///
/// Failures arrive here too: the answer is then a sentinel string and the
/// outcome records the classification. Callers never see an error.
#[derive(Debug, Clone)]
pub struct Exchange {
    /// User-facing answer (real or sentinel)
    pub answer: String,
    /// Separated reasoning text; empty when none was found
    pub reasoning: String,
    /// Wall-clock duration from request start to completion
    pub elapsed_seconds: f64,
    /// Outcome classification
    pub outcome: ExchangeOutcome,
}

impl Exchange {
    /// The assistant message to append to history
    pub fn to_message(&self) -> Message {
        let reasoning = if self.reasoning.is_empty() {
            None
        } else {
            Some(self.reasoning.clone())
        };
        Message::assistant(self.answer.clone(), reasoning, Some(self.elapsed_seconds))
    }
}

/// Drives single exchanges against a chat endpoint
pub struct ChatOrchestrator {
    endpoint: Arc<dyn ChatEndpoint>,
    request_timeout: Duration,
}

impl ChatOrchestrator {
    /// Create a new orchestrator with a fixed per-request time bound
    pub fn new(endpoint: Arc<dyn ChatEndpoint>, request_timeout: Duration) -> Self {
        Self {
            endpoint,
            request_timeout,
        }
    }

    /// Send one prompt with the given history and return the exchange.
    ///
    /// The prompt is appended to the outbound list unless the last history
    /// entry is already that exact user message (guard against
    /// double-submission). No retries are made; the caller may re-invoke.
    pub async fn send(
        &self,
        prompt: &str,
        history: &[Message],
        model: Option<String>,
    ) -> Exchange {
        let mut outbound: Vec<WireMessage> = history
            .iter()
            .map(|msg| WireMessage {
                role: msg.role.as_str().to_string(),
                content: msg.content.clone(),
            })
            .collect();

        let prompt_is_last = history
            .last()
            .map(|msg| msg.role == Role::User && msg.content == prompt)
            .unwrap_or(false);
        if !prompt_is_last {
            outbound.push(WireMessage::user(prompt));
        }

        debug!("Sending {} messages to the model endpoint", outbound.len());

        let started = Instant::now();
        let result = tokio::time::timeout(
            self.request_timeout,
            self.endpoint.chat(outbound, model),
        )
        .await;
        let elapsed_seconds = started.elapsed().as_secs_f64();

        match result {
            Ok(Ok(reply)) => {
                let split = split_reply(&reply.content);
                Exchange {
                    answer: split.answer,
                    reasoning: split.reasoning,
                    elapsed_seconds,
                    outcome: ExchangeOutcome::Succeeded,
                }
            }
            Ok(Err(err)) => failed_exchange(err, elapsed_seconds),
            Err(_) => {
                warn!(
                    "Model request exceeded its {:.0}s bound",
                    self.request_timeout.as_secs_f64()
                );
                Exchange {
                    answer: TIMEOUT_ANSWER.to_string(),
                    reasoning: String::new(),
                    elapsed_seconds,
                    outcome: ExchangeOutcome::TimedOut,
                }
            }
        }
    }
}

fn failed_exchange(err: ProviderError, elapsed_seconds: f64) -> Exchange {
    let (answer, outcome) = match err {
        ProviderError::Http(e) if e.is_timeout() => {
            warn!("Model request timed out in transport: {}", e);
            (TIMEOUT_ANSWER.to_string(), ExchangeOutcome::TimedOut)
        }
        ProviderError::Http(e) => {
            warn!("Failed to reach the model endpoint: {}", e);
            (
                CONNECTION_ANSWER.to_string(),
                ExchangeOutcome::ConnectionFailed,
            )
        }
        ProviderError::Api { status, detail } => {
            warn!("Model endpoint returned HTTP {}: {}", status, detail);
            (
                format!(
                    "Sorry, the model server returned an error (HTTP {}): {}",
                    status, detail
                ),
                ExchangeOutcome::ServerError,
            )
        }
        ProviderError::MalformedBody(e) => {
            warn!("Model response body was not JSON: {}", e);
            (
                MALFORMED_ANSWER.to_string(),
                ExchangeOutcome::MalformedResponse,
            )
        }
        ProviderError::UnexpectedStructure(e) => {
            warn!("Model response was missing expected fields: {}", e);
            (
                STRUCTURE_ANSWER.to_string(),
                ExchangeOutcome::UnexpectedStructure,
            )
        }
    };

    Exchange {
        answer,
        reasoning: String::new(),
        elapsed_seconds,
        outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use stembot_providers::{ChatReply, OllamaClient, ProviderResult};

    enum Behavior {
        Reply(&'static str),
        Hang(Duration),
        ApiError(u16, &'static str),
        Malformed,
        MissingFields,
    }

    struct StubEndpoint {
        behavior: Behavior,
        seen: Mutex<Vec<Vec<WireMessage>>>,
    }

    impl StubEndpoint {
        fn new(behavior: Behavior) -> Self {
            Self {
                behavior,
                seen: Mutex::new(Vec::new()),
            }
        }

        fn last_request_len(&self) -> usize {
            self.seen.lock().unwrap().last().map(Vec::len).unwrap_or(0)
        }
    }

    #[async_trait]
    impl ChatEndpoint for StubEndpoint {
        async fn chat(
            &self,
            messages: Vec<WireMessage>,
            _model: Option<String>,
        ) -> ProviderResult<ChatReply> {
            self.seen.lock().unwrap().push(messages);
            match &self.behavior {
                Behavior::Reply(content) => Ok(ChatReply {
                    content: content.to_string(),
                }),
                Behavior::Hang(duration) => {
                    tokio::time::sleep(*duration).await;
                    Ok(ChatReply {
                        content: "too late".to_string(),
                    })
                }
                Behavior::ApiError(status, detail) => Err(ProviderError::Api {
                    status: *status,
                    detail: detail.to_string(),
                }),
                Behavior::Malformed => {
                    Err(ProviderError::MalformedBody("expected value".to_string()))
                }
                Behavior::MissingFields => Err(ProviderError::UnexpectedStructure(
                    "response has no message content".to_string(),
                )),
            }
        }

        async fn list_models(&self) -> Vec<String> {
            Vec::new()
        }

        fn default_model(&self) -> String {
            "stub".to_string()
        }
    }

    fn orchestrator_with(
        behavior: Behavior,
        timeout: Duration,
    ) -> (ChatOrchestrator, Arc<StubEndpoint>) {
        let endpoint = Arc::new(StubEndpoint::new(behavior));
        (
            ChatOrchestrator::new(endpoint.clone(), timeout),
            endpoint,
        )
    }

    #[tokio::test]
    async fn test_successful_exchange_splits_reasoning() {
        let (orchestrator, _) = orchestrator_with(
            Behavior::Reply("<think>step one</think>Final answer."),
            Duration::from_secs(5),
        );

        let exchange = orchestrator.send("question", &[], None).await;

        assert!(exchange.outcome.is_success());
        assert_eq!(exchange.answer, "Final answer.");
        assert_eq!(exchange.reasoning, "step one");
        assert!(exchange.elapsed_seconds >= 0.0);
    }

    #[tokio::test]
    async fn test_prompt_appended_to_history() {
        let (orchestrator, endpoint) =
            orchestrator_with(Behavior::Reply("ok"), Duration::from_secs(5));

        let history = vec![Message::user("earlier"), Message::assistant("sure", None, None)];
        orchestrator.send("new question", &history, None).await;

        assert_eq!(endpoint.last_request_len(), 3);
    }

    #[tokio::test]
    async fn test_duplicate_prompt_not_appended_twice() {
        let (orchestrator, endpoint) =
            orchestrator_with(Behavior::Reply("ok"), Duration::from_secs(5));

        let history = vec![Message::user("same question")];
        orchestrator.send("same question", &history, None).await;

        assert_eq!(endpoint.last_request_len(), 1);
    }

    #[tokio::test]
    async fn test_timeout_returns_sentinel_within_bound() {
        let (orchestrator, _) = orchestrator_with(
            Behavior::Hang(Duration::from_secs(30)),
            Duration::from_millis(50),
        );

        let exchange = orchestrator.send("question", &[], None).await;

        assert_eq!(exchange.outcome, ExchangeOutcome::TimedOut);
        assert_eq!(exchange.answer, TIMEOUT_ANSWER);
        assert!(!exchange.answer.is_empty());
        // Elapsed time tracks the bound, not the hanging request
        assert!(exchange.elapsed_seconds >= 0.05);
        assert!(exchange.elapsed_seconds < 5.0);
    }

    #[tokio::test]
    async fn test_server_error_embeds_detail() {
        let (orchestrator, _) = orchestrator_with(
            Behavior::ApiError(404, "model 'missing' not found"),
            Duration::from_secs(5),
        );

        let exchange = orchestrator.send("question", &[], None).await;

        assert_eq!(exchange.outcome, ExchangeOutcome::ServerError);
        assert!(exchange.answer.contains("model 'missing' not found"));
        assert!(exchange.answer.contains("404"));
        assert!(exchange.reasoning.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_body_classification() {
        let (orchestrator, _) =
            orchestrator_with(Behavior::Malformed, Duration::from_secs(5));
        let exchange = orchestrator.send("question", &[], None).await;
        assert_eq!(exchange.outcome, ExchangeOutcome::MalformedResponse);
        assert_eq!(exchange.answer, MALFORMED_ANSWER);
    }

    #[tokio::test]
    async fn test_missing_fields_classification() {
        let (orchestrator, _) =
            orchestrator_with(Behavior::MissingFields, Duration::from_secs(5));
        let exchange = orchestrator.send("question", &[], None).await;
        assert_eq!(exchange.outcome, ExchangeOutcome::UnexpectedStructure);
        assert_eq!(exchange.answer, STRUCTURE_ANSWER);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_connection_failure() {
        // Nothing listens on this port
        let endpoint = Arc::new(OllamaClient::new(
            "http://127.0.0.1:9",
            "llama3",
            Duration::from_secs(1),
        ));
        let orchestrator = ChatOrchestrator::new(endpoint, Duration::from_secs(5));

        let exchange = orchestrator.send("question", &[], None).await;

        assert_eq!(exchange.outcome, ExchangeOutcome::ConnectionFailed);
        assert_eq!(exchange.answer, CONNECTION_ANSWER);
    }

    #[tokio::test]
    async fn test_to_message_carries_reasoning_and_elapsed() {
        let (orchestrator, _) = orchestrator_with(
            Behavior::Reply("<think>why</think>because"),
            Duration::from_secs(5),
        );

        let exchange = orchestrator.send("question", &[], None).await;
        let message = exchange.to_message();

        assert_eq!(message.role, Role::Assistant);
        assert_eq!(message.content, "because");
        assert_eq!(message.reasoning.as_deref(), Some("why"));
        assert!(message.elapsed_seconds.is_some());
    }

    #[tokio::test]
    async fn test_sentinel_message_has_no_reasoning() {
        let (orchestrator, _) =
            orchestrator_with(Behavior::Malformed, Duration::from_secs(5));
        let exchange = orchestrator.send("question", &[], None).await;
        let message = exchange.to_message();
        assert!(message.reasoning.is_none());
    }
}
