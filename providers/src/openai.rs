use serde::{Deserialize, Serialize};
use shorten_types::ChatMessage;

use crate::{
    ApiConfig, ApiConfigError, RewriteError, RewriteRequest, Rewriter, http_client,
    read_capped_error_body,
    retry::{RetryConfig, RetryOutcome, send_with_retry},
};

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f64,
    top_p: f64,
    presence_penalty: f64,
    frequency_penalty: f64,
}

impl<'a> From<&RewriteRequest<'a>> for ChatCompletionRequest<'a> {
    fn from(request: &RewriteRequest<'a>) -> Self {
        Self {
            model: request.model,
            messages: request.messages,
            temperature: request.sampling.temperature,
            top_p: request.sampling.top_p,
            presence_penalty: request.sampling.presence_penalty,
            frequency_penalty: request.sampling.frequency_penalty,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

/// [`Rewriter`] backed by the OpenAI Chat Completions API.
#[derive(Debug, Clone)]
pub struct OpenAIRewriter {
    client: reqwest::Client,
    endpoint: String,
    auth_header: String,
    retry: RetryConfig,
}

impl OpenAIRewriter {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiConfigError> {
        Ok(Self {
            client: http_client(config)?,
            endpoint: config.chat_completions_url(),
            auth_header: format!("Bearer {}", config.api_key()),
            retry: config.retry().clone(),
        })
    }

    fn extract_content(body: &[u8]) -> Result<String, RewriteError> {
        let parsed: ChatCompletionResponse =
            serde_json::from_slice(body).map_err(|e| RewriteError::Fatal {
                message: format!("malformed completion response: {e}"),
            })?;

        if let Some(usage) = &parsed.usage {
            tracing::debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Completion usage"
            );
        }

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| RewriteError::Fatal {
                message: "completion response contained no choices".to_string(),
            })?;

        if choice.finish_reason.as_deref() == Some("length") {
            tracing::warn!("Completion stopped at the model's length limit; output may be cut short");
        }

        choice.message.content.ok_or_else(|| RewriteError::Fatal {
            message: "completion response contained no message content".to_string(),
        })
    }
}

impl Rewriter for OpenAIRewriter {
    async fn rewrite(&self, request: &RewriteRequest<'_>) -> Result<String, RewriteError> {
        let body = ChatCompletionRequest::from(request);

        let outcome = send_with_retry(
            || {
                self.client
                    .post(&self.endpoint)
                    .header("Authorization", &self.auth_header)
                    .header("content-type", "application/json")
                    .json(&body)
            },
            &self.retry,
        )
        .await;

        match outcome {
            RetryOutcome::Success(response) => {
                let bytes = response.bytes().await.map_err(|e| RewriteError::Fatal {
                    message: format!("failed to read completion response: {e}"),
                })?;
                Self::extract_content(&bytes)
            }
            RetryOutcome::HttpError {
                response,
                attempts,
                transient,
            } => {
                let status = response.status();
                let error_text = read_capped_error_body(response).await;
                let message = format!("API error {status}: {error_text}");
                if transient {
                    Err(RewriteError::Transient { attempts, message })
                } else {
                    Err(RewriteError::Fatal { message })
                }
            }
            RetryOutcome::ConnectionError {
                attempts,
                transient,
                source,
            } => {
                let message = format!("request to completion endpoint failed: {source}");
                if transient {
                    Err(RewriteError::Transient { attempts, message })
                } else {
                    Err(RewriteError::Fatal { message })
                }
            }
        }
    }
}
