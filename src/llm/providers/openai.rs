

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use super::base::{LlmMetadata, LlmProvider, LlmProviderError};

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    r#type: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

fn build_request(
    model: &str,
    temperature: f64,
    system_prompt: &str,
    user_prompt: &str,
    response_format: Option<&str>,
) -> ChatRequest {
    ChatRequest {
        model: model.to_string(),
        messages: vec![
            ChatMessage {
                role: "system".to_string(),
                content: Some(system_prompt.to_string()),
            },
            ChatMessage {
                role: "user".to_string(),
                content: Some(user_prompt.to_string()),
            },
        ],
        temperature,
        response_format: response_format.map(|f| ResponseFormat {
            r#type: f.to_string(),
        }),
    }
}

/// `choices[0].message.content`; absent or blank content is an error.
fn first_content(response: &ChatResponse) -> Result<String, LlmProviderError> {
    response
        .choices
        .first()
        .and_then(|c| c.message.content.as_deref())
        .filter(|c| !c.trim().is_empty())
        .map(str::to_string)
        .ok_or(LlmProviderError::EmptyContent)
}

fn error_body<E: std::fmt::Display>(body: Result<String, E>) -> String {
    body.unwrap_or_else(|e| format!("<unreadable body: {e}>"))
}

/// Client for any OpenAI-compatible `chat/completions` endpoint (OpenAI, Cerebras, Ollama).
pub struct ChatCompletionsProvider {
    provider: String,
    endpoint: Url,
    api_key: Option<String>,
    model: String,
    temperature: f64,
    client: Client,
}

impl ChatCompletionsProvider {

    pub fn new(
        provider: impl Into<String>,
        endpoint: Url,
        api_key: Option<String>,
        model: impl Into<String>,
        temperature: f64,
        timeout_secs: u64,
    ) -> Result<Self, LlmProviderError> {
        let provider = provider.into();
        let model = model.into();
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        info!(
            "Chat provider initialized (provider={}, model={}, endpoint={})",
            provider, model, endpoint
        );

        Ok(Self {
            provider,
            endpoint,
            api_key,
            model,
            temperature,
            client,
        })
    }
}

#[async_trait]
impl LlmProvider for ChatCompletionsProvider {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        response_format: Option<&str>,
    ) -> Result<(String, LlmMetadata), LlmProviderError> {
        let request = build_request(
            &self.model,
            self.temperature,
            system_prompt,
            user_prompt,
            response_format,
        );

        let mut builder = self.client.post(self.endpoint.clone()).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {key}"));
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = error_body(response.text().await);
            return Err(LlmProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let response = response.json::<ChatResponse>().await?;
        let content = first_content(&response)?;
        debug!("Received {} chars from {}", content.len(), self.provider);

        let mut metadata = LlmMetadata {
            provider: self.provider.clone(),
            model: self.model.clone(),
            base_url: Some(self.endpoint.to_string()),
            ..Default::default()
        };

        if let Some(usage) = response.usage {
            metadata.tokens_prompt = Some(usage.prompt_tokens);
            metadata.tokens_completion = Some(usage.completion_tokens);
            metadata.tokens_total = Some(usage.total_tokens);
        }

        Ok((content, metadata))
    }

    fn provider_name(&self) -> &str {
        &self.provider
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_matches_wire_contract() {
        let request = build_request("gpt-4o-mini", 0.3, "system text", "user text", Some("json_object"));
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "model": "gpt-4o-mini",
                "messages": [
                    {"role": "system", "content": "system text"},
                    {"role": "user", "content": "user text"}
                ],
                "temperature": 0.3,
                "response_format": {"type": "json_object"}
            })
        );
    }

    #[test]
    fn test_request_without_response_format() {
        let request = build_request("m", 0.3, "s", "u", None);
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("response_format").is_none());
    }

    #[test]
    fn test_first_content() {
        let response: ChatResponse = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": "{\"kind\":\"graph\"}"}}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        }))
        .unwrap();
        assert_eq!(first_content(&response).unwrap(), "{\"kind\":\"graph\"}");
    }

    #[test]
    fn test_missing_or_blank_content_is_error() {
        for body in [
            json!({"choices": []}),
            json!({}),
            json!({"choices": [{"message": {"role": "assistant", "content": null}}]}),
            json!({"choices": [{"message": {"role": "assistant", "content": "  "}}]}),
        ] {
            let response: ChatResponse = serde_json::from_value(body).unwrap();
            assert!(matches!(
                first_content(&response),
                Err(LlmProviderError::EmptyContent)
            ));
        }
    }

    #[test]
    fn test_status_error_carries_body() {
        let err = LlmProviderError::Status {
            status: 401,
            body: "{\"error\":\"invalid api key\"}".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "LLM service returned status 401: {\"error\":\"invalid api key\"}"
        );
    }

    #[test]
    fn test_error_body_marks_unreadable_payload() {
        assert_eq!(error_body::<String>(Ok("quota exceeded".to_string())), "quota exceeded");
        assert_eq!(
            error_body(Err("connection reset")),
            "<unreadable body: connection reset>"
        );
    }
}
