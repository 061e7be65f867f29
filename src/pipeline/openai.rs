use crate::error::ExternalError;
use crate::pipeline::traits::{Prompt, TextGenerator};
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use std::time::Duration;

/// Chat-completion backed generator. Deterministic sampling, one reply per prompt.
pub struct OpenAiGenerator {
    client: Client<OpenAIConfig>,
    model: String,
    timeout: Duration,
}

impl OpenAiGenerator {
    pub fn new(api_key: &str, model: &str, api_base: Option<&str>, timeout: Duration) -> Self {
        let mut config = OpenAIConfig::new().with_api_key(api_key);
        if let Some(base) = api_base {
            config = config.with_api_base(base);
        }
        Self {
            client: Client::with_config(config),
            model: model.to_string(),
            timeout,
        }
    }

    async fn complete(&self, prompt: &Prompt) -> Result<String, OpenAIError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .temperature(0.0)
            .messages([
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(prompt.system.as_str())
                    .build()?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(prompt.user.as_str())
                    .build()?
                    .into(),
            ])
            .build()?;

        let response = self.client.chat().create(request).await?;
        Ok(response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }
}

fn classify(err: OpenAIError) -> ExternalError {
    match err {
        OpenAIError::Reqwest(e) => ExternalError::from(e),
        OpenAIError::ApiError(api) => {
            let kind = api.r#type.clone().unwrap_or_default().to_lowercase();
            let message = api.message.to_lowercase();
            if kind.contains("rate") || kind.contains("quota") || message.contains("rate limit")
            {
                ExternalError::Quota(api.message)
            } else if kind.contains("server") || message.contains("overloaded") {
                ExternalError::Transient(api.message)
            } else {
                ExternalError::Permanent(api.message)
            }
        }
        OpenAIError::JSONDeserialize(e) => ExternalError::Malformed(e.to_string()),
        other => ExternalError::Permanent(other.to_string()),
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    async fn generate(&self, prompt: &Prompt) -> Result<String, ExternalError> {
        let reply = tokio::time::timeout(self.timeout, self.complete(prompt))
            .await
            .map_err(|_| {
                ExternalError::Transient(format!("no completion within {:?}", self.timeout))
            })?
            .map_err(classify)?;
        if reply.trim().is_empty() {
            return Err(ExternalError::Malformed("completion had no content".to_string()));
        }
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn completion(content: &str) -> serde_json::Value {
        json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1_700_000_000,
            "model": "gpt-4o",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }]
        })
    }

    fn prompt() -> Prompt {
        Prompt {
            system: "You verify claims.".to_string(),
            user: "CLAIM: water is wet".to_string(),
        }
    }

    #[tokio::test]
    async fn returns_first_choice_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(json!({"model": "gpt-4o"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("{\"verdict\":\"TRUE\"}")))
            .expect(1)
            .mount(&server)
            .await;

        let generator =
            OpenAiGenerator::new("sk-test", "gpt-4o", Some(&server.uri()), Duration::from_secs(5));
        let reply = generator.generate(&prompt()).await.expect("reply");
        assert_eq!(reply, "{\"verdict\":\"TRUE\"}");
    }

    #[tokio::test]
    async fn empty_content_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("  ")))
            .mount(&server)
            .await;

        let generator =
            OpenAiGenerator::new("sk-test", "gpt-4o", Some(&server.uri()), Duration::from_secs(5));
        let err = generator.generate(&prompt()).await.expect_err("blank reply");
        assert!(matches!(err, ExternalError::Malformed(_)));
    }

    #[tokio::test]
    async fn slow_backend_times_out_as_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion("late"))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let generator = OpenAiGenerator::new(
            "sk-test",
            "gpt-4o",
            Some(&server.uri()),
            Duration::from_millis(100),
        );
        let err = generator.generate(&prompt()).await.expect_err("timeout");
        assert!(matches!(err, ExternalError::Transient(_)));
    }
}
