//! The completion validation step.
//!
//! Asks a model to generate a scenario for a user request, then validates
//! the generated YAML with the core validator.

use std::sync::Arc;
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use gptcog_core::{ResultLog, ResultRecord, StepOutcome, Validator};

use crate::config::RuntimeConfig;
use crate::prompts::generation_messages;
use crate::providers::{
    ChatMessage, CompletionConfig, CompletionResponse, LlmProvider, ProviderError, TokenUsage,
};
use crate::RuntimeError;

lazy_static! {
    static ref CODE_FENCE: Regex =
        Regex::new(r"(?s)^\s*```[A-Za-z0-9_-]*[ \t]*\r?\n(?P<body>.*?)\r?\n?\s*```\s*$").unwrap();
}

/// What the model was asked and what it answered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRecord {
    pub model: String,
    pub prompt: String,
    pub response: String,
    pub usage: TokenUsage,
    pub created: DateTime<Utc>,
}

/// Outcome of validating a generated scenario, with its record.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionValidation {
    pub outcome: StepOutcome,
    pub record: CompletionRecord,
}

/// Remove a Markdown code fence wrapped around the whole response.
pub fn strip_code_fence(response: &str) -> &str {
    match CODE_FENCE.captures(response).and_then(|caps| caps.name("body")) {
        Some(body) => body.as_str(),
        None => response,
    }
}

/// Generates a scenario with a completion provider and validates it.
pub struct CompletionValidationStep {
    provider: Arc<dyn LlmProvider>,
    config: RuntimeConfig,
    validator: Validator,
    result_log: Option<ResultLog>,
}

impl CompletionValidationStep {
    pub fn new(provider: Arc<dyn LlmProvider>, config: RuntimeConfig) -> Self {
        Self {
            provider,
            config,
            validator: Validator::default(),
            result_log: None,
        }
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_result_log(mut self, log: ResultLog) -> Self {
        self.result_log = Some(log);
        self
    }

    /// Generate a scenario for `prompt` with `model` and validate it.
    pub async fn execute(
        &self,
        model: &str,
        prompt: &str,
    ) -> Result<CompletionValidation, RuntimeError> {
        let messages = generation_messages(prompt);
        let completion_config = CompletionConfig {
            model: model.to_string(),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        tracing::info!(provider = self.provider.name(), model, "Requesting scenario completion");
        let response = self.complete_with_retry(&messages, &completion_config).await?;

        let yaml = strip_code_fence(&response.content);
        let result = self.validator.process(yaml);

        if let Some(log) = &self.result_log {
            if let Err(e) = log.append(&ResultRecord::new(&result, prompt, model, yaml)) {
                tracing::warn!(path = %log.path().display(), error = %e, "Failed to append result log");
            }
        }

        Ok(CompletionValidation {
            outcome: StepOutcome::from(result),
            record: CompletionRecord {
                model: model.to_string(),
                prompt: prompt.to_string(),
                response: response.content,
                usage: response.usage,
                created: Utc::now(),
            },
        })
    }

    /// Like [`execute`](Self::execute), with failures reported as
    /// [`StepOutcome::Error`].
    pub async fn run(&self, model: &str, prompt: &str) -> StepOutcome {
        match self.execute(model, prompt).await {
            Ok(validation) => validation.outcome,
            Err(e) => {
                tracing::error!(model, error = %e, "Completion validation failed");
                StepOutcome::Error(format!("Error: {}", e))
            }
        }
    }

    async fn complete_with_retry(
        &self,
        messages: &[ChatMessage],
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError> {
        let backoff = ExponentialBuilder::default()
            .with_min_delay(self.config.retry_delay)
            .with_max_times(self.config.max_retries);

        (|| self.attempt(messages, config))
            .retry(backoff)
            .when(ProviderError::is_retryable)
            .notify(|err: &ProviderError, delay: Duration| {
                tracing::warn!(error = %err, ?delay, "Retrying completion");
            })
            .await
    }

    async fn attempt(
        &self,
        messages: &[ChatMessage],
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError> {
        let timeout = self.config.request_timeout;
        match tokio::time::timeout(timeout, self.provider.complete(messages.to_vec(), config)).await
        {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use crate::prompts::SAMPLE_SCENARIO;

    struct ScriptedProvider {
        replies: Mutex<VecDeque<Result<String, ProviderError>>>,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl ScriptedProvider {
        fn new(replies: Vec<Result<String, ProviderError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            }
        }

        fn slow(delay: Duration) -> Self {
            Self {
                delay,
                ..Self::new(vec![Ok(SAMPLE_SCENARIO.to_string())])
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn complete(
            &self,
            messages: Vec<ChatMessage>,
            config: &CompletionConfig,
        ) -> Result<CompletionResponse, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(messages.len(), 3);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ProviderError::HttpError("no reply scripted".into())));
            reply.map(|content| CompletionResponse {
                content,
                usage: TokenUsage {
                    prompt_tokens: 900,
                    completion_tokens: 300,
                },
                model: config.model.clone(),
            })
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn step(provider: Arc<ScriptedProvider>, config: RuntimeConfig) -> CompletionValidationStep {
        CompletionValidationStep::new(provider, config).with_validator(Validator::silent())
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```yaml\nscenario: x\n```"), "scenario: x");
        assert_eq!(strip_code_fence("```\nscenario: x\n```\n"), "scenario: x");
        assert_eq!(strip_code_fence("scenario: x\n"), "scenario: x\n");
    }

    #[tokio::test]
    async fn test_valid_generation_passes() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(SAMPLE_SCENARIO.to_string())]));
        let validation = step(provider.clone(), RuntimeConfig::default())
            .execute("gpt-4o", "Check a support bot")
            .await
            .unwrap();

        assert!(validation.outcome.is_pass());
        assert_eq!(validation.record.model, "gpt-4o");
        assert_eq!(validation.record.usage.total(), 1200);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_fenced_generation_passes() {
        let fenced = format!("```yaml\n{}```", SAMPLE_SCENARIO);
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(fenced)]));
        let outcome = step(provider, RuntimeConfig::default())
            .run("gpt-4o", "Check a support bot")
            .await;
        assert!(outcome.is_pass(), "{}", outcome.message());
    }

    #[tokio::test]
    async fn test_invalid_generation_fails() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok("I cannot help with that".into())]));
        let outcome = step(provider, RuntimeConfig::default())
            .run("gpt-4o", "Check a support bot")
            .await;
        assert!(matches!(outcome, StepOutcome::Fail(m) if m.contains("Invalid YAML Format")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limits_are_retried() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Err(ProviderError::RateLimited { retry_after: None }),
            Err(ProviderError::RateLimited { retry_after: None }),
            Ok(SAMPLE_SCENARIO.to_string()),
        ]));
        let outcome = step(provider.clone(), RuntimeConfig::default())
            .run("gpt-4o", "Check a support bot")
            .await;
        assert!(outcome.is_pass());
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_auth_errors_are_not_retried() {
        let provider = Arc::new(ScriptedProvider::new(vec![Err(ProviderError::AuthError)]));
        let outcome = step(provider.clone(), RuntimeConfig::default())
            .run("gpt-4o", "Check a support bot")
            .await;
        assert_eq!(
            outcome,
            StepOutcome::Error("Error: Completion failed: Authentication failed".to_string())
        );
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_provider_times_out() {
        let provider = Arc::new(ScriptedProvider::slow(Duration::from_secs(30)));
        let config = RuntimeConfig {
            request_timeout: Duration::from_secs(1),
            max_retries: 0,
            ..RuntimeConfig::default()
        };
        let result = step(provider, config).execute("gpt-4o", "Check a support bot").await;
        assert!(matches!(
            result,
            Err(RuntimeError::Provider(ProviderError::Timeout(d))) if d == Duration::from_secs(1)
        ));
    }

    #[tokio::test]
    async fn test_result_log_uses_real_prompt_and_model() {
        let dir = tempfile::TempDir::new().unwrap();
        let log_path = dir.path().join("completion.csv");
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(SAMPLE_SCENARIO.to_string())]));

        step(provider, RuntimeConfig::default())
            .with_result_log(ResultLog::new(&log_path))
            .execute("gpt-4o", "Check a support bot")
            .await
            .unwrap();

        let log = std::fs::read_to_string(&log_path).unwrap();
        let row = log.lines().nth(1).unwrap();
        assert!(row.starts_with("true,All checks passed,Check a support bot,gpt-4o,"));
    }
}
