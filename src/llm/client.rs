//! LLM client for API communication

use crate::error::{ChecklistError, Result};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Response from LLM
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// The generated content
    pub content: String,
    /// Number of tokens used
    pub tokens_used: Option<usize>,
}

/// Text-in, text-out completion capability
///
/// `schema_hint` describes the output shape the caller expects; it may be
/// empty. Implementations make no promise that the answer honors it.
#[async_trait::async_trait]
pub trait Completion: Send + Sync {
    async fn complete(&self, prompt: &str, schema_hint: &str) -> Result<LlmResponse>;
}

/// Configuration for LLM client
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// API endpoint URL
    pub endpoint: String,
    /// Model name
    pub model: String,
    /// API key (optional)
    pub api_key: Option<String>,
    /// Maximum tokens for response
    pub max_tokens: usize,
    /// Temperature for generation
    pub temperature: f32,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            model: "llama3".to_string(),
            api_key: None,
            max_tokens: 4096,
            temperature: 0.5,
            timeout: Duration::from_secs(120),
        }
    }
}

/// LLM client for summaries, prompts and checklists
pub struct LlmClient {
    config: LlmConfig,
    client: reqwest::Client,
}

impl LlmClient {
    /// Create a new LLM client
    pub fn new(config: LlmConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { config, client }
    }

    fn is_ollama(&self) -> bool {
        self.config.endpoint.contains("11434")
    }

    /// Generate completion using Ollama API
    async fn complete_ollama(&self, prompt: &str) -> Result<LlmResponse> {
        let url = format!("{}/api/generate", self.config.endpoint);

        let request = OllamaGenerateRequest {
            model: &self.config.model,
            prompt,
            stream: false,
            options: OllamaOptions {
                temperature: self.config.temperature,
                num_predict: self.config.max_tokens as i32,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ChecklistError::Generation(format!("Failed to send request to Ollama: {}", e)))?;

        if !response.status().is_success() {
            return Err(classify_failure(response).await);
        }

        let result: OllamaGenerateResponse = response.json().await.map_err(|e| {
            ChecklistError::Generation(format!("Failed to parse Ollama response: {}", e))
        })?;

        Ok(LlmResponse {
            content: result.response,
            tokens_used: result.eval_count.map(|c| c as usize),
        })
    }

    /// Generate completion using OpenAI-compatible API
    async fn complete_openai(&self, prompt: &str) -> Result<LlmResponse> {
        let url = format!("{}/v1/chat/completions", self.config.endpoint);

        let request = OpenAIChatRequest {
            model: &self.config.model,
            messages: vec![OpenAIMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: Some(self.config.max_tokens),
            temperature: Some(self.config.temperature),
        };

        let mut req_builder = self.client.post(&url).json(&request);

        if let Some(ref key) = self.config.api_key {
            req_builder = req_builder.header("Authorization", format!("Bearer {}", key));
        }

        let response = req_builder.send().await.map_err(|e| {
            ChecklistError::Generation(format!(
                "Failed to send request to OpenAI-compatible API: {}",
                e
            ))
        })?;

        if !response.status().is_success() {
            return Err(classify_failure(response).await);
        }

        let result: OpenAIChatResponse = response.json().await.map_err(|e| {
            ChecklistError::Generation(format!("Failed to parse OpenAI response: {}", e))
        })?;

        let content = result
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();

        Ok(LlmResponse {
            content,
            tokens_used: result.usage.map(|u| u.total_tokens as usize),
        })
    }
}

#[async_trait::async_trait]
impl Completion for LlmClient {
    async fn complete(&self, prompt: &str, schema_hint: &str) -> Result<LlmResponse> {
        let full_prompt = with_schema_hint(prompt, schema_hint);
        tracing::debug!(
            "Sending {} char prompt to {}",
            full_prompt.len(),
            self.config.model
        );

        if self.is_ollama() {
            self.complete_ollama(&full_prompt).await
        } else {
            self.complete_openai(&full_prompt).await
        }
    }
}

/// Append the schema hint to a prompt
pub fn with_schema_hint(prompt: &str, schema_hint: &str) -> String {
    if schema_hint.trim().is_empty() {
        prompt.to_string()
    } else {
        format!("{}\n\n{}", prompt.trim_end(), schema_hint.trim())
    }
}

/// Whether a backend error body reports an exceeded context window
pub fn is_context_limit_message(body: &str) -> bool {
    let lower = body.to_ascii_lowercase();
    lower.contains("maximum context length")
        || lower.contains("context_length_exceeded")
        || lower.contains("context window")
        || lower.contains("too many tokens")
}

async fn classify_failure(response: reqwest::Response) -> ChecklistError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    if status == StatusCode::PAYLOAD_TOO_LARGE || is_context_limit_message(&body) {
        ChecklistError::ContentTooLarge(format!("{} - {}", status, body))
    } else {
        ChecklistError::Generation(format!("LLM request failed: {} - {}", status, body))
    }
}

// Ollama API types

#[derive(Debug, Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: i32,
}

#[derive(Debug, Deserialize)]
struct OllamaGenerateResponse {
    response: String,
    eval_count: Option<i32>,
}

// OpenAI API types

#[derive(Debug, Serialize)]
struct OpenAIChatRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIChatResponse {
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    total_tokens: i32,
}

/// Scripted failure for [`MockCompletion`]
#[derive(Debug, Clone)]
pub enum MockFailure {
    ContextLimit,
    Backend(String),
}

/// Mock completion capability for testing
///
/// Answers with the response registered for the first (longest) key found in
/// the prompt, falling back to the default response. Every prompt is recorded.
pub struct MockCompletion {
    responses: HashMap<String, String>,
    default_response: String,
    failures: HashMap<String, MockFailure>,
    prompts: Mutex<Vec<String>>,
}

impl MockCompletion {
    /// Create a new mock client
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
            default_response: "I could not produce a checklist.".to_string(),
            failures: HashMap::new(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Add a mock response
    pub fn with_response(mut self, prompt_contains: &str, response: &str) -> Self {
        self.responses
            .insert(prompt_contains.to_string(), response.to_string());
        self
    }

    /// Response used when no key matches
    pub fn with_default(mut self, response: &str) -> Self {
        self.default_response = response.to_string();
        self
    }

    /// Fail every prompt containing `prompt_contains`
    pub fn with_failure(mut self, prompt_contains: &str, failure: MockFailure) -> Self {
        self.failures.insert(prompt_contains.to_string(), failure);
        self
    }

    /// Prompts received so far, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    fn best_match<'a, T>(map: &'a HashMap<String, T>, prompt: &str) -> Option<&'a T> {
        map.iter()
            .filter(|(key, _)| prompt.contains(key.as_str()))
            .max_by_key(|(key, _)| key.len())
            .map(|(_, value)| value)
    }
}

impl Default for MockCompletion {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Completion for MockCompletion {
    async fn complete(&self, prompt: &str, schema_hint: &str) -> Result<LlmResponse> {
        let full_prompt = with_schema_hint(prompt, schema_hint);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(full_prompt.clone());
        }

        if let Some(failure) = Self::best_match(&self.failures, &full_prompt) {
            return Err(match failure {
                MockFailure::ContextLimit => ChecklistError::ContentTooLarge(
                    "This model's maximum context length is 4097 tokens".to_string(),
                ),
                MockFailure::Backend(message) => ChecklistError::Generation(message.clone()),
            });
        }

        let content = Self::best_match(&self.responses, &full_prompt)
            .cloned()
            .unwrap_or_else(|| self.default_response.clone());

        Ok(LlmResponse {
            content,
            tokens_used: Some(100),
        })
    }
}
