use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::ExtractedEntities;

const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Configuration for the Anthropic API client
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// API key (from ANTHROPIC_API_KEY env var)
    pub api_key: String,
    /// Model to use (EPISTOLARY_MODEL env var overrides the default)
    pub model: String,
    /// Temperature (0-1, lower = more deterministic)
    pub temperature: f64,
    /// Maximum tokens in response
    pub max_tokens: u32,
}

impl AnthropicConfig {
    /// Create config from environment variables
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .context("ANTHROPIC_API_KEY environment variable not set")?;
        let model = std::env::var("EPISTOLARY_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        Ok(Self::new(api_key, model))
    }

    /// Create with custom settings
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            temperature: 0.0,
            max_tokens: 2048,
        }
    }
}

/// Anthropic API client
pub struct AnthropicClient {
    client: Client,
    config: AnthropicConfig,
}

impl AnthropicClient {
    pub fn new(config: AnthropicConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Ask for the people and places in one letter via a forced tool call
    pub async fn submit_entities(&self, system: &str, user: &str) -> Result<ExtractedEntities> {
        let tool = Tool {
            name: SUBMIT_ENTITIES.to_string(),
            description: "Submit the people and places mentioned in the letter".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "persons": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Names of people, as written in the letter"
                    },
                    "places": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Names of towns, districts, states and countries"
                    }
                },
                "required": ["persons", "places"]
            }),
        };

        let request = AnthropicToolRequest {
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            temperature: Some(self.config.temperature),
            system: Some(system.to_string()),
            messages: vec![Message {
                role: "user".to_string(),
                content: user.to_string(),
            }],
            tools: vec![tool],
            tool_choice: Some(ToolChoice {
                choice_type: "tool".to_string(),
                name: SUBMIT_ENTITIES.to_string(),
            }),
        };

        let response = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Anthropic API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Anthropic API error: {} - {}", status, body);
        }

        let response: AnthropicResponse = response
            .json()
            .await
            .context("Failed to parse Anthropic API response")?;

        parse_tool_response(&response)
    }
}

const SUBMIT_ENTITIES: &str = "submit_entities";

fn parse_tool_response(response: &AnthropicResponse) -> Result<ExtractedEntities> {
    for content in &response.content {
        if content.content_type == "tool_use" && content.name.as_deref() == Some(SUBMIT_ENTITIES) {
            if let Some(input) = &content.input {
                return serde_json::from_value(input.clone())
                    .context("Failed to parse tool input as extracted entities");
            }
        }
    }

    anyhow::bail!("No tool_use response found")
}

#[derive(Debug, Serialize)]
struct AnthropicToolRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message>,
    tools: Vec<Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoice>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct Tool {
    name: String,
    description: String,
    input_schema: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct ToolChoice {
    #[serde(rename = "type")]
    choice_type: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    input: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tool_response() {
        let json = r#"{
            "content": [
                {"type": "text", "text": "Here are the entities."},
                {"type": "tool_use", "name": "submit_entities", "input": {
                    "persons": ["B.F. Perry", "Liz"],
                    "places": ["Columbia"]
                }}
            ]
        }"#;

        let response: AnthropicResponse = serde_json::from_str(json).unwrap();
        let entities = parse_tool_response(&response).unwrap();

        assert_eq!(entities.persons, vec!["B.F. Perry", "Liz"]);
        assert_eq!(entities.places, vec!["Columbia"]);
    }

    #[test]
    fn test_missing_tool_call_is_an_error() {
        let response: AnthropicResponse =
            serde_json::from_str(r#"{"content": [{"type": "text", "text": "none"}]}"#).unwrap();
        assert!(parse_tool_response(&response).is_err());
    }
}
