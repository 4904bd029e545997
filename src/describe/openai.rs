//! OpenAI-compatible chat-completions backend for flavor text.
//!
//! Works with any service implementing the OpenAI chat completions API.

use super::{DescribeError, DescriptionGenerator};
use crate::catalog_store::AudioFeatures;
use crate::config::DescriberSettings;
use anyhow::Context;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const SYSTEM_PROMPT: &str = "You write short, playful dating profiles for songs. \
    Write in the first person, as the song, in at most three sentences. \
    Do not mention numbers.";

pub struct LlmDescriptionGenerator {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    max_tokens: u32,
    temperature: f32,
}

impl LlmDescriptionGenerator {
    pub fn new(settings: &DescriberSettings) -> anyhow::Result<Self> {
        let base_url = settings
            .base_url
            .as_deref()
            .context("describer base_url is not configured")?;
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            api_key: settings.api_key.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
        })
    }

    fn user_prompt(name: &str, primary_artist: &str, f: &AudioFeatures) -> String {
        format!(
            "Song: \"{}\" by {}.\n\
             acousticness {:.2}, danceability {:.2}, energy {:.2}, instrumentalness {:.2}, \
             liveness {:.2}, loudness {:.1} dB, speechiness {:.2}, valence {:.2}, \
             tempo {:.0} BPM, key {}, {} mode, {} seconds long.",
            name,
            primary_artist,
            f.acousticness,
            f.danceability,
            f.energy,
            f.instrumentalness,
            f.liveness,
            f.loudness,
            f.speechiness,
            f.valence,
            f.tempo,
            f.key,
            if f.mode == 1 { "major" } else { "minor" },
            f.duration_ms / 1000
        )
    }
}

impl DescriptionGenerator for LlmDescriptionGenerator {
    fn describe(
        &self,
        name: &str,
        primary_artist: &str,
        features: &AudioFeatures,
    ) -> Result<String, DescribeError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: Self::user_prompt(name, primary_artist, features),
                },
            ],
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
        };

        debug!(model = %self.model, song = %name, "Requesting flavor text");

        let mut req_builder = self.client.post(&url).json(&request);
        if let Some(api_key) = &self.api_key {
            req_builder = req_builder.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = req_builder.send().map_err(|e| {
            if e.is_timeout() {
                DescribeError::Timeout
            } else {
                DescribeError::Connection(e.to_string())
            }
        })?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(DescribeError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(DescribeError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let chat: ChatResponse = response.json().map_err(|e| {
            DescribeError::InvalidResponse(format!("Failed to parse chat response: {}", e))
        })?;
        extract_text(chat)
    }
}

fn extract_text(chat: ChatResponse) -> Result<String, DescribeError> {
    let choice = chat
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| DescribeError::InvalidResponse("No choices in response".to_string()))?;
    let text = choice.message.content.unwrap_or_default().trim().to_string();
    if text.is_empty() {
        return Err(DescribeError::InvalidResponse("Empty completion".to_string()));
    }
    Ok(text)
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}
