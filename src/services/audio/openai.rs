//! OpenAI audio endpoints: transcription (speech-to-text) and speech
//! (text-to-speech).

use super::{SpeechSynthesizer, Transcriber};
use crate::core::io::Storage;
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::multipart;
use serde::{Deserialize, Serialize};
use std::path::Path;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OpenAiAudioConfig {
    #[serde(default)]
    pub api_key: String,
    pub base_url: Option<String>,
    #[serde(default = "default_transcribe_model")]
    pub transcribe_model: String,
    #[serde(default = "default_tts_model")]
    pub tts_model: String,
    #[serde(default = "default_voice")]
    pub voice: String,
    #[serde(default = "default_response_format")]
    pub response_format: String,
}

impl Default for OpenAiAudioConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: None,
            transcribe_model: default_transcribe_model(),
            tts_model: default_tts_model(),
            voice: default_voice(),
            response_format: default_response_format(),
        }
    }
}

fn default_transcribe_model() -> String {
    "gpt-4o-transcribe".to_string()
}
fn default_tts_model() -> String {
    "gpt-4o-mini-tts".to_string()
}
fn default_voice() -> String {
    "coral".to_string()
}
fn default_response_format() -> String {
    "wav".to_string()
}

/// Per-call overrides for [`OpenAiAudio::text_to_speech`].
#[derive(Debug, Clone, Default)]
pub struct SpeechOptions<'a> {
    pub voice: Option<&'a str>,
    pub model: Option<&'a str>,
    pub response_format: Option<&'a str>,
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
    response_format: &'a str,
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

pub struct OpenAiAudio {
    config: OpenAiAudioConfig,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiAudio {
    pub fn new(config: OpenAiAudioConfig) -> Self {
        let base_url = config
            .base_url
            .as_deref()
            .unwrap_or(OPENAI_BASE_URL)
            .trim_end_matches('/')
            .to_string();
        Self {
            config,
            base_url,
            client: reqwest::Client::new(),
        }
    }

    /// Transcribes an encoded audio clip (mp3, wav, m4a, ...). `file_name`
    /// lets the service infer the container format.
    pub async fn transcribe(&self, audio: Vec<u8>, file_name: &str, model: Option<&str>) -> Result<String> {
        let model = model.unwrap_or(&self.config.transcribe_model).to_string();
        debug!("Transcribing {} ({} bytes) with {}", file_name, audio.len(), model);

        let part = multipart::Part::bytes(audio).file_name(file_name.to_string());
        let form = multipart::Form::new().text("model", model).part("file", part);

        let resp = self
            .client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(&self.config.api_key)
            .multipart(form)
            .send()
            .await
            .context("Failed to send transcription request")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp.text().await?;
            bail!("OpenAI transcription error ({}): {}", status, error_text);
        }

        let result: TranscriptionResponse = resp
            .json()
            .await
            .context("Failed to parse transcription response")?;
        Ok(result.text)
    }

    pub async fn transcribe_path(&self, path: &str, storage: &dyn Storage, model: Option<&str>) -> Result<String> {
        let audio = storage.read(path).await?;
        let file_name = Path::new(path)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| anyhow!("Not a file path: {}", path))?;
        self.transcribe(audio, &file_name, model).await
    }

    pub async fn text_to_speech(&self, text: &str, options: &SpeechOptions<'_>) -> Result<Vec<u8>> {
        let request = SpeechRequest {
            model: options.model.unwrap_or(&self.config.tts_model),
            voice: options.voice.unwrap_or(&self.config.voice),
            input: text,
            response_format: options
                .response_format
                .unwrap_or(&self.config.response_format),
        };
        debug!("Requesting speech with voice {}", request.voice);

        let resp = self
            .client
            .post(format!("{}/audio/speech", self.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to send speech request")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp.text().await?;
            bail!("OpenAI speech error ({}): {}", status, error_text);
        }

        Ok(resp.bytes().await?.to_vec())
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAiAudio {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        self.text_to_speech(text, &SpeechOptions::default()).await
    }

    fn file_extension(&self) -> &str {
        &self.config.response_format
    }
}

#[async_trait]
impl Transcriber for OpenAiAudio {
    async fn transcribe_file(&self, path: &str, storage: &dyn Storage) -> Result<String> {
        self.transcribe_path(path, storage, None).await
    }
}
