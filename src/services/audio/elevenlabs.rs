//! ElevenLabs text-to-speech.

use super::SpeechSynthesizer;
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

const ELEVENLABS_BASE_URL: &str = "https://api.elevenlabs.io";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ElevenLabsConfig {
    #[serde(default)]
    pub api_key: String,
    /// Uses the first voice of the account when unset.
    pub voice_id: Option<String>,
    #[serde(default = "default_model_id")]
    pub model_id: String,
    #[serde(default = "default_output_format")]
    pub output_format: String,
    pub base_url: Option<String>,
}

impl Default for ElevenLabsConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            voice_id: None,
            model_id: default_model_id(),
            output_format: default_output_format(),
            base_url: None,
        }
    }
}

fn default_model_id() -> String {
    "eleven_turbo_v2_5".to_string()
}
fn default_output_format() -> String {
    "mp3_44100_128".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ElevenVoice {
    pub voice_id: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Deserialize)]
struct VoicesResponse {
    #[serde(default)]
    voices: Vec<ElevenVoice>,
}

#[derive(Serialize)]
struct ConvertRequest<'a> {
    text: &'a str,
    model_id: &'a str,
}

pub struct ElevenLabsTts {
    config: ElevenLabsConfig,
    base_url: String,
    client: reqwest::Client,
}

impl ElevenLabsTts {
    pub fn new(config: ElevenLabsConfig) -> Self {
        let base_url = config
            .base_url
            .as_deref()
            .unwrap_or(ELEVENLABS_BASE_URL)
            .trim_end_matches('/')
            .to_string();
        Self {
            config,
            base_url,
            client: reqwest::Client::new(),
        }
    }

    pub async fn list_voices(&self) -> Result<Vec<ElevenVoice>> {
        let resp = self
            .client
            .get(format!("{}/v1/voices", self.base_url))
            .header("xi-api-key", &self.config.api_key)
            .send()
            .await
            .context("Failed to list ElevenLabs voices")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp.text().await?;
            bail!("ElevenLabs API error ({}): {}", status, error_text);
        }

        let result: VoicesResponse = resp.json().await?;
        Ok(result.voices)
    }

    /// First voice available in the account.
    pub async fn default_voice(&self) -> Result<String> {
        self.list_voices()
            .await?
            .into_iter()
            .next()
            .map(|v| v.voice_id)
            .ok_or_else(|| anyhow!("No voices available in your ElevenLabs account"))
    }

    async fn resolve_voice(&self, voice_id: Option<&str>) -> Result<String> {
        match voice_id.or(self.config.voice_id.as_deref()) {
            Some(id) => Ok(id.to_string()),
            None => self.default_voice().await,
        }
    }

    async fn convert(&self, text: &str, voice_id: Option<&str>, streaming: bool) -> Result<reqwest::Response> {
        let voice_id = self.resolve_voice(voice_id).await?;
        let suffix = if streaming { "/stream" } else { "" };
        let url = format!(
            "{}/v1/text-to-speech/{}{}?output_format={}",
            self.base_url, voice_id, suffix, self.config.output_format
        );
        debug!("ElevenLabs convert with voice {} (stream: {})", voice_id, streaming);

        let resp = self
            .client
            .post(url)
            .header("xi-api-key", &self.config.api_key)
            .json(&ConvertRequest {
                text,
                model_id: &self.config.model_id,
            })
            .send()
            .await
            .context("Failed to send ElevenLabs speech request")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp.text().await?;
            bail!("ElevenLabs API error ({}): {}", status, error_text);
        }
        Ok(resp)
    }

    pub async fn text_to_speech(&self, text: &str, voice_id: Option<&str>) -> Result<Vec<u8>> {
        let resp = self.convert(text, voice_id, false).await?;
        Ok(resp.bytes().await?.to_vec())
    }

    /// Audio chunks as they arrive, for incremental playback or writing.
    pub async fn text_to_speech_stream(
        &self,
        text: &str,
        voice_id: Option<&str>,
    ) -> Result<BoxStream<'static, Result<Vec<u8>>>> {
        let resp = self.convert(text, voice_id, true).await?;
        Ok(resp
            .bytes_stream()
            .map(|chunk| chunk.map(|b| b.to_vec()).map_err(anyhow::Error::from))
            .boxed())
    }

    /// Streams synthesized audio straight into `path`, returning the byte count.
    pub async fn stream_to_file(&self, text: &str, voice_id: Option<&str>, path: &str) -> Result<u64> {
        let mut stream = self.text_to_speech_stream(text, voice_id).await?;
        let mut file = tokio::fs::File::create(path)
            .await
            .with_context(|| format!("Failed to create {}", path))?;

        let mut written = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.context("Stream error")?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        info!("Streamed {} bytes of audio to {}", written, path);
        Ok(written)
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsTts {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        self.text_to_speech(text, None).await
    }

    fn file_extension(&self) -> &str {
        self.config
            .output_format
            .split('_')
            .next()
            .unwrap_or("mp3")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, voice_id: Option<&str>) -> ElevenLabsTts {
        ElevenLabsTts::new(ElevenLabsConfig {
            api_key: "el-key".to_string(),
            voice_id: voice_id.map(String::from),
            base_url: Some(server.uri()),
            ..Default::default()
        })
    }

    async fn mount_voices(server: &MockServer, voices: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/v1/voices"))
            .and(header("xi-api-key", "el-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(voices))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_list_voices() {
        let server = MockServer::start().await;
        mount_voices(
            &server,
            serde_json::json!({ "voices": [
                { "voice_id": "v1", "name": "Rachel", "category": "premade" },
                { "voice_id": "v2", "name": "Custom" }
            ]}),
        )
        .await;

        let voices = client_for(&server, None).list_voices().await.unwrap();
        assert_eq!(voices.len(), 2);
        assert_eq!(voices[0].name, "Rachel");
        assert_eq!(voices[0].category.as_deref(), Some("premade"));
        assert_eq!(voices[1].category, None);
    }

    #[tokio::test]
    async fn test_empty_account_has_no_default_voice() {
        let server = MockServer::start().await;
        mount_voices(&server, serde_json::json!({ "voices": [] })).await;

        let err = client_for(&server, None).default_voice().await.unwrap_err();
        assert!(err.to_string().contains("No voices"));
    }

    #[tokio::test]
    async fn test_synthesize_uses_first_voice_when_unset() {
        let server = MockServer::start().await;
        mount_voices(
            &server,
            serde_json::json!({ "voices": [{ "voice_id": "first", "name": "A" }] }),
        )
        .await;
        Mock::given(method("POST"))
            .and(path("/v1/text-to-speech/first"))
            .and(query_param("output_format", "mp3_44100_128"))
            .and(body_json(serde_json::json!({
                "text": "Once upon a time",
                "model_id": "eleven_turbo_v2_5"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ID3audio".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let tts = client_for(&server, None);
        assert_eq!(tts.file_extension(), "mp3");
        let audio = tts.synthesize("Once upon a time").await.unwrap();
        assert_eq!(audio, b"ID3audio");
    }

    #[tokio::test]
    async fn test_stream_to_file() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/text-to-speech/narrator/stream"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; 4096]))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("stream.mp3");
        let written = client_for(&server, Some("narrator"))
            .stream_to_file("Hello", None, out.to_str().unwrap())
            .await
            .unwrap();

        assert_eq!(written, 4096);
        assert_eq!(std::fs::read(&out).unwrap().len(), 4096);
    }

    #[tokio::test]
    async fn test_api_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/text-to-speech/v9"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let err = client_for(&server, None)
            .text_to_speech("x", Some("v9"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("invalid api key"));
    }
}
