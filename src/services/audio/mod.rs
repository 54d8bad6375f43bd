use crate::core::config::AudioConfig;
use crate::core::io::Storage;
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use log::info;

pub mod elevenlabs;
pub mod openai;

/// Anything that can turn text into encoded audio bytes.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;

    /// File extension matching the encoded output, without the dot.
    fn file_extension(&self) -> &str;

    async fn speak_to_file(&self, text: &str, path: &str, storage: &dyn Storage) -> Result<()> {
        let audio = self.synthesize(text).await?;
        storage
            .write(path, &audio)
            .await
            .with_context(|| format!("Failed to save audio to {}", path))?;
        info!("Saved {} bytes of audio to {}", audio.len(), path);
        Ok(())
    }
}

/// Speech-to-text.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe_file(&self, path: &str, storage: &dyn Storage) -> Result<String>;
}

pub fn create_speech_client(config: &AudioConfig) -> Result<Box<dyn SpeechSynthesizer>> {
    info!("Initializing speech client for provider: {}", config.provider);
    match config.provider.as_str() {
        "openai" => {
            let cfg = config
                .openai
                .clone()
                .ok_or_else(|| anyhow!("OpenAI audio config missing"))?;
            if cfg.api_key.is_empty() {
                bail!("OpenAI API key missing (set audio.openai.api_key or OPENAI_API_KEY)");
            }
            Ok(Box::new(openai::OpenAiAudio::new(cfg)))
        }
        "elevenlabs" => {
            let cfg = config
                .elevenlabs
                .clone()
                .ok_or_else(|| anyhow!("ElevenLabs config missing"))?;
            if cfg.api_key.is_empty() {
                bail!("ElevenLabs API key missing (set audio.elevenlabs.api_key or ELEVENLABS_API_KEY)");
            }
            Ok(Box::new(elevenlabs::ElevenLabsTts::new(cfg)))
        }
        _ => Err(anyhow!("Unknown audio provider: {}", config.provider)),
    }
}
