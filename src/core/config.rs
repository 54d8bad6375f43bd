use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::services::audio::elevenlabs::ElevenLabsConfig;
use crate::services::audio::openai::OpenAiAudioConfig;
use crate::services::llm::LlmConfig;

pub const DEFAULT_CONFIG_PATH: &str = "config.yml";

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub unattended: bool,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub audio: AudioConfig,

    #[serde(default)]
    pub storybook: StorybookConfig,

    /// System prompt for the voice assistant loop.
    #[serde(default)]
    pub system_prompt: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AudioConfig {
    #[serde(default = "default_audio_provider")]
    pub provider: String, // "openai" or "elevenlabs"
    pub openai: Option<OpenAiAudioConfig>,
    pub elevenlabs: Option<ElevenLabsConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StorybookConfig {
    #[serde(default = "default_pages")]
    pub pages: usize,
    #[serde(default = "default_style")]
    pub style: String,
    #[serde(default = "default_output")]
    pub output_folder: String,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            provider: default_audio_provider(),
            openai: None,
            elevenlabs: None,
        }
    }
}

impl Default for StorybookConfig {
    fn default() -> Self {
        Self {
            pages: default_pages(),
            style: default_style(),
            output_folder: default_output(),
        }
    }
}

fn default_audio_provider() -> String {
    "openai".to_string()
}
fn default_pages() -> usize {
    10
}
fn default_style() -> String {
    "watercolor".to_string()
}
fn default_output() -> String {
    "output".to_string()
}

impl Config {
    /// Loads `path`, or the built-in defaults when the file does not exist.
    /// Empty API keys are filled from the usual vendor environment variables.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Self::from_yaml(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            log::info!("{} not found, using defaults", path.display());
            Config::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml_ng::from_str(content)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml_ng::to_string(self)?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn ensure_directories(&self) -> Result<()> {
        fs::create_dir_all(&self.storybook.output_folder)?;
        Ok(())
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let fill = |slot: &mut String, var: &str| {
            if slot.is_empty() {
                if let Some(value) = lookup(var) {
                    *slot = value;
                }
            }
        };

        let gemini = self.llm.gemini.get_or_insert_with(Default::default);
        fill(&mut gemini.api_key, "GEMINI_API_KEY");

        let openai = self.llm.openai.get_or_insert_with(Default::default);
        fill(&mut openai.api_key, "OPENAI_API_KEY");

        let audio = self.audio.openai.get_or_insert_with(Default::default);
        fill(&mut audio.api_key, "OPENAI_API_KEY");

        let eleven = self.audio.elevenlabs.get_or_insert_with(Default::default);
        fill(&mut eleven.api_key, "ELEVENLABS_API_KEY");
    }
}
