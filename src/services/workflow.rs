use crate::core::config::Config;
use crate::core::io::Storage;
use crate::core::story::Story;
use crate::services::audio::{SpeechSynthesizer, Transcriber};
use crate::services::llm::TextModel;
use crate::services::narration::Narrator;
use crate::services::storybook::{load_storybook, save_storybook, StoryTextGenerator};
use anyhow::{bail, Result};
use log::info;
use std::path::Path;
use std::sync::Arc;

pub const DEFAULT_STORYBOOK_FILE: &str = "storybook.json";

pub struct WorkflowManager {
    config: Config,
    storage: Arc<dyn Storage>,
}

impl WorkflowManager {
    pub fn new(config: Config, storage: Arc<dyn Storage>) -> Self {
        Self { config, storage }
    }

    fn show_progress(&self) -> bool {
        !self.config.unattended
    }

    fn output_path(&self, file_name: &str) -> String {
        Path::new(&self.config.storybook.output_folder)
            .join(file_name)
            .to_string_lossy()
            .to_string()
    }

    /// Generates a storybook and saves it, returning the story and where it went.
    pub async fn create_storybook(
        &self,
        model: &dyn TextModel,
        prompt: &str,
        pages: Option<usize>,
        style: Option<&str>,
        output: Option<&str>,
    ) -> Result<(Story, String)> {
        let pages = pages.unwrap_or(self.config.storybook.pages);
        if pages == 0 {
            bail!("A storybook needs at least one page");
        }
        let style = style.unwrap_or(&self.config.storybook.style);

        let generator = StoryTextGenerator::new(model).with_progress(self.show_progress());
        let story = generator.generate_story(prompt, pages, style).await?;

        let path = output
            .map(str::to_string)
            .unwrap_or_else(|| self.output_path(DEFAULT_STORYBOOK_FILE));
        save_storybook(&story, &path, self.storage.as_ref()).await?;
        Ok((story, path))
    }

    pub async fn narrate_storybook(
        &self,
        synth: &dyn SpeechSynthesizer,
        input: &str,
        output_dir: Option<&str>,
    ) -> Result<Vec<String>> {
        let story = load_storybook(input, self.storage.as_ref()).await?;
        let output_dir = output_dir
            .map(str::to_string)
            .unwrap_or_else(|| self.output_path("narration"));

        Narrator::new(synth, self.storage.as_ref())
            .with_progress(self.show_progress())
            .narrate(&story, &output_dir)
            .await
    }

    pub async fn transcribe(
        &self,
        transcriber: &dyn Transcriber,
        input: &str,
        output: Option<&str>,
    ) -> Result<String> {
        let text = transcriber
            .transcribe_file(input, self.storage.as_ref())
            .await?;
        if let Some(output) = output {
            self.storage.write(output, text.as_bytes()).await?;
            info!("Saved transcript to {}", output);
        }
        Ok(text)
    }

    /// Listen, think, speak: transcribe a question, answer it with the text
    /// model and write the spoken answer to `output`.
    pub async fn answer_voice_question(
        &self,
        transcriber: &dyn Transcriber,
        model: &dyn TextModel,
        synth: &dyn SpeechSynthesizer,
        input: &str,
        output: &str,
    ) -> Result<(String, String)> {
        let question = transcriber
            .transcribe_file(input, self.storage.as_ref())
            .await?;
        info!("User said: {}", question);

        let answer = model
            .chat(self.config.system_prompt.as_deref(), &question)
            .await?;
        info!("Assistant: {}", answer);

        synth
            .speak_to_file(&answer, output, self.storage.as_ref())
            .await?;
        Ok((question, answer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::NativeStorage;
    use crate::core::story::FALLBACK_TITLE;
    use crate::services::audio::testing::{EchoSynthesizer, TextFileTranscriber};
    use crate::services::llm::testing::ScriptedModel;

    fn manager(dir: &Path) -> WorkflowManager {
        let mut config = Config::default();
        config.unattended = true;
        config.storybook.output_folder = dir.to_string_lossy().to_string();
        config.storybook.pages = 2;
        config.system_prompt = Some("You are a health information assistant.".to_string());
        WorkflowManager::new(config, Arc::new(NativeStorage::new()))
    }

    #[tokio::test]
    async fn test_create_storybook_uses_config_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let wf = manager(dir.path());
        let model = ScriptedModel::ok(["no json here", "scene one", "scene two"]);

        let (story, path) = wf
            .create_storybook(&model, "A dragon learning to fly", None, None, None)
            .await
            .unwrap();

        assert_eq!(story.title, FALLBACK_TITLE);
        assert_eq!(story.pages.len(), 2);
        assert!(path.ends_with(DEFAULT_STORYBOOK_FILE));
        // Default style is watercolor.
        assert!(model.prompts()[1].contains("soft watercolor painting"));

        let saved = Story::from_json(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved, story);
    }

    #[tokio::test]
    async fn test_create_storybook_rejects_zero_pages() {
        let dir = tempfile::tempdir().unwrap();
        let wf = manager(dir.path());
        let model = ScriptedModel::default();
        assert!(wf
            .create_storybook(&model, "x", Some(0), None, None)
            .await
            .is_err());
        assert!(model.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_narrate_saved_storybook() {
        let dir = tempfile::tempdir().unwrap();
        let wf = manager(dir.path());
        let model = ScriptedModel::ok(["garbage", "a", "b"]);
        let (_, path) = wf
            .create_storybook(&model, "x", None, Some("crochet"), None)
            .await
            .unwrap();

        let synth = EchoSynthesizer::default();
        let files = wf.narrate_storybook(&synth, &path, None).await.unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[1].contains("narration"));
        assert_eq!(
            std::fs::read_to_string(&files[0]).unwrap(),
            "Page 1 of your story..."
        );
    }

    #[tokio::test]
    async fn test_transcribe_saves_transcript() {
        let dir = tempfile::tempdir().unwrap();
        let wf = manager(dir.path());
        let input = dir.path().join("interview.txt");
        std::fs::write(&input, "hello from the interview").unwrap();
        let output = dir.path().join("transcript_1.txt");

        let text = wf
            .transcribe(
                &TextFileTranscriber,
                input.to_str().unwrap(),
                Some(output.to_str().unwrap()),
            )
            .await
            .unwrap();
        assert_eq!(text, "hello from the interview");
        assert_eq!(std::fs::read_to_string(&output).unwrap(), text);
    }

    #[tokio::test]
    async fn test_voice_question_loop() {
        let dir = tempfile::tempdir().unwrap();
        let wf = manager(dir.path());
        let input = dir.path().join("question.wav");
        std::fs::write(&input, "Is a fever dangerous?").unwrap();
        let output = dir.path().join("reply.mp3");

        let model = ScriptedModel::ok(["Please consult a healthcare professional."]);
        let synth = EchoSynthesizer::default();

        let (question, answer) = wf
            .answer_voice_question(
                &TextFileTranscriber,
                &model,
                &synth,
                input.to_str().unwrap(),
                output.to_str().unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(question, "Is a fever dangerous?");
        assert_eq!(answer, "Please consult a healthcare professional.");
        assert!(model.prompts()[0].starts_with("You are a health information assistant."));
        assert_eq!(std::fs::read_to_string(&output).unwrap(), answer);
    }
}
