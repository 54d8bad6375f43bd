//! Illustrated storybook generation: story text first, then one image
//! prompt per page.

use crate::core::io::Storage;
use crate::core::story::Story;
use crate::core::style::resolve_style;
use crate::services::llm::TextModel;
use crate::services::script::{image_prompt_request, parse_story, story_request};
use anyhow::{anyhow, bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};

/// Outcome of the story-text phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoryDraft {
    Parsed(Story),
    Fallback(Story),
}

impl StoryDraft {
    pub fn is_fallback(&self) -> bool {
        matches!(self, StoryDraft::Fallback(_))
    }

    pub fn into_story(self) -> Story {
        match self {
            StoryDraft::Parsed(story) | StoryDraft::Fallback(story) => story,
        }
    }
}

pub struct StoryTextGenerator<'a> {
    model: &'a dyn TextModel,
    show_progress: bool,
}

impl<'a> StoryTextGenerator<'a> {
    pub fn new(model: &'a dyn TextModel) -> Self {
        Self {
            model,
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Story text plus image prompts for every page.
    pub async fn generate_story(&self, prompt: &str, page_count: usize, style: &str) -> Result<Story> {
        info!("Generating {}-page storybook in style '{}'", page_count, style);
        let story = self.generate_story_text(prompt, page_count).await;
        self.generate_image_prompts(story, style).await
    }

    /// Never fails: anything unusable from the model becomes the fallback story.
    pub async fn generate_story_text(&self, prompt: &str, page_count: usize) -> Story {
        self.draft_story(prompt, page_count).await.into_story()
    }

    pub async fn draft_story(&self, prompt: &str, page_count: usize) -> StoryDraft {
        let page_count = page_count.max(1);
        let request = story_request(prompt, page_count);

        let parsed = match self.model.complete(&request).await {
            Ok(response) => parse_story(&response, page_count),
            Err(e) => Err(e.context("Story text request failed")),
        };

        match parsed {
            Ok(story) => {
                info!("Story text generated: {}", story.title);
                StoryDraft::Parsed(story)
            }
            Err(e) => {
                warn!("Error parsing story, using placeholder: {:#}", e);
                StoryDraft::Fallback(Story::fallback(page_count))
            }
        }
    }

    /// Adds an image prompt to each page, in page order. The first failing
    /// request aborts the rest.
    pub async fn generate_image_prompts(&self, mut story: Story, style: &str) -> Result<Story> {
        let style_desc = resolve_style(style);
        let pb = self.progress_bar(story.pages.len() as u64, "Image prompts");

        for page in story.pages.iter_mut() {
            let request = image_prompt_request(&page.text, &story.title, style_desc);
            let response = self
                .model
                .complete(&request)
                .await
                .with_context(|| format!("Image prompt request failed for page {}", page.page_num))?;

            let prompt = response.trim();
            if prompt.is_empty() {
                bail!("Model returned an empty image prompt for page {}", page.page_num);
            }
            page.image_prompt = Some(prompt.to_string());
            pb.inc(1);
        }

        pb.finish_and_clear();
        info!("Image prompts generated");
        Ok(story)
    }

    fn progress_bar(&self, len: u64, label: &'static str) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb.set_message(label);
        pb
    }
}

/// Runs `image_generator` once per page, in order, storing each result as
/// the page's image. The first error aborts the remaining pages.
pub fn generate_with_images<F>(mut story: Story, mut image_generator: F) -> Result<Story>
where
    F: FnMut(&str) -> Result<String>,
{
    let total = story.pages.len();
    for (i, page) in story.pages.iter_mut().enumerate() {
        info!("Generating image {}/{}", i + 1, total);
        let prompt = page
            .image_prompt
            .as_deref()
            .ok_or_else(|| anyhow!("Page {} has no image prompt", page.page_num))?;
        page.image = Some(image_generator(prompt)?);
    }
    Ok(story)
}

pub async fn save_storybook(story: &Story, path: &str, storage: &dyn Storage) -> Result<()> {
    storage.write(path, story.to_json()?.as_bytes()).await?;
    info!("Saved storybook to {}", path);
    Ok(())
}

pub async fn load_storybook(path: &str, storage: &dyn Storage) -> Result<Story> {
    let content = storage.read_to_string(path).await?;
    Story::from_json(&content).with_context(|| format!("Failed to parse storybook {}", path))
}
