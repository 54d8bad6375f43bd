use crate::core::io::Storage;
use crate::core::story::Story;
use crate::services::audio::SpeechSynthesizer;
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use std::path::Path;

/// Reads a storybook aloud, one audio file per page.
pub struct Narrator<'a> {
    synth: &'a dyn SpeechSynthesizer,
    storage: &'a dyn Storage,
    show_progress: bool,
}

impl<'a> Narrator<'a> {
    pub fn new(synth: &'a dyn SpeechSynthesizer, storage: &'a dyn Storage) -> Self {
        Self {
            synth,
            storage,
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn page_file_name(&self, page_num: u32) -> String {
        format!("page_{:02}.{}", page_num, self.synth.file_extension())
    }

    /// Pages are synthesized in order; the first failure stops the run.
    pub async fn narrate(&self, story: &Story, output_dir: &str) -> Result<Vec<String>> {
        info!("Narrating '{}' ({} pages)", story.title, story.pages.len());

        let pb = if self.show_progress {
            let pb = ProgressBar::new(story.pages.len() as u64);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("Narrating [{elapsed_precise}] [{bar:40.green/blue}] {pos}/{len}")
            {
                pb.set_style(style.progress_chars("#>-"));
            }
            pb
        } else {
            ProgressBar::hidden()
        };

        let mut written = Vec::with_capacity(story.pages.len());
        for page in &story.pages {
            let path = Path::new(output_dir).join(self.page_file_name(page.page_num));
            let path_str = path.to_string_lossy().to_string();
            self.synth
                .speak_to_file(&page.text, &path_str, self.storage)
                .await
                .with_context(|| format!("Narration failed on page {}", page.page_num))?;
            written.push(path_str);
            pb.inc(1);
        }
        pb.finish_and_clear();
        Ok(written)
    }
}
