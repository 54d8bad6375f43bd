use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

pub const FALLBACK_TITLE: &str = "A Magical Story";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Story {
    pub title: String,
    pub pages: Vec<Page>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Page {
    pub page_num: u32,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Page {
    pub fn new(page_num: u32, text: impl Into<String>) -> Self {
        Self {
            page_num,
            text: text.into(),
            image_prompt: None,
            image: None,
        }
    }
}

impl Story {
    /// Placeholder story used whenever the model's answer cannot be used.
    pub fn fallback(page_count: usize) -> Self {
        let pages = (1..=page_count as u32)
            .map(|n| Page::new(n, format!("Page {} of your story...", n)))
            .collect();
        Self {
            title: FALLBACK_TITLE.to_string(),
            pages,
        }
    }

    /// Checks that the story has exactly `page_count` pages numbered 1..=N in order.
    pub fn validate(&self, page_count: usize) -> Result<()> {
        if self.pages.len() != page_count {
            bail!(
                "Expected {} pages, got {}",
                page_count,
                self.pages.len()
            );
        }
        for (i, page) in self.pages.iter().enumerate() {
            if page.page_num as usize != i + 1 {
                bail!(
                    "Page at position {} is numbered {}",
                    i + 1,
                    page.page_num
                );
            }
        }
        Ok(())
    }

    /// Pretty JSON, two-space indent, non-ASCII left as is.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }
}
