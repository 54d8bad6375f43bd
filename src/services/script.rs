use crate::core::story::Story;
use anyhow::{Context, Result};

const FENCE: &str = "```";
const JSON_FENCE: &str = "```json";

/// Pulls the JSON payload out of a free-form model reply.
///
/// A "```json" fence wins over a plain "```" fence; without any fence the
/// whole reply is used. An unclosed fence runs to the end of the reply.
pub fn extract_json_block(response: &str) -> &str {
    let body = if let Some((_, rest)) = response.split_once(JSON_FENCE) {
        up_to_fence(rest)
    } else if let Some((_, rest)) = response.split_once(FENCE) {
        up_to_fence(rest)
    } else {
        response
    };
    body.trim()
}

fn up_to_fence(s: &str) -> &str {
    s.split_once(FENCE).map_or(s, |(body, _)| body)
}

pub fn story_instruction(page_count: usize) -> String {
    format!(
        "You are a children's storybook writer. Create engaging, age-appropriate stories.\n\
         \n\
         Generate a {pages}-page storybook based on the user's prompt.\n\
         Each page should have 2-3 sentences suitable for children.\n\
         Maintain consistent characters and plot progression.\n\
         \n\
         Return ONLY valid JSON in this exact format:\n\
         {{\n  \"title\": \"Story Title\",\n  \"pages\": [\n    \
         {{\"page_num\": 1, \"text\": \"Page 1 text here...\"}},\n    \
         {{\"page_num\": 2, \"text\": \"Page 2 text here...\"}}\n  ]\n}}",
        pages = page_count
    )
}

pub fn story_request(prompt: &str, page_count: usize) -> String {
    format!(
        "{}\n\nUser story prompt: {}",
        story_instruction(page_count),
        prompt
    )
}

pub fn image_prompt_request(page_text: &str, title: &str, style_description: &str) -> String {
    format!(
        "Based on this story page, create a detailed image generation prompt.\n\
         \n\
         Page text: \"{}\"\n\
         Style: {}\n\
         Title: {}\n\
         \n\
         Generate a single, concise image prompt (2-3 sentences) that:\n\
         - Captures the key scene/moment\n\
         - Maintains character consistency\n\
         - Specifies the artistic style\n\
         - Is suitable for children's book illustration\n\
         \n\
         Return ONLY the image prompt text, no extra commentary.",
        page_text, style_description, title
    )
}

/// Parses a story reply and checks it carries exactly `page_count` pages.
pub fn parse_story(response: &str, page_count: usize) -> Result<Story> {
    let clean_json = extract_json_block(response);
    let story = Story::from_json(clean_json)
        .with_context(|| format!("Failed to parse story JSON: {}", clean_json))?;
    story.validate(page_count)?;
    Ok(story)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STORY: &str =
        r#"{"title": "Dragon School", "pages": [{"page_num": 1, "text": "Hi."}, {"page_num": 2, "text": "Bye."}]}"#;

    #[test]
    fn test_no_fence_returns_trimmed_text() {
        assert_eq!(extract_json_block("  {\"a\": 1}\n"), "{\"a\": 1}");
    }

    #[test]
    fn test_json_fence() {
        let reply = format!("Here you go:\n```json\n{}\n```\nEnjoy!", STORY);
        assert_eq!(extract_json_block(&reply), STORY);
    }

    #[test]
    fn test_generic_fence() {
        let reply = format!("```\n{}\n```", STORY);
        assert_eq!(extract_json_block(&reply), STORY);
    }

    #[test]
    fn test_json_fence_wins_over_earlier_generic_fence() {
        let reply = format!(
            "Example:\n```\nnot this\n```\nAnswer:\n```json\n{}\n```",
            STORY
        );
        assert_eq!(extract_json_block(&reply), STORY);
    }

    #[test]
    fn test_unclosed_fence_runs_to_end() {
        let reply = format!("```json\n{}\n", STORY);
        assert_eq!(extract_json_block(&reply), STORY);

        let reply = format!("```\n{}", STORY);
        assert_eq!(extract_json_block(&reply), STORY);
    }

    #[test]
    fn test_empty_fence() {
        assert_eq!(extract_json_block("```json```"), "");
    }

    #[test]
    fn test_parse_story_from_fenced_reply() {
        let reply = format!("```json\n{}\n```", STORY);
        let story = parse_story(&reply, 2).unwrap();
        assert_eq!(story.title, "Dragon School");
        assert_eq!(story.pages[0].text, "Hi.");
        assert_eq!(story.pages[1].page_num, 2);
    }

    #[test]
    fn test_parse_story_rejects_page_count_mismatch() {
        assert!(parse_story(STORY, 3).is_err());
    }

    #[test]
    fn test_parse_story_rejects_refusal() {
        let err = parse_story("I'm sorry, I can't help with that.", 2).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse story JSON"));
    }

    #[test]
    fn test_story_request_mentions_page_count_and_prompt() {
        let request = story_request("A dragon learning to fly", 7);
        assert!(request.contains("Generate a 7-page storybook"));
        assert!(request.ends_with("User story prompt: A dragon learning to fly"));
        assert!(request.contains("\"page_num\": 1"));
    }

    #[test]
    fn test_image_prompt_request_carries_page_title_and_style() {
        let request = image_prompt_request("The dragon waves.", "Dragon School", "bold lines");
        assert!(request.contains("Page text: \"The dragon waves.\""));
        assert!(request.contains("Style: bold lines"));
        assert!(request.contains("Title: Dragon School"));
    }
}
