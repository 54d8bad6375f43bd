pub mod audio;
pub mod llm;
pub mod narration;
pub mod script;
pub mod storybook;
pub mod workflow;
