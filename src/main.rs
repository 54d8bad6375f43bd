use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use storyspark::core::config::{Config, DEFAULT_CONFIG_PATH};
use storyspark::core::io::{NativeStorage, Storage};
use storyspark::core::story::Story;
use storyspark::core::style::style_names;
use storyspark::services::audio::elevenlabs::ElevenLabsTts;
use storyspark::services::audio::openai::{OpenAiAudio, SpeechOptions};
use storyspark::services::audio::{create_speech_client, SpeechSynthesizer};
use storyspark::services::llm::create_text_model;
use storyspark::services::workflow::WorkflowManager;

#[derive(Parser)]
#[command(name = "storyspark", version, about = "Storybooks, narration and voice tools on top of hosted AI models")]
struct Cli {
    /// Path to the YAML config file
    #[arg(long, env = "STORYSPARK_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Never prompt; use config defaults for anything not given
    #[arg(long)]
    unattended: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate an illustrated storybook (text + image prompts) as JSON
    Story {
        #[arg(long, short)]
        prompt: Option<String>,
        #[arg(long)]
        pages: Option<usize>,
        #[arg(long, short)]
        style: Option<String>,
        #[arg(long, short)]
        output: Option<String>,
    },
    /// Read a saved storybook aloud, one audio file per page
    Narrate {
        #[arg(long, short)]
        input: String,
        #[arg(long)]
        output_dir: Option<String>,
    },
    /// Transcribe an audio file with OpenAI
    Transcribe {
        #[arg(long, short)]
        file: String,
        #[arg(long)]
        model: Option<String>,
        #[arg(long, short)]
        output: Option<String>,
    },
    /// Turn text into speech with the configured audio provider
    Speak {
        #[arg(long, short)]
        text: String,
        #[arg(long, short)]
        output: String,
        #[arg(long)]
        voice: Option<String>,
    },
    /// List the voices of the ElevenLabs account
    Voices,
    /// Voice assistant: transcribe a question, answer it, speak the answer
    Ask {
        #[arg(long, short)]
        file: String,
        #[arg(long, short)]
        output: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading config: {:#}", e);
            return Err(e);
        }
    };
    config.unattended |= cli.unattended;
    config.ensure_directories()?;

    let storage: Arc<dyn Storage> = Arc::new(NativeStorage::new());
    let manager = WorkflowManager::new(config.clone(), storage.clone());

    match cli.command {
        Command::Story {
            prompt,
            pages,
            style,
            output,
        } => {
            let prompt = match prompt {
                Some(p) => p,
                None if !config.unattended => inquire::Text::new("Story prompt:").prompt()?,
                None => bail!("--prompt is required in unattended mode"),
            };
            let style = match style {
                Some(s) => Some(s),
                None if !config.unattended => Some(select_style(&config.storybook.style)?),
                None => None,
            };

            let model = create_text_model(&config.llm)?;
            println!("Generating storybook...");
            let (story, path) = manager
                .create_storybook(
                    model.as_ref(),
                    &prompt,
                    pages,
                    style.as_deref(),
                    output.as_deref(),
                )
                .await?;
            print_preview(&story);
            println!("\nSaved to {}", path);
        }
        Command::Narrate { input, output_dir } => {
            let synth = create_speech_client(&config.audio)?;
            let files = manager
                .narrate_storybook(synth.as_ref(), &input, output_dir.as_deref())
                .await?;
            println!("Narrated {} pages", files.len());
            for f in files {
                println!("  {}", f);
            }
        }
        Command::Transcribe {
            file,
            model,
            output,
        } => {
            let audio = OpenAiAudio::new(config.audio.openai.clone().unwrap_or_default());
            let text = match model {
                Some(m) => audio.transcribe_path(&file, storage.as_ref(), Some(&m)).await?,
                None => manager.transcribe(&audio, &file, None).await?,
            };
            if let Some(output) = output {
                storage.write(&output, text.as_bytes()).await?;
                println!("Transcript saved to {}", output);
            } else {
                println!("{}", text);
            }
        }
        Command::Speak {
            text,
            output,
            voice,
        } => {
            let audio = match (config.audio.provider.as_str(), voice.as_deref()) {
                ("openai", Some(v)) => {
                    let client = OpenAiAudio::new(config.audio.openai.clone().unwrap_or_default());
                    let options = SpeechOptions {
                        voice: Some(v),
                        ..Default::default()
                    };
                    client.text_to_speech(&text, &options).await?
                }
                ("elevenlabs", Some(v)) => {
                    let client = ElevenLabsTts::new(config.audio.elevenlabs.clone().unwrap_or_default());
                    client.text_to_speech(&text, Some(v)).await?
                }
                _ => create_speech_client(&config.audio)?.synthesize(&text).await?,
            };
            storage.write(&output, &audio).await?;
            println!("Saved {} bytes to {}", audio.len(), output);
        }
        Command::Voices => {
            let client = ElevenLabsTts::new(config.audio.elevenlabs.clone().unwrap_or_default());
            let voices = client.list_voices().await?;
            println!("Available voices: {}", voices.len());
            for v in voices {
                match v.category {
                    Some(category) => println!("  - {} (ID: {}, {})", v.name, v.voice_id, category),
                    None => println!("  - {} (ID: {})", v.name, v.voice_id),
                }
            }
        }
        Command::Ask { file, output } => {
            let transcriber = OpenAiAudio::new(config.audio.openai.clone().unwrap_or_default());
            let model = create_text_model(&config.llm)?;
            let synth = create_speech_client(&config.audio)?;
            let (question, answer) = manager
                .answer_voice_question(&transcriber, model.as_ref(), synth.as_ref(), &file, &output)
                .await?;
            println!("User said: {}", question);
            println!("Assistant: {}", answer);
            println!("Response saved to {}", output);
        }
    }

    Ok(())
}

fn select_style(default: &str) -> Result<String> {
    let names = style_names();
    let start = names
        .iter()
        .position(|n| n.eq_ignore_ascii_case(default))
        .unwrap_or(0);
    let choice = inquire::Select::new("Illustration style:", names)
        .with_starting_cursor(start)
        .prompt()?;
    Ok(choice.to_string())
}

fn print_preview(story: &Story) {
    println!("\n{}", story.title);
    println!("{}", "=".repeat(40));
    for page in story.pages.iter().take(3) {
        println!("\nPage {}:", page.page_num);
        println!("  Text: {}", page.text);
        if let Some(prompt) = &page.image_prompt {
            let preview: String = prompt.chars().take(80).collect();
            println!("  Image prompt: {}...", preview);
        }
    }
}
