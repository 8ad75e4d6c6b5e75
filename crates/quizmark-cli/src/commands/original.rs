//! The `quizmark original` command: a set text with its translation.

use std::path::PathBuf;

use anyhow::{bail, Result};

use super::App;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TranslationMode {
    /// Word-level glosses.
    Word,
    /// Sentence-level rendering.
    Sentence,
}

pub async fn execute(
    topic: String,
    mode: TranslationMode,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let app = App::load(config_path.as_deref())?;
    let Some(text) = app.content.original_text(&topic).await else {
        bail!("no original text available for topic '{topic}'");
    };

    println!("{} ({})", text.title, text.author);
    for line in &text.content {
        println!("\n{}", line.source);
        match mode {
            TranslationMode::Sentence => {
                if !line.translation.sentence.is_empty() {
                    println!("  {}", line.translation.sentence);
                }
            }
            TranslationMode::Word => {
                for gloss in &line.translation.word {
                    println!("  · {gloss}");
                }
            }
        }
    }
    Ok(())
}
