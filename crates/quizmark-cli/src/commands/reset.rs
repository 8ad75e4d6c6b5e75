//! The `quizmark reset` command.

use std::path::PathBuf;

use anyhow::{bail, Result};

use super::App;

pub fn execute(yes: bool, config_path: Option<PathBuf>) -> Result<()> {
    if !yes {
        bail!("this deletes all attempts and mistakes; pass --yes to confirm");
    }
    let app = App::load(config_path.as_deref())?;
    app.tracker.reset()?;
    println!("All progress cleared.");
    Ok(())
}
