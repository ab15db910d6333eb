use std::io::Write;
use std::path::PathBuf;
use std::fs::File;

use serde::{Deserialize, Serialize};
use config::{Config, FileFormat};
use anyhow::{Context, Result};
use lazy_static::lazy_static;
use console::Emoji;

// Constants
const DEFAULT_BLACKLIST_PATTERNS: &str = "*.lock";
const DEFAULT_CONTEXT_PATTERNS: &str = "LLM.md";
const DEFAULT_MAX_DIFF_CHARS: i64 = 15_000;
const DEFAULT_DIFF_CONTEXT_LINES: i64 = 999_999;

/// Persisted settings. Pattern lists are stored as comma-separated
/// strings because the INI format has no list values.
#[derive(Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
pub struct App {
  pub blacklist_patterns:      Option<String>,
  pub context_patterns:        Option<String>,
  pub max_diff_chars:          Option<usize>,
  pub diff_context_lines:      Option<u32>,
  pub include_commit_messages: Option<bool>
}

#[derive(Debug)]
pub struct ConfigPaths {
  pub dir:  PathBuf,
  pub file: PathBuf
}

lazy_static! {
  static ref PATHS: ConfigPaths = ConfigPaths::new();
  pub static ref APP: App = App::new().expect("Failed to load config");
}

impl ConfigPaths {
  fn new() -> Self {
    let dir = home::home_dir()
      .expect("Failed to determine home directory")
      .join(".config/pr-prompt");
    let file = dir.join("config.ini");
    Self { dir, file }
  }

  fn ensure_exists(&self) -> Result<()> {
    if !self.dir.exists() {
      std::fs::create_dir_all(&self.dir).with_context(|| format!("Failed to create config directory at {:?}", self.dir))?;
    }
    if !self.file.exists() {
      File::create(&self.file).with_context(|| format!("Failed to create config file at {:?}", self.file))?;
    }
    Ok(())
  }
}

impl App {
  pub fn new() -> Result<Self> {
    dotenv::dotenv().ok();
    PATHS.ensure_exists()?;

    let config = Config::builder()
      .add_source(config::Environment::with_prefix("PR_PROMPT").try_parsing(true))
      .add_source(config::File::new(PATHS.file.to_string_lossy().as_ref(), FileFormat::Ini))
      .set_default("blacklist_patterns", DEFAULT_BLACKLIST_PATTERNS)?
      .set_default("context_patterns", DEFAULT_CONTEXT_PATTERNS)?
      .set_default("max_diff_chars", DEFAULT_MAX_DIFF_CHARS)?
      .set_default("diff_context_lines", DEFAULT_DIFF_CONTEXT_LINES)?
      .set_default("include_commit_messages", true)?
      .build()?;

    config
      .try_deserialize()
      .context("Failed to deserialize existing config. Delete the config file and try again")
  }

  /// Blacklist patterns as a list.
  pub fn blacklist(&self) -> Vec<String> {
    split_patterns(self.blacklist_patterns.as_deref())
  }

  /// Context patterns as a list.
  pub fn context(&self) -> Vec<String> {
    split_patterns(self.context_patterns.as_deref())
  }

  pub fn save(&self) -> Result<()> {
    let contents = serde_ini::to_string(&self).context(format!("Failed to serialize config: {:?}", self))?;
    let mut file = File::create(&PATHS.file).with_context(|| format!("Failed to create config file at {:?}", PATHS.file))?;
    file
      .write_all(contents.as_bytes())
      .context("Failed to write config file")
  }

  pub fn update_blacklist_patterns(&mut self, value: String) -> Result<()> {
    self.blacklist_patterns = Some(value);
    self.save_with_message("blacklist-patterns")
  }

  pub fn update_context_patterns(&mut self, value: String) -> Result<()> {
    self.context_patterns = Some(value);
    self.save_with_message("context-patterns")
  }

  pub fn update_max_diff_chars(&mut self, value: usize) -> Result<()> {
    self.max_diff_chars = Some(value);
    self.save_with_message("max-diff-chars")
  }

  fn save_with_message(&self, option: &str) -> Result<()> {
    println!("{} Configuration option {} updated!", Emoji("✨", ":-)"), option);
    self.save()
  }
}

fn split_patterns(raw: Option<&str>) -> Vec<String> {
  raw
    .unwrap_or_default()
    .split(',')
    .map(str::trim)
    .filter(|pattern| !pattern.is_empty())
    .map(str::to_string)
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_split_patterns_trims_and_drops_empties() {
    let app = App {
      blacklist_patterns: Some("*.lock, dist/*,,  *.min.js ".to_string()),
      ..Default::default()
    };
    assert_eq!(app.blacklist(), vec!["*.lock", "dist/*", "*.min.js"]);
  }

  #[test]
  fn test_split_patterns_empty_when_unset() {
    assert!(App::default().context().is_empty());
  }
}
