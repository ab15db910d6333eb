//! Prompt generation pipeline.
//!
//! Ties the collaborators together: changed files from the repository,
//! blacklist filtering, diff parsing, and markdown assembly.

use std::collections::{HashMap, HashSet};

use anyhow::{Context, Result};
use log::{debug, warn};

use crate::config;
use crate::diff::{self, DiffRecord};
use crate::filter::FileFilter;
use crate::git::Repo;
use crate::instructions::{DESCRIPTION_INSTRUCTIONS, REVIEW_INSTRUCTIONS};
use crate::profile;
use crate::prompt::PromptBuilder;

const DEFAULT_MAX_DIFF_CHARS: usize = 15_000;
const DEFAULT_DIFF_CONTEXT_LINES: u32 = 999_999;

/// Generator for pull request prompts.
///
/// Creates formatted prompts for LLM review of pull requests from the
/// diff between two refs, the commit messages between them, and any
/// matching context files.
#[derive(Debug, Clone)]
pub struct PrPromptGenerator {
  /// File patterns excluded from the diff analysis.
  pub blacklist_patterns:      Vec<String>,
  /// Patterns selecting files to include in full, for reviewer context.
  pub context_patterns:        Vec<String>,
  /// Whether commit messages between the refs go into the prompt.
  pub include_commit_messages: bool,
  /// Upper bound on the rendered diff section, in characters.
  pub max_diff_chars:          usize,
  /// Context lines around changes; high enough to pull whole files in.
  pub diff_context_lines:      u32
}

impl Default for PrPromptGenerator {
  fn default() -> Self {
    Self {
      blacklist_patterns:      vec!["*.lock".to_string()],
      context_patterns:        vec!["LLM.md".to_string()],
      include_commit_messages: true,
      max_diff_chars:          DEFAULT_MAX_DIFF_CHARS,
      diff_context_lines:      DEFAULT_DIFF_CONTEXT_LINES
    }
  }
}

impl PrPromptGenerator {
  /// A generator seeded from the persisted configuration.
  pub fn from_config() -> Self {
    let app = &config::APP;
    Self {
      blacklist_patterns:      app.blacklist(),
      context_patterns:        app.context(),
      include_commit_messages: app.include_commit_messages.unwrap_or(true),
      max_diff_chars:          app.max_diff_chars.unwrap_or(DEFAULT_MAX_DIFF_CHARS),
      diff_context_lines:      app.diff_context_lines.unwrap_or(DEFAULT_DIFF_CONTEXT_LINES)
    }
  }

  pub fn generate_review(
    &self,
    repo: &Repo,
    base_ref: &str,
    head_ref: Option<&str>,
    pr_title: Option<&str>,
    pr_description: Option<&str>
  ) -> Result<String> {
    self.generate(REVIEW_INSTRUCTIONS, repo, base_ref, head_ref, pr_title, pr_description)
  }

  pub fn generate_description(&self, repo: &Repo, base_ref: &str, head_ref: Option<&str>, pr_title: Option<&str>) -> Result<String> {
    self.generate(DESCRIPTION_INSTRUCTIONS, repo, base_ref, head_ref, pr_title, None)
  }

  pub fn generate_custom(
    &self,
    instructions: &str,
    repo: &Repo,
    base_ref: &str,
    head_ref: Option<&str>,
    pr_title: Option<&str>,
    pr_description: Option<&str>
  ) -> Result<String> {
    self.generate(instructions, repo, base_ref, head_ref, pr_title, pr_description)
  }

  fn generate(
    &self,
    instructions: &str,
    repo: &Repo,
    base_ref: &str,
    head_ref: Option<&str>,
    pr_title: Option<&str>,
    pr_description: Option<&str>
  ) -> Result<String> {
    profile!("Generate prompt");

    let changed = repo
      .changed_files(base_ref, head_ref)
      .context("Failed to list changed files")?;
    let whitelist = FileFilter::exclude(&changed, &self.blacklist_patterns);
    debug!("{} changed files, {} after blacklist", changed.len(), whitelist.len());

    let mut builder = PromptBuilder::new();
    builder.add_instructions(instructions);

    let commit_messages = if self.include_commit_messages {
      repo
        .commit_messages(base_ref, head_ref)
        .context("Failed to collect commit messages")?
    } else {
      Vec::new()
    };
    builder.add_metadata(pr_title, pr_description, &commit_messages);

    self.add_context_files(repo, head_ref, &mut builder)?;

    builder.add_changed_files(&whitelist);

    let records = self.parse_diff(repo, base_ref, head_ref, &whitelist)?;
    builder.add_file_diffs(&records, self.max_diff_chars);

    Ok(builder.build())
  }

  fn add_context_files(&self, repo: &Repo, head_ref: Option<&str>, builder: &mut PromptBuilder) -> Result<()> {
    if self.context_patterns.is_empty() {
      return Ok(());
    }

    let head = head_ref.unwrap_or("HEAD");
    let head_files = repo
      .list_files(head)
      .context("Failed to list files at head ref")?;

    for path in FileFilter::matching(&head_files, &self.context_patterns) {
      match repo.file_content(head, &path) {
        Ok(content) => builder.add_context_file(&path, &content),
        Err(err) => warn!("Skipping context file {path}: {err}")
      }
    }

    Ok(())
  }

  fn parse_diff(&self, repo: &Repo, base_ref: &str, head_ref: Option<&str>, whitelist: &[String]) -> Result<HashMap<String, DiffRecord>> {
    if whitelist.is_empty() {
      return Ok(HashMap::new());
    }

    let diff_text = repo
      .diff_text(base_ref, head_ref, self.diff_context_lines)
      .context("Failed to generate diff")?;

    let whitelist_set: HashSet<String> = whitelist.iter().cloned().collect();
    diff::parse(&diff_text, &whitelist_set).context("Failed to parse diff")
  }
}
