//! Markdown prompt assembly.
//!
//! Builds the final document out of ordered sections: instructions, pull
//! request metadata, context files, the changed-file tree and one diff
//! section per classified record.

use std::collections::HashMap;
use std::path::Path;

use crate::diff::DiffRecord;
use crate::tree;

const TRUNCATION_MARKER: &str = "\n\n... [Diff truncated for brevity] ...\n\n";

/// One markdown section of the prompt.
#[derive(Debug, Clone)]
pub struct PromptSection {
  pub title:   String,
  pub content: String,
  pub level:   usize
}

impl PromptSection {
  pub fn render(&self) -> String {
    format!("{} {}\n\n{}", "#".repeat(self.level), self.title, self.content)
  }
}

/// Accumulates sections and renders them into one markdown document.
#[derive(Debug, Default)]
pub struct PromptBuilder {
  sections: Vec<PromptSection>
}

impl PromptBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add_instructions(&mut self, instructions: &str) {
    self.push("Instructions", instructions.trim().to_string(), 2);
  }

  /// PR title, description and one-line commit messages. Skipped entirely
  /// when there is nothing to show.
  pub fn add_metadata(&mut self, pr_title: Option<&str>, pr_description: Option<&str>, commit_messages: &[String]) {
    let mut parts = Vec::new();

    if let Some(title) = pr_title {
      parts.push(format!("**Title:** {title}"));
    }
    if let Some(description) = pr_description {
      parts.push(format!("**Description:**\n\n{description}"));
    }
    if !commit_messages.is_empty() {
      let listed = commit_messages
        .iter()
        .map(|message| format!("- {message}"))
        .collect::<Vec<_>>()
        .join("\n");
      parts.push(format!("**Commits:**\n\n{listed}"));
    }

    if !parts.is_empty() {
      self.push("Pull Request Details", parts.join("\n\n"), 2);
    }
  }

  pub fn add_changed_files(&mut self, files: &[String]) {
    let content = if files.is_empty() {
      "No files changed".to_string()
    } else {
      tree::build_file_tree(files)
    };
    self.push("Changed Files", content, 2);
  }

  /// A full file included for reviewer context, fenced with a language
  /// tag inferred from its extension.
  pub fn add_context_file(&mut self, path: &str, content: &str) {
    self.push(&format!("Context: `{path}`"), fenced(path, content), 3);
  }

  /// One heading per record, labelled with the operation and path, the
  /// cleaned diff body in a fenced block. Records render in path order so
  /// output is deterministic; the combined section is truncated around
  /// the middle when it exceeds `max_chars`.
  pub fn add_file_diffs(&mut self, records: &HashMap<String, DiffRecord>, max_chars: usize) {
    if records.is_empty() {
      self.push("Changes", "No changes to display".to_string(), 2);
      return;
    }

    let mut paths: Vec<&String> = records.keys().collect();
    paths.sort();

    let rendered = paths
      .iter()
      .map(|path| {
        let record = &records[*path];
        let body = if record.content.is_empty() {
          "# No changes to display"
        } else {
          record.content.as_str()
        };
        format!("### {}: `{}`\n\n```diff\n{body}\n```", record.operation.label(), record.path)
      })
      .collect::<Vec<_>>()
      .join("\n\n");

    let rendered = if max_chars > 0 && rendered.len() > max_chars {
      truncate_diff(&rendered, max_chars)
    } else {
      rendered
    };

    self.push("Changes", rendered, 2);
  }

  pub fn build(&self) -> String {
    self
      .sections
      .iter()
      .map(PromptSection::render)
      .collect::<Vec<_>>()
      .join("\n\n")
  }

  fn push(&mut self, title: &str, content: String, level: usize) {
    self.sections.push(PromptSection { title: title.to_string(), content, level });
  }
}

/// Truncate an oversized diff section, keeping both ends and cutting the
/// middle, preferring to cut on a per-file heading boundary.
pub fn truncate_diff(diff_text: &str, max_chars: usize) -> String {
  if diff_text.len() <= max_chars {
    return diff_text.to_string();
  }

  let half = max_chars / 2;
  let mut start_chunk = &diff_text[..char_floor(diff_text, half)];
  let mut end_chunk = &diff_text[char_floor(diff_text, diff_text.len() - half)..];

  // Pull the cut back to the last complete file section, unless that
  // would discard most of the kept text.
  if let Some(last_heading) = start_chunk.rfind("\n### ") {
    if last_heading > half * 7 / 10 {
      start_chunk = &start_chunk[..last_heading];
    }
  }

  // Skip forward to the first complete file section near the resume point.
  if let Some(first_heading) = end_chunk.find("\n### ") {
    if first_heading < half * 3 / 10 {
      end_chunk = &end_chunk[first_heading + 1..];
    }
  }

  format!("{start_chunk}{TRUNCATION_MARKER}{end_chunk}")
}

fn char_floor(text: &str, mut index: usize) -> usize {
  if index >= text.len() {
    return text.len();
  }
  while !text.is_char_boundary(index) {
    index -= 1;
  }
  index
}

fn fenced(path: &str, content: &str) -> String {
  let language = language_for(path);
  // Markdown context would close a backtick fence from the inside.
  if language == "markdown" {
    format!("~~~{language}\n{content}\n~~~")
  } else {
    format!("```{language}\n{content}\n```")
  }
}

fn language_for(path: &str) -> &'static str {
  let extension = Path::new(path).extension().and_then(|ext| ext.to_str()).unwrap_or_default();

  match extension {
    "py" => "python",
    "js" => "javascript",
    "ts" => "typescript",
    "jsx" => "jsx",
    "tsx" => "tsx",
    "java" => "java",
    "go" => "go",
    "rs" => "rust",
    "cpp" | "cc" => "cpp",
    "c" => "c",
    "cs" => "csharp",
    "rb" => "ruby",
    "php" => "php",
    "swift" => "swift",
    "kt" => "kotlin",
    "scala" => "scala",
    "sh" => "bash",
    "yml" | "yaml" => "yaml",
    "json" => "json",
    "xml" => "xml",
    "html" => "html",
    "css" => "css",
    "sql" => "sql",
    "md" => "markdown",
    _ => "text"
  }
}
