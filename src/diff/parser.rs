//! Git diff parsing utilities.
//!
//! Splits raw unified-diff text into one block per file and classifies
//! each block into a [`DiffRecord`]. The format has no grammar: everything
//! is resolved from line prefixes and position, which is why pure renames
//! (no hunk), renames with edits (rename metadata followed by a hunk) and
//! binary files (no textual hunk at all) each need their own path through
//! the scan.

use std::collections::{HashMap, HashSet};

use log::debug;
use thiserror::Error;

/// Marker that opens a per-file section in unified diff output.
const FILE_HEADER: &str = "diff --git ";

#[derive(Error, Debug)]
pub enum ParseError {
  #[error("Invalid diff header format: {0}")]
  MalformedHeader(String)
}

/// How a file changed between the two sides of a diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffOperation {
  Modified,
  Added,
  Deleted,
  Renamed,
  RenamedAndModified
}

impl DiffOperation {
  pub fn label(&self) -> &'static str {
    match self {
      DiffOperation::Modified => "Modified",
      DiffOperation::Added => "Added",
      DiffOperation::Deleted => "Deleted",
      DiffOperation::Renamed => "Renamed",
      DiffOperation::RenamedAndModified => "Renamed and Modified"
    }
  }
}

impl std::fmt::Display for DiffOperation {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.label())
  }
}

/// One file's change, classified and stripped of metadata noise.
///
/// `path` is always the destination-side ("b/") path. For [`DiffOperation::Renamed`]
/// the content is a one-line rename note; for every other operation it is
/// the hunk text, or empty when the block carried no hunk (binary diffs,
/// header-only blocks).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffRecord {
  pub path:      String,
  pub operation: DiffOperation,
  pub content:   String
}

/// Split a multi-file diff into raw per-file blocks, keyed by destination
/// path, keeping only paths present in `whitelist`.
///
/// Fails fast on a malformed `diff --git` header: header corruption means
/// the rest of the stream cannot be trusted, so no partial result is
/// returned.
pub fn segment(diff_text: &str, whitelist: &HashSet<String>) -> Result<HashMap<String, String>, ParseError> {
  debug!("Parsing diff with {} lines", diff_text.lines().count());
  if log::log_enabled!(log::Level::Debug) && !diff_text.is_empty() {
    debug!("Diff content preview: \n{}", preview(diff_text, 500));
  }

  let mut blocks = HashMap::new();
  let mut current: Option<(String, Vec<&str>)> = None;

  for line in diff_text.lines() {
    if line.starts_with(FILE_HEADER) {
      if let Some((path, lines)) = current.take() {
        emit(&mut blocks, path, lines, whitelist);
      }
      let path = destination_path(line)?;
      debug!("Found new file in diff: {path}");
      current = Some((path, vec![line]));
    } else if let Some((_, lines)) = current.as_mut() {
      // Lines before the first header have no block to belong to.
      lines.push(line);
    }
  }

  if let Some((path, lines)) = current {
    emit(&mut blocks, path, lines, whitelist);
  }

  debug!("Segmented {} whitelisted blocks", blocks.len());
  Ok(blocks)
}

fn emit(blocks: &mut HashMap<String, String>, path: String, lines: Vec<&str>, whitelist: &HashSet<String>) {
  if whitelist.contains(&path) {
    blocks.insert(path, lines.join("\n"));
  }
}

/// Truncate to at most `limit` bytes without splitting a UTF-8 character.
fn preview(text: &str, limit: usize) -> &str {
  if text.len() <= limit {
    return text;
  }
  let mut end = limit;
  while !text.is_char_boundary(end) {
    end -= 1;
  }
  &text[..end]
}

/// Extract the destination ("b/") path from a `diff --git` header line.
///
/// The header is tokenized on whitespace and the 4th token must carry a
/// `b/` prefix. Paths containing spaces cannot be tokenized unambiguously;
/// they fail here rather than being guessed at.
fn destination_path(header: &str) -> Result<String, ParseError> {
  let dest = header
    .split_whitespace()
    .nth(3)
    .ok_or_else(|| ParseError::MalformedHeader(header.to_string()))?;

  dest
    .strip_prefix("b/")
    .map(str::to_string)
    .ok_or_else(|| ParseError::MalformedHeader(header.to_string()))
}

/// Classify one file's raw block and extract its cleaned body.
///
/// A single forward scan over the metadata lines, stopping at the first
/// `@@` hunk marker. Classification never fails: blocks without explicit
/// markers degrade to [`DiffOperation::Modified`] with best-effort content.
pub fn classify(path: &str, raw_block: &str) -> DiffRecord {
  let lines: Vec<&str> = raw_block.lines().collect();
  let has_rename = lines.iter().any(|line| line.starts_with("rename from "));

  let mut operation = DiffOperation::Modified;
  let mut rename_note: Option<String> = None;
  let mut hunk_start: Option<usize> = None;

  for (idx, line) in lines.iter().enumerate() {
    if line.starts_with("new file mode") {
      operation = DiffOperation::Added;
    } else if line.starts_with("deleted file mode") {
      operation = DiffOperation::Deleted;
    } else if line.starts_with("similarity index") && has_rename {
      // Anything but an exact 100% reading counts as rename-with-edits,
      // malformed percentages included.
      operation = if *line == "similarity index 100%" {
        DiffOperation::Renamed
      } else {
        DiffOperation::RenamedAndModified
      };
    } else if let Some(source) = line.strip_prefix("rename from ") {
      rename_note = Some(format!("rename from {source} to {path}"));
    } else if line.starts_with("@@") {
      hunk_start = Some(idx);
      break;
    }
  }

  // A pure rename has no hunk worth keeping; the note is the whole story.
  if operation == DiffOperation::Renamed {
    return DiffRecord {
      path: path.to_string(),
      operation,
      content: rename_note.unwrap_or_default()
    };
  }

  let content = match hunk_start {
    Some(start) if start < lines.len() => {
      let hunk = lines[start..].join("\n");
      match rename_note {
        Some(note) => format!("{note}\n{hunk}"),
        None => hunk
      }
    }
    // No hunk marker at all: binary diffs and header-only blocks.
    _ => String::new()
  };

  DiffRecord { path: path.to_string(), operation, content }
}

/// Segment a diff and classify every whitelisted block in one call.
pub fn parse(diff_text: &str, whitelist: &HashSet<String>) -> Result<HashMap<String, DiffRecord>, ParseError> {
  let blocks = segment(diff_text, whitelist)?;

  Ok(
    blocks
      .into_iter()
      .map(|(path, block)| {
        let record = classify(&path, &block);
        (path, record)
      })
      .collect()
  )
}
