//! Glob-based filename filtering.

use glob::Pattern;
use log::warn;

/// Filters file paths against caller-supplied glob patterns. Patterns
/// match anywhere in the path (`*.lock` also catches `vendor/Cargo.lock`),
/// and invalid patterns are skipped rather than failing the run.
pub struct FileFilter;

impl FileFilter {
  /// Paths that match none of the given patterns. An empty pattern list
  /// excludes nothing.
  pub fn exclude(files: &[String], patterns: &[String]) -> Vec<String> {
    if patterns.is_empty() {
      return files.to_vec();
    }

    let patterns = compile(patterns);
    files
      .iter()
      .filter(|file| !patterns.iter().any(|pattern| pattern.matches(file.as_str())))
      .cloned()
      .collect()
  }

  /// Sorted, deduplicated paths matching any of the given patterns. An
  /// empty pattern list matches nothing.
  pub fn matching(files: &[String], patterns: &[String]) -> Vec<String> {
    if patterns.is_empty() {
      return Vec::new();
    }

    let patterns = compile(patterns);
    let mut matched: Vec<String> = files
      .iter()
      .filter(|file| patterns.iter().any(|pattern| pattern.matches(file.as_str())))
      .cloned()
      .collect();
    matched.sort();
    matched.dedup();
    matched
  }
}

fn compile(patterns: &[String]) -> Vec<Pattern> {
  patterns
    .iter()
    .filter_map(|raw| match Pattern::new(raw) {
      Ok(pattern) => Some(pattern),
      Err(err) => {
        warn!("Skipping invalid glob pattern {raw:?}: {err}");
        None
      }
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn files(paths: &[&str]) -> Vec<String> {
    paths.iter().map(|p| p.to_string()).collect()
  }

  #[test]
  fn test_exclude_by_extension() {
    let input = files(&["src/lib.rs", "Cargo.lock", "vendor/Cargo.lock"]);
    let result = FileFilter::exclude(&input, &files(&["*.lock"]));
    assert_eq!(result, files(&["src/lib.rs"]));
  }

  #[test]
  fn test_exclude_with_no_patterns_keeps_everything() {
    let input = files(&["a.rs", "b.lock"]);
    assert_eq!(FileFilter::exclude(&input, &[]), input);
  }

  #[test]
  fn test_exclude_directory_pattern() {
    let input = files(&["dist/app.js", "src/app.js"]);
    let result = FileFilter::exclude(&input, &files(&["dist/*"]));
    assert_eq!(result, files(&["src/app.js"]));
  }

  #[test]
  fn test_matching_sorts_and_dedups() {
    let input = files(&["docs/b.md", "docs/a.md", "src/lib.rs"]);
    let result = FileFilter::matching(&input, &files(&["*.md", "docs/*"]));
    assert_eq!(result, files(&["docs/a.md", "docs/b.md"]));
  }

  #[test]
  fn test_matching_with_no_patterns_matches_nothing() {
    let input = files(&["README.md"]);
    assert!(FileFilter::matching(&input, &[]).is_empty());
  }

  #[test]
  fn test_invalid_pattern_is_skipped() {
    let input = files(&["a.rs", "b.lock"]);
    let result = FileFilter::exclude(&input, &files(&["[", "*.lock"]));
    assert_eq!(result, files(&["a.rs"]));
  }
}
