use std::fs;
use std::process::Command;

use pr_prompt::generator::PrPromptGenerator;
use pr_prompt::git::Repo;
use tempfile::TempDir;

struct TestRepo {
  dir: TempDir
}

impl TestRepo {
  fn new() -> Self {
    let helper = TestRepo {
      dir: TempDir::new().expect("Could not create temp dir")
    };

    helper.git(&["init"]);
    helper.git(&["checkout", "-b", "main"]);
    helper.git(&["config", "user.name", "Test User"]);
    helper.git(&["config", "user.email", "test@example.com"]);
    helper.git(&["config", "commit.gpgsign", "false"]);

    helper
  }

  fn git(&self, args: &[&str]) {
    let output = Command::new("git")
      .args(args)
      .current_dir(self.dir.path())
      .output()
      .expect("Failed to execute git");

    assert!(
      output.status.success(),
      "git {args:?} failed: {}",
      String::from_utf8_lossy(&output.stderr)
    );
  }

  fn write_file(&self, name: &str, content: &str) {
    let path = self.dir.path().join(name);
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).expect("Could not create parent dirs");
    }
    fs::write(path, content).expect("Could not write file");
  }

  fn commit_all(&self, message: &str) {
    self.git(&["add", "-A"]);
    self.git(&["commit", "-m", message]);
  }

  fn repo(&self) -> Repo {
    Repo::new_with_path(self.dir.path().to_string_lossy().into_owned()).expect("Could not open repo")
  }
}

/// Builds a main branch and a feature branch covering every operation
/// kind: a modified file, an added file, a pure rename and a blacklisted
/// lockfile change.
fn repo_with_feature_branch() -> TestRepo {
  let helper = TestRepo::new();

  helper.write_file("src/lib.rs", "fn original() {}\n");
  helper.write_file("docs/old_name.md", "# Documentation\n\nUnchanged body.\n");
  helper.write_file("Cargo.lock", "lock v1\n");
  helper.commit_all("Initial commit");

  helper.git(&["checkout", "-b", "feature"]);
  helper.write_file("src/lib.rs", "fn improved() {}\n");
  helper.write_file("src/extra.rs", "pub fn extra() {}\n");
  helper.write_file("Cargo.lock", "lock v2\n");
  helper.git(&["mv", "docs/old_name.md", "docs/new_name.md"]);
  helper.commit_all("Add extra module");

  helper
}

#[test]
fn test_review_prompt_covers_all_sections() {
  let helper = repo_with_feature_branch();
  let repo = helper.repo();

  let generator = PrPromptGenerator::default();
  let prompt = generator
    .generate_review(&repo, "main", None, Some("Test PR"), Some("A test change."))
    .expect("Could not generate prompt");

  assert!(prompt.contains("## Instructions"));
  assert!(prompt.contains("pull request review"));
  assert!(prompt.contains("**Title:** Test PR"));
  assert!(prompt.contains("A test change."));
  assert!(prompt.contains("- Add extra module"));
  assert!(prompt.contains("## Changed Files"));
  assert!(prompt.contains("## Changes"));
}

#[test]
fn test_review_prompt_classifies_operations() {
  let helper = repo_with_feature_branch();
  let repo = helper.repo();

  let prompt = PrPromptGenerator::default()
    .generate_review(&repo, "main", None, None, None)
    .expect("Could not generate prompt");

  assert!(prompt.contains("### Modified: `src/lib.rs`"));
  assert!(prompt.contains("-fn original() {}"));
  assert!(prompt.contains("+fn improved() {}"));

  assert!(prompt.contains("### Added: `src/extra.rs`"));
  assert!(prompt.contains("+pub fn extra() {}"));

  assert!(prompt.contains("### Renamed: `docs/new_name.md`"));
  assert!(prompt.contains("rename from docs/old_name.md to docs/new_name.md"));
}

#[test]
fn test_blacklisted_files_stay_out_of_the_prompt() {
  let helper = repo_with_feature_branch();
  let repo = helper.repo();

  // Default blacklist carries *.lock.
  let prompt = PrPromptGenerator::default()
    .generate_review(&repo, "main", None, None, None)
    .expect("Could not generate prompt");

  assert!(!prompt.contains("Cargo.lock"));
  assert!(!prompt.contains("lock v2"));
}

#[test]
fn test_context_files_are_included_from_head() {
  let helper = repo_with_feature_branch();
  helper.write_file("LLM.md", "# Project conventions\n");
  helper.commit_all("Add context notes");

  let repo = helper.repo();
  let prompt = PrPromptGenerator::default()
    .generate_review(&repo, "main", None, None, None)
    .expect("Could not generate prompt");

  assert!(prompt.contains("### Context: `LLM.md`"));
  assert!(prompt.contains("# Project conventions"));
}

#[test]
fn test_no_commits_flag_drops_commit_messages() {
  let helper = repo_with_feature_branch();
  let repo = helper.repo();

  let generator = PrPromptGenerator {
    include_commit_messages: false,
    ..Default::default()
  };
  let prompt = generator
    .generate_review(&repo, "main", None, None, None)
    .expect("Could not generate prompt");

  assert!(!prompt.contains("Add extra module"));
}

#[test]
fn test_description_prompt_uses_description_instructions() {
  let helper = repo_with_feature_branch();
  let repo = helper.repo();

  let prompt = PrPromptGenerator::default()
    .generate_description(&repo, "main", None, None)
    .expect("Could not generate prompt");

  assert!(prompt.contains("pull request description"));
  assert!(prompt.contains("### Modified: `src/lib.rs`"));
}

#[test]
fn test_custom_instructions_are_passed_through() {
  let helper = repo_with_feature_branch();
  let repo = helper.repo();

  let prompt = PrPromptGenerator::default()
    .generate_custom("Only check for SQL injection.", &repo, "main", None, None, None)
    .expect("Could not generate prompt");

  assert!(prompt.contains("## Instructions\n\nOnly check for SQL injection."));
}

#[test]
fn test_everything_blacklisted_yields_no_changes_section() {
  let helper = repo_with_feature_branch();
  let repo = helper.repo();

  let generator = PrPromptGenerator {
    blacklist_patterns: vec!["*".to_string()],
    ..Default::default()
  };
  let prompt = generator
    .generate_review(&repo, "main", None, None, None)
    .expect("Could not generate prompt");

  assert!(prompt.contains("No files changed"));
  assert!(prompt.contains("No changes to display"));
}

#[test]
fn test_changed_files_lists_destination_paths() {
  let helper = repo_with_feature_branch();
  let repo = helper.repo();

  let mut files = repo.changed_files("main", None).expect("Could not list changed files");
  files.sort();

  assert_eq!(files, vec!["Cargo.lock", "docs/new_name.md", "src/extra.rs", "src/lib.rs"]);
}

#[test]
fn test_commit_messages_are_flattened() {
  let helper = TestRepo::new();
  helper.write_file("a.txt", "one\n");
  helper.commit_all("Initial commit");

  helper.git(&["checkout", "-b", "feature"]);
  helper.write_file("a.txt", "two\n");
  helper.commit_all("Change a\n\nLonger body explaining why.");

  let repo = helper.repo();
  let messages = repo.commit_messages("main", None).expect("Could not collect messages");

  assert_eq!(messages, vec!["Change a. Longer body explaining why."]);
}

#[test]
fn test_deleted_file_is_reported() {
  let helper = TestRepo::new();
  helper.write_file("doomed.txt", "short-lived\n");
  helper.write_file("kept.txt", "stays\n");
  helper.commit_all("Initial commit");

  helper.git(&["checkout", "-b", "feature"]);
  helper.git(&["rm", "doomed.txt"]);
  helper.commit_all("Remove doomed file");

  let repo = helper.repo();
  let prompt = PrPromptGenerator::default()
    .generate_review(&repo, "main", None, None, None)
    .expect("Could not generate prompt");

  assert!(prompt.contains("### Deleted: `doomed.txt`"));
  assert!(prompt.contains("-short-lived"));
}
