use std::path::Path;

use git2::{Diff, DiffFindOptions, DiffFormat, DiffOptions, ObjectType, Repository, RepositoryOpenFlags as Flag, Tree, TreeWalkMode, TreeWalkResult};
use log::{debug, warn};
use thiserror::Error;

use crate::profile;

#[derive(Error, Debug)]
pub enum GitError {
  #[error("Git error: {0}")]
  Git(#[from] git2::Error),

  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),

  #[error("Anyhow error: {0}")]
  Anyhow(#[from] anyhow::Error)
}

pub type Result<T, E = GitError> = std::result::Result<T, E>;

trait Utf8String {
  fn to_utf8(&self) -> String;
}

impl Utf8String for [u8] {
  fn to_utf8(&self) -> String {
    String::from_utf8_lossy(self).into_owned()
  }
}

/// Read-only view of a repository, scoped to what prompt generation
/// needs: two-ref diffs, commit messages and file contents at a ref.
pub struct Repo {
  repo: Repository
}

impl Repo {
  pub fn new() -> Result<Self> {
    Self::new_with_path(".".to_string())
  }

  pub fn new_with_path(path: String) -> Result<Self> {
    Ok(Repo {
      repo: Repository::open_ext(path, Flag::empty(), Vec::<&Path>::new())?
    })
  }

  fn commit_id_and_tree(&self, spec: &str) -> Result<(git2::Oid, Tree<'_>)> {
    let commit = self.repo.revparse_single(spec)?.peel_to_commit()?;
    Ok((commit.id(), commit.tree()?))
  }

  /// Trees for a `base...head` comparison: the merge base of the two refs
  /// on the old side, head itself on the new side. Falls back to the base
  /// tree when the refs share no history.
  fn diff_trees(&self, base_ref: &str, head_ref: Option<&str>) -> Result<(Tree<'_>, Tree<'_>)> {
    let (base_id, base_tree) = self.commit_id_and_tree(base_ref)?;
    let (head_id, head_tree) = self.commit_id_and_tree(head_ref.unwrap_or("HEAD"))?;

    let old_tree = match self.repo.merge_base(base_id, head_id) {
      Ok(merge_base) => self.repo.find_commit(merge_base)?.tree()?,
      Err(err) => {
        warn!("No merge base between {base_ref} and {}: {err}", head_ref.unwrap_or("HEAD"));
        base_tree
      }
    };

    Ok((old_tree, head_tree))
  }

  /// Destination-side paths of all files changed between the two refs,
  /// renames detected.
  pub fn changed_files(&self, base_ref: &str, head_ref: Option<&str>) -> Result<Vec<String>> {
    profile!("List changed files");

    let (old_tree, new_tree) = self.diff_trees(base_ref, head_ref)?;
    let mut diff = self.repo.diff_tree_to_tree(Some(&old_tree), Some(&new_tree), None)?;

    let mut find_opts = DiffFindOptions::new();
    find_opts.renames(true);
    diff.find_similar(Some(&mut find_opts))?;

    let mut files = Vec::new();
    diff.foreach(
      &mut |delta, _| {
        let path = delta.new_file().path().or_else(|| delta.old_file().path());
        match path {
          Some(path) => files.push(path.to_string_lossy().into_owned()),
          None => warn!("[diff] Could not get file path for a delta")
        }
        true
      },
      None,
      None,
      None
    )?;

    debug!("{} files changed between {base_ref} and {}", files.len(), head_ref.unwrap_or("HEAD"));
    Ok(files)
  }

  /// Full unified-diff text between the two refs. `context_lines` is set
  /// high enough by callers to pull whole files into the hunks.
  ///
  /// The diff deliberately covers every changed file, not just the
  /// caller's whitelist: rename detection needs both sides of a rename in
  /// the diff, and the segmenter filters by whitelist afterwards anyway.
  pub fn diff_text(&self, base_ref: &str, head_ref: Option<&str>, context_lines: u32) -> Result<String> {
    profile!("Generate diff text");

    let (old_tree, new_tree) = self.diff_trees(base_ref, head_ref)?;

    let mut opts = DiffOptions::new();
    opts.context_lines(context_lines);

    let mut diff = self.repo.diff_tree_to_tree(Some(&old_tree), Some(&new_tree), Some(&mut opts))?;

    let mut find_opts = DiffFindOptions::new();
    find_opts.renames(true);
    diff.find_similar(Some(&mut find_opts))?;

    render_patch(&diff)
  }

  /// Messages of the commits reachable from head but not from base,
  /// flattened to one line each.
  pub fn commit_messages(&self, base_ref: &str, head_ref: Option<&str>) -> Result<Vec<String>> {
    profile!("Collect commit messages");

    let base = self.repo.revparse_single(base_ref)?.peel_to_commit()?;
    let head = self.repo.revparse_single(head_ref.unwrap_or("HEAD"))?.peel_to_commit()?;

    let mut revwalk = self.repo.revwalk()?;
    revwalk.push(head.id())?;
    revwalk.hide(base.id())?;

    let mut messages = Vec::new();
    for oid in revwalk {
      let commit = self.repo.find_commit(oid?)?;
      let message = commit
        .message()
        .unwrap_or_default()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(". ");
      messages.push(message);
    }

    Ok(messages)
  }

  /// All blob paths in the tree at `spec`.
  pub fn list_files(&self, spec: &str) -> Result<Vec<String>> {
    let (_, tree) = self.commit_id_and_tree(spec)?;

    let mut files = Vec::new();
    tree.walk(TreeWalkMode::PreOrder, |dir, entry| {
      if entry.kind() == Some(ObjectType::Blob) {
        if let Some(name) = entry.name() {
          files.push(format!("{dir}{name}"));
        }
      }
      TreeWalkResult::Ok
    })?;

    Ok(files)
  }

  /// Content of the blob at `path` in the tree at `spec`, lossily decoded.
  pub fn file_content(&self, spec: &str, path: &str) -> Result<String> {
    let (_, tree) = self.commit_id_and_tree(spec)?;
    let entry = tree.get_path(Path::new(path))?;
    let blob = self.repo.find_blob(entry.id())?;
    Ok(blob.content().to_utf8().trim().to_string())
  }
}

/// Render a diff the way `git diff` prints it: libgit2 hands back file and
/// hunk headers whole, but content lines arrive without their `+`/`-`/` `
/// origin prefix.
fn render_patch(diff: &Diff<'_>) -> Result<String> {
  let mut text = String::new();

  diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
    match line.origin() {
      '+' | '-' | ' ' => text.push(line.origin()),
      _ => {}
    }
    text.push_str(&line.content().to_utf8());
    true
  })?;

  debug!("Rendered patch of {} bytes", text.len());
  Ok(text)
}
