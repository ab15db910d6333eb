use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use console::Emoji;
use dotenv::dotenv;
use structopt::StructOpt;

use pr_prompt::config::App;
use pr_prompt::generator::PrPromptGenerator;
use pr_prompt::git::Repo;

const SUCCESS: Emoji<'_, '_> = Emoji("✨ ", "");

#[derive(StructOpt, Debug)]
#[structopt(name = "pr-prompt", about = "Generates markdown prompts for LLM-powered pull request review")]
enum Cli {
  /// Generate a code review prompt
  Review(GenerateArgs),

  /// Generate a prompt for writing a PR description
  Description(GenerateArgs),

  /// Generate a prompt with custom instructions
  Custom {
    /// Custom instructions for the LLM
    #[structopt(short = "i", long)]
    instructions: String,

    #[structopt(flatten)]
    args: GenerateArgs
  },

  /// Persist configuration defaults
  Config(ConfigArgs)
}

#[derive(StructOpt, Debug)]
struct GenerateArgs {
  /// Base branch/commit to compare against (e.g. origin/main)
  #[structopt(short = "b", long)]
  base_ref: String,

  /// Head branch/commit with the changes (default: HEAD)
  #[structopt(long)]
  head_ref: Option<String>,

  /// Output file path (default: derived from the prompt kind)
  #[structopt(short = "o", long, parse(from_os_str))]
  output: Option<PathBuf>,

  /// Print to stdout instead of writing a file
  #[structopt(long)]
  stdout: bool,

  /// Additional file patterns to exclude (repeatable)
  #[structopt(long = "blacklist", number_of_values = 1)]
  blacklist: Vec<String>,

  /// Additional context file patterns (repeatable)
  #[structopt(long = "context", number_of_values = 1)]
  context: Vec<String>,

  /// Exclude commit messages from the prompt
  #[structopt(long = "no-commits")]
  no_commits: bool,

  /// Maximum characters of diff content
  #[structopt(long = "max-diff-chars")]
  max_diff_chars: Option<usize>
}

#[derive(StructOpt, Debug)]
struct ConfigArgs {
  /// Comma-separated blacklist patterns to persist
  #[structopt(long)]
  blacklist: Option<String>,

  /// Comma-separated context patterns to persist
  #[structopt(long)]
  context: Option<String>,

  /// Maximum characters of diff content to persist
  #[structopt(long)]
  max_diff_chars: Option<usize>
}

#[derive(Debug, Clone, Copy)]
enum PromptKind {
  Review,
  Description,
  Custom
}

impl PromptKind {
  fn name(&self) -> &'static str {
    match self {
      PromptKind::Review => "review",
      PromptKind::Description => "description",
      PromptKind::Custom => "custom"
    }
  }

  fn default_output(&self) -> &'static str {
    match self {
      PromptKind::Review => "review_prompt.md",
      PromptKind::Description => "description_prompt.md",
      PromptKind::Custom => "custom_prompt.md"
    }
  }
}

fn main() -> Result<()> {
  env_logger::init();
  dotenv().ok();

  match Cli::from_args() {
    Cli::Review(args) => generate(PromptKind::Review, args, None),
    Cli::Description(args) => generate(PromptKind::Description, args, None),
    Cli::Custom { instructions, args } => generate(PromptKind::Custom, args, Some(instructions)),
    Cli::Config(args) => update_config(args)
  }
}

fn generate(kind: PromptKind, args: GenerateArgs, instructions: Option<String>) -> Result<()> {
  let mut generator = PrPromptGenerator::from_config();
  generator.blacklist_patterns.extend(args.blacklist);
  generator.context_patterns.extend(args.context);
  if args.no_commits {
    generator.include_commit_messages = false;
  }
  if let Some(max_diff_chars) = args.max_diff_chars {
    generator.max_diff_chars = max_diff_chars;
  }

  let repo = Repo::new().context("Not inside a git repository")?;
  let head_ref = args.head_ref.as_deref();

  eprintln!(
    "{}",
    format!(
      "Generating {} prompt (base: {}, head: {})...",
      kind.name(),
      args.base_ref,
      head_ref.unwrap_or("HEAD")
    )
    .blue()
  );

  let prompt = match kind {
    PromptKind::Review => generator.generate_review(&repo, &args.base_ref, head_ref, None, None)?,
    PromptKind::Description => generator.generate_description(&repo, &args.base_ref, head_ref, None)?,
    PromptKind::Custom => {
      generator.generate_custom(&instructions.unwrap_or_default(), &repo, &args.base_ref, head_ref, None, None)?
    }
  };

  if args.stdout {
    println!("{prompt}");
  } else {
    let output = args.output.unwrap_or_else(|| PathBuf::from(kind.default_output()));
    std::fs::write(&output, &prompt).with_context(|| format!("Failed to write prompt to {}", output.display()))?;
    println!(
      "{SUCCESS}Wrote {} prompt to {}",
      kind.name(),
      output.display().to_string().italic()
    );
    println!("   {}", format!("{} characters", prompt.len()).white());
  }

  Ok(())
}

fn update_config(args: ConfigArgs) -> Result<()> {
  let mut app = App::new()?;

  if let Some(blacklist) = args.blacklist {
    app.update_blacklist_patterns(blacklist)?;
  }
  if let Some(context) = args.context {
    app.update_context_patterns(context)?;
  }
  if let Some(max_diff_chars) = args.max_diff_chars {
    app.update_max_diff_chars(max_diff_chars)?;
  }

  Ok(())
}
