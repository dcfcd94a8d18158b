mod cmd;
mod output;
mod session;

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgGroup, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmd::{cmd_apply, cmd_clean, cmd_list, cmd_render, cmd_select, cmd_status};
use output::ColorChoice;

/// envswitch - Switch build targets between named environment profiles
#[derive(Parser)]
#[command(name = "envswitch")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Solution directory or .sln file
  #[arg(short, long, global = true, default_value = ".")]
  solution: PathBuf,

  /// When to use colors
  #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
  color: ColorChoice,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// List selectable profiles
  List {
    /// Target to list besides the shared scope
    #[arg(short, long)]
    target: Option<String>,

    /// Output as JSON
    #[arg(long)]
    json: bool,
  },

  /// Select a profile and update property sheets
  #[command(group(ArgGroup::new("scope").args(["target", "shared"])))]
  Select {
    /// Profile name
    profile: String,

    /// Target the profile belongs to
    #[arg(short, long)]
    target: Option<String>,

    /// Select a shared profile
    #[arg(long)]
    shared: bool,
  },

  /// Show the current selection
  Status {
    /// Output as JSON
    #[arg(long)]
    json: bool,
  },

  /// Print the property sheet of a scope without writing it
  Render {
    /// Target name, or Shared
    scope: String,
  },

  /// Link every project and regenerate all property sheets
  Apply,

  /// Remove all generated property sheets
  Clean {
    /// Also remove the persisted selection
    #[arg(long)]
    state: bool,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  cli.color.apply();

  let filter = if cli.verbose {
    EnvFilter::new("envswitch=debug,envswitch_lib=debug")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
  };
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match cli.command {
    Commands::List { target, json } => cmd_list(&cli.solution, target.as_deref(), json),
    Commands::Select {
      profile,
      target,
      shared,
    } => {
      let scope = match (&target, shared) {
        (_, true) => cmd::ScopeArg::Shared,
        (Some(target), false) => cmd::ScopeArg::Target(target),
        (None, false) => cmd::ScopeArg::Auto,
      };
      cmd_select(&cli.solution, &profile, scope)
    }
    Commands::Status { json } => cmd_status(&cli.solution, cli.verbose, json),
    Commands::Render { scope } => cmd_render(&cli.solution, &scope),
    Commands::Apply => cmd_apply(&cli.solution),
    Commands::Clean { state } => cmd_clean(&cli.solution, state),
  }
}
