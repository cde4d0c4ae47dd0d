use anyhow::Result;
use clap::{Parser, Subcommand};

use cdtools::clock::SystemClock;
use cdtools::commands::{self, CommandContext};
use cdtools::git::GitRepository;
use cdtools::github::GhCli;
use cdtools::ui::{self, TerminalPrompter};
use cdtools::CdToolsError;

#[derive(Parser)]
#[command(
    name = "cdtools",
    about = "Release pull requests with tagged prerelease versions across one or more projects",
    disable_version_flag = true
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write .cdtools/config.json for this repository
    Init,
    /// Create a `<name>(<tag>)` release branch from the current branch
    StartPr,
    /// Bump changed projects, commit, push and open the pull request
    PushPr,
    /// Move versions to the next tag and merge the pull request
    EndPr,
}

fn main() {
    env_logger::init();

    if let Err(err) = run() {
        match err.downcast_ref::<CdToolsError>() {
            Some(e) => {
                ui::display_error(&e.to_string());
                if let Some(hint) = e.hint() {
                    ui::display_hint(hint);
                }
            }
            None => ui::display_error(&format!("{:#}", err)),
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let cwd = std::env::current_dir()?;
    let git = GitRepository::open(&cwd)?;
    let root = git.work_tree().to_path_buf();
    log::debug!("repository root {}", root.display());

    let forge = GhCli::new(root.clone());
    let prompter = TerminalPrompter::new();
    let clock = SystemClock;
    let ctx = CommandContext {
        root,
        git: &git,
        forge: &forge,
        prompter: &prompter,
        clock: &clock,
    };

    match cli.command {
        Command::Init => commands::init::run(&ctx)?,
        Command::StartPr => {
            commands::start_pr::run(&ctx)?;
        }
        Command::PushPr => {
            commands::push_pr::run(&ctx)?;
        }
        Command::EndPr => {
            commands::end_pr::run(&ctx)?;
        }
    }
    Ok(())
}
