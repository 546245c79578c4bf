use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use cardbox::commands::{browse, create, quiz, sets};
use cardbox::store::{STUDY_FILE, StudySetRepository};
use cardbox::utils::get_data_dir;

#[derive(Parser, Debug)]
#[command(
    name = "cardbox",
    version,
    about = "Flashcard study sets, in your terminal.",
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true,
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Flip through the cards of a study set
    Browse {
        /// Name of the study set
        #[arg(value_name = "SET")]
        set: String,
    },
    /// Take a graded quiz over a shuffled study set
    Quiz {
        /// Name of the study set
        #[arg(value_name = "SET")]
        set: String,
    },
    /// Create a study set or add cards to an existing one
    Create {
        /// Name of the study set
        #[arg(value_name = "SET")]
        set: String,
    },
    /// Show every study set with its card count and latest score
    Sets {
        /// Print a plain summary instead of the TUI dashboard
        #[arg(long, default_value_t = false)]
        plain: bool,
    },
}

fn main() {
    if let Err(err) = run_cli() {
        eprintln!("{:?}", err);
        std::process::exit(1);
    }
}

fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    let study_file = get_data_dir()?.join(STUDY_FILE);
    let mut repo = StudySetRepository::load(&study_file)
        .with_context(|| format!("failed to open {}", study_file.display()))?;

    match cli.command {
        Command::Browse { set } => browse::run(&repo, &set)?,
        Command::Quiz { set } => quiz::run(&mut repo, &set)?,
        Command::Create { set } => create::run(&mut repo, &set)?,
        Command::Sets { plain } => sets::run(&repo, plain)?,
    }

    Ok(())
}
