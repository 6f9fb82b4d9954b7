//! Slate CLI - drive standoff text annotation from the command line

mod io;
mod script;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use slate_core::{process_file_list, AnnotationType, Datum, Outcome, Scope, Session};

#[derive(Parser, Debug)]
#[command(name = "slate")]
#[command(about = "A tool for annotating text data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate the file list and load every file
    Check(SessionArgs),
    /// Apply a script of annotation commands to the file list
    Run {
        #[command(flatten)]
        session: SessionArgs,

        /// File with one command per line
        #[arg(long)]
        script: PathBuf,
    },
    /// Show where the comparison annotations disagree
    Agreement(SessionArgs),
}

impl Commands {
    fn session_args(&self) -> &SessionArgs {
        match self {
            Commands::Check(args) | Commands::Agreement(args) => args,
            Commands::Run { session, .. } => session,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct SessionArgs {
    /// Files to be annotated
    pub data: Vec<PathBuf>,

    /// Files containing lists of files to be annotated
    #[arg(short = 'd', long = "data-list")]
    pub data_lists: Vec<PathBuf>,

    /// The scope of annotation (character, token, line, document)
    #[arg(short, long)]
    pub scope: Option<Scope>,

    /// The type of annotation (categorical, link, text)
    #[arg(short = 't', long = "ann-type")]
    pub annotation_type: Option<AnnotationType>,

    /// JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Label file with one `LABEL [key [start-mark [end-mark]]]` per line
    #[arg(long)]
    pub labels: Option<PathBuf>,

    /// Prefix for the log, config and todo files
    #[arg(short = 'l', long)]
    pub log_prefix: Option<String>,

    /// Log debugging messages
    #[arg(long)]
    pub log_debug: bool,

    /// Do not allow changes or save annotations
    #[arg(short, long)]
    pub readonly: bool,

    /// Read and overwrite existing output files
    #[arg(short, long)]
    pub overwrite: bool,

    /// Do not allow a span to link to itself
    #[arg(long)]
    pub prevent_self_links: bool,

    /// Do not allow links to point forwards
    #[arg(long)]
    pub prevent_forward_links: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let args = cli.command.session_args();

    let prefix = args.log_prefix.clone().unwrap_or_else(|| {
        format!(
            "annotation_log.{}",
            chrono::Local::now().format("%Y-%m-%d.%H-%M-%S")
        )
    });
    io::init_logging(&prefix, args.log_debug)?;
    info!(?cli, "starting");

    let mut config = io::load_config(args)?;
    if matches!(cli.command, Commands::Agreement(_)) {
        config.readonly = true;
        config.overwrite = true;
    }
    io::write_config(&prefix, &config)?;

    let lines = io::collect_file_list(&args.data, &args.data_lists)?;
    let entries = process_file_list(&lines, &config)?;

    match &cli.command {
        Commands::Check(_) => {
            for entry in &entries {
                let datum = Datum::load(
                    &config,
                    &entry.raw_file,
                    &entry.output_file,
                    &entry.comparison_files,
                )?;
                println!(
                    "{}: {} lines, {} items, {} compared",
                    entry.raw_file.display(),
                    datum.doc().line_count(),
                    datum.items().len(),
                    datum.other_annotations().len()
                );
            }
        }
        Commands::Run { script, .. } => {
            let text = std::fs::read_to_string(script)
                .with_context(|| format!("Failed to read script: {}", script.display()))?;
            let commands = script::parse_script(&text, &config)?;

            let mut session = Session::new(config.clone(), entries)?;
            let mut quit = false;
            for command in commands {
                if session.apply(command)? == Outcome::Quit {
                    quit = true;
                    break;
                }
            }
            if !quit {
                session.save()?;
            }

            let todo = PathBuf::from(format!("{}.todo", prefix));
            session
                .write_progress(&todo)
                .with_context(|| format!("Failed to write progress: {}", todo.display()))?;
            info!(path = %todo.display(), "finished");
        }
        Commands::Agreement(_) => {
            for entry in &entries {
                let datum = Datum::load(
                    &config,
                    &entry.raw_file,
                    &entry.output_file,
                    &entry.comparison_files,
                )?;
                for disagreement in datum.disagreements() {
                    println!(
                        "{}\t{}\t{}",
                        entry.raw_file.display(),
                        disagreement.missing,
                        disagreement.item
                    );
                }
            }
        }
    }
    Ok(())
}
