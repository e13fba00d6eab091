//! Terminal front end for authoring SAAD probe files.
//!
//! Every subcommand resolves the project root first (`--project`,
//! `SAAD_PROJECT_ROOT`, or the nearest ancestor holding a `SAAD/` directory)
//! and runs the layout pre-flight checks before any prompt is shown. Only
//! `add` and `modules` need module definitions.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use saad_probes::shell::{
    describe_catalog, describe_probe_files, describe_probes, resolve_probe_file,
};
use saad_probes::{PROJECT_ROOT_ENV, ProjectLayout, Prompter, find_project_root, read_probe_file};
use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(
    name = "saad-probe",
    version,
    about = "Author SAAD probe files from module command templates"
)]
struct Cli {
    /// Project directory containing the SAAD folder
    #[arg(long, global = true, env = PROJECT_ROOT_ENV)]
    project: Option<PathBuf>,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Interactively add probes and write them to a new probe file
    Add,
    /// Re-enter the fields of an existing probe file and overwrite it
    Edit {
        /// Probe file name under SAAD/probe_configs, or a path
        file: String,
    },
    /// List the modules declared under SAAD/module_configs
    Modules,
    /// List probe files and the probes they contain
    List,
    /// Print the probes stored in one probe file
    Show {
        /// Probe file name under SAAD/probe_configs, or a path
        file: String,
    },
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    if let Err(err) = run(cli) {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let cwd = env::current_dir().context("reading current directory")?;
    let root = find_project_root(cli.project.as_deref(), &cwd)?;
    let layout = match cli.command {
        Command::Add | Command::Modules => ProjectLayout::open(&root)?,
        Command::Edit { .. } | Command::List | Command::Show { .. } => {
            ProjectLayout::open_probe_files(&root)?
        }
    };

    let stdout = io::stdout();
    match cli.command {
        Command::Add => {
            let catalog = layout.load_catalog()?;
            let mut prompter = Prompter::new(io::stdin().lock(), stdout.lock());
            prompter.add_probes(&layout, &catalog)?;
        }
        Command::Edit { file } => {
            let mut prompter = Prompter::new(io::stdin().lock(), stdout.lock());
            prompter.edit_probes(&layout, &file)?;
        }
        Command::Modules => {
            let catalog = layout.load_catalog()?;
            stdout.lock().write_all(describe_catalog(&catalog).as_bytes())?;
        }
        Command::List => {
            stdout
                .lock()
                .write_all(describe_probe_files(&layout)?.as_bytes())?;
        }
        Command::Show { file } => {
            let path = resolve_probe_file(&layout, &file)?;
            let probes = read_probe_file(&path)?;
            stdout.lock().write_all(describe_probes(&probes).as_bytes())?;
        }
    }
    Ok(())
}
