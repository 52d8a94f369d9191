mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "cryri",
    version,
    about = "Submit containerized compute jobs from a YAML run config"
)]
struct Cli {
    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Submit the job described by a run config.
    Submit {
        /// Path to the YAML run config.
        #[arg(default_value = "run.yaml")]
        config: PathBuf,
        /// Submission backend to use.
        #[arg(long, default_value = "manifest")]
        backend: String,
        /// Where the manifest backend writes the submission document.
        #[arg(long, default_value = "job.json")]
        out: PathBuf,
        /// Resolve and print the job without snapshotting or submitting.
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    /// Snapshot the workspace into a fresh run directory.
    Snapshot {
        /// Path to the YAML run config.
        #[arg(default_value = "run.yaml")]
        config: PathBuf,
    },
    /// Print the description a job would be submitted under.
    Describe {
        /// Path to the YAML run config.
        #[arg(default_value = "run.yaml")]
        config: PathBuf,
    },
    /// Show the resolved run config as the backend would see it.
    Inspect {
        /// Path to the YAML run config.
        #[arg(default_value = "run.yaml")]
        config: PathBuf,
    },
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("CRYRI_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .init();

    let json_output = cli.json;

    let result = match cli.command {
        Commands::Submit {
            config,
            backend,
            out,
            dry_run,
        } => commands::submit::run(&config, &backend, &out, dry_run, json_output),
        Commands::Snapshot { config } => commands::snapshot::run(&config, json_output),
        Commands::Describe { config } => commands::describe::run(&config, json_output),
        Commands::Inspect { config } => commands::inspect::run(&config, json_output),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            ExitCode::from(commands::exit_code_for_message(&msg))
        }
    }
}
