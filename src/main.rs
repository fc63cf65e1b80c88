use anyhow::Result;
use asexport::cli::{Cli, Commands};
use asexport::commands::{self, export::RunParams};
use asexport::errors::ExportError;
use asexport::output::{self, Verbosity};
use asexport::{ExportContext, LOG_ENV};
use clap::{CommandFactory, Parser};
use clap_complete::{Generator, generate};
use std::io;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    if let Err(e) = run() {
        output::error(&format!("Error: {e:#}"));
        if let Some(hint) = e
            .downcast_ref::<ExportError>()
            .and_then(ExportError::suggestion)
        {
            output::warning(&format!("hint: {hint}"));
        }
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);
    if cli.quiet {
        output::set_verbosity(Verbosity::Quiet);
    } else if cli.verbose {
        output::set_verbosity(Verbosity::Verbose);
    }

    // Completion needs no configuration
    if let Commands::Completion { shell } = cli.command {
        print_completions(shell, &mut Cli::command());
        return Ok(());
    }

    let ctx = match cli.config {
        Some(path) => ExportContext::new_with_config_path(path)?,
        None => ExportContext::new()?,
    };

    match cli.command {
        Commands::Export {
            execpath,
            source,
            target,
            db,
            yes,
            dry_run,
        } => {
            if dry_run {
                return commands::status::execute(&ctx, &source, &target, &db);
            }

            let executable = execpath
                .or_else(|| ctx.config.export.executable.clone())
                .ok_or_else(|| {
                    ExportError::Validation(
                        "No executable given: pass --execpath or set export.executable in the config"
                            .into(),
                    )
                })?;

            let params = RunParams {
                executable,
                source_dir: source,
                target_dir: target,
                manifest_path: db,
                mute_prompt: yes,
            };
            commands::export::execute(&ctx, &params)?;
        }
        Commands::Status { source, target, db } => {
            commands::status::execute(&ctx, &source, &target, &db)?;
        }
        Commands::Completion { .. } => {}
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn print_completions<G: Generator>(g: G, cmd: &mut clap::Command) {
    generate(g, cmd, cmd.get_name().to_string(), &mut io::stdout());
}
