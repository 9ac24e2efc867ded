use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::{Generator, generate};
use colored::Colorize;
use pbxsync::cli::Cli;
use pbxsync::commands::sync::SyncOptions;
use pbxsync::error::{SyncError, exit_code_for};
use pbxsync::output::{self, Verbosity};
use pbxsync::{SyncContext, commands};
use std::io::{self, IsTerminal};
use std::process;
use tracing::warn;
use tracing_subscriber::EnvFilter;

fn main() {
    let code = match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            exit_code_for(&e)
        }
    };
    process::exit(code);
}

fn run() -> Result<i32> {
    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        print_completions(shell, &mut Cli::command());
        return Ok(0);
    }

    init_tracing(cli.verbose);
    output::set_verbosity(if cli.quiet {
        Verbosity::Quiet
    } else if cli.verbose {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    });

    let ctx = match (&cli.source_dir, &cli.manifest) {
        (Some(source_dir), Some(manifest)) => {
            SyncContext::ad_hoc(source_dir.clone(), manifest.clone())
        }
        _ => SyncContext::load(cli.config.as_deref())?,
    };
    if let Some(path) = &ctx.config_path {
        output::verbose(&format!("Using configuration {}", path.display()));
    }

    let colorize = !cli.no_color && ctx.config.core.color && io::stdout().is_terminal();
    if !colorize {
        colored::control::set_override(false);
    }

    if cli.list {
        commands::list::execute(&ctx.config, &mut io::stdout().lock())?;
        return Ok(0);
    }

    let only = cli
        .only
        .as_deref()
        .map(glob::Pattern::new)
        .transpose()
        .map_err(|e| SyncError::config("", format!("invalid --only pattern: {e}")))?;
    let options = SyncOptions {
        mode: cli.mode(),
        only,
        diff_limit: ctx.config.core.diff_limit,
        colorize,
    };

    let projects = ctx.config.select(&cli.projects, cli.all)?;
    let several = projects.len() > 1;
    let mut exit_code = 0;

    for project in projects {
        if several {
            output::project_header(&project.name);
        }
        let mut out = io::stdout().lock();
        if let Err(e) = commands::sync::execute(project, &options, &mut out) {
            let code = exit_code_for(&e);
            let kind = e
                .chain()
                .find_map(|cause| cause.downcast_ref::<SyncError>())
                .map_or("other", SyncError::error_type);
            warn!(project = %project.name, code, kind, "project failed");
            output::error(&format!("Error: {e:#}"));
            exit_code = exit_code.max(code);
        }
    }

    Ok(exit_code)
}

/// Installs the stderr subscriber; `PBXSYNC_LOG` (then `RUST_LOG`) overrides
/// the default level.
fn init_tracing(verbose: bool) {
    let default = if verbose { "pbxsync=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("PBXSYNC_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn print_completions<G: Generator>(g: G, cmd: &mut clap::Command) {
    generate(g, cmd, cmd.get_name().to_string(), &mut io::stdout());
}
