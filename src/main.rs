use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::{Generator, generate};
use colored::Colorize;
use dirsafe::cli::{Cli, Commands};
use dirsafe::config::Config;
use dirsafe::engine::MirrorController;
use dirsafe::output::{self, ConsoleProgress, Verbosity};
use dirsafe::utils::format_signed_size;
use std::io;
use std::process;
use std::sync::Arc;

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {e:#}", "Error:".red().bold());
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

    match cli.command {
        Commands::Run => execute_mirror(&cli, true),
        Commands::Preview => execute_mirror(&cli, false),
        Commands::Completion { shell } => {
            print_completions(shell, &mut Cli::command());
            Ok(())
        }
    }
}

/// Loads the config, builds the controller, and runs or previews it.
fn execute_mirror(cli: &Cli, apply: bool) -> Result<()> {
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::default_path()?,
    };
    let config = Config::load(&config_path)?;

    let groups = config.build_groups()?;
    if groups.is_empty() {
        output::warning("No groups configured; nothing to do");
        return Ok(());
    }

    let destination = config.destination_root()?;
    let progress = Arc::new(ConsoleProgress::new());
    let mut controller = MirrorController::new(
        destination,
        groups,
        config.reporting.granularity_bytes,
        progress,
    )?;
    if let Some(label) = &config.destination.user_label {
        controller = controller.with_user_label(label.clone());
    }

    if apply {
        controller.run()?;
    } else {
        controller.preview()?;
    }

    let verb = if apply { "synced" } else { "preview" };
    for group in controller.groups() {
        let stats = group.stats();
        output::action(
            verb,
            &format!(
                "{}: {} new, {} updated, {} deleted ({})",
                group.name(),
                stats.new_files,
                stats.updated_files,
                stats.deleted_files,
                format_signed_size(stats.net_change_bytes)
            ),
        );
    }

    if controller.error_encountered() {
        output::warning("Some files could not be mirrored; see errors above");
    } else if apply {
        output::success("Mirror complete");
    } else {
        output::info("Preview only; destination untouched");
    }

    Ok(())
}

/// Initializes the tracing subscriber, honoring `RUST_LOG` when set.
fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "dirsafe=debug" } else { "dirsafe=warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn print_completions<G: Generator>(g: G, cmd: &mut clap::Command) {
    generate(g, cmd, cmd.get_name().to_string(), &mut io::stdout());
}
