use anyhow::{Context, Result};
use clap::Parser;
use recast_core::{ApplyOptions, CancelToken, RefactorError};
use std::io::{self, IsTerminal};
use std::process;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod apply;
mod cli;
mod generate;
mod units;

use cli::{Cli, Commands, OutputFormat};

fn main() {
    init_tracing();

    let cancel = CancelToken::new();
    if let Err(e) = install_signal_handlers(&cancel) {
        eprintln!("Error: {e:#}");
        process::exit(2);
    }

    let cli = Cli::parse();
    let use_color = !cli.no_color && io::stdout().is_terminal();

    // Handle -C directory flag
    if let Some(ref dir) = cli.directory {
        std::env::set_current_dir(dir)
            .with_context(|| format!("Failed to change to directory: {}", dir.display()))
            .unwrap_or_else(|e| {
                eprintln!("Error: {e:#}");
                process::exit(2);
            });
    }

    let options = |timeout_ms: Option<u64>, dry_run: bool| ApplyOptions {
        cancel: cancel.clone(),
        unit_timeout: timeout_ms.map(Duration::from_millis),
        dry_run,
    };

    let result = match cli.command {
        Commands::Apply {
            file,
            source,
            find,
            replace,
            regex,
            max,
            dry_run,
            diff,
            timeout_ms,
            output,
            quiet,
        } => apply::handle_apply(
            &file,
            source.into(),
            &find,
            &replace,
            regex,
            max,
            diff,
            &options(timeout_ms, dry_run),
            use_color,
            output,
            quiet,
        ),

        Commands::Units {
            file,
            source,
            output,
        } => units::handle_units(&file, source.into(), &options(None, true), output),

        Commands::Generate {
            manifest,
            destination,
            timeout_ms,
            output,
            quiet,
        } => generate::handle_generate(
            &manifest,
            destination,
            &options(timeout_ms, false),
            output,
            quiet,
        ),
    };

    match result {
        Ok(()) => process::exit(0),
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(exit_code(&e));
        },
    }
}

/// Log to stderr, filtered by `RECAST_LOG` (warnings only by default)
fn init_tracing() {
    let filter = EnvFilter::try_from_env("RECAST_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Ctrl-C and SIGTERM cancel the running refactor; the content source then
/// exits without writing.
fn install_signal_handlers(cancel: &CancelToken) -> Result<()> {
    let on_sigint = cancel.clone();
    ctrlc::set_handler(move || {
        eprintln!("\nReceived SIGINT. Cancelling...");
        on_sigint.cancel();
    })
    .context("Error setting SIGINT handler")?;

    #[cfg(unix)]
    {
        use signal_hook::consts::SIGTERM;
        use signal_hook::iterator::Signals;

        let mut signals = Signals::new([SIGTERM]).context("Error setting SIGTERM handler")?;
        let on_sigterm = cancel.clone();
        std::thread::spawn(move || {
            if signals.forever().next().is_some() {
                eprintln!("\nReceived SIGTERM. Cancelling...");
                on_sigterm.cancel();
            }
        });
    }

    Ok(())
}

fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<RefactorError>() {
        Some(RefactorError::Cancelled) => 130,
        Some(e) if e.is_configuration() => 2, // Invalid rule
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_exit_codes() {
        let cancelled = anyhow::Error::new(RefactorError::Cancelled).context("Failed to apply");
        assert_eq!(exit_code(&cancelled), 130);

        let unbound = anyhow::Error::new(RefactorError::UnboundSource {
            rule: "r".to_string(),
        });
        assert_eq!(exit_code(&unbound), 2);

        assert_eq!(exit_code(&anyhow!("2 of 3 template files failed")), 1);
    }
}
