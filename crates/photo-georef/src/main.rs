mod precision;
mod run;
mod settings;

use clap::Parser;
use settings::Settings;
use tracing_subscriber::EnvFilter;

/// Log to stderr so stdout carries only the JSON results.
/// `RUST_LOG` wins over `--verbose` when set.
fn setup_logging(verbose: bool) {
    let default = if verbose {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let settings = Settings::parse();
    setup_logging(settings.verbose);
    run::run(&settings)?;
    Ok(())
}
