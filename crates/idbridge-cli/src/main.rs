mod cli;
mod commands;
mod observability;
mod output;

use anyhow::{Context, Result};
use clap::Parser;

use cli::{Cli, Commands};
use output::print_error;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    if let Some(warning) = dotenv_warning(dotenvy::dotenv()) {
        eprintln!("{warning}");
    }

    let cli = Cli::parse();
    let format = cli.format.unwrap_or_default();

    let cfg = idbridge_config::load_config(cli.config.as_deref())
        .context("failed to load configuration")?;
    observability::init_tracing_with_level(cli.log_level.as_deref().unwrap_or(&cfg.logging.level));

    match &cli.command {
        Commands::Config => {
            print!("{}", cfg.to_redacted_toml()?);
        }
        Commands::Providers => {
            let registry = cfg.registry()?;
            commands::providers::list(&registry, format)?;
        }
        Commands::AuthUrl(args) => {
            let registry = cfg.registry()?;
            commands::auth_url::print(&registry, args, format).await?;
        }
        Commands::Claims(args) => {
            let registry = cfg.registry()?;
            commands::claims::resolve(&registry, args, format).await?;
        }
    }

    Ok(())
}

/// A missing `.env` file is fine; anything else is worth a warning.
fn dotenv_warning<T>(result: Result<T, dotenvy::Error>) -> Option<String> {
    match result {
        Ok(_) => None,
        Err(dotenvy::Error::Io(ref err)) if err.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => Some(format!("Warning: Failed to load .env file: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_missing_dotenv_is_silent() {
        let dir = tempfile::tempdir().unwrap();
        let result = dotenvy::from_path(dir.path().join(".env"));
        assert!(dotenv_warning(result).is_none());
    }

    #[test]
    fn test_unparsable_dotenv_warns() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not a valid line").unwrap();

        let warning = dotenv_warning(dotenvy::from_path(file.path())).unwrap();
        assert!(warning.contains("Failed to load .env file"));
    }
}
