use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "idbridge")]
#[command(about = "idbridge CLI - inspect identity providers and resolve claims")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to ./idbridge.toml)
    #[arg(short, long, global = true, env = "IDBRIDGE_CONFIG")]
    pub config: Option<String>,

    /// Log level (overrides logging.level; RUST_LOG wins over both)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List configured identity providers
    Providers,
    /// Print the authorization URL for a provider
    AuthUrl(AuthUrlArgs),
    /// Resolve claims for an access token
    Claims(ClaimsArgs),
    /// Show the effective configuration with secrets masked
    Config,
}

#[derive(clap::Args)]
pub struct AuthUrlArgs {
    /// Provider ID
    pub provider: String,
    /// OAuth state parameter (defaults to a fresh flow ID)
    #[arg(long)]
    pub state: Option<String>,
}

#[derive(clap::Args)]
pub struct ClaimsArgs {
    /// Provider ID
    pub provider: String,
    /// Access token from a completed code exchange
    #[arg(long, env = "IDBRIDGE_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: String,
    /// Callback query parameters (key=value, repeatable)
    #[arg(short, long = "query", value_parser = parse_key_val)]
    pub query: Vec<(String, String)>,
    /// Overall timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid key=value pair: no '=' in '{s}'"))?;
    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_val() {
        assert_eq!(
            parse_key_val("code=abc=def").unwrap(),
            ("code".to_string(), "abc=def".to_string())
        );
        assert!(parse_key_val("novalue").is_err());
    }

    #[test]
    fn test_cli_parses_claims_command() {
        let cli = Cli::try_parse_from([
            "idbridge",
            "claims",
            "linkedin",
            "--access-token",
            "tok",
            "-q",
            "state=xyz",
            "--format",
            "json",
        ])
        .unwrap();

        assert!(matches!(cli.format, Some(OutputFormat::Json)));
        match cli.command {
            Commands::Claims(args) => {
                assert_eq!(args.provider, "linkedin");
                assert_eq!(args.query, vec![("state".to_string(), "xyz".to_string())]);
                assert_eq!(args.timeout, 30);
            }
            _ => panic!("expected claims command"),
        }
    }
}
