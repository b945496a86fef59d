use anyhow::Result;
use colored::Colorize;
use idbridge_oidc::ProviderRegistry;
use serde_json::json;

use crate::cli::OutputFormat;
use crate::output::print_json;

pub fn list(registry: &ProviderRegistry, format: OutputFormat) -> Result<()> {
    let mut entries = Vec::with_capacity(registry.len());
    for id in registry.ids() {
        entries.push(registry.get(id)?);
    }

    match format {
        OutputFormat::Json => {
            let value: Vec<_> = entries
                .iter()
                .map(|p| {
                    let config = p.config();
                    json!({
                        "id": config.id,
                        "provider": config.provider.as_str(),
                        "label": config.display_name(),
                        "scope": config.scope,
                    })
                })
                .collect();
            print_json(&json!(value))
        }
        OutputFormat::Text => {
            if entries.is_empty() {
                println!("No identity providers configured.");
                return Ok(());
            }
            for provider in entries {
                let config = provider.config();
                println!(
                    "{} {} ({})",
                    config.id.cyan(),
                    config.display_name(),
                    config.provider
                );
                if !config.scope.is_empty() {
                    println!("  scope: {}", config.scope.join(" "));
                }
            }
            Ok(())
        }
    }
}
