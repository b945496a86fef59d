use anyhow::{Context, Result};
use idbridge_oidc::{AuthFlowContext, ProviderRegistry, RequestContext};
use serde_json::json;

use crate::cli::{AuthUrlArgs, OutputFormat};
use crate::output::{print_field, print_json};

pub async fn print(registry: &ProviderRegistry, args: &AuthUrlArgs, format: OutputFormat) -> Result<()> {
    let provider = registry.get(&args.provider)?;
    let flow = AuthFlowContext::generate();
    let state = args
        .state
        .clone()
        .unwrap_or_else(|| flow.flow_id().to_string());

    let settings = provider
        .oauth2(&RequestContext::new())
        .await
        .with_context(|| format!("cannot build OAuth2 settings for '{}'", args.provider))?;
    let options = provider.auth_code_url_options(&flow);
    let url = settings.authorization_url(&state, &options);

    match format {
        OutputFormat::Json => print_json(&json!({
            "provider": args.provider,
            "state": state,
            "redirect_url": settings.redirect_url.as_str(),
            "authorization_url": url.as_str(),
        })),
        OutputFormat::Text => {
            print_field("Redirect URL", settings.redirect_url.as_str());
            print_field("State", &state);
            println!("{url}");
            Ok(())
        }
    }
}
