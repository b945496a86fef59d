use std::time::Duration;

use anyhow::Result;
use idbridge_oidc::{CallbackQuery, Claims, OAuth2Token, ProviderRegistry, RequestContext};

use crate::cli::{ClaimsArgs, OutputFormat};
use crate::output::{print_error, print_field, print_json, print_success};

pub async fn resolve(registry: &ProviderRegistry, args: &ClaimsArgs, format: OutputFormat) -> Result<()> {
    let provider = registry.get(&args.provider)?;
    let ctx = RequestContext::new().with_timeout(Duration::from_secs(args.timeout));

    // Ctrl-C aborts in-flight requests and pending retries.
    let canceller = ctx.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling request");
            canceller.cancel();
        }
    });

    let token = OAuth2Token::bearer(args.access_token.clone());
    let query: CallbackQuery = args.query.iter().cloned().collect();
    let result = provider.claims(&ctx, &token, &query).await;
    interrupt.abort();

    match result {
        Ok(claims) => print_claims(&claims, format),
        Err(err) => {
            print_error(err.public_message());
            anyhow::bail!(
                "{} failure for provider '{}': {}",
                err.kind(),
                err.provider(),
                err.reason()
            )
        }
    }
}

fn print_claims(claims: &Claims, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(&serde_json::to_value(claims)?),
        OutputFormat::Text => {
            print_success(&format!("Resolved claims for {}", claims.display_name()));
            print_field("Subject", &claims.subject);
            print_field("Issuer", &claims.issuer);
            print_field("Email", &claims.email);
            print_field("Email verified", if claims.email_verified { "yes" } else { "no" });
            print_field("Given name", &claims.given_name);
            print_field("Last name", &claims.last_name);
            print_field("Picture", &claims.picture);
            print_field("Locale", &claims.locale);
            Ok(())
        }
    }
}
