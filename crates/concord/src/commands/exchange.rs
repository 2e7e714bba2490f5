//! Exchange command - swaps an authorization code for a signed token.

use anyhow::Result;
use clap::Args;
use console::Style;
use serde::Serialize;

use super::{Context, print_json};

/// Arguments for the exchange command.
#[derive(Args, Debug)]
pub struct ExchangeArgs {
    /// Authorization code from the redirect
    pub code: String,

    /// Also fetch every resource the granted scopes cover
    #[arg(long)]
    pub prefetch: bool,
}

#[derive(Debug, Serialize)]
struct ExchangeOutput {
    token: String,
    scope: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    prefetched: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    prefetch_errors: Vec<String>,
}

/// Run the exchange command.
pub async fn run(args: ExchangeArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let token = client.exchange_code(args.code.trim()).await?;
    let grant = client.verify(token.as_str())?;

    let mut prefetched = Vec::new();
    let mut prefetch_errors = Vec::new();
    if args.prefetch {
        let prefetch = client.prefetch(&token).await?;
        prefetched = prefetch.fetched().iter().map(|k| k.to_string()).collect();
        prefetch_errors = prefetch
            .errors()
            .into_iter()
            .map(|(kind, err)| format!("{}: {}", kind, err))
            .collect();
    }

    if ctx.json_output {
        return print_json(&ExchangeOutput {
            token: token.into_string(),
            scope: grant.scope,
            prefetched,
            prefetch_errors,
        });
    }

    println!("{}", token);
    if ctx.verbose || args.prefetch {
        let dim = Style::new().dim();
        let red = Style::new().red();
        eprintln!();
        eprintln!("  {} {}", dim.apply_to("Scope:"), grant.scope);
        if !prefetched.is_empty() {
            eprintln!("  {} {}", dim.apply_to("Prefetched:"), prefetched.join(", "));
        }
        for err in &prefetch_errors {
            eprintln!("  {} {}", red.apply_to("Failed:"), err);
        }
    }
    Ok(())
}
