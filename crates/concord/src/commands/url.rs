//! Url command - prints the authorization URL.

use anyhow::Result;
use clap::Args;
use concord_client::generate_state;
use console::Style;
use serde::Serialize;

use super::{Context, print_json};

/// Arguments for the url command.
#[derive(Args, Debug)]
pub struct UrlArgs {
    /// CSRF state to embed (random if omitted)
    #[arg(long)]
    pub state: Option<String>,

    /// Omit the state parameter
    #[arg(long, conflicts_with = "state")]
    pub no_state: bool,

    /// Override the configured scopes (space or comma separated)
    #[arg(long)]
    pub scopes: Option<String>,
}

#[derive(Debug, Serialize)]
struct UrlOutput {
    url: String,
    state: Option<String>,
    scopes: String,
}

/// Run the url command.
pub async fn run(args: UrlArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;

    if let Some(scopes) = &args.scopes {
        let names: Vec<&str> = scopes
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .collect();
        let accepted = client.set_scopes(names.iter().copied());
        if accepted.len() < names.len() {
            tracing::warn!(
                requested = names.len(),
                accepted = accepted.len(),
                "Dropped unrecognized scopes"
            );
        }
    }

    let state = if args.no_state {
        None
    } else {
        Some(args.state.unwrap_or_else(generate_state))
    };
    let url = match &state {
        Some(state) => client.build_authorization_url_with_state(state)?,
        None => client.build_authorization_url()?,
    };

    if ctx.json_output {
        return print_json(&UrlOutput {
            url,
            state,
            scopes: client.scopes().to_param(),
        });
    }

    let dim = Style::new().dim();
    println!("{}", url);
    if ctx.verbose {
        println!();
        println!("  {} {}", dim.apply_to("Scopes:"), client.scopes().to_param());
        if let Some(state) = &state {
            println!("  {} {}", dim.apply_to("State:"), state);
        }
    }
    Ok(())
}
