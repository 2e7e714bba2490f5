//! Inspect command - verifies a token offline and shows its grant.

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Args;
use console::{Style, style};
use serde::Serialize;

use super::{Context, print_json, token_arg};

/// Arguments for the inspect command.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Signed token
    pub token: String,
}

/// Grant details without the raw credentials.
#[derive(Debug, Serialize)]
struct InspectOutput {
    fingerprint: String,
    token_type: String,
    scopes: Vec<String>,
    expires_in: u64,
    obtained_at: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
    expired: bool,
    refreshable: bool,
}

/// Run the inspect command.
pub async fn run(args: InspectArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let token = token_arg(&args.token);
    let grant = client.verify(token.as_str())?;

    let output = InspectOutput {
        fingerprint: token.fingerprint().to_string(),
        token_type: grant.token_type.clone(),
        scopes: grant.scopes().iter().map(|s| s.to_string()).collect(),
        expires_in: grant.expires_in,
        obtained_at: grant.obtained_at,
        expires_at: grant.expires_at(),
        expired: grant.is_expired(),
        refreshable: grant.has_refresh_token(),
    };

    if ctx.json_output {
        return print_json(&output);
    }

    let dim = Style::new().dim();
    let green = Style::new().green();
    let red = Style::new().red();
    let status = if output.expired {
        red.apply_to("● expired")
    } else {
        green.apply_to("● valid")
    };

    println!();
    println!("{}", style("Token").bold());
    println!("{}", dim.apply_to("─".repeat(40)));
    println!();
    println!("  {} {}", dim.apply_to("Status:"), status);
    println!("  {} {}…", dim.apply_to("Token:"), output.fingerprint);
    println!("  {} {}", dim.apply_to("Type:"), output.token_type);
    println!("  {} {}", dim.apply_to("Scopes:"), output.scopes.join(" "));
    match output.expires_at {
        Some(at) => println!("  {} {}", dim.apply_to("Expires:"), at.to_rfc3339()),
        None => println!(
            "  {} in {}s of issue",
            dim.apply_to("Expires:"),
            output.expires_in
        ),
    }
    println!(
        "  {} {}",
        dim.apply_to("Refresh:"),
        if output.refreshable { "yes" } else { "no" }
    );
    println!();
    Ok(())
}
