//! Revoke command - invalidates a token upstream.

use anyhow::Result;
use clap::Args;
use console::Style;
use serde::Serialize;

use super::{Context, print_json, token_arg};

/// Arguments for the revoke command.
#[derive(Args, Debug)]
pub struct RevokeArgs {
    /// Signed token
    pub token: String,
}

#[derive(Debug, Serialize)]
struct RevokeOutput {
    revoked: bool,
}

/// Run the revoke command.
pub async fn run(args: RevokeArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    client.revoke(&token_arg(&args.token)).await?;

    if ctx.json_output {
        return print_json(&RevokeOutput { revoked: true });
    }
    let green = Style::new().green();
    println!("{}", green.apply_to("Token revoked"));
    Ok(())
}
