//! Refresh command - trades a token for a fresh one.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use super::{Context, print_json, token_arg};

/// Arguments for the refresh command.
#[derive(Args, Debug)]
pub struct RefreshArgs {
    /// Signed token
    pub token: String,
}

#[derive(Debug, Serialize)]
struct RefreshOutput {
    token: String,
}

/// Run the refresh command.
pub async fn run(args: RefreshArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let token = client.refresh(&token_arg(&args.token)).await?;

    if ctx.json_output {
        return print_json(&RefreshOutput {
            token: token.into_string(),
        });
    }
    println!("{}", token);
    Ok(())
}
