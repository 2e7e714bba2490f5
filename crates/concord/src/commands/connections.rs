//! Connections command - lists linked third-party accounts.

use anyhow::Result;
use clap::Args;
use console::{Style, style};

use super::{Context, print_json, token_arg};

/// Arguments for the connections command.
#[derive(Args, Debug)]
pub struct ConnectionsArgs {
    /// Signed token
    pub token: String,

    /// Skip the cache and always fetch
    #[arg(long)]
    pub no_cache: bool,
}

/// Run the connections command.
pub async fn run(args: ConnectionsArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let connections = client
        .get_connections(&token_arg(&args.token), !args.no_cache)
        .await?;

    if ctx.json_output {
        return print_json(&*connections);
    }

    let dim = Style::new().dim();
    let green = Style::new().green();
    println!();
    println!("{} ({})", style("Connections").bold(), connections.len());
    println!("{}", dim.apply_to("─".repeat(40)));
    for conn in connections.iter() {
        let verified = if conn.verified {
            format!(" {}", green.apply_to("✓"))
        } else {
            String::new()
        };
        println!(
            "  {:<12} {}{}",
            dim.apply_to(&conn.kind),
            conn.name,
            verified
        );
    }
    println!();
    Ok(())
}
