//! Guilds command - lists the guilds a user belongs to.

use anyhow::Result;
use clap::Args;
use console::{Style, style};

use super::{Context, print_json, token_arg};

/// Arguments for the guilds command.
#[derive(Args, Debug)]
pub struct GuildsArgs {
    /// Signed token
    pub token: String,

    /// Only show guilds the user owns
    #[arg(long)]
    pub owned: bool,

    /// Skip the cache and always fetch
    #[arg(long)]
    pub no_cache: bool,
}

/// Run the guilds command.
pub async fn run(args: GuildsArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let guilds = client.get_guilds(&token_arg(&args.token), !args.no_cache).await?;
    let shown: Vec<_> = guilds
        .iter()
        .filter(|g| !args.owned || g.owner)
        .collect();

    if ctx.json_output {
        return print_json(&shown);
    }

    let dim = Style::new().dim();
    let yellow = Style::new().yellow();
    println!();
    println!("{} ({})", style("Guilds").bold(), shown.len());
    println!("{}", dim.apply_to("─".repeat(40)));
    for guild in shown {
        let owner = if guild.owner {
            format!(" {}", yellow.apply_to("owner"))
        } else {
            String::new()
        };
        println!("  {}  {}{}", dim.apply_to(&guild.id), guild.name, owner);
        if ctx.verbose && !guild.permission_names.is_empty() {
            println!(
                "    {} {}",
                dim.apply_to("Permissions:"),
                guild.permission_names.join(", ")
            );
        }
    }
    println!();
    Ok(())
}
