//! Join command - adds the token's user to a guild.

use anyhow::Result;
use clap::Args;
use console::Style;
use serde::Serialize;

use super::{Context, print_json, token_arg};

/// Arguments for the join command.
#[derive(Args, Debug)]
pub struct JoinArgs {
    /// Signed token (needs the guilds.join scope)
    pub token: String,

    /// Guild to add the user to
    pub guild_id: String,
}

#[derive(Debug, Serialize)]
struct JoinOutput {
    guild_id: String,
    added: bool,
}

/// Run the join command.
pub async fn run(args: JoinArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let user = client.get_user(&token_arg(&args.token), true).await?;
    let member = user.join_guild(&args.guild_id).await?;
    let added = member.is_some();

    if ctx.json_output {
        return print_json(&JoinOutput {
            guild_id: args.guild_id,
            added,
        });
    }

    let green = Style::new().green();
    let dim = Style::new().dim();
    if added {
        println!(
            "{} {} to {}",
            green.apply_to("Added"),
            user.tag(),
            args.guild_id
        );
    } else {
        println!(
            "{}",
            dim.apply_to(format!("{} is already a member of {}", user.tag(), args.guild_id))
        );
    }
    Ok(())
}
