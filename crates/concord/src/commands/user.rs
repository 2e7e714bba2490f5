//! User command - shows the identity behind a token.

use anyhow::Result;
use clap::Args;
use concord_client::ImageOptions;
use console::{Style, style};
use serde::Serialize;

use super::{Context, print_json, token_arg};

/// Arguments for the user command.
#[derive(Args, Debug)]
pub struct UserArgs {
    /// Signed token
    pub token: String,

    /// Skip the cache and always fetch
    #[arg(long)]
    pub no_cache: bool,
}

#[derive(Serialize)]
struct UserOutput<'a> {
    #[serde(flatten)]
    user: &'a concord_client::User,
    tag: String,
    avatar_url: String,
}

/// Run the user command.
pub async fn run(args: UserArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let user = client.get_user(&token_arg(&args.token), !args.no_cache).await?;
    let avatar_url = user.display_avatar_url(ImageOptions::default());

    if ctx.json_output {
        return print_json(&UserOutput {
            user: &*user,
            tag: user.tag(),
            avatar_url,
        });
    }

    let dim = Style::new().dim();
    println!();
    println!("{}", style(user.display_name()).bold());
    println!("{}", dim.apply_to("─".repeat(40)));
    println!();
    println!("  {} {}", dim.apply_to("ID:"), user.id);
    println!("  {} {}", dim.apply_to("Tag:"), user.tag());
    if let Some(email) = &user.email {
        let verified = if user.verified == Some(true) {
            " (verified)"
        } else {
            ""
        };
        println!("  {} {}{}", dim.apply_to("Email:"), email, verified);
    }
    if let Some(locale) = &user.locale {
        println!("  {} {}", dim.apply_to("Locale:"), locale);
    }
    println!("  {} {}", dim.apply_to("Avatar:"), avatar_url);
    if !user.flags.is_empty() {
        println!("  {} {}", dim.apply_to("Flags:"), user.flags.join(", "));
    }
    if ctx.verbose {
        println!("  {} {}", dim.apply_to("Scopes:"), user.scopes().to_param());
    }
    println!();
    Ok(())
}
