//! Reddit download command.

use crate::commands::types::DownloadArgs;
use anyhow::{Context, Result};
use colored::Colorize;
use sadgpt_training::{ListingKind, RedditClient, RedditCredentials, RedditEndpoints};

pub async fn execute(args: DownloadArgs) -> Result<()> {
    let credentials = RedditCredentials::load(&args.credentials)?;
    let endpoints = args.api_base.clone().map_or_else(RedditEndpoints::default, RedditEndpoints::single);

    let client = RedditClient::authenticate(&credentials, endpoints)
        .await
        .context("Failed to authenticate with Reddit")?;
    let kind = ListingKind::from(args.kind);
    let rows = client
        .save(kind, &args.subreddit, &args.sort, &args.output, args.max_batches)
        .await
        .with_context(|| format!("Failed to download r/{}", args.subreddit))?;

    println!();
    println!("{}", "Download complete".bold().green());
    println!("  Subreddit: r/{}", args.subreddit.cyan());
    println!("  Rows:      {rows} ({})", kind.body_column());
    println!("  Written:   {}", args.output.display().to_string().dimmed());
    println!();
    Ok(())
}
