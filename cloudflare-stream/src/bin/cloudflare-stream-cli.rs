//! Command-line client for Cloudflare Stream.
//!
//! Credentials come from CLOUDFLARE_ACCOUNT_ID, CLOUDFLARE_AUTH_KEY,
//! CLOUDFLARE_AUTH_EMAIL, CLOUDFLARE_STREAM_KEY_ID and CLOUDFLARE_STREAM_KEY_PEM.

use clap::{Parser, Subcommand};
use cloudflare_stream::{ListParams, Meta, ReqwestTransport, StreamClient, StreamConfig};
use eyre::{Context, OptionExt};
use std::io::IsTerminal;
use std::time::Duration;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "cloudflare-stream-cli", about = "Cloudflare Stream API CLI")]
struct Cli {
    /// Override the API base URL
    #[arg(long, env = "CLOUDFLARE_API_BASE_URL", global = true)]
    base_url: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List videos
    List {
        /// Override a query parameter (include_counts, limit, asc, search, ...)
        #[arg(value_parser = parse_key_value)]
        params: Vec<(String, String)>,
    },
    /// Raw video details
    Get { uid: String },
    /// Delete a video
    Delete { uid: String },
    /// Print the meta mapping
    Meta { uid: String },
    /// Merge keys into the meta mapping
    SetMeta {
        uid: String,
        #[arg(value_parser = parse_key_value, required = true)]
        entries: Vec<(String, String)>,
    },
    /// Remove one meta key
    RemoveMeta { uid: String, key: String },
    /// Print the video name
    Name { uid: String },
    /// Set the video name
    Rename { uid: String, name: String },
    /// Turn the signed URL requirement on or off
    RequireSigned {
        uid: String,
        #[arg(action = clap::ArgAction::Set)]
        required: bool,
    },
    /// Input width and height
    Dimensions { uid: String },
    /// Embed code, signed when the video requires it
    Embed {
        uid: String,
        /// Add a controls attribute to the player
        #[arg(long)]
        controls: bool,
        /// Never sign, even if the video requires it
        #[arg(long)]
        unsigned: bool,
    },
    /// Playback URLs, signed when the video requires it
    Playback {
        uid: String,
        /// Never sign, even if the video requires it
        #[arg(long)]
        unsigned: bool,
    },
    /// Sign a playback token
    Token {
        uid: String,
        /// Validity in hours
        #[arg(long, default_value_t = 4)]
        hours: u64,
    },
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got {s:?}"))
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();

    let cli = Cli::parse();

    let transport = match cli.base_url {
        Some(base) => ReqwestTransport::with_base_url(reqwest::Client::new(), base),
        None => ReqwestTransport::default(),
    };
    let client = StreamClient::with_transport(StreamConfig::from_env(), transport)
        .context("set up Cloudflare Stream client")?;

    let output = match cli.command {
        Commands::List { params } => {
            let params = params
                .into_iter()
                .fold(ListParams::new(), |acc, (k, v)| acc.set(k, v));
            client.list(&params).await.context("list videos")?
        }
        Commands::Get { uid } => client.get(&uid).await.context("fetch video")?,
        Commands::Delete { uid } => client.delete(&uid).await.context("delete video")?,
        Commands::Meta { uid } => {
            let meta = client.get_meta(&uid).await.context("fetch meta")?;
            serde_json::to_string_pretty(&meta).context("encode meta")?
        }
        Commands::SetMeta { uid, entries } => {
            let patch: Meta = entries.into_iter().map(|(k, v)| (k, v.into())).collect();
            client.set_meta(&uid, patch).await.context("update meta")?
        }
        Commands::RemoveMeta { uid, key } => client
            .remove_meta_key(&uid, &key)
            .await
            .context("remove meta key")?,
        Commands::Name { uid } => client
            .get_name(&uid)
            .await
            .context("fetch name")?
            .ok_or_eyre("video has no name")?,
        Commands::Rename { uid, name } => {
            client.set_name(&uid, &name).await.context("rename video")?
        }
        Commands::RequireSigned { uid, required } => client
            .set_signed_url_requirement(&uid, required)
            .await
            .context("update signed URL requirement")?,
        Commands::Dimensions { uid } => client
            .get_dimensions(&uid)
            .await
            .context("fetch dimensions")?,
        Commands::Embed {
            uid,
            controls,
            unsigned,
        } => client
            .embed(&uid, controls, !unsigned)
            .await
            .context("fetch embed code")?,
        Commands::Playback { uid, unsigned } => client
            .playback_urls(&uid, !unsigned)
            .await
            .context("fetch playback URLs")?,
        Commands::Token { uid, hours } => client
            .signed_token(&uid, Duration::from_secs(hours.saturating_mul(60 * 60)))
            .context("sign playback token")?,
    };

    println!("{output}");
    Ok(())
}
