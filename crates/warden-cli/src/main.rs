//! # Warden CLI
//!
//! Loads a snapshot of guilds, roles, members, and channels and prints the effective
//! permissions of one member (or of the everyone role), optionally scoped to a channel.
//!
//! ```text
//! warden --snapshot guild.toml --guild <GUILD_ID> --user <USER_ID> --channel <CHANNEL_ID>
//! ```

mod snapshot;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use uuid::Uuid;
use warden_common::Permissions;
use warden_common::models::ChannelTarget;
use warden_resolver::{PermissionFetcher, ResourceCache};

use crate::snapshot::{Snapshot, SnapshotDirectory};

#[derive(Debug, Parser)]
#[command(name = "warden", version, about = "Inspect effective guild and channel permissions")]
struct Args {
    /// Snapshot file (JSON, or TOML when the extension is .toml)
    #[arg(long, env = "WARDEN_SNAPSHOT")]
    snapshot: PathBuf,

    /// Guild to resolve permissions in
    #[arg(long)]
    guild: Uuid,

    /// Member to resolve permissions for
    #[arg(long, required_unless_present = "everyone", conflicts_with = "everyone")]
    user: Option<Uuid>,

    /// Scope the result to this channel
    #[arg(long)]
    channel: Option<Uuid>,

    /// Resolve the guild's everyone role instead of a member
    #[arg(long)]
    everyone: bool,

    /// Skip the cache so every lookup goes through the remote directory
    #[arg(long)]
    no_cache: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = warden_common::config::init()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log.filter.as_str().into()),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!(?config, "configuration loaded");

    let snapshot = Arc::new(Snapshot::load(&args.snapshot)?);
    tracing::info!(
        guilds = snapshot.guilds.len(),
        members = snapshot.members.len(),
        channels = snapshot.channels.len(),
        "snapshot loaded from {}",
        args.snapshot.display()
    );

    let cache = (!args.no_cache).then(|| Arc::new(snapshot.to_cache()) as Arc<dyn ResourceCache>);
    let directory = Arc::new(SnapshotDirectory::new(Arc::clone(&snapshot)));
    let fetcher = PermissionFetcher::new(cache, directory).with_retry_config(&config.retry);
    let channel = args.channel.map(ChannelTarget::Id);

    let permissions = if args.everyone {
        fetcher.fetch_everyone_permissions(args.guild, channel).await?
    } else {
        let user = args.user.context("--user is required unless --everyone is set")?;
        let member = snapshot
            .member(args.guild, user)
            .with_context(|| format!("user {user} is not a member of guild {}", args.guild))?;
        fetcher.fetch_permissions(member, channel).await?
    };

    print!("{}", render(permissions));
    Ok(())
}

/// One flag name per line, then the raw bits.
fn render(permissions: Permissions) -> String {
    let mut out = String::new();
    for (name, _) in permissions.iter_names() {
        out.push_str(name);
        out.push('\n');
    }
    out.push_str(&format!("bits: {}\n", permissions.bits()));
    out
}
