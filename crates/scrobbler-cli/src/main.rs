// SPDX-License-Identifier: GPL-3.0-or-later
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use scrobbler_client::{Api, LazyList, ScrobblerError};
use scrobbler_config::{load as load_config, AppConfig};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Browse users, groups and artists of the audioscrobbler web service
#[derive(Debug, Parser)]
#[command(name = "scrobbler", version, long_about = None)]
struct Cli {
    /// TOML configuration file, overridden by SCROBBLER_* environment variables
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the members of a group
    Members {
        group: String,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// List the friends of a user
    Friends {
        user: String,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Show the most played tracks of an artist
    TopTracks { artist: String },
    /// Show the top album of each weekly chart of a group, most recent first
    Charts {
        group: String,
        #[arg(long, default_value_t = 4)]
        limit: usize,
    },
    /// List artists recommended to the session user
    Recommended {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    init_tracing(&config.telemetry.log_level);

    let api = build_api(&config)?;

    tokio::select! {
        result = run(cli.command, &api) => result?,
        _ = tokio::signal::ctrl_c() => info!(target: "cli", "interrupted"),
    }

    Ok(())
}

fn init_tracing(default_level: &str) {
    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn build_api(config: &AppConfig) -> Result<Api> {
    let api_key = config
        .api
        .api_key
        .as_deref()
        .ok_or_else(|| anyhow!("no api key configured (set SCROBBLER_API__API_KEY)"))?;

    let mut builder = Api::builder(api_key)
        .timeout(config.api.timeout())
        .rate_limit_interval(config.api.rate_limit_interval());
    if let Some(base_url) = &config.api.base_url {
        builder = builder.base_url(base_url.clone());
    }
    if let Some(session) = &config.session {
        builder = builder.session(session.username.clone(), session.session_key.clone());
    }
    if let Some(capacity) = config.cache.max_capacity {
        builder = builder.cache_capacity(capacity);
    }

    Ok(builder.build()?)
}

async fn run(command: Command, api: &Api) -> Result<()> {
    match command {
        Command::Members { group, limit } => {
            let members = api.group(&group)?.members();
            print_items(members, limit, |user| user.name().to_string()).await?;
        }
        Command::Friends { user, limit } => {
            let friends = api.user(&user)?.friends();
            print_items(friends, limit, |friend| match friend.real_name() {
                Some(real_name) => format!("{} ({})", friend.name(), real_name),
                None => friend.name().to_string(),
            })
            .await?;
        }
        Command::TopTracks { artist } => {
            let tracks = api.artist(&artist)?.top_tracks().await?;
            let tracks = LazyList::from_vec(tracks);
            print_items(tracks, usize::MAX, |track| match track.playcount {
                Some(playcount) => format!("{} ({} plays)", track.name, playcount),
                None => track.name.clone(),
            })
            .await?;
        }
        Command::Charts { group, limit } => {
            let charts = api.group(&group)?.weekly_album_chart_list().await?;
            print_items(charts, limit, |chart| {
                let week = chart.range.from.format("%Y-%m-%d");
                match chart.top_album() {
                    Some(album) => format!("{}  {} - {}", week, album.artist, album.name),
                    None => format!("{}  -", week),
                }
            })
            .await?;
        }
        Command::Recommended { limit } => {
            let artists = api.authenticated_user()?.recommended_artists()?;
            print_items(artists, limit, |artist| artist.name().to_string()).await?;
        }
    }
    Ok(())
}

/// Print up to `limit` items, fetching only as many pages as needed.
async fn print_items<T, F>(
    mut items: LazyList<T, ScrobblerError>,
    limit: usize,
    render: F,
) -> Result<usize>
where
    T: Clone + Send + 'static,
    F: Fn(&T) -> String,
{
    let mut printed = 0;
    while printed < limit {
        match items.next().await {
            Some(item) => {
                println!("{}", render(&item?));
                printed += 1;
            }
            None => break,
        }
    }
    Ok(printed)
}
