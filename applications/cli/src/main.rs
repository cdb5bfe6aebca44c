/// Cadence - play music from the download API
use cadence_cli::{play_queue, CliConfig, PlaybackSummary, SimulatedEngine};
use cadence_playback::{engine_channel, Player, PlayerHandle, QueueItem};
use cadence_remote::{local_queue_item, DownloadApiClient, HttpSourceResolver, SearchRequest};
use clap::{Parser, Subcommand};
use std::{path::PathBuf, sync::Arc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "Queue and play tracks from the music download API", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play downloaded files and remote tracks in order
    Play {
        /// Shuffle the queue
        #[arg(long)]
        shuffle: bool,
        /// Downloaded file name to play (repeatable)
        #[arg(long = "local", value_name = "FILE")]
        local: Vec<String>,
        /// Track URL to download and play (repeatable)
        #[arg(long = "remote", value_name = "URL")]
        remote: Vec<String>,
    },
    /// Search for tracks
    Search {
        /// Search query
        query: String,
        /// Play the results
        #[arg(long)]
        enqueue: bool,
        /// Shuffle the results before playing
        #[arg(long)]
        shuffle: bool,
        /// Single query without keyword filtering
        #[arg(long)]
        quick: bool,
    },
    /// List downloaded files
    Downloads {
        /// Play every downloaded file
        #[arg(long)]
        play: bool,
        /// Shuffle before playing
        #[arg(long)]
        shuffle: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "cadence=info,cadence_cli=info,cadence_playback=info,cadence_remote=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = CliConfig::load(cli.config.as_deref())?;

    let client = Arc::new(DownloadApiClient::new(config.remote.clone())?);
    tracing::info!("Download API: {}", client.base_url());

    match cli.command {
        Commands::Play {
            shuffle,
            local,
            remote,
        } => {
            let items = local
                .iter()
                .map(|file| local_queue_item(file))
                .chain(
                    remote
                        .iter()
                        .map(|url| QueueItem::remote(url, url, "Unknown Artist")),
                )
                .collect();
            play(&config, client, items, shuffle).await?;
        }
        Commands::Search {
            query,
            enqueue,
            shuffle,
            quick,
        } => {
            let mut request = SearchRequest::new(query);
            if quick {
                request = request.quick();
            }

            let results = client.search(&request).await?;
            if results.is_empty() {
                println!("No results for \"{}\"", request.query);
                return Ok(());
            }
            for (index, result) in results.iter().enumerate() {
                println!(
                    "{:>3}. {} [{}] ({}:{:02})",
                    index + 1,
                    result.title,
                    result.uploader,
                    result.duration as u64 / 60,
                    result.duration as u64 % 60
                );
                println!("     {}", result.url);
            }

            if enqueue {
                let items = results.iter().map(|result| result.to_queue_item()).collect();
                play(&config, client, items, shuffle).await?;
            }
        }
        Commands::Downloads { play: should_play, shuffle } => {
            let files = client.list_downloads().await?;
            if files.is_empty() {
                println!("No downloaded files");
                return Ok(());
            }
            for file in &files {
                println!("{:>10}  {}", file.size, file.filename);
            }

            if should_play {
                let items = files.iter().map(|file| file.to_queue_item()).collect();
                play(&config, client, items, shuffle).await?;
            }
        }
    }

    Ok(())
}

fn start_player(config: &CliConfig, client: Arc<DownloadApiClient>) -> PlayerHandle {
    let (engine_tx, engine_rx) = engine_channel();
    let engine = SimulatedEngine::new(config.engine.clone(), engine_tx);
    let resolver = Arc::new(HttpSourceResolver::new(client));
    Player::spawn(config.player.clone(), resolver, engine, engine_rx)
}

async fn play(
    config: &CliConfig,
    client: Arc<DownloadApiClient>,
    items: Vec<QueueItem>,
    shuffle: bool,
) -> anyhow::Result<()> {
    let player = start_player(config, client);

    let summary = tokio::select! {
        summary = play_queue(&player, items, shuffle) => summary?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, stopping playback");
            PlaybackSummary::default()
        }
    };

    player.shutdown().await?;
    tracing::info!(
        "Finished: {} played, {} failed",
        summary.played,
        summary.failed
    );
    Ok(())
}
