use std::{net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};

use clap::Parser;
use eyre::{Context as _, Result};
use tokio::net::TcpListener;

use tubecast::StorageBackend;
use tubecast_server::{api, auth};
use tubecast_ytdlp::YtDlpService;

#[derive(Debug, Parser)]
struct Args {
    #[clap(long, default_value = "0.0.0.0:3000", env = "TUBECAST_ADDRESS")]
    address: SocketAddr,

    /// Directory holding the database and downloaded audio.
    #[clap(long, default_value = "data", env = "TUBECAST_DATA_DIR")]
    data_dir: PathBuf,

    /// Public base URL used in generated feed and enclosure links.
    #[clap(long, env = "TUBECAST_BASE_URL")]
    base_url: Option<String>,

    #[clap(long, default_value_t = 1, env = "TUBECAST_REFRESH_INTERVAL_HOURS")]
    refresh_interval_hours: u64,

    /// Most-recent videos considered per channel on each refresh.
    #[clap(long, default_value_t = 10, env = "TUBECAST_MAX_VIDEOS")]
    max_videos: u32,

    #[clap(long, env = "TUBECAST_ADMIN_USERNAME")]
    admin_username: String,

    #[clap(long, env = "TUBECAST_ADMIN_PASSWORD")]
    admin_password: String,

    #[clap(long, default_value = "yt-dlp", env = "TUBECAST_YTDLP_BINARY")]
    ytdlp_binary: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    tokio::fs::create_dir_all(&args.data_dir)
        .await
        .context("creating data directory")?;
    let database_path = args.data_dir.join("tubecast.db");
    let audio_dir = args.data_dir.join("audio");
    let base_url = args
        .base_url
        .unwrap_or_else(|| format!("http://localhost:{}", args.address.port()));

    let service = Arc::new(YtDlpService::new(args.ytdlp_binary));
    let mut config = tubecast::Config::new(
        format!("sqlite://{}", database_path.display()),
        StorageBackend::Filesystem { path: audio_dir },
        service,
    );
    config.set_base_url(base_url.as_str());
    config.set_max_videos_per_refresh(args.max_videos);
    config.set_refresh_interval(Duration::from_secs(args.refresh_interval_hours * 60 * 60));

    let context = tubecast::new(config).await?;
    let state = api::AppState {
        context,
        admin: auth::AdminCredentials {
            username: args.admin_username,
            password: args.admin_password,
        },
    };

    tracing::info!("serving at {} (public base url {})", args.address, base_url);
    let listener = TcpListener::bind(args.address)
        .await
        .context("binding listen address")?;
    axum::serve(listener, api::router(state)).await?;

    Ok(())
}
