use crate::config::{CatalogSource, Config};
use crate::impls::{FileCatalog, SpotifyCatalog};
use crate::services::{run_console, spawn_stdin_reader, CatalogSources, HeadlessOutput};
use actix_rt::signal::unix;
use catalog_providers::{Fallbacks, LocalCatalog, RetryPolicy, SpotifyClient, SpotifyOptions};
use futures_lite::FutureExt;
use playback_controller::{event_channel, ControllerHandle, PlaybackController};
use std::rc::Rc;
use std::sync::Arc;
use tracing::{info, warn};

mod config;
mod impls;
mod services;
mod utils;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

fn create_catalogs(config: &Config) -> CatalogSources {
    match config.catalog_source() {
        Some(CatalogSource::Spotify(credentials)) => {
            info!(tracks = config.spotify_track_ids.len(), "Using Spotify catalog");

            let client = Arc::new(SpotifyClient::create(
                credentials,
                SpotifyOptions {
                    market: config.spotify_market.clone(),
                    fallbacks: Fallbacks {
                        asset_dir: config.fallback_asset_dir.clone(),
                        artwork: Some(config.default_artwork.clone()),
                    },
                    retry: RetryPolicy::default(),
                },
            ));

            CatalogSources {
                library: Rc::new(SpotifyCatalog::new(
                    Arc::clone(&client),
                    config.spotify_track_ids.clone(),
                )),
                search: Some(client),
            }
        }
        Some(CatalogSource::File(path)) => {
            info!(path = %path.display(), "Using catalog file");
            CatalogSources {
                library: Rc::new(FileCatalog::new(LocalCatalog::create(path))),
                search: None,
            }
        }
        None => panic!(
            "Missing environment variable: set SPOTIFY_CLIENT_ID and SPOTIFY_CLIENT_SECRET, or CATALOG_PATH"
        ),
    }
}

#[actix_rt::main]
async fn main() -> std::io::Result<()> {
    let mut terminate = unix::signal(unix::SignalKind::terminate())?;
    let mut interrupt = unix::signal(unix::SignalKind::interrupt())?;

    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env();

    info!(version = VERSION, "Starting application...");

    let sources = create_catalogs(&config);
    let input = spawn_stdin_reader()?;
    let (sinks, events) = event_channel();

    let handle = ControllerHandle::new(PlaybackController::new(
        config.controller_settings(),
        Box::new(HeadlessOutput::create(sinks.foreground)),
        Box::new(HeadlessOutput::create(sinks.background)),
    ));

    actix_rt::spawn({
        let handle = handle.clone();
        async move { handle.run_events(events).await }
    });

    // Ambience starts on the landing page.
    handle.with(|controller| controller.on_navigate(false));

    let console = actix_rt::spawn({
        let handle = handle.clone();
        async move {
            handle.load_catalog(sources.library.as_ref()).await;

            if let Some(error) = handle.snapshot().playback.last_error {
                warn!(%error, "Starting without a track list");
            }

            run_console(handle, sources, input).await;
        }
    });

    info!("Application started");

    interrupt
        .recv()
        .or(terminate.recv())
        .or(async { console.await.ok() })
        .await;

    info!("Shutting down gracefully...");

    handle.with(|controller| controller.shutdown());

    Ok(())
}
