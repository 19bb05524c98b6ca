use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use auction_lifecycle::clock::SystemClock;
use auction_lifecycle::config::{self, Settings};
use auction_lifecycle::lifecycle::LifecycleManager;
use auction_lifecycle::notifications::{spawn_dispatcher, ChannelNotifier, LogHandler};
use auction_lifecycle::persistence::json_file::{read_snapshot, write_snapshot};
use auction_lifecycle::persistence::MemoryStore;
use auction_lifecycle::scheduler::spawn_scheduler;
use auction_lifecycle::web::app::configure_app;
use auction_lifecycle::web::types::AppState;
use env_logger::Env;
use log::{info, warn};
use std::io;
use std::sync::Arc;

fn open_store(settings: &Settings) -> io::Result<MemoryStore> {
    match &settings.data_file {
        Some(path) if path.exists() => {
            let snapshot = read_snapshot(path).map_err(io::Error::other)?;
            info!(
                "restored {} auction(s) from {}",
                snapshot.auctions.len(),
                path.display()
            );
            Ok(MemoryStore::from_snapshot(snapshot))
        }
        _ => Ok(MemoryStore::new()),
    }
}

// Main application
pub async fn run_app(settings: Settings) -> io::Result<()> {
    let store = Arc::new(open_store(&settings)?);

    let (notifier, notifications) = ChannelNotifier::channel(settings.notification_queue_capacity);
    spawn_dispatcher(notifications, Arc::new(LogHandler));

    let manager = Arc::new(
        LifecycleManager::new(store.clone(), Arc::new(notifier), Arc::new(SystemClock))
            .with_config(settings.lifecycle),
    );

    if settings.scheduler.enabled {
        info!(
            "scheduler running every {}s",
            settings.scheduler.interval.as_secs()
        );
        spawn_scheduler(manager.clone(), settings.scheduler.interval);
    }

    let app_state = AppState::new(manager);

    info!("Starting server on {}:{}", settings.host, settings.port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(Logger::default())
            .configure(configure_app)
    })
    .bind((settings.host.as_str(), settings.port))?
    .run()
    .await?;

    if let Some(path) = &settings.data_file {
        match store.snapshot() {
            Ok(snapshot) => {
                write_snapshot(path, &snapshot).map_err(io::Error::other)?;
                info!("wrote snapshot to {}", path.display());
            }
            Err(e) => warn!("could not snapshot store: {}", e),
        }
    }
    Ok(())
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    let settings = config::load();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    run_app(settings).await
}
