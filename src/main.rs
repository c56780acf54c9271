use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info};

use trailbot::api::{self, AppState};
use trailbot::catalog::Catalog;
use trailbot::config::Config;
use trailbot::dispatch::{self, BotContext, Dispatcher};
use trailbot::metrics;
use trailbot::session::SessionStore;
use trailbot::telegram::BotApi;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            error!("configuration error: {e}");
            std::process::exit(1);
        }
    };

    metrics::register_metrics();

    // A broken data file must not keep the bot from starting; drill-down
    // menus are simply empty until the file is fixed.
    let catalog = match Catalog::load(&config.trails_file) {
        Ok(catalog) => {
            info!(
                trails = catalog.trail_count(),
                file = %config.trails_file.display(),
                "loaded trail catalog"
            );
            catalog
        }
        Err(e) => {
            error!("failed to load trail catalog: {e}; starting with an empty catalog");
            Catalog::empty()
        }
    };
    metrics::CATALOG_TRAILS.set(catalog.trail_count() as i64);
    let trail_count = catalog.trail_count();

    let ctx = Arc::new(BotContext {
        catalog,
        sessions: SessionStore::new(),
        api: BotApi::new(&config.bot_token),
        radius_m: config.search_radius_m,
    });
    let dispatcher = Dispatcher::new(ctx);
    dispatch::spawn_maintenance(dispatcher.clone());

    let state = AppState {
        dispatcher,
        webhook_secret: config.webhook_secret.clone(),
        started_at: Utc::now(),
        trail_count,
    };
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .expect("failed to bind webhook port");

    info!(port = config.port, "trailbot listening");
    axum::serve(listener, app)
        .await
        .expect("failed to start server");
}
