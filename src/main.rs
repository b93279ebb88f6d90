use actix_cors::Cors;
use actix_web::{App, HttpServer, web};
use clap::Parser;
use log::{error, info};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod assets;
mod frame;
mod gateway;
mod handlers;
mod importer;
mod metrics;
mod models;
mod normalize;
mod region;
mod state;
mod stream_counter;
mod synthetic;

// The central, shared engine state. One logical owner behind a mutex;
// every mutation goes through its setters, and fire-and-forget fetches
// re-acquire it only to apply their result.
pub use state::State;

pub type AppState = Arc<Mutex<State>>;

/// Command line configuration
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Config {
    /// IP address to bind the server to
    #[arg(long, default_value = "127.0.0.1")]
    address: String,

    /// Port to bind the server to
    #[arg(long, default_value_t = 8090)]
    port: u16,

    /// Base URL of the prediction backend
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    backend_url: String,

    /// Region the generated demo datasets are sampled in, as 'lat1,lng1,lat2,lng2'
    #[arg(long, default_value_t = region::CARIBBEAN)]
    demo_region: region::Region,

    /// Number of generated heat-field points
    #[arg(long, default_value_t = 500)]
    heat_points: usize,

    /// Number of generated scatter points
    #[arg(long, default_value_t = 300)]
    scatter_points: usize,

    /// Maximum number of points accepted from a single CSV import. Mostly for client performance purposes.
    #[arg(long, default_value_t = 10_000)]
    csv_limit: usize,

    /// Keep-alive interval for the update stream
    #[arg(long, default_value = "5s")]
    keep_alive: humantime::Duration,
}

async fn real_main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_line_number(true)
        .with_target(true)
        .init();

    info!("Initializing");

    let config = Config::parse();

    info!("Configuration: {config:?}"); // Log the parsed configuration

    let gateway = gateway::Gateway::new(&config.backend_url);
    let app_state: AppState = Arc::new(Mutex::new(State::new(
        state::Updates::new(),
        &config.demo_region,
        config.heat_points,
        config.scatter_points,
        config.csv_limit,
        config.keep_alive.into(),
    )));

    // One snapshot fetch at startup, applied in the background whenever
    // the backend answers. If the snapshot moves the frame, the active
    // layer gets a fresh frame-sensitive fetch.
    {
        let state = app_state.clone();
        let gateway = gateway.clone();
        tokio::spawn(async move {
            let Some(snapshot) = gateway.fetch_snapshot().await else {
                return;
            };
            let (refetch, frame, layer) = {
                let mut state = state.lock().await;
                let frame_moved = state.apply_snapshot(snapshot);
                state.publish();
                let layer = state.active_layer();
                let refetch = (frame_moved
                    && matches!(layer, models::Layer::Sighting | models::Layer::Migration))
                .then(|| state.frame_changed());
                (refetch, *state.frame(), layer)
            };
            if let Some(generation) = refetch {
                handlers::spawn_entry_fetch(layer, generation, frame, state, gateway);
            }
        });
    }

    // The sighting layer starts active; give it its entry fetch.
    {
        let state = app_state.lock().await;
        handlers::spawn_entry_fetch(
            state.active_layer(),
            state.generation(),
            *state.frame(),
            app_state.clone(),
            gateway.clone(),
        );
    }

    info!("Starting server on {}:{}", config.address, config.port);

    // Start the HTTP server.
    Ok(HttpServer::new(move || {
        // Configure CORS to allow cross-origin requests from any origin.
        let cors = Cors::permissive();

        App::new()
            .wrap(TracingLogger::default())
            .wrap(cors)
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::Data::new(gateway.clone()))
            .service(handlers::engine_state)
            .service(handlers::active_dataset)
            .service(handlers::current_frame)
            .service(handlers::hotspots)
            .service(handlers::select_layer)
            .service(handlers::search)
            .service(handlers::import_points)
            .service(handlers::update_controls)
            .service(handlers::stream)
            .service(handlers::metrics_endpoint)
            .service(assets::assets("", "index.html"))
    })
    .bind((config.address.as_str(), config.port))? // Use parsed address and port
    .run()
    .await?)
}

#[actix_web::main]
async fn main() -> std::process::ExitCode {
    match real_main().await {
        Ok(()) => std::process::ExitCode::from(0),
        Err(err) => {
            error!("{err}");
            std::process::ExitCode::from(10)
        }
    }
}
