use std::sync::Arc;

use actix_web::{App, HttpServer, middleware::Logger, web::Data};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use confpack::api;
use confpack::middleware::{auth::Authentication, recovery::Recovery};
use confpack::model::common::{AppState, Configuration};
use confpack::store::{DbStore, LocalObjectStore, MemoryStore};

fn init_logging(log_dir: Option<&str>) -> Vec<WorkerGuard> {
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console_layer = fmt::layer()
        .with_target(true)
        .with_filter(console_filter);

    let mut guards = Vec::new();
    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = vec![Box::new(console_layer)];

    if let Some(dir) = log_dir {
        let appender = RollingFileAppender::new(Rotation::DAILY, dir, "confpack.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        guards.push(guard);

        let file_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        layers.push(Box::new(
            fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_ansi(false)
                .with_filter(file_filter),
        ));
    }

    Registry::default().with(layers).init();
    guards
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let configuration = Configuration::new();
    let _log_guards = init_logging(configuration.log_dir().as_deref());

    let objects = Arc::new(LocalObjectStore::new(configuration.data_dir()));

    let state = if configuration.is_standalone() || configuration.database_url().is_none() {
        info!("starting in standalone mode with in-memory storage");
        let store = Arc::new(MemoryStore::new());
        AppState {
            configs: store.clone(),
            assets: store,
            objects,
            db: None,
            auth_secret: configuration.auth_secret(),
        }
    } else {
        let db = configuration
            .database_connection()
            .await
            .map_err(std::io::Error::other)?;
        info!("connected to external database");
        let store = Arc::new(DbStore::new(db.clone()));
        AppState {
            configs: store.clone(),
            assets: store,
            objects,
            db: Some(db),
            auth_secret: configuration.auth_secret(),
        }
    };
    let state = Data::new(state);

    let address = configuration.server_address();
    let port = configuration.server_port();
    info!(%address, port, "confpack server listening");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Authentication)
            .wrap(Recovery)
            .wrap(Logger::default())
            .service(api::v1::routes())
    })
    .bind((address, port))?
    .run()
    .await
}
