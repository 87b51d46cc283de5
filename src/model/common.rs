//! Common model types: response envelope, paging, application state, configuration

use std::sync::Arc;
use std::time::Duration;

use actix_web::{HttpResponse, HttpResponseBuilder, http::StatusCode};
use clap::Parser;
use config::{Config, Environment};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde::{Deserialize, Serialize};

use crate::store::{AssetStore, ConfigStore, ObjectStore};

/// Generic result wrapper for API responses
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RestResult<T> {
    pub code: i32,
    pub message: String,
    pub data: T,
}

impl<T> RestResult<T> {
    pub fn new(code: i32, message: String, data: T) -> Self {
        RestResult::<T> {
            code,
            message,
            data,
        }
    }

    pub fn success(data: T) -> RestResult<T> {
        RestResult::<T> {
            code: 0,
            message: "success".to_string(),
            data,
        }
    }

    pub fn http_success(data: impl Serialize) -> HttpResponse {
        HttpResponse::Ok().json(RestResult::success(data))
    }

    pub fn http_response(
        status: u16,
        code: i32,
        message: String,
        data: impl Serialize,
    ) -> HttpResponse {
        HttpResponseBuilder::new(StatusCode::from_u16(status).unwrap_or_default())
            .json(RestResult::new(code, message, data))
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub total_count: u64,
    pub page_number: u64,
    pub pages_available: u64,
    pub page_items: Vec<T>,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            total_count: 0,
            page_number: 1,
            pages_available: 0,
            page_items: vec![],
        }
    }
}

impl<T> Page<T> {
    pub fn new(total_count: u64, page_number: u64, page_size: u64, page_items: Vec<T>) -> Self {
        Self {
            total_count,
            page_number,
            pages_available: (total_count as f64 / page_size as f64).ceil() as u64,
            page_items,
        }
    }
}

/// Current time as epoch milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Shared application state handed to HTTP handlers
pub struct AppState {
    pub configs: Arc<dyn ConfigStore>,
    pub assets: Arc<dyn AssetStore>,
    pub objects: Arc<dyn ObjectStore>,
    /// Present only when backed by an external database; the write lock
    /// and raw SQL paths need it
    pub db: Option<DatabaseConnection>,
    /// Base64 HS256 secret for identity tokens
    pub auth_secret: String,
}

impl AppState {
    pub fn transfer(&self) -> crate::service::transfer::TransferService {
        crate::service::transfer::TransferService::new(
            self.configs.clone(),
            self.assets.clone(),
            self.objects.clone(),
        )
    }
}

/// Command line arguments for the server
#[derive(Debug, Parser)]
#[command()]
struct Cli {
    #[arg(short = 'm', long = "mode")]
    mode: Option<String>,
    #[arg(short = 'p', long = "port")]
    port: Option<u16>,
    #[arg(long = "db-url", env = "DATABASE_URL")]
    database_url: Option<String>,
}

/// Application configuration loaded from config files and environment
#[derive(Clone, Debug, Default)]
pub struct Configuration {
    pub config: Config,
}

impl Configuration {
    pub fn new() -> Self {
        let args = Cli::parse();
        let mut config_builder = Config::builder()
            .add_source(
                Environment::with_prefix("confpack")
                    .separator(".")
                    .try_parsing(true),
            )
            .add_source(config::File::with_name("conf/application.yml").required(false));

        if let Some(v) = args.mode {
            config_builder = config_builder
                .set_override("confpack.standalone", v == "standalone")
                .expect("Failed to set standalone mode override");
        }
        if let Some(v) = args.port {
            config_builder = config_builder
                .set_override("server.port", i64::from(v))
                .expect("Failed to set server port override");
        }
        if let Some(v) = args.database_url {
            config_builder = config_builder
                .set_override("db.url", v)
                .expect("Failed to set database URL override");
        }

        let app_config = config_builder
            .build()
            .expect("Failed to build configuration - check conf/application.yml");

        Configuration { config: app_config }
    }

    pub fn server_address(&self) -> String {
        self.config
            .get_string("server.address")
            .unwrap_or("0.0.0.0".to_string())
    }

    pub fn server_port(&self) -> u16 {
        self.config.get_int("server.port").unwrap_or(8858) as u16
    }

    pub fn is_standalone(&self) -> bool {
        self.config.get_bool("confpack.standalone").unwrap_or(false)
    }

    pub fn database_url(&self) -> Option<String> {
        self.config.get_string("db.url").ok()
    }

    pub fn data_dir(&self) -> String {
        self.config
            .get_string("confpack.data.dir")
            .unwrap_or("data/files".to_string())
    }

    pub fn auth_secret(&self) -> String {
        self.config
            .get_string("confpack.auth.secret")
            .unwrap_or_default()
    }

    pub fn log_dir(&self) -> Option<String> {
        self.config.get_string("confpack.logs.path").ok()
    }

    pub async fn database_connection(&self) -> anyhow::Result<DatabaseConnection> {
        let url = self
            .database_url()
            .ok_or_else(|| anyhow::anyhow!("db.url is not configured"))?;
        let mut options = ConnectOptions::new(url);
        options
            .max_connections(
                self.config.get_int("db.pool.max_connections").unwrap_or(20) as u32,
            )
            .connect_timeout(Duration::from_secs(
                self.config.get_int("db.pool.connect_timeout").unwrap_or(10) as u64,
            ))
            .sqlx_logging(false);
        let db = Database::connect(options).await?;
        Ok(db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rest_result_success() {
        let result = RestResult::success("payload");
        assert_eq!(result.code, 0);
        assert_eq!(result.message, "success");
        assert_eq!(result.data, "payload");
    }

    #[test]
    fn test_page_new() {
        let page = Page::new(25, 2, 10, vec![1, 2, 3]);
        assert_eq!(page.total_count, 25);
        assert_eq!(page.page_number, 2);
        assert_eq!(page.pages_available, 3);
        assert_eq!(page.page_items.len(), 3);
    }

    #[test]
    fn test_page_default() {
        let page: Page<String> = Page::default();
        assert_eq!(page.total_count, 0);
        assert_eq!(page.page_number, 1);
        assert!(page.page_items.is_empty());
    }
}
