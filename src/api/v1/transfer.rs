//! Transfer handlers
//!
//! - GET  /api/v1/resource/transfer/export - download a scope as a zip,
//!   either the transfer archive or the static bundle layout
//! - POST /api/v1/resource/transfer/import - upload an archive in either
//!   layout and merge it into the store

use std::time::Duration;

use actix_multipart::Multipart;
use actix_web::{HttpResponse, Scope as ActixScope, get, post, web};
use chrono::Utc;
use futures::StreamExt;
use tracing::warn;

use crate::api::model::{ExportParam, ImportParam};
use crate::error::{AppError, ConfpackError, DATA_EMPTY};
use crate::model::common::{AppState, RestResult};
use crate::model::config::ResourceConfigInfo;
use crate::service::lock;

const IMPORT_LOCK_KEY: &str = "resource_import";
const IMPORT_LOCK_TTL: Duration = Duration::from_secs(60);
const IMPORT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

fn zip_download(file_name: String, data: Vec<u8>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("application/zip")
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"{}\"", file_name),
        ))
        .body(data)
}

#[get("/export")]
pub async fn export(
    data: web::Data<AppState>,
    params: web::Query<ExportParam>,
) -> Result<HttpResponse, AppError> {
    let scopes = params.export_scopes()?;

    let transfer = data.transfer();
    let stamp = Utc::now().format("%Y%m%d%H%M%S");

    if params.is_static() {
        let bytes = transfer
            .export_static_bundle(&scopes, params.include_system)
            .await?;
        return Ok(zip_download(format!("static_bundle_{}.zip", stamp), bytes));
    }

    let bytes = transfer
        .export_archive(&scopes[0], params.include_system)
        .await?;
    Ok(zip_download(
        format!("resource_configs_{}.zip", stamp),
        bytes,
    ))
}

/// A failed lock release must not mask the import's own outcome; it is
/// logged and the import result answered as is.
fn finish_import(
    release: anyhow::Result<()>,
    result: anyhow::Result<Vec<ResourceConfigInfo>>,
) -> Result<HttpResponse, AppError> {
    if let Err(e) = release {
        warn!(error = %e, "failed to release import lock");
    }
    Ok(RestResult::<String>::http_success(result?))
}

#[post("/import")]
pub async fn import(
    data: web::Data<AppState>,
    params: web::Query<ImportParam>,
    mut payload: Multipart,
) -> Result<HttpResponse, AppError> {
    let mut file_data: Vec<u8> = Vec::new();
    while let Some(field_result) = payload.next().await {
        let mut field = field_result
            .map_err(|e| ConfpackError::Validation(format!("invalid multipart payload: {}", e)))?;

        if let Some(content_disposition) = field.content_disposition()
            && content_disposition.get_name().is_some_and(|n| n == "file")
        {
            while let Some(chunk_result) = field.next().await {
                let chunk = chunk_result.map_err(|e| {
                    ConfpackError::Validation(format!("failed to read upload: {}", e))
                })?;
                file_data.extend_from_slice(&chunk);
            }
        }
    }

    if file_data.is_empty() {
        return Ok(RestResult::<String>::http_response(
            400,
            DATA_EMPTY.code,
            DATA_EMPTY.message.to_string(),
            String::new(),
        ));
    }

    // Imports across instances are serialized through the database lock
    // when one is available
    let guard = match &data.db {
        Some(db) => Some(
            lock::acquire(db, IMPORT_LOCK_KEY, IMPORT_LOCK_TTL, IMPORT_LOCK_TIMEOUT).await?,
        ),
        None => None,
    };

    let result = data
        .transfer()
        .import_archive(&file_data, params.overwrite)
        .await;

    let release = match (&data.db, guard) {
        (Some(db), Some(guard)) => lock::release(db, guard).await,
        _ => Ok(()),
    };

    finish_import(release, result)
}

pub fn routes() -> ActixScope {
    web::scope("/transfer").service(export).service(import)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use actix_web::http::StatusCode;
    use actix_web::{App, test, web::Data};

    use crate::store::{LocalObjectStore, MemoryStore};

    fn state(dir: &tempfile::TempDir) -> AppState {
        let store = Arc::new(MemoryStore::new());
        AppState {
            configs: store.clone(),
            assets: store,
            objects: Arc::new(LocalObjectStore::new(dir.path())),
            db: None,
            auth_secret: String::new(),
        }
    }

    fn multipart_file(boundary: &str, content: &str) -> String {
        format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"a.zip\"\r\n\r\n{c}\r\n--{b}--\r\n",
            b = boundary,
            c = content,
        )
    }

    #[actix_web::test]
    async fn test_import_rejects_empty_upload() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(
            App::new().app_data(Data::new(state(&dir))).service(routes()),
        )
        .await;

        let boundary = "UPLOADBOUNDARY";
        let req = test::TestRequest::post()
            .uri("/transfer/import")
            .insert_header((
                "Content-Type",
                format!("multipart/form-data; boundary={}", boundary),
            ))
            .set_payload(multipart_file(boundary, ""))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], DATA_EMPTY.code);
    }

    #[actix_web::test]
    async fn test_export_multi_scope_requires_static_format() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(
            App::new().app_data(Data::new(state(&dir))).service(routes()),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/transfer/export?business=acme&scopes=prod:web")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get()
            .uri("/transfer/export?business=acme&scopes=prod:web&static=true")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[core::prelude::v1::test]
    fn test_release_failure_does_not_mask_import_outcome() {
        let failed_release = || Err(anyhow::anyhow!("lock row already gone"));

        let err = finish_import(
            failed_release(),
            Err(ConfpackError::Validation("bad record".to_string()).into()),
        )
        .unwrap_err();
        assert!(err.to_string().contains("bad record"));

        let ok = finish_import(failed_release(), Ok(Vec::new()));
        assert!(ok.is_ok());
    }
}
