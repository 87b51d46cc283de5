//! Asset upload and serving handlers
//!
//! - POST   /api/v1/resource/files           - multipart upload
//! - GET    /api/v1/resource/files/{file_id} - serve stored bytes
//! - DELETE /api/v1/resource/files/{file_id} - delete

use actix_multipart::Multipart;
use actix_web::{HttpResponse, Scope as ActixScope, delete, get, post, web};
use futures::StreamExt;

use crate::api::model::AssetUploadParam;
use crate::error::{AppError, ConfpackError};
use crate::model::common::{AppState, RestResult};
use crate::service;

/// Read the `file` field of a multipart payload into memory, keeping its
/// file name and content type
async fn read_file_field(
    mut payload: Multipart,
) -> Result<(String, String, Vec<u8>), ConfpackError> {
    let mut file_name = String::new();
    let mut content_type = String::new();
    let mut file_data: Vec<u8> = Vec::new();

    while let Some(field_result) = payload.next().await {
        let mut field = field_result
            .map_err(|e| ConfpackError::Validation(format!("invalid multipart payload: {}", e)))?;

        if let Some(content_disposition) = field.content_disposition()
            && content_disposition.get_name().is_some_and(|n| n == "file")
        {
            if let Some(name) = content_disposition.get_filename() {
                file_name = name.to_string();
            }
            if let Some(mime) = field.content_type() {
                content_type = mime.to_string();
            }
            while let Some(chunk_result) = field.next().await {
                let chunk = chunk_result.map_err(|e| {
                    ConfpackError::Validation(format!("failed to read upload: {}", e))
                })?;
                file_data.extend_from_slice(&chunk);
            }
        }
    }

    Ok((file_name, content_type, file_data))
}

#[post("")]
pub async fn upload(
    data: web::Data<AppState>,
    params: web::Query<AssetUploadParam>,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    let (file_name, content_type, file_data) = read_file_field(payload).await?;

    let info = service::asset::upload(
        &*data.assets,
        &*data.objects,
        params.to_scope(),
        file_name,
        content_type,
        params.remark.clone(),
        &file_data,
    )
    .await?;
    Ok(RestResult::<String>::http_success(info))
}

#[get("/{file_id}")]
pub async fn serve(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let (info, bytes) =
        service::asset::fetch_bytes(&*data.assets, &*data.objects, &path.into_inner()).await?;

    let mut builder = HttpResponse::Ok();
    if !info.content_type.is_empty() {
        builder.content_type(info.content_type.as_str());
    }
    Ok(builder
        .insert_header((
            "Content-Disposition",
            format!("inline; filename=\"{}\"", info.file_name),
        ))
        .body(bytes))
}

#[delete("/{file_id}")]
pub async fn remove(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    service::asset::delete(&*data.assets, &*data.objects, &path.into_inner()).await?;
    Ok(RestResult::<String>::http_success(true))
}

pub fn routes() -> ActixScope {
    web::scope("/files")
        .service(upload)
        .service(serve)
        .service(remove)
}
