//! Picture upload and retrieval handlers.
//!
//! Every endpoint follows the same orchestration: existence check, then
//! access check, then storage work. The order is a contract: permission is
//! never evaluated before existence, so a 403 cannot leak whether an entity
//! exists, and a missing entity is always a 404 regardless of the actor.

use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::access::{self, PictureAction};
use crate::directory::EntityRecord;
use crate::entity::EntityKind;
use crate::thumbnail::{generate_variants, PathResolver, SizePreset, VariantKind};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::AuthUser;

/// Response body for thumbnail uploads.
#[derive(Debug, Serialize, ToSchema)]
pub struct ThumbnailResponse {
    /// Canonical retrieval path for the stored thumbnail.
    pub thumbnail_path: String,
}

/// Look up the entity, 404 when absent.
fn find_entity(state: &AppState, kind: EntityKind, id: Uuid) -> Result<EntityRecord, ApiError> {
    state
        .directory
        .entity(kind, id)
        .ok_or_else(|| ApiError::not_found(format!("{} not found", kind.label())))
}

/// Run the access gate, 403 when denied.
fn check_access(
    state: &AppState,
    kind: EntityKind,
    action: PictureAction,
    actor: Uuid,
    entity: &EntityRecord,
) -> Result<(), ApiError> {
    if access::allowed(state.directory.as_ref(), kind, action, actor, entity) {
        Ok(())
    } else {
        Err(ApiError::forbidden("Access denied"))
    }
}

/// Extract the "file" multipart field, enforcing the upload size limit.
async fn read_file_field(mut multipart: Multipart, max_size: u64) -> Result<Vec<u8>, ApiError> {
    let mut content: Option<Vec<u8>> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("Failed to read multipart field: {}", e);
        ApiError::bad_request("Invalid multipart data")
    })? {
        if field.name() == Some("file") {
            content = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| {
                        tracing::error!("Failed to read file content: {}", e);
                        ApiError::bad_request("Failed to read file")
                    })?
                    .to_vec(),
            );
        }
    }

    let content = content.ok_or_else(|| ApiError::bad_request("No file provided"))?;

    if content.len() as u64 > max_size {
        let max_mb = max_size / 1024 / 1024;
        return Err(ApiError::bad_request(format!(
            "File too large (max {}MB)",
            max_mb
        )));
    }

    Ok(content)
}

/// Stream stored picture bytes with image headers.
fn picture_response(id: Uuid, bytes: Vec<u8>) -> Result<Response, ApiError> {
    let content_type = mime_guess::from_path(PathResolver::file_name(id))
        .first_or_octet_stream()
        .to_string();

    Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, bytes.len())
        .body(Body::from(bytes))
        .map_err(|e| {
            tracing::error!("Failed to build response: {}", e);
            ApiError::internal("Failed to build response")
        })
}

/// Shared upload orchestration for entity thumbnails.
async fn upload_thumbnail(
    state: &AppState,
    actor: Uuid,
    kind: EntityKind,
    id: Uuid,
    preset: SizePreset,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ThumbnailResponse>), ApiError> {
    let entity = find_entity(state, kind, id)?;
    check_access(state, kind, PictureAction::Upload, actor, &entity)?;

    let bytes = read_file_field(multipart, state.max_upload_size).await?;
    state.store.save(kind.subfolder(), id, &bytes, Some(preset))?;

    tracing::info!(kind = ?kind, entity = %id, actor = %actor, "thumbnail uploaded");

    let thumbnail_path = format!("/{}/{}/thumbnail", kind.route_segment(), id);
    Ok((
        StatusCode::CREATED,
        Json(ThumbnailResponse { thumbnail_path }),
    ))
}

/// Shared retrieval orchestration for entity thumbnails.
async fn retrieve_thumbnail(
    state: &AppState,
    actor: Uuid,
    kind: EntityKind,
    id: Uuid,
) -> Result<Response, ApiError> {
    let entity = find_entity(state, kind, id)?;
    check_access(state, kind, PictureAction::Retrieve, actor, &entity)?;

    let bytes = state.store.load(kind.subfolder(), id)?;
    picture_response(id, bytes)
}

/// Shared retrieval orchestration for preview-file variants.
///
/// Resolution falls back to the shared legacy folder when the canonical
/// variant path holds no file.
async fn retrieve_preview_variant(
    state: &AppState,
    actor: Uuid,
    id: Uuid,
    variant: VariantKind,
) -> Result<Response, ApiError> {
    let entity = find_entity(state, EntityKind::PreviewFile, id)?;
    check_access(
        state,
        EntityKind::PreviewFile,
        PictureAction::Retrieve,
        actor,
        &entity,
    )?;

    let bytes = state.store.load_preview(variant.subfolder(), id)?;
    picture_response(id, bytes)
}

/// POST /preview-files/:id/picture - Upload a preview-file original.
///
/// Stores the raw bytes unmodified, then derives the thumbnail,
/// square-thumbnail and preview variants in the same request.
#[utoipa::path(
    post,
    path = "/preview-files/{id}/picture",
    tag = "preview-files",
    params(
        ("id" = Uuid, Path, description = "Preview file ID")
    ),
    responses(
        (status = 201, description = "Picture stored and variants generated", body = String),
        (status = 400, description = "Missing or undecodable file"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Access denied"),
        (status = 404, description = "Preview file not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_preview_file_picture(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<String>), ApiError> {
    let entity = find_entity(&state, EntityKind::PreviewFile, id)?;
    check_access(
        &state,
        EntityKind::PreviewFile,
        PictureAction::Upload,
        claims.sub,
        &entity,
    )?;

    let bytes = read_file_field(multipart, state.max_upload_size).await?;
    state
        .store
        .save(VariantKind::Original.subfolder(), id, &bytes, None)?;

    // Invalid originals abort here with a client error; the original stays
    // on disk and no variant is written.
    generate_variants(&state.store, id)?;

    tracing::info!(preview_file = %id, actor = %claims.sub, "preview picture uploaded");

    Ok((
        StatusCode::CREATED,
        Json(format!("/preview-files/{}/preview", id)),
    ))
}

/// GET /preview-files/:id/thumbnail - Retrieve the rectangle thumbnail.
#[utoipa::path(
    get,
    path = "/preview-files/{id}/thumbnail",
    tag = "preview-files",
    params(
        ("id" = Uuid, Path, description = "Preview file ID")
    ),
    responses(
        (status = 200, description = "Thumbnail bytes", content_type = "image/png"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Access denied"),
        (status = 404, description = "Preview file or picture not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn preview_file_thumbnail(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    retrieve_preview_variant(&state, claims.sub, id, VariantKind::Thumbnail).await
}

/// GET /preview-files/:id/thumbnail-square - Retrieve the square thumbnail.
#[utoipa::path(
    get,
    path = "/preview-files/{id}/thumbnail-square",
    tag = "preview-files",
    params(
        ("id" = Uuid, Path, description = "Preview file ID")
    ),
    responses(
        (status = 200, description = "Thumbnail bytes", content_type = "image/png"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Access denied"),
        (status = 404, description = "Preview file or picture not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn preview_file_thumbnail_square(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    retrieve_preview_variant(&state, claims.sub, id, VariantKind::ThumbnailSquare).await
}

/// GET /preview-files/:id/preview - Retrieve the display-resolution copy.
#[utoipa::path(
    get,
    path = "/preview-files/{id}/preview",
    tag = "preview-files",
    params(
        ("id" = Uuid, Path, description = "Preview file ID")
    ),
    responses(
        (status = 200, description = "Preview bytes", content_type = "image/png"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Access denied"),
        (status = 404, description = "Preview file or picture not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn preview_file_preview(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    retrieve_preview_variant(&state, claims.sub, id, VariantKind::Preview).await
}

/// GET /preview-files/:id/original - Retrieve the unmodified upload.
#[utoipa::path(
    get,
    path = "/preview-files/{id}/original",
    tag = "preview-files",
    params(
        ("id" = Uuid, Path, description = "Preview file ID")
    ),
    responses(
        (status = 200, description = "Original bytes", content_type = "image/png"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Access denied"),
        (status = 404, description = "Preview file or picture not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn preview_file_original(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    retrieve_preview_variant(&state, claims.sub, id, VariantKind::Original).await
}

/// POST /persons/:id/thumbnail - Upload a person's avatar (square preset).
#[utoipa::path(
    post,
    path = "/persons/{id}/thumbnail",
    tag = "thumbnails",
    params(
        ("id" = Uuid, Path, description = "Person ID")
    ),
    responses(
        (status = 201, description = "Thumbnail stored", body = ThumbnailResponse),
        (status = 400, description = "Missing or undecodable file"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Access denied"),
        (status = 404, description = "Person not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_person_thumbnail(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ThumbnailResponse>), ApiError> {
    upload_thumbnail(
        &state,
        claims.sub,
        EntityKind::Person,
        id,
        SizePreset::Square,
        multipart,
    )
    .await
}

/// GET /persons/:id/thumbnail - Retrieve a person's avatar.
#[utoipa::path(
    get,
    path = "/persons/{id}/thumbnail",
    tag = "thumbnails",
    params(
        ("id" = Uuid, Path, description = "Person ID")
    ),
    responses(
        (status = 200, description = "Thumbnail bytes", content_type = "image/png"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Person or picture not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn person_thumbnail(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    retrieve_thumbnail(&state, claims.sub, EntityKind::Person, id).await
}

/// POST /projects/:id/thumbnail - Upload a project thumbnail (square preset).
#[utoipa::path(
    post,
    path = "/projects/{id}/thumbnail",
    tag = "thumbnails",
    params(
        ("id" = Uuid, Path, description = "Project ID")
    ),
    responses(
        (status = 201, description = "Thumbnail stored", body = ThumbnailResponse),
        (status = 400, description = "Missing or undecodable file"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Access denied"),
        (status = 404, description = "Project not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_project_thumbnail(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ThumbnailResponse>), ApiError> {
    upload_thumbnail(
        &state,
        claims.sub,
        EntityKind::Project,
        id,
        SizePreset::Square,
        multipart,
    )
    .await
}

/// GET /projects/:id/thumbnail - Retrieve a project thumbnail.
#[utoipa::path(
    get,
    path = "/projects/{id}/thumbnail",
    tag = "thumbnails",
    params(
        ("id" = Uuid, Path, description = "Project ID")
    ),
    responses(
        (status = 200, description = "Thumbnail bytes", content_type = "image/png"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Access denied"),
        (status = 404, description = "Project or picture not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn project_thumbnail(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    retrieve_thumbnail(&state, claims.sub, EntityKind::Project, id).await
}

/// POST /shots/:id/thumbnail - Upload a shot thumbnail (rectangle preset).
#[utoipa::path(
    post,
    path = "/shots/{id}/thumbnail",
    tag = "thumbnails",
    params(
        ("id" = Uuid, Path, description = "Shot ID")
    ),
    responses(
        (status = 201, description = "Thumbnail stored", body = ThumbnailResponse),
        (status = 400, description = "Missing or undecodable file"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Access denied"),
        (status = 404, description = "Shot not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_shot_thumbnail(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ThumbnailResponse>), ApiError> {
    upload_thumbnail(
        &state,
        claims.sub,
        EntityKind::Shot,
        id,
        SizePreset::Rectangle,
        multipart,
    )
    .await
}

/// GET /shots/:id/thumbnail - Retrieve a shot thumbnail.
#[utoipa::path(
    get,
    path = "/shots/{id}/thumbnail",
    tag = "thumbnails",
    params(
        ("id" = Uuid, Path, description = "Shot ID")
    ),
    responses(
        (status = 200, description = "Thumbnail bytes", content_type = "image/png"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Access denied"),
        (status = 404, description = "Shot or picture not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn shot_thumbnail(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    retrieve_thumbnail(&state, claims.sub, EntityKind::Shot, id).await
}

/// POST /assets/:id/thumbnail - Upload an asset thumbnail (rectangle preset).
#[utoipa::path(
    post,
    path = "/assets/{id}/thumbnail",
    tag = "thumbnails",
    params(
        ("id" = Uuid, Path, description = "Asset ID")
    ),
    responses(
        (status = 201, description = "Thumbnail stored", body = ThumbnailResponse),
        (status = 400, description = "Missing or undecodable file"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Access denied"),
        (status = 404, description = "Asset not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_asset_thumbnail(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ThumbnailResponse>), ApiError> {
    upload_thumbnail(
        &state,
        claims.sub,
        EntityKind::Asset,
        id,
        SizePreset::Rectangle,
        multipart,
    )
    .await
}

/// GET /assets/:id/thumbnail - Retrieve an asset thumbnail.
#[utoipa::path(
    get,
    path = "/assets/{id}/thumbnail",
    tag = "thumbnails",
    params(
        ("id" = Uuid, Path, description = "Asset ID")
    ),
    responses(
        (status = 200, description = "Thumbnail bytes", content_type = "image/png"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Access denied"),
        (status = 404, description = "Asset or picture not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn asset_thumbnail(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    retrieve_thumbnail(&state, claims.sub, EntityKind::Asset, id).await
}

/// POST /working-files/:id/thumbnail - Upload a working-file thumbnail
/// (rectangle preset).
#[utoipa::path(
    post,
    path = "/working-files/{id}/thumbnail",
    tag = "thumbnails",
    params(
        ("id" = Uuid, Path, description = "Working file ID")
    ),
    responses(
        (status = 201, description = "Thumbnail stored", body = ThumbnailResponse),
        (status = 400, description = "Missing or undecodable file"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Access denied"),
        (status = 404, description = "Working file not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_working_file_thumbnail(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ThumbnailResponse>), ApiError> {
    upload_thumbnail(
        &state,
        claims.sub,
        EntityKind::WorkingFile,
        id,
        SizePreset::Rectangle,
        multipart,
    )
    .await
}

/// GET /working-files/:id/thumbnail - Retrieve a working-file thumbnail.
#[utoipa::path(
    get,
    path = "/working-files/{id}/thumbnail",
    tag = "thumbnails",
    params(
        ("id" = Uuid, Path, description = "Working file ID")
    ),
    responses(
        (status = 200, description = "Thumbnail bytes", content_type = "image/png"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Access denied"),
        (status = 404, description = "Working file or picture not found")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn working_file_thumbnail(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    retrieve_thumbnail(&state, claims.sub, EntityKind::WorkingFile, id).await
}
