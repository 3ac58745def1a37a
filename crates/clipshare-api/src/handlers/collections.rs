//! Shared collection endpoints.
//!
//! Pure plumbing over the repository layer: each handler runs a single
//! store operation and maps its error kind 1:1 to a status code. A `409`
//! means the request lost an optimistic race and can be retried as a whole.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use clipshare_core::{ClipboardItem, NewClipItem};

use crate::error::{ApiError, ErrorBody};
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateCollectionResponse {
    pub id: String,
    /// Share URL for the collection
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CollectionResponse {
    pub id: String,
    /// Newest first
    pub items: Vec<ClipboardItem>,
    pub created_at: DateTime<Utc>,
    /// Seconds until the collection expires
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteItemResponse {
    pub message: String,
}

/// Create an empty shared collection.
#[utoipa::path(
    post,
    path = "/collections",
    tag = "Collections",
    responses(
        (status = 201, description = "Collection created", body = CreateCollectionResponse),
        (status = 500, description = "Store unavailable", body = ErrorBody)
    )
)]
pub async fn create_collection(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let created = state.clips.lifecycle.create().await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateCollectionResponse {
            id: created.id,
            url: created.url,
        }),
    ))
}

/// Fetch a collection and its items.
#[utoipa::path(
    get,
    path = "/collections/{id}",
    tag = "Collections",
    params(("id" = String, Path, description = "Collection id")),
    responses(
        (status = 200, description = "Collection", body = CollectionResponse),
        (status = 404, description = "Collection not found or expired", body = ErrorBody),
        (status = 500, description = "Corrupted record or store error", body = ErrorBody)
    )
)]
pub async fn get_collection(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CollectionResponse>, ApiError> {
    let collection = state.clips.lifecycle.read(&id).await?;

    // Advisory only; a failed TTL read does not fail the request
    let expires_in = match state.clips.lifecycle.expires_in(&id).await {
        Ok(ttl) => ttl.seconds(),
        Err(e) => {
            tracing::warn!(collection_id = %id, error = %e, "Failed to read collection TTL");
            None
        }
    };

    Ok(Json(CollectionResponse {
        id: collection.id,
        items: collection.items,
        created_at: collection.created_at,
        expires_in,
    }))
}

/// Add an item to the front of a collection.
#[utoipa::path(
    post,
    path = "/collections/{id}/items",
    tag = "Collections",
    params(("id" = String, Path, description = "Collection id")),
    request_body = NewClipItem,
    responses(
        (status = 201, description = "Item added", body = ClipboardItem),
        (status = 400, description = "Invalid body", body = ErrorBody),
        (status = 404, description = "Collection not found", body = ErrorBody),
        (status = 409, description = "Concurrent modification; retry", body = ErrorBody),
        (status = 500, description = "Store error", body = ErrorBody)
    )
)]
pub async fn add_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<NewClipItem>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(new_item) = payload?;
    let item = state.clips.collections.add_item(&id, new_item).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Remove an item from a collection.
#[utoipa::path(
    delete,
    path = "/collections/{id}/items/{item_id}",
    tag = "Collections",
    params(
        ("id" = String, Path, description = "Collection id"),
        ("item_id" = String, Path, description = "Item id")
    ),
    responses(
        (status = 200, description = "Item deleted", body = DeleteItemResponse),
        (status = 404, description = "Collection or item not found", body = ErrorBody),
        (status = 409, description = "Concurrent modification; retry", body = ErrorBody),
        (status = 500, description = "Store error", body = ErrorBody)
    )
)]
pub async fn delete_item(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(String, String)>,
) -> Result<Json<DeleteItemResponse>, ApiError> {
    state.clips.collections.delete_item(&id, &item_id).await?;
    Ok(Json(DeleteItemResponse {
        message: "Item deleted".to_string(),
    }))
}
