//! OpenAPI document, served as JSON at `/openapi.json`.

use axum::Json;
use utoipa::OpenApi;

use clipshare_core::{ClipItemType, ClipboardItem, NewClipItem};

use crate::error::ErrorBody;
use crate::handlers;
use crate::handlers::collections::{
    CollectionResponse, CreateCollectionResponse, DeleteItemResponse,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Clipshare API",
        description = "Short-lived shared clipboard collections"
    ),
    paths(
        handlers::health::health_check,
        handlers::collections::create_collection,
        handlers::collections::get_collection,
        handlers::collections::add_item,
        handlers::collections::delete_item,
    ),
    components(schemas(
        ClipItemType,
        ClipboardItem,
        NewClipItem,
        CreateCollectionResponse,
        CollectionResponse,
        DeleteItemResponse,
        ErrorBody,
    )),
    tags(
        (name = "Collections", description = "Shared clipboard collections"),
        (name = "Health", description = "Liveness and store reachability")
    )
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
