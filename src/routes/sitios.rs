use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use validator::Validate;

use crate::{
    dto::sitio_dto::{
        CreateSitioPayload, SitioListQuery, SitioListResponse, SitioResponse, UpdateSitioPayload,
    },
    error::Result,
    middleware::auth::Claims,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/admin/sitios",
    request_body = CreateSitioPayload,
    responses(
        (status = 201, description = "Sitio created successfully", body = Json<SitioResponse>),
        (status = 400, description = "Invalid payload")
    )
)]
#[axum::debug_handler]
pub async fn create_sitio(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateSitioPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let sitio = state
        .sitio_service
        .create(payload, Some(&claims.sub))
        .await?;
    Ok((StatusCode::CREATED, Json(SitioResponse::from(sitio))))
}

#[utoipa::path(
    get,
    path = "/api/admin/sitios",
    params(
        ("limit" = Option<i64>, Query, description = "Number of items to return")
    ),
    responses(
        (status = 200, description = "List of sitios", body = Json<SitioListResponse>)
    )
)]
#[axum::debug_handler]
pub async fn list_sitios(
    State(state): State<AppState>,
    Query(query): Query<SitioListQuery>,
) -> Result<impl IntoResponse> {
    let sitios = state.sitio_service.list(query.limit.unwrap_or(50)).await?;
    let items: Vec<SitioResponse> = sitios.into_iter().map(Into::into).collect();
    Ok(Json(SitioListResponse { items }))
}

#[utoipa::path(
    get,
    path = "/api/admin/sitios/{id}",
    params(
        ("id" = i64, Path, description = "Sitio ID")
    ),
    responses(
        (status = 200, description = "Sitio found", body = Json<SitioResponse>),
        (status = 404, description = "Sitio not found")
    )
)]
#[axum::debug_handler]
pub async fn get_sitio(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let sitio = state.sitio_service.get_by_id(id).await?;
    Ok(Json(SitioResponse::from(sitio)))
}

#[utoipa::path(
    patch,
    path = "/api/admin/sitios/{id}",
    params(
        ("id" = i64, Path, description = "Sitio ID")
    ),
    request_body = UpdateSitioPayload,
    responses(
        (status = 200, description = "Sitio updated successfully", body = Json<SitioResponse>),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Sitio not found")
    )
)]
#[axum::debug_handler]
pub async fn update_sitio(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateSitioPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let sitio = state
        .sitio_service
        .update(id, payload, Some(&claims.sub))
        .await?;
    Ok(Json(SitioResponse::from(sitio)))
}

#[utoipa::path(
    delete,
    path = "/api/admin/sitios/{id}",
    params(
        ("id" = i64, Path, description = "Sitio ID")
    ),
    responses(
        (status = 204, description = "Sitio deleted successfully"),
        (status = 404, description = "Sitio not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_sitio(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state.sitio_service.delete(id, Some(&claims.sub)).await?;
    Ok(StatusCode::NO_CONTENT)
}
