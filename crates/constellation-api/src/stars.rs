use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};

use constellation_types::api::{
    CreateStarRequest, CreateStarResponse, ListStarsQuery, ListStarsResponse, StarResponse,
};

use crate::client_ip::ClientIp;
use crate::error::StarError;
use crate::{AppState, run_blocking};

/// GET /api/stars — newest first, optionally filtered by theme.
pub async fn list_stars(
    State(state): State<AppState>,
    query: Result<Query<ListStarsQuery>, QueryRejection>,
) -> Result<impl IntoResponse, StarError> {
    let Query(query) = query?;
    let stars = run_blocking(move || {
        state
            .service
            .list_stars(query.theme.as_deref(), query.limit, query.offset)
    })
    .await?;

    Ok(Json(ListStarsResponse { stars }))
}

/// POST /api/stars — validate, rate limit, persist, then try to find a twin.
pub async fn create_star(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    req: Result<Json<CreateStarRequest>, JsonRejection>,
) -> Result<impl IntoResponse, StarError> {
    let Json(req) = req?;
    let star = run_blocking(move || state.service.create_star(req, &ip)).await?;

    Ok((StatusCode::CREATED, Json(CreateStarResponse { star })))
}

pub async fn get_star(
    State(state): State<AppState>,
    Path(star_id): Path<String>,
) -> Result<impl IntoResponse, StarError> {
    let star = run_blocking(move || state.service.get_star(&star_id)).await?;

    Ok(Json(StarResponse { star }))
}
