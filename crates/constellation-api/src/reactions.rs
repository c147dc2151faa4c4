use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::client_ip::ClientIp;
use crate::error::StarError;
use crate::{AppState, run_blocking};

/// POST /api/stars/{id}/react — one reaction per visitor per star per hour.
pub async fn react_to_star(
    State(state): State<AppState>,
    Path(star_id): Path<String>,
    ClientIp(ip): ClientIp,
) -> Result<impl IntoResponse, StarError> {
    let response = run_blocking(move || state.service.react_to_star(&star_id, &ip)).await?;

    Ok((StatusCode::CREATED, Json(response)))
}
