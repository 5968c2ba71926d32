use std::collections::BTreeMap;
use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Path, Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::Json;
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth;
use crate::auth::extractor::AdminUser;
use crate::auth::jwt::{encode_token, Claims};
use crate::error::AppError;
use crate::models::{Submission, SubmissionKind};
use crate::state::SharedState;
use crate::views;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub secret: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub access_token: String,
}

#[derive(Deserialize)]
pub struct ListParams {
    pub search: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateRequest {
    #[serde(flatten)]
    pub fields: BTreeMap<String, String>,
}

fn admin_cookie(token: &str) -> CookieJar {
    let cookie = Cookie::build(("admin_token", token.to_string()))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::minutes(60))
        .build();
    CookieJar::new().add(cookie)
}

fn clear_admin_cookie() -> CookieJar {
    let cookie = Cookie::build(("admin_token", ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .build();
    CookieJar::new().add(cookie)
}

pub async fn login(
    State(state): State<SharedState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    let ip = addr.ip();

    if let Err(retry_after) = state.login_limiter.check(ip) {
        return Err(AppError::RateLimited(format!(
            "Too many failed attempts. Retry after {retry_after}s"
        )));
    }

    if !auth::secret_matches(&req.secret, &state.config.admin_secret) {
        state.login_limiter.record_failure(ip);
        tracing::warn!("Failed admin login from {ip}");
        return Err(AppError::Unauthorized("Incorrect password".to_string()));
    }

    let access_token =
        encode_token(&Claims::admin(), &state.config.jwt_secret).map_err(AppError::Internal)?;

    tracing::info!("Admin login from {ip}");

    let jar = admin_cookie(&access_token);
    Ok((jar, Json(LoginResponse { access_token })))
}

pub async fn logout() -> (CookieJar, Json<serde_json::Value>) {
    (
        clear_admin_cookie(),
        Json(json!({ "message": "Logged out" })),
    )
}

/// Dashboard listing. `search` filters the rendered rows case-insensitively
/// without another storage query.
pub async fn list(
    _admin: AdminUser,
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let all = state.store.read_all().await?;
    let total = all.len();

    let mut rows = views::admin::build_rows(&all);
    if let Some(query) = params.search.as_deref().filter(|q| !q.trim().is_empty()) {
        views::admin::retain_matching(&mut rows, query);
    }

    Ok(Json(json!({
        "submissions": rows,
        "shown": rows.len(),
        "total": total,
    })))
}

pub async fn get(
    _admin: AdminUser,
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let record = state
        .store
        .read_one(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Submission not found".to_string()))?;

    Ok(Json(json!({ "id": id, "record": record })))
}

/// Full overwrite of one record: whatever kind it had, it is `Edited` now,
/// with a fresh timestamp and exactly the fields posted here.
pub async fn update(
    _admin: AdminUser,
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    state
        .store
        .read_one(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Submission not found".to_string()))?;

    let fields: BTreeMap<String, String> = req
        .fields
        .into_iter()
        .filter_map(|(key, value)| {
            let value = value.trim().to_string();
            (!value.is_empty()).then_some((key, value))
        })
        .collect();

    let record = Submission::new(SubmissionKind::Edited, fields);
    state.store.replace(&id, &record).await?;

    tracing::info!("Admin edited submission {id}");

    Ok(Json(json!({ "id": id, "record": record })))
}

pub async fn delete(
    _admin: AdminUser,
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.store.delete(&id).await?;

    tracing::info!("Admin deleted submission {id}");

    Ok(Json(json!({ "message": "Deleted" })))
}

/// Live respondent counter. The current total is emitted immediately, then
/// once per collection change; the subscription ends with the connection.
pub async fn events(_admin: AdminUser, State(state): State<SharedState>) -> impl IntoResponse {
    let rx = state.store.subscribe();

    let stream = futures_util::stream::unfold((rx, true), |(mut rx, first)| async move {
        if !first && rx.changed().await.is_err() {
            return None;
        }
        let count = rx.borrow_and_update().len();
        let event = Event::default().event("count").data(count.to_string());
        Some((Ok::<_, Infallible>(event), (rx, false)))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
