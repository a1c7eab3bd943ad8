use crate::analyzer::report::{AttendanceReport, build_report};
use crate::api::SharedSession;
use crate::calendar::{WeekMode, Weekday, parse_date, today};
use crate::config::{Config, StoreKind};
use crate::error::AttendanceError;
use crate::ledger::Status;
use crate::session::{DayView, Session};
use crate::store::RemoteStore;
use crate::timetable::Timetable;
use anyhow::anyhow;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeSet;
use std::sync::{Arc, MutexGuard};
use tracing::info;

#[derive(Clone)]
pub struct ApiState {
    pub config: Arc<Config>,
    pub session: SharedSession,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/v1/status", get(status))
        .route("/api/v1/timetable", get(timetable))
        .route("/api/v1/subjects", post(subject_create))
        .route("/api/v1/subjects/:name", delete(subject_delete))
        .route("/api/v1/days/:date", get(day))
        .route("/api/v1/days/:date/marks/:subject", put(mark_put))
        .route("/api/v1/days/:date/proxies", post(proxy_create))
        .route("/api/v1/days/:date/proxies/:index", put(proxy_status_put))
        .route("/api/v1/days/:date/extras", post(extra_create))
        .route("/api/v1/days/:date/extras/:index", put(extra_status_put))
        .route("/api/v1/stats", get(stats))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct StatusPayload {
    user: String,
    store: StoreKind,
    week_mode: WeekMode,
    extra_lectures: bool,
    dirty: bool,
    subjects: usize,
    recorded_dates: usize,
    api_port: u16,
}

#[derive(Debug, Serialize)]
struct TimetablePayload {
    week_mode: WeekMode,
    subjects: BTreeSet<String>,
    timetable: Timetable,
}

#[derive(Debug, Deserialize)]
struct SubjectPayload {
    name: String,
    days: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct StatusUpdatePayload {
    status: String,
}

#[derive(Debug, Deserialize)]
struct ProxyPayload {
    scheduled: String,
    replacement: String,
}

#[derive(Debug, Deserialize)]
struct ExtraPayload {
    subject: String,
    #[serde(default)]
    teacher: Option<String>,
}

async fn status(State(state): State<ApiState>) -> ApiResult<Json<StatusPayload>> {
    let session = lock(&state)?;

    Ok(Json(StatusPayload {
        user: session.user().uid.clone(),
        store: state.config.store,
        week_mode: session.settings().week_mode,
        extra_lectures: session.settings().extra_lectures,
        dirty: session.is_dirty(),
        subjects: session.timetable().all_subjects().len(),
        recorded_dates: session.ledger().len(),
        api_port: state.config.api_port,
    }))
}

async fn timetable(State(state): State<ApiState>) -> ApiResult<Json<TimetablePayload>> {
    let session = lock(&state)?;
    Ok(Json(timetable_payload(&session)))
}

async fn subject_create(
    State(state): State<ApiState>,
    Json(payload): Json<SubjectPayload>,
) -> ApiResult<(StatusCode, Json<TimetablePayload>)> {
    let days = payload
        .days
        .iter()
        .map(|day| day.parse::<Weekday>())
        .collect::<Result<BTreeSet<_>, _>>()?;

    let mut session = lock(&state)?;
    session.add_subject(&payload.name, &days)?;
    info!(subject = %payload.name, days = days.len(), "subject added");

    Ok((StatusCode::CREATED, Json(timetable_payload(&session))))
}

async fn subject_delete(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> ApiResult<Json<Value>> {
    let mut session = lock(&state)?;
    let marks_removed = session.remove_subject(&name)?;

    Ok(Json(json!({
        "removed": name,
        "marks_removed": marks_removed,
        "saved": !session.is_dirty()
    })))
}

async fn day(
    State(state): State<ApiState>,
    Path(date): Path<String>,
) -> ApiResult<Json<DayView>> {
    let date = parse_date(&date)?;
    let session = lock(&state)?;

    Ok(Json(session.day_view(date)))
}

async fn mark_put(
    State(state): State<ApiState>,
    Path((date, subject)): Path<(String, String)>,
    Json(payload): Json<StatusUpdatePayload>,
) -> ApiResult<Json<DayView>> {
    let date = parse_date(&date)?;
    let status = parse_status(&payload.status)?;

    let mut session = lock(&state)?;
    session.mark(date, &subject, status)?;

    Ok(Json(session.day_view(date)))
}

async fn proxy_create(
    State(state): State<ApiState>,
    Path(date): Path<String>,
    Json(payload): Json<ProxyPayload>,
) -> ApiResult<(StatusCode, Json<DayView>)> {
    let date = parse_date(&date)?;

    let mut session = lock(&state)?;
    if !session.add_proxy(date, &payload.scheduled, &payload.replacement)? {
        return Err(ApiError::BadRequest(
            "replacement subject cannot be empty".to_string(),
        ));
    }

    Ok((StatusCode::CREATED, Json(session.day_view(date))))
}

async fn proxy_status_put(
    State(state): State<ApiState>,
    Path((date, index)): Path<(String, usize)>,
    Json(payload): Json<StatusUpdatePayload>,
) -> ApiResult<Json<DayView>> {
    let date = parse_date(&date)?;
    let status = parse_status(&payload.status)?;

    let mut session = lock(&state)?;
    session.set_proxy_status(date, index, status)?;

    Ok(Json(session.day_view(date)))
}

async fn extra_create(
    State(state): State<ApiState>,
    Path(date): Path<String>,
    Json(payload): Json<ExtraPayload>,
) -> ApiResult<(StatusCode, Json<DayView>)> {
    let date = parse_date(&date)?;

    let mut session = lock(&state)?;
    if !session.add_extra(date, &payload.subject, payload.teacher.as_deref())? {
        return Err(ApiError::BadRequest(
            "extra lecture subject cannot be empty".to_string(),
        ));
    }

    Ok((StatusCode::CREATED, Json(session.day_view(date))))
}

async fn extra_status_put(
    State(state): State<ApiState>,
    Path((date, index)): Path<(String, usize)>,
    Json(payload): Json<StatusUpdatePayload>,
) -> ApiResult<Json<DayView>> {
    let date = parse_date(&date)?;
    let status = parse_status(&payload.status)?;

    let mut session = lock(&state)?;
    session.set_extra_status(date, index, status)?;

    Ok(Json(session.day_view(date)))
}

async fn stats(State(state): State<ApiState>) -> ApiResult<Json<AttendanceReport>> {
    let session = lock(&state)?;
    let report = build_report(today(), &session.user().uid, &session.stats());

    Ok(Json(report))
}

fn timetable_payload(session: &Session<Box<dyn RemoteStore>>) -> TimetablePayload {
    TimetablePayload {
        week_mode: session.settings().week_mode,
        subjects: session.timetable().all_subjects(),
        timetable: session.timetable().clone(),
    }
}

fn lock(state: &ApiState) -> ApiResult<MutexGuard<'_, Session<Box<dyn RemoteStore>>>> {
    state
        .session
        .lock()
        .map_err(|_| ApiError::Internal(anyhow!("session lock poisoned")))
}

fn parse_status(raw: &str) -> ApiResult<Status> {
    raw.parse::<Status>().map_err(ApiError::BadRequest)
}

type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug)]
enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(value: anyhow::Error) -> Self {
        Self::Internal(value)
    }
}

impl From<AttendanceError> for ApiError {
    fn from(value: AttendanceError) -> Self {
        match value {
            AttendanceError::IndexOutOfRange { .. } | AttendanceError::UnknownSubject(_) => {
                Self::NotFound(value.to_string())
            }
            _ => Self::BadRequest(value.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Internal(error) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": error.to_string() })),
            )
                .into_response(),
        }
    }
}
