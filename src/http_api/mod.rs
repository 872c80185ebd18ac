use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{Duration, Local, NaiveDateTime};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::task::{default_duration, duration_from_minutes, priority};
use crate::{Calendar, CalendarError, Conflict, Deadline, Event, PlannerConfig, Task, WhichDays};

#[derive(Clone)]
pub struct AppState {
    calendar: Arc<RwLock<Calendar>>,
    config: Arc<PlannerConfig>,
}

impl AppState {
    pub fn new(calendar: Calendar, config: PlannerConfig) -> Self {
        Self {
            calendar: Arc::new(RwLock::new(calendar)),
            config: Arc::new(config),
        }
    }

    pub fn with_shared(calendar: Arc<RwLock<Calendar>>, config: PlannerConfig) -> Self {
        Self {
            calendar,
            config: Arc::new(config),
        }
    }

    fn calendar(&self) -> Arc<RwLock<Calendar>> {
        self.calendar.clone()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    Conflict(String),
    Invalid(String),
    NotImplemented(String),
}

impl From<CalendarError> for ApiError {
    fn from(value: CalendarError) -> Self {
        match value {
            CalendarError::Infeasible(_) => ApiError::Conflict(value.to_string()),
            CalendarError::NotImplemented(_) => ApiError::NotImplemented(value.to_string()),
            other => ApiError::Invalid(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::Conflict(message) => (StatusCode::CONFLICT, "infeasible", message),
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            ApiError::NotImplemented(message) => {
                (StatusCode::NOT_IMPLEMENTED, "not_implemented", message)
            }
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct TaskPayload {
    pub name: String,
    #[serde(default)]
    pub duration_minutes: Option<f64>,
    #[serde(default)]
    pub due_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub priority: Option<i32>,
}

impl TaskPayload {
    fn into_task(self) -> Result<Task, ApiError> {
        let duration = match self.duration_minutes {
            Some(minutes) => duration_from_minutes(minutes).ok_or_else(|| {
                ApiError::Invalid(format!("duration_minutes {minutes} is out of range"))
            })?,
            None => default_duration(),
        };
        Ok(Task::new(self.name)
            .with_duration(duration)
            .with_due_date(Deadline::from(self.due_date))
            .with_priority(self.priority.unwrap_or(priority::NO_PRIORITY)))
    }
}

#[derive(Debug, Deserialize)]
pub struct EventPayload {
    #[serde(flatten)]
    pub task: TaskPayload,
    pub start_time: NaiveDateTime,
    #[serde(default)]
    pub end_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub which_days: WhichDays,
}

#[derive(Debug, Default, Deserialize)]
pub struct SchedulePayload {
    #[serde(default)]
    pub break_minutes: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ConflictReport {
    pub recurring_conflict: bool,
    pub has_conflict: bool,
    pub conflicts: Vec<Conflict>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/events", get(list_events).post(create_event))
        .route("/conflicts", get(conflicts))
        .route("/schedule", post(assign_tasks))
        .route("/schedule/all", post(assign_all_events))
        .with_state(state)
}

pub async fn serve(
    addr: SocketAddr,
    calendar: Calendar,
    config: PlannerConfig,
) -> std::io::Result<()> {
    let state = AppState::new(calendar, config);
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn list_tasks(State(state): State<AppState>) -> Json<Vec<Task>> {
    let calendar = state.calendar();
    let tasks = calendar.read().tasks().to_vec();
    Json(tasks)
}

async fn create_task(
    State(state): State<AppState>,
    Json(payload): Json<TaskPayload>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let task = payload.into_task()?;
    let calendar = state.calendar();
    let created = {
        let mut guard = calendar.write();
        guard.push_task(task)?.clone()
    };
    Ok((StatusCode::CREATED, Json(created)))
}

async fn list_events(State(state): State<AppState>) -> Json<Vec<Event>> {
    let calendar = state.calendar();
    let events = calendar.read().events().cloned().collect();
    Json(events)
}

async fn create_event(
    State(state): State<AppState>,
    Json(payload): Json<EventPayload>,
) -> Result<(StatusCode, Json<Event>), ApiError> {
    let task = payload.task.into_task()?;
    let event = Event::new(task, payload.start_time, payload.end_time, payload.which_days)?;
    let calendar = state.calendar();
    calendar.write().add_event(event.clone());
    Ok((StatusCode::CREATED, Json(event)))
}

async fn conflicts(State(state): State<AppState>) -> Json<ConflictReport> {
    let calendar = state.calendar();
    let report = {
        let guard = calendar.read();
        ConflictReport {
            recurring_conflict: guard.check_recurring_conflict(),
            has_conflict: guard.check_all_conflict(),
            conflicts: guard.find_conflicts(),
        }
    };
    Json(report)
}

fn break_time(state: &AppState, payload: Option<Json<SchedulePayload>>) -> Result<Duration, ApiError> {
    match payload.and_then(|Json(body)| body.break_minutes) {
        Some(minutes) => Duration::try_minutes(minutes).ok_or_else(|| {
            ApiError::Invalid(format!("break_minutes {minutes} is out of range"))
        }),
        None => Ok(state.config.break_time()),
    }
}

async fn assign_tasks(
    State(state): State<AppState>,
    payload: Option<Json<SchedulePayload>>,
) -> Result<Json<Vec<Event>>, ApiError> {
    let break_time = break_time(&state, payload)?;
    let start = Local::now()
        .naive_local()
        .checked_add_signed(state.config.headstart())
        .ok_or_else(|| ApiError::Invalid("headstart is out of range".into()))?;
    let calendar = state.calendar();
    let events = calendar.write().assign_tasks_from(start, break_time)?;
    Ok(Json(events))
}

async fn assign_all_events(
    State(state): State<AppState>,
    payload: Option<Json<SchedulePayload>>,
) -> Result<Json<Vec<Event>>, ApiError> {
    let break_time = break_time(&state, payload)?;
    let calendar = state.calendar();
    let events = calendar.write().assign_all_events(break_time)?;
    Ok(Json(events))
}
