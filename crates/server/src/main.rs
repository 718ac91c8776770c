// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]
#![allow(clippy::multiple_crate_versions)]

use axum::{
    Json, Router,
    extract::{Path, Query, State as AxumState},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use clap::Parser;
use raidplan::{Clock, SystemClock};
use raidplan_api::{
    ApiError, AuthenticatedActor, CancelEventResponse, CastVoteRequest, CreateAvailabilityRequest,
    CreateEventRequest, CreateEventResponse, CreatePlanRequest, DeleteAvailabilityResponse,
    EventInfo, HeatmapRequest, HeatmapResponse, ListAvailabilityRequest, ListAvailabilityResponse,
    PlanInfo, PlanResponse, ResolvePlanResponse, Role, RosterResponse, RosterWriteResponse,
    SignupRequest, SignupResponse, StartPollRequest, UpdateAvailabilityRequest,
    UpdateRosterRequest, WindowWriteResponse, WithdrawResponse, authenticate_stub, auto_assign,
    cancel_event, cancel_plan, cast_vote, create_availability, create_event, create_plan,
    delete_availability, get_audit_event, get_audit_timeline, get_event, get_heatmap, get_plan,
    get_roster, get_series, list_availability, resolve_due_plans, resolve_plan, sign_up,
    start_poll, update_availability, update_roster, withdraw_signup,
};
use raidplan_audit::{AuditEvent, Cause};
use raidplan_domain::parse_timezone;
use raidplan_persistence::Persistence;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

/// Raid Planner Server - HTTP server for availability, rosters and polls
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind the server to
    #[arg(short, long, default_value = "127.0.0.1")]
    bind: String,

    /// Port to bind the server to
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// Seconds between sweeps that resolve polls past their deadline
    #[arg(long, default_value_t = 60)]
    poll_sweep_seconds: u64,

    /// Heatmap slot length used when a request does not specify one
    #[arg(long, default_value_t = 30)]
    heatmap_slot_minutes: u32,

    /// IANA timezone used for recurrence when a request does not specify one
    #[arg(long, default_value = "UTC")]
    default_timezone: String,

    /// Path to the `SQLite` database file. If not provided, uses in-memory database.
    #[arg(long)]
    database: Option<String>,
}

/// Application state shared across handlers.
///
/// Persistence sits behind a single Mutex, which serializes every
/// load-apply-persist sequence.
#[derive(Clone)]
struct AppState {
    /// The persistence layer for entities and audit events.
    persistence: Arc<Mutex<Persistence>>,
    /// Source of the current instant.
    clock: Arc<dyn Clock>,
    /// Heatmap slot length when a request omits one.
    default_slot_minutes: u32,
    /// Recurrence timezone when a request omits one.
    default_timezone: String,
}

/// Stub authentication and cause fields carried by every write request.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct ActorFields {
    /// The actor ID performing this action.
    actor_id: i64,
    /// The role of the actor.
    actor_role: String,
    /// The cause ID for this action.
    cause_id: String,
    /// The cause description.
    cause_description: String,
}

/// A write request: actor fields plus the operation's body.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct ApiRequest<T> {
    #[serde(flatten)]
    actor: ActorFields,
    #[serde(flatten)]
    body: T,
}

/// Query parameters for the audit timeline endpoint.
#[derive(Debug, Deserialize)]
struct AuditTimelineQuery {
    /// `user`, `event` or `plan`.
    scope: String,
    /// The scoped entity's id.
    id: i64,
}

/// Error response type.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ErrorResponse {
    /// Error indicator.
    error: bool,
    /// Error message.
    message: String,
    /// The offending input field, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<String>,
    /// The signups named by a rejected roster batch.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    signup_ids: Vec<i64>,
}

/// HTTP error wrapper that implements `IntoResponse`.
struct HttpError {
    /// The HTTP status code.
    status: StatusCode,
    /// The error message.
    message: String,
    /// The offending input field, if any.
    field: Option<String>,
    /// Offending signups.
    signup_ids: Vec<i64>,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body: Json<ErrorResponse> = Json(ErrorResponse {
            error: true,
            message: self.message,
            field: self.field,
            signup_ids: self.signup_ids,
        });
        (self.status, body).into_response()
    }
}

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        let message: String = err.to_string();
        let (status, field, signup_ids): (StatusCode, Option<String>, Vec<i64>) = match err {
            ApiError::AuthenticationFailed { .. } => (StatusCode::UNAUTHORIZED, None, Vec::new()),
            ApiError::Unauthorized { .. } => (StatusCode::FORBIDDEN, None, Vec::new()),
            ApiError::InvalidInput { field, .. } => (StatusCode::BAD_REQUEST, Some(field), Vec::new()),
            ApiError::StateTransitionRejected { .. } => (StatusCode::CONFLICT, None, Vec::new()),
            ApiError::RosterBatchRejected { signup_ids, .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, None, signup_ids)
            }
            ApiError::ResourceNotFound { .. } => (StatusCode::NOT_FOUND, None, Vec::new()),
            ApiError::Internal { .. } => {
                error!(error = %message, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, None, Vec::new())
            }
        };
        Self {
            status,
            message,
            field,
            signup_ids,
        }
    }
}

/// Parses and authenticates the actor fields of a request.
fn authenticate(fields: ActorFields) -> Result<(AuthenticatedActor, Cause), HttpError> {
    let role: Role = fields.actor_role.parse().map_err(ApiError::from)?;
    let actor: AuthenticatedActor =
        authenticate_stub(fields.actor_id, role).map_err(ApiError::from)?;
    let cause: Cause = Cause::new(fields.cause_id, fields.cause_description);
    Ok((actor, cause))
}

// ============================================================================
// Availability
// ============================================================================

/// Handler for POST `/availability` endpoint.
async fn handle_create_availability(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<ApiRequest<CreateAvailabilityRequest>>,
) -> Result<Json<WindowWriteResponse>, HttpError> {
    info!(
        actor_id = req.actor.actor_id,
        role = %req.actor.actor_role,
        "Handling create_availability request"
    );
    let (actor, cause) = authenticate(req.actor)?;

    let mut persistence = app_state.persistence.lock().await;
    let response: WindowWriteResponse = create_availability(
        &mut persistence,
        app_state.clock.as_ref(),
        req.body,
        &actor,
        cause,
    )?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for PATCH `/availability/{window_id}` endpoint.
async fn handle_update_availability(
    AxumState(app_state): AxumState<AppState>,
    Path(window_id): Path<i64>,
    Json(req): Json<ApiRequest<UpdateAvailabilityRequest>>,
) -> Result<Json<WindowWriteResponse>, HttpError> {
    info!(
        actor_id = req.actor.actor_id,
        window_id, "Handling update_availability request"
    );
    let (actor, cause) = authenticate(req.actor)?;

    let mut persistence = app_state.persistence.lock().await;
    let response: WindowWriteResponse = update_availability(
        &mut persistence,
        app_state.clock.as_ref(),
        window_id,
        &req.body,
        &actor,
        cause,
    )?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for DELETE `/availability/{window_id}` endpoint.
async fn handle_delete_availability(
    AxumState(app_state): AxumState<AppState>,
    Path(window_id): Path<i64>,
    Json(req): Json<ActorFields>,
) -> Result<Json<DeleteAvailabilityResponse>, HttpError> {
    info!(
        actor_id = req.actor_id,
        window_id, "Handling delete_availability request"
    );
    let (actor, cause) = authenticate(req)?;

    let mut persistence = app_state.persistence.lock().await;
    let response: DeleteAvailabilityResponse = delete_availability(
        &mut persistence,
        app_state.clock.as_ref(),
        window_id,
        &actor,
        cause,
    )?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for GET `/availability` endpoint.
async fn handle_list_availability(
    AxumState(app_state): AxumState<AppState>,
    Query(params): Query<ListAvailabilityRequest>,
) -> Result<Json<ListAvailabilityResponse>, HttpError> {
    info!(user_id = params.user_id, "Handling list_availability request");

    let mut persistence = app_state.persistence.lock().await;
    let response: ListAvailabilityResponse = list_availability(&mut persistence, &params)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/heatmap` endpoint.
async fn handle_heatmap(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<HeatmapRequest>,
) -> Result<Json<HeatmapResponse>, HttpError> {
    info!(users = req.user_ids.len(), "Handling heatmap request");

    let mut persistence = app_state.persistence.lock().await;
    let response: HeatmapResponse =
        get_heatmap(&mut persistence, &req, app_state.default_slot_minutes)?;
    drop(persistence);

    Ok(Json(response))
}

// ============================================================================
// Events and rosters
// ============================================================================

/// Handler for POST `/events` endpoint.
async fn handle_create_event(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<ApiRequest<CreateEventRequest>>,
) -> Result<Json<CreateEventResponse>, HttpError> {
    info!(
        actor_id = req.actor.actor_id,
        title = %req.body.title,
        recurring = req.body.recurrence.is_some(),
        "Handling create_event request"
    );
    let (actor, cause) = authenticate(req.actor)?;

    let mut persistence = app_state.persistence.lock().await;
    let response: CreateEventResponse = create_event(
        &mut persistence,
        req.body,
        &actor,
        cause,
        &app_state.default_timezone,
    )?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for GET `/events/{event_id}` endpoint.
async fn handle_get_event(
    AxumState(app_state): AxumState<AppState>,
    Path(event_id): Path<i64>,
) -> Result<Json<EventInfo>, HttpError> {
    info!(event_id, "Handling get_event request");

    let mut persistence = app_state.persistence.lock().await;
    let response: EventInfo = get_event(&mut persistence, event_id)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for GET `/events/{event_id}/series` endpoint.
async fn handle_get_series(
    AxumState(app_state): AxumState<AppState>,
    Path(event_id): Path<i64>,
) -> Result<Json<Vec<EventInfo>>, HttpError> {
    info!(event_id, "Handling get_series request");

    let mut persistence = app_state.persistence.lock().await;
    let response: Vec<EventInfo> = get_series(&mut persistence, event_id)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/events/{event_id}/cancel` endpoint.
async fn handle_cancel_event(
    AxumState(app_state): AxumState<AppState>,
    Path(event_id): Path<i64>,
    Json(req): Json<ActorFields>,
) -> Result<Json<CancelEventResponse>, HttpError> {
    info!(actor_id = req.actor_id, event_id, "Handling cancel_event request");
    let (actor, cause) = authenticate(req)?;

    let mut persistence = app_state.persistence.lock().await;
    let response: CancelEventResponse = cancel_event(
        &mut persistence,
        app_state.clock.as_ref(),
        event_id,
        &actor,
        cause,
    )?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/events/{event_id}/signups` endpoint.
async fn handle_sign_up(
    AxumState(app_state): AxumState<AppState>,
    Path(event_id): Path<i64>,
    Json(req): Json<ApiRequest<SignupRequest>>,
) -> Result<Json<SignupResponse>, HttpError> {
    info!(actor_id = req.actor.actor_id, event_id, "Handling sign_up request");
    let (actor, cause) = authenticate(req.actor)?;

    let mut persistence = app_state.persistence.lock().await;
    let response: SignupResponse = sign_up(
        &mut persistence,
        app_state.clock.as_ref(),
        event_id,
        &req.body,
        &actor,
        cause,
    )?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/events/{event_id}/signups/{signup_id}/withdraw` endpoint.
async fn handle_withdraw_signup(
    AxumState(app_state): AxumState<AppState>,
    Path((event_id, signup_id)): Path<(i64, i64)>,
    Json(req): Json<ActorFields>,
) -> Result<Json<WithdrawResponse>, HttpError> {
    info!(
        actor_id = req.actor_id,
        event_id, signup_id, "Handling withdraw_signup request"
    );
    let (actor, cause) = authenticate(req)?;

    let mut persistence = app_state.persistence.lock().await;
    let response: WithdrawResponse = withdraw_signup(
        &mut persistence,
        app_state.clock.as_ref(),
        event_id,
        signup_id,
        &actor,
        cause,
    )?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for GET `/events/{event_id}/roster` endpoint.
async fn handle_get_roster(
    AxumState(app_state): AxumState<AppState>,
    Path(event_id): Path<i64>,
) -> Result<Json<RosterResponse>, HttpError> {
    info!(event_id, "Handling get_roster request");

    let mut persistence = app_state.persistence.lock().await;
    let response: RosterResponse = get_roster(&mut persistence, event_id)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/events/{event_id}/roster/auto_assign` endpoint.
async fn handle_auto_assign(
    AxumState(app_state): AxumState<AppState>,
    Path(event_id): Path<i64>,
    Json(req): Json<ActorFields>,
) -> Result<Json<RosterWriteResponse>, HttpError> {
    info!(actor_id = req.actor_id, event_id, "Handling auto_assign request");
    let (actor, cause) = authenticate(req)?;

    let mut persistence = app_state.persistence.lock().await;
    let response: RosterWriteResponse = auto_assign(&mut persistence, event_id, &actor, cause)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for PATCH `/events/{event_id}/roster` endpoint.
///
/// The batch is applied whole or not at all.
async fn handle_update_roster(
    AxumState(app_state): AxumState<AppState>,
    Path(event_id): Path<i64>,
    Json(req): Json<ApiRequest<UpdateRosterRequest>>,
) -> Result<Json<RosterWriteResponse>, HttpError> {
    info!(
        actor_id = req.actor.actor_id,
        event_id,
        entries = req.body.assignments.len(),
        "Handling update_roster request"
    );
    let (actor, cause) = authenticate(req.actor)?;

    let mut persistence = app_state.persistence.lock().await;
    let response: RosterWriteResponse =
        update_roster(&mut persistence, event_id, &req.body, &actor, cause)?;
    drop(persistence);

    Ok(Json(response))
}

// ============================================================================
// Plans
// ============================================================================

/// Handler for POST `/plans` endpoint.
async fn handle_create_plan(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<ApiRequest<CreatePlanRequest>>,
) -> Result<Json<PlanResponse>, HttpError> {
    info!(
        actor_id = req.actor.actor_id,
        title = %req.body.title,
        "Handling create_plan request"
    );
    let (actor, cause) = authenticate(req.actor)?;

    let mut persistence = app_state.persistence.lock().await;
    let response: PlanResponse = create_plan(
        &mut persistence,
        app_state.clock.as_ref(),
        req.body,
        &actor,
        cause,
    )?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for GET `/plans/{plan_id}` endpoint.
async fn handle_get_plan(
    AxumState(app_state): AxumState<AppState>,
    Path(plan_id): Path<i64>,
) -> Result<Json<PlanInfo>, HttpError> {
    info!(plan_id, "Handling get_plan request");

    let mut persistence = app_state.persistence.lock().await;
    let response: PlanInfo = get_plan(&mut persistence, plan_id)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/plans/{plan_id}/poll` endpoint.
async fn handle_start_poll(
    AxumState(app_state): AxumState<AppState>,
    Path(plan_id): Path<i64>,
    Json(req): Json<ApiRequest<StartPollRequest>>,
) -> Result<Json<PlanResponse>, HttpError> {
    info!(
        actor_id = req.actor.actor_id,
        plan_id,
        options = req.body.options.len(),
        "Handling start_poll request"
    );
    let (actor, cause) = authenticate(req.actor)?;

    let mut persistence = app_state.persistence.lock().await;
    let response: PlanResponse = start_poll(
        &mut persistence,
        app_state.clock.as_ref(),
        plan_id,
        req.body,
        &actor,
        cause,
    )?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/plans/{plan_id}/votes` endpoint.
async fn handle_cast_vote(
    AxumState(app_state): AxumState<AppState>,
    Path(plan_id): Path<i64>,
    Json(req): Json<ApiRequest<CastVoteRequest>>,
) -> Result<Json<PlanResponse>, HttpError> {
    info!(actor_id = req.actor.actor_id, plan_id, "Handling cast_vote request");
    let (actor, cause) = authenticate(req.actor)?;

    let mut persistence = app_state.persistence.lock().await;
    let response: PlanResponse = cast_vote(
        &mut persistence,
        app_state.clock.as_ref(),
        plan_id,
        req.body,
        &actor,
        cause,
    )?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/plans/{plan_id}/resolve` endpoint.
async fn handle_resolve_plan(
    AxumState(app_state): AxumState<AppState>,
    Path(plan_id): Path<i64>,
    Json(req): Json<ActorFields>,
) -> Result<Json<ResolvePlanResponse>, HttpError> {
    info!(actor_id = req.actor_id, plan_id, "Handling resolve_plan request");
    let (actor, cause) = authenticate(req)?;

    let mut persistence = app_state.persistence.lock().await;
    let response: ResolvePlanResponse = resolve_plan(
        &mut persistence,
        app_state.clock.as_ref(),
        plan_id,
        &actor,
        cause,
    )?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/plans/{plan_id}/cancel` endpoint.
async fn handle_cancel_plan(
    AxumState(app_state): AxumState<AppState>,
    Path(plan_id): Path<i64>,
    Json(req): Json<ActorFields>,
) -> Result<Json<PlanResponse>, HttpError> {
    info!(actor_id = req.actor_id, plan_id, "Handling cancel_plan request");
    let (actor, cause) = authenticate(req)?;

    let mut persistence = app_state.persistence.lock().await;
    let response: PlanResponse = cancel_plan(
        &mut persistence,
        app_state.clock.as_ref(),
        plan_id,
        &actor,
        cause,
    )?;
    drop(persistence);

    Ok(Json(response))
}

// ============================================================================
// Audit
// ============================================================================

/// Handler for GET `/audit/timeline` endpoint.
///
/// Returns the ordered audit events of one user, event or plan.
async fn handle_get_audit_timeline(
    AxumState(app_state): AxumState<AppState>,
    Query(params): Query<AuditTimelineQuery>,
) -> Result<Json<Vec<AuditEvent>>, HttpError> {
    info!(
        scope = %params.scope,
        id = params.id,
        "Handling get_audit_timeline request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let events: Vec<AuditEvent> = get_audit_timeline(&mut persistence, &params.scope, params.id)?;
    drop(persistence);

    Ok(Json(events))
}

/// Handler for GET `/audit/event/{event_id}` endpoint.
async fn handle_get_audit_event(
    AxumState(app_state): AxumState<AppState>,
    Path(event_id): Path<i64>,
) -> Result<Json<AuditEvent>, HttpError> {
    info!(event_id, "Handling get_audit_event request");

    let mut persistence = app_state.persistence.lock().await;
    let event: AuditEvent = get_audit_event(&mut persistence, event_id)?;
    drop(persistence);

    Ok(Json(event))
}

/// Builds the application router with all endpoints.
fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/availability",
            post(handle_create_availability).get(handle_list_availability),
        )
        .route(
            "/availability/{window_id}",
            patch(handle_update_availability).delete(handle_delete_availability),
        )
        .route("/heatmap", post(handle_heatmap))
        .route("/events", post(handle_create_event))
        .route("/events/{event_id}", get(handle_get_event))
        .route("/events/{event_id}/series", get(handle_get_series))
        .route("/events/{event_id}/cancel", post(handle_cancel_event))
        .route("/events/{event_id}/signups", post(handle_sign_up))
        .route(
            "/events/{event_id}/signups/{signup_id}/withdraw",
            post(handle_withdraw_signup),
        )
        .route(
            "/events/{event_id}/roster",
            get(handle_get_roster).patch(handle_update_roster),
        )
        .route(
            "/events/{event_id}/roster/auto_assign",
            post(handle_auto_assign),
        )
        .route("/plans", post(handle_create_plan))
        .route("/plans/{plan_id}", get(handle_get_plan))
        .route("/plans/{plan_id}/poll", post(handle_start_poll))
        .route("/plans/{plan_id}/votes", post(handle_cast_vote))
        .route("/plans/{plan_id}/resolve", post(handle_resolve_plan))
        .route("/plans/{plan_id}/cancel", post(handle_cancel_plan))
        .route("/audit/timeline", get(handle_get_audit_timeline))
        .route("/audit/event/{event_id}", get(handle_get_audit_event))
        .with_state(app_state)
}

/// Resolves every plan whose poll deadline has passed. Returns how many
/// plans were resolved.
async fn sweep_due_plans(app_state: &AppState) -> usize {
    let mut persistence = app_state.persistence.lock().await;
    let swept = resolve_due_plans(&mut persistence, app_state.clock.as_ref());
    drop(persistence);

    let resolved: Vec<ResolvePlanResponse> = match swept {
        Ok(resolved) => resolved,
        Err(err) => {
            error!(error = %err, "Poll sweep failed");
            return 0;
        }
    };

    if !resolved.is_empty() {
        info!(resolved = resolved.len(), "Poll sweep resolved plans");
    }
    resolved.len()
}

/// Spawns the background task that resolves due polls on an interval.
fn spawn_poll_sweeper(app_state: AppState, period: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            sweep_due_plans(&app_state).await;
        }
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command-line arguments
    let args: Args = Args::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Initializing Raid Planner Server");

    parse_timezone(&args.default_timezone)?;

    // Initialize persistence (in-memory or file-based based on CLI argument)
    let persistence: Persistence = if let Some(db_path) = &args.database {
        info!("Using file-based database at: {}", db_path);
        Persistence::new_with_file(db_path)?
    } else {
        info!("Using in-memory database");
        Persistence::new_in_memory()?
    };

    let app_state: AppState = AppState {
        persistence: Arc::new(Mutex::new(persistence)),
        clock: Arc::new(SystemClock),
        default_slot_minutes: args.heatmap_slot_minutes,
        default_timezone: args.default_timezone.clone(),
    };

    info!(
        every_seconds = args.poll_sweep_seconds,
        "Starting poll deadline sweeper"
    );
    let sweeper: tokio::task::JoinHandle<()> = spawn_poll_sweeper(
        app_state.clone(),
        Duration::from_secs(args.poll_sweep_seconds.max(1)),
    );

    // Build router
    let app: Router = build_router(app_state);

    // Bind to address
    let addr: std::net::SocketAddr = format!("{}:{}", args.bind, args.port).parse()?;
    info!("Server listening on {}", addr);

    // Run server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    sweeper.abort();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode as HttpStatusCode},
    };
    use raidplan::FixedClock;
    use serde_json::{Value, json};
    use time::macros::datetime;
    use tower::ServiceExt;

    /// Helper to create test app state with in-memory persistence and a
    /// clock the test controls.
    fn create_test_app_state() -> (AppState, Arc<FixedClock>) {
        let clock: Arc<FixedClock> = Arc::new(FixedClock::new(datetime!(2026-04-01 12:00 UTC)));
        let app_state: AppState = AppState {
            persistence: Arc::new(Mutex::new(Persistence::new_in_memory().unwrap())),
            clock: clock.clone(),
            default_slot_minutes: 30,
            default_timezone: String::from("UTC"),
        };
        (app_state, clock)
    }

    /// Adds the stub actor fields to a request body.
    fn with_actor(actor_id: i64, role: &str, mut body: Value) -> Value {
        body["actor_id"] = json!(actor_id);
        body["actor_role"] = json!(role);
        body["cause_id"] = json!("test-cause");
        body["cause_description"] = json!("Test request");
        body
    }

    fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(body).unwrap()))
            .unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (HttpStatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body_bytes).unwrap())
    }

    /// Creates the standard test event as an admin and returns its id.
    async fn create_test_event(app: &Router) -> i64 {
        let body = with_actor(
            1,
            "admin",
            json!({
                "title": "Raid night",
                "start": "2026-04-06T19:00:00Z",
                "end": "2026-04-06T22:00:00Z",
                "slot_config": {
                    "config_type": "mmo",
                    "counts": { "tank": 1, "healer": 1, "dps": 2 }
                },
                "game_id": 3
            }),
        );
        let (status, response) = send(app, json_request("POST", "/events", &body)).await;
        assert_eq!(status, HttpStatusCode::OK);
        response["events"][0]["id"].as_i64().unwrap()
    }

    /// Creates a plan with a two-option poll closing 2026-04-03 12:00 UTC.
    async fn create_polling_plan(app: &Router) -> i64 {
        let body = with_actor(
            7,
            "member",
            json!({ "title": "Raid night", "duration_minutes": 180 }),
        );
        let (status, response) = send(app, json_request("POST", "/plans", &body)).await;
        assert_eq!(status, HttpStatusCode::OK);
        let plan_id = response["plan"]["id"].as_i64().unwrap();

        let body = with_actor(
            7,
            "member",
            json!({
                "options": [
                    { "date": "2026-04-10T19:00:00Z", "label": "Fri" },
                    { "date": "2026-04-11T19:00:00Z", "label": "Sat" }
                ],
                "poll_ends_at": "2026-04-03T12:00:00Z"
            }),
        );
        let (status, _) = send(
            app,
            json_request("POST", &format!("/plans/{plan_id}/poll"), &body),
        )
        .await;
        assert_eq!(status, HttpStatusCode::OK);
        plan_id
    }

    #[tokio::test]
    async fn test_create_availability_reports_conflicts() {
        let (app_state, _) = create_test_app_state();
        let app: Router = build_router(app_state);

        let first = with_actor(
            10,
            "member",
            json!({ "start": "2026-04-02T18:00:00Z", "end": "2026-04-02T22:00:00Z" }),
        );
        let second = with_actor(
            10,
            "member",
            json!({
                "start": "2026-04-02T21:00:00Z",
                "end": "2026-04-02T23:00:00Z",
                "status": "blocked"
            }),
        );

        let (status, created) = send(&app, json_request("POST", "/availability", &first)).await;
        assert_eq!(status, HttpStatusCode::OK);
        let (status, response) = send(&app, json_request("POST", "/availability", &second)).await;

        assert_eq!(status, HttpStatusCode::OK);
        assert_eq!(response["window"]["status"], "blocked");
        assert_eq!(
            response["conflicts"][0]["conflicting_id"],
            created["window"]["id"]
        );

        let (status, listed) = send(
            &app,
            Request::builder()
                .uri("/availability?user_id=10")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, HttpStatusCode::OK);
        assert_eq!(listed["windows"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_timestamp_returns_bad_request_with_field() {
        let (app_state, _) = create_test_app_state();
        let app: Router = build_router(app_state);

        let body = with_actor(
            10,
            "member",
            json!({ "start": "tomorrow", "end": "2026-04-02T22:00:00Z" }),
        );
        let (status, response) = send(&app, json_request("POST", "/availability", &body)).await;

        assert_eq!(status, HttpStatusCode::BAD_REQUEST);
        assert_eq!(response["error"], true);
        assert_eq!(response["field"], "start");
    }

    #[tokio::test]
    async fn test_unknown_role_is_unauthenticated() {
        let (app_state, _) = create_test_app_state();
        let app: Router = build_router(app_state);

        let body = with_actor(
            10,
            "raid_leader",
            json!({ "start": "2026-04-02T18:00:00Z", "end": "2026-04-02T22:00:00Z" }),
        );
        let (status, _) = send(&app, json_request("POST", "/availability", &body)).await;

        assert_eq!(status, HttpStatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_member_cannot_cancel_event() {
        let (app_state, _) = create_test_app_state();
        let app: Router = build_router(app_state);
        let event_id = create_test_event(&app).await;

        let body = with_actor(10, "member", json!({}));
        let (status, _) = send(
            &app,
            json_request("POST", &format!("/events/{event_id}/cancel"), &body),
        )
        .await;

        assert_eq!(status, HttpStatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_signup_then_cancel_frees_window() {
        let (app_state, _) = create_test_app_state();
        let app: Router = build_router(app_state);
        let event_id = create_test_event(&app).await;

        let body = with_actor(20, "member", json!({ "role": "healer" }));
        let (status, signup) = send(
            &app,
            json_request("POST", &format!("/events/{event_id}/signups"), &body),
        )
        .await;
        assert_eq!(status, HttpStatusCode::OK);
        assert_eq!(signup["assignment"]["slot"], "healer");
        assert_eq!(signup["committed_window"]["status"], "committed");

        let body = with_actor(1, "admin", json!({}));
        let (status, cancelled) = send(
            &app,
            json_request("POST", &format!("/events/{event_id}/cancel"), &body),
        )
        .await;
        assert_eq!(status, HttpStatusCode::OK);
        assert_eq!(cancelled["freed_user_ids"], json!([20]));

        let (status, again) = send(
            &app,
            json_request("POST", &format!("/events/{event_id}/cancel"), &body),
        )
        .await;
        assert_eq!(status, HttpStatusCode::CONFLICT);
        assert_eq!(again["error"], true);
    }

    #[tokio::test]
    async fn test_rejected_roster_batch_names_signups() {
        let (app_state, _) = create_test_app_state();
        let app: Router = build_router(app_state);
        let event_id = create_test_event(&app).await;

        let mut signup_ids: Vec<i64> = Vec::new();
        for user_id in [20, 21] {
            let body = with_actor(user_id, "member", json!({ "role": "dps" }));
            let (_, signup) = send(
                &app,
                json_request("POST", &format!("/events/{event_id}/signups"), &body),
            )
            .await;
            signup_ids.push(signup["signup_id"].as_i64().unwrap());
        }

        let body = with_actor(
            1,
            "admin",
            json!({
                "assignments": [
                    { "signup_id": signup_ids[0], "slot": "dps", "position": 1 },
                    { "signup_id": signup_ids[1], "slot": "dps", "position": 1 }
                ]
            }),
        );
        let (status, response) = send(
            &app,
            json_request("PATCH", &format!("/events/{event_id}/roster"), &body),
        )
        .await;

        assert_eq!(status, HttpStatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response["signup_ids"], json!(signup_ids));
    }

    #[tokio::test]
    async fn test_unknown_plan_is_not_found() {
        let (app_state, _) = create_test_app_state();
        let app: Router = build_router(app_state);

        let (status, _) = send(
            &app,
            Request::builder()
                .uri("/plans/99")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(status, HttpStatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_sweep_resolves_poll_after_deadline() {
        let (app_state, clock) = create_test_app_state();
        let app: Router = build_router(app_state.clone());
        let plan_id = create_polling_plan(&app).await;

        let body = with_actor(20, "member", json!({ "option_index": 1 }));
        let (status, _) = send(
            &app,
            json_request("POST", &format!("/plans/{plan_id}/votes"), &body),
        )
        .await;
        assert_eq!(status, HttpStatusCode::OK);

        assert_eq!(sweep_due_plans(&app_state).await, 0);
        clock.set(datetime!(2026-04-03 12:00 UTC));
        assert_eq!(sweep_due_plans(&app_state).await, 1);

        let (status, plan) = send(
            &app,
            Request::builder()
                .uri(format!("/plans/{plan_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, HttpStatusCode::OK);
        assert_eq!(plan["status"], "completed");
        assert_eq!(plan["winning_option"], 1);

        let event_id = plan["created_event_id"].as_i64().unwrap();
        let (status, event) = send(
            &app,
            Request::builder()
                .uri(format!("/events/{event_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, HttpStatusCode::OK);
        assert_eq!(event["start"], "2026-04-11T19:00:00Z");

        // An explicit resolve after the sweep loses the race.
        let body = with_actor(7, "member", json!({}));
        let (status, _) = send(
            &app,
            json_request("POST", &format!("/plans/{plan_id}/resolve"), &body),
        )
        .await;
        assert_eq!(status, HttpStatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_audit_timeline_for_plan() {
        let (app_state, _) = create_test_app_state();
        let app: Router = build_router(app_state);
        let plan_id = create_polling_plan(&app).await;

        let (status, timeline) = send(
            &app,
            Request::builder()
                .uri(format!("/audit/timeline?scope=plan&id={plan_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(status, HttpStatusCode::OK);
        let names: Vec<&str> = timeline
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["action"]["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["CreatePlan", "StartPoll"]);

        let first_id = timeline[0]["event_id"].as_i64().unwrap();
        let (status, event) = send(
            &app,
            Request::builder()
                .uri(format!("/audit/event/{first_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, HttpStatusCode::OK);
        assert_eq!(event["action"]["name"], "CreatePlan");
    }
}
