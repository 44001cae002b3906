//! REST handlers and router assembly.

use axum::{
    extract::{Path as AxumPath, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use referral_core::{
    referral, ListFilter, ReferralDraft, ReferralError, ReferralId, ReferralService,
};

use crate::extract::AuthenticatedPrincipal;
use crate::wire::{
    AddNoteReq, ApiError, ErrorBody, HealthRes, ReferralListRes, ReferralRes, UpdateStatusReq,
};

/// Application state shared across REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub referral_service: ReferralService,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        list_referrals,
        create_referral,
        get_referral,
        update_status,
        add_note,
        mark_notifications_read,
        search_by_history,
    ),
    components(schemas(
        HealthRes,
        ReferralRes,
        ReferralListRes,
        UpdateStatusReq,
        AddNoteReq,
        ErrorBody,
        ReferralDraft,
        referral::PatientDraft,
        referral::ClinicalStateDraft,
        referral::LabReportDraft,
        referral::ImagingReportDraft,
        referral::MedicationsDraft,
        referral::VitalSigns,
        referral_core::Status,
        referral_core::Priority,
        referral_core::TrafficKind,
    ))
)]
struct ApiDoc;

/// Build the REST router over the given state.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/referrals", get(list_referrals))
        .route("/referrals", post(create_referral))
        .route("/referrals/history/:history_number", get(search_by_history))
        .route("/referrals/:id", get(get_referral))
        .route("/referrals/:id/status", put(update_status))
        .route("/referrals/:id/notes", post(add_note))
        .route(
            "/referrals/:id/notifications/read",
            put(mark_notifications_read),
        )
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn parse_id(raw: &str) -> Result<ReferralId, ApiError> {
    ReferralId::parse_str(raw)
        .map_err(|_| ApiError::from(ReferralError::validation("id", "must be a UUID")))
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "Referral REST API is alive".into(),
    })
}

#[utoipa::path(
    get,
    path = "/referrals",
    params(ListFilter),
    responses(
        (status = 200, description = "Referrals inside the caller's scope", body = ReferralListRes),
        (status = 401, description = "Missing or malformed identity", body = ErrorBody),
        (status = 503, description = "Store unavailable", body = ErrorBody)
    )
)]
/// List referrals
///
/// Applies the caller's filter AND-combined with their authorization scope:
/// non-admin callers only ever see referrals touching their own department,
/// regardless of the department parameters they supply.
#[axum::debug_handler]
async fn list_referrals(
    State(state): State<AppState>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
    Query(filter): Query<ListFilter>,
) -> Result<Json<ReferralListRes>, ApiError> {
    let views = state.referral_service.list(&principal, &filter)?;
    Ok(Json(ReferralListRes {
        total: views.len(),
        data: views,
    }))
}

#[utoipa::path(
    post,
    path = "/referrals",
    request_body = ReferralDraft,
    responses(
        (status = 201, description = "Referral created", body = ReferralRes),
        (status = 400, description = "Malformed draft", body = ErrorBody),
        (status = 403, description = "Foreign requesting department", body = ErrorBody),
        (status = 409, description = "History number already in use", body = ErrorBody)
    )
)]
/// Create a new referral
///
/// Non-admin callers may only originate referrals from their own department.
#[axum::debug_handler]
async fn create_referral(
    State(state): State<AppState>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
    Json(draft): Json<ReferralDraft>,
) -> Result<(StatusCode, Json<ReferralRes>), ApiError> {
    let view = state.referral_service.create(&principal, draft)?;
    Ok((StatusCode::CREATED, Json(ReferralRes { data: view })))
}

#[utoipa::path(
    get,
    path = "/referrals/{id}",
    responses(
        (status = 200, description = "Referral with derived fields", body = ReferralRes),
        (status = 403, description = "Caller belongs to neither endpoint", body = ErrorBody),
        (status = 404, description = "Unknown referral", body = ErrorBody)
    )
)]
/// Fetch one referral by id
#[axum::debug_handler]
async fn get_referral(
    State(state): State<AppState>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<ReferralRes>, ApiError> {
    let id = parse_id(&id)?;
    let view = state.referral_service.get(&principal, id)?;
    Ok(Json(ReferralRes { data: view }))
}

#[utoipa::path(
    put,
    path = "/referrals/{id}/status",
    request_body = UpdateStatusReq,
    responses(
        (status = 200, description = "Status updated", body = ReferralRes),
        (status = 403, description = "Caller belongs to neither endpoint", body = ErrorBody),
        (status = 404, description = "Unknown referral", body = ErrorBody),
        (status = 409, description = "Referral is in a terminal status", body = ErrorBody)
    )
)]
/// Update the status of a referral
#[axum::debug_handler]
async fn update_status(
    State(state): State<AppState>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<UpdateStatusReq>,
) -> Result<Json<ReferralRes>, ApiError> {
    let id = parse_id(&id)?;
    let view = state
        .referral_service
        .update_status(&principal, id, req.status)?;
    Ok(Json(ReferralRes { data: view }))
}

#[utoipa::path(
    post,
    path = "/referrals/{id}/notes",
    request_body = AddNoteReq,
    responses(
        (status = 200, description = "Note and its notification appended", body = ReferralRes),
        (status = 400, description = "Empty content or author", body = ErrorBody),
        (status = 403, description = "Caller belongs to neither endpoint", body = ErrorBody),
        (status = 404, description = "Unknown referral", body = ErrorBody),
        (status = 409, description = "Referral is in a terminal status", body = ErrorBody)
    )
)]
/// Add a clinical note
///
/// Appending a note always leaves exactly one notification behind.
#[axum::debug_handler]
async fn add_note(
    State(state): State<AppState>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<AddNoteReq>,
) -> Result<Json<ReferralRes>, ApiError> {
    let id = parse_id(&id)?;
    let view = state.referral_service.add_note(
        &principal,
        id,
        &req.content,
        &req.author,
        req.department,
    )?;
    Ok(Json(ReferralRes { data: view }))
}

#[utoipa::path(
    put,
    path = "/referrals/{id}/notifications/read",
    responses(
        (status = 200, description = "All notifications flipped to read", body = ReferralRes),
        (status = 403, description = "Caller belongs to neither endpoint", body = ErrorBody),
        (status = 404, description = "Unknown referral", body = ErrorBody)
    )
)]
/// Mark every notification on a referral as read
#[axum::debug_handler]
async fn mark_notifications_read(
    State(state): State<AppState>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<ReferralRes>, ApiError> {
    let id = parse_id(&id)?;
    let view = state
        .referral_service
        .mark_notifications_read(&principal, id)?;
    Ok(Json(ReferralRes { data: view }))
}

#[utoipa::path(
    get,
    path = "/referrals/history/{history_number}",
    responses(
        (status = 200, description = "Referrals for the history number, inside the caller's scope", body = ReferralListRes),
        (status = 400, description = "Empty history number", body = ErrorBody)
    )
)]
/// Search referrals by patient history number
#[axum::debug_handler]
async fn search_by_history(
    State(state): State<AppState>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
    AxumPath(history_number): AxumPath<String>,
) -> Result<Json<ReferralListRes>, ApiError> {
    let views = state
        .referral_service
        .search_by_history(&principal, &history_number)?;
    Ok(Json(ReferralListRes {
        total: views.len(),
        data: views,
    }))
}
