use crate::{
    api::models::*,
    auth::jwt::JwtService,
    core::{
        errors::SantaError,
        models::{AppLog, Gift, GiftPatch, Group, NewGift, Participant, ParticipantSummary},
        services::{JoinedGroup, SantaService},
        session::{Language, Session},
    },
    infrastructure::{logging::in_memory::InMemoryLogging, storage::in_memory::InMemoryStorage},
};
use axum::{
    Extension, Json, Router,
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{
        IntoResponse,
        sse::{Event, KeepAlive, Sse},
    },
};
use futures::stream::{self, Stream};
use http::header;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

pub type Service = SantaService<InMemoryLogging, InMemoryStorage>;

const SETTLE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<Service>,
    pub jwt: Arc<JwtService>,
    pub default_language: Language,
}

// Middleware to validate the bearer token and attach the caller's session
async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(SantaError::MissingActor)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(SantaError::InvalidCredentials)?;

    let claims = state.jwt.validate_token(token)?;
    let locale = req
        .headers()
        .get(header::ACCEPT_LANGUAGE)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string);
    let session = claims.session(locale.as_deref(), state.default_language);
    req.extensions_mut().insert(session);
    Ok(next.run(req).await)
}

// Define API routes
pub fn api_routes(state: AppState) -> Router {
    use axum::routing::{delete, get, post, put};

    Router::new()
        .route("/session", get(get_session))
        .route("/session/language", put(set_language))
        .route("/groups", get(list_groups).post(create_group))
        .route("/groups/live", get(live_groups))
        .route("/groups/join", post(join_group))
        .route(
            "/groups/{group_id}",
            get(get_group).put(rename_group).delete(delete_group),
        )
        .route(
            "/groups/{group_id}/participants",
            get(list_participants).post(add_participant),
        )
        .route(
            "/groups/{group_id}/participants/{participant_id}",
            delete(delete_participant),
        )
        .route(
            "/groups/{group_id}/participants/{participant_id}/summary",
            get(participant_summary),
        )
        .route(
            "/groups/{group_id}/participants/{participant_id}/gifts",
            get(list_gifts).post(add_gift),
        )
        .route(
            "/groups/{group_id}/participants/{participant_id}/gifts/{gift_id}",
            axum::routing::patch(update_gift).delete(delete_gift),
        )
        .route("/logs", get(get_app_logs))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/session",
    responses(
        (status = 200, description = "Current session", body = SessionResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn get_session(Extension(session): Extension<Session>) -> Result<Json<SessionResponse>, ApiError> {
    Ok(Json(SessionResponse::from_session(&session)?))
}

// Stateless: the caller stores the returned value and sends it back as the
// token's `lang` claim or through Accept-Language on later requests.
#[utoipa::path(
    put,
    path = "/api/session/language",
    request_body = SetLanguageRequest,
    responses(
        (status = 200, description = "Validated language to persist client-side; the server keeps no preference", body = LanguageResponse),
        (status = 400, description = "Unsupported language", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn set_language(
    Extension(mut session): Extension<Session>,
    Json(req): Json<SetLanguageRequest>,
) -> Result<Json<LanguageResponse>, ApiError> {
    session.actor()?;
    let language = session.set_language(req.language);
    Ok(Json(LanguageResponse {
        language: language.to_string(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/groups",
    responses(
        (status = 200, description = "Every group the caller administers or belongs to", body = GroupFeedResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 503, description = "Group feed unavailable", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn list_groups(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<GroupFeedResponse>, ApiError> {
    let mut feed = state.service.group_feed(session.actor()?)?;
    let settled = tokio::time::timeout(SETTLE_TIMEOUT, feed.settled())
        .await
        .map_err(|_| SantaError::Transport("group feed did not settle".to_string()))?;
    feed.close();
    Ok(Json(GroupFeedResponse::from(settled.as_ref())))
}

#[utoipa::path(
    get,
    path = "/api/groups/live",
    responses(
        (status = 200, description = "text/event-stream of group view states, one `groups` event per change"),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn live_groups(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let feed = state.service.group_feed(session.actor()?)?;
    let updates = feed.subscribe();
    // The feed lives inside the stream and is torn down when the client leaves.
    let events = stream::unfold((feed, updates, true), |(feed, mut updates, first)| async move {
        if !first && updates.changed().await.is_err() {
            return None;
        }
        let current = Arc::clone(&updates.borrow_and_update());
        let event = Event::default()
            .event("groups")
            .id(current.version.to_string())
            .json_data(GroupFeedResponse::from(current.as_ref()))
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "could not encode group feed state");
                Event::default().event("error").data("encoding failed")
            });
        Some((Ok(event), (feed, updates, false)))
    });
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

#[utoipa::path(
    post,
    path = "/api/groups",
    request_body = CreateGroupRequest,
    responses(
        (status = 201, description = "Group created", body = Group),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 503, description = "No free invite code", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn create_group(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(req): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<Group>), ApiError> {
    let group = state
        .service
        .create_group(session.actor()?, req.name, req.max_budget)
        .await?;
    Ok((StatusCode::CREATED, Json(group)))
}

#[utoipa::path(
    get,
    path = "/api/groups/{group_id}",
    params(
        ("group_id" = String, Path, description = "ID of the group")
    ),
    responses(
        (status = 200, description = "Group retrieved", body = Group),
        (status = 403, description = "Not a member", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn get_group(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(group_id): Path<String>,
) -> Result<Json<Group>, ApiError> {
    let group = state.service.get_group(session.actor()?, &group_id).await?;
    Ok(Json(group))
}

#[utoipa::path(
    put,
    path = "/api/groups/{group_id}",
    request_body = RenameGroupRequest,
    params(
        ("group_id" = String, Path, description = "ID of the group")
    ),
    responses(
        (status = 200, description = "Group renamed", body = Group),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 403, description = "Not group admin", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn rename_group(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(group_id): Path<String>,
    Json(req): Json<RenameGroupRequest>,
) -> Result<Json<Group>, ApiError> {
    let group = state
        .service
        .rename_group(session.actor()?, &group_id, req.name)
        .await?;
    Ok(Json(group))
}

#[utoipa::path(
    delete,
    path = "/api/groups/{group_id}",
    params(
        ("group_id" = String, Path, description = "ID of the group to delete")
    ),
    responses(
        (status = 200, description = "Group and its contents deleted", body = DeleteResponse),
        (status = 403, description = "Not group admin", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 500, description = "Delete incomplete", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn delete_group(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(group_id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let deleted = state.service.delete_group(session.actor()?, &group_id).await?;
    Ok(Json(DeleteResponse { deleted }))
}

#[utoipa::path(
    post,
    path = "/api/groups/join",
    request_body = JoinGroupRequest,
    responses(
        (status = 200, description = "Joined group", body = JoinedGroup),
        (status = 400, description = "Malformed invite code or input", body = ErrorResponse),
        (status = 404, description = "Invite code not found", body = ErrorResponse),
        (status = 409, description = "Already a member", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn join_group(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(req): Json<JoinGroupRequest>,
) -> Result<Json<JoinedGroup>, ApiError> {
    let joined = state
        .service
        .join_group_by_code(session.actor()?, &req.code, req.name, req.email)
        .await?;
    Ok(Json(joined))
}

#[utoipa::path(
    post,
    path = "/api/groups/{group_id}/participants",
    request_body = AddParticipantRequest,
    params(
        ("group_id" = String, Path, description = "ID of the group")
    ),
    responses(
        (status = 201, description = "Participant added", body = Participant),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 403, description = "Not group admin", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn add_participant(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(group_id): Path<String>,
    Json(req): Json<AddParticipantRequest>,
) -> Result<(StatusCode, Json<Participant>), ApiError> {
    let participant = state
        .service
        .add_participant(session.actor()?, &group_id, req.name, req.email, req.user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(participant)))
}

#[utoipa::path(
    get,
    path = "/api/groups/{group_id}/participants",
    params(
        ("group_id" = String, Path, description = "ID of the group")
    ),
    responses(
        (status = 200, description = "Participants, newest first", body = Vec<Participant>),
        (status = 403, description = "Not a member", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn list_participants(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(group_id): Path<String>,
) -> Result<Json<Vec<Participant>>, ApiError> {
    let participants = state
        .service
        .list_participants(session.actor()?, &group_id)
        .await?;
    Ok(Json(participants))
}

#[utoipa::path(
    delete,
    path = "/api/groups/{group_id}/participants/{participant_id}",
    params(
        ("group_id" = String, Path, description = "ID of the group"),
        ("participant_id" = String, Path, description = "ID of the participant")
    ),
    responses(
        (status = 200, description = "Participant and gifts deleted", body = DeleteResponse),
        (status = 403, description = "Not group admin", body = ErrorResponse),
        (status = 404, description = "Group or participant not found", body = ErrorResponse),
        (status = 500, description = "Delete incomplete", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn delete_participant(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path((group_id, participant_id)): Path<(String, String)>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let deleted = state
        .service
        .delete_participant(session.actor()?, &group_id, &participant_id)
        .await?;
    Ok(Json(DeleteResponse { deleted }))
}

#[utoipa::path(
    get,
    path = "/api/groups/{group_id}/participants/{participant_id}/summary",
    params(
        ("group_id" = String, Path, description = "ID of the group"),
        ("participant_id" = String, Path, description = "ID of the participant")
    ),
    responses(
        (status = 200, description = "Gift total against the group budget", body = ParticipantSummary),
        (status = 403, description = "Not a member", body = ErrorResponse),
        (status = 404, description = "Group or participant not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn participant_summary(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path((group_id, participant_id)): Path<(String, String)>,
) -> Result<Json<ParticipantSummary>, ApiError> {
    let summary = state
        .service
        .participant_summary(session.actor()?, &group_id, &participant_id)
        .await?;
    Ok(Json(summary))
}

#[utoipa::path(
    get,
    path = "/api/groups/{group_id}/participants/{participant_id}/gifts",
    params(
        ("group_id" = String, Path, description = "ID of the group"),
        ("participant_id" = String, Path, description = "ID of the participant")
    ),
    responses(
        (status = 200, description = "Gifts ordered by title", body = Vec<Gift>),
        (status = 403, description = "Not a member", body = ErrorResponse),
        (status = 404, description = "Group or participant not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn list_gifts(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path((group_id, participant_id)): Path<(String, String)>,
) -> Result<Json<Vec<Gift>>, ApiError> {
    let gifts = state
        .service
        .list_gifts(session.actor()?, &group_id, &participant_id)
        .await?;
    Ok(Json(gifts))
}

#[utoipa::path(
    post,
    path = "/api/groups/{group_id}/participants/{participant_id}/gifts",
    request_body = NewGift,
    params(
        ("group_id" = String, Path, description = "ID of the group"),
        ("participant_id" = String, Path, description = "ID of the participant")
    ),
    responses(
        (status = 201, description = "Gift added", body = Gift),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 403, description = "Not allowed to edit this list", body = ErrorResponse),
        (status = 404, description = "Group or participant not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn add_gift(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path((group_id, participant_id)): Path<(String, String)>,
    Json(req): Json<NewGift>,
) -> Result<(StatusCode, Json<Gift>), ApiError> {
    let gift = state
        .service
        .add_gift(session.actor()?, &group_id, &participant_id, req)
        .await?;
    Ok((StatusCode::CREATED, Json(gift)))
}

#[utoipa::path(
    patch,
    path = "/api/groups/{group_id}/participants/{participant_id}/gifts/{gift_id}",
    request_body = GiftPatch,
    params(
        ("group_id" = String, Path, description = "ID of the group"),
        ("participant_id" = String, Path, description = "ID of the participant"),
        ("gift_id" = String, Path, description = "ID of the gift")
    ),
    responses(
        (status = 200, description = "Gift updated", body = Gift),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 403, description = "Not allowed to edit this list", body = ErrorResponse),
        (status = 404, description = "Group, participant or gift not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn update_gift(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path((group_id, participant_id, gift_id)): Path<(String, String, String)>,
    Json(req): Json<GiftPatch>,
) -> Result<Json<Gift>, ApiError> {
    let gift = state
        .service
        .update_gift(session.actor()?, &group_id, &participant_id, &gift_id, req)
        .await?;
    Ok(Json(gift))
}

#[utoipa::path(
    delete,
    path = "/api/groups/{group_id}/participants/{participant_id}/gifts/{gift_id}",
    params(
        ("group_id" = String, Path, description = "ID of the group"),
        ("participant_id" = String, Path, description = "ID of the participant"),
        ("gift_id" = String, Path, description = "ID of the gift")
    ),
    responses(
        (status = 204, description = "Gift deleted"),
        (status = 403, description = "Not allowed to edit this list", body = ErrorResponse),
        (status = 404, description = "Group, participant or gift not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn delete_gift(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path((group_id, participant_id, gift_id)): Path<(String, String, String)>,
) -> Result<StatusCode, ApiError> {
    state
        .service
        .delete_gift(session.actor()?, &group_id, &participant_id, &gift_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/logs",
    responses(
        (status = 200, description = "Activity log", body = Vec<AppLog>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
async fn get_app_logs(State(state): State<AppState>) -> Result<Json<Vec<AppLog>>, ApiError> {
    let logs = state.service.get_app_logs().await?;
    Ok(Json(logs))
}
