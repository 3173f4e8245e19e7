//! Routes for the town context.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use plaza_core::geometry::BoundingBox;
use plaza_town::application::command_handlers::{self, CreatedTown, JoinedTown};
use plaza_town::application::query_handlers::{self, TownView};
use plaza_town::application::registry::TownListing;
use plaza_town::domain::commands;
use plaza_town::domain::group::Message;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;
use crate::transport;

fn default_listed() -> bool {
    true
}

/// Request body for POST /.
#[derive(Debug, Deserialize)]
pub struct CreateTownRequest {
    /// Display name of the town.
    pub friendly_name: String,
    /// Whether the town appears in the public listing.
    #[serde(default = "default_listed")]
    pub is_publicly_listed: bool,
}

/// Request body for PATCH /{town_id}.
#[derive(Debug, Deserialize)]
pub struct UpdateTownRequest {
    /// The town's update password.
    pub update_password: String,
    /// New display name.
    pub friendly_name: Option<String>,
    /// New visibility.
    pub is_publicly_listed: Option<bool>,
}

/// Request body for DELETE /{town_id}.
#[derive(Debug, Deserialize)]
pub struct DeleteTownRequest {
    /// The town's update password.
    pub update_password: String,
}

/// Request body for POST /{town_id}/sessions.
#[derive(Debug, Deserialize)]
pub struct JoinTownRequest {
    /// Display name of the joining participant.
    pub display_name: String,
}

/// Request body for POST /{town_id}/zones.
#[derive(Debug, Deserialize)]
pub struct CreateZoneRequest {
    /// Session token of the requesting participant.
    pub session_token: String,
    /// Unique zone label.
    pub label: String,
    /// Discussion topic.
    pub topic: String,
    /// Region covered by the zone.
    pub bounding_box: BoundingBox,
}

/// Request body for POST /{town_id}/messages.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    /// Session token of the author.
    pub session_token: String,
    /// Target group.
    pub group_id: Uuid,
    /// Message text.
    pub body: String,
    /// Recipient, for a private message.
    pub private_recipient_id: Option<Uuid>,
}

/// Response body for GET /.
#[derive(Debug, Serialize)]
pub struct TownListResponse {
    /// Publicly listed towns.
    pub towns: Vec<TownListing>,
}

/// POST /
#[instrument(skip(state, request))]
async fn create_town(
    State(state): State<AppState>,
    Json(request): Json<CreateTownRequest>,
) -> Result<(StatusCode, Json<CreatedTown>), ApiError> {
    let command = commands::CreateTown {
        correlation_id: Uuid::new_v4(),
        friendly_name: request.friendly_name,
        is_publicly_listed: request.is_publicly_listed,
    };

    info!(correlation_id = %command.correlation_id, "handling create_town command");

    let created = command_handlers::handle_create_town(&command, &state.towns)?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /
async fn list_towns(State(state): State<AppState>) -> Result<Json<TownListResponse>, ApiError> {
    let towns = query_handlers::list_public_towns(&state.towns)?;
    Ok(Json(TownListResponse { towns }))
}

/// GET /{town_id}
#[instrument(skip(state))]
async fn get_town(
    State(state): State<AppState>,
    Path(town_id): Path<String>,
) -> Result<Json<TownView>, ApiError> {
    let view = query_handlers::get_town_by_id(&town_id, &state.towns)?;
    Ok(Json(view))
}

/// PATCH /{town_id}
#[instrument(skip(state, request))]
async fn update_town(
    State(state): State<AppState>,
    Path(town_id): Path<String>,
    Json(request): Json<UpdateTownRequest>,
) -> Result<StatusCode, ApiError> {
    let command = commands::UpdateTown {
        correlation_id: Uuid::new_v4(),
        town_id,
        update_password: request.update_password,
        friendly_name: request.friendly_name,
        is_publicly_listed: request.is_publicly_listed,
    };

    info!(correlation_id = %command.correlation_id, "handling update_town command");

    command_handlers::handle_update_town(&command, &state.towns)?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /{town_id}
#[instrument(skip(state, request))]
async fn delete_town(
    State(state): State<AppState>,
    Path(town_id): Path<String>,
    Json(request): Json<DeleteTownRequest>,
) -> Result<StatusCode, ApiError> {
    let command = commands::DeleteTown {
        correlation_id: Uuid::new_v4(),
        town_id,
        update_password: request.update_password,
    };

    info!(correlation_id = %command.correlation_id, "handling delete_town command");

    command_handlers::handle_delete_town(&command, &state.towns)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /{town_id}/sessions
#[instrument(skip(state, request))]
async fn join_town(
    State(state): State<AppState>,
    Path(town_id): Path<String>,
    Json(request): Json<JoinTownRequest>,
) -> Result<Json<JoinedTown>, ApiError> {
    let command = commands::JoinTown {
        correlation_id: Uuid::new_v4(),
        town_id,
        display_name: request.display_name,
    };

    info!(correlation_id = %command.correlation_id, "handling join_town command");

    let joined = command_handlers::handle_join_town(
        &command,
        &state.towns,
        state.credentials.as_ref(),
        state.clock.as_ref(),
    )
    .await?;
    Ok(Json(joined))
}

/// POST /{town_id}/zones
#[instrument(skip(state, request), fields(label = %request.label))]
async fn create_zone(
    State(state): State<AppState>,
    Path(town_id): Path<String>,
    Json(request): Json<CreateZoneRequest>,
) -> Result<StatusCode, ApiError> {
    let command = commands::CreateZone {
        correlation_id: Uuid::new_v4(),
        town_id,
        session_token: request.session_token,
        label: request.label,
        topic: request.topic,
        bounding_box: request.bounding_box,
    };

    info!(correlation_id = %command.correlation_id, "handling create_zone command");

    command_handlers::handle_create_zone(&command, &state.towns)?;
    Ok(StatusCode::CREATED)
}

/// POST /{town_id}/messages
#[instrument(skip(state, request), fields(group_id = %request.group_id))]
async fn send_message(
    State(state): State<AppState>,
    Path(town_id): Path<String>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<Message>, ApiError> {
    let command = commands::SendMessage {
        correlation_id: Uuid::new_v4(),
        town_id,
        session_token: request.session_token,
        group_id: request.group_id,
        body: request.body,
        private_recipient_id: request.private_recipient_id,
    };

    info!(correlation_id = %command.correlation_id, "handling send_message command");

    let message =
        command_handlers::handle_send_message(&command, &state.towns, state.clock.as_ref())?;
    Ok(Json(message))
}

/// Returns the router for the town context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_town).get(list_towns))
        .route(
            "/{town_id}",
            get(get_town).patch(update_town).delete(delete_town),
        )
        .route("/{town_id}/sessions", post(join_town))
        .route("/{town_id}/zones", post(create_zone))
        .route("/{town_id}/messages", post(send_message))
        .route("/{town_id}/ws", get(transport::ws_handler))
}
