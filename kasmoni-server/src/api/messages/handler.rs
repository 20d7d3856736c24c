//! Message API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::ErrorCode;
use shared::models::{Message, MessageCreate};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::{member, message};
use crate::utils::validation::{
    MAX_MESSAGE_LEN, MAX_NAME_LEN, validate_id, validate_required_text,
};
use crate::utils::{AppError, AppResult};

/// GET /api/messages - admins see all; members see their own and broadcasts
pub async fn list(
    State(state): State<ServerState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<Message>>> {
    let messages = if current_user.is_admin() {
        message::find_all(&state.pool).await?
    } else if let Some(member_id) = current_user.member_id {
        message::find_for_member(&state.pool, member_id).await?
    } else {
        message::find_broadcasts(&state.pool).await?
    };
    Ok(Json(messages))
}

/// POST /api/messages - broadcast when `member_id` is empty
pub async fn send(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Json(payload): Json<MessageCreate>,
) -> AppResult<Json<Message>> {
    let payload = MessageCreate {
        subject: payload.subject.trim().to_string(),
        body: payload.body.trim().to_string(),
        ..payload
    };
    validate_required_text(&payload.subject, "subject", MAX_NAME_LEN)?;
    validate_required_text(&payload.body, "body", MAX_MESSAGE_LEN)?;
    if let Some(member_id) = payload.member_id {
        validate_id(member_id, "member_id")?;
        if member::find_member_by_id(&state.pool, member_id).await?.is_none() {
            return Err(AppError::new(ErrorCode::MemberNotFound).with_detail("field", "member_id"));
        }
    }

    let sent = message::create(&state.pool, current_user.id, &payload).await?;
    tracing::info!(
        message_id = sent.id,
        member_id = ?sent.member_id,
        actor = current_user.id,
        "Message sent"
    );
    Ok(Json(sent))
}

/// POST /api/messages/{id}/read - recipient or admin
pub async fn mark_read(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    validate_id(id, "message_id")?;
    let found = message::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| message_not_found(id))?;

    let is_recipient = match found.member_id {
        None => true,
        Some(member_id) => current_user.member_id == Some(member_id),
    };
    if !current_user.is_admin() && !is_recipient {
        return Err(AppError::permission_denied(
            "You can only mark your own messages as read",
        ));
    }

    Ok(Json(message::mark_read(&state.pool, id).await?))
}

/// DELETE /api/messages/{id}
pub async fn delete(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    validate_id(id, "message_id")?;
    if !message::delete(&state.pool, id).await? {
        return Err(message_not_found(id));
    }
    tracing::info!(message_id = id, actor = current_user.id, "Message deleted");
    Ok(Json(true))
}

fn message_not_found(id: i64) -> AppError {
    AppError::new(ErrorCode::MessageNotFound).with_detail("message_id", id)
}
