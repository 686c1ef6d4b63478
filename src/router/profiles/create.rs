use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::{Result, ServerError};
use crate::profile::{Gender, NewProfile, Profile, ProfileCreateRequest};
use crate::user::User;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: i64,
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub gender: Gender,
    pub date_of_birth: chrono::NaiveDate,
    pub info: String,
    /// Retrievable URL, not the storage key.
    pub avatar: String,
}

impl Response {
    fn new(profile: Profile, avatar_url: String) -> Self {
        Self {
            id: profile.id,
            user_id: profile.user_id,
            first_name: profile.first_name,
            last_name: profile.last_name,
            gender: profile.gender,
            date_of_birth: profile.date_of_birth,
            info: profile.info,
            avatar: avatar_url,
        }
    }
}

/// Handler to create a profile for `user_id`.
///
/// The caller must be the target user, or hold a moderator or admin role
/// to act on someone else's behalf.
pub async fn handler(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    headers: HeaderMap,
    request: ProfileCreateRequest,
) -> Result<(StatusCode, Json<Response>)> {
    let caller = authenticate(&state, &headers).await?;

    if caller.id != user_id && !caller.is_privileged() {
        return Err(ServerError::Forbidden);
    }

    // A missing or deactivated target is reported exactly like a bad
    // caller, so the endpoint does not reveal which accounts exist.
    let target = state
        .users
        .find_by_id(user_id)
        .await?
        .filter(|user| user.is_active)
        .ok_or(ServerError::Unauthorized)?;

    if state.profiles.find_by_user_id(target.id).await?.is_some() {
        return Err(ServerError::Conflict);
    }

    let key = format!("avatars/{}_{}", target.id, request.avatar.filename);
    state
        .storage
        .upload(&key, request.avatar.content.clone(), request.avatar.content_type)
        .await?;
    let avatar_url = state.storage.file_url(&key);

    let profile = state
        .profiles
        .insert(&NewProfile {
            user_id: target.id,
            first_name: request.first_name,
            last_name: request.last_name,
            gender: request.gender,
            date_of_birth: request.date_of_birth,
            info: request.info,
            avatar: key,
        })
        .await?;

    tracing::info!(user_id = profile.user_id, "profile created");

    Ok((StatusCode::CREATED, Json(Response::new(profile, avatar_url))))
}

/// Resolve the requesting [`User`] from the `Authorization` header.
async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<User> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .map(|header| header.replace(super::BEARER, ""))
        .ok_or(ServerError::Unauthorized)?;

    let claims = state
        .token
        .decode(&token)
        .map_err(|_| ServerError::Unauthorized)?;
    let caller_id = claims
        .sub
        .parse::<i64>()
        .map_err(|_| ServerError::Unauthorized)?;

    state
        .users
        .find_by_id(caller_id)
        .await?
        .filter(|user| user.is_active)
        .ok_or(ServerError::Unauthorized)
}
