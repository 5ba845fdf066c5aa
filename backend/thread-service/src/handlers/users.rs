/// User handlers - current user and onboarding
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::AppState;
use crate::error::Result;
use crate::middleware::ExternalUserId;
use crate::models::{User, UserProfile};

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 64))]
    pub username: String,
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    #[validate(url)]
    pub image: Option<String>,
    #[validate(length(max = 1000))]
    pub bio: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CurrentUserResponse {
    pub onboarded: bool,
    pub user: Option<User>,
}

/// GET /api/v1/users/me
pub async fn get_current_user(
    state: web::Data<AppState>,
    identity: ExternalUserId,
) -> Result<HttpResponse> {
    let user = state.users.current_user(&identity.0).await?;
    Ok(HttpResponse::Ok().json(CurrentUserResponse {
        onboarded: user.as_ref().is_some_and(|u| u.onboarded),
        user,
    }))
}

/// PUT /api/v1/users/me
pub async fn update_current_user(
    state: web::Data<AppState>,
    identity: ExternalUserId,
    req: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse> {
    req.validate()?;
    let req = req.into_inner();

    let user = state
        .users
        .complete_onboarding(UserProfile {
            external_id: identity.0,
            username: req.username.trim().to_string(),
            name: req.name.trim().to_string(),
            image: req.image,
            bio: req.bio,
        })
        .await?;

    Ok(HttpResponse::Ok().json(user))
}
