use crate::{
    auth::{
        auth::AuthUser,
        password::{hash_password, verify_password},
    },
    error::AppError,
    model::user::{UserChanges, UserProfile},
    models::UpdateProfileDto,
    store::{StoreError, UserStore},
};
use actix_web::{HttpResponse, web};
use anyhow::anyhow;
use tracing::{info, instrument};

/// Current user's profile
#[utoipa::path(
    get,
    path = "/api/users/profile",
    responses(
        (status = 200, description = "Profile", body = UserProfile),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found", body = Object, example = json!({
            "error": "User not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
#[instrument(name = "user_profile", skip_all, fields(user_id = auth.user_id, email = %auth.email))]
pub async fn get_profile(
    auth: AuthUser,
    store: web::Data<dyn UserStore>,
) -> Result<HttpResponse, AppError> {
    let user = store
        .find_user(auth.user_id)
        .await?
        .ok_or(AppError::UserNotFound)?;

    Ok(HttpResponse::Ok().json(UserProfile::from(&user)))
}

/// Update name and/or password
#[utoipa::path(
    put,
    path = "/api/users/profile",
    request_body = UpdateProfileDto,
    responses(
        (status = 200, description = "Updated profile", body = UserProfile),
        (status = 400, description = "Current password is incorrect", body = Object, example = json!({
            "error": "Current password is incorrect"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
#[instrument(name = "user_update_profile", skip_all, fields(user_id = auth.user_id))]
pub async fn update_profile(
    auth: AuthUser,
    store: web::Data<dyn UserStore>,
    body: web::Json<UpdateProfileDto>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let user = store
        .find_user(auth.user_id)
        .await?
        .ok_or(AppError::UserNotFound)?;

    let mut changes = UserChanges::default();

    if let Some(name) = body.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()) {
        changes.name = Some(name);
    }

    // both passwords are needed for a change; either alone is ignored
    if let (Some(current), Some(new)) = (
        body.current_password.filter(|p| !p.is_empty()),
        body.new_password.filter(|p| !p.is_empty()),
    ) {
        if verify_password(&current, &user.password).is_err() {
            return Err(AppError::IncorrectPassword);
        }
        changes.password =
            Some(hash_password(&new).map_err(|e| anyhow!("Failed to hash password: {e}"))?);
    }

    if changes.is_empty() {
        return Ok(HttpResponse::Ok().json(UserProfile::from(&user)));
    }

    let password_changed = changes.password.is_some();
    let updated = store
        .update_user(user.id, changes)
        .await
        .map_err(|e| match e {
            StoreError::NotFound(_) => AppError::UserNotFound,
            other => other.into(),
        })?;

    info!(password_changed, "Profile updated");
    Ok(HttpResponse::Ok().json(UserProfile::from(&updated)))
}
