use crate::{
    auth::{
        jwt::generate_access_token,
        password::{hash_password, verify_password},
    },
    config::Config,
    error::AppError,
    model::user::{NewUser, User, UserProfile},
    models::{AuthResponse, LoginReqDto, RegisterReqDto},
    store::{StoreError, UserStore},
    utils::{
        email_cache::EmailCache,
        email_filter::{EmailFilter, normalize},
    },
};
use actix_web::{HttpResponse, web};
use anyhow::anyhow;
use tracing::{debug, error, info, instrument};

fn issue_token(user: &User, config: &Config) -> Result<AuthResponse, AppError> {
    let token = generate_access_token(user, &config.jwt_secret, config.access_token_ttl)
        .map_err(|e| anyhow!("Failed to sign token: {e}"))?;

    Ok(AuthResponse {
        user: UserProfile::from(user),
        token,
    })
}

/// true  => email AVAILABLE
/// false => email TAKEN
pub async fn is_email_available(
    email: &str,
    filter: &EmailFilter,
    cache: &EmailCache,
    store: &dyn UserStore,
) -> Result<bool, AppError> {
    // Cuckoo filter: a miss is a definite negative
    if !filter.might_exist(email) {
        return Ok(true);
    }

    // Moka cache: a hit is a definite positive
    if cache.is_taken(email).await {
        return Ok(false);
    }

    let exists = store.email_exists(email).await?;
    if exists {
        cache.mark_taken(email).await;
    }
    Ok(!exists)
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterReqDto,
    responses(
        (status = 200, description = "User registered", body = AuthResponse),
        (status = 400, description = "Email already registered", body = Object, example = json!({
            "error": "Email already registered"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_register", skip_all, fields(email = %body.email))]
pub async fn register(
    body: web::Json<RegisterReqDto>,
    store: web::Data<dyn UserStore>,
    filter: web::Data<EmailFilter>,
    cache: web::Data<EmailCache>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let email = normalize(&body.email);
    let name = body.name.trim().to_string();

    if email.is_empty() || body.password.is_empty() || name.is_empty() {
        return Err(AppError::validation(
            "Email, password and name must not be empty",
        ));
    }

    if !is_email_available(&email, &filter, &cache, store.get_ref()).await? {
        info!("Registration rejected: email taken");
        return Err(AppError::EmailTaken);
    }

    let password = hash_password(&body.password).map_err(|e| {
        error!(error = %e, "Failed to hash password");
        anyhow!("Failed to hash password")
    })?;

    // the unique key on users.email is the final word
    let user = store
        .create_user(NewUser {
            email: email.clone(),
            password,
            name,
        })
        .await
        .map_err(|e| match e {
            StoreError::Duplicate(_) => AppError::EmailTaken,
            other => other.into(),
        })?;

    filter.insert(&email);
    cache.mark_taken(&email).await;

    info!(user_id = user.id, "User registered");
    Ok(HttpResponse::Ok().json(issue_token(&user, &config)?))
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = Object, example = json!({
            "error": "Invalid email or password"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_login", skip_all, fields(email = %body.email))]
pub async fn login(
    body: web::Json<LoginReqDto>,
    store: web::Data<dyn UserStore>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    info!("Login request received");

    let email = normalize(&body.email);
    if email.is_empty() || body.password.is_empty() {
        return Err(AppError::validation("Email and password are required"));
    }

    let user = match store.find_user_by_email(&email).await? {
        Some(user) => user,
        None => {
            info!("Invalid credentials: user not found");
            return Err(AppError::InvalidCredentials);
        }
    };

    if let Err(e) = verify_password(&body.password, &user.password) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return Err(AppError::InvalidCredentials);
    }

    debug!(user_id = user.id, "Password verified");

    if let Err(e) = store.touch_last_login(user.id).await {
        // intentionally not failing login
        error!(error = %e, "Failed to update last_login_at");
    }

    info!(user_id = user.id, "Login successful");
    Ok(HttpResponse::Ok().json(issue_token(&user, &config)?))
}
