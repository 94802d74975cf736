use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::{role::Role, user::UserProfile};

#[derive(Deserialize, ToSchema)]
pub struct RegisterReqDto {
    #[schema(example = "employee@example.com", format = "email")]
    pub email: String,
    #[schema(example = "password123")]
    pub password: String,
    #[schema(example = "Jane Doe")]
    pub name: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginReqDto {
    #[schema(example = "employee@example.com", format = "email")]
    pub email: String,
    #[schema(example = "password123")]
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    pub user: UserProfile,
    pub token: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileDto {
    pub name: Option<String>,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckInReqDto {
    #[schema(example = "37.7,-122.4")]
    pub location: String,
    #[schema(example = "1.2.3.4")]
    pub ip_address: String,
    #[schema(example = "photo://a")]
    pub photo_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: u64,
    /// email
    pub sub: String,
    pub role: Role,
    pub exp: usize,
    pub jti: String,
}
