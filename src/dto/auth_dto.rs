use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::auth::IssuedToken;
use crate::models::user::User;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(email(message = "A valid email is required"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: IssuedToken,
    pub user: User,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyTokenRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,
}
