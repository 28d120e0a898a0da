use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Default, Deserialize)]
pub struct UserListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub role: Option<String>,
    /// active | inactive | all
    pub status: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[serde(default)]
    #[validate(email(message = "A valid email is required"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 8, max = 128, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[serde(default)]
    #[validate(length(min = 2, max = 100, message = "Full name is required"))]
    pub full_name: String,

    #[validate(length(max = 20))]
    pub phone: Option<String>,

    #[serde(default)]
    #[validate(length(min = 1, message = "Role is required"))]
    pub role: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRoleRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Role is required"))]
    pub role: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateStatusRequest {
    #[validate(required(message = "is_active is required"))]
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 2, max = 100))]
    pub full_name: Option<String>,

    #[validate(length(max = 20))]
    pub phone: Option<String>,
}
