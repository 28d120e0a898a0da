use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::approval::ApprovalRequest;
use crate::models::user::User;

#[derive(Debug, Deserialize, Validate)]
pub struct ApprovalDecisionRequest {
    #[validate(required(message = "approved is required"))]
    pub approved: Option<bool>,
}

/// Alta solicitada por el cliente de registro
#[derive(Debug, Deserialize, Validate)]
pub struct RegistrationRequest {
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

    /// Por defecto `driver`
    pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApprovalResult {
    pub request: ApprovalRequest,
    pub user: Option<User>,
}
