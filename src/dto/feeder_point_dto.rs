use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Default, Deserialize)]
pub struct FeederPointListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateFeederPointRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 120, message = "Name is required"))]
    pub name: String,

    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "Location is required"))]
    pub location: String,

    #[validate(length(max = 120))]
    pub area: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateFeederPointRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 255))]
    pub location: Option<String>,

    #[validate(length(max = 120))]
    pub area: Option<String>,
}
