use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Default, Deserialize)]
pub struct VehicleListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub vehicle_type: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateVehicleRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 20, message = "Registration number is required"))]
    pub registration_number: String,

    #[validate(length(max = 100))]
    pub make: Option<String>,

    #[validate(length(max = 100))]
    pub model: Option<String>,

    #[validate(range(min = 1950, max = 2100))]
    pub year: Option<i32>,

    #[serde(default, alias = "type")]
    #[validate(length(min = 1, max = 50, message = "Vehicle type is required"))]
    pub vehicle_type: String,

    pub capacity: Option<Decimal>,

    #[validate(length(max = 30))]
    pub fuel_type: Option<String>,

    /// Estado inicial; por defecto `available`
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateVehicleRequest {
    #[validate(length(min = 1, max = 20))]
    pub registration_number: Option<String>,

    #[validate(length(max = 100))]
    pub make: Option<String>,

    #[validate(length(max = 100))]
    pub model: Option<String>,

    #[validate(range(min = 1950, max = 2100))]
    pub year: Option<i32>,

    #[serde(alias = "type")]
    #[validate(length(min = 1, max = 50))]
    pub vehicle_type: Option<String>,

    pub capacity: Option<Decimal>,

    #[validate(length(max = 30))]
    pub fuel_type: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateVehicleStatusRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Status is required"))]
    pub status: String,
}
