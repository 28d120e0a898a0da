use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::assignment::Assignment;
use crate::models::feeder_point::FeederPoint;
use crate::models::user::UserSummary;
use crate::models::vehicle::Vehicle;

#[derive(Debug, Default, Deserialize)]
pub struct AssignmentListQuery {
    pub status: Option<String>,
    pub assignment_type: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateVehicleAssignmentRequest {
    #[validate(required(message = "Vehicle ID is required"))]
    pub vehicle_id: Option<Uuid>,

    #[validate(required(message = "Assignee is required"))]
    pub assigned_to: Option<Uuid>,

    #[serde(default)]
    #[validate(length(min = 1, max = 50, message = "Assignment type is required"))]
    pub assignment_type: String,

    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,

    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateFeederPointAssignmentRequest {
    #[validate(required(message = "Feeder point ID is required"))]
    pub feeder_point_id: Option<Uuid>,

    #[validate(required(message = "Assignee is required"))]
    pub assigned_to: Option<Uuid>,

    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,

    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangeAssignmentStatusRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Status is required"))]
    pub status: String,
}

/// Asignación de vehículo unida a su vehículo y asignado
#[derive(Debug, Clone, Serialize)]
pub struct VehicleAssignmentView {
    #[serde(flatten)]
    pub assignment: Assignment,
    pub vehicle: Option<Vehicle>,
    pub assignee: Option<UserSummary>,
}

/// Asignación de punto de recogida unida a su punto y asignado
#[derive(Debug, Clone, Serialize)]
pub struct FeederPointAssignmentView {
    #[serde(flatten)]
    pub assignment: Assignment,
    pub feeder_point: Option<FeederPoint>,
    pub assignee: Option<UserSummary>,
}
