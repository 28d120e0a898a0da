//! Modelo de FeederPoint
//!
//! Punto de recogida. No tiene estado propio: su ocupación se deduce de
//! las asignaciones activas que lo referencian.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct FeederPoint {
    pub id: Uuid,
    pub name: String,
    pub location: String,
    pub area: Option<String>,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct FeederPointChanges {
    pub name: Option<String>,
    pub location: Option<String>,
    pub area: Option<String>,
}

impl FeederPointChanges {
    pub fn apply(&self, point: &mut FeederPoint) {
        if let Some(v) = &self.name {
            point.name = v.clone();
        }
        if let Some(v) = &self.location {
            point.location = v.clone();
        }
        if let Some(v) = &self.area {
            point.area = Some(v.clone());
        }
    }
}
