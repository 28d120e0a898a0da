//! Servicio de exportación
//!
//! Genera un fichero JSON o CSV con usuarios, vehículos o asignaciones.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::models::assignment::{Assignment, AssignmentFilter};
use crate::models::auth::Principal;
use crate::models::permission::Permission;
use crate::models::user::{User, UserFilter};
use crate::models::vehicle::{Vehicle, VehicleFilter};
use crate::repositories::{AssignmentRepository, Repositories, UserRepository, VehicleRepository};
use crate::utils::errors::{invalid_status_error, AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportType {
    Users,
    Vehicles,
    Assignments,
}

impl ExportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportType::Users => "users",
            ExportType::Vehicles => "vehicles",
            ExportType::Assignments => "assignments",
        }
    }
}

impl FromStr for ExportType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "users" => Ok(ExportType::Users),
            "vehicles" => Ok(ExportType::Vehicles),
            "assignments" => Ok(ExportType::Assignments),
            other => Err(invalid_status_error(
                "type",
                other,
                &["users", "vehicles", "assignments"],
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    pub fn parse(raw: Option<&str>) -> AppResult<Self> {
        match raw.map(str::trim) {
            None | Some("") | Some("json") => Ok(ExportFormat::Json),
            Some("csv") => Ok(ExportFormat::Csv),
            Some(other) => Err(invalid_status_error("format", other, &["json", "csv"])),
        }
    }

    fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }

    fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Fichero listo para descargar
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub filename: String,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

#[derive(Serialize)]
struct UserRow<'a> {
    id: String,
    email: &'a str,
    full_name: &'a str,
    phone: &'a str,
    role: &'a str,
    is_active: bool,
    created_at: String,
}

impl<'a> From<&'a User> for UserRow<'a> {
    fn from(u: &'a User) -> Self {
        Self {
            id: u.id.to_string(),
            email: &u.email,
            full_name: &u.full_name,
            phone: u.phone.as_deref().unwrap_or_default(),
            role: u.role.as_str(),
            is_active: u.is_active,
            created_at: u.created_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
struct VehicleRow<'a> {
    id: String,
    registration_number: &'a str,
    make: &'a str,
    model: &'a str,
    year: Option<i32>,
    vehicle_type: &'a str,
    capacity: String,
    fuel_type: &'a str,
    status: &'a str,
    created_at: String,
}

impl<'a> From<&'a Vehicle> for VehicleRow<'a> {
    fn from(v: &'a Vehicle) -> Self {
        Self {
            id: v.id.to_string(),
            registration_number: &v.registration_number,
            make: v.make.as_deref().unwrap_or_default(),
            model: v.model.as_deref().unwrap_or_default(),
            year: v.year,
            vehicle_type: &v.vehicle_type,
            capacity: v.capacity.map(|c| c.to_string()).unwrap_or_default(),
            fuel_type: v.fuel_type.as_deref().unwrap_or_default(),
            status: v.status.as_str(),
            created_at: v.created_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
struct AssignmentRow<'a> {
    id: String,
    kind: &'a str,
    resource_id: String,
    assignment_type: &'a str,
    assigned_to: String,
    assigned_by: String,
    status: &'a str,
    assigned_at: String,
    completed_at: String,
    cancelled_at: String,
    notes: &'a str,
}

fn rfc3339(at: Option<DateTime<Utc>>) -> String {
    at.map(|t| t.to_rfc3339()).unwrap_or_default()
}

impl<'a> From<&'a Assignment> for AssignmentRow<'a> {
    fn from(a: &'a Assignment) -> Self {
        Self {
            id: a.id.to_string(),
            kind: a.kind().as_str(),
            resource_id: a.target.resource_id().to_string(),
            assignment_type: a.target.assignment_type().unwrap_or_default(),
            assigned_to: a.assigned_to.to_string(),
            assigned_by: a.assigned_by.to_string(),
            status: a.status.as_str(),
            assigned_at: a.assigned_at.to_rfc3339(),
            completed_at: rfc3339(a.completed_at),
            cancelled_at: rfc3339(a.cancelled_at),
            notes: &a.notes,
        }
    }
}

/// Escribe las filas como CSV con cabecera
pub fn write_csv<R, I>(rows: I) -> AppResult<Vec<u8>>
where
    R: Serialize,
    I: IntoIterator<Item = R>,
{
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| AppError::Internal(format!("CSV export failed: {}", e)))?;
    }
    writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("CSV export failed: {}", e)))
}

fn write_json<T: Serialize>(items: &[T]) -> AppResult<Vec<u8>> {
    serde_json::to_vec_pretty(items)
        .map_err(|e| AppError::Internal(format!("JSON export failed: {}", e)))
}

pub struct ExportService {
    users: Arc<dyn UserRepository>,
    vehicles: Arc<dyn VehicleRepository>,
    assignments: Arc<dyn AssignmentRepository>,
}

impl ExportService {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            users: repos.users.clone(),
            vehicles: repos.vehicles.clone(),
            assignments: repos.assignments.clone(),
        }
    }

    pub async fn export(
        &self,
        principal: &Principal,
        export_type: ExportType,
        format: ExportFormat,
    ) -> AppResult<ExportFile> {
        principal.require(Permission::GenerateReports)?;

        let body = match export_type {
            ExportType::Users => {
                let users = self.users.list(&UserFilter::default()).await?;
                match format {
                    ExportFormat::Json => write_json(&users)?,
                    ExportFormat::Csv => write_csv(users.iter().map(UserRow::from))?,
                }
            }
            ExportType::Vehicles => {
                let vehicles = self.vehicles.list(&VehicleFilter::default()).await?;
                match format {
                    ExportFormat::Json => write_json(&vehicles)?,
                    ExportFormat::Csv => write_csv(vehicles.iter().map(VehicleRow::from))?,
                }
            }
            ExportType::Assignments => {
                let assignments = self.assignments.list(&AssignmentFilter::default()).await?;
                match format {
                    ExportFormat::Json => write_json(&assignments)?,
                    ExportFormat::Csv => write_csv(assignments.iter().map(AssignmentRow::from))?,
                }
            }
        };

        let filename = format!(
            "{}_report_{}.{}",
            export_type.as_str(),
            Utc::now().format("%Y-%m-%d"),
            format.extension()
        );
        info!("📤 Exportación generada: {} ({} bytes)", filename, body.len());

        Ok(ExportFile {
            filename,
            content_type: format.content_type(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::UserRole;
    use uuid::Uuid;

    #[test]
    fn csv_has_header_and_quotes_commas() {
        let mut user = User::new(
            Uuid::new_v4(),
            "ravi@example.com".into(),
            "Kumar, Ravi".into(),
            None,
            UserRole::SwachhHr,
            None,
        );
        user.is_active = false;

        let body = write_csv(std::iter::once(UserRow::from(&user))).unwrap();
        let text = String::from_utf8(body).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("id,email,full_name,phone,role,is_active,created_at")
        );
        let row = lines.next().unwrap();
        assert!(row.contains("\"Kumar, Ravi\""));
        assert!(row.contains(",swachh_hr,false,"));
    }

    #[test]
    fn parses_export_options() {
        assert_eq!("vehicles".parse::<ExportType>().unwrap(), ExportType::Vehicles);
        assert!(matches!("drivers".parse::<ExportType>(), Err(AppError::InvalidStatus(_))));
        assert_eq!(ExportFormat::parse(None).unwrap(), ExportFormat::Json);
        assert_eq!(ExportFormat::parse(Some("csv")).unwrap(), ExportFormat::Csv);
        assert!(ExportFormat::parse(Some("xlsx")).is_err());
    }
}
