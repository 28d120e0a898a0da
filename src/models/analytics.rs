//! Modelos de Analytics
//!
//! Vistas de sólo lectura calculadas recorriendo usuarios, vehículos,
//! asignaciones y auditoría: dashboard, reportes y estadísticas.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::assignment::{Assignment, AssignmentStatus};
use crate::models::audit::AuditLogEntry;
use crate::models::user::User;
use crate::models::vehicle::Vehicle;
use crate::utils::errors::{invalid_status_error, AppError};

/// Agrupación temporal de tendencias
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBucket {
    Day,
    Week,
    #[default]
    Month,
}

impl TimeBucket {
    /// Clave del periodo por truncado: fecha, domingo de inicio de semana o año-mes
    pub fn key(&self, at: DateTime<Utc>) -> String {
        let date = at.date_naive();
        match self {
            TimeBucket::Day => date.format("%Y-%m-%d").to_string(),
            TimeBucket::Week => {
                let offset = date.weekday().num_days_from_sunday() as i64;
                (date - Duration::days(offset)).format("%Y-%m-%d").to_string()
            }
            TimeBucket::Month => date.format("%Y-%m").to_string(),
        }
    }
}

impl FromStr for TimeBucket {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "day" => Ok(TimeBucket::Day),
            "week" => Ok(TimeBucket::Week),
            "month" => Ok(TimeBucket::Month),
            other => Err(invalid_status_error("group_by", other, &["day", "week", "month"])),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrendPoint {
    pub period: String,
    pub count: u64,
}

/// Cuenta elementos por periodo, ordenado por periodo
pub fn trend<I>(timestamps: I, bucket: TimeBucket) -> Vec<TrendPoint>
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for at in timestamps {
        *counts.entry(bucket.key(at)).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(period, count)| TrendPoint { period, count })
        .collect()
}

/// Conteo por estado de un conjunto de asignaciones
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusCounts {
    pub total: u64,
    pub active: u64,
    pub completed: u64,
    pub cancelled: u64,
}

impl StatusCounts {
    pub fn from_assignments<'a, I>(assignments: I) -> Self
    where
        I: IntoIterator<Item = &'a Assignment>,
    {
        let mut counts = Self::default();
        for a in assignments {
            counts.total += 1;
            match a.status {
                AssignmentStatus::Active => counts.active += 1,
                AssignmentStatus::Completed => counts.completed += 1,
                AssignmentStatus::Cancelled => counts.cancelled += 1,
            }
        }
        counts
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssignmentStatistics {
    pub vehicle_assignments: StatusCounts,
    pub feeder_point_assignments: StatusCounts,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserCounts {
    pub total: u64,
    pub active: u64,
    pub pending: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VehicleCounts {
    pub total: u64,
    pub available: u64,
    pub assigned: u64,
    pub maintenance: u64,
    pub out_of_service: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub users: UserCounts,
    pub vehicles: VehicleCounts,
    pub assignments: StatusCounts,
    pub recent_activities: Vec<AuditLogEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleStats {
    pub total: u64,
    pub by_status: VehicleCounts,
    pub by_type: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserReport {
    pub total: u64,
    pub users: Vec<User>,
    pub role_stats: BTreeMap<String, u64>,
    pub registration_trend: Vec<TrendPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VehicleUtilization {
    pub vehicle_id: Uuid,
    pub registration_number: String,
    pub active_assignments: u64,
    pub total_assignments: u64,
    /// Fracción en [0, 1]
    pub utilization_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleReport {
    pub total: u64,
    pub vehicles: Vec<Vehicle>,
    pub status_stats: BTreeMap<String, u64>,
    pub type_stats: BTreeMap<String, u64>,
    pub utilization: Vec<VehicleUtilization>,
    pub creation_trend: Vec<TrendPoint>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PerformanceMetrics {
    pub total: u64,
    pub completed: u64,
    pub active: u64,
    /// Fracción en [0, 1]
    pub completion_rate: f64,
    pub average_duration_days: f64,
}

impl PerformanceMetrics {
    pub fn from_assignments<'a, I>(assignments: I) -> Self
    where
        I: IntoIterator<Item = &'a Assignment>,
    {
        let mut metrics = Self::default();
        let mut durations = Vec::new();

        for a in assignments {
            metrics.total += 1;
            match a.status {
                AssignmentStatus::Active => metrics.active += 1,
                AssignmentStatus::Completed => metrics.completed += 1,
                AssignmentStatus::Cancelled => {}
            }
            if let Some(days) = a.duration_days() {
                durations.push(days);
            }
        }

        if metrics.total > 0 {
            metrics.completion_rate = metrics.completed as f64 / metrics.total as f64;
        }
        if !durations.is_empty() {
            metrics.average_duration_days = durations.iter().sum::<f64>() / durations.len() as f64;
        }
        metrics
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentReport {
    pub vehicle_assignments: Vec<Assignment>,
    pub feeder_point_assignments: Vec<Assignment>,
    pub status_stats: BTreeMap<String, u64>,
    pub performance: PerformanceMetrics,
    pub assignment_trend: Vec<TrendPoint>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn week_bucket_starts_on_sunday() {
        // 2024-03-13 es miércoles
        let wed = Utc.with_ymd_and_hms(2024, 3, 13, 15, 0, 0).unwrap();
        assert_eq!(TimeBucket::Week.key(wed), "2024-03-10");
        let sun = Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap();
        assert_eq!(TimeBucket::Week.key(sun), "2024-03-10");
        let sat = Utc.with_ymd_and_hms(2024, 3, 16, 23, 59, 0).unwrap();
        assert_eq!(TimeBucket::Week.key(sat), "2024-03-10");
    }

    #[test]
    fn day_and_month_keys_truncate() {
        let at = Utc.with_ymd_and_hms(2024, 1, 5, 8, 30, 0).unwrap();
        assert_eq!(TimeBucket::Day.key(at), "2024-01-05");
        assert_eq!(TimeBucket::Month.key(at), "2024-01");
    }

    #[test]
    fn trend_is_sorted_by_period() {
        let points = trend(
            [
                Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, 1, 9, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, 3, 20, 0, 0, 0).unwrap(),
            ],
            TimeBucket::Month,
        );
        assert_eq!(
            points,
            vec![
                TrendPoint { period: "2024-01".into(), count: 1 },
                TrendPoint { period: "2024-03".into(), count: 2 },
            ]
        );
    }

    #[test]
    fn unknown_bucket_is_invalid_status() {
        assert!(matches!("year".parse::<TimeBucket>(), Err(AppError::InvalidStatus(_))));
    }
}
