use chrono::NaiveDate;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// day | week | month
    pub group_by: Option<String>,
    /// all | vehicle | feeder_point (sólo reporte de asignaciones)
    #[serde(rename = "type")]
    pub assignment_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    /// users | vehicles | assignments
    #[serde(rename = "type", default)]
    pub export_type: String,
    /// json | csv
    pub format: Option<String>,
}
