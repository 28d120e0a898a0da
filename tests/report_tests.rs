mod common;

use chrono::{NaiveDate, Utc};
use common::TestApp;
use fleet_portal::dto::assignment_dto::{
    CreateFeederPointAssignmentRequest, CreateVehicleAssignmentRequest,
};
use fleet_portal::dto::settings_dto::{AuditLogQuery, ComponentStatus, CreateBackupRequest};
use fleet_portal::models::analytics::TimeBucket;
use fleet_portal::models::assignment::Assignment;
use fleet_portal::models::user::UserRole;
use fleet_portal::services::export_service::{ExportFormat, ExportType};
use fleet_portal::services::report_service::AssignmentScope;
use fleet_portal::services::settings_service::audit_entry;
use fleet_portal::utils::errors::AppError;
use fleet_portal::utils::validation::DateRange;
use serde_json::json;
use uuid::Uuid;

async fn assign_vehicle(app: &TestApp, vehicle_id: Uuid, assignee: Uuid) -> Assignment {
    app.services()
        .assignments
        .create_vehicle_assignment(
            &app.admin,
            CreateVehicleAssignmentRequest {
                vehicle_id: Some(vehicle_id),
                assigned_to: Some(assignee),
                assignment_type: "primary".to_string(),
                start_date: None,
                end_date: None,
                notes: None,
            },
        )
        .await
        .unwrap()
}

/// V1 asignado, V2 asignado y completado, V3 libre
async fn fleet_fixture(app: &TestApp) -> [Uuid; 3] {
    let driver = app.create_user("driver@example.com", UserRole::Driver).await;
    let v1 = app.create_vehicle("OD02AA0001", None).await;
    let v2 = app.create_vehicle("OD02AA0002", None).await;
    let v3 = app.create_vehicle("OD02AA0003", None).await;

    assign_vehicle(app, v1.id, driver.id).await;
    let a2 = assign_vehicle(app, v2.id, driver.id).await;
    app.services()
        .assignments
        .change_status(&app.admin, a2.id, "completed")
        .await
        .unwrap();
    [v1.id, v2.id, v3.id]
}

#[tokio::test]
async fn dashboard_counts_vehicles_and_vehicle_assignments() {
    let app = TestApp::new().await;
    fleet_fixture(&app).await;
    let point = app.create_feeder_point("Ward Office").await;
    app.services()
        .assignments
        .create_feeder_point_assignment(
            &app.admin,
            CreateFeederPointAssignmentRequest {
                feeder_point_id: Some(point.id),
                assigned_to: Some(app.admin.user_id),
                start_date: None,
                end_date: None,
                notes: None,
            },
        )
        .await
        .unwrap();

    let summary = app.services().reports.dashboard(&app.admin).await.unwrap();
    assert_eq!(summary.vehicles.total, 3);
    assert_eq!(summary.vehicles.available, 2);
    assert_eq!(summary.vehicles.assigned, 1);
    assert_eq!(summary.assignments.total, 2);
    assert_eq!(summary.assignments.active, 1);
    assert_eq!(summary.assignments.completed, 1);
    assert_eq!(summary.users.total, 2);
    assert_eq!(summary.users.active, 2);
    assert_eq!(summary.users.pending, 0);
}

#[tokio::test]
async fn dashboard_lists_recent_activity_newest_first() {
    let app = TestApp::new().await;
    for action in ["POST /api/vehicles", "PUT /api/vehicles/1", "DELETE /api/vehicles/1"] {
        app.services()
            .settings
            .record_audit(audit_entry(
                Some(&app.admin),
                action.to_string(),
                200,
                Some("10.0.0.1".to_string()),
                None,
                None,
            ))
            .await;
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }

    let summary = app.services().reports.dashboard(&app.admin).await.unwrap();
    assert_eq!(summary.recent_activities.len(), 3);
    assert_eq!(summary.recent_activities[0].action, "DELETE /api/vehicles/1");

    let logs = app
        .services()
        .settings
        .audit_logs(
            &app.admin,
            &AuditLogQuery {
                action: Some("PUT".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(logs.pagination.total, 1);
    assert_eq!(logs.items[0].actor_id, Some(app.admin.user_id));
}

#[tokio::test]
async fn vehicle_report_computes_utilization_fractions() {
    let app = TestApp::new().await;
    let [v1, v2, v3] = fleet_fixture(&app).await;

    let report = app
        .services()
        .reports
        .vehicle_report(&app.admin, DateRange::default(), TimeBucket::Day)
        .await
        .unwrap();
    assert_eq!(report.total, 3);
    assert_eq!(report.status_stats.get("available"), Some(&2));
    assert_eq!(report.status_stats.get("assigned"), Some(&1));

    let rate = |id: Uuid| {
        report
            .utilization
            .iter()
            .find(|u| u.vehicle_id == id)
            .map(|u| u.utilization_rate)
            .unwrap()
    };
    assert_eq!(rate(v1), 1.0);
    assert_eq!(rate(v2), 0.0);
    assert_eq!(rate(v3), 0.0);
    assert!(report
        .utilization
        .iter()
        .all(|u| (0.0..=1.0).contains(&u.utilization_rate)));

    let today = Utc::now().format("%Y-%m-%d").to_string();
    assert_eq!(report.creation_trend.len(), 1);
    assert_eq!(report.creation_trend[0].period, today);
    assert_eq!(report.creation_trend[0].count, 3);
}

#[tokio::test]
async fn assignment_report_scopes_and_rates() {
    let app = TestApp::new().await;
    fleet_fixture(&app).await;
    let point = app.create_feeder_point("Temple Road").await;
    app.services()
        .assignments
        .create_feeder_point_assignment(
            &app.admin,
            CreateFeederPointAssignmentRequest {
                feeder_point_id: Some(point.id),
                assigned_to: Some(app.admin.user_id),
                start_date: None,
                end_date: None,
                notes: None,
            },
        )
        .await
        .unwrap();

    let all = app
        .services()
        .reports
        .assignment_report(
            &app.admin,
            DateRange::default(),
            AssignmentScope::All,
            TimeBucket::Month,
        )
        .await
        .unwrap();
    assert_eq!(all.vehicle_assignments.len(), 2);
    assert_eq!(all.feeder_point_assignments.len(), 1);
    assert_eq!(all.status_stats.get("vehicle_active"), Some(&1));
    assert_eq!(all.status_stats.get("vehicle_completed"), Some(&1));
    assert_eq!(all.status_stats.get("feeder_point_active"), Some(&1));
    assert_eq!(all.performance.total, 3);
    assert!((all.performance.completion_rate - 1.0 / 3.0).abs() < 1e-9);

    let vehicles_only = app
        .services()
        .reports
        .assignment_report(
            &app.admin,
            DateRange::default(),
            AssignmentScope::parse(Some("vehicle")).unwrap(),
            TimeBucket::Month,
        )
        .await
        .unwrap();
    assert!(vehicles_only.feeder_point_assignments.is_empty());
    assert_eq!(vehicles_only.performance.completion_rate, 0.5);

    assert!(AssignmentScope::parse(Some("drones")).is_err());
}

#[tokio::test]
async fn date_ranges_are_inclusive_by_day() {
    let app = TestApp::new().await;
    fleet_fixture(&app).await;
    let today = Utc::now().date_naive();

    let only_today = DateRange::from_dates(Some(today), Some(today)).unwrap();
    let report = app
        .services()
        .reports
        .user_report(&app.admin, only_today, TimeBucket::Week)
        .await
        .unwrap();
    assert_eq!(report.total, 2);
    assert_eq!(report.role_stats.get("driver"), Some(&1));
    assert_eq!(report.role_stats.get("admin"), Some(&1));

    let long_ago = DateRange::from_dates(
        NaiveDate::from_ymd_opt(2001, 1, 1),
        NaiveDate::from_ymd_opt(2001, 12, 31),
    )
    .unwrap();
    let empty = app
        .services()
        .reports
        .user_report(&app.admin, long_ago, TimeBucket::Week)
        .await
        .unwrap();
    assert_eq!(empty.total, 0);
    assert!(empty.registration_trend.is_empty());

    let inverted = DateRange::from_dates(
        NaiveDate::from_ymd_opt(2024, 2, 1),
        NaiveDate::from_ymd_opt(2024, 1, 1),
    );
    assert!(matches!(inverted, Err(AppError::BadRequest(_))));
}

#[tokio::test]
async fn reports_require_view_all_reports() {
    let app = TestApp::new().await;
    let hr = app.principal("hr@example.com", UserRole::SwachhHr).await;

    let report = app
        .services()
        .reports
        .vehicle_report(&hr, DateRange::default(), TimeBucket::Month)
        .await;
    assert!(matches!(report, Err(AppError::Forbidden(_))));
    // El dashboard está abierto a cualquier usuario autenticado
    assert!(app.services().reports.dashboard(&hr).await.is_ok());
}

#[tokio::test]
async fn csv_export_carries_dated_filename() {
    let app = TestApp::new().await;
    fleet_fixture(&app).await;

    let file = app
        .services()
        .exports
        .export(&app.admin, ExportType::Vehicles, ExportFormat::Csv)
        .await
        .unwrap();
    let expected = format!("vehicles_report_{}.csv", Utc::now().format("%Y-%m-%d"));
    assert_eq!(file.filename, expected);
    assert!(file.content_type.starts_with("text/csv"));

    let text = String::from_utf8(file.body).unwrap();
    let mut lines = text.lines();
    assert!(lines.next().unwrap().starts_with("id,registration_number"));
    assert_eq!(lines.count(), 3);

    let json = app
        .services()
        .exports
        .export(&app.admin, "users".parse().unwrap(), ExportFormat::Json)
        .await
        .unwrap();
    let users: serde_json::Value = serde_json::from_slice(&json.body).unwrap();
    assert_eq!(users.as_array().map(Vec::len), Some(2));

    let driver = app.principal("nobody@example.com", UserRole::Driver).await;
    let denied = app
        .services()
        .exports
        .export(&driver, ExportType::Users, ExportFormat::Csv)
        .await;
    assert!(matches!(denied, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn system_settings_merge_shallowly() {
    let app = TestApp::new().await;
    let defaults = app.services().settings.system_settings(&app.admin).await.unwrap();
    assert!(!defaults.maintenance_mode);

    let updated = app
        .services()
        .settings
        .update_system_settings(&app.admin, json!({ "maintenance_mode": true, "session_timeout": 8 }))
        .await
        .unwrap();
    assert!(updated.maintenance_mode);
    assert_eq!(updated.session_timeout, 8);
    assert_eq!(updated.app_name, defaults.app_name);
    assert_eq!(updated.updated_by, Some(app.admin.user_id));

    let reloaded = app.services().settings.system_settings(&app.admin).await.unwrap();
    assert_eq!(reloaded, updated);

    let not_object = app
        .services()
        .settings
        .update_system_settings(&app.admin, json!(["maintenance_mode"]))
        .await;
    assert!(matches!(not_object, Err(AppError::BadRequest(_))));

    let driver = app.principal("driver@example.com", UserRole::Driver).await;
    let forbidden = app.services().settings.system_settings(&driver).await;
    assert!(matches!(forbidden, Err(AppError::Forbidden(_))));

    let status = app.services().settings.system_status(&driver).await.unwrap();
    assert_eq!(status.services.database, ComponentStatus::Online);
    assert_eq!(status.services.api, ComponentStatus::Online);
}

#[tokio::test]
async fn backups_default_to_core_collections() {
    let app = TestApp::new().await;
    app.create_vehicle("GJ05JK2211", None).await;

    let backup = app
        .services()
        .settings
        .create_backup(&app.admin, CreateBackupRequest::default())
        .await
        .unwrap();
    assert_eq!(backup.collections, vec!["users", "vehicles", "assignments"]);
    assert_eq!(backup.created_by, app.admin.user_id);
    assert!(backup.size > 0);

    let points = app
        .services()
        .settings
        .create_backup(
            &app.admin,
            CreateBackupRequest {
                collections: Some(vec!["feeder_points".to_string()]),
            },
        )
        .await
        .unwrap();
    assert_eq!(points.collections, vec!["feeder_points"]);

    let unknown = app
        .services()
        .settings
        .create_backup(
            &app.admin,
            CreateBackupRequest {
                collections: Some(vec!["passwords".to_string()]),
            },
        )
        .await;
    assert!(matches!(unknown, Err(AppError::BadRequest(_))));

    let listed = app.services().settings.list_backups(&app.admin).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, points.id);
    assert_eq!(listed[1], backup);
}

#[tokio::test]
async fn backup_listing_keeps_twenty_newest() {
    let app = TestApp::new().await;
    let mut last = None;
    for _ in 0..21 {
        let backup = app
            .services()
            .settings
            .create_backup(&app.admin, CreateBackupRequest::default())
            .await
            .unwrap();
        last = Some(backup.id);
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }

    let listed = app.services().settings.list_backups(&app.admin).await.unwrap();
    assert_eq!(listed.len(), 20);
    assert_eq!(Some(listed[0].id), last);
    assert!(listed.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
}

#[tokio::test]
async fn backups_require_manage_system() {
    let app = TestApp::new().await;
    let hr = app.principal("hr@example.com", UserRole::SwachhHr).await;

    let create = app
        .services()
        .settings
        .create_backup(&hr, CreateBackupRequest::default())
        .await;
    assert!(matches!(create, Err(AppError::Forbidden(_))));

    let list = app.services().settings.list_backups(&hr).await;
    assert!(matches!(list, Err(AppError::Forbidden(_))));
    assert!(app.repos().backups.recent(10).await.unwrap().is_empty());
}
