mod common;

use common::TestApp;
use fleet_portal::dto::assignment_dto::{
    AssignmentListQuery, CreateFeederPointAssignmentRequest, CreateVehicleAssignmentRequest,
};
use chrono::{Duration, Utc};
use fleet_portal::models::assignment::{
    Assignment, AssignmentFilter, AssignmentKind, AssignmentStatus, AssignmentTarget,
    NewAssignment, PointClaimOutcome,
};
use fleet_portal::models::user::UserRole;
use fleet_portal::models::vehicle::{VehicleFilter, VehicleStatus};
use fleet_portal::utils::errors::AppError;
use futures::future::join_all;
use uuid::Uuid;

fn vehicle_assignment(vehicle_id: Uuid, assignee: Uuid) -> CreateVehicleAssignmentRequest {
    CreateVehicleAssignmentRequest {
        vehicle_id: Some(vehicle_id),
        assigned_to: Some(assignee),
        assignment_type: "primary".to_string(),
        start_date: None,
        end_date: None,
        notes: Some("morning shift".to_string()),
    }
}

/// vehículo asignado ⇔ existe una asignación activa que lo referencia
async fn assert_vehicle_invariant(app: &TestApp) {
    let vehicles = app.repos().vehicles.list(&VehicleFilter::default()).await.unwrap();
    let active = app
        .repos()
        .assignments
        .list(&AssignmentFilter {
            kind: Some(AssignmentKind::Vehicle),
            status: Some(AssignmentStatus::Active),
            ..Default::default()
        })
        .await
        .unwrap();

    for v in vehicles {
        let holders = active
            .iter()
            .filter(|a| a.target.vehicle_id() == Some(v.id))
            .count();
        assert!(holders <= 1, "vehicle {} has {} active assignments", v.id, holders);
        assert_eq!(
            v.status == VehicleStatus::Assigned,
            holders == 1,
            "vehicle {} status {} with {} active assignments",
            v.registration_number,
            v.status,
            holders
        );
    }
}

#[tokio::test]
async fn assign_then_complete_releases_vehicle() {
    let app = TestApp::new().await;
    let driver = app.create_user("driver@example.com", UserRole::Driver).await;
    let v1 = app.create_vehicle("mh12ab1234", None).await;
    assert_eq!(v1.registration_number, "MH12AB1234");
    assert_eq!(v1.status, VehicleStatus::Available);

    let a1 = app
        .services()
        .assignments
        .create_vehicle_assignment(&app.admin, vehicle_assignment(v1.id, driver.id))
        .await
        .unwrap();
    assert_eq!(a1.status, AssignmentStatus::Active);
    assert_eq!(a1.start_date, a1.assigned_at);
    assert_eq!(a1.assigned_by, app.admin.user_id);

    let v1_now = app.repos().vehicles.find_by_id(v1.id).await.unwrap().unwrap();
    assert_eq!(v1_now.status, VehicleStatus::Assigned);
    assert_vehicle_invariant(&app).await;

    let done = app
        .services()
        .assignments
        .change_status(&app.admin, a1.id, "completed")
        .await
        .unwrap();
    assert_eq!(done.status, AssignmentStatus::Completed);
    assert!(done.completed_at.is_some());
    assert!(done.cancelled_at.is_none());

    let v1_now = app.repos().vehicles.find_by_id(v1.id).await.unwrap().unwrap();
    assert_eq!(v1_now.status, VehicleStatus::Available);
    assert_vehicle_invariant(&app).await;
}

#[tokio::test]
async fn vehicle_in_maintenance_cannot_be_assigned() {
    let app = TestApp::new().await;
    let driver = app.create_user("driver@example.com", UserRole::Driver).await;
    let v1 = app.create_vehicle("KA01XY0001", Some("maintenance")).await;

    let result = app
        .services()
        .assignments
        .create_vehicle_assignment(&app.admin, vehicle_assignment(v1.id, driver.id))
        .await;
    assert!(matches!(result, Err(AppError::Conflict(_))));

    let all = app
        .repos()
        .assignments
        .list(&AssignmentFilter::default())
        .await
        .unwrap();
    assert!(all.is_empty());
    let v1_now = app.repos().vehicles.find_by_id(v1.id).await.unwrap().unwrap();
    assert_eq!(v1_now.status, VehicleStatus::Maintenance);
}

#[tokio::test]
async fn missing_vehicle_or_assignee_is_not_found() {
    let app = TestApp::new().await;
    let driver = app.create_user("driver@example.com", UserRole::Driver).await;
    let v1 = app.create_vehicle("KA01XY0002", None).await;

    let missing_vehicle = app
        .services()
        .assignments
        .create_vehicle_assignment(&app.admin, vehicle_assignment(Uuid::new_v4(), driver.id))
        .await;
    assert!(matches!(missing_vehicle, Err(AppError::NotFound(_))));

    let missing_user = app
        .services()
        .assignments
        .create_vehicle_assignment(&app.admin, vehicle_assignment(v1.id, Uuid::new_v4()))
        .await;
    assert!(matches!(missing_user, Err(AppError::NotFound(_))));

    let v1_now = app.repos().vehicles.find_by_id(v1.id).await.unwrap().unwrap();
    assert_eq!(v1_now.status, VehicleStatus::Available);
}

#[tokio::test]
async fn non_terminal_target_status_is_rejected_without_changes() {
    let app = TestApp::new().await;
    let driver = app.create_user("driver@example.com", UserRole::Driver).await;
    let v1 = app.create_vehicle("KA01XY0003", None).await;
    let a1 = app
        .services()
        .assignments
        .create_vehicle_assignment(&app.admin, vehicle_assignment(v1.id, driver.id))
        .await
        .unwrap();

    for bad in ["active", "paused", ""] {
        let result = app
            .services()
            .assignments
            .change_status(&app.admin, a1.id, bad)
            .await;
        assert!(matches!(result, Err(AppError::InvalidStatus(_))), "status {:?}", bad);
    }

    let stored = app.repos().assignments.find_by_id(a1.id).await.unwrap().unwrap();
    assert_eq!(stored, a1);
    assert_vehicle_invariant(&app).await;
}

#[tokio::test]
async fn terminal_assignment_cannot_transition_again() {
    let app = TestApp::new().await;
    let driver = app.create_user("driver@example.com", UserRole::Driver).await;
    let v1 = app.create_vehicle("KA01XY0004", None).await;
    let a1 = app
        .services()
        .assignments
        .create_vehicle_assignment(&app.admin, vehicle_assignment(v1.id, driver.id))
        .await
        .unwrap();
    let cancelled = app
        .services()
        .assignments
        .change_status(&app.admin, a1.id, "cancelled")
        .await
        .unwrap();
    assert!(cancelled.cancelled_at.is_some());

    // El vehículo liberado vuelve a asignarse
    let a2 = app
        .services()
        .assignments
        .create_vehicle_assignment(&app.admin, vehicle_assignment(v1.id, driver.id))
        .await
        .unwrap();

    for next in ["completed", "cancelled"] {
        let result = app
            .services()
            .assignments
            .change_status(&app.admin, a1.id, next)
            .await;
        assert!(matches!(result, Err(AppError::InvalidStatus(_))));
    }

    let stored = app.repos().assignments.find_by_id(a1.id).await.unwrap().unwrap();
    assert_eq!(stored, cancelled);
    // a1 no debe liberar el vehículo que ahora tiene a2
    let v1_now = app.repos().vehicles.find_by_id(v1.id).await.unwrap().unwrap();
    assert_eq!(v1_now.status, VehicleStatus::Assigned);
    assert!(app
        .repos()
        .assignments
        .find_by_id(a2.id)
        .await
        .unwrap()
        .unwrap()
        .is_active());
    assert_vehicle_invariant(&app).await;
}

#[tokio::test]
async fn unknown_assignment_is_not_found() {
    let app = TestApp::new().await;
    let result = app
        .services()
        .assignments
        .change_status(&app.admin, Uuid::new_v4(), "completed")
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn concurrent_claims_on_one_vehicle_yield_single_assignment() {
    let app = TestApp::new().await;
    let v1 = app.create_vehicle("DL01AA0001", None).await;
    let mut drivers = Vec::new();
    for i in 0..8 {
        drivers.push(
            app.create_user(&format!("driver{}@example.com", i), UserRole::Driver)
                .await,
        );
    }

    let results = join_all(drivers.iter().map(|d| {
        app.services()
            .assignments
            .create_vehicle_assignment(&app.admin, vehicle_assignment(v1.id, d.id))
    }))
    .await;

    let created = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(AppError::Conflict(_))))
        .count();
    assert_eq!(created, 1);
    assert_eq!(conflicts, 7);
    assert_vehicle_invariant(&app).await;
}

#[tokio::test]
async fn feeder_points_allow_several_active_assignments() {
    let app = TestApp::new().await;
    let hr = app.create_user("worker1@example.com", UserRole::SwachhHr).await;
    let other = app.create_user("worker2@example.com", UserRole::Driver).await;
    let point = app.create_feeder_point("Market Square").await;

    for assignee in [hr.id, other.id] {
        app.services()
            .assignments
            .create_feeder_point_assignment(
                &app.admin,
                CreateFeederPointAssignmentRequest {
                    feeder_point_id: Some(point.id),
                    assigned_to: Some(assignee),
                    start_date: None,
                    end_date: None,
                    notes: None,
                },
            )
            .await
            .unwrap();
    }

    let views = app
        .services()
        .assignments
        .list_feeder_point_assignments(&app.admin, &AssignmentListQuery::default())
        .await
        .unwrap();
    assert_eq!(views.len(), 2);
    assert!(views
        .iter()
        .all(|v| v.feeder_point.as_ref().map(|p| p.id) == Some(point.id)));
    assert!(views.iter().all(|v| v.assignee.is_some()));

    let delete = app
        .services()
        .feeder_points
        .delete(&app.admin, point.id)
        .await;
    assert!(matches!(delete, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn end_date_before_implicit_start_is_rejected() {
    let app = TestApp::new().await;
    let driver = app.create_user("driver@example.com", UserRole::Driver).await;
    let v1 = app.create_vehicle("MH14CD5678", None).await;
    let point = app.create_feeder_point("Old Bazaar").await;
    let last_month = Utc::now() - Duration::days(30);

    let mut request = vehicle_assignment(v1.id, driver.id);
    request.end_date = Some(last_month);
    let result = app
        .services()
        .assignments
        .create_vehicle_assignment(&app.admin, request)
        .await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));

    let result = app
        .services()
        .assignments
        .create_feeder_point_assignment(
            &app.admin,
            CreateFeederPointAssignmentRequest {
                feeder_point_id: Some(point.id),
                assigned_to: Some(driver.id),
                start_date: None,
                end_date: Some(last_month),
                notes: None,
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));

    let all = app
        .repos()
        .assignments
        .list(&AssignmentFilter::default())
        .await
        .unwrap();
    assert!(all.is_empty());
    let v1_now = app.repos().vehicles.find_by_id(v1.id).await.unwrap().unwrap();
    assert_eq!(v1_now.status, VehicleStatus::Available);
    assert_vehicle_invariant(&app).await;
}

#[tokio::test]
async fn end_date_after_implicit_start_is_accepted() {
    let app = TestApp::new().await;
    let driver = app.create_user("driver@example.com", UserRole::Driver).await;
    let v1 = app.create_vehicle("MH14CD5679", None).await;

    let mut request = vehicle_assignment(v1.id, driver.id);
    request.end_date = Some(Utc::now() + Duration::days(7));
    let created = app
        .services()
        .assignments
        .create_vehicle_assignment(&app.admin, request)
        .await
        .unwrap();
    assert_eq!(created.start_date, created.assigned_at);
    assert!(created.end_date.unwrap() > created.start_date);
}

#[tokio::test]
async fn feeder_point_insert_checks_point_under_same_lock() {
    let app = TestApp::new().await;
    let driver = app.create_user("driver@example.com", UserRole::Driver).await;
    let point = app.create_feeder_point("Riverside").await;

    let assignment = Assignment::new_active(
        NewAssignment {
            target: AssignmentTarget::FeederPoint {
                feeder_point_id: point.id,
            },
            assigned_to: driver.id,
            start_date: None,
            end_date: None,
            notes: None,
        },
        app.admin.user_id,
        Utc::now(),
    );

    // el punto desaparece entre la validación del servicio y la inserción
    app.repos()
        .feeder_points
        .delete_unassigned(point.id)
        .await
        .unwrap();

    let outcome = app
        .repos()
        .assignments
        .insert_feeder_point_assignment(&assignment)
        .await
        .unwrap();
    assert!(matches!(outcome, PointClaimOutcome::PointMissing));
    assert!(app
        .repos()
        .assignments
        .find_by_id(assignment.id)
        .await
        .unwrap()
        .is_none());

    let result = app
        .services()
        .assignments
        .create_feeder_point_assignment(
            &app.admin,
            CreateFeederPointAssignmentRequest {
                feeder_point_id: Some(point.id),
                assigned_to: Some(driver.id),
                start_date: None,
                end_date: None,
                notes: None,
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn statistics_group_by_kind_and_status() {
    let app = TestApp::new().await;
    let driver = app.create_user("driver@example.com", UserRole::Driver).await;
    let v1 = app.create_vehicle("GJ05CC0001", None).await;
    let v2 = app.create_vehicle("GJ05CC0002", None).await;
    let point = app.create_feeder_point("Depot").await;

    let a1 = app
        .services()
        .assignments
        .create_vehicle_assignment(&app.admin, vehicle_assignment(v1.id, driver.id))
        .await
        .unwrap();
    app.services()
        .assignments
        .create_vehicle_assignment(&app.admin, vehicle_assignment(v2.id, driver.id))
        .await
        .unwrap();
    app.services()
        .assignments
        .change_status(&app.admin, a1.id, "cancelled")
        .await
        .unwrap();
    app.services()
        .assignments
        .create_feeder_point_assignment(
            &app.admin,
            CreateFeederPointAssignmentRequest {
                feeder_point_id: Some(point.id),
                assigned_to: Some(driver.id),
                start_date: None,
                end_date: None,
                notes: None,
            },
        )
        .await
        .unwrap();

    let stats = app.services().assignments.statistics(&app.admin).await.unwrap();
    assert_eq!(stats.vehicle_assignments.total, 2);
    assert_eq!(stats.vehicle_assignments.active, 1);
    assert_eq!(stats.vehicle_assignments.cancelled, 1);
    assert_eq!(stats.feeder_point_assignments.total, 1);
    assert_eq!(stats.feeder_point_assignments.active, 1);

    let active_views = app
        .services()
        .assignments
        .list_vehicle_assignments(
            &app.admin,
            &AssignmentListQuery {
                status: Some("active".to_string()),
                assignment_type: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(active_views.len(), 1);
    assert_eq!(
        active_views[0].vehicle.as_ref().map(|v| v.id),
        Some(v2.id)
    );
}

#[tokio::test]
async fn drivers_cannot_manage_assignments() {
    let app = TestApp::new().await;
    let driver = app.principal("driver@example.com", UserRole::Driver).await;
    let v1 = app.create_vehicle("TN09ZZ0001", None).await;

    let result = app
        .services()
        .assignments
        .create_vehicle_assignment(&driver, vehicle_assignment(v1.id, driver.user_id))
        .await;
    match result {
        Err(AppError::Forbidden(msg)) => assert!(msg.contains("manage_assignments")),
        other => panic!("expected forbidden, got {:?}", other),
    }
}
