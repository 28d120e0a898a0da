mod common;

use common::{vehicle_request, TestApp, TEST_PASSWORD};
use fleet_portal::dto::assignment_dto::CreateVehicleAssignmentRequest;
use fleet_portal::dto::feeder_point_dto::{FeederPointListQuery, UpdateFeederPointRequest};
use fleet_portal::dto::user_dto::{CreateUserRequest, UpdateProfileRequest, UserListQuery};
use fleet_portal::dto::vehicle_dto::{UpdateVehicleRequest, VehicleListQuery};
use fleet_portal::models::user::UserRole;
use fleet_portal::models::vehicle::VehicleStatus;
use fleet_portal::utils::errors::AppError;
use uuid::Uuid;

async fn assign(app: &TestApp, vehicle_id: Uuid, assignee: Uuid) {
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
        .unwrap();
}

#[tokio::test]
async fn registration_numbers_are_unique_after_normalization() {
    let app = TestApp::new().await;
    app.create_vehicle(" mh12ab1234 ", None).await;

    let duplicate = app
        .services()
        .vehicles
        .create(&app.admin, vehicle_request("MH12AB1234", None))
        .await;
    match duplicate {
        Err(AppError::Conflict(msg)) => assert!(msg.contains("MH12AB1234")),
        other => panic!("expected conflict, got {:?}", other),
    }

    let second = app.create_vehicle("MH12AB9999", None).await;
    let clash = app
        .services()
        .vehicles
        .update(
            &app.admin,
            second.id,
            UpdateVehicleRequest {
                registration_number: Some("Mh12Ab1234".to_string()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(clash, Err(AppError::Conflict(_))));

    // Reescribir su propia matrícula no es conflicto
    let same = app
        .services()
        .vehicles
        .update(
            &app.admin,
            second.id,
            UpdateVehicleRequest {
                registration_number: Some("mh12ab9999".to_string()),
                model: Some("Intra V30".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(same.model.as_deref(), Some("Intra V30"));
}

#[tokio::test]
async fn assigned_status_is_reserved_for_assignments() {
    let app = TestApp::new().await;
    let driver = app.create_user("driver@example.com", UserRole::Driver).await;

    let create = app
        .services()
        .vehicles
        .create(&app.admin, vehicle_request("AP01AA0001", Some("assigned")))
        .await;
    assert!(matches!(create, Err(AppError::Conflict(_))));

    let v1 = app.create_vehicle("AP01AA0002", None).await;
    let manual = app
        .services()
        .vehicles
        .update_status(&app.admin, v1.id, "assigned")
        .await;
    assert!(matches!(manual, Err(AppError::Conflict(_))));

    let unknown = app
        .services()
        .vehicles
        .update_status(&app.admin, v1.id, "flying")
        .await;
    assert!(matches!(unknown, Err(AppError::InvalidStatus(_))));

    let maintenance = app
        .services()
        .vehicles
        .update_status(&app.admin, v1.id, "maintenance")
        .await
        .unwrap();
    assert_eq!(maintenance.status, VehicleStatus::Maintenance);
    app.services()
        .vehicles
        .update_status(&app.admin, v1.id, "available")
        .await
        .unwrap();

    assign(&app, v1.id, driver.id).await;
    let while_assigned = app
        .services()
        .vehicles
        .update_status(&app.admin, v1.id, "maintenance")
        .await;
    assert!(matches!(while_assigned, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn vehicle_with_active_assignment_cannot_be_deleted() {
    let app = TestApp::new().await;
    let driver = app.create_user("driver@example.com", UserRole::Driver).await;
    let v1 = app.create_vehicle("UP32BB0001", None).await;
    let v2 = app.create_vehicle("UP32BB0002", None).await;
    assign(&app, v1.id, driver.id).await;

    let blocked = app.services().vehicles.delete(&app.admin, v1.id).await;
    assert!(matches!(blocked, Err(AppError::Conflict(_))));
    assert!(app.repos().vehicles.find_by_id(v1.id).await.unwrap().is_some());

    app.services().vehicles.delete(&app.admin, v2.id).await.unwrap();
    let gone = app.services().vehicles.get(&app.admin, v2.id).await;
    assert!(matches!(gone, Err(AppError::NotFound(_))));
    let again = app.services().vehicles.delete(&app.admin, v2.id).await;
    assert!(matches!(again, Err(AppError::NotFound(_))));

    let history = app
        .services()
        .vehicles
        .assignment_history(&app.admin, v1.id)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].assigned_to, driver.id);
}

#[tokio::test]
async fn vehicle_listing_filters_searches_and_paginates() {
    let app = TestApp::new().await;
    for i in 0..12 {
        app.create_vehicle(&format!("RJ14CD{:04}", i), None).await;
    }
    app.create_vehicle("RJ14CD9000", Some("maintenance")).await;

    let page = app
        .services()
        .vehicles
        .list(&app.admin, &VehicleListQuery::default())
        .await
        .unwrap();
    assert_eq!(page.pagination.total, 13);
    assert_eq!(page.pagination.pages, 2);
    assert_eq!(page.items.len(), 10);

    let second = app
        .services()
        .vehicles
        .list(
            &app.admin,
            &VehicleListQuery {
                page: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(second.items.len(), 3);

    let maintenance = app
        .services()
        .vehicles
        .list(
            &app.admin,
            &VehicleListQuery {
                status: Some("maintenance".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(maintenance.pagination.total, 1);

    let search = app
        .services()
        .vehicles
        .list(
            &app.admin,
            &VehicleListQuery {
                search: Some("cd000".to_string()),
                status: Some("all".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(search.pagination.total, 10);

    let available = app.services().vehicles.available(&app.admin).await.unwrap();
    assert_eq!(available.len(), 12);

    let stats = app.services().vehicles.stats(&app.admin).await.unwrap();
    assert_eq!(stats.total, 13);
    assert_eq!(stats.by_status.maintenance, 1);
    assert_eq!(stats.by_type.get("truck"), Some(&13));
}

#[tokio::test]
async fn drivers_can_read_but_not_write_vehicles() {
    let app = TestApp::new().await;
    let driver = app.principal("driver@example.com", UserRole::Driver).await;
    let v1 = app.create_vehicle("WB20EE0001", None).await;

    assert!(app.services().vehicles.get(&driver, v1.id).await.is_ok());
    let create = app
        .services()
        .vehicles
        .create(&driver, vehicle_request("WB20EE0002", None))
        .await;
    assert!(matches!(create, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn duplicate_user_email_conflicts_without_orphan_account() {
    let app = TestApp::new().await;
    app.create_user("dup@example.com", UserRole::Driver).await;

    let again = app
        .services()
        .users
        .create(
            &app.admin,
            CreateUserRequest {
                email: "DUP@example.com".to_string(),
                password: TEST_PASSWORD.to_string(),
                full_name: "Second Person".to_string(),
                phone: None,
                role: "driver".to_string(),
            },
        )
        .await;
    assert!(matches!(again, Err(AppError::Conflict(_))));

    let invalid_role = app
        .services()
        .users
        .create(
            &app.admin,
            CreateUserRequest {
                email: "role@example.com".to_string(),
                password: TEST_PASSWORD.to_string(),
                full_name: "Role Person".to_string(),
                phone: None,
                role: "captain".to_string(),
            },
        )
        .await;
    assert!(matches!(invalid_role, Err(AppError::InvalidStatus(_))));
    assert!(app
        .repos()
        .accounts
        .find_by_email("role@example.com")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn deleting_a_user_revokes_the_account() {
    let app = TestApp::new().await;
    let user = app.create_user("leaving@example.com", UserRole::SwachhHr).await;

    app.services().users.delete(&app.admin, user.id).await.unwrap();
    assert!(app.repos().users.find_by_id(user.id).await.unwrap().is_none());
    assert!(app.repos().accounts.find_by_id(user.id).await.unwrap().is_none());
    let sign_in = app
        .state
        .identity
        .sign_in("leaving@example.com", TEST_PASSWORD)
        .await;
    assert!(matches!(sign_in, Err(AppError::Unauthorized(_))));

    let missing = app.services().users.delete(&app.admin, user.id).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn users_filter_by_role_and_status() {
    let app = TestApp::new().await;
    app.create_user("d1@example.com", UserRole::Driver).await;
    let d2 = app.create_user("d2@example.com", UserRole::Driver).await;
    app.create_user("hr@example.com", UserRole::SwachhHr).await;
    app.services()
        .users
        .update_active_status(&app.admin, d2.id, false)
        .await
        .unwrap();

    let drivers = app
        .services()
        .users
        .list(
            &app.admin,
            &UserListQuery {
                role: Some("driver".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(drivers.pagination.total, 2);

    let inactive = app
        .services()
        .users
        .list(
            &app.admin,
            &UserListQuery {
                status: Some("inactive".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(inactive.items.len(), 1);
    assert_eq!(inactive.items[0].id, d2.id);
}

#[tokio::test]
async fn users_read_their_own_document_only() {
    let app = TestApp::new().await;
    let driver = app.principal("self@example.com", UserRole::Driver).await;
    let other = app.create_user("other@example.com", UserRole::Driver).await;

    let own = app.services().users.get(&driver, driver.user_id).await.unwrap();
    assert_eq!(own.email, "self@example.com");
    let foreign = app.services().users.get(&driver, other.id).await;
    assert!(matches!(foreign, Err(AppError::Forbidden(_))));

    let updated = app
        .services()
        .users
        .update_profile(
            &driver,
            UpdateProfileRequest {
                full_name: Some("Self Updated".to_string()),
                phone: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.full_name, "Self Updated");
    assert_eq!(updated.role, UserRole::Driver);
}

#[tokio::test]
async fn feeder_points_crud_and_search() {
    let app = TestApp::new().await;
    let market = app.create_feeder_point("Market Square").await;
    app.create_feeder_point("Bus Stand").await;

    let found = app
        .services()
        .feeder_points
        .list(
            &app.admin,
            &FeederPointListQuery {
                search: Some("market".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(found.pagination.total, 1);
    assert_eq!(found.items[0].id, market.id);

    let renamed = app
        .services()
        .feeder_points
        .update(
            &app.admin,
            market.id,
            UpdateFeederPointRequest {
                name: Some("Old Market".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "Old Market");
    assert_eq!(renamed.location, market.location);

    app.services()
        .feeder_points
        .delete(&app.admin, market.id)
        .await
        .unwrap();
    let gone = app.services().feeder_points.get(&app.admin, market.id).await;
    assert!(matches!(gone, Err(AppError::NotFound(_))));

    let driver = app.principal("driver@example.com", UserRole::Driver).await;
    let forbidden = app
        .services()
        .feeder_points
        .delete(&driver, Uuid::new_v4())
        .await;
    assert!(matches!(forbidden, Err(AppError::Forbidden(_))));
}
