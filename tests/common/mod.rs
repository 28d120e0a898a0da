//! Fixture compartida: almacén en memoria, proveedor local y usuarios por rol

#![allow(dead_code)]

use fleet_portal::config::EnvironmentConfig;
use fleet_portal::dto::feeder_point_dto::CreateFeederPointRequest;
use fleet_portal::dto::user_dto::CreateUserRequest;
use fleet_portal::dto::vehicle_dto::CreateVehicleRequest;
use fleet_portal::models::auth::Principal;
use fleet_portal::models::feeder_point::FeederPoint;
use fleet_portal::models::user::{User, UserRole};
use fleet_portal::models::vehicle::Vehicle;
use fleet_portal::repositories::Repositories;
use fleet_portal::services::Services;
use fleet_portal::state::AppState;

pub const TEST_PASSWORD: &str = "Sup3rSecret!";

pub struct TestApp {
    pub state: AppState,
    pub admin: Principal,
}

impl TestApp {
    pub async fn new() -> Self {
        let config = EnvironmentConfig::for_memory_store("test-secret");
        let state = AppState::new(config, Repositories::in_memory());
        let admin_user = state
            .services
            .users
            .bootstrap_admin("admin@example.com", TEST_PASSWORD, "Portal Admin")
            .await
            .unwrap();
        let admin = Principal::from_user(&admin_user);
        Self { state, admin }
    }

    pub fn services(&self) -> &Services {
        &self.state.services
    }

    pub fn repos(&self) -> &Repositories {
        &self.state.repos
    }

    pub async fn create_user(&self, email: &str, role: UserRole) -> User {
        self.services()
            .users
            .create(
                &self.admin,
                CreateUserRequest {
                    email: email.to_string(),
                    password: TEST_PASSWORD.to_string(),
                    full_name: format!("User {}", email),
                    phone: None,
                    role: role.as_str().to_string(),
                },
            )
            .await
            .unwrap()
    }

    pub async fn principal(&self, email: &str, role: UserRole) -> Principal {
        Principal::from_user(&self.create_user(email, role).await)
    }

    pub async fn create_vehicle(&self, registration: &str, status: Option<&str>) -> Vehicle {
        self.services()
            .vehicles
            .create(&self.admin, vehicle_request(registration, status))
            .await
            .unwrap()
    }

    pub async fn create_feeder_point(&self, name: &str) -> FeederPoint {
        self.services()
            .feeder_points
            .create(
                &self.admin,
                CreateFeederPointRequest {
                    name: name.to_string(),
                    location: format!("{} road", name),
                    area: Some("Ward 7".to_string()),
                },
            )
            .await
            .unwrap()
    }

    pub async fn login_token(&self, email: &str) -> String {
        self.state
            .identity
            .sign_in(email, TEST_PASSWORD)
            .await
            .unwrap()
            .token
    }
}

pub fn vehicle_request(registration: &str, status: Option<&str>) -> CreateVehicleRequest {
    CreateVehicleRequest {
        registration_number: registration.to_string(),
        make: Some("Tata".to_string()),
        model: Some("Ace".to_string()),
        year: Some(2022),
        vehicle_type: "truck".to_string(),
        capacity: None,
        fuel_type: Some("diesel".to_string()),
        status: status.map(str::to_string),
    }
}
