//! Services module
//!
//! Lógica de negocio de la aplicación. Cada servicio recibe el `Principal`
//! explícitamente y comprueba sus permisos antes de tocar el almacén.

pub mod approval_service;
pub mod assignment_service;
pub mod auth_service;
pub mod authorization_service;
pub mod export_service;
pub mod feeder_point_service;
pub mod identity_provider;
pub mod jwt_service;
pub mod report_service;
pub mod settings_service;
pub mod user_service;
pub mod vehicle_service;

use std::sync::Arc;
use std::time::Instant;

pub use approval_service::ApprovalService;
pub use assignment_service::AssignmentService;
pub use auth_service::AuthService;
pub use authorization_service::AuthorizationService;
pub use export_service::ExportService;
pub use feeder_point_service::FeederPointService;
pub use identity_provider::{IdentityProvider, LocalIdentityProvider};
pub use jwt_service::{JwtConfig, JwtService};
pub use report_service::ReportService;
pub use settings_service::SettingsService;
pub use user_service::UserService;
pub use vehicle_service::VehicleService;

use crate::repositories::Repositories;
use crate::utils::password::PasswordHasher;

/// Servicios construidos una vez y compartidos por todas las requests
pub struct Services {
    pub auth: AuthService,
    pub users: UserService,
    pub approvals: ApprovalService,
    pub vehicles: VehicleService,
    pub feeder_points: FeederPointService,
    pub assignments: AssignmentService,
    pub reports: ReportService,
    pub exports: ExportService,
    pub settings: SettingsService,
}

impl Services {
    pub fn new(
        repos: &Repositories,
        identity: Arc<dyn IdentityProvider>,
        hasher: PasswordHasher,
        recent_activity_limit: usize,
    ) -> Self {
        Self {
            auth: AuthService::new(repos, identity.clone()),
            users: UserService::new(repos, identity.clone(), hasher),
            approvals: ApprovalService::new(repos, identity, hasher),
            vehicles: VehicleService::new(repos),
            feeder_points: FeederPointService::new(repos),
            assignments: AssignmentService::new(repos),
            reports: ReportService::new(repos, recent_activity_limit),
            exports: ExportService::new(repos),
            settings: SettingsService::new(repos, Instant::now()),
        }
    }
}
