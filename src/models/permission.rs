//! Permisos y tabla rol → permisos
//!
//! Los permisos de un usuario nunca se editan a mano: se derivan siempre
//! del rol mediante la tabla fija de este módulo.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::user::UserRole;

/// Capacidades con nombre que puede tener un usuario
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ManageUsers,
    ViewAllReports,
    AssignTasks,
    GenerateReports,
    ManageSystem,
    ApproveRequests,
    ManageFeederPoints,
    ManageVehicles,
    ManageAssignments,
    ManageDrivers,
    ViewDriverReports,
    AssignRoutes,
    ApproveDrivers,
    ManageWorkers,
    ViewReports,
    SubmitReports,
    ViewAssignedRoutes,
    UpdateStatus,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ManageUsers => "manage_users",
            Permission::ViewAllReports => "view_all_reports",
            Permission::AssignTasks => "assign_tasks",
            Permission::GenerateReports => "generate_reports",
            Permission::ManageSystem => "manage_system",
            Permission::ApproveRequests => "approve_requests",
            Permission::ManageFeederPoints => "manage_feeder_points",
            Permission::ManageVehicles => "manage_vehicles",
            Permission::ManageAssignments => "manage_assignments",
            Permission::ManageDrivers => "manage_drivers",
            Permission::ViewDriverReports => "view_driver_reports",
            Permission::AssignRoutes => "assign_routes",
            Permission::ApproveDrivers => "approve_drivers",
            Permission::ManageWorkers => "manage_workers",
            Permission::ViewReports => "view_reports",
            Permission::SubmitReports => "submit_reports",
            Permission::ViewAssignedRoutes => "view_assigned_routes",
            Permission::UpdateStatus => "update_status",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const ADMIN_PERMISSIONS: &[Permission] = &[
    Permission::ManageUsers,
    Permission::ViewAllReports,
    Permission::AssignTasks,
    Permission::GenerateReports,
    Permission::ManageSystem,
    Permission::ApproveRequests,
    Permission::ManageFeederPoints,
    Permission::ManageVehicles,
    Permission::ManageAssignments,
];

const TRANSPORT_CONTRACTOR_PERMISSIONS: &[Permission] = &[
    Permission::ManageDrivers,
    Permission::ViewDriverReports,
    Permission::AssignRoutes,
    Permission::ManageVehicles,
    Permission::ApproveDrivers,
];

const SWACHH_HR_PERMISSIONS: &[Permission] = &[
    Permission::ManageWorkers,
    Permission::ViewReports,
    Permission::AssignTasks,
    Permission::GenerateReports,
];

const DRIVER_PERMISSIONS: &[Permission] = &[
    Permission::SubmitReports,
    Permission::ViewAssignedRoutes,
    Permission::UpdateStatus,
];

/// Permisos concedidos por defecto a cada rol
pub fn role_permissions(role: UserRole) -> &'static [Permission] {
    match role {
        UserRole::Admin => ADMIN_PERMISSIONS,
        UserRole::TransportContractor => TRANSPORT_CONTRACTOR_PERMISSIONS,
        UserRole::SwachhHr => SWACHH_HR_PERMISSIONS,
        UserRole::Driver => DRIVER_PERMISSIONS,
    }
}

/// Mapa capacidad → concedida; sólo contiene las concedidas
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeMap<Permission, bool>);

impl PermissionSet {
    pub fn for_role(role: UserRole) -> Self {
        Self(role_permissions(role).iter().map(|p| (*p, true)).collect())
    }

    pub fn allows(&self, permission: Permission) -> bool {
        self.0.get(&permission).copied().unwrap_or(false)
    }

    pub fn granted(&self) -> impl Iterator<Item = Permission> + '_ {
        self.0.iter().filter(|(_, v)| **v).map(|(p, _)| *p)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driver_gets_exactly_three_permissions() {
        let set = PermissionSet::for_role(UserRole::Driver);
        let granted: Vec<_> = set.granted().collect();
        assert_eq!(
            granted,
            vec![
                Permission::SubmitReports,
                Permission::ViewAssignedRoutes,
                Permission::UpdateStatus
            ]
        );
    }

    #[test]
    fn contractor_has_no_admin_only_flags() {
        let set = PermissionSet::for_role(UserRole::TransportContractor);
        assert!(set.allows(Permission::ManageVehicles));
        assert!(!set.allows(Permission::ManageUsers));
        assert!(!set.allows(Permission::ManageSystem));
        assert_eq!(set.len(), 5);
    }

    #[test]
    fn admin_table_matches_portal_capabilities() {
        let set = PermissionSet::for_role(UserRole::Admin);
        assert_eq!(set.len(), 9);
        assert!(set.allows(Permission::ApproveRequests));
        assert!(!set.allows(Permission::SubmitReports));
    }

    #[test]
    fn serializes_as_snake_case_map() {
        let json = serde_json::to_value(PermissionSet::for_role(UserRole::SwachhHr)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "assign_tasks": true,
                "generate_reports": true,
                "manage_workers": true,
                "view_reports": true
            })
        );
        let back: PermissionSet = serde_json::from_value(json).unwrap();
        assert_eq!(back, PermissionSet::for_role(UserRole::SwachhHr));
    }
}
