//! Data Transfer Objects
//!
//! Requests y responses de la API HTTP. Los campos obligatorios de texto
//! usan `#[serde(default)]` para que su ausencia llegue a `validator` y se
//! informe como error de validación.

pub mod api_response;
pub mod approval_dto;
pub mod assignment_dto;
pub mod auth_dto;
pub mod feeder_point_dto;
pub mod report_dto;
pub mod settings_dto;
pub mod user_dto;
pub mod vehicle_dto;

pub use api_response::ApiResponse;
