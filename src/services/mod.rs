pub mod activities_service;
pub mod admin_service;
pub mod api_docs_service;
pub mod auth_service;
pub mod calendar_service;
pub mod export_service;
pub mod notification_service;
pub mod signup_service;
