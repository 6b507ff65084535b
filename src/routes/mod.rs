pub mod log_routes;
pub mod system_routes;
