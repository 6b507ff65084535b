pub mod envelope;
pub mod ingest_service;
pub mod recent_service;
pub mod validator;
