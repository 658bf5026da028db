pub mod cache;
pub mod local_service;
