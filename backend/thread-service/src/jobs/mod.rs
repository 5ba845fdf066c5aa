//! Background jobs for thread-service

pub mod link_repair;
