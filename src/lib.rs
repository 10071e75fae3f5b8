//! HealthGo Library
//!
//! Vital-sign CSV ingestion, storage and time-range queries.

pub mod build_info;
pub mod config;
pub mod db;
pub mod http;
pub mod models;
pub mod services;
pub mod timestamp;
