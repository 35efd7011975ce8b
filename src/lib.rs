pub mod config;
pub mod db;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod onboarding;
pub mod report;
pub mod tables;
pub mod view;
