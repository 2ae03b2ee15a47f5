//! Intake wizard: multi-step project onboarding backed by a submission gateway.

pub mod config;
pub mod error;
pub mod gateway;
pub mod store;
pub mod wizard;
