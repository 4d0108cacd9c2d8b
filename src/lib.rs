//! LaunchGuard - Webhook Reliability and Deployment Readiness
//!
//! This crate keeps inbound provider webhooks exactly-once in effect
//! (idempotent ingress plus a retrying dead-letter queue) and decides whether
//! a deployment may be promoted by running an ordered suite of readiness
//! checks against it.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
