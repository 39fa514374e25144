//! `coachdesk-gateway`
//!
//! **Responsibility:** entity gateways and scoped reads.
//!
//! This crate provides:
//! - The `EntityGateway` seam plus REST and in-memory implementations
//! - Environment-driven configuration
//! - `ScopedReader`, which assembles parent lookups and applies organization scope

pub mod config;
pub mod error;
pub mod gateway;
pub mod memory;
pub mod reader;
pub mod rest;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use gateway::{EntityGateway, fetch, normalize_listing};
pub use memory::InMemoryGateway;
pub use reader::ScopedReader;
pub use rest::RestGateway;
