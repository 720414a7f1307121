//! # IO Module
//!
//! Adapter layer between HTTP clients and the domain services. Handlers
//! translate DTOs from the `shared` crate into domain commands, call the
//! services, and turn domain errors into status codes.

pub mod rest;
