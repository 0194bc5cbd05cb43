//! HTTP handlers. Thin: validate, delegate to a service, wrap the
//! result in the standard envelope.

pub mod admin;
pub mod enrollments;
pub mod gateway;
pub mod health;
pub mod lockers;
