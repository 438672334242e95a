//! Core types and logic for the Lembrete billing-reminder service.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! schedule generator and record lifecycle are pure functions over in-memory
//! collections; [`service::PlanService`] runs them against any
//! [`store::PlanStore`] backend.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod appointment;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod plan;
pub mod query;
pub mod report;
pub mod schedule;
pub mod service;
pub mod store;

pub use error::{Error, ErrorKind, Result};
