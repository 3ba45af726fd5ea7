//! ClassFlow attendance service.
//!
//! Students check in by scanning a QR code shown in class; the scanner page
//! posts the roll number and the decoded code to `POST /api/attendance`.
//! A student can be marked once per day. Scanning again is answered with the
//! first check-in (`previouslyMarked`) instead of an error, and two check-ins
//! racing each other are settled by the store's unique key on
//! (roll number, date).
//!
//! Layout:
//! - [`db`]: the [`db::AttendanceStore`] trait with MySQL and in-memory backends
//! - [`service`]: marking, queries and the student registry, as `impl AppState`
//! - [`api`] and [`routes`]: actix-web handlers and routing
//! - [`state::AppState`]: store, clock, config and student cache shared by handlers

pub mod api;
pub mod config;
pub mod db;
pub mod docs;
pub mod error;
pub mod model;
pub mod routes;
pub mod service;
pub mod state;
pub mod utils;
