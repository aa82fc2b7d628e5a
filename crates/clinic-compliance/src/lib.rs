//! Waiting-time compliance analytics for outpatient visit exports.
//!
//! Raw visit tables go through [`workflows::intake`] (column mapping and row
//! normalization), then [`workflows::compliance`] (weekly, department and
//! doctor summaries). [`workflows::refresh`] reruns both for scheduled jobs
//! and [`workflows::export`] writes the derived tables and deck outline.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
