//! Staffing use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into transactional use-cases.
//! - Keep the CLI and other callers decoupled from storage details.

pub mod assignment_service;
pub mod error;
pub mod event_service;
pub mod reconciler;
pub mod requirement_service;
pub mod staffing_view;
