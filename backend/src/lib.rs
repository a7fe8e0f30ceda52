//! # Lesson Calendar Backend
//!
//! Turns a weekly lesson template into a dated school calendar.
//!
//! A published template (a bag of recurring weekday slots) is expanded over a
//! date window, every generated lesson is bound to the next topic of the
//! class's curriculum plan, and the batch is checked for teacher, class and
//! room overlaps before it is committed in one transaction. The same overlap
//! engine gives editors a dry-run report on unpublished drafts.
//!
//! ## Architecture
//!
//! The crate is organized into several logical modules:
//!
//! - [`algorithms`]: Interval clustering shared by every collision check
//! - [`api`]: Identifier newtypes and the DTOs of the HTTP API
//! - [`config`]: `calendar.toml` loading with environment overrides
//! - [`db`]: Repository pattern, transactions and the in-memory backend
//! - [`models`]: Templates, curriculum plans, occurrences, time helpers
//! - [`routes`]: Request and response types per endpoint group
//! - [`services`]: Expansion, binding, generation, drafts, publishing
//! - [`http`]: Axum-based HTTP server and request handlers
//!

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod algorithms;
pub mod api;
pub mod config;

pub mod db;
pub mod models;

pub mod routes;

pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
