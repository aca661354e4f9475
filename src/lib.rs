//! Newsroom - A newspaper content-management backend
//!
//! This library provides topics, redactors and newspapers behind a
//! session-authenticated JSON API, plus a staff-only administrative console.

pub mod api;
pub mod config;
pub mod db;
pub mod forms;
pub mod models;
pub mod services;
