//! desa-cms - Admin dashboard for a village landing page
//!
//! Serves the sign-in pages and a guarded dashboard that edits the landing
//! page sections stored by the village REST backend.

pub mod api;
pub mod auth;
pub mod backend;
pub mod cache;
pub mod config;
pub mod models;
pub mod services;
pub mod session;
pub mod views;
