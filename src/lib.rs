//! Personal to-do service: per-user task lists behind bearer-token auth,
//! with a read-through weather lookup for outdoor tasks.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod state;
pub mod weather;
