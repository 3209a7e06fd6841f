//! Core engine modules for Tech Dash.

pub mod db;
pub mod error;
pub mod labour;
pub mod repo;
pub mod resolver;
pub mod state;
pub mod types;
