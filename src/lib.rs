pub mod binding;
pub mod config;
pub mod debounce;
pub mod dialog;
pub mod errors;
pub mod logging;
pub mod models;
pub mod policy;
pub mod routes;
pub mod security;
pub mod surface;
