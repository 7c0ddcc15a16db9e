pub mod app;
pub mod config;
pub mod email;
pub mod logging;
pub mod pdf;
pub mod routes;
