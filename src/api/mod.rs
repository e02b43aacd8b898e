//! HTTP layer - page handlers and health endpoint.

mod health;
mod pages;
mod routes;

// Re-export all handlers for use in server/app.rs
pub use health::{health, HealthResponse, TemplateHealthResponse};
pub use pages::{about, availability, contact, generals, home, majors, reservation, PageResponse};
pub use routes::page_routes;
