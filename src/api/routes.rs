use axum::{routing::get, Router};

use crate::server::AppState;

use super::health::health;
use super::pages::{
    about, availability, contact, generals, home, majors, not_found, reservation,
};

pub fn page_routes() -> Router<AppState> {
    Router::new()
        // Health
        .route("/health", get(health))
        // Pages
        .route("/", get(home))
        .route("/about", get(about))
        .route("/generals-quarters", get(generals))
        .route("/majors-suite", get(majors))
        .route("/search-availability", get(availability))
        .route("/contact", get(contact))
        .route("/make-reservation", get(reservation))
        .fallback(not_found)
}
