//! Page handlers.
//!
//! Handlers only produce [`TemplateData`]; session-wide values such as the
//! CSRF token, flash messages and the remembered remote address are filled
//! in by the renderer's data merger.

use std::net::SocketAddr;
use std::ops::ControlFlow;

use axum::{
    extract::{ConnectInfo, State},
    http::Uri,
    response::Html,
};

use crate::config::MissingTemplatePolicy;
use crate::error::{AppError, ErrorResponse};
use crate::server::AppState;
use crate::session::Session;
use crate::template::{TemplateData, TemplateError, REMOTE_IP_KEY};

pub type PageResponse = Result<Html<Vec<u8>>, ErrorResponse>;

/// Decide what a failed render turns into.
///
/// `Break` carries the name of a page missing from the cache when the policy
/// is to terminate; everything else becomes an error response.
pub fn on_render_error(
    err: TemplateError,
    policy: MissingTemplatePolicy,
) -> ControlFlow<String, AppError> {
    match err {
        TemplateError::LookupMiss(name) if policy == MissingTemplatePolicy::Abort => {
            ControlFlow::Break(name)
        }
        err => ControlFlow::Continue(err.into()),
    }
}

/// Render `page` for the current session, applying the missing-template policy
async fn render_page(
    state: &AppState,
    session: &Session,
    page: &str,
    data: TemplateData,
) -> PageResponse {
    let err = match state.renderer.render(page, data, Some(session)).await {
        Ok(body) => return Ok(Html(body)),
        Err(e) => e,
    };

    match on_render_error(err, state.settings.templates.missing_template) {
        ControlFlow::Break(name) => {
            tracing::error!(
                template = %name,
                "Could not get template from template cache, terminating"
            );
            std::process::exit(1);
        }
        ControlFlow::Continue(e) => Err(e.respond(state.settings.app.in_production)),
    }
}

/// GET / - Home page; remembers the caller's address for later pages
#[tracing::instrument(name = "http.home", skip(state, session))]
pub async fn home(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    session: Session,
) -> PageResponse {
    if let Err(e) = session.put(REMOTE_IP_KEY, addr.ip().to_string()).await {
        tracing::warn!(error = %e, "Failed to store remote address in session");
    }

    render_page(&state, &session, "home.page.tmpl", TemplateData::new()).await
}

/// GET /about - About page; shows the address remembered by the home page
#[tracing::instrument(name = "http.about", skip(state, session))]
pub async fn about(State(state): State<AppState>, session: Session) -> PageResponse {
    let data = TemplateData::new().with_string("test", "Hello, again");
    render_page(&state, &session, "about.page.tmpl", data).await
}

/// GET /generals-quarters
#[tracing::instrument(name = "http.generals", skip(state, session))]
pub async fn generals(State(state): State<AppState>, session: Session) -> PageResponse {
    render_page(&state, &session, "generals.page.tmpl", TemplateData::new()).await
}

/// GET /majors-suite
#[tracing::instrument(name = "http.majors", skip(state, session))]
pub async fn majors(State(state): State<AppState>, session: Session) -> PageResponse {
    render_page(&state, &session, "majors.page.tmpl", TemplateData::new()).await
}

/// GET /search-availability
#[tracing::instrument(name = "http.availability", skip(state, session))]
pub async fn availability(State(state): State<AppState>, session: Session) -> PageResponse {
    render_page(
        &state,
        &session,
        "search-availability.page.tmpl",
        TemplateData::new(),
    )
    .await
}

/// GET /contact
#[tracing::instrument(name = "http.contact", skip(state, session))]
pub async fn contact(State(state): State<AppState>, session: Session) -> PageResponse {
    render_page(&state, &session, "contact.page.tmpl", TemplateData::new()).await
}

/// GET /make-reservation
#[tracing::instrument(name = "http.reservation", skip(state, session))]
pub async fn reservation(State(state): State<AppState>, session: Session) -> PageResponse {
    render_page(
        &state,
        &session,
        "make-reservation.page.tmpl",
        TemplateData::new(),
    )
    .await
}

pub async fn not_found(State(state): State<AppState>, uri: Uri) -> ErrorResponse {
    AppError::NotFound(uri.path().to_string()).respond(state.settings.app.in_production)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn miss() -> TemplateError {
        TemplateError::LookupMiss("contact.page.tmpl".to_string())
    }

    #[test]
    fn test_abort_policy_stops_on_lookup_miss() {
        match on_render_error(miss(), MissingTemplatePolicy::Abort) {
            ControlFlow::Break(name) => assert_eq!(name, "contact.page.tmpl"),
            ControlFlow::Continue(e) => panic!("expected abort, got {e}"),
        }
    }

    #[test]
    fn test_respond_policy_keeps_serving() {
        let flow = on_render_error(miss(), MissingTemplatePolicy::Respond);
        assert!(matches!(
            flow,
            ControlFlow::Continue(AppError::Template(TemplateError::LookupMiss(_)))
        ));
    }

    #[test]
    fn test_abort_policy_only_applies_to_lookup_miss() {
        let err = TemplateError::Execution {
            name: "home.page.tmpl".to_string(),
            message: "boom".to_string(),
        };
        assert!(matches!(
            on_render_error(err, MissingTemplatePolicy::Abort),
            ControlFlow::Continue(AppError::Template(TemplateError::Execution { .. }))
        ));
    }
}
