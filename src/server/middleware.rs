use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::Response,
};

use super::AppState;
use crate::config::{AppConfig, SessionConfig};
use crate::session::Session;

/// Session middleware.
///
/// Resumes the session named by the cookie, or prepares a new one when the
/// cookie is missing or stale, and attaches a [`Session`] to the request.
/// A new session is only stored, and its cookie only sent, once the request
/// writes something to it.
pub async fn session_layer(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let config = &state.settings.session;

    let mut resumed = None;
    if let Some(id) = read_cookie(req.headers(), &config.cookie_name) {
        match state.sessions.exists(&id).await {
            Ok(true) => resumed = Some(id),
            Ok(false) => tracing::debug!("Session cookie is stale, starting a new session"),
            Err(e) => tracing::warn!(error = %e, "Session lookup failed"),
        }
    }

    let session = match resumed {
        Some(id) => Session::resume(id, state.sessions.clone()),
        None => Session::start(state.sessions.clone()),
    };
    req.extensions_mut().insert(session.clone());

    let mut response = next.run(req).await;

    if session.needs_cookie() {
        let cookie = session_cookie(session.id(), config, &state.settings.app);
        if let Ok(v) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(header::SET_COOKIE, v);
        }
    }

    response
}

/// Extract a cookie value by name from the Cookie headers
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Build the Set-Cookie value for a new session
pub fn session_cookie(id: &str, session: &SessionConfig, app: &AppConfig) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        session.cookie_name, id
    );
    if session.persist {
        cookie.push_str(&format!("; Max-Age={}", session.lifetime_seconds));
    }
    if app.in_production {
        cookie.push_str("; Secure");
    }
    cookie
}
