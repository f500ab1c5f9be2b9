//! Cookie binding between HTTP requests and the session store
//!
//! Policy: a missing, empty, or unknown session cookie never rejects the
//! request. The middleware silently starts a new session and sets a fresh
//! cookie, so an evicted or destroyed session behaves exactly like one that
//! never existed.

use super::AppState;
use crate::session::SessionStore;
use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};

/// Session identifier resolved for the current request
#[derive(Debug, Clone)]
pub struct CurrentSession(pub String);

/// Session middleware
///
/// Reads the session cookie and touches the session if it is live;
/// otherwise creates a session and attaches a `Set-Cookie` to the response.
/// Handlers receive the id as an `Extension<CurrentSession>`.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let jar = CookieJar::from_headers(request.headers());
    let presented = jar
        .get(state.store.cookie_name())
        .map(|c| c.value().to_string())
        .filter(|id| !id.is_empty());

    if let Some(id) = presented {
        if state.store.validate_and_touch(&id).is_ok() {
            request.extensions_mut().insert(CurrentSession(id));
            return next.run(request).await;
        }
        tracing::debug!("Unknown or expired session cookie, starting a new session");
    }

    let id = state.store.create();
    request.extensions_mut().insert(CurrentSession(id.clone()));
    let response = next.run(request).await;

    (jar.add(session_cookie(&state.store, id)), response).into_response()
}

/// Cookie carrying a freshly issued session id
pub fn session_cookie(store: &SessionStore, id: String) -> Cookie<'static> {
    let max_age = i64::try_from(store.max_lifetime().as_secs()).unwrap_or(i64::MAX);
    Cookie::build((store.cookie_name().to_owned(), id))
        .path("/")
        .http_only(true)
        .max_age(time::Duration::seconds(max_age))
        .build()
}

/// Cookie that makes the client discard its session id immediately
pub fn removal_cookie(store: &SessionStore) -> Cookie<'static> {
    let mut cookie = Cookie::build((store.cookie_name().to_owned(), ""))
        .path("/")
        .http_only(true)
        .build();
    cookie.make_removal();
    cookie
}
