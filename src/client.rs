//! Per-browser session cookie.

use axum::{
    extract::Request,
    http::{HeaderValue, header},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

pub const COOKIE_NAME: &str = "studio_session";

/// Identifies the client a session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(Uuid);

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientId {
    pub fn new() -> Self {
        ClientId(Uuid::new_v4())
    }

    pub fn cookie(self) -> String {
        format!("{COOKIE_NAME}={}; Path=/; HttpOnly; SameSite=Lax", self.0)
    }
}

/// Attaches the caller's `ClientId` to the request, issuing a new cookie
/// when the request carries none (or an unreadable one).
pub async fn session_middleware(mut request: Request, next: Next) -> Response {
    let existing = request
        .headers()
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(client_from_cookie_header);

    let client = existing.unwrap_or_else(ClientId::new);
    request.extensions_mut().insert(client);

    let mut response = next.run(request).await;
    if existing.is_none() {
        match HeaderValue::from_str(&client.cookie()) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(err) => tracing::warn!(error = %err, "could not build session cookie"),
        }
    }
    response
}

fn client_from_cookie_header(header: &str) -> Option<ClientId> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == COOKIE_NAME)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
        .map(ClientId)
}
