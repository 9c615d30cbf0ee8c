use super::handlers;
use super::types::{AppState, Request};
use crate::ipc::error::err;

/// Methods reachable without signing in.
const PUBLIC_METHODS: [&str; 5] = [
    "health",
    "app.info",
    "auth.login",
    "auth.logout",
    "auth.status",
];

pub fn handle_request(state: &mut AppState, req: Request) -> serde_json::Value {
    tracing::debug!(id = %req.id, method = %req.method, "request");

    if !state.session.is_authenticated() && !PUBLIC_METHODS.contains(&req.method.as_str()) {
        return err(&req.id, "unauthenticated", "log in first", None);
    }

    if let Some(resp) = handlers::core::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::auth::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::students::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::dashboard::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::browse::try_handle(state, &req) {
        return resp;
    }

    err(
        &req.id,
        "not_implemented",
        format!("unknown method: {}", req.method),
        None,
    )
}
