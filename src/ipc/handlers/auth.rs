use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::session::{Session, SessionAction};
use serde_json::json;

fn session_json(session: &Session) -> serde_json::Value {
    json!({
        "authenticated": session.is_authenticated(),
        "state": session.auth,
        "username": session.username,
        "views": session.views()
    })
}

fn handle_login(state: &mut AppState, req: &Request) -> serde_json::Value {
    let username = req
        .params
        .get("username")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .trim()
        .to_string();
    let password = req
        .params
        .get("password")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();

    let action = SessionAction::Login { username, password };
    state.session = state.session.reduce(&action, &state.config.credentials);

    if state.session.login_failed {
        tracing::warn!("login rejected");
        return err(
            &req.id,
            "bad_credentials",
            "Invalid credentials. Please try again.",
            None,
        );
    }
    tracing::info!(user = ?state.session.username, "logged in");
    ok(&req.id, session_json(&state.session))
}

fn handle_logout(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.session = state
        .session
        .reduce(&SessionAction::Logout, &state.config.credentials);
    tracing::info!("logged out");
    ok(&req.id, session_json(&state.session))
}

fn handle_status(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, session_json(&state.session))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "auth.login" => Some(handle_login(state, req)),
        "auth.logout" => Some(handle_logout(state, req)),
        "auth.status" => Some(handle_status(state, req)),
        _ => None,
    }
}
