use crate::ipc::error::{err, ok};
use crate::ipc::helpers::get_required_str;
use crate::ipc::types::{AppState, Request};
use crate::validate;
use chrono::Datelike;
use serde_json::json;
use std::path::PathBuf;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string()),
            "authenticated": state.session.is_authenticated()
        }),
    )
}

fn handle_app_info(state: &mut AppState, req: &Request) -> serde_json::Value {
    let logo = state.config.logo_path(state.workspace.as_deref());
    ok(
        &req.id,
        json!({
            "schoolName": state.config.school_name,
            "academicYears": validate::academic_years(chrono::Local::now().year()),
            "logo": {
                "path": logo.to_string_lossy(),
                "available": logo.is_file()
            }
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let path = match get_required_str(&req.params, "path") {
        Ok(v) => PathBuf::from(v),
        Err(e) => return e.response(&req.id),
    };

    match state.open_workspace(&path) {
        Ok(()) => ok(&req.id, json!({ "workspacePath": path.to_string_lossy() })),
        Err(e) => {
            let message = format!("{e:#}");
            tracing::error!(workspace = %path.display(), error = %message, "workspace open failed");
            err(&req.id, "db_open_failed", message, None)
        }
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "app.info" => Some(handle_app_info(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        _ => None,
    }
}
