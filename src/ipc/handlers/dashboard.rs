use crate::dashboard;
use crate::ipc::error::{err, ok, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::store;
use rusqlite::Connection;
use serde_json::{json, Value};

fn dashboard_summary(conn: &Connection) -> Result<Value, HandlerErr> {
    let records =
        store::list_all(conn).map_err(|e| HandlerErr::from_store(e, "db_query_failed"))?;
    let summary = dashboard::summarize(&records);
    let month_options = dashboard::month_options(&records);

    let mut result = json!({
        "empty": records.is_empty(),
        "summary": summary,
        "monthOptions": month_options,
    });
    if records.is_empty() {
        result["message"] = json!(dashboard::NO_DATA_MESSAGE);
    }
    Ok(result)
}

fn parse_month(params: &Value) -> Result<u32, HandlerErr> {
    let v = params
        .get("month")
        .ok_or_else(|| HandlerErr::new("bad_params", "missing month"))?;
    let month = v
        .as_i64()
        .or_else(|| v.as_str().and_then(|s| s.trim().parse::<i64>().ok()))
        .ok_or_else(|| HandlerErr::new("bad_params", "month must be an integer"))?;
    if !(1..=12).contains(&month) {
        return Err(HandlerErr::new("bad_params", "month must be between 1 and 12")
            .with_details(json!({ "month": month })));
    }
    Ok(month as u32)
}

fn dashboard_month(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let month = parse_month(params)?;
    let records =
        store::list_all(conn).map_err(|e| HandlerErr::from_store(e, "db_query_failed"))?;
    let students = dashboard::filter_by_month(&records, month);
    Ok(json!({
        "month": month,
        "count": students.len(),
        "students": students,
    }))
}

fn handle_dashboard_summary(state: &mut AppState, req: &Request) -> Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match dashboard_summary(conn) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_dashboard_month(state: &mut AppState, req: &Request) -> Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match dashboard_month(conn, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "dashboard.summary" => Some(handle_dashboard_summary(state, req)),
        "dashboard.month" => Some(handle_dashboard_month(state, req)),
        _ => None,
    }
}
