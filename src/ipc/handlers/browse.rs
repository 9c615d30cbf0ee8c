use crate::browse::{self, BrowseFilter, PAGE_SIZE};
use crate::ipc::error::{err, ok, HandlerErr};
use crate::ipc::helpers::{get_optional_str, get_positive_usize, write_export_file};
use crate::ipc::types::{AppState, Request};
use crate::store;
use rusqlite::Connection;
use serde_json::{json, Value};

const NO_MATCHES_MESSAGE: &str = "No students found.";

fn browse_page(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let page_number = get_positive_usize(params, "page", 1)?;
    let records =
        store::list_all(conn).map_err(|e| HandlerErr::from_store(e, "db_query_failed"))?;
    let f = BrowseFilter::from_params(params);
    let matched = browse::filter(&records, &f);
    let page = browse::paginate(&matched, PAGE_SIZE, page_number)?;

    let mut result = json!({
        "totalStudents": page.total_items,
        "totalPages": page.total_pages,
        "page": page.number,
        "pageSize": PAGE_SIZE,
        "students": page.items,
        "yearOptions": browse::year_options(&records),
        "empty": matched.is_empty(),
    });
    if matched.is_empty() {
        result["message"] = json!(NO_MATCHES_MESSAGE);
    }
    Ok(result)
}

fn browse_export_csv(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let page_number = get_positive_usize(params, "page", 1)?;
    let records =
        store::list_all(conn).map_err(|e| HandlerErr::from_store(e, "db_query_failed"))?;
    let f = BrowseFilter::from_params(params);
    let matched = browse::filter(&records, &f);
    let page = browse::paginate(&matched, PAGE_SIZE, page_number)?;

    let csv = browse::export_csv(page.items);
    let mut result = json!({
        "fileName": browse::csv_file_name(page.number),
        "rowsExported": page.items.len(),
        "csv": csv,
    });
    if let Some(out) = get_optional_str(params, "outPath") {
        let written = write_export_file(&out, csv.as_bytes())?;
        tracing::info!(path = %written.display(), rows = page.items.len(), "csv exported");
        result["path"] = json!(written.to_string_lossy());
    }
    Ok(result)
}

fn handle_browse_page(state: &mut AppState, req: &Request) -> Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match browse_page(conn, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_browse_export_csv(state: &mut AppState, req: &Request) -> Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match browse_export_csv(conn, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "browse.page" => Some(handle_browse_page(state, req)),
        "browse.exportCsv" => Some(handle_browse_export_csv(state, req)),
        _ => None,
    }
}
