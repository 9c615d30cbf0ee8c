use crate::ipc::error::{err, ok, HandlerErr};
use crate::ipc::helpers::{get_optional_str, get_required_id, get_required_str, write_export_file};
use crate::ipc::types::{AppState, Request};
use crate::legacy;
use crate::pdf;
use crate::photos::{PhotoArchive, StoredPhoto};
use crate::store::{self, StudentFields};
use crate::validate;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use rusqlite::Connection;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

struct PhotoUpload {
    file_name: String,
    bytes: Vec<u8>,
}

/// `photoPath` (a file the UI picked) wins over `photoBase64`.
fn parse_photo_upload(params: &Value) -> Result<Option<PhotoUpload>, HandlerErr> {
    if let Some(path) = get_optional_str(params, "photoPath") {
        let src = PathBuf::from(&path);
        let bytes = std::fs::read(&src).map_err(|e| {
            HandlerErr::new("bad_photo", format!("cannot read photo: {}", e))
                .with_details(json!({ "path": path }))
        })?;
        let file_name = get_optional_str(params, "photoFileName").unwrap_or_else(|| {
            src.file_name()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default()
        });
        return Ok(Some(PhotoUpload { file_name, bytes }));
    }

    if let Some(encoded) = get_optional_str(params, "photoBase64") {
        let file_name = get_required_str(params, "photoFileName")?;
        let bytes = BASE64
            .decode(encoded.as_bytes())
            .map_err(|e| HandlerErr::new("bad_photo", format!("photoBase64 is invalid: {}", e)))?;
        return Ok(Some(PhotoUpload { file_name, bytes }));
    }

    Ok(None)
}

fn store_upload(
    archive: &PhotoArchive,
    owner_name: &str,
    upload: Option<PhotoUpload>,
) -> Result<Option<StoredPhoto>, HandlerErr> {
    match upload {
        Some(u) => Ok(Some(archive.store(owner_name, &u.file_name, &u.bytes)?)),
        None => Ok(None),
    }
}

/// Field keys sit at the top level of `params`, beside the photo keys.
fn students_create(
    conn: &Connection,
    archive: &PhotoArchive,
    params: &Value,
) -> Result<Value, HandlerErr> {
    let mut fields = validate::parse_student_fields(params)?;
    let upload = parse_photo_upload(params)?;

    // An add without an upload stores an empty photo.
    let stored = store_upload(archive, &fields.name, upload)?;
    if let Some(s) = &stored {
        fields.photo = s.file_name.clone();
        fields.photo_key = Some(s.key.clone());
    }

    let id = match store::create(conn, &fields) {
        Ok(id) => id,
        Err(e) => {
            if let Some(s) = &stored {
                archive.discard(s);
            }
            return Err(HandlerErr::from_store(e, "db_insert_failed"));
        }
    };
    let record = store::get(conn, id).map_err(|e| HandlerErr::from_store(e, "db_query_failed"))?;
    tracing::info!(student_id = id, class = %record.class, "student created");

    Ok(json!({ "studentId": id, "photo": record.photo, "student": record }))
}

fn students_update(
    conn: &Connection,
    archive: &PhotoArchive,
    params: &Value,
) -> Result<Value, HandlerErr> {
    let id = get_required_id(params, "studentId")?;
    let existing = store::get(conn, id).map_err(|e| HandlerErr::from_store(e, "db_query_failed"))?;
    let mut fields: StudentFields = validate::parse_student_fields(params)?;
    let upload = parse_photo_upload(params)?;

    // Edit keeps the current photo unless a new one is uploaded.
    let stored = store_upload(archive, &fields.name, upload)?;
    match &stored {
        Some(s) => {
            fields.photo = s.file_name.clone();
            fields.photo_key = Some(s.key.clone());
        }
        None => {
            fields.photo = existing.photo.clone();
            fields.photo_key = existing
                .photo_key
                .clone()
                .or_else(|| archive.legacy_key(&existing.name, &existing.photo));
        }
    }

    if let Err(e) = store::update(conn, id, &fields) {
        if let Some(s) = &stored {
            archive.discard(s);
        }
        return Err(HandlerErr::from_store(e, "db_update_failed"));
    }
    let record = store::get(conn, id).map_err(|e| HandlerErr::from_store(e, "db_query_failed"))?;
    tracing::info!(student_id = id, photo_replaced = stored.is_some(), "student updated");

    Ok(json!({ "studentId": id, "photo": record.photo, "student": record }))
}

fn students_list(conn: &Connection) -> Result<Value, HandlerErr> {
    let students =
        store::list_all(conn).map_err(|e| HandlerErr::from_store(e, "db_query_failed"))?;
    Ok(json!({ "students": students }))
}

fn students_get(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let id = get_required_id(params, "studentId")?;
    let student = store::get(conn, id).map_err(|e| HandlerErr::from_store(e, "db_query_failed"))?;
    Ok(json!({ "student": student }))
}

fn students_export_pdf(
    conn: &Connection,
    archive: &PhotoArchive,
    params: &Value,
) -> Result<Value, HandlerErr> {
    let id = get_required_id(params, "studentId")?;
    let record = store::get(conn, id).map_err(|e| HandlerErr::from_store(e, "db_query_failed"))?;

    let photo_path = archive.resolve(&record.name, &record.photo, record.photo_key.as_deref());
    if photo_path.is_none() && !record.photo.is_empty() {
        tracing::warn!(student_id = id, photo = %record.photo, "photo missing from archive");
    }
    let doc = pdf::render(&pdf::layout(&record), photo_path.as_deref())
        .map_err(|e| HandlerErr::new("pdf_render_failed", format!("{e:#}")))?;
    let file_name = pdf::file_name(&record);

    let mut result = json!({
        "fileName": file_name,
        "byteCount": doc.bytes.len(),
        "hasPhoto": doc.has_photo,
    });
    match get_optional_str(params, "outPath") {
        Some(out) => {
            let written = write_export_file(&out, &doc.bytes)?;
            result["path"] = json!(written.to_string_lossy());
        }
        None => {
            result["base64"] = json!(BASE64.encode(&doc.bytes));
        }
    }
    Ok(result)
}

fn students_import_legacy_db(
    conn: &Connection,
    archive: &PhotoArchive,
    params: &Value,
) -> Result<Value, HandlerErr> {
    let path = get_required_str(params, "path")?;
    let photos_dir = get_optional_str(params, "photosDir").map(PathBuf::from);
    let summary = legacy::import_legacy_db(conn, archive, Path::new(&path), photos_dir.as_deref())
        .map_err(|e| {
            HandlerErr::new("legacy_import_failed", format!("{e:#}"))
                .with_details(json!({ "path": path }))
        })?;
    tracing::info!(
        imported = summary.imported,
        photos_copied = summary.photos_copied,
        photos_missing = summary.photos_missing,
        "legacy database imported"
    );
    Ok(json!(summary))
}

fn handle_students_create(state: &mut AppState, req: &Request) -> Value {
    let (Some(conn), Some(archive)) = (state.db.as_ref(), state.photos.as_ref()) else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match students_create(conn, archive, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_students_update(state: &mut AppState, req: &Request) -> Value {
    let (Some(conn), Some(archive)) = (state.db.as_ref(), state.photos.as_ref()) else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match students_update(conn, archive, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_students_list(state: &mut AppState, req: &Request) -> Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match students_list(conn) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_students_get(state: &mut AppState, req: &Request) -> Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match students_get(conn, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_students_export_pdf(state: &mut AppState, req: &Request) -> Value {
    let (Some(conn), Some(archive)) = (state.db.as_ref(), state.photos.as_ref()) else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match students_export_pdf(conn, archive, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_students_import_legacy_db(state: &mut AppState, req: &Request) -> Value {
    let (Some(conn), Some(archive)) = (state.db.as_ref(), state.photos.as_ref()) else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match students_import_legacy_db(conn, archive, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "students.create" => Some(handle_students_create(state, req)),
        "students.update" => Some(handle_students_update(state, req)),
        "students.list" => Some(handle_students_list(state, req)),
        "students.get" => Some(handle_students_get(state, req)),
        "students.exportPdf" => Some(handle_students_export_pdf(state, req)),
        "students.importLegacyDb" => Some(handle_students_import_legacy_db(state, req)),
        _ => None,
    }
}
