use crate::browse::PageError;
use crate::photos::PhotoError;
use crate::store::StoreError;
use crate::validate::ValidationError;
use serde_json::json;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

#[derive(Debug)]
pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }

    /// `not_found` for a missing row, otherwise `failed_code`.
    pub fn from_store(e: StoreError, failed_code: &'static str) -> Self {
        match e {
            StoreError::NotFound(id) => HandlerErr::new("not_found", e.to_string())
                .with_details(json!({ "studentId": id })),
            StoreError::Db(db) => HandlerErr::new(failed_code, db.to_string()),
        }
    }
}

impl From<ValidationError> for HandlerErr {
    fn from(e: ValidationError) -> Self {
        HandlerErr::new("validation_failed", e.to_string())
            .with_details(json!({ "fields": e.errors }))
    }
}

impl From<PhotoError> for HandlerErr {
    fn from(e: PhotoError) -> Self {
        match e {
            PhotoError::UnsupportedType(_) | PhotoError::Empty => {
                HandlerErr::new("bad_photo", e.to_string())
            }
            PhotoError::Write { .. } => HandlerErr::new("photo_write_failed", e.to_string()),
        }
    }
}

impl From<PageError> for HandlerErr {
    fn from(e: PageError) -> Self {
        let PageError::OutOfRange {
            requested,
            total_pages,
        } = e;
        HandlerErr::new("page_out_of_range", e.to_string())
            .with_details(json!({ "requested": requested, "totalPages": total_pages }))
    }
}
