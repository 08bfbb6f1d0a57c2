use serde_json::{json, Map, Value};

use crate::record::RecordError;
use crate::store::StoreError;
use crate::upsert::UpsertError;

pub fn ok(id: &str, result: Value) -> Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(id: &str, code: &str, message: impl Into<String>, details: Option<Value>) -> Value {
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

// Error taxonomy: connection errors surface as store_open_failed and leave
// the session without a workbook; validation errors reject before any store
// call; write errors surface the underlying cause with no rollback.
pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<Value>,
}

impl HandlerErr {
    pub fn bad_params(message: impl Into<String>) -> Self {
        HandlerErr {
            code: "bad_params",
            message: message.into(),
            details: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        HandlerErr {
            code: "validation_failed",
            message: message.into(),
            details: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        HandlerErr {
            code: "not_found",
            message: message.into(),
            details: None,
        }
    }

    pub fn response(self, id: &str) -> Value {
        err(id, self.code, self.message, self.details)
    }
}

impl From<StoreError> for HandlerErr {
    fn from(e: StoreError) -> Self {
        let code = match &e {
            StoreError::Workspace { .. }
            | StoreError::Open { .. }
            | StoreError::HeaderMismatch { .. } => "store_open_failed",
            StoreError::Read { .. } | StoreError::Corrupt { .. } => "store_read_failed",
            StoreError::Write { .. }
            | StoreError::RowOutOfRange { .. }
            | StoreError::WidthMismatch { .. } => "store_write_failed",
        };
        let details = match &e {
            StoreError::HeaderMismatch {
                sheet,
                expected,
                found,
            } => Some(json!({ "sheet": sheet, "expected": expected, "found": found })),
            _ => None,
        };
        HandlerErr {
            code,
            message: e.to_string(),
            details,
        }
    }
}

impl From<UpsertError> for HandlerErr {
    fn from(e: UpsertError) -> Self {
        match e {
            UpsertError::EmptyKey => HandlerErr::validation("record key must not be empty"),
            UpsertError::NoKeyColumn(_) => HandlerErr {
                code: "internal",
                message: e.to_string(),
                details: None,
            },
            UpsertError::Store(inner) => inner.into(),
        }
    }
}

impl From<RecordError> for HandlerErr {
    fn from(e: RecordError) -> Self {
        HandlerErr::bad_params(e.to_string())
    }
}

pub fn get_required_str(params: &Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn get_optional_str(params: &Value, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

pub fn get_record_object<'a>(params: &'a Value) -> Result<&'a Map<String, Value>, HandlerErr> {
    params
        .get("record")
        .and_then(|v| v.as_object())
        .ok_or_else(|| HandlerErr::bad_params("missing record object"))
}

// Search terms come from a free-text box; an all-whitespace term would match
// every row, so the contract is to reject it here.
pub fn get_search_term(params: &Value) -> Result<String, HandlerErr> {
    let term = get_required_str(params, "term")?;
    let term = term.trim().to_string();
    if term.is_empty() {
        return Err(HandlerErr::validation("search term must not be empty"));
    }
    Ok(term)
}
