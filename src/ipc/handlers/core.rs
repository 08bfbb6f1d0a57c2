use crate::ipc::helpers::{err, ok, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::store::Workbook;
use serde_json::json;
use std::path::PathBuf;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workbookPath": state.workbook_dir.as_ref().map(|p| p.to_string_lossy().to_string())
        }),
    )
}

// Open-or-create is the session's connection step. On failure the daemon
// stays up but holds no workbook, so every data method keeps answering
// no_workbook until a later open succeeds.
fn handle_workbook_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    match Workbook::open(&path) {
        Ok(book) => {
            tracing::info!(path = %path.to_string_lossy(), "workbook opened");
            state.workbook_dir = Some(path.clone());
            state.book = Some(book);
            ok(&req.id, json!({ "workbookPath": path.to_string_lossy() }))
        }
        Err(e) => {
            tracing::error!(path = %path.to_string_lossy(), error = %e, "workbook open failed");
            state.workbook_dir = None;
            state.book = None;
            HandlerErr::from(e).response(&req.id)
        }
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workbook.open" => Some(handle_workbook_open(state, req)),
        _ => None,
    }
}
