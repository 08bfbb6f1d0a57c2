use crate::backup::{export_workbook_bundle, import_workbook_bundle};
use crate::ipc::helpers::{err, get_required_str, ok, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::store::Workbook;
use serde_json::json;
use std::path::PathBuf;

fn backup_err(e: anyhow::Error) -> HandlerErr {
    HandlerErr {
        code: "backup_failed",
        message: format!("{:#}", e),
        details: None,
    }
}

fn handle_export_bundle(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let workbook_path = match get_required_str(&req.params, "workbookPath") {
        Ok(v) => PathBuf::from(v),
        Err(e) => return e.response(&req.id),
    };
    let out_path = match get_required_str(&req.params, "outPath") {
        Ok(v) => PathBuf::from(v),
        Err(e) => return e.response(&req.id),
    };

    match export_workbook_bundle(&workbook_path, &out_path) {
        Ok(summary) => ok(
            &req.id,
            json!({
                "bundleFormat": summary.bundle_format,
                "entryCount": summary.entry_count,
                "dbSha256": summary.db_sha256,
                "outPath": out_path.to_string_lossy(),
            }),
        ),
        Err(e) => backup_err(e).response(&req.id),
    }
}

fn handle_import_bundle(state: &mut AppState, req: &Request) -> serde_json::Value {
    let workbook_path = match get_required_str(&req.params, "workbookPath") {
        Ok(v) => PathBuf::from(v),
        Err(e) => return e.response(&req.id),
    };
    let in_path = match get_required_str(&req.params, "inPath") {
        Ok(v) => PathBuf::from(v),
        Err(e) => return e.response(&req.id),
    };

    let summary = match import_workbook_bundle(&in_path, &workbook_path) {
        Ok(s) => s,
        Err(e) => return backup_err(e).response(&req.id),
    };

    // Restoring over the open workbook swaps the file under the live
    // connection; reopen so subsequent reads see the restored rows.
    if state.workbook_dir.as_deref() == Some(workbook_path.as_path()) {
        match Workbook::open(&workbook_path) {
            Ok(book) => state.book = Some(book),
            Err(e) => {
                state.workbook_dir = None;
                state.book = None;
                return HandlerErr::from(e).response(&req.id);
            }
        }
    }

    ok(
        &req.id,
        json!({
            "bundleFormatDetected": summary.bundle_format_detected,
            "digestVerified": summary.digest_verified,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "backup.exportWorkbookBundle" => Some(handle_export_bundle(state, req)),
        "backup.importWorkbookBundle" => Some(handle_import_bundle(state, req)),
        _ => None,
    }
}
