use crate::export::{render_profile, write_bulk_profiles, write_profile, ProfileDocument};
use crate::ipc::helpers::{err, get_required_str, ok, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::record::object_from_cells;
use crate::schema::{INCOME, STUDENTS};
use crate::store::Workbook;
use crate::upsert::normalize_key;
use serde_json::json;
use std::path::PathBuf;

fn export_err(e: anyhow::Error) -> HandlerErr {
    HandlerErr {
        code: "export_failed",
        message: format!("{:#}", e),
        details: None,
    }
}

fn find_by_key<'a>(
    rows: &'a [Vec<String>],
    key_col: usize,
    key: &str,
) -> Option<&'a Vec<String>> {
    rows.iter().find(|row| normalize_key(&row[key_col]) == key)
}

fn income_record_for(book: &Workbook, key: &str) -> Result<Option<serde_json::Value>, HandlerErr> {
    let rows = book.load_all(&INCOME)?;
    Ok(find_by_key(&rows, 0, key).map(|row| object_from_cells(&INCOME, row)))
}

fn export_profile(
    book: &Workbook,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let key = normalize_key(&get_required_str(params, "mykid")?);
    if key.is_empty() {
        return Err(HandlerErr::validation("mykid must not be empty"));
    }
    let out_path = PathBuf::from(get_required_str(params, "outPath")?);

    let students = book.load_all(&STUDENTS)?;
    let Some(row) = find_by_key(&students, 2, &key) else {
        return Err(HandlerErr::not_found(format!("no student with mykid {}", key)));
    };
    let student = object_from_cells(&STUDENTS, row);
    let income = income_record_for(book, &key)?;

    let doc = render_profile(&student, income.as_ref());
    let summary = write_profile(&doc, &out_path).map_err(export_err)?;
    Ok(json!({
        "outPath": out_path.to_string_lossy(),
        "fileName": doc.file_name,
        "byteCount": summary.byte_count,
        "sha256": summary.sha256,
    }))
}

fn export_bulk_profiles(
    book: &Workbook,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let out_path = PathBuf::from(get_required_str(params, "outPath")?);

    let students = book.load_all(&STUDENTS)?;
    let income_rows = book.load_all(&INCOME)?;

    let mut docs: Vec<ProfileDocument> = Vec::with_capacity(students.len());
    for row in &students {
        let student = object_from_cells(&STUDENTS, row);
        let key = normalize_key(&row[2]);
        let income = find_by_key(&income_rows, 0, &key).map(|r| object_from_cells(&INCOME, r));
        docs.push(render_profile(&student, income.as_ref()));
    }

    let summary = write_bulk_profiles(&docs, &out_path).map_err(export_err)?;
    Ok(json!({
        "outPath": out_path.to_string_lossy(),
        "format": summary.format,
        "profileCount": summary.profile_count,
    }))
}

fn handle_export_profile(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(book) = state.book.as_ref() else {
        return err(&req.id, "no_workbook", "open a workbook first", None);
    };
    match export_profile(book, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_export_bulk_profiles(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(book) = state.book.as_ref() else {
        return err(&req.id, "no_workbook", "open a workbook first", None);
    };
    match export_bulk_profiles(book, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "export.profile" => Some(handle_export_profile(state, req)),
        "export.bulkProfiles" => Some(handle_export_bulk_profiles(state, req)),
        _ => None,
    }
}
