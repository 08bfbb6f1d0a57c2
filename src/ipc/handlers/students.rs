use crate::ipc::helpers::{err, get_record_object, get_search_term, ok, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::record::{cells_from_object, objects_from_rows};
use crate::schema::STUDENTS;
use crate::search;
use crate::store::Workbook;
use crate::upsert::upsert_record;
use serde_json::json;
use std::collections::BTreeMap;

fn students_list(book: &Workbook) -> Result<serde_json::Value, HandlerErr> {
    let rows = book.load_all(&STUDENTS)?;
    Ok(json!({
        "count": rows.len(),
        "students": objects_from_rows(&STUDENTS, &rows),
    }))
}

fn students_upsert(
    book: &Workbook,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let record = get_record_object(params)?;
    let cells = cells_from_object(&STUDENTS, record)?;
    // Name is column 0. The key itself is checked inside the upsert engine.
    if cells[0].trim().is_empty() {
        return Err(HandlerErr::validation("student name must not be empty"));
    }
    let outcome = upsert_record(book, &STUDENTS, cells)?;
    Ok(json!({
        "outcome": outcome.label(),
        "row": outcome.row(),
    }))
}

fn students_search(
    book: &Workbook,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let term = get_search_term(params)?;
    let rows = book.load_all(&STUDENTS)?;
    let hits = search::search(&term, &rows);
    Ok(json!({
        "count": hits.len(),
        "students": objects_from_rows(&STUDENTS, &hits),
    }))
}

fn students_metrics(book: &Workbook) -> Result<serde_json::Value, HandlerErr> {
    let rows = book.load_all(&STUDENTS)?;
    let mut by_class: BTreeMap<String, usize> = BTreeMap::new();
    for row in &rows {
        let class = if row[1].trim().is_empty() {
            "(unassigned)".to_string()
        } else {
            row[1].trim().to_string()
        };
        *by_class.entry(class).or_insert(0) += 1;
    }
    Ok(json!({
        "total": rows.len(),
        "byClass": by_class,
    }))
}

fn handle_students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(book) = state.book.as_ref() else {
        return err(&req.id, "no_workbook", "open a workbook first", None);
    };
    match students_list(book) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_students_upsert(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(book) = state.book.as_ref() else {
        return err(&req.id, "no_workbook", "open a workbook first", None);
    };
    match students_upsert(book, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_students_search(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(book) = state.book.as_ref() else {
        return err(&req.id, "no_workbook", "open a workbook first", None);
    };
    match students_search(book, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_students_metrics(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(book) = state.book.as_ref() else {
        return err(&req.id, "no_workbook", "open a workbook first", None);
    };
    match students_metrics(book) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_students_list(state, req)),
        "students.upsert" => Some(handle_students_upsert(state, req)),
        "students.search" => Some(handle_students_search(state, req)),
        "students.metrics" => Some(handle_students_metrics(state, req)),
        _ => None,
    }
}
