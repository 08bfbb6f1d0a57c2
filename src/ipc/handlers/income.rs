use crate::ipc::helpers::{err, get_record_object, get_search_term, ok, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::record::{cells_from_object, objects_from_rows};
use crate::schema::INCOME;
use crate::search;
use crate::store::Workbook;
use crate::upsert::upsert_record;
use serde_json::json;

fn income_list(book: &Workbook) -> Result<serde_json::Value, HandlerErr> {
    let rows = book.load_all(&INCOME)?;
    Ok(json!({
        "count": rows.len(),
        "records": objects_from_rows(&INCOME, &rows),
    }))
}

fn income_upsert(
    book: &Workbook,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let record = get_record_object(params)?;
    let cells = cells_from_object(&INCOME, record)?;
    // student_name is column 1; the key column is checked by the engine.
    if cells[1].trim().is_empty() {
        return Err(HandlerErr::validation("student name must not be empty"));
    }
    let outcome = upsert_record(book, &INCOME, cells)?;
    Ok(json!({
        "outcome": outcome.label(),
        "row": outcome.row(),
    }))
}

fn income_search(
    book: &Workbook,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let term = get_search_term(params)?;
    let rows = book.load_all(&INCOME)?;
    let hits = search::search(&term, &rows);
    Ok(json!({
        "count": hits.len(),
        "records": objects_from_rows(&INCOME, &hits),
    }))
}

fn parse_threshold(params: &serde_json::Value) -> Result<f64, HandlerErr> {
    let raw = params
        .get("thresholdRm")
        .ok_or_else(|| HandlerErr::bad_params("missing thresholdRm"))?;
    let value = match raw {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match value {
        Some(v) if v >= 0.0 => Ok(v),
        _ => Err(HandlerErr::validation(
            "thresholdRm must be a non-negative number",
        )),
    }
}

// Subsidy shortlist. Income cells are text on the sheet; they are parsed here
// on read only, and the stored text is never rewritten. Records whose income
// does not parse are reported, not dropped, so the operator can fix them.
fn income_eligibility(
    book: &Workbook,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let threshold = parse_threshold(params)?;
    let rows = book.load_all(&INCOME)?;

    let mut eligible: Vec<Vec<String>> = Vec::new();
    let mut unparsed: Vec<Vec<String>> = Vec::new();
    for row in rows {
        match row[4].trim().parse::<f64>() {
            Ok(amount) if amount <= threshold => eligible.push(row),
            Ok(_) => {}
            Err(_) => unparsed.push(row),
        }
    }

    Ok(json!({
        "thresholdRm": threshold,
        "eligibleCount": eligible.len(),
        "eligible": objects_from_rows(&INCOME, &eligible),
        "unparsed": objects_from_rows(&INCOME, &unparsed),
    }))
}

fn handle_income_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(book) = state.book.as_ref() else {
        return err(&req.id, "no_workbook", "open a workbook first", None);
    };
    match income_list(book) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_income_upsert(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(book) = state.book.as_ref() else {
        return err(&req.id, "no_workbook", "open a workbook first", None);
    };
    match income_upsert(book, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_income_search(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(book) = state.book.as_ref() else {
        return err(&req.id, "no_workbook", "open a workbook first", None);
    };
    match income_search(book, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_income_eligibility(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(book) = state.book.as_ref() else {
        return err(&req.id, "no_workbook", "open a workbook first", None);
    };
    match income_eligibility(book, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "income.list" => Some(handle_income_list(state, req)),
        "income.upsert" => Some(handle_income_upsert(state, req)),
        "income.search" => Some(handle_income_search(state, req)),
        "income.eligibility" => Some(handle_income_eligibility(state, req)),
        _ => None,
    }
}
