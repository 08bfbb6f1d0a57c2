use crate::ipc::helpers::{err, get_optional_str, get_required_str, ok, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::record::objects_from_rows;
use crate::schema::ATTENDANCE;
use crate::store::Workbook;
use chrono::{NaiveDate, Utc};
use serde_json::json;
use uuid::Uuid;

// Roll-call status codes, as submitted by the daily attendance form.
pub const STATUS_CODES: &[&str] = &[
    "present",
    "sick",
    "family_leave",
    "absent",
    "late",
    "representing_school",
    "other",
];

struct RollCallEntry {
    student_name: String,
    status: String,
    remark: String,
}

fn parse_roll_date(raw: &str) -> Result<String, HandlerErr> {
    let t = raw.trim();
    NaiveDate::parse_from_str(t, "%Y-%m-%d")
        .map_err(|_| HandlerErr::validation("date must be YYYY-MM-DD"))?;
    Ok(t.to_string())
}

fn parse_entries(params: &serde_json::Value) -> Result<Vec<RollCallEntry>, HandlerErr> {
    let Some(raw) = params.get("entries").and_then(|v| v.as_array()) else {
        return Err(HandlerErr::bad_params("missing entries"));
    };
    if raw.is_empty() {
        return Err(HandlerErr::validation("entries must not be empty"));
    }
    let mut entries = Vec::with_capacity(raw.len());
    for (i, item) in raw.iter().enumerate() {
        let Some(obj) = item.as_object() else {
            return Err(HandlerErr::bad_params(format!("entry {} must be an object", i)));
        };
        let student_name = obj
            .get("studentName")
            .and_then(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .unwrap_or_default();
        if student_name.is_empty() {
            return Err(HandlerErr::validation(format!(
                "entry {} is missing studentName",
                i
            )));
        }
        let status = obj
            .get("status")
            .and_then(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .unwrap_or_default();
        if !STATUS_CODES.contains(&status.as_str()) {
            return Err(HandlerErr::validation(format!(
                "entry {} has unknown status '{}'",
                i, status
            )));
        }
        let remark = obj
            .get("remark")
            .and_then(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .unwrap_or_default();
        entries.push(RollCallEntry {
            student_name,
            status,
            remark,
        });
    }
    Ok(entries)
}

// One roll-call submission appends one row per student. The whole submission
// is validated up front so a bad entry in the middle never leaves a partial
// day behind. A student may legitimately appear twice for one date (a
// correction resubmitted later); the log keeps both.
fn attendance_record(
    book: &Workbook,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let date = parse_roll_date(&get_required_str(params, "date")?)?;
    let class = get_required_str(params, "class")?.trim().to_string();
    if class.is_empty() {
        return Err(HandlerErr::validation("class must not be empty"));
    }
    let entries = parse_entries(params)?;

    let recorded_at = Utc::now().to_rfc3339();
    let mut appended = 0usize;
    for entry in &entries {
        let cells = vec![
            Uuid::new_v4().to_string(),
            date.clone(),
            class.clone(),
            entry.student_name.clone(),
            entry.status.clone(),
            entry.remark.clone(),
            recorded_at.clone(),
        ];
        book.append_row(&ATTENDANCE, &cells)?;
        appended += 1;
    }

    Ok(json!({
        "appended": appended,
        "date": date,
        "class": class,
    }))
}

fn attendance_list(
    book: &Workbook,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let date = get_optional_str(params, "date").map(|d| d.trim().to_string());
    let class = get_optional_str(params, "class").map(|c| c.trim().to_string());

    let rows = book.load_all(&ATTENDANCE)?;
    let hits: Vec<Vec<String>> = rows
        .into_iter()
        .filter(|row| {
            date.as_ref().map(|d| row[1].trim() == d).unwrap_or(true)
                && class.as_ref().map(|c| row[2].trim() == c).unwrap_or(true)
        })
        .collect();

    Ok(json!({
        "count": hits.len(),
        "entries": objects_from_rows(&ATTENDANCE, &hits),
    }))
}

fn attendance_summary(
    book: &Workbook,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let date = parse_roll_date(&get_required_str(params, "date")?)?;
    let class = get_optional_str(params, "class").map(|c| c.trim().to_string());

    let rows = book.load_all(&ATTENDANCE)?;
    let mut counts = serde_json::Map::new();
    for code in STATUS_CODES {
        counts.insert(code.to_string(), json!(0));
    }
    let mut total = 0usize;
    for row in &rows {
        if row[1].trim() != date {
            continue;
        }
        if let Some(c) = &class {
            if row[2].trim() != *c {
                continue;
            }
        }
        total += 1;
        let status = row[4].trim();
        let slot = counts.entry(status.to_string()).or_insert(json!(0));
        *slot = json!(slot.as_u64().unwrap_or(0) + 1);
    }

    Ok(json!({
        "date": date,
        "class": class,
        "total": total,
        "byStatus": counts,
    }))
}

fn handle_attendance_record(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(book) = state.book.as_ref() else {
        return err(&req.id, "no_workbook", "open a workbook first", None);
    };
    match attendance_record(book, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_attendance_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(book) = state.book.as_ref() else {
        return err(&req.id, "no_workbook", "open a workbook first", None);
    };
    match attendance_list(book, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_attendance_summary(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(book) = state.book.as_ref() else {
        return err(&req.id, "no_workbook", "open a workbook first", None);
    };
    match attendance_summary(book, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "attendance.record" => Some(handle_attendance_record(state, req)),
        "attendance.list" => Some(handle_attendance_list(state, req)),
        "attendance.summary" => Some(handle_attendance_summary(state, req)),
        _ => None,
    }
}
