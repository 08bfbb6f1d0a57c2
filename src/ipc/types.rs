use std::path::PathBuf;

use serde::Deserialize;

use crate::store::Workbook;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub workbook_dir: Option<PathBuf>,
    pub book: Option<Workbook>,
}
