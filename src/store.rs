use std::path::Path;

use rusqlite::{Connection, OptionalExtension};
use thiserror::Error;

use crate::schema::{SheetSchema, ALL_SHEETS};

pub const WORKBOOK_FILE: &str = "rollbook.sqlite3";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to prepare workbook directory {path}: {source}")]
    Workspace {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to open workbook {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("sheet '{sheet}' header mismatch: expected {expected:?}, found {found:?}")]
    HeaderMismatch {
        sheet: String,
        expected: Vec<String>,
        found: Vec<String>,
    },
    #[error("sheet '{sheet}' read failed: {source}")]
    Read {
        sheet: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("sheet '{sheet}' write failed: {source}")]
    Write {
        sheet: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("sheet '{sheet}' row {row} is not stored as a cell list")]
    Corrupt { sheet: String, row: usize },
    #[error("sheet '{sheet}' has no row {row}")]
    RowOutOfRange { sheet: String, row: usize },
    #[error("sheet '{sheet}' rows are {expected} cells wide, got {found}")]
    WidthMismatch {
        sheet: String,
        expected: usize,
        found: usize,
    },
}

// The workbook is a positional grid, not a relational schema: one row of
// all-text cells per (sheet, row_pos), row_pos 1 is the header. Uniqueness of
// the natural key lives a layer up, in the upsert engine; the grid itself
// enforces nothing.
pub struct Workbook {
    conn: Connection,
}

impl Workbook {
    pub fn open(workbook_dir: &Path) -> Result<Workbook, StoreError> {
        std::fs::create_dir_all(workbook_dir).map_err(|e| StoreError::Workspace {
            path: workbook_dir.to_string_lossy().to_string(),
            source: e,
        })?;
        let db_path = workbook_dir.join(WORKBOOK_FILE);
        let conn = Connection::open(&db_path).map_err(|e| StoreError::Open {
            path: db_path.to_string_lossy().to_string(),
            source: e,
        })?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS sheet_rows(
                sheet TEXT NOT NULL,
                row_pos INTEGER NOT NULL,
                cells TEXT NOT NULL,
                PRIMARY KEY(sheet, row_pos)
            )",
            [],
        )
        .map_err(|e| StoreError::Open {
            path: db_path.to_string_lossy().to_string(),
            source: e,
        })?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_sheet_rows_sheet ON sheet_rows(sheet)",
            [],
        )
        .map_err(|e| StoreError::Open {
            path: db_path.to_string_lossy().to_string(),
            source: e,
        })?;

        let book = Workbook { conn };
        for schema in ALL_SHEETS {
            book.ensure_header(schema)?;
        }
        Ok(book)
    }

    // Seeds the header row for a fresh sheet; verifies it for an existing one.
    // A drifted header means readers would zip cells to the wrong fields, so
    // the open fails instead.
    fn ensure_header(&self, schema: &SheetSchema) -> Result<(), StoreError> {
        let existing: Option<String> = self
            .conn
            .query_row(
                "SELECT cells FROM sheet_rows WHERE sheet = ? AND row_pos = 1",
                [schema.name],
                |r| r.get(0),
            )
            .optional()
            .map_err(|e| StoreError::Read {
                sheet: schema.name.to_string(),
                source: e,
            })?;

        let expected: Vec<String> = schema.columns.iter().map(|c| c.to_string()).collect();
        match existing {
            None => {
                let header = encode_cells(&expected);
                self.conn
                    .execute(
                        "INSERT INTO sheet_rows(sheet, row_pos, cells) VALUES(?, 1, ?)",
                        (schema.name, header),
                    )
                    .map_err(|e| StoreError::Write {
                        sheet: schema.name.to_string(),
                        source: e,
                    })?;
                Ok(())
            }
            Some(text) => {
                let found = decode_cells(&text).ok_or(StoreError::Corrupt {
                    sheet: schema.name.to_string(),
                    row: 1,
                })?;
                if found != expected {
                    return Err(StoreError::HeaderMismatch {
                        sheet: schema.name.to_string(),
                        expected,
                        found,
                    });
                }
                Ok(())
            }
        }
    }

    // All data rows below the header, each padded or truncated to the sheet
    // width. Cells stay text; nothing here parses numbers.
    pub fn load_all(&self, schema: &SheetSchema) -> Result<Vec<Vec<String>>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT row_pos, cells FROM sheet_rows
                 WHERE sheet = ? AND row_pos > 1
                 ORDER BY row_pos",
            )
            .map_err(|e| StoreError::Read {
                sheet: schema.name.to_string(),
                source: e,
            })?;
        let raw = stmt
            .query_map([schema.name], |r| {
                Ok((r.get::<_, i64>(0)?, r.get::<_, String>(1)?))
            })
            .and_then(|it| it.collect::<Result<Vec<_>, _>>())
            .map_err(|e| StoreError::Read {
                sheet: schema.name.to_string(),
                source: e,
            })?;

        let mut rows = Vec::with_capacity(raw.len());
        for (row_pos, text) in raw {
            let cells = decode_cells(&text).ok_or(StoreError::Corrupt {
                sheet: schema.name.to_string(),
                row: row_pos as usize,
            })?;
            rows.push(normalize_width(cells, schema.width()));
        }
        Ok(rows)
    }

    // Grid rows including the header.
    pub fn row_count(&self, schema: &SheetSchema) -> Result<usize, StoreError> {
        self.conn
            .query_row(
                "SELECT COALESCE(MAX(row_pos), 0) FROM sheet_rows WHERE sheet = ?",
                [schema.name],
                |r| r.get::<_, i64>(0),
            )
            .map(|n| n as usize)
            .map_err(|e| StoreError::Read {
                sheet: schema.name.to_string(),
                source: e,
            })
    }

    // Appends one row at the end; returns its 1-based grid position.
    pub fn append_row(
        &self,
        schema: &SheetSchema,
        cells: &[String],
    ) -> Result<usize, StoreError> {
        self.check_width(schema, cells)?;
        let next = self.row_count(schema)? + 1;
        self.conn
            .execute(
                "INSERT INTO sheet_rows(sheet, row_pos, cells) VALUES(?, ?, ?)",
                (schema.name, next as i64, encode_cells(cells)),
            )
            .map_err(|e| StoreError::Write {
                sheet: schema.name.to_string(),
                source: e,
            })?;
        Ok(next)
    }

    // Replaces an entire existing row. `row` is the 1-based grid position; the
    // header (row 1) is never a valid target.
    pub fn overwrite_row(
        &self,
        schema: &SheetSchema,
        row: usize,
        cells: &[String],
    ) -> Result<(), StoreError> {
        self.check_width(schema, cells)?;
        if row < 2 {
            return Err(StoreError::RowOutOfRange {
                sheet: schema.name.to_string(),
                row,
            });
        }
        let updated = self
            .conn
            .execute(
                "UPDATE sheet_rows SET cells = ? WHERE sheet = ? AND row_pos = ?",
                (encode_cells(cells), schema.name, row as i64),
            )
            .map_err(|e| StoreError::Write {
                sheet: schema.name.to_string(),
                source: e,
            })?;
        if updated == 0 {
            return Err(StoreError::RowOutOfRange {
                sheet: schema.name.to_string(),
                row,
            });
        }
        Ok(())
    }

    fn check_width(&self, schema: &SheetSchema, cells: &[String]) -> Result<(), StoreError> {
        if cells.len() != schema.width() {
            return Err(StoreError::WidthMismatch {
                sheet: schema.name.to_string(),
                expected: schema.width(),
                found: cells.len(),
            });
        }
        Ok(())
    }
}

fn encode_cells(cells: &[String]) -> String {
    // Vec<String> always serializes.
    serde_json::to_string(cells).unwrap_or_else(|_| "[]".to_string())
}

fn decode_cells(text: &str) -> Option<Vec<String>> {
    serde_json::from_str::<Vec<String>>(text).ok()
}

fn normalize_width(mut cells: Vec<String>, width: usize) -> Vec<String> {
    if cells.len() < width {
        cells.resize(width, String::new());
    } else if cells.len() > width {
        cells.truncate(width);
    }
    cells
}
