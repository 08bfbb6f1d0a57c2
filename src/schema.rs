// Column order is the contract between every reader and writer of a sheet.
// Schemas are compiled in so a workbook whose header drifted from the code
// fails at open instead of silently misaligning fields.

#[derive(Debug, Clone, Copy)]
pub struct SheetSchema {
    pub name: &'static str,
    pub columns: &'static [&'static str],
    // Column index of the natural key, for sheets that have one.
    pub key_column: Option<usize>,
}

impl SheetSchema {
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| *c == column)
    }
}

pub const STUDENTS: SheetSchema = SheetSchema {
    name: "students",
    columns: &["name", "class", "mykid", "gender", "guardian_phone"],
    key_column: Some(2),
};

pub const INCOME: SheetSchema = SheetSchema {
    name: "income",
    columns: &[
        "mykid",
        "student_name",
        "guardian_name",
        "occupation",
        "monthly_income_rm",
        "household_size",
    ],
    key_column: Some(0),
};

pub const ATTENDANCE: SheetSchema = SheetSchema {
    name: "attendance",
    columns: &[
        "entry_id",
        "date",
        "class",
        "student_name",
        "status",
        "remark",
        "recorded_at",
    ],
    key_column: None,
};

pub const ALL_SHEETS: &[SheetSchema] = &[STUDENTS, INCOME, ATTENDANCE];
