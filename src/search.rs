// Free-text roster search: a row matches when any cell contains the term,
// case-insensitively. Order is preserved, nothing is ranked.

pub fn row_matches(term_lower: &str, row: &[String]) -> bool {
    row.iter()
        .any(|cell| cell.to_lowercase().contains(term_lower))
}

pub fn search(term: &str, rows: &[Vec<String>]) -> Vec<Vec<String>> {
    let term_lower = term.to_lowercase();
    rows.iter()
        .filter(|row| row_matches(&term_lower, row))
        .cloned()
        .collect()
}
