//! Conversion of raw price exports into the processed pipe-delimited format.
//!
//! Raw exports use tabs or pipes between cells and month-only dates such as
//! `Jul 2025`; processed files are pipe-delimited with `YYYY-MM-01` dates.

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    pub content: String,
    pub rows: usize,
    pub skipped: usize,
}

fn split_cells(line: &str) -> Vec<&str> {
    line.split(['\t', '|']).map(str::trim).collect()
}

/// `Jul 2025` becomes `2025-07-01`; anything else is returned unchanged.
pub fn normalize_month_date(raw: &str) -> String {
    let parts: Vec<&str> = raw.split_whitespace().collect();
    if let [month, year] = parts.as_slice() {
        if let Some(idx) = MONTHS.iter().position(|m| m == month) {
            return format!("{}-{:02}-01", year, idx + 1);
        }
    }
    raw.to_string()
}

/// Converts one raw export. Rows whose cell count differs from the header
/// are skipped. Returns `None` for an input with no lines at all.
pub fn convert_raw(raw: &str) -> Option<Conversion> {
    let mut lines = raw.lines().filter(|l| !l.is_empty());
    let header = split_cells(lines.next()?);
    let width = header.len();

    let mut out = vec![header.join("|")];
    let mut skipped = 0;
    for line in lines {
        let mut cells: Vec<String> = split_cells(line).into_iter().map(String::from).collect();
        if cells.len() != width {
            skipped += 1;
            continue;
        }
        cells[0] = normalize_month_date(&cells[0]);
        out.push(cells.join("|"));
    }

    Some(Conversion {
        rows: out.len() - 1,
        content: out.join("\n"),
        skipped,
    })
}
