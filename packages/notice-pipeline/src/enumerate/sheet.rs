//! Candidate enumeration from spreadsheet rows.
//!
//! Layout: one label column (sparse; a label applies to every following row
//! until the next label) and several slot column pairs `(link, status)`.
//! Each row yields one candidate per slot with a valid absolute link.

use tracing::debug;

use crate::types::candidate::Candidate;

/// Status value that marks a slot as processed (case-insensitive).
pub const PROCESSED_MARK: &str = "x";

/// A `(link, status)` column pair inside a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotColumns {
    /// Slot name (becomes the candidate's `slot`)
    pub name: String,

    /// Zero-based column index of the link cell
    pub link_col: usize,

    /// Zero-based column index of the status cell
    pub status_col: usize,
}

impl SlotColumns {
    pub fn new(name: impl Into<String>, link_col: usize, status_col: usize) -> Self {
        Self {
            name: name.into(),
            link_col,
            status_col,
        }
    }
}

/// Where things live in a sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetLayout {
    /// Sheet (tab) title
    pub sheet: String,

    /// One-based row number of the first data row
    pub first_row: usize,

    /// Zero-based column index of the group label
    pub label_col: usize,

    /// Slot column pairs, in priority order
    pub slots: Vec<SlotColumns>,
}

impl SheetLayout {
    /// Label in column A, data from row 2.
    pub fn new(sheet: impl Into<String>, slots: Vec<SlotColumns>) -> Self {
        Self {
            sheet: sheet.into(),
            first_row: 2,
            label_col: 0,
            slots,
        }
    }

    /// The A1 range covering label and all slot columns, e.g. `Lớp 5!A2:G`.
    pub fn read_range(&self) -> String {
        let last = self
            .slots
            .iter()
            .flat_map(|s| [s.link_col, s.status_col])
            .chain(std::iter::once(self.label_col))
            .max()
            .unwrap_or(self.label_col);
        format!(
            "{}!{}{}:{}",
            self.sheet,
            column_letter(self.label_col),
            self.first_row,
            column_letter(last)
        )
    }

    /// A1 coordinate of a cell, e.g. `Lớp 5!C12`.
    pub fn cell(&self, row_number: usize, col: usize) -> String {
        format!("{}!{}{}", self.sheet, column_letter(col), row_number)
    }
}

/// A slot found while walking the sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetSlot {
    pub candidate: Candidate,

    /// Whether the status cell already carries the processed mark
    pub marked: bool,
}

/// Spreadsheet column letters for a zero-based index (`0 → A`, `26 → AA`).
pub fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Syntactically valid absolute link.
pub fn is_valid_link(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// True when a status cell carries the processed mark.
pub fn is_marked(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case(PROCESSED_MARK)
}

fn cell(row: &[String], col: usize) -> &str {
    row.get(col).map(|s| s.trim()).unwrap_or("")
}

/// Walk rows in order, propagating sparse labels.
///
/// Rows before the first label are ignored. Marked slots are still emitted
/// (with `marked = true`) so that dedup stays a separate stage.
pub fn enumerate_sheet(rows: &[Vec<String>], layout: &SheetLayout) -> Vec<SheetSlot> {
    let mut current_label: Option<String> = None;
    let mut slots = Vec::new();

    for (offset, row) in rows.iter().enumerate() {
        if row.is_empty() {
            continue;
        }
        let label = cell(row, layout.label_col);
        if !label.is_empty() {
            current_label = Some(label.to_string());
        }
        let Some(group) = current_label.as_deref() else {
            continue;
        };

        let row_number = layout.first_row + offset;

        for slot in &layout.slots {
            let link = cell(row, slot.link_col);
            if !is_valid_link(link) {
                continue;
            }

            let identifier = layout.cell(row_number, slot.status_col);
            let marked = is_marked(cell(row, slot.status_col));
            debug!(
                cell = %identifier,
                group = %group,
                slot = %slot.name,
                marked,
                "Found sheet slot"
            );

            let candidate = Candidate::new(
                identifier,
                format!("{} | {} | {}", layout.sheet, group, slot.name),
            )
            .with_detail_locator(link)
            .with_group(group)
            .with_slot(slot.name.clone());

            slots.push(SheetSlot { candidate, marked });
        }
    }

    slots
}
