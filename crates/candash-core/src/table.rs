/// A rendered table row. Identity is the composite key; the row is
/// overwritten in place on every update carrying the same key and never
/// recreated once inserted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayRow {
    pub key: String,
    pub cells: Vec<String>,
    /// Explicit boolean reading of the row's value, captured at format
    /// time so control resolution never re-parses display text.
    pub flag: Option<bool>,
}

/// One keyed update destined for a table.
#[derive(Debug, Clone, PartialEq)]
pub struct RowUpdate {
    pub key: String,
    pub cells: Vec<String>,
    pub flag: Option<bool>,
}

impl RowUpdate {
    pub fn new(key: impl Into<String>, cells: Vec<String>) -> Self {
        Self {
            key: key.into(),
            cells,
            flag: None,
        }
    }

    pub fn with_flag(mut self, flag: Option<bool>) -> Self {
        self.flag = flag;
        self
    }
}

/// An incrementally reconciled table view: at most one row per key, kept
/// sorted by the case-insensitive text of the first cell.
#[derive(Debug, Clone, Default)]
pub struct TableView {
    rows: Vec<DisplayRow>,
}

impl TableView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a batch of updates, then restore sort order. Within a batch
    /// the last write per key wins.
    pub fn apply(&mut self, updates: impl IntoIterator<Item = RowUpdate>) {
        for update in updates {
            self.upsert(update);
        }
        self.rows
            .sort_by(|a, b| sort_cell(a).cmp(&sort_cell(b)));
    }

    fn upsert(&mut self, update: RowUpdate) {
        match self.rows.iter_mut().find(|row| row.key == update.key) {
            Some(row) => {
                row.cells = update.cells;
                row.flag = update.flag;
            }
            None => self.rows.push(DisplayRow {
                key: update.key,
                cells: update.cells,
                flag: update.flag,
            }),
        }
    }

    /// Remove all rows; used only on disconnect.
    pub fn clear(&mut self) {
        self.rows.clear();
    }

    pub fn row(&self, key: &str) -> Option<&DisplayRow> {
        self.rows.iter().find(|row| row.key == key)
    }

    pub fn rows(&self) -> &[DisplayRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn sort_cell(row: &DisplayRow) -> String {
    row.cells
        .first()
        .map(|cell| cell.to_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(key: &str, cells: &[&str]) -> RowUpdate {
        RowUpdate::new(key, cells.iter().map(|c| c.to_string()).collect())
    }

    fn first_cells(table: &TableView) -> Vec<&str> {
        table
            .rows()
            .iter()
            .map(|row| row.cells[0].as_str())
            .collect()
    }

    #[test]
    fn rows_are_sorted_case_insensitively_by_first_cell() {
        let mut table = TableView::new();
        table.apply([
            update("zeta", &["Zeta", "1"]),
            update("alpha", &["alpha", "2"]),
            update("mid", &["Mid", "3"]),
        ]);
        assert_eq!(first_cells(&table), vec!["alpha", "Mid", "Zeta"]);

        for pair in table.rows().windows(2) {
            assert!(pair[0].cells[0].to_lowercase() <= pair[1].cells[0].to_lowercase());
        }
    }

    #[test]
    fn reconciling_twice_is_idempotent() {
        let mut table = TableView::new();
        let batch = [update("can0", &["can0", "3400"]), update("can1", &["can1", "12"])];
        table.apply(batch.clone());
        let snapshot: Vec<DisplayRow> = table.rows().to_vec();

        table.apply(batch);
        assert_eq!(table.rows(), snapshot.as_slice());
    }

    #[test]
    fn same_key_overwrites_in_place() {
        let mut table = TableView::new();
        table.apply([update("can0 logging", &["can0 logging", "true"])]);
        table.apply([update("aaa", &["aaa", "x"])]);
        table.apply([update("can0 logging", &["can0 logging", "false"])]);

        assert_eq!(table.len(), 2);
        let row = table.row("can0 logging").expect("row persists");
        assert_eq!(row.cells[1], "false");
    }

    #[test]
    fn last_write_per_key_wins_within_a_batch() {
        let mut table = TableView::new();
        table.apply([
            update("disk usage", &["disk usage", "42 %"]),
            update("disk usage", &["disk usage", "43 %"]),
        ]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.row("disk usage").unwrap().cells[1], "43 %");
    }

    #[test]
    fn clear_resets_to_empty() {
        let mut table = TableView::new();
        table.apply([update("a", &["a", "1"]), update("b", &["b", "2"])]);
        table.clear();
        assert!(table.is_empty());
        assert!(table.row("a").is_none());
    }

    #[test]
    fn flags_travel_with_updates() {
        let mut table = TableView::new();
        table.apply([update("can1 auto-log", &["can1 auto-log", "true"]).with_flag(Some(true))]);
        assert_eq!(table.row("can1 auto-log").unwrap().flag, Some(true));

        table.apply([update("can1 auto-log", &["can1 auto-log", "2026-01-03_can1"]).with_flag(None)]);
        assert_eq!(table.row("can1 auto-log").unwrap().flag, None);
    }
}
