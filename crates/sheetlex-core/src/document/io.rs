use super::Document;
use crate::error::{Result, SheetlexError};
use crate::storage::{parse_csv, parse_grd, write_grd};
use std::path::{Path, PathBuf};

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default()
}

impl Document {
    /// Save to current file path.
    /// Returns the path saved to.
    pub fn save_file(&mut self) -> Result<PathBuf> {
        let Some(path) = &self.file_path else {
            return Err(SheetlexError::NoFilePath);
        };

        write_grd(path, &self.grid)?;
        self.modified = false;
        Ok(path.clone())
    }

    /// Save to a new path, which becomes the document's file path.
    pub fn save_file_as(&mut self, path: &Path) -> Result<PathBuf> {
        self.file_path = Some(path.to_path_buf());
        self.save_file()
    }

    /// Load a `.grd` or `.csv` file, replacing the current grid.
    /// Nothing changes when the file fails to parse.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        let grid = match extension_of(path).as_str() {
            "grd" => parse_grd(path, self.options)?,
            "csv" => {
                let grid = std::sync::Arc::new(dashmap::DashMap::new());
                for (cell_ref, cell) in parse_csv(path, 0, 0, self.options)? {
                    grid.insert(cell_ref, cell);
                }
                grid
            }
            other => return Err(SheetlexError::UnsupportedFormat(other.to_string())),
        };

        self.grid = grid;
        self.rebuild_dependents();
        self.file_path = Some(path.to_path_buf());
        self.modified = false;

        let invalid = self.invalid_cells().len();
        if invalid > 0 {
            tracing::warn!(path = %path.display(), invalid, "sheet has formulas that do not tokenize");
        }
        self.warn_circular_references(path);
        Ok(())
    }

    /// Import CSV data starting at a column/row.
    /// Returns the number of cells imported.
    pub fn import_csv(&mut self, path: &Path, start_col: usize, start_row: usize) -> Result<usize> {
        let cells = parse_csv(path, start_col, start_row, self.options)?;
        let count = cells.len();
        for (cell_ref, cell) in cells {
            self.grid.insert(cell_ref, cell);
        }
        if count > 0 {
            self.modified = true;
            self.rebuild_dependents();
            self.warn_circular_references(path);
        }
        Ok(count)
    }

    fn warn_circular_references(&self, path: &Path) {
        for cycle in self.circular_references() {
            let cycle = cycle
                .iter()
                .map(|cell| cell.to_string())
                .collect::<Vec<_>>()
                .join(" -> ");
            tracing::warn!(path = %path.display(), %cycle, "sheet has a circular reference");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetlex_engine::engine::CellRef;
    use sheetlex_engine::tokenizer::TokenizerOptions;

    #[test]
    fn test_save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.grd");

        let mut doc = Document::default();
        doc.set_cell_from_input(CellRef::new(0, 0), "10").unwrap();
        doc.set_cell_from_input(CellRef::new(1, 0), "=A1*2").unwrap();
        doc.set_cell_from_input(CellRef::new(2, 0), "=SUM(A1").unwrap();
        assert!(matches!(doc.save_file(), Err(SheetlexError::NoFilePath)));
        doc.save_file_as(&path).unwrap();
        assert!(!doc.modified);

        let loaded = Document::with_file(Some(path.clone()), TokenizerOptions::default()).unwrap();
        assert_eq!(loaded.file_path.as_deref(), Some(path.as_path()));
        assert_eq!(loaded.dependents_of(&CellRef::new(0, 0)), vec![CellRef::new(1, 0)]);
        assert_eq!(loaded.invalid_cells().len(), 1);
    }

    #[test]
    fn test_load_failure_keeps_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.grd");
        std::fs::write(&path, "A1: 1\nB1: unquoted\n").unwrap();

        let mut doc = Document::default();
        doc.set_cell_from_input(CellRef::new(2, 2), "42").unwrap();
        assert!(matches!(doc.load_file(&path), Err(SheetlexError::Parse { line: 2, .. })));
        assert!(doc.grid.contains_key(&CellRef::new(2, 2)));
        assert!(doc.file_path.is_none());
    }

    #[test]
    fn test_load_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.xlsx");
        std::fs::write(&path, "").unwrap();
        let mut doc = Document::default();
        assert!(matches!(
            doc.load_file(&path),
            Err(SheetlexError::UnsupportedFormat(ext)) if ext == "xlsx"
        ));
    }

    #[test]
    fn test_load_csv_and_import_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(&path, "1,2\n=A1+B1,\"text, with comma\"\n").unwrap();

        let mut doc = Document::default();
        doc.load_file(&path).unwrap();
        assert_eq!(doc.grid.len(), 4);
        assert_eq!(
            doc.dependents_of(&CellRef::new(1, 0)),
            vec![CellRef::new(0, 1)]
        );

        let imported = doc.import_csv(&path, 3, 0).unwrap();
        assert_eq!(imported, 4);
        assert!(doc.modified);
        // Imported formulas keep their references as written
        assert_eq!(
            doc.dependents_of(&CellRef::new(0, 0)),
            vec![CellRef::new(0, 1), CellRef::new(3, 1)]
        );
    }

    #[test]
    fn test_load_keeps_circular_references_and_reports_them() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loop.grd");
        std::fs::write(&path, "A1: =B1\nB1: =A1+1\nC1: =A1\nD1: =D1\n").unwrap();

        let mut doc = Document::default();
        doc.load_file(&path).unwrap();
        assert_eq!(doc.grid.len(), 4);
        let cell = |name: &str| CellRef::from_str(name).unwrap();
        assert_eq!(
            doc.circular_references(),
            vec![
                vec![cell("A1"), cell("B1"), cell("A1")],
                vec![cell("D1"), cell("D1")],
            ]
        );
    }

    #[test]
    fn test_import_csv_reports_circular_references() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("self.csv");
        std::fs::write(&path, "=A1,1\n").unwrap();

        let mut doc = Document::default();
        assert!(doc.circular_references().is_empty());
        assert_eq!(doc.import_csv(&path, 0, 0).unwrap(), 2);
        assert_eq!(
            doc.circular_references(),
            vec![vec![CellRef::new(0, 0), CellRef::new(0, 0)]]
        );
    }

    #[test]
    fn test_with_file_missing_path_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new.grd");
        let doc = Document::with_file(Some(path.clone()), TokenizerOptions::default()).unwrap();
        assert!(doc.grid.is_empty());
        assert_eq!(doc.file_path, Some(path));
    }
}
