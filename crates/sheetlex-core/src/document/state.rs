use crate::error::Result;
use sheetlex_engine::engine::{CellRef, Grid};
use sheetlex_engine::tokenizer::TokenizerOptions;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

/// UI-agnostic document state for a sheet.
pub struct Document {
    /// The sheet grid (DashMap is internally Arc-based, clones are cheap)
    pub grid: Grid,
    /// Current file path
    pub file_path: Option<PathBuf>,
    /// Whether the grid has been modified
    pub modified: bool,
    /// Options every formula in this document is tokenized with
    pub options: TokenizerOptions,
    /// Reverse dependency map: cell -> cells that depend on it
    pub dependents: HashMap<CellRef, HashSet<CellRef>>,
}

impl Document {
    /// Create a new document state.
    ///
    /// This constructor is side-effect free: it does not touch the filesystem.
    pub fn new(options: TokenizerOptions) -> Self {
        Document {
            grid: std::sync::Arc::new(dashmap::DashMap::new()),
            file_path: None,
            modified: false,
            options,
            dependents: HashMap::new(),
        }
    }

    /// Create a new document and load a file if provided.
    pub fn with_file(path: Option<PathBuf>, options: TokenizerOptions) -> Result<Self> {
        let mut doc = Self::new(options);
        if let Some(ref p) = path {
            if p.exists() {
                doc.load_file(p)?;
            } else {
                doc.file_path = Some(p.clone());
                doc.modified = false;
            }
        }
        Ok(doc)
    }

    /// Rebuild the reverse dependency map from the grid.
    /// Call this after cells are added, removed, or their formulas change.
    pub(crate) fn rebuild_dependents(&mut self) {
        self.dependents.clear();
        for entry in self.grid.iter() {
            let cell_ref = entry.key();
            for dep in &entry.value().depends_on {
                self.dependents
                    .entry(dep.clone())
                    .or_default()
                    .insert(cell_ref.clone());
            }
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new(TokenizerOptions::default())
    }
}
