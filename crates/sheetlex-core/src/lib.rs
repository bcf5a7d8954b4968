//! sheetlex-core - UI-agnostic sheet model + storage.

pub mod document;
pub mod error;
pub mod storage;

pub use document::Document;
pub use error::{Result, SheetlexError};

pub use sheetlex_engine::engine::CellRef;
