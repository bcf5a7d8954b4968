//! sheetlex_engine - Excel formula tokenizer + reference tooling.

pub mod engine;
pub mod tokenizer;
