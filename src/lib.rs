//! docsort — document triage pipeline.
//!
//! Scans a source directory tree, extracts text from office documents
//! (Word, PDF, Excel, PowerPoint), classifies each document against a
//! keyword table, and relocates matched files into category subfolders
//! under a target root. One bad file never aborts the batch.

pub mod categorize;
pub mod discovery;
pub mod extract;
pub mod relocate;
pub mod sorter;
