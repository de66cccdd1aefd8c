//! Document text extraction.
//!
//! Pure Rust extraction with no external system dependencies:
//! - Word: .docx via docx-rs (.doc is recognized but declined)
//! - PDF: per-page text via pdf-extract
//! - Excel: .xlsx, .xls via calamine
//! - PowerPoint: .pptx by reading slide XML out of the OOXML container
//!
//! Dispatch is purely by lowercased file extension. Extensions outside
//! the four supported groups are reported as unsupported, not as errors.

use calamine::{open_workbook, Reader, Xls, Xlsx};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Outcome of an extraction attempt on an existing file.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// Extracted text, non-empty after trimming.
    Text(String),
    /// Supported format but the document yielded no text.
    Empty,
    /// Not a parseable document type (unrecognized extension, or the
    /// legacy .doc binary format which the docx reader cannot handle).
    Unsupported { extension: String },
}

/// Extraction failures. Underlying parser errors are wrapped so callers
/// never see a raw library error.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to extract text from {format} file {}: {reason}", .path.display())]
    Parse {
        format: &'static str,
        path: PathBuf,
        reason: String,
    },
}

/// Check whether an extension (lowercase, no dot) belongs to one of the
/// supported document groups. Note .doc is recognized here even though
/// extraction declines to parse it.
pub fn is_supported(ext: &str) -> bool {
    matches!(
        ext,
        "doc" | "docx" | "pdf" | "xls" | "xlsx" | "ppt" | "pptx"
    )
}

/// Extract text from a supported document file.
///
/// Returns `Extraction::Unsupported` for extensions outside the supported
/// groups, `Extraction::Empty` when a supported document yields only
/// whitespace, and `ExtractError::Parse` when the underlying parser fails.
pub fn extract(path: &Path) -> Result<Extraction, ExtractError> {
    if !path.is_file() {
        return Err(ExtractError::NotFound(path.to_path_buf()));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    let text = match ext.as_str() {
        "doc" => {
            tracing::warn!(
                "[Extract] Legacy .doc format cannot be parsed, convert to .docx: {}",
                path.display()
            );
            return Ok(Extraction::Unsupported { extension: ext });
        }
        "docx" => extract_docx(path)?,
        "pdf" => extract_pdf(path)?,
        "xlsx" => extract_xlsx(path)?,
        "xls" => extract_xls(path)?,
        "ppt" | "pptx" => extract_pptx(path)?,
        _ => {
            tracing::debug!(
                "[Extract] Unsupported file type {:?}: {}",
                ext,
                path.display()
            );
            return Ok(Extraction::Unsupported { extension: ext });
        }
    };

    if text.trim().is_empty() {
        Ok(Extraction::Empty)
    } else {
        Ok(Extraction::Text(text))
    }
}

fn parse_err(format: &'static str, path: &Path, reason: impl ToString) -> ExtractError {
    ExtractError::Parse {
        format,
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

/// Extract every paragraph's text in document order, newline-joined.
/// Table cell paragraphs are included where they appear in the body.
fn extract_docx(path: &Path) -> Result<String, ExtractError> {
    tracing::debug!("[Extract] Extracting DOCX: {}", path.display());

    let bytes = std::fs::read(path).map_err(|e| parse_err("DOCX", path, e))?;
    let doc = docx_rs::read_docx(&bytes).map_err(|e| parse_err("DOCX", path, e))?;

    let mut text = String::new();
    for child in doc.document.children {
        collect_docx_child(&child, &mut text);
    }
    Ok(text)
}

fn collect_docx_child(element: &docx_rs::DocumentChild, out: &mut String) {
    match element {
        docx_rs::DocumentChild::Paragraph(para) => {
            collect_docx_paragraph(para, out);
        }
        docx_rs::DocumentChild::Table(table) => {
            for row in &table.rows {
                let docx_rs::TableChild::TableRow(tr) = row;
                for cell in &tr.cells {
                    let docx_rs::TableRowChild::TableCell(tc) = cell;
                    for content in &tc.children {
                        if let docx_rs::TableCellContent::Paragraph(para) = content {
                            collect_docx_paragraph(para, out);
                        }
                    }
                }
            }
        }
        _ => {}
    }
}

fn collect_docx_paragraph(para: &docx_rs::Paragraph, out: &mut String) {
    for child in &para.children {
        match child {
            docx_rs::ParagraphChild::Run(run) => collect_docx_run(run, out),
            docx_rs::ParagraphChild::Hyperlink(link) => {
                for nested in &link.children {
                    if let docx_rs::ParagraphChild::Run(run) = nested {
                        collect_docx_run(run, out);
                    }
                }
            }
            _ => {}
        }
    }
    out.push('\n');
}

fn collect_docx_run(run: &docx_rs::Run, out: &mut String) {
    for child in &run.children {
        if let docx_rs::RunChild::Text(text) = child {
            out.push_str(&text.text);
        }
    }
}

/// Extract per-page text, newline-joined. A page with no extractable text
/// contributes an empty line so the line count tracks the page count.
///
/// Wrapped in catch_unwind: pdf-extract (via its font handling) can panic
/// on malformed fonts and glyph data.
fn extract_pdf(path: &Path) -> Result<String, ExtractError> {
    tracing::debug!("[Extract] Extracting PDF: {}", path.display());

    let bytes = std::fs::read(path).map_err(|e| parse_err("PDF", path, e))?;

    let pages = match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(&bytes)
    })) {
        Ok(Ok(pages)) => pages,
        Ok(Err(e)) => return Err(parse_err("PDF", path, e)),
        Err(_panic) => {
            tracing::error!(
                "[Extract] PDF extraction panicked for {}, likely malformed font data",
                path.display()
            );
            return Err(parse_err(
                "PDF",
                path,
                "extraction panicked, likely malformed font data",
            ));
        }
    };

    Ok(pages.join("\n"))
}

fn extract_xlsx(path: &Path) -> Result<String, ExtractError> {
    tracing::debug!("[Extract] Extracting XLSX: {}", path.display());
    let mut workbook: Xlsx<_> = open_workbook(path).map_err(|e| parse_err("XLSX", path, e))?;
    Ok(collect_sheets(&mut workbook))
}

fn extract_xls(path: &Path) -> Result<String, ExtractError> {
    tracing::debug!("[Extract] Extracting XLS: {}", path.display());
    let mut workbook: Xls<_> = open_workbook(path).map_err(|e| parse_err("XLS", path, e))?;
    Ok(collect_sheets(&mut workbook))
}

/// Every sheet in workbook order, every row in row order, every non-empty
/// cell stringified as its own line.
fn collect_sheets<R>(workbook: &mut R) -> String
where
    R: Reader<BufReader<File>>,
{
    let mut lines: Vec<String> = Vec::new();
    let sheet_names = workbook.sheet_names().to_owned();

    for sheet_name in &sheet_names {
        if let Ok(range) = workbook.worksheet_range(sheet_name) {
            for row in range.rows() {
                for cell in row {
                    let value = cell.to_string();
                    if !value.is_empty() {
                        lines.push(value);
                    }
                }
            }
        }
    }

    lines.join("\n")
}

static PPTX_TEXT_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<a:t[^>]*>([^<]*)</a:t>").expect("valid text-run pattern"));

/// Extract slide text in slide order. Each `<a:p>` paragraph becomes one
/// line made of its `<a:t>` text runs, which matches how the text reads
/// on the slide. The legacy .ppt binary format is not a zip archive and
/// surfaces here as a parse error.
fn extract_pptx(path: &Path) -> Result<String, ExtractError> {
    tracing::debug!("[Extract] Extracting PPTX: {}", path.display());

    let file = File::open(path).map_err(|e| parse_err("PPTX", path, e))?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| parse_err("PPTX", path, e))?;

    // Slide parts are named ppt/slides/slide<N>.xml; order by N, not by
    // archive entry order.
    let mut slides: Vec<(usize, String)> = archive
        .file_names()
        .filter_map(|name| slide_index(name).map(|index| (index, name.to_string())))
        .collect();
    slides.sort();

    let mut lines: Vec<String> = Vec::new();
    for (_, name) in &slides {
        let mut xml = String::new();
        archive
            .by_name(name)
            .map_err(|e| parse_err("PPTX", path, e))?
            .read_to_string(&mut xml)
            .map_err(|e| parse_err("PPTX", path, e))?;
        collect_slide_text(&xml, &mut lines);
    }

    Ok(lines.join("\n"))
}

fn slide_index(name: &str) -> Option<usize> {
    let digits = name
        .strip_prefix("ppt/slides/slide")?
        .strip_suffix(".xml")?;
    digits.parse().ok()
}

fn collect_slide_text(xml: &str, lines: &mut Vec<String>) {
    for block in xml.split("<a:p>").skip(1) {
        let paragraph = match block.find("</a:p>") {
            Some(end) => &block[..end],
            None => block,
        };
        let mut line = String::new();
        for capture in PPTX_TEXT_RUN.captures_iter(paragraph) {
            line.push_str(&unescape_xml(&capture[1]));
        }
        lines.push(line);
    }
}

fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
