use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{LedgerError, Result};

// ---------------------------------------------------------------------------
// PDF text layer
// ---------------------------------------------------------------------------

/// Extract the native text layer of each page, in page order. A page whose
/// extraction fails contributes an empty string so page positions are kept.
pub fn native_page_texts(path: &Path) -> Result<Vec<String>> {
    let doc = lopdf::Document::load(path).map_err(|e| LedgerError::Pdf(e.to_string()))?;
    let pages = doc.get_pages();
    let mut texts = Vec::with_capacity(pages.len());
    for page_num in pages.keys() {
        texts.push(doc.extract_text(&[*page_num]).unwrap_or_default());
    }
    Ok(texts)
}

// ---------------------------------------------------------------------------
// OCR seam
// ---------------------------------------------------------------------------

/// Recognizes text from a document's rasterized pages. Only invoked when the
/// native text layer is blank; implementations are expected to be expensive.
pub trait PageOcr {
    fn recognize_pages(&self, path: &Path) -> Result<Vec<String>>;
}

/// OCR stand-in used when the `ocr` feature is disabled: recognizes nothing,
/// so a text-less PDF degrades to zero transactions.
pub struct NoOcr;

impl PageOcr for NoOcr {
    fn recognize_pages(&self, _path: &Path) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

#[cfg(feature = "ocr")]
pub struct TesseractOcr;

#[cfg(feature = "ocr")]
impl PageOcr for TesseractOcr {
    fn recognize_pages(&self, path: &Path) -> Result<Vec<String>> {
        use pdfium_render::prelude::*;

        let pdfium = Pdfium::new(
            Pdfium::bind_to_system_library().map_err(|e| LedgerError::Ocr(e.to_string()))?,
        );
        let document = pdfium
            .load_pdf_from_file(path, None)
            .map_err(|e| LedgerError::Ocr(e.to_string()))?;
        let config = PdfRenderConfig::new().set_target_width(2000);

        let mut texts = Vec::new();
        for page in document.pages().iter() {
            let bitmap = page
                .render_with_config(&config)
                .map_err(|e| LedgerError::Ocr(e.to_string()))?;
            let image = bitmap.as_image();
            let ocr_input = rusty_tesseract::Image::from_dynamic_image(&image)
                .map_err(|e| LedgerError::Ocr(e.to_string()))?;
            let args = rusty_tesseract::Args::default();
            let text = rusty_tesseract::image_to_string(&ocr_input, &args)
                .map_err(|e| LedgerError::Ocr(e.to_string()))?;
            texts.push(text);
        }
        Ok(texts)
    }
}

/// Full document text: the native layer when any page has one, otherwise the
/// OCR fallback. OCR never runs when the text layer is populated.
pub fn extract_document_text(path: &Path, ocr: &dyn PageOcr) -> Result<String> {
    let pages = native_page_texts(path)?;
    resolve_text(pages, || ocr.recognize_pages(path))
}

fn resolve_text(
    pages: Vec<String>,
    ocr_fallback: impl FnOnce() -> Result<Vec<String>>,
) -> Result<String> {
    let native = pages.join("\n");
    if !native.trim().is_empty() {
        return Ok(native);
    }
    Ok(ocr_fallback()?.join("\n"))
}

// ---------------------------------------------------------------------------
// Statement line parser
// ---------------------------------------------------------------------------

/// A (date, description, amount) triple recovered from one statement line.
/// The date is kept as scanned (`MM/DD`); canonicalization resolves it.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementLine {
    pub date: String,
    pub description: String,
    pub amount: f64,
}

/// Outcome of scanning a document's text. `matched_lines` counts lines the
/// pattern hit regardless of whether the amount survived numeric parsing, so
/// callers can tell "no transactions found" from "found but all invalid".
#[derive(Debug, Default)]
pub struct ScanResult {
    pub rows: Vec<StatementLine>,
    pub matched_lines: usize,
    pub skipped: usize,
}

impl ScanResult {
    pub fn found_nothing(&self) -> bool {
        self.matched_lines == 0
    }
}

fn line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(\d{2}/\d{2})\s+(.+?)\s+(-?\$?\d{1,3}(?:,\d{3})*(?:\.\d{2})?)")
            .expect("statement line pattern is valid")
    })
}

/// Scan raw statement text line by line for `MM/DD <description> <amount>`.
/// Output order follows line order. Lines that do not match contribute
/// nothing; matched lines whose amount is not numeric are dropped and
/// counted as skipped.
pub fn scan_statement_text(text: &str) -> ScanResult {
    let mut result = ScanResult::default();
    for line in text.lines() {
        let Some(caps) = line_pattern().captures(line) else {
            continue;
        };
        result.matched_lines += 1;
        let raw_amount = caps[3].replace(['$', ','], "");
        let Ok(amount) = raw_amount.parse::<f64>() else {
            result.skipped += 1;
            continue;
        };
        result.rows.push(StatementLine {
            date: caps[1].to_string(),
            description: caps[2].trim().to_string(),
            amount,
        });
    }
    result
}
