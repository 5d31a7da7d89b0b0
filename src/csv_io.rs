// 📄 Catalog CSV - Semicolon-separated article lists as the downstream catalog imports them
// Same layout for the downstream snapshot (input) and the converted file (output).

use crate::article::{round2, ArticleRecord};
use crate::data_quality::{parse_number_or_zero, truncate_field};
use crate::notifications::Notifications;
use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

pub const DELIMITER: u8 = b';';

/// Availability marker for articles that cannot be ordered
pub const UNAVAILABLE_MARKER: &str = "x";

pub const HEADER: [&str; 14] = [
    "Status",
    "Order number",
    "Name",
    "Note",
    "Manufacturer",
    "Origin",
    "Unit",
    "Price (net)",
    "VAT",
    "Deposit",
    "Unit quantity",
    "Scale quantity",
    "Scale price",
    "Category",
];

// Column positions
const COL_STATUS: usize = 0;
const COL_ORDER_NUMBER: usize = 1;
const COL_NAME: usize = 2;
const COL_NOTE: usize = 3;
const COL_MANUFACTURER: usize = 4;
const COL_ORIGIN: usize = 5;
const COL_UNIT: usize = 6;
const COL_PRICE: usize = 7;
const COL_VAT: usize = 8;
const COL_DEPOSIT: usize = 9;
const COL_UNIT_QUANTITY: usize = 10;
const COL_CATEGORY: usize = 13;

// ============================================================================
// CATALOG FORM
// ============================================================================

/// Bring an article into the exact shape a write/read cycle gives it
///
/// Text is trimmed, truncatable fields are shortened, money is rounded to
/// cents. Reconciliation compares against catalog exports, so articles must be
/// in this form before they are compared or stored as a snapshot.
pub fn to_catalog_form(article: &mut ArticleRecord, notes: &mut Notifications) {
    let context = format!("Article {} \"{}\"", article.order_number.trim(), article.name.trim());

    article.name = article.name.trim().to_string();
    article.unit = article.unit.trim().to_string();
    article.order_number = truncate_field(article.order_number.trim(), "order number", &context, notes);
    article.note = truncate_field(article.note.trim(), "note", &context, notes);
    article.manufacturer = truncate_field(article.manufacturer.trim(), "manufacturer", &context, notes);
    article.origin = truncate_field(article.origin.trim(), "origin", &context, notes);
    article.category = truncate_field(article.category.trim(), "category", &context, notes);

    article.price_net = round2(article.price_net);
    article.vat = round2(article.vat);
    article.deposit = round2(article.deposit);
}

// ============================================================================
// READING
// ============================================================================

/// Read a catalog CSV file
pub fn read_catalog(path: &Path, notes: &mut Notifications) -> Result<Vec<ArticleRecord>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open catalog file: {}", path.display()))?;
    read_catalog_from(file, notes)
        .with_context(|| format!("Failed to read catalog file: {}", path.display()))
}

/// Read catalog rows from any reader; the first row is the header
pub fn read_catalog_from<R: Read>(reader: R, notes: &mut Notifications) -> Result<Vec<ArticleRecord>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut articles = Vec::new();

    for (line_num, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to parse CSV line {}", line_num + 2))?;

        // Blank lines at the end of hand-edited exports
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }

        articles.push(parse_row(&record, line_num + 2, notes));
    }

    tracing::debug!(articles = articles.len(), "catalog CSV read");
    Ok(articles)
}

fn parse_row(record: &StringRecord, line: usize, notes: &mut Notifications) -> ArticleRecord {
    let field = |idx: usize| record.get(idx).unwrap_or("").trim().to_string();
    let order_number = field(COL_ORDER_NUMBER);
    let context = format!("Line {} ({})", line, order_number);

    let mut article = ArticleRecord::new(order_number, field(COL_NAME));
    article.available = field(COL_STATUS) != UNAVAILABLE_MARKER;
    article.note = field(COL_NOTE);
    article.manufacturer = field(COL_MANUFACTURER);
    article.origin = field(COL_ORIGIN);
    article.unit = field(COL_UNIT);
    article.category = field(COL_CATEGORY);
    article.price_net = parse_number_or_zero(&field(COL_PRICE), "price", &context, notes);
    article.vat = parse_number_or_zero(&field(COL_VAT), "VAT", &context, notes);
    article.deposit = parse_number_or_zero(&field(COL_DEPOSIT), "deposit", &context, notes);

    let quantity = parse_number_or_zero(&field(COL_UNIT_QUANTITY), "unit quantity", &context, notes);
    article.unit_quantity = if quantity >= 1.0 { quantity.round() as u32 } else { 1 };

    article
}

// ============================================================================
// WRITING
// ============================================================================

/// Write the converted catalog; returns the number of rows written
pub fn write_catalog(path: &Path, articles: &[ArticleRecord], notes: &mut Notifications) -> Result<usize> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create catalog file: {}", path.display()))?;
    write_catalog_to(file, articles, notes)
        .with_context(|| format!("Failed to write catalog file: {}", path.display()))
}

/// Write catalog rows to any writer, ignored articles are skipped
pub fn write_catalog_to<W: Write>(
    writer: W,
    articles: &[ArticleRecord],
    notes: &mut Notifications,
) -> Result<usize> {
    let mut writer = WriterBuilder::new().delimiter(DELIMITER).from_writer(writer);
    writer.write_record(HEADER)?;

    let mut written = 0;
    for article in articles.iter().filter(|a| !a.ignore) {
        writer.write_record(format_row(article, notes))?;
        written += 1;
    }

    writer.flush()?;
    Ok(written)
}

fn format_row(article: &ArticleRecord, notes: &mut Notifications) -> Vec<String> {
    let context = format!("Article {} \"{}\"", article.order_number, article.name);
    let status = if article.available { "" } else { UNAVAILABLE_MARKER };

    vec![
        status.to_string(),
        truncate_field(&article.order_number, "order number", &context, notes),
        article.name.clone(),
        truncate_field(&article.note, "note", &context, notes),
        truncate_field(&article.manufacturer, "manufacturer", &context, notes),
        truncate_field(&article.origin, "origin", &context, notes),
        article.unit.clone(),
        format_number(article.price_net),
        format_number(article.vat),
        format_number(article.deposit),
        article.unit_quantity.to_string(),
        String::new(),
        String::new(),
        truncate_field(&article.category, "category", &context, notes),
    ]
}

fn format_number(value: f64) -> String {
    format!("{}", round2(value))
}
