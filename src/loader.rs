// 📂 Loader - CSV → Normalized Dataset
// Header renaming, date/amount coercion, estado derivation, per-path memoization

use anyhow::{anyhow, bail, Context, Result};
use chrono::{NaiveDateTime, NaiveTime};
use csv::{ReaderBuilder, StringRecord};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::dataset::{
    canonical_name, canonicalize_headers, source_name, Dataset, Estado, Transaction,
};

/// Accepted timestamp layouts for the `fecha` column; a bare date gets
/// midnight attached.
const FECHA_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];
const FECHA_DATE_FORMAT: &str = "%Y-%m-%d";

/// Canonical columns the loader cannot run without
const REQUIRED_COLUMNS: [&str; 16] = [
    "transaction_id",
    "customer_id",
    "monto",
    "fecha",
    "metodo_pago",
    "categoria_producto",
    "cantidad",
    "edad_cliente",
    "ubicacion",
    "dispositivo_usado",
    "ip_address",
    "direccion_envio",
    "direccion_facturacion",
    "es_fraudulenta",
    "antiguedad_cuenta_dias",
    "hora_transaccion",
];

const PREVIEW_ROWS: usize = 5;

// ============================================================================
// COLUMN INDEX
// ============================================================================

/// Position of every canonical column in the (renamed) header row
struct ColumnIndex {
    positions: HashMap<&'static str, usize>,
}

impl ColumnIndex {
    /// Resolve every required column, reporting all misses at once
    fn build(columns: &[String]) -> Result<Self> {
        let mut positions = HashMap::new();
        let mut missing = Vec::new();

        for canonical in REQUIRED_COLUMNS {
            match columns.iter().position(|c| c == canonical) {
                Some(pos) => {
                    positions.insert(canonical, pos);
                }
                None => missing.push(format!(
                    "{} (source header \"{}\")",
                    canonical,
                    source_name(canonical).unwrap_or("?")
                )),
            }
        }

        if !missing.is_empty() {
            bail!("missing required column(s): {}", missing.join(", "));
        }

        Ok(ColumnIndex { positions })
    }

    fn field<'a>(&self, record: &'a StringRecord, canonical: &str) -> &'a str {
        self.positions
            .get(canonical)
            .and_then(|&pos| record.get(pos))
            .unwrap_or("")
    }
}

// ============================================================================
// CELL PARSING (fail loudly, naming the offending row)
// ============================================================================

fn parse_fecha(raw: &str, line: usize) -> Result<NaiveDateTime> {
    let value = raw.trim();

    for format in FECHA_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(dt);
        }
    }

    if let Ok(date) = chrono::NaiveDate::parse_from_str(value, FECHA_DATE_FORMAT) {
        return Ok(date.and_time(NaiveTime::MIN));
    }

    Err(anyhow!(
        "line {}: column 'fecha': invalid date value \"{}\"",
        line,
        raw
    ))
}

fn parse_f64(raw: &str, line: usize, column: &str) -> Result<f64> {
    // parse::<f64> happily yields NaN and the infinities; a corrupt cell
    // must not reach the metrics as a "number"
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| {
            anyhow!(
                "line {}: column '{}': invalid numeric value \"{}\"",
                line,
                column,
                raw
            )
        })
}

fn parse_i64(raw: &str, line: usize, column: &str) -> Result<i64> {
    raw.trim().parse::<i64>().map_err(|_| {
        anyhow!(
            "line {}: column '{}': invalid integer value \"{}\"",
            line,
            column,
            raw
        )
    })
}

// ============================================================================
// LOAD + NORMALIZE
// ============================================================================

/// Load the transaction CSV and produce the normalized table.
///
/// A missing file is not an error: it yields an empty dataset plus a logged
/// diagnostic, and callers must treat "empty" as cannot-proceed. Malformed
/// cells, on the other hand, fail loudly with the offending line.
pub fn load_dataset(csv_path: &Path) -> Result<Dataset> {
    if !csv_path.exists() {
        warn!(
            "input file '{}' was not found - returning an empty dataset",
            csv_path.display()
        );
        return Ok(Dataset::empty());
    }

    let file = File::open(csv_path)
        .with_context(|| format!("Failed to open CSV file: {}", csv_path.display()))?;

    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);

    let headers = reader
        .headers()
        .context("Failed to read CSV header row")?
        .clone();
    let raw_headers: Vec<&str> = headers.iter().collect();

    for header in &raw_headers {
        if canonical_name(header).is_none() {
            warn!("unrecognized column header \"{}\" passed through unchanged", header);
        }
    }

    let mut columns = canonicalize_headers(&raw_headers);
    let index = ColumnIndex::build(&columns)?;

    let mut transactions = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let line = i + 2; // 1-indexed + header row
        let record = result
            .with_context(|| format!("Failed to parse CSV line {} in {}", line, csv_path.display()))?;

        transactions.push(parse_row(&record, &index, line)?);
    }

    // The derived column joins the table alongside the renamed originals
    columns.push("estado".to_string());

    info!(
        "loaded {} transactions from {}",
        transactions.len(),
        csv_path.display()
    );

    Ok(Dataset::new(transactions, columns))
}

fn parse_row(record: &StringRecord, index: &ColumnIndex, line: usize) -> Result<Transaction> {
    let es_fraudulenta = parse_i64(index.field(record, "es_fraudulenta"), line, "es_fraudulenta")?;

    Ok(Transaction {
        transaction_id: index.field(record, "transaction_id").to_string(),
        customer_id: index.field(record, "customer_id").to_string(),
        monto: parse_f64(index.field(record, "monto"), line, "monto")?,
        fecha: parse_fecha(index.field(record, "fecha"), line)?,
        metodo_pago: index.field(record, "metodo_pago").to_string(),
        categoria_producto: index.field(record, "categoria_producto").to_string(),
        cantidad: parse_i64(index.field(record, "cantidad"), line, "cantidad")?,
        edad_cliente: parse_i64(index.field(record, "edad_cliente"), line, "edad_cliente")?,
        ubicacion: index.field(record, "ubicacion").to_string(),
        dispositivo_usado: index.field(record, "dispositivo_usado").to_string(),
        ip_address: index.field(record, "ip_address").to_string(),
        direccion_envio: index.field(record, "direccion_envio").to_string(),
        direccion_facturacion: index.field(record, "direccion_facturacion").to_string(),
        es_fraudulenta,
        antiguedad_cuenta_dias: parse_i64(
            index.field(record, "antiguedad_cuenta_dias"),
            line,
            "antiguedad_cuenta_dias",
        )?,
        hora_transaccion: parse_i64(index.field(record, "hora_transaccion"), line, "hora_transaccion")?,
        estado: Estado::from_flag(es_fraudulenta),
    })
}

// ============================================================================
// DATASET CACHE (explicit per-path memoization)
// ============================================================================

/// Session cache: each path is loaded at most once, then shared read-only.
pub struct DatasetCache {
    entries: HashMap<PathBuf, Arc<Dataset>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        DatasetCache {
            entries: HashMap::new(),
        }
    }

    /// Memoized load: returns the cached table when the path was seen before
    pub fn load(&mut self, csv_path: &Path) -> Result<Arc<Dataset>> {
        if let Some(dataset) = self.entries.get(csv_path) {
            return Ok(Arc::clone(dataset));
        }

        let dataset = Arc::new(load_dataset(csv_path)?);
        self.entries
            .insert(csv_path.to_path_buf(), Arc::clone(&dataset));
        Ok(dataset)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for DatasetCache {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// STANDALONE DIAGNOSTIC
// ============================================================================

/// Text report for the standalone loader run: row count, column list, and a
/// preview of the first rows.
pub fn inspect_report(dataset: &Dataset) -> String {
    let mut report = String::new();

    let _ = writeln!(report, "Total transactions: {}", dataset.len());
    let _ = writeln!(report, "Columns: [{}]", dataset.columns.join(", "));

    if dataset.is_empty() {
        return report;
    }

    let _ = writeln!(report);
    let _ = writeln!(report, "Sample of processed data:");
    let _ = writeln!(
        report,
        "{:<14} {:<19} {:>10}  {:<16} {:<16} {:<12}",
        "transaction_id", "fecha", "monto", "metodo_pago", "ubicacion", "estado"
    );

    for tx in dataset.transactions.iter().take(PREVIEW_ROWS) {
        let _ = writeln!(
            report,
            "{:<14} {:<19} {:>10.2}  {:<16} {:<16} {:<12}",
            tx.transaction_id,
            tx.fecha.format("%Y-%m-%d %H:%M:%S"),
            tx.monto,
            tx.metodo_pago,
            tx.ubicacion,
            tx.estado.label()
        );
    }

    report
}

/// Inspect a CSV path end to end: success banner plus report, or the
/// not-found error when there is nothing to read. Other load failures
/// propagate as-is.
pub fn inspect_path(csv_path: &Path) -> Result<String> {
    if !csv_path.exists() {
        bail!(
            "The file '{}' was not found. Please ensure it's in the correct directory.",
            csv_path.display()
        );
    }

    let dataset = load_dataset(csv_path)?;
    Ok(format!(
        "✓ Data loaded and processed successfully!\n\n{}",
        inspect_report(&dataset)
    ))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "Transaction ID,Customer ID,Transaction Amount,Transaction Date,\
Payment Method,Product Category,Quantity,Customer Age,Customer Location,Device Used,\
IP Address,Shipping Address,Billing Address,Is Fraudulent,Account Age Days,Transaction Hour";

    fn write_csv(rows: &[&str]) -> NamedTempFile {
        write_csv_with_header(HEADER, rows)
    }

    fn write_csv_with_header(header: &str, rows: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", header).unwrap();
        for row in rows {
            writeln!(file, "{}", row).unwrap();
        }
        file.flush().unwrap();
        file
    }

    fn row(id: &str, monto: &str, fecha: &str, fraude: &str, ubicacion: &str) -> String {
        format!(
            "{id},C-{id},{monto},{fecha},credit card,electronics,1,34,{ubicacion},mobile,\
192.168.0.1,12 Elm St,12 Elm St,{fraude},120,5"
        )
    }

    #[test]
    fn test_load_and_normalize() {
        let rows = [
            row("T1", "45.50", "2024-02-20 05:58:41", "0", "Tokyo"),
            row("T2", "980.00", "2024-02-21 13:00:00", "1", "London"),
            row("T3", "12.99", "2024-03-01", "0", "Paris"),
        ];
        let refs: Vec<&str> = rows.iter().map(|r| r.as_str()).collect();
        let file = write_csv(&refs);

        let dataset = load_dataset(file.path()).unwrap();
        assert_eq!(dataset.len(), 3);

        // Column renaming applied, estado appended
        assert!(dataset.columns.contains(&"monto".to_string()));
        assert!(dataset.columns.contains(&"metodo_pago".to_string()));
        assert_eq!(dataset.columns.last().map(|s| s.as_str()), Some("estado"));

        // Bare dates get midnight attached
        let t3 = &dataset.transactions[2];
        assert_eq!(t3.fecha.time(), NaiveTime::MIN);
        assert_eq!(t3.monto, 12.99);
    }

    #[test]
    fn test_estado_invariant_after_load() {
        let rows = [
            row("T1", "10.0", "2024-01-01 00:00:00", "0", "Tokyo"),
            row("T2", "20.0", "2024-01-02 00:00:00", "1", "Tokyo"),
            row("T3", "30.0", "2024-01-03 00:00:00", "1", "Tokyo"),
        ];
        let refs: Vec<&str> = rows.iter().map(|r| r.as_str()).collect();
        let file = write_csv(&refs);

        let dataset = load_dataset(file.path()).unwrap();
        for tx in &dataset.transactions {
            assert_eq!(tx.estado, Estado::from_flag(tx.es_fraudulenta));
            assert_eq!(tx.estado == Estado::Fraudulenta, tx.es_fraudulenta == 1);
        }
    }

    #[test]
    fn test_missing_file_returns_empty() {
        let result = load_dataset(Path::new("/definitely/not/here/transactions.csv"));
        assert!(result.is_ok());
        assert!(result.unwrap().is_empty());
    }

    #[test]
    fn test_malformed_amount_names_the_line() {
        let rows = [
            row("T1", "45.50", "2024-02-20 05:58:41", "0", "Tokyo"),
            row("T2", "not-a-number", "2024-02-21 13:00:00", "0", "Tokyo"),
        ];
        let refs: Vec<&str> = rows.iter().map(|r| r.as_str()).collect();
        let file = write_csv(&refs);

        let err = load_dataset(file.path()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("line 3"), "got: {}", message);
        assert!(message.contains("monto"), "got: {}", message);
    }

    #[test]
    fn test_nonfinite_amount_rejected() {
        // f64::from_str accepts these spellings; the loader must not
        for bad in ["NaN", "inf", "-inf"] {
            let rows = [row("T1", bad, "2024-02-20 05:58:41", "0", "Tokyo")];
            let refs: Vec<&str> = rows.iter().map(|r| r.as_str()).collect();
            let file = write_csv(&refs);

            let err = load_dataset(file.path()).unwrap_err();
            let message = err.to_string();
            assert!(message.contains("line 2"), "{}: {}", bad, message);
            assert!(message.contains("monto"), "{}: {}", bad, message);
        }
    }

    #[test]
    fn test_malformed_date_names_the_line() {
        let rows = [row("T1", "45.50", "20/02/2024", "0", "Tokyo")];
        let refs: Vec<&str> = rows.iter().map(|r| r.as_str()).collect();
        let file = write_csv(&refs);

        let err = load_dataset(file.path()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("line 2"), "got: {}", message);
        assert!(message.contains("fecha"), "got: {}", message);
    }

    #[test]
    fn test_unknown_header_passes_through() {
        let header = format!("{},Mystery Column", HEADER);
        let data_row = format!("{},whatever", row("T1", "5.0", "2024-01-01", "0", "Tokyo"));
        let file = write_csv_with_header(&header, &[data_row.as_str()]);

        let dataset = load_dataset(file.path()).unwrap();
        assert_eq!(dataset.len(), 1);
        assert!(dataset.columns.contains(&"Mystery Column".to_string()));
    }

    #[test]
    fn test_missing_required_column_is_an_error() {
        // Drop "Transaction Amount" from the header and every row
        let header = HEADER.replace("Transaction Amount,", "");
        let data_row = row("T1", "5.0", "2024-01-01", "0", "Tokyo").replace("5.0,", "");
        let file = write_csv_with_header(&header, &[data_row.as_str()]);

        let err = load_dataset(file.path()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("monto"), "got: {}", message);
        assert!(message.contains("Transaction Amount"), "got: {}", message);
    }

    #[test]
    fn test_cache_loads_each_path_once() {
        let rows = [row("T1", "45.50", "2024-02-20 05:58:41", "0", "Tokyo")];
        let refs: Vec<&str> = rows.iter().map(|r| r.as_str()).collect();
        let file = write_csv(&refs);

        let mut cache = DatasetCache::new();
        let first = cache.load(file.path()).unwrap();
        let second = cache.load(file.path()).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_inspect_report_contents() {
        let rows = [
            row("T1", "45.50", "2024-02-20 05:58:41", "0", "Tokyo"),
            row("T2", "980.00", "2024-02-21 13:00:00", "1", "London"),
        ];
        let refs: Vec<&str> = rows.iter().map(|r| r.as_str()).collect();
        let file = write_csv(&refs);

        let dataset = load_dataset(file.path()).unwrap();
        let report = inspect_report(&dataset);

        assert!(report.contains("Total transactions: 2"));
        assert!(report.contains("estado"));
        assert!(report.contains("T1"));
        assert!(report.contains("Fraudulenta"));
    }

    #[test]
    fn test_inspect_report_empty_dataset() {
        let report = inspect_report(&Dataset::empty());
        assert!(report.contains("Total transactions: 0"));
        assert!(!report.contains("Sample"));
    }

    #[test]
    fn test_inspect_path_missing_file_is_an_error() {
        let err = inspect_path(Path::new("/definitely/not/here/transactions.csv")).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("was not found"), "got: {}", message);
        assert!(!message.contains("successfully"));
    }

    #[test]
    fn test_inspect_path_banner_follows_a_real_load() {
        let rows = [row("T1", "45.50", "2024-02-20 05:58:41", "0", "Tokyo")];
        let refs: Vec<&str> = rows.iter().map(|r| r.as_str()).collect();
        let file = write_csv(&refs);

        let transcript = inspect_path(file.path()).unwrap();
        assert!(transcript.contains("Data loaded and processed successfully!"));
        assert!(transcript.contains("Total transactions: 1"));
    }
}
