// 🧾 Dataset - Normalized Transaction Table
// Canonical record type, column mapping, and the in-memory table

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ============================================================================
// ESTADO (derived status label)
// ============================================================================

/// Estado - Derived binary status of a transaction
///
/// "Fraudulenta" iff the source fraud flag equals 1, otherwise "Válida".
/// Nothing but the flag feeds this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Estado {
    Valida,
    Fraudulenta,
}

impl Estado {
    /// Derive the status from the 0/1 source flag
    pub fn from_flag(es_fraudulenta: i64) -> Self {
        if es_fraudulenta == 1 {
            Estado::Fraudulenta
        } else {
            Estado::Valida
        }
    }

    /// Human-readable label shown across every view
    pub fn label(&self) -> &'static str {
        match self {
            Estado::Valida => "Válida",
            Estado::Fraudulenta => "Fraudulenta",
        }
    }
}

impl std::fmt::Display for Estado {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// COLUMN MAPPING
// ============================================================================

/// Source CSV header → canonical internal name (exact 1:1 mapping)
pub const COLUMN_MAP: [(&str, &str); 16] = [
    ("Transaction ID", "transaction_id"),
    ("Customer ID", "customer_id"),
    ("Transaction Amount", "monto"),
    ("Transaction Date", "fecha"),
    ("Payment Method", "metodo_pago"),
    ("Product Category", "categoria_producto"),
    ("Quantity", "cantidad"),
    ("Customer Age", "edad_cliente"),
    ("Customer Location", "ubicacion"),
    ("Device Used", "dispositivo_usado"),
    ("IP Address", "ip_address"),
    ("Shipping Address", "direccion_envio"),
    ("Billing Address", "direccion_facturacion"),
    ("Is Fraudulent", "es_fraudulenta"),
    ("Account Age Days", "antiguedad_cuenta_dias"),
    ("Transaction Hour", "hora_transaccion"),
];

/// Canonical column → human-readable header for the detail table.
/// Fixed projection: ip/address fields stay out of the table on purpose.
pub const DETAIL_COLUMNS: [(&str, &str); 11] = [
    ("transaction_id", "ID Transacción"),
    ("fecha", "Fecha/Hora"),
    ("monto", "Monto (USD)"),
    ("metodo_pago", "Método de Pago"),
    ("ubicacion", "Ubicación Cliente"),
    ("categoria_producto", "Categoría Producto"),
    ("cantidad", "Cantidad"),
    ("edad_cliente", "Edad Cliente"),
    ("dispositivo_usado", "Dispositivo"),
    ("es_fraudulenta", "Es Fraudulenta (0/1)"),
    ("estado", "Estado"),
];

/// Look up the canonical name for a source header
pub fn canonical_name(source: &str) -> Option<&'static str> {
    COLUMN_MAP
        .iter()
        .find(|(src, _)| *src == source)
        .map(|(_, canonical)| *canonical)
}

/// Look up the source CSV header for a canonical name
pub fn source_name(canonical: &str) -> Option<&'static str> {
    COLUMN_MAP
        .iter()
        .find(|(_, can)| *can == canonical)
        .map(|(src, _)| *src)
}

/// Rename a header row to canonical names.
///
/// Headers without a mapping pass through unchanged; the loader logs them
/// so the surprise stays visible.
pub fn canonicalize_headers(headers: &[&str]) -> Vec<String> {
    headers
        .iter()
        .map(|h| canonical_name(h).unwrap_or(h).to_string())
        .collect()
}

// ============================================================================
// TRANSACTION RECORD
// ============================================================================

/// One e-commerce transaction after normalization.
///
/// Field names are the canonical column names; `estado` is derived at load
/// time and is the only column that does not come straight from the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: String,
    pub customer_id: String,
    pub monto: f64,
    pub fecha: NaiveDateTime,
    pub metodo_pago: String,
    pub categoria_producto: String,
    pub cantidad: i64,
    pub edad_cliente: i64,
    pub ubicacion: String,
    pub dispositivo_usado: String,
    pub ip_address: String,
    pub direccion_envio: String,
    pub direccion_facturacion: String,
    pub es_fraudulenta: i64,
    pub antiguedad_cuenta_dias: i64,
    pub hora_transaccion: i64,
    pub estado: Estado,
}

impl Transaction {
    /// Calendar date of the transaction (filters compare dates, not times)
    pub fn fecha_date(&self) -> NaiveDate {
        self.fecha.date()
    }

    /// Rendered cell value for a canonical detail-table column
    pub fn display_value(&self, canonical: &str) -> String {
        match canonical {
            "transaction_id" => self.transaction_id.clone(),
            "customer_id" => self.customer_id.clone(),
            "fecha" => self.fecha.format("%Y-%m-%d %H:%M").to_string(),
            "monto" => format!("{:.2}", self.monto),
            "metodo_pago" => self.metodo_pago.clone(),
            "categoria_producto" => self.categoria_producto.clone(),
            "cantidad" => self.cantidad.to_string(),
            "edad_cliente" => self.edad_cliente.to_string(),
            "ubicacion" => self.ubicacion.clone(),
            "dispositivo_usado" => self.dispositivo_usado.clone(),
            "es_fraudulenta" => self.es_fraudulenta.to_string(),
            "estado" => self.estado.label().to_string(),
            _ => String::new(),
        }
    }
}

// ============================================================================
// DATASET (the normalized table)
// ============================================================================

/// The normalized table: immutable after load, filters copy from it.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    /// Rows in original file order
    pub transactions: Vec<Transaction>,
    /// Post-rename column list (including pass-through headers and the
    /// derived `estado` column), kept for diagnostics
    pub columns: Vec<String>,
}

impl Dataset {
    pub fn new(transactions: Vec<Transaction>, columns: Vec<String>) -> Self {
        Dataset {
            transactions,
            columns,
        }
    }

    /// Empty dataset - the loader's "file not found" result
    pub fn empty() -> Self {
        Dataset::default()
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Min/max calendar date across all rows (None when empty)
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let mut iter = self.transactions.iter().map(|tx| tx.fecha_date());
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));
        Some((min, max))
    }

    /// Min/max amount across all rows (None when empty)
    pub fn amount_range(&self) -> Option<(f64, f64)> {
        let mut iter = self.transactions.iter().map(|tx| tx.monto);
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(lo, hi), m| (lo.min(m), hi.max(m)));
        Some((min, max))
    }

    /// Unique payment methods, sorted for a stable sidebar order
    pub fn payment_methods(&self) -> Vec<String> {
        let mut methods: Vec<String> = self
            .transactions
            .iter()
            .map(|tx| tx.metodo_pago.clone())
            .collect();
        methods.sort();
        methods.dedup();
        methods
    }

    /// Unique product categories, sorted for a stable sidebar order
    pub fn product_categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = self
            .transactions
            .iter()
            .map(|tx| tx.categoria_producto.clone())
            .collect();
        categories.sort();
        categories.dedup();
        categories
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_transaction(id: &str, monto: f64, es_fraudulenta: i64) -> Transaction {
        Transaction {
            transaction_id: id.to_string(),
            customer_id: format!("C-{}", id),
            monto,
            fecha: NaiveDate::from_ymd_opt(2024, 3, 15)
                .unwrap()
                .and_hms_opt(12, 30, 0)
                .unwrap(),
            metodo_pago: "Card".to_string(),
            categoria_producto: "electronics".to_string(),
            cantidad: 1,
            edad_cliente: 35,
            ubicacion: "Tokyo".to_string(),
            dispositivo_usado: "mobile".to_string(),
            ip_address: "10.0.0.1".to_string(),
            direccion_envio: "Calle 1".to_string(),
            direccion_facturacion: "Calle 1".to_string(),
            es_fraudulenta,
            antiguedad_cuenta_dias: 120,
            hora_transaccion: 12,
            estado: Estado::from_flag(es_fraudulenta),
        }
    }

    #[test]
    fn test_estado_from_flag() {
        assert_eq!(Estado::from_flag(1), Estado::Fraudulenta);
        assert_eq!(Estado::from_flag(0), Estado::Valida);
        // Anything other than exactly 1 is Válida
        assert_eq!(Estado::from_flag(2), Estado::Valida);
        assert_eq!(Estado::from_flag(-1), Estado::Valida);
    }

    #[test]
    fn test_estado_labels() {
        assert_eq!(Estado::Valida.label(), "Válida");
        assert_eq!(Estado::Fraudulenta.label(), "Fraudulenta");
        assert_eq!(format!("{}", Estado::Fraudulenta), "Fraudulenta");
    }

    #[test]
    fn test_canonical_name_lookup() {
        assert_eq!(canonical_name("Transaction Amount"), Some("monto"));
        assert_eq!(canonical_name("Transaction Date"), Some("fecha"));
        assert_eq!(canonical_name("Is Fraudulent"), Some("es_fraudulenta"));
        assert_eq!(canonical_name("Mystery Column"), None);
    }

    #[test]
    fn test_header_round_trip() {
        // Renaming source headers to canonical names and back recovers the
        // original header set exactly
        for (source, canonical) in COLUMN_MAP {
            assert_eq!(canonical_name(source), Some(canonical));
            assert_eq!(source_name(canonical), Some(source));
        }
    }

    #[test]
    fn test_canonicalize_headers_passthrough() {
        let headers = vec!["Transaction ID", "Mystery Column", "Transaction Amount"];
        let canonical = canonicalize_headers(&headers);
        assert_eq!(canonical, vec!["transaction_id", "Mystery Column", "monto"]);
    }

    #[test]
    fn test_dataset_ranges() {
        let mut a = sample_transaction("T1", 10.0, 0);
        a.fecha = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let mut b = sample_transaction("T2", 95.5, 1);
        b.fecha = NaiveDate::from_ymd_opt(2024, 6, 30)
            .unwrap()
            .and_hms_opt(22, 15, 0)
            .unwrap();

        let ds = Dataset::new(vec![a, b], Vec::new());
        assert_eq!(
            ds.date_range(),
            Some((
                NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
            ))
        );
        assert_eq!(ds.amount_range(), Some((10.0, 95.5)));
    }

    #[test]
    fn test_dataset_empty_ranges() {
        let ds = Dataset::empty();
        assert!(ds.is_empty());
        assert_eq!(ds.date_range(), None);
        assert_eq!(ds.amount_range(), None);
        assert!(ds.payment_methods().is_empty());
    }

    #[test]
    fn test_unique_values_sorted() {
        let mut a = sample_transaction("T1", 10.0, 0);
        a.metodo_pago = "PayPal".to_string();
        a.categoria_producto = "toys & games".to_string();
        let b = sample_transaction("T2", 20.0, 0);
        let mut c = sample_transaction("T3", 30.0, 0);
        c.metodo_pago = "PayPal".to_string();

        let ds = Dataset::new(vec![a, b, c], Vec::new());
        assert_eq!(ds.payment_methods(), vec!["Card", "PayPal"]);
        assert_eq!(
            ds.product_categories(),
            vec!["electronics", "toys & games"]
        );
    }

    #[test]
    fn test_detail_columns_projection() {
        // The fixed display list leaves out ip/address fields
        let canonicals: Vec<&str> = DETAIL_COLUMNS.iter().map(|(c, _)| *c).collect();
        assert!(!canonicals.contains(&"ip_address"));
        assert!(!canonicals.contains(&"direccion_envio"));
        assert!(canonicals.contains(&"estado"));
        assert_eq!(DETAIL_COLUMNS.len(), 11);
    }

    #[test]
    fn test_display_values() {
        let tx = sample_transaction("T9", 45.5, 0);

        assert_eq!(tx.display_value("transaction_id"), "T9");
        assert_eq!(tx.display_value("monto"), "45.50");
        assert_eq!(tx.display_value("fecha"), "2024-03-15 12:30");
        assert_eq!(tx.display_value("es_fraudulenta"), "0");
        assert_eq!(tx.display_value("estado"), "Válida");
        assert_eq!(tx.display_value("not a column"), "");

        // Every detail column renders something for a normal row
        for (canonical, _) in DETAIL_COLUMNS {
            assert!(!tx.display_value(canonical).is_empty());
        }
    }
}
