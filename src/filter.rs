// 🔍 Filter Engine - Conjunction of Sidebar Criteria
// Date window, amount window, payment-method set, category set, estado

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::dataset::{Dataset, Estado, Transaction};

// ============================================================================
// ESTADO SELECTOR
// ============================================================================

/// Three-way estado selector, "Todas" imposing no constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EstadoFilter {
    Todas,
    Validas,
    Fraudulentas,
}

impl EstadoFilter {
    pub fn label(&self) -> &str {
        match self {
            EstadoFilter::Todas => "Todas",
            EstadoFilter::Validas => "Válida",
            EstadoFilter::Fraudulentas => "Fraudulenta",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            EstadoFilter::Todas => EstadoFilter::Validas,
            EstadoFilter::Validas => EstadoFilter::Fraudulentas,
            EstadoFilter::Fraudulentas => EstadoFilter::Todas,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            EstadoFilter::Todas => EstadoFilter::Fraudulentas,
            EstadoFilter::Validas => EstadoFilter::Todas,
            EstadoFilter::Fraudulentas => EstadoFilter::Validas,
        }
    }

    fn matches(&self, estado: Estado) -> bool {
        match self {
            EstadoFilter::Todas => true,
            EstadoFilter::Validas => estado == Estado::Valida,
            EstadoFilter::Fraudulentas => estado == Estado::Fraudulenta,
        }
    }
}

// ============================================================================
// SIDEBAR ROWS
// ============================================================================

/// Flattened list of sidebar rows the filter cursor walks through.
/// One entry per adjustable value, one per toggleable set member.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterRow {
    FechaDesde,
    FechaHasta,
    MontoMin,
    MontoMax,
    Metodo(String),
    Categoria(String),
    Estado,
}

impl FilterRow {
    pub fn build(dataset: &Dataset) -> Vec<FilterRow> {
        let mut rows = vec![
            FilterRow::FechaDesde,
            FilterRow::FechaHasta,
            FilterRow::MontoMin,
            FilterRow::MontoMax,
        ];
        rows.extend(dataset.payment_methods().into_iter().map(FilterRow::Metodo));
        rows.extend(
            dataset
                .product_categories()
                .into_iter()
                .map(FilterRow::Categoria),
        );
        rows.push(FilterRow::Estado);
        rows
    }
}

// ============================================================================
// FILTER STATE
// ============================================================================

/// The five sidebar criteria, combined with AND across dimensions.
///
/// Dates compare on the calendar day, both window ends inclusive. The two
/// set criteria use membership, so an emptied set matches nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterState {
    pub fecha_desde: NaiveDate,
    pub fecha_hasta: NaiveDate,
    pub monto_min: f64,
    pub monto_max: f64,
    pub metodos_pago: BTreeSet<String>,
    pub categorias: BTreeSet<String>,
    pub estado: EstadoFilter,
}

impl FilterState {
    /// Defaults that span the whole dataset: full date range, full amount
    /// range, every payment method and category selected, estado "Todas".
    pub fn spanning(dataset: &Dataset) -> Self {
        let fallback_date = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or(NaiveDate::MIN);
        let (fecha_desde, fecha_hasta) = dataset
            .date_range()
            .unwrap_or((fallback_date, fallback_date));
        let (monto_min, monto_max) = dataset.amount_range().unwrap_or((0.0, 0.0));

        FilterState {
            fecha_desde,
            fecha_hasta,
            monto_min,
            monto_max,
            metodos_pago: dataset.payment_methods().into_iter().collect(),
            categorias: dataset.product_categories().into_iter().collect(),
            estado: EstadoFilter::Todas,
        }
    }

    /// Back to the spanning defaults (the "clear filters" action)
    pub fn reset(&mut self, dataset: &Dataset) {
        *self = FilterState::spanning(dataset);
    }

    /// True when every criterion admits the transaction
    pub fn accepts(&self, tx: &Transaction) -> bool {
        let fecha = tx.fecha_date();
        if fecha < self.fecha_desde || fecha > self.fecha_hasta {
            return false;
        }
        if tx.monto < self.monto_min || tx.monto > self.monto_max {
            return false;
        }
        if !self.metodos_pago.contains(&tx.metodo_pago) {
            return false;
        }
        if !self.categorias.contains(&tx.categoria_producto) {
            return false;
        }
        self.estado.matches(tx.estado)
    }

    /// Filtered view of the table, preserving the original row order.
    /// The dataset itself is never mutated.
    pub fn apply(&self, dataset: &Dataset) -> Vec<Transaction> {
        dataset
            .transactions
            .iter()
            .filter(|tx| self.accepts(tx))
            .cloned()
            .collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn tx(
        id: &str,
        monto: f64,
        fecha: &str,
        metodo: &str,
        categoria: &str,
        fraude: i64,
    ) -> Transaction {
        let fecha = NaiveDateTime::parse_from_str(fecha, "%Y-%m-%d %H:%M:%S").unwrap();
        Transaction {
            transaction_id: id.to_string(),
            customer_id: format!("C-{}", id),
            monto,
            fecha,
            metodo_pago: metodo.to_string(),
            categoria_producto: categoria.to_string(),
            cantidad: 1,
            edad_cliente: 34,
            ubicacion: "Tokyo".to_string(),
            dispositivo_usado: "mobile".to_string(),
            ip_address: "192.168.0.1".to_string(),
            direccion_envio: "12 Elm St".to_string(),
            direccion_facturacion: "12 Elm St".to_string(),
            es_fraudulenta: fraude,
            antiguedad_cuenta_dias: 120,
            hora_transaccion: 5,
            estado: Estado::from_flag(fraude),
        }
    }

    fn sample_dataset() -> Dataset {
        Dataset::new(
            vec![
                tx("T1", 45.50, "2024-01-10 08:00:00", "credit card", "electronics", 0),
                tx("T2", 980.00, "2024-01-15 12:30:00", "paypal", "clothing", 1),
                tx("T3", 12.99, "2024-02-01 23:59:59", "debit card", "electronics", 0),
                tx("T4", 250.00, "2024-02-14 00:00:00", "credit card", "home goods", 1),
                tx("T5", 99.99, "2024-03-05 10:15:00", "paypal", "electronics", 0),
            ],
            vec![],
        )
    }

    fn ids(rows: &[Transaction]) -> Vec<&str> {
        rows.iter().map(|t| t.transaction_id.as_str()).collect()
    }

    #[test]
    fn test_spanning_matches_everything() {
        let dataset = sample_dataset();
        let state = FilterState::spanning(&dataset);

        let rows = state.apply(&dataset);
        assert_eq!(rows.len(), dataset.len());
        assert_eq!(ids(&rows), vec!["T1", "T2", "T3", "T4", "T5"]);
    }

    #[test]
    fn test_date_window_is_inclusive_on_both_ends() {
        let dataset = sample_dataset();
        let mut state = FilterState::spanning(&dataset);
        state.fecha_desde = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        state.fecha_hasta = NaiveDate::from_ymd_opt(2024, 2, 14).unwrap();

        // T2 sits on the lower edge, T4 on the upper edge
        assert_eq!(ids(&state.apply(&dataset)), vec!["T2", "T3", "T4"]);
    }

    #[test]
    fn test_amount_window_is_inclusive_on_both_ends() {
        let dataset = sample_dataset();
        let mut state = FilterState::spanning(&dataset);
        state.monto_min = 12.99;
        state.monto_max = 99.99;

        assert_eq!(ids(&state.apply(&dataset)), vec!["T1", "T3", "T5"]);
    }

    #[test]
    fn test_empty_method_set_matches_nothing() {
        let dataset = sample_dataset();
        let mut state = FilterState::spanning(&dataset);
        state.metodos_pago.clear();

        assert!(state.apply(&dataset).is_empty());
    }

    #[test]
    fn test_empty_category_set_matches_nothing() {
        let dataset = sample_dataset();
        let mut state = FilterState::spanning(&dataset);
        state.categorias.clear();

        assert!(state.apply(&dataset).is_empty());
    }

    #[test]
    fn test_estado_constrains_to_fraudulentas() {
        let dataset = sample_dataset();
        let mut state = FilterState::spanning(&dataset);
        state.estado = EstadoFilter::Fraudulentas;

        assert_eq!(ids(&state.apply(&dataset)), vec!["T2", "T4"]);
    }

    #[test]
    fn test_criteria_combine_with_and() {
        let dataset = sample_dataset();
        let mut state = FilterState::spanning(&dataset);
        state.categorias = ["electronics".to_string()].into_iter().collect();
        state.monto_max = 50.0;
        state.estado = EstadoFilter::Validas;

        // electronics AND monto <= 50 AND válida
        assert_eq!(ids(&state.apply(&dataset)), vec!["T1", "T3"]);
    }

    #[test]
    fn test_narrow_amount_window_scenario() {
        let dataset = Dataset::new(
            vec![
                tx("T1", 10.0, "2024-01-10 08:00:00", "Card", "electronics", 0),
                tx("T2", 20.0, "2024-01-11 09:00:00", "Card", "electronics", 0),
                tx("T3", 30.0, "2024-01-12 10:00:00", "Card", "electronics", 0),
            ],
            vec![],
        );
        let mut state = FilterState::spanning(&dataset);
        state.monto_min = 15.0;
        state.monto_max = 25.0;

        let rows = state.apply(&dataset);
        assert_eq!(ids(&rows), vec!["T2"]);

        let metrics = crate::metrics::DashboardMetrics::compute(&rows);
        assert_eq!(metrics.monto_promedio_label(), "$20.00");
        assert_eq!(metrics.fraudulentas, 0);
    }

    #[test]
    fn test_reset_restores_the_full_row_set() {
        let dataset = sample_dataset();
        let mut state = FilterState::spanning(&dataset);

        state.estado = EstadoFilter::Fraudulentas;
        state.metodos_pago.remove("paypal");
        assert!(state.apply(&dataset).len() < dataset.len());

        state.reset(&dataset);
        let rows = state.apply(&dataset);
        assert_eq!(ids(&rows), vec!["T1", "T2", "T3", "T4", "T5"]);
        // Source table untouched throughout
        assert_eq!(dataset.len(), 5);
    }

    #[test]
    fn test_filter_rows_follow_dataset_vocabulary() {
        let dataset = sample_dataset();
        let rows = FilterRow::build(&dataset);

        // 4 window rows + 3 methods + 3 categories + estado
        assert_eq!(rows.len(), 11);
        assert_eq!(rows[0], FilterRow::FechaDesde);
        assert_eq!(rows.last(), Some(&FilterRow::Estado));
        assert!(rows.contains(&FilterRow::Metodo("paypal".to_string())));
        assert!(rows.contains(&FilterRow::Categoria("home goods".to_string())));
    }

    #[test]
    fn test_estado_cycle_wraps_both_ways() {
        assert_eq!(EstadoFilter::Todas.next(), EstadoFilter::Validas);
        assert_eq!(EstadoFilter::Fraudulentas.next(), EstadoFilter::Todas);
        assert_eq!(EstadoFilter::Todas.previous(), EstadoFilter::Fraudulentas);
        assert_eq!(
            EstadoFilter::Validas.next().next().next(),
            EstadoFilter::Validas
        );
    }
}
