// 📈 Metrics - Headline Figures Over the Filtered Subset
// Count, fraud share, average amount, average customer age

use serde::{Deserialize, Serialize};

use crate::dataset::{Estado, Transaction};

/// The four figures shown above every view, recomputed on filter changes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardMetrics {
    pub total: usize,
    pub fraudulentas: usize,
    pub porcentaje_fraude: f64,
    pub monto_promedio: f64,
    pub edad_promedio: f64,
}

impl DashboardMetrics {
    pub fn compute(rows: &[Transaction]) -> Self {
        let total = rows.len();
        let fraudulentas = rows
            .iter()
            .filter(|tx| tx.estado == Estado::Fraudulenta)
            .count();

        if total == 0 {
            return DashboardMetrics {
                total: 0,
                fraudulentas: 0,
                porcentaje_fraude: 0.0,
                monto_promedio: 0.0,
                edad_promedio: 0.0,
            };
        }

        let monto_promedio = rows.iter().map(|tx| tx.monto).sum::<f64>() / total as f64;
        let edad_promedio =
            rows.iter().map(|tx| tx.edad_cliente as f64).sum::<f64>() / total as f64;

        DashboardMetrics {
            total,
            fraudulentas,
            porcentaje_fraude: fraudulentas as f64 / total as f64 * 100.0,
            monto_promedio,
            edad_promedio,
        }
    }

    pub fn total_label(&self) -> String {
        group_thousands(self.total)
    }

    /// Count plus share of the filtered subset, e.g. "3 (1.26%)"
    pub fn fraude_label(&self) -> String {
        let porcentaje = if self.total == 0 {
            "0%".to_string()
        } else {
            format!("{:.2}%", self.porcentaje_fraude)
        };
        format!("{} ({})", group_thousands(self.fraudulentas), porcentaje)
    }

    pub fn monto_promedio_label(&self) -> String {
        format!("${:.2}", self.monto_promedio)
    }

    pub fn edad_promedio_label(&self) -> String {
        if self.total == 0 {
            "N/A".to_string()
        } else {
            format!("{:.1} años", self.edad_promedio)
        }
    }
}

/// 1234567 → "1,234,567"
fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

// ============================================================================
// TESTS
// ============================================================================
