// 📊 Chart Models - Aggregations Behind the Views
// Amount histogram, category counts, geographic points

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::dataset::{Estado, Transaction};
use crate::geo::CityRegistry;

/// Fixed bin count for the amount distribution
pub const HISTOGRAM_BINS: usize = 20;

// ============================================================================
// AMOUNT HISTOGRAM
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub validas: u64,
    pub fraudulentas: u64,
}

impl HistogramBin {
    pub fn total(&self) -> u64 {
        self.validas + self.fraudulentas
    }

    pub fn range_label(&self) -> String {
        format!("${:.0}-${:.0}", self.lower, self.upper)
    }
}

/// Amount distribution over the filtered subset, split by estado per bin.
///
/// The bin edges follow the subset's own min/max, so narrowing the filters
/// re-bins the histogram. A flat range (all amounts equal) keeps the full
/// bin count and drops every row into the first bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmountHistogram {
    pub bins: Vec<HistogramBin>,
}

impl AmountHistogram {
    pub fn build(rows: &[Transaction]) -> Self {
        if rows.is_empty() {
            return AmountHistogram { bins: Vec::new() };
        }

        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for tx in rows {
            min = min.min(tx.monto);
            max = max.max(tx.monto);
        }

        let span = max - min;
        let width = if span > 0.0 {
            span / HISTOGRAM_BINS as f64
        } else {
            1.0
        };

        let mut bins: Vec<HistogramBin> = (0..HISTOGRAM_BINS)
            .map(|i| HistogramBin {
                lower: min + width * i as f64,
                upper: min + width * (i + 1) as f64,
                validas: 0,
                fraudulentas: 0,
            })
            .collect();

        for tx in rows {
            let mut index = ((tx.monto - min) / width) as usize;
            // The maximum amount belongs to the last bin, not one past it
            if index >= HISTOGRAM_BINS {
                index = HISTOGRAM_BINS - 1;
            }
            match tx.estado {
                Estado::Valida => bins[index].validas += 1,
                Estado::Fraudulenta => bins[index].fraudulentas += 1,
            }
        }

        AmountHistogram { bins }
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Tallest bin, used to scale the rendered bars
    pub fn max_bin_total(&self) -> u64 {
        self.bins.iter().map(|b| b.total()).max().unwrap_or(0)
    }
}

// ============================================================================
// CATEGORY COUNTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub categoria: String,
    pub validas: u64,
    pub fraudulentas: u64,
}

impl CategoryCount {
    pub fn total(&self) -> u64 {
        self.validas + self.fraudulentas
    }
}

/// Per-category transaction counts split by estado, alphabetical order
pub fn category_counts(rows: &[Transaction]) -> Vec<CategoryCount> {
    let mut tallies: BTreeMap<&str, (u64, u64)> = BTreeMap::new();

    for tx in rows {
        let entry = tallies.entry(tx.categoria_producto.as_str()).or_insert((0, 0));
        match tx.estado {
            Estado::Valida => entry.0 += 1,
            Estado::Fraudulenta => entry.1 += 1,
        }
    }

    tallies
        .into_iter()
        .map(|(categoria, (validas, fraudulentas))| CategoryCount {
            categoria: categoria.to_string(),
            validas,
            fraudulentas,
        })
        .collect()
}

// ============================================================================
// GEOGRAPHIC POINTS
// ============================================================================

/// One plotted city: coordinates plus the per-estado counts the side
/// table shows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapPoint {
    pub ciudad: String,
    pub lat: f64,
    pub lon: f64,
    pub validas: u64,
    pub fraudulentas: u64,
}

impl MapPoint {
    pub fn total(&self) -> u64 {
        self.validas + self.fraudulentas
    }

    /// Fraction of this city's transactions that are fraudulent
    pub fn fraud_share(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            self.fraudulentas as f64 / total as f64
        }
    }
}

/// Aggregate the filtered subset per city and attach coordinates.
///
/// Cities absent from the registry are dropped here, and only here; they
/// still count toward every metric and the other views.
pub fn map_points(rows: &[Transaction], registry: &CityRegistry) -> Vec<MapPoint> {
    let mut by_city: BTreeMap<&str, MapPoint> = BTreeMap::new();

    for tx in rows {
        let Some((lat, lon)) = registry.lookup(&tx.ubicacion) else {
            continue;
        };

        let entry = by_city
            .entry(tx.ubicacion.as_str())
            .or_insert_with(|| MapPoint {
                ciudad: tx.ubicacion.clone(),
                lat,
                lon,
                validas: 0,
                fraudulentas: 0,
            });

        match tx.estado {
            Estado::Valida => entry.validas += 1,
            Estado::Fraudulenta => entry.fraudulentas += 1,
        }
    }

    // Busiest cities first so the side table reads top-down
    let mut points: Vec<MapPoint> = by_city.into_values().collect();
    points.sort_by(|a, b| {
        b.total()
            .cmp(&a.total())
            .then_with(|| a.ciudad.cmp(&b.ciudad))
    });
    points
}

// ============================================================================
// TESTS
// ============================================================================
