// 🌍 Geo - City Coordinate Registry
// Fixed city → (lat, lon) lookup for the transaction map

use std::collections::HashMap;

// ============================================================================
// BUILTIN COORDINATES
// ============================================================================

/// Approximate coordinates for the cities present in the dataset.
/// Locations outside this table never reach the map view.
pub const BUILTIN_CITY_COORDS: [(&str, f64, f64); 20] = [
    ("New York", 40.7128, -74.0060),
    ("Los Angeles", 34.0522, -118.2437),
    ("Chicago", 41.8781, -87.6298),
    ("Houston", 29.7604, -95.3698),
    ("Miami", 25.7617, -80.1918),
    ("London", 51.5074, -0.1278),
    ("Paris", 48.8566, 2.3522),
    ("Tokyo", 35.6895, 139.6917),
    ("Sydney", -33.8688, 151.2093),
    ("Berlin", 52.5200, 13.4050),
    ("Toronto", 43.6532, -79.3832),
    ("Dubai", 25.276987, 55.296249),
    ("Singapore", 1.3521, 103.8198),
    ("Mexico City", 19.4326, -99.1332),
    ("Rio de Janeiro", -22.9068, -43.1729),
    ("Johannesburg", -26.2041, 28.0473),
    ("Cairo", 30.0444, 31.2357),
    ("Mumbai", 19.0760, 72.8777),
    ("Beijing", 39.9042, 116.4074),
    ("Moscow", 55.7558, 37.6173),
];

// ============================================================================
// CITY REGISTRY
// ============================================================================

/// Immutable city → coordinate table.
///
/// Built once and passed by reference into the map aggregation; there is no
/// process-wide mutable state behind it.
#[derive(Debug, Clone)]
pub struct CityRegistry {
    coords: HashMap<String, (f64, f64)>,
}

impl CityRegistry {
    /// Registry seeded with the builtin city table
    pub fn builtin() -> Self {
        Self::from_entries(
            BUILTIN_CITY_COORDS
                .iter()
                .map(|(city, lat, lon)| (city.to_string(), *lat, *lon)),
        )
    }

    /// Registry from an explicit set of (city, lat, lon) entries
    pub fn from_entries(entries: impl IntoIterator<Item = (String, f64, f64)>) -> Self {
        let coords = entries
            .into_iter()
            .map(|(city, lat, lon)| (city, (lat, lon)))
            .collect();
        CityRegistry { coords }
    }

    /// (lat, lon) for a city, or None when the city is unknown
    pub fn lookup(&self, city: &str) -> Option<(f64, f64)> {
        self.coords.get(city).copied()
    }

    pub fn contains(&self, city: &str) -> bool {
        self.coords.contains_key(city)
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }
}

impl Default for CityRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_city_count() {
        let registry = CityRegistry::builtin();
        assert_eq!(registry.len(), 20);
    }

    #[test]
    fn test_lookup_known_city() {
        let registry = CityRegistry::builtin();
        assert_eq!(registry.lookup("Tokyo"), Some((35.6895, 139.6917)));
        assert_eq!(registry.lookup("Sydney"), Some((-33.8688, 151.2093)));
        assert!(registry.contains("Mexico City"));
    }

    #[test]
    fn test_lookup_unknown_city() {
        let registry = CityRegistry::builtin();
        assert_eq!(registry.lookup("Atlantis"), None);
        assert!(!registry.contains("Atlantis"));
    }

    #[test]
    fn test_from_entries() {
        let registry =
            CityRegistry::from_entries(vec![("Springfield".to_string(), 39.78, -89.65)]);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup("Springfield"), Some((39.78, -89.65)));
        assert_eq!(registry.lookup("Tokyo"), None);
    }
}
