//! Routes: ordered stops plus the walking path between them.
//!
//! A catalog is a JSON array of routes:
//!
//! ```text
//! [{
//!   "id": "waikiki",
//!   "name": "Waikīkī Stroll",
//!   "line": [[21.2760, -157.8270], [21.2770, -157.8260]],
//!   "stops": [{ "id": "duke", "title": "Duke Statue", "lat": 21.2760, "lng": -157.8270 }]
//! }]
//! ```

use std::{collections::HashSet, fs, io, path::Path};

use serde::{Deserialize, Serialize};

use super::Coordinate;

/// Errors that can occur while loading routes.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("route '{0}' has no stops")]
    Empty(String),

    #[error("route '{route}' lists stop '{stop}' more than once")]
    DuplicateStop { route: String, stop: String },

    #[error("route not found: {0}")]
    NotFound(String),
}

/// A single point of interest with associated narration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stop {
    /// Unique within its route.
    pub id: String,

    pub title: String,

    #[serde(flatten)]
    pub coordinate: Coordinate,

    /// Free-form place name shown under the title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// Walking-time hint from the previous stop, in minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub walk_from_prev_min: Option<u32>,
}

/// An ordered walk: stops in visiting order and the path between them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub id: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    pub stops: Vec<Stop>,

    /// Walking path. Need not pass through the stops themselves.
    #[serde(default, with = "lat_lng_pairs")]
    pub line: Vec<Coordinate>,
}

impl Route {
    /// Checks that the route has stops and that stop ids are unique.
    pub fn validate(&self) -> Result<(), RouteError> {
        if self.stops.is_empty() {
            return Err(RouteError::Empty(self.id.clone()));
        }
        let mut seen = HashSet::new();
        for stop in &self.stops {
            if !seen.insert(stop.id.as_str()) {
                return Err(RouteError::DuplicateStop {
                    route: self.id.clone(),
                    stop: stop.id.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn last_index(&self) -> usize {
        self.stops.len().saturating_sub(1)
    }

    /// Clamps a stop index into this route's range.
    pub fn clamp_index(&self, index: usize) -> usize {
        index.min(self.last_index())
    }
}

/// All routes available to walk, in catalog order.
#[derive(Debug, Clone, Default)]
pub struct RouteCatalog {
    routes: Vec<Route>,
}

impl RouteCatalog {
    /// Loads and validates a catalog from a JSON file.
    pub fn load(path: &Path) -> Result<Self, RouteError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Parses and validates a catalog from JSON text.
    pub fn from_json(json: &str) -> Result<Self, RouteError> {
        let routes: Vec<Route> = serde_json::from_str(json)?;
        for route in &routes {
            route.validate()?;
        }
        Ok(Self { routes })
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Looks up a route by id.
    pub fn get(&self, id: &str) -> Result<&Route, RouteError> {
        self.routes
            .iter()
            .find(|r| r.id == id)
            .ok_or_else(|| RouteError::NotFound(id.to_string()))
    }

    /// The route a walk starts on when none is named.
    pub fn first(&self) -> Option<&Route> {
        self.routes.first()
    }
}

/// The polyline is stored as `[[lat, lng], ...]`.
mod lat_lng_pairs {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::Coordinate;

    pub fn serialize<S: Serializer>(line: &[Coordinate], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(line.iter().map(|c| [c.lat, c.lng]))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Coordinate>, D::Error> {
        let pairs = Vec::<[f64; 2]>::deserialize(deserializer)?;
        Ok(pairs
            .into_iter()
            .map(|[lat, lng]| Coordinate::new(lat, lng))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    const CATALOG: &str = r#"[
        {
            "id": "downtown",
            "name": "Downtown Honolulu",
            "city": "Honolulu",
            "line": [[21.3000, -157.8500], [21.3010, -157.8500]],
            "stops": [
                { "id": "palace", "title": "ʻIolani Palace", "lat": 21.3000, "lng": -157.8500 },
                { "id": "statue", "title": "Kamehameha Statue", "lat": 21.3010, "lng": -157.8500, "walkFromPrevMin": 2 }
            ]
        },
        {
            "id": "beach",
            "name": "Beach Walk",
            "stops": [
                { "id": "pier", "title": "Pier", "lat": 21.2700, "lng": -157.8200 }
            ]
        }
    ]"#;

    #[test]
    fn parses_catalog() {
        let catalog = RouteCatalog::from_json(CATALOG).unwrap();

        assert_eq!(catalog.routes().len(), 2);
        let downtown = catalog.get("downtown").unwrap();
        assert_eq!(downtown.stops.len(), 2);
        assert_eq!(downtown.line[1], Coordinate::new(21.3010, -157.8500));
        assert_eq!(downtown.stops[1].walk_from_prev_min, Some(2));
        assert!(catalog.get("beach").unwrap().line.is_empty());
    }

    #[test]
    fn loads_catalog_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("routes.json");
        fs::write(&path, CATALOG).unwrap();

        let catalog = RouteCatalog::load(&path).unwrap();
        assert_eq!(catalog.first().unwrap().id, "downtown");
    }

    #[test]
    fn unknown_route_is_not_found() {
        let catalog = RouteCatalog::from_json(CATALOG).unwrap();
        let err = catalog.get("volcano").unwrap_err();
        assert!(matches!(err, RouteError::NotFound(_)));
    }

    #[test]
    fn rejects_duplicate_stop_ids() {
        let json = r#"[{ "id": "r", "name": "R", "stops": [
            { "id": "a", "title": "A", "lat": 0.0, "lng": 0.0 },
            { "id": "a", "title": "A again", "lat": 0.1, "lng": 0.0 }
        ]}]"#;
        let err = RouteCatalog::from_json(json).unwrap_err();
        assert!(matches!(err, RouteError::DuplicateStop { .. }));
    }

    #[test]
    fn rejects_route_without_stops() {
        let json = r#"[{ "id": "r", "name": "R", "stops": [] }]"#;
        let err = RouteCatalog::from_json(json).unwrap_err();
        assert!(matches!(err, RouteError::Empty(_)));
    }

    #[test]
    fn clamps_indexes() {
        let catalog = RouteCatalog::from_json(CATALOG).unwrap();
        let route = catalog.get("downtown").unwrap();
        assert_eq!(route.clamp_index(0), 0);
        assert_eq!(route.clamp_index(7), 1);
    }
}
