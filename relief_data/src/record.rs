use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::city::Resource;

pub type ResourceMap = BTreeMap<Resource, f64>;

/// One city's synthetic snapshot for a single generation tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticRecord {
    pub region_id: u8,
    pub region_name: String,
    pub population_density: u64,
    pub road_block_status: u32,
    pub severity_score: f64,
    pub warehouse_stock_status: ResourceMap,
    pub resource_needs: ResourceMap,
    pub timestamp: DateTime<Utc>,
}

/// Fields a stored document must carry before the reader accepts it.
pub const REQUIRED_FIELDS: [&str; 7] = [
    "region_name",
    "severity_score",
    "road_block_status",
    "population_density",
    "warehouse_stock_status",
    "resource_needs",
    "timestamp",
];

impl SyntheticRecord {
    pub fn stock(&self, resource: Resource) -> f64 {
        self.warehouse_stock_status.get(&resource).copied().unwrap_or(0.0)
    }

    pub fn need(&self, resource: Resource) -> f64 {
        self.resource_needs.get(&resource).copied().unwrap_or(0.0)
    }

    pub fn to_document(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    /// Returns the first required field missing from `document`, if any.
    pub fn missing_field(document: &serde_json::Value) -> Option<&'static str> {
        let Some(object) = document.as_object() else { return Some(REQUIRED_FIELDS[0]) };
        REQUIRED_FIELDS.iter().copied().find(|field| !object.contains_key(*field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record() -> SyntheticRecord {
        SyntheticRecord {
            region_id: 1,
            region_name: "Mumbai".to_string(),
            population_density: 310_000,
            road_block_status: 2,
            severity_score: 42.5,
            warehouse_stock_status: ResourceMap::from([(Resource::Food, 10.0), (Resource::Water, 20.0)]),
            resource_needs: ResourceMap::from([(Resource::Food, 5.0)]),
            timestamp: Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
        }
    }

    #[test]
    fn document_uses_lowercase_resource_keys() {
        let document = record().to_document().unwrap();
        assert_eq!(document["warehouse_stock_status"]["food"], 10.0);
        assert_eq!(document["resource_needs"]["food"], 5.0);
        assert_eq!(SyntheticRecord::missing_field(&document), None);
    }

    #[test]
    fn missing_field_reports_first_absent_column() {
        let mut document = record().to_document().unwrap();
        document.as_object_mut().unwrap().remove("road_block_status");
        assert_eq!(SyntheticRecord::missing_field(&document), Some("road_block_status"));
        assert_eq!(SyntheticRecord::missing_field(&serde_json::json!(3)), Some("region_name"));
    }

    #[test]
    fn absent_resource_reads_as_zero() {
        let record = record();
        assert_eq!(record.need(Resource::Water), 0.0);
        assert_eq!(record.stock(Resource::Medical), 0.0);
    }
}
