//! Threshold banding and the derived dashboard figures.
//!
//! All cutoffs are illustrative and strict: a severity of exactly 70 is
//! `High`, 2.0 days of supply is `Low`, and 3 blocked roads is `Moderate`.

use serde::{Deserialize, Serialize};

use crate::{city::Resource, record::SyntheticRecord};

pub const URGENT_DAYS_THRESHOLD: f64 = 3.0;

/// Stock divided by need, or infinity when nothing is needed.
pub fn days_remaining(stock: f64, need: f64) -> f64 {
    if need > 0.0 {
        stock / need
    } else {
        f64::INFINITY
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BandColor {
    Red,
    Orange,
    Yellow,
    Green,
}

impl BandColor {
    pub fn rgba(&self) -> &'static str {
        match self {
            BandColor::Red => "rgba(255,0,0,0.6)",
            BandColor::Orange => "rgba(255,165,0,0.6)",
            BandColor::Yellow => "rgba(255,255,0,0.6)",
            BandColor::Green => "rgba(0,255,0,0.6)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeverityBand {
    Critical,
    High,
    Moderate,
    Low,
}

impl SeverityBand {
    pub const ALL: [SeverityBand; 4] = [SeverityBand::Critical, SeverityBand::High, SeverityBand::Moderate, SeverityBand::Low];

    pub fn from_score(score: f64) -> SeverityBand {
        if score > 70.0 {
            SeverityBand::Critical
        } else if score > 50.0 {
            SeverityBand::High
        } else if score > 30.0 {
            SeverityBand::Moderate
        } else {
            SeverityBand::Low
        }
    }

    pub fn color(&self) -> BandColor {
        match self {
            SeverityBand::Critical => BandColor::Red,
            SeverityBand::High => BandColor::Orange,
            SeverityBand::Moderate => BandColor::Yellow,
            SeverityBand::Low => BandColor::Green,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SeverityBand::Critical => "Critical (>70)",
            SeverityBand::High => "High (50-70)",
            SeverityBand::Moderate => "Moderate (30-50)",
            SeverityBand::Low => "Low (<30)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SupplyBand {
    Critical,
    Low,
    Adequate,
}

impl SupplyBand {
    pub const ALL: [SupplyBand; 3] = [SupplyBand::Critical, SupplyBand::Low, SupplyBand::Adequate];

    pub fn from_days(days: f64) -> SupplyBand {
        if days < 2.0 {
            SupplyBand::Critical
        } else if days < 4.0 {
            SupplyBand::Low
        } else {
            SupplyBand::Adequate
        }
    }

    pub fn color(&self) -> BandColor {
        match self {
            SupplyBand::Critical => BandColor::Red,
            SupplyBand::Low => BandColor::Orange,
            SupplyBand::Adequate => BandColor::Green,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SupplyBand::Critical => "Critical (<2 days)",
            SupplyBand::Low => "Low (2-4 days)",
            SupplyBand::Adequate => "Adequate (>4 days)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoadBand {
    Severe,
    Moderate,
    Minor,
}

impl RoadBand {
    pub const ALL: [RoadBand; 3] = [RoadBand::Severe, RoadBand::Moderate, RoadBand::Minor];

    pub fn from_blocks(blocks: u32) -> RoadBand {
        if blocks > 3 {
            RoadBand::Severe
        } else if blocks > 1 {
            RoadBand::Moderate
        } else {
            RoadBand::Minor
        }
    }

    pub fn color(&self) -> BandColor {
        match self {
            RoadBand::Severe => BandColor::Red,
            RoadBand::Moderate => BandColor::Orange,
            RoadBand::Minor => BandColor::Green,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RoadBand::Severe => "Severe (>3 blocks)",
            RoadBand::Moderate => "Moderate (2-3 blocks)",
            RoadBand::Minor => "Minor (0-1 blocks)",
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapView {
    #[default]
    Severity,
    Food,
    Water,
    Medical,
    Roads,
}

impl MapView {
    pub const ALL: [MapView; 5] = [MapView::Severity, MapView::Food, MapView::Water, MapView::Medical, MapView::Roads];

    pub fn parse(name: &str) -> Option<MapView> {
        match name.to_ascii_lowercase().as_str() {
            "severity" => Some(MapView::Severity),
            "food" => Some(MapView::Food),
            "water" => Some(MapView::Water),
            "medical" => Some(MapView::Medical),
            "roads" => Some(MapView::Roads),
            _ => None,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            MapView::Severity => "Severity",
            MapView::Food => "Food",
            MapView::Water => "Water",
            MapView::Medical => "Medical",
            MapView::Roads => "Roads",
        }
    }

    fn resource(&self) -> Option<Resource> {
        match self {
            MapView::Food => Some(Resource::Food),
            MapView::Water => Some(Resource::Water),
            MapView::Medical => Some(Resource::Medical),
            MapView::Severity | MapView::Roads => None,
        }
    }

    pub fn legend(&self) -> Vec<LegendEntry> {
        let entries: Vec<(BandColor, &'static str)> = match self {
            MapView::Severity => SeverityBand::ALL.iter().map(|b| (b.color(), b.label())).collect(),
            MapView::Food | MapView::Water | MapView::Medical => SupplyBand::ALL.iter().map(|b| (b.color(), b.label())).collect(),
            MapView::Roads => RoadBand::ALL.iter().map(|b| (b.color(), b.label())).collect(),
        };
        entries
            .into_iter()
            .map(|(color, label)| LegendEntry { color, rgba: color.rgba().to_string(), label: label.to_string() })
            .collect()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MapStyle {
    #[default]
    Basic,
    Dark,
    Streets,
    Satellite,
}

impl MapStyle {
    pub const ALL: [MapStyle; 4] = [MapStyle::Basic, MapStyle::Dark, MapStyle::Streets, MapStyle::Satellite];

    pub fn parse(name: &str) -> Option<MapStyle> {
        MapStyle::ALL.into_iter().find(|style| style.name().eq_ignore_ascii_case(name))
    }

    pub fn name(&self) -> &'static str {
        match self {
            MapStyle::Basic => "Basic",
            MapStyle::Dark => "Dark",
            MapStyle::Streets => "Streets",
            MapStyle::Satellite => "Satellite",
        }
    }

    pub fn tile_style(&self) -> &'static str {
        match self {
            MapStyle::Basic => "carto-positron",
            MapStyle::Dark => "carto-darkmatter",
            MapStyle::Streets => "open-street-map",
            MapStyle::Satellite => "white-bg",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub color: BandColor,
    pub rgba: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerProperties {
    pub color: BandColor,
    pub rgba: String,
    pub status_text: String,
}

pub fn marker_properties(record: &SyntheticRecord, view: MapView) -> MarkerProperties {
    let (color, status_text) = match view.resource() {
        None if view == MapView::Roads => {
            let blocks = record.road_block_status;
            (RoadBand::from_blocks(blocks).color(), format!("Blocked roads: {blocks}"))
        }
        None => {
            let score = record.severity_score;
            (SeverityBand::from_score(score).color(), format!("Severity: {score:.1}"))
        }
        Some(resource) => {
            let days = days_remaining(record.stock(resource), record.need(resource));
            (SupplyBand::from_days(days).color(), format!("{}: {days:.1} days left", resource.display_name()))
        }
    };
    MarkerProperties { color, rgba: color.rgba().to_string(), status_text }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Low,
    Moderate,
    High,
    Critical,
}

impl Priority {
    pub fn from_severity(score: f64) -> Priority {
        match SeverityBand::from_score(score) {
            SeverityBand::Critical => Priority::Critical,
            SeverityBand::High => Priority::High,
            SeverityBand::Moderate => Priority::Moderate,
            SeverityBand::Low => Priority::Low,
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            Priority::Critical | Priority::High => "Urgent attention needed",
            Priority::Moderate => "Monitor closely",
            Priority::Low => "Situation stable",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Moderate => "MODERATE",
            Priority::High => "HIGH",
            Priority::Critical => "CRITICAL",
        }
    }

    /// Accent used by the recommendation cards.
    pub fn accent(&self) -> &'static str {
        match self {
            Priority::Critical => "red",
            Priority::High => "orange",
            Priority::Moderate => "blue",
            Priority::Low => "green",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub region: String,
    pub priority: Priority,
    pub action: String,
    pub urgent_resources: Vec<String>,
}

pub fn recommend(record: &SyntheticRecord) -> Recommendation {
    let mut urgent_resources = Vec::new();
    for (resource, stock) in &record.warehouse_stock_status {
        let need = record.need(*resource);
        let days = days_remaining(*stock, need);
        if days < URGENT_DAYS_THRESHOLD {
            urgent_resources.push(format!("{} (Stock: {stock:.1}, Need: {need:.1}, {days:.1} days left)", resource.as_str()));
        }
    }
    let priority = Priority::from_severity(record.severity_score);
    Recommendation {
        region: record.region_name.clone(),
        priority,
        action: priority.action().to_string(),
        urgent_resources,
    }
}

/// Recommendations ordered LOW, MODERATE, HIGH, CRITICAL; ties keep input order.
pub fn recommendations(records: &[SyntheticRecord]) -> Vec<Recommendation> {
    let mut recommendations = records.iter().map(recommend).collect::<Vec<_>>();
    recommendations.sort_by_key(|recommendation| recommendation.priority);
    recommendations
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub regions_monitored: usize,
    pub average_severity: Option<f64>,
    pub severity_delta: Option<f64>,
    pub blocked_roads: u64,
    pub total_population: u64,
}

pub fn average_severity(records: &[SyntheticRecord]) -> Option<f64> {
    if records.is_empty() {
        return None;
    }
    Some(records.iter().map(|r| r.severity_score).sum::<f64>() / records.len() as f64)
}

pub fn summarize(records: &[SyntheticRecord], previous: Option<&[SyntheticRecord]>) -> Summary {
    let average = average_severity(records);
    let severity_delta = match (average, previous.and_then(average_severity)) {
        (Some(current), Some(previous)) => Some(current - previous),
        _ => None,
    };
    Summary {
        regions_monitored: records.len(),
        average_severity: average,
        severity_delta,
        blocked_roads: records.iter().map(|r| u64::from(r.road_block_status)).sum(),
        total_population: records.iter().map(|r| r.population_density).sum(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceComparison {
    pub region: String,
    pub resource: Resource,
    pub available: f64,
    pub needed: f64,
}

pub fn resource_comparisons(records: &[SyntheticRecord]) -> Vec<ResourceComparison> {
    let mut rows = Vec::new();
    for record in records {
        for (resource, available) in &record.warehouse_stock_status {
            rows.push(ResourceComparison {
                region: record.region_name.clone(),
                resource: *resource,
                available: *available,
                needed: record.need(*resource),
            });
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Utc;

    use super::*;

    fn record(name: &str, severity: f64, blocks: u32, stock: f64, need: f64) -> SyntheticRecord {
        SyntheticRecord {
            region_id: 0,
            region_name: name.to_string(),
            population_density: 1000,
            road_block_status: blocks,
            severity_score: severity,
            warehouse_stock_status: BTreeMap::from([(Resource::Food, stock)]),
            resource_needs: BTreeMap::from([(Resource::Food, need)]),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn days_remaining_handles_zero_need() {
        assert_eq!(days_remaining(10.0, 5.0), 2.0);
        assert!(days_remaining(10.0, 0.0).is_infinite());
        assert!(days_remaining(0.0, 0.0).is_infinite());
    }

    #[test]
    fn severity_cutoffs_are_strict() {
        assert_eq!(SeverityBand::from_score(70.0), SeverityBand::High);
        assert_eq!(SeverityBand::from_score(70.01), SeverityBand::Critical);
        assert_eq!(SeverityBand::from_score(50.0), SeverityBand::Moderate);
        assert_eq!(SeverityBand::from_score(30.0), SeverityBand::Low);
        assert_eq!(SeverityBand::from_score(0.0), SeverityBand::Low);
        assert_eq!(SeverityBand::from_score(100.0), SeverityBand::Critical);
    }

    #[test]
    fn supply_and_road_cutoffs() {
        assert_eq!(SupplyBand::from_days(2.0), SupplyBand::Low);
        assert_eq!(SupplyBand::from_days(1.99), SupplyBand::Critical);
        assert_eq!(SupplyBand::from_days(4.0), SupplyBand::Adequate);
        assert_eq!(SupplyBand::from_days(f64::INFINITY), SupplyBand::Adequate);
        assert_eq!(RoadBand::from_blocks(3), RoadBand::Moderate);
        assert_eq!(RoadBand::from_blocks(4), RoadBand::Severe);
        assert_eq!(RoadBand::from_blocks(1), RoadBand::Minor);
    }

    #[test]
    fn severity_bands_are_monotone() {
        let rank = |band: SeverityBand| SeverityBand::ALL.iter().position(|b| *b == band).unwrap();
        let mut last = rank(SeverityBand::from_score(0.0));
        for step in 0..=1000 {
            let current = rank(SeverityBand::from_score(step as f64 / 10.0));
            assert!(current <= last);
            last = current;
        }
    }

    #[test]
    fn stock_ten_need_five_is_low_not_critical() {
        let marker = marker_properties(&record("Delhi", 10.0, 0, 10.0, 5.0), MapView::Food);
        assert_eq!(marker.color, SupplyBand::Low.color());
        assert_eq!(marker.status_text, "Food: 2.0 days left");
        assert_eq!(SupplyBand::from_days(days_remaining(10.0, 5.0)).label(), "Low (2-4 days)");
    }

    #[test]
    fn markers_for_severity_and_roads() {
        let r = record("Delhi", 75.0, 3, 1.0, 1.0);
        let severity = marker_properties(&r, MapView::Severity);
        assert_eq!(severity.color, BandColor::Red);
        assert_eq!(severity.status_text, "Severity: 75.0");
        let roads = marker_properties(&r, MapView::Roads);
        assert_eq!(roads.color, BandColor::Orange);
        assert_eq!(roads.status_text, "Blocked roads: 3");
        let water = marker_properties(&r, MapView::Water);
        assert_eq!(water.status_text, "Water: inf days left");
        assert_eq!(water.color, BandColor::Green);
    }

    #[test]
    fn severity_75_is_critical_and_urgent() {
        let recommendation = recommend(&record("Mumbai", 75.0, 0, 10.0, 5.0));
        assert_eq!(recommendation.priority, Priority::Critical);
        assert_eq!(recommendation.priority.as_str(), "CRITICAL");
        assert_eq!(recommendation.action, "Urgent attention needed");
        assert_eq!(recommendation.urgent_resources, vec!["food (Stock: 10.0, Need: 5.0, 2.0 days left)".to_string()]);
    }

    #[test]
    fn recommendations_sorted_regardless_of_input_order() {
        let records = vec![
            record("a", 80.0, 0, 1.0, 0.0),
            record("b", 10.0, 0, 1.0, 0.0),
            record("c", 60.0, 0, 1.0, 0.0),
            record("d", 40.0, 0, 1.0, 0.0),
            record("e", 5.0, 0, 1.0, 0.0),
        ];
        let expected = vec![Priority::Low, Priority::Low, Priority::Moderate, Priority::High, Priority::Critical];
        for rotation in 0..records.len() {
            let mut rotated = records.clone();
            rotated.rotate_left(rotation);
            let priorities = recommendations(&rotated).iter().map(|r| r.priority).collect::<Vec<_>>();
            assert_eq!(priorities, expected);
        }
        let sorted = recommendations(&records);
        assert_eq!(sorted[0].region, "b");
        assert_eq!(sorted[1].region, "e");
        assert!(sorted[0].urgent_resources.is_empty());
    }

    #[test]
    fn priority_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Priority::Moderate).unwrap(), "\"MODERATE\"");
        assert_eq!(Priority::Moderate.action(), "Monitor closely");
        assert_eq!(Priority::Low.action(), "Situation stable");
    }

    #[test]
    fn summary_reports_delta_against_previous() {
        let previous = vec![record("a", 20.0, 1, 1.0, 1.0), record("b", 40.0, 0, 1.0, 1.0)];
        let current = vec![record("a", 50.0, 2, 1.0, 1.0), record("b", 30.0, 3, 1.0, 1.0)];
        let summary = summarize(&current, Some(&previous));
        assert_eq!(summary.regions_monitored, 2);
        assert_eq!(summary.average_severity, Some(40.0));
        assert_eq!(summary.severity_delta, Some(10.0));
        assert_eq!(summary.blocked_roads, 5);
        assert_eq!(summary.total_population, 2000);
        assert_eq!(summarize(&[], None).average_severity, None);
        assert_eq!(summarize(&current, None).severity_delta, None);
    }

    #[test]
    fn legends_follow_view() {
        let labels = MapView::Roads.legend().into_iter().map(|e| e.label).collect::<Vec<_>>();
        assert_eq!(labels, vec!["Severe (>3 blocks)", "Moderate (2-3 blocks)", "Minor (0-1 blocks)"]);
        assert_eq!(MapView::Severity.legend().len(), 4);
        assert_eq!(MapView::parse("Medical"), Some(MapView::Medical));
        assert_eq!(MapStyle::parse("dark").map(|s| s.tile_style()), Some("carto-darkmatter"));
    }

    #[test]
    fn resource_comparison_rows() {
        let rows = resource_comparisons(&[record("Delhi", 1.0, 0, 10.0, 4.0)]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].available, 10.0);
        assert_eq!(rows[0].needed, 4.0);
    }
}
