use std::{collections::BTreeMap, time::Duration};

use chrono::{DateTime, Local, Utc};
use relief_data::{
    analysis::{
        marker_properties, recommendations, resource_comparisons, summarize, BandColor, LegendEntry, MapStyle, MapView,
        MarkerProperties, Recommendation, ResourceComparison, SeverityBand, Summary,
    },
    city::find_city,
    SyntheticRecord,
};
use serde::Serialize;

use crate::context::Snapshot;

pub const MAP_CENTER: LatLon = LatLon { lat: 20.5937, lon: 78.9629 };
pub const MAP_ZOOM: u8 = 4;
pub const NO_DATA_WARNING: &str = "No valid data available for map visualization.";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Marker {
    pub region: String,
    pub position: LatLon,
    #[serde(flatten)]
    pub properties: MarkerProperties,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendPoint {
    pub timestamp: DateTime<Utc>,
    pub severity_score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendTrace {
    pub name: String,
    pub position: LatLon,
    pub points: Vec<TrendPoint>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MapFrame {
    pub title: String,
    pub view: MapView,
    pub style: MapStyle,
    pub tile_style: &'static str,
    pub center: LatLon,
    pub zoom: u8,
    pub markers: Vec<Marker>,
    pub legend: Vec<LegendEntry>,
    pub trends: Vec<TrendTrace>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeverityBar {
    pub region: String,
    pub severity_score: f64,
    pub color: BandColor,
    pub rgba: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Frame {
    pub last_updated: String,
    pub refresh_seconds: u64,
    pub summary: Summary,
    pub map: MapFrame,
    pub severity_chart: Vec<SeverityBar>,
    pub resource_chart: Vec<ResourceComparison>,
    pub recommendations: Vec<Recommendation>,
    pub warnings: Vec<String>,
}

fn markers(records: &[SyntheticRecord], view: MapView) -> Vec<Marker> {
    records
        .iter()
        .filter_map(|record| {
            let city = find_city(&record.region_name)?;
            Some(Marker {
                region: record.region_name.clone(),
                position: LatLon { lat: city.coordinates.lat, lon: city.coordinates.lon },
                properties: marker_properties(record, view),
            })
        })
        .collect()
}

/// One trace per currently shown city, built from its recent history.
fn trends(records: &[SyntheticRecord], history: &[SyntheticRecord]) -> Vec<TrendTrace> {
    let mut by_city: BTreeMap<&str, Vec<TrendPoint>> = BTreeMap::new();
    for record in history {
        by_city
            .entry(record.region_name.as_str())
            .or_default()
            .push(TrendPoint { timestamp: record.timestamp, severity_score: record.severity_score });
    }
    records
        .iter()
        .filter_map(|record| {
            let city = find_city(&record.region_name)?;
            let points = by_city.remove(record.region_name.as_str())?;
            Some(TrendTrace {
                name: format!("{} Trend", record.region_name),
                position: LatLon { lat: city.coordinates.lat, lon: city.coordinates.lon },
                points,
            })
        })
        .collect()
}

fn severity_chart(records: &[SyntheticRecord]) -> Vec<SeverityBar> {
    records
        .iter()
        .map(|record| {
            let color = SeverityBand::from_score(record.severity_score).color();
            SeverityBar {
                region: record.region_name.clone(),
                severity_score: record.severity_score,
                color,
                rgba: color.rgba(),
            }
        })
        .collect()
}

pub fn render_frame(
    snapshot: &Snapshot,
    previous: Option<&[SyntheticRecord]>,
    view: MapView,
    style: MapStyle,
    refresh_interval: Duration,
    now: DateTime<Local>,
) -> Frame {
    let records = snapshot.records.as_slice();
    let mut warnings = snapshot.warnings.clone();
    if records.is_empty() {
        warnings.push(NO_DATA_WARNING.to_string());
    }

    Frame {
        last_updated: now.format("%Y-%m-%d %H:%M:%S").to_string(),
        refresh_seconds: refresh_interval.as_secs(),
        summary: summarize(records, previous),
        map: MapFrame {
            title: format!("Real-time {} Status Map", view.title()),
            view,
            style,
            tile_style: style.tile_style(),
            center: MAP_CENTER,
            zoom: MAP_ZOOM,
            markers: markers(records, view),
            legend: view.legend(),
            trends: trends(records, &snapshot.history),
        },
        severity_chart: severity_chart(records),
        resource_chart: resource_comparisons(records),
        recommendations: recommendations(records),
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration as ChronoDuration;
    use relief_data::{analysis::Priority, Resource};

    use super::*;

    fn record(region_id: u8, name: &str, severity: f64, blocks: u32) -> SyntheticRecord {
        SyntheticRecord {
            region_id,
            region_name: name.to_string(),
            population_density: 1_000,
            road_block_status: blocks,
            severity_score: severity,
            warehouse_stock_status: BTreeMap::from([(Resource::Food, 10.0), (Resource::Water, 50.0)]),
            resource_needs: BTreeMap::from([(Resource::Food, 5.0), (Resource::Water, 5.0)]),
            timestamp: Utc::now(),
        }
    }

    fn snapshot() -> Snapshot {
        let records = vec![record(0, "Delhi", 75.0, 4), record(1, "Mumbai", 20.0, 0), record(2, "Atlantis", 55.0, 2)];
        let mut old = record(0, "Delhi", 40.0, 1);
        old.timestamp -= ChronoDuration::hours(2);
        Snapshot { history: vec![old, records[0].clone()], records, warnings: Vec::new() }
    }

    #[test]
    fn frame_carries_every_widget() {
        let frame = render_frame(&snapshot(), None, MapView::Food, MapStyle::Dark, Duration::from_secs(3), Local::now());

        assert!(frame.warnings.is_empty());
        assert_eq!(frame.refresh_seconds, 3);
        assert_eq!(frame.summary.regions_monitored, 3);
        assert_eq!(frame.summary.blocked_roads, 6);
        assert_eq!(frame.summary.severity_delta, None);

        assert_eq!(frame.map.title, "Real-time Food Status Map");
        assert_eq!(frame.map.tile_style, "carto-darkmatter");
        assert_eq!(frame.map.center, MAP_CENTER);
        // unknown cities get no marker
        assert_eq!(frame.map.markers.len(), 2);
        assert_eq!(frame.map.markers[0].properties.status_text, "Food: 2.0 days left");
        assert_eq!(frame.map.legend.len(), 3);

        assert_eq!(frame.map.trends.len(), 1);
        assert_eq!(frame.map.trends[0].name, "Delhi Trend");
        assert_eq!(frame.map.trends[0].points.len(), 2);

        assert_eq!(frame.severity_chart[0].rgba, "rgba(255,0,0,0.6)");
        assert_eq!(frame.resource_chart.len(), 6);
        let priorities = frame.recommendations.iter().map(|r| r.priority).collect::<Vec<_>>();
        assert_eq!(priorities, vec![Priority::Low, Priority::High, Priority::Critical]);
    }

    #[test]
    fn delta_against_previous_frame() {
        let previous = vec![record(0, "Delhi", 30.0, 0)];
        let frame = render_frame(&snapshot(), Some(&previous), MapView::Severity, MapStyle::Basic, Duration::from_secs(3), Local::now());
        assert_eq!(frame.summary.severity_delta, Some(20.0));
        assert_eq!(frame.map.markers[0].properties.status_text, "Severity: 75.0");
    }

    #[test]
    fn empty_snapshot_renders_with_warnings() {
        let empty = Snapshot { warnings: vec!["Data loading error: store unavailable".to_string()], ..Snapshot::default() };
        let frame = render_frame(&empty, None, MapView::Roads, MapStyle::Basic, Duration::from_secs(3), Local::now());
        assert_eq!(frame.warnings, vec!["Data loading error: store unavailable".to_string(), NO_DATA_WARNING.to_string()]);
        assert!(frame.map.markers.is_empty());
        assert!(frame.recommendations.is_empty());
        assert_eq!(frame.summary.average_severity, None);
        assert_eq!(frame.map.legend.len(), 3);
    }
}
