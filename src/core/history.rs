//! Chart and list projections over stored aggregates and entries.
//!
//! All projections are total: a missing month is zero, a missing entry list is
//! empty. Nothing here touches the store.

use crate::{
    core::color::{ColorScaleRange, LegendStop, NormalizedColor, color_for, legend, text_color_for},
    models::{FootprintEntry, MonthlyAggregate},
};
use serde::Serialize;
use std::cmp::Reverse;

/// Short month names, January first.
pub const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Recent entries shown when no limit is configured.
pub const DEFAULT_RECENT_LIMIT: u64 = 5;

/// Monthly average footprint for `year`, January at index 0.
///
/// Months without an aggregate are `0.0`. Aggregates for other years, or with
/// a month outside 1-12, are ignored.
#[must_use]
pub fn project_year(aggregates: &[MonthlyAggregate], year: i32) -> [f64; 12] {
    let mut months = [0.0; 12];
    for aggregate in aggregates.iter().filter(|a| a.year == year) {
        if let Some(slot) = month_index(aggregate.month).and_then(|i| months.get_mut(i)) {
            *slot = aggregate.average_footprint;
        }
    }
    months
}

/// The `limit` most recent entries, newest first. Ties on `created_at` keep the higher id first.
#[must_use]
pub fn project_recent(entries: &[FootprintEntry], limit: usize) -> Vec<FootprintEntry> {
    let mut recent = entries.to_vec();
    recent.sort_by_key(|entry| Reverse((entry.created_at, entry.id)));
    recent.truncate(limit);
    recent
}

/// One month in the heatmap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapCell {
    /// Calendar month, 1-12
    pub month: u32,
    /// Short month name
    pub label: &'static str,
    /// Average footprint, `0.0` when there is no data
    pub value: f64,
    /// Cell color
    pub color: NormalizedColor,
    /// Text drawn inside the cell; `None` for months without data
    pub text: Option<CellText>,
}

/// Value label drawn on a heatmap cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CellText {
    /// Average footprint rounded to a whole number
    pub rounded: f64,
    /// Label color chosen for contrast with the cell
    pub color: NormalizedColor,
}

/// Twelve heatmap cells for `year`, colored against `range`.
#[must_use]
pub fn project_heatmap(
    aggregates: &[MonthlyAggregate],
    year: i32,
    range: &ColorScaleRange,
) -> Vec<HeatmapCell> {
    project_year(aggregates, year)
        .into_iter()
        .zip(MONTH_LABELS)
        .zip(1u32..)
        .map(|((value, label), month)| HeatmapCell {
            month,
            label,
            value,
            color: color_for(value, range),
            text: (value > 0.0).then(|| CellText {
                rounded: value.round(),
                color: text_color_for(value, range),
            }),
        })
        .collect()
}

/// Distinct years that have at least one aggregate, ascending.
#[must_use]
pub fn years_with_data(aggregates: &[MonthlyAggregate]) -> Vec<i32> {
    let mut years: Vec<i32> = aggregates.iter().map(|a| a.year).collect();
    years.sort_unstable();
    years.dedup();
    years
}

/// Everything one history screen render needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryView {
    /// Year being shown
    pub year: i32,
    /// Monthly averages for the line chart, January first
    pub monthly_averages: [f64; 12],
    /// Heatmap cells for `year`
    pub heatmap: Vec<HeatmapCell>,
    /// Scale derived from every loaded aggregate, not only `year`
    pub scale: ColorScaleRange,
    /// Low / medium / high legend for `scale`
    pub legend: [LegendStop; 3],
    /// Years that have data, for the year picker
    pub years: Vec<i32>,
    /// Most recent entries, newest first
    pub recent: Vec<FootprintEntry>,
}

/// Builds a [`HistoryView`] from everything loaded for a user.
#[must_use]
pub fn build_history_view(
    aggregates: &[MonthlyAggregate],
    entries: &[FootprintEntry],
    year: i32,
    recent_limit: usize,
) -> HistoryView {
    let scale = ColorScaleRange::from_averages(aggregates.iter().map(|a| a.average_footprint));

    HistoryView {
        year,
        monthly_averages: project_year(aggregates, year),
        heatmap: project_heatmap(aggregates, year, &scale),
        scale,
        legend: legend(&scale),
        years: years_with_data(aggregates),
        recent: project_recent(entries, recent_limit),
    }
}

fn month_index(month: u32) -> Option<usize> {
    if (1..=12).contains(&month) {
        usize::try_from(month - 1).ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::color::{DARK_TEXT, LIGHT_TEXT, NEUTRAL_COLOR};
    use crate::test_utils::{sample_aggregate, sample_entry};
    use chrono::Duration;

    #[test]
    fn test_project_year_zero_fills_missing_months() {
        let aggregates = vec![sample_aggregate(2024, 3, 40.0)];
        assert_eq!(
            project_year(&aggregates, 2024),
            [0.0, 0.0, 40.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]
        );
    }

    #[test]
    fn test_project_year_ignores_other_years_and_bad_months() {
        let aggregates = vec![
            sample_aggregate(2023, 1, 99.0),
            sample_aggregate(2024, 12, 12.0),
            sample_aggregate(2024, 13, 500.0),
        ];
        let months = project_year(&aggregates, 2024);

        assert_eq!(months[0], 0.0);
        assert_eq!(months[11], 12.0);
        assert_eq!(months.iter().sum::<f64>(), 12.0);
    }

    #[test]
    fn test_project_year_sums_to_input_averages() {
        let aggregates = vec![
            sample_aggregate(2024, 1, 10.5),
            sample_aggregate(2024, 6, 20.25),
            sample_aggregate(2024, 11, 3.0),
        ];
        let expected: f64 = aggregates.iter().map(|a| a.average_footprint).sum();
        let months = project_year(&aggregates, 2024);

        assert_eq!(months.len(), 12);
        assert!((months.iter().sum::<f64>() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_project_year_empty_input() {
        assert_eq!(project_year(&[], 2024), [0.0; 12]);
    }

    #[test]
    fn test_project_recent_orders_newest_first_and_truncates() {
        let mut entries: Vec<FootprintEntry> = (1..=8)
            .map(|id| sample_entry(id, 2024, 3, 10.0))
            .collect();
        for entry in &mut entries {
            entry.created_at += Duration::minutes(entry.id * 10);
        }
        entries.swap(0, 5);

        let recent = project_recent(&entries, 5);
        let ids: Vec<i64> = recent.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![8, 7, 6, 5, 4]);
        assert_eq!(recent[0], entries.iter().find(|e| e.id == 8).unwrap().clone());
    }

    #[test]
    fn test_project_recent_breaks_ties_by_id() {
        let entries = vec![sample_entry(1, 2024, 3, 1.0), sample_entry(2, 2024, 3, 2.0)];
        let recent = project_recent(&entries, 10);
        assert_eq!(recent.iter().map(|e| e.id).collect::<Vec<_>>(), vec![2, 1]);
    }

    #[test]
    fn test_project_recent_zero_limit_is_empty() {
        let entries = vec![sample_entry(1, 2024, 3, 1.0)];
        assert!(project_recent(&entries, 0).is_empty());
        assert!(project_recent(&[], 5).is_empty());
    }

    #[test]
    fn test_heatmap_cells_use_labels_and_colors() {
        let aggregates = vec![sample_aggregate(2024, 2, 5.0), sample_aggregate(2024, 7, 50.0)];
        let range = ColorScaleRange { min: 5.0, max: 50.0 };
        let cells = project_heatmap(&aggregates, 2024, &range);

        assert_eq!(cells.len(), 12);
        assert_eq!(cells[0].label, "Jan");
        assert_eq!(cells[0].color, NEUTRAL_COLOR);
        assert_eq!(cells[1].month, 2);
        assert_eq!((cells[1].color.r, cells[1].color.g), (0, 255));
        assert_eq!(cells[6].label, "Jul");
        assert_eq!((cells[6].color.r, cells[6].color.g), (255, 0));
    }

    #[test]
    fn test_heatmap_text_contrasts_with_cell() {
        let aggregates = vec![
            sample_aggregate(2024, 2, 5.4),
            sample_aggregate(2024, 5, 27.5),
            sample_aggregate(2024, 7, 49.6),
        ];
        let range = ColorScaleRange { min: 5.0, max: 50.0 };
        let cells = project_heatmap(&aggregates, 2024, &range);

        assert_eq!(cells[0].text, None);
        assert_eq!(
            cells[1].text,
            Some(CellText { rounded: 5.0, color: DARK_TEXT })
        );
        assert_eq!(cells[4].text.unwrap().color, DARK_TEXT);
        assert_eq!(
            cells[6].text,
            Some(CellText { rounded: 50.0, color: LIGHT_TEXT })
        );
    }

    #[test]
    fn test_years_with_data() {
        let aggregates = vec![
            sample_aggregate(2025, 1, 1.0),
            sample_aggregate(2023, 4, 1.0),
            sample_aggregate(2025, 2, 1.0),
        ];
        assert_eq!(years_with_data(&aggregates), vec![2023, 2025]);
    }

    #[test]
    fn test_history_view_scales_across_all_years() {
        let aggregates = vec![
            sample_aggregate(2023, 5, 200.0),
            sample_aggregate(2024, 3, 40.0),
            sample_aggregate(2024, 4, 120.0),
        ];
        let entries = vec![sample_entry(1, 2024, 4, 120.0)];

        let view = build_history_view(&aggregates, &entries, 2024, 5);

        assert_eq!(view.scale, ColorScaleRange { min: 40.0, max: 200.0 });
        assert_eq!(view.monthly_averages[2], 40.0);
        assert_eq!(view.monthly_averages[3], 120.0);
        assert_eq!(view.heatmap[2].color.g, 255);
        assert_eq!(view.legend[2].value, 200.0);
        assert_eq!(view.years, vec![2023, 2024]);
        assert_eq!(view.recent.len(), 1);
    }
}
