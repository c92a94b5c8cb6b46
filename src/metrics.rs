use crate::model::SeriesStats;

/// Compute min / max / mean / last over the finite values of a series.
/// NaN cells (unparsable artifact values) are skipped.
pub fn compute_stats(values: &[f64]) -> Option<SeriesStats> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let last = *finite.last()?;
    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = finite.iter().sum::<f64>() / finite.len() as f64;
    Some(SeriesStats {
        min,
        max,
        mean,
        last,
    })
}

/// Compute stats from (time, value) points, using only the y-values
pub fn compute_series_stats(points: &[(f64, f64)]) -> Option<SeriesStats> {
    let values: Vec<f64> = points.iter().map(|(_, y)| *y).collect();
    compute_stats(&values)
}
