use crate::models::{AnalysisResult, HourlyCurve, Sample};
use chrono::{FixedOffset, Timelike};
use std::collections::BTreeMap;

pub fn analyze_samples(samples: &[Sample], offset: FixedOffset) -> Option<AnalysisResult> {
    let raw = bucket_by_hour(samples, offset);
    let curve = smooth(&raw);
    let best_hour = best_hour(&curve)?;
    let confidence = confidence(&curve);

    Some(AnalysisResult {
        curve,
        best_hour,
        confidence,
    })
}

pub fn bucket_by_hour(samples: &[Sample], offset: FixedOffset) -> HourlyCurve {
    let mut buckets: BTreeMap<u8, (f64, u32)> = BTreeMap::new();
    for sample in samples {
        let hour = sample.timestamp.with_timezone(&offset).hour() as u8;
        let entry = buckets.entry(hour).or_insert((0.0, 0));
        entry.0 += sample.value;
        entry.1 += 1;
    }

    buckets
        .into_iter()
        .map(|(hour, (sum, count))| (hour, sum / f64::from(count)))
        .collect()
}

/// Centered moving average over the previous, current and next hour.
///
/// Only hours present in the curve count as neighbours and 23 is not adjacent
/// to 0, so edge buckets average over fewer values. The key set is unchanged.
pub fn smooth(curve: &HourlyCurve) -> HourlyCurve {
    curve
        .hours()
        .map(|hour| {
            let window = [hour.checked_sub(1), Some(hour), hour.checked_add(1)];
            let (sum, count) = window
                .into_iter()
                .flatten()
                .filter_map(|neighbour| curve.get(neighbour))
                .fold((0.0, 0u32), |(sum, count), value| (sum + value, count + 1));
            (hour, sum / f64::from(count))
        })
        .collect()
}

pub fn best_hour(curve: &HourlyCurve) -> Option<u8> {
    let mut best: Option<(u8, f64)> = None;
    for (hour, value) in curve.iter() {
        match best {
            Some((_, top)) if value <= top => {}
            _ => best = Some((hour, value)),
        }
    }
    best.map(|(hour, _)| hour)
}

/// `100 * (1 - stddev / mean)` clamped to [0, 100], using the population
/// standard deviation. `None` for an empty curve or a zero mean.
pub fn confidence(curve: &HourlyCurve) -> Option<f64> {
    if curve.is_empty() {
        return None;
    }

    let count = curve.len() as f64;
    let mean = curve.values().sum::<f64>() / count;
    if mean == 0.0 || !mean.is_finite() {
        return None;
    }

    let variance = curve.values().map(|v| (v - mean).powi(2)).sum::<f64>() / count;
    let score = (1.0 - variance.sqrt() / mean) * 100.0;
    if score.is_finite() {
        Some(score.clamp(0.0, 100.0))
    } else {
        None
    }
}
