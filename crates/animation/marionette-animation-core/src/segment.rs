//! Splitting raw `(time, value)` samples into segments (import/diagnostic use).

use log::warn;

/// Split samples into one segment per whole-second window.
///
/// Windows start at `floor(first time)`. Each segment holds the samples inside
/// its window plus the bracketing samples of the neighbouring windows, so a
/// segment can be sampled on its own over its whole window. A window without
/// samples of its own gets the pair that spans it, as long as the total stays
/// within the number of kept samples; past that, the segment closing before
/// the gap already spans the remaining empty windows.
///
/// Samples whose time is not finite or does not strictly follow the previous
/// kept sample are discarded. Every segment is non-empty and strictly
/// increasing, and there are never more segments than samples.
pub fn split_by_time<V: Clone>(samples: &[(f32, V)]) -> Vec<Vec<(f32, V)>> {
    let ordered = strictly_increasing(samples);
    let mut segments = Vec::new();
    let Some(first) = ordered.first() else {
        return segments;
    };

    let occupied = 1 + ordered
        .windows(2)
        .filter(|pair| window_of(pair[1].0) > window_of(pair[0].0))
        .count();
    let mut bridges = ordered.len() - occupied;

    let mut window = window_of(first.0);
    let mut last = first.clone();
    let mut segment: Vec<(f32, V)> = vec![first.clone()];

    for item in ordered.into_iter().skip(1) {
        let t = window_of(item.0);
        if window < t {
            segment.push(item.clone());
            segments.push(std::mem::take(&mut segment));
            window += 1;
            while window < t && bridges > 0 {
                segments.push(vec![last.clone(), item.clone()]);
                bridges -= 1;
                window += 1;
            }
            window = t;
            segment.push(last.clone());
        }
        segment.push(item.clone());
        last = item;
    }
    segments.push(segment);
    segments
}

#[inline]
fn window_of(time: f32) -> i64 {
    time.floor() as i64
}

/// Split samples into maximal runs of strictly increasing time.
///
/// Out-of-order, duplicate-time and NaN samples start a new run. Never yields
/// more runs than samples; every run holds at least one sample.
pub fn split_monotonic_runs<V: Clone>(samples: &[(f32, V)]) -> Vec<Vec<(f32, V)>> {
    let mut runs = Vec::new();
    let mut current: Vec<(f32, V)> = Vec::new();
    for sample in samples {
        if let Some(prev) = current.last() {
            let increasing = sample.0 > prev.0;
            if !increasing {
                runs.push(std::mem::take(&mut current));
            }
        }
        current.push(sample.clone());
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

fn strictly_increasing<V: Clone>(samples: &[(f32, V)]) -> Vec<(f32, V)> {
    let mut out: Vec<(f32, V)> = Vec::with_capacity(samples.len());
    let mut dropped = 0usize;
    for sample in samples {
        let keep = sample.0.is_finite() && out.last().map_or(true, |prev| sample.0 > prev.0);
        if keep {
            out.push(sample.clone());
        } else {
            dropped += 1;
        }
    }
    if dropped > 0 {
        warn!("discarded {dropped} out-of-order or duplicate-time samples");
    }
    out
}
