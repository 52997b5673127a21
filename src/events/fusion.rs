// Event fusion
// Merges detector outputs into one ascending list of segment boundaries

/// Merge two timestamp lists, sort, and drop events closer than `min_gap`
/// seconds to the last kept event. The earliest event always survives.
pub fn fuse_events(transients: &[f64], onsets: &[f64], min_gap: f64) -> Vec<f64> {
    let mut all: Vec<f64> = transients.iter().chain(onsets.iter()).copied().collect();
    all.sort_by(|a, b| a.total_cmp(b));

    let mut kept: Vec<f64> = Vec::with_capacity(all.len());
    for event in all {
        match kept.last() {
            Some(&last) if event - last < min_gap => {}
            _ => kept.push(event),
        }
    }

    kept
}
