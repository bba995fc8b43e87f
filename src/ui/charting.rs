/// X (session index) and Y (WPM) upper bounds for the progress chart
pub fn compute_chart_params(points: &[(f64, f64)]) -> (f64, f64) {
    let highest_wpm = points.iter().map(|&(_, wpm)| wpm).fold(0.0, f64::max);
    let last_x = points.last().map_or(1.0, |p| p.0).max(1.0);
    (last_x, highest_wpm.round())
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}
