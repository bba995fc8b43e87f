use serde::{Deserialize, Serialize};

/// One session's speed on the long-term progress chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WpmPoint {
    pub timestamp: i64,
    pub wpm: u32,
    pub accuracy: u32,
}

impl WpmPoint {
    pub fn new(timestamp: i64, wpm: u32, accuracy: u32) -> Self {
        Self {
            timestamp,
            wpm,
            accuracy,
        }
    }
}

/// Chart coordinates: x is the point's index in the history, y its WPM.
pub fn chart_points(history: &[WpmPoint]) -> Vec<(f64, f64)> {
    history
        .iter()
        .enumerate()
        .map(|(i, p)| (i as f64, p.wpm as f64))
        .collect()
}
