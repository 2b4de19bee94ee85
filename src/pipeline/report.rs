use crate::detect::DetectionOutcome;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Result for one submitted frame, in submission order.
#[derive(Debug, Clone, Serialize)]
pub struct FrameReport {
    /// 1-based ordinal within the run.
    pub frame: usize,
    /// Source frame position the sample was taken from.
    pub position: usize,
    /// `None` means the submission produced no data; `Some(vec![])` means
    /// the API returned zero detections. The two render distinctly.
    pub plaques: Option<Vec<String>>,
}

impl FrameReport {
    pub fn render_lines(&self) -> Vec<String> {
        match &self.plaques {
            None => vec![format!("Frame {}: no data (submission failed)", self.frame)],
            Some(plaques) if plaques.is_empty() => {
                vec![format!("Frame {}: no plaques detected", self.frame)]
            }
            Some(plaques) => {
                let mut lines = vec![format!("Frame {}:", self.frame)];
                for plaque in plaques {
                    lines.push(format!("- Plaque detected: {}", plaque));
                }
                lines
            }
        }
    }
}

/// Aggregated report for one video run.
#[derive(Debug, Clone, Serialize)]
pub struct VideoReport {
    pub source: String,
    pub frames_sampled: usize,
    pub generated_at: DateTime<Utc>,
    pub frames: Vec<FrameReport>,
}

/// Result for one independently submitted image.
#[derive(Debug, Clone)]
pub struct ImageReport {
    pub name: String,
    pub outcome: DetectionOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_data_and_zero_detections_render_distinctly() {
        let no_data = FrameReport {
            frame: 1,
            position: 0,
            plaques: None,
        };
        let empty = FrameReport {
            frame: 2,
            position: 10,
            plaques: Some(Vec::new()),
        };
        assert_ne!(no_data.render_lines(), empty.render_lines());
        assert!(no_data.render_lines()[0].contains("no data"));
        assert!(empty.render_lines()[0].contains("no plaques detected"));
    }

    #[test]
    fn detected_plaques_render_one_line_each() {
        let report = FrameReport {
            frame: 3,
            position: 40,
            plaques: Some(vec!["ABC123".to_string(), "XYZ789".to_string()]),
        };
        let lines = report.render_lines();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("ABC123"));
        assert!(lines[2].contains("XYZ789"));
    }

    #[test]
    fn json_keeps_null_and_empty_list_apart() {
        let no_data = serde_json::to_value(FrameReport {
            frame: 1,
            position: 0,
            plaques: None,
        })
        .unwrap();
        let empty = serde_json::to_value(FrameReport {
            frame: 1,
            position: 0,
            plaques: Some(Vec::new()),
        })
        .unwrap();
        assert!(no_data["plaques"].is_null());
        assert!(empty["plaques"].as_array().unwrap().is_empty());
    }
}
