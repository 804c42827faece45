//! Rolling frame-rate tracker for the window title.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Frames averaged over
const WINDOW: usize = 60;

pub struct FpsTracker {
    frame_times: VecDeque<Duration>,
    last_frame: Instant,
    last_report: Instant,
    report_interval: Duration,
}

impl FpsTracker {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            frame_times: VecDeque::with_capacity(WINDOW + 1),
            last_frame: now,
            last_report: now,
            report_interval: Duration::from_secs(1),
        }
    }

    /// Record a frame ending now; returns the average FPS once per interval
    pub fn record_frame(&mut self) -> Option<f32> {
        let now = Instant::now();
        let frame_time = now - self.last_frame;
        self.last_frame = now;
        self.push(frame_time);

        if now - self.last_report >= self.report_interval {
            self.last_report = now;
            Some(self.current_fps())
        } else {
            None
        }
    }

    fn push(&mut self, frame_time: Duration) {
        self.frame_times.push_back(frame_time);
        if self.frame_times.len() > WINDOW {
            self.frame_times.pop_front();
        }
    }

    pub fn current_fps(&self) -> f32 {
        if self.frame_times.is_empty() {
            return 0.0;
        }
        let total: Duration = self.frame_times.iter().sum();
        let avg_frame_time = total.as_secs_f32() / self.frame_times.len() as f32;
        if avg_frame_time > 0.0 {
            1.0 / avg_frame_time
        } else {
            0.0
        }
    }
}

impl Default for FpsTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_tracker_reports_zero() {
        assert_eq!(FpsTracker::new().current_fps(), 0.0);
    }

    #[test]
    fn test_average_over_window() {
        let mut fps = FpsTracker::new();
        for _ in 0..10 {
            fps.push(Duration::from_millis(20));
        }
        assert!((fps.current_fps() - 50.0).abs() < 0.01);
    }

    #[test]
    fn test_window_drops_old_frames() {
        let mut fps = FpsTracker::new();
        for _ in 0..WINDOW {
            fps.push(Duration::from_millis(100));
        }
        for _ in 0..WINDOW {
            fps.push(Duration::from_millis(10));
        }
        assert_eq!(fps.frame_times.len(), WINDOW);
        assert!((fps.current_fps() - 100.0).abs() < 0.01);
    }
}
