//! Frame pacing
//!
//! The host calls in on every display refresh. The scheduler decides whether a
//! simulation frame is due at the currently requested rate, and keeps a small
//! FPS estimate for diagnostics.

use serde::Serialize;

use crate::settings::Settings;
use crate::sim::TickRate;

/// Slack allowed for display refresh jitter (ms)
const VSYNC_TOLERANCE_MS: f64 = 2.0;
/// Longest frame delta fed to the simulation (ms)
const MAX_FRAME_DT_MS: f64 = 100.0;
/// Frames averaged for the FPS estimate
const FPS_WINDOW: usize = 60;

/// Rolling frame statistics
#[derive(Debug, Clone, Serialize)]
pub struct FrameStats {
    /// Frames actually simulated
    pub frames: u64,
    /// Display refreshes skipped by throttling
    pub skipped: u64,
    /// Estimated simulated frames per second
    pub fps: u32,
    #[serde(skip)]
    frame_times: [f64; FPS_WINDOW],
    #[serde(skip)]
    frame_index: usize,
}

impl Default for FrameStats {
    fn default() -> Self {
        Self {
            frames: 0,
            skipped: 0,
            fps: 0,
            frame_times: [0.0; FPS_WINDOW],
            frame_index: 0,
        }
    }
}

impl FrameStats {
    fn record(&mut self, now_ms: f64) {
        self.frames += 1;
        self.frame_times[self.frame_index] = now_ms;
        self.frame_index = (self.frame_index + 1) % FPS_WINDOW;

        // Oldest entry is the one about to be overwritten
        if self.frames >= FPS_WINDOW as u64 {
            let oldest = self.frame_times[self.frame_index];
            let elapsed = now_ms - oldest;
            if elapsed > 0.0 {
                self.fps = ((FPS_WINDOW - 1) as f64 * 1000.0 / elapsed).round() as u32;
            }
        }
    }
}

/// Throttles display refreshes down to the requested tick rate
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    idle_fps: u32,
    active_fps: u32,
    rate: TickRate,
    last_frame_ms: Option<f64>,
    stats: FrameStats,
}

impl FrameScheduler {
    pub fn new(settings: &Settings) -> Self {
        Self {
            idle_fps: settings.idle_fps.max(1),
            active_fps: settings.active_fps.max(1),
            // Start fast: a fresh field is still rising
            rate: TickRate::High,
            last_frame_ms: None,
            stats: FrameStats::default(),
        }
    }

    pub fn rate(&self) -> TickRate {
        self.rate
    }

    /// Frames per second for the current rate
    pub fn fps_target(&self) -> u32 {
        match self.rate {
            TickRate::Low => self.idle_fps,
            TickRate::High => self.active_fps,
        }
    }

    pub fn interval_ms(&self) -> f64 {
        1000.0 / self.fps_target() as f64
    }

    pub fn set_rate(&mut self, rate: TickRate) {
        if rate != self.rate {
            log::debug!("Tick rate {:?} -> {:?}", self.rate, rate);
            self.rate = rate;
        }
    }

    /// Force the next refresh to run (a click must be seen on the very next frame)
    pub fn wake(&mut self) {
        self.set_rate(TickRate::High);
        self.last_frame_ms = None;
    }

    /// Called on every display refresh; returns the frame delta when a frame is due
    pub fn poll(&mut self, now_ms: f64) -> Option<f64> {
        let dt = match self.last_frame_ms {
            None => self.interval_ms(),
            Some(last) => {
                let elapsed = now_ms - last;
                if elapsed < self.interval_ms() - VSYNC_TOLERANCE_MS {
                    self.stats.skipped += 1;
                    return None;
                }
                elapsed
            }
        };
        self.last_frame_ms = Some(now_ms);
        self.stats.record(now_ms);
        Some(dt.clamp(0.0, MAX_FRAME_DT_MS))
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REFRESH_MS: f64 = 1000.0 / 60.0;

    fn run_refreshes(scheduler: &mut FrameScheduler, count: usize) -> usize {
        (1..=count)
            .filter(|&i| scheduler.poll(i as f64 * REFRESH_MS).is_some())
            .count()
    }

    #[test]
    fn test_high_rate_runs_every_refresh() {
        let mut scheduler = FrameScheduler::new(&Settings::default());
        assert_eq!(scheduler.fps_target(), 60);
        assert_eq!(run_refreshes(&mut scheduler, 120), 120);
    }

    #[test]
    fn test_low_rate_halves_frames() {
        let mut scheduler = FrameScheduler::new(&Settings::default());
        scheduler.set_rate(TickRate::Low);
        assert_eq!(scheduler.fps_target(), 30);
        let ran = run_refreshes(&mut scheduler, 120);
        assert_eq!(ran, 60);
        assert_eq!(scheduler.stats().skipped, 60);
    }

    #[test]
    fn test_wake_runs_next_refresh() {
        let mut scheduler = FrameScheduler::new(&Settings::default());
        scheduler.set_rate(TickRate::Low);
        assert!(scheduler.poll(100.0).is_some());
        assert!(scheduler.poll(100.0 + REFRESH_MS).is_none());
        scheduler.wake();
        assert_eq!(scheduler.rate(), TickRate::High);
        assert!(scheduler.poll(100.0 + 2.0 * REFRESH_MS).is_some());
    }

    #[test]
    fn test_long_gap_clamped() {
        let mut scheduler = FrameScheduler::new(&Settings::default());
        scheduler.poll(0.0);
        let dt = scheduler.poll(5000.0).unwrap();
        assert_eq!(dt, MAX_FRAME_DT_MS);
    }

    #[test]
    fn test_fps_estimate() {
        let mut scheduler = FrameScheduler::new(&Settings::default());
        run_refreshes(&mut scheduler, 180);
        assert_eq!(scheduler.stats().fps, 60);
    }
}
