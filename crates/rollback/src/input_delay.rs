//! Input delay estimation from round-trip-time samples.
//!
//! Recommended delay = ceil((p75(rtt) / 2 + processing buffer) in frames),
//! clamped to `[min_delay_frames, max_delay_frames]`.

use std::collections::VecDeque;

/// Default number of RTT samples kept.
pub const SAMPLE_WINDOW: usize = 10;

pub const MIN_DELAY_FRAMES: u32 = 2;
pub const MAX_DELAY_FRAMES: u32 = 6;

/// Fixed allowance for local processing, in milliseconds.
pub const PROCESSING_BUFFER_MS: f64 = 10.0;

#[derive(Debug, Clone)]
pub struct InputDelayConfig {
    pub sample_window: usize,
    pub min_delay_frames: u32,
    pub max_delay_frames: u32,
    pub processing_buffer_ms: f64,
    pub tick_rate_hz: u32,
}

impl Default for InputDelayConfig {
    fn default() -> Self {
        Self {
            sample_window: SAMPLE_WINDOW,
            min_delay_frames: MIN_DELAY_FRAMES,
            max_delay_frames: MAX_DELAY_FRAMES,
            processing_buffer_ms: PROCESSING_BUFFER_MS,
            tick_rate_hz: crate::TICK_RATE_HZ,
        }
    }
}

/// Rolling RTT window and the delay derived from it.
#[derive(Debug, Clone)]
pub struct InputDelayManager {
    config: InputDelayConfig,
    samples: VecDeque<f64>,
}

impl InputDelayManager {
    /// # Panics
    /// If the window or tick rate is zero, or `min_delay_frames > max_delay_frames`.
    pub fn new(config: InputDelayConfig) -> Self {
        assert!(config.sample_window > 0, "sample_window must be positive");
        assert!(config.tick_rate_hz > 0, "tick_rate_hz must be positive");
        assert!(
            config.min_delay_frames <= config.max_delay_frames,
            "min_delay_frames must not exceed max_delay_frames"
        );
        Self {
            samples: VecDeque::with_capacity(config.sample_window),
            config,
        }
    }

    pub fn config(&self) -> &InputDelayConfig {
        &self.config
    }

    /// Record one RTT measurement in milliseconds. Negative or non-finite
    /// samples are ignored.
    pub fn add_rtt_sample(&mut self, rtt_ms: f64) {
        if !rtt_ms.is_finite() || rtt_ms < 0.0 {
            return;
        }
        if self.samples.len() >= self.config.sample_window {
            self.samples.pop_front();
        }
        self.samples.push_back(rtt_ms);
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Delay in frames to hold local inputs. With no samples this is the
    /// configured minimum.
    pub fn get_recommended_delay(&self) -> u32 {
        let Some(p75) = self.percentile(0.75) else {
            return self.config.min_delay_frames;
        };
        let one_way_ms = p75 / 2.0;
        let total_ms = one_way_ms + self.config.processing_buffer_ms;
        let frames = (total_ms * f64::from(self.config.tick_rate_hz) / 1000.0).ceil();
        let frames = if frames >= f64::from(u32::MAX) {
            u32::MAX
        } else {
            frames as u32
        };
        frames.clamp(self.config.min_delay_frames, self.config.max_delay_frames)
    }

    /// Nearest-rank percentile of the window.
    fn percentile(&self, p: f64) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let mut sorted: Vec<f64> = self.samples.iter().copied().collect();
        sorted.sort_by(f64::total_cmp);
        let rank = (p * sorted.len() as f64).ceil() as usize;
        Some(sorted[rank.clamp(1, sorted.len()) - 1])
    }

    pub fn mean_rtt(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.samples.iter().sum::<f64>() / self.samples.len() as f64)
    }

    /// Population standard deviation of the window.
    pub fn jitter(&self) -> Option<f64> {
        let mean = self.mean_rtt()?;
        let variance = self
            .samples
            .iter()
            .map(|s| (s - mean) * (s - mean))
            .sum::<f64>()
            / self.samples.len() as f64;
        Some(variance.sqrt())
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

impl Default for InputDelayManager {
    fn default() -> Self {
        Self::new(InputDelayConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_samples(samples: &[f64]) -> InputDelayManager {
        let mut manager = InputDelayManager::default();
        for &s in samples {
            manager.add_rtt_sample(s);
        }
        manager
    }

    #[test]
    fn test_no_samples_uses_minimum() {
        let manager = InputDelayManager::default();
        assert_eq!(manager.get_recommended_delay(), MIN_DELAY_FRAMES);
        assert_eq!(manager.mean_rtt(), None);
        assert_eq!(manager.jitter(), None);
    }

    #[test]
    fn test_recommended_delay_from_p75() {
        // p75 = 100ms: 50ms one-way + 10ms buffer = 60ms = 3.6 frames at 60Hz
        let manager = with_samples(&[100.0; 4]);
        assert_eq!(manager.get_recommended_delay(), 4);

        // p75 picks the 8th of 10 sorted samples (80ms): 50ms = 3 frames
        let manager = with_samples(&[10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 400.0]);
        assert_eq!(manager.get_recommended_delay(), 3);
    }

    #[test]
    fn test_delay_clamped() {
        assert_eq!(with_samples(&[1.0, 2.0]).get_recommended_delay(), 2);
        assert_eq!(with_samples(&[900.0, 950.0]).get_recommended_delay(), 6);
    }

    #[test]
    fn test_window_evicts_oldest() {
        let mut manager = with_samples(&[1000.0]);
        for _ in 0..SAMPLE_WINDOW {
            manager.add_rtt_sample(20.0);
        }
        assert_eq!(manager.sample_count(), SAMPLE_WINDOW);
        assert_eq!(manager.mean_rtt(), Some(20.0));
        assert_eq!(manager.get_recommended_delay(), 2);
    }

    #[test]
    fn test_mean_and_jitter() {
        let manager = with_samples(&[10.0, 20.0, 30.0, 40.0]);
        assert_eq!(manager.mean_rtt(), Some(25.0));
        let jitter = manager.jitter().unwrap();
        assert!((jitter - 125.0_f64.sqrt()).abs() < 1e-9);
        assert_eq!(with_samples(&[30.0; 5]).jitter(), Some(0.0));
    }

    #[test]
    fn test_invalid_samples_ignored() {
        let manager = with_samples(&[f64::NAN, -5.0, f64::INFINITY, 40.0]);
        assert_eq!(manager.sample_count(), 1);
    }
}
