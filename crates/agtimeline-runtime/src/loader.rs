use crate::config::SegmentSettings;

/// How many of the newest segments are loaded.
///
/// Starts at `initial`, grows by `step` per "load older" request and goes
/// back to `initial` whenever the filters change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentLoader {
    initial: usize,
    step: usize,
    loaded: usize,
}

impl Default for SegmentLoader {
    fn default() -> Self {
        Self::from_settings(&SegmentSettings::default())
    }
}

impl SegmentLoader {
    pub fn new(initial: usize, step: usize) -> Self {
        let initial = initial.max(1);
        Self {
            initial,
            step: step.max(1),
            loaded: initial,
        }
    }

    pub fn from_settings(settings: &SegmentSettings) -> Self {
        Self::new(settings.initial_loaded, settings.load_step)
    }

    pub fn loaded(&self) -> usize {
        self.loaded
    }

    /// Load `step` more segments; returns the new loaded count
    pub fn load_more(&mut self) -> usize {
        self.loaded = self.loaded.saturating_add(self.step);
        self.loaded
    }

    pub fn reset(&mut self) {
        self.loaded = self.initial;
    }

    pub fn has_more(&self, total_segments: usize) -> bool {
        self.loaded < total_segments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let loader = SegmentLoader::default();
        assert_eq!(loader.loaded(), 3);
        assert!(loader.has_more(4));
        assert!(!loader.has_more(3));
    }

    #[test]
    fn test_load_more_and_reset() {
        let mut loader = SegmentLoader::new(3, 2);
        assert_eq!(loader.load_more(), 5);
        assert_eq!(loader.load_more(), 7);
        loader.reset();
        assert_eq!(loader.loaded(), 3);
    }

    #[test]
    fn test_zero_values_are_clamped() {
        let mut loader = SegmentLoader::new(0, 0);
        assert_eq!(loader.loaded(), 1);
        assert_eq!(loader.load_more(), 2);
    }
}
