//! Shot type hysteresis.
//!
//! A raw classification must repeat `required` consecutive times before the
//! stable value changes. This applies to the very first value as well.

use framecoach_models::ShotType;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ShotTypeHysteresis {
    required: u32,
    stable: Option<ShotType>,
    candidate: Option<ShotType>,
    count: u32,
}

impl Default for ShotTypeHysteresis {
    fn default() -> Self {
        Self::new(3)
    }
}

impl ShotTypeHysteresis {
    pub fn new(required: u32) -> Self {
        Self {
            required: required.max(1),
            stable: None,
            candidate: None,
            count: 0,
        }
    }

    /// Feed one raw classification; returns the stable shot type.
    ///
    /// An unclassifiable frame (`None`) breaks the candidate streak but
    /// keeps the stable value.
    pub fn update(&mut self, raw: Option<ShotType>) -> Option<ShotType> {
        let Some(raw) = raw else {
            self.candidate = None;
            self.count = 0;
            return self.stable;
        };

        if self.stable == Some(raw) {
            self.candidate = None;
            self.count = 0;
            return self.stable;
        }

        if self.candidate == Some(raw) {
            self.count += 1;
        } else {
            self.candidate = Some(raw);
            self.count = 1;
        }

        if self.count >= self.required {
            debug!(from = ?self.stable, to = %raw, "Stable shot type changed");
            self.stable = Some(raw);
            self.candidate = None;
            self.count = 0;
        }

        self.stable
    }

    pub fn stable(&self) -> Option<ShotType> {
        self.stable
    }

    pub fn reset(&mut self) {
        self.stable = None;
        self.candidate = None;
        self.count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bootstrap_needs_three_frames() {
        let mut h = ShotTypeHysteresis::default();
        assert_eq!(h.update(Some(ShotType::FullShot)), None);
        assert_eq!(h.update(Some(ShotType::FullShot)), None);
        assert_eq!(h.update(Some(ShotType::FullShot)), Some(ShotType::FullShot));
    }

    #[test]
    fn test_two_frames_do_not_change_third_does() {
        let mut h = ShotTypeHysteresis::default();
        for _ in 0..3 {
            h.update(Some(ShotType::FullShot));
        }

        assert_eq!(h.update(Some(ShotType::MediumShot)), Some(ShotType::FullShot));
        assert_eq!(h.update(Some(ShotType::MediumShot)), Some(ShotType::FullShot));
        assert_eq!(h.update(Some(ShotType::MediumShot)), Some(ShotType::MediumShot));
    }

    #[test]
    fn test_interrupted_streak_restarts() {
        let mut h = ShotTypeHysteresis::default();
        for _ in 0..3 {
            h.update(Some(ShotType::FullShot));
        }
        h.update(Some(ShotType::MediumShot));
        h.update(Some(ShotType::MediumShot));
        h.update(Some(ShotType::FullShot));
        h.update(None);
        assert_eq!(h.update(Some(ShotType::MediumShot)), Some(ShotType::FullShot));
        assert_eq!(h.update(Some(ShotType::MediumShot)), Some(ShotType::FullShot));
        assert_eq!(h.update(Some(ShotType::MediumShot)), Some(ShotType::MediumShot));
    }

    #[test]
    fn test_reset() {
        let mut h = ShotTypeHysteresis::new(1);
        assert_eq!(h.update(Some(ShotType::CloseUp)), Some(ShotType::CloseUp));
        h.reset();
        assert_eq!(h.stable(), None);
    }
}
