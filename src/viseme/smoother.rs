//! Rate-limited mouth motion
//!
//! Each channel moves toward its target by at most `max_speed` per tick and
//! stops exactly on the target, so the trajectory never overshoots.

use super::{VisemeChannel, VisemeWeights};

/// Default per-tick step, in weight units
pub const DEFAULT_MAX_LIP_SPEED: f32 = 10.0;

/// Holds the current mouth pose across ticks.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionSmoother {
    current: VisemeWeights,
    max_speed: f32,
}

impl Default for MotionSmoother {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LIP_SPEED)
    }
}

impl MotionSmoother {
    /// Start from a closed, neutral mouth
    pub fn new(max_speed: f32) -> Self {
        Self::with_pose(max_speed, VisemeWeights::default())
    }

    /// Start from a caller-supplied pose (clamped to [0, 100])
    pub fn with_pose(max_speed: f32, pose: VisemeWeights) -> Self {
        Self {
            current: pose.clamped(),
            max_speed: max_speed.abs(),
        }
    }

    pub fn current(&self) -> VisemeWeights {
        self.current
    }

    pub fn max_speed(&self) -> f32 {
        self.max_speed
    }

    /// Advance every channel one tick toward `target`
    pub fn step(&mut self, target: &VisemeWeights) -> VisemeWeights {
        let target = target.clamped();
        for channel in VisemeChannel::ALL {
            let current = self.current.get_mut(channel);
            *current = approach(*current, target.get(channel), self.max_speed);
        }
        self.current
    }

    /// Jump to a pose without rate limiting
    pub fn reset(&mut self, pose: VisemeWeights) {
        self.current = pose.clamped();
    }
}

fn approach(current: f32, target: f32, max_speed: f32) -> f32 {
    if target > current {
        (current + max_speed).min(target)
    } else if target < current {
        (current - max_speed).max(target)
    } else {
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_starts_neutral() {
        let smoother = MotionSmoother::default();
        assert_eq!(smoother.current(), VisemeWeights::default());
        assert_eq!(smoother.max_speed(), 10.0);
    }

    #[test]
    fn test_step_is_capped() {
        let mut smoother = MotionSmoother::new(10.0);
        let target = VisemeWeights::new(33.3, 100.0, 5.0);

        let first = smoother.step(&target);
        assert_eq!(first, VisemeWeights::new(10.0, 10.0, 5.0));

        for _ in 0..2 {
            smoother.step(&target);
        }
        let fourth = smoother.step(&target);
        assert!((fourth.kiss - 33.3).abs() < 1e-5);
        assert_eq!(fourth.lips_closed, 40.0);
        assert_eq!(fourth.mouth_open, 5.0);
    }

    #[test]
    fn test_moves_down() {
        let mut smoother = MotionSmoother::with_pose(10.0, VisemeWeights::new(100.0, 15.0, 50.0));
        let weights = smoother.step(&VisemeWeights::default());
        assert_eq!(weights, VisemeWeights::new(90.0, 5.0, 40.0));
        let weights = smoother.step(&VisemeWeights::default());
        assert_eq!(weights, VisemeWeights::new(80.0, 0.0, 30.0));
    }

    #[test]
    fn test_target_equal_to_current_is_noop() {
        let pose = VisemeWeights::new(12.5, 60.0, 0.0);
        let mut smoother = MotionSmoother::with_pose(10.0, pose);
        assert_eq!(smoother.step(&pose), pose);
        assert_eq!(smoother.current(), pose);
    }

    #[test]
    fn test_initial_pose_clamped() {
        let smoother = MotionSmoother::with_pose(10.0, VisemeWeights::new(-20.0, 250.0, 50.0));
        assert_eq!(smoother.current(), VisemeWeights::new(0.0, 100.0, 50.0));
    }

    #[test]
    fn test_reset() {
        let mut smoother = MotionSmoother::default();
        smoother.reset(VisemeWeights::new(70.0, 0.0, 0.0));
        assert_eq!(smoother.current().kiss, 70.0);
    }

    proptest! {
        #[test]
        fn prop_reaches_target_in_expected_ticks(
            start in 0u32..=100,
            target in 0u32..=100,
            speed in 1u32..=40,
        ) {
            let (start, target, speed) = (start as f32, target as f32, speed as f32);
            let mut smoother =
                MotionSmoother::with_pose(speed, VisemeWeights::new(start, start, start));
            let goal = VisemeWeights::new(target, target, target);
            let expected = ((target - start).abs() / speed).ceil() as usize;

            let mut ticks = 0;
            while smoother.current() != goal {
                let before = smoother.current().kiss;
                let after = smoother.step(&goal).kiss;
                ticks += 1;

                // Never past the target, never faster than the cap
                if start <= target {
                    prop_assert!(after <= target);
                } else {
                    prop_assert!(after >= target);
                }
                prop_assert!((after - before).abs() <= speed + 1e-4);
                prop_assert!(ticks <= expected);
            }
            prop_assert_eq!(ticks, expected);
        }

        #[test]
        fn prop_output_stays_in_range(
            k in -50.0f32..150.0,
            l in -50.0f32..150.0,
            m in -50.0f32..150.0,
            speed in 0.1f32..200.0,
        ) {
            let mut smoother = MotionSmoother::new(speed);
            for _ in 0..5 {
                let w = smoother.step(&VisemeWeights::new(k, l, m));
                for v in w.as_array() {
                    prop_assert!((0.0..=100.0).contains(&v));
                }
            }
        }
    }
}
