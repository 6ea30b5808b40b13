// Euclidean rhythm patterns.
//
// `generate(beats, steps, phase)` spreads `beats` onsets as evenly as
// possible over `steps` slots with a Bresenham-style accumulator, then
// rotates the result right by `phase` positions. Each sequencer voice draws
// its (beats, steps, phase) once at startup and keeps the resulting pattern
// for the whole performance.
//
// Out-of-range input is clamped rather than rejected: negative `beats` or
// `steps` behave like 0, so the output is never longer than `steps` and a
// cursor can never index past the end.

use std::fmt;

/// An immutable on/off step pattern.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct RhythmPattern {
    steps: Vec<bool>,
}

impl RhythmPattern {
    pub fn from_steps(steps: Vec<bool>) -> Self {
        Self { steps }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Whether `step` is an onset. Wraps around the pattern length; an empty
    /// pattern has no onsets.
    pub fn is_active(&self, step: usize) -> bool {
        if self.steps.is_empty() {
            return false;
        }
        self.steps[step % self.steps.len()]
    }

    pub fn active_count(&self) -> usize {
        self.steps.iter().filter(|&&s| s).count()
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.steps
    }
}

impl fmt::Display for RhythmPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &s in &self.steps {
            f.write_str(if s { "x" } else { "." })?;
        }
        Ok(())
    }
}

/// Build the Euclidean pattern for `beats` onsets in `steps` slots, rotated
/// right by `phase`.
pub fn generate(beats: i32, steps: i32, phase: i32) -> RhythmPattern {
    let beats = beats.max(0) as usize;
    let len = steps.max(0) as usize;
    if len == 0 {
        return RhythmPattern::default();
    }
    if beats >= len {
        return RhythmPattern::from_steps(vec![true; len]);
    }

    let mut pattern = vec![false; len];
    if beats > 0 {
        let mut count = 0;
        for slot in pattern.iter_mut() {
            count += beats;
            if count >= len {
                count -= len;
                *slot = true;
            }
        }
    }

    let shift = phase.rem_euclid(len as i32) as usize;
    pattern.rotate_right(shift);
    RhythmPattern::from_steps(pattern)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits(pattern: &RhythmPattern) -> Vec<u8> {
        pattern.as_slice().iter().map(|&s| s as u8).collect()
    }

    #[test]
    fn distributes_beats_evenly() {
        assert_eq!(bits(&generate(3, 8, 0)), [0, 0, 1, 0, 0, 1, 0, 1]);
        assert_eq!(bits(&generate(2, 5, 0)), [0, 0, 1, 0, 1]);
    }

    #[test]
    fn more_beats_than_steps_fills_every_step() {
        assert_eq!(bits(&generate(5, 3, 0)), [1, 1, 1]);
        assert_eq!(bits(&generate(4, 4, 0)), [1, 1, 1, 1]);
    }

    #[test]
    fn no_beats_is_silent() {
        assert_eq!(bits(&generate(0, 5, 0)), [0, 0, 0, 0, 0]);
    }

    #[test]
    fn no_steps_is_empty() {
        assert!(generate(3, 0, 0).is_empty());
        assert!(generate(3, 0, 5).is_empty());
    }

    #[test]
    fn negative_inputs_clamp_to_zero() {
        assert!(generate(3, -4, 1).is_empty());
        assert_eq!(bits(&generate(-2, 4, 0)), [0, 0, 0, 0]);
    }

    #[test]
    fn phase_rotates_right() {
        // Base 3-in-8 is [0,0,1,0,0,1,0,1]; one right rotation brings the
        // trailing onset to the front.
        assert_eq!(bits(&generate(3, 8, 1)), [1, 0, 0, 1, 0, 0, 1, 0]);
        assert_eq!(bits(&generate(3, 8, 2)), [0, 1, 0, 0, 1, 0, 0, 1]);
        assert_eq!(bits(&generate(2, 5, 3)), [1, 0, 1, 0, 0]);
    }

    #[test]
    fn phase_larger_than_steps_wraps() {
        assert_eq!(generate(2, 5, 8), generate(2, 5, 3));
        assert_eq!(bits(&generate(2, 5, 8)), [1, 0, 1, 0, 0]);
    }

    #[test]
    fn negative_phase_rotates_left() {
        assert_eq!(bits(&generate(3, 8, -2)), [1, 0, 0, 1, 0, 1, 0, 0]);
        assert_eq!(bits(&generate(2, 5, -1)), [0, 1, 0, 1, 0]);
    }

    #[test]
    fn length_and_onset_count_hold_for_all_small_inputs() {
        for steps in 0..=16 {
            for beats in 0..=20 {
                let p = generate(beats, steps, 0);
                assert_eq!(p.len(), steps as usize);
                assert_eq!(p.active_count(), beats.min(steps) as usize);
            }
        }
    }

    #[test]
    fn rotation_by_full_length_is_identity() {
        for steps in 1..=12 {
            for beats in 0..=steps {
                for phase in -20..=20 {
                    assert_eq!(
                        generate(beats, steps, phase),
                        generate(beats, steps, phase + steps),
                        "beats={beats} steps={steps} phase={phase}"
                    );
                }
            }
        }
    }

    #[test]
    fn negative_phase_matches_complement() {
        for steps in 1..=12 {
            for beats in 0..=steps {
                for k in 0..=steps {
                    assert_eq!(generate(beats, steps, -k), generate(beats, steps, steps - k));
                }
            }
        }
    }

    #[test]
    fn is_active_wraps_and_tolerates_empty() {
        let p = generate(2, 5, 0);
        assert!(p.is_active(2));
        assert!(p.is_active(7));
        assert!(!RhythmPattern::default().is_active(3));
    }

    #[test]
    fn display_renders_onsets() {
        assert_eq!(generate(3, 8, 0).to_string(), "..x..x.x");
    }
}
