//! Calibration stepper state machine.
//!
//! The operator holds a light meter against the screen and walks through a
//! fixed ladder of pixel intensities from black (`-1`) to white (`+1`). The
//! stepper owns no terminal state so it can be driven from tests.

use crate::error::AppError;
use crate::math::linspace;

/// Default number of intensity steps between black and white.
pub const DEFAULT_STEPS: usize = 17;

/// Operator actions understood by the stepper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepCommand {
    Darker,
    Brighter,
    ToggleOverlay,
    Stop,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stepper {
    index: usize,
    levels: Vec<f64>,
    overlay_visible: bool,
    running: bool,
}

impl Stepper {
    pub fn new(steps: usize) -> Result<Self, AppError> {
        if steps < 2 {
            return Err(AppError::InvalidConfig(format!(
                "stepper needs at least 2 steps (got {steps})"
            )));
        }
        Ok(Self {
            index: 0,
            levels: linspace(-1.0, 1.0, steps),
            overlay_visible: true,
            running: true,
        })
    }

    /// Apply one command. Stepping is clamped at both ends, with no wraparound.
    pub fn apply(&mut self, command: StepCommand) {
        match command {
            StepCommand::Darker => self.index = self.index.saturating_sub(1),
            StepCommand::Brighter => {
                if self.index + 1 < self.levels.len() {
                    self.index += 1;
                }
            }
            StepCommand::ToggleOverlay => self.overlay_visible = !self.overlay_visible,
            StepCommand::Stop => self.running = false,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn steps(&self) -> usize {
        self.levels.len()
    }

    /// Pixel intensity in `[-1, 1]` for the current step.
    pub fn intensity(&self) -> f64 {
        self.levels[self.index]
    }

    /// Current intensity as an 8-bit grey level.
    pub fn grey_level(&self) -> u8 {
        let unit = ((self.intensity() + 1.0) / 2.0).clamp(0.0, 1.0);
        (unit * 255.0).round() as u8
    }

    pub fn overlay_visible(&self) -> bool {
        self.overlay_visible
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// `Step i out of N`, 1-based.
    pub fn step_label(&self) -> String {
        format!("Step {} out of {}", self.index + 1, self.steps())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_at_both_ends() {
        let mut s = Stepper::new(DEFAULT_STEPS).unwrap();
        s.apply(StepCommand::Darker);
        assert_eq!(s.index(), 0);
        assert_eq!(s.intensity(), -1.0);
        assert_eq!(s.grey_level(), 0);

        for _ in 0..40 {
            s.apply(StepCommand::Brighter);
        }
        assert_eq!(s.index(), 16);
        assert_eq!(s.intensity(), 1.0);
        assert_eq!(s.grey_level(), 255);
        assert_eq!(s.step_label(), "Step 17 out of 17");

        s.apply(StepCommand::Darker);
        assert_eq!(s.index(), 15);
        assert!((s.intensity() - 0.875).abs() < 1e-12);
    }

    #[test]
    fn overlay_toggles_and_stop_ends_the_run() {
        let mut s = Stepper::new(3).unwrap();
        assert!(s.overlay_visible());
        s.apply(StepCommand::ToggleOverlay);
        assert!(!s.overlay_visible());
        s.apply(StepCommand::ToggleOverlay);
        assert!(s.overlay_visible());

        assert!(s.is_running());
        s.apply(StepCommand::Stop);
        assert!(!s.is_running());
    }

    #[test]
    fn middle_step_is_mid_grey() {
        let mut s = Stepper::new(3).unwrap();
        s.apply(StepCommand::Brighter);
        assert_eq!(s.intensity(), 0.0);
        assert_eq!(s.grey_level(), 128);
    }

    #[test]
    fn rejects_single_step() {
        assert!(Stepper::new(1).is_err());
    }
}
