//! Animation driver.
//!
//! Owns the simulation state and runs one frame per scheduler tick while
//! running: advance the phase, re-read the masses, redraw, re-evaluate and
//! publish the result.

use crate::config::SimConfig;
use crate::graphics::{draw_shaft, render, Canvas, ShaftLayout};
use crate::inputs::{MassSource, MASS_COUNT_RANGE};
use crate::mass::Mass;
use crate::math::{evaluate_balance, BalanceResult};
use crate::scheduler::Scheduler;
use crate::state::{DriverMode, FrameHandle, SimulationState};

pub struct AnimationDriver {
    config: SimConfig,
    layout: ShaftLayout,
    state: SimulationState,
    masses: Vec<Mass>,
    result: Option<BalanceResult>,
    next_handle: u64,
}

impl AnimationDriver {
    pub fn new(config: SimConfig, mass_count: usize) -> Self {
        let layout = ShaftLayout::from_config(&config);
        AnimationDriver {
            config,
            layout,
            state: SimulationState::new(clamp_mass_count(mass_count)),
            masses: Vec::new(),
            result: None,
            next_handle: 0,
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn layout(&self) -> &ShaftLayout {
        &self.layout
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn phase(&self) -> f64 {
        self.state.phase
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    pub fn mass_count(&self) -> usize {
        self.state.mass_count
    }

    /// Masses read by the last frame
    pub fn masses(&self) -> &[Mass] {
        &self.masses
    }

    /// Result published by the last frame, cleared on reset
    pub fn result(&self) -> Option<&BalanceResult> {
        self.result.as_ref()
    }

    /// Label of the start/stop button
    pub fn button_label(&self) -> &'static str {
        match self.state.mode {
            DriverMode::Stopped => "Rotate",
            DriverMode::Running => "Stop",
        }
    }

    /// Starts the animation and runs the first frame right away
    pub fn start(&mut self, source: &impl MassSource, canvas: &mut Canvas) {
        if self.is_running() {
            return;
        }
        log::debug!("animation started at phase {:.3}", self.state.phase);
        self.state.mode = DriverMode::Running;
        self.run_frame(source, canvas);
    }

    /// Stops the animation and drops the pending frame
    pub fn stop(&mut self) {
        if let Some(FrameHandle(handle)) = self.state.pending_frame.take() {
            log::debug!("cancelled pending frame {handle}");
        }
        if self.is_running() {
            log::debug!("animation stopped at phase {:.3}", self.state.phase);
        }
        self.state.mode = DriverMode::Stopped;
    }

    pub fn toggle(&mut self, source: &impl MassSource, canvas: &mut Canvas) {
        if self.is_running() {
            self.stop();
        } else {
            self.start(source, canvas);
        }
    }

    /// Runs the pending frame, if any. Returns whether a frame ran.
    pub fn tick(&mut self, source: &impl MassSource, canvas: &mut Canvas) -> bool {
        if !self.is_running() || self.state.pending_frame.is_none() {
            return false;
        }
        self.run_frame(source, canvas);
        true
    }

    /// Stops, rewinds the phase to zero, regenerates the inputs for the
    /// current count and redraws the bare shaft
    pub fn reset(&mut self, source: &mut impl MassSource, canvas: &mut Canvas) {
        self.stop();
        self.state.phase = 0.0;
        self.state.frames = 0;
        source.regenerate(self.state.mass_count);
        draw_shaft(canvas, &self.layout);
        self.masses.clear();
        self.result = None;
        log::debug!("simulation reset with {} masses", self.state.mass_count);
    }

    /// Selects a new number of masses and regenerates the inputs
    pub fn set_mass_count(&mut self, count: usize, source: &mut impl MassSource) {
        self.state.mass_count = clamp_mass_count(count);
        source.regenerate(self.state.mass_count);
        log::debug!("mass count set to {}", self.state.mass_count);
    }

    /// Evaluates the current inputs at the current phase without advancing
    pub fn evaluate(&self, source: &impl MassSource) -> BalanceResult {
        let masses = source.get_masses(self.state.mass_count);
        evaluate_balance(&masses, self.state.phase, self.config.tolerance)
    }

    /// Starts the animation and drives it for `frames` frames, pacing each
    /// frame after the first with `scheduler`. Zero frames evaluates the
    /// current phase without advancing.
    pub fn run_for(
        &mut self,
        frames: u64,
        source: &impl MassSource,
        canvas: &mut Canvas,
        scheduler: &mut impl Scheduler,
    ) -> BalanceResult {
        if frames == 0 {
            return self.evaluate(source);
        }
        self.start(source, canvas);
        for _ in 1..frames {
            scheduler.wait_next_frame();
            self.tick(source, canvas);
        }
        self.stop();
        match self.result {
            Some(result) => result,
            None => self.evaluate(source),
        }
    }

    fn run_frame(&mut self, source: &impl MassSource, canvas: &mut Canvas) {
        self.state.phase = (self.state.phase + self.config.phase_step()).rem_euclid(360.0);
        self.state.frames += 1;

        self.masses = source.get_masses(self.state.mass_count);
        render(canvas, &self.layout, &self.masses, self.state.phase);
        self.result = Some(evaluate_balance(
            &self.masses,
            self.state.phase,
            self.config.tolerance,
        ));

        self.next_handle += 1;
        self.state.pending_frame = Some(FrameHandle(self.next_handle));
    }
}

fn clamp_mass_count(count: usize) -> usize {
    count.clamp(*MASS_COUNT_RANGE.start(), *MASS_COUNT_RANGE.end())
}
