use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Simulation constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Shaft length in meters
    pub shaft_length: f64,
    /// Horizontal drawing scale along the shaft
    pub pixels_per_meter: f64,
    /// Vertical drawing scale for mass radius
    pub radial_scale: f64,
    /// Largest axial position a mass can take; maps onto the shaft's far end
    pub max_axial_position: f64,
    /// Left end of the shaft on the canvas
    pub shaft_x_start: f64,
    /// Logical canvas width in pixels
    pub canvas_width: f64,
    /// Logical canvas height in pixels
    pub canvas_height: f64,
    /// Angular velocity in rad/s
    pub angular_velocity: f64,
    /// Gravitational acceleration in m/s². Not part of the balance sums.
    pub gravity: f64,
    /// Target frames per second
    pub frame_rate: f64,
    /// Absolute tolerance for the balance checks
    pub tolerance: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            shaft_length: 0.5,
            pixels_per_meter: 600.0,
            radial_scale: 100.0,
            max_axial_position: 2.0,
            shaft_x_start: 100.0,
            canvas_width: 800.0,
            canvas_height: 400.0,
            angular_velocity: 20.0,
            gravity: 9.81,
            frame_rate: 60.0,
            tolerance: 0.01,
        }
    }
}

impl SimConfig {
    /// Loads a configuration from a JSON file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: SimConfig = serde_json::from_str(&text)?;
        config.validate()?;
        log::info!("loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Shaft length on the canvas
    pub fn shaft_pixels(&self) -> f64 {
        self.shaft_length * self.pixels_per_meter
    }

    /// Phase advance per frame, in degrees
    pub fn phase_step(&self) -> f64 {
        self.angular_velocity / self.frame_rate
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("shaft_length", self.shaft_length),
            ("pixels_per_meter", self.pixels_per_meter),
            ("radial_scale", self.radial_scale),
            ("max_axial_position", self.max_axial_position),
            ("canvas_width", self.canvas_width),
            ("canvas_height", self.canvas_height),
            ("frame_rate", self.frame_rate),
            ("tolerance", self.tolerance),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        let finite = [
            ("shaft_x_start", self.shaft_x_start),
            ("angular_velocity", self.angular_velocity),
            ("gravity", self.gravity),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return Err(Error::InvalidConfig(format!("{name} must be finite")));
            }
        }
        Ok(())
    }
}
