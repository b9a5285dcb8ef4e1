use crate::mass::Mass;
use serde::Serialize;
use std::f64::consts::PI;

/// Default absolute tolerance for the balance checks
pub const DEFAULT_TOLERANCE: f64 = 0.01;

/// Converts degrees to radians
pub fn deg_to_rad(degrees: f64) -> f64 {
    degrees * PI / 180.0
}

/// Rounds a value to the given number of decimal digits
pub fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}

/// Outcome of a balance check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    Balanced,
    Unbalanced,
}

impl Verdict {
    pub fn from_flag(balanced: bool) -> Self {
        if balanced {
            Verdict::Balanced
        } else {
            Verdict::Unbalanced
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Verdict::Balanced => "Balanced",
            Verdict::Unbalanced => "Unbalanced",
        }
    }

    /// Style tag used by the results panel
    pub fn style_tag(self) -> &'static str {
        match self {
            Verdict::Balanced => "result-balanced",
            Verdict::Unbalanced => "result-unbalanced",
        }
    }
}

/// Net force and moment of the rotating masses at one rotation phase
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BalanceResult {
    pub sum_fx: f64,
    pub sum_fy: f64,
    pub sum_mx: f64,
    pub sum_my: f64,
    pub statically_balanced: bool,
    pub dynamically_balanced: bool,
}

impl BalanceResult {
    pub fn static_verdict(&self) -> Verdict {
        Verdict::from_flag(self.statically_balanced)
    }

    pub fn dynamic_verdict(&self) -> Verdict {
        Verdict::from_flag(self.dynamically_balanced)
    }

    /// Magnitude of the net radial force
    pub fn resultant_force(&self) -> f64 {
        self.sum_fx.hypot(self.sum_fy)
    }

    /// Magnitude of the net moment
    pub fn resultant_moment(&self) -> f64 {
        self.sum_mx.hypot(self.sum_my)
    }

    /// Sums rounded to three decimals, in display order
    pub fn rounded_sums(&self) -> [f64; 4] {
        [
            round_to(self.sum_fx, 3),
            round_to(self.sum_fy, 3),
            round_to(self.sum_mx, 3),
            round_to(self.sum_my, 3),
        ]
    }

    /// Results panel text, one entry per line
    pub fn report_lines(&self) -> [String; 6] {
        [
            format!("Sum of Forces in X-direction: {:.3} N", self.sum_fx),
            format!("Sum of Forces in Y-direction: {:.3} N", self.sum_fy),
            format!("Sum of Moments about X-axis: {:.3} Nm", self.sum_mx),
            format!("Sum of Moments about Y-axis: {:.3} Nm", self.sum_my),
            format!("Static Balance: {}", self.static_verdict().label()),
            format!("Dynamic Balance: {}", self.dynamic_verdict().label()),
        ]
    }
}

/// Sums the radial forces and axial moments of `masses` at rotation phase
/// `phase_deg` and classifies the result against `tolerance`.
///
/// NaN inputs propagate into the sums, and every comparison against the
/// tolerance then fails, so malformed masses always read as unbalanced.
pub fn evaluate_balance(masses: &[Mass], phase_deg: f64, tolerance: f64) -> BalanceResult {
    let mut sum_fx = 0.0;
    let mut sum_fy = 0.0;
    let mut sum_mx = 0.0;
    let mut sum_my = 0.0;

    for mass in masses {
        let (sin_t, cos_t) = deg_to_rad(mass.angle + phase_deg).sin_cos();
        let force = mass.unbalance();
        sum_fx += force * cos_t;
        sum_fy += force * sin_t;
        sum_mx += force * mass.axial_position * cos_t;
        sum_my += force * mass.axial_position * sin_t;
    }

    let statically_balanced = sum_fx.abs() < tolerance && sum_fy.abs() < tolerance;
    let dynamically_balanced =
        statically_balanced && sum_mx.abs() < tolerance && sum_my.abs() < tolerance;

    BalanceResult {
        sum_fx,
        sum_fy,
        sum_mx,
        sum_my,
        statically_balanced,
        dynamically_balanced,
    }
}
