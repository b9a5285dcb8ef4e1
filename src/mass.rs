use crate::graphics::Rgb;
use serde::{Deserialize, Serialize};

/// Colours cycled over mass indices
pub const MASS_COLORS: [Rgb; 4] = [
    Rgb::from_hex(0xe74c3c), // Red
    Rgb::from_hex(0x3498db), // Blue
    Rgb::from_hex(0x2ecc71), // Green
    Rgb::from_hex(0xf1c40f), // Yellow
];

/// A point mass mounted on the shaft
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mass {
    /// Mass in kg
    pub mass_value: f64,
    /// Distance from the shaft axis in m
    pub radius: f64,
    /// Angular position at rotation phase 0, in degrees
    pub angle: f64,
    /// Position along the shaft axis in m
    pub axial_position: f64,
}

impl Mass {
    pub fn new(mass_value: f64, radius: f64, angle: f64, axial_position: f64) -> Self {
        Mass {
            mass_value,
            radius,
            angle,
            axial_position,
        }
    }

    /// Default values for the mass at zero-based `index`: 1 kg at 0.2 m,
    /// spread 90° apart and 0.5 m apart along the shaft.
    pub fn default_for_index(index: usize) -> Self {
        Mass {
            mass_value: 1.0,
            radius: 0.2,
            angle: index as f64 * 90.0,
            axial_position: index as f64 * 0.5,
        }
    }

    /// Mass-radius product
    pub fn unbalance(&self) -> f64 {
        self.mass_value * self.radius
    }

    /// Parses `mass,radius,angle,position`
    pub fn parse_spec(spec: &str) -> Option<Self> {
        let values: Vec<f64> = spec
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .ok()?;
        match values[..] {
            [m, r, a, p] => Some(Mass::new(m, r, a, p)),
            _ => None,
        }
    }
}

/// Display colour for the mass at zero-based `index`
pub fn mass_color(index: usize) -> Rgb {
    MASS_COLORS[index % MASS_COLORS.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_index() {
        let third = Mass::default_for_index(2);
        assert_eq!(third, Mass::new(1.0, 0.2, 180.0, 1.0));
        assert!((third.unbalance() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn palette_cycles() {
        assert_eq!(mass_color(0), mass_color(4));
        assert_eq!(mass_color(1), Rgb::new(0x34, 0x98, 0xdb));
        assert_ne!(mass_color(2), mass_color(3));
    }

    #[test]
    fn parses_mass_spec() {
        assert_eq!(
            Mass::parse_spec("1.5, 0.3,45,0.5"),
            Some(Mass::new(1.5, 0.3, 45.0, 0.5))
        );
        assert_eq!(Mass::parse_spec("1,2,3"), None);
        assert_eq!(Mass::parse_spec("1,2,x,4"), None);
    }
}
