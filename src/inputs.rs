//! Editable mass input groups.
//!
//! Each mass is backed by four text fields, edited freely by the user and
//! parsed every time the masses are read. Nothing is validated on entry:
//! text that is not a number reads as NaN.

use crate::mass::Mass;
use std::ops::RangeInclusive;

/// Selectable number of masses
pub const MASS_COUNT_RANGE: RangeInclusive<usize> = 1..=4;
/// Number of masses shown at start-up
pub const DEFAULT_MASS_COUNT: usize = 4;

/// Source of mass records for the animation driver
pub trait MassSource {
    /// Reads `count` masses from the current input state
    fn get_masses(&self, count: usize) -> Vec<Mass>;
    /// Discards the current inputs and creates `count` default groups
    fn regenerate(&mut self, count: usize);
}

/// One field of a mass input group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MassField {
    Value,
    Radius,
    Angle,
    Position,
}

impl MassField {
    pub const ALL: [MassField; 4] = [
        MassField::Value,
        MassField::Radius,
        MassField::Angle,
        MassField::Position,
    ];

    /// Compact label with the field's unit
    pub fn label(self) -> &'static str {
        match self {
            MassField::Value => "m(kg)",
            MassField::Radius => "r(m)",
            MassField::Angle => "a(deg)",
            MassField::Position => "z(m)",
        }
    }

    pub fn min(self) -> f64 {
        match self {
            MassField::Value | MassField::Radius => 0.1,
            MassField::Angle | MassField::Position => 0.0,
        }
    }

    pub fn max(self) -> Option<f64> {
        match self {
            MassField::Value | MassField::Radius => None,
            MassField::Angle => Some(360.0),
            MassField::Position => Some(2.0),
        }
    }

    pub fn step(self) -> f64 {
        match self {
            MassField::Angle => 1.0,
            _ => 0.1,
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// Text-backed input groups, one per mass
#[derive(Debug, Clone, PartialEq)]
pub struct MassInputs {
    groups: Vec<[String; 4]>,
}

impl MassInputs {
    pub fn new(count: usize) -> Self {
        let mut inputs = MassInputs { groups: Vec::new() };
        inputs.regenerate(count);
        inputs
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn field(&self, index: usize, field: MassField) -> Option<&str> {
        self.groups.get(index).map(|group| group[field.slot()].as_str())
    }

    pub fn field_mut(&mut self, index: usize, field: MassField) -> Option<&mut String> {
        self.groups
            .get_mut(index)
            .map(|group| &mut group[field.slot()])
    }

    /// Replaces a field's text. Returns false when the group does not exist.
    pub fn set_field(&mut self, index: usize, field: MassField, text: impl Into<String>) -> bool {
        match self.field_mut(index, field) {
            Some(slot) => {
                *slot = text.into();
                true
            }
            None => false,
        }
    }

    /// Writes all four fields of a group from a mass record
    pub fn set_mass(&mut self, index: usize, mass: &Mass) -> bool {
        match self.groups.get_mut(index) {
            Some(group) => {
                *group = group_text(mass);
                true
            }
            None => false,
        }
    }

    /// Moves a field by one step in `direction`, clamped to the field's range.
    /// Unparseable text restarts from the field minimum.
    pub fn step_field(&mut self, index: usize, field: MassField, direction: i32) {
        let Some(slot) = self.field_mut(index, field) else {
            return;
        };
        let current = parse_float(slot);
        let start = if current.is_nan() { field.min() } else { current };
        let mut next = (start + direction.signum() as f64 * field.step()).max(field.min());
        if let Some(max) = field.max() {
            next = next.min(max);
        }
        *slot = format_number(next);
    }
}

impl MassSource for MassInputs {
    fn get_masses(&self, count: usize) -> Vec<Mass> {
        (0..count)
            .map(|index| {
                let read = |field| self.field(index, field).map_or(f64::NAN, parse_float);
                Mass::new(
                    read(MassField::Value),
                    read(MassField::Radius),
                    read(MassField::Angle),
                    read(MassField::Position),
                )
            })
            .collect()
    }

    fn regenerate(&mut self, count: usize) {
        self.groups = (0..count)
            .map(|index| group_text(&Mass::default_for_index(index)))
            .collect();
    }
}

fn group_text(mass: &Mass) -> [String; 4] {
    [
        format_number(mass.mass_value),
        format_number(mass.radius),
        format_number(mass.angle),
        format_number(mass.axial_position),
    ]
}

/// Formats a field value without trailing zeros
pub fn format_number(value: f64) -> String {
    let rounded = crate::math::round_to(value, 6);
    if rounded == 0.0 {
        "0".to_string()
    } else {
        format!("{rounded}")
    }
}

/// Parses a field the way a numeric form input reads: the whole trimmed
/// text must be a decimal number (`-1`, `0.5`, `.5`, `2e-3`), otherwise the
/// value is NaN.
pub fn parse_float(text: &str) -> f64 {
    let text = text.trim();
    let bytes = text.as_bytes();
    let mut end = 0;

    if bytes.first() == Some(&b'-') {
        end += 1;
    }
    let int_digits = count_digits(&bytes[end..]);
    end += int_digits;
    if bytes.get(end) == Some(&b'.') {
        let frac_digits = count_digits(&bytes[end + 1..]);
        if frac_digits == 0 {
            return f64::NAN;
        }
        end += 1 + frac_digits;
    } else if int_digits == 0 {
        return f64::NAN;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        end += 1;
        if matches!(bytes.get(end), Some(b'+' | b'-')) {
            end += 1;
        }
        let exp_digits = count_digits(&bytes[end..]);
        if exp_digits == 0 {
            return f64::NAN;
        }
        end += exp_digits;
    }

    if end != bytes.len() {
        return f64::NAN;
    }
    text.parse::<f64>().unwrap_or(f64::NAN)
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}
