use std::fmt;

use serde::Serialize;

use crate::model::Mode;

/// A position on the Camelot wheel: number 1–12 plus letter A (minor) or B (major).
///
/// The wheel arranges keys so that harmonically compatible keys are neighbors:
/// same number (relative major/minor) or adjacent numbers with the same letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CamelotCode {
    /// Wheel position, 1–12.
    pub number: u8,
    /// Wheel ring: A = minor, B = major.
    pub minor: bool,
}

/// Harmonic relationship between two Camelot codes, ordered best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Harmony {
    /// Identical key and mode.
    Perfect,
    /// Same number, other letter (relative major/minor).
    Relative,
    /// Same letter, wheel number ±1.
    Adjacent,
    /// Same letter, wheel number ±2.
    Creative,
    /// Everything else.
    Clash,
}

impl CamelotCode {
    /// Derive the Camelot code from a pitch class (0 = C … 11 = B) and mode.
    ///
    /// Walking the circle of fifths maps to +7 semitones per wheel step, with
    /// C major anchored at 8B and its relative A minor at 8A. Panics if
    /// `pitch_class` exceeds 11; callers validate tracks before deriving codes.
    pub fn from_key(pitch_class: u8, mode: Mode) -> Self {
        assert!(pitch_class < 12, "pitch class out of range: {pitch_class}");
        let offset = match mode {
            Mode::Major => 8,
            // Relative major sits 3 semitones up (A minor -> C major).
            Mode::Minor => 5,
        };
        let number = (pitch_class as u32 * 7 + offset) % 12;
        Self {
            number: if number == 0 { 12 } else { number as u8 },
            minor: mode == Mode::Minor,
        }
    }

    pub fn letter(&self) -> char {
        if self.minor { 'A' } else { 'B' }
    }

    /// Shortest gap between wheel numbers, wrapping 12 → 1.
    fn wheel_gap(&self, other: &CamelotCode) -> u8 {
        let diff = (i16::from(self.number) - i16::from(other.number)).unsigned_abs() as u8;
        diff.min(12 - diff)
    }

    /// Classify the harmonic relationship with another code.
    pub fn harmony(&self, other: &CamelotCode) -> Harmony {
        if self == other {
            return Harmony::Perfect;
        }
        if self.number == other.number {
            return Harmony::Relative;
        }
        if self.minor == other.minor {
            match self.wheel_gap(other) {
                1 => return Harmony::Adjacent,
                2 => return Harmony::Creative,
                _ => {}
            }
        }
        Harmony::Clash
    }

    /// Harmonic distance: 0 (perfect) to 3 (clash). Symmetric.
    pub fn distance(&self, other: &CamelotCode) -> u8 {
        match self.harmony(other) {
            Harmony::Perfect => 0,
            Harmony::Relative | Harmony::Adjacent => 1,
            Harmony::Creative => 2,
            Harmony::Clash => 3,
        }
    }

    /// All codes a DJ can mix into from this one without clashing,
    /// grouped as (perfect, relative, adjacent).
    pub fn compatible_codes(&self) -> (CamelotCode, CamelotCode, [CamelotCode; 2]) {
        let relative = CamelotCode {
            number: self.number,
            minor: !self.minor,
        };
        let prev = if self.number == 1 { 12 } else { self.number - 1 };
        let next = if self.number == 12 { 1 } else { self.number + 1 };
        let adjacent = [
            CamelotCode { number: prev, minor: self.minor },
            CamelotCode { number: next, minor: self.minor },
        ];
        (*self, relative, adjacent)
    }
}

impl fmt::Display for CamelotCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.number, self.letter())
    }
}

impl Serialize for CamelotCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
