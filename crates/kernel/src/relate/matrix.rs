use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Position of a point relative to a geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Location {
    Interior,
    Boundary,
    Exterior,
}

impl Location {
    pub const ALL: [Location; 3] = [Location::Interior, Location::Boundary, Location::Exterior];

    fn index(self) -> usize {
        match self {
            Self::Interior => 0,
            Self::Boundary => 1,
            Self::Exterior => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("pattern must have 9 characters, got {0}")]
    Length(usize),
    #[error("invalid pattern character `{0}`")]
    InvalidChar(char),
}

/// The DE-9IM matrix: rows are the interior, boundary and exterior of A,
/// columns the same for B. `None` is an empty intersection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct IntersectionMatrix {
    cells: [Option<u8>; 9],
}

impl IntersectionMatrix {
    /// All cells empty.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, a: Location, b: Location) -> Option<u8> {
        self.cells[a.index() * 3 + b.index()]
    }

    pub fn set(&mut self, a: Location, b: Location, dim: Option<u8>) {
        self.cells[a.index() * 3 + b.index()] = dim;
    }

    /// Raise a cell to `dim` unless it already holds a higher dimension.
    pub fn set_at_least(&mut self, a: Location, b: Location, dim: u8) {
        let cell = &mut self.cells[a.index() * 3 + b.index()];
        if cell.is_none_or(|d| d < dim) {
            *cell = Some(dim);
        }
    }

    /// Swap the roles of A and B.
    pub fn transposed(&self) -> Self {
        let mut t = Self::empty();
        for a in Location::ALL {
            for b in Location::ALL {
                t.set(b, a, self.get(a, b));
            }
        }
        t
    }

    /// Match against a 9-character pattern over `T F * 0 1 2`.
    pub fn matches(&self, pattern: &str) -> Result<bool, PatternError> {
        let chars: Vec<char> = pattern.chars().collect();
        if chars.len() != 9 {
            return Err(PatternError::Length(chars.len()));
        }
        let mut all = true;
        for (cell, c) in self.cells.iter().zip(chars) {
            let ok = match c {
                '*' => true,
                'T' | 't' => cell.is_some(),
                'F' | 'f' => cell.is_none(),
                '0' => *cell == Some(0),
                '1' => *cell == Some(1),
                '2' => *cell == Some(2),
                other => return Err(PatternError::InvalidChar(other)),
            };
            all &= ok;
        }
        Ok(all)
    }

    /// Pattern match for patterns known to be well formed.
    pub(crate) fn is(&self, pattern: &'static str) -> bool {
        self.matches(pattern).unwrap_or(false)
    }
}

impl fmt::Display for IntersectionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for cell in &self.cells {
            match cell {
                Some(d) => write!(f, "{d}")?,
                None => f.write_str("F")?,
            }
        }
        Ok(())
    }
}

impl FromStr for IntersectionMatrix {
    type Err = PatternError;

    /// Parse a concrete matrix such as `FF2F11212`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let chars: Vec<char> = s.chars().collect();
        if chars.len() != 9 {
            return Err(PatternError::Length(chars.len()));
        }
        let mut m = Self::empty();
        for (cell, c) in m.cells.iter_mut().zip(chars) {
            *cell = match c {
                'F' | 'f' => None,
                '0' => Some(0),
                '1' => Some(1),
                '2' => Some(2),
                other => return Err(PatternError::InvalidChar(other)),
            };
        }
        Ok(m)
    }
}
