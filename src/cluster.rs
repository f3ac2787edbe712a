use crate::error::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};

/// The two point-defect species axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Species {
    Vacancy,
    Interstitial,
}

impl Species {
    pub fn opposite(self) -> Species {
        match self {
            Species::Vacancy => Species::Interstitial,
            Species::Interstitial => Species::Vacancy,
        }
    }

    /// Sign of the internal integer encoding: vacancies positive,
    /// interstitials negative.
    pub fn sign(self) -> i32 {
        match self {
            Species::Vacancy => 1,
            Species::Interstitial => -1,
        }
    }
}

/// Tagged identifier for a cluster size (or a group index) on one species
/// axis. This is the API-level replacement for the signed-integer convention;
/// the signed form survives only as a map-key encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ClusterId {
    pub species: Species,
    pub size: u32,
}

impl ClusterId {
    pub fn new(species: Species, size: u32) -> Self {
        Self { species, size }
    }

    pub fn vacancy(size: u32) -> Self {
        Self::new(Species::Vacancy, size)
    }

    pub fn interstitial(size: u32) -> Self {
        Self::new(Species::Interstitial, size)
    }

    /// Signed encoding: `+size` for vacancies, `-size` for interstitials.
    pub fn signed(self) -> i32 {
        self.species.sign() * self.size as i32
    }

    /// Inverse of [`ClusterId::signed`]. Zero has no species and decodes to
    /// `None`.
    pub fn from_signed(id: i32) -> Option<Self> {
        match id {
            0 => None,
            n if n > 0 => Some(Self::vacancy(n as u32)),
            n => Some(Self::interstitial(n.unsigned_abs())),
        }
    }

    /// Decode a variable name of the form `v12` / `gi3`: the trailing digits
    /// give the magnitude and the last non-digit `v` or `i` marker sets the
    /// species. A name with no marker or no digits corrupts the reaction
    /// network silently, so both are fatal.
    pub fn parse(name: &str) -> ModelResult<Self> {
        let digits: String = name
            .chars()
            .rev()
            .take_while(|c| c.is_ascii_digit())
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        if digits.is_empty() {
            return Err(ModelError::VariableSize(name.to_string()));
        }
        let size: u32 = digits
            .parse()
            .map_err(|_| ModelError::VariableSize(name.to_string()))?;
        if size == 0 {
            return Err(ModelError::VariableSize(name.to_string()));
        }

        let stem = &name[..name.len() - digits.len()];
        for c in stem.chars().rev() {
            if c == 'v' {
                return Ok(Self::vacancy(size));
            }
            if c == 'i' {
                return Ok(Self::interstitial(size));
            }
        }
        Err(ModelError::VariableDecode(name.to_string()))
    }
}
