use crate::error::{ModelError, ModelResult};
use crate::kinetics::Temperature;
use serde::{Deserialize, Serialize};

/// How the size axis is partitioned into groups beyond the singleton range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinningLaw {
    /// Equal (integer-rounded) widths over the remaining range; the final
    /// edge is forced onto the configured maximum size.
    Uniform,
    /// Group widths grow as `dr_coef * edge^(2/3)`: narrow groups where the
    /// kinetics vary fastest, wide groups at large sizes. The maximum size is
    /// an output of the growth rule.
    RSpace,
}

impl Default for BinningLaw {
    fn default() -> Self {
        BinningLaw::Uniform
    }
}

/// Per-species-axis grouping parameters.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct AxisConfig {
    /// Total number of groups, counting each singleton as a group of width 1.
    pub group_count: usize,
    /// Largest tracked cluster size (Uniform law; ignored by RSpace).
    pub max_size: u32,
    /// Leading groups of width 1.
    pub singleton_count: usize,
    /// Sizes at or below this are mobile and tracked individually.
    pub mobile_max: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GroupingConfig {
    #[serde(default)]
    pub law: BinningLaw,
    /// R-space growth coefficient, `dr*(36*pi/Vatom)^(1/3)`.
    #[serde(default = "default_dr_coef")]
    pub dr_coef: f64,
    pub vacancy: AxisConfig,
    pub interstitial: AxisConfig,
    /// System temperature in K. May be omitted when a time-dependent source
    /// is supplied programmatically.
    #[serde(default)]
    pub temperature: Option<f64>,
    /// Re-binning policy: whether `update()` rebuilds the scheme. The core
    /// consumes the flag; when to trigger the update is the caller's call.
    #[serde(default)]
    pub update_scheme: bool,
}

fn default_dr_coef() -> f64 {
    0.2
}

impl AxisConfig {
    fn validate(&self, axis: &str, law: BinningLaw) -> ModelResult<()> {
        if self.singleton_count > self.group_count {
            return Err(ModelError::Config(format!(
                "{axis}: singleton count {} exceeds group count {}",
                self.singleton_count, self.group_count
            )));
        }
        if self.mobile_max as usize > self.singleton_count {
            return Err(ModelError::Config(format!(
                "{axis}: mobile sizes up to {} must all be singleton groups \
                 (singleton count is {})",
                self.mobile_max, self.singleton_count
            )));
        }
        if law == BinningLaw::Uniform && (self.max_size as usize) < self.group_count {
            return Err(ModelError::Config(format!(
                "{axis}: max size {} smaller than group count {}",
                self.max_size, self.group_count
            )));
        }
        Ok(())
    }
}

impl GroupingConfig {
    pub fn from_file(path: &str) -> ModelResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ModelResult<()> {
        self.vacancy.validate("vacancy axis", self.law)?;
        self.interstitial.validate("interstitial axis", self.law)?;
        if self.law == BinningLaw::RSpace && self.dr_coef <= 0.0 {
            return Err(ModelError::Config(format!(
                "R-space coefficient must be positive, got {}",
                self.dr_coef
            )));
        }
        Ok(())
    }

    /// The constant temperature source, or a configuration error when the
    /// field is absent and no programmatic source was supplied.
    pub fn temperature_source(&self) -> ModelResult<Temperature> {
        self.temperature
            .map(Temperature::Constant)
            .ok_or_else(|| ModelError::Config("temperature must be provided".to_string()))
    }
}
