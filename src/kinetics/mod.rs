pub mod tungsten;

use crate::cluster::Species;

/// Per-size elementary rates for a specific material. Every method is a pure
/// function of its arguments and must be callable for any positive size up to
/// the configured maximum; the grouped core is materially agnostic behind
/// this seam.
pub trait KineticsProvider {
    /// Pairwise absorption (combination/annihilation) rate between clusters
    /// of size `a` and `b`. The mobility tags select which operand's
    /// diffusivity enters the capture expression.
    fn absorb(
        &self,
        a: u32,
        b: u32,
        species_a: Species,
        species_b: Species,
        temperature: f64,
        mobile_a: bool,
        mobile_b: bool,
    ) -> f64;

    /// Rate at which a cluster of `size` emits a point defect of
    /// `reference` size (1 in practice).
    #[allow(clippy::too_many_arguments)]
    fn emit(
        &self,
        size: u32,
        reference: u32,
        temperature: f64,
        species: Species,
        reference_species: Species,
        mobile: bool,
        mobile_reference: bool,
    ) -> f64;

    /// Diffusion coefficient of a cluster of `size`.
    fn diffusivity(&self, size: u32, species: Species, temperature: f64) -> f64;

    /// First-order dislocation-sink rate coefficient; zero for immobile
    /// clusters.
    fn dislocation_sink(&self, size: u32, species: Species, temperature: f64, mobile: bool)
        -> f64;
}

/// Ambient temperature source: a constant, or a function of time evaluated at
/// the designated rebuild point.
pub enum Temperature {
    Constant(f64),
    TimeDependent(Box<dyn Fn(f64) -> f64 + Send + Sync>),
}

impl Temperature {
    pub fn at(&self, time: f64) -> f64 {
        match self {
            Temperature::Constant(t) => *t,
            Temperature::TimeDependent(f) => f(time),
        }
    }
}

impl std::fmt::Debug for Temperature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Temperature::Constant(t) => write!(f, "Temperature::Constant({t})"),
            Temperature::TimeDependent(_) => write!(f, "Temperature::TimeDependent(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temperature_sources() {
        assert_eq!(Temperature::Constant(600.0).at(12.0), 600.0);
        let ramp = Temperature::TimeDependent(Box::new(|t| 300.0 + 10.0 * t));
        assert_eq!(ramp.at(0.0), 300.0);
        assert_eq!(ramp.at(5.0), 350.0);
    }
}
