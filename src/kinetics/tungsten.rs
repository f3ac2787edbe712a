use super::KineticsProvider;
use crate::cluster::Species;

const PI: f64 = std::f64::consts::PI;
/// Stand-in for an unbreakable bond; a size-1 "cluster" never dissociates.
const E_INF: f64 = 100.0;
/// Tungsten atomic volume, um^3.
const V_ATOM: f64 = 1.5825e-11;
/// Burgers vector, um (sqrt(3)/2 * a0).
const BURGERS: f64 = 2.7366e-4;
/// Vacancy-interstitial recombination distance, um.
const R_VI: f64 = 0.65e-3;
/// Boltzmann constant, eV/K.
const K_B: f64 = 8.6173315e-5;

/// BCC tungsten kinetics: ab-initio migration/binding energies for small
/// clusters and a capillary law beyond, after the OKMC parameterisation of
/// irradiated tungsten.
#[derive(Clone, Debug)]
pub struct Tungsten {
    /// Dislocation density, um^-2.
    pub rho_d: f64,
    pub i_bias: f64,
    pub v_bias: f64,
    ei_formation: f64,
    ev_formation: f64,
    ei_binding_factor: f64,
    ev_binding_factor: f64,
}

impl Default for Tungsten {
    fn default() -> Self {
        Self::new(1.0e-1, 1.15, 1.0)
    }
}

impl Tungsten {
    pub fn new(rho_d: f64, i_bias: f64, v_bias: f64) -> Self {
        let ei_formation = 9.96;
        let ev_formation = 3.23;
        let eib2 = 2.12; // binding energy of the size-2 interstitial cluster
        let evb2 = -0.1; // binding energy of the size-2 vacancy cluster
        let scale = 2.0_f64.powf(2.0 / 3.0) - 1.0;
        Self {
            rho_d,
            i_bias,
            v_bias,
            ei_formation,
            ev_formation,
            ei_binding_factor: (eib2 - ei_formation) / scale,
            ev_binding_factor: (evb2 - ev_formation) / scale,
        }
    }

    pub fn atomic_volume(&self) -> f64 {
        V_ATOM
    }

    fn migration_energy(&self, species: Species) -> f64 {
        match species {
            Species::Vacancy => 1.66,
            Species::Interstitial => 0.013,
        }
    }

    /// Binding energy in eV: tabulated for the smallest clusters, capillary
    /// law beyond size 7.
    fn binding_energy(&self, size: u32, species: Species) -> f64 {
        let capillary = |formation: f64, factor: f64| {
            let s = size as f64;
            formation + factor * (s.powf(2.0 / 3.0) - (s - 1.0).powf(2.0 / 3.0))
        };
        match species {
            Species::Vacancy => match size {
                1 => E_INF,
                2 => -0.1,
                3 => 0.04,
                4 => 0.64,
                5 => 0.72,
                6 => 0.89,
                7 => 0.72,
                _ => capillary(self.ev_formation, self.ev_binding_factor),
            },
            Species::Interstitial => match size {
                1 => E_INF,
                2 => 2.12,
                3 => 3.02,
                4 => 3.6,
                5 => 3.98,
                6 => 4.27,
                7 => 5.39,
                _ => capillary(self.ei_formation, self.ei_binding_factor),
            },
        }
    }

    /// Diffusion prefactor, um^2/s.
    fn d_prefactor(&self, size: u32, species: Species) -> f64 {
        let n = size as f64;
        match species {
            Species::Vacancy => 6.0096 * 10.0_f64.powf(8.0 - 3.0 * n),
            Species::Interstitial => 1.0016e5 * n.powf(-0.5),
        }
    }

    /// 3D capture-volume absorption width for a spherical sink of `size`.
    fn spherical_width(size: u32) -> f64 {
        (48.0 * PI * PI / V_ATOM / V_ATOM * size as f64).powf(1.0 / 3.0)
    }

    /// Capture width for loop-like interstitial clusters.
    fn loop_width(size: u32) -> f64 {
        (4.0 * PI / V_ATOM / BURGERS * size as f64).powf(1.0 / 2.0)
    }

    fn absorb_vv(&self, a: u32, b: u32, mobile_a: bool, mobile_b: bool, temp: f64) -> f64 {
        let d_a = self.diffusivity(a, Species::Vacancy, temp);
        let d_b = self.diffusivity(b, Species::Vacancy, temp);
        match (mobile_a, mobile_b) {
            (true, false) => Self::spherical_width(b) * V_ATOM * d_a,
            (false, true) => Self::spherical_width(a) * V_ATOM * d_b,
            (true, true) => Self::spherical_width(a.max(b)) * V_ATOM * (d_a + d_b),
            (false, false) => 0.0,
        }
    }

    /// `a` is the vacancy operand, `b` the interstitial one.
    fn absorb_vi(&self, a: u32, b: u32, mobile_a: bool, mobile_b: bool, temp: f64) -> f64 {
        let d_a = self.diffusivity(a, Species::Vacancy, temp);
        let d_b = self.diffusivity(b, Species::Interstitial, temp);
        match (mobile_a, mobile_b) {
            (true, false) => self.v_bias * Self::loop_width(b) * V_ATOM * d_a,
            (false, true) => Self::spherical_width(a) * V_ATOM * d_b,
            (true, true) => 4.0 * PI * R_VI / V_ATOM * (d_a + d_b),
            (false, false) => 0.0,
        }
    }

    fn absorb_ii(&self, a: u32, b: u32, mobile_a: bool, mobile_b: bool, temp: f64) -> f64 {
        let d_a = self.diffusivity(a, Species::Interstitial, temp);
        let d_b = self.diffusivity(b, Species::Interstitial, temp);
        self.i_bias
            * V_ATOM
            * match (mobile_a, mobile_b) {
                (true, false) => Self::loop_width(b) * d_a,
                (false, true) => Self::loop_width(a) * d_b,
                (true, true) => Self::loop_width(a.max(b)) * (d_a + d_b),
                (false, false) => 0.0,
            }
    }
}

impl KineticsProvider for Tungsten {
    fn absorb(
        &self,
        a: u32,
        b: u32,
        species_a: Species,
        species_b: Species,
        temperature: f64,
        mobile_a: bool,
        mobile_b: bool,
    ) -> f64 {
        if !mobile_a && !mobile_b {
            return 0.0;
        }
        match (species_a, species_b) {
            (Species::Vacancy, Species::Vacancy) => {
                self.absorb_vv(a, b, mobile_a, mobile_b, temperature)
            }
            (Species::Vacancy, Species::Interstitial) => {
                self.absorb_vi(a, b, mobile_a, mobile_b, temperature)
            }
            (Species::Interstitial, Species::Vacancy) => {
                self.absorb_vi(b, a, mobile_b, mobile_a, temperature)
            }
            (Species::Interstitial, Species::Interstitial) => {
                self.absorb_ii(a, b, mobile_a, mobile_b, temperature)
            }
        }
    }

    fn emit(
        &self,
        size: u32,
        reference: u32,
        temperature: f64,
        species: Species,
        _reference_species: Species,
        mobile: bool,
        mobile_reference: bool,
    ) -> f64 {
        // Interstitial clusters do not dissociate; only single-vacancy
        // emission is parameterised.
        if species == Species::Interstitial || size <= reference || reference != 1 {
            return 0.0;
        }
        let capture = self.absorb(
            size,
            reference,
            species,
            species,
            temperature,
            mobile,
            mobile_reference,
        );
        capture / V_ATOM * (-self.binding_energy(size, species) / K_B / temperature).exp()
    }

    fn diffusivity(&self, size: u32, species: Species, temperature: f64) -> f64 {
        self.d_prefactor(size, species)
            * (-self.migration_energy(species) / K_B / temperature).exp()
    }

    fn dislocation_sink(
        &self,
        size: u32,
        species: Species,
        temperature: f64,
        mobile: bool,
    ) -> f64 {
        if !mobile {
            return 0.0;
        }
        let bias = match species {
            Species::Vacancy => self.v_bias,
            Species::Interstitial => self.i_bias,
        };
        self.diffusivity(size, species, temperature) * self.rho_d * bias
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: f64 = 800.0;

    #[test]
    fn immobile_pairs_do_not_react() {
        let w = Tungsten::default();
        let rate = w.absorb(10, 12, Species::Vacancy, Species::Vacancy, T, false, false);
        assert_eq!(rate, 0.0);
    }

    #[test]
    fn interstitials_never_emit() {
        let w = Tungsten::default();
        let rate = w.emit(5, 1, T, Species::Interstitial, Species::Interstitial, false, true);
        assert_eq!(rate, 0.0);
    }

    #[test]
    fn single_vacancy_emission_is_suppressed() {
        // Binding of a "size-1 cluster" is effectively infinite.
        let w = Tungsten::default();
        assert_eq!(w.emit(1, 1, T, Species::Vacancy, Species::Vacancy, true, true), 0.0);
        assert!(w.emit(4, 1, T, Species::Vacancy, Species::Vacancy, false, true) > 0.0);
    }

    #[test]
    fn mixed_species_absorption_is_operand_symmetric() {
        let w = Tungsten::default();
        let vi = w.absorb(6, 2, Species::Vacancy, Species::Interstitial, T, false, true);
        let iv = w.absorb(2, 6, Species::Interstitial, Species::Vacancy, T, true, false);
        assert_eq!(vi, iv);
    }

    #[test]
    fn interstitials_diffuse_faster_than_vacancies() {
        let w = Tungsten::default();
        let dv = w.diffusivity(1, Species::Vacancy, T);
        let di = w.diffusivity(1, Species::Interstitial, T);
        assert!(di > dv);
        assert!(dv > 0.0);
    }

    #[test]
    fn dislocation_sink_requires_mobility() {
        let w = Tungsten::default();
        assert_eq!(w.dislocation_sink(3, Species::Vacancy, T, false), 0.0);
        assert!(w.dislocation_sink(1, Species::Interstitial, T, true) > 0.0);
    }
}
