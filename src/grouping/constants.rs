use crate::cluster::Species;
use crate::grouping::scheme::{AxisScheme, GroupingScheme};
use crate::kinetics::KineticsProvider;
use std::collections::HashMap;

/// Group-aggregated reaction-rate constants, keyed by signed group id
/// (`+k` = vacancy group k, `-k` = interstitial group k). Built once per
/// grouping scheme; re-binning replaces the whole table, never patches it.
///
/// Lookups for absent entries return 0.0: a missing reaction channel is a
/// legitimate physical outcome, not an error.
#[derive(Clone, Debug, Default)]
pub struct GroupConstantTable {
    emission: HashMap<i32, f64>,
    dislocation: HashMap<i32, f64>,
    diffusion: HashMap<i32, f64>,
    absorption: HashMap<(i32, i32), f64>,
}

impl GroupConstantTable {
    /// Aggregate the provider's per-size rates into group constants by
    /// arithmetic averaging over each group's span. `temperature` is the
    /// ambient value at the build instant.
    pub fn build(
        scheme: &GroupingScheme,
        kinetics: &dyn KineticsProvider,
        temperature: f64,
    ) -> Self {
        let mut table = Self::default();
        for species in [Species::Vacancy, Species::Interstitial] {
            table.fill_axis(scheme, species, kinetics, temperature);
        }
        table
    }

    /// Whole-table replace, mirroring the scheme's rebuild-not-patch policy.
    pub fn rebuild(
        &mut self,
        scheme: &GroupingScheme,
        kinetics: &dyn KineticsProvider,
        temperature: f64,
    ) {
        *self = Self::build(scheme, kinetics, temperature);
    }

    fn fill_axis(
        &mut self,
        scheme: &GroupingScheme,
        species: Species,
        kinetics: &dyn KineticsProvider,
        temperature: f64,
    ) {
        let axis = scheme.axis(species);
        let sign = species.sign();

        // Emission: every group, averaged over its span.
        for k in 1..=axis.group_count() {
            let rate = mean_over_group(axis, k, |size, mobile| {
                kinetics.emit(size, 1, temperature, species, species, mobile, true)
            });
            self.emission.insert(sign * k as i32, rate);
        }

        // Dislocation sink and diffusion: mobile singleton groups only, so
        // group index and size coincide and the average is a no-op.
        for k in 1..=axis.mobile_max as usize {
            let disl = mean_over_group(axis, k, |size, mobile| {
                kinetics.dislocation_sink(size, species, temperature, mobile)
            });
            self.dislocation.insert(sign * k as i32, disl);

            let diff = mean_over_group(axis, k, |size, _| {
                kinetics.diffusivity(size, species, temperature)
            });
            self.diffusion.insert(sign * k as i32, diff);
        }

        // Absorption: every group of this axis against every mobile singleton
        // of either axis. The second operand must be a single concrete size;
        // group-vs-group constants are not aggregated.
        for k in 1..=axis.group_count() {
            for partner_species in [Species::Vacancy, Species::Interstitial] {
                let partner_axis = scheme.axis(partner_species);
                for m in 1..=partner_axis.mobile_max {
                    debug_assert_eq!(partner_axis.stats(m as usize).width, 1);
                    let rate = mean_over_group(axis, k, |size, mobile| {
                        kinetics.absorb(
                            size,
                            m,
                            species,
                            partner_species,
                            temperature,
                            mobile,
                            true,
                        )
                    });
                    let key = (sign * k as i32, partner_species.sign() * m as i32);
                    self.absorption.insert(key, rate);
                }
            }
        }
    }

    /// Averaged emission rate of group `id`, 0.0 when absent.
    pub fn emission(&self, id: i32) -> f64 {
        self.emission.get(&id).copied().unwrap_or(0.0)
    }

    /// Averaged dislocation-sink coefficient, 0.0 for immobile groups.
    pub fn dislocation(&self, id: i32) -> f64 {
        self.dislocation.get(&id).copied().unwrap_or(0.0)
    }

    /// Averaged diffusion coefficient, 0.0 for immobile groups.
    pub fn diffusion(&self, id: i32) -> f64 {
        self.diffusion.get(&id).copied().unwrap_or(0.0)
    }

    /// Averaged absorption constant for the group pair, trying the reversed
    /// order before giving up with 0.0.
    pub fn absorption(&self, a: i32, b: i32) -> f64 {
        if let Some(rate) = self.absorption.get(&(a, b)) {
            return *rate;
        }
        if let Some(rate) = self.absorption.get(&(b, a)) {
            return *rate;
        }
        #[cfg(debug_assertions)]
        eprintln!("absorption constant not found, returning 0: {a} vs {b}");
        0.0
    }
}

/// Arithmetic mean of `rate(size, mobile_tag)` over the sizes covered by
/// group `k`. Returns 0.0 for an empty span (no eligible sizes means no
/// contribution).
fn mean_over_group(axis: &AxisScheme, k: usize, rate: impl Fn(u32, bool) -> f64) -> f64 {
    let edges = axis.edges();
    let (lo, hi) = (edges[k - 1], edges[k]);
    if lo >= hi {
        return 0.0;
    }
    let mut sum = 0.0;
    for size in lo + 1..=hi {
        sum += rate(size, size <= axis.mobile_max);
    }
    sum / (hi - lo) as f64
}
