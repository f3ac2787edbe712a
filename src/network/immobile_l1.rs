use super::{FieldAccess, ReactionNetwork};
use crate::cluster::{ClusterId, Species};
use crate::error::{ModelError, ModelResult};
use crate::grouping::scheme::GroupingScheme;

/// Dispersions below this count as degenerate and short-circuit to zero.
const DISPERSION_FLOOR: f64 = 1.0e-12;

/// Linear-correction (L1) balance for one immobile group.
///
/// Structurally the same boundary decomposition as the L0 balance, but every
/// boundary term carries a linear moment weight (`(-1 - width)/2` on the
/// left, `(-1 + width)/2` on the right) and an interior walk accumulates the
/// exact per-size contributions weighted by their offset from the group
/// average. The total is normalized by width times dispersion; a degenerate
/// group (width 1) contributes exactly zero.
pub struct ImmobileL1Evaluator {
    species: Species,
    group: usize,
}

impl ImmobileL1Evaluator {
    pub fn new(species: Species, group: usize, scheme: &GroupingScheme) -> ModelResult<Self> {
        let axis = scheme.axis(species);
        if group == 0 || group > axis.group_count() {
            return Err(ModelError::Config(format!(
                "group {group} outside the {species:?} axis (1..={})",
                axis.group_count()
            )));
        }
        if group < axis.mobile_max as usize {
            return Err(ModelError::Config(format!(
                "group {group} of the {species:?} axis lies inside the mobile range \
                 (threshold {})",
                axis.mobile_max
            )));
        }
        Ok(Self { species, group })
    }

    pub fn from_variable(name: &str, scheme: &GroupingScheme) -> ModelResult<Self> {
        let id = ClusterId::parse(name)?;
        Self::new(id.species, id.size as usize, scheme)
    }

    pub fn group(&self) -> usize {
        self.group
    }

    pub fn residual<F: FieldAccess + ?Sized>(&self, net: &ReactionNetwork, field: &F) -> f64 {
        let sign = self.species.sign();
        let axis = net.scheme().axis(self.species);
        let opp = net.scheme().axis(self.species.opposite());
        let stats = axis.stats(self.group);
        if stats.dispersion < DISPERSION_FLOOR {
            return 0.0;
        }

        let edges = axis.edges();
        let g = self.group;
        let lo = edges[g - 1] as i32;
        let hi = edges[g] as i32;
        let width = stats.width as i32;
        let mm_same = axis.mobile_max as i32;
        let mm_opp = opp.mobile_max as i32;
        let c_lo = (-1.0 - width as f64) / 2.0;
        let c_hi = (-1.0 + width as f64) / 2.0;

        let mut res = 0.0;

        // left boundary: same-species gain, weighted by the partner offset
        for i in 0..mm_same {
            let cap = (mm_same - 1 - i).min(width - 1);
            let conc1 = net.conc_by_size(field, sign * (lo - i));
            for j in 0..=cap {
                let conc2 = net.conc_by_size(field, sign * (i + j + 1));
                res -= (c_lo + (j + 1) as f64)
                    * conc1
                    * conc2
                    * net.absorb(sign * (lo - i), sign * (i + j + 1));
            }
        }

        // left boundary: emission loss
        res += (c_lo + 1.0)
            * net.conc_by_size(field, sign * (lo + 1))
            * net.emit(sign * (lo + 1));

        // left boundary: cross-species loss
        for i in 0..mm_opp {
            let cap = (mm_opp - 1 - i).min(width - 1);
            for j in 0..=cap {
                let conc1 = net.conc_by_size(field, sign * (lo + j + 1));
                let conc2 = net.conc_by_size(field, -sign * (i + j + 1));
                res += (c_lo + (j + 1) as f64)
                    * conc1
                    * conc2
                    * net.absorb(sign * (lo + j + 1), -sign * (i + j + 1));
            }
        }

        if g != axis.group_count() {
            let axis_max = axis.max_size() as i32;

            // right boundary: same-species loss
            let cap = (mm_same - 1).min(width - 1);
            for i in 0..=cap {
                let conc1 = net.conc_by_size(field, sign * (hi - i));
                for j in 0..=(mm_same - 1 - i) {
                    let conc2 = net.conc_by_size(field, sign * (i + j + 1));
                    res += (c_hi - i as f64)
                        * conc1
                        * conc2
                        * net.absorb(sign * (hi - i), sign * (i + j + 1));
                }
            }

            // right boundary: cross-species gain
            let cap = (mm_opp - 1).min(width - 1);
            for i in 0..=cap {
                let reach = (mm_opp - 1 - i).min(axis_max - hi - 1);
                for j in 0..=reach {
                    let conc1 = net.conc_by_size(field, sign * (hi + j + 1));
                    let conc2 = net.conc_by_size(field, -sign * (i + j + 1));
                    res -= (c_hi - i as f64)
                        * conc1
                        * conc2
                        * net.absorb(sign * (hi + j + 1), -sign * (i + j + 1));
                }
            }

            // right boundary: emission gain from the next group
            res -= c_hi
                * net.conc_by_size(field, sign * (hi + 1))
                * net.emit(sign * (hi + 1));
        }

        // interior walk: exact per-size terms weighted by the size offset
        for k in lo + 1..=hi {
            let conc1 = net.conc_by_size(field, sign * k);
            for j in 1..=mm_same.min(hi - k) {
                let conc2 = net.conc_by_size(field, sign * j);
                res -= conc1 * conc2 * net.absorb(sign * k, sign * j) * j as f64;
            }
            for j in 1..=mm_opp.min(k - lo - 1) {
                let conc2 = net.conc_by_size(field, -sign * j);
                res += conc1 * conc2 * net.absorb(sign * k, -sign * j) * j as f64;
            }
            res += conc1 * net.emit(sign * k);
        }
        // the interior emission walk starts one size too early; take the
        // first size back out
        res -= net.conc_by_size(field, sign * (lo + 1)) * net.emit(sign * (lo + 1));

        res / (width as f64 * stats.dispersion)
    }

    /// Derivative with respect to this group's own L1 value; every term built
    /// from the group's profile carries a `(size - average)` factor.
    pub fn jacobian<F: FieldAccess + ?Sized>(&self, net: &ReactionNetwork, field: &F) -> f64 {
        let sign = self.species.sign();
        let axis = net.scheme().axis(self.species);
        let opp = net.scheme().axis(self.species.opposite());
        let stats = axis.stats(self.group);
        if stats.dispersion < DISPERSION_FLOOR {
            return 0.0;
        }

        let edges = axis.edges();
        let g = self.group;
        let lo = edges[g - 1] as i32;
        let hi = edges[g] as i32;
        let width = stats.width as i32;
        let avg = stats.average;
        let mm_same = axis.mobile_max as i32;
        let mm_opp = opp.mobile_max as i32;
        let c_lo = (-1.0 - width as f64) / 2.0;
        let c_hi = (-1.0 + width as f64) / 2.0;

        let mut jac = (c_lo + 1.0) * ((lo + 1) as f64 - avg) * net.emit(sign * (lo + 1));

        for i in 0..mm_opp {
            let cap = (mm_opp - 1 - i).min(width - 1);
            for j in 0..=cap {
                let conc2 = net.conc_by_size(field, -sign * (i + j + 1));
                jac += (c_lo + (j + 1) as f64)
                    * ((lo + j + 1) as f64 - avg)
                    * conc2
                    * net.absorb(sign * (lo + j + 1), -sign * (i + j + 1));
            }
        }

        if g != axis.group_count() {
            let cap = (mm_same - 1).min(width - 1);
            for i in 0..=cap {
                for j in 0..=(mm_same - 1 - i) {
                    let conc2 = net.conc_by_size(field, sign * (i + j + 1));
                    jac += (c_hi - i as f64)
                        * ((hi - i) as f64 - avg)
                        * conc2
                        * net.absorb(sign * (hi - i), sign * (i + j + 1));
                }
            }
        }

        for k in lo + 1..=hi {
            let offset = k as f64 - avg;
            for j in 1..=mm_same.min(hi - k) {
                let conc2 = net.conc_by_size(field, sign * j);
                jac -= offset * conc2 * net.absorb(sign * k, sign * j) * j as f64;
            }
            for j in 1..=mm_opp.min(k - lo - 1) {
                let conc2 = net.conc_by_size(field, -sign * j);
                jac += offset * conc2 * net.absorb(sign * k, -sign * j) * j as f64;
            }
            jac += offset * net.emit(sign * k);
        }
        jac -= ((lo + 1) as f64 - avg) * net.emit(sign * (lo + 1));

        jac / (width as f64 * stats.dispersion)
    }
}
