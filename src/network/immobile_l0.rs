use super::{FieldAccess, ReactionNetwork};
use crate::cluster::{ClusterId, Species};
use crate::error::{ModelError, ModelResult};
use crate::grouping::scheme::GroupingScheme;

/// Group-average (L0) balance for one immobile group.
///
/// The in-group profile is `conc(size) = L0 + L1 * (size - average)`. The
/// residual collects boundary fluxes: same-species gain entering through the
/// left boundary from the previous group's top sizes, losses out of both
/// boundaries, and emission exchange with the neighbouring groups, all
/// normalized by the group width. The right-boundary terms vanish for the
/// last group on the axis.
pub struct ImmobileL0Evaluator {
    species: Species,
    group: usize,
}

impl ImmobileL0Evaluator {
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

    /// Bind to a named variable; the magnitude is the group index here.
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
        let edges = axis.edges();
        let g = self.group;
        let lo = edges[g - 1] as i32;
        let hi = edges[g] as i32;
        let width = axis.stats(g).width as i32;
        let mm_same = axis.mobile_max as i32;
        let mm_opp = opp.mobile_max as i32;

        let mut res = 0.0;

        // left boundary: same-species gain out of the previous group's top
        // sizes; the third cap skips pairs already owned by a mobile balance
        for i in 0..mm_same {
            let cap = (mm_same - 1 - i).min(width - 1).min(lo - 1 - 2 * i);
            if cap < 0 {
                continue;
            }
            let conc1 = net.conc_by_size(field, sign * (lo - i));
            for j in 0..=cap {
                let conc2 = net.conc_by_size(field, sign * (i + j + 1));
                res -= conc1 * conc2 * net.absorb(sign * (lo - i), sign * (i + j + 1));
            }
        }

        // left boundary: emission loss at the group's first size
        res += net.conc_by_size(field, sign * (lo + 1)) * net.emit(sign * (lo + 1));

        // left boundary: cross-species loss shrinking this group's low sizes
        for i in 0..mm_opp {
            let cap = (mm_opp - 1 - i).min(width - 1);
            for j in 0..=cap {
                let conc1 = net.conc_by_size(field, sign * (lo + j + 1));
                let conc2 = net.conc_by_size(field, -sign * (i + j + 1));
                res += conc1 * conc2 * net.absorb(sign * (lo + j + 1), -sign * (i + j + 1));
            }
        }

        if g != axis.group_count() {
            let axis_max = axis.max_size() as i32;

            // right boundary: same-species loss out of this group's top sizes
            let cap = (mm_same - 1).min(width - 1);
            for i in 0..=cap {
                let conc1 = net.conc_by_size(field, sign * (hi - i));
                for j in 0..=(mm_same - 1 - i) {
                    let conc2 = net.conc_by_size(field, sign * (i + j + 1));
                    res += conc1 * conc2 * net.absorb(sign * (hi - i), sign * (i + j + 1));
                }
            }

            // right boundary: cross-species gain shrinking larger clusters
            // back in; the partner group is looked up, never assumed adjacent
            let cap = (mm_opp - 1).min(width - 1);
            for i in 0..=cap {
                let reach = (mm_opp - 1 - i).min(axis_max - hi - 1);
                for j in 0..=reach {
                    let conc1 = net.conc_by_size(field, sign * (hi + j + 1));
                    let conc2 = net.conc_by_size(field, -sign * (i + j + 1));
                    res -= conc1 * conc2 * net.absorb(sign * (hi + j + 1), -sign * (i + j + 1));
                }
            }

            // right boundary: emission gain from the next group's first size
            res -= net.conc_by_size(field, sign * (hi + 1)) * net.emit(sign * (hi + 1));
        }

        res / width as f64
    }

    /// Derivative with respect to this group's own L0 value. Terms built
    /// from other groups' profiles do not contribute.
    pub fn jacobian<F: FieldAccess + ?Sized>(&self, net: &ReactionNetwork, field: &F) -> f64 {
        let sign = self.species.sign();
        let axis = net.scheme().axis(self.species);
        let opp = net.scheme().axis(self.species.opposite());
        let edges = axis.edges();
        let g = self.group;
        let lo = edges[g - 1] as i32;
        let hi = edges[g] as i32;
        let width = axis.stats(g).width as i32;
        let mm_same = axis.mobile_max as i32;
        let mm_opp = opp.mobile_max as i32;

        let mut jac = net.emit(sign * (lo + 1));

        for i in 0..mm_opp {
            let cap = (mm_opp - 1 - i).min(width - 1);
            for j in 0..=cap {
                let conc2 = net.conc_by_size(field, -sign * (i + j + 1));
                jac += conc2 * net.absorb(sign * (lo + j + 1), -sign * (i + j + 1));
            }
        }

        if g != axis.group_count() {
            let cap = (mm_same - 1).min(width - 1);
            for i in 0..=cap {
                for j in 0..=(mm_same - 1 - i) {
                    let conc2 = net.conc_by_size(field, sign * (i + j + 1));
                    jac += conc2 * net.absorb(sign * (hi - i), sign * (i + j + 1));
                }
            }
        }

        jac / width as f64
    }
}
