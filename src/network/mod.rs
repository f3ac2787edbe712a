pub mod immobile_l0;
pub mod immobile_l1;
pub mod mobile;

use nalgebra::DVector;

use crate::cluster::Species;
use crate::grouping::constants::GroupConstantTable;
use crate::grouping::scheme::GroupingScheme;

/// Read access to the live unknowns at the evaluation point. Groups are
/// 1-based per axis. Mobile singleton groups carry an L1 slot like every
/// other group; it stays at zero because a width-1 profile has no slope.
pub trait FieldAccess {
    fn l0(&self, species: Species, group: usize) -> f64;
    fn l1(&self, species: Species, group: usize) -> f64;
}

/// Flat state vector: one (L0, L1) pair per group, vacancy axis first, then
/// interstitial. Owned by whoever drives the evaluators; the network itself
/// only ever reads it.
#[derive(Clone, Debug)]
pub struct DenseField {
    values: DVector<f64>,
    vacancy_groups: usize,
}

impl DenseField {
    pub fn new(scheme: &GroupingScheme) -> Self {
        let vacancy_groups = scheme.vacancy.group_count();
        let total = vacancy_groups + scheme.interstitial.group_count();
        Self {
            values: DVector::zeros(2 * total),
            vacancy_groups,
        }
    }

    fn slot(&self, species: Species, group: usize) -> usize {
        match species {
            Species::Vacancy => 2 * (group - 1),
            Species::Interstitial => 2 * (self.vacancy_groups + group - 1),
        }
    }

    pub fn set_l0(&mut self, species: Species, group: usize, value: f64) {
        let s = self.slot(species, group);
        self.values[s] = value;
    }

    pub fn set_l1(&mut self, species: Species, group: usize, value: f64) {
        let s = self.slot(species, group);
        self.values[s + 1] = value;
    }

    pub fn values(&self) -> &DVector<f64> {
        &self.values
    }
}

impl FieldAccess for DenseField {
    fn l0(&self, species: Species, group: usize) -> f64 {
        self.values[self.slot(species, group)]
    }

    fn l1(&self, species: Species, group: usize) -> f64 {
        self.values[self.slot(species, group) + 1]
    }
}

/// Non-owning view tying a grouping scheme to its constant table for one
/// evaluation pass. All evaluators go through this to translate signed sizes
/// into group lookups and to reconstruct per-size concentrations.
///
/// Signed-size convention throughout the evaluators: positive is a vacancy
/// size, negative an interstitial one.
#[derive(Clone, Copy)]
pub struct ReactionNetwork<'a> {
    scheme: &'a GroupingScheme,
    table: &'a GroupConstantTable,
}

impl<'a> ReactionNetwork<'a> {
    pub fn new(scheme: &'a GroupingScheme, table: &'a GroupConstantTable) -> Self {
        Self { scheme, table }
    }

    pub fn scheme(&self) -> &GroupingScheme {
        self.scheme
    }

    pub fn table(&self) -> &GroupConstantTable {
        self.table
    }

    fn split(size: i32) -> (Species, u32) {
        debug_assert_ne!(size, 0);
        if size > 0 {
            (Species::Vacancy, size as u32)
        } else {
            (Species::Interstitial, (-size) as u32)
        }
    }

    /// Signed group id covering the signed size.
    pub fn group_id(&self, size: i32) -> i32 {
        let (species, s) = Self::split(size);
        species.sign() * self.scheme.axis(species).group_of(s) as i32
    }

    /// Concentration at a concrete size, reconstructed from the covering
    /// group's linear profile. Exact for singleton groups.
    pub fn conc_by_size<F: FieldAccess + ?Sized>(&self, field: &F, size: i32) -> f64 {
        let (species, s) = Self::split(size);
        let axis = self.scheme.axis(species);
        let g = axis.group_of(s);
        field.l0(species, g) + field.l1(species, g) * (s as f64 - axis.stats(g).average)
    }

    pub fn absorb(&self, a: i32, b: i32) -> f64 {
        self.table.absorption(self.group_id(a), self.group_id(b))
    }

    pub fn emit(&self, size: i32) -> f64 {
        self.table.emission(self.group_id(size))
    }

    pub fn dislocation(&self, size: i32) -> f64 {
        self.table.dislocation(self.group_id(size))
    }
}
