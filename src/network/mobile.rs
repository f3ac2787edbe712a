use super::{FieldAccess, ReactionNetwork};
use crate::cluster::ClusterId;
use crate::error::ModelResult;

/// Population balance for one tracked mobile size.
///
/// The residual follows the loss-positive convention: combination and
/// emission losses enter with a plus sign, gains with a minus, and the
/// driver negates the total into its own rate form. The Jacobian is the
/// analytic derivative with respect to this size's own concentration only;
/// coupling to partner concentrations is deliberately not reported.
pub struct MobileEvaluator {
    id: ClusterId,
}

impl MobileEvaluator {
    pub fn new(id: ClusterId) -> Self {
        Self { id }
    }

    /// Bind to a named variable such as `"v2"` or `"i1"`.
    pub fn from_variable(name: &str) -> ModelResult<Self> {
        Ok(Self::new(ClusterId::parse(name)?))
    }

    pub fn id(&self) -> ClusterId {
        self.id
    }

    pub fn residual<F: FieldAccess + ?Sized>(&self, net: &ReactionNetwork, field: &F) -> f64 {
        let sign = self.id.species.sign();
        let s = self.id.size as i32;
        let same = net.scheme().axis(self.id.species);
        let opp = net.scheme().axis(self.id.species.opposite());
        let max_same = same.max_size() as i32;
        let max_opp = opp.max_size() as i32;
        let mobile_same = same.mobile_max as i32;
        let mobile_opp = opp.mobile_max as i32;
        let u = net.conc_by_size(field, sign * s);

        let mut res = 0.0;

        // cross-species combination loss
        for j in 1..=max_opp {
            res += net.conc_by_size(field, -sign * j) * u * net.absorb(sign * s, -sign * j);
        }

        // same-species combination loss; the extra self-pairing term makes
        // the (s, s) channel count twice in total, once per consumed cluster
        for j in 1..=max_same - s {
            res += net.conc_by_size(field, sign * j) * u * net.absorb(sign * s, sign * j);
        }
        if 2 * s <= max_same {
            res += u * u * net.absorb(sign * s, sign * s);
        }

        // same-species combination gain, each unordered pair once
        for i in 1..=s / 2 {
            res -= net.conc_by_size(field, sign * (s - i))
                * net.conc_by_size(field, sign * i)
                * net.absorb(sign * (s - i), sign * i);
        }

        // cross-species gain: a larger same-species cluster shrinks onto s
        // by absorbing an opposite-species partner; one operand must be mobile
        let max_vi = (s + mobile_opp).min(max_same);
        for i in s + 1..=max_vi {
            if i - s <= mobile_opp || i <= mobile_same {
                res -= net.conc_by_size(field, sign * (s - i))
                    * net.conc_by_size(field, sign * i)
                    * net.absorb(sign * i, sign * (s - i));
            }
        }

        // emission loss, and gain from the next size up
        if s != 1 {
            res += u * net.emit(sign * s);
        }
        if s < max_same {
            res -= net.conc_by_size(field, sign * (s + 1)) * net.emit(sign * (s + 1));
        }
        if s == 1 {
            // every larger cluster feeds the point-defect pool; size 2 is
            // counted a second time since its dissociation frees two singles
            for i in 2..=max_same {
                res -= net.conc_by_size(field, sign * i) * net.emit(sign * i);
            }
        }

        // dislocation sink loss
        res += u * net.dislocation(sign * s);

        res
    }

    pub fn jacobian<F: FieldAccess + ?Sized>(&self, net: &ReactionNetwork, field: &F) -> f64 {
        let sign = self.id.species.sign();
        let s = self.id.size as i32;
        let same = net.scheme().axis(self.id.species);
        let opp = net.scheme().axis(self.id.species.opposite());
        let max_same = same.max_size() as i32;
        let max_opp = opp.max_size() as i32;
        let u = net.conc_by_size(field, sign * s);

        let mut jac = 0.0;

        for j in 1..=max_opp {
            jac += net.conc_by_size(field, -sign * j) * net.absorb(sign * s, -sign * j);
        }

        for j in 1..=max_same - s {
            jac += net.conc_by_size(field, sign * j) * net.absorb(sign * s, sign * j);
        }
        if 2 * s <= max_same {
            // the loss loop above already counted u once for the self pair;
            // the residual's 2u^2 differentiates to 4u in total
            jac += 3.0 * u * net.absorb(sign * s, sign * s);
        }

        jac += net.emit(sign * s);
        jac += net.dislocation(sign * s);

        jac
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::Species;
    use crate::config::{AxisConfig, BinningLaw, GroupingConfig};
    use crate::grouping::constants::GroupConstantTable;
    use crate::grouping::scheme::GroupingScheme;
    use crate::kinetics::KineticsProvider;
    use crate::network::DenseField;

    const T: f64 = 800.0;

    /// Same-species combination at a fixed rate, nothing else.
    struct ConstantRate {
        r: f64,
    }

    impl KineticsProvider for ConstantRate {
        fn absorb(
            &self,
            _a: u32,
            _b: u32,
            species_a: Species,
            species_b: Species,
            _temperature: f64,
            mobile_a: bool,
            mobile_b: bool,
        ) -> f64 {
            if species_a == species_b && (mobile_a || mobile_b) {
                self.r
            } else {
                0.0
            }
        }

        fn emit(
            &self,
            _size: u32,
            _reference: u32,
            _temperature: f64,
            _species: Species,
            _reference_species: Species,
            _mobile: bool,
            _mobile_reference: bool,
        ) -> f64 {
            0.0
        }

        fn diffusivity(&self, _size: u32, _species: Species, _temperature: f64) -> f64 {
            0.0
        }

        fn dislocation_sink(
            &self,
            _size: u32,
            _species: Species,
            _temperature: f64,
            _mobile: bool,
        ) -> f64 {
            0.0
        }
    }

    fn two_size_scheme() -> GroupingScheme {
        GroupingScheme::new(GroupingConfig {
            law: BinningLaw::Uniform,
            dr_coef: 0.2,
            vacancy: AxisConfig {
                group_count: 2,
                max_size: 2,
                singleton_count: 2,
                mobile_max: 2,
            },
            interstitial: AxisConfig {
                group_count: 1,
                max_size: 1,
                singleton_count: 1,
                mobile_max: 1,
            },
            temperature: Some(T),
            update_scheme: false,
        })
        .unwrap()
    }

    #[test]
    fn combination_balance_on_two_sizes() {
        let r = 3.0;
        let scheme = two_size_scheme();
        let table = GroupConstantTable::build(&scheme, &ConstantRate { r }, T);
        let net = ReactionNetwork::new(&scheme, &table);

        let c1 = 0.7;
        let mut field = DenseField::new(&scheme);
        field.set_l0(Species::Vacancy, 1, c1);

        // Size 1 loses twice per self pairing, size 2 gains each pair once.
        let e1 = MobileEvaluator::new(ClusterId::vacancy(1));
        let e2 = MobileEvaluator::new(ClusterId::vacancy(2));
        assert!((e1.residual(&net, &field) - 2.0 * r * c1 * c1).abs() < 1e-12);
        assert!((e2.residual(&net, &field) + r * c1 * c1).abs() < 1e-12);
    }

    #[test]
    fn self_pairing_jacobian_is_the_full_derivative() {
        let r = 3.0;
        let scheme = two_size_scheme();
        let table = GroupConstantTable::build(&scheme, &ConstantRate { r }, T);
        let net = ReactionNetwork::new(&scheme, &table);

        let c1 = 0.7;
        let mut field = DenseField::new(&scheme);
        field.set_l0(Species::Vacancy, 1, c1);

        // d(2 r c1^2)/dc1 = 4 r c1
        let e1 = MobileEvaluator::new(ClusterId::vacancy(1));
        assert!((e1.jacobian(&net, &field) - 4.0 * r * c1).abs() < 1e-12);
    }

    #[test]
    fn empty_field_has_zero_residual() {
        let scheme = two_size_scheme();
        let table = GroupConstantTable::build(&scheme, &ConstantRate { r: 5.0 }, T);
        let net = ReactionNetwork::new(&scheme, &table);
        let field = DenseField::new(&scheme);
        for size in 1..=2 {
            let e = MobileEvaluator::new(ClusterId::vacancy(size));
            assert_eq!(e.residual(&net, &field), 0.0);
        }
    }

    #[test]
    fn binds_to_variable_names() {
        let e = MobileEvaluator::from_variable("i1").unwrap();
        assert_eq!(e.id(), ClusterId::interstitial(1));
        assert!(MobileEvaluator::from_variable("x9").is_err());
    }
}
