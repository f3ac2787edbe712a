use clusterdyn_rs::cluster::{ClusterId, Species};
use clusterdyn_rs::config::{AxisConfig, BinningLaw, GroupingConfig};
use clusterdyn_rs::grouping::constants::GroupConstantTable;
use clusterdyn_rs::grouping::scheme::GroupingScheme;
use clusterdyn_rs::kinetics::tungsten::Tungsten;
use clusterdyn_rs::kinetics::KineticsProvider;
use clusterdyn_rs::network::immobile_l0::ImmobileL0Evaluator;
use clusterdyn_rs::network::immobile_l1::ImmobileL1Evaluator;
use clusterdyn_rs::network::mobile::MobileEvaluator;
use clusterdyn_rs::network::{DenseField, ReactionNetwork};

const T: f64 = 800.0;

fn config(vacancy: AxisConfig, interstitial: AxisConfig) -> GroupingConfig {
    GroupingConfig {
        law: BinningLaw::Uniform,
        dr_coef: 0.2,
        vacancy,
        interstitial,
        temperature: Some(T),
        update_scheme: false,
    }
}

/// Same-species combination at a fixed rate; everything else off.
struct SameSpeciesRate {
    r: f64,
}

impl KineticsProvider for SameSpeciesRate {
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

/// Only the size-3 vacancy cluster dissociates.
struct EmissionOnly {
    e3: f64,
}

impl KineticsProvider for EmissionOnly {
    fn absorb(
        &self,
        _a: u32,
        _b: u32,
        _species_a: Species,
        _species_b: Species,
        _temperature: f64,
        _mobile_a: bool,
        _mobile_b: bool,
    ) -> f64 {
        0.0
    }
    fn emit(
        &self,
        size: u32,
        _reference: u32,
        _temperature: f64,
        species: Species,
        _reference_species: Species,
        _mobile: bool,
        _mobile_reference: bool,
    ) -> f64 {
        if species == Species::Vacancy && size == 3 {
            self.e3
        } else {
            0.0
        }
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

#[test]
fn grouped_l0_collapses_to_the_mobile_balance_on_singleton_groups() {
    // One group per size makes the grouped average balance degenerate into
    // the plain per-size balance.
    let scheme = GroupingScheme::new(config(
        AxisConfig {
            group_count: 8,
            max_size: 8,
            singleton_count: 8,
            mobile_max: 2,
        },
        AxisConfig {
            group_count: 4,
            max_size: 4,
            singleton_count: 4,
            mobile_max: 1,
        },
    ))
    .unwrap();
    let table = GroupConstantTable::build(&scheme, &Tungsten::default(), T);
    let net = ReactionNetwork::new(&scheme, &table);

    let mut field = DenseField::new(&scheme);
    for g in 1..=8 {
        field.set_l0(Species::Vacancy, g, 1.0e-6 / g as f64);
    }
    for g in 1..=4 {
        field.set_l0(Species::Interstitial, g, 3.0e-7 / g as f64);
    }

    for size in [5u32, 6u32] {
        let grouped = ImmobileL0Evaluator::new(Species::Vacancy, size as usize, &scheme)
            .unwrap()
            .residual(&net, &field);
        let ungrouped =
            MobileEvaluator::new(ClusterId::vacancy(size)).residual(&net, &field);
        assert!(
            (grouped - ungrouped).abs() <= 1.0e-12 * ungrouped.abs().max(1.0e-30),
            "size {size}: grouped {grouped} vs ungrouped {ungrouped}"
        );
    }
}

#[test]
fn same_species_combination_conserves_mass() {
    // Closed system, combination only: sum over sizes of size * dC/dt is 0.
    let scheme = GroupingScheme::new(config(
        AxisConfig {
            group_count: 4,
            max_size: 4,
            singleton_count: 4,
            mobile_max: 4,
        },
        AxisConfig {
            group_count: 1,
            max_size: 1,
            singleton_count: 1,
            mobile_max: 1,
        },
    ))
    .unwrap();
    let table = GroupConstantTable::build(&scheme, &SameSpeciesRate { r: 2.5 }, T);
    let net = ReactionNetwork::new(&scheme, &table);

    let mut field = DenseField::new(&scheme);
    let concs = [0.9, 0.4, 0.2, 0.05];
    for (g, c) in concs.iter().enumerate() {
        field.set_l0(Species::Vacancy, g + 1, *c);
    }

    let mut drift = 0.0;
    let mut scale: f64 = 0.0;
    for s in 1..=4u32 {
        let res = MobileEvaluator::new(ClusterId::vacancy(s)).residual(&net, &field);
        drift += s as f64 * res;
        scale = scale.max(res.abs());
    }
    assert!(drift.abs() <= 1.0e-12 * scale, "mass drift {drift}");
}

#[test]
fn emission_only_decay_feeds_the_point_defect_pool() {
    // Size 3 dissociates into size 2 plus a single vacancy; nothing else
    // reacts. The largest size decays monotonically, the point-defect pool
    // grows, and the two changes cancel at every step.
    let scheme = GroupingScheme::new(config(
        AxisConfig {
            group_count: 3,
            max_size: 3,
            singleton_count: 3,
            mobile_max: 3,
        },
        AxisConfig {
            group_count: 1,
            max_size: 1,
            singleton_count: 1,
            mobile_max: 1,
        },
    ))
    .unwrap();
    let table = GroupConstantTable::build(&scheme, &EmissionOnly { e3: 0.8 }, T);
    let net = ReactionNetwork::new(&scheme, &table);

    let mut field = DenseField::new(&scheme);
    field.set_l0(Species::Vacancy, 1, 0.1);
    field.set_l0(Species::Vacancy, 2, 0.2);
    field.set_l0(Species::Vacancy, 3, 1.0);

    let evaluators: Vec<_> = (1..=3u32)
        .map(|s| MobileEvaluator::new(ClusterId::vacancy(s)))
        .collect();

    let dt = 1.0e-2;
    let mut prev = [0.1, 0.2, 1.0];
    for _ in 0..200 {
        let rates: Vec<f64> = evaluators.iter().map(|e| e.residual(&net, &field)).collect();
        let mut next = [0.0; 3];
        for (i, rate) in rates.iter().enumerate() {
            next[i] = prev[i] - dt * rate;
            field.set_l0(Species::Vacancy, i + 1, next[i]);
        }
        assert!(next[2] < prev[2], "largest size must decay");
        assert!(next[0] > prev[0], "point-defect pool must grow");
        let d1 = next[0] - prev[0];
        let d3 = next[2] - prev[2];
        assert!((d1 + d3).abs() <= 1.0e-15, "changes must cancel: {d1} vs {d3}");
        prev = next;
    }
}

#[test]
fn l1_short_circuits_on_zero_dispersion() {
    let scheme = GroupingScheme::new(config(
        AxisConfig {
            group_count: 6,
            max_size: 30,
            singleton_count: 4,
            mobile_max: 2,
        },
        AxisConfig {
            group_count: 4,
            max_size: 12,
            singleton_count: 3,
            mobile_max: 1,
        },
    ))
    .unwrap();
    let table = GroupConstantTable::build(&scheme, &Tungsten::default(), T);
    let net = ReactionNetwork::new(&scheme, &table);

    let mut field = DenseField::new(&scheme);
    for g in 1..=6 {
        field.set_l0(Species::Vacancy, g, 1.0e-6);
        field.set_l1(Species::Vacancy, g, 1.0e-9);
    }
    field.set_l0(Species::Interstitial, 1, 1.0e-7);

    let singleton = ImmobileL1Evaluator::new(Species::Vacancy, 3, &scheme).unwrap();
    assert_eq!(singleton.residual(&net, &field), 0.0);
    assert_eq!(singleton.jacobian(&net, &field), 0.0);

    let wide = ImmobileL1Evaluator::new(Species::Vacancy, 5, &scheme).unwrap();
    assert_ne!(wide.residual(&net, &field), 0.0);
}
