use crate::cluster::{ClusterId, Species};
use crate::config::{AxisConfig, BinningLaw, GroupingConfig};
use crate::error::{ModelError, ModelResult};

/// Second-moment statistics of one group, taken over the integer sizes it
/// covers. `dispersion` is the in-group size variance feeding the L1 closure;
/// a width-1 group has dispersion 0 and is exempt from L1 evaluation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroupStats {
    pub width: u32,
    pub average: f64,
    pub dispersion: f64,
}

/// Group boundaries and statistics for one species axis. Group `k`
/// (1-based) covers the discrete sizes in `(edges[k-1], edges[k]]`.
#[derive(Clone, Debug)]
pub struct AxisScheme {
    pub species: Species,
    /// Sizes at or below this are mobile; they always sit in singleton
    /// groups, so group index and size coincide for them.
    pub mobile_max: u32,
    edges: Vec<u32>,
    stats: Vec<GroupStats>,
}

impl AxisScheme {
    fn build(
        species: Species,
        cfg: &AxisConfig,
        law: BinningLaw,
        dr_coef: f64,
    ) -> ModelResult<Self> {
        let edges = match law {
            BinningLaw::Uniform => Self::uniform_edges(cfg)?,
            BinningLaw::RSpace => Self::rspace_edges(cfg, dr_coef),
        };
        let stats = Self::statistics(&edges);
        Ok(Self {
            species,
            mobile_max: cfg.mobile_max,
            edges,
            stats,
        })
    }

    /// Singleton groups first, then equal integer widths over the rest; the
    /// final edge is forced onto the configured maximum, overriding any
    /// rounding drift.
    fn uniform_edges(cfg: &AxisConfig) -> ModelResult<Vec<u32>> {
        let singles = cfg.singleton_count as u32;
        let mut edges: Vec<u32> = (0..=singles).collect();
        if cfg.singleton_count < cfg.group_count {
            let remaining = cfg.group_count - cfg.singleton_count;
            let interval = (cfg.max_size - singles) as f64 / remaining as f64;
            for i in 1..=remaining {
                edges.push(singles + (i as f64 * interval) as u32);
            }
        }
        let last = edges.last_mut().ok_or_else(|| {
            ModelError::Config("axis with zero groups".to_string())
        })?;
        if *last != cfg.max_size {
            *last = cfg.max_size;
        }
        if edges.len() != cfg.group_count + 1 {
            return Err(ModelError::Config(format!(
                "built {} edges for {} groups",
                edges.len(),
                cfg.group_count
            )));
        }
        Ok(edges)
    }

    /// Singleton groups first, then widths growing as
    /// `max(1, dr_coef * edge^(2/3))`. The covered maximum size is whatever
    /// the growth rule reaches after `group_count` groups.
    fn rspace_edges(cfg: &AxisConfig, dr_coef: f64) -> Vec<u32> {
        let mut edges: Vec<u32> = (0..=cfg.singleton_count as u32).collect();
        while edges.len() <= cfg.group_count {
            let prev = *edges.last().expect("seeded with the zero edge");
            let delta = (dr_coef * (prev as f64).powf(2.0 / 3.0)) as u32;
            edges.push(prev + delta.max(1));
        }
        edges
    }

    /// Direct summation over each group's covered sizes; O(max size) once
    /// per (re)build.
    fn statistics(edges: &[u32]) -> Vec<GroupStats> {
        let mut stats = Vec::with_capacity(edges.len().saturating_sub(1));
        for k in 1..edges.len() {
            let width = edges[k] - edges[k - 1];
            let mut sum = 0.0;
            let mut sum_sq = 0.0;
            for j in edges[k - 1] + 1..=edges[k] {
                sum += j as f64;
                sum_sq += (j as f64) * (j as f64);
            }
            let w = width as f64;
            stats.push(GroupStats {
                width,
                average: edges[k] as f64 - (w - 1.0) / 2.0,
                dispersion: (sum_sq - sum * sum / w) / w,
            });
        }
        stats
    }

    pub fn group_count(&self) -> usize {
        self.stats.len()
    }

    pub fn edges(&self) -> &[u32] {
        &self.edges
    }

    /// Largest size covered by the axis. For the Uniform law this is the
    /// configured maximum; for R-space it is derived from the growth rule.
    pub fn max_size(&self) -> u32 {
        *self.edges.last().unwrap_or(&0)
    }

    /// 1-based index of the group covering `size`; lower-bound binary search
    /// on the edge sequence. Hot path for every cross-group reaction term.
    pub fn group_of(&self, size: u32) -> usize {
        self.edges.partition_point(|&e| e < size)
    }

    /// Statistics of group `k` (1-based).
    pub fn stats(&self, k: usize) -> &GroupStats {
        &self.stats[k - 1]
    }
}

/// The grouped discretization of both species axes. Read-only during an
/// evaluation pass; re-binning takes `&mut self` and therefore cannot
/// interleave with borrowing evaluators.
#[derive(Clone, Debug)]
pub struct GroupingScheme {
    config: GroupingConfig,
    pub vacancy: AxisScheme,
    pub interstitial: AxisScheme,
}

impl GroupingScheme {
    pub fn new(config: GroupingConfig) -> ModelResult<Self> {
        config.validate()?;
        let vacancy =
            AxisScheme::build(Species::Vacancy, &config.vacancy, config.law, config.dr_coef)?;
        let interstitial = AxisScheme::build(
            Species::Interstitial,
            &config.interstitial,
            config.law,
            config.dr_coef,
        )?;
        Ok(Self {
            config,
            vacancy,
            interstitial,
        })
    }

    pub fn config(&self) -> &GroupingConfig {
        &self.config
    }

    pub fn axis(&self, species: Species) -> &AxisScheme {
        match species {
            Species::Vacancy => &self.vacancy,
            Species::Interstitial => &self.interstitial,
        }
    }

    pub fn group_of(&self, id: ClusterId) -> usize {
        self.axis(id.species).group_of(id.size)
    }

    /// Full from-scratch rebuild, gated by the configured update policy.
    /// Returns whether a rebuild happened. Not incremental by design:
    /// re-binning is rare and the recomputation is O(max size).
    pub fn update(&mut self) -> ModelResult<bool> {
        if !self.config.update_scheme {
            return Ok(false);
        }
        *self = Self::new(self.config.clone())?;
        Ok(true)
    }
}
