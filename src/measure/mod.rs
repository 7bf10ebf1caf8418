//! # Diversity Measure Library
//!
//! Every measure is a pure function of the proportion vector (plus counts,
//! plus one pairwise distance matrix for disparity) and two order
//! parameters `alpha`, `beta`. It returns a raw `value` and a `transformed`
//! companion, usually the effective number of categories.
//!
//! | Family | Transform |
//! |--------|-----------|
//! | Entropy | Hill-number form (`e^H` and friends) |
//! | Dominance | `1/D` (Berger-Parker: `1/max p`) |
//! | Evenness, Richness | identity |
//! | Disparity | identity, except Chao / Leinster-Cobbold / Scheiner |
//!
//! Numeric ids are stable: 0..=31 follow the historical constant order,
//! later measures are appended.

pub mod disparity;
pub mod entropy;
pub mod functional;
pub mod index;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::distance::{DistanceMetric, PairwiseDistances};
use crate::{Error, Result};

// ============================================================================
// Result
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeasureResult {
    pub value: f64,
    pub transformed: f64,
}

impl MeasureResult {
    pub fn new(value: f64, transformed: f64) -> Self {
        Self { value, transformed }
    }

    /// Measures whose transform is the identity.
    pub fn same(value: f64) -> Self {
        Self { value, transformed: value }
    }
}

// ============================================================================
// Identifiers
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasureFamily {
    Entropy,
    Dominance,
    Evenness,
    Richness,
    Disparity,
}

impl fmt::Display for MeasureFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MeasureFamily::Entropy => "entropy",
            MeasureFamily::Dominance => "dominance",
            MeasureFamily::Evenness => "evenness",
            MeasureFamily::Richness => "richness",
            MeasureFamily::Disparity => "disparity",
        };
        f.write_str(name)
    }
}

/// What a measure needs besides proportions and counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Counts,
    Distances,
    Embeddings,
}

macro_rules! measures {
    ($( $variant:ident = $id:literal, $name:literal, $family:ident, $req:ident; )*) => {
        /// Closed set of measures, numbered as on the flat surface.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[repr(i32)]
        pub enum MeasureId {
            $( $variant = $id, )*
        }

        impl MeasureId {
            pub const ALL: &'static [MeasureId] = &[ $( MeasureId::$variant, )* ];

            pub fn id(self) -> i32 {
                self as i32
            }

            pub fn from_id(id: i32) -> Option<Self> {
                match id {
                    $( $id => Some(MeasureId::$variant), )*
                    _ => None,
                }
            }

            /// Flat-surface name, `<FAMILY>_<NAME>`.
            pub fn name(self) -> &'static str {
                match self {
                    $( MeasureId::$variant => $name, )*
                }
            }

            pub fn family(self) -> MeasureFamily {
                match self {
                    $( MeasureId::$variant => MeasureFamily::$family, )*
                }
            }

            pub fn requirement(self) -> Requirement {
                match self {
                    $( MeasureId::$variant => Requirement::$req, )*
                }
            }
        }

        /// `(name, id)` for every measure, in id order.
        pub const MEASURE_IDS: &[(&str, i32)] = &[ $( ($name, $id), )* ];
    };
}

measures! {
    EntropyShannonWeaver = 0, "ENTROPY_SHANNON_WEAVER", Entropy, Counts;
    EntropyQLogarithmic = 1, "ENTROPY_Q_LOGARITHMIC", Entropy, Counts;
    EntropyPatilTaillie = 2, "ENTROPY_PATIL_TAILLIE", Entropy, Counts;
    EntropyRenyi = 3, "ENTROPY_RENYI", Entropy, Counts;
    EntropyGood = 4, "ENTROPY_GOOD", Entropy, Counts;
    IndexSimpsonDominance = 5, "INDEX_SIMPSON_DOMINANCE", Dominance, Counts;
    IndexSimpson = 6, "INDEX_SIMPSON", Dominance, Counts;
    IndexRichness = 7, "INDEX_RICHNESS", Richness, Counts;
    IndexSpeciesCount = 8, "INDEX_SPECIES_COUNT", Richness, Counts;
    IndexHillEvenness = 9, "INDEX_HILL_EVENNESS", Evenness, Counts;
    IndexShannonEvenness = 10, "INDEX_SHANNON_EVENNESS", Evenness, Counts;
    IndexBergerParker = 11, "INDEX_BERGER_PARKER", Dominance, Counts;
    IndexJunge1994Page22 = 12, "INDEX_JUNGE1994_PAGE22", Dominance, Counts;
    IndexBrillouin = 13, "INDEX_BRILLOUIN", Entropy, Counts;
    IndexMcIntosh = 14, "INDEX_MCINTOSH", Dominance, Counts;
    IndexEHeip = 15, "INDEX_E_HEIP", Evenness, Counts;
    IndexOneMinusD = 16, "INDEX_ONE_MINUS_D", Evenness, Counts;
    IndexOneOverDWilliams1964 = 17, "INDEX_ONE_OVER_D_WILLIAMS1964", Evenness, Counts;
    IndexEMinusLnDPielou1977 = 18, "INDEX_E_MINUS_LN_D_PIELOU1977", Evenness, Counts;
    IndexF21Alatalo1981 = 19, "INDEX_F_2_1_ALATALO1981", Evenness, Counts;
    IndexG21Molinari1989 = 20, "INDEX_G_2_1_MOLINARI1989", Evenness, Counts;
    IndexOBulla1994 = 21, "INDEX_O_BULLA1994", Evenness, Counts;
    IndexEBulla1994 = 22, "INDEX_E_BULLA1994", Evenness, Counts;
    IndexEMciPielou1969 = 23, "INDEX_E_MCI_PIELOU1969", Evenness, Counts;
    IndexEPrimeCamargo1993 = 24, "INDEX_E_PRIME_CAMARGO1993", Evenness, Counts;
    IndexEVarSmithAndWilson1996 = 25, "INDEX_E_VAR_SMITH_AND_WILSON1996", Evenness, Counts;
    DisparityPairwise = 26, "DISPARITY_PAIRWISE", Disparity, Distances;
    DisparityChaoEtAlFunctional = 27, "DISPARITY_CHAO_ET_AL_FUNCTIONAL", Disparity, Distances;
    DisparityLeinsterCobbold = 28, "DISPARITY_LEINSTER_COBBOLD", Disparity, Distances;
    DisparityScheiner = 29, "DISPARITY_SCHEINER", Disparity, Distances;
    DisparityStirling = 30, "DISPARITY_STIRLING", Disparity, Distances;
    DisparityRicottaSzeidl = 31, "DISPARITY_RICOTTA_SZEIDL", Disparity, Distances;
    IndexTypeTokenRatio = 32, "INDEX_TYPE_TOKEN_RATIO", Richness, Counts;
    DisparityFunctionalEvenness = 33, "DISPARITY_FUNCTIONAL_EVENNESS", Disparity, Distances;
    DisparityFunctionalDispersion = 34, "DISPARITY_FUNCTIONAL_DISPERSION", Disparity, Embeddings;
    IndexNhc = 35, "INDEX_NHC", Evenness, Counts;
    IndexEQ = 36, "INDEX_E_Q", Evenness, Counts;
    DisparityFunctionalDivergenceModified = 37, "DISPARITY_FUNCTIONAL_DIVERGENCE_MODIFIED", Disparity, Embeddings;
    DisparityWeitzman = 38, "DISPARITY_WEITZMAN", Disparity, Distances;
    DisparityLexicographic = 39, "DISPARITY_LEXICOGRAPHIC", Disparity, Distances;
}

impl fmt::Display for MeasureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Evaluation
// ============================================================================

/// Everything a measure may read. Built by the engine once per call.
#[derive(Debug, Clone, Copy)]
pub struct MeasureContext<'a> {
    pub proportions: &'a [f64],
    pub counts: &'a [u64],
    /// Σ counts, maintained by the graph without overflow.
    pub total: u64,
    pub distances: Option<&'a PairwiseDistances>,
    pub embeddings: Option<&'a [Option<Vec<f64>>]>,
    /// Declared embedding dimensionality of the graph.
    pub dims: usize,
    pub metric: DistanceMetric,
    /// Leinster-Cobbold `u` in `Z = exp(-u·d)`.
    pub similarity_sensitivity: f64,
}

impl<'a> MeasureContext<'a> {
    pub fn new(proportions: &'a [f64], counts: &'a [u64], total: u64) -> Self {
        Self {
            proportions,
            counts,
            total,
            distances: None,
            embeddings: None,
            dims: 0,
            metric: DistanceMetric::default(),
            similarity_sensitivity: 1.0,
        }
    }

    pub fn with_distances(mut self, distances: &'a PairwiseDistances) -> Self {
        self.distances = Some(distances);
        self
    }

    pub fn with_embeddings(mut self, embeddings: &'a [Option<Vec<f64>>]) -> Self {
        self.embeddings = Some(embeddings);
        self
    }
}

/// Evaluate one measure.
pub fn evaluate(id: MeasureId, ctx: &MeasureContext<'_>, alpha: f64, beta: f64) -> Result<MeasureResult> {
    use MeasureId::*;

    let p = ctx.proportions;
    let counts = ctx.counts;
    if p.is_empty() {
        return Err(Error::InvalidState(format!("{id} on an empty graph")));
    }

    let distances = || {
        ctx.distances
            .ok_or_else(|| Error::InvalidState(format!("{id} needs a distance matrix or a bound vector space")))
    };

    let embeddings = || {
        ctx.embeddings
            .ok_or_else(|| Error::InvalidState(format!("{id} needs a bound vector space")))
    };

    let result = match id {
        EntropyShannonWeaver => entropy::shannon_weaver(p),
        EntropyQLogarithmic => entropy::q_logarithmic(p, alpha),
        EntropyPatilTaillie => entropy::patil_taillie(p, alpha),
        EntropyRenyi => entropy::renyi(p, alpha),
        EntropyGood => entropy::good(p, alpha, beta),
        IndexBrillouin => entropy::brillouin(counts, ctx.total),

        IndexSimpsonDominance => index::simpson_dominance(p),
        IndexSimpson => index::simpson(p),
        IndexBergerParker => index::berger_parker(p),
        IndexJunge1994Page22 => index::junge1994(p),
        IndexMcIntosh => index::mcintosh(counts, ctx.total, p),

        IndexRichness => index::richness(p),
        IndexSpeciesCount => index::species_count(p),
        IndexTypeTokenRatio => index::type_token_ratio(counts, ctx.total),

        IndexHillEvenness => index::hill_evenness(p, alpha, beta),
        IndexShannonEvenness => index::shannon_evenness(p),
        IndexEHeip => index::e_heip(p),
        IndexOneMinusD => index::one_minus_d(p),
        IndexOneOverDWilliams1964 => index::one_over_d_williams1964(p),
        IndexEMinusLnDPielou1977 => index::e_minus_ln_d_pielou1977(p),
        IndexF21Alatalo1981 => index::f_2_1_alatalo1981(p),
        IndexG21Molinari1989 => index::g_2_1_molinari1989(p),
        IndexOBulla1994 => index::o_bulla1994(p),
        IndexEBulla1994 => index::e_bulla1994(p),
        IndexEMciPielou1969 => index::e_mci_pielou1969(p),
        IndexEPrimeCamargo1993 => index::e_prime_camargo1993(p),
        IndexEVarSmithAndWilson1996 => index::e_var_smith_and_wilson1996(p),
        IndexNhc => index::nhc(counts),
        IndexEQ => index::e_q(counts),

        DisparityPairwise => disparity::pairwise(distances()?),
        DisparityChaoEtAlFunctional => disparity::chao_functional(p, distances()?, alpha),
        DisparityLeinsterCobbold => {
            disparity::leinster_cobbold(p, distances()?, alpha, ctx.similarity_sensitivity)
        }
        DisparityScheiner => disparity::scheiner(counts, distances()?, alpha, ctx.dims),
        DisparityStirling => disparity::stirling(p, distances()?, alpha, beta),
        DisparityRicottaSzeidl => disparity::ricotta_szeidl(p, distances()?, alpha),
        DisparityFunctionalEvenness => functional::functional_evenness(p, distances()?),
        DisparityFunctionalDispersion => functional::functional_dispersion(p, embeddings()?, &ctx.metric)
            .ok_or_else(|| Error::Unresolvable(format!("{id}: no node resolves to an embedding")))?,
        DisparityFunctionalDivergenceModified => functional::functional_divergence(p, embeddings()?, &ctx.metric)
            .ok_or_else(|| Error::Unresolvable(format!("{id}: no node resolves to an embedding")))?,
        DisparityWeitzman => disparity::weitzman(distances()?),
        DisparityLexicographic => disparity::lexicographic(distances()?, ctx.dims),
    };
    Ok(result)
}
