//! Selection of the smallest box that holds a set of items.
//!
//! Every candidate is estimated against its own height. A candidate is
//! eligible when the estimate succeeds and its capacity covers the required
//! volume. Among eligible candidates the one with the smallest capacity wins,
//! then the one with the smallest required volume, then the one listed first.

use std::cmp::Ordering;

use rayon::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;

use crate::estimator::{DEFAULT_SLACK_FACTOR, HeightInfeasible, VolumeEstimate, estimate_volume};
use crate::model::{CandidateBox, NormalizedItem};
use crate::selection::{QuantityInput, normalize_selection};
use crate::types::{BoxProvider, HasHeight, ItemLookup};

/// Reason reported when no candidate qualifies.
pub const NO_FEASIBLE_BOX_REASON: &str =
    "No box satisfies the volume/height constraints after simulating stacking against each box height.";

/// Configuration for the box search.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SelectorConfig {
    /// Proportional safety margin on the raw volume (≥ 0)
    pub slack_factor: f64,
    /// Estimate candidates on the rayon pool instead of sequentially
    pub parallel_evaluation: bool,
}

impl SelectorConfig {
    pub const DEFAULT_SLACK_FACTOR: f64 = DEFAULT_SLACK_FACTOR;
    pub const DEFAULT_PARALLEL_EVALUATION: bool = false;

    pub fn builder() -> SelectorConfigBuilder {
        SelectorConfigBuilder::default()
    }

    /// Checks that a slack factor is usable.
    pub fn is_valid_slack_factor(value: f64) -> bool {
        value.is_finite() && value >= 0.0
    }
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            slack_factor: Self::DEFAULT_SLACK_FACTOR,
            parallel_evaluation: Self::DEFAULT_PARALLEL_EVALUATION,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct SelectorConfigBuilder {
    config: SelectorConfig,
}

impl SelectorConfigBuilder {
    pub fn slack_factor(mut self, slack_factor: f64) -> Self {
        self.config.slack_factor = slack_factor;
        self
    }

    pub fn parallel_evaluation(mut self, enabled: bool) -> Self {
        self.config.parallel_evaluation = enabled;
        self
    }

    pub fn build(self) -> SelectorConfig {
        self.config
    }
}

/// Why a candidate box was not eligible.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum RejectionReason {
    /// A stackable item cannot stand a single layer high in this box.
    HeightInfeasible(HeightInfeasible),
    /// The box is tall enough but too small.
    InsufficientCapacity { capacity: f64, required: f64 },
}

impl RejectionReason {
    pub fn code(&self) -> &'static str {
        match self {
            RejectionReason::HeightInfeasible(_) => "height_infeasible",
            RejectionReason::InsufficientCapacity { .. } => "insufficient_capacity",
        }
    }
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectionReason::HeightInfeasible(detail) => write!(f, "{}", detail),
            RejectionReason::InsufficientCapacity { capacity, required } => write!(
                f,
                "Capacity {:.2} m³ is below the required {:.2} m³",
                capacity, required
            ),
        }
    }
}

/// A candidate that was skipped, with the reason.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct CandidateRejection {
    pub box_id: String,
    pub reason: RejectionReason,
}

/// The chosen box with the estimate computed for its height.
#[derive(Clone, Debug, PartialEq)]
pub struct Selection {
    pub chosen: CandidateBox,
    pub estimate: VolumeEstimate,
}

/// Result of a box search.
#[derive(Clone, Debug, PartialEq)]
pub enum SelectionOutcome {
    Selected(Selection),
    NoFeasibleBox {
        reason: &'static str,
        rejections: Vec<CandidateRejection>,
    },
}

impl SelectionOutcome {
    pub fn is_selected(&self) -> bool {
        matches!(self, SelectionOutcome::Selected(_))
    }

    /// The chosen box, if any.
    pub fn chosen(&self) -> Option<&CandidateBox> {
        match self {
            SelectionOutcome::Selected(selection) => Some(&selection.chosen),
            SelectionOutcome::NoFeasibleBox { .. } => None,
        }
    }
}

/// Estimates one candidate and checks its capacity.
pub fn evaluate_candidate(
    items: &[NormalizedItem],
    candidate: &CandidateBox,
    slack_factor: f64,
) -> Result<VolumeEstimate, RejectionReason> {
    let estimate = estimate_volume(items, candidate.height(), slack_factor)
        .map_err(RejectionReason::HeightInfeasible)?;

    if candidate.capacity >= estimate.total_volume {
        Ok(estimate)
    } else {
        Err(RejectionReason::InsufficientCapacity {
            capacity: candidate.capacity,
            required: estimate.total_volume,
        })
    }
}

/// Ordering among eligible candidates; `Less` means preferred.
fn compare_eligible(
    a: (usize, &CandidateBox, &VolumeEstimate),
    b: (usize, &CandidateBox, &VolumeEstimate),
) -> Ordering {
    a.1.capacity
        .total_cmp(&b.1.capacity)
        .then_with(|| a.2.total_volume.total_cmp(&b.2.total_volume))
        .then_with(|| a.0.cmp(&b.0))
}

/// Picks the smallest feasible box for the given items.
///
/// Parallel evaluation collects the per-candidate results in provider order
/// before reducing, so both modes choose the same box.
pub fn select_box<P>(items: &[NormalizedItem], provider: &P, config: &SelectorConfig) -> SelectionOutcome
where
    P: BoxProvider + ?Sized,
{
    let candidates = provider.candidates();
    let slack_factor = config.slack_factor;

    let evaluations: Vec<Result<VolumeEstimate, RejectionReason>> = if config.parallel_evaluation {
        candidates
            .par_iter()
            .map(|candidate| evaluate_candidate(items, candidate, slack_factor))
            .collect()
    } else {
        candidates
            .iter()
            .map(|candidate| evaluate_candidate(items, candidate, slack_factor))
            .collect()
    };

    let mut best: Option<(usize, VolumeEstimate)> = None;
    let mut rejections = Vec::new();

    for (index, (candidate, evaluation)) in candidates.iter().zip(evaluations).enumerate() {
        match evaluation {
            Ok(estimate) => {
                let replace = match &best {
                    Some((best_index, best_estimate)) => {
                        compare_eligible(
                            (index, candidate, &estimate),
                            (*best_index, &candidates[*best_index], best_estimate),
                        ) == Ordering::Less
                    }
                    None => true,
                };
                if replace {
                    best = Some((index, estimate));
                }
            }
            Err(reason) => {
                tracing::debug!(
                    box_id = %candidate.id,
                    code = reason.code(),
                    "Candidate rejected: {}",
                    reason
                );
                rejections.push(CandidateRejection {
                    box_id: candidate.id.clone(),
                    reason,
                });
            }
        }
    }

    match best {
        Some((index, estimate)) => SelectionOutcome::Selected(Selection {
            chosen: candidates[index].clone(),
            estimate,
        }),
        None => SelectionOutcome::NoFeasibleBox {
            reason: NO_FEASIBLE_BOX_REASON,
            rejections,
        },
    }
}

/// Normalizes a raw quantity request and selects a box for it.
pub fn select_for_request<'a, K, I, L, P>(
    requested: I,
    catalog: &L,
    provider: &P,
    config: &SelectorConfig,
) -> (Vec<NormalizedItem>, SelectionOutcome)
where
    K: AsRef<str>,
    I: IntoIterator<Item = (K, &'a QuantityInput)>,
    L: ItemLookup + ?Sized,
    P: BoxProvider + ?Sized,
{
    let items = normalize_selection(requested, catalog);
    let outcome = select_box(&items, provider, config);

    match &outcome {
        SelectionOutcome::Selected(selection) => tracing::info!(
            items = items.len(),
            candidates = provider.candidates().len(),
            box_id = %selection.chosen.id,
            total_volume = selection.estimate.total_volume,
            "📦 Box selected"
        ),
        SelectionOutcome::NoFeasibleBox { rejections, .. } => tracing::info!(
            items = items.len(),
            candidates = provider.candidates().len(),
            rejected = rejections.len(),
            "❌ No feasible box"
        ),
    }

    (items, outcome)
}
