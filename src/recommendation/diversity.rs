//! Tiered Diversity Selection
//!
//! Strict top-N tends to cluster on one genre or author. The ranked list is cut
//! into three relevance tiers, each tier is shuffled on its own, and the batch
//! is assembled tier-major so earlier positions still lean toward the best
//! matches while varying from pass to pass.

use rand::seq::SliceRandom;
use rand::Rng;

use super::book::ScoredBook;

/// Number of relevance tiers
pub const TIER_COUNT: usize = 3;

/// Select up to `batch_size` books from a score-sorted list using the thread RNG
pub fn select(ranked: Vec<ScoredBook>, batch_size: usize) -> Vec<ScoredBook> {
    select_with_rng(ranked, batch_size, &mut rand::thread_rng())
}

/// Select up to `batch_size` books from a score-sorted list.
///
/// Each tier contributes `batch_size / 3` books. When a tier runs short, the
/// gap is filled from leftover books in ascending tier order, so a higher tier
/// is exhausted before a lower one contributes extra.
pub fn select_with_rng<R: Rng + ?Sized>(
    ranked: Vec<ScoredBook>,
    batch_size: usize,
    rng: &mut R,
) -> Vec<ScoredBook> {
    let target = batch_size.min(ranked.len());
    if target == 0 {
        return Vec::new();
    }

    let mut tiers = split_tiers(ranked);
    for tier in tiers.iter_mut() {
        tier.shuffle(rng);
    }

    let per_tier = batch_size / TIER_COUNT;
    let mut quotas: Vec<usize> = tiers.iter().map(|t| per_tier.min(t.len())).collect();

    let mut shortfall = target - quotas.iter().sum::<usize>();
    for (quota, tier) in quotas.iter_mut().zip(&tiers) {
        if shortfall == 0 {
            break;
        }
        let extra = (tier.len() - *quota).min(shortfall);
        *quota += extra;
        shortfall -= extra;
    }

    tiers
        .into_iter()
        .zip(quotas)
        .flat_map(|(mut tier, quota)| {
            tier.truncate(quota);
            tier
        })
        .collect()
}

/// Cut a ranked list into contiguous tiers; the remainder lands in the last one
fn split_tiers(mut ranked: Vec<ScoredBook>) -> Vec<Vec<ScoredBook>> {
    let tier_size = ranked.len() / TIER_COUNT;
    let mut tiers = Vec::with_capacity(TIER_COUNT);
    for _ in 0..TIER_COUNT - 1 {
        let rest = ranked.split_off(tier_size);
        tiers.push(ranked);
        ranked = rest;
    }
    tiers.push(ranked);
    tiers
}
