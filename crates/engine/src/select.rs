use std::collections::HashSet;

use sitelink_protocol::{LinkType, QuotaShortfall};

use crate::candidate::ScoredCandidate;
use crate::config::SelectionPolicy;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    /// Quota bridges, quota funnels, then fill order.
    pub picked: Vec<ScoredCandidate>,
    pub effective_k: usize,
    pub shortfalls: Vec<QuotaShortfall>,
    /// Candidates that entered selection and were left out.
    pub not_selected: usize,
}

impl Selection {
    pub fn of_type(&self, link_type: LinkType) -> impl Iterator<Item = &ScoredCandidate> {
        self.picked
            .iter()
            .filter(move |candidate| candidate.link_type() == link_type)
    }

    pub fn bridges(&self) -> Vec<&ScoredCandidate> {
        self.of_type(LinkType::Bridge).collect()
    }

    pub fn funnels(&self) -> Vec<&ScoredCandidate> {
        self.of_type(LinkType::Funnel).collect()
    }
}

/// Quota-first, then best-remaining selection under a global cap.
#[derive(Debug, Clone, Copy)]
pub struct TopKSelector {
    policy: SelectionPolicy,
}

impl TopKSelector {
    pub const fn new(policy: SelectionPolicy) -> Self {
        Self { policy }
    }

    pub fn select(&self, bridges: Vec<ScoredCandidate>, funnels: Vec<ScoredCandidate>) -> Selection {
        let policy = &self.policy;
        let quotas = policy.min_per_type;
        let k = policy.effective_k();
        if k > policy.top_k {
            log::info!(
                "[topk] quotas {}+{} exceed top_k {}, raising cap to {k}",
                quotas.bridge,
                quotas.funnel,
                policy.top_k
            );
        }

        let total_in = bridges.len() + funnels.len();
        let bridges = self.enabled_pool(LinkType::Bridge, bridges);
        let funnels = self.enabled_pool(LinkType::Funnel, funnels);

        let mut shortfalls = Vec::new();
        let (quota_bridges, rest_bridges) =
            take_quota(LinkType::Bridge, bridges, quotas.bridge, &mut shortfalls);
        let (quota_funnels, rest_funnels) =
            take_quota(LinkType::Funnel, funnels, quotas.funnel, &mut shortfalls);

        let mut picked = Vec::with_capacity(k);
        let mut seen: HashSet<(String, String)> = HashSet::new();
        for candidate in quota_bridges.into_iter().chain(quota_funnels) {
            seen.insert(owned_pair(&candidate));
            picked.push(candidate);
        }

        let mut remainder: Vec<ScoredCandidate> =
            rest_bridges.into_iter().chain(rest_funnels).collect();
        remainder.sort_by(ScoredCandidate::selection_cmp);
        for candidate in remainder {
            if picked.len() >= k {
                break;
            }
            if seen.insert(owned_pair(&candidate)) {
                picked.push(candidate);
            }
        }

        log::info!(
            "[topk] selected {} of {} candidates (k={k})",
            picked.len(),
            total_in
        );

        Selection {
            not_selected: total_in - picked.len(),
            picked,
            effective_k: k,
            shortfalls,
        }
    }

    fn enabled_pool(
        &self,
        link_type: LinkType,
        pool: Vec<ScoredCandidate>,
    ) -> Vec<ScoredCandidate> {
        if self.policy.is_enabled(link_type) {
            return pool;
        }
        if !pool.is_empty() {
            log::info!(
                "[topk] {link_type} links disabled by layout, skipping {} candidates",
                pool.len()
            );
        }
        Vec::new()
    }
}

/// Sorts `pool` and splits off the first `quota` entries.
fn take_quota(
    link_type: LinkType,
    mut pool: Vec<ScoredCandidate>,
    quota: usize,
    shortfalls: &mut Vec<QuotaShortfall>,
) -> (Vec<ScoredCandidate>, Vec<ScoredCandidate>) {
    pool.sort_by(ScoredCandidate::selection_cmp);
    if pool.len() < quota {
        log::warn!(
            "[topk] {link_type} quota shortfall: {} available, {quota} required",
            pool.len()
        );
        shortfalls.push(QuotaShortfall {
            link_type,
            required: quota,
            available: pool.len(),
        });
    }
    let rest = pool.split_off(quota.min(pool.len()));
    (pool, rest)
}

fn owned_pair(candidate: &ScoredCandidate) -> (String, String) {
    let (from, to) = candidate.pair();
    (from.to_string(), to.to_string())
}
