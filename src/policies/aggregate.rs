//! Fast path: policy comparisons for one person in bulk.
//!
//! Works like a query plan. Flatten the chamber's decision links into a
//! table, index votes and presence, emit one outcome row per eligible
//! member per link, group the rows per link, reduce the comparison group
//! to fractions, then pivot the groups into distributions per policy.
//!
//! [`super::validator`] computes the same thing one vote at a time and
//! shares none of this code.

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

use super::distribution::{PersonPolicyLink, PolicyComparison, VoteDistribution};
use super::types::{DecisionType, PolicyDirection, PolicyStrength, TimePeriod};
use crate::decisions::{Chamber, VotePosition};
use crate::store::VoteStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Outcome {
    Same,
    Different,
    Abstain,
    Absent,
}

impl Outcome {
    const ALL: [Outcome; 4] = [
        Outcome::Same,
        Outcome::Different,
        Outcome::Abstain,
        Outcome::Absent,
    ];

    fn index(self) -> usize {
        match self {
            Outcome::Same => 0,
            Outcome::Different => 1,
            Outcome::Abstain => 2,
            Outcome::Absent => 3,
        }
    }
}

#[derive(Debug, Clone)]
struct LinkRow {
    policy_id: u32,
    key: String,
    kind: DecisionType,
    date: NaiveDate,
    alignment: PolicyDirection,
    strength: PolicyStrength,
}

#[derive(Debug, Clone, Copy)]
struct OutcomeRow {
    link: usize,
    is_target: bool,
    outcome: Outcome,
}

/// Non-neutral links of the chamber's policies inside the period.
fn link_table(store: &VoteStore, chamber: Chamber, period: &TimePeriod) -> Vec<LinkRow> {
    store
        .chamber_policies(chamber)
        .flat_map(|policy| policy.links().map(move |link| (policy.id, link)))
        .filter(|(_, link)| link.alignment != PolicyDirection::Neutral)
        .filter(|(_, link)| link.decision.chamber() == chamber)
        .filter(|(_, link)| period.contains(link.decision.date()))
        .map(|(policy_id, link)| LinkRow {
            policy_id,
            key: link.key(),
            kind: link.decision.decision_type(),
            date: link.decision.date(),
            alignment: link.alignment,
            strength: link.strength,
        })
        .collect()
}

fn division_outcome(alignment: PolicyDirection, vote: Option<VotePosition>) -> Outcome {
    let Some(vote) = vote else {
        return Outcome::Absent;
    };
    match (vote.folded(), alignment) {
        (VotePosition::Aye, PolicyDirection::Agree) | (VotePosition::No, PolicyDirection::Against) => {
            Outcome::Same
        }
        (VotePosition::Abstention, _) => Outcome::Abstain,
        (VotePosition::Absent, _) => Outcome::Absent,
        _ => Outcome::Different,
    }
}

fn agreement_outcome(alignment: PolicyDirection) -> Outcome {
    match alignment {
        PolicyDirection::Agree => Outcome::Same,
        _ => Outcome::Different,
    }
}

fn add_to(dist: &mut VoteDistribution, row: &LinkRow, outcome: Outcome, amount: f64) {
    let strong = row.strength == PolicyStrength::Strong;
    let field = match (row.kind, outcome, strong) {
        (DecisionType::Division, Outcome::Same, false) => &mut dist.num_votes_same,
        (DecisionType::Division, Outcome::Same, true) => &mut dist.num_strong_votes_same,
        (DecisionType::Division, Outcome::Different, false) => &mut dist.num_votes_different,
        (DecisionType::Division, Outcome::Different, true) => &mut dist.num_strong_votes_different,
        (DecisionType::Division, Outcome::Abstain, false) => &mut dist.num_votes_abstain,
        (DecisionType::Division, Outcome::Abstain, true) => &mut dist.num_strong_votes_abstain,
        (DecisionType::Division, Outcome::Absent, false) => &mut dist.num_votes_absent,
        (DecisionType::Division, Outcome::Absent, true) => &mut dist.num_strong_votes_absent,
        (DecisionType::Agreement, Outcome::Same, false) => &mut dist.num_agreements_same,
        (DecisionType::Agreement, Outcome::Same, true) => &mut dist.num_strong_agreements_same,
        (DecisionType::Agreement, Outcome::Different, false) => &mut dist.num_agreements_different,
        (DecisionType::Agreement, Outcome::Different, true) => {
            &mut dist.num_strong_agreements_different
        }
        // Agreements are collective: nobody present abstains or is absent
        (DecisionType::Agreement, Outcome::Abstain | Outcome::Absent, _) => return,
    };
    *field += amount;
}

/// Compare one person against a party on every policy of a chamber.
///
/// Policies where the person was never a member for a linked decision are
/// left out.
pub fn policy_comparisons(
    store: &VoteStore,
    person_id: u32,
    chamber: Chamber,
    party: &str,
    period: &TimePeriod,
) -> Vec<PolicyComparison> {
    let links = link_table(store, chamber, period);

    let votes: HashMap<(&str, u32), VotePosition> = store
        .votes()
        .iter()
        .map(|v| ((v.division_key.as_str(), v.person_id), v.vote))
        .collect();

    let mut presence: HashMap<&str, HashSet<u32>> = HashMap::new();
    for p in store.presence() {
        presence
            .entry(p.agreement_key.as_str())
            .or_default()
            .insert(p.person_id);
    }

    let target_spans: Vec<_> = store
        .memberships()
        .iter()
        .filter(|m| m.chamber == chamber && m.person_id == person_id)
        .collect();
    let party_spans: Vec<_> = store
        .memberships()
        .iter()
        .filter(|m| m.chamber == chamber && m.party == party && m.person_id != person_id)
        .collect();

    // One row per eligible member per link
    let mut rows: Vec<OutcomeRow> = Vec::new();
    let mut live_links: Vec<usize> = Vec::new();
    for (i, link) in links.iter().enumerate() {
        if !target_spans.iter().any(|m| m.active_on(link.date)) {
            continue;
        }
        live_links.push(i);

        let mut eligible: Vec<(u32, bool)> = vec![(person_id, true)];
        let comparators: HashSet<u32> = party_spans
            .iter()
            .filter(|m| m.active_on(link.date))
            .map(|m| m.person_id)
            .collect();
        eligible.extend(comparators.into_iter().map(|p| (p, false)));

        let present = presence.get(link.key.as_str());
        for (member, is_target) in eligible {
            let outcome = match link.kind {
                DecisionType::Division => {
                    division_outcome(link.alignment, votes.get(&(link.key.as_str(), member)).copied())
                }
                DecisionType::Agreement => {
                    if present.is_some_and(|set| !set.contains(&member)) {
                        continue;
                    }
                    agreement_outcome(link.alignment)
                }
            };
            rows.push(OutcomeRow {
                link: i,
                is_target,
                outcome,
            });
        }
    }

    // Group by link and side
    let mut groups: HashMap<(usize, bool), [f64; 4]> = HashMap::new();
    for row in &rows {
        groups.entry((row.link, row.is_target)).or_insert([0.0; 4])[row.outcome.index()] += 1.0;
    }

    // Pivot into distributions per policy
    let mut per_policy: BTreeMap<u32, (VoteDistribution, Option<VoteDistribution>)> =
        BTreeMap::new();
    for &i in &live_links {
        let link = &links[i];
        let (target, other) = per_policy.entry(link.policy_id).or_default();
        target.include_year(link.date);

        if let Some(counts) = groups.get(&(i, true)) {
            for outcome in Outcome::ALL {
                add_to(target, link, outcome, counts[outcome.index()]);
            }
        }

        if let Some(counts) = groups.get(&(i, false)) {
            // Each decision is worth one vote however many comparators there were
            let total: f64 = counts.iter().sum();
            if total > 0.0 {
                let other = other.get_or_insert_with(VoteDistribution::default);
                for outcome in Outcome::ALL {
                    add_to(other, link, outcome, counts[outcome.index()] / total);
                }
            }
        }
    }

    debug!(
        "Person {} vs {}: {} links, {} outcome rows, {} policies",
        person_id,
        party,
        live_links.len(),
        rows.len(),
        per_policy.len()
    );

    per_policy
        .into_iter()
        .map(|(policy_id, (target, other))| {
            let other = other.map(|mut o| {
                o.start_year = target.start_year;
                o.end_year = target.end_year;
                o
            });
            PolicyComparison {
                policy_id,
                target,
                other,
            }
        })
        .collect()
}

/// Scored person-policy links for one person against one party.
pub fn person_policy_links(
    store: &VoteStore,
    person_id: u32,
    chamber: Chamber,
    party: &str,
    period: &TimePeriod,
) -> Vec<PersonPolicyLink> {
    policy_comparisons(store, person_id, chamber, party, period)
        .into_iter()
        .filter_map(|comparison| {
            let policy = store.policy(comparison.policy_id)?;
            Some(PersonPolicyLink::from_comparison(
                person_id,
                party,
                chamber,
                &comparison,
                policy.strength_meaning,
            ))
        })
        .collect()
}
