//! Slow path: recompute a policy comparison one decision and one member at a time.
//!
//! Written independently of [`super::aggregate`] so a bug in the bulk
//! pipeline cannot hide by being copied here. Results should agree with the
//! aggregator to within a small absolute tolerance on every count.

use anyhow::{bail, Result};
use rand::seq::SliceRandom;
use serde::Serialize;
use tracing::{debug, info};

use super::aggregate::policy_comparisons;
use super::distribution::{PersonPolicyLink, PolicyComparison, VoteDistribution};
use super::types::{DecisionType, PolicyDirection, PolicyStrength, TimePeriod};
use crate::decisions::{Chamber, VotePosition};
use crate::store::VoteStore;

/// Default allowed difference between the two paths, per field.
pub const DEFAULT_TOLERANCE: f64 = 0.05;

#[derive(Debug, Clone, Copy, Default)]
struct Counts {
    same: f64,
    different: f64,
    absent: f64,
    abstain: f64,
    agreed: f64,
    disagreed: f64,
}

#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    weak: Counts,
    strong: Counts,
}

impl Tally {
    fn side(&mut self, strong: bool) -> &mut Counts {
        if strong {
            &mut self.strong
        } else {
            &mut self.weak
        }
    }

    fn into_distribution(self, years: Option<(i32, i32)>) -> VoteDistribution {
        VoteDistribution {
            num_votes_same: self.weak.same,
            num_strong_votes_same: self.strong.same,
            num_votes_different: self.weak.different,
            num_strong_votes_different: self.strong.different,
            num_votes_absent: self.weak.absent,
            num_strong_votes_absent: self.strong.absent,
            num_votes_abstain: self.weak.abstain,
            num_strong_votes_abstain: self.strong.abstain,
            num_agreements_same: self.weak.agreed,
            num_strong_agreements_same: self.strong.agreed,
            num_agreements_different: self.weak.disagreed,
            num_strong_agreements_different: self.strong.disagreed,
            start_year: years.map(|(start, _)| start),
            end_year: years.map(|(_, end)| end),
            distance_score: 0.0,
            similarity_score: 0.0,
        }
    }
}

/// Recompute one person's comparison against a party on one policy.
///
/// Returns None if the policy is unknown, belongs to another chamber, or no
/// linked decision fell while the person was a member.
pub fn validate_comparison(
    store: &VoteStore,
    person_id: u32,
    chamber: Chamber,
    party: &str,
    policy_id: u32,
    period: &TimePeriod,
) -> Option<PolicyComparison> {
    let policy = store.policy(policy_id)?;
    if policy.chamber != chamber {
        return None;
    }

    let mut target = Tally::default();
    let mut other = Tally::default();
    let mut anyone_else = false;
    let mut any_link = false;
    let mut years: Option<(i32, i32)> = None;

    for link in policy.division_links.iter().chain(policy.agreement_links.iter()) {
        let key = link.key();
        let date = link.decision.date();

        if link.alignment == PolicyDirection::Neutral {
            debug!("{}: neutral, skipped", key);
            continue;
        }
        if link.decision.chamber() != chamber {
            debug!("{}: other chamber, skipped", key);
            continue;
        }
        let in_period = period.start.map_or(true, |s| s <= date) && period.end.map_or(true, |e| date <= e);
        if !in_period {
            continue;
        }

        let mut target_member = false;
        for m in store.memberships() {
            if m.person_id == person_id
                && m.chamber == chamber
                && m.start_date <= date
                && m.end_date.map_or(true, |end| date <= end)
            {
                target_member = true;
                break;
            }
        }
        if !target_member {
            debug!("{}: person {} not a member, skipped", key, person_id);
            continue;
        }
        any_link = true;

        let year = chrono::Datelike::year(&date);
        years = Some(match years {
            None => (year, year),
            Some((start, end)) => (start.min(year), end.max(year)),
        });

        let mut comparators: Vec<u32> = Vec::new();
        for m in store.memberships() {
            if m.chamber == chamber
                && m.party == party
                && m.person_id != person_id
                && m.start_date <= date
                && m.end_date.map_or(true, |end| date <= end)
                && !comparators.contains(&m.person_id)
            {
                comparators.push(m.person_id);
            }
        }

        let strong = link.strength == PolicyStrength::Strong;
        let agree = link.alignment == PolicyDirection::Agree;

        match link.decision.decision_type() {
            DecisionType::Division => {
                // 0 same, 1 different, 2 abstain, 3 absent
                let classify = |member: u32| -> usize {
                    let mut recorded = None;
                    for v in store.votes() {
                        if v.division_key == key && v.person_id == member {
                            recorded = Some(v.vote);
                            break;
                        }
                    }
                    match recorded {
                        None | Some(VotePosition::Absent) => 3,
                        Some(VotePosition::Aye | VotePosition::Tellaye) if agree => 0,
                        Some(VotePosition::No | VotePosition::Tellno) if !agree => 0,
                        Some(VotePosition::Abstention | VotePosition::Both) => 2,
                        Some(_) => 1,
                    }
                };

                let own = classify(person_id);
                let counts = target.side(strong);
                match own {
                    0 => counts.same += 1.0,
                    1 => counts.different += 1.0,
                    2 => counts.abstain += 1.0,
                    _ => counts.absent += 1.0,
                }
                debug!("{}: person {} -> {}", key, person_id, own);

                let mut local = [0u32; 4];
                for &member in &comparators {
                    local[classify(member)] += 1;
                }
                let total: u32 = local.iter().sum();
                if total > 0 {
                    anyone_else = true;
                    let total = total as f64;
                    let counts = other.side(strong);
                    counts.same += local[0] as f64 / total;
                    counts.different += local[1] as f64 / total;
                    counts.abstain += local[2] as f64 / total;
                    counts.absent += local[3] as f64 / total;
                }
                debug!("{}: comparators {:?}", key, local);
            }
            DecisionType::Agreement => {
                let recorded: Vec<u32> = store
                    .presence()
                    .iter()
                    .filter(|p| p.agreement_key == key)
                    .map(|p| p.person_id)
                    .collect();
                let present = |member: u32| recorded.is_empty() || recorded.contains(&member);

                if present(person_id) {
                    let counts = target.side(strong);
                    if agree {
                        counts.agreed += 1.0;
                    } else {
                        counts.disagreed += 1.0;
                    }
                }

                // Everyone present took the same side, so the whole decision goes to it
                if comparators.iter().any(|&member| present(member)) {
                    anyone_else = true;
                    let counts = other.side(strong);
                    if agree {
                        counts.agreed += 1.0;
                    } else {
                        counts.disagreed += 1.0;
                    }
                }
            }
        }
    }

    if !any_link {
        return None;
    }

    Some(PolicyComparison {
        policy_id,
        target: target.into_distribution(years),
        other: anyone_else.then(|| other.into_distribution(years)),
    })
}

/// Field-by-field differences larger than `tolerance`.
pub fn compare_distributions(
    label: &str,
    aggregator: &VoteDistribution,
    validator: &VoteDistribution,
    tolerance: f64,
) -> Vec<String> {
    aggregator
        .count_fields()
        .iter()
        .zip(validator.count_fields().iter())
        .filter(|((_, a), (_, v))| (a - v).abs() > tolerance)
        .map(|((name, a), (_, v))| {
            format!(
                "{} {}: aggregator {:.4}, validator {:.4}",
                label, name, a, v
            )
        })
        .collect()
}

/// Run both paths for one person, party and policy and list any disagreement.
pub fn validate_approach(
    store: &VoteStore,
    person_id: u32,
    chamber: Chamber,
    party: &str,
    policy_id: u32,
    period: &TimePeriod,
    tolerance: f64,
) -> Result<Vec<String>> {
    if store.policy(policy_id).is_none() {
        bail!("Unknown policy {}", policy_id);
    }

    let fast = policy_comparisons(store, person_id, chamber, party, period)
        .into_iter()
        .find(|c| c.policy_id == policy_id);
    let slow = validate_comparison(store, person_id, chamber, party, policy_id, period);

    let mismatches = match (fast, slow) {
        (None, None) => Vec::new(),
        (Some(_), None) => vec!["aggregator found decisions, validator found none".to_string()],
        (None, Some(_)) => vec!["validator found decisions, aggregator found none".to_string()],
        (Some(fast), Some(slow)) => {
            let mut found = compare_distributions("person", &fast.target, &slow.target, tolerance);
            found.extend(compare_distributions(
                "comparison",
                &fast.other.unwrap_or_default(),
                &slow.other.unwrap_or_default(),
                tolerance,
            ));
            found
        }
    };
    Ok(mismatches)
}

/// Outcome of re-checking one generated link.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkValidation {
    pub person_id: u32,
    pub policy_id: u32,
    pub comparison_party: String,
    pub mismatches: Vec<String>,
}

impl LinkValidation {
    pub fn is_ok(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Re-check generated links with the slow path.
///
/// With `sample` set, a random subset of that size is checked instead of every link.
pub fn check_links(
    store: &VoteStore,
    links: &[PersonPolicyLink],
    sample: Option<usize>,
    period: &TimePeriod,
    tolerance: f64,
) -> Vec<LinkValidation> {
    let chosen: Vec<&PersonPolicyLink> = match sample {
        Some(n) if n < links.len() => {
            let mut rng = rand::thread_rng();
            links.choose_multiple(&mut rng, n).collect()
        }
        _ => links.iter().collect(),
    };
    info!("Checking {} of {} links", chosen.len(), links.len());

    chosen
        .into_iter()
        .map(|link| {
            let slow = validate_comparison(
                store,
                link.person_id,
                link.chamber,
                &link.comparison_party,
                link.policy_id,
                period,
            );
            let mismatches = match slow {
                None => vec!["validator found no decisions".to_string()],
                Some(comparison) => {
                    let meaning = store
                        .policy(link.policy_id)
                        .map(|p| p.strength_meaning)
                        .unwrap_or_default();
                    let expected = PersonPolicyLink::from_comparison(
                        link.person_id,
                        &link.comparison_party,
                        link.chamber,
                        &comparison,
                        meaning,
                    );
                    let mut found = compare_distributions(
                        "person",
                        &link.person_distribution,
                        &expected.person_distribution,
                        tolerance,
                    );
                    found.extend(compare_distributions(
                        "comparison",
                        &link.comparison_distribution,
                        &expected.comparison_distribution,
                        tolerance,
                    ));
                    if link.no_party_comparison != expected.no_party_comparison {
                        found.push(format!(
                            "no_party_comparison: aggregator {}, validator {}",
                            link.no_party_comparison, expected.no_party_comparison
                        ));
                    }
                    found
                }
            };
            LinkValidation {
                person_id: link.person_id,
                policy_id: link.policy_id,
                comparison_party: link.comparison_party.clone(),
                mismatches,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decisions::{Membership, VoteRecord};
    use crate::policies::types::{DecisionRef, LinkStatus, Policy, PolicyLink, PolicyStatus, StrengthMeaning};
    use crate::store::Records;
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn link(number: u32, alignment: PolicyDirection, strength: PolicyStrength) -> PolicyLink {
        PolicyLink {
            decision: DecisionRef::Division {
                chamber: Chamber::Commons,
                date: date("2021-03-01"),
                division_number: number,
            },
            alignment,
            strength,
            status: LinkStatus::Active,
            notes: String::new(),
        }
    }

    fn store() -> VoteStore {
        let policy = Policy {
            id: 7,
            name: "Policy".to_string(),
            context_description: String::new(),
            policy_description: "test".to_string(),
            notes: String::new(),
            status: PolicyStatus::Active,
            strength_meaning: StrengthMeaning::Classic,
            highlightable: false,
            chamber: Chamber::Commons,
            groups: vec![],
            division_links: vec![
                link(1, PolicyDirection::Agree, PolicyStrength::Strong),
                link(2, PolicyDirection::Against, PolicyStrength::Weak),
                link(3, PolicyDirection::Neutral, PolicyStrength::Strong),
            ],
            agreement_links: vec![],
        };
        let memberships = (1..=4)
            .map(|person_id| Membership {
                person_id,
                chamber: Chamber::Commons,
                party: "snp".to_string(),
                start_date: date("2019-12-12"),
                end_date: None,
            })
            .collect();
        let v = |n: u32, person_id: u32, vote: VotePosition| VoteRecord {
            division_key: format!("commons-2021-03-01-{}", n),
            person_id,
            vote,
        };
        let votes = vec![
            v(1, 1, VotePosition::Tellaye),
            v(1, 2, VotePosition::Aye),
            v(1, 3, VotePosition::Both),
            v(2, 1, VotePosition::Abstention),
            v(2, 2, VotePosition::No),
            v(2, 3, VotePosition::No),
            v(2, 4, VotePosition::Aye),
            v(3, 1, VotePosition::Aye),
        ];
        VoteStore::new(
            vec![policy],
            Records {
                votes,
                memberships,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_slow_path_counts() {
        let store = store();
        let result =
            validate_comparison(&store, 1, Chamber::Commons, "snp", 7, &TimePeriod::all_time()).unwrap();

        assert_eq!(result.target.num_strong_votes_same, 1.0);
        assert_eq!(result.target.num_votes_abstain, 1.0);
        assert_eq!(result.target.total_votes(), 2.0);
        assert_eq!(result.target.start_year, Some(2021));

        let other = result.other.unwrap();
        // Division 1: aye, both, absent among three others
        assert!((other.num_strong_votes_same - 1.0 / 3.0).abs() < 1e-9);
        assert!((other.num_strong_votes_abstain - 1.0 / 3.0).abs() < 1e-9);
        assert!((other.num_strong_votes_absent - 1.0 / 3.0).abs() < 1e-9);
        // Division 2: no, no, aye against the policy
        assert!((other.num_votes_same - 2.0 / 3.0).abs() < 1e-9);
        assert!((other.num_votes_different - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_paths_agree() {
        let store = store();
        for person in 1..=4 {
            let mismatches = validate_approach(
                &store,
                person,
                Chamber::Commons,
                "snp",
                7,
                &TimePeriod::all_time(),
                DEFAULT_TOLERANCE,
            )
            .unwrap();
            assert!(mismatches.is_empty(), "person {}: {:?}", person, mismatches);
        }
    }

    #[test]
    fn test_unknown_policy_is_error() {
        let store = store();
        assert!(validate_approach(
            &store,
            1,
            Chamber::Commons,
            "snp",
            999,
            &TimePeriod::all_time(),
            DEFAULT_TOLERANCE
        )
        .is_err());
    }

    #[test]
    fn test_compare_distributions_reports_field() {
        let a = VoteDistribution {
            num_votes_same: 1.0,
            ..Default::default()
        };
        let b = VoteDistribution {
            num_votes_same: 1.04,
            num_strong_votes_absent: 0.5,
            ..Default::default()
        };
        let found = compare_distributions("person", &a, &b, DEFAULT_TOLERANCE);
        assert_eq!(found.len(), 1);
        assert!(found[0].contains("num_strong_votes_absent"));
    }

    #[test]
    fn test_check_links_flags_tampered_row() {
        let store = store();
        let mut links = crate::policies::person_policy_links(
            &store,
            1,
            Chamber::Commons,
            "snp",
            &TimePeriod::all_time(),
        );
        assert_eq!(links.len(), 1);
        let clean = check_links(&store, &links, None, &TimePeriod::all_time(), DEFAULT_TOLERANCE);
        assert!(clean[0].is_ok());

        links[0].person_distribution.num_strong_votes_same = 3.0;
        let tampered = check_links(&store, &links, Some(5), &TimePeriod::all_time(), DEFAULT_TOLERANCE);
        assert!(!tampered[0].is_ok());
    }
}
