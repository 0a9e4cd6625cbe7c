use anyhow::Result;
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::decisions::Chamber;
use crate::policies::{person_policy_links, PersonPolicyLink, TimePeriod};
use crate::store::VoteStore;

/// Which people and policies a generation run covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    All,
    Person(u32),
    Policy(u32),
}

impl Scope {
    /// Partial runs are merged into existing output rather than replacing it.
    pub fn is_incremental(&self) -> bool {
        !matches!(self, Scope::All)
    }
}

/// Compute person-policy links for every affected person against each of
/// their comparison parties.
///
/// Each (person, party) pair runs as its own blocking task. Results come
/// back in completion order and are sorted before returning.
pub async fn generate_links(
    store: Arc<VoteStore>,
    chamber: Chamber,
    banned_parties: &[String],
    period: TimePeriod,
    scope: Scope,
) -> Result<Vec<PersonPolicyLink>> {
    let people = match scope {
        Scope::Person(id) => vec![id],
        Scope::All | Scope::Policy(_) => store.affected_people(chamber),
    };

    let pairs: Vec<(u32, String)> = people
        .iter()
        .flat_map(|&person| {
            store
                .person_parties(person, chamber, banned_parties)
                .into_iter()
                .map(move |party| (person, party))
        })
        .collect();
    info!(
        "Generating links for {} people, {} person/party pairs in {}",
        people.len(),
        pairs.len(),
        chamber
    );

    let mut futures = FuturesUnordered::new();
    for (person, party) in pairs {
        let store = Arc::clone(&store);
        futures.push(tokio::task::spawn_blocking(move || {
            let links = person_policy_links(&store, person, chamber, &party, &period);
            (person, party, links)
        }));
    }

    let mut all_links = Vec::new();
    let mut failures = 0usize;
    while let Some(result) = futures.next().await {
        match result {
            Ok((person, party, links)) => {
                debug!("  {} links for person {} vs {}", links.len(), person, party);
                all_links.extend(links);
            }
            Err(e) => {
                warn!("Link generation task failed: {}", e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} link generation tasks failed", failures);
    }

    if let Scope::Policy(policy_id) = scope {
        all_links.retain(|link| link.policy_id == policy_id);
    }

    all_links.sort_by(|a, b| a.merge_key().cmp(&b.merge_key()));
    Ok(all_links)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decisions::{Membership, VotePosition, VoteRecord};
    use crate::policies::{DecisionRef, LinkStatus, Policy, PolicyDirection, PolicyLink, PolicyStatus, PolicyStrength, StrengthMeaning};
    use crate::store::Records;
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn policy(id: u32, number: u32) -> Policy {
        Policy {
            id,
            name: format!("Policy {}", id),
            context_description: String::new(),
            policy_description: "test".to_string(),
            notes: String::new(),
            status: PolicyStatus::Active,
            strength_meaning: StrengthMeaning::Simplified,
            highlightable: false,
            chamber: Chamber::Commons,
            groups: vec![],
            division_links: vec![PolicyLink {
                decision: DecisionRef::Division {
                    chamber: Chamber::Commons,
                    date: date("2020-01-01"),
                    division_number: number,
                },
                alignment: PolicyDirection::Agree,
                strength: PolicyStrength::Strong,
                status: LinkStatus::Active,
                notes: String::new(),
            }],
            agreement_links: vec![],
        }
    }

    fn store() -> Arc<VoteStore> {
        let member = |person_id: u32, party: &str| Membership {
            person_id,
            chamber: Chamber::Commons,
            party: party.to_string(),
            start_date: date("2019-12-12"),
            end_date: None,
        };
        let vote = |number: u32, person_id: u32, vote: VotePosition| VoteRecord {
            division_key: format!("commons-2020-01-01-{}", number),
            person_id,
            vote,
        };
        Arc::new(VoteStore::new(
            vec![policy(1, 1), policy(2, 2)],
            Records {
                memberships: vec![
                    member(1, "labour"),
                    member(2, "labour"),
                    member(3, "speaker"),
                ],
                votes: vec![
                    vote(1, 1, VotePosition::Aye),
                    vote(1, 2, VotePosition::No),
                    vote(1, 3, VotePosition::Aye),
                    vote(2, 1, VotePosition::No),
                ],
                ..Default::default()
            },
        ))
    }

    #[tokio::test]
    async fn test_generate_all_skips_banned_parties() {
        let banned = vec!["speaker".to_string()];
        let links = generate_links(store(), Chamber::Commons, &banned, TimePeriod::all_time(), Scope::All)
            .await
            .unwrap();

        // Two labour members, two policies each; the speaker has no comparison party
        assert_eq!(links.len(), 4);
        assert!(links.iter().all(|l| l.comparison_party == "labour"));
        assert_eq!(links[0].person_id, 1);
        assert_eq!(links[0].policy_id, 1);
        assert!(links[0].significant_difference);
    }

    #[tokio::test]
    async fn test_generate_one_policy() {
        let links = generate_links(store(), Chamber::Commons, &[], TimePeriod::all_time(), Scope::Policy(2))
            .await
            .unwrap();
        assert!(links.iter().all(|l| l.policy_id == 2));
        assert_eq!(links.len(), 3);
    }

    #[tokio::test]
    async fn test_generate_one_person() {
        let links = generate_links(store(), Chamber::Commons, &[], TimePeriod::all_time(), Scope::Person(2))
            .await
            .unwrap();
        assert_eq!(links.len(), 2);
        assert!(links.iter().all(|l| l.person_id == 2));
        assert!(Scope::Person(2).is_incremental());
        assert!(!Scope::All.is_incremental());
    }
}
