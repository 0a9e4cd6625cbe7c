mod links;

pub use links::{load_links, merge_links, save_links, LinkFile};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, warn};

use crate::decisions::{
    AgreementInfo, Chamber, DivisionInfo, Membership, PresenceRecord, VoteMotionAnalysis,
    VoteRecord,
};
use crate::policies::{validate_policies, Policy};

/// Raw decision data as exported by the ingest pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Records {
    #[serde(default)]
    pub divisions: Vec<DivisionInfo>,
    #[serde(default)]
    pub agreements: Vec<AgreementInfo>,
    #[serde(default)]
    pub votes: Vec<VoteRecord>,
    #[serde(default)]
    pub presence: Vec<PresenceRecord>,
    #[serde(default)]
    pub memberships: Vec<Membership>,
    /// Keyed to divisions by debate GID
    #[serde(default)]
    pub motion_analyses: Vec<VoteMotionAnalysis>,
}

/// Read-only handle over policies and decision records.
///
/// Built once and passed by reference (or shared in an `Arc`) to everything
/// that scores. Holds no connections and does no I/O after construction.
#[derive(Debug, Clone, Default)]
pub struct VoteStore {
    policies: Vec<Policy>,
    divisions: BTreeMap<String, DivisionInfo>,
    agreements: BTreeMap<String, AgreementInfo>,
    votes: Vec<VoteRecord>,
    presence: Vec<PresenceRecord>,
    memberships: Vec<Membership>,
}

impl VoteStore {
    pub fn new(policies: Vec<Policy>, records: Records) -> Self {
        let analyses: HashMap<String, VoteMotionAnalysis> = records
            .motion_analyses
            .into_iter()
            .map(|a| (a.gid.clone(), a))
            .collect();

        let divisions = records
            .divisions
            .into_iter()
            .map(|mut d| {
                if d.vote_motion_analysis.is_none() {
                    if let Some(gid) = &d.debate_gid {
                        d.vote_motion_analysis = analyses.get(gid).cloned();
                    }
                }
                (d.key(), d)
            })
            .collect();

        let agreements = records
            .agreements
            .into_iter()
            .map(|a| (a.key(), a))
            .collect();

        Self {
            policies,
            divisions,
            agreements,
            votes: records.votes,
            presence: records.presence,
            memberships: records.memberships,
        }
    }

    /// Load `policies/*.yml` and `records.json` from a data directory.
    ///
    /// A policy id defined twice fails the load. Other definition problems
    /// are logged and the policy is kept.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let policies = load_policies(&data_dir.join("policies"))?;
        validate_policies(&policies)?;

        let records_path = data_dir.join("records.json");
        let file = File::open(&records_path)
            .with_context(|| format!("Failed to open records at {}", records_path.display()))?;
        let records: Records = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse records in {}", records_path.display()))?;

        debug!(
            "Loaded {} policies, {} divisions, {} votes, {} memberships",
            policies.len(),
            records.divisions.len(),
            records.votes.len(),
            records.memberships.len()
        );

        let store = Self::new(policies, records);
        store.warn_missing_decisions();
        Ok(store)
    }

    fn warn_missing_decisions(&self) {
        for policy in &self.policies {
            for link in policy.links() {
                let key = link.key();
                if !self.divisions.contains_key(&key) && !self.agreements.contains_key(&key) {
                    warn!("Policy {} links to unknown decision {}", policy.id, key);
                }
            }
        }
    }

    pub fn policies(&self) -> &[Policy] {
        &self.policies
    }

    pub fn policy(&self, id: u32) -> Option<&Policy> {
        self.policies.iter().find(|p| p.id == id)
    }

    pub fn chamber_policies(&self, chamber: Chamber) -> impl Iterator<Item = &Policy> {
        self.policies.iter().filter(move |p| p.chamber == chamber)
    }

    pub fn division(&self, key: &str) -> Option<&DivisionInfo> {
        self.divisions.get(key)
    }

    pub fn votes(&self) -> &[VoteRecord] {
        &self.votes
    }

    pub fn presence(&self) -> &[PresenceRecord] {
        &self.presence
    }

    pub fn memberships(&self) -> &[Membership] {
        &self.memberships
    }

    /// Votes cast in one division.
    pub fn division_votes(&self, key: &str) -> Vec<VoteRecord> {
        self.votes
            .iter()
            .filter(|v| v.division_key == key)
            .cloned()
            .collect()
    }

    /// Memberships of a chamber active on a date.
    pub fn members_on(&self, chamber: Chamber, date: NaiveDate) -> Vec<&Membership> {
        self.memberships
            .iter()
            .filter(|m| m.chamber == chamber && m.active_on(date))
            .collect()
    }

    /// Everyone who voted in a division linked to one of the chamber's policies.
    pub fn affected_people(&self, chamber: Chamber) -> Vec<u32> {
        let keys: BTreeSet<String> = self
            .chamber_policies(chamber)
            .flat_map(|p| p.division_links.iter().map(|l| l.key()))
            .collect();

        let people: BTreeSet<u32> = self
            .votes
            .iter()
            .filter(|v| keys.contains(&v.division_key))
            .map(|v| v.person_id)
            .collect();
        people.into_iter().collect()
    }

    /// Parties a person has sat for in a chamber, minus ones never used for comparison.
    pub fn person_parties(&self, person_id: u32, chamber: Chamber, banned: &[String]) -> Vec<String> {
        let parties: BTreeSet<&str> = self
            .memberships
            .iter()
            .filter(|m| m.person_id == person_id && m.chamber == chamber)
            .map(|m| m.party.as_str())
            .filter(|party| !banned.iter().any(|b| b == party))
            .collect();
        parties.into_iter().map(str::to_string).collect()
    }
}

/// Read every `*.yml` policy file in a directory, sorted by policy id.
pub fn load_policies(dir: &Path) -> Result<Vec<Policy>> {
    let pattern = dir.join("*.yml");
    let pattern = pattern.to_string_lossy();

    let mut policies = Vec::new();
    for entry in glob::glob(&pattern).with_context(|| format!("Bad policy path {}", pattern))? {
        let path = entry.context("Failed to read policy directory entry")?;
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read policy file {}", path.display()))?;
        let policy: Policy = serde_saphyr::from_str(&content)
            .with_context(|| format!("Failed to parse policy: invalid YAML in {}", path.display()))?;
        policies.push(policy);
    }
    policies.sort_by_key(|p| p.id);
    Ok(policies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decisions::VotePosition;
    use std::io::Write;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    const POLICY: &str = r#"
id: 1
name: Test policy
policy_description: testing
chamber: commons
division_links:
  - decision:
      chamber_slug: commons
      date: 2020-01-01
      division_number: 1
    alignment: agree
    strength: strong
"#;

    fn records() -> Records {
        Records {
            divisions: vec![DivisionInfo {
                chamber: Chamber::Commons,
                date: date("2020-01-01"),
                division_number: 1,
                division_name: "Test division".to_string(),
                motion: String::new(),
                manual_motion: String::new(),
                debate_gid: Some("2020-01-01a.1.0".to_string()),
                vote_motion_analysis: None,
            }],
            votes: vec![
                VoteRecord {
                    division_key: "commons-2020-01-01-1".to_string(),
                    person_id: 2,
                    vote: VotePosition::Aye,
                },
                VoteRecord {
                    division_key: "commons-2020-01-01-99".to_string(),
                    person_id: 3,
                    vote: VotePosition::No,
                },
            ],
            memberships: vec![
                Membership {
                    person_id: 2,
                    chamber: Chamber::Commons,
                    party: "labour".to_string(),
                    start_date: date("2019-12-12"),
                    end_date: None,
                },
                Membership {
                    person_id: 2,
                    chamber: Chamber::Commons,
                    party: "independent".to_string(),
                    start_date: date("2015-05-07"),
                    end_date: Some(date("2019-11-06")),
                },
            ],
            motion_analyses: vec![VoteMotionAnalysis {
                debate_type: "commons".to_string(),
                gid: "2020-01-01a.1.0".to_string(),
                question: String::new(),
                tidied_motion: None,
                full_motion_speech: String::new(),
                full_motion_gid: None,
                vote_type: crate::decisions::VoteType::SecondStage,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("policies")).unwrap();
        let mut f = File::create(dir.path().join("policies").join("1.yml")).unwrap();
        f.write_all(POLICY.as_bytes()).unwrap();
        let json = serde_json::to_string(&records()).unwrap();
        fs::write(dir.path().join("records.json"), json).unwrap();

        let store = VoteStore::load(dir.path()).unwrap();
        assert_eq!(store.policies().len(), 1);
        assert!(store.division("commons-2020-01-01-1").is_some());
    }

    #[test]
    fn test_load_keeps_policy_with_neutral_link() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("policies")).unwrap();
        let neutral = POLICY.replace("alignment: agree", "alignment: neutral");
        fs::write(dir.path().join("policies").join("1.yml"), neutral).unwrap();
        let json = serde_json::to_string(&records()).unwrap();
        fs::write(dir.path().join("records.json"), json).unwrap();

        let store = VoteStore::load(dir.path()).unwrap();
        assert_eq!(store.policies().len(), 1);
        assert_eq!(
            store.policies()[0].division_links[0].alignment,
            crate::policies::PolicyDirection::Neutral
        );
    }

    #[test]
    fn test_load_duplicate_policy_id_is_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("policies")).unwrap();
        fs::write(dir.path().join("policies").join("1.yml"), POLICY).unwrap();
        fs::write(dir.path().join("policies").join("2.yml"), POLICY).unwrap();
        let json = serde_json::to_string(&records()).unwrap();
        fs::write(dir.path().join("records.json"), json).unwrap();

        assert!(VoteStore::load(dir.path()).is_err());
    }

    #[test]
    fn test_load_missing_records_is_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("policies")).unwrap();
        assert!(VoteStore::load(dir.path()).is_err());
    }

    #[test]
    fn test_analysis_attached_by_gid() {
        let policies = vec![serde_saphyr::from_str::<Policy>(POLICY).unwrap()];
        let store = VoteStore::new(policies, records());
        let division = store.division("commons-2020-01-01-1").unwrap();
        assert_eq!(
            division.vote_type(),
            Some(crate::decisions::VoteType::SecondStage)
        );
    }

    #[test]
    fn test_affected_people_only_linked_divisions() {
        let policies = vec![serde_saphyr::from_str::<Policy>(POLICY).unwrap()];
        let store = VoteStore::new(policies, records());
        assert_eq!(store.affected_people(Chamber::Commons), vec![2]);
        assert!(store.affected_people(Chamber::Lords).is_empty());
    }

    #[test]
    fn test_person_parties_excludes_banned() {
        let store = VoteStore::new(vec![], records());
        let banned = vec!["independent".to_string()];
        assert_eq!(
            store.person_parties(2, Chamber::Commons, &banned),
            vec!["labour".to_string()]
        );
        assert_eq!(store.person_parties(2, Chamber::Commons, &[]).len(), 2);
    }

    #[test]
    fn test_members_on_date() {
        let store = VoteStore::new(vec![], records());
        assert_eq!(store.members_on(Chamber::Commons, date("2019-12-01")).len(), 0);
        assert_eq!(store.members_on(Chamber::Commons, date("2018-01-01")).len(), 1);
    }
}
