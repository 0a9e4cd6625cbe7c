use serde::Serialize;
use std::fmt;

use super::types::{DecisionType, Policy, PolicyStrength};
use super::validation::validate_policy;
use crate::decisions::PowersAnalysis;
use crate::store::VoteStore;

/// Problems a policy definition can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    /// A strong link to a motion that does not use any power
    StrongWithoutPower,
    NoStrongVotes,
    /// Every strong link was flagged as without power
    NoStrongVotesAfterPowerChange,
}

impl IssueType {
    pub fn slug(&self) -> &'static str {
        match self {
            IssueType::StrongWithoutPower => "strong_without_power",
            IssueType::NoStrongVotes => "no_strong_votes",
            IssueType::NoStrongVotesAfterPowerChange => "no_strong_votes_after_power_change",
        }
    }

    /// Marker that suppresses this issue when found in notes.
    pub fn ignore_marker(&self) -> String {
        format!("ignore:{}", self.slug())
    }

    fn ignored_by(&self, notes: &str) -> bool {
        notes.to_lowercase().contains(&self.ignore_marker())
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkIssue {
    pub decision_key: String,
    pub division_name: String,
    pub issue: IssueType,
    pub powers: PowersAnalysis,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyReport {
    pub policy_id: u32,
    pub name: String,
    pub policy_issues: Vec<IssueType>,
    pub link_issues: Vec<LinkIssue>,
    /// Neutral, other-chamber or repeated links in the definition
    pub definition_issues: Vec<String>,
}

impl PolicyReport {
    pub fn has_issues(&self) -> bool {
        !self.policy_issues.is_empty()
            || !self.link_issues.is_empty()
            || !self.definition_issues.is_empty()
    }
}

/// Check a policy's strong division links against the powers analysis.
///
/// A division missing from the store counts as insufficient information.
pub fn policy_report(policy: &Policy, store: &VoteStore) -> PolicyReport {
    let policy_ignores = |issue: IssueType| issue.ignored_by(&policy.notes);

    let strong_links: Vec<_> = policy
        .division_links
        .iter()
        .filter(|l| l.strength == PolicyStrength::Strong)
        .filter(|l| l.decision.decision_type() == DecisionType::Division)
        .collect();

    let mut link_issues = Vec::new();
    for link in &strong_links {
        let key = link.key();
        let division = store.division(&key);
        let powers = division
            .map(|d| d.motion_uses_powers())
            .unwrap_or(PowersAnalysis::InsufficientInfo);

        if powers == PowersAnalysis::UsesPowers {
            continue;
        }
        let issue = IssueType::StrongWithoutPower;
        if issue.ignored_by(&link.notes) || policy_ignores(issue) {
            continue;
        }
        link_issues.push(LinkIssue {
            division_name: division.map(|d| d.division_name.clone()).unwrap_or_default(),
            decision_key: key,
            issue,
            powers,
        });
    }

    let mut policy_issues = Vec::new();
    if strong_links.is_empty() {
        if !policy_ignores(IssueType::NoStrongVotes) {
            policy_issues.push(IssueType::NoStrongVotes);
        }
    } else if link_issues.len() == strong_links.len()
        && !policy_ignores(IssueType::NoStrongVotesAfterPowerChange)
    {
        policy_issues.push(IssueType::NoStrongVotesAfterPowerChange);
    }

    PolicyReport {
        policy_id: policy.id,
        name: policy.name.clone(),
        policy_issues,
        link_issues,
        definition_issues: validate_policy(policy),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decisions::{Chamber, DivisionInfo};
    use crate::policies::types::{
        DecisionRef, LinkStatus, PolicyDirection, PolicyLink, PolicyStatus, StrengthMeaning,
    };
    use crate::store::Records;
    use chrono::NaiveDate;

    const ACTION: &str = "That this House orders that the Secretary of State lays before the House \
        within fourteen days all correspondence relating to the procurement of the new hospital \
        building programme and associated contracts.";
    const NONACTION: &str = "That this House believes that the Government should publish the \
        correspondence relating to the procurement of the new hospital building programme and \
        associated contracts as soon as it is practicable to do so.";

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 6, 1).unwrap()
    }

    fn division(number: u32, motion: &str) -> DivisionInfo {
        DivisionInfo {
            chamber: Chamber::Commons,
            date: date(),
            division_number: number,
            division_name: format!("Division {}", number),
            motion: motion.to_string(),
            manual_motion: String::new(),
            debate_gid: None,
            vote_motion_analysis: None,
        }
    }

    fn link(number: u32, strength: PolicyStrength, notes: &str) -> PolicyLink {
        PolicyLink {
            decision: DecisionRef::Division {
                chamber: Chamber::Commons,
                date: date(),
                division_number: number,
            },
            alignment: PolicyDirection::Agree,
            strength,
            status: LinkStatus::Active,
            notes: notes.to_string(),
        }
    }

    fn policy(links: Vec<PolicyLink>, notes: &str) -> Policy {
        Policy {
            id: 3,
            name: "Policy".to_string(),
            context_description: String::new(),
            policy_description: "test".to_string(),
            notes: notes.to_string(),
            status: PolicyStatus::Active,
            strength_meaning: StrengthMeaning::Simplified,
            highlightable: false,
            chamber: Chamber::Commons,
            groups: vec![],
            division_links: links,
            agreement_links: vec![],
        }
    }

    fn store() -> VoteStore {
        VoteStore::new(
            vec![],
            Records {
                divisions: vec![division(1, ACTION), division(2, NONACTION)],
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_strong_nonaction_flagged() {
        let p = policy(
            vec![link(1, PolicyStrength::Strong, ""), link(2, PolicyStrength::Strong, "")],
            "",
        );
        let report = policy_report(&p, &store());
        assert_eq!(report.link_issues.len(), 1);
        assert_eq!(report.link_issues[0].decision_key, "commons-2022-06-01-2");
        assert_eq!(report.link_issues[0].powers, PowersAnalysis::DoesNotUsePowers);
        assert!(report.policy_issues.is_empty());
    }

    #[test]
    fn test_no_strong_votes() {
        let p = policy(vec![link(2, PolicyStrength::Weak, "")], "");
        let report = policy_report(&p, &store());
        assert_eq!(report.policy_issues, vec![IssueType::NoStrongVotes]);
        assert!(report.link_issues.is_empty());
    }

    #[test]
    fn test_all_strong_flagged() {
        let p = policy(
            vec![link(2, PolicyStrength::Strong, ""), link(9, PolicyStrength::Strong, "")],
            "",
        );
        let report = policy_report(&p, &store());
        assert_eq!(report.link_issues.len(), 2);
        // Missing division has no information
        assert_eq!(report.link_issues[1].powers, PowersAnalysis::InsufficientInfo);
        assert_eq!(
            report.policy_issues,
            vec![IssueType::NoStrongVotesAfterPowerChange]
        );
    }

    #[test]
    fn test_link_ignore_marker() {
        let p = policy(
            vec![
                link(1, PolicyStrength::Strong, ""),
                link(2, PolicyStrength::Strong, "Opposition day, ignore:strong_without_power"),
            ],
            "",
        );
        let report = policy_report(&p, &store());
        assert!(!report.has_issues());
    }

    #[test]
    fn test_policy_ignore_marker() {
        let p = policy(vec![], "ignore:no_strong_votes");
        assert!(!policy_report(&p, &store()).has_issues());
    }

    #[test]
    fn test_neutral_link_listed_in_definition_issues() {
        let mut neutral = link(1, PolicyStrength::Strong, "");
        neutral.alignment = PolicyDirection::Neutral;
        let p = policy(vec![neutral, link(1, PolicyStrength::Strong, "")], "");
        let report = policy_report(&p, &store());
        assert_eq!(report.definition_issues.len(), 2);
        assert!(report.definition_issues[0].contains("neutral"));
        assert!(report.has_issues());
    }
}
