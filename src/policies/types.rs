use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::decisions::{agreement_key, division_key, Chamber};

/// How much a decision matters to the policy definition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyStrength {
    #[default]
    Weak,
    Strong,
}

/// Which scoring function a policy uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrengthMeaning {
    /// Public Whip weighting, absences count for a little
    Classic,
    /// Only strong votes count
    #[default]
    Simplified,
}

/// Whether voting for the motion supports the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyDirection {
    Agree,
    Against,
    Neutral,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyStatus {
    #[default]
    Active,
    Candidate,
    Draft,
    Retired,
    Rejected,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    #[default]
    Active,
    Draft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionType {
    Division,
    Agreement,
}

impl fmt::Display for DecisionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecisionType::Division => f.write_str("division"),
            DecisionType::Agreement => f.write_str("agreement"),
        }
    }
}

/// Malformed decision links. These are authoring bugs in policy files.
#[derive(Debug, Error, PartialEq)]
pub enum LinkError {
    #[error("Decision on {date} in {chamber} has neither a division number nor a decision reference")]
    NeitherSet { chamber: String, date: NaiveDate },
    #[error("Decision on {date} in {chamber} has both a division number and a decision reference")]
    BothSet { chamber: String, date: NaiveDate },
    #[error("Unknown chamber '{0}'")]
    UnknownChamber(String),
    #[error("{key} is listed as a {listed} link but is a {actual}")]
    WrongKind {
        key: String,
        listed: DecisionType,
        actual: DecisionType,
    },
}

/// A decision reference as written in a policy file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialDecision {
    pub chamber_slug: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub division_number: Option<u32>,
    #[serde(default)]
    pub decision_ref: Option<String>,
}

/// A checked reference to exactly one division or agreement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "PartialDecision", into = "PartialDecision")]
pub enum DecisionRef {
    Division {
        chamber: Chamber,
        date: NaiveDate,
        division_number: u32,
    },
    Agreement {
        chamber: Chamber,
        date: NaiveDate,
        decision_ref: String,
    },
}

impl TryFrom<PartialDecision> for DecisionRef {
    type Error = LinkError;

    fn try_from(partial: PartialDecision) -> Result<Self, Self::Error> {
        let chamber: Chamber = partial
            .chamber_slug
            .parse()
            .map_err(|_| LinkError::UnknownChamber(partial.chamber_slug.clone()))?;

        match (partial.division_number, partial.decision_ref) {
            (Some(division_number), None) => Ok(DecisionRef::Division {
                chamber,
                date: partial.date,
                division_number,
            }),
            (None, Some(decision_ref)) => Ok(DecisionRef::Agreement {
                chamber,
                date: partial.date,
                decision_ref,
            }),
            (None, None) => Err(LinkError::NeitherSet {
                chamber: partial.chamber_slug,
                date: partial.date,
            }),
            (Some(_), Some(_)) => Err(LinkError::BothSet {
                chamber: partial.chamber_slug,
                date: partial.date,
            }),
        }
    }
}

impl From<DecisionRef> for PartialDecision {
    fn from(decision: DecisionRef) -> Self {
        match decision {
            DecisionRef::Division {
                chamber,
                date,
                division_number,
            } => PartialDecision {
                chamber_slug: chamber.slug().to_string(),
                date,
                division_number: Some(division_number),
                decision_ref: None,
            },
            DecisionRef::Agreement {
                chamber,
                date,
                decision_ref,
            } => PartialDecision {
                chamber_slug: chamber.slug().to_string(),
                date,
                division_number: None,
                decision_ref: Some(decision_ref),
            },
        }
    }
}

impl DecisionRef {
    pub fn key(&self) -> String {
        match self {
            DecisionRef::Division {
                chamber,
                date,
                division_number,
            } => division_key(*chamber, *date, *division_number),
            DecisionRef::Agreement {
                chamber,
                date,
                decision_ref,
            } => agreement_key(*chamber, *date, decision_ref),
        }
    }

    pub fn decision_type(&self) -> DecisionType {
        match self {
            DecisionRef::Division { .. } => DecisionType::Division,
            DecisionRef::Agreement { .. } => DecisionType::Agreement,
        }
    }

    pub fn chamber(&self) -> Chamber {
        match self {
            DecisionRef::Division { chamber, .. } | DecisionRef::Agreement { chamber, .. } => *chamber,
        }
    }

    pub fn date(&self) -> NaiveDate {
        match self {
            DecisionRef::Division { date, .. } | DecisionRef::Agreement { date, .. } => *date,
        }
    }
}

/// One decision counted towards a policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyLink {
    pub decision: DecisionRef,
    pub alignment: PolicyDirection,
    #[serde(default)]
    pub strength: PolicyStrength,
    #[serde(default)]
    pub status: LinkStatus,
    #[serde(default)]
    pub notes: String,
}

impl PolicyLink {
    pub fn key(&self) -> String {
        self.decision.key()
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RawPolicy {
    id: u32,
    name: String,
    #[serde(default)]
    context_description: String,
    policy_description: String,
    #[serde(default)]
    notes: String,
    #[serde(default)]
    status: PolicyStatus,
    #[serde(default)]
    strength_meaning: StrengthMeaning,
    #[serde(default)]
    highlightable: bool,
    chamber: Chamber,
    #[serde(default)]
    groups: Vec<String>,
    #[serde(default)]
    division_links: Vec<PolicyLink>,
    #[serde(default)]
    agreement_links: Vec<PolicyLink>,
}

/// A named position, defined by the decisions that express it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPolicy")]
pub struct Policy {
    pub id: u32,
    pub name: String,
    pub context_description: String,
    pub policy_description: String,
    pub notes: String,
    pub status: PolicyStatus,
    pub strength_meaning: StrengthMeaning,
    pub highlightable: bool,
    pub chamber: Chamber,
    pub groups: Vec<String>,
    pub division_links: Vec<PolicyLink>,
    pub agreement_links: Vec<PolicyLink>,
}

impl TryFrom<RawPolicy> for Policy {
    type Error = LinkError;

    fn try_from(raw: RawPolicy) -> Result<Self, Self::Error> {
        for (links, listed) in [
            (&raw.division_links, DecisionType::Division),
            (&raw.agreement_links, DecisionType::Agreement),
        ] {
            if let Some(link) = links.iter().find(|l| l.decision.decision_type() != listed) {
                return Err(LinkError::WrongKind {
                    key: link.key(),
                    listed,
                    actual: link.decision.decision_type(),
                });
            }
        }

        Ok(Policy {
            id: raw.id,
            name: raw.name,
            context_description: raw.context_description,
            policy_description: raw.policy_description,
            notes: raw.notes,
            status: raw.status,
            strength_meaning: raw.strength_meaning,
            highlightable: raw.highlightable,
            chamber: raw.chamber,
            groups: raw.groups,
            division_links: raw.division_links,
            agreement_links: raw.agreement_links,
        })
    }
}

impl Policy {
    /// Division links then agreement links.
    pub fn links(&self) -> impl Iterator<Item = &PolicyLink> {
        self.division_links.iter().chain(self.agreement_links.iter())
    }
}

/// Window of decision dates to compare over. Both ends inclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimePeriod {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl TimePeriod {
    pub fn all_time() -> Self {
        Self::default()
    }

    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |s| s <= date) && self.end.map_or(true, |e| date <= e)
    }

    /// Short description for output, e.g. "2019-2024" or "all time".
    pub fn description(&self) -> String {
        match (self.start, self.end) {
            (None, None) => "all time".to_string(),
            (Some(s), None) => format!("since {}", s.year()),
            (None, Some(e)) => format!("until {}", e.year()),
            (Some(s), Some(e)) => format!("{}-{}", s.year(), e.year()),
        }
    }
}
