use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::types::{Membership, VotePosition, VoteRecord};

/// Tally of how a group of members voted in one division.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DivisionBreakdown {
    pub division_key: String,
    /// None for the whole chamber
    pub grouping: Option<String>,
    pub vote_participant_count: u32,
    pub for_motion: u32,
    pub against_motion: u32,
    pub neutral_motion: u32,
    /// Members who took a side (for + against)
    pub signed_votes: u32,
    pub motion_majority: i64,
    pub motion_majority_ratio: f64,
    /// 1 passed, -1 rejected, 0 tied
    pub motion_result_int: i8,
    pub total_possible_members: u32,
}

impl DivisionBreakdown {
    fn new(division_key: &str, grouping: Option<String>) -> Self {
        Self {
            division_key: division_key.to_string(),
            grouping,
            ..Default::default()
        }
    }

    fn add(&mut self, vote: VotePosition) {
        match vote.folded() {
            VotePosition::Aye => self.for_motion += 1,
            VotePosition::No => self.against_motion += 1,
            VotePosition::Abstention => self.neutral_motion += 1,
            VotePosition::Absent => {}
            // folded() never yields these
            VotePosition::Tellaye | VotePosition::Tellno | VotePosition::Both => {}
        }
    }

    fn finish(mut self) -> Self {
        self.vote_participant_count = self.for_motion + self.against_motion + self.neutral_motion;
        self.signed_votes = self.for_motion + self.against_motion;
        self.motion_majority = self.for_motion as i64 - self.against_motion as i64;
        self.motion_majority_ratio = if self.signed_votes == 0 {
            0.0
        } else {
            self.for_motion as f64 / self.signed_votes as f64
        };
        self.motion_result_int = self.motion_majority.signum() as i8;
        self
    }

    pub fn result_description(&self) -> &'static str {
        match self.motion_result_int {
            1 => "Passed",
            -1 => "Rejected",
            _ => "Tied",
        }
    }
}

/// Overall and per-party breakdowns for a single division.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DivisionBreakdowns {
    pub overall: DivisionBreakdown,
    pub parties: Vec<DivisionBreakdown>,
}

/// Build breakdowns from the division's votes and the memberships active on its date.
///
/// Voters with no active membership are grouped under "unknown". A person
/// with overlapping memberships counts for the one that started latest.
pub fn division_breakdowns(
    division_key: &str,
    votes: &[VoteRecord],
    members: &[&Membership],
) -> DivisionBreakdowns {
    let mut latest: HashMap<u32, &Membership> = HashMap::new();
    for &m in members {
        latest
            .entry(m.person_id)
            .and_modify(|current| {
                if (m.start_date, m.party.as_str()) > (current.start_date, current.party.as_str()) {
                    *current = m;
                }
            })
            .or_insert(m);
    }
    let party_of: HashMap<u32, &str> = latest
        .into_iter()
        .map(|(person_id, m)| (person_id, m.party.as_str()))
        .collect();

    let mut overall = DivisionBreakdown::new(division_key, None);
    overall.total_possible_members = party_of.len() as u32;

    let mut parties: BTreeMap<String, DivisionBreakdown> = BTreeMap::new();
    for party in party_of.values() {
        parties
            .entry(party.to_string())
            .or_insert_with(|| DivisionBreakdown::new(division_key, Some(party.to_string())))
            .total_possible_members += 1;
    }

    for vote in votes {
        overall.add(vote.vote);
        let party = party_of.get(&vote.person_id).copied().unwrap_or("unknown");
        parties
            .entry(party.to_string())
            .or_insert_with(|| DivisionBreakdown::new(division_key, Some(party.to_string())))
            .add(vote.vote);
    }

    DivisionBreakdowns {
        overall: overall.finish(),
        parties: parties.into_values().map(DivisionBreakdown::finish).collect(),
    }
}
