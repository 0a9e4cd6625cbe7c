use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::scoring::{
    is_significant, similarity, verbose_score, ScoreError, ScoreFloatPair, VoteCategories,
};
use super::types::StrengthMeaning;
use crate::decisions::Chamber;

/// Vote counts for one person (or the comparison average) on one policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VoteDistribution {
    pub num_votes_same: f64,
    pub num_strong_votes_same: f64,
    pub num_votes_different: f64,
    pub num_strong_votes_different: f64,
    pub num_votes_absent: f64,
    pub num_strong_votes_absent: f64,
    pub num_votes_abstain: f64,
    pub num_strong_votes_abstain: f64,
    pub num_agreements_same: f64,
    pub num_strong_agreements_same: f64,
    pub num_agreements_different: f64,
    pub num_strong_agreements_different: f64,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
    pub distance_score: f64,
    pub similarity_score: f64,
}

impl VoteDistribution {
    /// Sum of the vote fields. Agreements are not votes.
    pub fn total_votes(&self) -> f64 {
        self.num_votes_same
            + self.num_strong_votes_same
            + self.num_votes_different
            + self.num_strong_votes_different
            + self.num_votes_absent
            + self.num_strong_votes_absent
            + self.num_votes_abstain
            + self.num_strong_votes_abstain
    }

    pub fn categories(&self) -> VoteCategories {
        VoteCategories {
            votes_same: ScoreFloatPair::new(self.num_votes_same, self.num_strong_votes_same),
            votes_different: ScoreFloatPair::new(
                self.num_votes_different,
                self.num_strong_votes_different,
            ),
            votes_absent: ScoreFloatPair::new(self.num_votes_absent, self.num_strong_votes_absent),
            votes_abstain: ScoreFloatPair::new(
                self.num_votes_abstain,
                self.num_strong_votes_abstain,
            ),
            agreements_same: ScoreFloatPair::new(
                self.num_agreements_same,
                self.num_strong_agreements_same,
            ),
            agreements_different: ScoreFloatPair::new(
                self.num_agreements_different,
                self.num_strong_agreements_different,
            ),
        }
    }

    /// A copy with distance and similarity filled in.
    pub fn score(&self, meaning: StrengthMeaning) -> Self {
        let distance = meaning.distance(&self.categories());
        Self {
            distance_score: distance,
            similarity_score: similarity(distance),
            ..self.clone()
        }
    }

    pub fn verbose_score(&self) -> Result<&'static str, ScoreError> {
        verbose_score(self.distance_score)
    }

    /// Widen the year range to cover `date`.
    pub fn include_year(&mut self, date: NaiveDate) {
        let year = date.year();
        self.start_year = Some(self.start_year.map_or(year, |y| y.min(year)));
        self.end_year = Some(self.end_year.map_or(year, |y| y.max(year)));
    }

    /// Every count with its field name, in declaration order.
    pub fn count_fields(&self) -> [(&'static str, f64); 12] {
        [
            ("num_votes_same", self.num_votes_same),
            ("num_strong_votes_same", self.num_strong_votes_same),
            ("num_votes_different", self.num_votes_different),
            ("num_strong_votes_different", self.num_strong_votes_different),
            ("num_votes_absent", self.num_votes_absent),
            ("num_strong_votes_absent", self.num_strong_votes_absent),
            ("num_votes_abstain", self.num_votes_abstain),
            ("num_strong_votes_abstain", self.num_strong_votes_abstain),
            ("num_agreements_same", self.num_agreements_same),
            ("num_strong_agreements_same", self.num_strong_agreements_same),
            ("num_agreements_different", self.num_agreements_different),
            (
                "num_strong_agreements_different",
                self.num_strong_agreements_different,
            ),
        ]
    }
}

/// Unscored distributions for one policy: the person's own and the comparison average.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyComparison {
    pub policy_id: u32,
    pub target: VoteDistribution,
    /// None when nobody else was eligible for any decision
    pub other: Option<VoteDistribution>,
}

/// How one person compares to a policy and to their party.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonPolicyLink {
    pub person_id: u32,
    pub policy_id: u32,
    pub comparison_party: String,
    pub chamber: Chamber,
    pub person_distance_from_policy: f64,
    pub person_distribution: VoteDistribution,
    pub comparison_distance_from_policy: f64,
    pub comparison_distribution: VoteDistribution,
    pub no_party_comparison: bool,
    pub significant_difference: bool,
    pub comparison_score_difference: f64,
}

impl PersonPolicyLink {
    pub fn from_comparison(
        person_id: u32,
        comparison_party: &str,
        chamber: Chamber,
        comparison: &PolicyComparison,
        meaning: StrengthMeaning,
    ) -> Self {
        let person_distribution = comparison.target.score(meaning);
        let (comparison_distribution, no_party_comparison) = match &comparison.other {
            Some(other) => (other.score(meaning), false),
            None => (person_distribution.clone(), true),
        };

        let own = person_distribution.distance_score;
        let other = comparison_distribution.distance_score;

        Self {
            person_id,
            policy_id: comparison.policy_id,
            comparison_party: comparison_party.to_string(),
            chamber,
            person_distance_from_policy: own,
            comparison_distance_from_policy: other,
            significant_difference: is_significant(own, other),
            comparison_score_difference: (own - other).abs(),
            person_distribution,
            comparison_distribution,
            no_party_comparison,
        }
    }

    /// Identifies a row for incremental merges.
    pub fn merge_key(&self) -> (u32, u32, String) {
        (self.person_id, self.policy_id, self.comparison_party.clone())
    }

    pub fn public_whip_person_id(&self) -> String {
        format!("uk.org.publicwhip/person/{}", self.person_id)
    }

    /// Flat row with just the headline numbers.
    pub fn reduced(&self) -> ReducedPersonPolicyLink {
        let d = &self.person_distribution;
        let count_absent = d.num_votes_absent + d.num_strong_votes_absent;
        ReducedPersonPolicyLink {
            person_id: self.public_whip_person_id(),
            policy_id: self.policy_id,
            comparison_party: self.comparison_party.clone(),
            chamber: self.chamber,
            person_distance_from_policy: self.person_distance_from_policy,
            comparison_distance_from_policy: self.comparison_distance_from_policy,
            count_present: d.total_votes() - count_absent,
            count_absent,
            start_year: d.start_year,
            end_year: d.end_year,
            no_party_comparison: self.no_party_comparison,
        }
    }

    /// Key/value pairs in the older Public Whip export layout.
    pub fn legacy_fields(&self) -> Vec<(String, String)> {
        let d = &self.person_distribution;
        let absent = d.num_votes_absent + d.num_strong_votes_absent;
        let abstain = d.num_votes_abstain + d.num_strong_votes_abstain;
        let both_voted = d.total_votes() - abstain - absent;
        let prefix = format!("public_whip_dreammp{}", self.policy_id);
        let year = |y: Option<i32>| y.map(|y| y.to_string()).unwrap_or_default();

        vec![
            ("person_id".to_string(), self.public_whip_person_id()),
            (
                format!("{}_distance", prefix),
                format!("{:.4}", self.person_distance_from_policy),
            ),
            (format!("{}_both_voted", prefix), format!("{:.4}", both_voted)),
            (format!("{}_absent", prefix), format!("{:.4}", absent)),
            (
                format!("{}_comparison_distance", prefix),
                format!("{:.4}", self.comparison_distance_from_policy),
            ),
            (
                format!("{}_comparison_score_diff", prefix),
                format!("{:.4}", self.comparison_score_difference),
            ),
            (
                format!("{}_comparison_significant", prefix),
                (self.significant_difference as u8).to_string(),
            ),
            (
                format!("{}_comparison_party", prefix),
                self.comparison_party.clone(),
            ),
            (
                format!("{}_no_party_comparison", prefix),
                (self.no_party_comparison as u8).to_string(),
            ),
            (format!("{}_start_year", prefix), year(d.start_year)),
            (format!("{}_end_year", prefix), year(d.end_year)),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReducedPersonPolicyLink {
    pub person_id: String,
    pub policy_id: u32,
    pub comparison_party: String,
    pub chamber: Chamber,
    pub person_distance_from_policy: f64,
    pub comparison_distance_from_policy: f64,
    pub count_present: f64,
    pub count_absent: f64,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
    pub no_party_comparison: bool,
}
