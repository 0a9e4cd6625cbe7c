//! Distance scores between a voting record and a policy position.
//!
//! A score of 0 means the record fully agrees with the policy, 1 means it
//! fully disagrees. [`NO_DATA`] (-1) means no decision carried any weight.
//! Counts are floats because comparison-party counts are per-division
//! fractions.

use thiserror::Error;

use super::types::StrengthMeaning;

/// Sentinel distance when there were no available points.
pub const NO_DATA: f64 = -1.0;

/// Below this a record is clearly for the policy.
pub const CLEARLY_FOR: f64 = 0.4;
/// Above this a record is clearly against the policy.
pub const CLEARLY_AGAINST: f64 = 0.6;

#[derive(Debug, Error, PartialEq)]
pub enum ScoreError {
    #[error("Score {0} is not a distance: must be in [0, 1] or -1")]
    OutOfRange(f64),
}

/// A count split by decision strength.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoreFloatPair {
    pub weak: f64,
    pub strong: f64,
}

impl ScoreFloatPair {
    pub fn new(weak: f64, strong: f64) -> Self {
        Self { weak, strong }
    }

    pub fn total(&self) -> f64 {
        self.weak + self.strong
    }
}

/// The six inputs every scoring function takes.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VoteCategories {
    pub votes_same: ScoreFloatPair,
    pub votes_different: ScoreFloatPair,
    pub votes_absent: ScoreFloatPair,
    pub votes_abstain: ScoreFloatPair,
    pub agreements_same: ScoreFloatPair,
    pub agreements_different: ScoreFloatPair,
}

pub trait DistanceScore {
    /// Distance in [0, 1], or [`NO_DATA`].
    fn score(&self, categories: &VoteCategories) -> f64;
}

fn ratio(points: f64, available: f64) -> f64 {
    if available == 0.0 {
        NO_DATA
    } else {
        points / available
    }
}

/// The classic Public Whip calculation.
///
/// Absences cost a little, so rarely-present members are not punished as
/// hard as naive averaging would. Abstentions count as absences and
/// agreements count as votes.
#[derive(Debug, Clone, Copy, Default)]
pub struct PublicWhipScore;

impl PublicWhipScore {
    const VOTE_WEIGHT: f64 = 10.0;
    const STRONG_VOTE_WEIGHT: f64 = 50.0;
    const ABSENCE_POINTS: f64 = 1.0;
    const ABSENCE_AVAILABLE: f64 = 2.0;
    const STRONG_ABSENCE_POINTS: f64 = 25.0;
    const STRONG_ABSENCE_AVAILABLE: f64 = 50.0;
}

impl DistanceScore for PublicWhipScore {
    fn score(&self, c: &VoteCategories) -> f64 {
        let same = ScoreFloatPair::new(
            c.votes_same.weak + c.agreements_same.weak,
            c.votes_same.strong + c.agreements_same.strong,
        );
        let different = ScoreFloatPair::new(
            c.votes_different.weak + c.agreements_different.weak,
            c.votes_different.strong + c.agreements_different.strong,
        );
        let absent = ScoreFloatPair::new(
            c.votes_absent.weak + c.votes_abstain.weak,
            c.votes_absent.strong + c.votes_abstain.strong,
        );

        let points = Self::VOTE_WEIGHT * different.weak
            + Self::STRONG_VOTE_WEIGHT * different.strong
            + Self::ABSENCE_POINTS * absent.weak
            + Self::STRONG_ABSENCE_POINTS * absent.strong;

        let available = Self::VOTE_WEIGHT * (same.weak + different.weak)
            + Self::STRONG_VOTE_WEIGHT * (same.strong + different.strong)
            + Self::STRONG_ABSENCE_AVAILABLE * absent.strong
            + Self::ABSENCE_AVAILABLE * absent.weak;

        ratio(points, available)
    }
}

/// Only strong decisions count. Absences are ignored and an abstention is
/// half marks.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimplifiedScore;

impl SimplifiedScore {
    const WEAK_WEIGHT: f64 = 0.0;
    const STRONG_WEIGHT: f64 = 10.0;
    const ABSENCE_WEIGHT: f64 = 0.0;
}

impl DistanceScore for SimplifiedScore {
    fn score(&self, c: &VoteCategories) -> f64 {
        let weak = Self::WEAK_WEIGHT;
        let strong = Self::STRONG_WEIGHT;
        let absent = Self::ABSENCE_WEIGHT;

        // Weak and absent terms are zero-weighted but kept so every input is accounted for
        let points = weak * c.votes_different.weak
            + strong * c.votes_different.strong
            + (weak / 2.0) * c.votes_abstain.weak
            + (strong / 2.0) * c.votes_abstain.strong
            + absent * c.votes_absent.total()
            + weak * c.agreements_different.weak
            + strong * c.agreements_different.strong;

        let available = weak * (c.votes_same.weak + c.votes_different.weak)
            + strong * (c.votes_same.strong + c.votes_different.strong)
            + weak * c.votes_abstain.weak
            + strong * c.votes_abstain.strong
            + absent * c.votes_absent.total()
            + weak * (c.agreements_same.weak + c.agreements_different.weak)
            + strong * (c.agreements_same.strong + c.agreements_different.strong);

        ratio(points, available)
    }
}

impl StrengthMeaning {
    pub fn distance(&self, categories: &VoteCategories) -> f64 {
        match self {
            StrengthMeaning::Classic => PublicWhipScore.score(categories),
            StrengthMeaning::Simplified => SimplifiedScore.score(categories),
        }
    }
}

/// 1 - distance, keeping the no-data sentinel.
pub fn similarity(distance: f64) -> f64 {
    if distance == NO_DATA {
        NO_DATA
    } else {
        1.0 - distance
    }
}

/// Human label for a distance score.
pub fn verbose_score(distance: f64) -> Result<&'static str, ScoreError> {
    if distance == NO_DATA {
        return Ok("No data available");
    }
    let label = match distance {
        d if (0.0..=0.05).contains(&d) => "Consistently voted for",
        d if d > 0.05 && d <= 0.15 => "Almost always voted for",
        d if d > 0.15 && d <= 0.4 => "Generally voted for",
        d if d > 0.4 && d <= 0.6 => "Voted a mixture of for and against",
        d if d > 0.6 && d <= 0.85 => "Generally voted against",
        d if d > 0.85 && d <= 0.95 => "Almost always voted against",
        d if d > 0.95 && d <= 1.0 => "Consistently voted against",
        d => return Err(ScoreError::OutOfRange(d)),
    };
    Ok(label)
}

/// A member clearly on one side while the comparison is clearly on the other.
///
/// Applied to raw distances, so a [`NO_DATA`] side counts as below
/// [`CLEARLY_FOR`].
pub fn is_significant(own: f64, other: f64) -> bool {
    (own < CLEARLY_FOR && other > CLEARLY_AGAINST) || (own > CLEARLY_AGAINST && other < CLEARLY_FOR)
}
