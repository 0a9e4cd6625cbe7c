use super::text::text_only;
use super::types::{DivisionInfo, PowersAnalysis, VoteMotionAnalysis, VoteType};

/// Phrases typical of motions that express an opinion rather than act.
const NON_ACTION_PHRASES: &[&str] = &[
    "believes",
    "regrets",
    "notes with approval",
    "expressed approval",
    "welcomes",
    "is concerned",
    "calls on the",
    "recognises",
    "takes note",
    "agrees with the government's decision",
    "agrees with the goverment's decision",
];

/// Any of these makes the motion an action, whatever else it says.
const ACTION_PHRASES: &[&str] = &[
    "orders that",
    "requires the government",
    "censures",
    "declines to give a second reading",
];

/// Below this many words the recorded motion text is not trusted.
const POOR_QUALITY_WORD_LIMIT: usize = 20;

/// Does the motion only express a view (believes, regrets, calls on the...)?
pub fn is_nonaction_vote(motion_text: &str) -> bool {
    let reduced = motion_text.to_lowercase();

    let mut score = NON_ACTION_PHRASES
        .iter()
        .filter(|phrase| reduced.contains(*phrase))
        .count();

    if ACTION_PHRASES.iter().any(|phrase| reduced.contains(phrase)) {
        score = 0;
    }

    score > 0
}

impl VoteMotionAnalysis {
    /// Only some vote types need their text checked; the rest act by construction.
    pub fn motion_uses_powers(&self) -> bool {
        match self.vote_type {
            VoteType::Adjournment | VoteType::Other | VoteType::GovernmentAgenda => {
                !is_nonaction_vote(&self.full_motion_speech)
            }
            VoteType::Amendment
            | VoteType::TenMinuteRule
            | VoteType::LordsAmendment
            | VoteType::FirstStage
            | VoteType::SecondStage
            | VoteType::CommitteeClause
            | VoteType::SecondStageCommittee
            | VoteType::ThirdStage
            | VoteType::ApproveStatutoryInstrument
            | VoteType::RevokeStatutoryInstrument
            | VoteType::TimetableChange
            | VoteType::HumbleAddress
            | VoteType::Confidence
            | VoteType::StandingOrderChange
            | VoteType::PrivateSitting
            | VoteType::EuDocumentScrutiny => true,
        }
    }
}

impl DivisionInfo {
    /// Plain-text motion, tags stripped.
    pub fn motion_text_only(&self) -> String {
        text_only(&self.motion)
    }

    /// Short motion text usually means the database holds a stub.
    pub fn poor_quality_motion_text(&self) -> bool {
        self.motion_text_only().split(' ').count() < POOR_QUALITY_WORD_LIMIT
    }

    pub fn vote_type(&self) -> Option<VoteType> {
        self.vote_motion_analysis.as_ref().map(|a| a.vote_type)
    }

    /// Combine the motion analysis, recorded motion and manual motion into a
    /// verdict on whether the vote exercises any power.
    pub fn motion_uses_powers(&self) -> PowersAnalysis {
        if let Some(analysis) = &self.vote_motion_analysis {
            let mut result = if analysis.motion_uses_powers() {
                PowersAnalysis::UsesPowers
            } else {
                PowersAnalysis::DoesNotUsePowers
            };

            if analysis.vote_type == VoteType::Amendment
                && !self.manual_motion.is_empty()
                && !self.poor_quality_motion_text()
            {
                result = if is_nonaction_vote(&self.motion) {
                    PowersAnalysis::DoesNotUsePowers
                } else {
                    PowersAnalysis::UsesPowers
                };
            }
            return result;
        }

        if self.manual_motion.is_empty() && self.motion.is_empty() {
            return PowersAnalysis::InsufficientInfo;
        }

        let has_manual = !self.manual_motion.is_empty();
        let motion_nonaction = is_nonaction_vote(&self.motion);
        let manual_nonaction = is_nonaction_vote(&self.manual_motion);

        match (self.poor_quality_motion_text(), has_manual) {
            // Recorded text is a stub: the manual motion alone decides
            (true, true) => {
                if manual_nonaction {
                    PowersAnalysis::DoesNotUsePowers
                } else {
                    PowersAnalysis::UsesPowers
                }
            }
            // A stub can show a non-action motion but never prove an action
            (true, false) => {
                if motion_nonaction {
                    PowersAnalysis::DoesNotUsePowers
                } else {
                    PowersAnalysis::InsufficientInfo
                }
            }
            (false, _) => {
                if motion_nonaction || manual_nonaction {
                    PowersAnalysis::DoesNotUsePowers
                } else {
                    PowersAnalysis::UsesPowers
                }
            }
        }
    }
}
