use super::types::VoteType;

/// How a rule's phrases must appear in the lowercased motion.
#[derive(Debug, Clone, Copy)]
enum Phrases {
    All(&'static [&'static str]),
    Any(&'static [&'static str]),
    /// Some phrase from each list
    AnyAndAny(&'static [&'static str], &'static [&'static str]),
    /// Some phrase from the first list, or every phrase of the second
    AnyOrAll(&'static [&'static str], &'static [&'static str]),
}

impl Phrases {
    fn matches(&self, text: &str) -> bool {
        match self {
            Phrases::All(items) => all_present(text, items),
            Phrases::Any(items) => any_present(text, items),
            Phrases::AnyAndAny(a, b) => any_present(text, a) && any_present(text, b),
            Phrases::AnyOrAll(a, b) => any_present(text, a) || all_present(text, b),
        }
    }
}

const SECOND_READING: &[&str] = &["second reading", "read a second time"];

/// Checked top to bottom, first match wins. Order is significant: a
/// statutory instrument motion also mentions amendments, a committee
/// clause vote also mentions a second reading.
const RULES: &[(Phrases, VoteType)] = &[
    (
        Phrases::All(&["be approved", "laid before this house"]),
        VoteType::ApproveStatutoryInstrument,
    ),
    (
        Phrases::All(&["be revoked", "laid before this house"]),
        VoteType::RevokeStatutoryInstrument,
    ),
    (
        Phrases::Any(&["makes provision as set out in this order"]),
        VoteType::TimetableChange,
    ),
    (
        Phrases::Any(&[
            "following standing order be made",
            "orders be standing orders of the house",
        ]),
        VoteType::StandingOrderChange,
    ),
    (Phrases::Any(&["first reading"]), VoteType::FirstStage),
    (
        Phrases::AnyAndAny(SECOND_READING, &["clause"]),
        VoteType::SecondStageCommittee,
    ),
    (
        Phrases::Any(&["clause stand part of the bill"]),
        VoteType::CommitteeClause,
    ),
    (
        Phrases::Any(&["third reading", "read a third time", "read the third time"]),
        VoteType::ThirdStage,
    ),
    (Phrases::Any(SECOND_READING), VoteType::SecondStage),
    (Phrases::All(&["standing order", "23"]), VoteType::TenMinuteRule),
    (Phrases::Any(&["do adjourn until"]), VoteType::Adjournment),
    (
        Phrases::AnyOrAll(
            &[
                "takes note of european union document",
                "takes note of european document",
                "takes note of draft european council decision",
            ],
            &["takes note of regulation", "of the european parliament"],
        ),
        VoteType::EuDocumentScrutiny,
    ),
    (Phrases::All(&["amendment", "lords"]), VoteType::LordsAmendment),
    (Phrases::Any(&["gracious speech"]), VoteType::GovernmentAgenda),
    (
        Phrases::Any(&["amendment", "clause be added to the bill"]),
        VoteType::Amendment,
    ),
    (
        Phrases::Any(&["humble address be presented"]),
        VoteType::HumbleAddress,
    ),
    (
        Phrases::Any(&["that the house sit in private"]),
        VoteType::PrivateSitting,
    ),
    (
        Phrases::All(&["confidence in", "government"]),
        VoteType::Confidence,
    ),
];

/// True if every item appears in `search`.
pub fn all_present(search: &str, items: &[&str]) -> bool {
    items.iter().all(|item| search.contains(item))
}

/// True if any item appears in `search`.
pub fn any_present(search: &str, items: &[&str]) -> bool {
    items.iter().any(|item| search.contains(item))
}

/// Classify free-form motion text. Never fails: unmatched text is `Other`.
pub fn categorise_motion(motion: &str) -> VoteType {
    let lowered = motion.to_lowercase();
    RULES
        .iter()
        .find(|(phrases, _)| phrases.matches(&lowered))
        .map(|(_, vote_type)| *vote_type)
        .unwrap_or(VoteType::Other)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_type(motions: &[&str], expected: VoteType) {
        for motion in motions {
            assert_eq!(
                categorise_motion(motion),
                expected,
                "Motion {} should be {:?}",
                motion,
                expected
            );
        }
    }

    #[test]
    fn test_ten_minute_rule() {
        assert_type(
            &["Question put (Standing Order No. 23)."],
            VoteType::TenMinuteRule,
        );
    }

    #[test]
    fn test_statutory_instrument() {
        assert_type(
            &["That the draft Postal Packets (Miscellaneous Amendments) Regulations 2023, which were laid before this House on 29 June, be approved.\u{2014}(Mike Wood.)"],
            VoteType::ApproveStatutoryInstrument,
        );
    }

    #[test]
    fn test_revoke_statutory_instrument() {
        assert_type(
            &["That the Regulations, which were laid before this House on 3 May, be revoked."],
            VoteType::RevokeStatutoryInstrument,
        );
    }

    #[test]
    fn test_humble_address() {
        assert_type(
            &["That an humble Address be presented to His Majesty, that he will be graciously pleased to give directions that the Secretary of State provide all papers relating to the review."],
            VoteType::HumbleAddress,
        );
    }

    #[test]
    fn test_lords_amendment() {
        assert_type(
            &["Motion made, and Question put, That this House disagrees with Lords amendment 23.\u{2014}(Robert Jenrick.)"],
            VoteType::LordsAmendment,
        );
    }

    #[test]
    fn test_standing_order_change_beats_later_rules() {
        // Mentions a Second Reading and an amendment as well.
        let motion = "That the Committee treats the principle of the Bill, as determined by the House on the Bill\u{2019}s Second Reading, as settled. \
            That these Orders be Standing Orders of the House.\u{2014}(Felicity Buchan.) \
            Amendment proposed: (a), to leave out from \u{201c}memorial\u{201d}. \
            Question put, That the amendment be made.";
        assert_type(&[motion], VoteType::StandingOrderChange);
    }

    #[test]
    fn test_third_reading() {
        assert_type(
            &["I beg to move, That the Bill be now read the Third time."],
            VoteType::ThirdStage,
        );
    }

    #[test]
    fn test_second_stage_committee() {
        assert_type(
            &["Question put, That the clause be read a Second time."],
            VoteType::SecondStageCommittee,
        );
    }

    #[test]
    fn test_second_reading() {
        assert_type(
            &["I beg to move, That the Bill be now read a Second time."],
            VoteType::SecondStage,
        );
    }

    #[test]
    fn test_amendment() {
        assert_type(&["Question put, That the amendment be made."], VoteType::Amendment);
    }

    #[test]
    fn test_gracious_speech() {
        assert_type(
            &["at the end of the Question to add: \u{201c}but respectfully regret that the Gracious Speech fails to mention\u{201d}"],
            VoteType::GovernmentAgenda,
        );
    }

    #[test]
    fn test_eu_scrutiny_all_branch() {
        assert_type(
            &["That this House takes note of Regulation 2019/1 of the European Parliament and of the Council."],
            VoteType::EuDocumentScrutiny,
        );
    }

    #[test]
    fn test_confidence() {
        assert_type(
            &["That this House has no confidence in His Majesty's Government."],
            VoteType::Confidence,
        );
    }

    #[test]
    fn test_no_match_is_other() {
        assert_type(&["That this House welcomes the weather.", ""], VoteType::Other);
    }

    #[test]
    fn test_instrument_rule_checked_before_amendment() {
        let motion = "That the draft Amendment Regulations, laid before this House on 1 May, be approved.";
        assert_eq!(categorise_motion(motion), VoteType::ApproveStatutoryInstrument);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(
            categorise_motion("THAT THE HOUSE SIT IN PRIVATE."),
            VoteType::PrivateSitting
        );
    }
}
