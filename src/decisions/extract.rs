//! Find the motion a division actually voted on, given the speeches of its debate.
//!
//! A debate can hold several motions (a motion and amendments to it), and the
//! question put immediately before the division is usually the best clue to
//! which one is being decided. The question is classified, candidate motions
//! that classify the same way are kept, and ties fall back to the question
//! itself or to the first candidate. That last fallback can pick the wrong
//! motion when a debate has several amendments.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::motion::categorise_motion;
use super::text::{item_in_isolation, paragraphs, text_only};
use super::types::{VoteMotionAnalysis, VoteType};

/// Phrases that introduce a motion.
pub const MOTION_PHRASES: &[&str] = &["I beg to move", "Moved by Lord", "Amendment proposed:"];

/// Phrases found in the speech that puts the question.
pub const QUESTION_PHRASES: &[&str] = &[
    "Question put",
    "put the Question",
    "The House proceeded to a Division",
    "put forthwith the Question",
    "be approved",
    "do adjourn until",
    "Amendment proposed",
];

/// How many speeches before the vote to search for the question.
const QUESTION_LOOKBACK: usize = 3;

/// Bodies shorter than this are taken whole as the tidied motion.
const SHORT_BODY_CHARS: usize = 1000;

/// A first paragraph must be longer than this to stand in for the motion.
const MIN_FIRST_PARAGRAPH_CHARS: usize = 50;

/// One unit of transcript, as served by the debates API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Speech {
    pub gid: String,
    pub body: String,
}

/// The vote speech and the debate it sits in.
#[derive(Debug, Clone, PartialEq)]
pub struct VoteLocation {
    pub vote: Speech,
    pub debate: Speech,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MotionExtraction {
    pub gid: String,
    pub question: String,
    pub motion_speech: Speech,
    pub tidied_motion: Option<String>,
    pub vote_type: VoteType,
}

impl MotionExtraction {
    pub fn to_analysis(&self, debate_type: &str) -> VoteMotionAnalysis {
        VoteMotionAnalysis {
            debate_type: debate_type.to_string(),
            gid: self.gid.clone(),
            question: self.question.clone(),
            tidied_motion: self.tidied_motion.clone(),
            full_motion_speech: self.motion_speech.body.clone(),
            full_motion_gid: Some(self.motion_speech.gid.clone()),
            vote_type: self.vote_type,
        }
    }
}

/// Drop the a/b/c/d revision letter after the date part of a GID.
pub fn revision_agnostic_gid(gid: &str) -> String {
    let mut parts: Vec<String> = gid.split('.').map(str::to_string).collect();
    if let Some(first) = parts.first_mut() {
        if first.ends_with(|c: char| matches!(c, 'a'..='d')) {
            first.pop();
        }
    }
    parts.join(".")
}

/// Split the speeches around a vote GID into the vote itself and its parent debate.
pub fn locate_vote(speeches: &[Speech], gid: &str) -> Result<VoteLocation> {
    if speeches.len() < 2 {
        bail!("Expected at least 2 items, got {}", speeches.len());
    }
    let target = revision_agnostic_gid(gid);
    let (votes, debates): (Vec<&Speech>, Vec<&Speech>) = speeches
        .iter()
        .partition(|s| revision_agnostic_gid(&s.gid) == target);

    if votes.len() != 1 {
        bail!("Expected 1 vote, got {}", votes.len());
    }
    let Some(debate) = debates.last() else {
        bail!("Expected at least one debate, got 0");
    };

    Ok(VoteLocation {
        vote: votes[0].clone(),
        debate: (*debate).clone(),
    })
}

/// Work out which motion the vote at `vote_gid` decided.
pub fn extract_motion(debate: &[Speech], vote_gid: &str) -> Result<MotionExtraction> {
    let Some(vote_index) = debate.iter().position(|s| s.gid == vote_gid) else {
        bail!("Vote {} not found among {} speeches", vote_gid, debate.len());
    };

    // The question is put in one of the few speeches before the vote
    let question_speech = (0..=QUESTION_LOOKBACK)
        .filter_map(|offset| vote_index.checked_sub(offset))
        .map(|i| &debate[i])
        .find(|s| QUESTION_PHRASES.iter().any(|p| s.body.contains(p)));

    let question_speech = match question_speech {
        Some(s) => s,
        None => {
            // Deferred divisions often lack a question; use the preceding speech
            debug!("No question phrase found, using speech before vote");
            let Some(i) = vote_index.checked_sub(1) else {
                bail!("Vote {} has no preceding speech", vote_gid);
            };
            &debate[i]
        }
    };

    let question = item_in_isolation(&question_speech.body, QUESTION_PHRASES);
    let question_type = categorise_motion(&question);

    let motion_speeches: Vec<&Speech> = debate
        .iter()
        .filter(|s| MOTION_PHRASES.iter().any(|p| s.body.contains(p)))
        .collect();
    debug!("{} speeches with motions", motion_speeches.len());

    // Several motions: keep those that agree with the question's type
    let candidates: Vec<&Speech> = if motion_speeches.len() > 1 {
        motion_speeches
            .into_iter()
            .filter(|s| categorise_motion(&item_in_isolation(&s.body, MOTION_PHRASES)) == question_type)
            .collect()
    } else {
        motion_speeches
    };

    let motion_speech = match candidates.as_slice() {
        [] => question_speech,
        [only] => *only,
        [first, ..] => {
            if item_in_isolation(&question_speech.body, MOTION_PHRASES).is_empty() {
                *first
            } else {
                debug!("Multiple motions, using question as motion");
                question_speech
            }
        }
    };

    let mut vote_type = categorise_motion(&motion_speech.body);
    if vote_type == VoteType::Other {
        vote_type = question_type;
    }

    Ok(MotionExtraction {
        gid: vote_gid.to_string(),
        question,
        motion_speech: motion_speech.clone(),
        tidied_motion: tidy_motion(&motion_speech.body),
        vote_type,
    })
}

/// Resolve the vote among the speeches around its GID, then find its motion
/// in the full debate.
///
/// `context` is what a lookup on the vote GID returns: the vote itself plus
/// its parent headings. The vote's GID there may carry a newer revision
/// letter than the one asked for.
pub fn analyse_vote(context: &[Speech], debate: &[Speech], gid: &str) -> Result<MotionExtraction> {
    let location = locate_vote(context, gid)?;
    debug!("Vote {} sits under {}", location.vote.gid, location.debate.gid);
    extract_motion(debate, &location.vote.gid)
}

/// Best-effort readable version of the motion.
pub fn tidy_motion(body: &str) -> Option<String> {
    if let Some(indent) = motion_indent_in_isolation(body) {
        return Some(indent);
    }
    if body.chars().count() < SHORT_BODY_CHARS {
        return Some(text_only(body));
    }

    let ps = paragraphs(body);

    // Walk backwards: the amendment text precedes "Question put"
    let mut pay_attention = false;
    for p in ps.iter().rev() {
        if pay_attention && p.text.contains("Amendment proposed") {
            return Some(p.text.clone());
        }
        if p.text.contains("Question put") {
            pay_attention = true;
        }
    }

    ps.first()
        .filter(|p| p.text.chars().count() > MIN_FIRST_PARAGRAPH_CHARS)
        .map(|p| p.text.clone())
}

/// The indented paragraph straight after the motion phrase, if that is how it was laid out.
fn motion_indent_in_isolation(body: &str) -> Option<String> {
    let mut motion_started = false;
    for p in paragraphs(body) {
        if motion_started {
            return p.has_class("indent").then_some(p.text);
        }
        if MOTION_PHRASES.iter().any(|phrase| p.text.contains(phrase)) {
            motion_started = true;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn speech(gid: &str, body: &str) -> Speech {
        Speech {
            gid: gid.to_string(),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_revision_agnostic_gid() {
        assert_eq!(revision_agnostic_gid("2023-12-13b.100.2"), "2023-12-13.100.2");
        assert_eq!(revision_agnostic_gid("2023-12-13.100.2"), "2023-12-13.100.2");
    }

    #[test]
    fn test_locate_vote_ignores_revision() {
        let speeches = vec![
            speech("2023-12-13a.90.0", "Debate heading"),
            speech("2023-12-13b.100.2", "Division"),
        ];
        let loc = locate_vote(&speeches, "2023-12-13a.100.2").unwrap();
        assert_eq!(loc.vote.gid, "2023-12-13b.100.2");
        assert_eq!(loc.debate.gid, "2023-12-13a.90.0");
    }

    #[test]
    fn test_analyse_vote_resolves_revision_and_builds_record() {
        let context = vec![
            speech("2023-12-13b.1.0", "Rwanda Bill"),
            speech("2023-12-13b.1.4", "<p>The House divided.</p>"),
        ];
        let debate = vec![
            speech("2023-12-13b.1.1", "<p>I beg to move,</p><p class=\"indent\">That the Bill be now read a Second time.</p>"),
            speech("2023-12-13b.1.3", "<p>Question put.</p>"),
            speech("2023-12-13b.1.4", "<p>The House divided.</p>"),
        ];

        let extraction = analyse_vote(&context, &debate, "2023-12-13a.1.4").unwrap();
        assert_eq!(extraction.gid, "2023-12-13b.1.4");
        assert_eq!(extraction.vote_type, VoteType::SecondStage);

        let analysis = extraction.to_analysis("commons");
        assert_eq!(analysis.debate_type, "commons");
        assert_eq!(analysis.gid, "2023-12-13b.1.4");
        assert_eq!(analysis.full_motion_gid.as_deref(), Some("2023-12-13b.1.1"));
        assert_eq!(
            analysis.tidied_motion.as_deref(),
            Some("That the Bill be now read a Second time.")
        );
    }

    #[test]
    fn test_analyse_vote_without_vote_in_context() {
        let context = vec![speech("g.0", "Heading"), speech("g.1", "Other")];
        assert!(analyse_vote(&context, &[], "g.9").is_err());
    }

    #[test]
    fn test_locate_vote_requires_two_items() {
        assert!(locate_vote(&[speech("a.1", "x")], "a.1").is_err());
    }

    #[test]
    fn test_single_motion_is_used() {
        let debate = vec![
            speech("g.1", "<p>I beg to move,</p><p class=\"indent\">That the Bill be now read a Second time.</p>"),
            speech("g.2", "<p>Speech in favour.</p>"),
            speech("g.3", "<p>Question put.</p>"),
            speech("g.4", "<p>The House divided.</p>"),
        ];
        let result = extract_motion(&debate, "g.4").unwrap();
        assert_eq!(result.motion_speech.gid, "g.1");
        assert_eq!(result.question, "Question put.");
        assert_eq!(result.vote_type, VoteType::SecondStage);
        assert_eq!(
            result.tidied_motion.as_deref(),
            Some("That the Bill be now read a Second time.")
        );
    }

    #[test]
    fn test_motion_matching_question_type_chosen() {
        let debate = vec![
            speech("g.1", "<p>I beg to move, That the Bill be now read a Second time.</p>"),
            speech("g.2", "<p>Amendment proposed: at the end to add an amendment.</p>"),
            speech("g.3", "<p>Question put, That the amendment be made.</p>"),
            speech("g.4", "<p>The House divided.</p>"),
        ];
        let result = extract_motion(&debate, "g.4").unwrap();
        assert_eq!(result.motion_speech.gid, "g.2");
        assert_eq!(result.vote_type, VoteType::Amendment);
    }

    #[test]
    fn test_no_question_uses_previous_speech() {
        let debate = vec![
            speech("g.1", "<p>Deferred division on the regulations.</p>"),
            speech("g.2", "<p>The House divided.</p>"),
        ];
        let result = extract_motion(&debate, "g.2").unwrap();
        assert_eq!(result.motion_speech.gid, "g.1");
        assert_eq!(result.vote_type, VoteType::Other);
    }

    #[test]
    fn test_several_matching_motions_fall_back_to_first() {
        let debate = vec![
            speech("g.1", "<p>Amendment proposed: (a), leave out line 1.</p>"),
            speech("g.2", "<p>Amendment proposed: (b), leave out line 2.</p>"),
            speech("g.3", "<p>Question put, That the amendment be made.</p>"),
            speech("g.4", "<p>Division.</p>"),
        ];
        let result = extract_motion(&debate, "g.4").unwrap();
        assert_eq!(result.motion_speech.gid, "g.1");
    }

    #[test]
    fn test_missing_vote_is_error() {
        let debate = vec![speech("g.1", "<p>Hello</p>")];
        assert!(extract_motion(&debate, "g.9").is_err());
    }

    #[test]
    fn test_tidy_long_body_uses_amendment_before_question() {
        let filler = "x".repeat(1200);
        let body = format!(
            "<p>{}</p><p>Amendment proposed: leave out clause 3.</p><p>Question put, That the amendment be made.</p>",
            filler
        );
        assert_eq!(
            tidy_motion(&body).as_deref(),
            Some("Amendment proposed: leave out clause 3.")
        );
    }

    #[test]
    fn test_tidy_long_body_first_paragraph() {
        let filler = "y".repeat(1200);
        let body = format!("<p>{}</p><p>Other.</p>", filler);
        assert_eq!(tidy_motion(&body), Some(filler));
    }
}
