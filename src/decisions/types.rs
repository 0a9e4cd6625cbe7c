use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Legislatures we hold division data for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chamber {
    Commons,
    Lords,
    Scotland,
    Wales,
    Ni,
}

impl Chamber {
    pub fn slug(&self) -> &'static str {
        match self {
            Chamber::Commons => "commons",
            Chamber::Lords => "lords",
            Chamber::Scotland => "scotland",
            Chamber::Wales => "wales",
            Chamber::Ni => "ni",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Chamber::Commons => "House of Commons",
            Chamber::Lords => "House of Lords",
            Chamber::Scotland => "Scottish Parliament",
            Chamber::Wales => "Senedd",
            Chamber::Ni => "Northern Ireland Assembly",
        }
    }

    /// What members of this chamber are called, e.g. "MPs"
    pub fn member_name(&self) -> &'static str {
        match self {
            Chamber::Commons => "MPs",
            Chamber::Lords => "Lords",
            Chamber::Scotland => "MSPs",
            Chamber::Wales => "MSs",
            Chamber::Ni => "AMs",
        }
    }
}

impl fmt::Display for Chamber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Chamber {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "commons" => Ok(Chamber::Commons),
            "lords" => Ok(Chamber::Lords),
            "scotland" => Ok(Chamber::Scotland),
            "wales" => Ok(Chamber::Wales),
            "ni" => Ok(Chamber::Ni),
            other => anyhow::bail!("Unknown chamber '{}'", other),
        }
    }
}

/// A recorded position in a division, as it appears in source data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VotePosition {
    Aye,
    No,
    Abstention,
    Absent,
    Tellaye,
    Tellno,
    /// Member recorded on both sides
    Both,
}

impl VotePosition {
    /// Fold tellers into aye/no and split votes into abstention.
    pub fn folded(self) -> VotePosition {
        match self {
            VotePosition::Aye | VotePosition::Tellaye => VotePosition::Aye,
            VotePosition::No | VotePosition::Tellno => VotePosition::No,
            VotePosition::Abstention | VotePosition::Both => VotePosition::Abstention,
            VotePosition::Absent => VotePosition::Absent,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            VotePosition::Aye => "With motion",
            VotePosition::No => "Against motion",
            VotePosition::Abstention => "Abstention",
            VotePosition::Absent => "Absent",
            VotePosition::Tellaye => "With motion (Teller)",
            VotePosition::Tellno => "Against motion (Teller)",
            VotePosition::Both => "Abstention (voted both ways)",
        }
    }
}

/// Taxonomy of parliamentary questions. Not all of these are formal descriptions;
/// stages are used rather than readings so chambers line up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteType {
    Amendment,
    TenMinuteRule,
    /// The Commons responding to an amendment made in the Lords
    LordsAmendment,
    FirstStage,
    SecondStage,
    CommitteeClause,
    /// Approval of clauses in committee
    SecondStageCommittee,
    ThirdStage,
    ApproveStatutoryInstrument,
    RevokeStatutoryInstrument,
    Adjournment,
    /// Motions that take control of the order paper
    TimetableChange,
    HumbleAddress,
    /// Monarch's speech etc
    GovernmentAgenda,
    Confidence,
    StandingOrderChange,
    PrivateSitting,
    EuDocumentScrutiny,
    Other,
}

impl VoteType {
    pub fn slug(&self) -> &'static str {
        match self {
            VoteType::Amendment => "amendment",
            VoteType::TenMinuteRule => "ten_minute_rule",
            VoteType::LordsAmendment => "lords_amendment",
            VoteType::FirstStage => "first_stage",
            VoteType::SecondStage => "second_stage",
            VoteType::CommitteeClause => "committee_clause",
            VoteType::SecondStageCommittee => "second_stage_committee",
            VoteType::ThirdStage => "third_stage",
            VoteType::ApproveStatutoryInstrument => "approve_statutory_instrument",
            VoteType::RevokeStatutoryInstrument => "revoke_statutory_instrument",
            VoteType::Adjournment => "adjournment",
            VoteType::TimetableChange => "timetable_change",
            VoteType::HumbleAddress => "humble_address",
            VoteType::GovernmentAgenda => "government_agenda",
            VoteType::Confidence => "confidence",
            VoteType::StandingOrderChange => "standing_order_change",
            VoteType::PrivateSitting => "private_sitting",
            VoteType::EuDocumentScrutiny => "eu_document_scrutiny",
            VoteType::Other => "other",
        }
    }

    /// "second_stage_committee" -> "Second Stage Committee"
    pub fn display_name(&self) -> String {
        title_case(self.slug())
    }
}

/// Outcome of asking whether a motion exercises any real power.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowersAnalysis {
    UsesPowers,
    DoesNotUsePowers,
    InsufficientInfo,
}

impl PowersAnalysis {
    pub fn display_name(&self) -> String {
        match self {
            PowersAnalysis::UsesPowers => title_case("uses_powers"),
            PowersAnalysis::DoesNotUsePowers => title_case("does_not_use_powers"),
            PowersAnalysis::InsufficientInfo => title_case("insufficient_info"),
        }
    }
}

fn title_case(slug: &str) -> String {
    slug.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Pre-computed analysis of the motion behind a vote, keyed by debate GID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteMotionAnalysis {
    pub debate_type: String,
    pub gid: String,
    pub question: String,
    #[serde(default)]
    pub tidied_motion: Option<String>,
    pub full_motion_speech: String,
    #[serde(default)]
    pub full_motion_gid: Option<String>,
    pub vote_type: VoteType,
}

/// A recorded division with the text needed to analyse its motion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DivisionInfo {
    pub chamber: Chamber,
    pub date: NaiveDate,
    pub division_number: u32,
    pub division_name: String,
    /// Motion text as HTML-ish fragments
    #[serde(default)]
    pub motion: String,
    /// Hand-curated motion, empty when nobody has written one
    #[serde(default)]
    pub manual_motion: String,
    #[serde(default)]
    pub debate_gid: Option<String>,
    #[serde(default)]
    pub vote_motion_analysis: Option<VoteMotionAnalysis>,
}

impl DivisionInfo {
    /// "commons-2023-12-13-33"
    pub fn key(&self) -> String {
        division_key(self.chamber, self.date, self.division_number)
    }
}

/// A decision taken without a recorded vote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgreementInfo {
    pub chamber: Chamber,
    pub date: NaiveDate,
    /// TWFY speech reference minus the date, e.g. "a.974.1#g991.0"
    pub decision_ref: String,
    pub division_name: String,
    #[serde(default)]
    pub motion: String,
}

impl AgreementInfo {
    pub fn key(&self) -> String {
        agreement_key(self.chamber, self.date, &self.decision_ref)
    }

    /// Agreements never carry enough structure to judge.
    pub fn motion_uses_powers(&self) -> PowersAnalysis {
        PowersAnalysis::InsufficientInfo
    }
}

pub fn division_key(chamber: Chamber, date: NaiveDate, division_number: u32) -> String {
    format!("{}-{}-{}", chamber.slug(), date.format("%Y-%m-%d"), division_number)
}

pub fn agreement_key(chamber: Chamber, date: NaiveDate, decision_ref: &str) -> String {
    format!("{}-{}-{}", chamber.slug(), date.format("%Y-%m-%d"), decision_ref)
}

/// One person's position in one division.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub division_key: String,
    pub person_id: u32,
    pub vote: VotePosition,
}

/// Presence at an agreement implies collective participation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceRecord {
    pub agreement_key: String,
    pub person_id: u32,
}

/// A period during which a person sat in a chamber for a party.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Membership {
    pub person_id: u32,
    pub chamber: Chamber,
    pub party: String,
    pub start_date: NaiveDate,
    /// None while the membership is ongoing
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

impl Membership {
    /// Inclusive at both ends.
    pub fn active_on(&self, date: NaiveDate) -> bool {
        self.start_date <= date && self.end_date.map_or(true, |end| date <= end)
    }
}
