pub mod aggregate;
pub mod distribution;
pub mod report;
pub mod scoring;
pub mod types;
pub mod validation;
pub mod validator;

pub use aggregate::{person_policy_links, policy_comparisons};
pub use distribution::{PersonPolicyLink, PolicyComparison, ReducedPersonPolicyLink, VoteDistribution};
pub use report::{policy_report, IssueType, LinkIssue, PolicyReport};
pub use scoring::{
    is_significant, verbose_score, DistanceScore, PublicWhipScore, ScoreError, ScoreFloatPair,
    SimplifiedScore, VoteCategories, NO_DATA,
};
pub use types::{
    DecisionRef, DecisionType, LinkError, LinkStatus, PartialDecision, Policy, PolicyDirection,
    PolicyLink, PolicyStatus, PolicyStrength, StrengthMeaning, TimePeriod,
};
pub use validation::{validate_policies, validate_policy};
pub use validator::{
    check_links, compare_distributions, validate_approach, validate_comparison, LinkValidation,
    DEFAULT_TOLERANCE,
};
