use anyhow::Result;
use std::collections::HashSet;
use tracing::warn;

use super::types::{Policy, PolicyDirection};

/// Data hygiene problems in one policy definition.
///
/// None of these stop scoring: neutral and other-chamber links are skipped
/// and a repeated decision is counted once per link.
pub fn validate_policy(policy: &Policy) -> Vec<String> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for link in policy.links() {
        let key = link.key();
        if link.alignment == PolicyDirection::Neutral {
            errors.push(format!("policy {}: {} is neutral", policy.id, key));
        }
        if link.decision.chamber() != policy.chamber {
            errors.push(format!(
                "policy {}: {} is in {}, policy is in {}",
                policy.id,
                key,
                link.decision.chamber(),
                policy.chamber
            ));
        }
        if !seen.insert(key.clone()) {
            errors.push(format!("policy {}: {} is linked more than once", policy.id, key));
        }
    }

    errors
}

/// Check all policies as they are loaded.
///
/// Hygiene problems are logged. Only a policy id defined twice is an
/// error, since lookups and merged output rows are keyed on it.
pub fn validate_policies(policies: &[Policy]) -> Result<()> {
    let mut errors = Vec::new();
    let mut ids = HashSet::new();

    for policy in policies {
        if !ids.insert(policy.id) {
            errors.push(format!("policy {} is defined more than once", policy.id));
        }
        for problem in validate_policy(policy) {
            warn!("{}", problem);
        }
    }

    if !errors.is_empty() {
        anyhow::bail!("Invalid policy definitions:\n  - {}", errors.join("\n  - "));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(yaml_links: &str) -> Policy {
        let yaml = format!(
            "id: 5\nname: P\npolicy_description: d\nchamber: commons\ndivision_links:\n{}",
            yaml_links
        );
        serde_saphyr::from_str(&yaml).unwrap()
    }

    fn link(chamber: &str, number: u32, alignment: &str) -> String {
        format!(
            "  - decision:\n      chamber_slug: {}\n      date: 2020-01-01\n      division_number: {}\n    alignment: {}\n",
            chamber, number, alignment
        )
    }

    #[test]
    fn test_valid_policy() {
        let p = policy(&(link("commons", 1, "agree") + &link("commons", 2, "against")));
        assert!(validate_policy(&p).is_empty());
        assert!(validate_policies(&[p]).is_ok());
    }

    #[test]
    fn test_neutral_link_reported_but_loadable() {
        let p = policy(&link("commons", 1, "neutral"));
        let errors = validate_policy(&p);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("neutral"));
        assert!(validate_policies(&[p]).is_ok());
    }

    #[test]
    fn test_other_chamber_and_duplicate_collected() {
        let p = policy(&(link("lords", 1, "agree") + &link("commons", 2, "agree") + &link("commons", 2, "against")));
        let errors = validate_policy(&p);
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("lords"));
        assert!(errors[1].contains("more than once"));
        assert!(validate_policies(&[p]).is_ok());
    }

    #[test]
    fn test_duplicate_policy_ids() {
        let p = policy(&link("commons", 1, "agree"));
        let err = validate_policies(&[p.clone(), p]).unwrap_err();
        assert!(err.to_string().contains("defined more than once"));
    }
}
