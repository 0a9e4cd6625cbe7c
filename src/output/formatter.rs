use owo_colors::OwoColorize;
use std::io::IsTerminal;
use std::time::Duration;
use terminal_size::{terminal_size, Width};

use crate::decisions::{DivisionBreakdown, DivisionBreakdowns, DivisionInfo, PowersAnalysis, VoteType};
use crate::policies::{verbose_score, LinkValidation, PersonPolicyLink, PolicyReport, NO_DATA};

/// A link with the name of its policy, for display
pub struct NamedLink<'a> {
    pub policy_name: &'a str,
    pub link: &'a PersonPolicyLink,
}

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate a name to fit available width, accounting for Unicode
fn truncate_name(name: &str, max_width: usize) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.len() <= max_width {
        name.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

/// Distance as a percentage, "-" when there is no data
pub fn format_distance(distance: f64) -> String {
    if distance == NO_DATA {
        "-".to_string()
    } else {
        format!("{:.0}%", distance * 100.0)
    }
}

/// Elapsed time for verbose summaries, to millisecond precision
pub fn format_elapsed(elapsed: Duration) -> String {
    let millis = Duration::from_millis(elapsed.as_millis() as u64);
    humantime::format_duration(millis).to_string()
}

fn label(distance: f64) -> &'static str {
    verbose_score(distance).unwrap_or("Invalid score")
}

/// Format links as a table: policy id, own distance, party distance, flag, policy name
/// Significant differences are marked with "!"
pub fn format_links_table(links: &[NamedLink], use_colors: bool) -> String {
    if links.is_empty() {
        return "No policy links found.".to_string();
    }

    let term_width = get_terminal_width();
    let id_width = 6;
    let score_width = 5;
    let separator = "  ";
    let fixed_width = id_width + (score_width + separator.len()) * 2 + 1 + separator.len();

    links
        .iter()
        .map(|named| {
            let link = named.link;
            let id_str = format!("{:>width$}", link.policy_id, width = id_width);
            let own = format!("{:>width$}", format_distance(link.person_distance_from_policy), width = score_width);
            let other = if link.no_party_comparison {
                format!("{:>width$}", "n/a", width = score_width)
            } else {
                format!("{:>width$}", format_distance(link.comparison_distance_from_policy), width = score_width)
            };
            let flag = if link.significant_difference { "!" } else { " " };

            let name = match term_width {
                Some(width) if width > fixed_width + 10 => truncate_name(named.policy_name, width - fixed_width),
                Some(_) => truncate_name(named.policy_name, 20),
                None => named.policy_name.to_string(),
            };

            if use_colors {
                format!(
                    "{}{}{}{}{}{}{}{}",
                    id_str.dimmed(),
                    separator,
                    own.bold(),
                    separator,
                    other,
                    flag.red(),
                    separator,
                    name
                )
            } else {
                format!(
                    "{}{}{}{}{}{}{}{}",
                    id_str, separator, own, separator, other, flag, separator, name
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Multi-line detail for one link (for verbose mode)
pub fn format_link_detail(named: &NamedLink, use_colors: bool) -> String {
    let link = named.link;
    let own = &link.person_distribution;
    let comparison = if link.no_party_comparison {
        format!("no other {} members to compare", link.comparison_party)
    } else {
        format!(
            "{} ({})",
            format_distance(link.comparison_distance_from_policy),
            label(link.comparison_distance_from_policy)
        )
    };
    let years = match (own.start_year, own.end_year) {
        (Some(s), Some(e)) if s == e => s.to_string(),
        (Some(s), Some(e)) => format!("{}-{}", s, e),
        _ => "-".to_string(),
    };

    let title = format!("{} (policy {})", named.policy_name, link.policy_id);
    let title = if use_colors { title.bold().to_string() } else { title };
    format!(
        "{}\n  Person: {} ({})\n  Party {}: {}\n  Votes: {} same, {} different, {} absent, {} abstain (strong {}/{}/{}/{})\n  Agreements: {} same, {} different\n  Years: {}\n  Significant: {}",
        title,
        format_distance(link.person_distance_from_policy),
        label(link.person_distance_from_policy),
        link.comparison_party,
        comparison,
        own.num_votes_same,
        own.num_votes_different,
        own.num_votes_absent,
        own.num_votes_abstain,
        own.num_strong_votes_same,
        own.num_strong_votes_different,
        own.num_strong_votes_absent,
        own.num_strong_votes_abstain,
        own.num_agreements_same + own.num_strong_agreements_same,
        own.num_agreements_different + own.num_strong_agreements_different,
        years,
        if link.significant_difference { "yes" } else { "no" },
    )
}

/// Legacy key/value export, tab-separated for scripting
pub fn format_legacy_tsv(links: &[&PersonPolicyLink]) -> String {
    links
        .iter()
        .flat_map(|link| link.legacy_fields())
        .map(|(key, value)| format!("{}\t{}", key, value))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format policy reports, only listing policies with issues
pub fn format_reports(reports: &[PolicyReport], use_colors: bool) -> String {
    let with_issues: Vec<_> = reports.iter().filter(|r| r.has_issues()).collect();
    if with_issues.is_empty() {
        return format!("No issues in {} policies.", reports.len());
    }

    with_issues
        .iter()
        .map(|report| {
            let mut lines = vec![if use_colors {
                format!("{} {}", report.policy_id.to_string().dimmed(), report.name.bold())
            } else {
                format!("{} {}", report.policy_id, report.name)
            }];
            for issue in &report.policy_issues {
                lines.push(format!("  {}", issue));
            }
            for issue in &report.link_issues {
                lines.push(format!(
                    "  {}: {} {} ({})",
                    issue.issue,
                    issue.decision_key,
                    issue.division_name,
                    issue.powers.display_name()
                ));
            }
            for issue in &report.definition_issues {
                lines.push(format!("  definition: {}", issue));
            }
            lines.join("\n")
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Summary line plus one block per failed check
pub fn format_validation(results: &[LinkValidation], use_colors: bool) -> String {
    let failed: Vec<_> = results.iter().filter(|r| !r.is_ok()).collect();
    let summary = format!("{} checked, {} mismatched", results.len(), failed.len());
    let summary = match (use_colors, failed.is_empty()) {
        (true, true) => summary.green().to_string(),
        (true, false) => summary.red().to_string(),
        (false, _) => summary,
    };

    let mut lines = vec![summary];
    for result in failed {
        lines.push(format!(
            "person {} policy {} vs {}:",
            result.person_id, result.policy_id, result.comparison_party
        ));
        for mismatch in &result.mismatches {
            lines.push(format!("  {}", mismatch));
        }
    }
    lines.join("\n")
}

fn breakdown_line(name: &str, b: &DivisionBreakdown) -> String {
    format!(
        "{:<28} {:>4} for {:>4} against {:>4} neutral  of {:>4}",
        truncate_name(name, 28),
        b.for_motion,
        b.against_motion,
        b.neutral_motion,
        b.total_possible_members
    )
}

/// Overall result then one line per party
pub fn format_breakdown(division: &DivisionInfo, breakdowns: &DivisionBreakdowns, use_colors: bool) -> String {
    let overall = &breakdowns.overall;
    let result = overall.result_description();
    let result = if use_colors {
        match overall.motion_result_int {
            1 => result.green().to_string(),
            -1 => result.red().to_string(),
            _ => result.yellow().to_string(),
        }
    } else {
        result.to_string()
    };

    let mut lines = vec![
        format!("{} ({})", division.division_name, division.key()),
        format!(
            "{}: majority {}, {:.1}% for, {} of {} {} took part",
            result,
            overall.motion_majority,
            overall.motion_majority_ratio * 100.0,
            overall.vote_participant_count,
            overall.total_possible_members,
            division.chamber.member_name()
        ),
        breakdown_line("All", overall),
    ];
    for party in &breakdowns.parties {
        lines.push(breakdown_line(party.grouping.as_deref().unwrap_or("-"), party));
    }
    lines.join("\n")
}

/// Classifier output for a piece of motion text
pub fn format_classification(vote_type: VoteType, nonaction: bool, powers: PowersAnalysis) -> String {
    format!(
        "Vote type: {}\nNon-action wording: {}\nUses powers: {}",
        vote_type.display_name(),
        if nonaction { "yes" } else { "no" },
        powers.display_name()
    )
}
