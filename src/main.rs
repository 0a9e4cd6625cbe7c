use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use votes_engine::config::{self, Config};
use votes_engine::decisions::{
    analyse_vote, categorise_motion, division_breakdowns, extract_motion, is_nonaction_vote, Chamber,
    DivisionInfo, Speech,
};
use votes_engine::generate::{generate_links, Scope};
use votes_engine::output::{self, NamedLink};
use votes_engine::policies::{self, TimePeriod};
use votes_engine::store::{self, LinkFile, VoteStore};

const EXIT_SUCCESS: i32 = 0;
const EXIT_MISMATCH: i32 = 1;
const EXIT_DATA: i32 = 2;
const EXIT_CONFIG: i32 = 4;

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute person-policy links and write them to the output file
    Generate {
        /// Only regenerate links for this person, merging into existing output
        #[arg(long, conflicts_with = "policy")]
        person: Option<u32>,
        /// Only regenerate links for this policy, merging into existing output
        #[arg(long)]
        policy: Option<u32>,
        #[command(flatten)]
        period: PeriodArgs,
    },
    /// Re-check generated links with the slow per-vote validator
    Validate {
        /// Check every link instead of a random sample
        #[arg(long)]
        all: bool,
        /// Sample size (defaults to validation.sample_size from config)
        #[arg(long, conflicts_with = "all")]
        sample: Option<usize>,
        #[command(flatten)]
        period: PeriodArgs,
    },
    /// List policies with strong votes that use no powers
    Report {
        /// Only report on this policy
        #[arg(long)]
        policy: Option<u32>,
    },
    /// Classify motion text, or find the motion behind a vote in a debate
    Classify {
        /// Motion text
        #[arg(required_unless_present = "debate")]
        text: Option<String>,
        /// JSON file of debate speeches ([{"gid": ..., "body": ...}])
        #[arg(long, requires = "gid", conflicts_with = "text")]
        debate: Option<PathBuf>,
        /// GID of the vote within the debate
        #[arg(long)]
        gid: Option<String>,
        /// JSON file of the speeches around the vote GID, used to resolve
        /// the vote's current revision before searching the debate
        #[arg(long, requires = "debate")]
        context: Option<PathBuf>,
        /// Print the motion analysis record as JSON
        #[arg(long, requires = "debate")]
        json: bool,
    },
    /// Show how a person compares to policies and their party
    Person {
        person_id: u32,
        /// Comparison party (defaults to every party they sat for)
        #[arg(long)]
        party: Option<String>,
        /// Print the legacy key/value export instead of a table
        #[arg(long)]
        legacy: bool,
        /// Print reduced export rows as JSON lines instead of a table
        #[arg(long, conflicts_with = "legacy")]
        reduced: bool,
        #[command(flatten)]
        period: PeriodArgs,
    },
    /// Show how each party voted in a division
    Breakdown {
        /// Division key, e.g. commons-2023-12-13-33
        division: String,
    },
}

#[derive(clap::Args, Debug, Clone, Copy)]
struct PeriodArgs {
    /// Only count decisions on or after this date (YYYY-MM-DD)
    #[arg(long)]
    start: Option<NaiveDate>,
    /// Only count decisions on or before this date (YYYY-MM-DD)
    #[arg(long)]
    end: Option<NaiveDate>,
}

impl PeriodArgs {
    fn period(&self) -> TimePeriod {
        TimePeriod {
            start: self.start,
            end: self.end,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "votes-engine")]
#[command(about = "Score parliamentary voting records against policy positions", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/votes-engine/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Chamber to work on (defaults to chamber from config)
    #[arg(long, global = true)]
    chamber: Option<Chamber>,

    #[command(subcommand)]
    command: Commands,
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let start_time = Instant::now();

    // Load config
    let config_path = cli.config.clone().map(PathBuf::from);
    let config = match config::load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    if let Err(errors) = config::validate_config(&config) {
        eprintln!("Config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    let chamber = match cli.chamber {
        Some(c) => c,
        None => match config.chamber.parse::<Chamber>() {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Config error: {}", e);
                std::process::exit(EXIT_CONFIG);
            }
        },
    };

    let use_colors = output::should_use_colors();
    let result = run(cli.command, &config, chamber, cli.verbose, use_colors).await;

    if cli.verbose {
        eprintln!("Finished in {}", output::format_elapsed(start_time.elapsed()));
    }

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(EXIT_DATA);
        }
    }
}

fn read_speeches(path: &Path) -> Result<Vec<Speech>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read speeches file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse speeches in {}", path.display()))
}

fn load_store(config: &Config) -> Result<VoteStore> {
    VoteStore::load(&config.data_dir)
        .with_context(|| format!("Failed to load data from {}", config.data_dir.display()))
}

async fn run(
    command: Commands,
    config: &Config,
    chamber: Chamber,
    verbose: bool,
    use_colors: bool,
) -> Result<i32> {
    match command {
        Commands::Generate {
            person,
            policy,
            period,
        } => {
            let scope = match (person, policy) {
                (Some(id), _) => Scope::Person(id),
                (None, Some(id)) => Scope::Policy(id),
                (None, None) => Scope::All,
            };
            let store = Arc::new(load_store(config)?);
            let step = Instant::now();
            let links = generate_links(
                Arc::clone(&store),
                chamber,
                &config.banned_parties,
                period.period(),
                scope,
            )
            .await?;
            if verbose {
                eprintln!(
                    "Generated {} links in {}",
                    links.len(),
                    output::format_elapsed(step.elapsed())
                );
            }

            let links = if scope.is_incremental() {
                let existing = store::load_links(&config.output)?;
                store::merge_links(existing.links, links)
            } else {
                links
            };
            let count = links.len();
            store::save_links(&config.output, &LinkFile::new(links))?;
            println!("Wrote {} links to {}", count, config.output.display());
            Ok(EXIT_SUCCESS)
        }
        Commands::Validate {
            all,
            sample,
            period,
        } => {
            let store = load_store(config)?;
            let link_file = store::load_links(&config.output)?;
            let links: Vec<_> = link_file
                .links
                .into_iter()
                .filter(|l| l.chamber == chamber)
                .collect();
            let sample = if all {
                None
            } else {
                Some(sample.unwrap_or(config.validation.sample_size))
            };

            let results = policies::check_links(
                &store,
                &links,
                sample,
                &period.period(),
                config.validation.tolerance,
            );
            println!("{}", output::format_validation(&results, use_colors));
            if results.iter().all(|r| r.is_ok()) {
                Ok(EXIT_SUCCESS)
            } else {
                Ok(EXIT_MISMATCH)
            }
        }
        Commands::Report { policy } => {
            let store = load_store(config)?;
            let reports: Vec<_> = store
                .chamber_policies(chamber)
                .filter(|p| policy.map_or(true, |id| p.id == id))
                .map(|p| policies::policy_report(p, &store))
                .collect();
            println!("{}", output::format_reports(&reports, use_colors));
            Ok(EXIT_SUCCESS)
        }
        Commands::Classify {
            text,
            debate,
            gid,
            context,
            json,
        } => {
            if let (Some(path), Some(gid)) = (debate, gid) {
                let speeches = read_speeches(&path)?;
                let extraction = match context {
                    Some(context_path) => {
                        analyse_vote(&read_speeches(&context_path)?, &speeches, &gid)?
                    }
                    None => extract_motion(&speeches, &gid)?,
                };
                if json {
                    let analysis = extraction.to_analysis(chamber.slug());
                    println!("{}", serde_json::to_string_pretty(&analysis)?);
                    return Ok(EXIT_SUCCESS);
                }
                println!("Question: {}", extraction.question);
                println!("Motion speech: {}", extraction.motion_speech.gid);
                if let Some(tidied) = &extraction.tidied_motion {
                    println!("Motion: {}", tidied);
                }
                println!("Vote type: {}", extraction.vote_type.display_name());
                return Ok(EXIT_SUCCESS);
            }

            let text = text.unwrap_or_default();
            let division = DivisionInfo {
                chamber,
                date: chrono::Local::now().date_naive(),
                division_number: 0,
                division_name: String::new(),
                motion: text.clone(),
                manual_motion: String::new(),
                debate_gid: None,
                vote_motion_analysis: None,
            };
            println!(
                "{}",
                output::format_classification(
                    categorise_motion(&text),
                    is_nonaction_vote(&text),
                    division.motion_uses_powers()
                )
            );
            Ok(EXIT_SUCCESS)
        }
        Commands::Person {
            person_id,
            party,
            legacy,
            reduced,
            period,
        } => {
            let store = load_store(config)?;
            let parties = match party {
                Some(p) => vec![p],
                None => store.person_parties(person_id, chamber, &config.banned_parties),
            };
            if parties.is_empty() {
                anyhow::bail!("Person {} has no comparison party in {}", person_id, chamber);
            }

            let mut links = Vec::new();
            for party in &parties {
                links.extend(policies::person_policy_links(
                    &store,
                    person_id,
                    chamber,
                    party,
                    &period.period(),
                ));
            }

            if legacy {
                let refs: Vec<_> = links.iter().collect();
                println!("{}", output::format_legacy_tsv(&refs));
                return Ok(EXIT_SUCCESS);
            }
            if reduced {
                for link in &links {
                    println!("{}", serde_json::to_string(&link.reduced())?);
                }
                return Ok(EXIT_SUCCESS);
            }

            let named: Vec<NamedLink> = links
                .iter()
                .map(|link| NamedLink {
                    policy_name: store.policy(link.policy_id).map_or("", |p| p.name.as_str()),
                    link,
                })
                .collect();
            for party in &parties {
                let party_links: Vec<_> = named
                    .iter()
                    .filter(|n| &n.link.comparison_party == party)
                    .map(|n| NamedLink {
                        policy_name: n.policy_name,
                        link: n.link,
                    })
                    .collect();
                println!("Compared with {} ({}):", party, period.period().description());
                if verbose {
                    for n in &party_links {
                        println!("{}\n", output::format_link_detail(n, use_colors));
                    }
                } else {
                    println!("{}\n", output::format_links_table(&party_links, use_colors));
                }
            }
            Ok(EXIT_SUCCESS)
        }
        Commands::Breakdown { division } => {
            let store = load_store(config)?;
            let Some(info) = store.division(&division) else {
                anyhow::bail!("Unknown division {}", division);
            };
            let votes = store.division_votes(&division);
            let members = store.members_on(info.chamber, info.date);
            let breakdowns = division_breakdowns(&division, &votes, &members);
            println!("{}", output::format_breakdown(info, &breakdowns, use_colors));
            Ok(EXIT_SUCCESS)
        }
    }
}
