mod api;
mod bulk;
mod cache;
mod error;
mod export;
mod feed;
mod filter;
mod models;
mod pagination;
mod profile;
mod proposal;
mod store;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::io::Write;
use tracing_subscriber::EnvFilter;

use api::ApiClient;
use bulk::BulkAnalyzer;
use cache::{AnalysisCache, Outcome};
use feed::FeedSession;
use filter::Filter;
use models::{AnalysisResult, Job};
use profile::ProfileManager;
use proposal::ProposalPad;
use store::SnapshotStore;

#[derive(Parser)]
#[command(name = "prospect")]
#[command(about = "Search job postings and run AI suitability analysis against your profile")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show whether the backend session is authenticated
    Status,

    /// Print the login URL (sign-in completes in the browser)
    Login,

    /// List available job categories and their ids
    Categories,

    /// Show or edit the local profile additions
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },

    /// Search the job feed and browse it interactively
    Search {
        /// Keyword query
        query: Option<String>,

        /// Category id (repeatable)
        #[arg(short, long = "category")]
        categories: Vec<String>,

        /// Client location (repeatable)
        #[arg(short, long = "location")]
        locations: Vec<String>,

        /// Minimum budget in dollars
        #[arg(long)]
        min_budget: Option<u32>,

        /// Maximum budget in dollars
        #[arg(long)]
        max_budget: Option<u32>,
    },

    /// Work with the bulk analysis snapshot from the last "analyze all" run
    Analyzed {
        #[command(subcommand)]
        command: AnalyzedCommands,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Show the local profile additions
    Show,

    /// Update fields of the local profile additions
    Set {
        /// Your location
        #[arg(long)]
        location: Option<String>,

        /// Free-text details the analysis should know about
        #[arg(long)]
        details: Option<String>,

        /// Add a skill (repeatable)
        #[arg(long = "add-skill")]
        add_skills: Vec<String>,

        /// Add a certificate (repeatable)
        #[arg(long = "add-certificate")]
        add_certificates: Vec<String>,

        /// Add an education entry (repeatable)
        #[arg(long = "add-education")]
        add_education: Vec<String>,
    },
}

#[derive(Subcommand)]
enum AnalyzedCommands {
    /// List all analyzed jobs, ranked by suitability
    List,

    /// Show the full analysis for one job id
    Show {
        /// Job id (or posting URL when the job has no id)
        job_id: String,

        /// Also write the insights to a text file
        #[arg(long)]
        save: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("prospect=warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let api = ApiClient::new()?;

    match cli.command {
        Commands::Status => {
            if api.auth_status().await? {
                println!("Authenticated against {}", api.base_url());
            } else {
                println!("Not authenticated. Run 'prospect login' to sign in.");
            }
        }

        Commands::Login => {
            println!("Open this URL in your browser to sign in:");
            println!("  {}", api.login_url());
            println!("The backend sets a session cookie and redirects back with auth_status=success.");
        }

        Commands::Categories => {
            let categories = api.categories().await?;
            if categories.is_empty() {
                println!("No categories available.");
            } else {
                println!("{:<22} {:<40}", "ID", "LABEL");
                println!("{}", "-".repeat(62));
                for category in categories {
                    println!("{:<22} {:<40}", category.id, truncate(&category.label, 38));
                }
            }
        }

        Commands::Profile { command } => match command {
            ProfileCommands::Show => {
                let local = api.fetch_local_profile().await?;
                println!("Location: {}", local.location);
                println!("Details: {}", local.additional_details);
                println!("Skills: {}", local.local_skills.join(", "));
                println!("Certificates: {}", local.local_certificates.join(", "));
                println!("Education: {}", local.local_education.join(", "));
            }
            ProfileCommands::Set {
                location,
                details,
                add_skills,
                add_certificates,
                add_education,
            } => {
                let mut local = api.fetch_local_profile().await?;
                if let Some(location) = location {
                    local.location = location;
                }
                if let Some(details) = details {
                    local.additional_details = details;
                }
                local.local_skills.extend(add_skills);
                local.local_certificates.extend(add_certificates);
                local.local_education.extend(add_education);

                let saved = api.save_local_profile(&local).await?;
                println!("Local profile saved ({} skills).", saved.local_skills.len());
            }
        },

        Commands::Search {
            query,
            categories,
            locations,
            min_budget,
            max_budget,
        } => {
            require_auth(&api).await?;
            let filter = Filter {
                keywords: query.unwrap_or_default(),
                category_ids: categories,
                locations,
                min_budget,
                max_budget,
            };
            if filter.is_empty() {
                bail!("give at least a keyword, --category, or --location to search");
            }
            run_search(&api, filter).await?;
        }

        Commands::Analyzed { command } => {
            let mut bulk = BulkAnalyzer::new(SnapshotStore::open()?);
            match command {
                AnalyzedCommands::List => {
                    let results = bulk.results()?;
                    if results.is_empty() {
                        println!("No analyzed jobs yet. Run a bulk analysis from 'prospect search'.");
                    } else {
                        print_analyzed_table(results);
                    }
                }
                AnalyzedCommands::Show { job_id, save } => {
                    let result = bulk.find(&job_id)?.clone();
                    print_analysis(&result);
                    if save {
                        let filename = export::analysis_filename(&result.job_data.title);
                        std::fs::write(&filename, export::analysis_report(&result))
                            .with_context(|| format!("Failed to write {filename}"))?;
                        println!("Insights saved to {filename}");
                    }
                }
            }
        }
    }

    Ok(())
}

async fn require_auth(api: &ApiClient) -> Result<()> {
    if !api.auth_status().await? {
        bail!("Not authenticated. Run 'prospect login' and complete the sign-in in your browser.");
    }
    Ok(())
}

/// Interactive feed browser. Owns the per-session state: the feed session,
/// the per-job analysis cache, the bulk analyzer, the profile, and the
/// latest proposal draft.
async fn run_search(api: &ApiClient, filter: Filter) -> Result<()> {
    let mut session = FeedSession::new();
    session.apply_filter(filter);

    let cache = AnalysisCache::new();
    let mut profiles = ProfileManager::new();
    let mut bulk = BulkAnalyzer::new(SnapshotStore::open()?);
    let mut pad = ProposalPad::new();

    let filter = session.filter();
    if !filter.keywords.is_empty() {
        println!("Searching for \"{}\"", filter.keywords);
    }
    load_and_print(&mut session, api).await;
    print_help();

    let stdin = std::io::stdin();
    loop {
        print!("prospect> ");
        std::io::stdout().flush()?;
        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        let (command, arg) = match line.split_once(' ') {
            Some((command, arg)) => (command, arg.trim()),
            None => (line, ""),
        };

        match command {
            "" => {}
            "q" | "quit" => break,
            "h" | "?" | "help" => print_help(),

            "n" | "next" => {
                if session.advance() {
                    load_and_print(&mut session, api).await;
                } else {
                    println!("No further page.");
                }
            }
            "p" | "prev" => {
                if session.retreat() {
                    load_and_print(&mut session, api).await;
                } else {
                    println!("Already on the first page.");
                }
            }
            "r" | "reload" => load_and_print(&mut session, api).await,

            "s" | "show" => match pick_job(&session, arg) {
                Some(job) => print_job(job),
                None => println!("Usage: s <job number>"),
            },

            "a" | "analyze" => {
                analyze_one(&session, &cache, &mut profiles, api, arg, false).await;
            }
            "f" | "fresh" => {
                analyze_one(&session, &cache, &mut profiles, api, arg, true).await;
            }
            "v" | "view" => match pick_job(&session, arg) {
                Some(job) => match cache.get(job.key()).await {
                    Some(result) => print_analysis(&result),
                    None => match cache.status(job.key()).await {
                        cache::Status::Failed => {
                            println!("The last analysis failed. Retry with 'a {arg}'.")
                        }
                        _ => println!("No analysis for this job yet. Analyze it with 'a {arg}'."),
                    },
                },
                None => println!("Usage: v <job number>"),
            },

            "A" | "all" => analyze_all(&session, &mut bulk, &mut profiles, api).await,

            "g" | "proposal" => {
                generate_proposal(&session, &cache, &mut profiles, &mut pad, api, arg).await;
            }

            "e" | "export" => export_page(&session, arg),

            _ => println!("Unknown command '{command}'. Type 'h' for help."),
        }
    }

    Ok(())
}

async fn load_and_print(session: &mut FeedSession, api: &ApiClient) {
    println!("Searching...");
    match session.load(api).await {
        Ok(feed::LoadOutcome::Applied) => print_page(session),
        Ok(feed::LoadOutcome::Superseded) => {}
        Err(e) => {
            println!("Search failed: {e}");
            println!("Retry with 'r'; the page position is kept.");
        }
    }
}

/// Resolves a 1-based index from the displayed page.
fn pick_job<'a>(session: &'a FeedSession, arg: &str) -> Option<&'a Job> {
    let index: usize = arg.parse().ok()?;
    session.jobs().get(index.checked_sub(1)?)
}

async fn ensure_profile(
    profiles: &mut ProfileManager,
    api: &ApiClient,
) -> Option<models::UserProfile> {
    if !profiles.is_loaded() {
        println!("Loading your profile...");
        if let Err(e) = profiles.ensure_loaded(api).await {
            println!("Could not load your profile: {e}");
            return None;
        }
    }
    match profiles.profile() {
        Ok(profile) => Some(profile),
        Err(e) => {
            println!("{e}");
            None
        }
    }
}

async fn analyze_one(
    session: &FeedSession,
    cache: &AnalysisCache,
    profiles: &mut ProfileManager,
    api: &ApiClient,
    arg: &str,
    fresh: bool,
) {
    let Some(job) = pick_job(session, arg) else {
        println!("Usage: a <job number>");
        return;
    };
    let Some(profile) = ensure_profile(profiles, api).await else {
        return;
    };

    if fresh {
        // Re-analysis under a changed profile goes through an explicit
        // invalidation; the cache does not track profile identity.
        cache.invalidate(job.key()).await;
    }

    println!("Analyzing \"{}\"...", truncate(&job.title, 60));
    let outcome = cache
        .get_or_fetch(job.key(), || api.analyze_job(job, &profile))
        .await;
    match outcome {
        Outcome::Ready(result) => print_analysis(&result),
        Outcome::Failed(message) => {
            println!("Analysis failed: {message}");
            println!("Retry with 'a {arg}'.");
        }
    }
}

async fn analyze_all(
    session: &FeedSession,
    bulk: &mut BulkAnalyzer,
    profiles: &mut ProfileManager,
    api: &ApiClient,
) {
    let Some(profile) = ensure_profile(profiles, api).await else {
        return;
    };
    let jobs = session.jobs();
    println!("Analyzing {} jobs... this may take a while.", jobs.len());
    match bulk.run(api, jobs, &profile).await {
        Ok(count) => {
            println!("Bulk analysis complete. Found {count} suitable opportunities.");
            println!("Browse them with 'prospect analyzed list' (kept for this session).");
        }
        Err(e) => println!("Bulk analysis failed: {e}"),
    }
}

async fn generate_proposal(
    session: &FeedSession,
    cache: &AnalysisCache,
    profiles: &mut ProfileManager,
    pad: &mut ProposalPad,
    api: &ApiClient,
    arg: &str,
) {
    if arg.is_empty() {
        // Only the most recent draft is retained.
        match pad.latest() {
            Some(text) => println!("\n--- Last Proposal Draft ---\n{}", textwrap::fill(text, 78)),
            None => println!("Usage: g <job number> (or 'g' to re-show the last draft)"),
        }
        return;
    }
    let Some(job) = pick_job(session, arg) else {
        println!("Usage: g <job number>");
        return;
    };
    let Some(analysis) = cache.get(job.key()).await else {
        println!("Analyze the job first with 'a {arg}', then generate a proposal.");
        return;
    };
    let Some(profile) = ensure_profile(profiles, api).await else {
        return;
    };

    println!("Drafting proposal...");
    match pad.generate(api, job, &profile, &analysis).await {
        Ok(text) => {
            println!("\n--- Proposal Draft ---");
            println!("{}", textwrap::fill(text, 78));
            println!("----------------------");
        }
        Err(e) => println!("Proposal generation failed: {e}"),
    }
}

fn export_page(session: &FeedSession, arg: &str) {
    let jobs = session.jobs();
    if jobs.is_empty() {
        println!("No jobs to export. Fetch some jobs first.");
        return;
    }
    let (content, filename) = match arg {
        "json" => (export::jobs_json(jobs), export::jobs_filename("json")),
        "csv" => (export::jobs_csv(jobs), export::jobs_filename("csv")),
        _ => {
            println!("Usage: e json|csv");
            return;
        }
    };
    match content.and_then(|content| {
        std::fs::write(&filename, content)?;
        Ok(())
    }) {
        Ok(()) => println!("Exported {} jobs to {filename}", jobs.len()),
        Err(e) => println!("Export failed: {e}"),
    }
}

fn print_help() {
    println!("Commands:");
    println!("  n/p        next / previous page       r     reload page");
    println!("  s <N>      show job details            a <N> analyze job");
    println!("  f <N>      re-analyze (drop cache)     v <N> view cached analysis");
    println!("  A          analyze all jobs on page    g <N> draft a proposal");
    println!("  e json|csv export current page         q     quit");
}

fn print_page(session: &FeedSession) {
    let jobs = session.jobs();
    if jobs.is_empty() {
        println!("No jobs found. Try adjusting your query or filters.");
        return;
    }

    println!(
        "Found {} opportunities (page {})",
        session.total(),
        session.page_number()
    );
    println!(
        "{:<4} {:<44} {:<16} {:<14} {:>8}",
        "#", "TITLE", "RATE", "COUNTRY", "REVIEWS"
    );
    println!("{}", "-".repeat(90));
    for (i, job) in jobs.iter().enumerate() {
        println!(
            "{:<4} {:<44} {:<16} {:<14} {:>8}",
            i + 1,
            truncate(&job.title, 42),
            truncate(&job.rate_display, 14),
            truncate(job.client.country.as_deref().unwrap_or("-"), 12),
            job.client.total_reviews.unwrap_or(0),
        );
    }
    if session.has_next() {
        println!("More results available: 'n' for the next page.");
    }
    if session.can_retreat() {
        println!("Back to the previous page with 'p'.");
    }
}

fn print_job(job: &Job) {
    println!("Title: {}", job.title);
    println!("URL: {}", job.url);
    if let Some(job_type) = &job.job_type {
        println!("Type: {} ({})", job_type, job.rate_display);
    } else {
        println!("Rate: {}", job.rate_display);
    }
    if !job.skills.is_empty() {
        println!("Skills: {}", job.skills.join(", "));
    }
    if let Some(country) = &job.client.country {
        let verified = job
            .client
            .verification_status
            .as_deref()
            .unwrap_or("unverified");
        println!("Client: {country} ({verified})");
    }
    if !job.snippet.is_empty() {
        println!("\n{}", textwrap::fill(&job.snippet, 78));
    }
}

fn print_analysis(result: &AnalysisResult) {
    println!("\nSuitability: {}%", result.suitability_score);
    println!("{}", textwrap::fill(&result.analysis_summary, 78));
    if !result.strengths.is_empty() {
        println!("\nStrengths:");
        for strength in &result.strengths {
            println!("  + {strength}");
        }
    }
    if !result.weaknesses.is_empty() {
        println!("\nWeaknesses / gaps:");
        for weakness in &result.weaknesses {
            println!("  - {weakness}");
        }
    }
    if !result.proposal_suggestions.is_empty() {
        println!("\nProposal suggestions:");
        for suggestion in &result.proposal_suggestions {
            println!("  * {suggestion}");
        }
    }
    println!();
}

fn print_analyzed_table(results: &[AnalysisResult]) {
    println!("{:<22} {:>6} {:<48}", "JOB ID", "SCORE", "TITLE");
    println!("{}", "-".repeat(78));
    for result in results {
        println!(
            "{:<22} {:>5}% {:<48}",
            truncate(result.job_data.key(), 20),
            result.suitability_score,
            truncate(&result.job_data.title, 46),
        );
    }
    println!("\nDetails: 'prospect analyzed show <job id>' (add --save to write a report).");
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    // The cut may land inside a multibyte character; back up to a boundary.
    let mut end = max.saturating_sub(3);
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_strings() {
        assert_eq!(truncate("short", 10), "short");
    }

    #[test]
    fn truncate_appends_ellipsis() {
        assert_eq!(truncate("a very long job title", 10), "a very ...");
    }

    #[test]
    fn truncate_backs_up_to_a_char_boundary() {
        let title = "Senior Rust engineers needed for the Zürich fintech market";
        assert_eq!(
            truncate(title, 42),
            "Senior Rust engineers needed for the Z..."
        );
        // All-multibyte input never slices mid-character either.
        assert_eq!(truncate(&"ü".repeat(30), 10), "üüü...");
    }
}
