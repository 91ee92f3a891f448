use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use student_aggregator::{
    render_usage_report, AggregatorConfig, DomainEmailConfig, DomainEmailSource, FetchConfig, Fetcher,
    HttpTransport, JsonFileSink, MockSource, Pacer, ProfileScrapeConfig, ProfileScrapeSource, RequestExecutor,
    SourceAdapter, StudentAggregator, TokioPacer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum SourceChoice {
    Mock,
    DomainEmail,
    ProfileScrape,
}

#[derive(Parser, Debug)]
#[command(name = "student-aggregator", version, about = "Collect, merge and enrich student profiles for an institution")]
struct Args {
    /// Institution name, e.g. "HKB College of Engineering"
    institution: String,

    /// Maximum number of profiles in the output
    #[arg(long, default_value_t = 10)]
    limit: usize,

    /// Sources to query, in order
    #[arg(long, value_enum, value_delimiter = ',', default_value = "mock")]
    sources: Vec<SourceChoice>,

    /// Directory for the JSON output and usage report
    #[arg(long, default_value = "results")]
    output_dir: PathBuf,

    /// Scraping service: scrapingbee, scrapeowl or scrapfly
    #[arg(long, env = "SCRAPE_SERVICE", default_value = "scrapingbee")]
    scrape_service: String,

    /// Profile URL scraped before any search (repeatable)
    #[arg(long = "seed")]
    seeds: Vec<String>,

    #[arg(long, default_value_t = 2_000)]
    inter_source_delay_ms: u64,

    /// Fixed year for status classification (defaults to the current year)
    #[arg(long)]
    current_year: Option<i32>,

    /// Attempts per rate-limited request
    #[arg(long, default_value_t = 3)]
    max_retries: u32,

    /// Scrape the profile pages that domain-email results link to
    #[arg(long)]
    follow_up: bool,
}

fn fetch_config(args: &Args) -> FetchConfig {
    FetchConfig {
        max_retries: args.max_retries,
        ..FetchConfig::default()
    }
}

fn build_scraper(args: &Args, transport: Arc<dyn HttpTransport>, executor: RequestExecutor) -> Result<ProfileScrapeSource> {
    let config = ProfileScrapeConfig {
        service: args.scrape_service.parse()?,
        seed_locators: args.seeds.clone(),
        ..ProfileScrapeConfig::default()
    };
    Ok(ProfileScrapeSource::new(config.with_env_key(), transport, executor))
}

fn build_sources(
    args: &Args,
    transport: Arc<dyn HttpTransport>,
    pacer: Arc<dyn Pacer>,
) -> Result<Vec<Box<dyn SourceAdapter>>> {
    let fetch_config = fetch_config(args);
    let mut sources: Vec<Box<dyn SourceAdapter>> = Vec::new();

    for choice in &args.sources {
        let executor = RequestExecutor::new(&fetch_config, pacer.clone());
        match choice {
            SourceChoice::Mock => sources.push(Box::new(MockSource::new())),
            SourceChoice::DomainEmail => sources.push(Box::new(DomainEmailSource::new(
                DomainEmailConfig::default().with_env_key(),
                transport.clone(),
                executor,
            ))),
            SourceChoice::ProfileScrape => {
                sources.push(Box::new(build_scraper(args, transport.clone(), executor)?));
            }
        }
    }

    Ok(sources)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    info!("Starting student aggregation for {}", args.institution);

    let pacer: Arc<dyn Pacer> = Arc::new(TokioPacer);
    let transport: Arc<dyn HttpTransport> = Arc::new(Fetcher::new(&fetch_config(&args))?);
    let sources = build_sources(&args, transport.clone(), pacer.clone())?;
    let mut aggregator = StudentAggregator::new(
        AggregatorConfig {
            inter_source_delay_ms: args.inter_source_delay_ms,
            current_year: args.current_year,
        },
        pacer.clone(),
    );
    if args.follow_up {
        let executor = RequestExecutor::new(&fetch_config(&args), pacer);
        aggregator = aggregator.with_profile_follow_up(build_scraper(&args, transport, executor)?);
    }

    let run = aggregator.run(&args.institution, args.limit, &sources).await;

    let sink = JsonFileSink::new(args.output_dir.clone());
    run.persist(&sink)?;

    let report = render_usage_report(&run);
    let report_path = sink.file_path(&run.institution, &format!("report_{}", run.run_id));
    std::fs::write(report_path.with_extension("txt"), &report)?;
    println!("{}", report);

    info!("Done: {} profiles for {}", run.profiles.len(), run.institution);
    Ok(())
}
