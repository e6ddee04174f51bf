use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dealscope_core::domain::pipeline::IndustryComparison;
use dealscope_core::llm::prompt::DocumentText;
use dealscope_core::research::{CompanyReport, ResearchRequest, ResearchService};
use dealscope_core::storage::pipeline::PipelineStore;

#[derive(Debug, Parser)]
#[command(name = "dealscope")]
struct Args {
    /// Print machine-readable JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Research a company, score it and add it to the pipeline.
    Research {
        query: String,

        /// Plain-text document to analyze alongside the search.
        #[arg(long = "doc")]
        docs: Vec<PathBuf>,
    },
    /// Analyze documents without a company search.
    Analyze {
        #[arg(long = "doc", required = true)]
        docs: Vec<PathBuf>,
    },
    /// Fetch normalized financial data for a ticker.
    Financials { symbol: String },
    /// List the deal pipeline.
    Pipeline,
    /// Compare pipeline companies by industry.
    Industries,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = dealscope_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let result = run(&settings, args).await;
    if let Err(e) = &result {
        sentry_anyhow::capture_anyhow(e);
        tracing::error!(error = %e, "command failed");
    }
    result
}

async fn run(settings: &dealscope_core::config::Settings, args: Args) -> anyhow::Result<()> {
    let store = dealscope_core::storage::open_from_settings(settings).await?;
    let mut pipeline = PipelineStore::load(store.clone()).await?;

    match args.command {
        Command::Research { query, docs } => {
            let service = ResearchService::from_settings(settings, store)?;
            let req = ResearchRequest {
                query,
                documents: read_documents(&docs).await?,
            };
            let report = service.research(&req, &mut pipeline).await?;
            if args.json {
                print_json(&report)?;
            } else {
                print_report(&report);
            }
        }
        Command::Analyze { docs } => {
            let service = ResearchService::from_settings(settings, store)?;
            let documents = read_documents(&docs).await?;
            let analysis = service.analyze_documents_only(&documents).await?;
            if args.json {
                print_json(&analysis)?;
            } else {
                println!("{}", analysis.summary.unwrap_or_default());
            }
        }
        Command::Financials { symbol } => {
            let service = ResearchService::from_settings(settings, store)?;
            anyhow::ensure!(
                service.has_financial_provider(),
                "ALPHA_VANTAGE_API_KEY is required for financial data"
            );
            let record = service.financials(&symbol.trim().to_ascii_uppercase()).await?;
            print_json(&record)?;
        }
        Command::Pipeline => {
            if args.json {
                print_json(&pipeline.list())?;
            } else {
                for entry in pipeline.list() {
                    println!(
                        "{:>3}  {:<8} {:<32} {:<24} {}",
                        entry.deal_score, entry.symbol, entry.name, entry.industry, entry.date
                    );
                }
            }
        }
        Command::Industries => {
            let comparison = pipeline.industry_comparison();
            if args.json {
                print_json(&comparison)?;
            } else {
                print_industries(&comparison);
            }
        }
    }

    Ok(())
}

async fn read_documents(paths: &[PathBuf]) -> anyhow::Result<Vec<DocumentText>> {
    let mut out = Vec::with_capacity(paths.len());
    for path in paths {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read document {}", path.display()))?;
        out.push(DocumentText {
            name: file_name(path),
            text,
        });
    }
    Ok(out)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_report(report: &CompanyReport) {
    let p = &report.profile;
    println!(
        "{} ({}) | {}",
        p.name,
        p.symbol.as_deref().unwrap_or("private"),
        p.industry
    );
    if p.is_degraded() {
        println!("AI lookup failed; showing a placeholder profile.");
    }
    println!("Deal score: {}/100", report.deal_score);
    println!();
    println!("{}", p.overview);

    if let Some(fin) = &report.financials {
        println!();
        println!(
            "Price {} ({} / {}%)  Market cap {}  P/E {}",
            fin.price, fin.change, fin.change_percent, fin.stock_info.market_cap, fin.stock_info.pe_ratio
        );
        println!(
            "Revenue {}  EBITDA {} ({})  Gross margin {}",
            fin.financials.revenue,
            fin.financials.ebitda,
            fin.financials.ebitda_margin,
            fin.financials.gross_margin
        );
    } else if let Some(err) = &report.financial_error {
        println!();
        println!("Financial data unavailable: {err}");
    }

    println!();
    for (name, risk) in report.risks.iter() {
        println!("{} {:<14} {:<6} {}", risk.level.icon(), name, risk.level.as_str(), risk.reason);
    }

    if let Some(docs) = &report.document_analysis {
        println!();
        println!("Documents: {}", docs.documents.join(", "));
        match (&docs.summary, &docs.error) {
            (Some(summary), _) => println!("{summary}"),
            (None, Some(err)) => println!("Document analysis failed: {err}"),
            (None, None) => {}
        }
    }
}

fn print_industries(comparison: &IndustryComparison) {
    match comparison {
        IndustryComparison::InsufficientData { companies } => {
            println!("Add at least 2 companies to the pipeline to compare industries ({companies} so far).");
        }
        IndustryComparison::Ready { industries } => {
            for summary in industries {
                let names: Vec<&str> = summary.companies.iter().map(|c| c.name.as_str()).collect();
                println!(
                    "{:<24} {:>2} companies  avg {:>3}  {}",
                    summary.industry,
                    summary.count,
                    summary.average_score,
                    names.join(", ")
                );
            }
        }
    }
}

fn init_sentry(settings: &dealscope_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
