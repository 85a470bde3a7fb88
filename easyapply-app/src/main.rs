use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use easyapply_common::observability::init_logging;
use easyapply_config::{EasyApplyConfig, EasyApplyConfigLoader, LlmSettings};
use easyapply_drivers::{Pacing, WebDriverSession};
use easyapply_wizard::{
    AnswerSource, AppliedLog, BatchRunner, BatchSettings, LlmAnswerSource, NoAnswerSource,
    ProfileStore, WizardOptions,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

mod board;
mod flows;

use board::SearchResultsBoard;

const DEFAULT_CONFIG: &str = "easyapply.yaml";

#[derive(Parser, Debug)]
#[command(
    name = "easyapply",
    about = "Apply to quick-apply job postings with an applicant profile",
    version
)]
struct Cli {
    /// YAML configuration file (defaults to ./easyapply.yaml when present)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in, search, and apply (default command)
    Apply(ApplyArgs),
    /// Write a template applicant profile if none exists
    InitProfile {
        /// Email to put in the template
        #[arg(long)]
        email: Option<String>,
    },
}

#[derive(Args, Debug, Default)]
struct ApplyArgs {
    /// Override the configured search keywords
    #[arg(long)]
    keywords: Option<String>,
    /// Override the configured search location
    #[arg(long)]
    location: Option<String>,
    /// Override the configured maximum number of applications
    #[arg(long)]
    max_applications: Option<usize>,
    /// Run the browser headless
    #[arg(long)]
    headless: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let loader = match &cli.config {
        Some(path) => EasyApplyConfigLoader::new().with_file(path),
        None => EasyApplyConfigLoader::new().with_optional_file(DEFAULT_CONFIG),
    };
    let mut cfg = loader.load().context("loading configuration")?;

    let log_path = init_logging(cfg.log.to_log_config())?;
    info!(log_path = %log_path.display(), version = ?cfg.version, "easyapply starting");

    match cli.command.unwrap_or_else(|| Command::Apply(ApplyArgs::default())) {
        Command::InitProfile { email } => init_profile(&cfg, email.as_deref()),
        Command::Apply(args) => {
            apply_overrides(&mut cfg, args);
            run_apply(cfg).await
        }
    }
}

fn apply_overrides(cfg: &mut EasyApplyConfig, args: ApplyArgs) {
    if let Some(keywords) = args.keywords {
        cfg.search.keywords = keywords;
    }
    if let Some(location) = args.location {
        cfg.search.location = location;
    }
    if let Some(max) = args.max_applications {
        cfg.search.max_applications = max;
    }
    cfg.headless |= args.headless;
}

fn init_profile(cfg: &EasyApplyConfig, email: Option<&str>) -> Result<()> {
    let email = email.or(cfg.credentials.as_ref().map(|c| c.email.as_str()));
    let loaded = ProfileStore::new(&cfg.profile_path).load_or_create(email)?;
    if loaded.incomplete {
        println!("Template profile written to {}", cfg.profile_path.display());
    } else {
        println!("Profile already exists at {}", cfg.profile_path.display());
    }
    Ok(())
}

async fn answer_source(llm: &LlmSettings) -> Box<dyn AnswerSource> {
    if matches!(llm, LlmSettings::None) {
        info!("no language model configured; using fallback answers");
        return Box::new(NoAnswerSource);
    }
    match easyapply_llm::ensure_llm_ready(&llm.to_llm_config()).await {
        Ok(client) => {
            info!(model = client.model_name(), "language model ready");
            Box::new(
                LlmAnswerSource::new(client)
                    .with_max_tokens(llm.max_tokens().or(Some(300)))
                    .with_temperature(llm.temperature().or(Some(0.7))),
            )
        }
        Err(e) => {
            warn!(error = %e, "language model unavailable; using fallback answers");
            Box::new(NoAnswerSource)
        }
    }
}

fn wizard_options(cfg: &EasyApplyConfig) -> WizardOptions {
    let w = &cfg.wizard;
    WizardOptions {
        max_steps: w.max_steps,
        generation_timeout: w.generation_timeout(),
        pacing: Pacing {
            settle: Duration::from_millis(w.settle_ms),
            long_settle: Duration::from_millis(w.long_settle_ms),
            ..Pacing::default()
        },
        ..WizardOptions::default()
    }
}

async fn run_apply(cfg: EasyApplyConfig) -> Result<()> {
    let credentials = cfg
        .credentials
        .clone()
        .context("credentials.email and credentials.password must be configured")?;

    let store = ProfileStore::new(&cfg.profile_path);
    let loaded = store
        .load_or_create(Some(credentials.email.as_str()))
        .with_context(|| format!("loading profile {}", cfg.profile_path.display()))?;
    if loaded.incomplete {
        warn!(
            path = %store.path().display(),
            "profile is a fresh template; fill it in and run again"
        );
        return Ok(());
    }
    let profile = loaded.profile;

    let source = answer_source(&cfg.llm).await;
    let options = wizard_options(&cfg);

    let session = WebDriverSession::connect(&cfg.webdriver_url, cfg.headless)
        .await
        .with_context(|| format!("connecting to WebDriver at {}", cfg.webdriver_url))?;

    let result = async {
        flows::login(&session, &cfg.base_url, &credentials.email, &credentials.password).await?;
        flows::search(
            &session,
            &cfg.base_url,
            &cfg.search.keywords,
            &cfg.search.location,
            &options.pacing,
        )
        .await?;
        flows::apply_quick_apply_filter(&session, &options.pacing).await?;

        let mut board = SearchResultsBoard::new(&session, &options.pacing, cfg.wizard.wait_timeout());
        let runner = BatchRunner::new(
            BatchSettings {
                max_applications: cfg.search.max_applications,
                pause_ms: (
                    cfg.wizard.between_jobs_min_secs * 1_000,
                    cfg.wizard.between_jobs_max_secs * 1_000,
                ),
            },
            options.clone(),
        );
        let report = runner
            .run(&session, &mut board, &profile, source.as_ref())
            .await;

        AppliedLog::new(&cfg.applied_jobs_path).save(&report.applied)?;
        if let Some(reason) = &report.aborted {
            warn!(%reason, "batch ended early");
        }
        info!(applied = report.applied.len(), "done");
        anyhow::Ok(())
    }
    .await;

    if let Err(e) = session.close().await {
        warn!(error = %e, "closing the browser session failed");
    }
    result
}
