use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::api_client::{ApiClient, JobApi};
use crate::config::Config;
use crate::errors::FlowError;
use crate::exchange::{exchange, ExchangeOutcome};
use crate::models::application::ApplicationId;
use crate::models::export::ExportFormat;
use crate::models::score_check::ResumeCheckResult;
use crate::orchestrator::export::{save_document, Exporter};
use crate::orchestrator::launch::submit_job_description;
use crate::orchestrator::results::{ResultsFlow, ResultsView};
use crate::orchestrator::status::{progress_message, ApplicationStatusFlow, PROGRESS_ROTATION};
use crate::orchestrator::wizard;
use crate::score_table::ScoreTable;
use crate::session::Session;
use crate::share::share_links;
use crate::view::{self, InitialScore, Level, ResultsPayload, Route, ViewEvent, ViewSender};

const SIGN_IN_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Parser, Debug)]
#[command(name = "tailor")]
#[command(about = "Tailor your resume to a job description and export the result")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the signed-in profile.
    Profile {},
    /// Upload a base resume and save its job histories with the default rewrite selection.
    ProcessResume { input: PathBuf },
    /// List saved job histories.
    Histories {},
    /// Tailor the base resume to the job description in a file.
    Tailor {
        input: PathBuf,
        /// Also export the tailored resume in this format.
        #[arg(long)]
        export: Option<ExportFormat>,
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Show a finished application with before/after analyses.
    Results {
        id: ApplicationId,
        /// Job description used to score the tailored resume.
        #[arg(long)]
        job_description: Option<PathBuf>,
    },
    /// Download a finished application as a document.
    Export {
        id: ApplicationId,
        #[arg(long, default_value_t = ExportFormat::Pdf)]
        format: ExportFormat,
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Print share links for a results page.
    Share {
        url: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, default_value = "")]
        text: String,
    },
}

pub async fn dispatch(args: Args) -> Result<()> {
    let config = Config::from_env()?;
    init_logging(&args, &config);

    if let Command::Share { url, title, text } = &args.cmd {
        return share(url, title.as_deref(), text);
    }

    let api: Arc<dyn JobApi> = Arc::new(ApiClient::new(&config.api_url, config.request_timeout)?);
    let credential = acquire_credential(&config).await?;
    let session = Session::establish(api.as_ref(), &credential)
        .await
        .map_err(leave_view)?;

    let (view, rx) = view::channel();
    let printer = tokio::spawn(print_events(rx));

    let outcome = run(&args.cmd, &config, api, &session, view).await;

    if let Err(e) = printer.await {
        warn!("Event printer ended abnormally: {e}");
    }
    session.sign_out();
    outcome
}

fn init_logging(args: &Args, config: &Config) {
    let level = args.log_level.as_deref().unwrap_or(&config.rust_log);
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), level))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(
    cmd: &Command,
    config: &Config,
    api: Arc<dyn JobApi>,
    session: &Session,
    view: ViewSender,
) -> Result<()> {
    match cmd {
        Command::Profile {} => {
            match session.profile() {
                Some(profile) => {
                    println!("id:          {}", profile.id);
                    println!("email:       {}", profile.email.as_deref().unwrap_or("-"));
                    println!("base resume: {}", if profile.has_base_resume { "yes" } else { "no" });
                }
                None => println!("Profile not available."),
            }
            Ok(())
        }
        Command::ProcessResume { input } => {
            let text = read_input(input).await?;
            let histories = wizard::process_resume(api.as_ref(), session, &view, &text)
                .await
                .map_err(leave_view)?;
            let saved = wizard::save_details(api.as_ref(), session, &view, histories)
                .await
                .map_err(leave_view)?;
            print_histories(&saved);
            Ok(())
        }
        Command::Histories {} => {
            let histories = api
                .job_histories(&session.credential())
                .await
                .context("Failed to load job histories")?;
            print_histories(&histories);
            Ok(())
        }
        Command::Tailor { input, export, out } => {
            let job_description = read_input(input).await?;
            let launch = submit_job_description(api.as_ref(), session, &view, &job_description)
                .await
                .map_err(leave_view)?;
            let application_id = launch.application_id;

            let status = ApplicationStatusFlow::new(api.clone(), session.clone(), config.polling, view.clone());
            let payload = with_progress(status.run(launch)).await.map_err(leave_view)?;

            let results = ResultsFlow::new(api.clone(), session.clone(), config.polling, view.clone())
                .run(payload)
                .await
                .map_err(leave_view)?;
            print_summary(&results);

            if let Some(format) = export {
                export_to(api, session, view, config, application_id, *format, out).await?;
            }
            Ok(())
        }
        Command::Results { id, job_description } => {
            let job_description = match job_description {
                Some(path) => Some(read_input(path).await?),
                None => None,
            };
            let payload = ResultsPayload {
                application_id: *id,
                job_description,
                initial_score: InitialScore::Unavailable,
            };
            let results = ResultsFlow::new(api, session.clone(), config.polling, view)
                .run(payload)
                .await
                .map_err(leave_view)?;
            print_summary(&results);
            Ok(())
        }
        Command::Export { id, format, out } => {
            export_to(api, session, view, config, *id, *format, out).await
        }
        Command::Share { url, title, text } => share(url, title.as_deref(), text),
    }
}

async fn export_to(
    api: Arc<dyn JobApi>,
    session: &Session,
    view: ViewSender,
    config: &Config,
    id: ApplicationId,
    format: ExportFormat,
    out: &Path,
) -> Result<()> {
    let mut exporter = Exporter::new(api, session.clone(), view, config.export_probe, id, format);
    exporter.wait_until_ready().await.map_err(leave_view)?;
    let document = exporter.download().await.map_err(leave_view)?;
    let path = save_document(&document, out).await?;
    println!("Saved {}", path.display());
    Ok(())
}

fn share(url: &str, title: Option<&str>, text: &str) -> Result<()> {
    let links = share_links(url, title, text).ok_or_else(|| anyhow!("Not an absolute URL: {url}"))?;
    println!("LinkedIn: {}", links.linkedin);
    println!("X:        {}", links.x);
    println!("Reddit:   {}", links.reddit);
    Ok(())
}

/// Prints a rotating progress line while the status flow runs.
async fn with_progress<F, T>(flow: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::pin!(flow);
    let mut ticker = tokio::time::interval(PROGRESS_ROTATION);
    let mut tick = 0usize;
    loop {
        tokio::select! {
            result = &mut flow => return result,
            _ = ticker.tick() => {
                eprintln!("  {}", progress_message(tick));
                tick += 1;
            }
        }
    }
}

/// Interactive credential prompt, settled by input, end of input, Ctrl-C or timeout.
async fn acquire_credential(config: &Config) -> Result<String> {
    if let Some(token) = &config.access_token {
        return Ok(token.clone());
    }

    let (resolver, pending) = exchange::<String>();

    let reader = resolver.clone();
    eprint!("Access token: ");
    tokio::task::spawn_blocking(move || {
        let mut line = String::new();
        let _ = match std::io::stdin().read_line(&mut line) {
            Ok(0) => reader.cancel(),
            Ok(_) => reader.resolve(line.trim().to_string()),
            Err(e) => reader.fail(e.to_string()),
        };
    });

    let interrupt = resolver;
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    let outcome = pending.wait(SIGN_IN_TIMEOUT).await;
    ctrl_c.abort();

    match outcome {
        ExchangeOutcome::Resolved(token) => Ok(token),
        ExchangeOutcome::Failed(reason) => bail!("Sign-in failed: {reason}"),
        ExchangeOutcome::Cancelled => bail!("Sign-in cancelled"),
        ExchangeOutcome::TimedOut => bail!("Timed out waiting for an access token"),
    }
}

async fn read_input(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

/// The flow already notified the user; log where the front end goes next.
fn leave_view(e: FlowError) -> anyhow::Error {
    if let Some(route) = e.fallback_route() {
        info!("Next: {}", route_hint(&route));
    }
    e.into()
}

fn route_hint(route: &Route) -> &'static str {
    match route {
        Route::SignIn => "set TAILOR_ACCESS_TOKEN or sign in again",
        Route::WizardResume => "run `tailor process-resume <file>` first",
        Route::Dashboard => "start a new application with `tailor tailor <file>`",
    }
}

async fn print_events(mut rx: mpsc::UnboundedReceiver<ViewEvent>) {
    while let Some(event) = rx.recv().await {
        match event {
            ViewEvent::Notify(n) => {
                let tag = match n.level {
                    Level::Success => "ok",
                    Level::Error => "error",
                    Level::Info => "info",
                };
                eprintln!("[{tag}] {}", n.message);
            }
            ViewEvent::TailoringPending => eprintln!("Tailoring in progress..."),
            ViewEvent::InitialAnalysis(result) => print_analysis("Original resume analysis", &result),
            ViewEvent::InitialAnalysisUnavailable(message) => {
                println!("\n== Original resume analysis ==\n{message}");
            }
            ViewEvent::TailoredResume(text) => println!("\n== Tailored resume ==\n{text}"),
            ViewEvent::TailoredAnalysis(result) => print_analysis("Tailored resume analysis", &result),
            ViewEvent::TailoredAnalysisUnavailable(message) => {
                println!("\n== Tailored resume analysis ==\n{message}");
            }
            ViewEvent::ExportAvailability { format, ready } => {
                if ready {
                    eprintln!("{format} export is ready");
                }
            }
        }
    }
}

fn print_analysis(title: &str, result: &ResumeCheckResult) {
    println!("\n== {title} ==");
    if let Some(score) = result.display_score() {
        println!("Match score: {score}/100");
    }
    if let Some(table) = result.raw_csv.as_deref().and_then(ScoreTable::parse) {
        println!("{}", table.render_text());
    }
    if let Some(analysis) = &result.analysis {
        println!("{analysis}");
    }
}

fn print_summary(results: &ResultsView) {
    let before = results
        .initial_analysis
        .as_ref()
        .and_then(ResumeCheckResult::display_score);
    let after = results
        .tailored_analysis
        .as_ref()
        .and_then(ResumeCheckResult::display_score);
    if let (Some(before), Some(after)) = (before, after) {
        println!("\nScore for application {}: {before} -> {after}", results.application.id);
    }
}

fn print_histories(histories: &[crate::models::profile::JobHistory]) {
    for h in histories {
        println!(
            "{:>4}  {:<30} {:<30} {}",
            h.id,
            h.job_title.as_deref().unwrap_or("-"),
            h.company_name.as_deref().unwrap_or("-"),
            if h.is_default_rewrite == Some(true) { "rewrite" } else { "" }
        );
    }
}
