use anyhow::Context;
use clap::{Parser, Subcommand};
use crossterm::{
    queue,
    style::{Attribute, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
};
use ratatui::{style::Modifier, widgets::Widget};
use scoreboard_core::api::{HttpScoringClient, ScoringApi};
use scoreboard_core::dashboard::{wait_all, AddCompanyOutcome, Dashboard, DashboardSnapshot};
use scoreboard_core::view::{self, CompanySelector, DashboardView};
use std::io::{IsTerminal, Write};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod interactive;

#[derive(Debug, Parser)]
#[command(name = "scoreboard", about = "Credit score dashboard for the scoring API")]
struct Args {
    /// Scoring API base URL. Overrides SCOREBOARD_API_URL.
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List companies known to the backend.
    Companies {
        /// Case-insensitive filter on name or ticker.
        #[arg(long)]
        search: Option<String>,
    },
    /// Render the dashboard for one company.
    Show { ticker: String },
    /// Add a company by ticker, then render its dashboard.
    Add { ticker: String },
    /// Full-screen interactive dashboard (the default).
    Interactive,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let mut settings = scoreboard_core::config::Settings::from_env()?;
    if let Some(url) = args.api_url.as_deref() {
        settings = settings.with_api_base_url(url)?;
    }
    let _sentry_guard = init_sentry(&settings);

    // Logs go to stderr; stdout carries the rendered dashboard.
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let client = HttpScoringClient::from_settings(&settings)?;
    tracing::debug!(base_url = %client.base_url(), "scoring API client ready");
    let api: Arc<dyn ScoringApi> = Arc::new(client);

    let out = Output::new(!args.no_color && std::io::stdout().is_terminal());

    let res = match args.command.unwrap_or(Command::Interactive) {
        Command::Companies { search } => list_companies(api, search.as_deref(), out).await,
        Command::Show { ticker } => show(api, &ticker, out).await,
        Command::Add { ticker } => add(api, &ticker, out).await,
        Command::Interactive => interactive::run(api, !args.no_color).await,
    };

    if let Err(err) = &res {
        sentry_anyhow::capture_anyhow(err);
        tracing::error!(error = %format!("{err:#}"), "scoreboard failed");
    }
    res
}

async fn list_companies(
    api: Arc<dyn ScoringApi>,
    search: Option<&str>,
    out: Output,
) -> anyhow::Result<()> {
    let mut dash = Dashboard::new(api);
    dash.mount().finished().await;
    dash.set_search(search.unwrap_or_default());

    let snap = dash.snapshot();
    if let Some(error) = &snap.companies.error {
        anyhow::bail!("{error}");
    }
    let selector = CompanySelector::new(&snap.companies.data).search(&snap.search);
    out.print(selector, selector.height())
}

async fn show(api: Arc<dyn ScoringApi>, ticker: &str, out: Output) -> anyhow::Result<()> {
    let company = api
        .fetch_company(ticker)
        .await
        .with_context(|| format!("could not load company {ticker}"))?;

    let mut dash = Dashboard::new(api);
    let mounted = dash.mount();
    let handles = dash.select_company(company);
    mounted.finished().await;
    wait_all(handles).await;

    out.print_dashboard(&dash.snapshot())
}

async fn add(api: Arc<dyn ScoringApi>, ticker: &str, out: Output) -> anyhow::Result<()> {
    let mut dash = Dashboard::new(api);
    dash.mount().finished().await;

    dash.open_dialog();
    dash.set_entry(ticker);
    match dash.add_company().await {
        AddCompanyOutcome::Skipped => anyhow::bail!("ticker must be non-empty"),
        AddCompanyOutcome::Failed(message) => anyhow::bail!("{message}"),
        AddCompanyOutcome::Added { added, selected } => {
            tracing::info!(id = added.id, message = ?added.message, "add company finished");
            if selected.is_none() {
                eprintln!("{ticker} was added but is not in the company list yet");
            }
        }
    }

    dash.settle().await;
    out.print_dashboard(&dash.snapshot())
}

/// One-shot rendering to stdout: widgets are drawn into an off-screen buffer, then
/// written cell by cell with colors on a terminal, or as plain text otherwise.
#[derive(Debug, Clone, Copy)]
struct Output {
    color: bool,
    width: u16,
}

impl Output {
    fn new(color: bool) -> Self {
        let width = if color {
            crossterm::terminal::size().map_or(view::DEFAULT_WIDTH, |(w, _)| w)
        } else {
            view::DEFAULT_WIDTH
        };
        Self { color, width }
    }

    fn print_dashboard(self, snap: &DashboardSnapshot) -> anyhow::Result<()> {
        let dashboard = DashboardView::new(snap);
        self.print(dashboard, dashboard.height(self.width))
    }

    fn print<W: Widget>(self, widget: W, height: u16) -> anyhow::Result<()> {
        let buf = view::render_buffer(widget, self.width, height);
        let mut stdout = std::io::stdout().lock();
        if !self.color {
            stdout.write_all(view::buffer_text(&buf).as_bytes())?;
            return Ok(stdout.flush()?);
        }

        let area = buf.area;
        for y in area.top()..area.bottom() {
            for x in area.left()..area.right() {
                let cell = &buf[(x, y)];
                queue!(
                    stdout,
                    SetForegroundColor(cell.fg.into()),
                    SetBackgroundColor(cell.bg.into()),
                )?;
                if cell.modifier.contains(Modifier::BOLD) {
                    queue!(stdout, SetAttribute(Attribute::Bold))?;
                }
                queue!(stdout, Print(cell.symbol()), SetAttribute(Attribute::Reset))?;
            }
            queue!(stdout, ResetColor, Print("\n"))?;
        }
        Ok(stdout.flush()?)
    }
}

fn init_sentry(settings: &scoreboard_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
