use anyhow::Context;
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::{Stream, StreamExt};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use scoreboard_core::api::ScoringApi;
use scoreboard_core::dashboard::{AddCompanyOutcome, AddCompleted, Dashboard, PendingAdd};
use scoreboard_core::domain::Company;
use scoreboard_core::view::{self, DashboardView};
use std::io;
use std::sync::Arc;

const HELP: &str = "\
commands:
  select <ticker|#>   select a company by ticker or list position
  clear               drop the selection
  search [term]       filter the company list (no term clears the filter)
  add [ticker]        open the add-company dialog, or add a ticker directly
  cancel              close the add-company dialog
  refresh             refetch the company list and the selected company
  help                toggle this help
  quit                exit

keys:
  Enter               run the command, or submit the add-company dialog
  Esc                 clear the prompt, or close the dialog
  PageUp/PageDown     scroll the dashboard
  Ctrl-C              exit
";

const HINT: &str = "type `help` for commands, PageUp/PageDown to scroll";
const PAGE: u16 = 10;

#[derive(Debug, PartialEq, Eq)]
enum Input {
    Select(String),
    Clear,
    Search(String),
    Add(Option<String>),
    Cancel,
    Refresh,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

impl Input {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        let (cmd, rest) = match line.split_once(char::is_whitespace) {
            Some((cmd, rest)) => (cmd, rest.trim()),
            None => (line, ""),
        };
        match cmd.to_ascii_lowercase().as_str() {
            "" => Self::Empty,
            "select" | "s" if !rest.is_empty() => Self::Select(rest.to_string()),
            "clear" => Self::Clear,
            "search" | "/" => Self::Search(rest.to_string()),
            "add" | "a" => Self::Add((!rest.is_empty()).then(|| rest.to_string())),
            "cancel" => Self::Cancel,
            "refresh" | "r" => Self::Refresh,
            "help" | "h" | "?" => Self::Help,
            "quit" | "q" | "exit" => Self::Quit,
            _ => Self::Unknown(line.to_string()),
        }
    }
}

/// Resolves `target` as a 1-based position in the filtered list, then as a ticker.
fn resolve<'a>(companies: &'a [Company], search: &str, target: &str) -> Option<&'a Company> {
    if let Ok(n) = target.parse::<usize>() {
        return companies
            .iter()
            .filter(|c| c.matches_search(search))
            .nth(n.checked_sub(1)?);
    }
    companies.iter().find(|c| c.ticker_matches(target))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

struct App {
    dash: Dashboard,
    prompt: String,
    status: Option<String>,
    show_help: bool,
    scroll: u16,
    pending: Option<PendingAdd>,
    color: bool,
}

impl App {
    fn new(dash: Dashboard, color: bool) -> Self {
        Self {
            dash,
            prompt: String::new(),
            status: None,
            show_help: false,
            scroll: 0,
            pending: None,
            color,
        }
    }

    fn on_key(&mut self, key: KeyEvent) -> Flow {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Flow::Quit;
        }
        match key.code {
            KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(PAGE),
            KeyCode::PageDown => self.scroll = self.scroll.saturating_add(PAGE),
            _ if self.dash.dialog().open => self.on_dialog_key(key),
            KeyCode::Char(c) => self.prompt.push(c),
            KeyCode::Backspace => {
                self.prompt.pop();
            }
            KeyCode::Esc => {
                self.prompt.clear();
                self.show_help = false;
            }
            KeyCode::Enter => {
                let line = std::mem::take(&mut self.prompt);
                return self.run_command(Input::parse(&line));
            }
            _ => {}
        }
        Flow::Continue
    }

    /// Keys go to the dialog's ticker entry while it is open.
    fn on_dialog_key(&mut self, key: KeyEvent) {
        let adding = self.dash.dialog().adding;
        let mut entry = self.dash.dialog().entry.clone();
        match key.code {
            KeyCode::Char(c) if !adding => {
                entry.push(c);
                self.dash.set_entry(entry);
            }
            KeyCode::Backspace if !adding => {
                entry.pop();
                self.dash.set_entry(entry);
            }
            KeyCode::Enter => self.submit_add(),
            KeyCode::Esc => self.dash.close_dialog(),
            _ => {}
        }
    }

    fn submit_add(&mut self) {
        if let Some(pending) = self.dash.start_add() {
            self.status = Some(format!("Adding {}...", pending.ticker()));
            self.pending = Some(pending);
        }
    }

    fn on_added(&mut self, done: AddCompleted) {
        let ticker = done.ticker.clone();
        self.status = match self.dash.finish_add(done) {
            AddCompanyOutcome::Added {
                selected: Some(company),
                ..
            } => Some(format!("Added {} ({})", company.name, company.ticker)),
            AddCompanyOutcome::Added { selected: None, .. } => {
                Some(format!("{ticker} was added but is not in the company list yet"))
            }
            AddCompanyOutcome::Failed(message) => Some(message),
            AddCompanyOutcome::Skipped => None,
        };
    }

    fn run_command(&mut self, input: Input) -> Flow {
        self.status = None;
        match input {
            Input::Quit => return Flow::Quit,
            Input::Empty => {}
            Input::Help => self.show_help = !self.show_help,
            Input::Unknown(text) => {
                self.status = Some(format!("unknown command: {text} (type `help`)"));
            }
            Input::Select(target) => {
                let companies = self.dash.companies();
                match resolve(&companies, self.dash.search(), &target) {
                    Some(company) => {
                        self.dash.select_company(company.clone());
                        self.scroll = 0;
                    }
                    None => self.status = Some(format!("no company matches {target}")),
                }
            }
            Input::Clear => self.dash.clear_selection(),
            Input::Search(term) => self.dash.set_search(term),
            Input::Add(None) => self.dash.open_dialog(),
            Input::Add(Some(ticker)) => {
                self.dash.open_dialog();
                self.dash.set_entry(ticker);
                self.submit_add();
            }
            Input::Cancel => self.dash.close_dialog(),
            Input::Refresh => {
                self.dash.refresh();
            }
        }
        Flow::Continue
    }

    fn draw(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(1),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(frame.area());

        if self.show_help {
            let help = Paragraph::new(HELP).block(
                Block::default()
                    .title("Help")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::White)),
            );
            frame.render_widget(help, chunks[0]);
        } else {
            self.draw_dashboard(frame, chunks[0]);
        }

        let status = self.status.as_deref().unwrap_or(HINT);
        frame.render_widget(
            Paragraph::new(status).style(Style::default().fg(Color::Gray)),
            chunks[1],
        );

        let prompt = if self.dash.dialog().open {
            format!("ticker> {}", self.dash.dialog().entry)
        } else {
            format!("> {}", self.prompt)
        };
        let cursor_x = chunks[2].x + u16::try_from(prompt.chars().count()).unwrap_or(u16::MAX);
        frame.render_widget(Paragraph::new(Line::raw(prompt)), chunks[2]);
        let cursor_x = cursor_x.min(chunks[2].right().saturating_sub(1));
        frame.set_cursor_position((cursor_x, chunks[2].y));

        if !self.color {
            let area = frame.area();
            frame.buffer_mut().set_style(area, Style::reset());
        }
    }

    /// Renders the full dashboard off-screen and copies the scrolled window into `area`.
    fn draw_dashboard(&mut self, frame: &mut Frame, area: Rect) {
        let snap = self.dash.snapshot();
        let dashboard = DashboardView::new(&snap);
        let height = dashboard.height(area.width);
        self.scroll = self.scroll.min(height.saturating_sub(area.height));

        let full = view::render_buffer(dashboard, area.width, height);
        let buf = frame.buffer_mut();
        let rows = area.height.min(height.saturating_sub(self.scroll));
        for y in 0..rows {
            for x in 0..area.width {
                buf[(area.x + x, area.y + y)] = full[(x, y + self.scroll)].clone();
            }
        }
    }
}

/// Resolves once the in-flight add finishes; never resolves when there is none.
async fn wait_add(pending: &mut Option<PendingAdd>) -> AddCompleted {
    match pending {
        Some(pending) => pending.await,
        None => std::future::pending().await,
    }
}

pub async fn run(api: Arc<dyn ScoringApi>, color: bool) -> anyhow::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let mut app = App::new(Dashboard::new(api), color);
    let res = run_loop(&mut terminal, &mut app, EventStream::new()).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    tracing::debug!("interactive session ended");
    res
}

/// Redraws after every key, finished add or resource change. An add runs on its own task,
/// so keys (Ctrl-C included) keep working while the backend is slow.
async fn run_loop<B, S>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    mut events: S,
) -> anyhow::Result<()>
where
    B: Backend,
    S: Stream<Item = io::Result<Event>> + Unpin,
{
    let mut watch = app.dash.watch();
    app.dash.mount();

    loop {
        // Mark before drawing so a change that lands mid-draw still wakes the loop.
        watch.mark_seen();
        terminal.draw(|frame| app.draw(frame))?;

        tokio::select! {
            event = events.next() => {
                let Some(event) = event else {
                    break;
                };
                if let Event::Key(key) = event.context("failed to read terminal event")? {
                    if key.kind == KeyEventKind::Press && app.on_key(key) == Flow::Quit {
                        break;
                    }
                }
            }
            done = wait_add(&mut app.pending), if app.pending.is_some() => {
                app.pending = None;
                app.on_added(done);
            }
            alive = watch.changed() => {
                if !alive {
                    break;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::mpsc;
    use ratatui::backend::TestBackend;
    use scoreboard_core::api::error::RequestFailed;
    use scoreboard_core::api::{ApiResult, Operation};
    use scoreboard_core::domain::{AddedCompany, CreditScore, NewsItem, ScoreHistoryPoint};
    use std::time::Duration;

    fn companies() -> Vec<Company> {
        [(1, "Apple Inc.", "AAPL"), (2, "Microsoft", "MSFT"), (3, "Nvidia", "NVDA")]
            .into_iter()
            .map(|(id, name, ticker)| Company {
                id,
                name: name.to_string(),
                ticker: ticker.to_string(),
            })
            .collect()
    }

    /// Serves a fixed company list; `add_company` never answers.
    struct StalledAdd;

    #[async_trait::async_trait]
    impl ScoringApi for StalledAdd {
        async fn fetch_companies(&self) -> ApiResult<Vec<Company>> {
            Ok(companies())
        }

        async fn fetch_company(&self, ticker: &str) -> ApiResult<Company> {
            companies()
                .into_iter()
                .find(|c| c.ticker_matches(ticker))
                .ok_or_else(|| RequestFailed::new(Operation::FetchCompany, "not found"))
        }

        async fn fetch_credit_score(&self, _ticker: &str) -> ApiResult<CreditScore> {
            Err(RequestFailed::new(Operation::FetchCreditScore, "unavailable"))
        }

        async fn fetch_score_history(&self, _ticker: &str) -> ApiResult<Vec<ScoreHistoryPoint>> {
            Ok(Vec::new())
        }

        async fn fetch_news(&self, _ticker: &str) -> ApiResult<Vec<NewsItem>> {
            Ok(Vec::new())
        }

        async fn add_company(&self, _ticker: &str) -> ApiResult<AddedCompany> {
            std::future::pending().await
        }
    }

    fn app() -> App {
        App::new(Dashboard::new(Arc::new(StalledAdd)), false)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            assert_eq!(app.on_key(key(KeyCode::Char(c))), Flow::Continue);
        }
    }

    fn screen(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        terminal.draw(|frame| app.draw(frame)).unwrap();
        view::buffer_text(terminal.backend().buffer())
    }

    #[test]
    fn parses_commands() {
        assert_eq!(Input::parse("  select  aapl "), Input::Select("aapl".to_string()));
        assert_eq!(Input::parse("SEARCH micro soft"), Input::Search("micro soft".to_string()));
        assert_eq!(Input::parse("search"), Input::Search(String::new()));
        assert_eq!(Input::parse("add"), Input::Add(None));
        assert_eq!(Input::parse("add nvda"), Input::Add(Some("nvda".to_string())));
        assert_eq!(Input::parse("q"), Input::Quit);
        assert_eq!(Input::parse(""), Input::Empty);
        assert_eq!(Input::parse("select"), Input::Unknown("select".to_string()));
        assert_eq!(Input::parse("frobnicate"), Input::Unknown("frobnicate".to_string()));
    }

    #[test]
    fn resolves_position_within_filtered_list() {
        let list = companies();
        assert_eq!(resolve(&list, "", "2").map(|c| c.id), Some(2));
        assert_eq!(resolve(&list, "nv", "1").map(|c| c.id), Some(3));
        assert!(resolve(&list, "", "0").is_none());
        assert!(resolve(&list, "", "9").is_none());
    }

    #[test]
    fn resolves_ticker_case_insensitively() {
        let list = companies();
        assert_eq!(resolve(&list, "", "msft").map(|c| c.id), Some(2));
        assert!(resolve(&list, "", "TSLA").is_none());
    }

    #[tokio::test]
    async fn ctrl_c_exits_while_add_is_in_flight() {
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        let mut app = app();

        let (tx, rx) = mpsc::unbounded();
        for c in "add nvda".chars() {
            tx.unbounded_send(Ok(Event::Key(key(KeyCode::Char(c))))).unwrap();
        }
        tx.unbounded_send(Ok(Event::Key(key(KeyCode::Enter)))).unwrap();
        tx.unbounded_send(Ok(Event::Key(KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL,
        ))))
        .unwrap();

        let res = tokio::time::timeout(
            Duration::from_secs(5),
            run_loop(&mut terminal, &mut app, rx),
        )
        .await
        .expect("loop should exit while add_company is stalled");
        assert!(res.is_ok());
        assert!(app.dash.dialog().adding);
        assert!(app.pending.is_some());
        assert_eq!(app.status.as_deref(), Some("Adding nvda..."));
        drop(tx);
    }

    #[tokio::test]
    async fn bare_add_opens_dialog_that_accepts_typing() {
        let mut app = app();
        type_text(&mut app, "add");
        app.on_key(key(KeyCode::Enter));
        assert!(app.dash.dialog().open);
        assert!(!app.dash.dialog().can_submit());

        type_text(&mut app, "nvdx");
        app.on_key(key(KeyCode::Backspace));
        type_text(&mut app, "a");
        assert_eq!(app.dash.dialog().entry, "nvda");
        assert!(app.dash.dialog().can_submit());
        assert!(app.prompt.is_empty());

        let out = screen(&mut app);
        assert!(out.contains("ticker: nvda"));
        assert!(out.contains("[ Add ]"));
        assert!(out.contains("ticker> nvda"));

        app.on_key(key(KeyCode::Enter));
        assert!(app.dash.dialog().adding);
        assert!(app.pending.as_ref().is_some_and(|p| p.ticker() == "nvda"));

        // Typing is ignored while the request runs; a second Enter does not resubmit.
        type_text(&mut app, "x");
        app.on_key(key(KeyCode::Enter));
        assert_eq!(app.dash.dialog().entry, "nvda");
    }

    #[tokio::test]
    async fn esc_closes_dialog_and_commands_resume() {
        let mut app = app();
        type_text(&mut app, "add");
        app.on_key(key(KeyCode::Enter));
        app.on_key(key(KeyCode::Esc));
        assert!(!app.dash.dialog().open);

        type_text(&mut app, "bogus");
        app.on_key(key(KeyCode::Enter));
        assert_eq!(
            app.status.as_deref(),
            Some("unknown command: bogus (type `help`)")
        );
        type_text(&mut app, "q");
        assert_eq!(app.on_key(key(KeyCode::Enter)), Flow::Quit);
    }

    #[tokio::test]
    async fn failed_add_reports_message() {
        let mut app = app();
        app.dash.open_dialog();
        app.dash.set_entry("NVDA");
        app.on_added(AddCompleted {
            ticker: "NVDA".to_string(),
            result: Err("Failed to add company: HTTP 500".to_string()),
        });
        assert_eq!(app.status.as_deref(), Some("Failed to add company: HTTP 500"));
        assert!(app.dash.dialog().open);
        assert_eq!(
            app.dash.dialog().error.as_deref(),
            Some("Failed to add company: HTTP 500")
        );
    }

    #[tokio::test]
    async fn plain_mode_strips_colors() {
        let mut app = app();
        app.status = Some("Failed to add company".to_string());
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        terminal.draw(|frame| app.draw(frame)).unwrap();
        let buf = terminal.backend().buffer();
        assert!(buf.content().iter().all(|c| c.fg == Color::Reset && c.bg == Color::Reset));
        assert!(view::buffer_text(buf).contains("Failed to add company"));
    }
}
