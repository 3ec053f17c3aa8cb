use super::{
    card_height, inner_width, push_error, render_card, wrap, CompanySelector, FeatureContributions,
    NewsList, ScoreCard, ScoreTrend,
};
use crate::dashboard::{AddCompanyDialog, DashboardSnapshot};
use crate::resource::ResourceState;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Paragraph, Widget},
};

/// Data fetched for `ticker`; retained data from a previously selected company is hidden.
fn data_for<'a, T>(state: &'a ResourceState<String, T>, ticker: &str) -> Option<&'a T> {
    (state.data_key.as_deref() == Some(ticker)).then_some(&state.data)
}

enum Section<'a> {
    Text(Vec<Line<'static>>),
    Selector(CompanySelector<'a>),
    Cards(ScoreCard<'a>, FeatureContributions<'a>),
    Trend(ScoreTrend<'a>),
    News(NewsList<'a>),
    Dialog(AddCompanyPanel<'a>),
}

impl Section<'_> {
    fn height(&self, width: u16) -> u16 {
        match self {
            Section::Text(lines) => u16::try_from(lines.len()).unwrap_or(u16::MAX),
            Section::Selector(w) => w.height(),
            Section::Cards(score, contributions) => {
                let (left, right) = split_width(width);
                score.height(left).max(contributions.height(right))
            }
            Section::Trend(w) => w.height(width),
            Section::News(w) => w.height(),
            Section::Dialog(w) => w.height(width),
        }
    }

    fn render(self, area: Rect, buf: &mut Buffer) {
        match self {
            Section::Text(lines) => Paragraph::new(lines).render(area, buf),
            Section::Selector(w) => w.render(area, buf),
            Section::Cards(score, contributions) => {
                let columns = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([
                        Constraint::Length(split_width(area.width).0),
                        Constraint::Min(0),
                    ])
                    .split(area);
                score.render(columns[0], buf);
                contributions.render(columns[1], buf);
            }
            Section::Trend(w) => w.render(area, buf),
            Section::News(w) => w.render(area, buf),
            Section::Dialog(w) => w.render(area, buf),
        }
    }
}

fn split_width(width: u16) -> (u16, u16) {
    let left = width / 2;
    (left, width - left)
}

/// The whole dashboard, top to bottom: header, selector, score and contributions side by
/// side, trend, news, and the add-company dialog when it is open.
#[derive(Debug, Clone, Copy)]
pub struct DashboardView<'a> {
    snap: &'a DashboardSnapshot,
}

impl<'a> DashboardView<'a> {
    pub fn new(snap: &'a DashboardSnapshot) -> Self {
        Self { snap }
    }

    fn sections(&self, width: u16) -> Vec<Section<'a>> {
        let snap = self.snap;
        let mut header = vec![Line::styled(
            "Credit Score Dashboard",
            Style::default().add_modifier(Modifier::BOLD),
        )];
        if let Some(company) = &snap.selected {
            header.push(Line::styled(
                format!("Analyzing {} ({})", company.name, company.ticker),
                Style::default().fg(Color::Gray),
            ));
        }
        header.push(Line::default());

        let mut sections = vec![
            Section::Text(header),
            Section::Selector(
                CompanySelector::new(&snap.companies.data)
                    .selected(snap.selected.as_ref())
                    .search(&snap.search)
                    .loading(snap.companies.loading)
                    .error(snap.companies.error.as_deref()),
            ),
        ];

        match &snap.selected {
            None => {
                let mut welcome = vec![
                    Line::default(),
                    Line::styled(
                        "Welcome to Credit Score Dashboard",
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                ];
                let text = "Select a company to view detailed credit analysis, score trends, \
                            and the latest market news.";
                welcome.extend(wrap(text, usize::from(width.max(1))).into_iter().map(Line::raw));
                sections.push(Section::Text(welcome));
            }
            Some(company) => {
                let ticker = company.ticker.as_str();
                let score = data_for(&snap.score, ticker).and_then(Option::as_ref);
                let history = data_for(&snap.history, ticker).map_or(&[][..], Vec::as_slice);
                let news = data_for(&snap.news, ticker).map_or(&[][..], Vec::as_slice);

                sections.push(Section::Cards(
                    ScoreCard::new(score)
                        .company_selected(true)
                        .loading(snap.score.loading)
                        .error(snap.score.error.as_deref()),
                    FeatureContributions::new(score.map(|s| &s.feature_contributions))
                        .loading(snap.score.loading),
                ));
                sections.push(Section::Trend(
                    ScoreTrend::new(history)
                        .loading(snap.history.loading)
                        .error(snap.history.error.as_deref()),
                ));
                sections.push(Section::News(
                    NewsList::new(news)
                        .loading(snap.news.loading)
                        .error(snap.news.error.as_deref()),
                ));
            }
        }

        if snap.dialog.open {
            sections.push(Section::Dialog(AddCompanyPanel::new(&snap.dialog)));
        }
        sections
    }

    pub fn height(&self, width: u16) -> u16 {
        self.sections(width)
            .iter()
            .fold(0u16, |acc, s| acc.saturating_add(s.height(width)))
    }
}

impl Widget for DashboardView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let sections = self.sections(area.width);
        let constraints: Vec<Constraint> = sections
            .iter()
            .map(|s| Constraint::Length(s.height(area.width)))
            .collect();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);
        for (section, chunk) in sections.into_iter().zip(chunks.iter()) {
            section.render(*chunk, buf);
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AddCompanyPanel<'a> {
    dialog: &'a AddCompanyDialog,
}

impl<'a> AddCompanyPanel<'a> {
    pub fn new(dialog: &'a AddCompanyDialog) -> Self {
        Self { dialog }
    }

    fn lines(&self, width: u16) -> Vec<Line<'static>> {
        let dialog = self.dialog;
        let mut lines: Vec<Line<'static>> =
            wrap("Enter a ticker symbol to add a new company.", inner_width(width))
                .into_iter()
                .map(Line::raw)
                .collect();
        lines.push(Line::from(format!("ticker: {}", dialog.entry)));
        push_error(&mut lines, dialog.error.as_deref());

        let (button, style) = if dialog.adding {
            ("[ Adding... ]", Style::default().fg(Color::Yellow))
        } else if dialog.can_submit() {
            ("[ Add ]", Style::default().add_modifier(Modifier::BOLD))
        } else {
            ("[ Add ] (disabled)", Style::default().fg(Color::DarkGray))
        };
        lines.push(Line::styled(button, style));
        lines.push(Line::styled(
            "Enter to add, Esc to cancel",
            Style::default().fg(Color::DarkGray),
        ));
        lines
    }

    pub fn height(&self, width: u16) -> u16 {
        card_height(self.lines(width).len())
    }
}

impl Widget for AddCompanyPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        render_card("Add Company", self.lines(area.width), area, buf);
    }
}
