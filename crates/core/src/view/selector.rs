use super::{card_height, push_error, render_card, skeleton};
use crate::domain::Company;
use crate::present::Tone;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Line,
    widgets::Widget,
};

/// Company list filtered by the search term. Rows are numbered within the filtered list so
/// a position typed at the prompt matches what is on screen.
#[derive(Debug, Clone, Copy)]
pub struct CompanySelector<'a> {
    companies: &'a [Company],
    selected: Option<&'a Company>,
    search: &'a str,
    loading: bool,
    error: Option<&'a str>,
}

impl<'a> CompanySelector<'a> {
    pub fn new(companies: &'a [Company]) -> Self {
        Self {
            companies,
            selected: None,
            search: "",
            loading: false,
            error: None,
        }
    }

    pub fn selected(mut self, selected: Option<&'a Company>) -> Self {
        self.selected = selected;
        self
    }

    pub fn search(mut self, search: &'a str) -> Self {
        self.search = search;
        self
    }

    pub fn loading(mut self, loading: bool) -> Self {
        self.loading = loading;
        self
    }

    pub fn error(mut self, error: Option<&'a str>) -> Self {
        self.error = error;
        self
    }

    fn lines(&self) -> Vec<Line<'static>> {
        if self.loading {
            return skeleton(5);
        }

        let mut lines = Vec::new();
        if !self.search.trim().is_empty() {
            lines.push(Line::styled(
                format!("search: {}", self.search.trim()),
                Style::default().fg(Color::Gray),
            ));
        }

        let mut shown = 0;
        let filtered = self.companies.iter().filter(|c| c.matches_search(self.search));
        for (i, company) in filtered.enumerate() {
            shown += 1;
            let is_selected = self.selected.is_some_and(|s| s.id == company.id);
            let marker = if is_selected { "▶" } else { " " };
            let row = format!("{marker} {:>2}. {:<8} {}", i + 1, company.ticker, company.name);
            if is_selected {
                lines.push(Line::styled(
                    row,
                    Tone::Success.style().add_modifier(Modifier::BOLD),
                ));
            } else {
                lines.push(Line::raw(row));
            }
        }
        if shown == 0 {
            lines.push(Line::raw("No companies found"));
        }
        push_error(&mut lines, self.error);
        lines
    }

    pub fn height(&self) -> u16 {
        card_height(self.lines().len())
    }
}

impl Widget for CompanySelector<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        render_card("Companies", self.lines(), area, buf);
    }
}
