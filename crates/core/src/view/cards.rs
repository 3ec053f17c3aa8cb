use super::{card_height, inner_width, push_error, render_card, skeleton, wrap};
use crate::domain::{Contributions, CreditScore};
use crate::present::{normalize_contributions, ScoreBand};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

const MAX_BAR_WIDTH: usize = 30;

/// Credit score, band badge and explanation for the selected company.
#[derive(Debug, Clone, Copy)]
pub struct ScoreCard<'a> {
    score: Option<&'a CreditScore>,
    loading: bool,
    error: Option<&'a str>,
    company_selected: bool,
}

impl<'a> ScoreCard<'a> {
    pub fn new(score: Option<&'a CreditScore>) -> Self {
        Self {
            score,
            loading: false,
            error: None,
            company_selected: false,
        }
    }

    pub fn loading(mut self, loading: bool) -> Self {
        self.loading = loading;
        self
    }

    pub fn error(mut self, error: Option<&'a str>) -> Self {
        self.error = error;
        self
    }

    /// With a company selected, a missing score reads "No score available" instead of
    /// prompting for a selection.
    pub fn company_selected(mut self, selected: bool) -> Self {
        self.company_selected = selected;
        self
    }

    fn lines(&self, width: u16) -> Vec<Line<'static>> {
        if self.loading {
            return skeleton(4);
        }

        let mut lines = Vec::new();
        match self.score {
            None if self.company_selected => lines.push(Line::raw("No score available")),
            None => lines.push(Line::raw("Select a company to view credit score")),
            Some(score) => {
                let band = ScoreBand::from_score(score.score);
                lines.push(Line::from(vec![
                    Span::styled(score.score.to_string(), band.style()),
                    Span::raw("  "),
                    Span::styled(format!(" {} ", band.label()), band.background()),
                ]));
                lines.push(Line::default());
                lines.push(Line::styled(
                    "Explanation",
                    Style::default().add_modifier(Modifier::BOLD),
                ));
                for line in wrap(&score.explanation, inner_width(width)) {
                    lines.push(Line::raw(line));
                }
            }
        }
        push_error(&mut lines, self.error);
        lines
    }

    pub fn height(&self, width: u16) -> u16 {
        card_height(self.lines(width).len())
    }
}

impl Widget for ScoreCard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        render_card("Credit Score", self.lines(area.width), area, buf);
    }
}

/// One signed bar per nonzero feature, largest magnitude first.
#[derive(Debug, Clone, Copy)]
pub struct FeatureContributions<'a> {
    contributions: Option<&'a Contributions>,
    loading: bool,
}

impl<'a> FeatureContributions<'a> {
    pub fn new(contributions: Option<&'a Contributions>) -> Self {
        Self {
            contributions,
            loading: false,
        }
    }

    pub fn loading(mut self, loading: bool) -> Self {
        self.loading = loading;
        self
    }

    fn lines(&self, width: u16) -> Vec<Line<'static>> {
        if self.loading {
            return skeleton(6);
        }
        let Some(contributions) = self.contributions else {
            return vec![Line::raw("No contribution data available")];
        };

        let bar_width = inner_width(width).min(MAX_BAR_WIDTH);
        let mut lines = Vec::new();
        for bar in normalize_contributions(contributions) {
            let style = bar.tone().style();
            let filled = ((bar.percentage / 100.0) * bar_width as f64).round() as usize;
            let filled = filled.clamp(1, bar_width);
            lines.push(Line::from(vec![
                Span::raw(format!("{:<24} ", bar.feature)),
                Span::styled(format!("{:>10}", bar.signed_label()), style),
            ]));
            lines.push(Line::from(vec![
                Span::styled("█".repeat(filled), style),
                Span::styled(
                    "·".repeat(bar_width - filled),
                    Style::default().fg(Color::DarkGray),
                ),
            ]));
        }
        lines.push(Line::default());
        let legend = "Positive values indicate positive contributions to the credit score, \
                      negative values indicate negative impacts.";
        for line in wrap(legend, inner_width(width)) {
            lines.push(Line::styled(line, Style::default().fg(Color::Gray)));
        }
        lines
    }

    pub fn height(&self, width: u16) -> u16 {
        card_height(self.lines(width).len())
    }
}

impl Widget for FeatureContributions<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        render_card("Feature Contributions", self.lines(area.width), area, buf);
    }
}
