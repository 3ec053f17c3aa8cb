use super::{card, card_height, inner_width, push_error, render_card, skeleton, wrap};
use crate::domain::ScoreHistoryPoint;
use crate::present::{format_axis_date, ChartScale, ScoreBand};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    symbols::Marker,
    text::Line,
    widgets::{Axis, Chart, Dataset, GraphType, Paragraph, Widget},
};

const TITLE: &str = "Score History";
const CHART_ROWS: u16 = 10;

/// Score history as a line chart, points in the order the backend returned them.
#[derive(Debug, Clone, Copy)]
pub struct ScoreTrend<'a> {
    history: &'a [ScoreHistoryPoint],
    loading: bool,
    error: Option<&'a str>,
}

impl<'a> ScoreTrend<'a> {
    pub fn new(history: &'a [ScoreHistoryPoint]) -> Self {
        Self {
            history,
            loading: false,
            error: None,
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

    /// Everything but the chart: placeholder or latest explanation, then the error line.
    fn footer(&self, width: u16) -> Vec<Line<'static>> {
        if self.loading {
            return skeleton(8);
        }
        let mut lines = Vec::new();
        match self.history.last() {
            None => lines.push(Line::raw("No historical data available")),
            Some(last) if !last.explanation.trim().is_empty() => {
                let latest = format!("Latest: {}", last.explanation.trim());
                lines.extend(wrap(&latest, inner_width(width)).into_iter().map(Line::raw));
            }
            Some(_) => {}
        }
        push_error(&mut lines, self.error);
        lines
    }

    fn has_chart(&self) -> bool {
        !self.loading && !self.history.is_empty()
    }

    pub fn height(&self, width: u16) -> u16 {
        let chart = if self.has_chart() { CHART_ROWS } else { 0 };
        card_height(self.footer(width).len()) + chart
    }
}

impl Widget for ScoreTrend<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let footer = self.footer(area.width);
        let Some(scale) = ChartScale::for_history(self.history).filter(|_| self.has_chart()) else {
            render_card(TITLE, footer, area, buf);
            return;
        };

        let block = card(TITLE);
        let inner = block.inner(area);
        block.render(area, buf);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(CHART_ROWS),
                Constraint::Length(u16::try_from(footer.len()).unwrap_or(u16::MAX)),
            ])
            .split(inner);

        let line: Vec<(f64, f64)> = self
            .history
            .iter()
            .enumerate()
            .map(|(i, p)| (i as f64, f64::from(p.score)))
            .collect();

        // One scatter set per band so each point carries its band color.
        let banded: Vec<(ScoreBand, Vec<(f64, f64)>)> =
            [ScoreBand::Excellent, ScoreBand::Good, ScoreBand::Fair]
                .into_iter()
                .map(|band| {
                    let points = line
                        .iter()
                        .copied()
                        .filter(|(_, s)| ScoreBand::from_score(*s as i32) == band)
                        .collect();
                    (band, points)
                })
                .collect();

        let mut datasets = vec![Dataset::default()
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Cyan))
            .data(&line)];
        for (band, points) in &banded {
            datasets.push(
                Dataset::default()
                    .marker(Marker::Dot)
                    .graph_type(GraphType::Scatter)
                    .style(band.tone().style())
                    .data(points),
            );
        }

        let last = self.history.len() - 1;
        let mut x_labels = vec![Line::from(format_axis_date(&self.history[0].date))];
        if last >= 2 {
            x_labels.push(Line::from(format_axis_date(&self.history[last / 2].date)));
        }
        if last >= 1 {
            x_labels.push(Line::from(format_axis_date(&self.history[last].date)));
        }
        let y_labels = vec![
            Line::from(format!("{:.0}", scale.lo)),
            Line::from(format!("{:.0}", (scale.lo + scale.hi) / 2.0)),
            Line::from(format!("{:.0}", scale.hi)),
        ];

        Chart::new(datasets)
            .x_axis(
                Axis::default()
                    .style(Style::default().fg(Color::Gray))
                    .bounds([0.0, (last as f64).max(1.0)])
                    .labels(x_labels),
            )
            .y_axis(
                Axis::default()
                    .style(Style::default().fg(Color::Gray))
                    .bounds([scale.lo, scale.hi])
                    .labels(y_labels),
            )
            .render(chunks[0], buf);

        Paragraph::new(footer).render(chunks[1], buf);
    }
}
