//! Dashboard cards as ratatui widgets.
//!
//! Widgets borrow from a [`DashboardSnapshot`](crate::dashboard::DashboardSnapshot) and are
//! cheap to rebuild every frame. Each card reports the height it needs for a given width so
//! callers can lay cards out or render them off-screen with [`render_text`].

mod cards;
mod news;
mod selector;
mod shell;
mod trend;

pub use cards::{FeatureContributions, ScoreCard};
pub use news::{NewsList, MAX_NEWS_ITEMS};
pub use selector::CompanySelector;
pub use shell::{AddCompanyPanel, DashboardView};
pub use trend::ScoreTrend;

use crate::present::Tone;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph, Widget},
};

/// Width used when there is no terminal to measure.
pub const DEFAULT_WIDTH: u16 = 80;

const SKELETON: &str = "░░░░░░░░░░░░░░░░░░░░░░░░";

fn card(title: &str) -> Block<'_> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
}

fn render_card(title: &str, lines: Vec<Line<'static>>, area: Rect, buf: &mut Buffer) {
    Paragraph::new(lines).block(card(title)).render(area, buf);
}

/// Rows needed for `lines` inside a bordered card.
fn card_height(lines: usize) -> u16 {
    u16::try_from(lines + 2).unwrap_or(u16::MAX)
}

/// Text width inside a bordered card.
fn inner_width(width: u16) -> usize {
    usize::from(width.saturating_sub(2)).max(1)
}

fn skeleton(rows: usize) -> Vec<Line<'static>> {
    (0..rows)
        .map(|_| Line::styled(SKELETON, Style::default().fg(Color::DarkGray)))
        .collect()
}

fn push_error(lines: &mut Vec<Line<'static>>, error: Option<&str>) {
    if let Some(error) = error {
        lines.push(Line::styled(format!("! {error}"), Tone::Destructive.style()));
    }
}

/// Greedy word wrap; words longer than `width` are kept whole.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Renders `widget` into an off-screen buffer of the given size.
pub fn render_buffer<W: Widget>(widget: W, width: u16, height: u16) -> Buffer {
    let area = Rect::new(0, 0, width, height);
    let mut buf = Buffer::empty(area);
    widget.render(area, &mut buf);
    buf
}

/// Buffer contents as plain text, one line per row, trailing blanks trimmed.
pub fn buffer_text(buf: &Buffer) -> String {
    let area = buf.area;
    let mut out = String::new();
    for y in area.top()..area.bottom() {
        let mut row = String::new();
        for x in area.left()..area.right() {
            row.push_str(buf[(x, y)].symbol());
        }
        out.push_str(row.trim_end());
        out.push('\n');
    }
    out
}

pub fn render_text<W: Widget>(widget: W, width: u16, height: u16) -> String {
    buffer_text(&render_buffer(widget, width, height))
}
