use super::{card_height, push_error, render_card, skeleton};
use crate::domain::NewsItem;
use crate::present::{format_long_date, Sentiment};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

pub const MAX_NEWS_ITEMS: usize = 5;

#[derive(Debug, Clone, Copy)]
pub struct NewsList<'a> {
    news: &'a [NewsItem],
    loading: bool,
    error: Option<&'a str>,
}

impl<'a> NewsList<'a> {
    pub fn new(news: &'a [NewsItem]) -> Self {
        Self {
            news,
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

    fn lines(&self) -> Vec<Line<'static>> {
        if self.loading {
            return skeleton(MAX_NEWS_ITEMS * 2);
        }

        let mut lines = Vec::new();
        if self.news.is_empty() {
            lines.push(Line::raw("No news available"));
        }
        for item in self.news.iter().take(MAX_NEWS_ITEMS) {
            let style = Sentiment::parse(&item.sentiment).style();
            lines.push(Line::from(vec![
                Span::styled(style.icon, style.background()),
                Span::raw(" "),
                Span::styled(
                    item.title.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
            ]));
            let tag = if item.sentiment.trim().is_empty() {
                "neutral"
            } else {
                item.sentiment.as_str()
            };
            lines.push(Line::styled(
                format!("  {} · {tag} · {}", format_long_date(&item.date), item.url),
                Style::default().fg(Color::DarkGray),
            ));
        }
        push_error(&mut lines, self.error);
        lines
    }

    pub fn height(&self) -> u16 {
        card_height(self.lines().len())
    }
}

impl Widget for NewsList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        render_card("Latest News", self.lines(), area, buf);
    }
}
