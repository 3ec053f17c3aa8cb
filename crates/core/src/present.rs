//! Pure helpers that turn domain values into display decisions.

use crate::domain::{Contributions, ScoreHistoryPoint};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use ratatui::style::{Color, Modifier, Style};

pub const EXCELLENT_MIN_SCORE: i32 = 750;
pub const GOOD_MIN_SCORE: i32 = 650;

/// Padding added above and below the score range on the trend chart.
pub const CHART_PADDING: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Warning,
    Destructive,
    Muted,
}

impl Tone {
    pub fn color(self) -> Color {
        match self {
            Tone::Success => Color::Green,
            Tone::Warning => Color::Yellow,
            Tone::Destructive => Color::Red,
            Tone::Muted => Color::DarkGray,
        }
    }

    /// Foreground in the tone's color.
    pub fn style(self) -> Style {
        Style::default().fg(self.color())
    }

    /// Filled badge: the tone's color behind contrasting text.
    pub fn background(self) -> Style {
        let fg = match self {
            Tone::Muted => Color::White,
            _ => Color::Black,
        };
        Style::default()
            .fg(fg)
            .bg(self.color())
            .add_modifier(Modifier::BOLD)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    Excellent,
    Good,
    Fair,
}

impl ScoreBand {
    pub fn from_score(score: i32) -> Self {
        if score >= EXCELLENT_MIN_SCORE {
            ScoreBand::Excellent
        } else if score >= GOOD_MIN_SCORE {
            ScoreBand::Good
        } else {
            ScoreBand::Fair
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ScoreBand::Excellent => "Excellent",
            ScoreBand::Good => "Good",
            ScoreBand::Fair => "Fair",
        }
    }

    pub fn tone(self) -> Tone {
        match self {
            ScoreBand::Excellent => Tone::Success,
            ScoreBand::Good => Tone::Warning,
            ScoreBand::Fair => Tone::Destructive,
        }
    }

    /// Style for the score number.
    pub fn style(self) -> Style {
        self.tone().style().add_modifier(Modifier::BOLD)
    }

    /// Style for the band label badge.
    pub fn background(self) -> Style {
        self.tone().background()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureBar {
    pub feature: String,
    pub value: f64,
    /// Width relative to the largest absolute contribution, in `[0, 100]`.
    pub percentage: f64,
}

impl FeatureBar {
    pub fn is_positive(&self) -> bool {
        self.value > 0.0
    }

    pub fn tone(&self) -> Tone {
        if self.is_positive() {
            Tone::Success
        } else {
            Tone::Destructive
        }
    }

    /// Signed value, e.g. `+12.5` or `-3`.
    pub fn signed_label(&self) -> String {
        if self.is_positive() {
            format!("+{}", self.value)
        } else {
            format!("{}", self.value)
        }
    }
}

/// Largest absolute contribution, never below 1.
pub fn max_abs_contribution(contributions: &Contributions) -> f64 {
    contributions
        .values()
        .map(|v| v.abs())
        .filter(|v| v.is_finite())
        .fold(1.0, f64::max)
}

/// Nonzero contributions sorted by descending magnitude, scaled against the largest one.
/// Ties keep the backend's order.
pub fn normalize_contributions(contributions: &Contributions) -> Vec<FeatureBar> {
    let max_abs = max_abs_contribution(contributions);

    let mut entries: Vec<(&String, f64)> = contributions
        .iter()
        .map(|(k, v)| (k, *v))
        .filter(|(_, v)| *v != 0.0 && v.is_finite())
        .collect();
    entries.sort_by(|a, b| {
        b.1.abs()
            .partial_cmp(&a.1.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    entries
        .into_iter()
        .map(|(feature, value)| FeatureBar {
            feature: feature.clone(),
            value,
            percentage: (value.abs() / max_abs * 100.0).clamp(0.0, 100.0),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentimentStyle {
    pub icon: &'static str,
    pub tone: Tone,
}

impl SentimentStyle {
    /// Style for the icon badge in front of a headline.
    pub fn background(self) -> Style {
        self.tone.background()
    }
}

impl Sentiment {
    /// Anything other than `positive`/`negative` is neutral.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "positive" => Sentiment::Positive,
            "negative" => Sentiment::Negative,
            _ => Sentiment::Neutral,
        }
    }

    pub fn style(self) -> SentimentStyle {
        match self {
            Sentiment::Positive => SentimentStyle {
                icon: "▲",
                tone: Tone::Success,
            },
            Sentiment::Negative => SentimentStyle {
                icon: "▼",
                tone: Tone::Destructive,
            },
            Sentiment::Neutral => SentimentStyle {
                icon: "–",
                tone: Tone::Muted,
            },
        }
    }
}

/// Vertical range of the trend chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartScale {
    pub lo: f64,
    pub hi: f64,
}

impl ChartScale {
    /// `[min - 50, max + 50]` over the history's scores; `None` for an empty history.
    pub fn for_history(history: &[ScoreHistoryPoint]) -> Option<Self> {
        let min = history.iter().map(|p| p.score).min()?;
        let max = history.iter().map(|p| p.score).max()?;
        Some(Self {
            lo: f64::from(min) - CHART_PADDING,
            hi: f64::from(max) + CHART_PADDING,
        })
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|d| d.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|d| d.date())
        })
}

/// `Oct 19, 2026`; unparsable input is returned as-is.
pub fn format_long_date(raw: &str) -> String {
    parse_date(raw)
        .map(|d| d.format("%b %-d, %Y").to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// Chart axis label, `Oct 26`; unparsable input is returned as-is.
pub fn format_axis_date(raw: &str) -> String {
    parse_date(raw)
        .map(|d| d.format("%b %y").to_string())
        .unwrap_or_else(|| raw.to_string())
}
