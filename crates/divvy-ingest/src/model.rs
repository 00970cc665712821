use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Creator platform an export file came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    Douyin,
    Xiaohongshu,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Douyin => "douyin",
            Platform::Xiaohongshu => "xiaohongshu",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Platform {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "douyin" | "dy" | "抖音" => Ok(Platform::Douyin),
            "xiaohongshu" | "xhs" | "red" | "小红书" => Ok(Platform::Xiaohongshu),
            other => Err(format!("unknown platform '{other}'")),
        }
    }
}

/// Engagement counters tracked for every content item, in canonical column
/// order. Douyin calls the first one 播放量, Xiaohongshu 观看量; both map to
/// `plays`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    Plays,
    Likes,
    Comments,
    Shares,
    Collects,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::Plays,
        Metric::Likes,
        Metric::Comments,
        Metric::Shares,
        Metric::Collects,
    ];

    pub fn canonical_name(&self) -> &'static str {
        match self {
            Metric::Plays => "plays",
            Metric::Likes => "likes",
            Metric::Comments => "comments",
            Metric::Shares => "shares",
            Metric::Collects => "collects",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

/// One content item's cumulative counters as of the export moment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    pub title: String,
    pub published_at: NaiveDateTime,
    pub plays: i64,
    pub likes: i64,
    pub comments: i64,
    pub shares: i64,
    pub collects: i64,
}

impl MetricRow {
    pub fn metric(&self, metric: Metric) -> i64 {
        match metric {
            Metric::Plays => self.plays,
            Metric::Likes => self.likes,
            Metric::Comments => self.comments,
            Metric::Shares => self.shares,
            Metric::Collects => self.collects,
        }
    }
}

/// A fully parsed platform export.
#[derive(Debug, Clone)]
pub struct ParsedExport {
    pub platform: Platform,
    pub rows: Vec<MetricRow>,
}
