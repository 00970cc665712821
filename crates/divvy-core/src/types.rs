use std::fmt;

use serde::{Deserialize, Serialize};

/// Contribution roles credited on a content item. The registry form tracks
/// them as 完整内容提供 / 半成品内容提供 / 剪辑 / 发布运营.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributorRole {
    FullContent,
    SemiContent,
    Editing,
    Publishing,
}

impl ContributorRole {
    pub const ALL: [ContributorRole; 4] = [
        ContributorRole::FullContent,
        ContributorRole::SemiContent,
        ContributorRole::Editing,
        ContributorRole::Publishing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContributorRole::FullContent => "full_content",
            ContributorRole::SemiContent => "semi_content",
            ContributorRole::Editing => "editing",
            ContributorRole::Publishing => "publishing",
        }
    }
}

impl fmt::Display for ContributorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ContributorRole {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim() {
            "full_content" | "完整内容提供" => Ok(ContributorRole::FullContent),
            "semi_content" | "半成品内容提供" => Ok(ContributorRole::SemiContent),
            "editing" | "剪辑" => Ok(ContributorRole::Editing),
            "publishing" | "发布运营" => Ok(ContributorRole::Publishing),
            other => Err(format!("unknown contributor role '{other}'")),
        }
    }
}

/// Whether a content item was delivered ready-to-publish (是) or still needed
/// in-house finishing (否). The split table keys on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Completeness {
    Complete,
    Partial,
}

impl Completeness {
    /// Registry flag values other than an explicit yes count as partial,
    /// matching how the source form treats a blank answer.
    pub fn from_flag(value: &str) -> Self {
        match value.trim() {
            "是" | "yes" | "y" | "true" | "1" | "complete" => Completeness::Complete,
            _ => Completeness::Partial,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Completeness::Complete => "complete",
            Completeness::Partial => "partial",
        }
    }
}

impl fmt::Display for Completeness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strips the hashtag tail operators append to published titles so registry
/// titles and export titles line up: everything from the first '#' goes, along
/// with the whitespace run before it.
pub fn clean_title(raw: &str) -> String {
    match raw.find('#') {
        Some(idx) => raw[..idx].trim().to_string(),
        None => raw.trim().to_string(),
    }
}

/// Payouts are tracked in yuan with cent precision.
pub fn round_yuan(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
