use crate::errors::ParserError;
use crate::model::{ParsedExport, Platform};
use crate::registry::MetricsExportParser;

use super::{parse_export_rows, ColumnSpec};

/// Parses the "汇总笔记列表明细表" note export. Xiaohongshu writes first-publish
/// timestamps like 2025年03月25日15时06分58秒 and sometimes abbreviates counters
/// with 万.
pub struct XhsExportParser;

impl Default for XhsExportParser {
    fn default() -> Self {
        Self
    }
}

impl XhsExportParser {
    const NAME: &'static str = "XHS_NOTE_EXPORT";

    const COLUMNS: [ColumnSpec; 7] = [
        ColumnSpec {
            canonical: "笔记标题",
            aliases: &["笔记标题", "note_title"],
        },
        ColumnSpec {
            canonical: "首次发布时间",
            aliases: &["首次发布时间", "first_published_at"],
        },
        ColumnSpec {
            canonical: "观看量",
            aliases: &["观看量", "views"],
        },
        ColumnSpec {
            canonical: "点赞",
            aliases: &["点赞", "likes"],
        },
        ColumnSpec {
            canonical: "评论",
            aliases: &["评论", "comments"],
        },
        ColumnSpec {
            canonical: "分享",
            aliases: &["分享", "shares"],
        },
        ColumnSpec {
            canonical: "收藏",
            aliases: &["收藏", "collects"],
        },
    ];
}

impl MetricsExportParser for XhsExportParser {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(&self, content: &str) -> Result<ParsedExport, ParserError> {
        let rows = parse_export_rows(Self::NAME, content, &Self::COLUMNS)?;
        Ok(ParsedExport {
            platform: Platform::Xiaohongshu,
            rows,
        })
    }
}
