use crate::errors::ParserError;
use crate::model::{ParsedExport, Platform};
use crate::registry::MetricsExportParser;

use super::{parse_export_rows, ColumnSpec};

/// Parses the creator-studio "汇总数据" video export.
pub struct DouyinExportParser;

impl Default for DouyinExportParser {
    fn default() -> Self {
        Self
    }
}

impl DouyinExportParser {
    const NAME: &'static str = "DOUYIN_VIDEO_EXPORT";

    const COLUMNS: [ColumnSpec; 7] = [
        ColumnSpec {
            canonical: "作品名称",
            aliases: &["作品名称", "作品标题", "title"],
        },
        ColumnSpec {
            canonical: "发布时间",
            aliases: &["发布时间", "published_at", "publish_time"],
        },
        ColumnSpec {
            canonical: "播放量",
            aliases: &["播放量", "plays", "play_count"],
        },
        ColumnSpec {
            canonical: "点赞量",
            aliases: &["点赞量", "likes", "like_count"],
        },
        ColumnSpec {
            canonical: "评论量",
            aliases: &["评论量", "comments", "comment_count"],
        },
        ColumnSpec {
            canonical: "分享量",
            aliases: &["分享量", "shares", "share_count"],
        },
        ColumnSpec {
            canonical: "收藏量",
            aliases: &["收藏量", "collects", "favourite_count"],
        },
    ];
}

impl MetricsExportParser for DouyinExportParser {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn parse(&self, content: &str) -> Result<ParsedExport, ParserError> {
        let rows = parse_export_rows(Self::NAME, content, &Self::COLUMNS)?;
        Ok(ParsedExport {
            platform: Platform::Douyin,
            rows,
        })
    }
}
