use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;

use crate::errors::ParserError;
use crate::formats::{DouyinExportParser, XhsExportParser};
use crate::model::Platform;
use crate::parse_metrics_export;
use crate::registry::MetricsExportParser;

fn fixture(path: &str) -> String {
    let base = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let full_path = base.join("tests/data").join(path);
    fs::read_to_string(&full_path)
        .unwrap_or_else(|err| panic!("failed to read fixture {}: {}", full_path.display(), err))
}

#[test]
fn parses_douyin_summary_export() {
    let content = fixture("douyin_summary_export.csv");
    let parsed = parse_metrics_export(&content).expect("douyin export parse failed");

    assert_eq!(parsed.platform, Platform::Douyin);
    assert_eq!(parsed.rows.len(), 3);

    let first = &parsed.rows[0];
    assert_eq!(first.title, "春日穿搭分享 #OOTD");
    assert_eq!(
        first.published_at,
        NaiveDate::from_ymd_opt(2025, 3, 6)
            .unwrap()
            .and_hms_opt(18, 30, 0)
            .unwrap()
    );
    // quoted thousands separator
    assert_eq!(first.plays, 12_304);
    assert_eq!(first.likes, 512);
    assert_eq!(first.shares, 88);
    assert_eq!(first.comments, 46);
    assert_eq!(first.collects, 120);
}

#[test]
fn parses_xhs_note_export() {
    let content = fixture("xhs_note_export.csv");
    let parsed = parse_metrics_export(&content).expect("xhs export parse failed");

    assert_eq!(parsed.platform, Platform::Xiaohongshu);
    assert_eq!(parsed.rows.len(), 2);

    let first = &parsed.rows[0];
    assert_eq!(first.title, "新品试色笔记");
    assert_eq!(
        first.published_at,
        NaiveDate::from_ymd_opt(2025, 3, 25)
            .unwrap()
            .and_hms_opt(15, 6, 58)
            .unwrap()
    );
    assert_eq!(first.plays, 12_000); // 1.2万
    assert_eq!(first.likes, 421);
    assert_eq!(first.shares, 80);
    assert_eq!(first.comments, 37);
    assert_eq!(first.collects, 156);

    // column order in the file differs from canonical order
    let second = &parsed.rows[1];
    assert_eq!(second.shares, 31);
    assert_eq!(second.comments, 12);
    assert_eq!(second.collects, 88);
}

#[test]
fn english_headers_parse_as_douyin() {
    let content = "title,published_at,plays,likes,comments,shares,collects\n\
                   Launch teaser,2025-03-08,1000,50,4,9,12\n";
    let parsed = parse_metrics_export(content).expect("english header parse failed");
    assert_eq!(parsed.platform, Platform::Douyin);
    assert_eq!(parsed.rows[0].plays, 1000);
    assert_eq!(
        parsed.rows[0].published_at,
        NaiveDate::from_ymd_opt(2025, 3, 8)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    );
}

#[test]
fn unknown_format_reports_all_attempts() {
    let content = fixture("leads_report.csv");
    let err = parse_metrics_export(&content).expect_err("leads report should not parse");
    match err {
        ParserError::NoMatchingParser { attempts } => {
            assert_eq!(attempts.len(), 2);
            assert!(attempts.iter().any(|a| a.parser == "DOUYIN_VIDEO_EXPORT"));
            assert!(attempts.iter().any(|a| a.parser == "XHS_NOTE_EXPORT"));
        }
        other => panic!("expected NoMatchingParser, got {other:?}"),
    }
}

#[test]
fn header_only_file_is_empty_data() {
    let content = "作品名称,发布时间,播放量,点赞量,评论量,分享量,收藏量\n";
    let err = DouyinExportParser
        .parse(content)
        .expect_err("header-only file should fail");
    assert!(matches!(err, ParserError::EmptyData { .. }));
}

#[test]
fn negative_count_is_rejected() {
    let content = "作品名称,发布时间,播放量,点赞量,评论量,分享量,收藏量\n\
                   测试视频,2025-03-08 10:00:00,-5,0,0,0,0\n";
    let err = DouyinExportParser
        .parse(content)
        .expect_err("negative count should fail");
    match err {
        ParserError::DataRow { line_index, .. } => assert_eq!(line_index, 2),
        other => panic!("expected DataRow, got {other:?}"),
    }
}

#[test]
fn blank_counter_cells_read_as_zero() {
    let content = "笔记标题,首次发布时间,观看量,点赞,评论,收藏,分享\n\
                   晨间routine,2025年04月01日,,,,,\n";
    let parsed = XhsExportParser.parse(content).expect("blank counters parse");
    let row = &parsed.rows[0];
    assert_eq!(row.plays, 0);
    assert_eq!(row.likes, 0);
    assert_eq!(row.collects, 0);
}
