use divvy_core::roster::{attach_metrics, decode_registry, explode_credits, RegistryFieldMap};
use divvy_core::types::{Completeness, ContributorRole};
use polars::prelude::*;
use serde_json::json;

fn registry_docs() -> Vec<serde_json::Value> {
    vec![
        json!({
            "_id": "doc-1",
            "_widget_1740646149825": "春日穿搭分享 #OOTD #穿搭",
            "_widget_1740646149826": "2025-03-06",
            "_widget_1741257105163": "主账号",
            "_widget_1741257105165": "dy-001",
            "_widget_1740798082550": "是",
            "_widget_1740798082567": [{"username": "张三"}, {"username": "李四"}],
            "_widget_1740798082568": [],
            "_widget_1740798082569": [],
            "_widget_1740798082570": [{"username": "王五"}],
            "_widget_1741934971937": {"name": "中山门店"},
        }),
        json!({
            "_id": "doc-2",
            "_widget_1740646149825": "门店探访vlog",
            "_widget_1740798082550": "否",
            "_widget_1740798082568": [{"username": "赵六"}],
            "_widget_1740798082569": [{"username": "钱七"}],
            "_widget_1740798082570": [{"username": "王五"}],
        }),
        json!({
            "_id": "doc-3",
            "_widget_1740646149825": "   #全是标签",
        }),
    ]
}

#[test]
fn decodes_registry_documents() {
    let records = decode_registry(&registry_docs(), &RegistryFieldMap::default());

    // the title-less third document is dropped
    assert_eq!(records.len(), 2);

    let first = &records[0];
    assert_eq!(first.title, "春日穿搭分享");
    assert_eq!(first.completeness, Completeness::Complete);
    assert_eq!(first.full_content, vec!["张三", "李四"]);
    assert_eq!(first.publishing, vec!["王五"]);
    assert_eq!(first.department.as_deref(), Some("中山门店"));
    assert_eq!(first.account_id, "dy-001");

    let second = &records[1];
    assert_eq!(second.completeness, Completeness::Partial);
    assert_eq!(second.semi_content, vec!["赵六"]);
    assert_eq!(second.editing, vec!["钱七"]);
    assert!(second.department.is_none());
}

#[test]
fn credits_explode_one_row_per_mention() {
    let records = decode_registry(&registry_docs(), &RegistryFieldMap::default());
    let credits = explode_credits(&records);

    assert_eq!(credits.len(), 6);
    assert_eq!(credits[0].person, "张三");
    assert_eq!(credits[0].role, ContributorRole::FullContent);

    let wang_rows: Vec<_> = credits.iter().filter(|c| c.person == "王五").collect();
    assert_eq!(wang_rows.len(), 2);
    assert!(wang_rows
        .iter()
        .all(|c| c.role == ContributorRole::Publishing));
}

#[test]
fn registry_is_the_master_side_of_the_join() {
    let records = decode_registry(&registry_docs(), &RegistryFieldMap::default());

    let daily = df!(
        "title" => &["春日穿搭分享 #OOTD", "无人认领的视频"],
        "plays" => &[1000i64, 50],
        "likes" => &[40i64, 2],
        "comments" => &[10i64, 1],
        "shares" => &[5i64, 0],
        "collects" => &[8i64, 1],
    )
    .unwrap();

    let (frame, report) = attach_metrics(&records, &daily).unwrap();

    assert_eq!(frame.height(), 2);
    assert_eq!(report.registry_titles, 2);
    assert_eq!(report.matched_titles, 1);
    assert_eq!(report.metrics_without_registry, vec!["无人认领的视频"]);

    let titles = frame.column("title").unwrap().str().unwrap();
    let plays = frame.column("plays").unwrap().i64().unwrap();

    // hashtag-cleaned titles line up; the unmatched registry item zeroes out
    assert_eq!(titles.get(0), Some("春日穿搭分享"));
    assert_eq!(plays.get(0), Some(1000));
    assert_eq!(titles.get(1), Some("门店探访vlog"));
    assert_eq!(plays.get(1), Some(0));
}

#[test]
fn duplicate_registry_titles_collapse_and_metrics_sum_across_platforms() {
    let mut records = decode_registry(&registry_docs(), &RegistryFieldMap::default());
    records.push(records[0].clone());

    let daily = df!(
        "title" => &["春日穿搭分享", "春日穿搭分享 #小红书版"],
        "plays" => &[600i64, 400],
        "likes" => &[10i64, 30],
        "comments" => &[1i64, 2],
        "shares" => &[1i64, 1],
        "collects" => &[2i64, 2],
    )
    .unwrap();

    let (frame, report) = attach_metrics(&records, &daily).unwrap();
    assert_eq!(report.registry_titles, 2);

    let titles = frame.column("title").unwrap().str().unwrap();
    let plays = frame.column("plays").unwrap().i64().unwrap();
    let likes = frame.column("likes").unwrap().i64().unwrap();
    assert_eq!(titles.get(0), Some("春日穿搭分享"));
    assert_eq!(plays.get(0), Some(1000));
    assert_eq!(likes.get(0), Some(40));
}
