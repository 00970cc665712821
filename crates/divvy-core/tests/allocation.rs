use divvy_core::allocation::{
    aggregate_by_person, allocate_units, check_conservation, split_by_role, PersonShare,
    RoleSplitTable,
};
use divvy_core::roster::ContentRecord;
use divvy_core::scoring::ContentScore;
use divvy_core::types::{Completeness, ContributorRole};

fn score(title: &str, value: f64) -> ContentScore {
    ContentScore {
        title: title.to_string(),
        score: value,
    }
}

fn record(
    title: &str,
    completeness: Completeness,
    full: &[&str],
    semi: &[&str],
    editing: &[&str],
    publishing: &[&str],
) -> ContentRecord {
    let owned = |names: &[&str]| names.iter().map(|n| n.to_string()).collect::<Vec<_>>();
    ContentRecord {
        title: title.to_string(),
        account_name: "主账号".to_string(),
        account_id: "acct-1".to_string(),
        completeness,
        full_content: owned(full),
        semi_content: owned(semi),
        editing: owned(editing),
        publishing: owned(publishing),
        submitted_on: None,
        department: None,
    }
}

#[test]
fn units_are_proportional_and_conserved() {
    let scores = vec![score("a", 0.5), score("b", 0.3), score("c", 0.2)];
    let payouts = allocate_units(&scores, 1000.0, 50.0).unwrap();

    assert_eq!(payouts.len(), 3);
    let total_units: i64 = payouts.iter().map(|p| p.units).sum();
    assert_eq!(total_units, 20);
    assert_eq!(payouts[0].units, 10);
    assert_eq!(payouts[1].units, 6);
    assert_eq!(payouts[2].units, 4);
    let total_amount: f64 = payouts.iter().map(|p| p.amount).sum();
    assert!((total_amount - 1000.0).abs() < 1e-9);
}

#[test]
fn rounding_drift_lands_on_first_top_scorer() {
    // three equal scores over 10 units: each rounds to 3, one unit left over
    let scores = vec![score("a", 1.0), score("b", 1.0), score("c", 1.0)];
    let payouts = allocate_units(&scores, 500.0, 50.0).unwrap();

    let total_units: i64 = payouts.iter().map(|p| p.units).sum();
    assert_eq!(total_units, 10);
    assert_eq!(payouts[0].title, "a");
    assert_eq!(payouts[0].units, 4);
    assert_eq!(payouts[1].units, 3);
    assert_eq!(payouts[2].units, 3);
}

#[test]
fn zero_scores_earn_nothing() {
    let scores = vec![score("a", 0.8), score("b", 0.0)];
    let payouts = allocate_units(&scores, 500.0, 50.0).unwrap();

    assert_eq!(payouts.len(), 1);
    assert_eq!(payouts[0].title, "a");
    assert_eq!(payouts[0].units, 10);
}

#[test]
fn sub_unit_pool_allocates_nothing() {
    let scores = vec![score("a", 1.0)];
    let payouts = allocate_units(&scores, 49.99, 50.0).unwrap();
    assert!(payouts.is_empty());
}

#[test]
fn empty_scores_allocate_nothing() {
    let payouts = allocate_units(&[], 1000.0, 50.0).unwrap();
    assert!(payouts.is_empty());
}

#[test]
fn negative_pool_is_rejected() {
    assert!(allocate_units(&[score("a", 1.0)], -100.0, 50.0).is_err());
    assert!(allocate_units(&[score("a", 1.0)], 100.0, 0.0).is_err());
}

#[test]
fn complete_content_splits_sixty_forty() {
    let scores = vec![score("视频一", 1.0)];
    let payouts = allocate_units(&scores, 600.0, 50.0).unwrap();
    assert_eq!(payouts[0].amount, 600.0);

    let records = vec![record(
        "视频一",
        Completeness::Complete,
        &["张三", "李四"],
        &[],
        &[],
        &["王五"],
    )];
    let shares = split_by_role(&payouts, &records, &RoleSplitTable::default());

    assert_eq!(shares.len(), 3);
    let of = |person: &str| -> f64 {
        shares
            .iter()
            .filter(|s| s.person == person)
            .map(|s| s.amount)
            .sum()
    };
    // 60% split across two providers, 40% to the publisher
    assert_eq!(of("张三"), 180.0);
    assert_eq!(of("李四"), 180.0);
    assert_eq!(of("王五"), 240.0);
}

#[test]
fn unlisted_role_combination_gets_default_share() {
    let scores = vec![score("t", 1.0)];
    let payouts = allocate_units(&scores, 100.0, 50.0).unwrap();

    // an editor credited on complete content is outside the table
    let records = vec![record(
        "t",
        Completeness::Complete,
        &["提供者"],
        &[],
        &["剪辑师"],
        &[],
    )];
    let shares = split_by_role(&payouts, &records, &RoleSplitTable::default());

    let editor = shares
        .iter()
        .find(|s| s.role == ContributorRole::Editing)
        .unwrap();
    assert_eq!(editor.amount, 20.0); // default 0.2 × 100
}

#[test]
fn cent_drift_goes_to_top_earner() {
    // 0.4 × 100 / 3 = 13.33 each: one cent goes missing across the three
    let scores = vec![score("t", 1.0)];
    let payouts = allocate_units(&scores, 100.0, 50.0).unwrap();
    let records = vec![record(
        "t",
        Completeness::Partial,
        &[],
        &["甲", "乙", "丙"],
        &["丁"],
        &["戊"],
    )];
    let shares = split_by_role(&payouts, &records, &RoleSplitTable::default());
    let share_total: f64 = shares.iter().map(|s| s.amount).sum();
    assert!((share_total - 99.99).abs() < 1e-9);

    let (persons, reconciliation) = aggregate_by_person(&shares, 100.0);
    let person_total: f64 = persons.iter().map(|p| p.amount).sum();
    assert!((person_total - 100.0).abs() < 1e-9);
    assert!((reconciliation.correction - 0.01).abs() < 1e-9);
    assert_eq!(reconciliation.residual, 0.0);

    // publisher at 0.4 × 100 = 40.00 is the top earner and absorbs the cent
    let top = persons.iter().find(|p| p.person == "戊").unwrap();
    assert!((top.amount - 40.01).abs() < 1e-9);
}

#[test]
fn structural_shortfall_is_left_visible() {
    // complete content with no publisher: 40% of the item has no taker
    let scores = vec![score("t", 1.0)];
    let payouts = allocate_units(&scores, 500.0, 50.0).unwrap();
    let records = vec![record("t", Completeness::Complete, &["张三"], &[], &[], &[])];
    let shares = split_by_role(&payouts, &records, &RoleSplitTable::default());

    let (persons, reconciliation) = aggregate_by_person(&shares, 500.0);
    assert_eq!(persons.len(), 1);
    assert_eq!(persons[0].amount, 300.0);
    assert_eq!(reconciliation.correction, 0.0);
    assert!((reconciliation.residual - 200.0).abs() < 1e-9);

    let conservation = check_conservation(500.0, &payouts, &persons);
    assert!(!conservation.ok);
    assert_eq!(conservation.item_total, 500.0);
    assert_eq!(conservation.person_total, 300.0);
}

#[test]
fn aggregation_merges_people_across_items() {
    let shares = vec![
        PersonShare {
            title: "a".to_string(),
            person: "张三".to_string(),
            role: ContributorRole::FullContent,
            amount: 120.0,
        },
        PersonShare {
            title: "b".to_string(),
            person: "张三".to_string(),
            role: ContributorRole::Publishing,
            amount: 80.0,
        },
        PersonShare {
            title: "b".to_string(),
            person: "李四".to_string(),
            role: ContributorRole::Editing,
            amount: 40.0,
        },
    ];

    let (persons, reconciliation) = aggregate_by_person(&shares, 240.0);
    assert_eq!(persons.len(), 2);
    let zhang = persons.iter().find(|p| p.person == "张三").unwrap();
    assert_eq!(zhang.amount, 200.0);
    assert_eq!(reconciliation.residual, 0.0);

    let conservation = check_conservation(240.0, &[], &persons);
    // items deliberately empty here; only the person side is checked
    assert_eq!(conservation.person_total, 240.0);
}
