//! Gene-data rendering tests.

use std::collections::BTreeMap;

use healthchat::context::build_messages;
use healthchat::types::{
    Role, SanitizedCategory, SanitizedGeneData, SanitizedMarker, SanitizedRequest,
};

fn request_with(genes: SanitizedGeneData) -> SanitizedRequest {
    SanitizedRequest {
        user_token: "user_abcdef123456".to_owned(),
        message: "カフェインに弱い？".to_owned(),
        topic: "general_health".to_owned(),
        history: Vec::new(),
        blood_panel: None,
        gene_data: Some(genes),
        vitals: None,
    }
}

fn gene_context(genes: SanitizedGeneData) -> String {
    let messages = build_messages(&request_with(genes));
    messages
        .iter()
        .find(|m| {
            m.role == Role::System
                && (m.content.starts_with("【ユーザーの遺伝子データ】")
                    || m.content.starts_with("【利用可能な遺伝子データカテゴリー】"))
        })
        .expect("gene context present")
        .content
        .clone()
}

fn marker(title: &str, score: Option<i64>, level: Option<&str>) -> SanitizedMarker {
    SanitizedMarker {
        title: title.to_owned(),
        impact_score: score,
        score_level: level.map(str::to_owned),
    }
}

#[test]
fn available_categories_render_names_only() {
    let context = gene_context(SanitizedGeneData {
        available_categories: Some(vec!["metabolism".to_owned(), "fitness".to_owned()]),
        categories: BTreeMap::from([(
            "metabolism".to_owned(),
            SanitizedCategory::Single(marker("Caffeine", Some(-30), None)),
        )]),
    });
    assert!(context.contains("- metabolism"));
    assert!(context.contains("- fitness"));
    // Marker content must not render alongside the category list.
    assert!(!context.contains("Caffeine"));
    assert!(!context.contains("影響スコア"));
}

#[test]
fn single_marker_shape_renders() {
    let context = gene_context(SanitizedGeneData {
        available_categories: None,
        categories: BTreeMap::from([(
            "metabolism".to_owned(),
            SanitizedCategory::Single(marker("Caffeine metabolism", Some(-30), Some("moderate"))),
        )]),
    });
    assert!(context.contains("■ metabolism"));
    assert!(context.contains("Caffeine metabolism"));
    assert!(context.contains("影響スコア: -30 (moderate)"));
}

#[test]
fn marker_list_shape_renders_each_marker() {
    let context = gene_context(SanitizedGeneData {
        available_categories: None,
        categories: BTreeMap::from([(
            "fitness".to_owned(),
            SanitizedCategory::Many(vec![
                marker("Endurance", Some(20), None),
                marker("Recovery", None, None),
            ]),
        )]),
    });
    assert!(context.contains("■ fitness"));
    assert!(context.contains("Endurance"));
    assert!(context.contains("Recovery"));
    assert!(context.contains("影響スコア: +20"));
}

#[test]
fn zero_score_full_data_marker_renders_its_score_line() {
    let context = gene_context(SanitizedGeneData {
        available_categories: None,
        categories: BTreeMap::from([(
            "fitness".to_owned(),
            SanitizedCategory::Many(vec![
                marker("Balanced", Some(0), None),
                marker("Pending", None, None),
            ]),
        )]),
    });
    // Full-data zero score still renders; metadata-only stays title-only.
    assert!(context.contains("Balanced\n    影響スコア: +0"));
    assert!(context.contains("  - Pending"));
    assert!(!context.contains("Pending\n    影響スコア"));
}

#[test]
fn empty_category_is_reported_not_skipped() {
    let context = gene_context(SanitizedGeneData {
        available_categories: None,
        categories: BTreeMap::from([
            (
                "fitness".to_owned(),
                SanitizedCategory::Many(vec![marker("Endurance", None, None)]),
            ),
            ("longevity".to_owned(), SanitizedCategory::Many(Vec::new())),
        ]),
    });
    assert!(context.contains("longevity: データが見つかりませんでした"));
    assert!(context.contains("Endurance"));
}

#[test]
fn all_empty_categories_render_explicit_error_text() {
    let context = gene_context(SanitizedGeneData {
        available_categories: None,
        categories: BTreeMap::from([(
            "longevity".to_owned(),
            SanitizedCategory::Many(Vec::new()),
        )]),
    });
    assert!(context.contains("返されませんでした"));
}

#[test]
fn empty_available_categories_fall_back_to_marker_rendering() {
    let context = gene_context(SanitizedGeneData {
        available_categories: Some(Vec::new()),
        categories: BTreeMap::from([(
            "metabolism".to_owned(),
            SanitizedCategory::Single(marker("Caffeine", None, None)),
        )]),
    });
    assert!(context.contains("■ metabolism"));
}
