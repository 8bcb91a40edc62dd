//! Prompt assembly from sanitized request data.
//!
//! Builds the ordered message list sent to the generation service. Block
//! order is fixed: instruction text, optional symptom hint, optional
//! blood/vital/gene contexts, history, then exactly one final user
//! message. Each conditional block appears iff the corresponding
//! sanitized field is non-empty; nothing is fabricated or reordered.

use crate::types::{
    FitnessLevel, LabStatus, Message, SanitizedCategory, SanitizedGeneData, SanitizedLabItem,
    SanitizedMarker, SanitizedRequest, SanitizedVitals,
};

/// Behavioral instruction text for the first system message. A static
/// asset: wording evolves without touching the builder's code path, and
/// it is excluded from sanitization because it contains no user data.
pub const SYSTEM_PROMPT: &str = include_str!("../assets/system_prompt.md");

/// Hint appended when the message matches the symptom lexicon. A hint
/// only — the model decides whether to enter symptom-consultation mode.
const SYMPTOM_HINT: &str = "【ヒント】ユーザーのメッセージに症状関連のキーワードが含まれています。症状相談モードの適用を検討してください。";

/// Symptom-consultation keyword lexicon, matched by substring against the
/// lowercased message.
const SYMPTOM_KEYWORDS: &[&str] = &[
    // 痛み系
    "痛い",
    "痛み",
    "痛",
    "いたい",
    // 症状系
    "症状",
    "発熱",
    "熱",
    "吐き気",
    "めまい",
    "しびれ",
    "頭痛",
    "腹痛",
    "胸痛",
    "背中が痛",
    "関節痛",
    "息苦しい",
    "息切れ",
    "咳",
    "鼻水",
    "下痢",
    "便秘",
    // 体調不良系
    "体調不良",
    "調子が悪い",
    "具合が悪い",
    "気分が悪い",
    "だるい",
    "倦怠感",
    "疲れ",
    "眠れない",
    "不眠",
    // 病気系
    "病気",
    "疾患",
    "診断",
    "受診",
    "医者",
    // その他
    "赤い",
    "腫れ",
    "かゆい",
    "発疹",
    "しこり",
];

/// Assemble the ordered message list for one request.
///
/// The first message is always `system`; the last is always `user`;
/// history keeps its original order and roles in between.
pub fn build_messages(request: &SanitizedRequest) -> Vec<Message> {
    let mut messages = Vec::new();

    messages.push(Message::system(SYSTEM_PROMPT));

    if mentions_symptoms(&request.message) {
        messages.push(Message::system(SYMPTOM_HINT));
    }

    if let Some(blood) = request.blood_panel.as_deref() {
        if !blood.is_empty() {
            messages.push(Message::system(render_blood_panel(blood)));
        }
    }

    if let Some(vitals) = &request.vitals {
        if let Some(rendered) = render_vitals(vitals) {
            messages.push(Message::system(rendered));
        }
    }

    if let Some(genes) = &request.gene_data {
        if let Some(rendered) = render_gene_data(genes) {
            messages.push(Message::system(rendered));
        }
    }

    messages.extend(request.history.iter().cloned());

    messages.push(Message::user(request.message.clone()));

    messages
}

/// Whether the message matches the symptom-keyword lexicon.
pub fn mentions_symptoms(message: &str) -> bool {
    let lowered = message.to_lowercase();
    SYMPTOM_KEYWORDS
        .iter()
        .any(|keyword| lowered.contains(keyword))
}

/// Render the blood panel, partitioned into abnormal → caution → normal.
///
/// Abnormal and caution items render in full; normal items are summarized
/// as a count only. Empty buckets are omitted.
fn render_blood_panel(items: &[SanitizedLabItem]) -> String {
    let mut abnormal = Vec::new();
    let mut caution = Vec::new();
    let mut normal_count: usize = 0;

    for item in items {
        match item.status {
            LabStatus::Abnormal => abnormal.push(render_lab_item(item)),
            LabStatus::Caution => caution.push(render_lab_item(item)),
            LabStatus::Normal => normal_count = normal_count.saturating_add(1),
        }
    }

    let mut parts = vec!["【ユーザーの血液検査結果】".to_owned()];

    if !abnormal.is_empty() {
        parts.push("\n【要注意】以下の項目が異常値です：".to_owned());
        parts.extend(abnormal);
    }
    if !caution.is_empty() {
        parts.push("\n【注意】以下の項目が基準値外です：".to_owned());
        parts.extend(caution);
    }
    if normal_count > 0 {
        parts.push(format!("\n【正常範囲】{normal_count}項目が正常範囲内"));
    }

    parts.join("\n")
}

fn render_lab_item(item: &SanitizedLabItem) -> String {
    format!(
        "- {}: {} {} (基準値: {})",
        item.name, item.value, item.unit, item.reference_range
    )
}

/// Render the collapsed vitals, grouped by the fixed taxonomy. Returns
/// `None` when no sub-group has data.
fn render_vitals(vitals: &SanitizedVitals) -> Option<String> {
    let mut parts = vec!["【ユーザーのバイタルデータ（概況）】".to_owned()];
    let mut has_any = false;

    if vitals.has_body_composition {
        parts.push("\n【体組成】".to_owned());
        parts.push("- 体組成データ: あり".to_owned());
        has_any = true;
    }

    if vitals.has_heart_data || vitals.has_vo2max {
        parts.push("\n【心臓・循環器】".to_owned());
        if let Some(level) = vitals.resting_hr_level {
            parts.push(format!("- 安静時心拍レベル: {}", level.as_str()));
        } else if vitals.has_heart_data {
            parts.push("- 心拍データ: あり".to_owned());
        }
        if vitals.has_vo2max && vitals.vo2max_level != FitnessLevel::Unknown {
            parts.push(format!(
                "- 持久力レベル (VO2max): {}",
                vitals.vo2max_level.as_str()
            ));
        }
        has_any = true;
    }

    if vitals.has_activity_data {
        parts.push("\n【活動量】".to_owned());
        parts.push("- 活動量データ: あり".to_owned());
        has_any = true;
    }

    if vitals.has_distance_data {
        parts.push("\n【移動距離】".to_owned());
        parts.push("- 移動距離データ: あり".to_owned());
        has_any = true;
    }

    has_any.then(|| parts.join("\n"))
}

/// Render gene data.
///
/// When the reserved category-name list is present and non-empty, only
/// the names render — no marker content. Otherwise each category renders
/// its marker(s); a category with an empty marker list is reported
/// explicitly rather than silently skipped.
fn render_gene_data(genes: &SanitizedGeneData) -> Option<String> {
    if let Some(categories) = genes.available_categories.as_deref() {
        if !categories.is_empty() {
            return Some(render_available_categories(categories));
        }
    }

    if genes.categories.is_empty() {
        return None;
    }

    let mut parts = vec!["【ユーザーの遺伝子データ】".to_owned()];
    let mut has_data = false;

    for (category, payload) in &genes.categories {
        match payload {
            SanitizedCategory::Single(marker) => {
                parts.push(format!("\n■ {category}"));
                parts.push(render_marker(marker, category));
                has_data = true;
            }
            SanitizedCategory::Many(markers) if markers.is_empty() => {
                parts.push(format!(
                    "\n■ {category}: データが見つかりませんでした（小カテゴリー名が正しいか確認してください）"
                ));
            }
            SanitizedCategory::Many(markers) => {
                parts.push(format!("\n■ {category}"));
                for marker in markers {
                    parts.push(render_marker(marker, category));
                }
                has_data = true;
            }
        }
    }

    if !has_data {
        return Some(
            "【ユーザーの遺伝子データ】\n要求された遺伝子データがシステムから返されませんでした。小カテゴリー名の形式が正しいか確認してください。".to_owned(),
        );
    }

    Some(parts.join("\n"))
}

fn render_marker(marker: &SanitizedMarker, category: &str) -> String {
    let title = if marker.title.is_empty() {
        category
    } else {
        marker.title.as_str()
    };
    match (marker.impact_score, &marker.score_level) {
        (Some(score), Some(level)) if !level.is_empty() => {
            format!("  - {title}\n    影響スコア: {score:+} ({level})")
        }
        (Some(score), _) => {
            format!("  - {title}\n    影響スコア: {score:+}")
        }
        // Metadata-only stage: no score line.
        (None, _) => format!("  - {title}"),
    }
}

fn render_available_categories(categories: &[String]) -> String {
    let mut parts = vec![
        "【利用可能な遺伝子データカテゴリー】".to_owned(),
        "以下のカテゴリーの遺伝子情報を要求できます：".to_owned(),
    ];
    for category in categories {
        parts.push(format!("- {category}"));
    }
    parts.push("\n必要に応じて「🧬 [カテゴリー名]に関する遺伝子情報」の形式で要求してください。".to_owned());
    parts.join("\n")
}
