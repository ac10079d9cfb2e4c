use crate::types::Segment;
use tracing::debug;

/// Common Simplified to Traditional character mappings.
///
/// Covers the characters Whisper most often emits in Simplified script
/// despite the Traditional Chinese prompt. Not a full conversion table.
const SIMPLIFIED_TO_TRADITIONAL: &[(char, char)] = &[
    ('国', '國'), ('说', '說'), ('这', '這'), ('时', '時'), ('学', '學'),
    ('会', '會'), ('为', '為'), ('对', '對'), ('发', '發'), ('经', '經'),
    ('过', '過'), ('还', '還'), ('进', '進'), ('与', '與'), ('从', '從'),
    ('现', '現'), ('开', '開'), ('关', '關'), ('无', '無'), ('问', '問'),
    ('么', '麼'), ('们', '們'), ('头', '頭'), ('见', '見'), ('长', '長'),
    ('门', '門'), ('点', '點'), ('义', '義'), ('电', '電'), ('动', '動'),
    ('机', '機'), ('来', '來'), ('实', '實'), ('听', '聽'), ('话', '話'),
    ('语', '語'), ('读', '讀'), ('写', '寫'), ('认', '認'), ('识', '識'),
    ('词', '詞'), ('练', '練'), ('习', '習'), ('书', '書'), ('汉', '漢'),
    ('简', '簡'), ('体', '體'), ('传', '傳'), ('统', '統'), ('华', '華'),
    ('请', '請'), ('让', '讓'), ('给', '給'), ('着', '著'), ('难', '難'),
    ('双', '雙'), ('图', '圖'), ('网', '網'), ('视', '視'), ('频', '頻'),
];

/// Phrases to discard (common Whisper hallucinations on Chinese audio)
const DISCARD_PHRASES: &[&str] = &[
    "字幕由 Amara.org 社群提供",
    "字幕由Amara.org社群提供",
    "請不吝點贊 訂閱 轉發 打賞支持明鏡與點點欄目",
    "謝謝大家收看",
    "謝謝觀看",
    "謝謝收看",
];

/// Common standalone filler segments in Mandarin
const FILLER_WORDS: &[&str] = &[
    "嗯", "啊", "呃", "喔", "哦", "欸", "嘛", "那個", "這個",
];

/// Convert Simplified Chinese characters to Traditional
pub fn to_traditional(text: &str) -> String {
    text.chars()
        .map(|c| {
            SIMPLIFIED_TO_TRADITIONAL
                .iter()
                .find(|(simplified, _)| *simplified == c)
                .map(|(_, traditional)| *traditional)
                .unwrap_or(c)
        })
        .collect()
}

/// Process segment text with filtering and normalization.
///
/// Converts to Traditional Chinese first so the discard list matches
/// regardless of the script Whisper emitted.
///
/// # Arguments
/// * `text` - Raw segment text
/// * `filter_fillers` - Whether to filter out standalone filler segments
/// * `min_length` - Minimum text length to keep (characters)
/// * `normalize_punct` - Whether to normalize punctuation
pub fn process_segment_text(
    text: &str,
    filter_fillers: bool,
    min_length: usize,
    normalize_punct: bool,
) -> String {
    let text = to_traditional(text.trim());

    // Check if should keep this segment
    if !should_keep_segment(&text, filter_fillers, min_length) {
        return String::new();
    }

    // Normalize text
    normalize_text(&text, normalize_punct)
}

/// Determine if a segment should be kept
fn should_keep_segment(text: &str, enable_filter: bool, min_length: usize) -> bool {
    let text = text.trim();

    // Empty text
    if text.is_empty() {
        return false;
    }

    // Minimum length check (characters, not bytes)
    if text.chars().count() < min_length {
        return false;
    }

    // Check for discard phrases
    for phrase in DISCARD_PHRASES {
        if text == *phrase {
            debug!("Discarding phrase: {}", text);
            return false;
        }
    }

    // Subtitle credits show up with varying spacing
    if text.contains("Amara.org") {
        debug!("Discarding subtitle credit: {}", text);
        return false;
    }

    // If filtering is disabled, keep it
    if !enable_filter {
        return true;
    }

    // Filter standalone filler segments
    for filler in FILLER_WORDS {
        if text == *filler {
            debug!("Filtering filler segment: {}", text);
            return false;
        }
    }

    // Check for repetitive patterns: 10+ chars but only 1-2 unique
    let chars: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
    if chars.len() >= 10 {
        let unique_chars: std::collections::HashSet<_> = chars.iter().collect();
        if unique_chars.len() <= 2 {
            debug!(
                "Discarding repetitive pattern: {} unique chars in {} total",
                unique_chars.len(),
                chars.len()
            );
            return false;
        }
    }

    // Check for number-only sequences (e.g., "1. 2. 3. 4...")
    if chars.len() >= 10 {
        let is_number_only = chars
            .iter()
            .all(|c| c.is_numeric() || *c == '.' || *c == '、');
        if is_number_only {
            debug!("Discarding number-only sequence");
            return false;
        }
    }

    true
}

/// Normalize text by removing repetitions and fixing punctuation
fn normalize_text(text: &str, normalize_punct: bool) -> String {
    let text = text.trim();

    // Remove decoder-loop repetitions
    let text = remove_repetitions(text);

    if normalize_punct {
        // Normalize consecutive periods (4+ periods -> "...")
        let mut result = text.clone();
        while result.contains("....") {
            result = result.replace("....", "...");
        }

        // Normalize multiple spaces to single space
        let re = regex::Regex::new(r"\s+").unwrap();
        result = re.replace_all(&result, " ").to_string();

        result
    } else {
        text
    }
}

/// Remove character and short-phrase repetitions.
///
/// Whisper decoder loops produce runs like 「哈哈哈哈哈哈」 or
/// 「我們我們我們我們」; Chinese text has no whitespace so both passes
/// work on characters rather than words.
pub fn remove_repetitions(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();

    if chars.len() <= 1 {
        return text.to_string();
    }

    // First pass: cap runs of a single character at 3
    let mut collapsed = Vec::with_capacity(chars.len());
    let mut prev: Option<char> = None;
    let mut run_length = 0;

    for &c in &chars {
        if Some(c) == prev {
            run_length += 1;
        } else {
            run_length = 1;
            prev = Some(c);
        }

        if run_length <= 3 {
            collapsed.push(c);
        }
    }

    // Second pass: a 2-4 char phrase repeated 3+ times in a row keeps one copy
    let mut result: Vec<char> = Vec::with_capacity(collapsed.len());
    let mut i = 0;

    while i < collapsed.len() {
        let mut collapsed_here = false;

        for unit_len in (2..=4).rev() {
            if i + unit_len * 3 > collapsed.len() {
                continue;
            }

            let unit = &collapsed[i..i + unit_len];
            let mut repeats = 1;
            while i + (repeats + 1) * unit_len <= collapsed.len()
                && collapsed[i + repeats * unit_len..i + (repeats + 1) * unit_len] == *unit
            {
                repeats += 1;
            }

            if repeats >= 3 {
                result.extend_from_slice(unit);
                i += repeats * unit_len;
                collapsed_here = true;
                break;
            }
        }

        if !collapsed_here {
            result.push(collapsed[i]);
            i += 1;
        }
    }

    result.into_iter().collect()
}

/// Merge consecutive segments with same text and close timestamps
///
/// # Arguments
/// * `segments` - Input segments
/// * `max_gap` - Maximum time gap (in seconds) to merge
pub fn merge_segments(segments: Vec<Segment>, max_gap: f32) -> Vec<Segment> {
    if segments.is_empty() {
        return Vec::new();
    }

    let mut merged = Vec::new();
    merged.push(segments[0].clone());

    for segment in segments.iter().skip(1) {
        let current = merged.last_mut().unwrap();

        let same_text = segment.text.trim() == current.text.trim();
        let time_continuous = segment.start <= current.end + max_gap;

        if same_text && time_continuous {
            // Merge: extend end time
            current.end = current.end.max(segment.end);
        } else {
            merged.push(segment.clone());
        }
    }

    debug!("Merged {} segments into {} segments", segments.len(), merged.len());

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_traditional() {
        assert_eq!(to_traditional("学习汉语"), "學習漢語");
        assert_eq!(to_traditional("这是简体"), "這是簡體");
        // Traditional input passes through unchanged
        assert_eq!(to_traditional("我們在學習"), "我們在學習");
        // Non-Chinese text untouched
        assert_eq!(to_traditional("hello 123"), "hello 123");
    }

    #[test]
    fn test_should_keep_segment() {
        assert!(!should_keep_segment("", false, 1));
        assert!(should_keep_segment("你好世界", false, 1));
        assert!(!should_keep_segment("嗯", true, 1));
        assert!(should_keep_segment("嗯", false, 1));
        assert!(!should_keep_segment("字幕由 Amara.org 社群提供", false, 1));
        assert!(!should_keep_segment("字幕由  Amara.org  提供", false, 1));
        assert!(!should_keep_segment("謝謝觀看", false, 1));
    }

    #[test]
    fn test_should_keep_rejects_repetitive() {
        assert!(!should_keep_segment("哈哈哈哈哈哈哈哈哈哈", true, 1));
        assert!(should_keep_segment("今天我們要學習新的生詞", true, 1));
    }

    #[test]
    fn test_remove_char_run() {
        assert_eq!(remove_repetitions("哈哈哈哈哈哈"), "哈哈哈");
        assert_eq!(remove_repetitions("好好學習"), "好好學習");
    }

    #[test]
    fn test_remove_phrase_loop() {
        assert_eq!(remove_repetitions("我們我們我們我們去"), "我們去");
        // Two repeats are legitimate (reduplication)
        assert_eq!(remove_repetitions("看看"), "看看");
    }

    #[test]
    fn test_process_segment_converts_script() {
        let out = process_segment_text("我们在学习中文", false, 1, true);
        assert_eq!(out, "我們在學習中文");
    }

    #[test]
    fn test_process_segment_drops_hallucination() {
        let out = process_segment_text("字幕由 Amara.org 社群提供", false, 1, true);
        assert!(out.is_empty());
    }

    #[test]
    fn test_merge_segments() {
        let segments = vec![
            Segment::new(0.0, 2.0, "你好".to_string()),
            Segment::new(2.0, 4.0, "你好".to_string()),
            Segment::new(4.5, 6.0, "世界".to_string()),
        ];

        let merged = merge_segments(segments, 0.3);

        // First two should merge (same text, consecutive)
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].text, "你好");
        assert_eq!(merged[0].end, 4.0);
    }

    #[test]
    fn test_normalize_text() {
        let input = "你好....世界";
        let output = normalize_text(input, true);
        assert_eq!(output, "你好...世界");

        let input = "你好    世界";
        let output = normalize_text(input, true);
        assert_eq!(output, "你好 世界");
    }
}
