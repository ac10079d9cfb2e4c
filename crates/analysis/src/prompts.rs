//! Prompt templates for vocabulary and grammar extraction

/// System prompt for vocabulary extraction
pub const VOCABULARY_SYSTEM_PROMPT: &str =
    "你是一位專業的中文教師，專門幫助學生學習繁體中文。請根據HSK和TOCFL標準來選擇適當難度的詞彙。";

/// System prompt for grammar point extraction
pub const GRAMMAR_SYSTEM_PROMPT: &str =
    "你是一位專業的中文語法教師，專門教導外國學生學習中文語法。請參考現代漢語語法和對外漢語教學資源來解釋語法點。";

/// Prompt for vocabulary extraction
pub fn vocabulary_prompt(text: &str) -> String {
    format!(
        r#"分析以下繁體中文文本，列出10-15個重要詞彙，適合中文學習者學習。

對於每個詞彙，請提供：
1. 詞彙 (繁體中文)
2. 拼音 (pinyin)
3. 英文翻譯
4. 詞性 (名詞、動詞、形容詞等)
5. 例句 (使用該詞彙的例句)

文本：
{}

請以JSON格式回覆，格式如下：
[
  {{
    "word": "詞彙",
    "pinyin": "cí huì",
    "english": "vocabulary",
    "part_of_speech": "名詞",
    "example": "學習新詞彙很重要。"
  }}
]

只回覆JSON陣列，不要其他文字。"#,
        text
    )
}

/// Prompt for grammar point extraction
///
/// When `retrieved_rules` is present, the rules retrieved from the grammar
/// corpus are prepended so the model grounds its explanations in them.
pub fn grammar_prompt(text: &str, retrieved_rules: Option<&str>) -> String {
    let context = match retrieved_rules {
        Some(rules) if !rules.trim().is_empty() => format!(
            "以下是從語法資料庫檢索到的相關語法規則，請優先參考這些規則：\n{}\n\n",
            rules
        ),
        _ => String::new(),
    };

    format!(
        r#"{}分析以下繁體中文文本，找出5-8個重要的語法點，適合中文學習者學習。

對於每個語法點，請提供：
1. 語法結構名稱
2. 詳細說明 (用英文解釋)
3. 結構公式 (如：Subject + 把 + Object + Verb)
4. 原文中的例子
5. 額外例句

文本：
{}

請以JSON格式回覆，格式如下：
[
  {{
    "name": "把字句",
    "explanation": "The 把 (bǎ) construction is used to emphasize the result or effect of an action on an object.",
    "structure": "Subject + 把 + Object + Verb + Complement",
    "example_from_text": "我把書放在桌上。",
    "additional_examples": ["她把門關上了。", "請把這個給我。"]
  }}
]

只回覆JSON陣列，不要其他文字。"#,
        context, text
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vocabulary_prompt_embeds_text() {
        let prompt = vocabulary_prompt("我每天學習中文。");
        assert!(prompt.contains("我每天學習中文。"));
        assert!(prompt.contains("10-15個重要詞彙"));
    }

    #[test]
    fn test_grammar_prompt_without_rules() {
        let prompt = grammar_prompt("他是在北京學中文的。", None);
        assert!(prompt.starts_with("分析以下繁體中文文本"));
        assert!(!prompt.contains("語法資料庫"));
    }

    #[test]
    fn test_grammar_prompt_with_rules() {
        let prompt = grammar_prompt("他是在北京學中文的。", Some("是...的：強調時間、地點、方式。"));
        assert!(prompt.starts_with("以下是從語法資料庫檢索到的相關語法規則"));
        assert!(prompt.contains("是...的：強調時間、地點、方式。"));
    }

    #[test]
    fn test_grammar_prompt_ignores_empty_rules() {
        let prompt = grammar_prompt("我看了這個影片。", Some("  "));
        assert!(prompt.starts_with("分析以下繁體中文文本"));
    }
}
