//! Grammar corpus parsing
//!
//! The corpus is a plain-text file of rule blocks separated by `//`. Each
//! block carries a level marker such as 基礎 第1級, 基礎 第1*級 or 進階 第4級.

use std::path::Path;

use regex::Regex;
use tracing::{info, warn};

use cntube_common::{CntubeError, Result};

use crate::types::GrammarRule;

/// Parse rule blocks out of corpus text
pub fn parse_corpus(content: &str) -> Vec<GrammarRule> {
    let level_pattern = Regex::new(r"(基礎|進階)\s+第(\d+)\*?級").unwrap();
    let newlines = Regex::new(r"\n+").unwrap();

    let mut rules = Vec::new();

    for block in content.split("//") {
        let block = block.trim();
        if block.is_empty() {
            continue;
        }

        let level = level_pattern.captures(block).and_then(|caps| {
            match caps[2].parse::<u8>() {
                Ok(level) => Some(level),
                Err(_) => {
                    warn!("Could not parse level number from: {}", &caps[0]);
                    None
                }
            }
        });

        let text = newlines.replace_all(block, " ").trim().to_string();
        if !text.is_empty() {
            rules.push(GrammarRule { text, level });
        }
    }

    rules
}

/// Load and parse the grammar corpus file
pub fn load_corpus(path: &Path) -> Result<Vec<GrammarRule>> {
    if !path.exists() {
        return Err(CntubeError::not_found(format!(
            "Grammar corpus not found: {}",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path)?;
    let rules = parse_corpus(&content);
    info!(
        "Parsed {} rules from grammar corpus {}",
        rules.len(),
        path.display()
    );
    Ok(rules)
}
