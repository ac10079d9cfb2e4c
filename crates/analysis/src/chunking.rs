/// Text chunk
#[derive(Debug, Clone)]
pub struct TextChunk {
    /// Chunk text
    pub text: String,

    /// Start byte offset in original text
    pub start: usize,

    /// End byte offset in original text
    pub end: usize,
}

/// Split text into chunks by character count
///
/// Counts are in characters, not bytes: Chinese text is multi-byte in UTF-8
/// and slices must land on character boundaries.
pub fn chunk_text(text: &str, max_chars: usize, overlap_chars: usize) -> Vec<TextChunk> {
    let max_chars = max_chars.max(1);
    let char_count = text.chars().count();

    if char_count <= max_chars {
        // Text is short enough, return as single chunk
        return vec![TextChunk {
            text: text.to_string(),
            start: 0,
            end: text.len(),
        }];
    }

    // Byte offset of every character, with a sentinel for the end of text
    let mut offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    offsets.push(text.len());

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < char_count {
        let end = (start + max_chars).min(char_count);

        // Try to find a good breaking point (sentence boundary)
        let actual_end = if end < char_count {
            find_break_point(text, &offsets, start, end)
        } else {
            end
        };

        chunks.push(TextChunk {
            text: text[offsets[start]..offsets[actual_end]].to_string(),
            start: offsets[start],
            end: offsets[actual_end],
        });

        if actual_end >= char_count {
            break;
        }

        // Move to next chunk with overlap
        start = if actual_end > start + overlap_chars {
            actual_end - overlap_chars
        } else {
            actual_end
        };
    }

    chunks
}

/// Find a good breaking point (sentence boundary)
///
/// Positions are character indices; `offsets` maps them to byte offsets.
fn find_break_point(text: &str, offsets: &[usize], start: usize, ideal_end: usize) -> usize {
    // Look for sentence endings within the last 20% of the chunk
    let search_start = start + ((ideal_end - start) * 80 / 100);
    let search_text = &text[offsets[search_start]..offsets[ideal_end]];

    // Keep the last sentence ending in the window
    let mut best = None;
    let mut iter = search_text.chars().enumerate().peekable();

    while let Some((pos, ch)) = iter.next() {
        let is_break = match ch {
            '。' | '！' | '？' | '\n' => true,
            // Latin endings only count before whitespace, so "3.5" stays intact
            '.' | '!' | '?' => iter.peek().map_or(true, |(_, next)| next.is_whitespace()),
            _ => false,
        };
        if is_break {
            best = Some(search_start + pos + 1);
        }
    }

    best.unwrap_or(ideal_end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_short_text() {
        let text = "這是一段很短的文本。";
        let chunks = chunk_text(text, 100, 10);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, text);
    }

    #[test]
    fn test_chunk_long_chinese_text() {
        let text = "我們今天學習繁體中文的語法。".repeat(100);
        let chunks = chunk_text(&text, 200, 20);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.text.chars().count() <= 200);
        }
    }

    #[test]
    fn test_chunks_break_on_sentence_endings() {
        let text = "第一句話。第二句話。第三句話。第四句話。第五句話。".repeat(20);
        let chunks = chunk_text(&text, 60, 5);
        // Every chunk except the last should end at a sentence boundary
        for chunk in &chunks[..chunks.len() - 1] {
            assert!(chunk.text.ends_with('。'), "chunk ended mid-sentence: {}", chunk.text);
        }
    }

    #[test]
    fn test_chunk_offsets_match_source() {
        let text = "今天天氣很好！我們去公園散步。你想一起來嗎？".repeat(30);
        let chunks = chunk_text(&text, 80, 10);
        for chunk in &chunks {
            assert_eq!(&text[chunk.start..chunk.end], chunk.text);
        }
    }

    #[test]
    fn test_chunks_overlap() {
        let text = "一二三四五六七八九十。".repeat(50);
        let chunks = chunk_text(&text, 100, 10);
        assert!(chunks.len() > 1);
        assert!(chunks[1].start < chunks[0].end);
    }
}
