//! 文本分割器
//!
//! 把整章文本切分为朗读单元，支持经文模式（逐行）与段落模式（空行分隔）

use super::{Chunk, ChunkMode};

/// 默认最小字符数限制
/// 段落拆分后尾部片段不足此长度时，合并到前一个片段
pub const DEFAULT_MIN_CHARS: usize = 20;

/// 默认最大字符数限制
/// 超过此长度的段落按句末标点拆分
pub const DEFAULT_MAX_CHARS: usize = 600;

/// 文本分割配置
#[derive(Debug, Clone)]
pub struct SegmentConfig {
    /// 最小字符数限制（用于合并短句）
    pub min_chars: usize,
    /// 单个段落 chunk 的最大字符数
    pub max_chars: usize,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            min_chars: DEFAULT_MIN_CHARS,
            max_chars: DEFAULT_MAX_CHARS,
        }
    }
}

/// 检查是否为强分隔符（句末标点）
#[inline]
fn is_strong_delimiter(ch: char) -> bool {
    matches!(ch, '。' | '？' | '！' | '.' | '?' | '!')
}

/// 检查片段是否只包含引号或空白（应该被合并）
#[inline]
fn is_trivial_segment(s: &str) -> bool {
    s.chars().all(|c| {
        matches!(
            c,
            '"' | '\u{201C}' | '\u{201D}' | '\'' | '\u{2018}' | '\u{2019}' | ' ' | '\t'
        )
    })
}

/// 拆出行首的经文编号（"3 And God said" -> (Some(3), "And God said")）
fn split_verse_number(line: &str) -> (Option<u32>, &str) {
    let digits_end = line
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(line.len());

    if digits_end == 0 || digits_end == line.len() {
        return (None, line);
    }

    let rest = &line[digits_end..];
    let rest = rest.strip_prefix(&['.', ':', ')'][..]).unwrap_or(rest);
    if !rest.starts_with(char::is_whitespace) {
        return (None, line);
    }

    match line[..digits_end].parse::<u32>() {
        Ok(number) => (Some(number), rest.trim()),
        Err(_) => (None, line),
    }
}

/// 按句末标点分割（不做合并）
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();

    for ch in text.chars() {
        current.push(ch);
        if is_strong_delimiter(ch) {
            let trimmed = current.trim();
            if !trimmed.is_empty() {
                sentences.push(trimmed.to_string());
            }
            current.clear();
        }
    }

    let trimmed = current.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }

    sentences
}

/// 把句子装箱到不超过 max_chars 的片段中，过短的尾部合并到前一个
fn pack_sentences(sentences: Vec<String>, config: &SegmentConfig) -> Vec<String> {
    let mut pieces: Vec<String> = Vec::new();
    let mut buffer = String::new();

    for sentence in sentences {
        if is_trivial_segment(&sentence) {
            if buffer.is_empty() {
                if let Some(last) = pieces.last_mut() {
                    last.push_str(&sentence);
                    continue;
                }
            }
            buffer.push_str(&sentence);
            continue;
        }

        let projected = buffer.chars().count() + sentence.chars().count() + 1;
        if !buffer.is_empty() && projected > config.max_chars {
            pieces.push(std::mem::take(&mut buffer));
        }
        if !buffer.is_empty() {
            buffer.push(' ');
        }
        buffer.push_str(&sentence);
    }

    if !buffer.is_empty() {
        match pieces.last_mut() {
            Some(last) if buffer.chars().count() < config.min_chars => {
                last.push(' ');
                last.push_str(&buffer);
            }
            _ => pieces.push(buffer),
        }
    }

    pieces
}

/// 经文模式：每个非空行一节
fn segment_verses(text: &str) -> Vec<Chunk> {
    let mut chunks: Vec<Chunk> = Vec::new();

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let (number, body) = split_verse_number(line);
        if body.is_empty() {
            continue;
        }

        if is_trivial_segment(body) {
            if let Some(last) = chunks.pop() {
                let merged = format!("{}{}", last.text(), body);
                chunks.push(Chunk::new(last.index(), merged, last.anchor()));
            }
            continue;
        }

        let index = chunks.len();
        let anchor = match number {
            Some(n) => format!("verse-{}", n),
            None => ChunkMode::Verse.anchor_for(index),
        };
        chunks.push(Chunk::new(index, body, anchor));
    }

    chunks
}

/// 段落模式：空行分隔，超长段落按句拆分
fn segment_paragraphs(text: &str, config: &SegmentConfig) -> Vec<Chunk> {
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join(" "));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join(" "));
    }

    let pieces = paragraphs.into_iter().flat_map(|paragraph| {
        if paragraph.chars().count() <= config.max_chars {
            vec![paragraph]
        } else {
            pack_sentences(split_sentences(&paragraph), config)
        }
    });

    Chunk::sequence(pieces, ChunkMode::Paragraph)
}

/// 对文本进行分段
///
/// 返回按朗读顺序编号的 chunk 列表，锚点由分段模式决定
pub fn segment_text(text: &str, mode: ChunkMode, config: &SegmentConfig) -> Vec<Chunk> {
    match mode {
        ChunkMode::Verse => segment_verses(text),
        ChunkMode::Paragraph => segment_paragraphs(text, config),
    }
}
