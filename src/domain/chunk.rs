//! Chunk Value Objects

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::DomainError;

/// 朗读单元
///
/// 不变量:
/// - index 即朗读顺序，会话开始后不可变
/// - anchor 是 UI 滚动定位用的锚点
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    index: usize,
    text: String,
    anchor: String,
}

impl Chunk {
    pub fn new(index: usize, text: impl Into<String>, anchor: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
            anchor: anchor.into(),
        }
    }

    /// 按位置生成连续编号的 chunk 列表
    pub fn sequence<I, S>(texts: I, mode: ChunkMode) -> Vec<Chunk>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| Chunk::new(i, text, mode.anchor_for(i)))
            .collect()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn anchor(&self) -> &str {
        &self.anchor
    }
}

/// 分段模式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkMode {
    /// 经文模式：每行一节
    #[default]
    Verse,
    /// 段落模式：空行分隔
    #[serde(alias = "fluid")]
    Paragraph,
}

impl ChunkMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkMode::Verse => "verse",
            ChunkMode::Paragraph => "paragraph",
        }
    }

    /// chunk 位置到锚点的默认映射
    pub fn anchor_for(&self, position: usize) -> String {
        match self {
            ChunkMode::Verse => format!("verse-{}", position + 1),
            ChunkMode::Paragraph => format!("paragraph-{}", position),
        }
    }
}

impl FromStr for ChunkMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "verse" => Ok(ChunkMode::Verse),
            "paragraph" | "fluid" => Ok(ChunkMode::Paragraph),
            other => Err(DomainError::InvalidChunkMode(other.to_string())),
        }
    }
}
