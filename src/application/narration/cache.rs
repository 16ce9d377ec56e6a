//! Chunk Cache - 解码音频的有界存储
//!
//! 缓存本身没有淘汰策略，边界由 Narrator 按播放指针距离维护

use dashmap::DashMap;

use crate::domain::DecodedAudio;

/// chunk index -> 解码音频
#[derive(Debug, Default)]
pub struct ChunkCache {
    entries: DashMap<usize, DecodedAudio>,
}

impl ChunkCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// 存入一个缓冲，已存在时覆盖
    pub fn put(&self, index: usize, audio: DecodedAudio) {
        self.entries.insert(index, audio);
    }

    pub fn get(&self, index: usize) -> Option<DecodedAudio> {
        self.entries.get(&index).map(|entry| entry.value().clone())
    }

    pub fn has(&self, index: usize) -> bool {
        self.entries.contains_key(&index)
    }

    /// 移除一个条目，不存在时为空操作
    pub fn evict(&self, index: usize) {
        if self.entries.remove(&index).is_some() {
            tracing::trace!(index, "Chunk evicted from cache");
        }
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 当前缓存的 index（升序）
    pub fn indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self.entries.iter().map(|e| *e.key()).collect();
        indices.sort_unstable();
        indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn audio(ms: u64) -> DecodedAudio {
        DecodedAudio::silence(ms, 1000)
    }

    #[test]
    fn test_put_get_has() {
        let cache = ChunkCache::new();
        assert!(!cache.has(0));
        assert!(cache.get(0).is_none());

        cache.put(0, audio(10));
        assert!(cache.has(0));
        assert_eq!(cache.get(0).unwrap().frames(), 10);
    }

    #[test]
    fn test_put_overwrites() {
        let cache = ChunkCache::new();
        cache.put(3, audio(10));
        cache.put(3, audio(20));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(3).unwrap().frames(), 20);
    }

    #[test]
    fn test_evict_missing_is_noop() {
        let cache = ChunkCache::new();
        cache.put(1, audio(10));
        cache.evict(5);
        cache.evict(1);
        cache.evict(1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear_and_indices() {
        let cache = ChunkCache::new();
        for i in [4, 1, 2] {
            cache.put(i, audio(1));
        }
        assert_eq!(cache.indices(), vec![1, 2, 4]);
        cache.clear();
        assert!(cache.indices().is_empty());
    }
}
