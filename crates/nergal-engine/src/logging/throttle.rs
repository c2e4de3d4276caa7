use nergal_collections::{HashTable, hash_str};

/// Per-site counter that lets a repeated warning through once every `interval` hits.
///
/// The first hit at a site always passes. With an interval of 0 or 1 every hit passes.
#[derive(Debug, Clone)]
pub struct WarnThrottle {
    interval: u32,
    hits: HashTable<u64, u32>,
}

impl WarnThrottle {
    pub fn new(interval: u32) -> Self {
        Self {
            interval,
            hits: HashTable::new(),
        }
    }

    #[inline]
    pub fn interval(&self) -> u32 {
        self.interval
    }

    /// Records a hit at `site` and reports whether it should be logged.
    pub fn should_emit(&mut self, site: &str) -> bool {
        let key = hash_str(site);
        let hits = match self.hits.get_mut(&key) {
            Some(count) => {
                *count = count.wrapping_add(1);
                *count
            }
            None => {
                self.hits.insert(key, 1);
                1
            }
        };

        self.interval <= 1 || hits.wrapping_sub(1) % self.interval == 0
    }

    /// Hits recorded at `site` so far.
    pub fn hits(&self, site: &str) -> u32 {
        self.hits.get(&hash_str(site)).copied().unwrap_or(0)
    }

    pub fn reset(&mut self) {
        self.hits.clear();
    }
}
