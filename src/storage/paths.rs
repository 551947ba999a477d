//! Object keys for every artifact the job writes.

use crate::models::{ShardKey, StorageConfig};

const WATERMARK_FILE: &str = "latest_event_border_info.json";
const EVENT_LOG_FILE: &str = "event_info_all.csv";

/// Directory (or key prefix) names for the three artifact categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub border_dir: String,
    pub event_dir: String,
    pub metadata_dir: String,
}

impl Layout {
    pub fn new(
        border_dir: impl Into<String>,
        event_dir: impl Into<String>,
        metadata_dir: impl Into<String>,
    ) -> Self {
        Self {
            border_dir: border_dir.into(),
            event_dir: event_dir.into(),
            metadata_dir: metadata_dir.into(),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(&config.border_dir, &config.event_dir, &config.metadata_dir)
    }

    pub fn dirs(&self) -> [&str; 3] {
        [&self.border_dir, &self.event_dir, &self.metadata_dir]
    }

    pub fn watermark_key(&self) -> String {
        join(&self.metadata_dir, WATERMARK_FILE)
    }

    pub fn event_log_key(&self) -> String {
        join(&self.event_dir, EVENT_LOG_FILE)
    }

    /// `border_info_{event}_{border}[_{idol}].csv`
    pub fn shard_key(&self, key: &ShardKey) -> String {
        let file = match key.idol_id {
            Some(idol_id) => format!(
                "border_info_{}_{}_{}.csv",
                key.event_id, key.border, idol_id
            ),
            None => format!("border_info_{}_{}.csv", key.event_id, key.border),
        };
        join(&self.border_dir, &file)
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::from_config(&StorageConfig::default())
    }
}

fn join(dir: &str, file: &str) -> String {
    let dir = dir.trim_matches('/');
    if dir.is_empty() {
        file.to_string()
    } else {
        format!("{}/{}", dir, file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_keys() {
        let layout = Layout::default();
        assert_eq!(
            layout.watermark_key(),
            "metadata/latest_event_border_info.json"
        );
        assert_eq!(layout.event_log_key(), "event_info/event_info_all.csv");
    }

    #[test]
    fn test_shard_keys() {
        let layout = Layout::new("b/", "e", "m");
        let normal = ShardKey {
            event_id: 5,
            border: 100,
            idol_id: None,
        };
        let idol = ShardKey {
            idol_id: Some(52),
            ..normal
        };
        assert_eq!(layout.shard_key(&normal), "b/border_info_5_100.csv");
        assert_eq!(layout.shard_key(&idol), "b/border_info_5_100_52.csv");
    }
}
