use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::modules::api::Endpoint;

/// Successful requests per endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestStats {
    pub per_endpoint: BTreeMap<Endpoint, u64>,
}

impl RequestStats {
    pub fn record(&mut self, endpoint: Endpoint) {
        let count = self.per_endpoint.entry(endpoint).or_default();
        *count = count.saturating_add(1);
    }

    pub fn count(&self, endpoint: Endpoint) -> u64 {
        self.per_endpoint.get(&endpoint).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.per_endpoint.values().sum()
    }

    pub fn merge(&mut self, other: &RequestStats) {
        for (endpoint, count) in &other.per_endpoint {
            let entry = self.per_endpoint.entry(*endpoint).or_default();
            *entry = entry.saturating_add(*count);
        }
    }

    pub fn summary(&self) -> String {
        if self.per_endpoint.is_empty() {
            return "no requests recorded".into();
        }
        self.per_endpoint
            .iter()
            .map(|(endpoint, count)| format!("{}={}", endpoint, count))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn stats_path(dir: &Path) -> PathBuf {
    dir.join("action_stats.json")
}

pub fn reset_request_stats(dir: &Path) -> io::Result<()> {
    save_request_stats(dir, &RequestStats::default())
}

pub fn load_request_stats(dir: &Path) -> io::Result<RequestStats> {
    let path = stats_path(dir);
    if !path.exists() {
        return Ok(RequestStats::default());
    }

    let bytes = fs::read(&path)?;
    if bytes.is_empty() {
        return Ok(RequestStats::default());
    }

    let store: RequestStats = serde_json::from_slice(&bytes)?;
    Ok(store)
}

pub fn save_request_stats(dir: &Path, stats: &RequestStats) -> io::Result<()> {
    fs::create_dir_all(dir)?;
    let json = serde_json::to_vec_pretty(stats)?;
    fs::write(stats_path(dir), json)?;
    Ok(())
}
