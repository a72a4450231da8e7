use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::info;

use crate::modules::error::Result;
use crate::modules::explorer::{self, ExploreReport};
use crate::modules::graph::RoomGraph;
use crate::modules::session::Session;
use crate::modules::transport::Transport;

pub fn map_file_path(dir: &Path) -> PathBuf {
    dir.join("map.json")
}

/// Previously persisted map, `None` when absent or empty.
pub fn load_graph(dir: &Path) -> io::Result<Option<RoomGraph>> {
    let path = map_file_path(dir);
    if !path.exists() {
        return Ok(None);
    }

    let bytes = fs::read(&path)?;
    if bytes.is_empty() {
        return Ok(None);
    }

    let graph: RoomGraph = serde_json::from_slice(&bytes).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "failed to parse map {}; delete it to re-explore: {}",
                path.display(),
                e
            ),
        )
    })?;
    Ok(Some(graph))
}

pub fn save_graph(dir: &Path, graph: &RoomGraph) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = map_file_path(dir);
    let json = serde_json::to_vec_pretty(graph)?;
    fs::write(&path, json)?;
    info!("saved map with {} rooms to {}", graph.len(), path.display());
    Ok(path)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MapSource {
    /// The saved map already covered every reachable exit.
    Loaded,
    Explored(ExploreReport),
}

/// Finish the session's map after bootstrap: explore only if exits remain, then persist.
pub fn complete_map<T: Transport>(session: &mut Session<T>, dir: &Path) -> Result<MapSource> {
    if session.graph.is_complete() && session.graph.len() > 1 {
        info!("map loaded: {} rooms", session.graph.len());
        return Ok(MapSource::Loaded);
    }
    let report = explorer::explore(session)?;
    save_graph(dir, &session.graph)?;
    Ok(MapSource::Explored(report))
}
