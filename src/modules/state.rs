use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::modules::graph::RoomId;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Status {
    Initialized,
    Running,
    Stopped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeState {
    pub status: Status,
    pub tasks_completed: u64,
    pub room: Option<RoomId>,
    pub message: Option<String>,
}

impl Default for RuntimeState {
    fn default() -> Self {
        Self {
            status: Status::Initialized,
            tasks_completed: 0,
            room: None,
            message: None,
        }
    }
}

pub fn state_file_path(dir: &Path) -> PathBuf {
    dir.join("state.json")
}

pub fn init_state(dir: &Path) -> io::Result<RuntimeState> {
    let state = RuntimeState::default();
    save_state(dir, &state)?;
    Ok(state)
}

pub fn load_state(dir: &Path) -> io::Result<Option<RuntimeState>> {
    load_state_file(&state_file_path(dir))
}

pub fn load_state_file(path: &Path) -> io::Result<Option<RuntimeState>> {
    if !path.exists() {
        return Ok(None);
    }

    let bytes = fs::read(path)?;
    if bytes.is_empty() {
        return Ok(None);
    }

    let state: RuntimeState = serde_json::from_slice(&bytes).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "failed to parse state file {}; delete it or run `hunter init` to reset: {}",
                path.display(),
                e
            ),
        )
    })?;
    Ok(Some(state))
}

pub fn save_state(dir: &Path, state: &RuntimeState) -> io::Result<()> {
    fs::create_dir_all(dir)?;
    let json = serde_json::to_vec_pretty(state)?;
    fs::write(state_file_path(dir), json)?;
    Ok(())
}

pub fn set_status(
    dir: &Path,
    status: Status,
    tasks_completed: u64,
    room: Option<RoomId>,
    message: Option<String>,
) -> io::Result<RuntimeState> {
    let mut state = load_state(dir)?.unwrap_or_default();
    state.status = status;
    state.tasks_completed = tasks_completed;
    if room.is_some() {
        state.room = room;
    }
    state.message = message;
    save_state(dir, &state)?;
    Ok(state)
}
