//! Well clue decoding.
//!
//! The well's description holds two lines of prose followed by an encoded program. The
//! program is handed to a decoder whose output names a room; the first number in that output
//! is the target room id.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use log::debug;

use crate::modules::api::first_number;
use crate::modules::error::{AgentError, Result};
use crate::modules::graph::RoomId;

/// Lines of prose preceding the program in a well description.
const CLUE_HEADER_LINES: usize = 2;

pub trait PuzzleDecoder {
    fn decode(&mut self, clue: &str) -> Result<RoomId>;
}

/// Program part of a well description.
pub fn clue_program(description: &str) -> String {
    let lines: Vec<&str> = description.lines().skip(CLUE_HEADER_LINES).collect();
    lines.join("\n")
}

fn room_from_output(output: &str) -> Result<RoomId> {
    first_number(output)
        .and_then(|n| RoomId::try_from(n).ok())
        .ok_or_else(|| AgentError::Puzzle(format!("no room number in '{}'", output.trim())))
}

/// Reads the room id straight out of the clue text.
#[derive(Clone, Copy, Debug, Default)]
pub struct DigitsDecoder;

impl PuzzleDecoder for DigitsDecoder {
    fn decode(&mut self, clue: &str) -> Result<RoomId> {
        room_from_output(clue)
    }
}

/// Pipes the clue program to an external executable and parses its stdout.
#[derive(Clone, Debug)]
pub struct CommandDecoder {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandDecoder {
    /// `command_line` is split on whitespace; the program must be on `PATH` or a path.
    pub fn new(command_line: &str) -> Result<Self> {
        let mut parts = command_line.split_whitespace();
        let name = parts
            .next()
            .ok_or_else(|| AgentError::Config("decoder_command is empty".into()))?;
        let program = which::which(name)
            .map_err(|e| AgentError::Config(format!("decoder '{}' not found: {}", name, e)))?;
        Ok(Self {
            program,
            args: parts.map(str::to_string).collect(),
        })
    }
}

impl PuzzleDecoder for CommandDecoder {
    fn decode(&mut self, clue: &str) -> Result<RoomId> {
        let program = clue_program(clue);
        debug!(
            "running decoder {} on {} program lines",
            self.program.display(),
            program.lines().count()
        );
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(program.as_bytes())?;
            stdin.write_all(b"\n")?;
        }
        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(AgentError::Puzzle(format!(
                "decoder exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        room_from_output(&String::from_utf8_lossy(&output.stdout))
    }
}
