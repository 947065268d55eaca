//! Append-only command log: binary protobuf frames.
//!
//! Storage format: length-prefixed protobuf frames.
//!   [4-byte LE length][protobuf bytes][4-byte LE length][protobuf bytes]...
//!
//! Rules:
//!   - Strict append only; frames are never rewritten. Undo is itself a frame.
//!   - fsync after every write
//!   - Sequence strictly increasing without gaps (validated on append and load)
//!   - A truncated or undecodable frame fails the whole load

use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use prost::Message;
use tracing::debug;

use crate::proto_types::ProtoCommandEnvelope;

/// Frames larger than this are treated as corruption.
const MAX_FRAME_LEN: usize = 1024 * 1024;

/// Append-only command log backed by a binary file.
#[derive(Debug)]
pub struct CommandLog {
    path: PathBuf,
    last_sequence: u64,
}

impl CommandLog {
    /// Open or create a command log at the given path.
    /// Reads existing frames to determine the last sequence number.
    pub fn open(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let last_sequence = if path.exists() {
            let frames = Self::read_all_from_file(path)?;
            frames.last().map(|f| f.sequence).unwrap_or(0)
        } else {
            0
        };
        debug!(path = %path.display(), last_sequence, "command log opened");

        Ok(Self {
            path: path.to_path_buf(),
            last_sequence,
        })
    }

    /// Append a single command frame and fsync.
    pub fn append(&mut self, frame: &ProtoCommandEnvelope) -> io::Result<()> {
        let expected = self.last_sequence + 1;
        if frame.sequence != expected {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "sequence violation in command log: expected {}, got {}",
                    expected, frame.sequence
                ),
            ));
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let buf = frame.encode_to_vec();
        let len = buf.len() as u32;

        {
            let mut writer = BufWriter::new(&mut file);
            writer.write_all(&len.to_le_bytes())?;
            writer.write_all(&buf)?;
            writer.flush()?;
        }
        file.sync_all()?;

        self.last_sequence = frame.sequence;
        Ok(())
    }

    /// Load all frames in sequence order.
    pub fn load_all(&self) -> io::Result<Vec<ProtoCommandEnvelope>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        Self::read_all_from_file(&self.path)
    }

    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all_from_file(path: &Path) -> io::Result<Vec<ProtoCommandEnvelope>> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        let mut frames: Vec<ProtoCommandEnvelope> = Vec::new();
        let mut len_buf = [0u8; 4];

        loop {
            match reader.read_exact(&mut len_buf) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e),
            }

            let len = u32::from_le_bytes(len_buf) as usize;
            if len == 0 || len > MAX_FRAME_LEN {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("invalid frame length {} after {} frames", len, frames.len()),
                ));
            }

            let mut buf = vec![0u8; len];
            reader.read_exact(&mut buf).map_err(|e| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("truncated frame after {} frames: {}", frames.len(), e),
                )
            })?;

            let frame = ProtoCommandEnvelope::decode(buf.as_slice()).map_err(|e| {
                io::Error::new(io::ErrorKind::InvalidData, format!("protobuf decode error: {}", e))
            })?;

            let expected = frames.last().map(|f| f.sequence).unwrap_or(0) + 1;
            if frame.sequence != expected {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("frame out of order: expected {}, got {}", expected, frame.sequence),
                ));
            }

            frames.push(frame);
        }

        Ok(frames)
    }
}
