use std::ops::Range;

use common::FileFormat;
use lz4_flex::block::DecompressError;
use lz4_flex::{compress_prepend_size, decompress_size_prepended};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::document::{GraphDocument, StreamError};
use crate::merge::{MergeError, MergeEventHandler};
use crate::node_manager::NodeManager;

#[derive(Debug, Error)]
pub enum UndoError {
    #[error("Nothing to undo")]
    NothingToUndo,
    #[error("Nothing to redo")]
    NothingToRedo,
    #[error("Undo snapshot is corrupted: {0}")]
    Decompress(#[from] DecompressError),
    #[error("Undo snapshot is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error(transparent)]
    Stream(#[from] StreamError),
    #[error(transparent)]
    Merge(#[from] MergeError),
}

pub type UndoResult<T> = std::result::Result<T, UndoError>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UndoConfig {
    pub format: FileFormat,
    /// Per-stack limit on compressed snapshot bytes. The newest snapshot is
    /// always kept.
    pub max_stack_bytes: Option<usize>,
}

/// Compressed snapshots packed back to back in one buffer.
#[derive(Debug, Default)]
struct SnapshotStack {
    bytes: Vec<u8>,
    ranges: Vec<Range<usize>>,
}

impl SnapshotStack {
    fn push(&mut self, snapshot: &[u8], max_bytes: Option<usize>) {
        let start = self.bytes.len();
        self.bytes.extend_from_slice(snapshot);
        self.ranges.push(start..self.bytes.len());

        if let Some(max_bytes) = max_bytes {
            self.enforce_limit(max_bytes);
        }
    }

    fn pop(&mut self) -> Option<Vec<u8>> {
        let range = self.ranges.pop()?;
        let snapshot = self.bytes[range.clone()].to_vec();
        self.bytes.truncate(range.start);
        Some(snapshot)
    }

    fn enforce_limit(&mut self, max_bytes: usize) {
        while self.ranges.len() > 1 && self.bytes.len() > max_bytes {
            let removed = self.ranges.remove(0);
            let removed_len = removed.end;
            self.bytes.drain(0..removed_len);
            for range in self.ranges.iter_mut() {
                range.start -= removed_len;
                range.end -= removed_len;
            }
        }
    }

    fn clear(&mut self) {
        self.bytes.clear();
        self.ranges.clear();
    }

    fn len(&self) -> usize {
        self.ranges.len()
    }
}

/// Linear history of whole-graph snapshots. Restoring goes through
/// `NodeManager::replace_with`, so node ids survive undo and redo.
#[derive(Debug, Default)]
pub struct UndoHandler {
    config: UndoConfig,
    undo_stack: SnapshotStack,
    redo_stack: SnapshotStack,
}

impl UndoHandler {
    pub fn new(config: UndoConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &UndoConfig {
        &self.config
    }

    /// Records the current state. Call before every undoable mutation; any
    /// redo history is discarded.
    pub fn save_undo_state(&mut self, manager: &NodeManager) -> UndoResult<()> {
        let snapshot = self.serialize_snapshot(manager)?;
        self.redo_stack.clear();
        self.undo_stack
            .push(&snapshot, self.config.max_stack_bytes);
        Ok(())
    }

    pub fn undo(
        &mut self,
        manager: &mut NodeManager,
        handler: &mut dyn MergeEventHandler,
    ) -> UndoResult<()> {
        let snapshot = self.undo_stack.pop().ok_or(UndoError::NothingToUndo)?;
        let current = self.serialize_snapshot(manager)?;

        if let Err(err) = self.restore(manager, &snapshot, handler) {
            self.undo_stack.push(&snapshot, None);
            return Err(err);
        }
        self.redo_stack
            .push(&current, self.config.max_stack_bytes);

        info!(undo = self.undo_len(), redo = self.redo_len(), "undo");
        Ok(())
    }

    pub fn redo(
        &mut self,
        manager: &mut NodeManager,
        handler: &mut dyn MergeEventHandler,
    ) -> UndoResult<()> {
        let snapshot = self.redo_stack.pop().ok_or(UndoError::NothingToRedo)?;
        let current = self.serialize_snapshot(manager)?;

        if let Err(err) = self.restore(manager, &snapshot, handler) {
            self.redo_stack.push(&snapshot, None);
            return Err(err);
        }
        self.undo_stack
            .push(&current, self.config.max_stack_bytes);

        info!(undo = self.undo_len(), redo = self.redo_len(), "redo");
        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        self.undo_stack.len() > 0
    }

    pub fn can_redo(&self) -> bool {
        self.redo_stack.len() > 0
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    fn serialize_snapshot(&self, manager: &NodeManager) -> UndoResult<Vec<u8>> {
        let serialized = manager.write(self.config.format)?;
        Ok(compress_prepend_size(serialized.as_bytes()))
    }

    fn restore(
        &self,
        manager: &mut NodeManager,
        snapshot: &[u8],
        handler: &mut dyn MergeEventHandler,
    ) -> UndoResult<()> {
        let decompressed = decompress_size_prepended(snapshot)?;
        let decoded = String::from_utf8(decompressed)?;
        let document: GraphDocument =
            common::deserialize(&decoded, self.config.format).map_err(StreamError::from)?;
        let restored = NodeManager::from_document(document)?;
        manager.replace_with(&restored, handler)?;
        Ok(())
    }
}
