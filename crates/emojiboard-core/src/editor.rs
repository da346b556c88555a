//! Editing engine: applies named, undoable intents to the current snapshot
//! and owns the undo/redo log.

use crate::document::{Background, BoardDocument, Emoji, EmojiId};
use crate::events::{BoardEvent, EventHub};
use log::debug;

/// Maximum number of undo entries to keep.
const MAX_UNDO_HISTORY: usize = 50;

/// One recorded edit: its user-facing label and the whole snapshot that was
/// current before the edit. Restoring the prior value is trivially correct
/// no matter how many fields the edit touched; documents are tens of
/// emojis, so the memory cost is acceptable.
#[derive(Debug, Clone)]
struct UndoEntry {
    label: String,
    prior: BoardDocument,
}

/// Holds the single current snapshot and the undo/redo stacks.
///
/// Intents take an optional `label`; `None` applies the edit without
/// recording it, for non-undoable programmatic initialization. All methods
/// must be called from one owner thread; the stacks and the id counter
/// assume serialized access.
pub struct BoardEditor {
    current: BoardDocument,
    undo_stack: Vec<UndoEntry>,
    redo_stack: Vec<UndoEntry>,
    events: EventHub,
}

impl BoardEditor {
    pub fn new(document: BoardDocument, events: EventHub) -> Self {
        Self {
            current: document,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            events,
        }
    }

    /// The current snapshot.
    pub fn document(&self) -> &BoardDocument {
        &self.current
    }

    pub fn emojis(&self) -> &[Emoji] {
        self.current.emojis()
    }

    pub fn background(&self) -> &Background {
        self.current.background()
    }

    /// Record the pre-edit snapshot for undo (when labeled) and clear the
    /// redo stack.
    fn record(&mut self, label: Option<&str>) {
        let Some(label) = label else { return };
        self.undo_stack.push(UndoEntry {
            label: label.to_string(),
            prior: self.current.clone(),
        });
        self.redo_stack.clear();
        if self.undo_stack.len() > MAX_UNDO_HISTORY {
            self.undo_stack.remove(0);
        }
    }

    fn replaced(&self) {
        self.events.publish(BoardEvent::SnapshotReplaced);
    }

    /// Replace the background.
    pub fn set_background(&mut self, background: Background, label: Option<&str>) {
        self.record(label);
        self.current = self.current.clone().with_background(background);
        self.replaced();
    }

    /// Place a new emoji on top of the board; returns its assigned id.
    pub fn add_emoji(
        &mut self,
        text: &str,
        x: i32,
        y: i32,
        size: i32,
        label: Option<&str>,
    ) -> EmojiId {
        self.record(label);
        let (next, id) = self.current.clone().with_emoji(text, x, y, size);
        self.current = next;
        self.replaced();
        id
    }

    /// Offset an emoji's position. A missing id is a silent no-op: nothing
    /// is recorded or published, and `false` is returned.
    pub fn move_emoji(&mut self, id: EmojiId, dx: i32, dy: i32, label: Option<&str>) -> bool {
        if self.current.emoji(id).is_none() {
            debug!("move_emoji: no emoji with id {id}");
            return false;
        }
        self.record(label);
        self.current = self.current.clone().with_emoji_updated(id, |e| {
            e.x += dx;
            e.y += dy;
        });
        self.replaced();
        true
    }

    /// Multiply an emoji's size by `factor`, rounding half away from zero.
    /// Missing ids behave as in [`move_emoji`](Self::move_emoji).
    pub fn scale_emoji(&mut self, id: EmojiId, factor: f64, label: Option<&str>) -> bool {
        if self.current.emoji(id).is_none() {
            debug!("scale_emoji: no emoji with id {id}");
            return false;
        }
        self.record(label);
        self.current = self.current.clone().with_emoji_updated(id, |e| {
            e.size = (f64::from(e.size) * factor).round() as i32;
        });
        self.replaced();
        true
    }

    /// Restore the snapshot before the most recent recorded edit.
    /// Returns false if there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(entry) = self.undo_stack.pop() else {
            return false;
        };
        self.redo_stack.push(UndoEntry {
            label: entry.label,
            prior: std::mem::replace(&mut self.current, entry.prior),
        });
        self.replaced();
        true
    }

    /// Re-apply the most recently undone edit.
    /// Returns false if there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(entry) = self.redo_stack.pop() else {
            return false;
        };
        self.undo_stack.push(UndoEntry {
            label: entry.label,
            prior: std::mem::replace(&mut self.current, entry.prior),
        });
        self.replaced();
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Label of the edit `undo` would revert.
    pub fn undo_label(&self) -> Option<&str> {
        self.undo_stack.last().map(|e| e.label.as_str())
    }

    /// Label of the edit `redo` would re-apply.
    pub fn redo_label(&self) -> Option<&str> {
        self.redo_stack.last().map(|e| e.label.as_str())
    }

    /// Wholesale non-undoable replacement, used when loading a persisted
    /// document at startup. Clears both stacks.
    pub fn replace_document(&mut self, document: BoardDocument) {
        self.current = document;
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.replaced();
    }
}
