//! Session facade: wires the editing engine, the background loader, and
//! the autosaver into the single intent surface embedders talk to.
//!
//! All methods run on the owner thread. The embedder calls intents in
//! response to user input and [`tick`](BoardSession::tick) once per
//! frame (or on any timer) to deliver fetch completions and fire any due
//! autosave.

use crate::document::{Background, BoardDocument, Emoji, EmojiId};
use crate::editor::BoardEditor;
use crate::events::{BoardEvent, EventHub};
use crate::fetch::{BackgroundLoader, FetchStatus, ImageFetcher};
use crate::storage::{Autosaver, DocumentStore};
use image::RgbaImage;
use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

/// An open document plus its edit, fetch, and persistence machinery.
pub struct BoardSession<S: DocumentStore> {
    editor: BoardEditor,
    loader: BackgroundLoader,
    autosaver: Autosaver<S>,
    events: EventHub,
}

impl<S: DocumentStore> BoardSession<S> {
    /// Open a session: load the persisted document (empty on any failure)
    /// and start resolving its background.
    pub fn new(store: S, fetcher: Arc<dyn ImageFetcher>) -> Self {
        let events = EventHub::new();
        let autosaver = Autosaver::new(store);
        let document = autosaver.load();

        let mut loader = BackgroundLoader::new(fetcher, events.clone());
        loader.background_changed(document.background());

        Self {
            editor: BoardEditor::new(document, events.clone()),
            loader,
            autosaver,
            events,
        }
    }

    /// Subscribe to snapshot-replaced, fetch-status-changed, and
    /// image-resolved events.
    pub fn subscribe(&self) -> Receiver<BoardEvent> {
        self.events.subscribe()
    }

    // --- Intents -----------------------------------------------------

    pub fn set_background(&mut self, background: Background, label: Option<&str>) {
        let before = self.editor.background().clone();
        self.editor.set_background(background, label);
        self.after_edit(&before);
    }

    pub fn add_emoji(
        &mut self,
        text: &str,
        x: i32,
        y: i32,
        size: i32,
        label: Option<&str>,
    ) -> EmojiId {
        let before = self.editor.background().clone();
        let id = self.editor.add_emoji(text, x, y, size, label);
        self.after_edit(&before);
        id
    }

    pub fn move_emoji(&mut self, id: EmojiId, dx: i32, dy: i32, label: Option<&str>) -> bool {
        let before = self.editor.background().clone();
        let moved = self.editor.move_emoji(id, dx, dy, label);
        if moved {
            self.after_edit(&before);
        }
        moved
    }

    pub fn scale_emoji(&mut self, id: EmojiId, factor: f64, label: Option<&str>) -> bool {
        let before = self.editor.background().clone();
        let scaled = self.editor.scale_emoji(id, factor, label);
        if scaled {
            self.after_edit(&before);
        }
        scaled
    }

    pub fn undo(&mut self) -> bool {
        let before = self.editor.background().clone();
        let undone = self.editor.undo();
        if undone {
            self.after_edit(&before);
        }
        undone
    }

    pub fn redo(&mut self) -> bool {
        let before = self.editor.background().clone();
        let redone = self.editor.redo();
        if redone {
            self.after_edit(&before);
        }
        redone
    }

    // Every applied change schedules a save; a changed background value
    // additionally restarts resolution (superseding any in-flight fetch
    // via the staleness guard).
    fn after_edit(&mut self, background_before: &Background) {
        self.autosaver.note_change();
        if self.editor.background() != background_before {
            self.loader.background_changed(self.editor.background());
        }
    }

    // --- Owner-thread pump -------------------------------------------

    /// Deliver fetch completions and fire any due autosave.
    pub fn tick(&mut self) {
        self.loader.poll(self.editor.background());
        self.autosaver.tick(self.editor.document());
    }

    /// Persist immediately, bypassing the debounce.
    pub fn flush(&mut self) {
        self.autosaver.flush(self.editor.document());
    }

    pub fn set_debounce(&mut self, debounce: Duration) {
        self.autosaver.set_debounce(debounce);
    }

    // --- Read accessors ----------------------------------------------

    pub fn document(&self) -> &BoardDocument {
        self.editor.document()
    }

    pub fn emojis(&self) -> &[Emoji] {
        self.editor.emojis()
    }

    pub fn background(&self) -> &Background {
        self.editor.background()
    }

    pub fn fetch_status(&self) -> &FetchStatus {
        self.loader.status()
    }

    /// The resolved background image, if any.
    pub fn background_image(&self) -> Option<&RgbaImage> {
        self.loader.image()
    }

    pub fn can_undo(&self) -> bool {
        self.editor.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.editor.can_redo()
    }

    pub fn undo_label(&self) -> Option<&str> {
        self.editor.undo_label()
    }

    pub fn redo_label(&self) -> Option<&str> {
        self.editor.redo_label()
    }
}
