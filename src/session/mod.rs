//! The editing-session state machine.
//!
//! A [`SessionController`] owns the entry currently on screen, its mode and the
//! last-saved text used to detect drift for autosave. Storage calls run on the
//! tokio blocking pool; each one reports back through a completion channel that
//! the presentation thread drains with [`SessionController::dispatch_pending`],
//! [`SessionController::dispatch_next`] or [`SessionController::settle`]. State
//! only changes while draining, never from a background thread.
//!
//! # Examples
//!
//! ```
//! use daybook::session::{Mode, SessionController, SessionEvent};
//! use daybook::store::EntryStore;
//!
//! # fn main() -> daybook::AppResult<()> {
//! let runtime = tokio::runtime::Runtime::new()?;
//! let dir = tempfile::tempdir()?;
//!
//! let mut session = SessionController::new(
//!     EntryStore::new(dir.path()),
//!     runtime.handle().clone(),
//!     Vec::<SessionEvent>::new(),
//! );
//! session.start();
//! session.save("Trip", "Day 1", true)?;
//! runtime.block_on(session.settle());
//!
//! assert_eq!(session.mode(), Mode::Editing);
//! assert_eq!(session.current().map(|e| e.title.as_str()), Some("Trip"));
//! # Ok(())
//! # }
//! ```

use crate::constants::{
    DEFAULT_AUTOSAVE_SECS, STATUS_AUTOSAVING, STATUS_DELETE_IN_PROGRESS, STATUS_ENTRY_DELETED,
    STATUS_NEW_ENTRY, STATUS_SAVE_IN_PROGRESS,
};
use crate::entry::EntryRecord;
use crate::errors::{AppError, AppResult};
use crate::store::EntryStore;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};


/// What the session is doing with the current entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// No entry yet; the next save creates one.
    New,
    /// An existing entry is shown read-only. Autosave is off.
    Reading,
    /// The current entry is being written. Autosave is armed.
    Editing,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::New => "new",
            Mode::Reading => "reading",
            Mode::Editing => "editing",
        };
        f.write_str(name)
    }
}

/// Updates pushed to the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A fresh snapshot of the visible entries, most recent first.
    ListUpdated(Arc<[EntryRecord]>),
    /// Short status line text.
    StatusChanged(String),
    /// Something failed. `blocking` asks the presentation to interrupt the
    /// user, and is only set for explicit user actions.
    ErrorRaised {
        /// Human-readable description
        message: String,
        /// Whether to show a modal notification
        blocking: bool,
    },
    /// The session moved to another mode.
    ModeChanged(Mode),
    /// Background work started (`true`) or all of it finished (`false`).
    BusyChanged(bool),
}

/// Receives [`SessionEvent`]s on the presentation thread.
pub trait Presenter {
    /// Handles one event.
    fn present(&mut self, event: SessionEvent);
}

impl Presenter for Vec<SessionEvent> {
    fn present(&mut self, event: SessionEvent) {
        self.push(event);
    }
}

/// Last-saved text of the current entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Baseline {
    title: String,
    content: String,
}

impl Baseline {
    fn of(record: &EntryRecord) -> Self {
        Baseline {
            title: record.title.clone(),
            content: record.content.clone(),
        }
    }

    fn matches(&self, title: &str, content: &str) -> bool {
        self.title == title && self.content == content
    }
}

/// An explicit save waiting for the in-flight one to finish.
#[derive(Debug)]
struct Draft {
    title: String,
    content: String,
}

/// Result of a background storage call, tagged with what it belongs to.
enum Completion {
    Listed {
        generation: u64,
        result: AppResult<Vec<EntryRecord>>,
    },
    Saved {
        epoch: u64,
        explicit: bool,
        result: AppResult<EntryRecord>,
    },
    Deleted {
        epoch: u64,
        result: AppResult<bool>,
    },
}

/// Coordinates one editing session against an [`EntryStore`].
///
/// Every intent method runs on the presentation thread and returns quickly.
/// Intents that are refused before any I/O return `AppError::Validation`;
/// outcomes of storage calls arrive later as [`SessionEvent`]s.
///
/// Concurrency rules:
/// - At most one save runs at a time. Autosave ticks during a save are
///   dropped; an explicit save is queued and replaces any earlier queued one.
/// - Delete is refused while a save runs, and saves are refused while a delete
///   runs.
/// - Each completion is tagged with the session it was issued from. Results for
///   a session the user already left refresh the list but never replace the
///   current entry.
/// - List results older than the last one shown are discarded.
pub struct SessionController<P: Presenter> {
    store: EntryStore,
    runtime: Handle,
    presenter: P,
    completions_tx: UnboundedSender<Completion>,
    completions_rx: UnboundedReceiver<Completion>,
    autosave_interval: Duration,

    mode: Mode,
    current: Option<EntryRecord>,
    baseline: Baseline,
    epoch: u64,

    save_in_flight: bool,
    queued_save: Option<Draft>,
    delete_in_flight: bool,
    in_flight: usize,

    query: String,
    lists_issued: u64,
    lists_shown: u64,
}

impl<P: Presenter> SessionController<P> {
    /// Creates a controller in [`Mode::New`]. No I/O happens until an intent
    /// or [`SessionController::start`] is called.
    pub fn new(store: EntryStore, runtime: Handle, presenter: P) -> Self {
        let (completions_tx, completions_rx) = unbounded_channel();
        SessionController {
            store,
            runtime,
            presenter,
            completions_tx,
            completions_rx,
            autosave_interval: Duration::from_secs(DEFAULT_AUTOSAVE_SECS),
            mode: Mode::New,
            current: None,
            baseline: Baseline::default(),
            epoch: 0,
            save_in_flight: false,
            queued_save: None,
            delete_in_flight: false,
            in_flight: 0,
            query: String::new(),
            lists_issued: 0,
            lists_shown: 0,
        }
    }

    /// Sets how often the presentation layer should call
    /// [`SessionController::tick`].
    pub fn with_autosave_interval(mut self, interval: Duration) -> Self {
        self.autosave_interval = interval;
        self
    }

    /// Prepares the storage directory, begins a new entry and loads the list.
    ///
    /// A directory that cannot be created is reported as a non-blocking error;
    /// the session stays usable.
    pub fn start(&mut self) {
        if let Err(e) = self.store.initialize() {
            warn!("Could not prepare entries directory: {}", e);
            self.presenter.present(SessionEvent::ErrorRaised {
                message: e.to_string(),
                blocking: false,
            });
        }
        self.refresh_list();
        self.start_new();
    }

    /// Current mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The entry being shown or edited, if any.
    pub fn current(&self) -> Option<&EntryRecord> {
        self.current.as_ref()
    }

    /// The active list filter; empty means no filter.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Period between autosave ticks.
    pub fn autosave_interval(&self) -> Duration {
        self.autosave_interval
    }

    /// Whether `title`/`content` differ from what was last saved.
    pub fn has_unsaved_changes(&self, title: &str, content: &str) -> bool {
        !self.baseline.matches(title, content)
    }

    /// Whether any storage call has not been dispatched yet.
    pub fn is_busy(&self) -> bool {
        self.in_flight > 0
    }

    /// Whether the delete action should be enabled.
    pub fn can_delete(&self) -> bool {
        self.current.is_some() && !self.save_in_flight && !self.delete_in_flight
    }

    /// The presenter receiving events.
    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    /// Mutable access to the presenter.
    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    /// Begins a fresh, unsaved entry.
    pub fn start_new(&mut self) {
        self.leave_session();
        self.current = None;
        self.baseline = Baseline::default();
        self.set_mode(Mode::New);
        self.status(STATUS_NEW_ENTRY.to_string());
    }

    /// Shows `record` read-only.
    pub fn select(&mut self, record: EntryRecord) {
        self.leave_session();
        self.baseline = Baseline::of(&record);
        let status = format!("Reading: {}", record.title);
        self.current = Some(record);
        self.set_mode(Mode::Reading);
        self.status(status);
    }

    /// Switches the shown entry to editing.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if no entry is selected.
    pub fn begin_edit(&mut self) -> AppResult<()> {
        let title = match self.current.as_ref().map(|record| record.title.clone()) {
            Some(title) => title,
            None => return Err(self.reject(true, "No entry selected.")),
        };
        if self.mode != Mode::Editing {
            self.set_mode(Mode::Editing);
            self.status(format!("Editing: {}", title));
        }
        Ok(())
    }

    /// Saves `title`/`content` as the current entry.
    ///
    /// Without a current entry a new one is created with a fresh timestamp;
    /// otherwise the current entry is replaced, keeping its timestamp. When a
    /// save is already running an explicit save is queued and an autosave is
    /// dropped; both return `Ok`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation`, without touching storage, if the entry
    /// is read-only, a delete is running, or the title is empty or spans
    /// several lines. Explicit rejections are also raised as blocking errors.
    pub fn save(&mut self, title: &str, content: &str, explicit: bool) -> AppResult<()> {
        if self.mode == Mode::Reading {
            return Err(self.reject(explicit, "Entry is read-only. Choose Edit first."));
        }
        if title.is_empty() {
            return Err(self.reject(explicit, "Title cannot be empty."));
        }
        if title.contains(['\n', '\r']) {
            return Err(self.reject(explicit, "Title must fit on a single line."));
        }
        if self.delete_in_flight {
            self.status(STATUS_DELETE_IN_PROGRESS.to_string());
            return Err(self.reject(explicit, "The entry is being deleted."));
        }

        if self.save_in_flight {
            if explicit {
                debug!("Queueing explicit save behind the running one");
                self.queued_save = Some(Draft {
                    title: title.to_string(),
                    content: content.to_string(),
                });
                self.status(STATUS_SAVE_IN_PROGRESS.to_string());
            } else {
                debug!("Dropping autosave, a save is already running");
            }
            return Ok(());
        }

        self.launch_save(title.to_string(), content.to_string(), explicit);
        Ok(())
    }

    /// Deletes the current entry, then begins a new one.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if nothing is selected or a save or
    /// delete is still running.
    pub fn delete_current(&mut self) -> AppResult<()> {
        let record = match self.current.clone() {
            Some(record) => record,
            None => return Err(self.reject(true, "No entry selected.")),
        };
        if self.save_in_flight {
            self.status(STATUS_SAVE_IN_PROGRESS.to_string());
            return Err(AppError::Validation(
                "Cannot delete while the entry is being saved.".to_string(),
            ));
        }
        if self.delete_in_flight {
            return Err(AppError::Validation(
                "The entry is already being deleted.".to_string(),
            ));
        }

        self.delete_in_flight = true;
        self.queued_save = None;
        let epoch = self.epoch;
        info!("Deleting entry '{}'", record.title);
        self.spawn(
            move |store| store.delete(&record),
            move |result| Completion::Deleted { epoch, result },
        );
        Ok(())
    }

    /// Autosave check, called periodically with the live editor text.
    ///
    /// Only acts in [`Mode::Editing`] when the text differs from the last save,
    /// the title is not empty, and no other save or delete is running. Returns
    /// whether a save was launched.
    pub fn tick(&mut self, title: &str, content: &str) -> bool {
        if self.mode != Mode::Editing {
            return false;
        }
        if self.save_in_flight || self.delete_in_flight {
            debug!("Skipping autosave tick, storage busy");
            return false;
        }
        if self.baseline.matches(title, content) || title.is_empty() {
            return false;
        }
        self.save(title, content, false).is_ok()
    }

    /// Reloads the list using the active filter.
    pub fn refresh_list(&mut self) {
        self.lists_issued += 1;
        let generation = self.lists_issued;
        let query = self.query.clone();
        self.spawn(
            move |store| {
                if query.is_empty() {
                    store.list_all()
                } else {
                    store.search(&query)
                }
            },
            move |result| Completion::Listed { generation, result },
        );
    }

    /// Sets the list filter and reloads. An empty query lists everything.
    pub fn filter(&mut self, query: &str) {
        self.query = query.to_string();
        self.refresh_list();
    }

    /// Applies every completion that has already arrived. Returns how many.
    pub fn dispatch_pending(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.completions_rx.try_recv() {
            self.apply(completion);
            applied += 1;
        }
        applied
    }

    /// Waits for the next completion and applies it. Returns `false` straight
    /// away when nothing is outstanding.
    pub async fn dispatch_next(&mut self) -> bool {
        if self.in_flight == 0 {
            return false;
        }
        match self.completions_rx.recv().await {
            Some(completion) => {
                self.apply(completion);
                true
            }
            None => false,
        }
    }

    /// Applies completions until no storage call is outstanding, including
    /// the refreshes that completions trigger.
    pub async fn settle(&mut self) {
        while self.dispatch_next().await {}
    }

    fn launch_save(&mut self, title: String, content: String, explicit: bool) {
        let original = self.current.clone();
        let mut target = match &original {
            Some(current) => current.replacement(title, content),
            None => EntryRecord::new(title, content),
        };

        self.save_in_flight = true;
        if !explicit {
            self.status(STATUS_AUTOSAVING.to_string());
        }
        let epoch = self.epoch;
        self.spawn(
            move |store| {
                match &original {
                    Some(original) => store.update(original, &mut target)?,
                    None => store.save(&mut target)?,
                };
                Ok(target)
            },
            move |result| Completion::Saved {
                epoch,
                explicit,
                result,
            },
        );
    }

    fn spawn<T, J, W>(&mut self, job: J, wrap: W)
    where
        T: Send + 'static,
        J: FnOnce(&EntryStore) -> AppResult<T> + Send + 'static,
        W: FnOnce(AppResult<T>) -> Completion + Send + 'static,
    {
        self.in_flight += 1;
        if self.in_flight == 1 {
            self.presenter.present(SessionEvent::BusyChanged(true));
        }

        let store = self.store.clone();
        let completions = self.completions_tx.clone();
        let task = self.runtime.spawn_blocking(move || job(&store));
        self.runtime.spawn(async move {
            let result = task
                .await
                .unwrap_or_else(|e| Err(AppError::Task(e.to_string())));
            // A closed channel means the controller is gone.
            let _ = completions.send(wrap(result));
        });
    }

    fn apply(&mut self, completion: Completion) {
        match completion {
            Completion::Listed { generation, result } => self.apply_listed(generation, result),
            Completion::Saved {
                epoch,
                explicit,
                result,
            } => self.apply_saved(epoch, explicit, result),
            Completion::Deleted { epoch, result } => self.apply_deleted(epoch, result),
        }

        self.in_flight -= 1;
        if self.in_flight == 0 {
            self.presenter.present(SessionEvent::BusyChanged(false));
        }
    }

    fn apply_listed(&mut self, generation: u64, result: AppResult<Vec<EntryRecord>>) {
        if generation <= self.lists_shown {
            debug!("Discarding stale list result {}", generation);
            return;
        }
        self.lists_shown = generation;

        match result {
            Ok(entries) => {
                debug!("List refreshed with {} entries", entries.len());
                self.presenter
                    .present(SessionEvent::ListUpdated(Arc::from(entries)));
            }
            Err(e) => {
                warn!("Failed to load entries: {}", e);
                self.presenter.present(SessionEvent::ErrorRaised {
                    message: format!("Failed to load entries: {}", e),
                    blocking: false,
                });
            }
        }
    }

    fn apply_saved(&mut self, epoch: u64, explicit: bool, result: AppResult<EntryRecord>) {
        self.save_in_flight = false;

        match result {
            Ok(record) => {
                info!("Saved entry '{}'", record.title);
                let status = if explicit {
                    format!("Saved: {}", record.title)
                } else {
                    format!("Auto-saved: {}", record.title)
                };

                if epoch == self.epoch {
                    self.baseline = Baseline::of(&record);
                    self.current = Some(record);
                    if self.mode != Mode::Editing {
                        self.set_mode(Mode::Editing);
                    }
                } else {
                    debug!("Save finished after its session ended");
                }
                self.status(status);
            }
            Err(e) => {
                if explicit {
                    warn!("Save failed: {}", e);
                    self.presenter.present(SessionEvent::ErrorRaised {
                        message: format!("Failed to save entry: {}", e),
                        blocking: true,
                    });
                } else {
                    warn!("Autosave failed, will retry on the next tick: {}", e);
                    self.status(format!("Auto-save failed: {}", e));
                }
            }
        }
        self.refresh_list();

        if let Some(draft) = self.queued_save.take() {
            if let Err(e) = self.save(&draft.title, &draft.content, true) {
                debug!("Queued save no longer applies: {}", e);
            }
        }
    }

    fn apply_deleted(&mut self, epoch: u64, result: AppResult<bool>) {
        self.delete_in_flight = false;

        match result {
            Ok(found) => {
                if !found {
                    debug!("Deleted entry had no backing file");
                }
                if epoch == self.epoch {
                    self.start_new();
                }
                self.status(STATUS_ENTRY_DELETED.to_string());
                self.refresh_list();
            }
            Err(e) => {
                warn!("Delete failed: {}", e);
                self.presenter.present(SessionEvent::ErrorRaised {
                    message: format!("Failed to delete entry: {}", e),
                    blocking: true,
                });
            }
        }
    }

    /// Ends the current session so late completions cannot claim it.
    fn leave_session(&mut self) {
        self.epoch += 1;
        self.queued_save = None;
    }

    fn set_mode(&mut self, mode: Mode) {
        if self.mode != mode {
            debug!("Session mode {} -> {}", self.mode, mode);
        }
        self.mode = mode;
        self.presenter.present(SessionEvent::ModeChanged(mode));
    }

    fn status(&mut self, text: String) {
        self.presenter.present(SessionEvent::StatusChanged(text));
    }

    fn reject(&mut self, explicit: bool, message: &str) -> AppError {
        if explicit {
            self.presenter.present(SessionEvent::ErrorRaised {
                message: message.to_string(),
                blocking: true,
            });
        } else {
            debug!("Autosave rejected: {}", message);
        }
        AppError::Validation(message.to_string())
    }
}
