/*!
# Daybook

Daybook is a personal diary that keeps every entry as a plain text file in a
single directory. This library holds the entry persistence engine and the
editing-session state machine that a front-end drives.

## Core Features

- Store, replace, delete, list and search entries as individual files
- Skip malformed files instead of failing the whole listing
- Edit sessions that move between new, reading and editing modes
- Autosave that never starts two saves for the same entry
- Background storage calls whose results are applied on the caller's thread

## Architecture

- `entry`: The entry value type and its three-part file encoding
- `store`: Flat-file persistence, enumeration and search
- `session`: The editing-session state machine and its event stream
- `config`: Configuration loading and validation
- `cli`: Command-line interface handling using clap
- `errors`: Error handling infrastructure

## Usage Example

```rust,no_run
use daybook::session::{SessionController, SessionEvent};
use daybook::store::EntryStore;
use daybook::Config;

fn main() -> daybook::AppResult<()> {
    let config = Config::load()?;
    config.validate()?;

    let runtime = tokio::runtime::Runtime::new()?;
    let mut session = SessionController::new(
        EntryStore::new(&config.entries_dir),
        runtime.handle().clone(),
        Vec::<SessionEvent>::new(),
    );

    session.start();
    session.save("Trip", "Day 1", true)?;
    runtime.block_on(session.settle());
    Ok(())
}
```
*/

/// Command-line interface for parsing and handling user arguments
pub mod cli;
/// Configuration loading and management
pub mod config;
/// Application-wide constants
pub mod constants;
/// Diary entry value type and file encoding
pub mod entry;
/// Error types and utilities for error handling
pub mod errors;
/// Editing-session state machine
pub mod session;
/// Flat-file entry storage
pub mod store;

// Re-export important types for convenience
pub use cli::CliArgs;
pub use config::Config;
pub use entry::EntryRecord;
pub use errors::{AppError, AppResult};
pub use session::{Mode, SessionController, SessionEvent};
pub use store::EntryStore;
