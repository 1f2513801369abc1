/*!
# Daybook - A Plain-Text Diary

Daybook keeps diary entries as individual text files in one directory. This
binary is a small terminal front-end over the editing session: every command
goes through the same session controller a graphical front-end would use.

## Usage

```
daybook [OPTIONS] <COMMAND>

Commands:
  list    List all entries, most recent first
  search  List entries whose title or content contains QUERY
  show    Print the entry at position N of the list
  add     Create an entry; content is read from stdin unless --content is given
  edit    Change the title and/or content of the entry at position N
  delete  Delete the entry at position N
  write   Compose a new entry line by line from stdin, autosaving as you go

Options:
  -v, --verbose                 Print verbose output
      --log-format <FORMAT>     Log output format [text, json]
      --dir <DIR>               Entries directory, overriding DAYBOOK_DIR
```

## Configuration

- `DAYBOOK_DIR`: The directory to store entries (defaults to "~/Documents/daybook")
- `DAYBOOK_AUTOSAVE_SECS`: Seconds between autosave checks in `write` (defaults to 30)
*/

use daybook::cli::{CliArgs, Command};
use daybook::config::Config;
use daybook::constants::{
    DEFAULT_LOG_LEVEL, LOG_FORMAT_JSON, STATUS_AUTOSAVING, VERBOSE_LOG_LEVEL,
};
use daybook::entry::EntryRecord;
use daybook::errors::{AppError, AppResult};
use daybook::session::{Presenter, SessionController, SessionEvent};
use daybook::store::EntryStore;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::EnvFilter;

type Session = SessionController<TerminalPresenter>;

/// Collects session events for a single command run.
struct TerminalPresenter {
    entries: Arc<[EntryRecord]>,
    last_status: Option<String>,
    failed: bool,
}

impl TerminalPresenter {
    fn new() -> Self {
        TerminalPresenter {
            entries: Arc::from(Vec::new()),
            last_status: None,
            failed: false,
        }
    }
}

impl Presenter for TerminalPresenter {
    fn present(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::ListUpdated(entries) => self.entries = entries,
            SessionEvent::StatusChanged(text) => {
                debug!("Status: {}", text);
                if text == STATUS_AUTOSAVING {
                    eprintln!("{}", text);
                }
                self.last_status = Some(text);
            }
            SessionEvent::ErrorRaised { message, blocking } => {
                if blocking {
                    eprintln!("Error: {}", message);
                    self.failed = true;
                } else {
                    eprintln!("Warning: {}", message);
                }
            }
            SessionEvent::ModeChanged(mode) => debug!("Mode: {}", mode),
            SessionEvent::BusyChanged(busy) => debug!("Busy: {}", busy),
        }
    }
}

/// The main entry point for the daybook application.
///
/// Parses arguments, initializes logging, loads configuration, starts an
/// editing session over the entries directory and runs the requested command.
/// Failures reported by the session are printed when they happen; the process
/// exits with a failure status if any occurred.
fn main() -> ExitCode {
    let args = CliArgs::parse();
    init_tracing(args.verbose, &args.log_format);
    info!("Starting daybook");
    debug!("CLI arguments: {:?}", args);

    match try_main(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Runs the command; `Ok(false)` means the session reported a failure.
fn try_main(args: CliArgs) -> AppResult<bool> {
    let mut config = Config::load()?;
    if let Some(dir) = args.dir.as_deref() {
        config = config.with_entries_dir(dir)?;
    }
    config.validate()?;
    debug!("Configuration: {:?}", config);

    let runtime = tokio::runtime::Runtime::new()?;
    let mut session = SessionController::new(
        EntryStore::new(&config.entries_dir),
        runtime.handle().clone(),
        TerminalPresenter::new(),
    )
    .with_autosave_interval(config.autosave_interval);

    session.start();
    runtime.block_on(run(&mut session, args.command))?;
    Ok(!session.presenter().failed)
}

fn init_tracing(verbose: bool, log_format: &str) {
    let default_level = if verbose {
        VERBOSE_LOG_LEVEL
    } else {
        DEFAULT_LOG_LEVEL
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_timer(ChronoLocal::rfc_3339());

    if log_format == LOG_FORMAT_JSON {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(session: &mut Session, command: Command) -> AppResult<()> {
    // Initial list from start()
    session.settle().await;

    match command {
        Command::List => print_list(&session.presenter().entries),
        Command::Search { query } => {
            session.filter(&query);
            session.settle().await;
            print_list(&session.presenter().entries);
        }
        Command::Show { index } => {
            let entry = pick(session, index)?;
            session.select(entry.clone());
            print_entry(&entry);
        }
        Command::Add { title, content } => {
            let content = match content {
                Some(content) => content,
                None => read_stdin().await?,
            };
            session.start_new();
            if let Err(e) = session.save(&title, &content, true) {
                debug!("Save rejected: {}", e);
                return Ok(());
            }
            session.settle().await;
            print_last_status(session);
        }
        Command::Edit {
            index,
            title,
            content,
        } => {
            let entry = pick(session, index)?;
            let title = title.unwrap_or_else(|| entry.title.clone());
            let content = content.unwrap_or_else(|| entry.content.clone());

            session.select(entry);
            if session.begin_edit().is_err() {
                return Ok(());
            }
            if !session.has_unsaved_changes(&title, &content) {
                println!("Nothing to change.");
                return Ok(());
            }
            if let Err(e) = session.save(&title, &content, true) {
                debug!("Save rejected: {}", e);
                return Ok(());
            }
            session.settle().await;
            print_last_status(session);
        }
        Command::Delete { index } => {
            let entry = pick(session, index)?;
            session.select(entry);
            if let Err(e) = session.delete_current() {
                debug!("Delete rejected: {}", e);
                return Ok(());
            }
            session.settle().await;
            print_last_status(session);
        }
        Command::Write { title } => compose(session, title).await?,
    }

    Ok(())
}

/// Builds an entry from stdin lines, letting autosave persist progress.
async fn compose(session: &mut Session, title: String) -> AppResult<()> {
    session.start_new();
    if let Err(e) = session.save(&title, "", true) {
        debug!("Save rejected: {}", e);
        return Ok(());
    }
    session.settle().await;
    if session.presenter().failed {
        return Ok(());
    }
    eprintln!("Writing '{}'. Finish with Ctrl-D.", title);

    let mut content = String::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(session.autosave_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => {
                    if !content.is_empty() {
                        content.push('\n');
                    }
                    content.push_str(&line);
                }
                None => break,
            },
            _ = ticker.tick() => {
                session.tick(&title, &content);
            }
        }
        session.dispatch_pending();
    }

    session.settle().await;
    if session.has_unsaved_changes(&title, &content) {
        if let Err(e) = session.save(&title, &content, true) {
            debug!("Save rejected: {}", e);
            return Ok(());
        }
        session.settle().await;
    }
    print_last_status(session);
    Ok(())
}

fn pick(session: &Session, index: usize) -> AppResult<EntryRecord> {
    let entries = &session.presenter().entries;
    index
        .checked_sub(1)
        .and_then(|i| entries.get(i))
        .cloned()
        .ok_or_else(|| {
            AppError::Validation(format!(
                "No entry at position {}. There are {} entries.",
                index,
                entries.len()
            ))
        })
}

async fn read_stdin() -> AppResult<String> {
    let mut content = String::new();
    tokio::io::stdin().read_to_string(&mut content).await?;
    if content.ends_with('\n') {
        content.pop();
        if content.ends_with('\r') {
            content.pop();
        }
    }
    Ok(content)
}

fn print_list(entries: &[EntryRecord]) {
    if entries.is_empty() {
        println!("No entries.");
        return;
    }
    for (i, entry) in entries.iter().enumerate() {
        println!("{:>3}. {}", i + 1, entry);
    }
}

fn print_entry(entry: &EntryRecord) {
    println!("{}", entry.title);
    println!("{}", entry.timestamp.format("%Y-%m-%d %H:%M:%S"));
    println!();
    println!("{}", entry.content);
}

fn print_last_status(session: &Session) {
    let presenter = session.presenter();
    if presenter.failed {
        return;
    }
    if let Some(status) = &presenter.last_status {
        println!("{}", status);
    }
}
