use chrono::{Duration, NaiveDate, NaiveDateTime};
use daybook::entry::EntryRecord;
use daybook::errors::AppResult;
use daybook::session::{Mode, SessionController, SessionEvent};
use daybook::store::EntryStore;
use std::fs;
use tempfile::tempdir;

// Fixed reference moment for deterministic file names: 2024-01-15 14:30:00
fn t0() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 15)
        .unwrap()
        .and_hms_opt(14, 30, 0)
        .unwrap()
}

#[test]
fn test_round_trip_through_disk() -> AppResult<()> {
    let temp_dir = tempdir()?;
    let store = EntryStore::new(temp_dir.path());

    let samples = [
        ("Plain", "one line"),
        ("Blank lines", "para one\n\n\npara two"),
        ("Trailing newline", "ends here\n"),
        ("Empty", ""),
        ("Markup", "<p>Hello <b>world</b></p>"),
    ];
    for (offset, (title, content)) in samples.iter().enumerate() {
        let mut entry =
            EntryRecord::with_timestamp(*title, *content, t0() + Duration::minutes(offset as i64));
        store.save(&mut entry)?;
    }

    let loaded = store.list_all()?;
    assert_eq!(loaded.len(), samples.len());
    for (title, content) in samples {
        let entry = loaded
            .iter()
            .find(|e| e.title == title)
            .unwrap_or_else(|| panic!("{} missing", title));
        assert_eq!(entry.content, content);
    }
    Ok(())
}

#[test]
fn test_listing_order_is_non_increasing() -> AppResult<()> {
    let temp_dir = tempdir()?;
    let store = EntryStore::new(temp_dir.path());

    for hours in [5, 1, 9, 3, 7, 3] {
        let mut entry = EntryRecord::with_timestamp(
            format!("Entry {}", hours),
            "x",
            t0() + Duration::hours(hours),
        );
        store.save(&mut entry)?;
    }

    let listed = store.list_all()?;
    assert!(listed
        .windows(2)
        .all(|pair| pair[0].timestamp >= pair[1].timestamp));
    Ok(())
}

#[test]
fn test_corrupt_files_are_invisible() -> AppResult<()> {
    let temp_dir = tempdir()?;
    let store = EntryStore::new(temp_dir.path());

    let valid = 4;
    for i in 0..valid {
        let mut entry = EntryRecord::with_timestamp("Valid", "ok", t0() + Duration::days(i));
        store.save(&mut entry)?;
    }
    for (i, text) in ["", "one line", "two\nlines"].iter().enumerate() {
        fs::write(temp_dir.path().join(format!("short_{}.txt", i)), text)?;
    }

    assert_eq!(store.list_all()?.len(), valid as usize);
    assert_eq!(store.search("ok")?.len(), valid as usize);
    Ok(())
}

#[test]
fn test_update_keeps_single_file_with_original_timestamp() -> AppResult<()> {
    let temp_dir = tempdir()?;
    let store = EntryStore::new(temp_dir.path());

    let mut original = EntryRecord::with_timestamp("Morning", "coffee", t0());
    store.save(&mut original)?;
    let mut updated = original.replacement("Morning pages", "coffee and writing");
    store.update(&original, &mut updated)?;

    let listed = store.list_all()?;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].title, "Morning pages");
    assert_eq!(listed[0].content, "coffee and writing");
    assert_eq!(listed[0].timestamp, t0());
    Ok(())
}

#[test]
fn test_trip_scenario() -> AppResult<()> {
    let temp_dir = tempdir()?;
    let store = EntryStore::new(temp_dir.path());
    let path = temp_dir.path().join("20240115_143000_Trip.txt");

    let mut trip = EntryRecord::with_timestamp("Trip", "Day 1", t0());
    store.save(&mut trip)?;
    assert!(path.exists());
    let decoded = EntryRecord::decode(&fs::read_to_string(&path)?).unwrap();
    assert_eq!(
        (decoded.title.as_str(), decoded.content.as_str(), decoded.timestamp),
        ("Trip", "Day 1", t0())
    );

    let mut edited = trip.replacement("Trip", "Day 1 edited");
    store.update(&trip, &mut edited)?;
    assert!(path.exists());
    assert_eq!(fs::read_dir(temp_dir.path())?.count(), 1);
    assert_eq!(
        EntryRecord::decode(&fs::read_to_string(&path)?).unwrap().content,
        "Day 1 edited"
    );

    store.delete(&edited)?;
    assert_eq!(fs::read_dir(temp_dir.path())?.count(), 0);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_session_trip_scenario() -> AppResult<()> {
    let temp_dir = tempdir()?;
    let mut session = SessionController::new(
        EntryStore::new(temp_dir.path()),
        tokio::runtime::Handle::current(),
        Vec::<SessionEvent>::new(),
    );
    session.start();
    session.settle().await;

    session.save("Trip", "Day 1", true)?;
    session.settle().await;
    assert!(session.tick("Trip", "Day 1 edited"));
    session.settle().await;
    assert_eq!(fs::read_dir(temp_dir.path())?.count(), 1);

    session.delete_current()?;
    session.settle().await;
    assert_eq!(session.mode(), Mode::New);
    assert_eq!(fs::read_dir(temp_dir.path())?.count(), 0);

    let lists: Vec<usize> = session
        .presenter()
        .iter()
        .filter_map(|event| match event {
            SessionEvent::ListUpdated(entries) => Some(entries.len()),
            _ => None,
        })
        .collect();
    assert_eq!(lists.first(), Some(&0));
    assert_eq!(lists.last(), Some(&0));
    assert!(lists.contains(&1));
    Ok(())
}
