use tabshell::managers::download_ledger::DownloadLedger;
use tabshell::managers::history_ledger::HistoryLedger;
use tabshell::managers::permission_ledger::PermissionLedger;
use tabshell::types::{DownloadProgress, DownloadTask, HistoryEntry};

// ─── History ───

#[test]
fn test_history_prepends_newest_first() {
    let mut ledger = HistoryLedger::new();
    ledger.record("A", "https://a.example/", None);
    ledger.record("B", "https://b.example/", None);
    assert_eq!(ledger.entries()[0].url, "https://b.example/");
    assert_eq!(ledger.entries()[1].url, "https://a.example/");
}

#[test]
fn test_history_collapses_back_to_back_duplicates() {
    let mut ledger = HistoryLedger::new();
    ledger.record("A", "https://a.example/", None);
    ledger.record("A again", "https://a.example/", None);
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger.entries()[0].title, "A");
}

#[test]
fn test_history_same_url_after_other_visit_records_again() {
    let mut ledger = HistoryLedger::new();
    ledger.record("A", "https://a.example/", None);
    ledger.record("B", "https://b.example/", None);
    ledger.record("A", "https://a.example/", None);
    assert_eq!(ledger.len(), 3);
}

#[test]
fn test_history_entries_carry_date_label_and_time() {
    let mut ledger = HistoryLedger::new();
    ledger.record("A", "https://a.example/", None);
    let entry = &ledger.entries()[0];
    // %Y-%m-%d and %H:%M:%S shapes.
    assert_eq!(entry.label.len(), 10);
    assert_eq!(entry.time.len(), 8);
}

#[test]
fn test_refresh_favicon_touches_only_recent_window() {
    let mut ledger = HistoryLedger::new();
    for i in 0..12 {
        ledger.record("old", &format!("https://old{}.example/", i), None);
    }
    ledger.record("target", "https://t.example/", None);
    // The same URL also sits outside the 10-entry window.
    let mut stale = vec![HistoryEntry {
        title: "target-old".to_string(),
        url: "https://t.example/".to_string(),
        favicon: None,
        label: "2026-01-01".to_string(),
        time: "00:00:00".to_string(),
    }];
    let mut entries: Vec<HistoryEntry> = ledger.entries().to_vec();
    entries.append(&mut stale);
    ledger.replace(entries);

    ledger.refresh_favicon("https://t.example/", Some("icon.png".to_string()));
    assert_eq!(ledger.entries()[0].favicon.as_deref(), Some("icon.png"));
    assert!(ledger.entries().last().unwrap().favicon.is_none());
}

#[test]
fn test_history_replace_swaps_log() {
    let mut ledger = HistoryLedger::new();
    ledger.record("A", "https://a.example/", None);
    ledger.replace(Vec::new());
    assert!(ledger.is_empty());
}

// ─── Downloads ───

fn progress(start_time: i64, save_path: Option<&str>) -> DownloadProgress {
    DownloadProgress {
        start_time,
        received_bytes: 512,
        save_path: save_path.map(str::to_string),
        is_paused: false,
        can_resume: true,
        data_state: "progressing".to_string(),
    }
}

#[test]
fn test_download_create_inserts_at_front() {
    let mut ledger = DownloadLedger::new();
    ledger.create(DownloadTask::new(100, "a.zip"));
    ledger.create(DownloadTask::new(200, "b.zip"));
    assert_eq!(ledger.tasks()[0].start_time, 200);
}

#[test]
fn test_download_progress_updates_matching_task() {
    let mut ledger = DownloadLedger::new();
    ledger.create(DownloadTask::new(100, "a.zip"));
    ledger.update_progress(progress(100, Some("/tmp/a.zip")));
    let task = ledger.get(100).unwrap();
    assert_eq!(task.received_bytes, 512);
    assert_eq!(task.save_path.as_deref(), Some("/tmp/a.zip"));
    assert!(task.can_resume);
}

#[test]
fn test_download_progress_for_unknown_task_is_dropped() {
    let mut ledger = DownloadLedger::new();
    ledger.create(DownloadTask::new(100, "a.zip"));
    ledger.update_progress(progress(999, None));
    assert_eq!(ledger.get(100).unwrap().received_bytes, 0);
}

#[test]
fn test_download_complete_with_save_path_updates_in_place() {
    let mut ledger = DownloadLedger::new();
    ledger.create(DownloadTask::new(100, "a.zip.part"));
    ledger.update_progress(progress(100, Some("/tmp/a.zip")));
    ledger.complete(100, "a.zip", "completed");
    let task = ledger.get(100).unwrap();
    assert_eq!(task.name, "a.zip");
    assert_eq!(task.data_state, "completed");
}

#[test]
fn test_download_complete_without_save_path_removes_task() {
    let mut ledger = DownloadLedger::new();
    ledger.create(DownloadTask::new(100, "a.zip"));
    ledger.complete(100, "a.zip", "cancelled");
    assert!(ledger.get(100).is_none());
    assert!(ledger.tasks().is_empty());
}

#[test]
fn test_download_hide_all_marks_every_task() {
    let mut ledger = DownloadLedger::new();
    ledger.create(DownloadTask::new(100, "a.zip"));
    ledger.create(DownloadTask::new(200, "b.zip"));
    ledger.hide_all();
    assert!(ledger.tasks().iter().all(|t| t.style == "hidden"));
}

// ─── Permissions ───

#[test]
fn test_permission_set_and_get() {
    let mut ledger = PermissionLedger::new();
    assert!(ledger.get("a.example", "notifications").is_none());
    ledger.set("a.example", "notifications", true);
    assert_eq!(ledger.get("a.example", "notifications"), Some(true));
    ledger.set("a.example", "notifications", false);
    assert_eq!(ledger.get("a.example", "notifications"), Some(false));
}

#[test]
fn test_permission_hosts_are_independent() {
    let mut ledger = PermissionLedger::new();
    ledger.set("a.example", "geolocation", true);
    assert!(ledger.get("b.example", "geolocation").is_none());
    assert_eq!(ledger.site("a.example").map(|m| m.len()), Some(1));
    assert!(ledger.site("b.example").is_none());
}
