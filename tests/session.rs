use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use fileplot::{PlotSession, Rgb, SettingsStore, TimeAxisKind, PALETTE};

const CSV: &str = "date,alpha,beta\n\
                   2024-01-01 00:00:00,1.0,100.0\n\
                   2024-01-01 00:00:01,2.0,200.0\n\
                   2024-01-01 00:00:02,3.0,300.0\n";

fn write_csv(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn session_in(dir: &Path) -> PlotSession {
    PlotSession::new(SettingsStore::open(dir.join("settings.json")))
}

#[test]
fn load_registers_hidden_layers_with_palette_colors() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(dir.path(), "data.csv", CSV);
    let mut session = session_in(dir.path());

    session.load(&csv).unwrap();
    let ds = session.dataset().unwrap();
    assert_eq!(ds.row_count(), 3);
    assert_eq!(ds.time_axis().kind(), TimeAxisKind::Timestamps);
    assert_eq!(session.file_path(), Some(csv.as_path()));

    let layers = session.layers();
    assert_eq!(layers.len(), 2);
    assert!(layers.iter().all(|l| !l.visible()));
    assert_eq!(layers.get("alpha").unwrap().color, PALETTE[0]);
    assert_eq!(layers.get("beta").unwrap().color, PALETTE[1]);
    assert_eq!(session.smoothing_window(), 1);
}

#[test]
fn failed_load_keeps_the_previous_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(dir.path(), "data.csv", CSV);
    let mut session = session_in(dir.path());
    session.load(&csv).unwrap();

    assert!(session.load(&dir.path().join("missing.csv")).is_err());
    assert!(session.dataset().is_some());
    assert_eq!(session.layers().len(), 2);
    assert_eq!(session.file_path(), Some(csv.as_path()));
}

#[test]
fn y_range_includes_hidden_series() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(dir.path(), "data.csv", CSV);
    let mut session = session_in(dir.path());
    session.load(&csv).unwrap();

    // Nothing visible, but the range still spans alpha and beta.
    let (lo, hi) = session.y_range().unwrap();
    assert!((lo - -13.95).abs() < 1e-9);
    assert!((hi - 314.95).abs() < 1e-9);
}

#[test]
fn hit_testing_only_considers_visible_series() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(dir.path(), "data.csv", CSV);
    let mut session = session_in(dir.path());
    session.load(&csv).unwrap();
    let now = Instant::now();

    let t0 = session.dataset().unwrap().time_axis().values()[1];
    // alpha is hidden, so a cursor right on its values hits nothing.
    assert_eq!(session.nearest_series(t0, 2.0, 1000.0), None);

    session.set_visible("alpha", true, now);
    assert_eq!(
        session.nearest_series(t0, 2.0, 1000.0),
        Some("alpha".to_string())
    );
}

#[test]
fn smoothing_window_is_clamped_and_memoized() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(dir.path(), "data.csv", CSV);
    let mut session = session_in(dir.path());
    session.load(&csv).unwrap();
    let now = Instant::now();

    // Window 1 is the identity and never counts as a computation.
    let raw = session.get_smoothed("alpha").unwrap();
    assert_eq!(raw.as_slice(), &[1.0, 2.0, 3.0]);
    assert_eq!(session.smoothing_computations(), 0);

    session.set_smoothing_window(3, now);
    session.get_smoothed("alpha").unwrap();
    session.get_smoothed("alpha").unwrap();
    assert_eq!(session.smoothing_computations(), 1);

    session.set_smoothing_window(100_000, now);
    assert_eq!(session.smoothing_window(), 500);
    session.set_smoothing_window(0, now);
    assert_eq!(session.smoothing_window(), 1);
}

#[test]
fn changes_are_saved_after_the_quiet_interval() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(dir.path(), "data.csv", CSV);
    let mut session = session_in(dir.path());
    session.load(&csv).unwrap();
    let key = session.settings().file_key(&csv);

    let t0 = Instant::now();
    session.set_visible("alpha", true, t0);
    assert!(session.settings().get(&key).is_none());

    // Not yet: the quiet interval has not elapsed.
    session.tick(t0 + Duration::from_millis(499));
    assert!(session.settings().get(&key).is_none());

    session.tick(t0 + Duration::from_millis(500));
    let saved = session.settings().get(&key).unwrap();
    assert!(saved.layers["alpha"].visible);
    assert!(!saved.layers["beta"].visible);
}

#[test]
fn rapid_changes_coalesce_into_the_last_state() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(dir.path(), "data.csv", CSV);
    let mut session = session_in(dir.path());
    session.load(&csv).unwrap();
    let key = session.settings().file_key(&csv);

    let t0 = Instant::now();
    session.set_color("alpha", Rgb::new(1, 1, 1), t0);
    session.set_color("alpha", Rgb::new(2, 2, 2), t0 + Duration::from_millis(100));

    // The first change's deadline has passed, but the second restarted the
    // countdown; only the final color may ever reach disk.
    session.tick(t0 + Duration::from_millis(550));
    assert!(session.settings().get(&key).is_none());

    session.tick(t0 + Duration::from_millis(600));
    let saved = session.settings().get(&key).unwrap();
    assert_eq!(saved.layers["alpha"].color, Rgb::new(2, 2, 2));
}

#[test]
fn switching_files_flushes_the_pending_save() {
    let dir = tempfile::tempdir().unwrap();
    let first = write_csv(dir.path(), "first.csv", CSV);
    let second = write_csv(dir.path(), "second.csv", "a,b\n1,2\n3,4\n");
    let mut session = session_in(dir.path());
    session.load(&first).unwrap();
    let key = session.settings().file_key(&first);

    session.set_visible("alpha", true, Instant::now());
    assert!(session.settings().get(&key).is_none());

    // Loading another file must not lose the pending change.
    session.load(&second).unwrap();
    assert!(session.settings().get(&key).unwrap().layers["alpha"].visible);
}

#[test]
fn saved_settings_are_restored_on_reload() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(dir.path(), "data.csv", CSV);
    let settings_path = dir.path().join("settings.json");

    {
        let mut session = PlotSession::new(SettingsStore::open(&settings_path));
        session.load(&csv).unwrap();
        let now = Instant::now();
        session.set_visible("alpha", true, now);
        session.set_color("alpha", Rgb::new(0xaa, 0xbb, 0xcc), now);
        session.set_width("alpha", 4, now);
        session.set_smoothing_window(25, now);
        session.flush_pending_save();
    }

    let mut session = PlotSession::new(SettingsStore::open(&settings_path));
    session.load(&csv).unwrap();
    let alpha = session.layers().get("alpha").unwrap();
    assert!(alpha.visible());
    assert_eq!(alpha.color, Rgb::new(0xaa, 0xbb, 0xcc));
    assert_eq!(alpha.width, 4);
    // beta was never customized and keeps its defaults.
    assert!(!session.layers().get("beta").unwrap().visible());
    assert_eq!(session.smoothing_window(), 25);
}

#[test]
fn toggle_all_persists_every_layer() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(dir.path(), "data.csv", CSV);
    let mut session = session_in(dir.path());
    session.load(&csv).unwrap();
    let key = session.settings().file_key(&csv);

    assert!(session.toggle_all(true, Instant::now()).is_some());
    session.flush_pending_save();
    let saved = session.settings().get(&key).unwrap();
    assert!(saved.layers.values().all(|l| l.visible));
}

#[test]
fn reset_settings_forgets_the_current_file() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(dir.path(), "data.csv", CSV);
    let mut session = session_in(dir.path());
    session.load(&csv).unwrap();
    let key = session.settings().file_key(&csv);

    session.set_visible("alpha", true, Instant::now());
    session.flush_pending_save();
    assert!(session.settings().contains(&key));

    session.reset_settings().unwrap();
    assert!(!session.settings().contains(&key));
}

#[test]
fn reset_settings_cancels_an_unsaved_change() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(dir.path(), "data.csv", CSV);
    let mut session = session_in(dir.path());
    session.load(&csv).unwrap();
    let key = session.settings().file_key(&csv);

    let t0 = Instant::now();
    session.set_visible("alpha", true, t0);
    session.reset_settings().unwrap();

    // The pending write was cancelled; nothing reaches the store later.
    session.tick(t0 + Duration::from_secs(10));
    assert!(!session.settings().contains(&key));
}

#[test]
fn clear_flushes_and_drops_everything() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(dir.path(), "data.csv", CSV);
    let mut session = session_in(dir.path());
    session.load(&csv).unwrap();
    let key = session.settings().file_key(&csv);

    session.set_visible("alpha", true, Instant::now());
    session.clear();

    assert!(session.dataset().is_none());
    assert!(session.file_path().is_none());
    assert!(session.layers().is_empty());
    assert!(session.settings().get(&key).unwrap().layers["alpha"].visible);
}

#[test]
fn day_boundaries_are_empty_for_index_axes() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(dir.path(), "plain.csv", "a,b\n1,2\n3,4\n5,6\n");
    let mut session = session_in(dir.path());
    session.load(&csv).unwrap();

    assert_eq!(
        session.dataset().unwrap().time_axis().kind(),
        TimeAxisKind::Index
    );
    assert!(session.day_boundaries().is_empty());
}

#[test]
fn statistics_pass_through_to_the_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(dir.path(), "data.csv", CSV);
    let mut session = session_in(dir.path());
    assert!(session.statistics("alpha").is_none());

    session.load(&csv).unwrap();
    let stats = session.statistics("alpha").unwrap();
    assert_eq!(stats.min, 1.0);
    assert_eq!(stats.max, 3.0);
    assert_eq!(stats.mean, 2.0);
}
