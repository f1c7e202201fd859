use polars::prelude::*;
use proptest::prelude::*;
use xwalk_ingest::{
    FrameProvider, IngestError, ProviderError, SpillingProvider, TabularProvider,
    distinct_values, read_csv_frame,
};
use xwalk_model::RawValue;

fn sample_frame() -> DataFrame {
    DataFrame::new(vec![
        Series::new("id".into(), vec!["001", "002", "003"]).into(),
        Series::new("status".into(), vec![Some("open"), Some(" closed "), None]).into(),
        Series::new("amount".into(), vec![Some(1.5), None, Some(3.0)]).into(),
    ])
    .unwrap()
}

#[test]
fn csv_columns_stay_text() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("source.csv");
    std::fs::write(&path, "id,amount\n007,1.50\n010,\n").unwrap();
    let df = read_csv_frame(&path).unwrap();
    let provider = FrameProvider::new(df);
    assert_eq!(provider.row_count(), 2);
    assert_eq!(
        provider.read_column("id").unwrap(),
        vec![RawValue::from("007"), RawValue::from("010")]
    );
    assert_eq!(provider.read_column("amount").unwrap()[0], RawValue::from("1.50"));
}

#[test]
fn missing_csv_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let err = read_csv_frame(&dir.path().join("absent.csv")).unwrap_err();
    assert!(matches!(err, IngestError::FileNotFound { .. }));
}

#[test]
fn distinct_values_skip_missing_tokens() {
    let provider = FrameProvider::new(sample_frame());
    let values = distinct_values(&provider, "status", &[String::new()], None).unwrap();
    assert_eq!(
        values.into_iter().collect::<Vec<_>>(),
        vec!["closed".to_string(), "open".to_string()]
    );
}

#[test]
fn spilled_reads_match_in_memory_reads() {
    let frame = sample_frame();
    let direct = FrameProvider::new(frame.clone());
    let spilling = SpillingProvider::new(FrameProvider::new(frame), 1);
    for name in ["id", "status", "amount", "id", "amount"] {
        assert_eq!(
            spilling.read_column(name).unwrap(),
            direct.read_column(name).unwrap()
        );
    }
    assert_eq!(spilling.spilled_columns(), vec!["amount", "id", "status"]);
    assert_eq!(spilling.resident_bytes(), 0);
}

#[test]
fn least_recently_used_column_is_evicted() {
    let frame = sample_frame();
    let one_column = std::mem::size_of::<RawValue>() * 3 + 32;
    let spilling = SpillingProvider::new(FrameProvider::new(frame), one_column);
    spilling.read_column("id").unwrap();
    assert!(spilling.spilled_columns().is_empty());
    spilling.read_column("amount").unwrap();
    assert_eq!(spilling.spilled_columns(), vec!["id"]);
}

#[test]
fn lost_spill_file_surfaces_storage_unavailable() {
    let spilling = SpillingProvider::new(FrameProvider::new(sample_frame()), 1);
    spilling.read_column("status").unwrap();
    let dir = spilling.spill_dir().unwrap();
    for entry in std::fs::read_dir(&dir).unwrap() {
        std::fs::remove_file(entry.unwrap().path()).unwrap();
    }
    let err = spilling.read_column("status").unwrap_err();
    assert!(matches!(
        err,
        ProviderError::StorageUnavailable { ref column, attempts: 3, .. } if column == "status"
    ));
}

#[test]
fn discard_spill_removes_directory() {
    let parent = tempfile::tempdir().unwrap();
    let spilling =
        SpillingProvider::new(FrameProvider::new(sample_frame()), 1)
            .with_spill_parent(parent.path());
    spilling.read_column("id").unwrap();
    let dir = spilling.spill_dir().unwrap();
    assert!(dir.starts_with(parent.path()));
    assert!(dir.exists());
    spilling.discard_spill();
    assert!(!dir.exists());
    assert!(spilling.spill_dir().is_none());
    assert!(spilling.spilled_columns().is_empty());
}

proptest! {
    #[test]
    fn spilling_never_changes_values(
        values in proptest::collection::vec(proptest::option::of(-1.0e6f64..1.0e6), 0..40),
        budget in 0usize..4096,
    ) {
        let df = DataFrame::new(vec![Series::new("x".into(), values).into()]).unwrap();
        let direct = FrameProvider::new(df.clone());
        let spilling = SpillingProvider::new(FrameProvider::new(df), budget);
        for _ in 0..2 {
            prop_assert_eq!(spilling.read_column("x").unwrap(), direct.read_column("x").unwrap());
        }
    }
}

/// Holds reads of `slow` until the test releases them.
struct GatedProvider {
    inner: FrameProvider,
    started: std::sync::Mutex<std::sync::mpsc::Sender<()>>,
    release: std::sync::Mutex<std::sync::mpsc::Receiver<()>>,
}

impl TabularProvider for GatedProvider {
    fn column_names(&self) -> Vec<String> {
        self.inner.column_names()
    }

    fn row_count(&self) -> usize {
        self.inner.row_count()
    }

    fn read_column(&self, name: &str) -> Result<Vec<RawValue>, ProviderError> {
        if name == "status" {
            let _ = self.started.lock().unwrap().send(());
            self.release
                .lock()
                .unwrap()
                .recv_timeout(std::time::Duration::from_secs(5))
                .map_err(|e| ProviderError::DataFrame {
                    message: e.to_string(),
                })?;
        }
        self.inner.read_column(name)
    }
}

#[test]
fn slow_inner_read_does_not_block_other_columns() {
    let (started_tx, started_rx) = std::sync::mpsc::channel();
    let (release_tx, release_rx) = std::sync::mpsc::channel();
    let provider = SpillingProvider::new(
        GatedProvider {
            inner: FrameProvider::new(sample_frame()),
            started: std::sync::Mutex::new(started_tx),
            release: std::sync::Mutex::new(release_rx),
        },
        1 << 20,
    );

    std::thread::scope(|scope| {
        let slow = scope.spawn(|| provider.read_column("status"));
        started_rx.recv().unwrap();
        let ids = provider.read_column("id").unwrap();
        assert_eq!(ids[0], RawValue::from("001"));
        release_tx.send(()).unwrap();
        let status = slow.join().unwrap().unwrap();
        assert_eq!(status[0], RawValue::from("open"));
    });
    assert_eq!(provider.read_column("status").unwrap().len(), 3);
}
