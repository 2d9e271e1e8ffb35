//! Every strategy must agree with the written symbols, index by index and
//! range by range.

#![allow(clippy::expect_used)]

use packseq_storage::{
    FileStore, MemoryStore, OversizedRange, PackedFile, PackedStore, PackedView, RandomAccess,
    SliceArgs, Strategy, StorageError, ViewConfig,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};
use tempfile::tempdir;

const STRATEGIES: [Strategy; 4] = [
    Strategy::Direct,
    Strategy::Preloaded,
    Strategy::Batched,
    Strategy::Scalar,
];

fn open_all(store: &dyn PackedStore, path: &str, len: usize, batch_size: usize) -> Vec<PackedView> {
    STRATEGIES
        .iter()
        .map(|&strategy| {
            let config = ViewConfig::new(strategy).with_batch_size(batch_size);
            PackedView::open(store, path, len, &config).expect("open view")
        })
        .collect()
}

/// Seeded random symbols, reproducible across runs.
fn symbols(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.random_range(0..4u8)).collect()
}

#[test]
fn test_large_file_on_disk() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("large.bin");
    let store = FileStore::new();
    let written = symbols(100_003, 0x5eed);

    PackedFile::write(&store, &path, &written).expect("write");
    assert_eq!(
        std::fs::metadata(&path).expect("metadata").len(),
        100_003_u64.div_ceil(4)
    );

    let path = path.to_str().expect("utf-8 path");
    let mut views = open_all(&store, path, written.len(), 1_000);

    for start in (0..written.len()).step_by(9_973) {
        let stop = (start + 500).min(written.len());
        for view in &mut views {
            let range = view
                .get_range(SliceArgs::range(start as i64, stop as i64))
                .expect("range")
                .into_owned();
            assert_eq!(&range[..], &written[start..stop], "{}", view.strategy());
        }
    }

    for view in &mut views {
        assert_eq!(view.get(-1).expect("last"), written[written.len() - 1]);
        view.close();
    }
}

#[test]
fn test_full_and_strided_ranges_match_gets() {
    let store = MemoryStore::new();
    let written = symbols(257, 42);
    PackedFile::write(&store, "seq", &written).expect("write");

    for mut view in open_all(&store, "seq", written.len(), 16) {
        let all = view.get_range(SliceArgs::full()).expect("full").into_owned();
        assert_eq!(all, written);

        let strided = view
            .get_range(SliceArgs::new(Some(3), Some(-3), Some(5)))
            .expect("strided")
            .into_owned();
        let expected: Vec<u8> = (3..254).step_by(5).map(|i| written[i]).collect();
        assert_eq!(strided, expected);

        let gets: Vec<u8> = (0..written.len() as i64)
            .map(|i| view.get(i).expect("index"))
            .collect();
        assert_eq!(gets, written);
    }
}

#[test]
fn test_mmap_and_buffered_reads_agree() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("seq.bin");
    let written = symbols(1_001, 7);
    PackedFile::write(&FileStore::new(), &path, &written).expect("write");

    for use_mmap in [true, false] {
        let config = ViewConfig::new(Strategy::Direct).with_mmap(use_mmap);
        let store = config.file_store();
        let mut view = PackedView::open(&store, &path, written.len(), &config).expect("open");
        assert_eq!(
            view.get_range(SliceArgs::full()).expect("full").into_owned(),
            written
        );
    }
}

#[test]
fn test_truncated_file_rejected_for_every_strategy() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("seq.bin");
    let store = FileStore::new();
    PackedFile::write(&store, &path, &symbols(40, 3)).expect("write");

    for strategy in STRATEGIES {
        let result = PackedView::open(&store, &path, 41, &ViewConfig::new(strategy));
        assert!(matches!(
            result,
            Err(StorageError::SizeMismatch {
                expected: 11,
                actual: 10
            })
        ));

        // Fewer symbols than stored is fine
        let mut view =
            PackedView::open(&store, &path, 37, &ViewConfig::new(strategy)).expect("open");
        assert_eq!(view.len(), 37);
        assert!(view.get(37).is_err());
    }
}

fn to_case_error(e: StorageError) -> TestCaseError {
    TestCaseError::fail(e.to_string())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// All strategies return the written symbol for every index
    #[test]
    fn strategies_agree_per_index(
        written in prop::collection::vec(0u8..=3, 1..200),
        batch_size in 1usize..40,
    ) {
        let store = MemoryStore::new();
        PackedFile::write(&store, "seq", &written).map_err(to_case_error)?;

        let mut views = open_all(&store, "seq", written.len(), batch_size);
        let len = written.len() as i64;
        for index in 0..len {
            for view in &mut views {
                prop_assert_eq!(view.get(index).map_err(to_case_error)?, written[index as usize]);
                prop_assert_eq!(view.get(index - len).map_err(to_case_error)?, written[index as usize]);
            }
        }
        for view in &mut views {
            let beyond = matches!(view.get(len), Err(StorageError::IndexOutOfRange { .. }));
            prop_assert!(beyond);
            let before = matches!(view.get(-len - 1), Err(StorageError::IndexOutOfRange { .. }));
            prop_assert!(before);
        }
    }

    /// Contiguous ranges agree across strategies and with element-wise gets
    #[test]
    fn strategies_agree_per_range(
        written in prop::collection::vec(0u8..=3, 1..200),
        batch_size in 1usize..40,
        ranges in prop::collection::vec((0usize..200, 0usize..200), 1..20),
    ) {
        let store = MemoryStore::new();
        PackedFile::write(&store, "seq", &written).map_err(to_case_error)?;

        let mut views = open_all(&store, "seq", written.len(), batch_size);
        for (a, b) in ranges {
            let start = a.min(b).min(written.len());
            let stop = a.max(b).min(written.len());
            let expected = &written[start..stop];

            for view in &mut views {
                let range = view
                    .get_range(SliceArgs::range(start as i64, stop as i64))
                    .map_err(to_case_error)?
                    .into_owned();
                prop_assert_eq!(&range[..], expected);

                let gets = (start..stop)
                    .map(|i| view.get(i as i64))
                    .collect::<Result<Vec<u8>, _>>()
                    .map_err(to_case_error)?;
                prop_assert_eq!(&gets[..], expected);
            }
        }
    }

    /// Truncate policy only ever returns a prefix of the requested range
    #[test]
    fn truncated_batches_return_prefix(
        written in prop::collection::vec(0u8..=3, 1..120),
        batch_size in 1usize..16,
        a in 0usize..120,
        b in 0usize..120,
    ) {
        let store = MemoryStore::new();
        PackedFile::write(&store, "seq", &written).map_err(to_case_error)?;
        let config = ViewConfig::new(Strategy::Batched)
            .with_batch_size(batch_size)
            .with_oversized_range(OversizedRange::Truncate);
        let mut view = PackedView::open(&store, "seq", written.len(), &config).map_err(to_case_error)?;

        let start = a.min(b).min(written.len());
        let stop = a.max(b).min(written.len());
        let range = view
            .get_range(SliceArgs::range(start as i64, stop as i64))
            .map_err(to_case_error)?
            .into_owned();

        prop_assert!(range.len() <= stop - start);
        prop_assert_eq!(&range[..], &written[start..start + range.len()]);
        if stop > start && (start / batch_size) == ((stop - 1) / batch_size) {
            prop_assert_eq!(range.len(), stop - start);
        }
    }
}
