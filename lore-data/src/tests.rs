use super::*;
use camino::Utf8PathBuf;
use lore_core::ConfigurationError;
use rstest::{fixture, rstest};
use tempfile::TempDir;

struct DatasetDir {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl DatasetDir {
    fn write(&self, name: &str, contents: &str) {
        std::fs::write(self.root.join(name), contents).expect("write dataset file");
    }

    fn files(&self) -> DatasetFiles {
        DatasetFiles::in_dir(&self.root)
    }
}

#[fixture]
fn dataset_dir() -> DatasetDir {
    let dir = TempDir::new().expect("create temp dir");
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 temp dir");
    let dataset = DatasetDir { _dir: dir, root };
    dataset.write(DATA_SIZE_FILE, "3\t4\n");
    dataset.write(TRAIN_FILE, "0\t1\t2\n0\t2\n1\t3\t1\n");
    dataset.write(TEST_FILE, "0\t3\t1\n2\t0\t1\n");
    dataset.write(
        CHECKINS_FILE,
        "0\t2\t500.0\n0\t1\t100.0\n0\t3\t50.0\n1\t3\t10.0\n",
    );
    dataset.write(SOCIAL_RELATIONS_FILE, "0\t1\n1\t0\n");
    dataset.write(
        POI_COOS_FILE,
        "0\t30.26\t-97.74\n1\t30.27\t-97.75\n2\t30.28\t-97.73\n3\t30.25\t-97.76\n",
    );
    dataset
}

#[rstest]
fn loads_a_complete_dataset(dataset_dir: DatasetDir) {
    let dataset = load_dataset(&dataset_dir.files()).expect("dataset loads");

    assert_eq!(dataset.size(), lore_core::DatasetSize::new(3, 4));
    assert_eq!(dataset.training().get(0, 1), 2.0);
    assert_eq!(dataset.training().get(0, 2), DEFAULT_FREQUENCY);
    assert!(dataset.tuples().contains(1, 3));
    assert_eq!(dataset.ground_truth().users().collect::<Vec<_>>(), vec![0, 2]);
}

#[rstest]
fn checkins_are_filtered_and_sorted(dataset_dir: DatasetDir) {
    let dataset = load_dataset(&dataset_dir.files()).expect("dataset loads");
    let context = dataset.context();
    let pois: Vec<_> = context
        .checkins
        .sequence(0)
        .expect("user 0 has check-ins")
        .iter()
        .map(|checkin| checkin.poi)
        .collect();

    // (0, 3) is not a training pair.
    assert_eq!(pois, vec![1, 2]);
}

#[rstest]
fn out_of_range_pois_name_the_file(dataset_dir: DatasetDir) {
    dataset_dir.write(POI_COOS_FILE, "9\t30.0\t-97.0\n");

    let err = load_dataset(&dataset_dir.files()).expect_err("POI 9 is out of range");
    match err {
        DatasetError::Invalid { path, source } => {
            assert!(path.as_str().ends_with(POI_COOS_FILE));
            assert!(matches!(source, ConfigurationError::PoiOutOfRange { poi: 9, .. }));
        }
        other => panic!("expected invalid data, got {other:?}"),
    }
}

#[rstest]
fn malformed_size_is_rejected(dataset_dir: DatasetDir) {
    dataset_dir.write(DATA_SIZE_FILE, "lots of users\n");

    let err = load_dataset(&dataset_dir.files()).expect_err("size is malformed");
    assert!(matches!(
        err,
        DatasetError::Invalid {
            source: ConfigurationError::MalformedSize { .. },
            ..
        }
    ));
}

#[rstest]
fn missing_files_are_reported_before_reading(dataset_dir: DatasetDir) {
    std::fs::remove_file(dataset_dir.root.join(SOCIAL_RELATIONS_FILE)).expect("remove file");

    let err = dataset_dir
        .files()
        .ensure_present()
        .expect_err("social relations missing");
    assert!(
        matches!(err, DatasetError::MissingFile { ref path } if path.as_str().ends_with(SOCIAL_RELATIONS_FILE))
    );
}
