//! Unit coverage for the evaluation loop.

use lore_core::test_support::{FixedPredictor, MemoryCache};
use lore_core::{
    CacheError, DatasetSize, GroundTruth, PoiCoordinates, PredictorError, SocialRelations,
    TrainingCheckins, TrainingMatrix,
};
use rstest::{fixture, rstest};

use super::*;

type MemoryRecord = ExecutionRecord<Vec<u8>>;

#[fixture]
fn dataset() -> Dataset {
    Dataset::new(
        DatasetSize::new(3, 5),
        TrainingMatrix::new().with(0, 2, 1.0).with(1, 0, 1.0),
        TrainingCheckins::default(),
        SocialRelations::new(),
        PoiCoordinates::new(),
        GroundTruth::new().with(0, 4),
    )
    .expect("valid dataset")
}

#[fixture]
fn config() -> EvaluationConfig {
    EvaluationConfig {
        top_k: 2,
        top_restricted: 5,
        ..EvaluationConfig::new("Toy")
    }
}

fn social_scores() -> FixedPredictor {
    [0.1, 0.3, 0.5, 0.9, 0.2]
        .into_iter()
        .zip(0..)
        .fold(FixedPredictor::new(ModelKind::Social, 0.0), |predictor, (score, poi)| {
            predictor.with_score(0, poi, score)
        })
}

fn predictors() -> PredictorSet {
    PredictorSet::new(
        social_scores(),
        FixedPredictor::new(ModelKind::Density, 1.0),
        FixedPredictor::new(ModelKind::Transition, 1.0),
    )
}

fn record() -> MemoryRecord {
    ExecutionRecord::from_writer("LORE_Toy_top5.txt", Vec::new())
}

fn record_text(record: &MemoryRecord) -> String {
    String::from_utf8(record.writer().clone()).expect("record is UTF-8")
}

fn outcomes(report: &EvaluationReport) -> Vec<CacheOutcome> {
    report.cache.iter().map(|entry| entry.outcome).collect()
}

#[rstest]
fn stages_follow_the_fixed_order() {
    let mut stage = Stage::Init;
    let mut seen = vec![stage];
    while stage != Stage::Done {
        stage = stage.next();
        seen.push(stage);
    }
    assert_eq!(
        seen,
        vec![
            Stage::Init,
            Stage::PerModel(ModelKind::Social),
            Stage::PerModel(ModelKind::Density),
            Stage::PerModel(ModelKind::Transition),
            Stage::FuseRankScore,
            Stage::Done,
        ]
    );
}

#[rstest]
#[case(EvaluationConfig { top_k: 0, ..config() }, ConfigurationError::ZeroTopK)]
#[case(
    EvaluationConfig { top_k: 6, ..config() },
    ConfigurationError::TopKExceedsRestricted { top_k: 6, top_restricted: 5 }
)]
#[case(
    EvaluationConfig { dataset_name: " ".to_owned(), ..config() },
    ConfigurationError::EmptyName { field: "dataset_name" }
)]
#[case(
    EvaluationConfig { sparsity_ratio: f64::INFINITY, ..config() },
    ConfigurationError::NonFiniteSparsityRatio { ratio: f64::INFINITY }
)]
fn invalid_configurations_are_rejected(
    #[case] config: EvaluationConfig,
    #[case] expected: ConfigurationError,
) {
    assert_eq!(config.validate(), Err(expected));
}

#[rstest]
fn invalid_configuration_stops_before_any_lookup(dataset: Dataset, config: EvaluationConfig) {
    let mut cache = MemoryCache::new();
    let config = EvaluationConfig { top_k: 0, ..config };
    let err = EvaluationLoop::new(config, &dataset, &mut cache, record())
        .expect_err("top_k of zero");
    assert!(matches!(
        err,
        EvaluationError::Configuration(ConfigurationError::ZeroTopK)
    ));
    assert_eq!(cache.loads(), 0);
}

#[rstest]
fn masked_pairs_rank_last_and_miss_the_metric_view(dataset: Dataset, config: EvaluationConfig) {
    let mut cache = MemoryCache::new();
    let mut evaluation =
        EvaluationLoop::new(config, &dataset, &mut cache, record()).expect("valid config");
    let report = evaluation.run(&mut predictors()).expect("run succeeds");

    assert_eq!(evaluation.stage(), Stage::Done);
    assert_eq!(report.users_evaluated, 1);
    assert_eq!(report.precision, 0.0);
    assert_eq!(report.recall, 0.0);
    assert_eq!(outcomes(&report), vec![CacheOutcome::Miss; 3]);
    assert_eq!(report.record_path, "LORE_Toy_top5.txt");

    let text = record_text(evaluation.record());
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 1, "only ground-truth users are recorded");
    let fields: Vec<&str> = lines.first().expect("one line").split('\t').collect();
    assert_eq!(fields.get(1), Some(&"0"));
    assert_eq!(fields.get(2), Some(&"3,1,4,0,2"));
}

#[rstest]
fn record_counter_is_the_shuffled_position(dataset: Dataset, config: EvaluationConfig) {
    let seed = config.seed;
    let position = crate::shuffled_users(dataset.size(), seed)
        .iter()
        .position(|&user| user == 0)
        .expect("user 0 is shuffled");
    let mut evaluation = EvaluationLoop::new(config, &dataset, MemoryCache::new(), record())
        .expect("valid config");
    evaluation.run(&mut predictors()).expect("run succeeds");

    let text = record_text(evaluation.record());
    assert!(text.starts_with(&format!("{position}\t0\t")), "{text}");
}

#[rstest]
fn only_ground_truth_users_get_matrix_rows(dataset: Dataset, config: EvaluationConfig) {
    let mut cache = MemoryCache::new();
    let key = config.cache_key(ModelKind::Social);
    EvaluationLoop::new(config, &dataset, &mut cache, record())
        .expect("valid config")
        .run(&mut predictors())
        .expect("run succeeds");

    let matrix = cache.entry(&key).expect("social matrix stored");
    assert_eq!(matrix.populated_users().collect::<Vec<_>>(), vec![0]);
    assert_eq!(matrix.get(0, 3), 0.9);
}

#[rstest]
fn second_run_hits_the_cache_with_identical_results(dataset: Dataset, config: EvaluationConfig) {
    let mut cache = MemoryCache::new();

    let (first_report, first_text) = {
        let mut first = EvaluationLoop::new(config.clone(), &dataset, &mut cache, record())
            .expect("valid config");
        let report = first.run(&mut predictors()).expect("first run");
        (report, record_text(first.record()))
    };
    let (second_report, second_text) = {
        let mut second =
            EvaluationLoop::new(config, &dataset, &mut cache, record()).expect("valid config");
        let report = second.run(&mut predictors()).expect("second run");
        (report, record_text(second.record()))
    };

    assert_eq!(outcomes(&second_report), vec![CacheOutcome::Hit; 3]);
    assert_eq!(first_report.precision, second_report.precision);
    assert_eq!(first_report.recall, second_report.recall);
    assert_eq!(first_text, second_text);
    assert_eq!(cache.stores(), 3);
}

#[rstest]
fn load_failures_rebuild_every_matrix(dataset: Dataset, config: EvaluationConfig) {
    let mut cache = MemoryCache::new().failing_loads();
    let report = EvaluationLoop::new(config, &dataset, &mut cache, record())
        .expect("valid config")
        .run(&mut predictors())
        .expect("load errors are recoverable");

    assert_eq!(outcomes(&report), vec![CacheOutcome::Rebuilt; 3]);
    assert_eq!(cache.stores(), 3);
}

#[rstest]
fn store_failures_abort_the_run(dataset: Dataset, config: EvaluationConfig) {
    let cache = MemoryCache::new().failing_stores();
    let err = EvaluationLoop::new(config, &dataset, cache, record())
        .expect("valid config")
        .run(&mut predictors())
        .expect_err("store errors are fatal");

    assert!(matches!(
        err,
        EvaluationError::CacheStore {
            source: CacheError::Unavailable { .. },
            ..
        }
    ));
}

#[rstest]
fn misshapen_cache_entries_are_rebuilt(dataset: Dataset, config: EvaluationConfig) {
    let key = config.cache_key(ModelKind::Density);
    let mut stale = ScoreMatrix::new(DatasetSize::new(3, 4));
    stale.insert_row(0, vec![1.0; 4]).expect("row fits");
    let mut cache = MemoryCache::new().with_entry(&key, stale);

    let report = EvaluationLoop::new(config, &dataset, &mut cache, record())
        .expect("valid config")
        .run(&mut predictors())
        .expect("run succeeds");

    assert_eq!(
        outcomes(&report),
        vec![CacheOutcome::Miss, CacheOutcome::Rebuilt, CacheOutcome::Miss]
    );
    let rebuilt = cache.entry(&key).expect("density matrix stored");
    assert_eq!(rebuilt.size(), DatasetSize::new(3, 5));
}

#[rstest]
fn insufficient_data_contributes_zero(dataset: Dataset, config: EvaluationConfig) {
    let mut predictors = PredictorSet::new(
        social_scores().insufficient(),
        FixedPredictor::new(ModelKind::Density, 1.0),
        FixedPredictor::new(ModelKind::Transition, 1.0),
    );
    let mut cache = MemoryCache::new();
    let key = config.cache_key(ModelKind::Social);
    let mut evaluation =
        EvaluationLoop::new(config, &dataset, &mut cache, record()).expect("valid config");
    evaluation.run(&mut predictors).expect("insufficient data is not fatal");

    let (_, record) = evaluation.into_parts();
    let text = record_text(&record);
    assert!(text.ends_with("\t0\t0,1,3,4,2\n"), "{text}");
    let zeros = cache.entry(&key).expect("zero matrix stored");
    assert_eq!(zeros.row(0), Some([0.0; 5].as_slice()));
}

#[rstest]
fn invalid_predictor_parameters_abort_the_run(dataset: Dataset, config: EvaluationConfig) {
    let mut predictors = PredictorSet::lore(SocialParams { eta: 2.0 }, TransitionParams::default());
    let err = EvaluationLoop::new(config, &dataset, MemoryCache::new(), record())
        .expect("valid config")
        .run(&mut predictors)
        .expect_err("eta outside [0, 1]");

    assert!(matches!(
        err,
        EvaluationError::Predictor {
            model: ModelKind::Social,
            source: PredictorError::InvalidParameter { name: "eta", .. },
        }
    ));
}

#[rstest]
fn metrics_average_over_evaluated_users(config: EvaluationConfig) {
    // User 0 ranks POI 3 first and user 1 ranks POI 1 first.
    let dataset = Dataset::new(
        DatasetSize::new(3, 5),
        TrainingMatrix::new(),
        TrainingCheckins::default(),
        SocialRelations::new(),
        PoiCoordinates::new(),
        GroundTruth::new().with(0, 3).with(1, 4),
    )
    .expect("valid dataset");
    let social = social_scores().with_score(1, 1, 0.9).with_score(1, 3, 0.1);
    let mut predictors = PredictorSet::new(
        social,
        FixedPredictor::new(ModelKind::Density, 1.0),
        FixedPredictor::new(ModelKind::Transition, 1.0),
    );
    let config = EvaluationConfig { top_k: 1, ..config };

    let report = EvaluationLoop::new(config, &dataset, MemoryCache::new(), record())
        .expect("valid config")
        .run(&mut predictors)
        .expect("run succeeds");

    assert_eq!(report.users_evaluated, 2);
    assert_eq!(report.precision, 0.5);
    assert_eq!(report.recall, 0.5);
}

#[rstest]
fn predictor_set_slots_report_their_kinds() {
    let predictors = PredictorSet::default();
    for kind in ModelKind::ALL {
        assert_eq!(predictors.get(kind).kind(), kind);
    }
}

#[rstest]
fn reports_serialise_with_lowercase_outcomes(dataset: Dataset, config: EvaluationConfig) {
    let key = config.cache_key(ModelKind::Density);
    let stale = ScoreMatrix::new(DatasetSize::new(3, 4));
    let mut cache = MemoryCache::new().with_entry(&key, stale);
    let report = EvaluationLoop::new(config, &dataset, &mut cache, record())
        .expect("valid config")
        .run(&mut predictors())
        .expect("run succeeds");

    let value = serde_json::to_value(&report).expect("report serialises");
    assert_eq!(
        value.get("cache"),
        Some(&serde_json::json!([
            { "model": "social", "outcome": "miss" },
            { "model": "density", "outcome": "rebuilt" },
            { "model": "transition", "outcome": "miss" },
        ]))
    );
    assert_eq!(value.get("users_evaluated"), Some(&serde_json::json!(1)));
    assert!(value.get("precision").is_some_and(serde_json::Value::is_f64));
}

#[rstest]
fn cached_negative_scores_are_rebuilt(dataset: Dataset, config: EvaluationConfig) {
    let key = config.cache_key(ModelKind::Density);
    let mut corrupt = ScoreMatrix::new(DatasetSize::new(3, 5));
    corrupt
        .insert_row(0, vec![1.0, 1.0, 1.0, -5.0, 1.0])
        .expect("row fits");
    let mut cache = MemoryCache::new().with_entry(&key, corrupt);
    let mut evaluation =
        EvaluationLoop::new(config, &dataset, &mut cache, record()).expect("valid config");
    let report = evaluation.run(&mut predictors()).expect("run succeeds");

    assert_eq!(
        outcomes(&report),
        vec![CacheOutcome::Miss, CacheOutcome::Rebuilt, CacheOutcome::Miss]
    );
    let (_, record) = evaluation.into_parts();
    let text = record_text(&record);
    assert!(text.ends_with("\t3,1,4,0,2\n"), "{text}");
    assert_eq!(cache.entry(&key).expect("density stored").get(0, 3), 1.0);
}

#[rstest]
fn cached_rows_for_other_users_are_rebuilt(dataset: Dataset, config: EvaluationConfig) {
    let key = config.cache_key(ModelKind::Transition);
    let mut padded = ScoreMatrix::new(DatasetSize::new(3, 5));
    padded.insert_row(0, vec![1.0; 5]).expect("row fits");
    padded.insert_row(2, vec![1.0; 5]).expect("row fits");
    let mut cache = MemoryCache::new().with_entry(&key, padded);
    let report = EvaluationLoop::new(config, &dataset, &mut cache, record())
        .expect("valid config")
        .run(&mut predictors())
        .expect("run succeeds");

    assert_eq!(
        outcomes(&report),
        vec![CacheOutcome::Miss, CacheOutcome::Miss, CacheOutcome::Rebuilt]
    );
    let rebuilt = cache.entry(&key).expect("transition stored");
    assert_eq!(rebuilt.populated_users().collect::<Vec<_>>(), vec![0]);
}
