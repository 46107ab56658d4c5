//! Shared-contract coverage for all three scorers.

use geo::Coord;
use lore_core::{
    Checkin, DatasetSize, ModelKind, PoiCoordinates, Predictor, SocialRelations, TrainingCheckins,
    TrainingContext, TrainingMatrix,
};
use rstest::{fixture, rstest};

use crate::{
    DensityScorer, SocialParams, SocialScorer, TransitionParams, TransitionScorer, haversine_km,
};

struct Inputs {
    training: TrainingMatrix,
    checkins: TrainingCheckins,
    social: SocialRelations,
    coordinates: PoiCoordinates,
}

impl Inputs {
    fn context(&self) -> TrainingContext<'_> {
        TrainingContext {
            size: DatasetSize::new(3, 4),
            training: &self.training,
            checkins: &self.checkins,
            social: &self.social,
            coordinates: &self.coordinates,
        }
    }
}

#[fixture]
fn inputs() -> Inputs {
    let training = TrainingMatrix::new()
        .with(0, 0, 2.0)
        .with(0, 1, 1.0)
        .with(1, 1, 1.0)
        .with(1, 2, 4.0)
        .with(2, 3, 1.0);
    let checkins = TrainingCheckins::from_training_events(
        [
            (0, Checkin { poi: 0, timestamp: 0.0 }),
            (0, Checkin { poi: 1, timestamp: 600.0 }),
            (0, Checkin { poi: 0, timestamp: 1_200.0 }),
            (1, Checkin { poi: 1, timestamp: 0.0 }),
            (1, Checkin { poi: 2, timestamp: 3_600.0 }),
        ],
        &training,
    );
    Inputs {
        training,
        checkins,
        social: SocialRelations::new().with(0, 1).with(1, 0).with(2, 0),
        coordinates: PoiCoordinates::new()
            .with(0, 37.7749, -122.4194)
            .with(1, 37.7793, -122.4193)
            .with(2, 37.8024, -122.4058)
            .with(3, 37.8199, -122.4783),
    }
}

fn scorer(kind: ModelKind) -> Box<dyn Predictor> {
    match kind {
        ModelKind::Social => Box::new(SocialScorer::new(SocialParams::default())),
        ModelKind::Density => Box::new(DensityScorer::new()),
        ModelKind::Transition => Box::new(TransitionScorer::new(TransitionParams::default())),
    }
}

#[rstest]
#[case(ModelKind::Social)]
#[case(ModelKind::Density)]
#[case(ModelKind::Transition)]
fn precompute_is_idempotent(inputs: Inputs, #[case] kind: ModelKind) {
    let context = inputs.context();
    let mut once = scorer(kind);
    once.precompute(&context).expect("inputs are sufficient");
    let mut twice = scorer(kind);
    twice.precompute(&context).expect("inputs are sufficient");
    twice.precompute(&context).expect("inputs are sufficient");

    for user in context.size.user_ids() {
        for poi in context.size.poi_ids() {
            let lhs = once.predict(user, poi).expect("precomputed");
            let rhs = twice.predict(user, poi).expect("precomputed");
            assert_eq!(lhs.to_bits(), rhs.to_bits(), "user {user} poi {poi}");
        }
    }
}

#[rstest]
#[case(ModelKind::Social)]
#[case(ModelKind::Density)]
#[case(ModelKind::Transition)]
fn scores_are_finite_and_non_negative(inputs: Inputs, #[case] kind: ModelKind) {
    let context = inputs.context();
    let mut predictor = scorer(kind);
    predictor.precompute(&context).expect("inputs are sufficient");
    assert_eq!(predictor.kind(), kind);

    for user in context.size.user_ids() {
        for poi in context.size.poi_ids() {
            let score = predictor.predict(user, poi).expect("precomputed");
            assert!(score.is_finite() && score >= 0.0, "bad score {score}");
        }
    }
}

#[rstest]
#[case(ModelKind::Social)]
#[case(ModelKind::Density)]
#[case(ModelKind::Transition)]
fn unprepared_scorers_refuse_queries(#[case] kind: ModelKind) {
    let err = scorer(kind).predict(0, 0).expect_err("not prepared");
    assert!(!err.is_data_insufficient());
}

#[rstest]
fn haversine_distance_is_reported_in_kilometres() {
    let london = Coord { x: -0.1278, y: 51.5074 };
    let paris = Coord { x: 2.3522, y: 48.8566 };
    let distance = haversine_km(london, paris);
    assert!((340.0..350.0).contains(&distance), "got {distance}");
}
