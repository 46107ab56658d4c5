//! Evaluate command implementation for the LORE CLI.

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use lore_core::FileScoreCache;
use lore_data::{DatasetFiles, load_dataset};
use lore_eval::{
    DEFAULT_MODEL_NAME, DEFAULT_SPARSITY_RATIO, DEFAULT_TOP_K, DEFAULT_TOP_RESTRICTED,
    EvaluationConfig, EvaluationLoop, EvaluationReport, ExecutionRecord, PredictorSet,
};
use lore_scorer::{DEFAULT_ALPHA, DEFAULT_DELTA_T, DEFAULT_ETA, SocialParams, TransitionParams};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{ARG_DATASET_DIR, ARG_DATASET_NAME, CliError, ENV_DATASET_DIR, ENV_DATASET_NAME};

/// Default directory holding cached score matrices.
pub const DEFAULT_CACHE_DIR: &str = "Generated/Models";
/// Default directory receiving execution records.
pub const DEFAULT_OUTPUT_DIR: &str = "Generated";

/// CLI arguments for the `evaluate` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Fuse the social, density and transition models for every \
                 held-out user of a dataset, rank the candidates and report \
                 mean precision and recall. Score matrices are cached between \
                 runs. Options can come from CLI flags, configuration files, \
                 or environment variables.",
    about = "Evaluate LORE recommendations on a dataset"
)]
#[ortho_config(prefix = "LORE")]
pub(crate) struct EvaluateArgs {
    /// Directory holding the dataset files.
    #[arg(long = ARG_DATASET_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) dataset_dir: Option<Utf8PathBuf>,
    /// Dataset name used in cache keys and the record name [default: the
    /// dataset directory name].
    #[arg(long = ARG_DATASET_NAME, value_name = "name")]
    #[serde(default)]
    pub(crate) dataset_name: Option<String>,
    /// Model name used in cache keys and the record name [default: LORE].
    #[arg(long = "model-name", value_name = "name")]
    #[serde(default)]
    pub(crate) model_name: Option<String>,
    /// Metric cut-off [default: 10].
    #[arg(long = "top-k", value_name = "n")]
    #[serde(default)]
    pub(crate) top_k: Option<usize>,
    /// Ranked entries kept per user [default: 100].
    #[arg(long = "top-restricted", value_name = "n")]
    #[serde(default)]
    pub(crate) top_restricted: Option<usize>,
    /// Sparsity ratio tag for cache keys [default: 1.0].
    #[arg(long = "sparsity-ratio", value_name = "ratio")]
    #[serde(default)]
    pub(crate) sparsity_ratio: Option<f64>,
    /// Directory holding cached score matrices [default: Generated/Models].
    #[arg(long = "cache-dir", value_name = "dir")]
    #[serde(default)]
    pub(crate) cache_dir: Option<Utf8PathBuf>,
    /// Directory receiving the execution record [default: Generated].
    #[arg(long = "output-dir", value_name = "dir")]
    #[serde(default)]
    pub(crate) output_dir: Option<Utf8PathBuf>,
    /// Seed of the evaluation order [default: 0].
    #[arg(long = "seed", value_name = "n")]
    #[serde(default)]
    pub(crate) seed: Option<u64>,
    /// Transition window in seconds [default: 86400].
    #[arg(long = "delta-t", value_name = "seconds")]
    #[serde(default)]
    pub(crate) delta_t: Option<f64>,
    /// Decay rate of older visits [default: 0.05].
    #[arg(long = "alpha", value_name = "rate")]
    #[serde(default)]
    pub(crate) alpha: Option<f64>,
    /// Weight of friend overlap in social similarity [default: 0.05].
    #[arg(long = "eta", value_name = "weight")]
    #[serde(default)]
    pub(crate) eta: Option<f64>,
}

impl EvaluateArgs {
    pub(crate) fn into_config(self) -> Result<EvaluateConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        EvaluateConfig::try_from(merged)
    }
}

/// Resolved `evaluate` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct EvaluateConfig {
    /// Dataset input files.
    pub(crate) files: DatasetFiles,
    /// Loop parameters.
    pub(crate) evaluation: EvaluationConfig,
    /// Score matrix cache root.
    pub(crate) cache_dir: Utf8PathBuf,
    /// Execution record directory.
    pub(crate) output_dir: Utf8PathBuf,
    /// Social model parameters.
    pub(crate) social: SocialParams,
    /// Transition model parameters.
    pub(crate) transition: TransitionParams,
}

impl EvaluateConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        self.files.ensure_present().map_err(CliError::from)
    }
}

impl TryFrom<EvaluateArgs> for EvaluateConfig {
    type Error = CliError;

    fn try_from(args: EvaluateArgs) -> Result<Self, Self::Error> {
        let dataset_dir = args.dataset_dir.ok_or(CliError::MissingArgument {
            field: ARG_DATASET_DIR,
            env: ENV_DATASET_DIR,
        })?;
        let dataset_name = match args.dataset_name {
            Some(name) => name,
            None => default_dataset_name(&dataset_dir).ok_or(CliError::MissingArgument {
                field: ARG_DATASET_NAME,
                env: ENV_DATASET_NAME,
            })?,
        };

        let evaluation = EvaluationConfig {
            model_name: args
                .model_name
                .unwrap_or_else(|| DEFAULT_MODEL_NAME.to_owned()),
            dataset_name,
            top_k: args.top_k.unwrap_or(DEFAULT_TOP_K),
            top_restricted: args.top_restricted.unwrap_or(DEFAULT_TOP_RESTRICTED),
            sparsity_ratio: args.sparsity_ratio.unwrap_or(DEFAULT_SPARSITY_RATIO),
            seed: args.seed.unwrap_or_default(),
        };
        evaluation.validate()?;

        let social = SocialParams {
            eta: args.eta.unwrap_or(DEFAULT_ETA),
        }
        .validate()?;
        let transition = TransitionParams {
            delta_t: args.delta_t.unwrap_or(DEFAULT_DELTA_T),
            alpha: args.alpha.unwrap_or(DEFAULT_ALPHA),
        }
        .validate()?;

        Ok(Self {
            files: DatasetFiles::in_dir(&dataset_dir),
            evaluation,
            cache_dir: args
                .cache_dir
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_CACHE_DIR)),
            output_dir: args
                .output_dir
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_OUTPUT_DIR)),
            social,
            transition,
        })
    }
}

/// Last component of `dir`, used when no dataset name is given.
fn default_dataset_name(dir: &Utf8Path) -> Option<String> {
    dir.file_name()
        .filter(|name| !name.trim().is_empty())
        .map(str::to_owned)
}

pub(crate) fn run_evaluate(args: EvaluateArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_evaluate_with(args, &mut stdout)
}

pub(crate) fn run_evaluate_with(args: EvaluateArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = resolve_evaluate_config(args)?;
    let report = execute_evaluate(&config)?;
    write_report(writer, &report)
}

fn resolve_evaluate_config(args: EvaluateArgs) -> Result<EvaluateConfig, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    Ok(config)
}

pub(crate) fn execute_evaluate(config: &EvaluateConfig) -> Result<EvaluationReport, CliError> {
    let dataset = load_dataset(&config.files)?;
    let cache = FileScoreCache::new(config.cache_dir.clone());
    let record = ExecutionRecord::create(
        &config.output_dir,
        &config.evaluation.model_name,
        &config.evaluation.dataset_name,
        config.evaluation.top_restricted,
    )
    .map_err(|source| CliError::CreateRecord {
        path: config.output_dir.clone(),
        source,
    })?;
    let mut predictors = PredictorSet::lore(config.social, config.transition);
    let report = EvaluationLoop::new(config.evaluation.clone(), &dataset, cache, record)?
        .run(&mut predictors)?;
    Ok(report)
}

fn write_report(writer: &mut dyn Write, report: &EvaluationReport) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(report).map_err(CliError::SerialiseReport)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteReport)?;
    writer.write_all(b"\n").map_err(CliError::WriteReport)?;
    Ok(())
}
