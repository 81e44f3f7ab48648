pub mod action;
pub mod config;
pub mod experiment;
pub mod storage_state;

pub use action::{
    AddToRecommendationsProperties, CuratedExtensions, ExperimentAction, ExperimentActionType,
    PromptActionProperties, PromptCommand, PromptText, RawExperimentAction,
};
pub use config::{
    Config, ExperimentsConfig, LoggingConfig, ProductQuality, RuntimeEnvironment, StorageConfig,
    WorkspaceConfig,
};
pub use experiment::{
    Experiment, ExperimentCondition, ExperimentState, ExtensionsCondition, FileEditsCondition,
    RawExperiment,
};
pub use storage_state::{parse_registry, ExperimentStorageState};
