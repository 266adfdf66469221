use thiserror::Error;

/// Main error type for the grid-search trainer
#[derive(Error, Debug)]
pub enum GsError {
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Parameter error: {0}")]
    Parameter(#[from] ParameterError),

    #[error("Topology error: {0}")]
    Topology(#[from] TopologyError),

    #[error("Group error: {0}")]
    Group(#[from] GroupError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Dataset loading errors
#[derive(Error, Debug)]
pub enum DataError {
    #[error("can't open input file {path}: {message}")]
    OpenFailed { path: String, message: String },

    #[error("Wrong input format at line {line}: {message}")]
    MalformedLine { line: usize, message: String },

    #[error("Dataset contains no instances")]
    Empty,
}

/// Invalid learning parameters
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    #[error("C <= 0 (got {0})")]
    NonPositiveCost(f64),

    #[error("gamma < 0 (got {0})")]
    NegativeGamma(f64),

    #[error("eps <= 0 (got {0})")]
    NonPositiveEps(f64),

    #[error("cache_size <= 0 (got {0})")]
    NonPositiveCacheSize(f64),

    #[error("degree of polynomial kernel < 0 (got {0})")]
    NegativeDegree(i32),

    #[error("max_iterations must be positive")]
    NoIterations,

    #[error("cross-validation needs at least 2 folds (got {0})")]
    TooFewFolds(usize),
}

/// Process-group shape errors, raised before any evaluation starts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TopologyError {
    #[error("process group is empty")]
    NoWorkers,

    #[error("Too many processes: {workers} workers for {rows} grid rows")]
    TooManyWorkers { workers: usize, rows: usize },

    #[error("{workers} workers do not evenly divide {rows} grid rows")]
    UnevenPartition { workers: usize, rows: usize },

    #[error("rank {rank} is outside a group of {workers}")]
    RankOutOfRange { rank: usize, workers: usize },
}

/// Collective-communication errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GroupError {
    #[error("group aborted by rank {rank}: {reason}")]
    Aborted { rank: usize, reason: String },

    #[error("peer disconnected before the gather completed")]
    Disconnected,

    #[error("rank {rank} sent a block of {actual} values, expected {expected}")]
    BlockShape {
        rank: usize,
        expected: usize,
        actual: usize,
    },

    #[error("rank {rank} already took part in the gather")]
    AlreadyGathered { rank: usize },
}

/// Learning-engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("training set is empty")]
    EmptyTrainingSet,

    #[error("model has no classes")]
    EmptyModel,

    #[error("can't save model to file {path}: {message}")]
    SaveFailed { path: String, message: String },

    #[error("can't load model from file {path}: {message}")]
    LoadFailed { path: String, message: String },
}

/// Result type alias for grid-search operations
pub type GsResult<T> = Result<T, GsError>;

/// Macro for creating validation errors
#[macro_export]
macro_rules! validation_error {
    ($($arg:tt)*) => {
        $crate::GsError::Validation(format!($($arg)*))
    };
}

/// Macro for creating internal errors
#[macro_export]
macro_rules! internal_error {
    ($($arg:tt)*) => {
        $crate::GsError::Internal(format!($($arg)*))
    };
}

/// Macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::GsError::Config(format!($($arg)*))
    };
}
