pub mod category;
pub mod difficulty;
pub mod generation;
pub mod loaders;
pub mod quiz;
pub mod report;
pub mod source_unit;

pub use category::Category;
pub use difficulty::{Difficulty, DifficultySource};
pub use generation::{
    ChoicePayload, FailureKind, GenerationOutcome, GenerationRequest, GenerationResult,
};
pub use loaders::load_category_source;
pub use quiz::{QuizMeta, QuizRecord};
pub use report::{CategoryReport, CategoryStatus, FailedDetail, RunSummary};
pub use source_unit::{DocumentMetadata, SourceUnit};
