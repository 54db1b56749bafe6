pub mod batch_cache;
pub mod error_logger;
pub mod exporter;
pub mod llm_service;
pub mod markdown_parser;
pub mod output_validator;
pub mod prompt_builder;
pub mod quality_analyzer;
pub mod tagging;
pub mod transformer;

pub use batch_cache::BatchCache;
pub use error_logger::ErrorLogger;
pub use exporter::{ExportOutcome, QuizExporter};
pub use llm_service::{generate_batch, ChoiceGenerator, LlmService};
pub use transformer::{transform_batch, TransformOutcome};
