use easyscan_extract::error::ExtractError;
use easyscan_extract::model::DeclarationStore;
use easyscan_extract::{DeclarationParser, ExtractOptions, Extraction};
use miette::{Diagnostic, Report};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Execute the extraction pipeline over every input, returning the generation requests as RON.
///
/// Each input is extracted on its own. The first input that fails aborts the pipeline.
pub fn execute_extraction_pipeline(
    opts: PipelineOptions,
    inputs: &[PathBuf],
) -> Result<String, PipelineError> {
    let pipeline = Pipeline::new(opts);
    let mut requests = Vec::with_capacity(inputs.len());
    for input in inputs {
        let extraction = ExtractOperation::execute(&pipeline, input.as_path())?;
        let extraction = DiagnosticReportOperation::execute(&pipeline, extraction)?;
        requests.push(GenerationRequest::new(&pipeline.opts, extraction.store));
    }
    ModelEmitOperation::execute(&pipeline, requests)
}

#[derive(Debug, Error, Diagnostic)]
pub enum PipelineError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    ExtractError(#[from] ExtractError),
    #[error("failed to serialize the generation request")]
    #[diagnostic(code(driver::emit))]
    EmitError(#[from] ron::Error),
}

/// The default casing of column names in generated scanners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
pub enum Casing {
    #[default]
    Lower,
    Camel,
    Kebab,
    Snake,
    Pascal,
}

/// Options for the extraction pipeline.
///
/// Most of these are derived from the command line arguments. Only `all_types` affects the
/// extraction itself, the rest is passed through to the generator untouched.
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    pub all_types: bool,
    pub casing: Casing,
    /// Match columns to fields by position rather than by name.
    pub strict_order: bool,
}

/// Everything the code generator needs to produce the scanners of one package.
#[derive(Debug, Serialize)]
pub struct GenerationRequest {
    pub casing: Casing,
    pub strict_order: bool,
    pub package: DeclarationStore,
}

impl GenerationRequest {
    pub fn new(opts: &PipelineOptions, package: DeclarationStore) -> Self {
        Self {
            casing: opts.casing,
            strict_order: opts.strict_order,
            package,
        }
    }
}

pub struct Pipeline {
    opts: PipelineOptions,
}

impl Pipeline {
    pub fn new(opts: PipelineOptions) -> Self {
        Self { opts }
    }
}

pub trait PipelineOperation<I, O> {
    fn execute(pipeline: &Pipeline, input: I) -> Result<O, PipelineError>;
}

/// Operation for extracting the declarations of a file or directory.
pub struct ExtractOperation;
impl<'p> PipelineOperation<&'p Path, Extraction> for ExtractOperation {
    fn execute(pipeline: &Pipeline, input: &'p Path) -> Result<Extraction, PipelineError> {
        let parser = DeclarationParser::new(ExtractOptions {
            all_types: pipeline.opts.all_types,
        });
        let extraction = parser.parse_path(input)?;
        log::debug!(
            "extracted {} records and {} lists from {}",
            extraction.store.records.len(),
            extraction.store.lists.len(),
            input.display()
        );
        Ok(extraction)
    }
}

/// Operation for rendering the warnings of an extraction to stderr.
pub struct DiagnosticReportOperation;
impl PipelineOperation<Extraction, Extraction> for DiagnosticReportOperation {
    fn execute(_: &Pipeline, mut input: Extraction) -> Result<Extraction, PipelineError> {
        for warning in std::mem::take(&mut input.diagnostics) {
            eprintln!("{:?}", Report::new(warning));
        }
        Ok(input)
    }
}

/// Operation for serializing the generation requests.
pub struct ModelEmitOperation;
impl PipelineOperation<Vec<GenerationRequest>, String> for ModelEmitOperation {
    fn execute(_: &Pipeline, input: Vec<GenerationRequest>) -> Result<String, PipelineError> {
        let document = ron::ser::to_string_pretty(&input, Default::default())?;
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use crate::pipeline::{
        execute_extraction_pipeline, Casing, ExtractOperation, Pipeline, PipelineError,
        PipelineOperation, PipelineOptions,
    };
    use easyscan_extract::error::ExtractError;
    use easyscan_macros::{assert_err, assert_matches, assert_ok};
    use std::path::{Path, PathBuf};

    fn fixture(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures")
            .join(name)
    }

    #[test]
    fn test_pipeline_emits_one_request_per_input() {
        let opts = PipelineOptions {
            all_types: true,
            casing: Casing::Camel,
            strict_order: false,
        };
        let document = assert_ok!(execute_extraction_pipeline(
            opts,
            &[fixture("users.go"), fixture("users.go")]
        ));
        assert_eq!(document.matches("casing: Camel").count(), 2);
        assert_eq!(document.matches("strict_order: false").count(), 2);
        assert!(document.contains("package_name: \"users\""));
    }

    #[test]
    fn test_extract_operation_reports_missing_input() {
        let pipeline = Pipeline::new(PipelineOptions::default());
        let missing = fixture("missing.go");
        let err = assert_err!(ExtractOperation::execute(&pipeline, missing.as_path()));
        let err = assert_matches!(err, PipelineError::ExtractError(ExtractError::Io(e)) => e);
        assert_eq!(err.path, missing);
    }
}
