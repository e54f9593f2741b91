//! # sdkprobe: Android SDK Evidence Engine
//!
//! Proves or disproves the presence of third-party SDKs inside a shipped
//! Android package without access to its source. Split distributions are
//! reconstructed into one package, the package is decompiled by an external
//! tool, and the resulting trees are searched across six independent
//! evidence channels.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Engine::run                          │
//! │  ┌──────────────┐   ┌────────────┐   ┌──────────────────┐   │
//! │  │ Split merger │ → │ Decompiler │ → │ Raw extraction   │   │
//! │  │ (ingest)     │   │ (external) │   │ (plain archive)  │   │
//! │  └──────────────┘   └────────────┘   └────────┬─────────┘   │
//! │                                               │             │
//! │  ┌────────────────────────────────────────────▼──────────┐  │
//! │  │ PackageIndex (one walk per tree, shared by everyone)  │  │
//! │  └───────┬──────────────────┬──────────────────┬─────────┘  │
//! │  ┌───────▼──────┐  ┌────────▼────────┐  ┌──────▼────────┐   │
//! │  │ Metadata     │  │ Evidence probes │  │ Inventory +   │   │
//! │  │ extraction   │  │ (6 channels)    │  │ competitors   │   │
//! │  └───────┬──────┘  └────────┬────────┘  └──────┬────────┘   │
//! │          └──────────► AnalysisReport ◄─────────┘            │
//! │                 (inventory | detection layout)              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything is synchronous and single-threaded. Per-run state lives in an
//! explicit [`engine::AnalysisContext`]; nothing is process-wide.

pub mod analysis;
pub mod config;
pub mod detection;
pub mod engine;
pub mod evidence;
pub mod ingest;
pub mod report;

// Re-exports for convenience
pub use analysis::{PackageManifestFacts, PackageMetadata};
pub use detection::{CompetitorMatch, DetectedSdk, NativeLibraryRecord};
pub use detection::competitors::{CompetitorList, CompetitorMatcher};
pub use detection::library_db::LibraryDb;
pub use engine::{AnalysisMode, AnalysisReport, Engine, ProbeConfig};
pub use evidence::{EvidenceChannel, EvidenceMap, EvidenceRecord};
pub use ingest::decompiler::{ApktoolDecompiler, Decompiler};
pub use ingest::split::{reconstruct, MergeOutcome, SplitMerger};
pub use report::{render_report, write_report, ReportFormat};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Missing required argument: {0}")]
    MissingArgument(String),

    #[error("Required tool '{tool}' is not available: {hint}")]
    ToolUnavailable { tool: String, hint: String },

    #[error("No base package found in split container")]
    NoBaseArchiveFound,

    #[error("Split container extraction failed: {0}")]
    SplitPackageExtractionFailed(String),

    #[error("Base package extraction failed: {0}")]
    BasePackageExtractionFailed(String),

    #[error("Repackaging failed: {0}")]
    RepackagingFailed(String),

    #[error("Decompilation failed: {0}")]
    DecompilationFailed(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

/// Coarse error taxonomy used by the runner to pick an exit status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Caller-fixable input problems
    Input,
    /// Missing external decompiler or runtime
    Environment,
    /// Invalid container, missing base package, extraction/repackaging failure
    Archive,
    /// Any other failure during the pipeline
    Run,
}

impl ErrorClass {
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Run => 1,
            Self::Input => 2,
            Self::Environment => 3,
            Self::Archive => 4,
        }
    }
}

impl ProbeError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidInput(_) | Self::MissingArgument(_) | Self::Config(_) => ErrorClass::Input,
            Self::ToolUnavailable { .. } => ErrorClass::Environment,
            Self::NoBaseArchiveFound
            | Self::SplitPackageExtractionFailed(_)
            | Self::BasePackageExtractionFailed(_)
            | Self::RepackagingFailed(_) => ErrorClass::Archive,
            Self::DecompilationFailed(_) | Self::Io(_) | Self::SerdeError(_) => ErrorClass::Run,
        }
    }
}

pub type ProbeResult<T> = Result<T, ProbeError>;
