//! # Engine: run orchestration
//!
//! - `file_index`: one walk per tree, shared by every component
//! - `pipeline`: `EvidenceProbe` trait, `ScanContext`, per-keyword scan
//! - `channels/`: the six evidence probes
//! - `workspace`: scratch/decompiled/raw trees for one run
//!
//! A run resolves the input, reconstructs and decompiles when needed, then
//! hands both trees to [`Engine::analyze_trees`]. All per-run state lives in
//! an [`AnalysisContext`] that is frozen into an [`AnalysisReport`].

pub mod channels;
pub mod file_index;
pub mod pipeline;
pub mod workspace;

use crate::analysis::{self, PackageMetadata};
use crate::detection::competitors::{CompetitorList, CompetitorMatcher};
use crate::detection::library_db::LibraryDb;
use crate::detection::{self, CompetitorMatch, DetectedSdk, NativeLibraryRecord};
use crate::evidence::{EvidenceMap, EvidenceRecord};
use crate::ingest::decompiler::{self, ApktoolDecompiler, Decompiler};
use crate::ingest::split::{MergeOutcome, SplitMerger};
use crate::ingest::{self, archive, InputKind};
use crate::report::ReportFormat;
use crate::{ProbeError, ProbeResult};
use chrono::{DateTime, Utc};
use file_index::PackageIndex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use workspace::Workspace;

// ─── Configuration ─────────────────────────────────────────────────

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Maximum number of files whose content the code channel reads
    pub code_scan_file_cap: usize,
    /// Path tokens that make a code file a content-search candidate
    pub code_scan_tokens: Vec<String>,
    /// Keep scratch, decompiled and raw trees after the run
    pub keep_workdirs: bool,
    /// Decompiler launcher
    pub decompiler: PathBuf,
    /// Extra arguments passed to the decompiler before the output flag
    pub decompiler_args: Vec<String>,
    /// Pipe-delimited library reference database
    pub library_db: Option<PathBuf>,
    /// Competitor name list
    pub competitor_list: Option<PathBuf>,
    /// Directory the report file is written to
    pub output_dir: PathBuf,
    pub report_format: ReportFormat,
    /// Code packages listed in the inventory layout
    pub package_listing_limit: usize,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            code_scan_file_cap: 50,
            code_scan_tokens: vec!["vendor".into(), "library".into(), "sdk".into()],
            keep_workdirs: false,
            decompiler: PathBuf::from("apktool"),
            decompiler_args: Vec::new(),
            library_db: None,
            competitor_list: None,
            output_dir: PathBuf::from("."),
            report_format: ReportFormat::Text,
            package_listing_limit: 20,
        }
    }
}

// ─── Mode ──────────────────────────────────────────────────────────

/// Full inventory, or targeted search for specific keywords
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AnalysisMode {
    Inventory,
    Detection { keywords: Vec<String> },
}

impl AnalysisMode {
    /// Targeted search. Keywords are trimmed; exact duplicates collapse to
    /// the first occurrence. Blank keywords are rejected.
    pub fn detection<I, S>(keywords: I) -> ProbeResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for kw in keywords {
            let kw = kw.as_ref().trim();
            if kw.is_empty() {
                return Err(ProbeError::InvalidInput("keyword must not be empty".into()));
            }
            if !out.iter().any(|k| k == kw) {
                out.push(kw.to_string());
            }
        }
        if out.is_empty() {
            return Err(ProbeError::MissingArgument("at least one keyword".into()));
        }
        Ok(Self::Detection { keywords: out })
    }

    /// Detection when any keyword is given, inventory otherwise
    pub fn from_keywords(keywords: &[String]) -> ProbeResult<Self> {
        if keywords.is_empty() {
            Ok(Self::Inventory)
        } else {
            Self::detection(keywords)
        }
    }

    /// Tag used in report file names
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Inventory => "inventory",
            Self::Detection { .. } => "detection",
        }
    }

    pub fn keywords(&self) -> &[String] {
        match self {
            Self::Inventory => &[],
            Self::Detection { keywords } => keywords,
        }
    }
}

// ─── Stage Statistics ──────────────────────────────────────────────

/// Timing for one stage of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageStats {
    pub name: String,
    pub duration_ms: u64,
    pub items: usize,
}

// ─── Context ───────────────────────────────────────────────────────

/// Accumulator for one run. Created at the start of a run, filled by each
/// component in turn, then consumed by [`AnalysisContext::into_report`].
#[derive(Debug, Default)]
pub struct AnalysisContext {
    pub metadata: PackageMetadata,
    pub libraries: Vec<NativeLibraryRecord>,
    pub evidence: EvidenceMap,
    pub competitor_matches: Vec<CompetitorMatch>,
    pub competitors_checked: usize,
    pub merge: Option<MergeOutcome>,
    pub package_sha256: Option<String>,
    pub stages: Vec<StageStats>,
}

impl AnalysisContext {
    pub fn new() -> Self {
        Self::default()
    }

    fn stage(&mut self, name: &str, start: Instant, items: usize) {
        let duration_ms = start.elapsed().as_millis() as u64;
        tracing::info!("{}: {} item(s) in {}ms", name, items, duration_ms);
        self.stages.push(StageStats {
            name: name.to_string(),
            duration_ms,
            items,
        });
    }

    /// Freeze into a report. Evidence is emitted in request order.
    pub fn into_report(mut self, mode: AnalysisMode, source: String, config: &ProbeConfig, decompiler: &str) -> AnalysisReport {
        let evidence = mode
            .keywords()
            .iter()
            .filter_map(|k| self.evidence.remove(k))
            .collect();
        let sdks = detection::aggregate_sdks(&self.metadata.version_stamps, &self.libraries);
        let architectures = detection::architectures(&self.libraries);

        AnalysisReport {
            mode,
            generated_at: Utc::now(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            decompiler: decompiler.to_string(),
            code_scan_cap: config.code_scan_file_cap,
            package_listing_limit: config.package_listing_limit,
            source,
            package_sha256: self.package_sha256,
            metadata: self.metadata,
            libraries: self.libraries,
            architectures,
            sdks,
            evidence,
            competitor_matches: self.competitor_matches,
            competitors_checked: self.competitors_checked,
            merge: self.merge,
            stages: self.stages,
        }
    }
}

// ─── Report ────────────────────────────────────────────────────────

/// Immutable result of one analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub mode: AnalysisMode,
    pub generated_at: DateTime<Utc>,
    pub tool_version: String,
    pub decompiler: String,
    pub code_scan_cap: usize,
    pub package_listing_limit: usize,
    /// The input as given by the caller
    pub source: String,
    pub package_sha256: Option<String>,
    pub metadata: PackageMetadata,
    pub libraries: Vec<NativeLibraryRecord>,
    pub architectures: Vec<String>,
    pub sdks: Vec<DetectedSdk>,
    /// One record per requested keyword, in request order
    pub evidence: Vec<EvidenceRecord>,
    pub competitor_matches: Vec<CompetitorMatch>,
    pub competitors_checked: usize,
    pub merge: Option<MergeOutcome>,
    pub stages: Vec<StageStats>,
}

impl AnalysisReport {
    pub fn found(&self) -> impl Iterator<Item = &EvidenceRecord> {
        self.evidence.iter().filter(|r| r.found)
    }

    pub fn not_found(&self) -> impl Iterator<Item = &EvidenceRecord> {
        self.evidence.iter().filter(|r| !r.found)
    }

    pub fn any_found(&self) -> bool {
        self.evidence.iter().any(|r| r.found)
    }

    pub fn evidence_for(&self, keyword: &str) -> Option<&EvidenceRecord> {
        self.evidence.iter().find(|r| r.keyword == keyword)
    }
}

// ─── Engine ────────────────────────────────────────────────────────

pub struct Engine {
    config: ProbeConfig,
    decompiler: Box<dyn Decompiler>,
}

impl Engine {
    /// Engine with apktool at `config.decompiler`
    pub fn new(config: ProbeConfig) -> Self {
        let decompiler = Box::new(
            ApktoolDecompiler::new(config.decompiler.clone()).with_args(config.decompiler_args.clone()),
        );
        Self { config, decompiler }
    }

    pub fn with_decompiler(config: ProbeConfig, decompiler: Box<dyn Decompiler>) -> Self {
        Self { config, decompiler }
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Main entry point: resolve `input`, prepare both trees, analyze
    pub fn run(&self, input: &Path, mode: AnalysisMode) -> ProbeResult<AnalysisReport> {
        let start = Instant::now();
        tracing::info!("sdkprobe {} ({}): {}", env!("CARGO_PKG_VERSION"), mode.tag(), input.display());

        let kind = InputKind::detect(input)?;
        let report = match &kind {
            InputKind::DecompiledTree(dir) => {
                let mut ctx = AnalysisContext::new();
                self.analyze_into(&mut ctx, dir, dir, &mode)?;
                ctx.into_report(mode, input.display().to_string(), &self.config, "none (pre-decompiled)")
            }
            InputKind::Package(_) | InputKind::SplitContainer(_) => {
                self.decompiler.check()?;
                // Dropping the workspace removes every tree, on error paths too
                let ws = Workspace::create(self.config.keep_workdirs)?;
                let mut ctx = AnalysisContext::new();

                let package = match &kind {
                    InputKind::SplitContainer(container) => {
                        let t = Instant::now();
                        std::fs::create_dir_all(ws.scratch_dir())?;
                        let merged = ws.merged_package();
                        let outcome = SplitMerger::with_scratch_root(ws.scratch_dir()).merge(container, &merged)?;
                        ctx.stage("Reconstruct", t, outcome.entries_written);
                        ctx.merge = Some(outcome);
                        merged
                    }
                    _ => kind.path().to_path_buf(),
                };

                ctx.package_sha256 = match archive::sha256_file(&package) {
                    Ok(h) => Some(h),
                    Err(e) => {
                        tracing::warn!("Could not hash {}: {}", package.display(), e);
                        None
                    }
                };

                let t = Instant::now();
                let decompiled = ws.decompiled_dir();
                self.decompiler.decompile(&package, &decompiled)?;
                decompiler::verify_output(&decompiled)?;
                ctx.stage("Decompile", t, 1);

                let t = Instant::now();
                let raw = ws.raw_dir();
                let raw_files = ingest::extract_raw(&package, &raw)?;
                ctx.stage("Raw extraction", t, raw_files);

                self.analyze_into(&mut ctx, &decompiled, &raw, &mode)?;
                ctx.into_report(mode, input.display().to_string(), &self.config, self.decompiler.name())
            }
        };

        tracing::info!(
            "Analysis complete: {} librar(ies), {} SDK(s), {} keyword(s) found, {}ms",
            report.libraries.len(),
            report.sdks.len(),
            report.found().count(),
            start.elapsed().as_millis()
        );
        Ok(report)
    }

    /// Analyze an already prepared pair of trees. `raw` may equal
    /// `decompiled` when only one tree exists.
    pub fn analyze_trees(&self, decompiled: &Path, raw: &Path, mode: AnalysisMode) -> ProbeResult<AnalysisReport> {
        let mut ctx = AnalysisContext::new();
        self.analyze_into(&mut ctx, decompiled, raw, &mode)?;
        Ok(ctx.into_report(mode, decompiled.display().to_string(), &self.config, self.decompiler.name()))
    }

    fn analyze_into(
        &self,
        ctx: &mut AnalysisContext,
        decompiled: &Path,
        raw: &Path,
        mode: &AnalysisMode,
    ) -> ProbeResult<()> {
        if !decompiled.is_dir() {
            return Err(ProbeError::InvalidInput(format!(
                "Decompiled tree does not exist: {}",
                decompiled.display()
            )));
        }

        let t = Instant::now();
        let index = PackageIndex::build(decompiled, raw);
        ctx.stage("Index", t, index.total_files());

        let t = Instant::now();
        ctx.metadata = analysis::extract(&index);
        ctx.stage("Metadata", t, ctx.metadata.version_stamps.len());

        let t = Instant::now();
        let db = self
            .config
            .library_db
            .as_deref()
            .map(LibraryDb::load)
            .unwrap_or_default();
        ctx.libraries = detection::inventory_native_libraries(&index, &db);
        ctx.stage("Library inventory", t, ctx.libraries.len());

        let t = Instant::now();
        let competitors = self
            .config
            .competitor_list
            .as_deref()
            .map(CompetitorList::load)
            .unwrap_or_default();
        ctx.competitors_checked = competitors.names.len();
        let matcher = CompetitorMatcher::new(&competitors);
        if matcher.is_empty() {
            tracing::debug!("No competitor names configured; triage skipped");
        } else {
            ctx.competitor_matches = matcher.find_matches(&ctx.libraries);
        }
        ctx.stage("Competitor triage", t, ctx.competitor_matches.len());

        if let AnalysisMode::Detection { keywords } = mode {
            let t = Instant::now();
            let scan = pipeline::ScanContext::new(self.config.clone(), index);
            let probes = channels::build_probes();
            for keyword in keywords {
                let record = pipeline::scan_keyword(&probes, keyword, &scan);
                ctx.evidence.insert(keyword.clone(), record);
            }
            ctx.stage("Evidence scan", t, keywords.len());
        }
        Ok(())
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(ProbeConfig::default())
    }
}
