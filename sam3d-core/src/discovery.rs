//! Checkpoint discovery: layout probing and tree size accounting.
//!
//! [`discover`] is a pure function of the filesystem at call time. Nothing is
//! cached, so callers re-probe whenever they need a fresh answer (for example
//! after a download completes).

use crate::error::ResolveError;
use crate::layout::{
    CANONICAL_WEIGHT_FILE, CONFIG_FILE, LayoutFormat, PIPELINE_FILE, STRUCTURED_DIR, WeightKind,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Directory expected to hold checkpoints. It need not exist.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CheckpointRoot(PathBuf);

impl CheckpointRoot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Location of the structured layout.
    pub fn hf_dir(&self) -> PathBuf {
        self.0.join(STRUCTURED_DIR)
    }

    /// Whether the root exists as a directory.
    ///
    /// A root that cannot be stat'ed for any reason other than being absent is an
    /// access error, not a missing directory.
    pub fn exists(&self) -> Result<bool, ResolveError> {
        is_dir(&self.0)
    }
}

impl From<PathBuf> for CheckpointRoot {
    fn from(path: PathBuf) -> Self {
        Self(path)
    }
}

impl From<&Path> for CheckpointRoot {
    fn from(path: &Path) -> Self {
        Self(path.to_path_buf())
    }
}

impl From<&str> for CheckpointRoot {
    fn from(path: &str) -> Self {
        Self(PathBuf::from(path))
    }
}

impl AsRef<Path> for CheckpointRoot {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

/// A file found on disk together with its size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: PathBuf,
    pub size_bytes: u64,
}

impl FileEntry {
    fn stat(path: PathBuf) -> Result<Self, ResolveError> {
        let size_bytes = fs::metadata(&path)
            .map_err(|e| ResolveError::access(&path, e))?
            .len();
        Ok(Self { path, size_bytes })
    }
}

/// Knobs for [`discover_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryOptions {
    /// Walk the whole tree to accumulate `total_size`. Format detection does not need it.
    pub measure_size: bool,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self { measure_size: true }
    }
}

/// Overall outcome of a discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// A layout matched and nothing required is missing.
    Pass,
    /// The structured layout was partially present.
    MissingFiles,
    /// The directory exists but no layout could be recognized.
    Unrecognized,
    /// The checkpoint directory does not exist.
    RootMissing,
}

impl Verdict {
    pub fn is_pass(self) -> bool {
        self == Self::Pass
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Pass => "all required files are present",
            Self::MissingFiles => "required files are missing",
            Self::Unrecognized => "no recognizable checkpoint layout",
            Self::RootMissing => "checkpoint directory does not exist",
        };
        f.write_str(text)
    }
}

/// Result of a single [`discover`] call. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveryResult {
    root: PathBuf,
    root_exists: bool,
    format: LayoutFormat,
    present: Vec<FileEntry>,
    missing: Vec<PathBuf>,
    total_size: u64,
    size_measured: bool,
}

impl DiscoveryResult {
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn root_exists(&self) -> bool {
        self.root_exists
    }

    pub fn format(&self) -> &LayoutFormat {
        &self.format
    }

    /// Files that make up the matched layout, in discovery order.
    pub fn present(&self) -> &[FileEntry] {
        &self.present
    }

    /// Required files that were looked for and not found.
    pub fn missing(&self) -> &[PathBuf] {
        &self.missing
    }

    /// Sum of all regular file sizes under the root, in bytes. Zero when not measured.
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn size_measured(&self) -> bool {
        self.size_measured
    }

    pub fn verdict(&self) -> Verdict {
        if !self.root_exists {
            Verdict::RootMissing
        } else if !self.missing.is_empty() {
            Verdict::MissingFiles
        } else if self.present.is_empty() {
            Verdict::Unrecognized
        } else {
            Verdict::Pass
        }
    }

    /// `missing` is empty and `present` is not.
    pub fn pass(&self) -> bool {
        self.verdict().is_pass()
    }
}

/// Probe `root` for a checkpoint layout, measuring the tree size.
pub fn discover(root: &CheckpointRoot) -> Result<DiscoveryResult, ResolveError> {
    discover_with(root, &DiscoveryOptions::default())
}

/// Probe `root` for a checkpoint layout.
///
/// The structured layout is tried first, then the flat one. A missing root or an
/// unrecognized directory is a normal `NotFound` result; only unreadable
/// directories produce an error.
pub fn discover_with(
    root: &CheckpointRoot,
    options: &DiscoveryOptions,
) -> Result<DiscoveryResult, ResolveError> {
    let path = root.path();
    if !root.exists()? {
        debug!(root = %path.display(), "checkpoint root is not a directory");
        return Ok(DiscoveryResult {
            root: path.to_path_buf(),
            root_exists: false,
            format: LayoutFormat::NotFound,
            present: Vec::new(),
            missing: Vec::new(),
            total_size: 0,
            size_measured: options.measure_size,
        });
    }

    let structured = match StructuredProbe::run(&root.hf_dir())? {
        Some(probe) => probe.into_match().map_err(Some),
        None => Err(None),
    };
    let (format, present, missing) = match structured {
        Ok(matched) => {
            debug!(root = %path.display(), "matched structured layout");
            matched
        }
        Err(probe) => {
            let weights = probe_flat(path)?;
            match weights.first() {
                Some(first) => {
                    debug!(
                        root = %path.display(),
                        weights = weights.len(),
                        "matched flat layout"
                    );
                    let format = LayoutFormat::Flat {
                        weight_file: first.path.clone(),
                    };
                    (format, weights, Vec::new())
                }
                None => {
                    let missing = probe.map(|p| p.missing()).unwrap_or_default();
                    debug!(
                        root = %path.display(),
                        missing = missing.len(),
                        "no checkpoint layout matched"
                    );
                    (LayoutFormat::NotFound, Vec::new(), missing)
                }
            }
        }
    };

    let total_size = if options.measure_size {
        summarize_tree(path, 0)?.total_size
    } else {
        0
    };

    Ok(DiscoveryResult {
        root: path.to_path_buf(),
        root_exists: true,
        format,
        present,
        missing,
        total_size,
        size_measured: options.measure_size,
    })
}

/// What the structured layout looks like on disk.
struct StructuredProbe {
    hf_dir: PathBuf,
    pipeline: Option<FileEntry>,
    config: Option<FileEntry>,
    weight: Option<FileEntry>,
}

impl StructuredProbe {
    /// `None` when there is no structured directory to probe.
    fn run(hf_dir: &Path) -> Result<Option<Self>, ResolveError> {
        if !is_dir(hf_dir)? {
            return Ok(None);
        }

        let files = list_files(hf_dir)?;
        let weight = select_weight(&files)
            .map(|p| FileEntry::stat(p.clone()))
            .transpose()?;

        Ok(Some(Self {
            hf_dir: hf_dir.to_path_buf(),
            pipeline: named_file(hf_dir, PIPELINE_FILE)?,
            config: named_file(hf_dir, CONFIG_FILE)?,
            weight,
        }))
    }

    /// The matched layout, or the probe back when pipeline or weight is absent.
    fn into_match(self) -> Result<(LayoutFormat, Vec<FileEntry>, Vec<PathBuf>), Self> {
        match self {
            Self {
                pipeline: Some(pipeline),
                config,
                weight: Some(weight),
                ..
            } => {
                let format = LayoutFormat::Structured {
                    pipeline_file: pipeline.path.clone(),
                    config_file: config.as_ref().map(|c| c.path.clone()),
                    weight_file: weight.path.clone(),
                };
                let mut present = vec![pipeline];
                present.extend(config);
                present.push(weight);
                Ok((format, present, Vec::new()))
            }
            probe => Err(probe),
        }
    }

    fn missing(&self) -> Vec<PathBuf> {
        let mut missing = Vec::new();
        if self.pipeline.is_none() {
            missing.push(self.hf_dir.join(PIPELINE_FILE));
        }
        if self.config.is_none() {
            missing.push(self.hf_dir.join(CONFIG_FILE));
        }
        if self.weight.is_none() {
            missing.push(self.hf_dir.join(CANONICAL_WEIGHT_FILE));
        }
        missing
    }
}

fn named_file(dir: &Path, name: &str) -> Result<Option<FileEntry>, ResolveError> {
    let path = dir.join(name);
    if is_file(&path)? {
        FileEntry::stat(path).map(Some)
    } else {
        Ok(None)
    }
}

/// First weight file by extension preference, then by name.
fn select_weight(files: &[PathBuf]) -> Option<&PathBuf> {
    WeightKind::PREFERENCE.iter().find_map(|kind| {
        files
            .iter()
            .find(|p| WeightKind::from_path(p) == Some(*kind))
    })
}

fn probe_flat(root: &Path) -> Result<Vec<FileEntry>, ResolveError> {
    list_files(root)?
        .into_iter()
        .filter(|p| WeightKind::from_path(p) == Some(WeightKind::FLAT))
        .map(FileEntry::stat)
        .collect()
}

/// Regular files directly inside `dir`, sorted by name, one entry per resolved path.
fn list_files(dir: &Path) -> Result<Vec<PathBuf>, ResolveError> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| ResolveError::access(dir, e))? {
        let entry = entry.map_err(|e| ResolveError::access(dir, e))?;
        paths.push(entry.path());
    }
    paths.sort();

    let mut seen = HashSet::new();
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        if !is_file(&path)? {
            continue;
        }
        if seen.insert(resolve(&path)) {
            files.push(path);
        } else {
            debug!(path = %path.display(), "skipping duplicate of an earlier file");
        }
    }
    Ok(files)
}

/// `stat` following symlinks. An absent path, a dangling link, or a path below a
/// non-directory is `None`; every other failure is an access error.
fn metadata(path: &Path) -> Result<Option<fs::Metadata>, ResolveError> {
    match fs::metadata(path) {
        Ok(meta) => Ok(Some(meta)),
        Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory) => {
            Ok(None)
        }
        Err(e) => Err(ResolveError::access(path, e)),
    }
}

fn is_dir(path: &Path) -> Result<bool, ResolveError> {
    Ok(metadata(path)?.is_some_and(|m| m.is_dir()))
}

fn is_file(path: &Path) -> Result<bool, ResolveError> {
    Ok(metadata(path)?.is_some_and(|m| m.is_file()))
}

/// Identity used for deduplication.
fn resolve(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Aggregate view of every regular file under a directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeSummary {
    pub root: PathBuf,
    pub exists: bool,
    pub file_count: usize,
    pub total_size: u64,
    /// The first files in traversal order, up to the requested limit.
    pub sample: Vec<FileEntry>,
}

/// Walk `root` recursively in name order.
///
/// Symlinks to files are counted at their target's size, once per resolved file.
/// Symlinked directories are not descended into and dangling links are skipped.
/// A missing root yields an empty summary with `exists == false`.
pub fn summarize_tree(root: &Path, sample_limit: usize) -> Result<TreeSummary, ResolveError> {
    let mut summary = TreeSummary {
        root: root.to_path_buf(),
        exists: is_dir(root)?,
        file_count: 0,
        total_size: 0,
        sample: Vec::new(),
    };
    if !summary.exists {
        return Ok(summary);
    }

    let mut seen = HashSet::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        let size_bytes = if entry.file_type().is_file() {
            entry.metadata()?.len()
        } else if entry.path_is_symlink() {
            match metadata(entry.path())? {
                Some(meta) if meta.is_file() => meta.len(),
                _ => continue,
            }
        } else {
            continue;
        };
        if !seen.insert(resolve(entry.path())) {
            debug!(path = %entry.path().display(), "already counted through another path");
            continue;
        }
        summary.file_count += 1;
        summary.total_size += size_bytes;
        if summary.sample.len() < sample_limit {
            summary.sample.push(FileEntry {
                path: entry.into_path(),
                size_bytes,
            });
        }
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str, len: usize) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, vec![0u8; len]).unwrap();
        path
    }

    #[test]
    fn test_select_weight_prefers_extension_over_name() {
        let files = vec![
            PathBuf::from("hf/a.pth"),
            PathBuf::from("hf/b.bin"),
            PathBuf::from("hf/z.safetensors"),
        ];
        assert_eq!(
            select_weight(&files),
            Some(&PathBuf::from("hf/z.safetensors"))
        );

        let files = vec![PathBuf::from("hf/a.pth"), PathBuf::from("hf/b.bin")];
        assert_eq!(select_weight(&files), Some(&PathBuf::from("hf/b.bin")));

        let files = vec![PathBuf::from("hf/pipeline.yaml")];
        assert_eq!(select_weight(&files), None);
    }

    #[test]
    fn test_list_files_sorted_and_skips_dirs() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "c.pth", 1);
        touch(dir.path(), "a.pth", 1);
        touch(dir.path(), "b.txt", 1);
        fs::create_dir(dir.path().join("nested.pth")).unwrap();

        let names: Vec<_> = list_files(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.pth", "b.txt", "c.pth"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_list_files_dedups_symlinks() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a.pth", 4);
        std::os::unix::fs::symlink(dir.path().join("a.pth"), dir.path().join("b.pth")).unwrap();

        let files = list_files(dir.path()).unwrap();
        assert_eq!(files, vec![dir.path().join("a.pth")]);
    }

    #[test]
    fn test_list_files_missing_dir_is_access_error() {
        let dir = TempDir::new().unwrap();
        let err = list_files(&dir.path().join("absent")).unwrap_err();
        assert!(err.is_access());
    }

    #[test]
    fn test_metadata_treats_absent_paths_as_none() {
        let dir = TempDir::new().unwrap();
        let file = touch(dir.path(), "weights.pth", 1);

        assert!(metadata(&dir.path().join("absent")).unwrap().is_none());
        // A path below a regular file fails with ENOTDIR.
        assert!(metadata(&file.join("child")).unwrap().is_none());
        assert!(is_file(&file).unwrap());
        assert!(!is_dir(&file).unwrap());
        assert!(is_dir(dir.path()).unwrap());
    }

    #[test]
    fn test_metadata_error_is_access_error() {
        // The OS rejects the name outright, which is neither absent nor present.
        let err = metadata(Path::new("checkpoints\0hf")).unwrap_err();
        assert!(err.is_access(), "unexpected error: {err}");
        assert!(is_dir(Path::new("checkpoints\0hf")).unwrap_err().is_access());
        assert!(
            CheckpointRoot::new("checkpoints\0hf")
                .exists()
                .unwrap_err()
                .is_access()
        );
    }

    #[test]
    fn test_structured_probe_missing_lists_absent_files() {
        let dir = TempDir::new().unwrap();
        let hf = dir.path().join("hf");
        touch(&hf, "config.json", 2);

        let probe = StructuredProbe::run(&hf).unwrap().unwrap();
        let Err(probe) = probe.into_match() else {
            panic!("config alone must not match");
        };
        assert_eq!(
            probe.missing(),
            vec![hf.join("pipeline.yaml"), hf.join("model.safetensors")]
        );
    }

    #[test]
    fn test_structured_probe_absent_dir() {
        let dir = TempDir::new().unwrap();
        assert!(StructuredProbe::run(&dir.path().join("hf")).unwrap().is_none());
    }

    #[test]
    fn test_summarize_tree_sample_limit() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "b.bin", 10);
        touch(dir.path(), "a.pth", 5);
        touch(dir.path(), "sub/c.json", 7);

        let summary = summarize_tree(dir.path(), 2).unwrap();
        assert!(summary.exists);
        assert_eq!(summary.file_count, 3);
        assert_eq!(summary.total_size, 22);
        assert_eq!(summary.sample.len(), 2);
        assert_eq!(summary.sample[0].path, dir.path().join("a.pth"));
        assert_eq!(summary.sample[0].size_bytes, 5);
    }

    #[cfg(unix)]
    #[test]
    fn test_summarize_tree_follows_file_links_only() {
        let dir = TempDir::new().unwrap();
        let store = TempDir::new().unwrap();
        let blob = touch(store.path(), "blob", 64);
        touch(store.path(), "shared/inner.bin", 8);
        touch(dir.path(), "a.pth", 5);

        std::os::unix::fs::symlink(&blob, dir.path().join("linked.safetensors")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("a.pth"), dir.path().join("b.pth")).unwrap();
        std::os::unix::fs::symlink(store.path().join("shared"), dir.path().join("shared")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("gone"), dir.path().join("dangling")).unwrap();

        let summary = summarize_tree(dir.path(), 10).unwrap();
        assert_eq!(summary.file_count, 2);
        assert_eq!(summary.total_size, 69);
        assert_eq!(
            summary.sample,
            vec![
                FileEntry {
                    path: dir.path().join("a.pth"),
                    size_bytes: 5,
                },
                FileEntry {
                    path: dir.path().join("linked.safetensors"),
                    size_bytes: 64,
                },
            ]
        );
    }

    #[test]
    fn test_summarize_tree_unreachable_root_is_access_error() {
        let err = summarize_tree(Path::new("checkpoints\0"), 3).unwrap_err();
        assert!(err.is_access(), "unexpected error: {err}");
    }

    #[test]
    fn test_summarize_tree_missing_root() {
        let dir = TempDir::new().unwrap();
        let summary = summarize_tree(&dir.path().join("nope"), 3).unwrap();
        assert!(!summary.exists);
        assert_eq!(summary.file_count, 0);
        assert!(summary.sample.is_empty());
    }

    #[test]
    fn test_verdict_variants() {
        let base = DiscoveryResult {
            root: PathBuf::from("ckpt"),
            root_exists: true,
            format: LayoutFormat::NotFound,
            present: Vec::new(),
            missing: Vec::new(),
            total_size: 0,
            size_measured: true,
        };
        assert_eq!(base.verdict(), Verdict::Unrecognized);

        let absent = DiscoveryResult {
            root_exists: false,
            ..base.clone()
        };
        assert_eq!(absent.verdict(), Verdict::RootMissing);

        let partial = DiscoveryResult {
            missing: vec![PathBuf::from("ckpt/hf/pipeline.yaml")],
            ..base.clone()
        };
        assert_eq!(partial.verdict(), Verdict::MissingFiles);
        assert!(!partial.pass());

        let found = DiscoveryResult {
            format: LayoutFormat::Flat {
                weight_file: PathBuf::from("ckpt/a.pth"),
            },
            present: vec![FileEntry {
                path: PathBuf::from("ckpt/a.pth"),
                size_bytes: 1,
            }],
            ..base
        };
        assert!(found.pass());
    }
}
