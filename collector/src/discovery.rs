//! Benchmark discovery
//!
//! A benchmark of suite `s` is a directory `root/s/<name>` that contains the
//! configured executable artifact. Only benchmarks present in every suite are
//! measured.

use crate::config::Config;
use crate::error::{MeasureError, Result};
use kerntime_shared::types::record::{Benchmark, BenchmarkId};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info};

/// Benchmarks of one suite directory
pub fn suite_benchmarks(suite_dir: &Path, artifact: &str) -> Result<BTreeSet<String>> {
    let entries = std::fs::read_dir(suite_dir).map_err(|e| MeasureError::io(suite_dir, e))?;

    let mut benchmarks = BTreeSet::new();
    for entry in entries {
        let entry = entry.map_err(|e| MeasureError::io(suite_dir, e))?;
        let path = entry.path();
        if !path.is_dir() || !path.join(artifact).is_file() {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            benchmarks.insert(name.to_string());
        }
    }

    debug!(
        "{}: {} benchmarks with {:?}",
        suite_dir.display(),
        benchmarks.len(),
        artifact
    );
    Ok(benchmarks)
}

/// Sorted intersection of the benchmarks of every configured suite
pub fn common_benchmarks(config: &Config) -> Result<Vec<String>> {
    let mut common: Option<BTreeSet<String>> = None;

    for suite in &config.suites {
        let found = suite_benchmarks(&config.suite_dir(suite), &config.profiler.artifact)?;
        common = Some(match common {
            None => found,
            Some(acc) => acc.intersection(&found).cloned().collect(),
        });
    }

    let common: Vec<String> = common.unwrap_or_default().into_iter().collect();
    info!(
        "Found {} benchmarks common to {} suites",
        common.len(),
        config.suites.len()
    );
    debug!("Common benchmarks: {:?}", common);
    Ok(common)
}

/// Every (suite, common benchmark) pair, suite by suite in configured order
pub fn corpus(config: &Config) -> Result<Vec<Benchmark>> {
    let common = common_benchmarks(config)?;

    let mut benchmarks = Vec::with_capacity(common.len() * config.suites.len());
    for suite in &config.suites {
        for name in &common {
            let id = BenchmarkId::new(suite.as_str(), name.as_str());
            let dir = config.benchmark_dir(&id);
            benchmarks.push(Benchmark::new(id, dir));
        }
    }
    Ok(benchmarks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn bench(root: &Path, suite: &str, name: &str, artifact: Option<&str>) {
        let dir = root.join(suite).join(name);
        std::fs::create_dir_all(&dir).unwrap();
        if let Some(artifact) = artifact {
            std::fs::write(dir.join(artifact), "").unwrap();
        }
    }

    fn config(root: PathBuf, suites: &[&str]) -> Config {
        Config {
            root,
            suites: suites.iter().map(|s| s.to_string()).collect(),
            ..Config::default()
        }
    }

    #[test]
    fn test_intersection_across_suites() {
        let tmp = tempfile::tempdir().unwrap();
        bench(tmp.path(), "cuda", "bfs", Some("run"));
        bench(tmp.path(), "cuda", "nw", Some("run"));
        bench(tmp.path(), "julia", "bfs", Some("run"));
        bench(tmp.path(), "julia", "lud", Some("run"));

        let common = common_benchmarks(&config(tmp.path().to_path_buf(), &["cuda", "julia"])).unwrap();
        assert_eq!(common, ["bfs"]);
    }

    #[test]
    fn test_directory_without_artifact_is_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        bench(tmp.path(), "cuda", "bfs", Some("run"));
        bench(tmp.path(), "cuda", "hotspot", None);
        bench(tmp.path(), "cuda", "nw", Some("Makefile"));
        std::fs::write(tmp.path().join("cuda").join("README"), "").unwrap();

        let found = suite_benchmarks(&tmp.path().join("cuda"), "run").unwrap();
        assert_eq!(found.into_iter().collect::<Vec<_>>(), ["bfs"]);
    }

    #[test]
    fn test_sorted_output() {
        let tmp = tempfile::tempdir().unwrap();
        for name in ["srad", "bfs", "nw"] {
            bench(tmp.path(), "cuda", name, Some("run"));
        }

        let common = common_benchmarks(&config(tmp.path().to_path_buf(), &["cuda"])).unwrap();
        assert_eq!(common, ["bfs", "nw", "srad"]);
    }

    #[test]
    fn test_corpus_is_suite_major() {
        let tmp = tempfile::tempdir().unwrap();
        for suite in ["julia", "cuda"] {
            bench(tmp.path(), suite, "nw", Some("run"));
            bench(tmp.path(), suite, "bfs", Some("run"));
        }

        let benchmarks = corpus(&config(tmp.path().to_path_buf(), &["julia", "cuda"])).unwrap();
        let ids: Vec<_> = benchmarks.iter().map(|b| b.id.to_string()).collect();

        assert_eq!(ids, ["julia/bfs", "julia/nw", "cuda/bfs", "cuda/nw"]);
        assert_eq!(benchmarks[3].dir(), tmp.path().join("cuda").join("nw"));
    }

    #[test]
    fn test_missing_suite_directory_is_error() {
        let tmp = tempfile::tempdir().unwrap();
        bench(tmp.path(), "cuda", "bfs", Some("run"));

        let result = common_benchmarks(&config(tmp.path().to_path_buf(), &["cuda", "opencl"]));
        assert!(matches!(result, Err(MeasureError::Io { .. })));
    }
}
