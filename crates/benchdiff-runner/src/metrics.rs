//! Metrics file handling.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use benchdiff_core::{BenchError, MetricSample};

/// Parse the metrics file written by the executable under test.
///
/// # Errors
///
/// - [`BenchError::MetricsMissing`] if the file does not exist
/// - [`BenchError::MetricsMalformed`] if it is unreadable or lacks a numeric `fps`
/// - [`BenchError::InvalidMetric`] if `fps` is negative
pub fn read_metrics(path: &Path) -> Result<MetricSample, BenchError> {
    let contents = match fs::read(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(BenchError::MetricsMissing {
                path: path.to_path_buf(),
            });
        }
        Err(err) => {
            return Err(BenchError::MetricsMalformed {
                path: path.to_path_buf(),
                message: err.to_string(),
            });
        }
    };

    let sample: MetricSample =
        serde_json::from_slice(&contents).map_err(|err| BenchError::MetricsMalformed {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;

    if !sample.fps.is_finite() || sample.fps < 0.0 {
        return Err(BenchError::InvalidMetric {
            path: path.to_path_buf(),
            fps: sample.fps,
        });
    }
    Ok(sample)
}

/// Remove a metrics file left by a previous invocation. Absence is not an
/// error.
pub fn clear_metrics(path: &Path) -> Result<(), BenchError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(BenchError::MetricsMalformed {
            path: path.to_path_buf(),
            message: format!("cannot remove stale metrics: {err}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_metrics_ok() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("benchmark_normal.json");
        fs::write(&path, "{\n    \"fps\": 58.25\n}").unwrap();

        let sample = read_metrics(&path).unwrap();
        assert!((sample.fps - 58.25).abs() < 1e-9);
    }

    #[test]
    fn test_read_metrics_integer_fps() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("m.json");
        fs::write(&path, r#"{"fps": 60}"#).unwrap();

        let sample = read_metrics(&path).unwrap();
        assert!((sample.fps - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_read_metrics_missing() {
        let dir = TempDir::new().unwrap();
        let err = read_metrics(&dir.path().join("absent.json")).err();
        assert!(matches!(err, Some(BenchError::MetricsMissing { .. })));
    }

    #[test]
    fn test_read_metrics_malformed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("m.json");

        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            read_metrics(&path),
            Err(BenchError::MetricsMalformed { .. })
        ));

        fs::write(&path, r#"{"frames": 10}"#).unwrap();
        assert!(matches!(
            read_metrics(&path),
            Err(BenchError::MetricsMalformed { .. })
        ));

        fs::write(&path, r#"{"fps": "fast"}"#).unwrap();
        assert!(matches!(
            read_metrics(&path),
            Err(BenchError::MetricsMalformed { .. })
        ));
    }

    #[test]
    fn test_read_metrics_negative_fps() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("m.json");
        fs::write(&path, r#"{"fps": -3.0}"#).unwrap();
        assert!(matches!(
            read_metrics(&path),
            Err(BenchError::InvalidMetric { .. })
        ));
    }

    #[test]
    fn test_clear_metrics_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("m.json");
        fs::write(&path, "{}").unwrap();

        clear_metrics(&path).unwrap();
        assert!(!path.exists());
        clear_metrics(&path).unwrap();
    }
}
