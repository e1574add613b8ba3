use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use log::{error, info};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::error::CrawlError;
use crate::models::ResultSet;
use crate::retry::Retry;

/// Writes the results as indented JSON, retrying failed writes. All
/// attempts failing is fatal to the run.
pub fn save_results(results: &ResultSet, path: &Path, attempts: u32) -> Result<(), CrawlError> {
    save_with(results, path, attempts, write_pretty)
}

fn save_with<W>(
    results: &ResultSet,
    path: &Path,
    attempts: u32,
    mut write: W,
) -> Result<(), CrawlError>
where
    W: FnMut(&ResultSet, &Path) -> io::Result<()>,
{
    let retry = Retry::new(attempts, "Saving to json file:");
    match retry.run(|_| write(results, path)) {
        Ok(()) => {
            info!("Successfully saved to {}", path.display());
            Ok(())
        }
        Err(source) => {
            error!("Error saving to json file, {}", source);
            Err(CrawlError::PersistenceError {
                path: path.to_path_buf(),
                source,
            })
        }
    }
}

fn write_pretty(results: &ResultSet, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(b"    "));
    results.serialize(&mut serializer)?;
    writer.flush()
}

#[cfg(test)]
pub fn load_results(path: &Path) -> Result<ResultSet, CrawlError> {
    let to_error = |source| CrawlError::PersistenceError {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(to_error)?;
    serde_json::from_reader(std::io::BufReader::new(file)).map_err(|e| to_error(e.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EmploymentType, JobDetail, JobRecord};
    use std::path::PathBuf;
    use url::Url;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("mchire-scrape-{}-{}.json", std::process::id(), name))
    }

    fn sample() -> ResultSet {
        let mut results = ResultSet::new();
        for (address, title, rate) in [
            ("100 Main St, Springfield", "Crew Member", "$15.00"),
            ("7 Elm Ave, Shelbyville", "Shift Manager", ""),
        ] {
            results.push(JobRecord::single(
                address.to_string(),
                JobDetail {
                    link: Url::parse("https://jobs.mchire.com/jobs/123").unwrap(),
                    title: title.to_string(),
                    description: "Serve guests with a smile".to_string(),
                    hourly_rate: rate.to_string(),
                    types: vec![EmploymentType::FullTime],
                },
            ));
        }
        results
    }

    #[test]
    fn test_saved_results_read_back_equal() {
        let path = scratch_path("roundtrip");
        let results = sample();

        save_results(&results, &path, 3).unwrap();
        let loaded = load_results(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, results);
    }

    #[test]
    fn test_output_is_four_space_indented_with_record_shape() {
        let path = scratch_path("shape");
        save_results(&sample(), &path, 3).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert!(text.starts_with("[\n    {\n        \"address\": \"100 Main St, Springfield\""));
        assert!(text.contains("\"jobLink\": \"https://jobs.mchire.com/jobs/123\""));
        assert!(text.contains("\"hourlyRate\": \"$15.00\""));
        assert!(text.contains("\"Full Time\""));
    }

    #[test]
    fn test_failed_write_is_retried_until_it_succeeds() {
        let path = scratch_path("retry");
        let mut calls = 0;
        let result = save_with(&sample(), &path, 3, |results, path| {
            calls += 1;
            if calls < 3 {
                Err(io::Error::new(io::ErrorKind::Other, "disk busy"))
            } else {
                write_pretty(results, path)
            }
        });
        let loaded = load_results(&path);
        std::fs::remove_file(&path).ok();

        assert!(result.is_ok());
        assert_eq!(calls, 3);
        assert_eq!(loaded.unwrap(), sample());
    }

    #[test]
    fn test_write_gives_up_after_three_attempts() {
        let path = scratch_path("give-up");
        let mut calls = 0;
        let result = save_with(&sample(), &path, 3, |_, _| {
            calls += 1;
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
        });

        assert_eq!(calls, 3);
        match result {
            Err(CrawlError::PersistenceError { path: failed, source }) => {
                assert_eq!(failed, path);
                assert_eq!(source.kind(), io::ErrorKind::PermissionDenied);
            }
            other => panic!("expected persistence error, got {:?}", other),
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_unwritable_path_is_a_persistence_error() {
        let path = std::env::temp_dir()
            .join("mchire-scrape-no-such-dir")
            .join("nested")
            .join("out.json");
        let err = save_results(&sample(), &path, 3).unwrap_err();
        assert!(matches!(err, CrawlError::PersistenceError { .. }));
    }
}
