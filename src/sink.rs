//! Success/failure CSV partitions.
//!
//! [`ResultSink`] owns both writers and appends exactly one row per
//! [`Outcome`] to the matching file. It is not synchronised: only the
//! dispatcher's draining callback may call it.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::dispatch::Outcome;
use crate::error::NoteDispatchError;

pub const SUCCESS_HEADER: [&str; 4] = ["ExternalMemberID", "httpStatus", "elapsed_ms", "returnedId"];
pub const FAILURE_HEADER: [&str; 4] = ["ExternalMemberID", "httpStatus", "elapsed_ms", "error"];

pub struct ResultSink<W: Write> {
    success: csv::Writer<W>,
    failure: csv::Writer<W>,
}

impl ResultSink<File> {
    /// Create (truncate) both output files, making parent directories as
    /// needed, and write their headers.
    pub fn create(success_path: &Path, failure_path: &Path) -> Result<Self, NoteDispatchError> {
        let success = open_output(success_path)?;
        let failure = open_output(failure_path)?;
        Self::from_writers(success, failure).map_err(NoteDispatchError::from)
    }
}

fn open_output(path: &Path) -> Result<File, NoteDispatchError> {
    let to_error = |source| NoteDispatchError::OutputCreate {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(to_error)?;
    }
    File::create(path).map_err(to_error)
}

impl<W: Write> ResultSink<W> {
    pub fn from_writers(success: W, failure: W) -> Result<Self, csv::Error> {
        let mut success = csv::Writer::from_writer(success);
        let mut failure = csv::Writer::from_writer(failure);
        success.write_record(SUCCESS_HEADER)?;
        failure.write_record(FAILURE_HEADER)?;
        Ok(Self { success, failure })
    }

    pub fn record(&mut self, outcome: &Outcome) -> Result<(), csv::Error> {
        let status = outcome.status.map(|s| s.to_string()).unwrap_or_default();
        let elapsed = outcome.elapsed_ms.map(|ms| ms.to_string()).unwrap_or_default();
        if outcome.ok {
            self.success.write_record([
                outcome.external_id.as_str(),
                status.as_str(),
                elapsed.as_str(),
                outcome.returned_id.as_str(),
            ])
        } else {
            self.failure.write_record([
                outcome.external_id.as_str(),
                status.as_str(),
                elapsed.as_str(),
                outcome.error.as_str(),
            ])
        }
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.success.flush()?;
        self.failure.flush()
    }

    /// Flush and hand back the underlying writers.
    pub fn finish(self) -> Result<(W, W), NoteDispatchError> {
        let success = self.success.into_inner().map_err(flush_error)?;
        let failure = self.failure.into_inner().map_err(flush_error)?;
        Ok((success, failure))
    }
}

fn flush_error<W: Write>(e: csv::IntoInnerError<csv::Writer<W>>) -> NoteDispatchError {
    NoteDispatchError::Io(std::io::Error::new(e.error().kind(), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finish(sink: ResultSink<Vec<u8>>) -> (String, String) {
        let (ok, failed) = sink.finish().unwrap();
        (String::from_utf8(ok).unwrap(), String::from_utf8(failed).unwrap())
    }

    #[test]
    fn headers_written_on_creation() {
        let sink = ResultSink::from_writers(Vec::new(), Vec::new()).unwrap();
        let (ok, failed) = finish(sink);
        assert_eq!(ok, "ExternalMemberID,httpStatus,elapsed_ms,returnedId\n");
        assert_eq!(failed, "ExternalMemberID,httpStatus,elapsed_ms,error\n");
    }

    #[test]
    fn outcomes_are_partitioned() {
        let mut sink = ResultSink::from_writers(Vec::new(), Vec::new()).unwrap();
        sink.record(&Outcome::success("EXT1", 200, 12, "R1".into())).unwrap();
        sink.record(&Outcome::failure(
            "EXT2",
            Some(404),
            Some(8),
            String::new(),
            "HTTP 404 body=missing".into(),
        ))
        .unwrap();

        let (ok, failed) = finish(sink);
        assert_eq!(ok.lines().collect::<Vec<_>>(), vec![
            "ExternalMemberID,httpStatus,elapsed_ms,returnedId",
            "EXT1,200,12,R1",
        ]);
        assert_eq!(failed.lines().collect::<Vec<_>>(), vec![
            "ExternalMemberID,httpStatus,elapsed_ms,error",
            "EXT2,404,8,HTTP 404 body=missing",
        ]);
    }

    #[test]
    fn missing_status_and_elapsed_are_empty_cells() {
        let mut sink = ResultSink::from_writers(Vec::new(), Vec::new()).unwrap();
        sink.record(&Outcome::failure(
            "EXT3",
            None,
            None,
            String::new(),
            "timeout: no response within 60s".into(),
        ))
        .unwrap();
        let (_, failed) = finish(sink);
        assert_eq!(failed.lines().nth(1), Some("EXT3,,,timeout: no response within 60s"));
    }

    #[test]
    fn error_text_with_commas_is_quoted() {
        let mut sink = ResultSink::from_writers(Vec::new(), Vec::new()).unwrap();
        sink.record(&Outcome::failure(
            "EXT4",
            Some(400),
            Some(3),
            String::new(),
            r#"HTTP 400 body={"a":1,"b":2}"#.into(),
        ))
        .unwrap();
        let (_, failed) = finish(sink);
        assert_eq!(
            failed.lines().nth(1),
            Some(r#"EXT4,400,3,"HTTP 400 body={""a"":1,""b"":2}""#)
        );
    }

    #[test]
    fn create_makes_parent_directories() {
        let root = std::env::temp_dir().join(format!("note-dispatch-sink-{}", uuid::Uuid::new_v4()));
        let ok_path = root.join("out/ok.csv");
        let failed_path = root.join("out/nested/failed.csv");
        let sink = ResultSink::create(&ok_path, &failed_path).unwrap();
        sink.finish().unwrap();
        assert!(ok_path.exists());
        assert!(failed_path.exists());
        let _ = std::fs::remove_dir_all(&root);
    }
}
