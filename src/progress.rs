//Cmpe
//Copyright (C) 2024 The cmpe developers
//
//This program is free software: you can redistribute it and/or modify
//it under the terms of the GNU Affero General Public License as published by
//the Free Software Foundation, either version 3 of the License, or
//(at your option) any later version.
//
//This program is distributed in the hope that it will be useful,
//but WITHOUT ANY WARRANTY; without even the implied warranty of
//MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//GNU Affero General Public License for more details.
//
//You should have received a copy of the GNU Affero General Public License
//along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Progress reporting of the anytime search. At regular intervals, the search emits the best
//! objective value known so far. The records are written as CSV lines
//! `threshold,width,best,elapsed` (elapsed in seconds).

use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressRecord {
    pub threshold: f64,
    pub width: usize,
    pub best_objective: f64,
    pub elapsed: Duration,
}

impl fmt::Display for ProgressRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{},{},{},{:.3}", self.threshold, self.width, self.best_objective, self.elapsed.as_secs_f64())
    }
}

/// Destination of the progress records
pub trait ProgressSink {
    fn record(&mut self, record: &ProgressRecord) -> io::Result<()>;
}

/// Discards every record
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn record(&mut self, _record: &ProgressRecord) -> io::Result<()> {
        Ok(())
    }
}

/// Keeps the records in memory
impl ProgressSink for Vec<ProgressRecord> {
    fn record(&mut self, record: &ProgressRecord) -> io::Result<()> {
        self.push(record.clone());
        Ok(())
    }
}

/// Writes the records as CSV lines, flushing after each one so that the file can be followed
/// while the search runs
pub struct CsvProgress<W: Write> {
    writer: W,
}

impl<W: Write> CsvProgress<W> {

    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl CsvProgress<BufWriter<File>> {

    pub fn create(path: &Path) -> io::Result<Self> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }

    /// Creates a file named after the current local time in the given folder
    pub fn timestamped(folder: &Path) -> io::Result<(Self, PathBuf)> {
        let path = folder.join(format!("progress_{}.csv", chrono::Local::now().format("%Y%m%d-%H%M%S")));
        let sink = Self::create(&path)?;
        Ok((sink, path))
    }
}

impl<W: Write> ProgressSink for CsvProgress<W> {
    fn record(&mut self, record: &ProgressRecord) -> io::Result<()> {
        writeln!(self.writer, "{}", record)?;
        self.writer.flush()
    }
}

#[cfg(test)]
mod test_progress {
    use super::*;

    #[test]
    pub fn csv_lines() {
        let mut sink = CsvProgress::new(Vec::<u8>::new());
        sink.record(&ProgressRecord { threshold: -2.5, width: 3, best_objective: -1.25, elapsed: Duration::from_millis(2250) }).unwrap();
        sink.record(&ProgressRecord { threshold: -2.5, width: 5, best_objective: f64::NEG_INFINITY, elapsed: Duration::from_secs(4) }).unwrap();
        let output = String::from_utf8(sink.writer).unwrap();
        assert_eq!("-2.5,3,-1.25,2.250\n-2.5,5,-inf,4.000\n", output);
    }

    #[test]
    pub fn timestamped_file_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let (mut sink, path) = CsvProgress::timestamped(dir.path()).unwrap();
        sink.record(&ProgressRecord { threshold: 0.0, width: 1, best_objective: 0.5, elapsed: Duration::ZERO }).unwrap();
        let name = path.file_name().unwrap().to_str().unwrap().to_string();
        assert!(name.starts_with("progress_") && name.ends_with(".csv"));
        assert_eq!("0,1,0.5,0.000\n", std::fs::read_to_string(&path).unwrap());
    }
}
