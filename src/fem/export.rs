use super::PrimaryField;
use crate::base::TimeStep;
use crate::StrError;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

/// Defines the default output directory
pub const DEFAULT_OUT_DIR: &str = "/tmp/fmsim/results";

/// Defines the output directory used by tests
pub const DEFAULT_TEST_DIR: &str = "/tmp/fmsim/test";

/// Defines the interface of output (export) managers
pub trait ExportModule {
    /// Prepares the output (called at the beginning and after remeshing)
    fn initialize(&mut self) -> Result<(), StrError>;

    /// Writes the results of a (converged) step
    fn do_output(&mut self, step: &TimeStep, field: &PrimaryField) -> Result<(), StrError>;
}

/// Writes one JSON file per step with the primary field and a summary file
///
/// The files are:
///
/// ```text
/// {output_dir}/{filename_stem}-summary.json
/// {output_dir}/{filename_stem}-00000000000000000000.json
/// {output_dir}/{filename_stem}-00000000000000000001.json
/// ...
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JsonExport {
    /// Defines the output directory
    output_dir: String,

    /// Defines the filename stem
    filename_stem: String,

    /// Holds the count of files written
    output_count: usize,

    /// Holds the indices of the output files
    pub indices: Vec<usize>,

    /// Holds the step numbers corresponding to each output file
    pub steps: Vec<i64>,

    /// Holds the simulation times corresponding to each output file
    pub times: Vec<f64>,
}

impl JsonExport {
    /// Allocates a new instance
    ///
    /// # Input
    ///
    /// * `filename_stem` -- the last part of the filename without extension, e.g., "my_simulation"
    /// * `output_directory` -- the directory to save the output files.
    ///   None means that the default directory will be used; see [DEFAULT_OUT_DIR]
    pub fn new(filename_stem: &str, output_directory: Option<&str>) -> Self {
        JsonExport {
            output_dir: output_directory.unwrap_or(DEFAULT_OUT_DIR).to_string(),
            filename_stem: filename_stem.to_string(),
            output_count: 0,
            indices: Vec::new(),
            steps: Vec::new(),
            times: Vec::new(),
        }
    }

    /// Generates the filename path for the summary file
    pub fn path_summary(&self) -> String {
        format!("{}/{}-summary.json", self.output_dir, self.filename_stem)
    }

    /// Generates the filename path for the state files
    pub fn path_state(&self, index: usize) -> String {
        format!("{}/{}-{:0>20}.json", self.output_dir, self.filename_stem, index)
    }

    /// Reads a JSON file containing this struct
    pub fn read_json<P>(full_path: &P) -> Result<Self, StrError>
    where
        P: AsRef<OsStr> + ?Sized,
    {
        read_json_file(full_path)
    }

    /// Reads a JSON file containing a primary field
    pub fn read_field<P>(full_path: &P) -> Result<PrimaryField, StrError>
    where
        P: AsRef<OsStr> + ?Sized,
    {
        read_json_file(full_path)
    }
}

impl ExportModule for JsonExport {
    fn initialize(&mut self) -> Result<(), StrError> {
        fs::create_dir_all(&self.output_dir).map_err(|_| "cannot create output directory")?;
        self.output_count = 0;
        self.indices.clear();
        self.steps.clear();
        self.times.clear();
        Ok(())
    }

    fn do_output(&mut self, step: &TimeStep, field: &PrimaryField) -> Result<(), StrError> {
        // save the state
        let path = self.path_state(self.output_count);
        write_json_file(&path, field)?;

        // update counters
        self.indices.push(self.output_count);
        self.steps.push(step.number);
        self.times.push(step.time);
        self.output_count += 1;

        // save the summary
        let path = self.path_summary();
        write_json_file(&path, &*self)
    }
}

fn read_json_file<P, T>(full_path: &P) -> Result<T, StrError>
where
    P: AsRef<OsStr> + ?Sized,
    T: for<'de> Deserialize<'de>,
{
    let path = Path::new(full_path).to_path_buf();
    let file = File::open(path).map_err(|_| "cannot open file")?;
    let buffered = BufReader::new(file);
    serde_json::from_reader(buffered).map_err(|_| "cannot parse JSON file")
}

fn write_json_file<P, T>(full_path: &P, value: &T) -> Result<(), StrError>
where
    P: AsRef<OsStr> + ?Sized,
    T: Serialize,
{
    let path = Path::new(full_path).to_path_buf();
    if let Some(p) = path.parent() {
        fs::create_dir_all(p).map_err(|_| "cannot create directory")?;
    }
    let mut file = File::create(&path).map_err(|_| "cannot create file")?;
    serde_json::to_writer(&mut file, value).map_err(|_| "cannot write file")?;
    Ok(())
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
