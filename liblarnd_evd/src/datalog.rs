use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use fxhash::FxHashMap;
use ndarray::Array2;

use super::constants::{
    LIGHT_TRIG_NAME, LIGHT_WVFM_NAME, MC_PACKETS_ASSN_NAME, PACKETS_NAME, TRACKS_NAME,
};
use super::error::DatalogError;
use super::packet::Packet;

/// Read-only access to a single opened packet log.
///
/// A Datalog is opened for the span of one operation and dropped afterwards, so
/// implementations may hold on to file handles.
pub trait Datalog {
    /// Total number of rows in the packets table
    fn packet_count(&self) -> usize;

    /// Read the packets in the half-open range
    fn read_packets(&self, range: Range<usize>) -> Result<Vec<Packet>, DatalogError>;

    fn read_all_packets(&self) -> Result<Vec<Packet>, DatalogError> {
        self.read_packets(0..self.packet_count())
    }

    /// The ts_sync column of the light_trig table, or None if the file has no light data
    fn light_sync(&self) -> Result<Option<Vec<u64>>, DatalogError>;

    /// Number of rows in the light_trig table (0 if absent)
    fn light_trigger_count(&self) -> usize;

    /// The waveform block (channel x sample) recorded for one light trigger.
    ///
    /// Returns None if the file has no light waveforms.
    fn light_waveforms(&self, light_index: usize) -> Result<Option<Array2<f64>>, DatalogError>;

    /// Names of the top level tables in the file
    fn keys(&self) -> Vec<String>;

    /// Size of the underlying file in bytes
    fn size_bytes(&self) -> u64;

    fn has_key(&self, name: &str) -> bool {
        self.keys().iter().any(|k| k == name)
    }

    fn has_light(&self) -> bool {
        self.has_key(LIGHT_TRIG_NAME)
    }

    fn has_truth(&self) -> bool {
        self.has_key(TRACKS_NAME) && self.has_key(MC_PACKETS_ASSN_NAME)
    }
}

/// Something that can open a Datalog from a path
pub trait DatalogSource {
    type Log: Datalog;

    fn open(&self, path: &Path) -> Result<Self::Log, DatalogError>;
}

/// Overview of a datalog file, shown when a file is selected
#[derive(Debug, Clone, PartialEq)]
pub struct FileSummary {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub n_packets: usize,
    pub n_light_triggers: usize,
    pub has_light: bool,
    pub has_truth: bool,
    pub keys: Vec<String>,
}

impl FileSummary {
    pub fn new<L: Datalog>(path: &Path, log: &L) -> Self {
        Self {
            path: path.to_path_buf(),
            size_bytes: log.size_bytes(),
            n_packets: log.packet_count(),
            n_light_triggers: log.light_trigger_count(),
            has_light: log.has_light(),
            has_truth: log.has_truth(),
            keys: log.keys(),
        }
    }

    pub fn human_size(&self) -> String {
        human_bytes::human_bytes(self.size_bytes as f64)
    }
}

/// A Datalog held entirely in memory.
///
/// Useful for tests and for callers that already decoded their packets by other means.
#[derive(Debug, Clone, Default)]
pub struct MemoryDatalog {
    packets: Vec<Packet>,
    light_sync: Option<Vec<u64>>,
    light_wvfm: Vec<Array2<f64>>,
    has_truth: bool,
}

impl MemoryDatalog {
    pub fn new(packets: Vec<Packet>) -> Self {
        Self {
            packets,
            ..Default::default()
        }
    }

    /// Attach light triggers. Waveform blocks, if given, are indexed like `light_sync`
    pub fn with_light(mut self, light_sync: Vec<u64>, light_wvfm: Vec<Array2<f64>>) -> Self {
        self.light_sync = Some(light_sync);
        self.light_wvfm = light_wvfm;
        self
    }

    pub fn with_truth(mut self) -> Self {
        self.has_truth = true;
        self
    }
}

impl Datalog for MemoryDatalog {
    fn packet_count(&self) -> usize {
        self.packets.len()
    }

    fn read_packets(&self, range: Range<usize>) -> Result<Vec<Packet>, DatalogError> {
        match self.packets.get(range.clone()) {
            Some(slice) => Ok(slice.to_vec()),
            None => Err(DatalogError::PacketRange {
                start: range.start,
                stop: range.end,
                count: self.packets.len(),
            }),
        }
    }

    fn light_sync(&self) -> Result<Option<Vec<u64>>, DatalogError> {
        Ok(self.light_sync.clone())
    }

    fn light_trigger_count(&self) -> usize {
        self.light_sync.as_ref().map_or(0, |sync| sync.len())
    }

    fn light_waveforms(&self, light_index: usize) -> Result<Option<Array2<f64>>, DatalogError> {
        if self.light_wvfm.is_empty() {
            return Ok(None);
        }
        match self.light_wvfm.get(light_index) {
            Some(block) => Ok(Some(block.clone())),
            None => Err(DatalogError::LightIndex(light_index, self.light_wvfm.len())),
        }
    }

    fn keys(&self) -> Vec<String> {
        let mut keys = vec![String::from(PACKETS_NAME)];
        if self.light_sync.is_some() {
            keys.push(String::from(LIGHT_TRIG_NAME));
        }
        if !self.light_wvfm.is_empty() {
            keys.push(String::from(LIGHT_WVFM_NAME));
        }
        if self.has_truth {
            keys.push(String::from(TRACKS_NAME));
            keys.push(String::from(MC_PACKETS_ASSN_NAME));
        }
        keys
    }

    fn size_bytes(&self) -> u64 {
        (self.packets.len() * std::mem::size_of::<Packet>()) as u64
    }
}

/// A DatalogSource serving MemoryDatalogs by path. Counts how often files are opened.
#[derive(Debug, Default)]
pub struct MemorySource {
    logs: FxHashMap<PathBuf, MemoryDatalog>,
    opened: AtomicUsize,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: &Path, log: MemoryDatalog) {
        self.logs.insert(path.to_path_buf(), log);
    }

    pub fn open_count(&self) -> usize {
        self.opened.load(Ordering::Relaxed)
    }
}

impl DatalogSource for MemorySource {
    type Log = MemoryDatalog;

    fn open(&self, path: &Path) -> Result<MemoryDatalog, DatalogError> {
        self.opened.fetch_add(1, Ordering::Relaxed);
        self.logs
            .get(path)
            .cloned()
            .ok_or_else(|| DatalogError::BadFilePath(path.to_path_buf()))
    }
}
