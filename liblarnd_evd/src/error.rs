use std::path::PathBuf;
use thiserror::Error;

use super::constants::PACKETS_NAME;

#[derive(Debug, Error)]
pub enum DatalogError {
    #[error("Could not open datalog because file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("File {0:?} is not a valid datalog: {1}")]
    InvalidContainer(PathBuf, hdf5::Error),
    #[error("No {name} dataset in file {0:?}", name=PACKETS_NAME)]
    MissingPackets(PathBuf),
    #[error("Datalog failed due to HDF5 error: {0}")]
    HDF5Error(#[from] hdf5::Error),
    #[error("Datalog requested packets {start}..{stop} but only {count} packets exist")]
    PacketRange {
        start: usize,
        stop: usize,
        count: usize,
    },
    #[error("Datalog requested light trigger {0} but only {1} light triggers exist")]
    LightIndex(usize, usize),
}

#[derive(Debug, Error)]
pub enum SegmenterError {
    #[error("Segmenter was given an invalid file: {0}")]
    InvalidFile(#[from] DatalogError),
}

#[derive(Debug, Error)]
pub enum NavigatorError {
    #[error("Event {event_id} is out of range; the file contains {n_events} events")]
    OutOfRange { event_id: i64, n_events: usize },
    #[error("Navigator failed due to Datalog error: {0}")]
    DatalogError(#[from] DatalogError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration as file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Config failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Config failed to parse YAML: {0}")]
    ParsingError(#[from] serde_yaml::Error),
}

#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("EventDisplay failed due to Datalog error: {0}")]
    DatalogError(#[from] DatalogError),
    #[error("EventDisplay failed due to Segmenter error: {0}")]
    SegmenterError(#[from] SegmenterError),
    #[error("EventDisplay failed due to Navigator error: {0}")]
    NavigatorError(#[from] NavigatorError),
}
