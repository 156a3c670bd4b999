use hdf5::{Dataset, File};
use ndarray::{s, Array2};
use std::ops::Range;
use std::path::{Path, PathBuf};

use super::constants::{LIGHT_TRIG_NAME, LIGHT_WVFM_NAME, PACKETS_NAME};
use super::datalog::{Datalog, DatalogSource};
use super::error::DatalogError;
use super::packet::{LightSync, Packet};

// Structure
// packets(dset) - io_group, io_channel, packet_type, timestamp, dataword, ...
// light_trig(dset) - ts_sync, op_channel, ... (optional)
// light_wvfm(dset) - [light trigger][channel][sample] (optional)
// tracks(dset), mc_packets_assn(dset) (optional, simulation truth)

/// Opens LArPix HDF5 datalogs read-only
#[derive(Debug, Clone, Copy, Default)]
pub struct Hdf5Source;

impl DatalogSource for Hdf5Source {
    type Log = Hdf5Datalog;

    fn open(&self, path: &Path) -> Result<Hdf5Datalog, DatalogError> {
        Hdf5Datalog::open(path)
    }
}

/// A simple struct which wraps around the hdf5-rust library.
///
/// Holds the file open for reading for as long as it lives. Datasets are looked up once
/// when the file is opened.
#[allow(dead_code)]
#[derive(Debug)]
pub struct Hdf5Datalog {
    file_handle: File,
    path: PathBuf,
    size_bytes: u64,
    keys: Vec<String>,
    packets: Dataset,
    light_trig: Option<Dataset>,
    light_wvfm: Option<Dataset>,
}

impl Hdf5Datalog {
    /// Open the file at path and find the data tables
    pub fn open(path: &Path) -> Result<Self, DatalogError> {
        if !path.exists() {
            return Err(DatalogError::BadFilePath(path.to_path_buf()));
        }
        let file_handle =
            File::open(path).map_err(|e| DatalogError::InvalidContainer(path.to_path_buf(), e))?;
        let keys = file_handle.member_names()?;
        if !keys.iter().any(|k| k == PACKETS_NAME) {
            return Err(DatalogError::MissingPackets(path.to_path_buf()));
        }
        let packets = file_handle.dataset(PACKETS_NAME)?;
        let light_trig = Self::optional_dataset(&file_handle, &keys, LIGHT_TRIG_NAME)?;
        let light_wvfm = Self::optional_dataset(&file_handle, &keys, LIGHT_WVFM_NAME)?;
        let size_bytes = path.metadata().map(|m| m.len()).unwrap_or_default();

        spdlog::debug!(
            "Opened datalog {} ({}) with tables {:?}",
            path.display(),
            human_bytes::human_bytes(size_bytes as f64),
            keys
        );

        Ok(Self {
            file_handle,
            path: path.to_path_buf(),
            size_bytes,
            keys,
            packets,
            light_trig,
            light_wvfm,
        })
    }

    fn optional_dataset(
        file_handle: &File,
        keys: &[String],
        name: &str,
    ) -> Result<Option<Dataset>, DatalogError> {
        if keys.iter().any(|k| k == name) {
            Ok(Some(file_handle.dataset(name)?))
        } else {
            Ok(None)
        }
    }
}

impl Datalog for Hdf5Datalog {
    fn packet_count(&self) -> usize {
        self.packets.size()
    }

    fn read_packets(&self, range: Range<usize>) -> Result<Vec<Packet>, DatalogError> {
        let count = self.packet_count();
        if range.start > range.end || range.end > count {
            return Err(DatalogError::PacketRange {
                start: range.start,
                stop: range.end,
                count,
            });
        }
        if range.is_empty() {
            return Ok(Vec::new());
        }
        let packets = self
            .packets
            .read_slice_1d::<Packet, _>(s![range.start..range.end])?;
        Ok(packets.into_raw_vec())
    }

    fn read_all_packets(&self) -> Result<Vec<Packet>, DatalogError> {
        Ok(self.packets.read_raw::<Packet>()?)
    }

    fn light_sync(&self) -> Result<Option<Vec<u64>>, DatalogError> {
        match &self.light_trig {
            Some(dset) => {
                let rows = dset.read_raw::<LightSync>()?;
                Ok(Some(rows.into_iter().map(|row| row.ts_sync).collect()))
            }
            None => Ok(None),
        }
    }

    fn light_trigger_count(&self) -> usize {
        self.light_trig.as_ref().map_or(0, |dset| dset.size())
    }

    fn light_waveforms(&self, light_index: usize) -> Result<Option<Array2<f64>>, DatalogError> {
        let Some(dset) = &self.light_wvfm else {
            return Ok(None);
        };
        let n_blocks = dset.shape().first().copied().unwrap_or(0);
        if light_index >= n_blocks {
            return Err(DatalogError::LightIndex(light_index, n_blocks));
        }
        let block = dset.read_slice_2d::<f64, _>(s![light_index, .., ..])?;
        Ok(Some(block))
    }

    fn keys(&self) -> Vec<String> {
        self.keys.clone()
    }

    fn size_bytes(&self) -> u64 {
        self.size_bytes
    }
}
