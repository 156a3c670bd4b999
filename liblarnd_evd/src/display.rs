use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::config::Config;
use super::datalog::{Datalog, DatalogSource, FileSummary};
use super::divider_cache::DividerCache;
use super::dividers::EventDividers;
use super::error::DisplayError;
use super::event::{
    adc_timing_histograms, light_integrals, light_waveforms, AdcTimingHistogram, Event,
    LightIntegrals, LightWaveform,
};
use super::hdf_reader::Hdf5Source;
use super::navigator::{find_cool_event, is_cool_event, Direction, EventWalk};
use super::segmenter::Segmenter;

/// The event display backend.
///
/// Created once when the display starts. Owns the Segmenter (and through it the shared
/// divider cache) along with the navigation settings from the Config. Every method is a
/// single user interaction: it opens the file, does its work, and closes the file again.
#[derive(Debug)]
pub struct EventDisplay<S: DatalogSource> {
    config: Config,
    segmenter: Segmenter<S>,
}

impl EventDisplay<Hdf5Source> {
    /// Create a display reading HDF5 files, with a fresh cache sized by the config
    pub fn from_config(config: Config) -> Self {
        let cache = Arc::new(DividerCache::new(config.cache_capacity));
        Self::new(config, Hdf5Source, cache)
    }
}

impl<S: DatalogSource> EventDisplay<S> {
    pub fn new(config: Config, source: S, cache: Arc<DividerCache>) -> Self {
        let segmenter = Segmenter::new(source, cache, config.light_merge_gap);
        Self { config, segmenter }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn segmenter(&self) -> &Segmenter<S> {
        &self.segmenter
    }

    /// Full path of a datalog given by name
    pub fn resolve(&self, file_name: &Path) -> PathBuf {
        self.config.get_datalog_path(file_name)
    }

    /// Check that a file is a readable datalog and describe it
    pub fn open_file(&self, path: &Path) -> Result<FileSummary, DisplayError> {
        let log = self.segmenter.source().open(path)?;
        let summary = FileSummary::new(path, &log);
        spdlog::info!(
            "Selected {} ({}, {} packets)",
            path.display(),
            summary.human_size(),
            summary.n_packets
        );
        Ok(summary)
    }

    pub fn dividers(&self, path: &Path) -> Result<Arc<EventDividers>, DisplayError> {
        Ok(self.segmenter.segment(path)?)
    }

    pub fn total_events(&self, path: &Path) -> Result<usize, DisplayError> {
        Ok(self.dividers(path)?.n_events())
    }

    /// Turn a typed-in event id into a valid one. None if the file has no events
    pub fn select_event(&self, path: &Path, requested: i64) -> Result<Option<usize>, DisplayError> {
        Ok(self.dividers(path)?.clamp_event_id(requested))
    }

    /// Load an event, applying the configured time buffer
    pub fn event(&self, path: &Path, event_id: i64) -> Result<Event, DisplayError> {
        let dividers = self.dividers(path)?;
        let log = self.segmenter.source().open(path)?;
        Ok(Event::load(
            &log,
            &dividers,
            event_id,
            self.config.event_buffer,
        )?)
    }

    pub fn next_cool_event(
        &self,
        path: &Path,
        event_id: i64,
        threshold: Option<u64>,
    ) -> Result<Option<usize>, DisplayError> {
        self.find_cool(path, event_id, threshold, Direction::Forward)
    }

    pub fn previous_cool_event(
        &self,
        path: &Path,
        event_id: i64,
        threshold: Option<u64>,
    ) -> Result<Option<usize>, DisplayError> {
        self.find_cool(path, event_id, threshold, Direction::Backward)
    }

    /// Every cool event of a file, in order.
    ///
    /// `progress` is called with the number of events checked so far and the total.
    pub fn scan_cool_events<F>(
        &self,
        path: &Path,
        threshold: Option<u64>,
        mut progress: F,
    ) -> Result<Vec<usize>, DisplayError>
    where
        F: FnMut(usize, usize),
    {
        let threshold = threshold.or(self.config.coolness_threshold);
        let dividers = self.dividers(path)?;
        let log = self.segmenter.source().open(path)?;
        let n_events = dividers.n_events();
        let mut cool = Vec::new();
        for (checked, event_id) in EventWalk::new(n_events, -1, Direction::Forward).enumerate() {
            let range = dividers.event_range(event_id as i64)?;
            let packets = log.read_packets(range)?;
            if is_cool_event(&packets, threshold) {
                cool.push(event_id);
            }
            progress(checked + 1, n_events);
        }
        spdlog::info!(
            "{} of {} events in {} are cool",
            cool.len(),
            n_events,
            path.display()
        );
        Ok(cool)
    }

    pub fn light_integrals(
        &self,
        path: &Path,
        event_id: i64,
    ) -> Result<(Vec<LightIntegrals>, Option<f64>), DisplayError> {
        let dividers = self.dividers(path)?;
        let log = self.segmenter.source().open(path)?;
        Ok(light_integrals(&log, &dividers, event_id)?)
    }

    pub fn light_waveforms(
        &self,
        path: &Path,
        event_id: i64,
        channel: usize,
    ) -> Result<Vec<LightWaveform>, DisplayError> {
        let dividers = self.dividers(path)?;
        let log = self.segmenter.source().open(path)?;
        Ok(light_waveforms(&log, &dividers, event_id, channel)?)
    }

    pub fn adc_timing_histograms(
        &self,
        path: &Path,
        event_id: i64,
    ) -> Result<Vec<AdcTimingHistogram>, DisplayError> {
        let dividers = self.dividers(path)?;
        let log = self.segmenter.source().open(path)?;
        Ok(adc_timing_histograms(&log, &dividers, event_id)?)
    }

    fn find_cool(
        &self,
        path: &Path,
        event_id: i64,
        threshold: Option<u64>,
        direction: Direction,
    ) -> Result<Option<usize>, DisplayError> {
        let threshold = threshold.or(self.config.coolness_threshold);
        let dividers = self.dividers(path)?;
        let log = self.segmenter.source().open(path)?;
        let found = find_cool_event(&dividers, &log, event_id, threshold, direction)?;
        match found {
            Some(id) => spdlog::debug!("Found cool event {} ({:?} from {})", id, direction, event_id),
            None => spdlog::debug!("No cool event found {:?} from {}", direction, event_id),
        }
        Ok(found)
    }
}
