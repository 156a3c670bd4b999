use bitvec::prelude::*;
use fxhash::FxHashMap;
use std::path::Path;
use std::sync::Arc;

use super::datalog::{Datalog, DatalogSource};
use super::divider_cache::DividerCache;
use super::dividers::EventDividers;
use super::error::SegmenterError;
use super::packet::Packet;

/// Split a packet log into events.
///
/// With light data, charge triggers are paired with light triggers carrying the exact
/// same timestamp; pairs closer than `merge_gap` ticks to the previous pair (in light
/// trigger order) are folded into the previous event. Without light data, each run of
/// adjacent trigger packets opens an event at its last packet.
///
/// Fewer than two trigger packets yields no events.
pub fn compute_dividers(
    packets: &[Packet],
    light_sync: Option<&[u64]>,
    merge_gap: u64,
) -> EventDividers {
    let trigger_mask: BitVec = packets.iter().map(Packet::is_trigger).collect();
    let n_triggers = trigger_mask.count_ones();
    if n_triggers < 2 {
        spdlog::info!(
            "Found {} trigger packets; at least two are needed to form an event",
            n_triggers
        );
        return EventDividers::empty();
    }

    let dividers = match light_sync {
        Some(sync) => light_dividers(packets, &trigger_mask, sync, merge_gap),
        None => charge_dividers(packets.len(), &trigger_mask),
    };

    if !dividers.is_strictly_increasing() {
        spdlog::warn!(
            "Event boundaries are not strictly increasing; light and charge triggers may be misaligned"
        );
    }
    spdlog::debug!(
        "Segmented {} packets with {} triggers into {} events",
        packets.len(),
        n_triggers,
        dividers.n_events()
    );
    dividers
}

/// Boundaries from light triggers matched to charge triggers by timestamp
fn light_dividers(
    packets: &[Packet],
    trigger_mask: &BitSlice,
    light_sync: &[u64],
    merge_gap: u64,
) -> EventDividers {
    // First light trigger and first trigger packet carrying each timestamp
    let mut light_first: FxHashMap<u64, usize> = FxHashMap::default();
    for (light_index, ts) in light_sync.iter().enumerate() {
        light_first.entry(*ts).or_insert(light_index);
    }
    let mut packet_first: FxHashMap<u64, usize> = FxHashMap::default();
    for packet_index in trigger_mask.iter_ones() {
        packet_first
            .entry(packets[packet_index].timestamp)
            .or_insert(packet_index);
    }

    let mut pairs: Vec<(u64, usize, usize)> = light_first
        .iter()
        .filter_map(|(ts, light_index)| {
            packet_first
                .get(ts)
                .map(|packet_index| (*ts, *light_index, *packet_index))
        })
        .collect();
    pairs.sort_unstable_by_key(|&(_, light_index, _)| light_index);

    let mut event = Vec::with_capacity(pairs.len() + 1);
    let mut light = Vec::with_capacity(pairs.len() + 1);
    let mut previous_ts: Option<u64> = None;
    for (ts, light_index, packet_index) in pairs {
        let is_new_event = match previous_ts {
            Some(prev) => (ts as i128 - prev as i128) > merge_gap as i128,
            None => true,
        };
        if is_new_event {
            event.push(packet_index);
            light.push(light_index);
        }
        previous_ts = Some(ts);
    }
    event.push(packets.len());
    light.push(light_sync.len());

    EventDividers::new(event, light)
}

/// Boundaries from the trigger packets alone
fn charge_dividers(n_packets: usize, trigger_mask: &BitSlice) -> EventDividers {
    let triggers: Vec<usize> = trigger_mask.iter_ones().collect();
    let mut event: Vec<usize> = triggers
        .windows(2)
        .filter(|pair| pair[1] - pair[0] != 1)
        .map(|pair| pair[0])
        .collect();
    if let Some(last) = triggers.last() {
        event.push(*last);
    }
    event.push(n_packets);

    EventDividers::new(event, Vec::new())
}

/// Segments datalogs, remembering the result per file path.
#[derive(Debug)]
pub struct Segmenter<S: DatalogSource> {
    source: S,
    cache: Arc<DividerCache>,
    merge_gap: u64,
}

impl<S: DatalogSource> Segmenter<S> {
    /// Create a new Segmenter.
    ///
    /// Requires the source used to open files and the cache shared with other users.
    pub fn new(source: S, cache: Arc<DividerCache>, merge_gap: u64) -> Self {
        Self {
            source,
            cache,
            merge_gap,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn cache(&self) -> &Arc<DividerCache> {
        &self.cache
    }

    /// Get the event dividers of the file at path, segmenting it on first use
    pub fn segment(&self, path: &Path) -> Result<Arc<EventDividers>, SegmenterError> {
        self.cache
            .get_or_try_insert_with(path, || self.segment_uncached(path))
    }

    /// Segment an already opened datalog without touching the cache
    pub fn segment_log(&self, log: &S::Log) -> Result<EventDividers, SegmenterError> {
        let packets = log.read_all_packets()?;
        let light_sync = log.light_sync()?;
        Ok(compute_dividers(
            &packets,
            light_sync.as_deref(),
            self.merge_gap,
        ))
    }

    fn segment_uncached(&self, path: &Path) -> Result<EventDividers, SegmenterError> {
        spdlog::info!("Segmenting {}...", path.display());
        let log = self.source.open(path)?;
        let dividers = self.segment_log(&log)?;
        spdlog::info!(
            "Found {} events in {}",
            dividers.n_events(),
            path.display()
        );
        Ok(dividers)
    }
}
