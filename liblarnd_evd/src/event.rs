use ndarray::{Array1, Axis};
use std::collections::BTreeMap;
use std::ops::Range;

use super::constants::{ADC_HISTOGRAM_BIN_WIDTH, ADC_HISTOGRAM_END, ADC_HISTOGRAM_START};
use super::datalog::Datalog;
use super::dividers::EventDividers;
use super::error::NavigatorError;
use super::navigator::within_buffer;
use super::packet::Packet;

/// A single event, materialized from a datalog for display.
///
/// Built fresh for every request; nothing here is cached.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub event_id: usize,
    /// Raw packet range of the event in the packets table
    pub packet_range: Range<usize>,
    /// Timestamp of the event trigger, the first packet of the range
    pub trigger_timestamp: u64,
    /// Packets within the time buffer of the trigger
    pub packets: Vec<Packet>,
    /// Light trigger range of the event (empty without light data)
    pub light_range: Range<usize>,
}

impl Event {
    /// Load an event from the datalog
    pub fn load<L: Datalog>(
        log: &L,
        dividers: &EventDividers,
        event_id: i64,
        buffer_ticks: u64,
    ) -> Result<Self, NavigatorError> {
        let packet_range = dividers.event_range(event_id)?;
        let light_range = dividers.light_range(event_id)?;
        let raw = log.read_packets(packet_range.clone())?;
        let trigger_timestamp = raw.first().map(|p| p.timestamp).unwrap_or_default();
        Ok(Self {
            event_id: event_id as usize,
            packet_range,
            trigger_timestamp,
            packets: within_buffer(raw, buffer_ticks),
            light_range,
        })
    }

    pub fn data_packets(&self) -> impl Iterator<Item = &Packet> {
        self.packets.iter().filter(|p| p.is_data())
    }

    pub fn n_hits(&self) -> usize {
        self.data_packets().count()
    }

    /// Time of a packet relative to the trigger
    pub fn drift_ticks(&self, packet: &Packet) -> i64 {
        packet.timestamp as i64 - self.trigger_timestamp as i64
    }
}

/// Waveform integrals of every channel for one light trigger
#[derive(Debug, Clone, PartialEq)]
pub struct LightIntegrals {
    pub light_index: usize,
    pub integrals: Array1<f64>,
}

/// Integrate the light waveforms of an event, one entry per light trigger.
///
/// Also returns the smallest integral found, which plotting uses as a baseline.
/// Both are empty when the file has no light waveforms.
pub fn light_integrals<L: Datalog>(
    log: &L,
    dividers: &EventDividers,
    event_id: i64,
) -> Result<(Vec<LightIntegrals>, Option<f64>), NavigatorError> {
    let mut integrals = Vec::new();
    for light_index in dividers.light_range(event_id)? {
        let Some(block) = log.light_waveforms(light_index)? else {
            break;
        };
        integrals.push(LightIntegrals {
            light_index,
            integrals: block.sum_axis(Axis(1)),
        });
    }
    let minimum = integrals
        .iter()
        .flat_map(|entry| entry.integrals.iter().copied())
        .reduce(f64::min);
    Ok((integrals, minimum))
}

/// A waveform of one channel for one light trigger
#[derive(Debug, Clone, PartialEq)]
pub struct LightWaveform {
    pub light_index: usize,
    pub ts_sync: u64,
    pub samples: Vec<f64>,
}

/// Collect the waveforms of a channel across all light triggers of an event.
///
/// Light triggers without that channel are skipped.
pub fn light_waveforms<L: Datalog>(
    log: &L,
    dividers: &EventDividers,
    event_id: i64,
    channel: usize,
) -> Result<Vec<LightWaveform>, NavigatorError> {
    let light_range = dividers.light_range(event_id)?;
    if light_range.is_empty() {
        return Ok(Vec::new());
    }
    let Some(sync) = log.light_sync()? else {
        return Ok(Vec::new());
    };

    let mut waveforms = Vec::new();
    for light_index in light_range {
        let Some(block) = log.light_waveforms(light_index)? else {
            break;
        };
        if channel >= block.nrows() {
            continue;
        }
        waveforms.push(LightWaveform {
            light_index,
            ts_sync: sync.get(light_index).copied().unwrap_or_default(),
            samples: block.row(channel).to_vec(),
        });
    }
    Ok(waveforms)
}

/// Histogram of hit times relative to the trigger for one detector module
#[derive(Debug, Clone, PartialEq)]
pub struct AdcTimingHistogram {
    pub module_id: u8,
    /// Lower edge of the first bin, in ticks
    pub start: u64,
    pub bin_width: u64,
    pub counts: Vec<u64>,
}

impl AdcTimingHistogram {
    fn new(module_id: u8) -> Self {
        let n_bins = ((ADC_HISTOGRAM_END - ADC_HISTOGRAM_START) / ADC_HISTOGRAM_BIN_WIDTH) as usize;
        Self {
            module_id,
            start: ADC_HISTOGRAM_START,
            bin_width: ADC_HISTOGRAM_BIN_WIDTH,
            counts: vec![0; n_bins],
        }
    }

    fn fill(&mut self, dt: i64) {
        if dt < self.start as i64 {
            return;
        }
        let bin = ((dt as u64 - self.start) / self.bin_width) as usize;
        if let Some(count) = self.counts.get_mut(bin) {
            *count += 1;
        }
    }

    pub fn entries(&self) -> u64 {
        self.counts.iter().sum()
    }
}

/// Build the hit timing histogram of each module that saw data in the event.
///
/// Uses every data packet of the raw event range, not only those within the buffer.
pub fn adc_timing_histograms<L: Datalog>(
    log: &L,
    dividers: &EventDividers,
    event_id: i64,
) -> Result<Vec<AdcTimingHistogram>, NavigatorError> {
    let packets = log.read_packets(dividers.event_range(event_id)?)?;
    let Some(trigger_timestamp) = packets.first().map(|p| p.timestamp) else {
        return Ok(Vec::new());
    };

    let mut histograms: BTreeMap<u8, AdcTimingHistogram> = BTreeMap::new();
    for packet in packets.iter().filter(|p| p.is_data()) {
        let module_id = packet.module_id();
        histograms
            .entry(module_id)
            .or_insert_with(|| AdcTimingHistogram::new(module_id))
            .fill(packet.timestamp as i64 - trigger_timestamp as i64);
    }
    Ok(histograms.into_values().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datalog::MemoryDatalog;
    use ndarray::array;

    fn light_event() -> (MemoryDatalog, EventDividers) {
        let packets = vec![
            Packet::trigger(1000),
            Packet::data(1010, 30, 1, 1),
            Packet::data(4000, 30, 1, 1),
            Packet::trigger(9000),
            Packet::data(9050, 12, 3, 1),
        ];
        let waveforms = vec![
            array![[1.0, 2.0, 3.0], [-4.0, -5.0, -6.0]],
            array![[0.0, 0.0, 1.0], [2.0, 2.0, 2.0]],
            array![[7.0, 7.0, 7.0]],
        ];
        let log = MemoryDatalog::new(packets).with_light(vec![1000, 1100, 9000], waveforms);
        let dividers = EventDividers::new(vec![0, 3, 5], vec![0, 2, 3]);
        (log, dividers)
    }

    #[test]
    fn test_load_event() {
        let (log, dividers) = light_event();
        let event = Event::load(&log, &dividers, 0, 2000).unwrap();
        assert_eq!(event.packet_range, 0..3);
        assert_eq!(event.light_range, 0..2);
        assert_eq!(event.trigger_timestamp, 1000);
        assert_eq!(event.packets.len(), 2);
        assert_eq!(event.n_hits(), 1);
        assert_eq!(event.drift_ticks(&event.packets[1]), 10);
        assert!(Event::load(&log, &dividers, 2, 2000).is_err());
    }

    #[test]
    fn test_light_integrals() {
        let (log, dividers) = light_event();
        let (integrals, minimum) = light_integrals(&log, &dividers, 0).unwrap();
        assert_eq!(integrals.len(), 2);
        assert_eq!(integrals[0].integrals, array![6.0, -15.0]);
        assert_eq!(integrals[1].light_index, 1);
        assert_eq!(minimum, Some(-15.0));

        let charge_only = EventDividers::new(vec![0, 3, 5], vec![]);
        let (integrals, minimum) = light_integrals(&log, &charge_only, 0).unwrap();
        assert!(integrals.is_empty());
        assert_eq!(minimum, None);
    }

    #[test]
    fn test_light_waveforms() {
        let (log, dividers) = light_event();
        let waveforms = light_waveforms(&log, &dividers, 0, 1).unwrap();
        assert_eq!(waveforms.len(), 2);
        assert_eq!(waveforms[0].ts_sync, 1000);
        assert_eq!(waveforms[1].samples, vec![2.0, 2.0, 2.0]);
        // event 1 only has a single channel
        assert!(light_waveforms(&log, &dividers, 1, 1).unwrap().is_empty());
        assert_eq!(light_waveforms(&log, &dividers, 1, 0).unwrap().len(), 1);
    }

    #[test]
    fn test_adc_timing_histograms() {
        let packets = vec![
            Packet::trigger(500),
            Packet::data(505, 1, 1, 1),
            Packet::data(519, 1, 2, 1),
            Packet::data(520, 1, 1, 1),
            Packet::data(560, 1, 3, 1),
            Packet::data(4000, 1, 3, 1),
        ];
        let log = MemoryDatalog::new(packets);
        let dividers = EventDividers::new(vec![0, 6], vec![]);
        let histograms = adc_timing_histograms(&log, &dividers, 0).unwrap();
        assert_eq!(histograms.len(), 2);

        let module1 = &histograms[0];
        assert_eq!(module1.module_id, 1);
        assert_eq!(module1.counts.len(), 160);
        assert_eq!(module1.counts[0], 2);
        assert_eq!(module1.counts[1], 1);

        let module2 = &histograms[1];
        assert_eq!(module2.module_id, 2);
        assert_eq!(module2.counts[3], 1);
        // 3500 ticks is past the last bin
        assert_eq!(module2.entries(), 1);
    }
}
