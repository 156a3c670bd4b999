use super::constants::DEFAULT_COOLNESS_THRESHOLD;
use super::datalog::Datalog;
use super::dividers::EventDividers;
use super::error::NavigatorError;
use super::packet::Packet;

/// Which way to move through the events of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    pub fn step(&self) -> i64 {
        match self {
            Self::Forward => 1,
            Self::Backward => -1,
        }
    }
}

/// The candidate event ids visited when searching from an event in one direction.
///
/// Starts one step away from the starting id and stops at the edge of the file. Only
/// ids inside `[0, n_events)` are produced. Clone it to restart the walk.
#[derive(Debug, Clone)]
pub struct EventWalk {
    next: i64,
    n_events: i64,
    direction: Direction,
}

impl EventWalk {
    pub fn new(n_events: usize, start_id: i64, direction: Direction) -> Self {
        let n_events = n_events as i64;
        let first = start_id.saturating_add(direction.step());
        let next = match direction {
            Direction::Forward => first.max(0),
            Direction::Backward => first.min(n_events - 1),
        };
        Self {
            next,
            n_events,
            direction,
        }
    }
}

impl Iterator for EventWalk {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.next < 0 || self.next >= self.n_events {
            return None;
        }
        let current = self.next;
        self.next += self.direction.step();
        Some(current as usize)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.next < 0 || self.next >= self.n_events {
            0
        } else {
            match self.direction {
                Direction::Forward => (self.n_events - self.next) as usize,
                Direction::Backward => (self.next + 1) as usize,
            }
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for EventWalk {}

/// Read the packets of an event, keeping only those within `buffer_ticks` of the trigger.
///
/// The first packet of the event is the trigger and sets the reference time. Packets
/// stamped before the trigger are dropped along with those at or past the buffer.
pub fn extract_event_packets<L: Datalog>(
    log: &L,
    dividers: &EventDividers,
    event_id: i64,
    buffer_ticks: u64,
) -> Result<Vec<Packet>, NavigatorError> {
    let range = dividers.event_range(event_id)?;
    let packets = log.read_packets(range)?;
    Ok(within_buffer(packets, buffer_ticks))
}

/// Keep the packets within `buffer_ticks` of the first packet
pub fn within_buffer(packets: Vec<Packet>, buffer_ticks: u64) -> Vec<Packet> {
    let Some(reference) = packets.first().map(|p| p.timestamp) else {
        return packets;
    };
    packets
        .into_iter()
        .filter(|p| {
            p.timestamp
                .checked_sub(reference)
                .is_some_and(|dt| dt < buffer_ticks)
        })
        .collect()
}

/// Find the nearest event in a direction for which the predicate holds.
///
/// The predicate sees the full (unbuffered) packet range of each candidate. Returns
/// `Ok(None)` if no event in that direction matches.
pub fn find_event<L, P>(
    dividers: &EventDividers,
    log: &L,
    start_id: i64,
    mut predicate: P,
    direction: Direction,
) -> Result<Option<usize>, NavigatorError>
where
    L: Datalog,
    P: FnMut(&[Packet]) -> bool,
{
    for candidate in EventWalk::new(dividers.n_events(), start_id, direction) {
        let range = dividers.event_range(candidate as i64)?;
        let packets = log.read_packets(range)?;
        if predicate(&packets) {
            return Ok(Some(candidate));
        }
    }
    Ok(None)
}

/// An event is cool if the ADC sum of its data packets exceeds the threshold.
///
/// A missing threshold means the default one.
pub fn is_cool_event(packets: &[Packet], threshold: Option<u64>) -> bool {
    let threshold = threshold.unwrap_or(DEFAULT_COOLNESS_THRESHOLD);
    adc_sum(packets) > threshold
}

/// Sum of the datawords of the data packets
pub fn adc_sum(packets: &[Packet]) -> u64 {
    packets
        .iter()
        .filter(|p| p.is_data())
        .map(|p| p.dataword as u64)
        .sum()
}

/// Find the nearest cool event in a direction
pub fn find_cool_event<L: Datalog>(
    dividers: &EventDividers,
    log: &L,
    start_id: i64,
    threshold: Option<u64>,
    direction: Direction,
) -> Result<Option<usize>, NavigatorError> {
    find_event(
        dividers,
        log,
        start_id,
        |packets| is_cool_event(packets, threshold),
        direction,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datalog::MemoryDatalog;
    use crate::error::DatalogError;

    /// Five events of ten packets each. Event i holds one data packet with dataword 10 * i
    fn five_events() -> (MemoryDatalog, EventDividers) {
        let mut packets = Vec::new();
        for event in 0..5u64 {
            packets.push(Packet::trigger(event * 10_000));
            for k in 1..10u64 {
                let adc = if k == 1 { (10 * event) as u8 } else { 0 };
                packets.push(Packet::data(event * 10_000 + k * 100, adc, 1, 1));
            }
        }
        let dividers = EventDividers::new(vec![0, 10, 20, 30, 40, 50], vec![]);
        (MemoryDatalog::new(packets), dividers)
    }

    #[test]
    fn test_walk_directions() {
        let forward: Vec<usize> = EventWalk::new(5, 1, Direction::Forward).collect();
        assert_eq!(forward, vec![2, 3, 4]);
        let backward: Vec<usize> = EventWalk::new(5, 3, Direction::Backward).collect();
        assert_eq!(backward, vec![2, 1, 0]);
        assert_eq!(EventWalk::new(5, 4, Direction::Forward).count(), 0);
        assert_eq!(EventWalk::new(5, 0, Direction::Backward).count(), 0);
        assert_eq!(EventWalk::new(0, 0, Direction::Forward).count(), 0);
    }

    #[test]
    fn test_walk_stays_in_bounds() {
        let backward: Vec<usize> = EventWalk::new(3, 10, Direction::Backward).collect();
        assert_eq!(backward, vec![2, 1, 0]);
        let forward: Vec<usize> = EventWalk::new(3, -10, Direction::Forward).collect();
        assert_eq!(forward, vec![0, 1, 2]);
    }

    #[test]
    fn test_walk_restartable() {
        let walk = EventWalk::new(6, 2, Direction::Forward);
        assert_eq!(walk.len(), 3);
        let first: Vec<usize> = walk.clone().collect();
        let second: Vec<usize> = walk.collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_buffer_scenario() {
        let packets = vec![
            Packet::trigger(1000),
            Packet::data(1500, 1, 1, 1),
            Packet::data(3500, 1, 1, 1),
        ];
        let log = MemoryDatalog::new(packets.clone());
        let dividers = EventDividers::new(vec![0, 3], vec![]);
        let kept = extract_event_packets(&log, &dividers, 0, 2000).unwrap();
        assert_eq!(kept, packets[0..2].to_vec());
    }

    #[test]
    fn test_buffer_edges() {
        let packets = vec![
            Packet::trigger(1000),
            Packet::data(900, 1, 1, 1),
            Packet::data(2999, 1, 1, 1),
            Packet::data(3000, 1, 1, 1),
        ];
        let kept = within_buffer(packets.clone(), 2000);
        assert_eq!(kept, vec![packets[0], packets[2]]);
        assert!(within_buffer(Vec::new(), 2000).is_empty());
    }

    #[test]
    fn test_extract_out_of_range() {
        let (log, dividers) = five_events();
        match extract_event_packets(&log, &dividers, 5, 2000) {
            Err(NavigatorError::OutOfRange { n_events, .. }) => assert_eq!(n_events, 5),
            _ => panic!(),
        }
    }

    #[test]
    fn test_coolness_threshold_is_strict() {
        let packets = vec![
            Packet::trigger(0),
            Packet::data(10, 200, 1, 1),
            Packet::data(20, 100, 1, 1),
        ];
        assert!(!is_cool_event(&packets, Some(300)));
        assert!(is_cool_event(&packets, Some(299)));
    }

    #[test]
    fn test_coolness_ignores_non_data() {
        let mut trigger = Packet::trigger(0);
        trigger.dataword = 255;
        let packets = vec![trigger, Packet::data(10, 5, 1, 1)];
        assert_eq!(adc_sum(&packets), 5);
        assert!(!is_cool_event(&packets, Some(5)));
    }

    #[test]
    fn test_coolness_default_threshold() {
        let at_threshold = vec![Packet::data(0, 200, 1, 1); 100];
        assert_eq!(adc_sum(&at_threshold), DEFAULT_COOLNESS_THRESHOLD);
        assert!(!is_cool_event(&at_threshold, None));
        let mut above = at_threshold.clone();
        above.push(Packet::data(0, 1, 1, 1));
        assert!(is_cool_event(&above, None));
    }

    #[test]
    fn test_find_single_match() {
        let (log, dividers) = five_events();
        let only_three = |packets: &[Packet]| adc_sum(packets) == 30;
        for start in 0..3 {
            assert_eq!(
                find_event(&dividers, &log, start, only_three, Direction::Forward).unwrap(),
                Some(3)
            );
            assert_eq!(
                find_event(&dividers, &log, start, only_three, Direction::Backward).unwrap(),
                None
            );
        }
        assert_eq!(
            find_event(&dividers, &log, 4, only_three, Direction::Backward).unwrap(),
            Some(3)
        );
        assert_eq!(
            find_event(&dividers, &log, 3, only_three, Direction::Forward).unwrap(),
            None
        );
        assert_eq!(
            find_event(&dividers, &log, 3, only_three, Direction::Backward).unwrap(),
            None
        );
    }

    #[test]
    fn test_find_cool_event() {
        let (log, dividers) = five_events();
        assert_eq!(
            find_cool_event(&dividers, &log, 0, Some(15), Direction::Forward).unwrap(),
            Some(2)
        );
        assert_eq!(
            find_cool_event(&dividers, &log, 4, Some(15), Direction::Backward).unwrap(),
            Some(3)
        );
        assert_eq!(
            find_cool_event(&dividers, &log, 0, None, Direction::Forward).unwrap(),
            None
        );
    }

    #[test]
    fn test_find_propagates_read_errors() {
        let (_, dividers) = five_events();
        let short_log = MemoryDatalog::new(vec![Packet::trigger(0); 15]);
        match find_event(&dividers, &short_log, 0, |_| false, Direction::Forward) {
            Err(NavigatorError::DatalogError(DatalogError::PacketRange { .. })) => (),
            _ => panic!(),
        }
    }
}
