use std::ops::Range;

use super::error::NavigatorError;

/// The event boundaries of a datalog.
///
/// `event[i]` is the first packet of event i and `event[i + 1]` the first packet after it,
/// the last entry being the total number of packets. When the file has light data,
/// `light` holds the matching light trigger indices with the same length as `event`;
/// otherwise it is empty.
///
/// Fewer than two event boundaries means the file has no events.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EventDividers {
    pub event: Vec<usize>,
    pub light: Vec<usize>,
}

impl EventDividers {
    pub fn new(event: Vec<usize>, light: Vec<usize>) -> Self {
        Self { event, light }
    }

    /// Dividers of a file without any events
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn n_events(&self) -> usize {
        self.event.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.n_events() == 0
    }

    pub fn has_light(&self) -> bool {
        !self.light.is_empty()
    }

    /// Half-open packet range of an event
    pub fn event_range(&self, event_id: i64) -> Result<Range<usize>, NavigatorError> {
        let index = self.check_event_id(event_id)?;
        Ok(self.event[index]..self.event[index + 1])
    }

    /// Half-open light trigger range of an event. Empty if the file has no light data
    pub fn light_range(&self, event_id: i64) -> Result<Range<usize>, NavigatorError> {
        if !self.has_light() {
            return Ok(0..0);
        }
        let index = self.check_event_id(event_id)?;
        match (self.light.get(index), self.light.get(index + 1)) {
            (Some(&start), Some(&stop)) => Ok(start..stop),
            _ => Err(NavigatorError::OutOfRange {
                event_id,
                n_events: self.light.len().saturating_sub(1),
            }),
        }
    }

    /// Clamp a requested event id into the valid range.
    ///
    /// Returns None when there are no events to clamp to.
    pub fn clamp_event_id(&self, requested: i64) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        let last = (self.n_events() - 1) as i64;
        Some(requested.clamp(0, last) as usize)
    }

    /// Every boundary is larger than the one before it
    pub fn is_strictly_increasing(&self) -> bool {
        self.event.windows(2).all(|w| w[0] < w[1])
    }

    fn check_event_id(&self, event_id: i64) -> Result<usize, NavigatorError> {
        let n_events = self.n_events();
        if event_id < 0 || event_id as u64 >= n_events as u64 {
            return Err(NavigatorError::OutOfRange { event_id, n_events });
        }
        Ok(event_id as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_events() -> EventDividers {
        EventDividers::new(vec![0, 50, 120, 150], vec![])
    }

    #[test]
    fn test_event_range() {
        let dividers = three_events();
        assert_eq!(dividers.n_events(), 3);
        assert_eq!(dividers.event_range(0).unwrap(), 0..50);
        assert_eq!(dividers.event_range(2).unwrap(), 120..150);
        assert_eq!(
            dividers.event_range(1).unwrap(),
            dividers.event_range(1).unwrap()
        );
        for bad in [-1, 3, 100] {
            match dividers.event_range(bad) {
                Err(NavigatorError::OutOfRange { event_id, n_events }) => {
                    assert_eq!(event_id, bad);
                    assert_eq!(n_events, 3);
                }
                _ => panic!(),
            }
        }
    }

    #[test]
    fn test_clamp() {
        let dividers = three_events();
        assert_eq!(dividers.clamp_event_id(5), Some(2));
        assert_eq!(dividers.clamp_event_id(-4), Some(0));
        for id in 0..3 {
            assert_eq!(dividers.clamp_event_id(id), Some(id as usize));
        }
        assert_eq!(EventDividers::empty().clamp_event_id(0), None);
        assert_eq!(EventDividers::new(vec![150], vec![]).clamp_event_id(0), None);
    }

    #[test]
    fn test_light_range() {
        let dividers = three_events();
        assert_eq!(dividers.light_range(1).unwrap(), 0..0);

        let with_light = EventDividers::new(vec![0, 50, 120, 150], vec![0, 2, 3, 6]);
        assert_eq!(with_light.light_range(0).unwrap(), 0..2);
        assert_eq!(with_light.light_range(2).unwrap(), 3..6);
        assert!(with_light.light_range(3).is_err());
        assert!(with_light.light_range(-1).is_err());
    }

    #[test]
    fn test_empty() {
        let dividers = EventDividers::empty();
        assert_eq!(dividers.n_events(), 0);
        assert!(dividers.event_range(0).is_err());
        assert!(dividers.is_strictly_increasing());
    }
}
