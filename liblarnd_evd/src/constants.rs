// Packet types as written by the LArPix DAQ
pub const PACKET_TYPE_DATA: u8 = 0;
pub const PACKET_TYPE_TRIGGER: u8 = 7;

/// Maximum difference in time ticks between a hit and the event trigger
pub const DEFAULT_EVENT_BUFFER: u64 = 2000;
/// Minimum ADC sum for an event to be considered "cool"
pub const DEFAULT_COOLNESS_THRESHOLD: u64 = 20000;
/// Light triggers closer than this (in ticks) belong to the same event
pub const DEFAULT_LIGHT_MERGE_GAP: u64 = 200;
/// Number of files whose event dividers are kept in memory
pub const DEFAULT_CACHE_CAPACITY: usize = 64;

// Dataset names in the LArPix HDF5 format
pub const PACKETS_NAME: &str = "packets";
pub const LIGHT_TRIG_NAME: &str = "light_trig";
pub const LIGHT_WVFM_NAME: &str = "light_wvfm";
pub const TRACKS_NAME: &str = "tracks";
pub const MC_PACKETS_ASSN_NAME: &str = "mc_packets_assn";

// ADC timing histogram binning, in ticks relative to the event trigger
pub const ADC_HISTOGRAM_START: u64 = 0;
pub const ADC_HISTOGRAM_END: u64 = 3200;
pub const ADC_HISTOGRAM_BIN_WIDTH: u64 = 20;
