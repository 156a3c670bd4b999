use hdf5::H5Type;

use super::constants::{PACKET_TYPE_DATA, PACKET_TYPE_TRIGGER};

/// The kind of a LArPix packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketType {
    Data,
    Trigger,
    Other(u8),
}

impl From<u8> for PacketType {
    fn from(value: u8) -> Self {
        match value {
            PACKET_TYPE_DATA => Self::Data,
            PACKET_TYPE_TRIGGER => Self::Trigger,
            other => Self::Other(other),
        }
    }
}

/// A single row of the packets table.
///
/// Only the members needed for segmentation and navigation are read; HDF5 matches
/// compound members by name, so any other columns of the file are ignored.
#[derive(H5Type, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(C)]
pub struct Packet {
    pub io_group: u8,
    pub io_channel: u8,
    pub packet_type: u8,
    pub timestamp: u64,
    pub dataword: u8,
}

impl Packet {
    pub fn data(timestamp: u64, dataword: u8, io_group: u8, io_channel: u8) -> Self {
        Self {
            io_group,
            io_channel,
            packet_type: PACKET_TYPE_DATA,
            timestamp,
            dataword,
        }
    }

    pub fn trigger(timestamp: u64) -> Self {
        Self {
            packet_type: PACKET_TYPE_TRIGGER,
            timestamp,
            ..Default::default()
        }
    }

    pub fn kind(&self) -> PacketType {
        PacketType::from(self.packet_type)
    }

    pub fn is_trigger(&self) -> bool {
        self.kind() == PacketType::Trigger
    }

    pub fn is_data(&self) -> bool {
        self.kind() == PacketType::Data
    }

    /// The detector module this packet was read out from
    pub fn module_id(&self) -> u8 {
        self.io_group.div_ceil(2)
    }
}

/// The part of a light_trig row used to align light and charge triggers
#[derive(H5Type, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(C)]
pub struct LightSync {
    pub ts_sync: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_kind() {
        assert_eq!(Packet::trigger(10).kind(), PacketType::Trigger);
        assert_eq!(Packet::data(10, 5, 1, 1).kind(), PacketType::Data);
        let sync = Packet {
            packet_type: 6,
            ..Default::default()
        };
        assert_eq!(sync.kind(), PacketType::Other(6));
        assert!(!sync.is_trigger() && !sync.is_data());
    }

    #[test]
    fn test_module_id() {
        assert_eq!(Packet::data(0, 0, 1, 1).module_id(), 1);
        assert_eq!(Packet::data(0, 0, 2, 1).module_id(), 1);
        assert_eq!(Packet::data(0, 0, 3, 1).module_id(), 2);
        assert_eq!(Packet::data(0, 0, 8, 1).module_id(), 4);
    }
}
