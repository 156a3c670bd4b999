//! # larnd_evd
//!
//! larnd_evd is the backend of the LArPix event display, written in Rust. It takes the
//! HDF5 packet logs written by the LArPix readout of a liquid argon TPC (optionally with
//! light detector triggers and waveforms) and splits them into events that can be browsed
//! one by one.
//!
//! ## Installation
//!
//! Currently the only method of install is from source, which is laid out below.
//!
//! ### HDF5
//!
//! Before building larnd_evd, HDF5 must be installed. Typically this will be installed
//! using a package manager (homebrew, apt, etc), and the Rust libraries will auto detect
//! the location of the HDF install. If a custom install is needed, write the following
//! snippet into the file `.cargo/config.toml` in the larnd_evd repository:
//!
//! ```toml
//! [env]
//! HDF5_DIR="/path/to/my/hdf5/install/"
//!
//! [build]
//! rustflags="-C link-args=-Wl,-rpath,/path/to/my/hdf5/install/lib"
//! ```
//!
//! ### Building & Install
//!
//! To build and install the CLI use `cargo install --path ./larnd_evd_cli` from the top
//! level larnd_evd repository. Run `larnd_evd_cli --help` for its commands.
//!
//! ## Events
//!
//! Events are found by looking at the trigger packets (`packet_type == 7`) of a file:
//!
//! - Files without light data: every run of adjacent trigger packets starts a new event
//! at the last trigger of the run.
//! - Files with light data: charge triggers are paired with light triggers having the
//! exact same timestamp (`light_trig.ts_sync`). Pairs less than or equal to 200 ticks
//! apart are merged into a single event.
//!
//! The last event runs to the end of the file. A file needs at least two trigger packets
//! to contain any events. When an event is loaded, only the packets within 2000 ticks of
//! the trigger are kept.
//!
//! Segmenting a file reads the whole packets table, so the result is cached per file
//! path (64 files by default, least recently used are dropped first).
//!
//! "Cool" events are events whose data packets have an ADC sum above a threshold (20000
//! by default); the display can jump forwards or backwards to the next cool event.
//!
//! ## Configuration
//!
//! The YAML format of a configuration file is as follows:
//!
//! ```yml
//! data_path: .
//! event_buffer: 2000
//! coolness_threshold: 20000
//! light_merge_gap: 200
//! cache_capacity: 64
//! ```
//!
//! Missing fields take the values shown above.
//!
//! ## Input
//!
//! The data format read from the HDF5 file is as follows:
//!
//! ```text
//! run.h5
//! |---- packets(dset) - io_group, io_channel, packet_type, timestamp, dataword, ...
//! |---- light_trig(dset) - ts_sync, ... (optional)
//! |---- light_wvfm(dset) - [light trigger][channel][sample] (optional)
//! |---- tracks(dset), mc_packets_assn(dset) (optional)
//! ```
pub mod config;
pub mod constants;
pub mod datalog;
pub mod display;
pub mod divider_cache;
pub mod dividers;
pub mod error;
pub mod event;
pub mod hdf_reader;
pub mod navigator;
pub mod packet;
pub mod segmenter;
