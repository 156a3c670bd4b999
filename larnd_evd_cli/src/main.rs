use clap::{value_parser, Arg, ArgMatches, Command};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use indicatif_log_bridge::LogWrapper;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use liblarnd_evd::config::Config;
use liblarnd_evd::display::EventDisplay;
use liblarnd_evd::hdf_reader::Hdf5Source;
use liblarnd_evd::navigator::adc_sum;

fn make_template_config(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    let yaml_str = serde_yaml::to_string(&config)?;
    let mut file = File::create(path)?;
    file.write_all(yaml_str.as_bytes())?;
    Ok(())
}

/// Send the library's spdlog output to a log file
fn init_library_log() -> Result<(), spdlog::Error> {
    let file_sink = Arc::new(
        spdlog::sink::FileSink::builder()
            .path(PathBuf::from("./larnd_evd.log"))
            .formatter(spdlog::formatter::PatternFormatter::new(
                spdlog::formatter::pattern!(
                    "[{date_short} {time_short}] - [thread: {tid}] - [{^{level}}] - {payload}{eol}"
                ),
            ))
            .truncate(true)
            .build()?,
    );
    let logger = Arc::new(
        spdlog::Logger::builder()
            .flush_level_filter(spdlog::LevelFilter::All)
            .sink(file_sink)
            .build()?,
    );
    spdlog::set_default_logger(logger);
    Ok(())
}

fn file_arg() -> Arg {
    Arg::new("file")
        .required(true)
        .help("Datalog file, relative to the data_path of the config")
}

fn event_arg() -> Arg {
    Arg::new("event")
        .required(true)
        .allow_negative_numbers(true)
        .value_parser(value_parser!(i64))
        .help("Event id")
}

fn threshold_arg() -> Arg {
    Arg::new("threshold")
        .short('t')
        .long("threshold")
        .value_parser(value_parser!(u64))
        .help("Minimum ADC sum of a cool event")
}

fn get_file(display: &EventDisplay<Hdf5Source>, matches: &ArgMatches) -> PathBuf {
    let name = matches
        .get_one::<String>("file")
        .map(PathBuf::from)
        .unwrap_or_default();
    display.resolve(&name)
}

fn print_info(display: &EventDisplay<Hdf5Source>, path: &Path) {
    let summary = match display.open_file(path) {
        Ok(s) => s,
        Err(e) => {
            log::error!("{e}");
            return;
        }
    };
    log::info!("File: {}", summary.path.to_string_lossy());
    log::info!("Size: {}", summary.human_size());
    log::info!("Tables: {}", summary.keys.join(", "));
    log::info!("Packets: {}", summary.n_packets);
    log::info!(
        "Light triggers: {} (light data: {}, truth tracks: {})",
        summary.n_light_triggers,
        summary.has_light,
        summary.has_truth
    );
    match display.total_events(path) {
        Ok(n) => log::info!("Events: {n}"),
        Err(e) => log::error!("{e}"),
    }
}

fn print_event(display: &EventDisplay<Hdf5Source>, path: &Path, requested: i64) {
    let event_id = match display.select_event(path, requested) {
        Ok(Some(id)) => id,
        Ok(None) => {
            log::warn!("{} contains no events", path.to_string_lossy());
            return;
        }
        Err(e) => {
            log::error!("{e}");
            return;
        }
    };
    if event_id as i64 != requested {
        log::warn!("Event {requested} does not exist, showing event {event_id}");
    }

    let event = match display.event(path, event_id as i64) {
        Ok(ev) => ev,
        Err(e) => {
            log::error!("{e}");
            return;
        }
    };
    log::info!(
        "Event {} -- packets {}..{}, trigger timestamp {}",
        event.event_id,
        event.packet_range.start,
        event.packet_range.end,
        event.trigger_timestamp
    );
    log::info!(
        "{} packets within buffer, {} hits, ADC sum {}",
        event.packets.len(),
        event.n_hits(),
        adc_sum(&event.packets)
    );

    match display.adc_timing_histograms(path, event_id as i64) {
        Ok(histograms) => {
            for histo in histograms {
                log::info!("Module {}: {} hits in time window", histo.module_id, histo.entries());
            }
        }
        Err(e) => log::error!("{e}"),
    }

    if !event.light_range.is_empty() {
        match display.light_integrals(path, event_id as i64) {
            Ok((integrals, minimum)) => {
                log::info!(
                    "Light triggers {}..{} ({} with waveforms), minimum integral {:?}",
                    event.light_range.start,
                    event.light_range.end,
                    integrals.len(),
                    minimum
                );
            }
            Err(e) => log::error!("{e}"),
        }
    }
}

fn print_cool(
    display: &EventDisplay<Hdf5Source>,
    path: &Path,
    event_id: i64,
    threshold: Option<u64>,
    forward: bool,
) {
    let result = if forward {
        display.next_cool_event(path, event_id, threshold)
    } else {
        display.previous_cool_event(path, event_id, threshold)
    };
    match result {
        Ok(Some(id)) => log::info!("Cool event: {id}"),
        Ok(None) => log::info!("No cool event found, staying at event {event_id}"),
        Err(e) => log::error!("{e}"),
    }
}

fn scan(
    display: &EventDisplay<Hdf5Source>,
    path: &Path,
    threshold: Option<u64>,
    pb_manager: &MultiProgress,
) {
    let pb = pb_manager.add(ProgressBar::new(0));
    if let Ok(style) = ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} events") {
        pb.set_style(style);
    }
    let result = display.scan_cool_events(path, threshold, |done, total| {
        pb.set_length(total as u64);
        pb.set_position(done as u64);
    });
    pb.finish();
    match result {
        Ok(cool) => {
            log::info!("Found {} cool events", cool.len());
            for id in cool {
                log::info!("Cool event: {id}");
            }
        }
        Err(e) => log::error!("{e}"),
    }
}

fn main() {
    // Create a cli
    let matches = Command::new("larnd_evd_cli")
        .arg_required_else_help(true)
        .subcommand(Command::new("new").about("Make a template configuration yaml file"))
        .subcommand(
            Command::new("info")
                .about("Describe a datalog and count its events")
                .arg(file_arg()),
        )
        .subcommand(
            Command::new("event")
                .about("Show a single event")
                .arg(file_arg())
                .arg(event_arg()),
        )
        .subcommand(
            Command::new("next-cool")
                .about("Find the next cool event after the given one")
                .arg(file_arg())
                .arg(event_arg())
                .arg(threshold_arg()),
        )
        .subcommand(
            Command::new("prev-cool")
                .about("Find the previous cool event before the given one")
                .arg(file_arg())
                .arg(event_arg())
                .arg(threshold_arg()),
        )
        .subcommand(
            Command::new("scan")
                .about("List every cool event of a datalog")
                .arg(file_arg())
                .arg(threshold_arg()),
        )
        .arg(
            Arg::new("path")
                .short('p')
                .long("path")
                .global(true)
                .help("Path to the configuration file"),
        )
        .get_matches();

    // Initialize feedback
    let logger = simplelog::TermLogger::new(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );

    let pb_manager = MultiProgress::new();

    if let Err(e) = LogWrapper::new(pb_manager.clone(), logger).try_init() {
        eprintln!("Could not create logging/progress: {e}");
        return;
    }
    if let Err(e) = init_library_log() {
        log::warn!("Could not create log file, library messages will be lost: {e}");
    }

    // Parse the cli
    let config_path = matches.get_one::<String>("path").map(PathBuf::from);

    if let Some(("new", _)) = matches.subcommand() {
        let Some(config_path) = config_path else {
            log::error!("The new command requires a --path to write the config to");
            return;
        };
        log::info!(
            "Making a template config at {}...",
            config_path.to_string_lossy()
        );
        match make_template_config(&config_path) {
            Ok(()) => log::info!("Done."),
            Err(e) => log::error!("Failed to write template config: {e}"),
        }
        return;
    }

    // Load our config
    let config = match &config_path {
        Some(path) => {
            log::info!("Loading config from {}...", path.to_string_lossy());
            match Config::read_config_file(path) {
                Ok(c) => c,
                Err(e) => {
                    log::error!("{e}");
                    return;
                }
            }
        }
        None => Config::default(),
    };
    if !config.is_cache_capacity_valid() || !config.is_event_buffer_valid() {
        log::error!("cache_capacity and event_buffer must both be at least 1");
        return;
    }
    log::info!("Data Path: {}", config.data_path.to_string_lossy());
    log::info!(
        "Event Buffer: {} ticks Light Merge Gap: {} ticks",
        config.event_buffer,
        config.light_merge_gap
    );

    let display = EventDisplay::from_config(config);

    match matches.subcommand() {
        Some(("info", sub)) => print_info(&display, &get_file(&display, sub)),
        Some(("event", sub)) => {
            let event_id = sub.get_one::<i64>("event").copied().unwrap_or_default();
            print_event(&display, &get_file(&display, sub), event_id)
        }
        Some(("next-cool", sub)) | Some(("prev-cool", sub)) => {
            let forward = matches.subcommand_name() == Some("next-cool");
            let event_id = sub.get_one::<i64>("event").copied().unwrap_or_default();
            let threshold = sub.get_one::<u64>("threshold").copied();
            print_cool(
                &display,
                &get_file(&display, sub),
                event_id,
                threshold,
                forward,
            )
        }
        Some(("scan", sub)) => {
            let threshold = sub.get_one::<u64>("threshold").copied();
            scan(&display, &get_file(&display, sub), threshold, &pb_manager)
        }
        _ => log::error!("Unrecognized command"),
    }

    log::info!("Done.");
}
