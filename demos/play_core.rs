//! # Play a core
//!
//! Loads a libretro core and a game, then runs frames at the core's own rate
//! with audio on the default output device. Frames are counted, not shown.
//!
//! ```bash
//! cargo run --example play_core -- path/to/core_libretro.so path/to/game [seconds] [config.toml]
//! cargo run --example play_core -- --list-devices
//! ```
//!
//! The index printed by `--list-devices` goes in `[output] device_index`.
//!
//! Core log lines are emitted under the `retrohost::core_log` tracing target.

use retrohost::prelude::*;
use std::time::Instant;

fn main() -> retrohost::Result<()> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1).peekable();
    if args.peek().map(String::as_str) == Some("--list-devices") {
        for device in retrohost::CpalSink::list_output_devices()? {
            println!("{device}");
        }
        return Ok(());
    }

    let (Some(core), Some(game)) = (args.next(), args.next()) else {
        eprintln!("usage: play_core <core> <game> [seconds] [config.toml]");
        eprintln!("       play_core --list-devices");
        std::process::exit(2);
    };
    let seconds: f64 = args.next().and_then(|s| s.parse().ok()).unwrap_or(10.0);
    let config = match args.next() {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };

    let frames = FrameCapture::new();
    let mut session = Session::builder()
        .config(config)
        .frame_sink(Box::new(frames.clone()))
        .build()?;
    let events = session.events();

    let info = session.load_core(&core)?;
    println!("Core: {} {}", info.library_name, info.library_version);

    let av = session.load_game(&game)?;
    println!(
        "Game: {}x{} @ {:.2} fps, {:.0} Hz audio",
        av.geometry.base_width, av.geometry.base_height, av.timing.fps, av.timing.sample_rate
    );

    let frame_time = Duration::from_secs_f64(1.0 / av.timing.fps);
    let deadline = Instant::now() + Duration::from_secs_f64(seconds);
    let mut next = Instant::now();

    while Instant::now() < deadline {
        session.run_frame()?;

        for event in events.try_iter() {
            match event {
                HostEvent::Message { text, .. } => println!("[core] {text}"),
                HostEvent::Error(kind) => eprintln!("[error] {kind}"),
                HostEvent::ShutdownRequested => {
                    println!("Core requested shutdown");
                    session.unload()?;
                    return Ok(());
                }
                HostEvent::StateChanged { .. } => {}
            }
        }

        next += frame_time;
        if let Some(wait) = next.checked_duration_since(Instant::now()) {
            std::thread::sleep(wait);
        }
    }

    let stats = session.ring_stats();
    println!(
        "Ran {} frames ({} duplicates), {} audio bytes queued, {} dropped",
        frames.presented(),
        frames.duplicates(),
        stats.bytes_written(),
        stats.bytes_dropped()
    );

    session.unload()?;
    Ok(())
}
