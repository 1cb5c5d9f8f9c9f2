//! Session wiring: config, builder, and the pipeline run flag following the
//! host state.

mod helpers;

use helpers::*;
use retrohost::audio::NullSink;
use retrohost::core::PixelFormat;
use retrohost::prelude::*;
use retrohost::{ErrorKind, HostConfig};
use std::path::Path;
use tempfile::TempDir;

fn session_in(dir: &Path) -> (Session, FrameCapture, InputPorts) {
    let frames = FrameCapture::new();
    let ports = InputPorts::new(2);
    let session = Session::builder()
        .system_directory(dir.join("system"))
        .save_directory(dir.join("saves"))
        .target_fill(Duration::from_millis(40))
        .sink(Box::new(NullSink::new()))
        .frame_sink(Box::new(frames.clone()))
        .input_source(Box::new(ports.clone()))
        .build()
        .unwrap();
    (session, frames, ports)
}

fn loaded_session(dir: &TempDir) -> (Session, FrameCapture, InputPorts) {
    let (mut session, frames, ports) = session_in(dir.path());
    session
        .host_mut()
        .attach_core(tone_symbols(), "tone_libretro.so")
        .unwrap();
    session.load_game(write_game(dir.path())).unwrap();
    (session, frames, ports)
}

#[test]
fn test_pipeline_idle_until_game_loaded() {
    let dir = TempDir::new().unwrap();
    let (mut session, _frames, _ports) = session_in(dir.path());
    assert_eq!(session.state(), CoreState::NeedCore);
    assert!(!session.pipeline().is_running());
    assert!(session.pipeline().formats().current().is_none());

    session
        .host_mut()
        .attach_core(tone_symbols(), "tone_libretro.so")
        .unwrap();
    assert_eq!(session.state(), CoreState::NeedGame);
    assert!(!session.pipeline().is_running());

    let av = session.load_game(write_game(dir.path())).unwrap();
    assert_eq!(av.timing.fps, TONE_FPS);
    assert_eq!(session.state(), CoreState::Ready);
    assert!(session.pipeline().is_running());

    let format = session.pipeline().formats().current().unwrap();
    assert_eq!(format.sample_rate, TONE_RATE as u32);
    assert_eq!(format.channels, 2);
}

#[test]
fn test_run_frame_feeds_ring_and_frame_sink() {
    let dir = TempDir::new().unwrap();
    let (mut session, frames, ports) = loaded_session(&dir);
    let stats = session.ring_stats();

    for _ in 0..5 {
        session.run_frame().unwrap();
    }

    assert_eq!(runs(), 5);
    let pushed = stats.bytes_written() + stats.bytes_dropped();
    assert_eq!(pushed, (5 * FRAMES_PER_RUN * 4) as u64);

    assert_eq!(frames.presented(), 5);
    let frame = frames.latest().unwrap();
    assert_eq!((frame.width, frame.height), (4, 4));
    assert_eq!(frame.format, PixelFormat::Rgb565);
    assert_eq!(ports.polls(), 5);
}

#[test]
fn test_pause_and_resume_follow_state() {
    let dir = TempDir::new().unwrap();
    let (mut session, _frames, _ports) = loaded_session(&dir);

    session.pause();
    assert!(session.is_paused());
    assert!(!session.pipeline().is_running());

    // Frames still run while audio is paused.
    session.run_frame().unwrap();
    assert_eq!(session.state(), CoreState::Ready);

    session.resume();
    assert!(!session.is_paused());
    assert!(session.pipeline().is_running());
}

#[test]
fn test_unload_silences_pipeline() {
    let dir = TempDir::new().unwrap();
    let (mut session, _frames, _ports) = loaded_session(&dir);
    session.run_frame().unwrap();

    session.unload().unwrap();
    assert_eq!(session.state(), CoreState::NeedCore);
    assert!(!session.pipeline().is_running());
    assert!(session.pipeline().formats().current().is_none());

    // Reloading brings it back.
    session
        .host_mut()
        .attach_core(tone_symbols(), "tone_libretro.so")
        .unwrap();
    session.load_game(write_game(dir.path())).unwrap();
    assert!(session.pipeline().is_running());
}

#[test]
fn test_run_frame_catches_up_with_direct_host_changes() {
    let dir = TempDir::new().unwrap();
    let (mut session, _frames, _ports) = session_in(dir.path());
    session
        .host_mut()
        .attach_core(tone_symbols(), "tone_libretro.so")
        .unwrap();
    session.host_mut().load_game(write_game(dir.path())).unwrap();
    assert_eq!(session.state(), CoreState::Ready);

    session.run_frame().unwrap();
    assert!(session.pipeline().is_running());

    session.host_mut().unload().unwrap();
    assert!(session.run_frame().is_err());
    assert!(!session.pipeline().is_running());
}

#[test]
fn test_resume_before_game_stays_idle() {
    let dir = TempDir::new().unwrap();
    let (mut session, _frames, _ports) = session_in(dir.path());
    session.pause();
    session.resume();
    assert!(!session.pipeline().is_running());
}

#[test]
fn test_host_errors_surface_through_session() {
    let dir = TempDir::new().unwrap();
    let (mut session, _frames, _ports) = session_in(dir.path());

    let err = session.run_frame().unwrap_err();
    assert_eq!(err.host_kind(), Some(ErrorKind::Usage));

    let err = session.load_core(dir.path().join("core.txt")).unwrap_err();
    assert_eq!(err.host_kind(), Some(ErrorKind::CoreNotLibraryError));
    assert_eq!(session.state(), CoreState::Error);
}

#[test]
fn test_save_state_through_host() {
    let dir = TempDir::new().unwrap();
    let (mut session, _frames, _ports) = loaded_session(&dir);
    session.run_frame().unwrap();

    let path = session.host_mut().save_state().unwrap();
    assert!(path.starts_with(dir.path().join("saves")));
    assert!(path.exists());
    session.run_frame().unwrap();
    session.host_mut().load_state().unwrap();
    assert_eq!(session.state(), CoreState::Ready);
}

#[test]
fn test_volume_is_shared_with_pipeline() {
    let dir = TempDir::new().unwrap();
    let (session, _frames, _ports) = session_in(dir.path());
    assert_eq!(session.volume(), 1.0);
    session.set_volume(0.5);
    assert_eq!(session.pipeline().volume(), 0.5);
    assert_eq!(session.pipeline().control().volume(), 0.5);
}

#[test]
fn test_config_file_drives_builder() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("retrohost.toml");
    std::fs::write(
        &path,
        format!(
            "[host]\nsave_directory = {:?}\n\n[audio]\ntarget_fill_ms = 32\nquality = \"fast\"\n\n[output]\nvolume = 0.75\n",
            dir.path().join("my-saves")
        ),
    )
    .unwrap();

    let config = SessionConfig::load(&path).unwrap();
    let session = Session::builder()
        .config(config)
        .sink(Box::new(NullSink::new()))
        .build()
        .unwrap();

    assert_eq!(
        session.host().config().save_directory,
        dir.path().join("my-saves")
    );
    assert_eq!(
        session.pipeline().config().target_fill,
        Duration::from_millis(32)
    );
    assert_eq!(session.volume(), 0.75);
}

#[test]
fn test_missing_config_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let result = SessionConfig::load(dir.path().join("absent.toml"));
    assert!(matches!(result, Err(Error::Io(_))));
}

#[test]
fn test_host_config_defaults_match_session_defaults() {
    let config = SessionConfig::default();
    let defaults = HostConfig::default();
    let host = config.host_config();
    assert_eq!(host.system_directory, defaults.system_directory);
    assert_eq!(host.save_directory, defaults.save_directory);
    assert!(host.content_directory.is_none());
}
