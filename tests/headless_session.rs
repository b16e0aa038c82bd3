use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use keyrace::config::{Config, Mode};
use keyrace::runtime::{RaceEvent, Runner};
use keyrace::session::{is_valid_byte, Keystroke, Progress, Session, TICKS_PER_SAMPLE};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn words_config() -> Config {
    Config {
        mode: Mode::Words,
        words_test_size: 4,
        words_per_line: 2,
        window_size: 2,
        allow_backspace: true,
        ..Config::default()
    }
}

fn build_session(config: &Config, words: &[&str]) -> Session {
    let words: Vec<String> = words.iter().map(|w| w.to_string()).collect();
    let mut rng = StdRng::seed_from_u64(11);
    Session::new(config, &words, &mut rng).unwrap()
}

// Headless integration using the runtime + Session without a TTY.
// Verifies that a minimal typing flow completes via a channel-fed runner.
#[test]
fn headless_typing_flow_completes() {
    let mut session = build_session(&words_config(), &["cat", "dog"]);
    let target = session.target().to_string();

    let (tx, rx) = mpsc::channel();
    let runner = Runner::with_tick(rx, Duration::from_millis(5));

    for c in target.chars() {
        tx.send(RaceEvent::Key(KeyEvent::new(
            KeyCode::Char(c),
            KeyModifiers::NONE,
        )))
        .unwrap();
    }

    for _ in 0..500u32 {
        match runner.step() {
            RaceEvent::Tick => {
                session.on_tick();
            }
            RaceEvent::Resize => {}
            RaceEvent::Key(key) => {
                if let KeyCode::Char(c) = key.code {
                    if c.is_ascii() && is_valid_byte(c as u8) {
                        if !session.has_started() {
                            session.start();
                        }
                        if session.handle_keystroke(Keystroke::Byte(c as u8))
                            == Progress::Completed
                        {
                            break;
                        }
                    }
                }
            }
        }
    }

    assert!(session.has_finished(), "session should have completed");
    let record = session.finalize();
    assert_eq!(record.input, target);
    assert_eq!(record.accuracy, 1.0);
    assert_eq!(record.rle, format!("{}m", target.len()));
}

#[test]
fn mistakes_and_backspace_shape_the_trace() {
    let mut session = build_session(&words_config(), &["cat", "dog"]);
    let target = session.target().to_string();
    let bytes = target.as_bytes();

    // first byte wrong, corrected with backspace, then the rest clean
    let wrong = if bytes[0] == b'z' { b'q' } else { b'z' };
    session.handle_keystroke(Keystroke::Byte(wrong));
    session.handle_keystroke(Keystroke::Backspace);
    for &b in bytes {
        session.handle_keystroke(Keystroke::Byte(b));
    }

    assert!(session.has_finished());
    let record = session.finalize();
    // the trace reflects the final input, not the detour
    assert_eq!(record.input, target);
    assert_eq!(record.accuracy, 1.0);
}

#[test]
fn viewport_window_slides_as_lines_complete() {
    let config = Config {
        mode: Mode::Words,
        words_test_size: 6,
        words_per_line: 2,
        window_size: 1,
        allow_backspace: false,
        ..Config::default()
    };
    let mut session = build_session(&config, &["aa", "bb", "cc"]);
    let target = session.target().to_string();
    let offsets = session.line_offsets().to_vec();
    assert!(offsets.len() >= 2, "target should span several lines");

    let (initial, _) = session.render_span();
    assert_eq!(initial.left_idx, 0);
    assert_eq!(initial.right_idx, offsets[1]);

    // type through the end of the first line
    for &b in &target.as_bytes()[..offsets[1]] {
        session.handle_keystroke(Keystroke::Byte(b));
    }

    let (slid, _) = session.render_span();
    assert_eq!(slid.left_idx, offsets[1]);
    assert!(slid.right_idx > slid.left_idx);
}

#[test]
fn headless_timed_session_finishes_by_time() {
    let config = Config {
        mode: Mode::Time,
        duration_secs: 1,
        test_size: 50,
        words_per_line: 5,
        ..Config::default()
    };
    let mut session = build_session(&config, &["cat", "dog", "bird"]);
    session.start();
    session.handle_keystroke(Keystroke::Byte(session.target().as_bytes()[0]));

    let mut completed = false;
    for _ in 0..(TICKS_PER_SAMPLE * 2) {
        if session.on_tick() == Progress::Completed {
            completed = true;
            break;
        }
    }

    assert!(completed, "countdown should have expired");
    let record = session.finalize();
    assert_eq!(record.mode, Mode::Time);
    assert_eq!(record.input.len(), 1);
}

#[test]
fn samples_land_once_per_second_of_ticks() {
    let mut session = build_session(&words_config(), &["cat", "dog"]);
    session.start();
    session.handle_keystroke(Keystroke::Byte(session.target().as_bytes()[0]));

    for _ in 0..(TICKS_PER_SAMPLE * 3) {
        session.on_tick();
    }

    let record = session.finalize();
    assert_eq!(record.cps_samples.len(), 3);
    assert_eq!(record.sample_rate, 1);
    // one committed byte in the first second, none after
    assert_eq!(record.cps_samples[0], 1.0);
    assert_eq!(record.cps_samples[1], 0.0);
}
