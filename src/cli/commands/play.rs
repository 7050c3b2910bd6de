//! Interactive playback from the command line.
//!
//! Each stdin line is a key name as it would appear in the `[keys]` config
//! (`p`, `space`, `right`, ...), optionally followed by a 1-based queue
//! position that becomes the selection. `l` lists the queue, `q` quits.

use std::io::BufRead;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{RecvTimeoutError, bounded};

use crate::config::Config;
use crate::controller::{Command, Selection};
use crate::keymap::Key;
use crate::model::Episode;
use crate::player::{BackendFactory, PlaybackQueue, format_duration};
use crate::session::Session;

const TICK: Duration = Duration::from_millis(250);

/// One parsed stdin line.
#[derive(Debug, PartialEq)]
enum Input {
    Quit,
    List,
    Key(Key, Option<usize>),
    Invalid(String),
}

fn parse_input(line: &str) -> Option<Input> {
    let mut parts = line.split_whitespace();
    let first = parts.next()?;
    let input = match first {
        "q" | "quit" => Input::Quit,
        "l" | "list" => Input::List,
        name => match (name.parse::<Key>(), parts.next().map(str::parse::<usize>)) {
            (Ok(key), None) => Input::Key(key, None),
            (Ok(key), Some(Ok(pos))) if pos > 0 => Input::Key(key, Some(pos - 1)),
            (Ok(_), Some(_)) => Input::Invalid(format!("bad queue position in {:?}", line)),
            (Err(e), _) => Input::Invalid(e.to_string()),
        },
    };
    Some(input)
}

/// Queue `locators` and run the session until the user quits, or until
/// nothing is playing once stdin has closed.
pub fn cmd_play(config: &Config, locators: &[String], autoplay: bool) -> anyhow::Result<()> {
    let factory = backend_factory(config)?;
    let mut session = Session::new(config, factory)?;

    for locator in locators {
        let episode = Arc::new(Episode::from_locator(locator));
        session.run(Command::AddSelected, &Selection::Episode(episode));
    }
    if autoplay {
        session.run(Command::PausePlay, &Selection::None);
    }
    println!("{}", session.status_message());

    let (line_tx, line_rx) = bounded::<String>(16);
    thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if line_tx.send(line).is_err() {
                    break;
                }
            }
        })?;

    let mut stdin_open = true;
    let mut last_status = session.status_message().to_string();
    loop {
        if stdin_open {
            match line_rx.recv_timeout(TICK) {
                Ok(line) => {
                    if !handle_line(&mut session, &line) {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    tracing::debug!(target: "cli::play", "stdin closed, playing out the queue");
                    stdin_open = false;
                }
            }
        } else {
            if !is_playing(session.queue()) {
                break;
            }
            thread::sleep(TICK);
        }

        session.tick();
        if session.status_message() != last_status {
            last_status = session.status_message().to_string();
            println!("{}", last_status);
        }
    }

    session.shutdown();
    Ok(())
}

/// Whether anything in the queue is still playing. Stopped or paused
/// entries can't progress without input.
fn is_playing(queue: &PlaybackQueue) -> bool {
    queue.iter().any(|h| h.is_playing())
}

/// Returns `false` when the user asked to quit.
fn handle_line(session: &mut Session, line: &str) -> bool {
    match parse_input(line) {
        None => {}
        Some(Input::Quit) => return false,
        Some(Input::List) => print!("{}", render_queue(session.queue())),
        Some(Input::Invalid(msg)) => eprintln!("{}", msg),
        Some(Input::Key(key, position)) => {
            let selection = position
                .and_then(|i| session.queue().iter().nth(i))
                .map(|h| Selection::Queued(h.id()))
                .unwrap_or_default();
            if !session.handle_key(key, &selection) {
                eprintln!("{} is not bound", key);
            }
        }
    }
    true
}

/// Render the "up next" listing with per-entry state and progress.
fn render_queue(queue: &PlaybackQueue) -> String {
    if queue.is_empty() {
        return "Queue is empty\n".to_string();
    }
    queue
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let duration = h
                .duration()
                .map(format_duration)
                .unwrap_or_else(|| "--:--".to_string());
            format!(
                "{:>3}. [{:<7}] {} / {}  {}\n",
                i + 1,
                h.state().label(),
                format_duration(h.position()),
                duration,
                h.title()
            )
        })
        .collect()
}

#[cfg(unix)]
fn backend_factory(config: &Config) -> anyhow::Result<Box<dyn BackendFactory>> {
    Ok(Box::new(crate::player::MpvFactory::new(config.player.clone())))
}

#[cfg(not(unix))]
fn backend_factory(_config: &Config) -> anyhow::Result<Box<dyn BackendFactory>> {
    anyhow::bail!("The mpv IPC backend requires a Unix platform")
}
