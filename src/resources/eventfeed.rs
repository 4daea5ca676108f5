//! Agent event feed.
//!
//! Events come from one of three sources, each read on a helper thread:
//!
//! - a file of JSON lines
//! - standard input (`--events -`), for piping a live agent log
//! - a scripted demo session that loops forever (`--demo`)
//!
//! The thread parses lines into [`AgentEvent`] and sends them over a
//! channel; [`crate::systems::agentevents::poll_event_feed`] drains it into
//! the ECS message queue every frame. Malformed lines are logged and skipped.

use bevy_ecs::prelude::*;
use crossbeam_channel::{Receiver, Sender, unbounded};
use log::{info, warn};
use std::io::BufRead;
use std::path::PathBuf;
use std::time::Duration;

use crate::events::agentevent::{AgentEvent, EventKind};

#[derive(Debug, Clone, PartialEq)]
pub enum FeedSource {
    Stdin,
    File(PathBuf),
    /// Scripted session; the factor scales every pause.
    Demo { speed: f32 },
}

impl FeedSource {
    /// `-` means stdin, anything else a file path.
    pub fn from_arg(arg: &str) -> Self {
        if arg.trim() == "-" {
            FeedSource::Stdin
        } else {
            FeedSource::File(PathBuf::from(arg))
        }
    }
}

#[derive(Resource)]
pub struct EventFeed {
    pub rx: Receiver<AgentEvent>,
}

impl EventFeed {
    /// Start reading from `source` on a helper thread.
    ///
    /// The thread is detached: a blocking stdin read cannot be interrupted,
    /// and every source ends on its own once the receiver is dropped.
    pub fn spawn(source: FeedSource) -> Result<Self, String> {
        let (tx, rx) = unbounded::<AgentEvent>();
        let label = match &source {
            FeedSource::Stdin => "stdin".to_string(),
            FeedSource::File(path) => path.display().to_string(),
            FeedSource::Demo { .. } => "demo".to_string(),
        };
        match source {
            FeedSource::Stdin => {
                std::thread::spawn(move || {
                    let n = pump_lines(std::io::stdin().lock(), &tx);
                    info!("stdin closed after {} events", n);
                });
            }
            FeedSource::File(path) => {
                let file = std::fs::File::open(&path)
                    .map_err(|e| format!("Failed to open event file {}: {}", path.display(), e))?;
                std::thread::spawn(move || {
                    let n = pump_lines(std::io::BufReader::new(file), &tx);
                    info!("event file {} finished after {} events", path.display(), n);
                });
            }
            FeedSource::Demo { speed } => {
                std::thread::spawn(move || demo_thread(tx, speed));
            }
        }
        info!("event feed reading from {}", label);
        Ok(Self { rx })
    }

    /// A feed driven by hand through the returned sender.
    pub fn manual() -> (Self, Sender<AgentEvent>) {
        let (tx, rx) = unbounded::<AgentEvent>();
        (Self { rx }, tx)
    }
}

/// Parse JSON lines from `reader` and send them. Blank lines are skipped,
/// malformed ones logged. Returns the number of events sent.
pub fn pump_lines(reader: impl BufRead, tx: &Sender<AgentEvent>) -> usize {
    let mut sent = 0;
    for (n, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("event feed read error: {}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match AgentEvent::from_json(&line) {
            Ok(event) => {
                if tx.send(event).is_err() {
                    break;
                }
                sent += 1;
            }
            Err(e) => warn!("line {}: {}", n + 1, e),
        }
    }
    sent
}

/// One scripted session: pause in seconds before each event.
pub fn demo_script() -> Vec<(f32, AgentEvent)> {
    vec![
        (0.5, AgentEvent::new(EventKind::SessionStart)),
        (5.0, AgentEvent::new(EventKind::UserPrompt).with_message("add a particle pool")),
        (1.5, AgentEvent::new(EventKind::Thinking)),
        (3.0, AgentEvent::tool_use("Read").with_message("src/components/particles.rs")),
        (3.0, AgentEvent::tool_use("Grep").with_message("free_list")),
        (3.0, AgentEvent::tool_use("Edit").with_message("src/components/particles.rs")),
        (4.0, AgentEvent::tool_use("Bash").with_message("cargo test")),
        (3.0, AgentEvent::new(EventKind::Error).with_message("2 tests failed")),
        (2.5, AgentEvent::new(EventKind::Thinking)),
        (3.0, AgentEvent::tool_use("Edit").with_message("src/components/particles.rs")),
        (4.0, AgentEvent::tool_use("Bash").with_message("cargo test")),
        (3.0, AgentEvent::new(EventKind::ToolResult)),
        (1.5, AgentEvent::new(EventKind::TaskComplete).with_message("all tests pass")),
        (6.0, AgentEvent::new(EventKind::Idle)),
        (6.0, AgentEvent::new(EventKind::SessionEnd)),
        (6.0, AgentEvent::new(EventKind::Stop)),
    ]
}

fn demo_thread(tx: Sender<AgentEvent>, speed: f32) {
    let speed = if speed > 0.0 { speed } else { 1.0 };
    let script = demo_script();
    loop {
        for (pause, event) in &script {
            std::thread::sleep(Duration::from_secs_f32(pause / speed));
            if tx.send(event.clone()).is_err() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn pump_skips_blank_and_malformed_lines() {
        let input = concat!(
            "{\"type\":\"session_start\"}\n",
            "\n",
            " not json\n",
            "{\"type\":\"tool_use\",\"tool\":\"Bash\"}\n",
        );
        let (tx, rx) = unbounded();
        assert_eq!(pump_lines(Cursor::new(input), &tx), 2);
        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events[0].kind, EventKind::SessionStart);
        assert_eq!(events[1].tool.as_deref(), Some("Bash"));
    }

    #[test]
    fn from_arg_recognises_stdin() {
        assert_eq!(FeedSource::from_arg("-"), FeedSource::Stdin);
        assert_eq!(
            FeedSource::from_arg("log.jsonl"),
            FeedSource::File(PathBuf::from("log.jsonl"))
        );
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(EventFeed::spawn(FeedSource::File("/no/such/feed.jsonl".into())).is_err());
    }

    #[test]
    fn demo_session_starts_and_ends() {
        let script = demo_script();
        assert_eq!(script.first().map(|(_, e)| e.kind), Some(EventKind::SessionStart));
        assert!(script.iter().any(|(_, e)| e.kind == EventKind::SessionEnd));
        assert!(script.iter().all(|(pause, _)| *pause > 0.0));
    }

    #[test]
    fn file_feed_delivers_events() {
        let path = std::env::temp_dir()
            .join(format!("wizardwatch-feed-{}.jsonl", std::process::id()));
        std::fs::write(&path, "{\"type\":\"error\"}\n").unwrap();
        let feed = EventFeed::spawn(FeedSource::File(path.clone())).unwrap();
        let event = feed.rx.recv_timeout(Duration::from_secs(2)).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(event.kind, EventKind::Error);
    }
}
