use super::error::{LabelError, Result};
use super::score::{Score, parse_info_score};

use std::collections::HashSet;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

pub const ENGINE_READY_TIMEOUT: Duration = Duration::from_secs(30);
pub const ENGINE_QUIT_TIMEOUT: Duration = Duration::from_millis(300);
pub const ENGINE_QUIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Position evaluation backend used by the labeler.
pub trait Evaluator {
    /// Called before the first sampled position of every labeled game.
    fn new_game(&mut self) -> Result<()>;

    /// Evaluate the position reached by `position_command` with a node
    /// budget. The score is relative to the side to move.
    fn analyse(&mut self, position_command: &str, nodes: u64) -> Result<Score>;
}

/// Engine process launch settings.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub path: PathBuf,
    pub args: Vec<String>,
    pub threads: usize,
}

impl EngineConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            args: Vec::new(),
            threads: 1,
        }
    }
}

/// A UCI engine subprocess.
///
/// Stdout is drained by a helper thread into a channel so handshake waits
/// can time out; all protocol handling stays on the caller's thread.
pub struct UciEngine {
    child: Child,
    stdin: BufWriter<ChildStdin>,
    rx: Receiver<String>,
    opt_names: HashSet<String>,
    name: Option<String>,
    quit_sent: bool,
}

impl UciEngine {
    pub fn spawn(cfg: &EngineConfig) -> Result<Self> {
        let mut cmd = Command::new(&cfg.path);
        if !cfg.args.is_empty() {
            cmd.args(&cfg.args);
        }
        let mut child = cmd
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|source| LabelError::EngineSpawn {
                path: cfg.path.clone(),
                source,
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| LabelError::EngineProtocol("engine stdin unavailable".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| LabelError::EngineProtocol("engine stdout unavailable".into()))?;

        let (tx, rx) = mpsc::channel::<String>();
        thread::spawn(move || {
            let reader = BufReader::new(stdout);
            for line in reader.lines() {
                match line {
                    Ok(l) => {
                        if tx.send(l).is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
        });

        let mut engine = Self {
            child,
            stdin: BufWriter::new(stdin),
            rx,
            opt_names: HashSet::new(),
            name: None,
            quit_sent: false,
        };
        engine.initialize(cfg)?;
        Ok(engine)
    }

    fn initialize(&mut self, cfg: &EngineConfig) -> Result<()> {
        self.write_line("uci")?;
        loop {
            let line = self.recv_line(ENGINE_READY_TIMEOUT)?;
            if let Some(rest) = line.strip_prefix("option ") {
                if let Some(name) = parse_option_name(rest) {
                    self.opt_names.insert(name);
                }
            } else if let Some(name) = line.strip_prefix("id name ") {
                self.name = Some(name.trim().to_string());
            } else if line.trim() == "uciok" {
                break;
            }
        }
        self.set_option_if_available("Threads", &cfg.threads.to_string())?;
        self.sync_ready()?;

        log::info!(
            "Engine ready: {} ({})",
            self.name.as_deref().unwrap_or("unnamed"),
            cfg.path.display()
        );
        Ok(())
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn sync_ready(&mut self) -> Result<()> {
        self.write_line("isready")?;
        loop {
            let line = self.recv_line(ENGINE_READY_TIMEOUT)?;
            if line.trim() == "readyok" {
                return Ok(());
            }
        }
    }

    fn recv_line(&self, timeout: Duration) -> Result<String> {
        let line = self.rx.recv_timeout(timeout).map_err(|e| match e {
            RecvTimeoutError::Timeout => LabelError::EngineProtocol("engine read timeout".into()),
            RecvTimeoutError::Disconnected => {
                LabelError::EngineProtocol("engine exited unexpectedly".into())
            }
        })?;
        log::trace!("engine> {line}");
        Ok(line)
    }

    fn recv_line_blocking(&self) -> Result<String> {
        let line = self
            .rx
            .recv()
            .map_err(|_| LabelError::EngineProtocol("engine exited unexpectedly".into()))?;
        log::trace!("engine> {line}");
        Ok(line)
    }

    /// Options the engine did not advertise are silently skipped.
    pub fn set_option_if_available(&mut self, name: &str, value: &str) -> Result<()> {
        if self.opt_names.is_empty() || self.opt_names.contains(name) {
            self.write_line(&format!("setoption name {} value {}", name, value))?;
        }
        Ok(())
    }

    pub fn write_line(&mut self, msg: &str) -> Result<()> {
        log::trace!("engine< {msg}");
        self.stdin
            .write_all(msg.as_bytes())
            .and_then(|_| self.stdin.write_all(b"\n"))
            .and_then(|_| self.stdin.flush())
            .map_err(LabelError::EngineIo)
    }

    /// Ask the engine to exit and reap the process, killing it if it lingers.
    pub fn quit(mut self) -> Result<()> {
        self.shutdown();
        Ok(())
    }

    fn shutdown(&mut self) {
        if self.quit_sent {
            return;
        }
        self.quit_sent = true;

        let _ = self.write_line("quit");
        let deadline = Instant::now() + ENGINE_QUIT_TIMEOUT;
        while Instant::now() < deadline {
            if let Ok(Some(_)) = self.child.try_wait() {
                return;
            }
            thread::sleep(ENGINE_QUIT_POLL_INTERVAL);
        }
        log::warn!("Engine did not exit after quit; killing it");
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

impl Evaluator for UciEngine {
    fn new_game(&mut self) -> Result<()> {
        self.write_line("ucinewgame")?;
        self.sync_ready()
    }

    fn analyse(&mut self, position_command: &str, nodes: u64) -> Result<Score> {
        self.write_line(position_command)?;
        self.write_line(&format!("go nodes {nodes}"))?;

        let mut latest = None;
        loop {
            let line = self.recv_line_blocking()?;
            if line.starts_with("info") {
                if let Some(score) = parse_info_score(&line) {
                    latest = Some(score);
                }
                continue;
            }
            if line.starts_with("bestmove") {
                return latest.ok_or_else(|| {
                    LabelError::EngineProtocol(format!(
                        "no score reported before '{}' for '{}'",
                        line.trim(),
                        position_command
                    ))
                });
            }
        }
    }
}

impl Drop for UciEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

pub fn parse_option_name(line: &str) -> Option<String> {
    let mut tokens = line.split_whitespace().peekable();
    while let Some(tok) = tokens.next() {
        if tok == "name" {
            let mut parts = Vec::new();
            while let Some(next) = tokens.next_if(|t| *t != "type") {
                parts.push(next);
            }
            if !parts.is_empty() {
                return Some(parts.join(" "));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_option_name() {
        assert_eq!(
            parse_option_name("name Threads type spin default 1 min 1 max 1024"),
            Some("Threads".to_string())
        );
        assert_eq!(
            parse_option_name("name Clear Hash type button"),
            Some("Clear Hash".to_string())
        );
        assert_eq!(parse_option_name("type check default false"), None);
    }

    #[test]
    fn test_spawn_missing_binary_is_error() {
        let cfg = EngineConfig::new("/definitely/not/an/engine");
        match UciEngine::spawn(&cfg) {
            Err(LabelError::EngineSpawn { path, .. }) => {
                assert_eq!(path, PathBuf::from("/definitely/not/an/engine"));
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("spawn should fail"),
        }
    }

    #[cfg(unix)]
    mod scripted {
        use super::*;

        // Minimal UCI responder: mate-in-2 after 1. e4, +25 otherwise.
        const FAKE_ENGINE: &str = r#"
while read -r line; do
  case "$line" in
    uci) echo "id name FakeFish"; echo "option name Threads type spin default 1 min 1 max 8"; echo "uciok" ;;
    isready) echo "readyok" ;;
    "position startpos moves e2e4") pos=mate ;;
    position*) pos=cp ;;
    go*)
      echo "info string thinking"
      if [ "$pos" = mate ]; then
        echo "info depth 1 score cp 80 nodes 5"
        echo "info depth 2 score mate 2 nodes 20 pv d7d5"
      else
        echo "info depth 1 seldepth 1 multipv 1 score cp 25 nodes 10 pv e2e4"
      fi
      echo "bestmove e2e4" ;;
    quit) exit 0 ;;
  esac
done
"#;

        fn fake_engine() -> UciEngine {
            let cfg = EngineConfig {
                path: PathBuf::from("sh"),
                args: vec!["-c".to_string(), FAKE_ENGINE.to_string()],
                threads: 1,
            };
            UciEngine::spawn(&cfg).unwrap()
        }

        #[test]
        fn test_handshake_reads_engine_name() {
            let engine = fake_engine();
            assert_eq!(engine.name(), Some("FakeFish"));
            engine.quit().unwrap();
        }

        #[test]
        fn test_analyse_returns_latest_score() {
            let mut engine = fake_engine();
            engine.new_game().unwrap();

            let cp = engine.analyse("position startpos", 800).unwrap();
            assert_eq!(cp, Score::Cp(25));

            let mate = engine
                .analyse("position startpos moves e2e4", 800)
                .unwrap();
            assert_eq!(mate, Score::Mate(2));
            engine.quit().unwrap();
        }

        #[test]
        fn test_handshake_sets_single_thread_before_isready() {
            // Appends every command it receives to the file named by $1.
            const RECORDING_ENGINE: &str = r#"
while read -r line; do
  echo "$line" >> "$1"
  case "$line" in
    uci) echo "option name Threads type spin default 4 min 1 max 8"; echo "uciok" ;;
    isready) echo "readyok" ;;
    quit) exit 0 ;;
  esac
done
"#;
            let dir = tempfile::tempdir().unwrap();
            let log_path = dir.path().join("stdin.log");
            let mut cfg = EngineConfig::new("sh");
            cfg.args = vec![
                "-c".to_string(),
                RECORDING_ENGINE.to_string(),
                "sh".to_string(),
                log_path.display().to_string(),
            ];

            let mut engine = UciEngine::spawn(&cfg).unwrap();
            engine.new_game().unwrap();
            engine.quit().unwrap();

            let log = std::fs::read_to_string(&log_path).unwrap();
            let commands: Vec<&str> = log.lines().collect();
            assert_eq!(
                commands[..5],
                [
                    "uci",
                    "setoption name Threads value 1",
                    "isready",
                    "ucinewgame",
                    "isready",
                ]
            );
        }

        #[test]
        fn test_engine_exit_mid_search_is_error() {
            let cfg = EngineConfig {
                path: PathBuf::from("sh"),
                args: vec![
                    "-c".to_string(),
                    r#"read -r l; echo uciok; read -r l; read -r l; echo readyok; read -r l; read -r l; exit 1"#
                        .to_string(),
                ],
                threads: 1,
            };
            let mut engine = UciEngine::spawn(&cfg).unwrap();
            let err = engine.analyse("position startpos", 10).unwrap_err();
            assert!(err.to_string().contains("exited unexpectedly"));
        }
    }
}
