use std::process::Stdio;

use log::debug;
use tokio::process::Command;
use tokio::sync::{mpsc, oneshot};

use crate::clients::errors::{Error, Result};
use crate::player::{AudioSink, SinkEvent, SinkEventKind};

struct Stream {
    pid: Option<u32>,
    // dropping the sender kills the process as well
    _kill: oneshot::Sender<()>,
}

/// Plays streams by running an external player with the stream URL as its
/// last argument, e.g. `mpv --no-video <url>`.
///
/// A zero exit status is reported as [`SinkEventKind::Ended`], anything else
/// as [`SinkEventKind::Failed`]. Pausing sends `SIGSTOP`/`SIGCONT`.
pub struct ProcessSink {
    program: String,
    args: Vec<String>,
    events: mpsc::UnboundedSender<SinkEvent>,
    current: Option<Stream>,
}

impl ProcessSink {
    pub fn new(command: &[String], events: mpsc::UnboundedSender<SinkEvent>) -> Result<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| Error::ConfigurationError("Player command is empty".into()))?;

        Ok(ProcessSink {
            program: program.clone(),
            args: args.to_vec(),
            events,
            current: None,
        })
    }

    /// A sink together with the receiving end of its events.
    pub fn channel(command: &[String]) -> Result<(Self, mpsc::UnboundedReceiver<SinkEvent>)> {
        let (tx, rx) = mpsc::unbounded_channel();
        Ok((Self::new(command, tx)?, rx))
    }

    #[cfg(unix)]
    async fn signal(&self, signal: &str) -> Result<()> {
        let Some(pid) = self.current.as_ref().and_then(|s| s.pid) else {
            return Ok(());
        };

        let status = Command::new("kill")
            .arg(signal)
            .arg(pid.to_string())
            .status()
            .await?;
        if status.success() {
            Ok(())
        } else {
            Err(Error::AudioError(format!(
                "kill {signal} {pid} exited with {status}"
            )))
        }
    }

    #[cfg(not(unix))]
    async fn signal(&self, _signal: &str) -> Result<()> {
        Err(Error::AudioError(
            "Pausing an external player is only supported on unix".into(),
        ))
    }
}

impl AudioSink for ProcessSink {
    fn load(&mut self, url: &str, generation: u64) -> Result<()> {
        self.current = None;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::AudioError(format!("Failed to start {}: {e}", self.program)))?;
        let pid = child.id();
        debug!("Started {} (pid {pid:?}) for stream {generation}", self.program);

        let (kill_tx, kill_rx) = oneshot::channel::<()>();
        let events = self.events.clone();
        tokio::spawn(async move {
            tokio::select! {
                status = child.wait() => {
                    let kind = match status {
                        Ok(status) if status.success() => SinkEventKind::Ended,
                        Ok(status) => SinkEventKind::Failed(format!("player exited with {status}")),
                        Err(e) => SinkEventKind::Failed(e.to_string()),
                    };
                    // nobody listening any more means the app is shutting down
                    let _ = events.send(SinkEvent { generation, kind });
                }
                _ = kill_rx => {
                    if let Err(e) = child.kill().await {
                        debug!("Failed to kill player for stream {generation}: {e}");
                    }
                }
            }
        });

        self.current = Some(Stream {
            pid,
            _kill: kill_tx,
        });
        Ok(())
    }

    async fn pause(&mut self) -> Result<()> {
        self.signal("-STOP").await
    }

    async fn resume(&mut self) -> Result<()> {
        self.signal("-CONT").await
    }

    fn stop(&mut self) -> Result<()> {
        self.current = None;
        Ok(())
    }
}
