//! Remote shell sessions over the pod exec subresource.

use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, AttachParams, AttachedProcess};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use ptp_probe_core::{Error, Result, SessionId};

use crate::ContainerTarget;

/// Command executed inside the target container to obtain a shell.
pub const SHELL_COMMAND: &str = "/usr/bin/sh";

/// Output chunks buffered between the streaming task and the consumer.
const OUTPUT_CHANNEL_CAPACITY: usize = 64;

const READ_BUF_SIZE: usize = 4096;

/// One live remote-process stream.
///
/// Owns the input sink and the output source of an open exec session. The
/// remote runs under a TTY, so stderr is multiplexed onto the single output
/// channel by the remote side. A session is not reusable after the remote
/// process exits; open a new one (optionally after
/// [`ContainerTarget::refresh`]).
pub struct ShellSession {
    id: SessionId,
    input: Box<dyn AsyncWrite + Send + Unpin>,
    output: mpsc::Receiver<Vec<u8>>,
}

impl ShellSession {
    /// Assemble a session from raw parts.
    ///
    /// Lets tests back a session with an in-memory duplex stream instead of
    /// a live exec stream.
    pub fn from_parts(
        input: Box<dyn AsyncWrite + Send + Unpin>,
        output: mpsc::Receiver<Vec<u8>>,
    ) -> Self {
        Self {
            id: SessionId::new(),
            input,
            output,
        }
    }

    /// Get the session ID.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Write bytes to the remote process's stdin and flush.
    pub async fn write(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.input.write_all(bytes).await?;
        self.input.flush().await
    }

    /// Shut down the input half of the stream.
    ///
    /// The remote process sees end-of-input; further writes fail.
    pub async fn close_input(&mut self) -> std::io::Result<()> {
        self.input.shutdown().await
    }

    /// Receive the next output chunk.
    ///
    /// Chunks arrive in the order the remote emitted them. Returns `None`
    /// once the stream has closed and all buffered chunks were consumed.
    pub async fn recv(&mut self) -> Option<Vec<u8>> {
        self.output.recv().await
    }
}

impl std::fmt::Debug for ShellSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShellSession")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Completion handle for the background streaming task.
///
/// The task signals completion exactly once, whether the remote process
/// exited cleanly or the stream broke. [`wait`] consumes the handle and
/// cannot return before the task has fully finished, so tearing down the
/// session's I/O ends after `wait` is always safe.
///
/// [`wait`]: SessionHandle::wait
#[derive(Debug)]
pub struct SessionHandle {
    task: JoinHandle<Result<()>>,
}

impl SessionHandle {
    /// Wrap a spawned streaming task.
    pub fn new(task: JoinHandle<Result<()>>) -> Self {
        Self { task }
    }

    /// Block until the streaming task finishes, surfacing its result.
    pub async fn wait(self) -> Result<()> {
        match self.task.await {
            Ok(result) => result,
            Err(e) => Err(Error::transport("streaming task failed to complete", e)),
        }
    }
}

impl ContainerTarget {
    /// Establish a TTY-attached login shell inside this target's container.
    ///
    /// Failure to construct the exec request is reported here, before any
    /// streaming starts. Failures during streaming surface only through the
    /// returned [`SessionHandle`]. There is no automatic reconnect: a broken
    /// stream is terminal for the session.
    pub async fn open_shell(&self) -> Result<(ShellSession, SessionHandle)> {
        let id = SessionId::new();
        debug!(
            "opening shell: session={}, ns={}, pod={}, container={}, cmd={}",
            id,
            self.namespace(),
            self.pod_name(),
            self.container(),
            SHELL_COMMAND
        );

        let api: Api<Pod> = self.client().pods(self.namespace());
        let params = AttachParams::interactive_tty().container(self.container());
        let mut attached: AttachedProcess = api
            .exec(self.pod_name(), vec![SHELL_COMMAND], &params)
            .await
            .map_err(|e| {
                Error::transport(
                    format!(
                        "error setting up remote command on ns={} pod={} container={} cmd={}",
                        self.namespace(),
                        self.pod_name(),
                        self.container(),
                        SHELL_COMMAND
                    ),
                    e,
                )
            })?;

        let stdin = attached
            .stdin()
            .ok_or_else(|| Error::Session("exec stream opened without stdin".to_string()))?;
        let stdout = attached
            .stdout()
            .ok_or_else(|| Error::Session("exec stream opened without stdout".to_string()))?;

        let (tx, rx) = mpsc::channel(OUTPUT_CHANNEL_CAPACITY);
        let task = tokio::spawn(stream_output(id, attached, stdout, tx));

        let session = ShellSession {
            id,
            input: Box::new(stdin),
            output: rx,
        };
        Ok((session, SessionHandle::new(task)))
    }
}

/// Copy remote output into the chunk channel until the stream ends, then
/// settle the exec connection.
///
/// Dropping the sender closes the channel, which is how consumers observe
/// stream closure.
async fn stream_output(
    id: SessionId,
    attached: AttachedProcess,
    mut stdout: impl AsyncRead + Send + Unpin,
    tx: mpsc::Sender<Vec<u8>>,
) -> Result<()> {
    let mut buf = [0u8; READ_BUF_SIZE];
    let read_result = loop {
        match stdout.read(&mut buf).await {
            Ok(0) => break Ok(()),
            Ok(n) => {
                if tx.send(buf[..n].to_vec()).await.is_err() {
                    debug!("session {id}: output receiver dropped, stopping stream");
                    break Ok(());
                }
            }
            Err(e) => {
                break Err(Error::transport(
                    format!("session {id}: error reading remote output"),
                    e,
                ));
            }
        }
    };
    drop(tx);

    let join_result = attached.join().await.map_err(|e| {
        Error::transport(format!("session {id}: remote stream terminated abnormally"), e)
    });
    debug!("session {id}: streaming finished");
    read_result.and(join_result)
}
