use std::io::{ErrorKind, Read};
use std::process::{Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use crossbeam_channel::{RecvTimeoutError, Sender};

use crate::error::{HwError, Result};

/// Captured result of a command that finished before its deadline.
#[derive(Debug)]
pub struct Finished {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Clone, Copy)]
enum Pipe {
    Stdout,
    Stderr,
}

/// `Some(bytes)` for data, `None` once the pipe hits EOF.
type Chunk = (Pipe, Option<Vec<u8>>);

fn drain<R: Read + Send + 'static>(mut r: R, pipe: Pipe, tx: Sender<Chunk>) {
    std::thread::spawn(move || {
        let mut buf = [0u8; 4096];
        loop {
            match r.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    if tx.send((pipe, Some(buf[..n].to_vec()))).is_err() {
                        return;
                    }
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(_) => break,
            }
        }
        let _ = tx.send((pipe, None));
    });
}

/// Run `cmd` to completion or kill it once `timeout` expires.
///
/// The deadline covers output collection too: a descendant that keeps the
/// pipes open after the child exits is not waited for, and whatever was
/// captured by then is returned. Polls the child in small intervals to avoid
/// CPU spinning.
pub fn run_with_timeout(
    cmd: &mut Command,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<Finished> {
    let program = cmd.get_program().to_string_lossy().into_owned();
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => HwError::NotFound {
                program: program.clone(),
            },
            ErrorKind::PermissionDenied => HwError::PermissionDenied {
                program: program.clone(),
            },
            _ => HwError::Io(e),
        })?;

    let (tx, rx) = crossbeam_channel::unbounded::<Chunk>();
    let mut open = 0usize;
    if let Some(out) = child.stdout.take() {
        drain(out, Pipe::Stdout, tx.clone());
        open += 1;
    }
    if let Some(err) = child.stderr.take() {
        drain(err, Pipe::Stderr, tx.clone());
        open += 1;
    }
    drop(tx);

    let deadline = Instant::now() + timeout;
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            tracing::warn!(%program, timeout_ms = timeout.as_millis() as u64, "command killed after timeout");
            return Err(HwError::Timeout {
                program,
                after_ms: timeout.as_millis() as u64,
            });
        }
        std::thread::sleep(poll_interval);
    };

    let (mut stdout, mut stderr) = (Vec::new(), Vec::new());
    while open > 0 {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok((Pipe::Stdout, Some(b))) => stdout.extend_from_slice(&b),
            Ok((Pipe::Stderr, Some(b))) => stderr.extend_from_slice(&b),
            Ok((_, None)) => open -= 1,
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!(%program, "output still held open after exit; using what was captured");
                break;
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    Ok(Finished {
        status,
        stdout: String::from_utf8_lossy(&stdout).into_owned(),
        stderr: String::from_utf8_lossy(&stderr).into_owned(),
    })
}
