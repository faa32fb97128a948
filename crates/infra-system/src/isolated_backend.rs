// Isolated-worker backend (unix)
// One forked process per task, outcome relayed through a private pipe.
//
// Per task: Queued (pending) -> Assigned/Running (active) -> Finished (reaped).
use nix::fcntl::{fcntl, FcntlArg, OFlag};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{fork, pipe, ForkResult, Pid};
use std::collections::{HashMap, VecDeque};
use std::fs::File;
use std::io::{self, Read};
use std::os::fd::{AsRawFd, OwnedFd};
use std::time::Duration;
use tracing::{debug, error, warn};

use forkpool_core::application::{execute_task, failure_entry};
use forkpool_core::domain::{
    ConcurrencyLimit, FailureEntry, FaultKind, FaultLocation, RunReport, Task, TaskFault,
    TaskOutcome,
};
use forkpool_core::error::{ExecutorError, Result};
use forkpool_core::port::{Backend, BackendKind};
use forkpool_core::ExecutorConfig;

use crate::outcome_channel::{
    decode_frame, decode_outcome, write_outcome, CodecError, WireOutcome, MAX_FRAME_LEN,
};

/// Child exit code after the outcome frame was written
const CHILD_EXIT_OK: i32 = 0;

/// Child exit code when the outcome could not be written
const CHILD_EXIT_CHANNEL_FAILED: i32 = 70;

/// Bytes pulled from a pipe per read call
const READ_CHUNK_LEN: usize = 8 * 1024;

/// Isolated-worker backend
///
/// Forks one process per task while fewer than `limit` are alive, then polls
/// every live child with `waitpid(WNOHANG)`. Pipes are drained on every pass
/// so a child with a large result never blocks on a full pipe buffer.
pub struct IsolatedBackend {
    poll_interval: Duration,
}

impl IsolatedBackend {
    pub fn new(config: &ExecutorConfig) -> Self {
        Self {
            poll_interval: config.poll_interval,
        }
    }

    pub fn with_poll_interval(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }

    /// Admission + reap loop (on error, live workers are left for the caller to clean up)
    fn drive(
        &self,
        pending: &mut VecDeque<Task>,
        active: &mut HashMap<Pid, WorkerHandle>,
        limit: ConcurrencyLimit,
        report: &mut RunReport,
    ) -> Result<()> {
        while !pending.is_empty() || !active.is_empty() {
            // Admission: fill free slots from the head of the queue
            while active.len() < limit.get() {
                let Some(task) = pending.pop_front() else {
                    break;
                };
                let handle = spawn_worker(task)?;
                debug!(
                    pid = %handle.pid,
                    task = %handle.task.name(),
                    active = active.len() + 1,
                    limit = %limit,
                    "Worker spawned"
                );
                active.insert(handle.pid, handle);
                report.workers_started += 1;
                report.peak_active_workers = report.peak_active_workers.max(active.len());
            }

            // Reap: never blocks on any single child
            let reaped = reap_finished(active, report)?;
            if reaped == 0 && !active.is_empty() {
                std::thread::sleep(self.poll_interval);
            }
        }
        Ok(())
    }
}

impl Backend for IsolatedBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Isolated
    }

    fn run(&self, tasks: Vec<Task>, limit: ConcurrencyLimit) -> Result<RunReport> {
        let mut pending: VecDeque<Task> = tasks.into();
        let mut active: HashMap<Pid, WorkerHandle> = HashMap::with_capacity(limit.get());
        let mut report = RunReport::default();

        if let Err(e) = self.drive(&mut pending, &mut active, limit, &mut report) {
            error!(
                error = %e,
                active = active.len(),
                abandoned = pending.len(),
                "Isolated backend failed, reaping live workers"
            );
            abort_workers(&mut active);
            return Err(e);
        }

        Ok(report)
    }
}

/// A live child: its pid, the read end of its outcome channel and the task it runs
struct WorkerHandle {
    pid: Pid,
    reader: File,
    received: Vec<u8>,
    task: Task,
}

impl WorkerHandle {
    /// Pull whatever the child has written so far without blocking
    fn drain(&mut self) -> io::Result<()> {
        let mut chunk = [0u8; READ_CHUNK_LEN];
        loop {
            match self.reader.read(&mut chunk) {
                Ok(0) => return Ok(()),
                Ok(n) => self.received.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Decode the child's frame, or describe how it died without one
    fn into_outcome(self, status: WaitStatus) -> TaskOutcome {
        let decoded = decode_frame(&self.received).and_then(decode_outcome);
        match decoded {
            Ok(WireOutcome::Success(value)) => TaskOutcome::Success(value),
            Ok(WireOutcome::Failure(message)) => TaskOutcome::Failure(FailureEntry {
                message,
                function_name: self.task.name().to_string(),
                args: self.task.args().clone(),
            }),
            Err(codec_err) => {
                warn!(
                    pid = %self.pid,
                    task = %self.task.name(),
                    status = ?status,
                    received = self.received.len(),
                    error = %codec_err,
                    "Worker terminated without a complete outcome"
                );
                let fault = TaskFault::at(
                    FaultKind::WorkerCrashed,
                    format!(
                        "worker process {} {} before reporting an outcome ({})",
                        self.pid,
                        describe_status(&status),
                        codec_err
                    ),
                    FaultLocation::unknown(),
                );
                TaskOutcome::Failure(failure_entry(&self.task, fault))
            }
        }
    }
}

/// Create the outcome channel and fork a worker for `task`
fn spawn_worker(task: Task) -> Result<WorkerHandle> {
    let (read_end, write_end) =
        pipe().map_err(|e| ExecutorError::Channel(format!("pipe creation failed: {}", e)))?;

    // SAFETY: the child only runs the task, writes its frame and calls _exit.
    let fork_result =
        unsafe { fork() }.map_err(|e| ExecutorError::Spawn(format!("fork failed: {}", e)))?;

    match fork_result {
        ForkResult::Child => {
            drop(read_end);
            run_child(&task, write_end)
        }
        ForkResult::Parent { child } => {
            drop(write_end);
            if let Err(e) = set_nonblocking(&read_end) {
                // The child still needs its pipe closed before it can be reaped
                drop(read_end);
                let _ = waitpid(child, None);
                return Err(ExecutorError::Channel(format!(
                    "cannot make outcome channel non-blocking: {}",
                    e
                )));
            }
            Ok(WorkerHandle {
                pid: child,
                reader: File::from(read_end),
                received: Vec::new(),
                task,
            })
        }
    }
}

/// Worker body. Must not log or return: the process image is a copy of the parent.
fn run_child(task: &Task, write_end: OwnedFd) -> ! {
    let outcome = match execute_task(task) {
        TaskOutcome::Success(value) => WireOutcome::Success(value),
        TaskOutcome::Failure(entry) => WireOutcome::Failure(entry.message),
    };

    let mut channel = File::from(write_end);
    let code = match write_outcome(&mut channel, &outcome) {
        Ok(()) => CHILD_EXIT_OK,
        // Nothing was written yet: the frame is encoded before the first byte goes out
        Err(CodecError::TooLarge(size)) => {
            match write_outcome(&mut channel, &oversized_result(task, size)) {
                Ok(()) => CHILD_EXIT_OK,
                Err(_) => CHILD_EXIT_CHANNEL_FAILED,
            }
        }
        Err(_) => CHILD_EXIT_CHANNEL_FAILED,
    };
    drop(channel);

    // SAFETY: _exit skips atexit handlers and destructors owned by the parent's copy.
    unsafe { nix::libc::_exit(code) }
}

/// Failure reported in place of a result too large for one frame
fn oversized_result(task: &Task, size: usize) -> WireOutcome {
    let fault = TaskFault::at(
        FaultKind::InvalidValue,
        format!(
            "result of {} bytes exceeds the outcome channel limit of {} bytes",
            size, MAX_FRAME_LEN
        ),
        FaultLocation::unknown(),
    );
    WireOutcome::Failure(failure_entry(task, fault).message)
}

/// Poll every active worker once; returns how many finished
fn reap_finished(active: &mut HashMap<Pid, WorkerHandle>, report: &mut RunReport) -> Result<usize> {
    let mut finished = Vec::new();

    for (pid, handle) in active.iter_mut() {
        handle.drain().map_err(|e| {
            ExecutorError::Channel(format!("read from worker {} failed: {}", pid, e))
        })?;

        match waitpid(*pid, Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::StillAlive) => {}
            Ok(status @ (WaitStatus::Exited(..) | WaitStatus::Signaled(..))) => {
                finished.push((*pid, status));
            }
            // Stopped / continued: still alive
            Ok(_) => {}
            Err(e) => {
                return Err(ExecutorError::Internal(format!(
                    "waitpid({}) failed: {}",
                    pid, e
                )));
            }
        }
    }

    for (pid, status) in &finished {
        if let Some(mut handle) = active.remove(pid) {
            // Everything the child wrote before exiting is already in the pipe
            handle.drain().map_err(|e| {
                ExecutorError::Channel(format!("read from worker {} failed: {}", pid, e))
            })?;
            debug!(pid = %pid, status = ?status, bytes = handle.received.len(), "Worker reaped");
            let outcome = handle.into_outcome(*status);
            if let TaskOutcome::Failure(entry) = &outcome {
                warn!(
                    pid = %pid,
                    function = %entry.function_name,
                    message = %entry.message,
                    "Task failed"
                );
            }
            report.record(outcome);
        }
    }

    Ok(finished.len())
}

/// Close every channel and wait for the children so none is left a zombie
fn abort_workers(active: &mut HashMap<Pid, WorkerHandle>) {
    for (pid, handle) in active.drain() {
        // A child blocked on a full pipe gets EPIPE once the read end is gone
        drop(handle);
        if let Err(e) = waitpid(pid, None) {
            warn!(pid = %pid, error = %e, "Failed to reap worker during abort");
        }
    }
}

fn set_nonblocking(fd: &OwnedFd) -> nix::Result<()> {
    let flags = OFlag::from_bits_truncate(fcntl(fd.as_raw_fd(), FcntlArg::F_GETFL)?);
    fcntl(fd.as_raw_fd(), FcntlArg::F_SETFL(flags | OFlag::O_NONBLOCK))?;
    Ok(())
}

fn describe_status(status: &WaitStatus) -> String {
    match status {
        WaitStatus::Exited(_, code) => format!("exited with status {}", code),
        WaitStatus::Signaled(_, signal, _) => format!("was killed by {:?}", signal),
        other => format!("ended in state {:?}", other),
    }
}
