// ABOUTME: Polls a running dump process and reports size-based progress
// ABOUTME: Measures the growing output file each tick until the child exits

use anyhow::{Context, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::time::{Duration, Instant};
use tokio::io::AsyncReadExt;
use tokio::process::Child;

use crate::progress::{ProgressSink, ProgressState};
use crate::utils::bytes_to_megabytes;

/// Default time between two checks of the dump process
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Result of reaping the dump process
#[derive(Debug)]
pub struct DumpOutcome {
    pub status: ExitStatus,
    pub output_path: PathBuf,
    /// Output size after the process exited, in megabytes
    pub final_size_mb: f64,
    pub elapsed: Duration,
    /// Everything the process wrote to stderr
    pub diagnostics: String,
}

impl DumpOutcome {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Final size relative to the estimate; `None` for a zero estimate
    pub fn ratio_to_estimate(&self, estimated_mb: f64) -> Option<f64> {
        if estimated_mb > 0.0 {
            Some(self.final_size_mb / estimated_mb)
        } else {
            None
        }
    }
}

/// Size of `path` in megabytes, or `None` if it does not exist yet
///
/// # Errors
///
/// Any I/O failure other than a missing file.
pub async fn read_output_size_mb(path: &Path) -> Result<Option<f64>> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => Ok(Some(bytes_to_megabytes(metadata.len()))),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e)
            .with_context(|| format!("Failed to read size of dump output {}", path.display())),
    }
}

/// Watch `child` until it exits, reporting output growth to `sink`
///
/// Every `poll_interval` the child is checked without blocking. While it runs,
/// the size of `output_path` is read and the growth since the previous reading
/// is passed to the sink. A tick on which the file does not exist yet is
/// skipped. After exit, the child's stderr is collected and one last reading
/// brings the sink up to the final size.
///
/// The exit status is returned, not judged; callers decide what a failure means.
///
/// # Errors
///
/// Returns an error if the child's status cannot be queried or the output
/// file size cannot be read for a reason other than not existing yet.
/// The child is dropped on that path; a child started by `DumpPlan::spawn` is
/// killed rather than left running.
pub async fn monitor_dump<S>(
    mut child: Child,
    output_path: &Path,
    sink: &mut S,
    poll_interval: Duration,
) -> Result<DumpOutcome>
where
    S: ProgressSink + ?Sized,
{
    let started = Instant::now();

    // Drain stderr concurrently so a chatty child never blocks on a full pipe
    let stderr_task = child.stderr.take().map(|mut stderr| {
        tokio::spawn(async move {
            let mut buf = Vec::new();
            if let Err(e) = stderr.read_to_end(&mut buf).await {
                tracing::debug!("Stopped reading dump stderr: {}", e);
            }
            buf
        })
    });

    let mut state = ProgressState::new();
    let mut ticks: u64 = 0;

    let status = loop {
        if let Some(status) = child
            .try_wait()
            .context("Failed to check dump process status")?
        {
            break status;
        }

        tokio::time::sleep(poll_interval).await;
        ticks += 1;

        match read_output_size_mb(output_path).await? {
            Some(size_mb) => sink.advance(state.observe(size_mb)),
            None => {
                tracing::debug!(
                    "Dump output {} not created yet, skipping tick {}",
                    output_path.display(),
                    ticks
                );
            }
        }
    };

    let diagnostics = match stderr_task {
        Some(task) => String::from_utf8_lossy(&task.await.unwrap_or_default()).into_owned(),
        None => String::new(),
    };

    if let Some(size_mb) = read_output_size_mb(output_path).await? {
        sink.advance(state.observe(size_mb));
    }

    let elapsed = started.elapsed();
    tracing::debug!(
        "Dump process exited with {} after {} tick(s) in {:?}",
        status,
        ticks,
        elapsed
    );

    sink.finish(if status.success() {
        "Backup finished"
    } else {
        "Backup failed"
    });

    Ok(DumpOutcome {
        status,
        output_path: output_path.to_path_buf(),
        final_size_mb: state.current_mb,
        elapsed,
        diagnostics,
    })
}
