// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

use std::path::Path;

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::FmtSubscriber;

/// Initialize logging with an optional level override and an optional
/// additional log file. Falls back to INFO if `level` is `None` or fails to
/// parse. When `logfile_path` is set, log lines go to both stdout and that
/// file, matching the donor logger's "display plus optional file handler"
/// shape; the returned [`WorkerGuard`] must be kept alive for the process
/// lifetime, or buffered file lines are lost on exit.
pub fn init_logging(level: Option<&str>, logfile_path: Option<&Path>) -> Option<WorkerGuard> {
    let level = level
        .and_then(|s| s.parse::<Level>().ok())
        .unwrap_or(Level::INFO);

    match logfile_path {
        None => {
            FmtSubscriber::builder()
                .with_target(false)
                .with_max_level(level)
                .init();
            None
        }
        Some(path) => {
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
            let file_name = path.file_name().unwrap_or_else(|| path.as_os_str());
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            FmtSubscriber::builder()
                .with_target(false)
                .with_max_level(level)
                .with_writer(std::io::stdout.and(non_blocking))
                .init();
            Some(guard)
        }
    }
}
