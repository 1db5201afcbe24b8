//! Write streams
//!
//! [`FileWriter`] is the exclusively owned stream returned by
//! `FileStore::open_for_writing`. It emits its `FileAdded` notification when
//! released, whether through [`FileWriter::close`] or by being dropped on an
//! error path, so watchers only hear about a file once the writer is done.

use std::io::{self, SeekFrom};
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::fs::File;
use tokio::io::{AsyncSeek, AsyncWrite, AsyncWriteExt};

use super::modes::WriteMode;
use crate::watch::{FileSystemChangeEvent, WatcherRegistry};

/// Notification fired once when the writer is released.
struct ReleaseNotice {
    watchers: WatcherRegistry,
    event: FileSystemChangeEvent,
}

/// Writable file stream bound to a [`WriteMode`].
pub struct FileWriter {
    file: File,
    mode: WriteMode,
    notice: Option<ReleaseNotice>,
}

impl FileWriter {
    pub(crate) fn new(
        file: File,
        mode: WriteMode,
        watchers: WatcherRegistry,
        caller_path: &str,
    ) -> Self {
        let notice = mode.emits_file_added().then(|| ReleaseNotice {
            watchers,
            event: FileSystemChangeEvent::file_added(caller_path),
        });
        Self { file, mode, notice }
    }

    pub fn mode(&self) -> WriteMode {
        self.mode
    }

    /// Flush buffered data and release the stream.
    ///
    /// The release notification fires even if the flush fails.
    pub async fn close(mut self) -> io::Result<()> {
        self.file.flush().await
    }
}

impl Drop for FileWriter {
    fn drop(&mut self) {
        if let Some(notice) = self.notice.take() {
            notice.watchers.notify(&notice.event);
        }
    }
}

impl AsyncWrite for FileWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.get_mut().file).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().file).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().file).poll_shutdown(cx)
    }
}

impl AsyncSeek for FileWriter {
    fn start_seek(self: Pin<&mut Self>, position: SeekFrom) -> io::Result<()> {
        let this = self.get_mut();
        if !this.mode.allows_seek() {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("seek is not supported in {} mode", this.mode),
            ));
        }
        Pin::new(&mut this.file).start_seek(position)
    }

    fn poll_complete(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<u64>> {
        Pin::new(&mut self.get_mut().file).poll_complete(cx)
    }
}
