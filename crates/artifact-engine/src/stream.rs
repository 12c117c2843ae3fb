//! Byte-counting stream adapter

use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};

/// Wraps a reader and counts the bytes pulled through it
#[derive(Debug)]
pub struct CountingReader<R> {
    inner: R,
    count: Arc<AtomicU64>,
}

impl<R> CountingReader<R> {
    /// Wrap a reader with a fresh counter
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            count: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Shared handle on the byte count, readable after the reader is consumed
    pub fn counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.count)
    }

    /// Bytes read so far
    pub fn bytes_read(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for CountingReader<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let before = buf.filled().len();
        let poll = Pin::new(&mut this.inner).poll_read(cx, buf);
        if let Poll::Ready(Ok(())) = &poll {
            let read = buf.filled().len() - before;
            this.count.fetch_add(read as u64, Ordering::Relaxed);
        }
        poll
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn test_counts_all_bytes() {
        let data = vec![7u8; 10_000];
        let mut reader = CountingReader::new(&data[..]);
        let counter = reader.counter();

        let mut sink = Vec::new();
        reader.read_to_end(&mut sink).await.unwrap();

        assert_eq!(sink.len(), 10_000);
        assert_eq!(reader.bytes_read(), 10_000);
        assert_eq!(counter.load(Ordering::Relaxed), 10_000);
    }

    #[tokio::test]
    async fn test_counts_partial_reads() {
        let mock = tokio_test::io::Builder::new()
            .read(b"abc")
            .read(b"defgh")
            .build();
        let mut reader = CountingReader::new(mock);

        let mut sink = Vec::new();
        reader.read_to_end(&mut sink).await.unwrap();

        assert_eq!(sink, b"abcdefgh");
        assert_eq!(reader.bytes_read(), 8);
    }

    #[tokio::test]
    async fn test_empty_reader() {
        let mut reader = CountingReader::new(tokio::io::empty());
        let mut sink = Vec::new();
        reader.read_to_end(&mut sink).await.unwrap();
        assert_eq!(reader.bytes_read(), 0);
    }
}
