//! Size-limited body reading
//!
//! [`BoundedReader`] behaves like [`std::io::Take`] with one difference: when the
//! underlying stream holds more bytes than allowed it fails with
//! [`SizeLimitExceeded`] instead of reporting a clean end-of-stream. A caller can
//! therefore tell a complete body apart from one that was cut off.
//!
//! The limit is inclusive: a limit of 1 MiB accepts a body of exactly 1 MiB.

use std::io::{self, Read};
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use tokio::io::{AsyncRead, ReadBuf};

/// Error carried inside an [`io::Error`] when a stream exceeds its limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("content larger than maximum limit of {limit} bytes")]
pub struct SizeLimitExceeded {
	/// The inclusive limit that was exceeded
	pub limit: u64,
}

impl From<SizeLimitExceeded> for io::Error {
	fn from(e: SizeLimitExceeded) -> Self {
		io::Error::new(io::ErrorKind::InvalidData, e)
	}
}

/// Returns true if `err` was produced by a [`BoundedReader`] hitting its limit
///
/// # Examples
///
/// ```
/// use reinhardt_params::limit::{BoundedReader, is_size_limit_exceeded};
/// use std::io::Read;
///
/// let mut reader = BoundedReader::new(&b"abcdef"[..], 4);
/// let err = reader.read_to_end(&mut Vec::new()).unwrap_err();
/// assert!(is_size_limit_exceeded(&err));
/// ```
pub fn is_size_limit_exceeded(err: &io::Error) -> bool {
	err.get_ref()
		.is_some_and(|inner| inner.is::<SizeLimitExceeded>())
}

/// Reader enforcing an inclusive maximum number of bytes
///
/// Internally the budget is `max + 1`. The read that delivers the `max + 1`-th
/// byte still succeeds; the next read fails with [`SizeLimitExceeded`] without
/// touching the source or the caller's buffer. The source is never asked for more
/// than `max + 1` bytes.
#[derive(Debug)]
pub struct BoundedReader<R> {
	inner: R,
	max: u64,
	remaining: u64,
}

impl<R> BoundedReader<R> {
	/// Wrap `inner`, allowing at most `max` bytes (inclusive)
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_params::limit::BoundedReader;
	/// use std::io::Read;
	///
	/// let mut reader = BoundedReader::new(&b"abcd"[..], 4);
	/// let mut body = Vec::new();
	/// reader.read_to_end(&mut body).unwrap();
	/// assert_eq!(body, b"abcd");
	/// ```
	pub fn new(inner: R, max: u64) -> Self {
		Self {
			inner,
			max,
			remaining: max.saturating_add(1),
		}
	}

	/// The inclusive limit this reader was created with
	pub fn limit(&self) -> u64 {
		self.max
	}

	/// Bytes that may still be read before the limit is proven exceeded
	pub fn remaining(&self) -> u64 {
		self.remaining
	}

	/// Unwrap the inner reader
	pub fn into_inner(self) -> R {
		self.inner
	}

	fn window(&self, requested: usize) -> usize {
		usize::try_from(self.remaining).map_or(requested, |rem| requested.min(rem))
	}

	fn consume(&mut self, n: usize) {
		self.remaining = self.remaining.saturating_sub(n as u64);
	}

	fn exceeded(&self) -> io::Error {
		SizeLimitExceeded { limit: self.max }.into()
	}
}

impl<R: Read> Read for BoundedReader<R> {
	fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
		if buf.is_empty() {
			return Ok(0);
		}
		if self.remaining == 0 {
			return Err(self.exceeded());
		}
		let window = self.window(buf.len());
		let n = self.inner.read(&mut buf[..window])?;
		self.consume(n);
		Ok(n)
	}
}

impl<R: AsyncRead + Unpin> AsyncRead for BoundedReader<R> {
	fn poll_read(
		mut self: Pin<&mut Self>,
		cx: &mut Context<'_>,
		buf: &mut ReadBuf<'_>,
	) -> Poll<io::Result<()>> {
		if buf.remaining() == 0 {
			return Poll::Ready(Ok(()));
		}
		if self.remaining == 0 {
			return Poll::Ready(Err(self.exceeded()));
		}

		let window = self.window(buf.remaining());
		let n = {
			let mut limited = buf.take(window);
			let filled_ptr = limited.filled().as_ptr();
			ready!(Pin::new(&mut self.inner).poll_read(cx, &mut limited))?;
			// The source must not swap out the buffer it was handed.
			debug_assert_eq!(limited.filled().as_ptr(), filled_ptr);
			limited.filled().len()
		};

		// SAFETY: the first `n` bytes past the filled region were initialized by
		// the inner reader through `limited`, which aliases `buf`'s unfilled part.
		unsafe {
			buf.assume_init(n);
		}
		buf.advance(n);
		self.consume(n);

		Poll::Ready(Ok(()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	/// Reader that hands out at most `chunk` bytes per call.
	struct Trickle<'a> {
		data: &'a [u8],
		chunk: usize,
	}

	impl Read for Trickle<'_> {
		fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
			let n = buf.len().min(self.chunk).min(self.data.len());
			buf[..n].copy_from_slice(&self.data[..n]);
			self.data = &self.data[n..];
			Ok(n)
		}
	}

	#[rstest]
	#[case(0, 0)]
	#[case(1, 1)]
	#[case(10, 10)]
	#[case(3, 10)]
	#[case(0, 10)]
	fn test_body_within_limit_is_read_completely(#[case] len: usize, #[case] max: u64) {
		// Arrange
		let data = vec![b'x'; len];
		let mut reader = BoundedReader::new(&data[..], max);

		// Act
		let mut out = Vec::new();
		let result = reader.read_to_end(&mut out);

		// Assert
		assert_eq!(result.unwrap(), len);
		assert_eq!(out, data);
	}

	#[rstest]
	#[case(1, 0)]
	#[case(11, 10)]
	#[case(100, 10)]
	fn test_body_over_limit_fails(#[case] len: usize, #[case] max: u64) {
		// Arrange
		let data = vec![b'x'; len];
		let mut reader = BoundedReader::new(&data[..], max);

		// Act
		let err = reader.read_to_end(&mut Vec::new()).unwrap_err();

		// Assert
		assert!(is_size_limit_exceeded(&err));
		assert_eq!(err.kind(), io::ErrorKind::InvalidData);
	}

	#[rstest]
	fn test_never_requests_more_than_limit_plus_one() {
		// Arrange
		let data = vec![7u8; 1000];
		let source = Trickle {
			data: &data,
			chunk: 3,
		};
		let mut reader = BoundedReader::new(source, 10);

		// Act
		let result = reader.read_to_end(&mut Vec::new());

		// Assert
		assert!(result.is_err());
		let source = reader.into_inner();
		assert_eq!(1000 - source.data.len(), 11);
	}

	#[rstest]
	fn test_exact_limit_with_small_chunks() {
		// Arrange
		let data = b"0123456789";
		let source = Trickle {
			data,
			chunk: 4,
		};
		let mut reader = BoundedReader::new(source, 10);

		// Act
		let mut out = Vec::new();
		reader.read_to_end(&mut out).unwrap();

		// Assert
		assert_eq!(out, data);
		assert_eq!(reader.remaining(), 1);
	}

	#[rstest]
	fn test_empty_buffer_read_is_noop() {
		let mut reader = BoundedReader::new(&b"abc"[..], 1);
		assert_eq!(Read::read(&mut reader, &mut []).unwrap(), 0);
		assert_eq!(reader.remaining(), 2);
	}

	#[rstest]
	fn test_read_past_budget_fails_on_following_read() {
		// Arrange
		let mut reader = BoundedReader::new(&b"abcdef"[..], 4);
		let mut buf = [0u8; 16];

		// Act
		let first = Read::read(&mut reader, &mut buf).unwrap();
		let second = Read::read(&mut reader, &mut buf).unwrap_err();

		// Assert
		assert_eq!(first, 5);
		assert_eq!(&buf[..first], b"abcde");
		assert!(is_size_limit_exceeded(&second));
	}

	// `&[u8]` is both `Read` and `AsyncRead`; async reads below are spelled out.
	#[tokio::test]
	async fn test_async_exact_limit_succeeds() {
		// Arrange
		let data = vec![1u8; 64];
		let mut reader = BoundedReader::new(&data[..], 64);

		// Act
		let mut out = Vec::new();
		let n = tokio::io::AsyncReadExt::read_to_end(&mut reader, &mut out).await.unwrap();

		// Assert
		assert_eq!(n, 64);
		assert_eq!(out, data);
	}

	#[tokio::test]
	async fn test_async_over_limit_fails() {
		// Arrange
		let data = vec![1u8; 65];
		let mut reader = BoundedReader::new(&data[..], 64);

		// Act
		let err = tokio::io::AsyncReadExt::read_to_end(&mut reader, &mut Vec::new())
			.await
			.unwrap_err();

		// Assert
		assert!(is_size_limit_exceeded(&err));
	}

	#[tokio::test]
	async fn test_async_over_limit_through_duplex_stream() {
		// Arrange
		let (mut tx, rx) = tokio::io::duplex(4);
		tokio::spawn(async move {
			use tokio::io::AsyncWriteExt;
			let _ = tx.write_all(&[0u8; 32]).await;
		});
		let mut reader = BoundedReader::new(rx, 16);

		// Act
		let mut out = Vec::new();
		let err = tokio::io::AsyncReadExt::read_to_end(&mut reader, &mut out)
			.await
			.unwrap_err();

		// Assert
		assert!(is_size_limit_exceeded(&err));
		assert!(out.len() <= 17);
	}

	#[tokio::test]
	async fn test_async_failed_read_leaves_buffer_untouched() {
		// Arrange
		let mut reader = BoundedReader::new(&b"abcdef"[..], 4);
		let mut storage = [0u8; 16];

		// Act
		let first = tokio::io::AsyncReadExt::read(&mut reader, &mut storage)
			.await
			.unwrap();
		let mut buf = ReadBuf::new(&mut storage);
		let second = std::future::poll_fn(|cx| Pin::new(&mut reader).poll_read(cx, &mut buf)).await;

		// Assert
		assert_eq!(first, 5);
		assert!(is_size_limit_exceeded(&second.unwrap_err()));
		assert!(buf.filled().is_empty());
	}
}
