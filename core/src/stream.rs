//! Lazy segment sequences for streamed responses.
//!
//! # Design
//! Blocking and suspending consumption get two distinct types rather than
//! one shared generator: `SegmentIter` blocks the calling thread while
//! waiting for the next segment, `SegmentStream` suspends the calling task.
//! Both are single-pass and finite. Dropping either one drops the wrapped
//! producer, which releases the underlying connection — full consumption is
//! not required to free transport resources.

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;

use crate::error::ApiError;

/// Blocking lazy sequence of response segments.
///
/// Each `next` call blocks until the transport delivers the next segment
/// or the stream ends. Segments are yielded in server-send order.
pub struct SegmentIter {
    inner: Box<dyn Iterator<Item = Result<String, ApiError>>>,
}

impl SegmentIter {
    pub fn new<I>(inner: I) -> Self
    where
        I: Iterator<Item = Result<String, ApiError>> + 'static,
    {
        Self {
            inner: Box::new(inner),
        }
    }

    /// A sequence that ends immediately, for responses with no segments.
    pub fn empty() -> Self {
        Self::new(std::iter::empty())
    }
}

impl Iterator for SegmentIter {
    type Item = Result<String, ApiError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

impl fmt::Debug for SegmentIter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SegmentIter { .. }")
    }
}

/// Suspending lazy sequence of response segments.
///
/// Each `next` await yields control back to the scheduler until the
/// transport delivers the next segment. Segments are yielded in server-send
/// order.
pub struct SegmentStream {
    inner: Pin<Box<dyn Stream<Item = Result<String, ApiError>> + Send>>,
}

impl SegmentStream {
    pub fn new<S>(inner: S) -> Self
    where
        S: Stream<Item = Result<String, ApiError>> + Send + 'static,
    {
        Self {
            inner: Box::pin(inner),
        }
    }

    /// A sequence that ends immediately, for responses with no segments.
    pub fn empty() -> Self {
        Self::new(futures::stream::empty())
    }
}

impl Stream for SegmentStream {
    type Item = Result<String, ApiError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().inner.as_mut().poll_next(cx)
    }
}

impl fmt::Debug for SegmentStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SegmentStream { .. }")
    }
}
