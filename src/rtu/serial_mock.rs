//! Mock serial port implementation for testing
//!
//! This module provides a mock serial port that can be used to exercise the
//! RTU slave without actual hardware. Incoming data is queued in chunks; each
//! read returns at most one chunk, the way a UART driver hands over whatever
//! arrived since the last read. An empty queue reads as end of stream.

use crate::rtu::crc::append_crc;
use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// Mock serial port that simulates bidirectional communication
#[derive(Clone, Default)]
pub struct MockSerialPort {
    /// Data written to the port (outgoing)
    pub tx_buffer: Arc<Mutex<Vec<u8>>>,
    /// Chunks to be read from the port (incoming)
    pub rx_chunks: Arc<Mutex<VecDeque<Vec<u8>>>>,
    /// Simulated error for the next read or write
    pub next_error: Arc<Mutex<Option<io::Error>>>,
}

impl MockSerialPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one chunk to be returned by a single read
    pub fn queue_rx_data(&self, data: &[u8]) {
        self.rx_chunks.lock().unwrap().push_back(data.to_vec());
    }

    /// Queue a request, appending its RTU checksum
    pub fn queue_request(&self, request: &[u8]) {
        self.queue_rx_data(&append_crc(request));
    }

    /// Get data that was written to the port
    pub fn get_tx_data(&self) -> Vec<u8> {
        self.tx_buffer.lock().unwrap().clone()
    }

    /// Get and clear data that was written to the port
    pub fn take_tx_data(&self) -> Vec<u8> {
        std::mem::take(&mut *self.tx_buffer.lock().unwrap())
    }

    /// Number of chunks not read yet
    pub fn pending_rx_chunks(&self) -> usize {
        self.rx_chunks.lock().unwrap().len()
    }

    /// Clear all buffers
    pub fn clear(&self) {
        self.tx_buffer.lock().unwrap().clear();
        self.rx_chunks.lock().unwrap().clear();
    }

    /// Set an error to be returned on the next operation
    pub fn set_next_error(&self, error: io::Error) {
        *self.next_error.lock().unwrap() = Some(error);
    }
}

impl AsyncRead for MockSerialPort {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if let Some(error) = self.next_error.lock().unwrap().take() {
            return Poll::Ready(Err(error));
        }

        let mut rx = self.rx_chunks.lock().unwrap();
        if let Some(chunk) = rx.front_mut() {
            let n = chunk.len().min(buf.remaining());
            buf.put_slice(&chunk[..n]);
            *chunk = chunk.split_off(n);
            if chunk.is_empty() {
                rx.pop_front();
            }
        }

        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for MockSerialPort {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        if let Some(error) = self.next_error.lock().unwrap().take() {
            return Poll::Ready(Err(error));
        }

        self.tx_buffer.lock().unwrap().extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}
