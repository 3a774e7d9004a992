//! Append-only little-endian byte buffer with a running location
//! counter.

use crate::error::AsmError;
use crate::util::bitsize;
use arch::flag::{DWORD_SZ, WORD_SZ};

#[derive(Debug, Default, Clone)]
pub struct Section {
    pub counter: u32,
    data: Vec<u8>,
}

impl Section {
    pub fn new() -> Self {
        Section::default()
    }

    /// Writes `value` as `width` little-endian bytes and advances the
    /// counter. Values wider than the stream are rejected.
    pub fn write(&mut self, value: i64, width: usize) -> Result<(), AsmError> {
        if bitsize(value as u64) > (width * 8) as u32 {
            return Err(AsmError::StreamOverflow { value, width });
        }
        for k in 0..width {
            self.counter += 1;
            self.data.push((value >> (8 * k)) as u8);
        }
        Ok(())
    }

    pub fn bytes(&mut self, value: i64) -> Result<(), AsmError> {
        self.write(value, 1)
    }

    pub fn words(&mut self, value: i64) -> Result<(), AsmError> {
        self.write(value, WORD_SZ)
    }

    pub fn dwords(&mut self, value: i64) -> Result<(), AsmError> {
        self.write(value, DWORD_SZ)
    }

    /// A width-checked writer over this buffer. Only the word and
    /// dword widths exist as streams.
    pub fn stream(&mut self, width: usize) -> Result<Stream<'_>, AsmError> {
        match width {
            WORD_SZ | DWORD_SZ => Ok(Stream {
                section: self,
                width,
            }),
            _ => Err(AsmError::Internal("illegal byte number passed")),
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Uppercase hex rendering, two characters per byte.
    pub fn memdump(&self) -> String {
        self.data.iter().map(|byte| format!("{:02X}", byte)).collect()
    }
}

pub struct Stream<'a> {
    section: &'a mut Section,
    width: usize,
}

impl Stream<'_> {
    pub fn emit(&mut self, value: i64) -> Result<(), AsmError> {
        self.section.write(value, self.width)
    }
}
