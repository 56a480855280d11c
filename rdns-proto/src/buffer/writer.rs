use std::fmt;

use super::BytePacketBuffer;
use crate::name::{Name, NameError};

#[derive(Debug)]
pub enum WriterError {
    EndOfBuffer,
    Name(NameError),
}

impl fmt::Display for WriterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EndOfBuffer => write!(f, "writing out of buffer"),
            Self::Name(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for WriterError {}

impl From<NameError> for WriterError {
    fn from(value: NameError) -> Self {
        Self::Name(value)
    }
}

impl From<WriterError> for std::io::Error {
    fn from(value: WriterError) -> Self {
        std::io::Error::new(std::io::ErrorKind::InvalidData, value.to_string())
    }
}

impl BytePacketBuffer {
    fn set(&mut self, pos: usize, val: u8) -> Result<(), WriterError> {
        if pos >= self.buf.len() {
            return Err(WriterError::EndOfBuffer);
        }
        self.buf[pos] = val;
        Ok(())
    }

    pub fn set_u16(&mut self, pos: usize, val: u16) -> Result<(), WriterError> {
        self.set(pos, (val >> 8) as u8)?;
        self.set(pos + 1, (val & 0xFF) as u8)?;
        Ok(())
    }

    fn write(&mut self, val: u8) -> Result<(), WriterError> {
        if self.pos >= self.buf.len() {
            return Err(WriterError::EndOfBuffer);
        }
        self.buf[self.pos] = val;
        self.pos += 1;
        Ok(())
    }

    pub fn write_u8(&mut self, val: u8) -> Result<(), WriterError> {
        self.write(val)
    }

    pub fn write_u16(&mut self, val: u16) -> Result<(), WriterError> {
        self.write((val >> 8) as u8)?;
        self.write((val & 0xFF) as u8)
    }

    pub fn write_u32(&mut self, val: u32) -> Result<(), WriterError> {
        self.write(((val >> 24) & 0xFF) as u8)?;
        self.write(((val >> 16) & 0xFF) as u8)?;
        self.write(((val >> 8) & 0xFF) as u8)?;
        self.write((val & 0xFF) as u8)
    }

    /// Writes `bytes` verbatim, used for RDATA this codec doesn't decode
    /// into a typed variant.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), WriterError> {
        for b in bytes {
            self.write(*b)?;
        }
        Ok(())
    }

    /// Writes a name's wire encoding. The assembler never compresses names
    /// — responses here are self-contained and typically small, so the
    /// bookkeeping for RFC 1035 §4.1.4 compression isn't worth it on write.
    pub fn write_name(&mut self, name: &Name) -> Result<(), WriterError> {
        let mut encoded = Vec::new();
        name.encode_into(&mut encoded)?;
        self.write_bytes(&encoded)
    }
}
