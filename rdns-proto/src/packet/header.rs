use crate::buffer::reader::ReaderError;
use crate::buffer::writer::WriterError;
use crate::buffer::BytePacketBuffer;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ResponseCode {
    /// No error condition
    NoError = 0,
    /// Format error - the name server was unable to interpret the query.
    FormatError = 1,
    /// Server failure - the name server was unable to process this query due
    /// to a problem with the name server, including a timed-out or
    /// unverifiable upstream reply.
    ServerFailure = 2,
    /// Name error - meaningful only for responses from an authoritative name
    /// server, this code signifies that the domain name referenced in the
    /// query does not exist. Previously named NXDOMAIN.
    NameError = 3,
    /// Not implemented - the name server does not support the requested kind
    /// of query.
    NotImplemented = 4,
    /// Refused - the name server refuses to perform the specified operation
    /// for policy reasons.
    Refused = 5,
}

impl TryFrom<u8> for ResponseCode {
    type Error = ReaderError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ResponseCode::NoError),
            1 => Ok(ResponseCode::FormatError),
            2 => Ok(ResponseCode::ServerFailure),
            3 => Ok(ResponseCode::NameError),
            4 => Ok(ResponseCode::NotImplemented),
            5 => Ok(ResponseCode::Refused),
            other => Err(ReaderError::InvalidResponseCode(other)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    /// A 16 bit identifier assigned by the program that generates any kind
    /// of query. This identifier is copied the corresponding reply and can
    /// be used by the requester to match up replies to outstanding queries.
    pub id: u16,

    /// RD Recursion Desired - copied from query into response.
    pub recursion_desired: bool,
    /// TC TrunCation - message was truncated due to length greater than
    /// that permitted on the transmission channel.
    pub truncated_message: bool,
    /// AA Authoritative Answer.
    pub authoritative_answer: bool,
    /// OPCODE, a four bit field specifying the kind of query.
    pub opcode: u8,
    /// QR - whether this message is a query (false) or a response (true).
    pub response: bool,

    pub response_code: ResponseCode,
    pub checking_disabled: bool,
    pub authed_data: bool,
    /// Z, reserved, must be zero.
    pub z: bool,
    /// RA Recursion Available.
    pub recursion_available: bool,

    pub questions: u16,
    pub answers: u16,
    pub authoritative_entries: u16,
    pub resource_entries: u16,
}

impl Header {
    pub fn question(id: u16) -> Self {
        Self {
            id,
            recursion_desired: true,
            ..Default::default()
        }
    }

    pub fn response_from(request: &Self) -> Self {
        Self {
            id: request.id,
            recursion_desired: request.recursion_desired,
            response: true,
            ..Default::default()
        }
    }

    pub fn with_response_code(mut self, value: ResponseCode) -> Self {
        self.response_code = value;
        self
    }
}

impl Default for Header {
    fn default() -> Self {
        Self {
            id: 0,
            recursion_desired: false,
            truncated_message: false,
            authoritative_answer: false,
            opcode: 0,
            response: false,
            response_code: ResponseCode::NoError,
            checking_disabled: false,
            authed_data: false,
            z: false,
            recursion_available: false,
            questions: 0,
            answers: 0,
            authoritative_entries: 0,
            resource_entries: 0,
        }
    }
}

impl Header {
    pub fn read(buffer: &mut BytePacketBuffer) -> Result<Self, ReaderError> {
        let id = buffer.read_u16()?;

        let head = buffer.read()?;
        let tail = buffer.read()?;

        let questions = buffer.read_u16()?;
        let answers = buffer.read_u16()?;
        let authoritative_entries = buffer.read_u16()?;
        let resource_entries = buffer.read_u16()?;

        Ok(Self {
            id,
            recursion_desired: (head & (1 << 0)) > 0,
            truncated_message: (head & (1 << 1)) > 0,
            authoritative_answer: (head & (1 << 2)) > 0,
            opcode: (head >> 3) & 0x0F,
            response: (head & (1 << 7)) > 0,
            response_code: ResponseCode::try_from(tail & 0x0F)?,
            checking_disabled: (tail & (1 << 4)) > 0,
            authed_data: (tail & (1 << 5)) > 0,
            z: (tail & (1 << 6)) > 0,
            recursion_available: (tail & (1 << 7)) > 0,
            questions,
            answers,
            authoritative_entries,
            resource_entries,
        })
    }

    pub fn write(&self, buffer: &mut BytePacketBuffer) -> Result<(), WriterError> {
        buffer.write_u16(self.id)?;

        buffer.write_u8(
            (self.recursion_desired as u8)
                | ((self.truncated_message as u8) << 1)
                | ((self.authoritative_answer as u8) << 2)
                | (self.opcode << 3)
                | ((self.response as u8) << 7),
        )?;

        buffer.write_u8(
            (self.response_code as u8)
                | ((self.checking_disabled as u8) << 4)
                | ((self.authed_data as u8) << 5)
                | ((self.z as u8) << 6)
                | ((self.recursion_available as u8) << 7),
        )?;

        buffer.write_u16(self.questions)?;
        buffer.write_u16(self.answers)?;
        buffer.write_u16(self.authoritative_entries)?;
        buffer.write_u16(self.resource_entries)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_buffer() {
        let header = Header {
            id: 0xBEEF,
            recursion_desired: true,
            truncated_message: false,
            authoritative_answer: true,
            opcode: 0,
            response: true,
            response_code: ResponseCode::NameError,
            checking_disabled: false,
            authed_data: true,
            z: false,
            recursion_available: true,
            questions: 1,
            answers: 2,
            authoritative_entries: 0,
            resource_entries: 3,
        };

        let mut buffer = BytePacketBuffer::default();
        header.write(&mut buffer).unwrap();
        buffer.seek(0);
        let parsed = Header::read(&mut buffer).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn response_from_copies_id_and_recursion_desired() {
        let request = Header::question(7).with_response_code(ResponseCode::NoError);
        let response = Header::response_from(&request);
        assert_eq!(response.id, 7);
        assert!(response.recursion_desired);
        assert!(response.response);
        assert_eq!(response.response_code, ResponseCode::NoError);
    }

    #[test]
    fn rejects_invalid_response_code() {
        let mut buffer = BytePacketBuffer::default();
        buffer.write_u16(1).unwrap();
        buffer.write_u8(0).unwrap();
        buffer.write_u8(0x0F).unwrap(); // rcode 15, not assigned
        buffer.write_u16(0).unwrap();
        buffer.write_u16(0).unwrap();
        buffer.write_u16(0).unwrap();
        buffer.write_u16(0).unwrap();
        buffer.seek(0);
        let err = Header::read(&mut buffer).unwrap_err();
        assert_eq!(err, ReaderError::InvalidResponseCode(15));
    }
}
