use super::QueryType;
use crate::buffer::reader::ReaderError;
use crate::buffer::writer::WriterError;
use crate::buffer::BytePacketBuffer;
use crate::name::Name;

/// CLASS fields appear in questions and resource records.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u16)]
pub enum DnsClass {
    /// IN - the Internet
    Internet = 1,
    /// CS - the CSNET class (Obsolete - used only for examples in some obsolete RFCs)
    Csnet = 2,
    /// CH - the CHAOS class
    Chaos = 3,
    /// HS - Hesiod [Dyer 87]
    Hesiod = 4,
}

impl Default for DnsClass {
    fn default() -> Self {
        Self::Internet
    }
}

impl TryFrom<u16> for DnsClass {
    type Error = ReaderError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Internet),
            2 => Ok(Self::Csnet),
            3 => Ok(Self::Chaos),
            4 => Ok(Self::Hesiod),
            other => Err(ReaderError::InvalidClass(other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    /// QNAME, the name being looked up.
    pub name: Name,
    /// QTYPE, the record type being asked for.
    pub qtype: QueryType,
    /// QCLASS, almost always [`DnsClass::Internet`].
    pub qclass: DnsClass,
}

impl Default for Question {
    fn default() -> Self {
        Self {
            name: Name::root(),
            qtype: QueryType::Unknown(0),
            qclass: DnsClass::Internet,
        }
    }
}

impl Question {
    pub fn new(name: Name, qtype: QueryType) -> Self {
        Self {
            name,
            qtype,
            qclass: DnsClass::default(),
        }
    }

    pub fn read(buffer: &mut BytePacketBuffer) -> Result<Self, ReaderError> {
        let name = buffer.read_name()?;
        let qtype = QueryType::from_num(buffer.read_u16()?);
        let qclass = DnsClass::try_from(buffer.read_u16()?)?;

        Ok(Self {
            name,
            qtype,
            qclass,
        })
    }

    pub fn write(&self, buffer: &mut BytePacketBuffer) -> Result<(), WriterError> {
        buffer.write_name(&self.name)?;
        buffer.write_u16(self.qtype.into_num())?;
        buffer.write_u16(self.qclass as u16)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_buffer() {
        let question = Question::new("example.com".into(), QueryType::A);
        let mut buffer = BytePacketBuffer::default();
        question.write(&mut buffer).unwrap();
        buffer.seek(0);
        let parsed = Question::read(&mut buffer).unwrap();
        assert_eq!(parsed, question);
    }

    #[test]
    fn rejects_invalid_class() {
        let mut buffer = BytePacketBuffer::default();
        buffer.write_name(&"example.com".into()).unwrap();
        buffer.write_u16(QueryType::A.into_num()).unwrap();
        buffer.write_u16(9).unwrap();
        buffer.seek(0);
        let err = Question::read(&mut buffer).unwrap_err();
        assert_eq!(err, ReaderError::InvalidClass(9));
    }
}
