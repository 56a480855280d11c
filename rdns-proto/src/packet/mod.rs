pub mod header;
pub mod question;
pub mod record;

use crate::buffer::{BytePacketBuffer, ReaderError, WriterError};

#[derive(PartialEq, Eq, Debug, Clone, Copy, Hash)]
#[allow(clippy::upper_case_acronyms)]
pub enum QueryType {
    Unknown(u16),
    /// a host address
    A, // 1
    /// an authoritative name server
    NS, // 2
    /// the canonical name for an alias
    CNAME, // 5
    /// start of a zone of authority
    SOA, // 6
    /// mail exchange
    MX, // 15
    AAAA, // 28
}

impl QueryType {
    pub fn into_num(self) -> u16 {
        match self {
            QueryType::Unknown(x) => x,
            QueryType::A => 1,
            QueryType::NS => 2,
            QueryType::CNAME => 5,
            QueryType::SOA => 6,
            QueryType::MX => 15,
            QueryType::AAAA => 28,
        }
    }

    pub fn from_num(num: u16) -> QueryType {
        match num {
            1 => QueryType::A,
            2 => QueryType::NS,
            5 => QueryType::CNAME,
            6 => QueryType::SOA,
            15 => QueryType::MX,
            28 => QueryType::AAAA,
            _ => QueryType::Unknown(num),
        }
    }
}

/// A fully decoded DNS message.
///
/// Parsing is lenient in the sections that follow the header and question:
/// a record that fails to decode (an unsupported compression shape, a
/// truncated RDATA) stops that section's loop rather than rejecting the
/// whole datagram, and the corresponding header count is rewritten down to
/// the number actually recovered. Upstream replies are frequently cut short
/// by a resolver's EDNS/UDP size limits; a resolver that gives up on
/// truncation loses answers it could otherwise have used.
#[derive(Clone, Debug, Default)]
pub struct DnsPacket {
    pub header: header::Header,
    pub questions: Vec<question::Question>,
    pub answers: Vec<record::Record>,
    pub authorities: Vec<record::Record>,
    pub resources: Vec<record::Record>,
}

impl DnsPacket {
    pub fn parse(mut buffer: BytePacketBuffer) -> Result<Self, ReaderError> {
        let mut header = header::Header::read(&mut buffer)?;

        let questions = read_lenient(&mut buffer, header.questions, question::Question::read);
        header.questions = questions.len() as u16;

        let answers = read_lenient(&mut buffer, header.answers, record::Record::read);
        header.answers = answers.len() as u16;

        let authorities = read_lenient(
            &mut buffer,
            header.authoritative_entries,
            record::Record::read,
        );
        header.authoritative_entries = authorities.len() as u16;

        let resources = read_lenient(&mut buffer, header.resource_entries, record::Record::read);
        header.resource_entries = resources.len() as u16;

        Ok(DnsPacket {
            header,
            questions,
            answers,
            authorities,
            resources,
        })
    }

    pub fn assemble(&mut self) -> Result<BytePacketBuffer, WriterError> {
        let mut buffer = BytePacketBuffer::default();
        self.header.questions = self.questions.len() as u16;
        self.header.answers = self.answers.len() as u16;
        self.header.authoritative_entries = self.authorities.len() as u16;
        self.header.resource_entries = self.resources.len() as u16;

        self.header.write(&mut buffer)?;

        for question in &self.questions {
            question.write(&mut buffer)?;
        }
        for rec in &self.answers {
            rec.write(&mut buffer)?;
        }
        for rec in &self.authorities {
            rec.write(&mut buffer)?;
        }
        for rec in &self.resources {
            rec.write(&mut buffer)?;
        }

        Ok(buffer)
    }
}

/// Reads up to `count` entries, stopping at the first read error instead of
/// propagating it. The caller rewrites the relevant header count field to
/// `result.len()` afterwards.
fn read_lenient<T>(
    buffer: &mut BytePacketBuffer,
    count: u16,
    read_one: impl Fn(&mut BytePacketBuffer) -> Result<T, ReaderError>,
) -> Vec<T> {
    let mut items = Vec::with_capacity(count as usize);
    for _ in 0..count {
        match read_one(buffer) {
            Ok(item) => items.push(item),
            Err(err) => {
                tracing::debug!(?err, recovered = items.len(), "truncating packet section");
                break;
            }
        }
    }
    items
}
