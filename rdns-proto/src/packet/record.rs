use super::QueryType;
use crate::buffer::reader::ReaderError;
use crate::buffer::writer::WriterError;
use crate::buffer::BytePacketBuffer;
use crate::name::Name;
use std::net::{Ipv4Addr, Ipv6Addr};

/// The CLASS value for the Internet (RFC 1035 §3.2.4). This resolver only
/// ever admits records of this class; other values are carried through the
/// codec unexamined and rejected one layer up, at the resolver/cache.
pub const CLASS_IN: u16 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::upper_case_acronyms)]
pub enum Record {
    Unknown {
        domain: Name,
        qtype: u16,
        class: u16,
        data_len: u16,
        ttl: u32,
    }, // 0
    A {
        domain: Name,
        class: u16,
        addr: Ipv4Addr,
        ttl: u32,
    }, // 1
    NS {
        domain: Name,
        class: u16,
        host: Name,
        ttl: u32,
    }, // 2
    CNAME {
        domain: Name,
        class: u16,
        host: Name,
        ttl: u32,
    }, // 5
    Soa {
        domain: Name,
        class: u16,
        mname: Name,
        rname: Name,
        serial: u32,
        refresh: u32,
        retry: u32,
        expire: u32,
        minimum: u32,
        ttl: u32,
    }, // 6
    MX {
        domain: Name,
        class: u16,
        priority: u16,
        host: Name,
        ttl: u32,
    }, // 15
    AAAA {
        domain: Name,
        class: u16,
        addr: Ipv6Addr,
        ttl: u32,
    }, // 28
}

impl Record {
    pub fn domain(&self) -> &Name {
        match self {
            Self::A { domain, .. } => domain,
            Self::AAAA { domain, .. } => domain,
            Self::CNAME { domain, .. } => domain,
            Self::MX { domain, .. } => domain,
            Self::NS { domain, .. } => domain,
            Self::Soa { domain, .. } => domain,
            Self::Unknown { domain, .. } => domain,
        }
    }

    pub fn ttl(&self) -> u32 {
        match self {
            Self::A { ttl, .. } => *ttl,
            Self::AAAA { ttl, .. } => *ttl,
            Self::CNAME { ttl, .. } => *ttl,
            Self::MX { ttl, .. } => *ttl,
            Self::NS { ttl, .. } => *ttl,
            Self::Soa { ttl, .. } => *ttl,
            Self::Unknown { ttl, .. } => *ttl,
        }
    }

    /// Raw on-wire CLASS value. Compare against [`CLASS_IN`] — this
    /// resolver's only supported class — rather than parsing it into an
    /// enum, since the codec accepts any value here.
    pub fn class(&self) -> u16 {
        match self {
            Self::A { class, .. } => *class,
            Self::AAAA { class, .. } => *class,
            Self::CNAME { class, .. } => *class,
            Self::MX { class, .. } => *class,
            Self::NS { class, .. } => *class,
            Self::Soa { class, .. } => *class,
            Self::Unknown { class, .. } => *class,
        }
    }

    pub fn is_internet_class(&self) -> bool {
        self.class() == CLASS_IN
    }

    pub fn query_type(&self) -> QueryType {
        match self {
            Self::A { .. } => QueryType::A,
            Self::AAAA { .. } => QueryType::AAAA,
            Self::CNAME { .. } => QueryType::CNAME,
            Self::MX { .. } => QueryType::MX,
            Self::NS { .. } => QueryType::NS,
            Self::Soa { .. } => QueryType::SOA,
            Self::Unknown { qtype, .. } => QueryType::Unknown(*qtype),
        }
    }

    /// Returns a copy of this record with its TTL replaced, used by the
    /// cache to serve a record with its remaining (rather than original)
    /// TTL.
    pub fn with_ttl(&self, ttl: u32) -> Self {
        match self.clone() {
            Self::A {
                domain,
                class,
                addr,
                ..
            } => Self::A {
                domain,
                class,
                addr,
                ttl,
            },
            Self::AAAA {
                domain,
                class,
                addr,
                ..
            } => Self::AAAA {
                domain,
                class,
                addr,
                ttl,
            },
            Self::CNAME {
                domain,
                class,
                host,
                ..
            } => Self::CNAME {
                domain,
                class,
                host,
                ttl,
            },
            Self::MX {
                domain,
                class,
                priority,
                host,
                ..
            } => Self::MX {
                domain,
                class,
                priority,
                host,
                ttl,
            },
            Self::NS {
                domain,
                class,
                host,
                ..
            } => Self::NS {
                domain,
                class,
                host,
                ttl,
            },
            Self::Soa {
                domain,
                class,
                mname,
                rname,
                serial,
                refresh,
                retry,
                expire,
                minimum,
                ..
            } => Self::Soa {
                domain,
                class,
                mname,
                rname,
                serial,
                refresh,
                retry,
                expire,
                minimum,
                ttl,
            },
            Self::Unknown {
                domain,
                qtype,
                class,
                data_len,
                ..
            } => Self::Unknown {
                domain,
                qtype,
                class,
                data_len,
                ttl,
            },
        }
    }

    /// Byte identity of this record's RDATA, excluding the owner name and
    /// TTL — used by the cache to dedup items within a (name, type) bucket
    /// by exact RDATA.
    pub fn rdata_identity(&self) -> Vec<u8> {
        match self {
            Self::A { addr, .. } => addr.octets().to_vec(),
            Self::AAAA { addr, .. } => addr.octets().to_vec(),
            Self::NS { host, .. } => host.case_sensitive_key().into_bytes(),
            Self::CNAME { host, .. } => host.case_sensitive_key().into_bytes(),
            Self::MX { priority, host, .. } => {
                let mut out = priority.to_be_bytes().to_vec();
                out.extend(host.case_sensitive_key().into_bytes());
                out
            }
            Self::Soa {
                mname,
                rname,
                serial,
                refresh,
                retry,
                expire,
                minimum,
                ..
            } => {
                let mut out = mname.case_sensitive_key().into_bytes();
                out.extend(rname.case_sensitive_key().into_bytes());
                out.extend(serial.to_be_bytes());
                out.extend(refresh.to_be_bytes());
                out.extend(retry.to_be_bytes());
                out.extend(expire.to_be_bytes());
                out.extend(minimum.to_be_bytes());
                out
            }
            Self::Unknown {
                qtype, data_len, ..
            } => {
                let mut out = qtype.to_be_bytes().to_vec();
                out.extend(data_len.to_be_bytes());
                out
            }
        }
    }

    pub fn read(buffer: &mut BytePacketBuffer) -> Result<Record, ReaderError> {
        let domain = buffer.read_name()?;

        let qtype_num = buffer.read_u16()?;
        let qtype = QueryType::from_num(qtype_num);

        let class = buffer.read_u16()?;
        let ttl = buffer.read_u32()?;
        let data_len = buffer.read_u16()?;

        match qtype {
            QueryType::A => {
                let raw_addr = buffer.read_u32()?;
                let addr = Ipv4Addr::new(
                    ((raw_addr >> 24) & 0xFF) as u8,
                    ((raw_addr >> 16) & 0xFF) as u8,
                    ((raw_addr >> 8) & 0xFF) as u8,
                    (raw_addr & 0xFF) as u8,
                );

                Ok(Record::A {
                    domain,
                    class,
                    addr,
                    ttl,
                })
            }
            QueryType::AAAA => {
                let raw_addr1 = buffer.read_u32()?;
                let raw_addr2 = buffer.read_u32()?;
                let raw_addr3 = buffer.read_u32()?;
                let raw_addr4 = buffer.read_u32()?;
                let addr = Ipv6Addr::new(
                    ((raw_addr1 >> 16) & 0xFFFF) as u16,
                    (raw_addr1 & 0xFFFF) as u16,
                    ((raw_addr2 >> 16) & 0xFFFF) as u16,
                    (raw_addr2 & 0xFFFF) as u16,
                    ((raw_addr3 >> 16) & 0xFFFF) as u16,
                    (raw_addr3 & 0xFFFF) as u16,
                    ((raw_addr4 >> 16) & 0xFFFF) as u16,
                    (raw_addr4 & 0xFFFF) as u16,
                );

                Ok(Record::AAAA {
                    domain,
                    class,
                    addr,
                    ttl,
                })
            }
            QueryType::NS => {
                let host = buffer.read_name()?;
                Ok(Record::NS {
                    domain,
                    class,
                    host,
                    ttl,
                })
            }
            QueryType::CNAME => {
                let host = buffer.read_name()?;
                Ok(Record::CNAME {
                    domain,
                    class,
                    host,
                    ttl,
                })
            }
            QueryType::SOA => {
                let mname = buffer.read_name()?;
                let rname = buffer.read_name()?;
                let serial = buffer.read_u32()?;
                let refresh = buffer.read_u32()?;
                let retry = buffer.read_u32()?;
                let expire = buffer.read_u32()?;
                let minimum = buffer.read_u32()?;

                Ok(Record::Soa {
                    domain,
                    class,
                    mname,
                    rname,
                    serial,
                    refresh,
                    retry,
                    expire,
                    minimum,
                    ttl,
                })
            }
            QueryType::MX => {
                let priority = buffer.read_u16()?;
                let host = buffer.read_name()?;

                Ok(Record::MX {
                    domain,
                    class,
                    priority,
                    host,
                    ttl,
                })
            }
            QueryType::Unknown(_) => {
                buffer.step(data_len as usize)?;

                Ok(Record::Unknown {
                    domain,
                    qtype: qtype_num,
                    class,
                    data_len,
                    ttl,
                })
            }
        }
    }

    pub fn write(&self, buffer: &mut BytePacketBuffer) -> Result<usize, WriterError> {
        let start_pos = buffer.pos();

        match self {
            Record::A {
                domain,
                class,
                addr,
                ttl,
            } => {
                buffer.write_name(domain)?;
                buffer.write_u16(QueryType::A.into_num())?;
                buffer.write_u16(*class)?;
                buffer.write_u32(*ttl)?;
                buffer.write_u16(4)?;

                let octets = addr.octets();
                buffer.write_bytes(&octets)?;
            }
            Record::NS {
                domain,
                class,
                host,
                ttl,
            } => {
                buffer.write_name(domain)?;
                buffer.write_u16(QueryType::NS.into_num())?;
                buffer.write_u16(*class)?;
                buffer.write_u32(*ttl)?;

                let pos = buffer.pos();
                buffer.write_u16(0)?;
                buffer.write_name(host)?;
                let size = buffer.pos() - (pos + 2);
                buffer.set_u16(pos, size as u16)?;
            }
            Record::CNAME {
                domain,
                class,
                host,
                ttl,
            } => {
                buffer.write_name(domain)?;
                buffer.write_u16(QueryType::CNAME.into_num())?;
                buffer.write_u16(*class)?;
                buffer.write_u32(*ttl)?;

                let pos = buffer.pos();
                buffer.write_u16(0)?;
                buffer.write_name(host)?;
                let size = buffer.pos() - (pos + 2);
                buffer.set_u16(pos, size as u16)?;
            }
            Record::Soa {
                domain,
                class,
                mname,
                rname,
                serial,
                refresh,
                retry,
                expire,
                minimum,
                ttl,
            } => {
                buffer.write_name(domain)?;
                buffer.write_u16(QueryType::SOA.into_num())?;
                buffer.write_u16(*class)?;
                buffer.write_u32(*ttl)?;

                let pos = buffer.pos();
                buffer.write_u16(0)?;
                buffer.write_name(mname)?;
                buffer.write_name(rname)?;
                buffer.write_u32(*serial)?;
                buffer.write_u32(*refresh)?;
                buffer.write_u32(*retry)?;
                buffer.write_u32(*expire)?;
                buffer.write_u32(*minimum)?;
                let size = buffer.pos() - (pos + 2);
                buffer.set_u16(pos, size as u16)?;
            }
            Record::MX {
                domain,
                class,
                priority,
                host,
                ttl,
            } => {
                buffer.write_name(domain)?;
                buffer.write_u16(QueryType::MX.into_num())?;
                buffer.write_u16(*class)?;
                buffer.write_u32(*ttl)?;

                let pos = buffer.pos();
                buffer.write_u16(0)?;
                buffer.write_u16(*priority)?;
                buffer.write_name(host)?;
                let size = buffer.pos() - (pos + 2);
                buffer.set_u16(pos, size as u16)?;
            }
            Record::AAAA {
                domain,
                class,
                addr,
                ttl,
            } => {
                buffer.write_name(domain)?;
                buffer.write_u16(QueryType::AAAA.into_num())?;
                buffer.write_u16(*class)?;
                buffer.write_u32(*ttl)?;
                buffer.write_u16(16)?;

                for segment in addr.segments() {
                    buffer.write_u16(segment)?;
                }
            }
            Record::Unknown { .. } => {
                tracing::debug!(record = ?self, "skipping write of unknown record");
            }
        }

        Ok(buffer.pos() - start_pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_record() {
        let record = Record::A {
            domain: "example.com".into(),
            class: CLASS_IN,
            addr: Ipv4Addr::new(93, 184, 216, 34),
            ttl: 300,
        };
        let mut buffer = BytePacketBuffer::default();
        record.write(&mut buffer).unwrap();
        buffer.seek(0);
        assert_eq!(Record::read(&mut buffer).unwrap(), record);
    }

    #[test]
    fn round_trips_cname_chasing_through_ns_referral() {
        let record = Record::CNAME {
            domain: "www.example.com".into(),
            class: CLASS_IN,
            host: "example.com".into(),
            ttl: 60,
        };
        let mut buffer = BytePacketBuffer::default();
        record.write(&mut buffer).unwrap();
        buffer.seek(0);
        assert_eq!(Record::read(&mut buffer).unwrap(), record);
    }

    #[test]
    fn round_trips_soa_record_used_for_negative_caching() {
        let record = Record::Soa {
            domain: "example.com".into(),
            class: CLASS_IN,
            mname: "ns1.example.com".into(),
            rname: "hostmaster.example.com".into(),
            serial: 2024010100,
            refresh: 7200,
            retry: 3600,
            expire: 1209600,
            minimum: 300,
            ttl: 300,
        };
        let mut buffer = BytePacketBuffer::default();
        record.write(&mut buffer).unwrap();
        buffer.seek(0);
        assert_eq!(Record::read(&mut buffer).unwrap(), record);
    }

    #[test]
    fn unknown_record_types_are_skipped_by_rdlength() {
        let mut buffer = BytePacketBuffer::default();
        buffer.write_name(&"example.com".into()).unwrap();
        buffer.write_u16(99).unwrap(); // unassigned type
        buffer.write_u16(1).unwrap();
        buffer.write_u32(60).unwrap();
        buffer.write_u16(3).unwrap();
        buffer.write_bytes(&[1, 2, 3]).unwrap();
        buffer.seek(0);
        let record = Record::read(&mut buffer).unwrap();
        assert_eq!(
            record,
            Record::Unknown {
                domain: "example.com".into(),
                qtype: 99,
                class: 1,
                data_len: 3,
                ttl: 60,
            }
        );
    }

    #[test]
    fn with_ttl_replaces_only_the_ttl() {
        let record = Record::A {
            domain: "example.com".into(),
            class: CLASS_IN,
            addr: Ipv4Addr::new(1, 2, 3, 4),
            ttl: 300,
        };
        let aged = record.with_ttl(12);
        assert_eq!(aged.ttl(), 12);
        assert_eq!(aged.domain(), record.domain());
    }

    #[test]
    fn rejects_non_internet_class_at_resolver_layer_not_codec() {
        // The codec accepts any class value; only the resolver/cache layer
        // rejects non-IN records.
        let mut buffer = BytePacketBuffer::default();
        buffer.write_name(&"example.com".into()).unwrap();
        buffer.write_u16(QueryType::A.into_num()).unwrap();
        buffer.write_u16(3).unwrap(); // CHAOS class
        buffer.write_u32(60).unwrap();
        buffer.write_u16(4).unwrap();
        buffer.write_bytes(&[1, 2, 3, 4]).unwrap();
        buffer.seek(0);
        let record = Record::read(&mut buffer).unwrap();
        assert!(!record.is_internet_class());
    }
}
