//! The positive/negative name cache.
//!
//! Keyed by (canonical case-insensitive name, type), each positive bucket
//! holds a set of items deduplicated by exact RDATA, each with its own
//! expiry deadline. A parallel negative ("miss") map holds SOA records
//! standing in for NXDOMAIN/NODATA, keyed by the *question* name and type.

use std::collections::HashMap;
use std::time::Duration;

use rdns_proto::packet::header::ResponseCode;
use rdns_proto::packet::record::CLASS_IN;
use rdns_proto::{DnsPacket, Name, QueryType, Record};
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::waiters::WaiterTable;

/// Negative TTLs are clamped into this range regardless of what the
/// authority's SOA record claims, so a misconfigured zone can't pin a
/// negative answer in the cache forever or hammer the authority every
/// second.
pub const NEGATIVE_TTL_MIN: u64 = 5;
pub const NEGATIVE_TTL_MAX: u64 = 600;

/// QTYPE 255 (RFC 1035 §3.2.3) — "all records present at this name".
const QTYPE_ANY: u16 = 255;

/// A bundle of records returned from a lookup, along with the response code
/// the reply to the client should carry.
#[derive(Debug, Clone)]
pub struct CacheResult {
    pub records: Vec<Record>,
    pub response_code: ResponseCode,
}

/// Result of [`Cache::lookup`]: a positive hit, a negative hit, both absent
/// ("unknown"), or — never — both present.
#[derive(Debug, Clone, Default)]
pub struct LookupResult {
    pub positive: Option<CacheResult>,
    pub negative: Option<CacheResult>,
}

impl LookupResult {
    pub fn is_unknown(&self) -> bool {
        self.positive.is_none() && self.negative.is_none()
    }
}

#[derive(Debug, Clone)]
struct PositiveItem {
    record: Record,
    deadline: Instant,
}

#[derive(Debug, Clone)]
struct NegativeItem {
    /// The SOA record as received; its `domain()` is the true owner name,
    /// which under NXDOMAIN differs from the question name.
    soa: Record,
    response_code: ResponseCode,
    deadline: Instant,
}

type PositiveKey = (String, QueryType);
type NegativeKey = (String, QueryType);

#[derive(Default)]
struct Inner {
    positive: HashMap<PositiveKey, HashMap<Vec<u8>, PositiveItem>>,
    negative: HashMap<NegativeKey, NegativeItem>,
}

#[derive(Debug)]
pub enum AdmitError {
    /// A reply must carry exactly one echoed question to be admitted.
    NotExactlyOneQuestion,
}

/// The name cache. Share it behind an `Arc<Cache>` across tasks; reads and
/// writes each hold the lock for the duration of the operation, so a
/// lookup either sees the complete effect of an admission or none of it.
#[derive(Default)]
pub struct Cache {
    inner: RwLock<Inner>,
}

impl Cache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a name/type, returning a positive hit, a negative hit,
    /// both absent, or — never — both present.
    pub async fn lookup(&self, name: &Name, qtype: QueryType) -> LookupResult {
        let key_name = name.canonical_key();
        let now = Instant::now();
        let inner = self.inner.read().await;

        let positive = if qtype.into_num() == QTYPE_ANY {
            let mut records = Vec::new();
            for ((bucket_name, _), items) in inner.positive.iter() {
                if *bucket_name == key_name {
                    records.extend(unexpired(items, now));
                }
            }
            (!records.is_empty()).then_some(CacheResult {
                records,
                response_code: ResponseCode::NoError,
            })
        } else {
            inner
                .positive
                .get(&(key_name.clone(), qtype))
                .map(|items| unexpired(items, now))
                .filter(|records| !records.is_empty())
                .map(|records| CacheResult {
                    records,
                    response_code: ResponseCode::NoError,
                })
        };

        let negative = if positive.is_none() {
            if let Some(soa) = inner.negative.get(&(key_name.clone(), QueryType::SOA)) {
                unexpired_negative(soa, now)
            } else {
                inner
                    .negative
                    .get(&(key_name, qtype))
                    .and_then(|item| unexpired_negative(item, now))
            }
        } else {
            None
        };

        LookupResult { positive, negative }
    }

    /// Admits the records from an upstream reply into the cache. The
    /// caller (the upstream reader, which owns the
    /// [`crate::gate::OutstandingGate`]) has already verified the reply and
    /// determined `delegation_label`; the cache itself has no dependency on
    /// that gate.
    ///
    /// Returns the `(name, type)` keys admitted, so the caller can assemble
    /// a reply / decide what progressed; waiters under each key are
    /// released from inside the write lock before it returns.
    pub async fn admit(
        &self,
        packet: &DnsPacket,
        delegation_label: &Name,
        waiters: &WaiterTable,
    ) -> Result<Vec<(String, QueryType)>, AdmitError> {
        if packet.questions.len() != 1 {
            return Err(AdmitError::NotExactlyOneQuestion);
        }
        let question = &packet.questions[0];
        let mut admitted = Vec::new();

        {
            let mut inner = self.inner.write().await;

            if packet.header.authoritative_answer {
                for record in &packet.answers {
                    if admissible(record, delegation_label) {
                        let key = insert_positive(&mut inner, record);
                        admitted.push(key);
                    }
                }
            }

            for record in &packet.resources {
                if matches!(record, Record::A { .. } | Record::AAAA { .. })
                    && admissible(record, delegation_label)
                {
                    let key = insert_positive(&mut inner, record);
                    admitted.push(key);
                }
            }

            for record in &packet.authorities {
                match record {
                    Record::NS { .. } if admissible(record, delegation_label) => {
                        let key = insert_positive(&mut inner, record);
                        admitted.push(key);
                    }
                    Record::Soa { .. }
                        if packet.answers.is_empty() && admissible(record, delegation_label) =>
                    {
                        let key = insert_negative(
                            &mut inner,
                            question.name.clone(),
                            question.qtype,
                            packet.header.response_code,
                            record,
                        );
                        admitted.push(key);
                    }
                    _ => {}
                }
            }

            for key in &admitted {
                waiters.notify(&key.0, key.1).await;
            }
        }

        Ok(admitted)
    }
}

/// A record is admitted only if its owner name is a child of, or equal to,
/// the delegation label it was received under — this is the bailiwick
/// check, and it keeps an upstream from injecting records for names
/// outside its own delegated subtree. Only class IN records are admitted.
fn admissible(record: &Record, delegation_label: &Name) -> bool {
    record.class() == CLASS_IN && record.domain().is_child_of(delegation_label)
}

fn unexpired(items: &HashMap<Vec<u8>, PositiveItem>, now: Instant) -> Vec<Record> {
    items
        .values()
        .filter(|item| now < item.deadline)
        .map(|item| {
            let remaining = (item.deadline - now).as_secs() as u32;
            item.record.with_ttl(remaining)
        })
        .collect()
}

fn unexpired_negative(item: &NegativeItem, now: Instant) -> Option<CacheResult> {
    if now >= item.deadline {
        return None;
    }
    let remaining = (item.deadline - now).as_secs() as u32;
    Some(CacheResult {
        records: vec![item.soa.with_ttl(remaining)],
        response_code: item.response_code,
    })
}

fn insert_positive(inner: &mut Inner, record: &Record) -> (String, QueryType) {
    let key_name = record.domain().canonical_key();
    let qtype = record.query_type();
    let bucket = inner
        .positive
        .entry((key_name.clone(), qtype))
        .or_default();
    bucket.insert(
        record.rdata_identity(),
        PositiveItem {
            record: record.clone(),
            deadline: Instant::now() + Duration::from_secs(record.ttl() as u64),
        },
    );
    tracing::debug!(name = %record.domain(), ?qtype, "cache admitted positive record");
    (key_name, qtype)
}

/// Clamps TTL to `[NEGATIVE_TTL_MIN, NEGATIVE_TTL_MAX]`, keys by the
/// *question* name, and stores the question's type unless the response
/// code was NXDOMAIN (then the stored type is forced to SOA so a later
/// lookup for any type at this name sees "no such name"). The SOA's own
/// RR TTL — not the MINTTL field inside its RDATA (RFC 1035 §3.3.13) — is
/// the value clamped and stored; a mismatch between the two is logged once
/// as a warning.
fn insert_negative(
    inner: &mut Inner,
    question_name: Name,
    question_type: QueryType,
    response_code: ResponseCode,
    soa: &Record,
) -> (String, QueryType) {
    let Record::Soa { ttl, minimum, .. } = soa else {
        unreachable!("caller only passes Record::Soa")
    };
    if *ttl != *minimum {
        tracing::warn!(
            rr_ttl = ttl,
            soa_minttl = minimum,
            name = %question_name,
            "SOA RR TTL differs from MINTTL field; using RR TTL"
        );
    }
    let clamped = (*ttl as u64).clamp(NEGATIVE_TTL_MIN, NEGATIVE_TTL_MAX);

    let stored_type = if response_code == ResponseCode::NameError {
        QueryType::SOA
    } else {
        question_type
    };
    let key_name = question_name.canonical_key();

    inner.negative.insert(
        (key_name.clone(), stored_type),
        NegativeItem {
            soa: soa.clone(),
            response_code,
            deadline: Instant::now() + Duration::from_secs(clamped),
        },
    );
    tracing::debug!(name = %question_name, ?stored_type, "cache admitted negative entry");
    (key_name, stored_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waiters::WaiterTable;
    use rdns_proto::packet::header::Header;
    use rdns_proto::packet::question::Question;
    use std::net::Ipv4Addr;

    fn a_record(name: &str, ttl: u32, addr: Ipv4Addr) -> Record {
        Record::A {
            domain: Name::from_dotted(name),
            class: CLASS_IN,
            addr,
            ttl,
        }
    }

    fn referral_packet(qname: &str, qtype: QueryType, answer: Option<Record>) -> DnsPacket {
        let mut packet = DnsPacket {
            header: Header::response_from(&Header::question(1)),
            questions: vec![Question::new(Name::from_dotted(qname), qtype)],
            ..Default::default()
        };
        packet.header.authoritative_answer = answer.is_some();
        if let Some(rec) = answer {
            packet.answers.push(rec);
        }
        packet
    }

    #[tokio::test(start_paused = true)]
    async fn ttl_expiry_removes_positive_entries() {
        let cache = Cache::new();
        let waiters = WaiterTable::new();
        let packet = referral_packet(
            "example.com",
            QueryType::A,
            Some(a_record("example.com", 5, Ipv4Addr::new(1, 2, 3, 4))),
        );
        cache
            .admit(&packet, &Name::root(), &waiters)
            .await
            .unwrap();

        let name = Name::from_dotted("example.com");
        assert!(cache.lookup(&name, QueryType::A).await.positive.is_some());

        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(cache.lookup(&name, QueryType::A).await.positive.is_none());
    }

    #[tokio::test]
    async fn bailiwick_enforcement_rejects_out_of_zone_answers() {
        let cache = Cache::new();
        let waiters = WaiterTable::new();
        let packet = referral_packet(
            "evil.com",
            QueryType::A,
            Some(a_record("evil.com", 300, Ipv4Addr::new(6, 6, 6, 6))),
        );
        cache
            .admit(&packet, &Name::from_dotted("example.com"), &waiters)
            .await
            .unwrap();

        let name = Name::from_dotted("evil.com");
        assert!(cache.lookup(&name, QueryType::A).await.is_unknown());
    }

    #[tokio::test]
    async fn requires_exactly_one_question() {
        let cache = Cache::new();
        let waiters = WaiterTable::new();
        let mut packet = referral_packet("example.com", QueryType::A, None);
        packet.questions.clear();
        let err = cache
            .admit(&packet, &Name::root(), &waiters)
            .await
            .unwrap_err();
        assert!(matches!(err, AdmitError::NotExactlyOneQuestion));
    }

    #[tokio::test]
    async fn any_query_bundles_every_cached_type() {
        let cache = Cache::new();
        let waiters = WaiterTable::new();
        let a = referral_packet(
            "example.com",
            QueryType::A,
            Some(a_record("example.com", 300, Ipv4Addr::new(1, 1, 1, 1))),
        );
        cache.admit(&a, &Name::root(), &waiters).await.unwrap();

        let result = cache
            .lookup(&Name::from_dotted("example.com"), QueryType::Unknown(255))
            .await;
        assert_eq!(result.positive.unwrap().records.len(), 1);
    }

    #[tokio::test]
    async fn deduplicates_identical_rdata() {
        let cache = Cache::new();
        let waiters = WaiterTable::new();
        for _ in 0..3 {
            let packet = referral_packet(
                "example.com",
                QueryType::A,
                Some(a_record("example.com", 300, Ipv4Addr::new(9, 9, 9, 9))),
            );
            cache.admit(&packet, &Name::root(), &waiters).await.unwrap();
        }
        let result = cache
            .lookup(&Name::from_dotted("example.com"), QueryType::A)
            .await;
        assert_eq!(result.positive.unwrap().records.len(), 1);
    }

    fn soa_record(owner: &str, ttl: u32, minimum: u32) -> Record {
        Record::Soa {
            domain: Name::from_dotted(owner),
            class: CLASS_IN,
            mname: Name::from_dotted("ns1.example.com"),
            rname: Name::from_dotted("hostmaster.example.com"),
            serial: 1,
            refresh: 7200,
            retry: 3600,
            expire: 1209600,
            minimum,
            ttl,
        }
    }

    fn nxdomain_packet(qname: &str) -> DnsPacket {
        let mut packet = DnsPacket {
            header: Header::response_from(&Header::question(1))
                .with_response_code(ResponseCode::NameError),
            questions: vec![Question::new(Name::from_dotted(qname), QueryType::A)],
            ..Default::default()
        };
        packet
            .authorities
            .push(soa_record("example.com", 300, 300));
        packet
    }

    #[tokio::test]
    async fn nxdomain_is_cached_negatively_and_served_for_any_type() {
        let cache = Cache::new();
        let waiters = WaiterTable::new();
        let packet = nxdomain_packet("missing.example.com");
        cache
            .admit(&packet, &Name::from_dotted("example.com"), &waiters)
            .await
            .unwrap();

        let name = Name::from_dotted("missing.example.com");
        let result = cache.lookup(&name, QueryType::AAAA).await;
        assert!(result.positive.is_none());
        let negative = result.negative.unwrap();
        assert_eq!(negative.response_code, ResponseCode::NameError);
        assert_eq!(negative.records[0].domain().to_dotted_string(), "example.com");
    }

    #[tokio::test(start_paused = true)]
    async fn negative_ttl_is_clamped_to_five_and_six_hundred_seconds() {
        let cache = Cache::new();
        let waiters = WaiterTable::new();

        let mut low = nxdomain_packet("low.example.com");
        low.authorities = vec![soa_record("example.com", 0, 0)];
        cache
            .admit(&low, &Name::from_dotted("example.com"), &waiters)
            .await
            .unwrap();
        let low_result = cache
            .lookup(&Name::from_dotted("low.example.com"), QueryType::A)
            .await
            .negative
            .unwrap();
        assert_eq!(low_result.records[0].ttl(), NEGATIVE_TTL_MIN as u32);

        let mut high = nxdomain_packet("high.example.com");
        high.authorities = vec![soa_record("example.com", 10_000, 10_000)];
        cache
            .admit(&high, &Name::from_dotted("example.com"), &waiters)
            .await
            .unwrap();
        let high_result = cache
            .lookup(&Name::from_dotted("high.example.com"), QueryType::A)
            .await
            .negative
            .unwrap();
        assert_eq!(high_result.records[0].ttl(), NEGATIVE_TTL_MAX as u32);
    }

    #[tokio::test]
    async fn negative_entry_is_not_admitted_when_answer_section_is_nonempty() {
        let cache = Cache::new();
        let waiters = WaiterTable::new();
        let mut packet = nxdomain_packet("example.com");
        packet.answers.push(a_record(
            "example.com",
            300,
            Ipv4Addr::new(1, 2, 3, 4),
        ));
        cache
            .admit(&packet, &Name::from_dotted("example.com"), &waiters)
            .await
            .unwrap();

        let result = cache
            .lookup(&Name::from_dotted("example.com"), QueryType::A)
            .await;
        assert!(result.negative.is_none());
    }
}
