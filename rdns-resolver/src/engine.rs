//! The iterative resolution engine: `collapsed_lookup` and `advance_cache`,
//! the NS-hierarchy walk, CNAME chasing, and reply assembly. Bounds CNAME
//! depth explicitly, randomizes the root hint, and dispatches through
//! [`crate::upstream::UpstreamSender`] instead of a live socket.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use futures::future::BoxFuture;
use rand::Rng;
use rdns_cache::{Cache, OutstandingGate, WaiterTable};
use rdns_proto::packet::header::{Header, ResponseCode};
use rdns_proto::packet::question::Question;
use rdns_proto::{DnsPacket, Name, QueryType, Record};

use crate::deadline::{Deadline, WAIT_TIMEOUT};
use crate::roothints;
use crate::upstream::UpstreamSender;

/// A lookup gives up after this many attempts that made no progress.
const MAX_ATTEMPTS: u32 = 5;
/// Bounds CNAME chain depth explicitly, rather than relying solely on the
/// attempt counter above, so a referral loop can't be walked forever.
const MAX_CNAME_HOPS: u8 = 8;

/// The outcome of a [`Engine::collapsed_lookup`] call, ready for reply
/// assembly.
#[derive(Debug, Clone)]
pub enum Outcome {
    Positive(Vec<Record>),
    Negative {
        records: Vec<Record>,
        response_code: ResponseCode,
    },
    Timeout,
}

/// The resolver engine. Dispatches upstream queries through `U` instead of a
/// live socket, so the same engine drives the production binary and this
/// crate's `mock`-backed tests.
pub struct Engine<U> {
    cache: Arc<Cache>,
    waiters: Arc<WaiterTable>,
    gate: Arc<OutstandingGate>,
    upstream: U,
}

impl<U: UpstreamSender> Engine<U> {
    pub fn new(cache: Arc<Cache>, waiters: Arc<WaiterTable>, gate: Arc<OutstandingGate>, upstream: U) -> Self {
        Self {
            cache,
            waiters,
            gate,
            upstream,
        }
    }

    pub fn cache(&self) -> &Arc<Cache> {
        &self.cache
    }

    pub fn waiters(&self) -> &Arc<WaiterTable> {
        &self.waiters
    }

    pub fn gate(&self) -> &Arc<OutstandingGate> {
        &self.gate
    }

    /// The client-facing entry point: the main resolution loop, bounded by
    /// [`MAX_ATTEMPTS`] no-progress attempts and by `deadline`.
    pub async fn collapsed_lookup(&self, question: Question, deadline: Deadline) -> Outcome {
        self.collapsed_lookup_inner(question, deadline, 0).await
    }

    fn collapsed_lookup_inner<'a>(
        &'a self,
        question: Question,
        deadline: Deadline,
        cname_hops: u8,
    ) -> BoxFuture<'a, Outcome> {
        Box::pin(async move {
            if cname_hops > MAX_CNAME_HOPS {
                tracing::warn!(name = %question.name, "CNAME chain exceeded hop bound");
                return Outcome::Timeout;
            }

            let mut attempts = 0u32;
            loop {
                if deadline.has_passed() {
                    return Outcome::Timeout;
                }

                let lookup = self.cache.lookup(&question.name, question.qtype).await;
                if let Some(positive) = lookup.positive {
                    return Outcome::Positive(positive.records);
                }
                if let Some(negative) = lookup.negative {
                    return Outcome::Negative {
                        records: negative.records,
                        response_code: negative.response_code,
                    };
                }

                // A cached CNAME at this name is chased inline, serialized
                // with the rest of this request.
                let cname_lookup = self.cache.lookup(&question.name, QueryType::CNAME).await;
                if let Some(cname_result) = cname_lookup.positive {
                    if cname_result.records.len() == 1 {
                        if let Record::CNAME { host, .. } = &cname_result.records[0] {
                            let target = Question::new(host.clone(), question.qtype);
                            let inner = self
                                .collapsed_lookup_inner(target, deadline, cname_hops + 1)
                                .await;
                            let mut records = cname_result.records.clone();
                            match inner {
                                Outcome::Positive(mut inner_records) => {
                                    records.append(&mut inner_records)
                                }
                                Outcome::Negative {
                                    records: mut inner_records,
                                    ..
                                } => records.append(&mut inner_records),
                                Outcome::Timeout => {}
                            }
                            return Outcome::Positive(records);
                        }
                    }
                    // Multi-record CNAMEs are not supported; fall through
                    // as no progress, same as an unresolved name.
                }

                let name_key = question.name.canonical_key();
                let (handle, is_leader) = self.waiters.lead_or_join(&name_key, question.qtype);
                if is_leader {
                    self.advance_cache(&question, deadline).await;
                }

                let notified = handle.notified();
                let progressed = match deadline.bounded_wait(WAIT_TIMEOUT) {
                    Some(budget) => tokio::time::timeout(budget, notified).await.is_ok(),
                    None => false,
                };

                if progressed {
                    continue;
                }
                attempts += 1;
                if attempts >= MAX_ATTEMPTS {
                    return Outcome::Timeout;
                }
            }
        })
    }

    /// Walks the NS hierarchy, picks or resolves a nameserver address,
    /// dispatches one upstream query, and registers the expectation in the
    /// outstanding-reply gate.
    fn advance_cache<'a>(&'a self, question: &'a Question, deadline: Deadline) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            let delegation = self.find_delegation(question, deadline).await;
            let (upstream_addr, delegation_label) = delegation.unwrap_or_else(|| {
                let mut rng = rand::thread_rng();
                (roothints::random_root_server(&mut rng), Name::root())
            });

            let mut rng = rand::thread_rng();
            let id: u16 = rng.gen();
            let shuffled_name = question.name.shuffle_case(&mut rng);

            let mut outbound = DnsPacket {
                header: Header {
                    id,
                    recursion_desired: false,
                    ..Header::default()
                },
                questions: vec![Question {
                    name: shuffled_name.clone(),
                    qtype: question.qtype,
                    qclass: question.qclass,
                }],
                ..Default::default()
            };

            let buffer = match outbound.assemble() {
                Ok(buffer) => buffer,
                Err(err) => {
                    tracing::warn!(?err, name = %question.name, "failed to assemble upstream query");
                    return;
                }
            };

            if let Err(err) = self
                .upstream
                .send_query(upstream_addr, &buffer.buf[..buffer.pos()])
                .await
            {
                tracing::warn!(?err, %upstream_addr, "failed to dispatch upstream query");
                return;
            }

            self.gate
                .register(
                    upstream_addr,
                    &shuffled_name,
                    question.qtype,
                    question.qclass,
                    delegation_label,
                )
                .await;
            tracing::info!(%upstream_addr, name = %question.name, qtype = ?question.qtype, "dispatched upstream query");
        })
    }

    /// Walks `name.popped(i)` from the full name toward the root looking for
    /// a usable nameserver address, recursing into a nested lookup for a
    /// candidate NS hostname's own A record when no address is cached yet.
    fn find_delegation<'a>(
        &'a self,
        question: &'a Question,
        deadline: Deadline,
    ) -> BoxFuture<'a, Option<(SocketAddr, Name)>> {
        Box::pin(async move {
            let total_labels = question.name.label_count();
            for i in 0..=total_labels {
                let label = question.name.popped(i);
                let ns_lookup = self.cache.lookup(&label, QueryType::NS).await;
                let Some(ns_result) = ns_lookup.positive else {
                    if label.is_root() {
                        break;
                    }
                    continue;
                };

                let mut known_addr = None;
                let mut candidate_host = None;
                for record in &ns_result.records {
                    let Record::NS { host, .. } = record else {
                        continue;
                    };
                    let a_lookup = self.cache.lookup(host, QueryType::A).await;
                    if let Some(a_result) = a_lookup.positive {
                        if let Some(Record::A { addr, .. }) = a_result.records.first() {
                            known_addr = Some(*addr);
                            break;
                        }
                    }
                    candidate_host.get_or_insert_with(|| host.clone());
                }

                let addr = match known_addr {
                    Some(addr) => Some(addr),
                    None => match candidate_host {
                        Some(host) => {
                            let nested = Question::new(host, QueryType::A);
                            match self.collapsed_lookup_inner(nested, deadline, 0).await {
                                Outcome::Positive(records) => records.iter().find_map(|r| match r {
                                    Record::A { addr, .. } => Some(*addr),
                                    _ => None,
                                }),
                                _ => None,
                            }
                        }
                        None => None,
                    },
                };

                if let Some(addr) = addr {
                    return Some((SocketAddr::new(IpAddr::V4(addr), 53), label));
                }
                if label.is_root() {
                    break;
                }
            }
            None
        })
    }
}

/// Builds the client-facing response from an [`Outcome`], echoing the
/// client's request ID and RD bit.
pub fn assemble_reply(request_header: &Header, question: &Question, outcome: Outcome) -> DnsPacket {
    let (response_code, answers, authorities) = match outcome {
        Outcome::Positive(records) => (ResponseCode::NoError, records, Vec::new()),
        Outcome::Negative {
            records,
            response_code,
        } => (response_code, Vec::new(), records),
        // A lookup that never made progress is reported as SERVFAIL.
        Outcome::Timeout => (ResponseCode::ServerFailure, Vec::new(), Vec::new()),
    };

    DnsPacket {
        header: Header::response_from(request_header).with_response_code(response_code),
        questions: vec![question.clone()],
        answers,
        authorities,
        resources: Vec::new(),
    }
}
