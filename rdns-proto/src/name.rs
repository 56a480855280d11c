//! DNS domain names: label sequences, wire encode/decode with compression
//! pointers, and the case-insensitive/case-sensitive keys the cache and the
//! reply-verification gate each need.

use std::fmt;

/// Maximum length of a single label, excluding the length octet.
pub const MAX_LABEL_LEN: usize = 63;
/// Maximum length of a name's on-wire encoding, including length octets and
/// the terminating zero octet.
pub const MAX_NAME_LEN: usize = 255;
/// Defensive bound on the number of compression-pointer hops followed while
/// decoding a single name. RFC 1035 doesn't specify a limit; this just keeps
/// a pathological (but non-cyclic, since forward/self pointers are rejected
/// outright) chain of back-pointers from blowing up decode time.
const MAX_POINTER_HOPS: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    Truncated,
    LabelTooLong(usize),
    NameTooLong(usize),
    ForwardPointer { at: usize, target: usize },
    TooManyPointerHops,
}

impl fmt::Display for NameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated => write!(f, "name runs past the end of the datagram"),
            Self::LabelTooLong(len) => write!(f, "label of {len} bytes exceeds the 63 byte limit"),
            Self::NameTooLong(len) => write!(f, "name of {len} bytes exceeds the 255 byte limit"),
            Self::ForwardPointer { at, target } => write!(
                f,
                "compression pointer at offset {at} targets {target}, which is not strictly before it"
            ),
            Self::TooManyPointerHops => write!(f, "too many compression-pointer hops"),
        }
    }
}

impl std::error::Error for NameError {}

/// An ordered sequence of labels, case preserved. Equality and hashing are
/// exact (case sensitive) — use [`Name::canonical_key`] for the
/// case-insensitive comparisons the cache relies on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Name(Vec<Box<[u8]>>);

impl Name {
    pub fn root() -> Self {
        Name(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn label_count(&self) -> usize {
        self.0.len()
    }

    pub fn labels(&self) -> impl Iterator<Item = &[u8]> {
        self.0.iter().map(|l| l.as_ref())
    }

    /// Builds a name from an already-split, dotted presentation string.
    /// Trailing empty labels (a trailing '.') are dropped; an entirely empty
    /// string yields the root.
    pub fn from_dotted(s: &str) -> Self {
        let labels = s
            .split('.')
            .filter(|l| !l.is_empty())
            .map(|l| l.as_bytes().into())
            .collect();
        Name(labels)
    }

    pub fn to_dotted_string(&self) -> String {
        if self.0.is_empty() {
            return String::new();
        }
        self.0
            .iter()
            .map(|l| String::from_utf8_lossy(l).into_owned())
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Case-insensitive cache key: labels joined by `/`, terminated by `;`,
    /// uppercased.
    pub fn canonical_key(&self) -> String {
        let mut key = self.case_sensitive_key();
        key.make_ascii_uppercase();
        key
    }

    /// Case-preserving variant of [`Name::canonical_key`], used for the
    /// 0x20-randomization defense against off-path spoofing.
    pub fn case_sensitive_key(&self) -> String {
        let mut out = String::new();
        for label in &self.0 {
            out.push_str(&String::from_utf8_lossy(label));
            out.push('/');
        }
        out.push(';');
        out
    }

    /// True if `self` is within `parent`'s subtree (or equal to it), compared
    /// label-by-label from the tail, case-insensitively. A name is its own
    /// child.
    pub fn is_child_of(&self, parent: &Name) -> bool {
        if parent.0.len() > self.0.len() {
            return false;
        }
        self.0
            .iter()
            .rev()
            .zip(parent.0.iter().rev())
            .all(|(a, b)| a.eq_ignore_ascii_case(b))
    }

    /// Returns the name with the leading `n` labels removed — the nth
    /// ancestor in the DNS hierarchy. `popped(0)` is `self`; popping past the
    /// root yields the root.
    pub fn popped(&self, n: usize) -> Name {
        let skip = n.min(self.0.len());
        Name(self.0[skip..].to_vec())
    }

    /// Returns a copy with each label's alphabetic bytes randomly
    /// upper/lower-cased ("0x20 encoding"): an outgoing query written this
    /// way turns the reply's echoed qname into a token a spoofer has to
    /// guess letter-by-letter, on top of the 16-bit query ID.
    pub fn shuffle_case(&self, rng: &mut impl rand::Rng) -> Name {
        let labels = self
            .0
            .iter()
            .map(|label| {
                label
                    .iter()
                    .map(|&b| {
                        if b.is_ascii_alphabetic() {
                            if rng.gen_bool(0.5) {
                                b.to_ascii_uppercase()
                            } else {
                                b.to_ascii_lowercase()
                            }
                        } else {
                            b
                        }
                    })
                    .collect::<Vec<u8>>()
                    .into_boxed_slice()
            })
            .collect();
        Name(labels)
    }

    /// Decodes a name starting at `start` within the full `datagram`.
    /// Returns the name and the offset immediately past the name's on-wire
    /// bytes — for a name ending in a compression pointer, that's the offset
    /// past the 2-byte pointer, not past the pointee.
    pub fn decode(datagram: &[u8], start: usize) -> Result<(Name, usize), NameError> {
        let mut labels = Vec::new();
        let mut pos = start;
        let mut end_pos = None;
        let mut hops = 0usize;
        let mut wire_len = 0usize;

        loop {
            let len_byte = *datagram.get(pos).ok_or(NameError::Truncated)?;

            if len_byte & 0xC0 == 0xC0 {
                let lo = *datagram.get(pos + 1).ok_or(NameError::Truncated)?;
                let target = (((len_byte as usize) & 0x3F) << 8) | lo as usize;

                if end_pos.is_none() {
                    end_pos = Some(pos + 2);
                }
                if target >= pos {
                    return Err(NameError::ForwardPointer { at: pos, target });
                }
                hops += 1;
                if hops > MAX_POINTER_HOPS {
                    return Err(NameError::TooManyPointerHops);
                }
                pos = target;
                continue;
            }

            if len_byte & 0xC0 != 0 {
                // 0x40/0x80 top bits are reserved (RFC 1035 §4.1.4).
                return Err(NameError::Truncated);
            }

            pos += 1;
            let len = len_byte as usize;
            if len == 0 {
                break;
            }
            if len > MAX_LABEL_LEN {
                return Err(NameError::LabelTooLong(len));
            }

            let label = datagram.get(pos..pos + len).ok_or(NameError::Truncated)?;
            wire_len += len + 1;
            if wire_len > MAX_NAME_LEN {
                return Err(NameError::NameTooLong(wire_len));
            }
            labels.push(Box::<[u8]>::from(label));
            pos += len;
        }

        wire_len += 1;
        if wire_len > MAX_NAME_LEN {
            return Err(NameError::NameTooLong(wire_len));
        }

        Ok((Name(labels), end_pos.unwrap_or(pos)))
    }

    /// Appends this name's wire encoding (length-prefixed labels, terminated
    /// by a zero-length label) to `out`. Never emits a compression pointer.
    pub fn encode_into(&self, out: &mut Vec<u8>) -> Result<(), NameError> {
        let mut wire_len = 0usize;
        for label in &self.0 {
            if label.len() > MAX_LABEL_LEN {
                return Err(NameError::LabelTooLong(label.len()));
            }
            wire_len += label.len() + 1;
            if wire_len > MAX_NAME_LEN {
                return Err(NameError::NameTooLong(wire_len));
            }
            out.push(label.len() as u8);
            out.extend_from_slice(label);
        }
        out.push(0);
        Ok(())
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            write!(f, ".")
        } else {
            write!(f, "{}", self.to_dotted_string())
        }
    }
}

impl From<&str> for Name {
    fn from(s: &str) -> Self {
        Name::from_dotted(s)
    }
}

impl From<String> for Name {
    fn from(s: String) -> Self {
        Name::from_dotted(&s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(name: &str) -> Vec<u8> {
        let mut out = Vec::new();
        Name::from_dotted(name).encode_into(&mut out).unwrap();
        out
    }

    #[test]
    fn round_trips_simple_name() {
        let wire = encode("www.example.com");
        let (name, pos) = Name::decode(&wire, 0).unwrap();
        assert_eq!(name.to_dotted_string(), "www.example.com");
        assert_eq!(pos, wire.len());
    }

    #[test]
    fn decodes_root() {
        let wire = encode("");
        let (name, pos) = Name::decode(&wire, 0).unwrap();
        assert!(name.is_root());
        assert_eq!(pos, 1);
    }

    #[test]
    fn follows_back_pointer() {
        let mut wire = encode("example.com");
        let base = wire.len();
        // "www" followed by a pointer back to offset 0 ("example.com").
        wire.push(3);
        wire.extend_from_slice(b"www");
        wire.push(0xC0);
        wire.push(0x00);
        let (name, pos) = Name::decode(&wire, base).unwrap();
        assert_eq!(name.to_dotted_string(), "www.example.com");
        assert_eq!(pos, base + 5);
    }

    #[test]
    fn rejects_self_pointer() {
        let mut wire = Vec::new();
        wire.push(0xC0);
        wire.push(0x00);
        let err = Name::decode(&wire, 0).unwrap_err();
        assert_eq!(err, NameError::ForwardPointer { at: 0, target: 0 });
    }

    #[test]
    fn rejects_forward_pointer() {
        let mut wire = vec![0u8; 10];
        wire[0] = 0xC0;
        wire[1] = 0x05;
        let err = Name::decode(&wire, 0).unwrap_err();
        assert_eq!(
            err,
            NameError::ForwardPointer { at: 0, target: 5 }
        );
    }

    #[test]
    fn rejects_oversized_name() {
        let mut wire = Vec::new();
        for _ in 0..5 {
            wire.push(63);
            wire.extend(std::iter::repeat(b'a').take(63));
        }
        wire.push(0);
        let err = Name::decode(&wire, 0).unwrap_err();
        assert!(matches!(err, NameError::NameTooLong(_)));
    }

    #[test]
    fn is_child_of_is_case_insensitive() {
        let example_com: Name = "example.com".into();
        let com: Name = "com".into();
        let evil_com: Name = "evil.com".into();
        let example_mixed: Name = "eXample.COM".into();

        assert!(example_com.is_child_of(&com));
        assert!(com.is_child_of(&com));
        assert!(!"xeample.com".parse_name().is_child_of(&example_com));
        assert!(example_mixed.is_child_of(&example_com));
        assert!(!evil_com.is_child_of(&example_com));
    }

    trait ParseNameExt {
        fn parse_name(&self) -> Name;
    }
    impl ParseNameExt for str {
        fn parse_name(&self) -> Name {
            Name::from_dotted(self)
        }
    }

    #[test]
    fn popped_walks_ancestors() {
        let name: Name = "www.example.com".into();
        assert_eq!(name.popped(0).to_dotted_string(), "www.example.com");
        assert_eq!(name.popped(1).to_dotted_string(), "example.com");
        assert_eq!(name.popped(2).to_dotted_string(), "com");
        assert!(name.popped(3).is_root());
        assert!(name.popped(10).is_root());
    }

    #[test]
    fn canonical_key_is_uppercased_and_slash_joined() {
        let name: Name = "www.Example.com".into();
        assert_eq!(name.canonical_key(), "WWW/EXAMPLE/COM;");
        assert_eq!(name.case_sensitive_key(), "www/Example/com;");
    }

    #[test]
    fn shuffle_case_preserves_letters_ignoring_case() {
        let name: Name = "example.com".into();
        let mut rng = rand::thread_rng();
        let shuffled = name.shuffle_case(&mut rng);
        assert_eq!(shuffled.canonical_key(), name.canonical_key());
    }
}
