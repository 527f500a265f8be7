//! Core type definitions for the sealed-bid name registrar.
//!
//! This crate provides the data structures shared across the registrar,
//! the name validator, and the frozen hashing scheme that clients and the
//! ledger must agree on byte for byte.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use thiserror::Error;

pub mod name;

pub use name::{normalize, CanonicalName, NameError, MAX_LABEL_LEN, MIN_LABEL_LEN, NAME_SUFFIX};

// =========================
// PRIMITIVES
// =========================

/// Account address (20 bytes).
pub type Address = [u8; 20];

/// The zero account: "unset" for owners, bidders and resolve targets.
pub const ZERO_ADDRESS: Address = [0u8; 20];

/// Identifier of a canonical name: `keccak256(name)`.
pub type NameId = [u8; 32];

/// Sealed bid hash stored at commit time.
pub type BidHash = [u8; 32];

/// Bidder-chosen secret mixed into a sealed bid.
pub type Salt = [u8; 32];

/// Value in base units.
pub type Amount = u64;

// =========================
// HASHING
// =========================

/// Keccak-256 digest.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// Compute the identifier of a canonical name.
///
/// Encoding: keccak256 over the UTF-8 bytes of the full canonical name,
/// suffix included (`north.ntu`).
pub fn name_id(name: &CanonicalName) -> NameId {
    keccak256(name.as_str().as_bytes())
}

/// Compute the sealed hash of a bid.
///
/// Encoding (tightly packed, no length prefixes):
///
/// ```text
/// name bytes || amount as 32-byte big-endian || salt (32) || bidder (20)
/// ```
///
/// This matches `keccak256(abi.encodePacked(string, uint256, bytes32, address))`.
pub fn sealed_bid_hash(
    name: &CanonicalName,
    amount: Amount,
    salt: &Salt,
    bidder: &Address,
) -> BidHash {
    let mut hasher = Keccak256::new();
    hasher.update(name.as_str().as_bytes());
    hasher.update(amount_word(amount));
    hasher.update(salt);
    hasher.update(bidder);
    hasher.finalize().into()
}

/// Left-pad an amount into a 32-byte big-endian word.
fn amount_word(amount: Amount) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&amount.to_be_bytes());
    word
}

// =========================
// RECORDS
// =========================

/// Registry entry for a claimed name.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct RegistryRecord {
    pub owner: Address,
    pub resolve_target: Address,
    /// Empty when created through hash-only registration.
    pub name: String,
    pub registered_at: u64,
}

/// Phase of an auction at a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub enum AuctionPhase {
    /// No auction record yet
    Uncommitted,
    /// Accepting sealed commitments
    Commit,
    /// Accepting reveals
    Reveal,
    /// Reveal window over, waiting for someone to finalize
    Closed,
    /// Outcome recorded
    Finalized,
}

/// Per-name auction record.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct AuctionRecord {
    pub id: NameId,
    /// Plaintext name; empty until a reveal or an explicit start supplies it.
    pub name: String,
    /// Bumped each time a winnerless auction is restarted.
    pub round: u32,
    pub commit_end: u64,
    pub reveal_end: u64,
    pub finalized: bool,
    pub highest_bid: Amount,
    pub highest_bidder: Address,
}

impl AuctionRecord {
    /// Phase at `now`.
    pub fn phase(&self, now: u64) -> AuctionPhase {
        if self.finalized {
            AuctionPhase::Finalized
        } else if now < self.commit_end {
            AuctionPhase::Commit
        } else if now < self.reveal_end {
            AuctionPhase::Reveal
        } else {
            AuctionPhase::Closed
        }
    }

    pub fn has_winner(&self) -> bool {
        self.highest_bidder != ZERO_ADDRESS
    }
}

/// A sealed bid held in escrow.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Commitment {
    pub bidder: Address,
    pub sealed_hash: BidHash,
    pub deposit: Amount,
    pub revealed: bool,
    pub refunded: bool,
    pub committed_at: u64,
}

// =========================
// HEX HELPERS
// =========================

/// Errors parsing hex-encoded identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseHexError {
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    #[error("Expected {expected} bytes, got {got}")]
    WrongLength { expected: usize, got: usize },
}

/// Parse a fixed-size hex value, accepting an optional `0x` prefix.
pub fn parse_hex_array<const N: usize>(s: &str) -> Result<[u8; N], ParseHexError> {
    let bytes = hex::decode(s.trim().trim_start_matches("0x"))
        .map_err(|e| ParseHexError::InvalidHex(e.to_string()))?;
    let got = bytes.len();
    bytes
        .try_into()
        .map_err(|_| ParseHexError::WrongLength { expected: N, got })
}

/// Parse a `0x`-prefixed or bare hex address.
pub fn parse_address(s: &str) -> Result<Address, ParseHexError> {
    parse_hex_array::<20>(s)
}

/// Parse a `0x`-prefixed or bare hex name identifier.
pub fn parse_name_id(s: &str) -> Result<NameId, ParseHexError> {
    parse_hex_array::<32>(s)
}

/// `0x`-prefixed lowercase hex.
pub fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_name_id_is_keccak_of_canonical_name() {
        let name = normalize("alice").unwrap();
        assert_eq!(name_id(&name), keccak256(b"alice.ntu"));
        // Same canonical form, same id.
        assert_eq!(name_id(&normalize(" alice.ntu ").unwrap()), name_id(&name));
    }

    #[test]
    fn test_keccak_known_vector() {
        // keccak256("") from the Ethereum yellow paper.
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_sealed_bid_hash_packing() {
        let name = normalize("north").unwrap();
        let salt = [7u8; 32];
        let bidder = [1u8; 20];

        let mut packed = Vec::new();
        packed.extend_from_slice(b"north.ntu");
        packed.extend_from_slice(&[0u8; 24]);
        packed.extend_from_slice(&500u64.to_be_bytes());
        packed.extend_from_slice(&salt);
        packed.extend_from_slice(&bidder);

        assert_eq!(sealed_bid_hash(&name, 500, &salt, &bidder), keccak256(&packed));
    }

    #[test]
    fn test_amount_word_is_uint256_layout() {
        let word = amount_word(Amount::MAX);
        assert_eq!(word[..24], [0u8; 24]);
        assert_eq!(word[24..], [0xff; 8]);
        assert_eq!(amount_word(1)[31], 1);
    }

    #[test]
    fn test_sealed_bid_hash_binds_every_field() {
        let name = normalize("north").unwrap();
        let other = normalize("south").unwrap();
        let salt = [7u8; 32];
        let bidder = [1u8; 20];
        let base = sealed_bid_hash(&name, 500, &salt, &bidder);

        assert_ne!(base, sealed_bid_hash(&other, 500, &salt, &bidder));
        assert_ne!(base, sealed_bid_hash(&name, 501, &salt, &bidder));
        assert_ne!(base, sealed_bid_hash(&name, 500, &[8u8; 32], &bidder));
        assert_ne!(base, sealed_bid_hash(&name, 500, &salt, &[2u8; 20]));
    }

    #[test]
    fn test_auction_phase() {
        let record = AuctionRecord {
            id: [0u8; 32],
            name: String::new(),
            round: 0,
            commit_end: 100,
            reveal_end: 200,
            finalized: false,
            highest_bid: 0,
            highest_bidder: ZERO_ADDRESS,
        };
        assert_eq!(record.phase(99), AuctionPhase::Commit);
        assert_eq!(record.phase(100), AuctionPhase::Reveal);
        assert_eq!(record.phase(199), AuctionPhase::Reveal);
        assert_eq!(record.phase(200), AuctionPhase::Closed);
        assert!(!record.has_winner());

        let finalized = AuctionRecord {
            finalized: true,
            ..record
        };
        assert_eq!(finalized.phase(0), AuctionPhase::Finalized);
    }

    #[test]
    fn test_parse_hex() {
        let addr = parse_address("0x0000000000000000000000000000000000000b01").unwrap();
        assert_eq!(addr[19], 0x01);
        assert_eq!(addr[18], 0x0b);
        assert_eq!(
            parse_address("0xabcd"),
            Err(ParseHexError::WrongLength {
                expected: 20,
                got: 2
            })
        );
        assert!(matches!(parse_name_id("zz"), Err(ParseHexError::InvalidHex(_))));
        assert_eq!(to_hex(&[0xab, 0x01]), "0xab01");
    }

    #[test]
    fn test_record_borsh_roundtrip() {
        let record = RegistryRecord {
            owner: [1u8; 20],
            resolve_target: ZERO_ADDRESS,
            name: "alice.ntu".to_string(),
            registered_at: 42,
        };
        let encoded = borsh::to_vec(&record).unwrap();
        let decoded: RegistryRecord = borsh::from_slice(&encoded).unwrap();
        assert_eq!(record, decoded);
    }

    proptest! {
        #[test]
        fn prop_name_id_deterministic(label in "[a-z0-9]{3,20}") {
            let a = normalize(&label).unwrap();
            let b = normalize(&format!("{label}.ntu")).unwrap();
            prop_assert_eq!(name_id(&a), name_id(&b));
        }

        #[test]
        fn prop_distinct_names_distinct_ids(a in "[a-z]{3,12}", b in "[a-z]{3,12}") {
            prop_assume!(a != b);
            let ia = name_id(&normalize(&a).unwrap());
            let ib = name_id(&normalize(&b).unwrap());
            prop_assert_ne!(ia, ib);
        }
    }
}
