//! Provably fair bet results
//!
//! A result is derived from the revealed server seed, the client seed and the
//! bet's index within its batch:
//!
//! ```text
//! digest = SHA512(SHA512(server_seed || be32(client_seed) || be32(index)))
//! ```
//!
//! The digest is scanned as 3-byte big-endian chunks; the first chunk below
//! 16,000,000 is reduced mod 1,000,000. When no chunk qualifies the digest is
//! hashed once more and scanned again.

use crate::errors::VerificationError;
use crate::games::types::GUESS_SPAN;
use sha2::{Digest, Sha256, Sha512};
use std::fmt;
use std::str::FromStr;

/// Length of a decoded server seed
pub const SERVER_SEED_LEN: usize = 32;

const CHUNK_LEN: usize = 3;
/// Chunks at offsets 0, 3, ..., 60
const CHUNKS_PER_DIGEST: usize = 21;
/// Largest multiple of GUESS_SPAN below 2^24
const ACCEPT_BELOW: u32 = 16_000_000;

/// Anything that can produce the result of the bet at a given batch index
pub trait BetResultSource {
    fn bet_result(&self, index: u32) -> u32;
}

/// Scripted results, mostly for replaying known scenarios
impl<F> BetResultSource for F
where
    F: Fn(u32) -> u32,
{
    fn bet_result(&self, index: u32) -> u32 {
        self(index)
    }
}

/// A decoded 32-byte server seed
#[derive(Clone, PartialEq, Eq)]
pub struct ServerSeed([u8; SERVER_SEED_LEN]);

impl ServerSeed {
    pub fn from_bytes(bytes: [u8; SERVER_SEED_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SERVER_SEED_LEN] {
        &self.0
    }

    /// Lowercase hex form, as revealed by the service
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// SHA-256 of the raw seed bytes, the value published before play
    pub fn commitment(&self) -> [u8; 32] {
        Sha256::digest(self.0).into()
    }

    pub fn commitment_hex(&self) -> String {
        hex::encode(self.commitment())
    }
}

impl FromStr for ServerSeed {
    type Err = VerificationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != SERVER_SEED_LEN * 2 {
            return Err(VerificationError::MalformedSeed {
                reason: format!("expected {} hex characters, got {}", SERVER_SEED_LEN * 2, s.len()),
            });
        }
        let mut bytes = [0u8; SERVER_SEED_LEN];
        hex::decode_to_slice(s, &mut bytes).map_err(|e| VerificationError::MalformedSeed {
            reason: e.to_string(),
        })?;
        Ok(Self(bytes))
    }
}

// Never print the seed itself in debug output.
impl fmt::Debug for ServerSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServerSeed(commitment={})", self.commitment_hex())
    }
}

/// Result generator bound to one seed pair.
///
/// Holds no mutable state, so one oracle can be shared across threads.
#[derive(Debug, Clone)]
pub struct FairnessOracle {
    server_seed: ServerSeed,
    client_seed: i32,
}

impl FairnessOracle {
    pub fn new(server_seed: ServerSeed, client_seed: i32) -> Self {
        Self {
            server_seed,
            client_seed,
        }
    }

    /// Decode the hex seed and bind it to a client seed
    pub fn from_hex(server_seed_hex: &str, client_seed: i32) -> Result<Self, VerificationError> {
        Ok(Self::new(server_seed_hex.parse()?, client_seed))
    }

    pub fn server_seed(&self) -> &ServerSeed {
        &self.server_seed
    }

    pub fn client_seed(&self) -> i32 {
        self.client_seed
    }

    /// Result of the bet at `bet_index`, in `0..GUESS_SPAN`
    pub fn bet_result(&self, bet_index: u32) -> u32 {
        self.bet_result_with_rounds(bet_index).0
    }

    /// Result plus the number of digests that had to be scanned
    pub fn bet_result_with_rounds(&self, bet_index: u32) -> (u32, u32) {
        let mut message = [0u8; SERVER_SEED_LEN + 8];
        message[..SERVER_SEED_LEN].copy_from_slice(&self.server_seed.0);
        message[SERVER_SEED_LEN..SERVER_SEED_LEN + 4].copy_from_slice(&self.client_seed.to_be_bytes());
        message[SERVER_SEED_LEN + 4..].copy_from_slice(&bet_index.to_be_bytes());

        let first = Sha512::digest(message);
        let digest: [u8; 64] = Sha512::digest(first).into();
        resolve_digest(digest)
    }
}

impl BetResultSource for FairnessOracle {
    fn bet_result(&self, index: u32) -> u32 {
        FairnessOracle::bet_result(self, index)
    }
}

/// One-shot form of [`FairnessOracle::bet_result`].
///
/// Fails only if `server_seed_hex` is not exactly 64 hex characters.
pub fn generate_bet_result(
    server_seed_hex: &str,
    client_seed: i32,
    bet_index: u32,
) -> Result<u32, VerificationError> {
    Ok(FairnessOracle::from_hex(server_seed_hex, client_seed)?.bet_result(bet_index))
}

/// First acceptable chunk of a digest, already reduced into range
pub fn scan_digest(digest: &[u8; 64]) -> Option<u32> {
    digest
        .chunks_exact(CHUNK_LEN)
        .take(CHUNKS_PER_DIGEST)
        .map(|c| (c[0] as u32) << 16 | (c[1] as u32) << 8 | c[2] as u32)
        .find(|&v| v < ACCEPT_BELOW)
        .map(|v| v % GUESS_SPAN)
}

/// Scan `digest`, rehashing (single SHA-512) until a chunk is accepted.
///
/// Returns the result and how many digests were scanned. Each digest is
/// rejected with probability below 1e-27, but the loop is unbounded.
pub fn resolve_digest(mut digest: [u8; 64]) -> (u32, u32) {
    let mut rounds = 1;
    loop {
        if let Some(result) = scan_digest(&digest) {
            return (result, rounds);
        }
        digest = Sha512::digest(digest).into();
        rounds += 1;
    }
}
