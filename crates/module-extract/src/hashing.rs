//! Content digests and `[contenthash]` interpolation
//!
//! Tokens have the shape `[<algorithm>:contenthash:<encoding>:<length>]`, where
//! every part but `contenthash` is optional. Base-N encodings read the digest
//! as a big-endian number and use the alphabet `0-9a-zA-Z-_` cut to N
//! characters, so they are not interchangeable with other base-N schemes.

use std::{str::FromStr, sync::LazyLock};

use anyhow::{Result, anyhow, bail};
use regex::{Captures, Regex};
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};

static CONTENT_HASH_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\[(?:(\w+):)?contenthash(?::([a-z]+\d*))?(?::(\d+))?\]")
        .expect("content hash token pattern is valid")
});

const BASE_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ-_";

/// Supported digest algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashFunction {
    Sha224,
    #[default]
    Sha256,
    Sha384,
    Sha512,
}

impl HashFunction {
    pub fn digest(self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha224 => Sha224::digest(data).to_vec(),
            Self::Sha256 => Sha256::digest(data).to_vec(),
            Self::Sha384 => Sha384::digest(data).to_vec(),
            Self::Sha512 => Sha512::digest(data).to_vec(),
        }
    }
}

impl FromStr for HashFunction {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sha224" => Ok(Self::Sha224),
            "sha256" => Ok(Self::Sha256),
            "sha384" => Ok(Self::Sha384),
            "sha512" => Ok(Self::Sha512),
            other => bail!("Unsupported hash function '{other}'"),
        }
    }
}

/// Text encoding of a digest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DigestEncoding {
    #[default]
    Hex,
    Base26,
    Base32,
    Base36,
    Base49,
    Base52,
    Base58,
    Base62,
    Base64,
}

impl DigestEncoding {
    pub const BASES: [Self; 8] = [
        Self::Base26,
        Self::Base32,
        Self::Base36,
        Self::Base49,
        Self::Base52,
        Self::Base58,
        Self::Base62,
        Self::Base64,
    ];

    /// Radix of a base-N encoding, `None` for hex
    pub fn radix(self) -> Option<u8> {
        match self {
            Self::Hex => None,
            Self::Base26 => Some(26),
            Self::Base32 => Some(32),
            Self::Base36 => Some(36),
            Self::Base49 => Some(49),
            Self::Base52 => Some(52),
            Self::Base58 => Some(58),
            Self::Base62 => Some(62),
            Self::Base64 => Some(64),
        }
    }

    pub fn encode(self, bytes: &[u8]) -> String {
        match self.radix() {
            None => hex::encode(bytes),
            Some(base) => encode_to_base(bytes, base),
        }
    }
}

impl FromStr for DigestEncoding {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "hex" => Ok(Self::Hex),
            "base26" => Ok(Self::Base26),
            "base32" => Ok(Self::Base32),
            "base36" => Ok(Self::Base36),
            "base49" => Ok(Self::Base49),
            "base52" => Ok(Self::Base52),
            "base58" => Ok(Self::Base58),
            "base62" => Ok(Self::Base62),
            "base64" => Ok(Self::Base64),
            other => bail!("Unsupported digest encoding '{other}'"),
        }
    }
}

/// Interpret `bytes` as a big-endian number and write it in base `base`.
///
/// `base` is one of the radices of [`DigestEncoding::BASES`].
fn encode_to_base(bytes: &[u8], base: u8) -> String {
    let base = u32::from(base);
    let mut digits: Vec<u8> = bytes.iter().copied().skip_while(|b| *b == 0).collect();
    let mut encoded = Vec::new();

    while !digits.is_empty() {
        let mut remainder = 0u32;
        let mut quotient = Vec::with_capacity(digits.len());
        for &byte in &digits {
            let acc = (remainder << 8) | u32::from(byte);
            let q = acc / base;
            remainder = acc % base;
            if q != 0 || !quotient.is_empty() {
                quotient.push(q as u8);
            }
        }
        encoded.push(BASE_ALPHABET[remainder as usize]);
        digits = quotient;
    }

    if encoded.is_empty() {
        encoded.push(BASE_ALPHABET[0]);
    }
    encoded.iter().rev().map(|&b| char::from(b)).collect()
}

/// Digest function used for `[contenthash]` tokens
pub trait HashDigest {
    /// Digest `text`; `None` parts fall back to the implementation's defaults
    fn digest(
        &self,
        text: &str,
        algorithm: Option<&str>,
        encoding: Option<&str>,
        max_length: Option<usize>,
    ) -> Result<String>;
}

/// Default digest over the SHA-2 family
#[derive(Debug, Clone, Copy, Default)]
pub struct ShaDigest {
    default_function: HashFunction,
}

impl ShaDigest {
    pub fn new(default_function: HashFunction) -> Self {
        Self { default_function }
    }
}

impl HashDigest for ShaDigest {
    fn digest(
        &self,
        text: &str,
        algorithm: Option<&str>,
        encoding: Option<&str>,
        max_length: Option<usize>,
    ) -> Result<String> {
        let function = algorithm.map_or(Ok(self.default_function), HashFunction::from_str)?;
        let encoding = encoding.map_or(Ok(DigestEncoding::Hex), DigestEncoding::from_str)?;
        let mut digest = encoding.encode(&function.digest(text.as_bytes()));
        if let Some(max) = max_length.filter(|max| *max > 0) {
            digest.truncate(max);
        }
        Ok(digest)
    }
}

/// Whether a path template asks for a content hash
pub fn has_content_hash(template: &str) -> bool {
    CONTENT_HASH_TOKEN.is_match(template)
}

/// Replace every `[contenthash]` token of `path` with the digest of `text`
pub fn interpolate_content_hash(path: &str, text: &str, hasher: &dyn HashDigest) -> Result<String> {
    let mut resolved = String::with_capacity(path.len());
    let mut last = 0;

    for caps in CONTENT_HASH_TOKEN.captures_iter(path) {
        let token = caps.get(0).ok_or_else(|| anyhow!("Empty content hash match"))?;
        resolved.push_str(&path[last..token.start()]);
        resolved.push_str(&digest_for_token(&caps, text, hasher)?);
        last = token.end();
    }
    resolved.push_str(&path[last..]);
    Ok(resolved)
}

fn digest_for_token(caps: &Captures<'_>, text: &str, hasher: &dyn HashDigest) -> Result<String> {
    let algorithm = caps.get(1).map(|m| m.as_str());
    let encoding = caps.get(2).map(|m| m.as_str());
    let max_length = caps
        .get(3)
        .map(|m| m.as_str().parse::<usize>())
        .transpose()?;
    hasher.digest(text, algorithm, encoding, max_length)
}
