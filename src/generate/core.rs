use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::encoding::EncodingProfile;

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

const OUTPUT_BUF_SIZE: usize = 256 * 1024;

/// Shape of a generated test file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateConfig {
    pub line_count: usize,
    /// Exclusive upper bound on line length; lines are at least 1 byte.
    pub max_length: usize,
    /// Fixed seed for reproducible output; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        GenerateConfig {
            line_count: 1000,
            max_length: 50,
            seed: None,
        }
    }
}

/// xorshift64 PRNG. Not cryptographic; only used for test data.
#[derive(Debug, Clone)]
pub struct Rng {
    state: u64,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        Rng {
            state: if seed == 0 { 0x12345678_9abcdef0 } else { seed },
        }
    }

    /// Seed from /dev/urandom, falling back to the clock.
    pub fn from_entropy() -> Self {
        let mut buf = [0u8; 8];
        if let Ok(mut f) = File::open("/dev/urandom") {
            if f.read_exact(&mut buf).is_ok() {
                return Rng::new(u64::from_le_bytes(buf));
            }
        }
        let t = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        Rng::new(t)
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        self.state
    }

    /// Random index in [0, n) using rejection sampling to avoid modulo bias.
    pub fn gen_range(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        let n = n as u64;
        let threshold = u64::MAX - (u64::MAX % n);
        loop {
            let r = self.next_u64();
            if r < threshold {
                return (r % n) as usize;
            }
        }
    }
}

/// Write `config.line_count` random lines of `[a-z0-9]` to `out`, encoded
/// with `profile` (BOM first, each line terminated).
pub fn generate_lines<W: Write>(
    out: &mut W,
    config: &GenerateConfig,
    profile: &EncodingProfile,
    rng: &mut Rng,
) -> io::Result<()> {
    out.write_all(profile.bom())?;
    let mut text = String::with_capacity(config.max_length);
    let mut encoded = Vec::with_capacity(config.max_length * 2);
    for _ in 0..config.line_count {
        text.clear();
        encoded.clear();
        let len = 1 + rng.gen_range(config.max_length.saturating_sub(1));
        for _ in 0..len {
            text.push(ALPHABET[rng.gen_range(ALPHABET.len())] as char);
        }
        profile.encode(&text, &mut encoded);
        out.write_all(&encoded)?;
        out.write_all(profile.newline())?;
    }
    out.flush()
}

/// `<unix millis>.txt` in the current directory.
pub fn default_generated_path() -> io::Result<PathBuf> {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    std::path::absolute(format!("{}.txt", millis))
}

/// Generate a random text file and return its absolute path.
/// With no `path`, a timestamped name in the current directory is used.
pub fn generate_file(
    path: Option<&Path>,
    config: &GenerateConfig,
    profile: &EncodingProfile,
) -> io::Result<PathBuf> {
    let path = match path {
        Some(p) if !p.as_os_str().is_empty() => std::path::absolute(p)?,
        _ => default_generated_path()?,
    };
    let mut rng = match config.seed {
        Some(seed) => Rng::new(seed),
        None => Rng::from_entropy(),
    };
    let mut out = BufWriter::with_capacity(OUTPUT_BUF_SIZE, File::create(&path)?);
    generate_lines(&mut out, config, profile, &mut rng)?;
    Ok(path)
}
