use std::io::{Read, Seek, Write};

use super::keys::LineScratch;
use crate::encoding::EncodingProfile;
use crate::error::Result;
use crate::index::IndexStore;

/// Write the lines of `source` in index order, each followed by the
/// profile's newline, after the profile's BOM. Input and output share the
/// encoding, so line bytes are copied without a decode/encode round trip.
///
/// Returns the number of lines written. `out` is flushed on success.
pub fn materialize<S, R, W>(
    store: &mut S,
    source: &mut R,
    profile: &EncodingProfile,
    scratch: &mut LineScratch,
    out: &mut W,
) -> Result<u64>
where
    S: IndexStore + ?Sized,
    R: Read + Seek,
    W: Write,
{
    out.write_all(profile.bom())?;
    let newline = profile.newline();
    let n = store.len();
    for i in 0..n {
        let record = store.get(i)?;
        let line = scratch.read_line(source, record)?;
        out.write_all(line)?;
        out.write_all(newline)?;
    }
    out.flush()?;
    Ok(n as u64)
}
