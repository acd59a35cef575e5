//! Plain-text dumps of the body store, one line per body

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::simulation::states::BodyState;

/// Write `bodies` to `out`, one `Body Pos(..) Vel[..]` line each
pub fn write_bodies_to<W: Write>(mut out: W, bodies: &[BodyState]) -> Result<()> {
    for b in bodies {
        writeln!(out, "{b}")?;
    }
    out.flush()?;
    Ok(())
}

/// Create (or truncate) the file at `path` and dump `bodies` into it
pub fn write_bodies<P: AsRef<Path>>(path: P, bodies: &[BodyState]) -> Result<()> {
    let file = File::create(path)?;
    write_bodies_to(BufWriter::new(file), bodies)
}
