pub mod docx;
mod error;
pub mod fonts;
pub mod model;
pub mod rollup;
pub mod xml;

pub use docx::Package;
pub use error::Error;
pub use rollup::FormattingSettings;

use std::path::Path;
use std::time::Instant;

/// Roll up the formatting of the `.docx` at `input` and write the result to `output`.
pub fn assemble_formatting(
    input: &Path,
    output: &Path,
    settings: &FormattingSettings,
) -> Result<(), Error> {
    let t0 = Instant::now();

    let mut package = Package::open(input)?;
    let t_load = t0.elapsed();

    package.assemble_formatting(settings)?;
    let t_resolve = t0.elapsed();

    let bytes = package.to_bytes()?;
    std::fs::write(output, &bytes).map_err(Error::Io)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: load={:.1}ms, resolve={:.1}ms, write={:.1}ms, total={:.1}ms (output {} bytes)",
        t_load.as_secs_f64() * 1000.0,
        (t_resolve - t_load).as_secs_f64() * 1000.0,
        (t_total - t_resolve).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        bytes.len(),
    );

    Ok(())
}

/// In-memory variant of [`assemble_formatting`].
pub fn assemble_formatting_bytes(
    input: &[u8],
    settings: &FormattingSettings,
) -> Result<Vec<u8>, Error> {
    let t0 = Instant::now();

    let mut package = Package::from_bytes(input)?;
    package.assemble_formatting(settings)?;
    let bytes = package.to_bytes()?;

    log::info!(
        "Timing: total={:.1}ms (output {} bytes)",
        t0.elapsed().as_secs_f64() * 1000.0,
        bytes.len(),
    );

    Ok(bytes)
}
