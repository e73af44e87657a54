//! Export command: prints the persisted per-day totals.

use std::io::Write;

use anyhow::Result;
use st_core::TotalsStore;

/// Writes the stored totals document as pretty-printed JSON.
///
/// The output has the persisted shape and can be fed back to another store.
pub fn run<W: Write, S>(writer: &mut W, store: &S) -> Result<()>
where
    S: TotalsStore,
    S::Error: std::error::Error + Send + Sync + 'static,
{
    let totals = store.load_totals()?;
    tracing::debug!(workspaces = totals.len(), "exporting workspace times");
    writeln!(writer, "{}", serde_json::to_string_pretty(&totals)?)?;
    Ok(())
}
