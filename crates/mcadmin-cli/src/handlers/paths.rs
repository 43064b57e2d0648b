//! Paths command handler.

use anyhow::Result;

use crate::bootstrap::CliContext;

/// Print the resolved directories in `key = value` form.
pub fn execute(ctx: &CliContext) -> Result<()> {
    println!("{}", ctx.paths);
    Ok(())
}
