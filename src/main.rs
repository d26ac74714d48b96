//! Dedup Organizer CLI
//!
//! Entry point for the command-line interface.

mod cli;

use dedup_organizer::Result;

fn main() -> Result<()> {
    cli::run()
}
