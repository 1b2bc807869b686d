#![forbid(unsafe_code)]

use colored::*;

fn main() {
    println!("{}", "DMChain CLI".bright_cyan().bold());
    println!("{}", "-----------".bright_cyan());
    println!();
    println!(
        "{}",
        "This is the main entry point, but all functionality is in separate binaries.".yellow()
    );
    println!(
        "{}",
        "Use 'cargo run --bin <binary_name>' to run a specific command.".yellow()
    );
    println!();
    println!("{}", "Available binaries:".bright_green().underline());
    println!(
        "  - {}  {}",
        "dmchain-node".bright_white(),
        "produce blocks, DM_ENABLED=1 emits DMLOG lines on stdout".dimmed()
    );
    println!(
        "  - {}  {}",
        "dmchain-ingestor".bright_white(),
        "decode DMLOG lines from stdin or a logs directory".dimmed()
    );
    println!();
    println!("{}", "Example:".bright_green().underline());
    println!(
        "{}",
        "  DM_ENABLED=1 cargo run --bin dmchain-node | cargo run --bin dmchain-ingestor".italic()
    );
}
