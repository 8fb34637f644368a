//! World Dump
//! Prints the generated settlements of a chunk rectangle as JSON

use clap::Parser;
use serde::Serialize;
use settlement_sim::campaign::worldgen::{
    chunk_range, generate_chunk, ChunkCoord, GeneratedSettlement,
};

/// World Dump - inspect the procedural world without starting a game
#[derive(Parser, Debug)]
#[command(name = "world_dump")]
#[command(about = "Print generated settlements for a range of chunks as JSON")]
struct Args {
    /// Chunk x of the centre
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    cx: i32,

    /// Chunk y of the centre
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    cy: i32,

    /// Chunks on each side of the centre
    #[arg(long, default_value_t = 1)]
    radius: u32,

    /// Print one compact line per chunk instead of pretty JSON
    #[arg(long, default_value_t = false)]
    compact: bool,
}

#[derive(Serialize)]
struct ChunkDump {
    cx: i32,
    cy: i32,
    settlements: Vec<GeneratedSettlement>,
}

fn main() -> Result<(), serde_json::Error> {
    let args = Args::parse();
    let r = args.radius as i32;
    let min = ChunkCoord::new(args.cx.saturating_sub(r), args.cy.saturating_sub(r));
    let max = ChunkCoord::new(args.cx.saturating_add(r), args.cy.saturating_add(r));

    let chunks: Vec<ChunkDump> = chunk_range(min, max)
        .map(|c| ChunkDump {
            cx: c.cx,
            cy: c.cy,
            settlements: generate_chunk(c),
        })
        .collect();

    if args.compact {
        for chunk in &chunks {
            println!("{}", serde_json::to_string(chunk)?);
        }
    } else {
        println!("{}", serde_json::to_string_pretty(&chunks)?);
    }

    let total: usize = chunks.iter().map(|c| c.settlements.len()).sum();
    eprintln!("{} chunks, {} settlements", chunks.len(), total);
    Ok(())
}
