//! Procedural world - settlements generated per chunk from coordinates alone
//!
//! Nothing here reads global or call-order state. A chunk's content is a pure
//! function of `(cx, cy)`; `WorldMap` only memoizes it.

use ahash::AHashMap;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::core::types::TileCoord;

/// Side length of a chunk in tiles
pub const CHUNK_SIZE: i32 = 16;

/// `seed = cx * LARGE_PRIME + cy`
pub const LARGE_PRIME: i64 = 73_856_093;

pub const MIN_SETTLEMENTS_PER_CHUNK: u32 = 1;
pub const MAX_SETTLEMENTS_PER_CHUNK: u32 = 4;
pub const MAX_GENERATED_LEVEL: u32 = 12;

/// Chance a generated settlement has an owner
const OWNER_CHANCE: f64 = 0.4;

// One multiplier per attribute so the draws are uncorrelated
const COUNT_MULTIPLIER: u64 = 0x9E37_79B9_7F4A_7C15;
const POSITION_MULTIPLIER: u64 = 0xBF58_476D_1CE4_E5B9;
const NAME_MULTIPLIER: u64 = 0x94D0_49BB_1331_11EB;
const LEVEL_MULTIPLIER: u64 = 0xD6E8_FEB8_6659_FD93;
const OWNER_MULTIPLIER: u64 = 0xA076_1D64_78BD_642F;

const NAME_PREFIXES: [&str; 16] = [
    "Ash", "Black", "Bright", "Cold", "Elder", "Fair", "Grey", "High", "Iron", "Long", "Mill",
    "North", "Oak", "Red", "Stone", "Thorn",
];

const NAME_SUFFIXES: [&str; 12] = [
    "ford", "wick", "haven", "moor", "field", "stead", "bury", "dale", "holt", "mere", "gate",
    "brook",
];

const OWNER_NAMES: [&str; 10] = [
    "Aldric", "Brenna", "Cedric", "Dagny", "Edmund", "Freya", "Gunnar", "Hilde", "Ivo", "Jorunn",
];

/// Chunk position in chunk units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub cx: i32,
    pub cy: i32,
}

impl ChunkCoord {
    pub fn new(cx: i32, cy: i32) -> Self {
        Self { cx, cy }
    }

    /// Chunk containing a tile, correct for negative tiles
    pub fn containing(tile: TileCoord) -> Self {
        Self {
            cx: tile.x.div_euclid(CHUNK_SIZE),
            cy: tile.y.div_euclid(CHUNK_SIZE),
        }
    }

    pub fn seed(&self) -> i64 {
        (self.cx as i64)
            .wrapping_mul(LARGE_PRIME)
            .wrapping_add(self.cy as i64)
    }

    pub fn origin(&self) -> TileCoord {
        TileCoord::new(self.cx * CHUNK_SIZE, self.cy * CHUNK_SIZE)
    }
}

/// A settlement placed by the generator
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GeneratedSettlement {
    pub id: String,
    pub name: String,
    pub x: i32,
    pub y: i32,
    pub level: u32,
    pub owner_name: Option<String>,
}

impl GeneratedSettlement {
    pub fn coord(&self) -> TileCoord {
        TileCoord::new(self.x, self.y)
    }
}

/// Independent stream for one attribute of one chunk
fn draw_stream(seed: i64, multiplier: u64) -> ChaCha8Rng {
    let mixed = (seed as u64).wrapping_add(multiplier).wrapping_mul(multiplier);
    ChaCha8Rng::seed_from_u64(mixed)
}

/// Generate every settlement in a chunk
pub fn generate_chunk(chunk: ChunkCoord) -> Vec<GeneratedSettlement> {
    let seed = chunk.seed();
    let mut count_rng = draw_stream(seed, COUNT_MULTIPLIER);
    let mut position_rng = draw_stream(seed, POSITION_MULTIPLIER);
    let mut name_rng = draw_stream(seed, NAME_MULTIPLIER);
    let mut level_rng = draw_stream(seed, LEVEL_MULTIPLIER);
    let mut owner_rng = draw_stream(seed, OWNER_MULTIPLIER);

    let count = count_rng.gen_range(MIN_SETTLEMENTS_PER_CHUNK..=MAX_SETTLEMENTS_PER_CHUNK);
    let origin = chunk.origin();
    let mut taken: Vec<(i32, i32)> = Vec::with_capacity(count as usize);
    let mut settlements = Vec::with_capacity(count as usize);

    for index in 0..count {
        let offset = loop {
            let candidate = (
                position_rng.gen_range(0..CHUNK_SIZE),
                position_rng.gen_range(0..CHUNK_SIZE),
            );
            if !taken.contains(&candidate) {
                break candidate;
            }
        };
        taken.push(offset);

        let prefix = NAME_PREFIXES[name_rng.gen_range(0..NAME_PREFIXES.len())];
        let suffix = NAME_SUFFIXES[name_rng.gen_range(0..NAME_SUFFIXES.len())];
        let level = level_rng.gen_range(1..=MAX_GENERATED_LEVEL);
        let owner_name = if owner_rng.gen_bool(OWNER_CHANCE) {
            Some(OWNER_NAMES[owner_rng.gen_range(0..OWNER_NAMES.len())].to_string())
        } else {
            None
        };

        settlements.push(GeneratedSettlement {
            id: format!("{}:{}:{}", chunk.cx, chunk.cy, index),
            name: format!("{prefix}{suffix}"),
            x: origin.x + offset.0,
            y: origin.y + offset.1,
            level,
            owner_name,
        });
    }

    settlements
}

/// Chunks in the inclusive rectangle `min..=max`, row by row
pub fn chunk_range(min: ChunkCoord, max: ChunkCoord) -> impl Iterator<Item = ChunkCoord> {
    (min.cy..=max.cy).flat_map(move |cy| (min.cx..=max.cx).map(move |cx| ChunkCoord::new(cx, cy)))
}

/// Uncached generation of a chunk rectangle
pub fn generate_range(min: ChunkCoord, max: ChunkCoord) -> Vec<GeneratedSettlement> {
    chunk_range(min, max).flat_map(generate_chunk).collect()
}

/// Memoizing front end over `generate_chunk`
#[derive(Debug, Default, Clone)]
pub struct WorldMap {
    chunks: AHashMap<ChunkCoord, Vec<GeneratedSettlement>>,
}

impl WorldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chunk(&mut self, chunk: ChunkCoord) -> &[GeneratedSettlement] {
        self.chunks
            .entry(chunk)
            .or_insert_with(|| generate_chunk(chunk))
    }

    pub fn range(&mut self, min: ChunkCoord, max: ChunkCoord) -> Vec<GeneratedSettlement> {
        let mut merged = Vec::new();
        for chunk in chunk_range(min, max) {
            merged.extend_from_slice(self.chunk(chunk));
        }
        merged
    }

    /// Settlements in the square of chunks within `radius` of the tile's chunk
    pub fn around(&mut self, center: TileCoord, radius: i32) -> Vec<GeneratedSettlement> {
        let c = ChunkCoord::containing(center);
        let radius = radius.max(0);
        self.range(
            ChunkCoord::new(c.cx.saturating_sub(radius), c.cy.saturating_sub(radius)),
            ChunkCoord::new(c.cx.saturating_add(radius), c.cy.saturating_add(radius)),
        )
    }

    pub fn settlement_at(&mut self, tile: TileCoord) -> Option<GeneratedSettlement> {
        self.chunk(ChunkCoord::containing(tile))
            .iter()
            .find(|s| s.x == tile.x && s.y == tile.y)
            .cloned()
    }

    pub fn cached_chunks(&self) -> usize {
        self.chunks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_seed_formula() {
        assert_eq!(ChunkCoord::new(0, 0).seed(), 0);
        assert_eq!(ChunkCoord::new(1, 2).seed(), LARGE_PRIME + 2);
        assert_eq!(ChunkCoord::new(-1, 0).seed(), -LARGE_PRIME);
    }

    #[test]
    fn test_containing_handles_negative_tiles() {
        assert_eq!(ChunkCoord::containing(TileCoord::new(0, 15)), ChunkCoord::new(0, 0));
        assert_eq!(ChunkCoord::containing(TileCoord::new(16, 0)), ChunkCoord::new(1, 0));
        assert_eq!(ChunkCoord::containing(TileCoord::new(-1, -16)), ChunkCoord::new(-1, -1));
        assert_eq!(ChunkCoord::containing(TileCoord::new(-17, 0)), ChunkCoord::new(-2, 0));
    }

    #[test]
    fn test_generate_is_repeatable() {
        for chunk in chunk_range(ChunkCoord::new(-3, -3), ChunkCoord::new(3, 3)) {
            assert_eq!(generate_chunk(chunk), generate_chunk(chunk));
        }
    }

    #[test]
    fn test_generated_settlements_inside_chunk() {
        for chunk in chunk_range(ChunkCoord::new(-4, -4), ChunkCoord::new(4, 4)) {
            let settlements = generate_chunk(chunk);
            let n = settlements.len() as u32;
            assert!((MIN_SETTLEMENTS_PER_CHUNK..=MAX_SETTLEMENTS_PER_CHUNK).contains(&n));

            for s in &settlements {
                assert_eq!(ChunkCoord::containing(s.coord()), chunk);
                assert!((1..=MAX_GENERATED_LEVEL).contains(&s.level));
                assert!(!s.name.is_empty());
            }

            let mut tiles: Vec<_> = settlements.iter().map(|s| (s.x, s.y)).collect();
            tiles.sort();
            tiles.dedup();
            assert_eq!(tiles.len(), settlements.len(), "positions must be distinct");
        }
    }

    #[test]
    fn test_neighbouring_chunks_differ() {
        let outputs: Vec<_> = chunk_range(ChunkCoord::new(0, 0), ChunkCoord::new(4, 1))
            .map(generate_chunk)
            .collect();
        assert!(outputs.windows(2).any(|w| w[0] != w[1]));
    }

    #[test]
    fn test_cache_matches_direct_generation() {
        let mut map = WorldMap::new();
        let cached = map.range(ChunkCoord::new(-1, -1), ChunkCoord::new(1, 1));
        let direct = generate_range(ChunkCoord::new(-1, -1), ChunkCoord::new(1, 1));
        assert_eq!(cached, direct);
        assert_eq!(map.cached_chunks(), 9);

        // Second request is served from cache with identical content
        assert_eq!(map.around(TileCoord::new(0, 0), 1), direct);
        assert_eq!(map.cached_chunks(), 9);
    }

    #[test]
    fn test_settlement_at_finds_generated_tile() {
        let mut map = WorldMap::new();
        let first = generate_chunk(ChunkCoord::new(2, -5)).remove(0);
        assert_eq!(map.settlement_at(first.coord()), Some(first.clone()));

        let empty = (0..CHUNK_SIZE)
            .map(|dx| TileCoord::new(first.x - first.x.rem_euclid(CHUNK_SIZE) + dx, first.y))
            .find(|t| map.settlement_at(*t).is_none());
        assert!(empty.is_some());
    }
}
