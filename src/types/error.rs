use thiserror::Error;

use crate::types::BlockOffset;

#[derive(Error, Debug)]
pub enum TabMapError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Invalid block type at offset {offset}: got {actual}, expected {expected}")]
    InvalidBlockType {
        offset: BlockOffset,
        expected: i16,
        actual: i16,
    },

    #[error("Invalid magic cookie: got {actual}, expected {expected}")]
    InvalidMagicCookie { expected: i32, actual: i32 },

    #[error("Invalid block size: expected {expected} bytes, got {actual} bytes")]
    InvalidBlockSize { expected: usize, actual: usize },

    #[error("Attempt to read past end of block at offset {offset} (pos {pos}, {len} bytes, {available} available)")]
    ReadPastEnd {
        offset: BlockOffset,
        pos: usize,
        len: usize,
        available: usize,
    },

    #[error("Attempt to write past end of block at offset {offset} (pos {pos}, {len} bytes)")]
    WritePastEnd {
        offset: BlockOffset,
        pos: usize,
        len: usize,
    },

    #[error("Invalid position {pos} in block of {block_size} bytes")]
    InvalidPosition { pos: usize, block_size: usize },

    #[error("Block at offset {offset} was opened read-only")]
    ReadOnlyBlock { offset: BlockOffset },

    #[error("Unsupported case or corrupt file: MULTIPLINE/REGION section {section} vertices [{vertex_offset}, {vertex_offset}+{num_vertices}) fall outside [0, {total})")]
    NonContiguousSections {
        section: usize,
        vertex_offset: i32,
        num_vertices: i32,
        total: i32,
    },

    #[error("Compressed delta ({dx}, {dy}) does not fit in 16 bits")]
    CompressedOverflow { dx: i64, dy: i64 },

    #[error("Compressed vertex ({dx}, {dy}) from origin ({center_x}, {center_y}) is outside the integer coordinate range")]
    CompressedOriginOverflow {
        center_x: i32,
        center_y: i32,
        dx: i16,
        dy: i16,
    },

    #[error("Invalid coordinate origin quadrant: {0}")]
    InvalidQuadrant(u8),

    #[error("Invalid map object type {0}")]
    InvalidObjectType(i32),

    #[error("Coordinate system bounds must be set before converting coordinates")]
    CoordsysBoundsNotSet,

    #[error("Invalid coordinate system bounds ({x_min}, {y_min}) - ({x_max}, {y_max})")]
    InvalidBounds {
        x_min: f64,
        y_min: f64,
        x_max: f64,
        y_max: f64,
    },

    #[error("Invalid block offset {0}")]
    InvalidBlockOffset(BlockOffset),

    #[error("File is not open for writing")]
    NotWritable,
}

pub type Result<T> = std::result::Result<T, TabMapError>;
