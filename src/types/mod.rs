pub mod error;
pub mod row;
pub mod value;

// Common type aliases
pub type BlockOffset = i32; // absolute file offset, 0 = none
pub type FieldIndex = usize;

// Constants following the MapInfo .MAP layout
pub const BLOCK_SIZE: usize = 512;
pub const COORD_HEADER_SIZE: usize = 8; // type(2) + used bytes(2) + next block(4)
pub const COORD_DATA_CAPACITY: usize = BLOCK_SIZE - COORD_HEADER_SIZE;

pub const COORD_SEC_HDR_SIZE: usize = 24; // uncompressed on-disk size of one section header
pub const VERTEX_SIZE: usize = 8; // two i32
pub const COMPRESSED_VERTEX_SIZE: usize = 4; // two i16

// Integer coordinate space is [-1e9, 1e9] on both axes
pub const INT_COORD_MIN: i32 = -1_000_000_000;
pub const INT_COORD_MAX: i32 = 1_000_000_000;

/// Block type discriminants stored in the first bytes of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    Header = 0,
    Index = 1,
    Object = 2,
    Coord = 3,
    Garbage = 4,
    ToolBlock = 5,
}

impl BlockType {
    pub fn from_i16(value: i16) -> Option<Self> {
        match value {
            0 => Some(BlockType::Header),
            1 => Some(BlockType::Index),
            2 => Some(BlockType::Object),
            3 => Some(BlockType::Coord),
            4 => Some(BlockType::Garbage),
            5 => Some(BlockType::ToolBlock),
            _ => None,
        }
    }

    pub fn as_i16(&self) -> i16 {
        *self as i16
    }
}

/// Byte order used to encode block primitives. MAP files are little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ByteOrder {
    #[default]
    LittleEndian,
    BigEndian,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    Read,
    Write,
}

/// Integer-space bounding rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mbr {
    pub x_min: i32,
    pub y_min: i32,
    pub x_max: i32,
    pub y_max: i32,
}

impl Mbr {
    /// Inverted rectangle that any point will shrink-wrap on first `extend`.
    pub fn empty() -> Self {
        Self {
            x_min: INT_COORD_MAX,
            y_min: INT_COORD_MAX,
            x_max: INT_COORD_MIN,
            y_max: INT_COORD_MIN,
        }
    }

    pub fn new(x_min: i32, y_min: i32, x_max: i32, y_max: i32) -> Self {
        Self { x_min, y_min, x_max, y_max }
    }

    pub fn is_empty(&self) -> bool {
        self.x_min > self.x_max || self.y_min > self.y_max
    }

    pub fn extend(&mut self, x: i32, y: i32) {
        self.x_min = self.x_min.min(x);
        self.x_max = self.x_max.max(x);
        self.y_min = self.y_min.min(y);
        self.y_max = self.y_max.max(y);
    }

    /// Midpoint, computed in i64 so extreme bounds cannot overflow.
    pub fn center(&self) -> (i32, i32) {
        (
            ((self.x_min as i64 + self.x_max as i64) / 2) as i32,
            ((self.y_min as i64 + self.y_max as i64) / 2) as i32,
        )
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x_min && x <= self.x_max && y >= self.y_min && y <= self.y_max
    }
}

impl Default for Mbr {
    fn default() -> Self {
        Self::empty()
    }
}
