use std::fmt;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{
    config::MapConfig,
    storage::{
        HDR_MAGIC_COOKIE, HDR_MAGIC_OFFSET, HDR_OBJ_LEN_ARRAY, HDR_OBJ_LEN_ARRAY_SIZE,
        HDR_VERSION_NUMBER, block_store::BlockStore, coord_block::decompress_int_coord,
        raw_block::RawBinBlock,
    },
    types::{
        AccessMode, BLOCK_SIZE, ByteOrder, INT_COORD_MAX, INT_COORD_MIN, Mbr,
        error::{Result, TabMapError},
    },
};

/// Origin quadrant of the integer coordinate space. Quadrants 2 and 3
/// reverse the X axis, quadrants 3 and 4 reverse the Y axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quadrant {
    First = 1,
    Second = 2,
    Third = 3,
    Fourth = 4,
}

impl Quadrant {
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            1 => Ok(Quadrant::First),
            2 => Ok(Quadrant::Second),
            3 => Ok(Quadrant::Third),
            4 => Ok(Quadrant::Fourth),
            other => Err(TabMapError::InvalidQuadrant(other)),
        }
    }

    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    pub fn flips_x(&self) -> bool {
        matches!(self, Quadrant::Second | Quadrant::Third)
    }

    pub fn flips_y(&self) -> bool {
        matches!(self, Quadrant::Third | Quadrant::Fourth)
    }
}

fn int_to_axis(value: i32, displ: f64, scale: f64, flip: bool) -> f64 {
    if flip {
        -(value as f64 + displ) / scale
    } else {
        (value as f64 - displ) / scale
    }
}

fn axis_to_int(value: f64, displ: f64, scale: f64, flip: bool) -> i32 {
    if flip {
        (-value * scale - displ) as i32
    } else {
        (value * scale + displ) as i32
    }
}

/// Projection parameters carried verbatim in the header. No projection
/// math is done on them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjInfo {
    pub proj_id: u8,
    pub ellipsoid_id: u8,
    pub units_id: u8,
    pub proj_params: [f64; 6],
    pub datum_shift_x: f64,
    pub datum_shift_y: f64,
    pub datum_shift_z: f64,
    pub datum_params: [f64; 5],
}

impl Default for ProjInfo {
    fn default() -> Self {
        Self {
            proj_id: 0,
            ellipsoid_id: 0,
            units_id: 7,
            proj_params: [0.0; 6],
            datum_shift_x: 0.0,
            datum_shift_y: 0.0,
            datum_shift_z: 0.0,
            datum_params: [0.0; 5],
        }
    }
}

#[derive(Debug, Clone)]
pub struct MapHeaderBlock {
    obj_len_table: [u8; HDR_MAGIC_OFFSET],
    pub version_number: i16,
    pub block_size: i16,
    pub coordsys2dist_units: f64,
    pub bounds: Mbr,
    pub first_index_block: i32,
    pub first_garbage_block: i32,
    pub first_tool_block: i32,
    pub num_point_objects: i32,
    pub num_line_objects: i32,
    pub num_region_objects: i32,
    pub num_text_objects: i32,
    pub max_coord_buf_size: i32,
    pub dist_units_code: u8,
    pub max_sp_index_depth: u8,
    pub coord_precision: u8,
    pub quadrant: Quadrant,
    pub reflect_x_axis_coord: u8,
    pub max_obj_len_array_id: u8,
    pub num_pen_defs: u8,
    pub num_brush_defs: u8,
    pub num_symbol_defs: u8,
    pub num_font_defs: u8,
    pub num_map_tool_blocks: i16,
    pub proj: ProjInfo,
    pub x_scale: f64,
    pub y_scale: f64,
    pub x_displ: f64,
    pub y_displ: f64,
    transform_ready: bool,
}

impl Default for MapHeaderBlock {
    fn default() -> Self {
        let mut obj_len_table = [0u8; HDR_MAGIC_OFFSET];
        obj_len_table[..HDR_OBJ_LEN_ARRAY_SIZE].copy_from_slice(&HDR_OBJ_LEN_ARRAY);

        Self {
            obj_len_table,
            version_number: HDR_VERSION_NUMBER,
            block_size: BLOCK_SIZE as i16,
            coordsys2dist_units: 1.0,
            bounds: Mbr::new(INT_COORD_MIN, INT_COORD_MIN, INT_COORD_MAX, INT_COORD_MAX),
            first_index_block: 0,
            first_garbage_block: 0,
            first_tool_block: 0,
            num_point_objects: 0,
            num_line_objects: 0,
            num_region_objects: 0,
            num_text_objects: 0,
            max_coord_buf_size: 0,
            dist_units_code: 7,
            max_sp_index_depth: 0,
            coord_precision: 3,
            quadrant: Quadrant::First,
            reflect_x_axis_coord: 0,
            max_obj_len_array_id: (HDR_OBJ_LEN_ARRAY_SIZE - 1) as u8,
            num_pen_defs: 0,
            num_brush_defs: 0,
            num_symbol_defs: 0,
            num_font_defs: 0,
            num_map_tool_blocks: 0,
            proj: ProjInfo::default(),
            x_scale: 1000.0,
            y_scale: 1000.0,
            x_displ: 0.0,
            y_displ: 0.0,
            transform_ready: false,
        }
    }
}

impl MapHeaderBlock {
    /// Header for a new file. Coordinate conversions are refused until
    /// `set_coordsys_bounds` has run.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &MapConfig) -> Self {
        Self {
            coordsys2dist_units: config.coordsys2dist_units,
            dist_units_code: config.dist_units_code,
            coord_precision: config.coord_precision,
            proj: config.proj.clone(),
            ..Self::default()
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != BLOCK_SIZE {
            return Err(TabMapError::InvalidBlockSize {
                expected: BLOCK_SIZE,
                actual: bytes.len(),
            });
        }

        let mut block = RawBinBlock::init_from_bytes(
            bytes.to_vec(),
            0,
            None,
            ByteOrder::LittleEndian,
            AccessMode::Read,
        )?;

        let mut obj_len_table = [0u8; HDR_MAGIC_OFFSET];
        obj_len_table.copy_from_slice(block.read_bytes(HDR_MAGIC_OFFSET)?);

        let magic = block.read_i32()?;
        if magic != HDR_MAGIC_COOKIE {
            return Err(TabMapError::InvalidMagicCookie {
                expected: HDR_MAGIC_COOKIE,
                actual: magic,
            });
        }

        let version_number = block.read_i16()?;
        if !(100..=HDR_VERSION_NUMBER + 100).contains(&version_number) {
            warn!("Unexpected MAP header version {}", version_number);
        }
        let block_size = block.read_i16()?;
        if block_size as usize != BLOCK_SIZE {
            warn!("MAP header declares block size {}, using {}", block_size, BLOCK_SIZE);
        }
        let coordsys2dist_units = block.read_f64()?;
        let bounds = Mbr::new(
            block.read_i32()?,
            block.read_i32()?,
            block.read_i32()?,
            block.read_i32()?,
        );

        block.goto_byte_in_block(0x130)?;
        let first_index_block = block.read_i32()?;
        let first_garbage_block = block.read_i32()?;
        let first_tool_block = block.read_i32()?;
        let num_point_objects = block.read_i32()?;
        let num_line_objects = block.read_i32()?;
        let num_region_objects = block.read_i32()?;
        let num_text_objects = block.read_i32()?;
        let max_coord_buf_size = block.read_i32()?;

        block.goto_byte_in_block(0x15e)?;
        let dist_units_code = block.read_u8()?;
        let max_sp_index_depth = block.read_u8()?;
        let coord_precision = block.read_u8()?;
        let quadrant = match block.read_u8()? {
            0 => {
                warn!("MAP header quadrant is 0, assuming quadrant 1");
                Quadrant::First
            }
            value => Quadrant::from_u8(value)?,
        };
        let reflect_x_axis_coord = block.read_u8()?;
        let max_obj_len_array_id = block.read_u8()?;
        let num_pen_defs = block.read_u8()?;
        let num_brush_defs = block.read_u8()?;
        let num_symbol_defs = block.read_u8()?;
        let num_font_defs = block.read_u8()?;
        let num_map_tool_blocks = block.read_i16()?;

        block.goto_byte_in_block(0x16d)?;
        let proj_id = block.read_u8()?;
        let ellipsoid_id = block.read_u8()?;
        let units_id = block.read_u8()?;
        let x_scale = block.read_f64()?;
        let y_scale = block.read_f64()?;
        let x_displ = block.read_f64()?;
        let y_displ = block.read_f64()?;

        let mut proj_params = [0.0; 6];
        for param in proj_params.iter_mut() {
            *param = block.read_f64()?;
        }
        let datum_shift_x = block.read_f64()?;
        let datum_shift_y = block.read_f64()?;
        let datum_shift_z = block.read_f64()?;
        let mut datum_params = [0.0; 5];
        for param in datum_params.iter_mut() {
            *param = block.read_f64()?;
        }

        debug!(
            "Decoded MAP header v{} (quadrant {}, scale {}x{})",
            version_number,
            quadrant.as_u8(),
            x_scale,
            y_scale
        );

        Ok(Self {
            obj_len_table,
            version_number,
            block_size,
            coordsys2dist_units,
            bounds,
            first_index_block,
            first_garbage_block,
            first_tool_block,
            num_point_objects,
            num_line_objects,
            num_region_objects,
            num_text_objects,
            max_coord_buf_size,
            dist_units_code,
            max_sp_index_depth,
            coord_precision,
            quadrant,
            reflect_x_axis_coord,
            max_obj_len_array_id,
            num_pen_defs,
            num_brush_defs,
            num_symbol_defs,
            num_font_defs,
            num_map_tool_blocks,
            proj: ProjInfo {
                proj_id,
                ellipsoid_id,
                units_id,
                proj_params,
                datum_shift_x,
                datum_shift_y,
                datum_shift_z,
                datum_params,
            },
            x_scale,
            y_scale,
            x_displ,
            y_displ,
            transform_ready: true,
        })
    }

    pub fn read_from_store<S: BlockStore + ?Sized>(store: &mut S) -> Result<Self> {
        let bytes = store.read_block(0, BLOCK_SIZE)?;
        Self::from_bytes(&bytes)
    }

    /// Serializes the full 512-byte header block. The object length table
    /// is always rewritten with the current definitions.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut block = RawBinBlock::new(BLOCK_SIZE, 0, ByteOrder::LittleEndian);

        let mut obj_len_table = self.obj_len_table;
        obj_len_table[..HDR_OBJ_LEN_ARRAY_SIZE].copy_from_slice(&HDR_OBJ_LEN_ARRAY);
        block.write_bytes(&obj_len_table)?;

        block.write_i32(HDR_MAGIC_COOKIE)?;
        block.write_i16(self.version_number)?;
        block.write_i16(BLOCK_SIZE as i16)?;
        block.write_f64(self.coordsys2dist_units)?;
        block.write_i32(self.bounds.x_min)?;
        block.write_i32(self.bounds.y_min)?;
        block.write_i32(self.bounds.x_max)?;
        block.write_i32(self.bounds.y_max)?;

        block.write_zeros(16)?;
        block.write_i32(self.first_index_block)?;
        block.write_i32(self.first_garbage_block)?;
        block.write_i32(self.first_tool_block)?;
        block.write_i32(self.num_point_objects)?;
        block.write_i32(self.num_line_objects)?;
        block.write_i32(self.num_region_objects)?;
        block.write_i32(self.num_text_objects)?;
        block.write_i32(self.max_coord_buf_size)?;

        block.write_zeros(14)?;
        block.write_u8(self.dist_units_code)?;
        block.write_u8(self.max_sp_index_depth)?;
        block.write_u8(self.coord_precision)?;
        block.write_u8(self.quadrant.as_u8())?;
        block.write_u8(self.reflect_x_axis_coord)?;
        block.write_u8((HDR_OBJ_LEN_ARRAY_SIZE - 1) as u8)?;
        block.write_u8(self.num_pen_defs)?;
        block.write_u8(self.num_brush_defs)?;
        block.write_u8(self.num_symbol_defs)?;
        block.write_u8(self.num_font_defs)?;
        block.write_i16(self.num_map_tool_blocks)?;

        block.write_zeros(3)?;
        block.write_u8(self.proj.proj_id)?;
        block.write_u8(self.proj.ellipsoid_id)?;
        block.write_u8(self.proj.units_id)?;
        block.write_f64(self.x_scale)?;
        block.write_f64(self.y_scale)?;
        block.write_f64(self.x_displ)?;
        block.write_f64(self.y_displ)?;
        for param in &self.proj.proj_params {
            block.write_f64(*param)?;
        }
        block.write_f64(self.proj.datum_shift_x)?;
        block.write_f64(self.proj.datum_shift_y)?;
        block.write_f64(self.proj.datum_shift_z)?;
        for param in &self.proj.datum_params {
            block.write_f64(*param)?;
        }

        Ok(block.as_bytes().to_vec())
    }

    pub fn commit<S: BlockStore + ?Sized>(&self, store: &mut S) -> Result<()> {
        store.write_block(0, &self.to_bytes()?)
    }

    /// Body length in bytes of a map object of type `obj_type`.
    pub fn map_object_size(&self, obj_type: i32) -> Result<usize> {
        let index = Self::obj_table_index(obj_type)?;
        Ok((self.obj_len_table[index] & 0x7f) as usize)
    }

    pub fn map_object_uses_coord_block(&self, obj_type: i32) -> Result<bool> {
        let index = Self::obj_table_index(obj_type)?;
        Ok(self.obj_len_table[index] & 0x80 != 0)
    }

    fn obj_table_index(obj_type: i32) -> Result<usize> {
        if !(0..=255).contains(&obj_type) {
            return Err(TabMapError::InvalidObjectType(obj_type));
        }
        Ok(obj_type as usize)
    }

    pub fn proj_info(&self) -> &ProjInfo {
        &self.proj
    }

    pub fn set_proj_info(&mut self, proj: ProjInfo) {
        self.proj = proj;
    }

    pub fn is_transform_ready(&self) -> bool {
        self.transform_ready
    }

    fn ensure_transform_ready(&self) -> Result<()> {
        if self.transform_ready {
            Ok(())
        } else {
            Err(TabMapError::CoordsysBoundsNotSet)
        }
    }

    /// Integer file coordinates to projected coordinates.
    pub fn int2coordsys(&self, x: i32, y: i32) -> Result<(f64, f64)> {
        self.ensure_transform_ready()?;
        Ok((
            int_to_axis(x, self.x_displ, self.x_scale, self.quadrant.flips_x()),
            int_to_axis(y, self.y_displ, self.y_scale, self.quadrant.flips_y()),
        ))
    }

    /// Projected coordinates to integer file coordinates, truncating.
    pub fn coordsys2int(&self, x: f64, y: f64) -> Result<(i32, i32)> {
        self.ensure_transform_ready()?;
        Ok((
            axis_to_int(x, self.x_displ, self.x_scale, self.quadrant.flips_x()),
            axis_to_int(y, self.y_displ, self.y_scale, self.quadrant.flips_y()),
        ))
    }

    /// Decodes a compressed vertex given its block's compression origin.
    pub fn compr_int2coordsys(&self, center_x: i32, center_y: i32, dx: i16, dy: i16) -> Result<(f64, f64)> {
        let (x, y) = decompress_int_coord(center_x, center_y, dx, dy)?;
        self.int2coordsys(x, y)
    }

    /// Integer distances to projected distances (scale only).
    pub fn int2coordsys_dist(&self, x: i32, y: i32) -> Result<(f64, f64)> {
        self.ensure_transform_ready()?;
        Ok((x as f64 / self.x_scale, y as f64 / self.y_scale))
    }

    pub fn coordsys2int_dist(&self, x: f64, y: f64) -> Result<(i32, i32)> {
        self.ensure_transform_ready()?;
        Ok(((x * self.x_scale) as i32, (y * self.y_scale) as i32))
    }

    /// Fits the projected extent onto the full integer range and centers it
    /// on integer 0. Forces quadrant 1.
    pub fn set_coordsys_bounds(&mut self, x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Result<()> {
        if ![x_min, y_min, x_max, y_max].iter().all(|v| v.is_finite()) || x_min > x_max || y_min > y_max {
            return Err(TabMapError::InvalidBounds {
                x_min,
                y_min,
                x_max,
                y_max,
            });
        }

        let (mut x_min, mut y_min, mut x_max, mut y_max) = (x_min, y_min, x_max, y_max);
        if x_max == x_min {
            x_min -= 1.0;
            x_max += 1.0;
        }
        if y_max == y_min {
            y_min -= 1.0;
            y_max += 1.0;
        }

        self.x_scale = 2e9 / (x_max - x_min);
        self.y_scale = 2e9 / (y_max - y_min);
        self.x_displ = -self.x_scale * (x_max + x_min) / 2.0;
        self.y_displ = -self.y_scale * (y_max + y_min) / 2.0;
        self.bounds = Mbr::new(INT_COORD_MIN, INT_COORD_MIN, INT_COORD_MAX, INT_COORD_MAX);
        self.quadrant = Quadrant::First;
        self.transform_ready = true;

        debug!(
            "Coordsys bounds ({}, {}) - ({}, {}): scale {}x{}, displacement {}x{}",
            x_min, y_min, x_max, y_max, self.x_scale, self.y_scale, self.x_displ, self.y_displ
        );
        Ok(())
    }
}

impl fmt::Display for MapHeaderBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "----- MAP Header Block -----")?;
        writeln!(f, "  Version: {}", self.version_number)?;
        writeln!(f, "  Block size: {}", self.block_size)?;
        writeln!(f, "  Coordsys to distance units: {}", self.coordsys2dist_units)?;
        writeln!(
            f,
            "  Bounds: ({}, {}) - ({}, {})",
            self.bounds.x_min, self.bounds.y_min, self.bounds.x_max, self.bounds.y_max
        )?;
        writeln!(f, "  First index block: {}", self.first_index_block)?;
        writeln!(f, "  First garbage block: {}", self.first_garbage_block)?;
        writeln!(f, "  First tool block: {}", self.first_tool_block)?;
        writeln!(
            f,
            "  Objects: {} points, {} lines, {} regions, {} texts",
            self.num_point_objects, self.num_line_objects, self.num_region_objects, self.num_text_objects
        )?;
        writeln!(f, "  Max coord buffer size: {}", self.max_coord_buf_size)?;
        writeln!(f, "  Distance units code: {}", self.dist_units_code)?;
        writeln!(f, "  Max spatial index depth: {}", self.max_sp_index_depth)?;
        writeln!(f, "  Coord precision: {}", self.coord_precision)?;
        writeln!(f, "  Coord origin quadrant: {}", self.quadrant.as_u8())?;
        writeln!(f, "  Reflect X axis: {}", self.reflect_x_axis_coord)?;
        writeln!(f, "  Max obj len array id: {}", self.max_obj_len_array_id)?;
        writeln!(
            f,
            "  Defs: {} pens, {} brushes, {} symbols, {} fonts",
            self.num_pen_defs, self.num_brush_defs, self.num_symbol_defs, self.num_font_defs
        )?;
        writeln!(f, "  Map tool blocks: {}", self.num_map_tool_blocks)?;
        writeln!(
            f,
            "  Projection: id {}, ellipsoid {}, units {}",
            self.proj.proj_id, self.proj.ellipsoid_id, self.proj.units_id
        )?;
        writeln!(f, "  Projection params: {:?}", self.proj.proj_params)?;
        writeln!(
            f,
            "  Datum shift: {}, {}, {}",
            self.proj.datum_shift_x, self.proj.datum_shift_y, self.proj.datum_shift_z
        )?;
        writeln!(f, "  Datum params: {:?}", self.proj.datum_params)?;
        writeln!(f, "  Scale: {} x {}", self.x_scale, self.y_scale)?;
        write!(f, "  Displacement: {} x {}", self.x_displ, self.y_displ)
    }
}
