use log::{debug, trace};

use crate::{
    storage::{block_manager::BlockManager, block_store::BlockStore, raw_block::RawBinBlock},
    types::{
        AccessMode, BLOCK_SIZE, BlockOffset, BlockType, ByteOrder, COORD_HEADER_SIZE,
        COORD_SEC_HDR_SIZE, Mbr, VERTEX_SIZE,
        error::{Result, TabMapError},
    },
};

/*
 * Coordinate block layout:
 * ┌────────────┬───────────────┬──────────────┬─────────────────────────┐
 * │ type (i16) │ used (i16)    │ next (i32)   │ vertex data ...         │
 * └────────────┴───────────────┴──────────────┴─────────────────────────┘
 *   0            2               4              8                    512
 *
 * `used` excludes the 8 header bytes. `next` is the absolute offset of the
 * following block in the chain, 0 at the end.
 */

/// Adds a compressed delta to its origin. Fails when the origin read from
/// a corrupt object header pushes the vertex outside the i32 range.
pub fn decompress_int_coord(center_x: i32, center_y: i32, dx: i16, dy: i16) -> Result<(i32, i32)> {
    match (
        center_x.checked_add(dx as i32),
        center_y.checked_add(dy as i32),
    ) {
        (Some(x), Some(y)) => Ok((x, y)),
        _ => Err(TabMapError::CompressedOriginOverflow {
            center_x,
            center_y,
            dx,
            dy,
        }),
    }
}

fn clamp_i32(value: i64) -> i32 {
    value.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/// Per-ring metadata of a multi-part object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordSecHdr {
    pub num_vertices: i32,
    pub num_holes: i32,
    pub mbr: Mbr,
    pub data_offset: i32,
    /// Index of the section's first vertex in the object's vertex pool.
    pub vertex_offset: i32,
}

impl CoordSecHdr {
    pub fn new(num_vertices: i32, num_holes: i32, mbr: Mbr) -> Self {
        Self {
            num_vertices,
            num_holes,
            mbr,
            data_offset: 0,
            vertex_offset: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CoordBlock {
    raw: RawBinBlock,
    num_data_bytes: usize,
    next_coord_block: BlockOffset,
    center_x: i32,
    center_y: i32,
    block_mbr: Mbr,
    feature_mbr: Mbr,
    total_data_size: usize,
    feature_data_size: usize,
    num_blocks_in_chain: usize,
    chain: Vec<BlockOffset>,
}

impl CoordBlock {
    /// Empty block in write mode at `file_offset`.
    pub fn new(file_offset: BlockOffset) -> Self {
        let mut block = Self {
            raw: RawBinBlock::new(BLOCK_SIZE, file_offset, ByteOrder::LittleEndian),
            num_data_bytes: 0,
            next_coord_block: 0,
            center_x: 0,
            center_y: 0,
            block_mbr: Mbr::empty(),
            feature_mbr: Mbr::empty(),
            total_data_size: 0,
            feature_data_size: 0,
            num_blocks_in_chain: 1,
            chain: vec![file_offset],
        };
        block.reset_raw(file_offset);
        block
    }

    /// Loads the block containing `offset` for reading and positions the
    /// cursor at `offset` (or at the start of the data if it points into
    /// the header).
    pub fn load<S: BlockStore + ?Sized>(store: &mut S, offset: BlockOffset) -> Result<Self> {
        if offset < 0 {
            return Err(TabMapError::InvalidBlockOffset(offset));
        }
        let mut block = Self {
            raw: RawBinBlock::new(BLOCK_SIZE, 0, ByteOrder::LittleEndian),
            num_data_bytes: 0,
            next_coord_block: 0,
            center_x: 0,
            center_y: 0,
            block_mbr: Mbr::empty(),
            feature_mbr: Mbr::empty(),
            total_data_size: 0,
            feature_data_size: 0,
            num_blocks_in_chain: 0,
            chain: Vec::new(),
        };
        block.goto_byte_in_file(store, offset)?;
        Ok(block)
    }

    fn reset_raw(&mut self, file_offset: BlockOffset) {
        self.raw = RawBinBlock::new(BLOCK_SIZE, file_offset, ByteOrder::LittleEndian);
        self.num_data_bytes = 0;
        self.next_coord_block = 0;
        self.block_mbr = Mbr::empty();
        // Header is written on commit; data starts after it.
        let _ = self.raw.goto_byte_in_block(COORD_HEADER_SIZE);
    }

    fn load_raw<S: BlockStore + ?Sized>(&mut self, store: &mut S, block_offset: BlockOffset) -> Result<()> {
        let mut raw = RawBinBlock::read_from_store(
            store,
            block_offset,
            BLOCK_SIZE,
            Some(BlockType::Coord),
            ByteOrder::LittleEndian,
            AccessMode::Read,
        )?;
        raw.goto_byte_in_block(2)?;
        let num_data_bytes = raw.read_i16()?;
        let next = raw.read_i32()?;
        if num_data_bytes < 0 || num_data_bytes as usize > BLOCK_SIZE - COORD_HEADER_SIZE {
            return Err(TabMapError::InvalidBlockSize {
                expected: BLOCK_SIZE - COORD_HEADER_SIZE,
                actual: num_data_bytes.max(0) as usize,
            });
        }

        self.raw = raw;
        self.num_data_bytes = num_data_bytes as usize;
        self.next_coord_block = next;
        trace!(
            "Loaded coord block at {} ({} data bytes, next {})",
            block_offset, self.num_data_bytes, next
        );
        Ok(())
    }

    /// Moves the cursor to an absolute file offset, loading another block
    /// when `offset` falls outside the current one. Only read mode may
    /// leave the current block.
    pub fn goto_byte_in_file<S: BlockStore + ?Sized>(&mut self, store: &mut S, offset: BlockOffset) -> Result<()> {
        if offset < 0 {
            return Err(TabMapError::InvalidBlockOffset(offset));
        }
        let block_size = BLOCK_SIZE as BlockOffset;
        let block_offset = offset - offset % block_size;
        let pos_in_block = ((offset - block_offset) as usize).max(COORD_HEADER_SIZE);

        if block_offset != self.raw.file_offset() || self.chain.is_empty() {
            if self.raw.access() == AccessMode::Write && !self.chain.is_empty() {
                return Err(TabMapError::InvalidBlockOffset(offset));
            }
            self.load_raw(store, block_offset)?;
            self.chain = vec![block_offset];
            self.num_blocks_in_chain = 1;
        }
        self.raw.goto_byte_in_block(pos_in_block)
    }

    fn goto_next_block<S: BlockStore + ?Sized>(&mut self, store: &mut S) -> Result<()> {
        let next = self.next_coord_block;
        if next <= 0 || next % BLOCK_SIZE as BlockOffset != 0 {
            return Err(TabMapError::InvalidBlockOffset(next));
        }
        self.load_raw(store, next)?;
        self.raw.goto_byte_in_block(COORD_HEADER_SIZE)?;
        self.num_blocks_in_chain += 1;
        self.chain.push(next);
        debug!("Followed coord block chain to offset {}", next);
        Ok(())
    }

    fn prepare_read<S: BlockStore + ?Sized>(&mut self, store: &mut S, len: usize) -> Result<()> {
        if self.raw.access() == AccessMode::Read
            && self.raw.cur_pos() >= self.num_data_bytes + COORD_HEADER_SIZE
            && self.next_coord_block > 0
        {
            self.goto_next_block(store)?;
        }

        let data_end = match self.raw.access() {
            AccessMode::Read => self.num_data_bytes + COORD_HEADER_SIZE,
            AccessMode::Write => self.raw.size_used(),
        };
        if self.raw.cur_pos() + len > data_end {
            return Err(TabMapError::ReadPastEnd {
                offset: self.raw.file_offset(),
                pos: self.raw.cur_pos(),
                len,
                available: data_end.saturating_sub(self.raw.cur_pos()),
            });
        }
        Ok(())
    }

    /// Makes room for `len` more bytes, chaining to a freshly allocated
    /// block when the current one cannot hold them.
    pub fn ensure_space<S: BlockStore + ?Sized>(
        &mut self,
        store: &mut S,
        manager: &mut BlockManager,
        len: usize,
    ) -> Result<()> {
        if self.raw.access() != AccessMode::Write {
            return Err(TabMapError::ReadOnlyBlock {
                offset: self.raw.file_offset(),
            });
        }
        if self.raw.block_size() - self.raw.cur_pos() >= len {
            return Ok(());
        }

        let new_offset = manager.alloc_new_block();
        self.next_coord_block = new_offset;
        self.commit(store)?;
        debug!(
            "Coord block at {} full, chaining to new block at {}",
            self.raw.file_offset(),
            new_offset
        );

        // The compression origin carries over so compressed streams stay
        // decodable across the boundary.
        self.reset_raw(new_offset);
        self.num_blocks_in_chain += 1;
        self.chain.push(new_offset);
        Ok(())
    }

    fn prepare_write<S: BlockStore + ?Sized>(
        &mut self,
        store: &mut S,
        manager: &mut BlockManager,
        len: usize,
    ) -> Result<()> {
        self.ensure_space(store, manager, len)?;
        if self.raw.cur_pos() >= COORD_HEADER_SIZE {
            self.total_data_size += len;
            self.feature_data_size += len;
        }
        Ok(())
    }

    pub fn read_i16<S: BlockStore + ?Sized>(&mut self, store: &mut S) -> Result<i16> {
        self.prepare_read(store, 2)?;
        self.raw.read_i16()
    }

    pub fn read_i32<S: BlockStore + ?Sized>(&mut self, store: &mut S) -> Result<i32> {
        self.prepare_read(store, 4)?;
        self.raw.read_i32()
    }

    pub fn write_i16<S: BlockStore + ?Sized>(
        &mut self,
        store: &mut S,
        manager: &mut BlockManager,
        value: i16,
    ) -> Result<()> {
        self.prepare_write(store, manager, 2)?;
        self.raw.write_i16(value)
    }

    pub fn write_i32<S: BlockStore + ?Sized>(
        &mut self,
        store: &mut S,
        manager: &mut BlockManager,
        value: i32,
    ) -> Result<()> {
        self.prepare_write(store, manager, 4)?;
        self.raw.write_i32(value)
    }

    /// Reads one vertex: two i32, or two i16 deltas added to the
    /// compression origin.
    pub fn read_int_coord<S: BlockStore + ?Sized>(&mut self, store: &mut S, compressed: bool) -> Result<(i32, i32)> {
        if compressed {
            let dx = self.read_i16(store)?;
            let dy = self.read_i16(store)?;
            decompress_int_coord(self.center_x, self.center_y, dx, dy)
        } else {
            let x = self.read_i32(store)?;
            let y = self.read_i32(store)?;
            Ok((x, y))
        }
    }

    pub fn read_int_coords<S: BlockStore + ?Sized>(
        &mut self,
        store: &mut S,
        compressed: bool,
        num_vertices: usize,
    ) -> Result<Vec<(i32, i32)>> {
        let mut coords = Vec::with_capacity(num_vertices);
        for _ in 0..num_vertices {
            coords.push(self.read_int_coord(store, compressed)?);
        }
        Ok(coords)
    }

    pub fn write_int_coord<S: BlockStore + ?Sized>(
        &mut self,
        store: &mut S,
        manager: &mut BlockManager,
        x: i32,
        y: i32,
        update_mbr: bool,
    ) -> Result<()> {
        self.write_i32(store, manager, x)?;
        self.write_i32(store, manager, y)?;

        if update_mbr {
            self.block_mbr.extend(x, y);
            self.feature_mbr.extend(x, y);
            let (cx, cy) = self.block_mbr.center();
            self.center_x = cx;
            self.center_y = cy;
        }
        Ok(())
    }

    /// Writes one vertex as i16 deltas from the compression origin. The
    /// origin is left untouched so the stream decodes with the same value.
    pub fn write_compressed_int_coord<S: BlockStore + ?Sized>(
        &mut self,
        store: &mut S,
        manager: &mut BlockManager,
        x: i32,
        y: i32,
    ) -> Result<()> {
        let dx = x as i64 - self.center_x as i64;
        let dy = y as i64 - self.center_y as i64;
        let in_range = |d: i64| d >= i16::MIN as i64 && d <= i16::MAX as i64;
        if !in_range(dx) || !in_range(dy) {
            return Err(TabMapError::CompressedOverflow { dx, dy });
        }

        self.write_i16(store, manager, dx as i16)?;
        self.write_i16(store, manager, dy as i16)?;
        self.block_mbr.extend(x, y);
        self.feature_mbr.extend(x, y);
        Ok(())
    }

    pub fn set_compr_coord_origin(&mut self, x: i32, y: i32) {
        self.center_x = x;
        self.center_y = y;
    }

    pub fn center(&self) -> (i32, i32) {
        (self.center_x, self.center_y)
    }

    /// Reads `num_sections` section headers and derives each section's
    /// first vertex index. All vertices of the object are expected to
    /// follow the header array contiguously.
    pub fn read_coord_sec_hdrs<S: BlockStore + ?Sized>(
        &mut self,
        store: &mut S,
        compressed: bool,
        num_sections: usize,
    ) -> Result<(Vec<CoordSecHdr>, i32)> {
        // Offsets are relative to the uncompressed header array size even
        // for compressed objects.
        let total_hdr_size = (COORD_SEC_HDR_SIZE * num_sections) as i64;
        let mut headers = Vec::with_capacity(num_sections);
        let mut total_vertices = 0i64;

        for _ in 0..num_sections {
            let num_vertices = self.read_i16(store)? as i32;
            let num_holes = self.read_i16(store)? as i32;
            let (x_min, y_min) = self.read_int_coord(store, compressed)?;
            let (x_max, y_max) = self.read_int_coord(store, compressed)?;
            let data_offset = self.read_i32(store)?;
            let vertex_offset = (data_offset as i64 - total_hdr_size).div_euclid(VERTEX_SIZE as i64);

            total_vertices += num_vertices as i64;
            headers.push((
                CoordSecHdr {
                    num_vertices,
                    num_holes,
                    mbr: Mbr::new(x_min, y_min, x_max, y_max),
                    data_offset,
                    vertex_offset: clamp_i32(vertex_offset),
                },
                vertex_offset,
            ));
        }

        let total = clamp_i32(total_vertices);
        for (section, (hdr, vertex_offset)) in headers.iter().enumerate() {
            if hdr.num_vertices < 0
                || *vertex_offset < 0
                || vertex_offset + hdr.num_vertices as i64 > total_vertices
                || total_vertices > i32::MAX as i64
            {
                return Err(TabMapError::NonContiguousSections {
                    section,
                    vertex_offset: hdr.vertex_offset,
                    num_vertices: hdr.num_vertices,
                    total,
                });
            }
        }

        Ok((headers.into_iter().map(|(hdr, _)| hdr).collect(), total))
    }

    /// Writes uncompressed section headers. `data_offset` must already be
    /// filled in by the caller.
    pub fn write_coord_sec_hdrs<S: BlockStore + ?Sized>(
        &mut self,
        store: &mut S,
        manager: &mut BlockManager,
        headers: &[CoordSecHdr],
    ) -> Result<()> {
        for hdr in headers {
            self.write_i16(store, manager, hdr.num_vertices as i16)?;
            self.write_i16(store, manager, hdr.num_holes as i16)?;
            self.write_int_coord(store, manager, hdr.mbr.x_min, hdr.mbr.y_min, false)?;
            self.write_int_coord(store, manager, hdr.mbr.x_max, hdr.mbr.y_max, false)?;
            self.write_i32(store, manager, hdr.data_offset)?;
        }
        Ok(())
    }

    pub fn start_new_feature(&mut self) {
        self.feature_data_size = 0;
        self.feature_mbr = Mbr::empty();
    }

    pub fn feature_mbr(&self) -> Mbr {
        self.feature_mbr
    }

    pub fn block_mbr(&self) -> Mbr {
        self.block_mbr
    }

    pub fn feature_data_size(&self) -> usize {
        self.feature_data_size
    }

    pub fn total_data_size(&self) -> usize {
        self.total_data_size
    }

    pub fn num_blocks_in_chain(&self) -> usize {
        self.num_blocks_in_chain
    }

    pub fn chain(&self) -> &[BlockOffset] {
        &self.chain
    }

    pub fn next_coord_block(&self) -> BlockOffset {
        self.next_coord_block
    }

    pub fn set_next_coord_block(&mut self, offset: BlockOffset) {
        self.next_coord_block = offset;
    }

    pub fn num_data_bytes(&self) -> usize {
        match self.raw.access() {
            AccessMode::Read => self.num_data_bytes,
            AccessMode::Write => self.raw.size_used().saturating_sub(COORD_HEADER_SIZE),
        }
    }

    pub fn file_offset(&self) -> BlockOffset {
        self.raw.file_offset()
    }

    /// Absolute file offset of the cursor.
    pub fn cur_address(&self) -> BlockOffset {
        self.raw.file_offset() + self.raw.cur_pos() as BlockOffset
    }

    pub fn access(&self) -> AccessMode {
        self.raw.access()
    }

    /// Writes the 8-byte header and flushes the block to the store.
    pub fn commit<S: BlockStore + ?Sized>(&mut self, store: &mut S) -> Result<()> {
        let pos = self.raw.cur_pos();
        let used = self.raw.size_used().saturating_sub(COORD_HEADER_SIZE);

        self.raw.goto_byte_in_block(0)?;
        self.raw.write_i16(BlockType::Coord.as_i16())?;
        self.raw.write_i16(used as i16)?;
        self.raw.write_i32(self.next_coord_block)?;
        self.raw.goto_byte_in_block(pos)?;

        self.num_data_bytes = used;
        self.raw.commit(store)
    }
}
