use std::path::Path;

use log::{debug, info};

use crate::{
    config::MapConfig,
    storage::{
        block_manager::BlockManager,
        block_store::{BlockStore, FileBlockStore},
        coord_block::{CoordBlock, CoordSecHdr},
        header::MapHeaderBlock,
    },
    types::{
        AccessMode, BLOCK_SIZE, BlockOffset, COORD_SEC_HDR_SIZE, Mbr, VERTEX_SIZE,
        error::{Result, TabMapError},
    },
};

/// Projected extent of a dataset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl Extent {
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self { x_min, y_min, x_max, y_max }
    }
}

/// Where a written feature's coordinates live and what they cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureRef {
    pub coord_offset: BlockOffset,
    pub num_vertices: usize,
    pub num_sections: usize,
    pub mbr: Mbr,
    pub data_size: usize,
}

/// A .MAP geometry file: header block at offset 0 followed by coordinate
/// blocks handed out by the block manager.
pub struct MapFile<S: BlockStore> {
    store: S,
    header: MapHeaderBlock,
    manager: BlockManager,
    coord_block: Option<CoordBlock>,
    access: AccessMode,
}

impl MapFile<FileBlockStore> {
    pub fn create<P: AsRef<Path>>(path: P, extent: Extent, config: &MapConfig) -> Result<Self> {
        info!("Creating MAP file at {}", path.as_ref().display());
        Self::create_in(FileBlockStore::create(path)?, extent, config)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        info!("Opening MAP file at {}", path.as_ref().display());
        Self::open_in(FileBlockStore::open(path)?)
    }
}

impl<S: BlockStore> MapFile<S> {
    pub fn create_in(mut store: S, extent: Extent, config: &MapConfig) -> Result<Self> {
        let mut header = MapHeaderBlock::from_config(config);
        header.set_coordsys_bounds(extent.x_min, extent.y_min, extent.x_max, extent.y_max)?;

        let mut manager = BlockManager::new(BLOCK_SIZE);
        let header_offset = manager.alloc_new_block();
        debug_assert_eq!(header_offset, 0);
        header.commit(&mut store)?;

        Ok(Self {
            store,
            header,
            manager,
            coord_block: None,
            access: AccessMode::Write,
        })
    }

    pub fn open_in(mut store: S) -> Result<Self> {
        let header = MapHeaderBlock::read_from_store(&mut store)?;
        debug!(
            "MAP file holds {} lines, {} regions",
            header.num_line_objects, header.num_region_objects
        );
        Ok(Self {
            store,
            header,
            manager: BlockManager::new(BLOCK_SIZE),
            coord_block: None,
            access: AccessMode::Read,
        })
    }

    pub fn header(&self) -> &MapHeaderBlock {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut MapHeaderBlock {
        &mut self.header
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn block_manager(&self) -> &BlockManager {
        &self.manager
    }

    pub fn access(&self) -> AccessMode {
        self.access
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.access != AccessMode::Write {
            return Err(TabMapError::NotWritable);
        }
        Ok(())
    }

    fn to_int_coords(&self, points: &[(f64, f64)]) -> Result<Vec<(i32, i32)>> {
        points
            .iter()
            .map(|&(x, y)| self.header.coordsys2int(x, y))
            .collect()
    }

    fn record_feature(&mut self, data_size: usize) {
        self.header.max_coord_buf_size = self.header.max_coord_buf_size.max(data_size as i32);
    }

    /// Writes a single-part vertex stream (polyline) and returns its head.
    pub fn write_feature(&mut self, points: &[(f64, f64)]) -> Result<FeatureRef> {
        self.ensure_writable()?;
        let coords = self.to_int_coords(points)?;

        let manager = &mut self.manager;
        let block = self
            .coord_block
            .get_or_insert_with(|| CoordBlock::new(manager.alloc_new_block()));

        block.start_new_feature();
        block.ensure_space(&mut self.store, manager, VERTEX_SIZE)?;
        let coord_offset = block.cur_address();
        for &(x, y) in &coords {
            block.write_int_coord(&mut self.store, manager, x, y, true)?;
        }

        let feature = FeatureRef {
            coord_offset,
            num_vertices: coords.len(),
            num_sections: 1,
            mbr: block.feature_mbr(),
            data_size: block.feature_data_size(),
        };
        self.header.num_line_objects += 1;
        self.record_feature(feature.data_size);
        debug!("Wrote {} vertices at offset {}", feature.num_vertices, coord_offset);
        Ok(feature)
    }

    /// Writes a multi-ring object: one section header per ring, then all
    /// vertices contiguously.
    pub fn write_region(&mut self, rings: &[Vec<(f64, f64)>]) -> Result<FeatureRef> {
        self.ensure_writable()?;
        let rings = rings
            .iter()
            .map(|ring| self.to_int_coords(ring))
            .collect::<Result<Vec<_>>>()?;

        let hdr_size = COORD_SEC_HDR_SIZE * rings.len();
        let mut vertex_index = 0usize;
        let mut headers = Vec::with_capacity(rings.len());
        for ring in &rings {
            let mut mbr = Mbr::empty();
            for &(x, y) in ring {
                mbr.extend(x, y);
            }
            let mut hdr = CoordSecHdr::new(ring.len() as i32, 0, mbr);
            hdr.data_offset = (hdr_size + vertex_index * VERTEX_SIZE) as i32;
            hdr.vertex_offset = vertex_index as i32;
            vertex_index += ring.len();
            headers.push(hdr);
        }

        let manager = &mut self.manager;
        let block = self
            .coord_block
            .get_or_insert_with(|| CoordBlock::new(manager.alloc_new_block()));

        block.start_new_feature();
        block.ensure_space(&mut self.store, manager, 2)?;
        let coord_offset = block.cur_address();
        block.write_coord_sec_hdrs(&mut self.store, manager, &headers)?;
        for &(x, y) in rings.iter().flatten() {
            block.write_int_coord(&mut self.store, manager, x, y, true)?;
        }

        let feature = FeatureRef {
            coord_offset,
            num_vertices: vertex_index,
            num_sections: rings.len(),
            mbr: block.feature_mbr(),
            data_size: block.feature_data_size(),
        };
        self.header.num_region_objects += 1;
        self.record_feature(feature.data_size);
        debug!(
            "Wrote region with {} sections, {} vertices at offset {}",
            feature.num_sections, feature.num_vertices, coord_offset
        );
        Ok(feature)
    }

    fn flush_pending(&mut self) -> Result<()> {
        if self.access == AccessMode::Write {
            if let Some(block) = self.coord_block.as_mut() {
                block.commit(&mut self.store)?;
            }
        }
        Ok(())
    }

    /// Reads back `num_vertices` projected vertices starting at `coord_offset`.
    pub fn read_feature(&mut self, coord_offset: BlockOffset, num_vertices: usize) -> Result<Vec<(f64, f64)>> {
        self.flush_pending()?;
        let mut block = CoordBlock::load(&mut self.store, coord_offset)?;
        let coords = block.read_int_coords(&mut self.store, false, num_vertices)?;
        coords
            .into_iter()
            .map(|(x, y)| self.header.int2coordsys(x, y))
            .collect()
    }

    pub fn read_region(&mut self, coord_offset: BlockOffset, num_sections: usize) -> Result<Vec<Vec<(f64, f64)>>> {
        self.flush_pending()?;
        let mut block = CoordBlock::load(&mut self.store, coord_offset)?;
        let (headers, total) = block.read_coord_sec_hdrs(&mut self.store, false, num_sections)?;
        let coords = block.read_int_coords(&mut self.store, false, total as usize)?;

        headers
            .iter()
            .map(|hdr| {
                let start = hdr.vertex_offset as usize;
                let end = start + hdr.num_vertices as usize;
                coords[start..end]
                    .iter()
                    .map(|&(x, y)| self.header.int2coordsys(x, y))
                    .collect::<Result<Vec<_>>>()
            })
            .collect()
    }

    /// Commits the pending coordinate block and the header.
    pub fn close(&mut self) -> Result<()> {
        if self.access == AccessMode::Write {
            self.flush_pending()?;
            self.header.commit(&mut self.store)?;
            info!(
                "Closed MAP file: {} lines, {} regions, {} blocks",
                self.header.num_line_objects,
                self.header.num_region_objects,
                self.manager
                    .last_allocated_block()
                    .map_or(0, |last| last as usize / BLOCK_SIZE + 1)
            );
        }
        self.store.flush()
    }
}
