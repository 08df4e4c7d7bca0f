use log::debug;

use crate::types::BlockOffset;

/// Hands out block offsets at the end of the file, one block at a time.
#[derive(Debug, Clone)]
pub struct BlockManager {
    block_size: usize,
    last_allocated: Option<BlockOffset>,
}

impl BlockManager {
    pub fn new(block_size: usize) -> Self {
        Self {
            block_size,
            last_allocated: None,
        }
    }

    /// Resumes allocation after an existing block, e.g. the last block of a
    /// file reopened for update.
    pub fn with_last_allocated(block_size: usize, last_allocated: BlockOffset) -> Self {
        Self {
            block_size,
            last_allocated: Some(last_allocated),
        }
    }

    pub fn alloc_new_block(&mut self) -> BlockOffset {
        let next = match self.last_allocated {
            None => 0,
            Some(last) => last + self.block_size as BlockOffset,
        };
        self.last_allocated = Some(next);
        debug!("Allocated block at offset {}", next);
        next
    }

    pub fn last_allocated_block(&self) -> Option<BlockOffset> {
        self.last_allocated
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }
}
