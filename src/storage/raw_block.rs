use crate::{
    storage::block_store::BlockStore,
    types::{
        AccessMode, BlockOffset, BlockType, ByteOrder,
        error::{Result, TabMapError},
    },
};

/*
 * Raw block: a fixed-size buffer with a cursor.
 * ┌──────────────────────────────────────────────────────────────┐
 * │ type(2) | block specific header ... | data ...    | unused   │
 * └──────────────────────────────────────────────────────────────┘
 *   0                                     cur_pos ->   size_used
 *
 * Reads are bounded by `size_used`, writes by `block_size`.
 */

#[derive(Debug, Clone)]
pub struct RawBinBlock {
    buf: Vec<u8>,
    block_size: usize,
    file_offset: BlockOffset,
    cur_pos: usize,
    size_used: usize,
    block_type: i16,
    byte_order: ByteOrder,
    access: AccessMode,
    modified: bool,
}

impl RawBinBlock {
    /// A new zero-filled block ready to receive data.
    pub fn new(block_size: usize, file_offset: BlockOffset, byte_order: ByteOrder) -> Self {
        Self {
            buf: vec![0; block_size],
            block_size,
            file_offset,
            cur_pos: 0,
            size_used: 0,
            block_type: 0,
            byte_order,
            access: AccessMode::Write,
            modified: false,
        }
    }

    /// Wraps bytes loaded from `file_offset`, checking the leading type
    /// discriminant when `expected` is given.
    pub fn init_from_bytes(
        buf: Vec<u8>,
        file_offset: BlockOffset,
        expected: Option<BlockType>,
        byte_order: ByteOrder,
        access: AccessMode,
    ) -> Result<Self> {
        if buf.len() < 2 {
            return Err(TabMapError::InvalidBlockSize {
                expected: 2,
                actual: buf.len(),
            });
        }

        let raw_type = [buf[0], buf[1]];
        let block_type = match byte_order {
            ByteOrder::LittleEndian => i16::from_le_bytes(raw_type),
            ByteOrder::BigEndian => i16::from_be_bytes(raw_type),
        };

        if let Some(expected) = expected {
            if block_type != expected.as_i16() {
                return Err(TabMapError::InvalidBlockType {
                    offset: file_offset,
                    expected: expected.as_i16(),
                    actual: block_type,
                });
            }
        }

        let block_size = buf.len();
        Ok(Self {
            buf,
            block_size,
            file_offset,
            cur_pos: 0,
            size_used: block_size,
            block_type,
            byte_order,
            access,
            modified: false,
        })
    }

    pub fn read_from_store<S: BlockStore + ?Sized>(
        store: &mut S,
        file_offset: BlockOffset,
        block_size: usize,
        expected: Option<BlockType>,
        byte_order: ByteOrder,
        access: AccessMode,
    ) -> Result<Self> {
        let buf = store.read_block(file_offset, block_size)?;
        if buf.len() != block_size {
            return Err(TabMapError::InvalidBlockSize {
                expected: block_size,
                actual: buf.len(),
            });
        }
        Self::init_from_bytes(buf, file_offset, expected, byte_order, access)
    }

    pub fn block_type(&self) -> i16 {
        self.block_type
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn file_offset(&self) -> BlockOffset {
        self.file_offset
    }

    pub fn cur_pos(&self) -> usize {
        self.cur_pos
    }

    pub fn size_used(&self) -> usize {
        self.size_used
    }

    pub fn access(&self) -> AccessMode {
        self.access
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn goto_byte_in_block(&mut self, pos: usize) -> Result<()> {
        let limit = match self.access {
            AccessMode::Read => self.size_used,
            AccessMode::Write => self.block_size,
        };
        if pos > limit {
            return Err(TabMapError::InvalidPosition {
                pos,
                block_size: self.block_size,
            });
        }
        self.cur_pos = pos;
        if self.access == AccessMode::Write {
            self.size_used = self.size_used.max(pos);
        }
        Ok(())
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&[u8]> {
        if self.cur_pos + len > self.size_used {
            return Err(TabMapError::ReadPastEnd {
                offset: self.file_offset,
                pos: self.cur_pos,
                len,
                available: self.size_used.saturating_sub(self.cur_pos),
            });
        }
        let start = self.cur_pos;
        self.cur_pos += len;
        Ok(&self.buf[start..start + len])
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        let bytes = self.read_array::<2>()?;
        Ok(match self.byte_order {
            ByteOrder::LittleEndian => i16::from_le_bytes(bytes),
            ByteOrder::BigEndian => i16::from_be_bytes(bytes),
        })
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        let bytes = self.read_array::<4>()?;
        Ok(match self.byte_order {
            ByteOrder::LittleEndian => i32::from_le_bytes(bytes),
            ByteOrder::BigEndian => i32::from_be_bytes(bytes),
        })
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        let bytes = self.read_array::<8>()?;
        Ok(match self.byte_order {
            ByteOrder::LittleEndian => f64::from_le_bytes(bytes),
            ByteOrder::BigEndian => f64::from_be_bytes(bytes),
        })
    }

    pub fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        if self.access == AccessMode::Read {
            return Err(TabMapError::ReadOnlyBlock {
                offset: self.file_offset,
            });
        }
        if self.cur_pos + data.len() > self.block_size {
            return Err(TabMapError::WritePastEnd {
                offset: self.file_offset,
                pos: self.cur_pos,
                len: data.len(),
            });
        }
        let start = self.cur_pos;
        self.buf[start..start + data.len()].copy_from_slice(data);
        self.cur_pos += data.len();
        self.size_used = self.size_used.max(self.cur_pos);
        self.modified = true;
        Ok(())
    }

    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.write_bytes(&[value])
    }

    pub fn write_i16(&mut self, value: i16) -> Result<()> {
        let bytes = match self.byte_order {
            ByteOrder::LittleEndian => value.to_le_bytes(),
            ByteOrder::BigEndian => value.to_be_bytes(),
        };
        self.write_bytes(&bytes)
    }

    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        let bytes = match self.byte_order {
            ByteOrder::LittleEndian => value.to_le_bytes(),
            ByteOrder::BigEndian => value.to_be_bytes(),
        };
        self.write_bytes(&bytes)
    }

    pub fn write_f64(&mut self, value: f64) -> Result<()> {
        let bytes = match self.byte_order {
            ByteOrder::LittleEndian => value.to_le_bytes(),
            ByteOrder::BigEndian => value.to_be_bytes(),
        };
        self.write_bytes(&bytes)
    }

    pub fn write_zeros(&mut self, count: usize) -> Result<()> {
        self.write_bytes(&vec![0u8; count])
    }

    /// Writes the whole block back at its file offset.
    pub fn commit<S: BlockStore + ?Sized>(&mut self, store: &mut S) -> Result<()> {
        if self.access == AccessMode::Read {
            return Err(TabMapError::ReadOnlyBlock {
                offset: self.file_offset,
            });
        }
        store.write_block(self.file_offset, &self.buf)?;
        self.modified = false;
        Ok(())
    }
}
