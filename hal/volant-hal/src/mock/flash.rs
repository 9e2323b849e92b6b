//! Mock NOR-flash region

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::vec::Vec;

use crate::flash::{BlobStorage, FlashError};

/// Mock non-volatile region with NOR programming semantics
///
/// Erase sets every byte to `0xFF`; programming can only clear bits.
#[derive(Debug, Clone)]
pub struct MockStorage {
    cells: Rc<RefCell<Vec<u8>>>,
    prepared: Rc<Cell<bool>>,
    fail_writes: Rc<Cell<bool>>,
}

impl MockStorage {
    /// Create an erased region of `capacity` bytes
    pub fn new(capacity: usize) -> Self {
        Self {
            cells: Rc::new(RefCell::new(vec![0xFF; capacity])),
            prepared: Rc::new(Cell::new(false)),
            fail_writes: Rc::new(Cell::new(false)),
        }
    }

    /// Flip every bit of one stored byte
    pub fn corrupt(&self, offset: usize) {
        if let Some(b) = self.cells.borrow_mut().get_mut(offset) {
            *b = !*b;
        }
    }

    /// Make subsequent writes fail
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }
}

impl BlobStorage for MockStorage {
    fn capacity(&self) -> usize {
        self.cells.borrow().len()
    }

    fn prepare(&mut self) -> Result<(), FlashError> {
        self.prepared.set(true);
        Ok(())
    }

    fn read(&mut self, offset: usize, buf: &mut [u8]) -> Result<(), FlashError> {
        if !self.prepared.get() {
            return Err(FlashError::NotReady);
        }
        let cells = self.cells.borrow();
        let end = offset.checked_add(buf.len()).ok_or(FlashError::OutOfBounds)?;
        let src = cells.get(offset..end).ok_or(FlashError::OutOfBounds)?;
        buf.copy_from_slice(src);
        Ok(())
    }

    fn erase(&mut self) -> Result<(), FlashError> {
        if !self.prepared.get() {
            return Err(FlashError::NotReady);
        }
        self.cells.borrow_mut().iter_mut().for_each(|b| *b = 0xFF);
        Ok(())
    }

    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), FlashError> {
        if !self.prepared.get() {
            return Err(FlashError::NotReady);
        }
        if self.fail_writes.get() {
            return Err(FlashError::Flash);
        }
        let mut cells = self.cells.borrow_mut();
        let end = offset.checked_add(data.len()).ok_or(FlashError::OutOfBounds)?;
        let dst = cells.get_mut(offset..end).ok_or(FlashError::OutOfBounds)?;
        for (cell, byte) in dst.iter_mut().zip(data) {
            *cell &= *byte;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_programming_only_clears_bits() {
        let mut flash = MockStorage::new(4);
        flash.prepare().unwrap();
        flash.write(0, &[0x0F]).unwrap();
        flash.write(0, &[0xF1]).unwrap();

        let mut buf = [0u8; 1];
        flash.read(0, &mut buf).unwrap();
        assert_eq!(buf[0], 0x01);

        flash.erase().unwrap();
        flash.read(0, &mut buf).unwrap();
        assert_eq!(buf[0], 0xFF);
    }

    #[test]
    fn test_out_of_bounds() {
        let mut flash = MockStorage::new(4);
        flash.prepare().unwrap();
        assert_eq!(flash.write(3, &[0, 0]), Err(FlashError::OutOfBounds));
    }
}
