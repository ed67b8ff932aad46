//! Directory iteration in stored order.

use crate::error::{RelicError, Result};
use crate::format::{read_u32, Entry, EntryBody};
use crate::image::Image;

/// A cursor over one directory's children
///
/// Children come back in the packer's stored order. The handle owns only
/// its cursor; it is cheap to create and not thread-safe without
/// external locking.
pub struct DirHandle<'a> {
    image: &'a Image<'a>,
    child_count: u32,
    /// Image offset of the child offset table
    children_off: usize,
    index: u32,
}

impl<'a> Image<'a> {
    /// Open a directory for iteration. `None` opens the root; file
    /// entries are rejected with [`RelicError::NotADirectory`].
    pub fn open_dir(&'a self, entry: Option<&Entry<'a>>) -> Result<DirHandle<'a>> {
        let dir = match entry {
            Some(e) => *e,
            None => self.root(),
        };

        let EntryBody::Dir {
            child_count,
            children_off,
        } = dir.body
        else {
            return Err(RelicError::NotADirectory);
        };

        Ok(DirHandle {
            image: self,
            child_count,
            children_off,
            index: 0,
        })
    }
}

impl<'a> DirHandle<'a> {
    /// Return the child at the cursor and advance. `None` past the last
    /// child, or if the image is malformed at the cursor.
    pub fn read(&mut self) -> Option<Entry<'a>> {
        if self.index >= self.child_count {
            return None;
        }
        let slot = self.children_off + self.index as usize * 4;
        let offs = read_u32(self.image.data(), slot)?;
        let entry = self.image.entry_at(offs)?;
        self.index += 1;
        Some(entry)
    }

    /// Reset the cursor to the first child.
    pub fn rewind(&mut self) {
        self.index = 0;
    }

    /// Position the cursor at child `loc`, clamped at the child count.
    pub fn seek(&mut self, loc: u16) {
        self.index = (loc as u32).min(self.child_count);
    }

    /// Current cursor position
    pub fn tell(&self) -> u16 {
        self.index.min(u16::MAX as u32) as u16
    }

    /// Number of children in this directory
    pub fn child_count(&self) -> u32 {
        self.child_count
    }
}

impl<'a> Iterator for DirHandle<'a> {
    type Item = Entry<'a>;

    fn next(&mut self) -> Option<Entry<'a>> {
        self.read()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.child_count - self.index) as usize;
        (0, Some(remaining))
    }
}
