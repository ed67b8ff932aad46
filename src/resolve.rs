//! Path resolution over the sorted hash index.
//!
//! The hash is lossy; the authoritative key is the reconstructed path.
//! The resolver binary-searches the index, rewinds to the first record of
//! a tie group, and walks every hash-equal candidate, comparing each
//! candidate's reconstructed full path against the normalized input.

use crate::format::{path_hash, Entry, MAX_PATH};
use crate::image::Image;

impl<'a> Image<'a> {
    /// Resolve a path to its entry.
    ///
    /// Leading slashes are stripped; the empty path names the root. A
    /// miss is not an error and returns `None`.
    pub fn resolve(&'a self, path: &str) -> Option<Entry<'a>> {
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            return Some(self.root());
        }

        let target = path_hash(path);
        let n = self.num_entries() as usize;

        // First index whose hash is >= target.
        let mut lo = 0usize;
        let mut hi = n;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.hash_entry(mid).0 < target {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }

        // Walk the whole tie group; equal hashes are legal and the
        // string compare below is what decides.
        let mut i = lo;
        while i < n {
            let (hash, offs) = self.hash_entry(i);
            if hash != target {
                break;
            }
            if let Some(entry) = self.entry_at(offs) {
                if self.full_path(&entry) == path {
                    return Some(entry);
                }
            }
            i += 1;
        }

        None
    }

    /// Reconstruct an entry's full path by walking parent links.
    ///
    /// Segments are joined with `/` and the result carries no leading
    /// slash; the root reconstructs as the empty string. The walk is
    /// bounded by the entry count and the result by [`MAX_PATH`], so a
    /// malformed image with a parent cycle yields a truncated path (and a
    /// failed compare in the resolver) rather than a hang.
    pub fn full_path(&'a self, entry: &Entry<'a>) -> String {
        let mut segments: Vec<&str> = Vec::new();
        let mut total = 0usize;
        let mut hops = 0u32;
        let mut cur = *entry;

        while cur.parent_offset() != 0 {
            segments.push(cur.name());
            total += cur.name().len() + 1;
            hops += 1;
            if total > MAX_PATH || hops > self.num_entries() {
                break;
            }
            match self.entry_at(cur.parent_offset()) {
                Some(parent) if parent.is_dir() => cur = parent,
                // Dangling or non-directory parent: stop with what we have.
                _ => break,
            }
        }

        let mut path = String::with_capacity(total);
        for seg in segments.iter().rev() {
            if !path.is_empty() {
                path.push('/');
            }
            path.push_str(seg);
        }
        if path.len() > MAX_PATH {
            let mut cut = MAX_PATH;
            while !path.is_char_boundary(cut) {
                cut -= 1;
            }
            path.truncate(cut);
        }
        path
    }
}
