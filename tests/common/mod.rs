//! Shared test support: an in-test packer producing bit-exact images.
//!
//! The builder mirrors the offline packer's layout rules: header, hash
//! index sorted by djb2-XOR path hash, entry records with the root first
//! in preorder, 4-byte alignment throughout, payloads after the records.

#![allow(dead_code)]

use std::io::Write;

use flate2::write::DeflateEncoder;
use flate2::Compression;

use relicfs::path_hash;

pub const COMP_NONE: u8 = 0;
pub const COMP_DEFLATE: u8 = 1;
pub const COMP_HEATSHRINK: u8 = 2;

const HEADER_SIZE: usize = 24;
const MAGIC: u32 = u32::from_le_bytes(*b"RLFS");
const VER_MAJOR: u8 = 1;
const VER_MINOR: u8 = 0;

fn align4(n: usize) -> usize {
    (n + 3) & !3
}

struct FileNode {
    name: String,
    stored: Vec<u8>,
    compression: u8,
    real_sz: u32,
    window_sz2: u8,
    lookahead_sz2: u8,
}

struct DirNode {
    name: String,
    children: Vec<Node>,
}

enum Node {
    Dir(DirNode),
    File(FileNode),
}

impl Node {
    fn name(&self) -> &str {
        match self {
            Node::Dir(d) => &d.name,
            Node::File(f) => &f.name,
        }
    }
}

/// Builds a packed image from a declared tree.
pub struct ImageBuilder {
    root: DirNode,
}

impl ImageBuilder {
    pub fn new() -> Self {
        ImageBuilder {
            root: DirNode {
                name: String::new(),
                children: Vec::new(),
            },
        }
    }

    /// Ensure a directory exists, creating intermediate components.
    pub fn dir(&mut self, path: &str) -> &mut Self {
        Self::ensure_dir(&mut self.root, path);
        self
    }

    /// Add an uncompressed file, creating parent directories.
    pub fn file(&mut self, path: &str, data: &[u8]) -> &mut Self {
        self.add_file(
            path,
            FilePayload {
                stored: data.to_vec(),
                compression: COMP_NONE,
                real_sz: data.len() as u32,
                window_sz2: 0,
                lookahead_sz2: 0,
            },
        )
    }

    /// Add a DEFLATE-compressed file (raw stream, matching the packer).
    pub fn file_deflate(&mut self, path: &str, data: &[u8]) -> &mut Self {
        let mut enc = DeflateEncoder::new(Vec::new(), Compression::default());
        enc.write_all(data).unwrap();
        let stored = enc.finish().unwrap();
        self.add_file(
            path,
            FilePayload {
                stored,
                compression: COMP_DEFLATE,
                real_sz: data.len() as u32,
                window_sz2: 0,
                lookahead_sz2: 0,
            },
        )
    }

    /// Add a Heatshrink-compressed file.
    pub fn file_heatshrink(&mut self, path: &str, data: &[u8], w: u8, l: u8) -> &mut Self {
        self.add_file(
            path,
            FilePayload {
                stored: hs_encode(data, w, l),
                compression: COMP_HEATSHRINK,
                real_sz: data.len() as u32,
                window_sz2: w,
                lookahead_sz2: l,
            },
        )
    }

    /// Add a file with full control over the stored bytes and tags, for
    /// corruption and unknown-algorithm cases.
    pub fn file_stored(
        &mut self,
        path: &str,
        stored: &[u8],
        real_sz: u32,
        compression: u8,
    ) -> &mut Self {
        self.add_file(
            path,
            FilePayload {
                stored: stored.to_vec(),
                compression,
                real_sz,
                window_sz2: 8,
                lookahead_sz2: 4,
            },
        )
    }

    fn add_file(&mut self, path: &str, payload: FilePayload) -> &mut Self {
        let path = path.trim_matches('/');
        let (dir_path, name) = match path.rfind('/') {
            Some(i) => (&path[..i], &path[i + 1..]),
            None => ("", path),
        };
        let dir = Self::ensure_dir(&mut self.root, dir_path);
        dir.children.push(Node::File(FileNode {
            name: name.to_string(),
            stored: payload.stored,
            compression: payload.compression,
            real_sz: payload.real_sz,
            window_sz2: payload.window_sz2,
            lookahead_sz2: payload.lookahead_sz2,
        }));
        self
    }

    fn ensure_dir<'d>(mut cur: &'d mut DirNode, path: &str) -> &'d mut DirNode {
        let path = path.trim_matches('/');
        if path.is_empty() {
            return cur;
        }
        for seg in path.split('/') {
            let idx = cur.children.iter().position(|c| {
                matches!(c, Node::Dir(d) if d.name == seg)
            });
            let idx = match idx {
                Some(i) => i,
                None => {
                    cur.children.push(Node::Dir(DirNode {
                        name: seg.to_string(),
                        children: Vec::new(),
                    }));
                    cur.children.len() - 1
                }
            };
            cur = match &mut cur.children[idx] {
                Node::Dir(d) => d,
                Node::File(_) => panic!("path component is a file: {seg}"),
            };
        }
        cur
    }

    /// Serialize the tree into an image.
    pub fn build(&self) -> Vec<u8> {
        // Preorder flattening: (node, parent slot index, full path).
        let mut flat: Vec<Flat> = Vec::new();
        flatten(&self.root, usize::MAX, "", &mut flat);
        let num_entries = flat.len();

        // Assign record offsets.
        let mut cursor = HEADER_SIZE + num_entries * 8;
        for f in flat.iter_mut() {
            f.offset = cursor as u32;
            cursor += f.record_size();
        }

        // Payloads after the records.
        let mut payload_cursor = align4(cursor);
        for f in flat.iter_mut() {
            if let FlatKind::File {
                stored, data_offs, ..
            } = &mut f.kind
            {
                *data_offs = payload_cursor as u32;
                payload_cursor += stored.len();
                payload_cursor = align4(payload_cursor);
            }
        }
        let total = payload_cursor;

        let mut img = vec![0u8; total];

        // Header.
        img[0..4].copy_from_slice(&MAGIC.to_le_bytes());
        img[4] = VER_MAJOR;
        img[5] = VER_MINOR;
        img[8..12].copy_from_slice(&(num_entries as u32).to_le_bytes());
        img[12..16].copy_from_slice(&(total as u32).to_le_bytes());

        // Hash index, sorted ascending.
        let mut index: Vec<(u32, u32)> = flat
            .iter()
            .map(|f| (path_hash(&f.path), f.offset))
            .collect();
        index.sort_by_key(|&(hash, _)| hash);
        for (i, (hash, offs)) in index.iter().enumerate() {
            let at = HEADER_SIZE + i * 8;
            img[at..at + 4].copy_from_slice(&hash.to_le_bytes());
            img[at + 4..at + 8].copy_from_slice(&offs.to_le_bytes());
        }

        // Entry records and payloads.
        for f in flat.iter() {
            let at = f.offset as usize;
            let parent_offset = if f.parent == usize::MAX {
                0
            } else {
                flat[f.parent].offset
            };
            let name = f.name();
            img[at + 2..at + 4].copy_from_slice(&(name.len() as u16).to_le_bytes());
            img[at + 4..at + 8].copy_from_slice(&parent_offset.to_le_bytes());

            match &f.kind {
                FlatKind::Dir { children } => {
                    img[at] = 0;
                    img[at + 8..at + 12].copy_from_slice(&(children.len() as u32).to_le_bytes());
                    for (c, &child_idx) in children.iter().enumerate() {
                        let slot = at + 12 + c * 4;
                        img[slot..slot + 4]
                            .copy_from_slice(&flat[child_idx].offset.to_le_bytes());
                    }
                    let name_at = at + 12 + children.len() * 4;
                    img[name_at..name_at + name.len()].copy_from_slice(name.as_bytes());
                }
                FlatKind::File {
                    stored,
                    compression,
                    real_sz,
                    window_sz2,
                    lookahead_sz2,
                    data_offs,
                } => {
                    img[at] = 1;
                    img[at + 1] = *compression;
                    img[at + 8..at + 12].copy_from_slice(&(stored.len() as u32).to_le_bytes());
                    img[at + 12..at + 16].copy_from_slice(&data_offs.to_le_bytes());
                    let name_at = if *compression == COMP_NONE {
                        at + 16
                    } else {
                        img[at + 16..at + 20].copy_from_slice(&real_sz.to_le_bytes());
                        img[at + 20] = *window_sz2;
                        img[at + 21] = *lookahead_sz2;
                        at + 24
                    };
                    img[name_at..name_at + name.len()].copy_from_slice(name.as_bytes());

                    let d = *data_offs as usize;
                    img[d..d + stored.len()].copy_from_slice(stored);
                }
            }
        }

        img
    }
}

struct FilePayload {
    stored: Vec<u8>,
    compression: u8,
    real_sz: u32,
    window_sz2: u8,
    lookahead_sz2: u8,
}

enum FlatKind {
    Dir {
        children: Vec<usize>,
    },
    File {
        stored: Vec<u8>,
        compression: u8,
        real_sz: u32,
        window_sz2: u8,
        lookahead_sz2: u8,
        data_offs: u32,
    },
}

struct Flat {
    name: String,
    path: String,
    parent: usize,
    offset: u32,
    kind: FlatKind,
}

impl Flat {
    fn name(&self) -> &str {
        &self.name
    }

    fn record_size(&self) -> usize {
        let name_len = self.name.len() + 1;
        match &self.kind {
            FlatKind::Dir { children } => align4(12 + children.len() * 4 + name_len),
            FlatKind::File { compression, .. } => {
                if *compression == COMP_NONE {
                    align4(16 + name_len)
                } else {
                    align4(24 + name_len)
                }
            }
        }
    }
}

fn flatten(dir: &DirNode, parent: usize, prefix: &str, out: &mut Vec<Flat>) {
    let path = if prefix.is_empty() {
        dir.name.clone()
    } else {
        format!("{prefix}/{}", dir.name)
    };
    let my_index = out.len();
    out.push(Flat {
        name: dir.name.clone(),
        path: path.clone(),
        parent,
        offset: 0,
        kind: FlatKind::Dir {
            children: Vec::new(),
        },
    });

    let mut child_indices = Vec::new();
    for child in &dir.children {
        let child_index = out.len();
        child_indices.push(child_index);
        match child {
            Node::Dir(d) => flatten(d, my_index, &path, out),
            Node::File(f) => {
                let child_path = if path.is_empty() {
                    f.name.clone()
                } else {
                    format!("{path}/{}", f.name)
                };
                out.push(Flat {
                    name: f.name.clone(),
                    path: child_path,
                    parent: my_index,
                    offset: 0,
                    kind: FlatKind::File {
                        stored: f.stored.clone(),
                        compression: f.compression,
                        real_sz: f.real_sz,
                        window_sz2: f.window_sz2,
                        lookahead_sz2: f.lookahead_sz2,
                        data_offs: 0,
                    },
                });
            }
        }
    }

    if let FlatKind::Dir { children } = &mut out[my_index].kind {
        *children = child_indices;
    }
}

/// Minimal greedy Heatshrink encoder, enough to exercise the decoder's
/// literal and back-reference paths.
pub fn hs_encode(data: &[u8], window_sz2: u8, lookahead_sz2: u8) -> Vec<u8> {
    let mut bits = BitWriter::new();
    let window = 1usize << window_sz2;
    let max_len = 1usize << lookahead_sz2;
    let mut pos = 0usize;

    while pos < data.len() {
        let start = pos.saturating_sub(window);
        let mut best_len = 0usize;
        let mut best_dist = 0usize;
        for dist in 1..=(pos - start) {
            let src = pos - dist;
            let mut n = 0usize;
            while n < max_len && pos + n < data.len() && data[src + n] == data[pos + n] {
                n += 1;
            }
            if n > best_len {
                best_len = n;
                best_dist = dist;
            }
        }

        if best_len >= 3 {
            bits.bit(0);
            bits.bits((best_dist - 1) as u32, window_sz2);
            bits.bits((best_len - 1) as u32, lookahead_sz2);
            pos += best_len;
        } else {
            bits.bit(1);
            bits.bits(data[pos] as u32, 8);
            pos += 1;
        }
    }

    bits.finish()
}

struct BitWriter {
    bytes: Vec<u8>,
    cur: u8,
    used: u8,
}

impl BitWriter {
    fn new() -> Self {
        BitWriter {
            bytes: Vec::new(),
            cur: 0,
            used: 0,
        }
    }

    fn bit(&mut self, b: u32) {
        self.cur = (self.cur << 1) | (b & 1) as u8;
        self.used += 1;
        if self.used == 8 {
            self.bytes.push(self.cur);
            self.cur = 0;
            self.used = 0;
        }
    }

    fn bits(&mut self, value: u32, count: u8) {
        for i in (0..count).rev() {
            self.bit((value >> i) & 1);
        }
    }

    fn finish(mut self) -> Vec<u8> {
        if self.used > 0 {
            self.bytes.push(self.cur << (8 - self.used));
        }
        self.bytes
    }
}

/// Repetitive but non-trivial sample content for compression tests.
pub fn sample_text(len: usize) -> Vec<u8> {
    let phrase = b"the quick brown fox jumps over the lazy dog. ";
    phrase.iter().cycle().take(len).copied().collect()
}
