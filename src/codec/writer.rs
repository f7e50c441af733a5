use crate::codec::{MAGIC, TAG_NODE, TAG_NONE, TAG_SOME, VERSION};
use crate::uast::{Node, Point};
use bytes::{BufMut, BytesMut};
use xxhash_rust::xxh3::xxh3_64;

/// Serialize a tree into its self-describing byte form.
///
/// Output depends only on the tree's structure: structurally equal trees
/// always produce identical bytes.
pub fn encode(root: &Node) -> Vec<u8> {
    let mut writer = TreeWriter::new();
    writer.write_header();

    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        writer.write_node(node);
        stack.extend(node.children().iter().rev());
    }

    writer.finish()
}

struct TreeWriter {
    buffer: BytesMut,
}

impl TreeWriter {
    fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(4 * 1024),
        }
    }

    fn write_header(&mut self) {
        self.buffer.extend_from_slice(MAGIC);
        self.buffer.put_u8(VERSION);
    }

    /// Write one node record; its children follow in pre-order.
    fn write_node(&mut self, node: &Node) {
        self.buffer.put_u8(TAG_NODE);
        self.write_string(node.kind());

        match node.token() {
            Some(token) => {
                self.buffer.put_u8(TAG_SOME);
                self.write_string(token);
            }
            None => self.buffer.put_u8(TAG_NONE),
        }

        self.write_varint(node.properties().len() as u64);
        for (key, value) in node.properties() {
            self.write_string(key);
            self.write_string(value);
        }

        self.write_varint(node.roles().len() as u64);
        for role in node.roles() {
            self.write_string(role);
        }

        match node.position() {
            Some(position) => {
                self.buffer.put_u8(TAG_SOME);
                self.write_point(&position.start);
                self.write_point(&position.end);
            }
            None => self.buffer.put_u8(TAG_NONE),
        }

        self.write_varint(node.children().len() as u64);
    }

    fn write_point(&mut self, point: &Point) {
        self.write_varint(point.line as u64);
        self.write_varint(point.column as u64);
        self.write_varint(point.offset as u64);
    }

    fn write_string(&mut self, s: &str) {
        self.write_varint(s.len() as u64);
        self.buffer.extend_from_slice(s.as_bytes());
    }

    fn write_varint(&mut self, mut value: u64) {
        while value >= 0x80 {
            self.buffer.put_u8((value as u8 & 0x7F) | 0x80);
            value >>= 7;
        }
        self.buffer.put_u8(value as u8);
    }

    fn finish(mut self) -> Vec<u8> {
        let checksum = xxh3_64(&self.buffer);
        self.buffer.put_u64_le(checksum);
        self.buffer.to_vec()
    }
}
