use crate::codec::errors::CodecError;
use crate::codec::{CHECKSUM_LEN, MAGIC, TAG_NODE, TAG_NONE, TAG_SOME, VERSION};
use crate::uast::{Node, Point, Position};
use bytes::Buf;
use std::collections::{BTreeMap, BTreeSet};
use xxhash_rust::xxh3::xxh3_64;

const HEADER_LEN: usize = 5;

/// Rebuild a tree from bytes produced by [`encode`](crate::codec::encode).
pub fn decode(data: &[u8]) -> Result<Node, CodecError> {
    if data.len() < MAGIC.len() || &data[..MAGIC.len()] != MAGIC {
        return Err(CodecError::BadMagic);
    }
    if data.len() < HEADER_LEN + CHECKSUM_LEN {
        return Err(CodecError::Truncated {
            offset: data.len(),
            needed: HEADER_LEN + CHECKSUM_LEN - data.len(),
        });
    }

    let version = data[MAGIC.len()];
    if version != VERSION {
        return Err(CodecError::UnsupportedVersion { version });
    }

    let (payload, mut trailer) = data.split_at(data.len() - CHECKSUM_LEN);
    let stored = trailer.get_u64_le();
    let computed = xxh3_64(payload);
    if stored != computed {
        return Err(CodecError::ChecksumMismatch { stored, computed });
    }

    let mut reader = TreeReader::new(&payload[HEADER_LEN..], HEADER_LEN);
    let root = reader.read_tree()?;

    if reader.buf.has_remaining() {
        return Err(CodecError::TrailingBytes {
            count: reader.buf.remaining(),
        });
    }

    Ok(root)
}

struct TreeReader<'a> {
    buf: &'a [u8],
    base: usize,
    len: usize,
}

impl<'a> TreeReader<'a> {
    fn new(buf: &'a [u8], base: usize) -> Self {
        Self {
            buf,
            base,
            len: buf.len(),
        }
    }

    fn offset(&self) -> usize {
        self.base + self.len - self.buf.remaining()
    }

    /// Read node records in pre-order, attaching each one to the nearest
    /// parent that still expects children.
    fn read_tree(&mut self) -> Result<Node, CodecError> {
        let mut open: Vec<(Node, u64)> = Vec::new();

        loop {
            let (mut node, child_count) = self.read_node()?;
            if child_count > 0 {
                open.push((node, child_count));
                continue;
            }

            loop {
                let Some((mut parent, remaining)) = open.pop() else {
                    return Ok(node);
                };
                parent.push_child(node);
                if remaining > 1 {
                    open.push((parent, remaining - 1));
                    break;
                }
                node = parent;
            }
        }
    }

    fn read_node(&mut self) -> Result<(Node, u64), CodecError> {
        let tag_offset = self.offset();
        let tag = self.read_u8()?;
        if tag != TAG_NODE {
            return Err(CodecError::UnknownTag {
                tag,
                offset: tag_offset,
            });
        }

        let kind_offset = self.offset();
        let kind = self.read_string()?;
        if kind.is_empty() {
            return Err(CodecError::EmptyKind {
                offset: kind_offset,
            });
        }

        let token = if self.read_presence()? {
            Some(self.read_string()?)
        } else {
            None
        };

        let properties_offset = self.offset();
        let property_count = self.read_varint()?;
        let mut properties = BTreeMap::new();
        let mut last_key: Option<String> = None;
        for _ in 0..property_count {
            let key = self.read_string()?;
            let value = self.read_string()?;
            if last_key.as_ref().is_some_and(|last| *last >= key) {
                return Err(CodecError::NonCanonical {
                    field: "property keys",
                    offset: properties_offset,
                });
            }
            last_key = Some(key.clone());
            properties.insert(key, value);
        }

        let roles_offset = self.offset();
        let role_count = self.read_varint()?;
        let mut roles = BTreeSet::new();
        for _ in 0..role_count {
            let role = self.read_string()?;
            if roles.last().is_some_and(|last: &String| *last >= role) {
                return Err(CodecError::NonCanonical {
                    field: "roles",
                    offset: roles_offset,
                });
            }
            roles.insert(role);
        }

        let position = if self.read_presence()? {
            let start = self.read_point()?;
            let end = self.read_point()?;
            Some(Position::new(start, end))
        } else {
            None
        };

        let child_count = self.read_varint()?;

        let node = Node::from_parts(kind, token, properties, roles, position, Vec::new())
            .map_err(|_| CodecError::EmptyKind {
                offset: kind_offset,
            })?;
        Ok((node, child_count))
    }

    fn read_presence(&mut self) -> Result<bool, CodecError> {
        let offset = self.offset();
        match self.read_u8()? {
            TAG_NONE => Ok(false),
            TAG_SOME => Ok(true),
            tag => Err(CodecError::UnknownTag { tag, offset }),
        }
    }

    fn read_point(&mut self) -> Result<Point, CodecError> {
        let line = self.read_u32()?;
        let column = self.read_u32()?;
        let offset = self.read_u32()?;
        Ok(Point::new(line, column, offset))
    }

    fn read_u32(&mut self) -> Result<u32, CodecError> {
        let offset = self.offset();
        let value = self.read_varint()?;
        u32::try_from(value).map_err(|_| CodecError::VarintOverflow { offset })
    }

    fn read_u8(&mut self) -> Result<u8, CodecError> {
        if !self.buf.has_remaining() {
            return Err(CodecError::Truncated {
                offset: self.offset(),
                needed: 1,
            });
        }
        Ok(self.buf.get_u8())
    }

    fn read_varint(&mut self) -> Result<u64, CodecError> {
        let offset = self.offset();
        let mut value = 0u64;
        let mut shift = 0u32;
        loop {
            let byte = self.read_u8()?;
            // The writer never ends a varint on an empty group.
            if byte == 0 && shift > 0 {
                return Err(CodecError::OverlongVarint { offset });
            }
            if shift == 63 && byte > 1 {
                return Err(CodecError::VarintOverflow { offset });
            }
            value |= u64::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
            if shift > 63 {
                return Err(CodecError::VarintOverflow { offset });
            }
        }
    }

    fn read_string(&mut self) -> Result<String, CodecError> {
        let length_offset = self.offset();
        let length = self.read_varint()?;
        if length > self.buf.remaining() as u64 {
            return Err(CodecError::LengthOutOfBounds {
                length,
                offset: length_offset,
            });
        }

        let length = length as usize;
        let offset = self.offset();
        let text = std::str::from_utf8(&self.buf[..length])
            .map_err(|_| CodecError::InvalidUtf8 { offset })?
            .to_string();
        self.buf.advance(length);
        Ok(text)
    }
}
