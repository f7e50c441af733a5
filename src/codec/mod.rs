//! Binary encoding of UAST trees.
//!
//! Encoded trees are opaque, self-describing byte strings that can be stored
//! and decoded again in another process. The layout is:
//!
//! ```text
//! "UAST" version:u8 node* checksum:u64le
//! node := 0x4E kind:str token:opt<str> props roles position:opt<6 x varint> children:varint
//! ```
//!
//! Nodes appear in pre-order, each followed by its children. Integers are
//! minimal LEB128 varints, strings are length-prefixed UTF-8, properties and
//! roles are written sorted. The reader rejects any other spelling, so every
//! accepted buffer re-encodes to itself. The trailing checksum is xxh3-64 over everything
//! before it.

pub mod errors;
pub mod reader;
pub mod writer;

pub use errors::CodecError;
pub use reader::decode;
pub use writer::encode;

pub(crate) const MAGIC: &[u8] = b"UAST";
pub(crate) const VERSION: u8 = 1;
pub(crate) const CHECKSUM_LEN: usize = 8;

pub(crate) const TAG_NONE: u8 = 0x00;
pub(crate) const TAG_SOME: u8 = 0x01;
pub(crate) const TAG_NODE: u8 = 0x4E;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uast::{Node, Point, Position};

    #[test]
    fn roundtrip_annotated_shape() {
        let pos = Position::new(Point::new(2, 1, 1), Point::new(4, 14, 40));
        let tree = Node::new("FunctionDefinition")
            .unwrap()
            .with_role("Function")
            .with_role("Declaration")
            .with_property("nativeKind", "function_definition")
            .with_position(pos)
            .with_child(
                Node::new("Identifier")
                    .unwrap()
                    .with_token("sum")
                    .with_role("Identifier")
                    .with_property("internalRole", "name"),
            )
            .with_child(Node::new("Parameters").unwrap());

        let decoded = decode(&encode(&tree)).unwrap();
        assert_eq!(decoded, tree);
        assert_eq!(decoded.children()[0].token(), Some("sum"));
    }

    #[test]
    fn roundtrip_deep_chain() {
        let mut tree = Node::new("Leaf").unwrap().with_token("x");
        for depth in 0..100_000u32 {
            tree = Node::new("Wrap")
                .unwrap()
                .with_property("depth", depth.to_string())
                .with_child(tree);
        }

        let bytes = encode(&tree);
        let decoded = decode(&bytes).unwrap();
        assert!(decoded == tree);
        assert_eq!(encode(&decoded), bytes);
    }

    #[test]
    fn unicode_strings_survive() {
        let tree = Node::new("Str").unwrap().with_token("héllo wörld ✓");
        assert_eq!(decode(&encode(&tree)).unwrap(), tree);
    }
}
