//! Named Binary Tag engine for Andesite.
//!
//! Provides the 12-variant tag model, the Java-compatible binary codec
//! (Modified UTF-8 strings, optional gzip), the SNBT text form with compact
//! and pretty printers, structural/partial tree comparison, and the
//! structure-template palette transform.

pub mod binary;
pub mod compare;
mod error;
pub mod mutf8;
pub mod snbt;
pub mod structure;
mod tag;

pub use binary::{read_gzipped, read_named, write_gzipped, write_named};
pub use compare::compare;
pub use error::{NbtError, Result, SnbtError, SnbtResult};
pub use snbt::{from_snbt, to_snbt, to_snbt_pretty};
pub use structure::{
    pack_structure_template, snbt_to_structure, structure_to_snbt, unpack_structure_template,
};
pub use tag::{CompoundTag, ListTag, NamedTag, Tag, TagId};

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn binary_and_snbt_agree() {
        let source = r#"{level:{seed:9024156L, name:"overworld", rules:[B; 1b, 0b]}}"#;
        let tag = from_snbt(source).unwrap();

        let mut buf = Vec::new();
        write_named(&mut buf, &NamedTag::new("root", Tag::Compound(tag.clone()))).unwrap();
        let decoded = read_named(&mut Cursor::new(buf)).unwrap();

        assert_eq!(decoded.name, "root");
        let reparsed = from_snbt(&to_snbt(&decoded.tag)).unwrap();
        assert_eq!(Tag::Compound(reparsed), Tag::Compound(tag));
    }
}
