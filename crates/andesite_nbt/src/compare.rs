//! Structural and partial comparison of NBT trees.

use crate::tag::Tag;

/// Compares two tags. With `partial` set, `a` is checked for containment in
/// `b`: every key of a candidate compound must exist in the reference with a
/// partially-equal value (extra reference keys are ignored), and every
/// element of a candidate list must partially match at least one reference
/// element, order-independent.
pub fn compare(a: &Tag, b: &Tag, partial: bool) -> bool {
    if a.id() != b.id() {
        return false;
    }

    match (a, b) {
        (Tag::End, Tag::End) => true,
        (Tag::Byte(x), Tag::Byte(y)) => x == y,
        (Tag::Short(x), Tag::Short(y)) => x == y,
        (Tag::Int(x), Tag::Int(y)) => x == y,
        (Tag::Long(x), Tag::Long(y)) => x == y,
        (Tag::Float(x), Tag::Float(y)) => x == y,
        (Tag::Double(x), Tag::Double(y)) => x == y,
        (Tag::String(x), Tag::String(y)) => x == y,
        (Tag::ByteArray(x), Tag::ByteArray(y)) => x == y,
        (Tag::IntArray(x), Tag::IntArray(y)) => x == y,
        (Tag::LongArray(x), Tag::LongArray(y)) => x == y,
        (Tag::List(x), Tag::List(y)) => {
            if x.element() != y.element() {
                return false;
            }
            if partial {
                x.iter().all(|ea| y.iter().any(|eb| compare(ea, eb, true)))
            } else {
                x.len() == y.len()
                    && x.iter().zip(y.iter()).all(|(ea, eb)| compare(ea, eb, false))
            }
        }
        (Tag::Compound(x), Tag::Compound(y)) => {
            if !partial && x.len() != y.len() {
                return false;
            }
            x.iter().all(|(key, va)| match y.get(key) {
                Some(vb) => compare(va, vb, partial),
                None => false,
            })
        }
        _ => false,
    }
}
