use std::collections::BTreeMap;
use std::fmt;

use crate::error::{NbtError, Result};

/// Numeric type id of an NBT tag, as it appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum TagId {
    End = 0,
    Byte = 1,
    Short = 2,
    Int = 3,
    Long = 4,
    Float = 5,
    Double = 6,
    ByteArray = 7,
    String = 8,
    List = 9,
    Compound = 10,
    IntArray = 11,
    LongArray = 12,
}

impl TagId {
    pub fn from_u8(id: u8) -> Result<Self> {
        Ok(match id {
            0 => TagId::End,
            1 => TagId::Byte,
            2 => TagId::Short,
            3 => TagId::Int,
            4 => TagId::Long,
            5 => TagId::Float,
            6 => TagId::Double,
            7 => TagId::ByteArray,
            8 => TagId::String,
            9 => TagId::List,
            10 => TagId::Compound,
            11 => TagId::IntArray,
            12 => TagId::LongArray,
            other => return Err(NbtError::InvalidTagId(other)),
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            TagId::End => "TAG_End",
            TagId::Byte => "TAG_Byte",
            TagId::Short => "TAG_Short",
            TagId::Int => "TAG_Int",
            TagId::Long => "TAG_Long",
            TagId::Float => "TAG_Float",
            TagId::Double => "TAG_Double",
            TagId::ByteArray => "TAG_Byte_Array",
            TagId::String => "TAG_String",
            TagId::List => "TAG_List",
            TagId::Compound => "TAG_Compound",
            TagId::IntArray => "TAG_Int_Array",
            TagId::LongArray => "TAG_Long_Array",
        }
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Default for TagId {
    fn default() -> Self {
        TagId::End
    }
}

/// A single NBT value. The tree is owned and acyclic; `clone` is a deep copy.
///
/// `End` is the zero-payload sentinel terminating a compound's binary
/// encoding. It never appears as a value inside a well-formed tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    End,
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    String(String),
    List(ListTag),
    Compound(CompoundTag),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

impl Tag {
    pub fn id(&self) -> TagId {
        match self {
            Tag::End => TagId::End,
            Tag::Byte(_) => TagId::Byte,
            Tag::Short(_) => TagId::Short,
            Tag::Int(_) => TagId::Int,
            Tag::Long(_) => TagId::Long,
            Tag::Float(_) => TagId::Float,
            Tag::Double(_) => TagId::Double,
            Tag::ByteArray(_) => TagId::ByteArray,
            Tag::String(_) => TagId::String,
            Tag::List(_) => TagId::List,
            Tag::Compound(_) => TagId::Compound,
            Tag::IntArray(_) => TagId::IntArray,
            Tag::LongArray(_) => TagId::LongArray,
        }
    }

    pub fn as_compound(&self) -> Option<&CompoundTag> {
        match self {
            Tag::Compound(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&ListTag> {
        match self {
            Tag::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            Tag::String(s) => Some(s),
            _ => None,
        }
    }
}

/// A homogeneous list of tags. Every element matches `element`, which stays
/// at the `End` sentinel until the first push commits the list to a type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListTag {
    element: TagId,
    items: Vec<Tag>,
}

impl ListTag {
    pub fn new() -> Self {
        Self {
            element: TagId::End,
            items: Vec::new(),
        }
    }

    /// Creates an empty list already committed to an element type.
    pub fn with_element(element: TagId) -> Self {
        Self {
            element,
            items: Vec::new(),
        }
    }

    pub fn element(&self) -> TagId {
        self.element
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Tag> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tag> {
        self.items.iter()
    }

    /// Appends a tag, committing the list to that tag's type on first push.
    pub fn try_push(&mut self, tag: Tag) -> Result<()> {
        if self.element == TagId::End {
            self.element = tag.id();
        } else if tag.id() != self.element {
            return Err(NbtError::ListTypeMismatch {
                expected: self.element,
                found: tag.id(),
            });
        }
        self.items.push(tag);
        Ok(())
    }
}

impl<'a> IntoIterator for &'a ListTag {
    type Item = &'a Tag;
    type IntoIter = std::slice::Iter<'a, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// A name -> tag mapping with unique keys. Insertion is last-write-wins; the
/// map is unordered semantically, iteration order is sorted by key.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompoundTag {
    entries: BTreeMap<String, Tag>,
}

impl CompoundTag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn put(&mut self, key: impl Into<String>, tag: Tag) {
        self.entries.insert(key.into(), tag);
    }

    pub fn get(&self, key: &str) -> Option<&Tag> {
        self.entries.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Tag> {
        self.entries.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> std::collections::btree_map::Iter<'_, String, Tag> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn get_byte(&self, key: &str) -> Option<i8> {
        match self.get(key) {
            Some(Tag::Byte(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_short(&self, key: &str) -> Option<i16> {
        match self.get(key) {
            Some(Tag::Short(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_int(&self, key: &str) -> Option<i32> {
        match self.get(key) {
            Some(Tag::Int(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_long(&self, key: &str) -> Option<i64> {
        match self.get(key) {
            Some(Tag::Long(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_float(&self, key: &str) -> Option<f32> {
        match self.get(key) {
            Some(Tag::Float(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_double(&self, key: &str) -> Option<f64> {
        match self.get(key) {
            Some(Tag::Double(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        match self.get(key) {
            Some(Tag::String(v)) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn get_byte_array(&self, key: &str) -> Option<&[i8]> {
        match self.get(key) {
            Some(Tag::ByteArray(v)) => Some(v.as_slice()),
            _ => None,
        }
    }

    pub fn get_int_array(&self, key: &str) -> Option<&[i32]> {
        match self.get(key) {
            Some(Tag::IntArray(v)) => Some(v.as_slice()),
            _ => None,
        }
    }

    pub fn get_long_array(&self, key: &str) -> Option<&[i64]> {
        match self.get(key) {
            Some(Tag::LongArray(v)) => Some(v.as_slice()),
            _ => None,
        }
    }

    pub fn get_list(&self, key: &str) -> Option<&ListTag> {
        match self.get(key) {
            Some(Tag::List(v)) => Some(v),
            _ => None,
        }
    }

    pub fn get_compound(&self, key: &str) -> Option<&CompoundTag> {
        match self.get(key) {
            Some(Tag::Compound(v)) => Some(v),
            _ => None,
        }
    }
}

/// A (name, tag) pair used as a serialization root. The name is usually
/// empty for inner roots and non-empty for a top-level file root.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedTag {
    pub name: String,
    pub tag: Tag,
}

impl NamedTag {
    pub fn new(name: impl Into<String>, tag: Tag) -> Self {
        Self {
            name: name.into(),
            tag,
        }
    }
}
