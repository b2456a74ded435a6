use crate::tag::{CompoundTag, ListTag, Tag};

/// Prints a tag as compact SNBT, no newlines or indentation.
pub fn to_snbt(tag: &Tag) -> String {
    Printer::new("").print(tag)
}

/// Prints a tag as indented SNBT, two spaces per nesting level.
pub fn to_snbt_pretty(tag: &Tag) -> String {
    Printer::new("  ").print(tag)
}

struct Printer {
    indent: &'static str,
    depth: usize,
    out: String,
}

impl Printer {
    fn new(indent: &'static str) -> Self {
        Self {
            indent,
            depth: 0,
            out: String::new(),
        }
    }

    fn pretty(&self) -> bool {
        !self.indent.is_empty()
    }

    fn print(mut self, tag: &Tag) -> String {
        self.write_tag(tag);
        self.out
    }

    fn write_tag(&mut self, tag: &Tag) {
        match tag {
            Tag::End => {}
            Tag::Byte(v) => self.out.push_str(&format!("{v}b")),
            Tag::Short(v) => self.out.push_str(&format!("{v}s")),
            Tag::Int(v) => self.out.push_str(&format!("{v}")),
            Tag::Long(v) => self.out.push_str(&format!("{v}L")),
            Tag::Float(v) => {
                self.out.push_str(&float_body(f64::from(*v)));
                self.out.push('f');
            }
            Tag::Double(v) => {
                self.out.push_str(&float_body(*v));
                self.out.push('d');
            }
            Tag::String(v) => self.out.push_str(&quote_and_escape(v)),
            Tag::ByteArray(v) => self.write_array("B", v.iter().map(|b| format!("{b}b"))),
            Tag::IntArray(v) => self.write_array("I", v.iter().map(|i| format!("{i}"))),
            Tag::LongArray(v) => self.write_array("L", v.iter().map(|l| format!("{l}L"))),
            Tag::List(list) => self.write_list(list),
            Tag::Compound(compound) => self.write_compound(compound),
        }
    }

    fn write_array(&mut self, prefix: &str, items: impl Iterator<Item = String>) {
        self.out.push('[');
        self.out.push_str(prefix);
        self.out.push(';');
        for (i, item) in items.enumerate() {
            if i > 0 {
                self.out.push(',');
            }
            if self.pretty() {
                self.out.push(' ');
            }
            self.out.push_str(&item);
        }
        self.out.push(']');
    }

    fn write_list(&mut self, list: &ListTag) {
        if list.is_empty() {
            self.out.push_str("[]");
            return;
        }

        self.out.push('[');
        self.depth += 1;
        for (i, item) in list.iter().enumerate() {
            if i > 0 {
                self.out.push(',');
            }
            self.newline_indent();
            self.write_tag(item);
        }
        self.depth -= 1;
        self.newline_indent();
        self.out.push(']');
    }

    fn write_compound(&mut self, compound: &CompoundTag) {
        if compound.is_empty() {
            self.out.push_str("{}");
            return;
        }

        self.out.push('{');
        self.depth += 1;
        // CompoundTag iterates in sorted key order, so emission is stable.
        for (i, (key, value)) in compound.iter().enumerate() {
            if i > 0 {
                self.out.push(',');
            }
            self.newline_indent();
            if is_bare_key(key) {
                self.out.push_str(key);
            } else {
                self.out.push_str(&quote_and_escape(key));
            }
            self.out.push(':');
            if self.pretty() {
                self.out.push(' ');
            }
            self.write_tag(value);
        }
        self.depth -= 1;
        self.newline_indent();
        self.out.push('}');
    }

    fn newline_indent(&mut self) {
        if self.pretty() {
            self.out.push('\n');
            for _ in 0..self.depth {
                self.out.push_str(self.indent);
            }
        }
    }
}

/// Rust formats non-finite floats as `NaN`/`inf`; the text grammar spells
/// infinity out, so the suffixed literal parses back to the same tag type.
fn float_body(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v == f64::INFINITY {
        "Infinity".to_string()
    } else if v == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else {
        format!("{v}")
    }
}

fn is_bare_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '+' | '-'))
}

fn quote_and_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        if ch == '"' || ch == '\\' {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::super::from_snbt;
    use super::*;
    use crate::tag::CompoundTag;

    fn sample() -> Tag {
        from_snbt(
            r#"{plain:1, long:9L, text:"with \"quotes\"", "weird key!":2b,
               bytes:[B; 1b, -2b], list:[{x:1},{x:2}], empty:{}}"#,
        )
        .map(Tag::Compound)
        .unwrap()
    }

    #[test]
    fn compact_round_trips() {
        let tag = sample();
        let compact = to_snbt(&tag);
        assert!(!compact.contains('\n'));
        assert_eq!(Tag::Compound(from_snbt(&compact).unwrap()), tag);
    }

    #[test]
    fn pretty_round_trips() {
        let tag = sample();
        let pretty = to_snbt_pretty(&tag);
        assert!(pretty.contains("\n  "));
        assert_eq!(Tag::Compound(from_snbt(&pretty).unwrap()), tag);
    }

    #[test]
    fn canonical_suffixes() {
        let tag = from_snbt("{b:1b, s:2s, i:3, l:4L, f:1.5f, d:2.5d}").unwrap();
        let out = to_snbt(&Tag::Compound(tag));
        assert_eq!(out, "{b:1b,d:2.5d,f:1.5f,i:3,l:4L,s:2s}");
    }

    #[test]
    fn non_finite_floats_keep_their_type() {
        let mut compound = CompoundTag::new();
        compound.put("nan", Tag::Float(f32::NAN));
        compound.put("pos", Tag::Double(f64::INFINITY));
        compound.put("neg", Tag::Double(f64::NEG_INFINITY));

        let out = to_snbt(&Tag::Compound(compound));
        assert!(out.contains("nan:NaNf"));
        assert!(out.contains("pos:Infinityd"));
        assert!(out.contains("neg:-Infinityd"));

        let parsed = from_snbt(&out).unwrap();
        assert!(parsed.get_float("nan").unwrap().is_nan());
        assert_eq!(parsed.get_double("pos"), Some(f64::INFINITY));
        assert_eq!(parsed.get_double("neg"), Some(f64::NEG_INFINITY));
        // Without a float suffix the token is still an ordinary string.
        assert_eq!(
            from_snbt("{w:NaN}").unwrap().get_string("w"),
            Some("NaN")
        );
    }

    #[test]
    fn non_bare_keys_are_quoted() {
        let mut compound = CompoundTag::new();
        compound.put("has space", Tag::Int(1));
        compound.put("bare-key.ok", Tag::Int(2));
        let out = to_snbt(&Tag::Compound(compound));
        assert!(out.contains(r#""has space":1"#));
        assert!(out.contains("bare-key.ok:2"));
    }
}
