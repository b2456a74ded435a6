use crate::error::{SnbtError, SnbtResult};
use crate::tag::{CompoundTag, ListTag, Tag, TagId};

/// Parses an SNBT document. The top-level value must be a compound and the
/// whole input must be consumed (trailing data is an error).
pub fn from_snbt(input: &str) -> SnbtResult<CompoundTag> {
    let mut p = Parser::new(input);
    let value = p.parse_value(TagId::End)?;
    p.skip_whitespace();
    if p.has_more() {
        return Err(p.error("trailing data after top-level tag"));
    }
    match value {
        Tag::Compound(compound) => Ok(compound),
        other => Err(SnbtError::new(
            format!("expected compound at top level, found {}", other.id()),
            0,
        )),
    }
}

struct Parser<'a> {
    input: &'a str,
    cursor: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, cursor: 0 }
    }

    fn error(&self, message: impl Into<String>) -> SnbtError {
        SnbtError::new(message, self.cursor)
    }

    fn has_more(&self) -> bool {
        self.cursor < self.input.len()
    }

    fn peek(&self) -> Option<char> {
        self.input[self.cursor..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.cursor += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if !ch.is_whitespace() {
                break;
            }
            self.cursor += ch.len_utf8();
        }
    }

    fn expect(&mut self, expected: char) -> SnbtResult<()> {
        self.skip_whitespace();
        if self.peek() != Some(expected) {
            return Err(self.error(format!("expected '{expected}'")));
        }
        self.cursor += expected.len_utf8();
        Ok(())
    }

    /// Parses one value. `context` carries the element type a surrounding
    /// typed array or committed list imposes on bare numeric tokens.
    fn parse_value(&mut self, context: TagId) -> SnbtResult<Tag> {
        self.skip_whitespace();
        match self.peek() {
            None => Err(self.error("expected value")),
            Some('{') => Ok(Tag::Compound(self.parse_compound()?)),
            Some('[') => self.parse_list_or_array(),
            Some('"') | Some('\'') => Ok(Tag::String(self.parse_quoted_string()?)),
            Some(_) => self.parse_scalar(context),
        }
    }

    fn parse_compound(&mut self) -> SnbtResult<CompoundTag> {
        self.expect('{')?;
        let mut compound = CompoundTag::new();
        self.skip_whitespace();
        if self.peek() == Some('}') {
            self.cursor += 1;
            return Ok(compound);
        }

        loop {
            let key = self.parse_key()?;
            self.expect(':')?;
            let value = self.parse_value(TagId::End)?;
            compound.put(key, value);

            self.skip_whitespace();
            if self.peek() != Some(',') {
                break;
            }
            self.cursor += 1;
            self.skip_whitespace();
            if self.peek() == Some('}') {
                return Err(self.error("trailing comma in compound"));
            }
        }

        self.expect('}')?;
        Ok(compound)
    }

    fn parse_key(&mut self) -> SnbtResult<String> {
        self.skip_whitespace();
        match self.peek() {
            Some('"') | Some('\'') => self.parse_quoted_string(),
            _ => {
                let token = self.take_unquoted_token();
                if token.is_empty() {
                    Err(self.error("expected key"))
                } else {
                    Ok(token.to_string())
                }
            }
        }
    }

    fn parse_list_or_array(&mut self) -> SnbtResult<Tag> {
        self.expect('[')?;
        self.skip_whitespace();

        // [B; ...], [I; ...] and [L; ...] are typed arrays, not lists.
        let rest = self.input[self.cursor..].as_bytes();
        if rest.len() >= 2 && rest[1] == b';' {
            match rest[0] {
                b'B' => return self.parse_typed_array(TagId::Byte),
                b'I' => return self.parse_typed_array(TagId::Int),
                b'L' => return self.parse_typed_array(TagId::Long),
                _ => {}
            }
        }

        self.parse_list()
    }

    fn parse_list(&mut self) -> SnbtResult<Tag> {
        let mut list = ListTag::new();
        self.skip_whitespace();
        if self.peek() == Some(']') {
            self.cursor += 1;
            return Ok(Tag::List(list));
        }

        loop {
            // A list that committed to byte/short/long/float types its
            // subsequent bare numeric elements.
            let context = match list.element() {
                TagId::Byte | TagId::Short | TagId::Long | TagId::Float => list.element(),
                _ => TagId::End,
            };
            let value = self.parse_value(context)?;
            let offset = self.cursor;
            list.try_push(value)
                .map_err(|e| SnbtError::new(e.to_string(), offset))?;

            self.skip_whitespace();
            if self.peek() != Some(',') {
                break;
            }
            self.cursor += 1;
            self.skip_whitespace();
            if self.peek() == Some(']') {
                return Err(self.error("trailing comma in list"));
            }
        }

        self.expect(']')?;
        Ok(Tag::List(list))
    }

    fn parse_typed_array(&mut self, element: TagId) -> SnbtResult<Tag> {
        self.cursor += 2; // prefix letter and ';'
        let mut bytes = Vec::new();
        let mut ints = Vec::new();
        let mut longs = Vec::new();

        self.skip_whitespace();
        if self.peek() == Some(']') {
            self.cursor += 1;
            return Ok(Self::finish_array(element, bytes, ints, longs));
        }

        loop {
            let tag = self.parse_number(element)?;
            match tag {
                Tag::Byte(v) => bytes.push(v),
                Tag::Int(v) => ints.push(v),
                Tag::Long(v) => longs.push(v),
                other => {
                    return Err(self.error(format!(
                        "array of {} cannot hold {}",
                        element,
                        other.id()
                    )))
                }
            }

            self.skip_whitespace();
            if self.peek() != Some(',') {
                break;
            }
            self.cursor += 1;
            self.skip_whitespace();
            if self.peek() == Some(']') {
                return Err(self.error("trailing comma in array"));
            }
        }

        self.expect(']')?;
        Ok(Self::finish_array(element, bytes, ints, longs))
    }

    fn finish_array(element: TagId, bytes: Vec<i8>, ints: Vec<i32>, longs: Vec<i64>) -> Tag {
        match element {
            TagId::Byte => Tag::ByteArray(bytes),
            TagId::Long => Tag::LongArray(longs),
            _ => Tag::IntArray(ints),
        }
    }

    fn parse_quoted_string(&mut self) -> SnbtResult<String> {
        self.skip_whitespace();
        let quote = self.bump().filter(|c| *c == '"' || *c == '\'');
        let Some(quote) = quote else {
            return Err(self.error("expected quote"));
        };

        let mut out = String::new();
        let mut escaped = false;
        while let Some(ch) = self.bump() {
            if escaped {
                out.push(ch);
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == quote {
                return Ok(out);
            } else {
                out.push(ch);
            }
        }
        Err(self.error("unterminated string"))
    }

    fn take_unquoted_token(&mut self) -> &'a str {
        let start = self.cursor;
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.' | '+' | '-') {
                self.cursor += ch.len_utf8();
            } else {
                break;
            }
        }
        &self.input[start..self.cursor]
    }

    /// Parses an unquoted token: boolean constant, number, or bare string.
    fn parse_scalar(&mut self, context: TagId) -> SnbtResult<Tag> {
        self.skip_whitespace();
        let token = self.take_unquoted_token();
        if token.is_empty() {
            return Err(self.error("expected value"));
        }
        if token.eq_ignore_ascii_case("true") {
            return Ok(Tag::Byte(1));
        }
        if token.eq_ignore_ascii_case("false") {
            return Ok(Tag::Byte(0));
        }
        match number_from_token(token, context) {
            Some(tag) => Ok(tag),
            // Anything that is neither boolean nor numeric is a bare string.
            None => Ok(Tag::String(token.to_string())),
        }
    }

    /// Parses a token that must be a number (typed-array elements).
    fn parse_number(&mut self, context: TagId) -> SnbtResult<Tag> {
        self.skip_whitespace();
        let token = self.take_unquoted_token();
        if token.is_empty() {
            return Err(self.error("expected a number"));
        }
        number_from_token(token, context).ok_or_else(|| self.error("expected a number"))
    }
}

/// Classifies an unquoted token against the numeric grammar:
/// sign? digits ('.' digits?)? exponent? suffix?. Returns `None` when the
/// token does not fully match.
fn number_from_token(token: &str, context: TagId) -> Option<Tag> {
    let (body, suffix) = split_suffix(token);
    if let Some(tag) = nonfinite_from_token(body, suffix) {
        return Some(tag);
    }
    if !matches_number_body(body) {
        return None;
    }
    let fractional = body.contains(['.', 'e', 'E']);

    match suffix {
        Some('b') => body.parse::<i8>().ok().map(Tag::Byte),
        Some('s') => body.parse::<i16>().ok().map(Tag::Short),
        Some('l') => body.parse::<i64>().ok().map(Tag::Long),
        Some('f') => body.parse::<f32>().ok().map(Tag::Float),
        Some('d') => body.parse::<f64>().ok().map(Tag::Double),
        Some(_) => None,
        None if fractional => {
            if context == TagId::Float {
                body.parse::<f32>().ok().map(Tag::Float)
            } else {
                body.parse::<f64>().ok().map(Tag::Double)
            }
        }
        None => match context {
            TagId::Byte => body.parse::<i8>().ok().map(Tag::Byte),
            TagId::Short => body.parse::<i16>().ok().map(Tag::Short),
            TagId::Long => body.parse::<i64>().ok().map(Tag::Long),
            TagId::Float => body.parse::<f32>().ok().map(Tag::Float),
            _ => body.parse::<i32>().ok().map(Tag::Int),
        },
    }
}

/// `NaNf`, `Infinityd` and friends. The float suffix is required so a bare
/// `NaN` token keeps its historical reading as a plain string.
fn nonfinite_from_token(body: &str, suffix: Option<char>) -> Option<Tag> {
    let (sign, word) = match body.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, body.strip_prefix('+').unwrap_or(body)),
    };
    let value = match word {
        "NaN" => f64::NAN,
        "Infinity" => sign * f64::INFINITY,
        _ => return None,
    };
    match suffix {
        Some('f') => Some(Tag::Float(value as f32)),
        Some('d') => Some(Tag::Double(value)),
        _ => None,
    }
}

fn split_suffix(token: &str) -> (&str, Option<char>) {
    match token.chars().last() {
        Some(last) if matches!(last.to_ascii_lowercase(), 'b' | 's' | 'l' | 'f' | 'd') => (
            &token[..token.len() - 1],
            Some(last.to_ascii_lowercase()),
        ),
        _ => (token, None),
    }
}

fn matches_number_body(body: &str) -> bool {
    let mut chars = body.chars().peekable();
    if matches!(chars.peek(), Some('+') | Some('-')) {
        chars.next();
    }

    let mut int_digits = 0;
    while chars.peek().is_some_and(|c| c.is_ascii_digit()) {
        chars.next();
        int_digits += 1;
    }

    let mut frac_digits = 0;
    if chars.peek() == Some(&'.') {
        chars.next();
        while chars.peek().is_some_and(|c| c.is_ascii_digit()) {
            chars.next();
            frac_digits += 1;
        }
    }

    if int_digits == 0 && frac_digits == 0 {
        return false;
    }

    if matches!(chars.peek(), Some('e') | Some('E')) {
        chars.next();
        if matches!(chars.peek(), Some('+') | Some('-')) {
            chars.next();
        }
        let mut exp_digits = 0;
        while chars.peek().is_some_and(|c| c.is_ascii_digit()) {
            chars.next();
            exp_digits += 1;
        }
        if exp_digits == 0 {
            return false;
        }
    }

    chars.next().is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_suffixes_select_types() {
        let tag = from_snbt("{b:1b, s:2S, i:3, l:4l, f:1.5F, d:2.5d, bare:0.5, e:1e3}").unwrap();
        assert_eq!(tag.get_byte("b"), Some(1));
        assert_eq!(tag.get_short("s"), Some(2));
        assert_eq!(tag.get_int("i"), Some(3));
        assert_eq!(tag.get_long("l"), Some(4));
        assert_eq!(tag.get_float("f"), Some(1.5));
        assert_eq!(tag.get_double("d"), Some(2.5));
        assert_eq!(tag.get_double("bare"), Some(0.5));
        assert_eq!(tag.get_double("e"), Some(1000.0));
    }

    #[test]
    fn booleans_are_case_insensitive_bytes() {
        let tag = from_snbt("{t:true, f:FALSE}").unwrap();
        assert_eq!(tag.get_byte("t"), Some(1));
        assert_eq!(tag.get_byte("f"), Some(0));
    }

    #[test]
    fn non_numeric_token_is_a_string() {
        let tag = from_snbt("{id:minecraft.stone, ver:1.2.3}").unwrap();
        assert_eq!(tag.get_string("id"), Some("minecraft.stone"));
        // Two dots fail the numeric grammar, so this stays a string.
        assert_eq!(tag.get_string("ver"), Some("1.2.3"));
    }

    #[test]
    fn committed_list_types_bare_elements() {
        let tag = from_snbt("{l:[1b, 2, 3]}").unwrap();
        let list = tag.get_list("l").unwrap();
        assert_eq!(list.element(), TagId::Byte);
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn typed_arrays_parse() {
        let tag = from_snbt("{b:[B; 1b, 2b], i:[I; -1, 7], l:[L; 5L], empty:[B;]}").unwrap();
        assert_eq!(tag.get_byte_array("b"), Some(&[1i8, 2][..]));
        assert_eq!(tag.get_int_array("i"), Some(&[-1, 7][..]));
        assert_eq!(tag.get_long_array("l"), Some(&[5i64][..]));
        assert_eq!(tag.get_byte_array("empty"), Some(&[][..]));
    }

    #[test]
    fn quoted_strings_support_both_quotes_and_escapes() {
        let tag = from_snbt(r#"{a:"say \"hi\"", b:'back\\slash'}"#).unwrap();
        assert_eq!(tag.get_string("a"), Some(r#"say "hi""#));
        assert_eq!(tag.get_string("b"), Some(r"back\slash"));
    }

    #[test]
    fn mixed_list_types_fail_with_offset() {
        let err = from_snbt("{l:[1b, 2s]}").unwrap_err();
        assert!(err.offset > 0);
        assert!(err.message.contains("mismatch"));
    }

    #[test]
    fn trailing_comma_is_an_error() {
        assert!(from_snbt("{a:1,}").is_err());
        assert!(from_snbt("{l:[1,]}").is_err());
        assert!(from_snbt("{l:[B;1b,]}").is_err());
    }

    #[test]
    fn structural_errors_are_reported() {
        assert!(from_snbt("{a:1").is_err()); // unclosed compound
        assert!(from_snbt(r#"{a:"unterminated}"#).is_err());
        assert!(from_snbt("{a:1} extra").is_err());
        assert!(from_snbt("[1,2,3]").is_err()); // document must be a compound
    }

    #[test]
    fn empty_containers() {
        let tag = from_snbt("{c:{}, l:[]}").unwrap();
        assert!(tag.get_compound("c").unwrap().is_empty());
        assert!(tag.get_list("l").unwrap().is_empty());
        assert_eq!(tag.get_list("l").unwrap().element(), TagId::End);
    }
}
