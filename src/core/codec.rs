//! # Codec
//!
//! Encodes and decodes the step-list payload as a textual tree document.
//!
//! The document has a single root container named `StepList` with one
//! `Step` child per record, each carrying two named leaves. On the wire
//! `Name` holds the record's value and `Desc` holds the record's key;
//! decoders on both sides rely on exactly this layout.
//!
//! ```text
//! <StepList>
//!   <Step>
//!     <Name>one</Name>
//!     <Desc>1</Desc>
//!   </Step>
//! </StepList>
//! ```
//!
//! Decoding accepts exactly this shape; any other root or child naming
//! is a [`FormatError`]. A truncated document (the transport reads at
//! most [`READ_BUFFER_SIZE`](crate::config::READ_BUFFER_SIZE) bytes in
//! one call) also fails decode rather than yielding a partial list.

use bytes::{BufMut, BytesMut};

use crate::core::step::{StepList, StepRecord};
use crate::error::FormatError;

const ROOT: &str = "StepList";
const STEP: &str = "Step";
const NAME: &str = "Name";
const DESC: &str = "Desc";

/// Serialize a step list into the textual tree document.
pub fn encode(list: &StepList) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(64 * (list.len() + 1));

    if list.is_empty() {
        buf.put_slice(b"<StepList />");
        return buf.to_vec();
    }

    buf.put_slice(b"<StepList>");
    for step in list {
        buf.put_slice(b"\n  <Step>\n    <Name>");
        put_escaped(&mut buf, step.value());
        buf.put_slice(b"</Name>\n    <Desc>");
        put_escaped(&mut buf, step.key());
        buf.put_slice(b"</Desc>\n  </Step>");
    }
    buf.put_slice(b"\n</StepList>");
    buf.to_vec()
}

/// Parse a step-list document from a raw buffer.
pub fn decode(bytes: &[u8]) -> Result<StepList, FormatError> {
    let text = std::str::from_utf8(bytes).map_err(|_| FormatError::InvalidUtf8)?;
    let mut reader = Reader::new(text);

    reader.expect("<StepList", ROOT)?;
    reader.skip_ws();
    if reader.eat("/>") {
        reader.expect_end()?;
        return Ok(StepList::new());
    }
    if !reader.eat(">") {
        return Err(reader.mismatch(ROOT));
    }

    let mut list = StepList::new();
    loop {
        reader.skip_ws();
        if reader.eat("</StepList>") {
            break;
        }
        reader.expect("<Step>", STEP)?;
        reader.expect("<Name>", NAME)?;
        let value = reader.text_until_close(NAME)?;
        reader.expect("<Desc>", DESC)?;
        let key = reader.text_until_close(DESC)?;
        reader.expect("</Step>", STEP)?;
        list.push(StepRecord::new(key, value));
    }

    reader.expect_end()?;
    Ok(list)
}

fn put_escaped(buf: &mut BytesMut, text: &str) {
    let mut utf8 = [0u8; 4];
    for ch in text.chars() {
        match ch {
            '&' => buf.put_slice(b"&amp;"),
            '<' => buf.put_slice(b"&lt;"),
            '>' => buf.put_slice(b"&gt;"),
            _ => buf.put_slice(ch.encode_utf8(&mut utf8).as_bytes()),
        }
    }
}

fn unescape(raw: &str) -> Result<String, FormatError> {
    if !raw.contains('&') {
        return Ok(raw.to_string());
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let semi = rest
            .find(';')
            .ok_or_else(|| FormatError::BadEntity(rest.chars().take(8).collect()))?;
        let entity = &rest[..=semi];
        out.push(match entity {
            "&amp;" => '&',
            "&lt;" => '<',
            "&gt;" => '>',
            "&quot;" => '"',
            "&apos;" => '\'',
            other => return Err(FormatError::BadEntity(other.to_string())),
        });
        rest = &rest[semi + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Cursor over the document text.
struct Reader<'a> {
    rest: &'a str,
}

impl<'a> Reader<'a> {
    fn new(text: &'a str) -> Self {
        Self { rest: text }
    }

    fn skip_ws(&mut self) {
        self.rest = self.rest.trim_start();
    }

    fn eat(&mut self, lit: &str) -> bool {
        match self.rest.strip_prefix(lit) {
            Some(after) => {
                self.rest = after;
                true
            }
            None => false,
        }
    }

    /// Consume `lit` (after leading whitespace) or report what is in
    /// its place.
    fn expect(&mut self, lit: &str, element: &str) -> Result<(), FormatError> {
        self.skip_ws();
        if self.eat(lit) {
            Ok(())
        } else {
            Err(self.mismatch(element))
        }
    }

    /// Consume text content up to the closing tag of `element`.
    fn text_until_close(&mut self, element: &str) -> Result<String, FormatError> {
        let close = format!("</{element}>");
        match self.rest.find(&close) {
            Some(idx) => {
                let raw = &self.rest[..idx];
                self.rest = &self.rest[idx + close.len()..];
                unescape(raw)
            }
            None => Err(FormatError::UnclosedElement(element.to_string())),
        }
    }

    fn expect_end(&mut self) -> Result<(), FormatError> {
        self.skip_ws();
        if self.rest.is_empty() {
            Ok(())
        } else {
            Err(FormatError::TrailingContent)
        }
    }

    fn mismatch(&self, expected: &str) -> FormatError {
        if self.rest.is_empty() {
            return FormatError::UnexpectedEnd;
        }
        FormatError::UnexpectedElement {
            expected: expected.to_string(),
            found: self.found(),
        }
    }

    /// Best-effort description of what sits at the cursor, for error
    /// reporting.
    fn found(&self) -> String {
        if let Some(tag) = self.rest.strip_prefix('<') {
            let name: String = tag
                .trim_start_matches('/')
                .chars()
                .take_while(|c| c.is_ascii_alphanumeric())
                .collect();
            if !name.is_empty() {
                return name;
            }
        }
        self.rest.chars().take(12).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_and_unescapes_markup_characters() {
        let list = StepList::from(vec![StepRecord::new("a&b", "<tag>")]);
        let bytes = encode(&list);
        let doc = String::from_utf8(bytes.clone()).unwrap();
        assert!(doc.contains("&lt;tag&gt;"));
        assert!(doc.contains("a&amp;b"));
        assert_eq!(decode(&bytes).unwrap(), list);
    }

    #[test]
    fn rejects_unknown_entity() {
        let doc = b"<StepList>\n  <Step>\n    <Name>&bogus;</Name>\n    <Desc>1</Desc>\n  </Step>\n</StepList>";
        assert_eq!(
            decode(doc),
            Err(FormatError::BadEntity("&bogus;".to_string()))
        );
    }

    #[test]
    fn reports_the_element_found_in_place() {
        let doc = b"<StepList>\n  <Stage>\n  </Stage>\n</StepList>";
        assert_eq!(
            decode(doc),
            Err(FormatError::UnexpectedElement {
                expected: "Step".to_string(),
                found: "Stage".to_string(),
            })
        );
    }

    #[test]
    fn rejects_non_utf8_input() {
        assert_eq!(decode(&[0xff, 0xfe, 0x3c]), Err(FormatError::InvalidUtf8));
    }
}
