//! In-memory XML documents for the merchant feed and the sitemaps.

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

/// Indented XML document with a UTF-8 declaration.
pub struct XmlDocument {
    writer: Writer<Vec<u8>>,
}

impl XmlDocument {
    #[must_use]
    pub fn start() -> Self {
        let mut doc = Self {
            writer: Writer::new_with_indent(Vec::new(), b' ', 2),
        };
        doc.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)));
        doc
    }

    // Writes go to a Vec<u8> and cannot fail.
    fn event(&mut self, event: Event<'_>) {
        let _ = self.writer.write_event(event);
    }

    /// Open `<name attr="value" ...>`; attribute values are escaped.
    pub fn open(&mut self, name: &str, attributes: &[(&str, &str)]) {
        let start = BytesStart::new(name).with_attributes(attributes.iter().copied());
        self.event(Event::Start(start));
    }

    pub fn close(&mut self, name: &str) {
        self.event(Event::End(BytesEnd::new(name)));
    }

    /// `<name>text</name>` with the text escaped.
    pub fn element(&mut self, name: &str, text: &str) {
        self.event(Event::Start(BytesStart::new(name)));
        self.event(Event::Text(BytesText::new(text)));
        self.event(Event::End(BytesEnd::new(name)));
    }

    /// Like [`element`](Self::element), skipped when `text` is `None`.
    pub fn optional(&mut self, name: &str, text: Option<&str>) {
        if let Some(text) = text {
            self.element(name, text);
        }
    }

    #[must_use]
    pub fn finish(self) -> String {
        String::from_utf8_lossy(&self.writer.into_inner()).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_escapes_text_and_attributes() {
        let mut doc = XmlDocument::start();
        doc.open("root", &[("title", "a \"b\" & c")]);
        doc.element("name", "Tom & <Jerry>");
        doc.optional("skipped", None);
        doc.close("root");
        let xml = doc.finish();

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("title=\"a &quot;b&quot; &amp; c\""));
        assert!(xml.contains("<name>Tom &amp; &lt;Jerry&gt;</name>"));
        assert!(!xml.contains("skipped"));
        assert!(xml.ends_with("</root>"));
    }
}
