//! Slide-order list reader.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use reuse_core::{Error, Result, SlideReference};
use std::io::{Read, Seek};
use zip::ZipArchive;

/// Part that holds the presentation's slide order.
const PRESENTATION_PART: &str = "ppt/presentation.xml";

/// Reads slide references from PPTX packages.
pub struct SlideIdReader;

impl SlideIdReader {
    /// Create a new reader.
    pub fn new() -> Self {
        Self
    }

    /// Read the slide references of a package, in presentation order.
    pub fn read<R: Read + Seek>(&self, reader: R) -> Result<Vec<SlideReference>> {
        let mut archive =
            ZipArchive::new(reader).map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let content = self.read_file_from_archive(&mut archive, PRESENTATION_PART)?;
        let slides = self.parse_slide_list(&content)?;
        log::debug!("Found {} slide(s) in {}", slides.len(), PRESENTATION_PART);
        Ok(slides)
    }

    /// Read slide references from an in-memory package.
    pub fn read_bytes(&self, bytes: &[u8]) -> Result<Vec<SlideReference>> {
        self.read(std::io::Cursor::new(bytes))
    }

    /// Walk `p:sldIdLst/p:sldId` in document order.
    fn parse_slide_list(&self, xml_content: &str) -> Result<Vec<SlideReference>> {
        let mut slides = Vec::new();
        let mut reader = Reader::from_str(xml_content);
        reader.trim_text(true);

        let mut in_slide_list = false;

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                    b"sldIdLst" => in_slide_list = true,
                    b"sldId" if in_slide_list => {
                        let index = slides.len() + 1;
                        slides.push(slide_reference(e, index));
                    }
                    _ => {}
                },
                Ok(Event::Empty(ref e)) => {
                    if in_slide_list && local_name(e.name().as_ref()) == b"sldId" {
                        let index = slides.len() + 1;
                        slides.push(slide_reference(e, index));
                    }
                }
                Ok(Event::End(ref e)) => {
                    if local_name(e.name().as_ref()) == b"sldIdLst" {
                        in_slide_list = false;
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlError(format!(
                        "Error parsing slide list at {}: {}",
                        reader.buffer_position(),
                        e
                    )));
                }
                _ => {}
            }
        }

        Ok(slides)
    }

    /// Read a file from the ZIP archive.
    fn read_file_from_archive<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<String> {
        let mut file = archive
            .by_name(path)
            .map_err(|e| Error::PptxParseError(format!("File not found in archive '{}': {}", path, e)))?;

        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

        Ok(content)
    }
}

impl Default for SlideIdReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a reference from a `p:sldId` element, falling back to a placeholder id.
fn slide_reference(element: &BytesStart<'_>, index: usize) -> SlideReference {
    element
        .attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == b"id")
        .map(|attr| String::from_utf8_lossy(&attr.value).to_string())
        .filter(|id| !id.is_empty())
        .map(|id| SlideReference::new(index, id))
        .unwrap_or_else(|| SlideReference::unknown(index))
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}
