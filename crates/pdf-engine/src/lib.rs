//! Paginated document sources for the annotator.
//!
//! A [`DocumentSource`] reports page count, natural page sizes, and the
//! extracted text of each page. Pages are numbered from 1.

use lopdf::{Document, Object};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

mod memory;

pub use memory::{MemoryDocument, MemoryPage};

/// Fallback page size (US Letter) used when a page carries no usable MediaBox.
const LETTER: PageSize = PageSize { width_pt: 612.0, height_pt: 792.0 };

/// How many `Parent` hops to follow when looking for an inherited MediaBox.
const MAX_INHERIT_DEPTH: usize = 32;

/// Natural size of a page in points (1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width_pt: f32,
    pub height_pt: f32,
}

impl PageSize {
    pub fn new(width_pt: f32, height_pt: f32) -> Self {
        Self { width_pt, height_pt }
    }

    /// A page with a non-positive or non-finite side cannot be laid out.
    pub fn is_degenerate(&self) -> bool {
        !(self.width_pt.is_finite()
            && self.height_pt.is_finite()
            && self.width_pt > 0.0
            && self.height_pt > 0.0)
    }
}

#[derive(Debug, Clone)]
pub enum OpenSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl From<&Path> for OpenSource {
    fn from(value: &Path) -> Self {
        Self::Path(value.to_path_buf())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PdfEngineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF parse error: {0}")]
    Parse(#[from] lopdf::Error),
    #[error("document description error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("page {page} out of range (page_count={page_count})")]
    PageOutOfRange { page: u32, page_count: u32 },
    #[error("encrypted PDFs are not supported")]
    EncryptedUnsupported,
    #[error("document has no pages")]
    NoPages,
    #[error("text of page {page} is unavailable")]
    TextUnavailable { page: u32 },
}

/// The paginated document the viewer consumes.
pub trait DocumentSource {
    fn page_count(&self) -> u32;

    fn page_size(&self, page: u32) -> Result<PageSize, PdfEngineError>;

    /// Full extracted text of `page`.
    fn page_text(&self, page: u32) -> Result<String, PdfEngineError>;

    /// Opaque location of the underlying bytes, if known.
    fn source_url(&self) -> Option<&str> {
        None
    }
}

pub(crate) fn check_page(page: u32, page_count: u32) -> Result<(), PdfEngineError> {
    if page == 0 || page > page_count {
        return Err(PdfEngineError::PageOutOfRange { page, page_count });
    }
    Ok(())
}

/// PDF source backed by lopdf.
#[derive(Debug)]
pub struct LopdfDocument {
    document: Document,
    page_sizes: Vec<PageSize>,
    source_url: Option<String>,
}

impl LopdfDocument {
    pub fn open(source: OpenSource) -> Result<Self, PdfEngineError> {
        let (bytes, source_url) = match source {
            OpenSource::Path(path) => {
                let bytes = fs::read(&path)?;
                (bytes, Some(path.display().to_string()))
            }
            OpenSource::Bytes(bytes) => (bytes, None),
        };

        if bytes.windows(b"/Encrypt".len()).any(|window| window == b"/Encrypt") {
            return Err(PdfEngineError::EncryptedUnsupported);
        }

        let document = Document::load_mem(&bytes)?;
        let page_sizes = Self::parse_sizes(&document)?;

        log::info!(
            "opened PDF {} with {} pages",
            source_url.as_deref().unwrap_or("<memory>"),
            page_sizes.len()
        );

        Ok(Self { document, page_sizes, source_url })
    }

    fn parse_sizes(document: &Document) -> Result<Vec<PageSize>, PdfEngineError> {
        let pages = document.get_pages();
        let mut sizes = Vec::with_capacity(pages.len());

        for (_, object_id) in pages {
            let size = Self::media_box(document, object_id).unwrap_or(LETTER);
            sizes.push(if size.is_degenerate() { LETTER } else { size });
        }

        if sizes.is_empty() {
            return Err(PdfEngineError::NoPages);
        }

        Ok(sizes)
    }

    /// Reads the page MediaBox, following `Parent` links for inherited boxes.
    fn media_box(document: &Document, object_id: lopdf::ObjectId) -> Option<PageSize> {
        let mut dict = document.get_dictionary(object_id).ok()?;

        for _ in 0..MAX_INHERIT_DEPTH {
            if let Some(size) = dict.get(b"MediaBox").ok().and_then(media_box_size) {
                return Some(size);
            }
            let parent = dict.get(b"Parent").ok()?.as_reference().ok()?;
            dict = document.get_dictionary(parent).ok()?;
        }

        None
    }
}

fn media_box_size(object: &Object) -> Option<PageSize> {
    let array = object.as_array().ok()?;
    if array.len() != 4 {
        return None;
    }
    let x0 = array[0].as_float().ok()?;
    let y0 = array[1].as_float().ok()?;
    let x1 = array[2].as_float().ok()?;
    let y1 = array[3].as_float().ok()?;
    Some(PageSize { width_pt: (x1 - x0).abs(), height_pt: (y1 - y0).abs() })
}

impl DocumentSource for LopdfDocument {
    fn page_count(&self) -> u32 {
        self.page_sizes.len() as u32
    }

    fn page_size(&self, page: u32) -> Result<PageSize, PdfEngineError> {
        check_page(page, self.page_count())?;
        Ok(self.page_sizes[(page - 1) as usize])
    }

    fn page_text(&self, page: u32) -> Result<String, PdfEngineError> {
        check_page(page, self.page_count())?;
        Ok(self.document.extract_text(&[page])?)
    }

    fn source_url(&self) -> Option<&str> {
        self.source_url.as_deref()
    }
}

/// Opens `path` as a PDF, or as a [`MemoryDocument`] description when the
/// file has a `.json` extension.
pub fn open_path(path: &Path) -> Result<Box<dyn DocumentSource>, PdfEngineError> {
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        Ok(Box::new(MemoryDocument::from_json_file(path)?))
    } else {
        Ok(Box::new(LopdfDocument::open(OpenSource::from(path))?))
    }
}

/// Builds small text-only PDFs in memory for tests.
#[cfg(test)]
pub(crate) mod fixtures {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    pub fn pdf_with_pages(texts: &[&str], media_box: [i64; 4]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids = Vec::new();
        for text in texts {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![72.into(), 700.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(
                dictionary! {},
                content.encode().expect("content should encode"),
            ));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(Object::from(page_id));
        }

        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => texts.len() as i64,
            "Resources" => resources_id,
            "MediaBox" => media_box.iter().map(|v| Object::from(*v)).collect::<Vec<_>>(),
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).expect("pdf should serialize");
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_pdf_and_reads_inherited_page_sizes() {
        let bytes = fixtures::pdf_with_pages(&["Hello", "World"], [0, 0, 595, 842]);
        let doc = LopdfDocument::open(OpenSource::Bytes(bytes)).expect("open should succeed");

        assert_eq!(doc.page_count(), 2);
        let size = doc.page_size(2).expect("page 2 exists");
        assert_eq!(size, PageSize::new(595.0, 842.0));
    }

    #[test]
    fn extracts_page_text() {
        let bytes = fixtures::pdf_with_pages(&["Hello Introduction"], [0, 0, 612, 792]);
        let doc = LopdfDocument::open(OpenSource::Bytes(bytes)).expect("open should succeed");

        let text = doc.page_text(1).expect("text should extract");
        assert!(text.contains("Introduction"));
    }

    #[test]
    fn page_numbers_are_one_based() {
        let bytes = fixtures::pdf_with_pages(&["only"], [0, 0, 612, 792]);
        let doc = LopdfDocument::open(OpenSource::Bytes(bytes)).expect("open should succeed");

        let err = doc.page_size(0).expect_err("page 0 is invalid");
        assert!(matches!(err, PdfEngineError::PageOutOfRange { page: 0, page_count: 1 }));
        assert!(doc.page_text(2).is_err());
    }

    #[test]
    fn encrypted_marker_is_rejected() {
        let mut bytes = fixtures::pdf_with_pages(&["secret"], [0, 0, 612, 792]);
        bytes.extend_from_slice(b"\n% /Encrypt\n");

        let err = LopdfDocument::open(OpenSource::Bytes(bytes)).expect_err("should be rejected");
        assert!(matches!(err, PdfEngineError::EncryptedUnsupported));
    }

    #[test]
    fn garbage_bytes_fail_to_parse() {
        let err = LopdfDocument::open(OpenSource::Bytes(b"not a pdf".to_vec()))
            .expect_err("garbage should not parse");
        assert!(matches!(err, PdfEngineError::Parse(_)));
    }

    #[test]
    fn open_path_dispatches_on_extension() {
        let dir = tempfile::tempdir().expect("temp dir");

        let pdf_path = dir.path().join("doc.pdf");
        fs::write(&pdf_path, fixtures::pdf_with_pages(&["a", "b", "c"], [0, 0, 612, 792]))
            .expect("write pdf");
        assert_eq!(open_path(&pdf_path).expect("pdf opens").page_count(), 3);

        let json_path = dir.path().join("doc.json");
        fs::write(
            &json_path,
            r#"{"pages":[{"width_pt":100.0,"height_pt":200.0,"text":"hi"}]}"#,
        )
        .expect("write json");
        let doc = open_path(&json_path).expect("json opens");
        assert_eq!(doc.page_count(), 1);
        assert_eq!(doc.source_url(), Some(json_path.display().to_string().as_str()));
    }
}
