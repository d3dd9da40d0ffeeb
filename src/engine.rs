//! The PDF engine seam.
//!
//! The pipelines never talk to pdfium directly. They drive two narrow
//! interfaces instead:
//!
//! * [`PdfComposer`] — append pages of a given geometry and place JPEG images
//!   on the current page. Used by the image→PDF pipeline.
//! * [`PdfPages`] — page count, intrinsic page size, and rendering a page to a
//!   raster of a requested size. Used by the PDF→image pipeline.
//!
//! A [`PdfEngine`] hands out one of these for the duration of a closure. The
//! closure shape lets the pdfium implementation keep the library binding,
//! the document, and all page handles on the calling thread, and free them
//! before returning.
//!
//! ## Binding order for [`PdfiumEngine`]
//!
//! 1. `PDFIUM_LIB_PATH` — an explicit library file (or directory holding it)
//! 2. the platform library in the current directory
//! 3. the system library

use crate::config::PageGeometry;
use crate::error::ConvertError;
use crate::pipeline::decode::EmbeddedImage;
use crate::pipeline::layout::Placement;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::io::Cursor;
use std::path::PathBuf;
use tracing::{debug, info};

/// Builds one PDF document page by page.
pub trait PdfComposer {
    /// Append a new, empty page and make it current.
    fn add_page(&mut self, geometry: PageGeometry) -> Result<(), ConvertError>;

    /// Draw a JPEG image onto the current page at `placement`.
    fn place_image(&mut self, image: &EmbeddedImage, placement: Placement)
        -> Result<(), ConvertError>;
}

/// Read access to the pages of an opened PDF document.
pub trait PdfPages {
    fn page_count(&self) -> usize;

    /// Intrinsic size of page `index` (0-based) in PDF points.
    fn page_size(&self, index: usize) -> Result<PageGeometry, ConvertError>;

    /// Render page `index` (0-based) into a raster of exactly
    /// `width_px × height_px`.
    fn render_page(
        &self,
        index: usize,
        width_px: u32,
        height_px: u32,
    ) -> Result<DynamicImage, ConvertError>;
}

/// Document-encoding and document-rendering service.
///
/// Implementations are blocking; the pipelines call them from
/// `tokio::task::spawn_blocking`.
pub trait PdfEngine: Send + Sync {
    /// Create an empty document, let `build` fill it, and serialise it.
    fn compose(
        &self,
        build: &mut dyn FnMut(&mut dyn PdfComposer) -> Result<(), ConvertError>,
    ) -> Result<Vec<u8>, ConvertError>;

    /// Parse `pdf` and let `visit` read its pages.
    fn open(
        &self,
        pdf: &[u8],
        visit: &mut dyn FnMut(&dyn PdfPages) -> Result<(), ConvertError>,
    ) -> Result<(), ConvertError>;
}

// ── pdfium ───────────────────────────────────────────────────────────────

/// [`PdfEngine`] backed by the pdfium library via `pdfium-render`.
#[derive(Debug, Clone, Default)]
pub struct PdfiumEngine {
    library_path: Option<PathBuf>,
}

impl PdfiumEngine {
    /// Resolve the library from `PDFIUM_LIB_PATH`, the current directory, or
    /// the system, in that order.
    pub fn from_env() -> Self {
        let library_path = std::env::var_os("PDFIUM_LIB_PATH")
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);
        Self { library_path }
    }

    /// Always bind to the library at `path` (a file, or a directory holding
    /// the platform library).
    pub fn with_library_path(path: impl Into<PathBuf>) -> Self {
        Self {
            library_path: Some(path.into()),
        }
    }

    /// Check that a pdfium library can be bound.
    pub fn check_available(&self) -> Result<(), ConvertError> {
        self.bind().map(|_| ())
    }

    fn bind(&self) -> Result<Pdfium, ConvertError> {
        let bindings = match self.library_path {
            Some(ref path) => {
                let lib = if path.is_dir() {
                    Pdfium::pdfium_platform_library_name_at_path(path)
                } else {
                    path.clone()
                };
                debug!("Binding pdfium from {}", lib.display());
                Pdfium::bind_to_library(lib)
            }
            None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| Pdfium::bind_to_system_library()),
        }
        .map_err(|e| ConvertError::EngineUnavailable(format!("{:?}", e)))?;

        Ok(Pdfium::new(bindings))
    }
}

impl PdfEngine for PdfiumEngine {
    fn compose(
        &self,
        build: &mut dyn FnMut(&mut dyn PdfComposer) -> Result<(), ConvertError>,
    ) -> Result<Vec<u8>, ConvertError> {
        let pdfium = self.bind()?;
        let document = pdfium
            .create_new_pdf()
            .map_err(|e| ConvertError::Resource {
                detail: format!("create document: {:?}", e),
            })?;

        let mut composer = PdfiumComposer {
            document,
            current: None,
            pages: 0,
        };
        build(&mut composer)?;

        let PdfiumComposer { document, current, pages } = composer;
        drop(current);
        let bytes = document.save_to_bytes().map_err(save_failed)?;
        info!("Composed PDF: {} pages, {} bytes", pages, bytes.len());
        Ok(bytes)
    }

    fn open(
        &self,
        pdf: &[u8],
        visit: &mut dyn FnMut(&dyn PdfPages) -> Result<(), ConvertError>,
    ) -> Result<(), ConvertError> {
        let pdfium = self.bind()?;
        let document = pdfium
            .load_pdf_from_byte_slice(pdf, None)
            .map_err(|e| ConvertError::Decode {
                index: 0,
                detail: format!("{:?}", e),
            })?;
        info!("PDF loaded: {} pages", document.pages().len());

        visit(&PdfiumPages {
            document: &document,
        })
    }
}

struct PdfiumComposer<'a> {
    document: PdfDocument<'a>,
    current: Option<PdfPage<'a>>,
    pages: usize,
}

impl PdfComposer for PdfiumComposer<'_> {
    fn add_page(&mut self, geometry: PageGeometry) -> Result<(), ConvertError> {
        let page = self
            .document
            .pages_mut()
            .create_page_at_end(PdfPagePaperSize::Custom(
                PdfPoints::new(geometry.width_pt),
                PdfPoints::new(geometry.height_pt),
            ))
            .map_err(|e| ConvertError::Render {
                page: self.pages + 1,
                detail: format!("add page: {:?}", e),
            })?;
        self.pages += 1;
        self.current = Some(page);
        Ok(())
    }

    fn place_image(
        &mut self,
        image: &EmbeddedImage,
        placement: Placement,
    ) -> Result<(), ConvertError> {
        let page_num = self.pages;
        let render_err = |e: PdfiumError| ConvertError::Render {
            page: page_num,
            detail: format!("{:?}", e),
        };

        let page = self.current.as_mut().ok_or_else(|| {
            ConvertError::Internal("image placed before any page was added".into())
        })?;

        let mut object =
            PdfPageImageObject::new_from_jpeg_reader(&self.document, Cursor::new(image.jpeg.clone()))
                .map_err(render_err)?;
        // An image object starts as a 1 × 1 pt square at the origin.
        object
            .scale(placement.width_pt, placement.height_pt)
            .map_err(render_err)?;
        object
            .translate(PdfPoints::new(placement.x_pt), PdfPoints::new(placement.y_pt))
            .map_err(render_err)?;

        page.objects_mut()
            .add_object(PdfPageObject::Image(object))
            .map_err(render_err)?;
        Ok(())
    }
}

struct PdfiumPages<'d, 'a> {
    document: &'d PdfDocument<'a>,
}

impl PdfPages for PdfiumPages<'_, '_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn page_size(&self, index: usize) -> Result<PageGeometry, ConvertError> {
        let page = self.get(index)?;
        Ok(PageGeometry {
            width_pt: page.width().value,
            height_pt: page.height().value,
        })
    }

    fn render_page(
        &self,
        index: usize,
        width_px: u32,
        height_px: u32,
    ) -> Result<DynamicImage, ConvertError> {
        let page = self.get(index)?;
        let render_config = PdfRenderConfig::new()
            .set_target_width(width_px as i32)
            .set_target_height(height_px as i32);

        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| ConvertError::Render {
                page: index + 1,
                detail: format!("{:?}", e),
            })?;
        Ok(bitmap.as_image())
    }
}

impl<'a> PdfiumPages<'_, 'a> {
    fn get(&self, index: usize) -> Result<PdfPage<'a>, ConvertError> {
        let page_index = u16::try_from(index).map_err(|_| ConvertError::Render {
            page: index + 1,
            detail: "page index exceeds pdfium limit".into(),
        })?;
        self.document
            .pages()
            .get(page_index)
            .map_err(|e| ConvertError::Render {
                page: index + 1,
                detail: format!("{:?}", e),
            })
    }
}

/// Serialising the finished document is not attributable to any one image.
fn save_failed(e: impl std::fmt::Debug) -> ConvertError {
    ConvertError::Resource {
        detail: format!("save document: {:?}", e),
    }
}
