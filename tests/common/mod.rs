//! Shared fixtures: an in-memory `PdfEngine` and image builders.
//!
//! The fake engine writes documents as `%PDF-FAKE\n` followed by a JSON list
//! of pages, each with its size and the images placed on it. `open` reads the
//! same format back, so tests can assert on page count, order and placement
//! without a native pdfium library.

#![allow(dead_code)]

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use imgpdf::pipeline::decode::EmbeddedImage;
use imgpdf::pipeline::layout::Placement;
use imgpdf::{ConversionProgressCallback, ConvertError, PageGeometry, PdfComposer, PdfEngine, PdfPages};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::sync::Mutex;

pub const FAKE_MAGIC: &[u8] = b"%PDF-FAKE\n";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FakeImage {
    pub width_px: u32,
    pub height_px: u32,
    pub placement: Placement,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FakePage {
    pub width_pt: f32,
    pub height_pt: f32,
    pub images: Vec<FakeImage>,
}

/// In-memory engine. Optionally fails on one 1-based page, or when saving
/// the composed document.
#[derive(Debug, Default)]
pub struct FakeEngine {
    pub fail_on_page: Option<usize>,
    pub fail_on_save: bool,
}

impl FakeEngine {
    pub fn failing_on(page: usize) -> Self {
        Self {
            fail_on_page: Some(page),
            ..Self::default()
        }
    }

    pub fn failing_save() -> Self {
        Self {
            fail_on_save: true,
            ..Self::default()
        }
    }
}

struct FakeComposer {
    pages: Vec<FakePage>,
    fail_on_page: Option<usize>,
}

impl PdfComposer for FakeComposer {
    fn add_page(&mut self, geometry: PageGeometry) -> Result<(), ConvertError> {
        self.pages.push(FakePage {
            width_pt: geometry.width_pt,
            height_pt: geometry.height_pt,
            images: Vec::new(),
        });
        Ok(())
    }

    fn place_image(&mut self, image: &EmbeddedImage, placement: Placement) -> Result<(), ConvertError> {
        let page_num = self.pages.len();
        if self.fail_on_page == Some(page_num) {
            return Err(ConvertError::Render {
                page: page_num,
                detail: "fake engine rejected the image".into(),
            });
        }
        let page = self
            .pages
            .last_mut()
            .ok_or_else(|| ConvertError::Internal("no page".into()))?;
        page.images.push(FakeImage {
            width_px: image.width_px,
            height_px: image.height_px,
            placement,
        });
        Ok(())
    }
}

struct FakePages {
    pages: Vec<FakePage>,
    fail_on_page: Option<usize>,
}

impl PdfPages for FakePages {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_size(&self, index: usize) -> Result<PageGeometry, ConvertError> {
        let page = &self.pages[index];
        Ok(PageGeometry {
            width_pt: page.width_pt,
            height_pt: page.height_pt,
        })
    }

    fn render_page(&self, index: usize, width_px: u32, height_px: u32) -> Result<DynamicImage, ConvertError> {
        if self.fail_on_page == Some(index + 1) {
            return Err(ConvertError::Render {
                page: index + 1,
                detail: "fake engine cannot render this page".into(),
            });
        }
        let shade = (index * 40 % 256) as u8;
        Ok(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            width_px,
            height_px,
            Rgb([shade, 255 - shade, 128]),
        )))
    }
}

impl PdfEngine for FakeEngine {
    fn compose(
        &self,
        build: &mut dyn FnMut(&mut dyn PdfComposer) -> Result<(), ConvertError>,
    ) -> Result<Vec<u8>, ConvertError> {
        let mut composer = FakeComposer {
            pages: Vec::new(),
            fail_on_page: self.fail_on_page,
        };
        build(&mut composer)?;
        if self.fail_on_save {
            return Err(ConvertError::Resource {
                detail: "save document: disk full".into(),
            });
        }
        Ok(encode_doc(&composer.pages))
    }

    fn open(
        &self,
        pdf: &[u8],
        visit: &mut dyn FnMut(&dyn PdfPages) -> Result<(), ConvertError>,
    ) -> Result<(), ConvertError> {
        let pages = decode_doc(pdf).ok_or_else(|| ConvertError::Decode {
            index: 0,
            detail: "fake engine could not parse document".into(),
        })?;
        visit(&FakePages {
            pages,
            fail_on_page: self.fail_on_page,
        })
    }
}

fn encode_doc(pages: &[FakePage]) -> Vec<u8> {
    let mut out = FAKE_MAGIC.to_vec();
    out.extend(serde_json::to_vec(pages).unwrap());
    out
}

fn decode_doc(bytes: &[u8]) -> Option<Vec<FakePage>> {
    let body = bytes.strip_prefix(FAKE_MAGIC)?;
    serde_json::from_slice(body).ok()
}

/// Parse a document produced by [`FakeEngine::compose`].
pub fn parse_fake_pdf(bytes: &[u8]) -> Vec<FakePage> {
    decode_doc(bytes).expect("not a fake PDF")
}

/// A fake PDF with blank pages of the given sizes in points.
pub fn fake_pdf(sizes: &[(f32, f32)]) -> Vec<u8> {
    let pages: Vec<FakePage> = sizes
        .iter()
        .map(|&(w, h)| FakePage {
            width_pt: w,
            height_pt: h,
            images: Vec::new(),
        })
        .collect();
    encode_doc(&pages)
}

/// A solid PNG of the given size.
pub fn png(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Png)
}

pub fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([200, 40, 90])))
        .write_to(&mut Cursor::new(&mut buf), format)
        .unwrap();
    buf
}

/// Records every progress event.
#[derive(Debug, Default)]
pub struct Recorder {
    pub started: Mutex<Option<usize>>,
    pub percents: Mutex<Vec<u8>>,
    pub completed: Mutex<Option<usize>>,
    pub errors: Mutex<Vec<String>>,
}

impl ConversionProgressCallback for Recorder {
    fn on_conversion_start(&self, total_items: usize) {
        *self.started.lock().unwrap() = Some(total_items);
    }

    fn on_item_complete(&self, _item_num: usize, _total_items: usize, percent: u8) {
        self.percents.lock().unwrap().push(percent);
    }

    fn on_conversion_complete(&self, total_items: usize) {
        *self.completed.lock().unwrap() = Some(total_items);
    }

    fn on_conversion_error(&self, error: &str) {
        self.errors.lock().unwrap().push(error.to_string());
    }
}
