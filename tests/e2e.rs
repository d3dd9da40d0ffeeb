//! End-to-end tests through the real pdfium engine.
//!
//! These need a pdfium shared library. They are gated behind the
//! `E2E_ENABLED` environment variable so they do not run in CI unless
//! explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 PDFIUM_LIB_PATH=/path/to/libpdfium.so cargo test --test e2e -- --nocapture

mod common;

use common::png;
use imgpdf::{
    Converter, ErrorKind, FileKind, FileRegistry, ImageToPdfConfig, Orientation, PageSize,
    PdfToImageConfig, PdfiumEngine, RasterFormat,
};
use std::sync::Arc;

/// Skip this test unless E2E_ENABLED is set and pdfium can be bound.
macro_rules! e2e_skip_unless_ready {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        let engine = PdfiumEngine::from_env();
        if let Err(e) = engine.check_available() {
            println!("SKIP — {e}");
            return;
        }
        Converter::new(Arc::new(engine))
    }};
}

/// pdfium may round a target size by one pixel.
fn assert_close(actual: u32, expected: u32) {
    assert!(actual.abs_diff(expected) <= 1, "expected ~{expected} px, got {actual}");
}

#[tokio::test]
async fn test_images_round_trip_through_pdfium() {
    let converter = e2e_skip_unless_ready!();

    let mut registry = FileRegistry::new();
    registry.add_files(
        vec![("wide.png", png(400, 200)), ("tall.png", png(200, 400)), ("square.png", png(300, 300))],
        FileKind::Image,
    );
    let pdf = converter
        .images_to_pdf(&mut registry, &ImageToPdfConfig::default())
        .await
        .expect("images_to_pdf() should succeed");
    assert!(pdf.data.starts_with(b"%PDF"));

    // A4 portrait at 72 DPI: one pixel per point.
    let config = PdfToImageConfig::builder().dpi(72).build().unwrap();
    let pages = converter
        .convert_pdf(Arc::clone(&pdf.data), &config)
        .await
        .expect("convert_pdf() should succeed");

    assert_eq!(pages.len(), 3);
    for page in &pages {
        let img = image::load_from_memory(&page.data).unwrap();
        assert_close(img.width(), 595);
        assert_close(img.height(), 841);
    }
    println!("✓ {} bytes PDF, {} pages back", pdf.len(), pages.len());
}

#[tokio::test]
async fn test_landscape_letter_pages() {
    let converter = e2e_skip_unless_ready!();

    let config = ImageToPdfConfig::builder()
        .page_size(PageSize::Letter)
        .orientation(Orientation::Landscape)
        .build()
        .unwrap();
    let pdf = converter
        .convert_images(vec![png(64, 64).into()], &config)
        .await
        .unwrap();

    let raster = PdfToImageConfig::builder()
        .format(RasterFormat::Jpeg)
        .dpi(144)
        .build()
        .unwrap();
    let pages = converter.convert_pdf(pdf.data, &raster).await.unwrap();

    let img = image::load_from_memory(&pages[0].data).unwrap();
    assert_close(img.width(), 1584);
    assert_close(img.height(), 1224);
    assert_eq!(pages[0].file_name, "page_1.jpeg");
}

#[tokio::test]
async fn test_truncated_pdf_is_rejected() {
    let converter = e2e_skip_unless_ready!();

    let err = converter
        .convert_pdf(b"%PDF-1.7\n1 0 obj\n<<".to_vec().into(), &PdfToImageConfig::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);
}
