//! Document assembly: decode page images and bind them into one PDF.
//!
//! Assembly is all-or-nothing. A single page that cannot be decoded aborts
//! the whole batch before anything is written, so a PDF on disk always has
//! every page the run asked for.
//!
//! Each page is normalised to 8-bit RGB (alpha dropped, grayscale and
//! palette images expanded), re-encoded as baseline JPEG and embedded as a
//! `DCTDecode` image XObject on a page sized to the image at 72 dpi, so one
//! image pixel maps to one PDF point.

use crate::error::Pages2PdfError;
use crate::output::AssemblyOutcome;
use crate::pipeline::write_atomic;
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// A decoded page, ready to embed.
struct EncodedPage {
    width: u32,
    height: u32,
    jpeg: Vec<u8>,
}

enum BuildError {
    Decode { path: PathBuf, detail: String },
    Pdf(String),
}

/// Bind `image_paths`, in order, into a PDF at `output_path`.
///
/// Decoding and encoding run inside `spawn_blocking`; only the final write
/// happens on the async side.
pub async fn assemble(
    image_paths: &[PathBuf],
    output_path: &Path,
    jpeg_quality: u8,
) -> Result<AssemblyOutcome, Pages2PdfError> {
    if image_paths.is_empty() {
        warn!(
            "No page images to assemble; {} not created",
            output_path.display()
        );
        return Ok(AssemblyOutcome::NoPages);
    }

    let paths = image_paths.to_vec();
    let built = tokio::task::spawn_blocking(move || build_pdf_blocking(&paths, jpeg_quality))
        .await
        .map_err(|e| Pages2PdfError::Internal(format!("Assembly task panicked: {}", e)))?;

    let bytes = match built {
        Ok(bytes) => bytes,
        Err(BuildError::Decode { path, detail }) => {
            error!("Failed to open image {}: {}", path.display(), detail);
            return Ok(AssemblyOutcome::DecodeFailed { path, detail });
        }
        Err(BuildError::Pdf(detail)) => {
            return Err(Pages2PdfError::PdfBuildFailed {
                path: output_path.to_path_buf(),
                detail,
            })
        }
    };

    write_atomic(output_path, &bytes)
        .await
        .map_err(|e| Pages2PdfError::OutputWriteFailed {
            path: output_path.to_path_buf(),
            source: e,
        })?;

    info!(
        "PDF document created: {} ({} pages)",
        output_path.display(),
        image_paths.len()
    );
    Ok(AssemblyOutcome::Written {
        path: output_path.to_path_buf(),
        pages: image_paths.len(),
    })
}

/// Open an image file and normalise it to RGB.
///
/// The format is sniffed from the content, not the extension; archives
/// sometimes serve PNG scans under `.jpg` names.
pub fn load_page(path: &Path) -> image::ImageResult<RgbImage> {
    let bytes = std::fs::read(path)?;
    Ok(image::load_from_memory(&bytes)?.into_rgb8())
}

fn build_pdf_blocking(paths: &[PathBuf], jpeg_quality: u8) -> Result<Vec<u8>, BuildError> {
    let mut pages = Vec::with_capacity(paths.len());

    for path in paths {
        let decode_err = |e: image::ImageError| BuildError::Decode {
            path: path.clone(),
            detail: e.to_string(),
        };
        let rgb = load_page(path).map_err(decode_err)?;
        let jpeg = encode_jpeg(&rgb, jpeg_quality).map_err(decode_err)?;
        debug!(
            "Prepared {} → {}x{} px, {} bytes JPEG",
            path.display(),
            rgb.width(),
            rgb.height(),
            jpeg.len()
        );
        pages.push(EncodedPage {
            width: rgb.width(),
            height: rgb.height(),
            jpeg,
        });
    }

    build_document(&pages).map_err(BuildError::Pdf)
}

fn encode_jpeg(img: &RgbImage, quality: u8) -> image::ImageResult<Vec<u8>> {
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality).encode_image(img)?;
    Ok(buf)
}

fn build_document(pages: &[EncodedPage]) -> Result<Vec<u8>, String> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids = Vec::with_capacity(pages.len());

    for page in pages {
        let width = i64::from(page.width);
        let height = i64::from(page.height);

        let image_dict = Dictionary::from_iter([
            ("Type", Object::Name(b"XObject".to_vec())),
            ("Subtype", Object::Name(b"Image".to_vec())),
            ("Width", Object::Integer(width)),
            ("Height", Object::Integer(height)),
            ("ColorSpace", Object::Name(b"DeviceRGB".to_vec())),
            ("BitsPerComponent", Object::Integer(8)),
            ("Filter", Object::Name(b"DCTDecode".to_vec())),
        ]);
        let image_id = doc.add_object(Stream::new(image_dict, page.jpeg.clone()));

        // Scale the unit square to the full page and paint the image.
        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        Object::Integer(width),
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Integer(height),
                        Object::Integer(0),
                        Object::Integer(0),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_bytes = content.encode().map_err(|e| e.to_string())?;
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content_bytes));

        let resources = Dictionary::from_iter([(
            "XObject",
            Object::Dictionary(Dictionary::from_iter([(
                "Im0",
                Object::Reference(image_id),
            )])),
        )]);

        let page_id = doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("Contents", Object::Reference(content_id)),
            ("Resources", Object::Dictionary(resources)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(width),
                    Object::Integer(height),
                ]),
            ),
        ]));
        kids.push(Object::Reference(page_id));
    }

    let page_tree = Dictionary::from_iter([
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(kids.len() as i64)),
        ("Kids", Object::Array(kids)),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(page_tree));

    let catalog_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut output = Vec::new();
    doc.save_to(&mut output).map_err(|e| e.to_string())?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgb, Rgba, RgbaImage};

    fn write_image(path: &Path, img: DynamicImage, format: ImageFormat) {
        img.save_with_format(path, format).unwrap();
    }

    fn jpeg_page(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let p = dir.join(name);
        write_image(
            &p,
            DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([200, 180, 150]))),
            ImageFormat::Jpeg,
        );
        p
    }

    fn media_box_widths(pdf: &Path) -> Vec<i64> {
        let doc = Document::load(pdf).unwrap();
        doc.get_pages()
            .values()
            .map(|id| {
                let page = doc.get_dictionary(*id).unwrap();
                page.get(b"MediaBox").unwrap().as_array().unwrap()[2]
                    .as_i64()
                    .unwrap()
            })
            .collect()
    }

    #[tokio::test]
    async fn empty_input_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("output.pdf");

        let outcome = assemble(&[], &out, 75).await.unwrap();

        assert_eq!(outcome, AssemblyOutcome::NoPages);
        assert!(!outcome.is_written());
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn pages_keep_input_order() {
        let dir = tempfile::tempdir().unwrap();
        let first = jpeg_page(dir.path(), "page0001_5.jpg", 30, 40);
        let second = dir.path().join("page0002_5.jpg");
        // PNG content under a .jpg name, with an alpha channel.
        write_image(
            &second,
            DynamicImage::ImageRgba8(RgbaImage::from_pixel(40, 20, Rgba([0, 0, 255, 128]))),
            ImageFormat::Png,
        );
        let third = dir.path().join("page0003_5.png");
        write_image(
            &third,
            DynamicImage::ImageLuma8(GrayImage::from_pixel(50, 10, Luma([90]))),
            ImageFormat::Png,
        );
        let out = dir.path().join("output.pdf");

        let outcome = assemble(&[first, second, third], &out, 75).await.unwrap();

        assert_eq!(
            outcome,
            AssemblyOutcome::Written {
                path: out.clone(),
                pages: 3
            }
        );
        assert_eq!(media_box_widths(&out), vec![30, 40, 50]);
    }

    #[tokio::test]
    async fn one_bad_image_aborts_everything() {
        let dir = tempfile::tempdir().unwrap();
        let good = jpeg_page(dir.path(), "page0001_5.jpg", 10, 10);
        let bad = dir.path().join("page0002_5.jpg");
        std::fs::write(&bad, b"<html>404 Not Found</html>").unwrap();
        let also_good = jpeg_page(dir.path(), "page0003_5.jpg", 10, 10);
        let out = dir.path().join("output.pdf");

        let outcome = assemble(&[good, bad.clone(), also_good], &out, 75)
            .await
            .unwrap();

        match outcome {
            AssemblyOutcome::DecodeFailed { path, .. } => assert_eq!(path, bad),
            other => panic!("expected DecodeFailed, got {other:?}"),
        }
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn missing_file_is_a_decode_failure() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("page0001_5.jpg");
        let out = dir.path().join("output.pdf");

        let outcome = assemble(&[missing.clone()], &out, 75).await.unwrap();

        assert!(matches!(
            outcome,
            AssemblyOutcome::DecodeFailed { ref path, .. } if *path == missing
        ));
        assert!(!out.exists());
    }

    #[test]
    fn load_page_drops_alpha() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("rgba.png");
        write_image(
            &p,
            DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 255]))),
            ImageFormat::Png,
        );

        let rgb = load_page(&p).unwrap();
        assert_eq!(rgb.dimensions(), (2, 2));
        assert_eq!(rgb.get_pixel(0, 0), &Rgb([255, 0, 0]));
    }

    #[test]
    fn encoded_page_is_jpeg() {
        let img = RgbImage::from_pixel(8, 8, Rgb([10, 20, 30]));
        let jpeg = encode_jpeg(&img, 75).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    }
}
