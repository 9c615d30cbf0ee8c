use crate::store::StudentRecord;
use anyhow::Context;
use image::{DynamicImage, RgbImage};
use printpdf::{BuiltinFont, Image, ImageTransform, Mm, PdfDocument};
use std::path::Path;

pub const DOCUMENT_TITLE: &str = "Student Record";

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 10.0;
const LINE_HEIGHT_MM: f32 = 10.0;
const LABEL_WIDTH_MM: f32 = 50.0;
const TITLE_PT: f32 = 16.0;
const BODY_PT: f32 = 12.0;
const PHOTO_WIDTH_MM: f32 = 40.0;
const PT_TO_MM: f32 = 0.352_778;
/// Rough Helvetica-Bold advance per character, in em.
const BOLD_EM_PER_CHAR: f32 = 0.56;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentLine {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentLayout {
    pub title: &'static str,
    pub lines: Vec<DocumentLine>,
}

#[derive(Debug)]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    pub has_photo: bool,
}

/// One line per printable field, in declaration order. id, photo and
/// timestamp are not printed.
pub fn layout(record: &StudentRecord) -> DocumentLayout {
    let line = |label: &'static str, value: String| DocumentLine { label, value };
    DocumentLayout {
        title: DOCUMENT_TITLE,
        lines: vec![
            line("Name", record.name.clone()),
            line("Class", record.class.clone()),
            line("Section", record.section.clone()),
            line("Class Teacher", record.class_teacher.clone()),
            line("Phone", record.phone.clone()),
            line("Year", record.year.clone()),
            line("Fee Paid", record.fee_paid.to_string()),
            line("Fee Balance", record.fee_balance.to_string()),
        ],
    }
}

pub fn file_name(record: &StudentRecord) -> String {
    let stem: String = record
        .name
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if stem.is_empty() {
        format!("student_{}.pdf", record.id)
    } else {
        format!("student_{}_{}.pdf", record.id, stem)
    }
}

/// Single A4 page. A photo that is missing or does not decode is left out.
pub fn render(doc_layout: &DocumentLayout, photo: Option<&Path>) -> anyhow::Result<RenderedDocument> {
    let (doc, page, layer) = PdfDocument::new(
        doc_layout.title,
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Layer 1",
    );
    let current = doc.get_page(page).get_layer(layer);
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .context("failed to load bold font")?;
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .context("failed to load body font")?;

    let mut y = PAGE_HEIGHT_MM - 2.0 * MARGIN_MM;
    let title_width = doc_layout.title.chars().count() as f32 * TITLE_PT * BOLD_EM_PER_CHAR * PT_TO_MM;
    let title_x = ((PAGE_WIDTH_MM - title_width) / 2.0).max(MARGIN_MM);
    current.use_text(doc_layout.title, TITLE_PT, Mm(title_x), Mm(y), &bold);
    y -= 2.0 * LINE_HEIGHT_MM;

    for line in &doc_layout.lines {
        current.use_text(
            format!("{}:", line.label),
            BODY_PT,
            Mm(MARGIN_MM),
            Mm(y),
            &regular,
        );
        current.use_text(
            line.value.as_str(),
            BODY_PT,
            Mm(MARGIN_MM + LABEL_WIDTH_MM),
            Mm(y),
            &regular,
        );
        y -= LINE_HEIGHT_MM;
    }
    y -= LINE_HEIGHT_MM;

    let mut has_photo = false;
    if let Some(rgb) = photo.and_then(load_photo) {
        let (px_w, px_h) = (rgb.width().max(1) as f32, rgb.height().max(1) as f32);
        // Pick the dpi that makes the image exactly PHOTO_WIDTH_MM wide.
        let dpi = px_w * 25.4 / PHOTO_WIDTH_MM;
        let height_mm = PHOTO_WIDTH_MM * px_h / px_w;
        Image::from_dynamic_image(&DynamicImage::ImageRgb8(rgb)).add_to_layer(
            current.clone(),
            ImageTransform {
                translate_x: Some(Mm(MARGIN_MM)),
                translate_y: Some(Mm((y - height_mm).max(0.0))),
                dpi: Some(dpi),
                ..Default::default()
            },
        );
        has_photo = true;
    }

    let bytes = doc.save_to_bytes().context("failed to serialize pdf")?;
    Ok(RenderedDocument { bytes, has_photo })
}

fn load_photo(path: &Path) -> Option<RgbImage> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "photo unreadable, rendering without it");
            return None;
        }
    };
    match image::load_from_memory(&bytes) {
        // Alpha channels are flattened; the page background is white anyway.
        Ok(img) => Some(img.to_rgb8()),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "photo does not decode, rendering without it");
            None
        }
    }
}
