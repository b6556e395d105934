//! lopdf-backed page source.
//!
//! Interprets page content streams into text and image primitives. Each
//! `BT`..`ET` object becomes one text primitive; a line break is recorded
//! whenever the baseline moves. Image XObjects painted with `Do` become
//! image primitives positioned by the current transformation matrix.
//! Form XObjects and inline images are not descended into.

use std::collections::BTreeMap;
use std::path::Path;

use lopdf::content::Content;
use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId, Stream};

use super::PageSource;
use crate::detect::{detect_format_from_bytes, detect_format_from_path};
use crate::error::{Error, Result};
use crate::model::{BBox, ImageData, Page, TextLine, TextRun};

/// Average glyph advance as a fraction of the font size.
const GLYPH_WIDTH: f32 = 0.5;
/// Ascent and descent as fractions of the font size.
const ASCENT: f32 = 0.8;
const DESCENT: f32 = 0.2;
/// TJ adjustment (thousandths of an em) treated as a word space.
const TJ_SPACE_THRESHOLD: f32 = 200.0;
/// Limit for walking inherited page attributes.
const MAX_TREE_DEPTH: usize = 32;

/// Page source reading a PDF through lopdf.
pub struct PdfSource {
    doc: LopdfDocument,
    pages: Vec<(u32, ObjectId)>,
}

impl PdfSource {
    /// Open a PDF file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        detect_format_from_path(path)?;
        let doc = LopdfDocument::load(path)?;
        Ok(Self::from_document(doc))
    }

    /// Load a PDF from memory.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        detect_format_from_bytes(data)?;
        let doc = LopdfDocument::load_mem(data)?;
        Ok(Self::from_document(doc))
    }

    /// Wrap an already loaded document.
    pub fn from_document(doc: LopdfDocument) -> Self {
        let pages = doc.get_pages().into_iter().collect();
        Self { doc, pages }
    }

    /// PDF version string from the header.
    pub fn version(&self) -> String {
        self.doc.version.to_string()
    }

    fn resolve<'a>(&'a self, obj: &'a Object) -> Option<&'a Object> {
        match obj {
            Object::Reference(id) => self.doc.get_object(*id).ok(),
            other => Some(other),
        }
    }

    /// Look up a page attribute, following the `Parent` chain.
    fn inherited(&self, page_id: ObjectId, key: &[u8]) -> Option<&Object> {
        let mut dict = self.doc.get_dictionary(page_id).ok()?;
        for _ in 0..MAX_TREE_DEPTH {
            if let Ok(value) = dict.get(key) {
                return self.resolve(value);
            }
            let parent = dict.get(b"Parent").ok()?.as_reference().ok()?;
            dict = self.doc.get_dictionary(parent).ok()?;
        }
        None
    }

    fn media_box(&self, page_id: ObjectId) -> MediaBox {
        let values: Option<Vec<f32>> = self
            .inherited(page_id, b"MediaBox")
            .and_then(|o| o.as_array().ok())
            .map(|arr| {
                arr.iter()
                    .filter_map(|o| self.resolve(o).and_then(number))
                    .collect()
            });

        match values.as_deref() {
            Some([x0, y0, x1, y1]) if x1 != x0 && y1 != y0 => MediaBox {
                x0: x0.min(*x1),
                y0: y0.min(*y1),
                x1: x0.max(*x1),
                y1: y0.max(*y1),
            },
            _ => MediaBox::default(),
        }
    }

    fn image_xobjects(&self, page_id: ObjectId) -> BTreeMap<Vec<u8>, &Stream> {
        let mut images = BTreeMap::new();
        let Some(xobjects) = self
            .inherited(page_id, b"Resources")
            .and_then(|o| o.as_dict().ok())
            .and_then(|res| res.get(b"XObject").ok())
            .and_then(|o| self.resolve(o))
            .and_then(|o| o.as_dict().ok())
        else {
            return images;
        };

        for (name, value) in xobjects.iter() {
            let Some(stream) = self.resolve(value).and_then(|o| o.as_stream().ok()) else {
                continue;
            };
            let is_image = stream
                .dict
                .get(b"Subtype")
                .ok()
                .and_then(|o| o.as_name().ok())
                == Some(b"Image".as_slice());
            if is_image {
                images.insert(name.clone(), stream);
            }
        }
        images
    }

    fn image_data(&self, stream: &Stream) -> ImageData {
        let dict = &stream.dict;
        let filters = filter_names(dict.get(b"Filter").ok().and_then(|o| self.resolve(o)));

        if filters.iter().any(|f| f == b"DCTDecode") {
            return ImageData::Encoded(stream.content.clone());
        }
        if filters
            .iter()
            .any(|f| matches!(f.as_slice(), b"JPXDecode" | b"JBIG2Decode" | b"CCITTFaxDecode"))
        {
            log::debug!("Skipping image with unsupported filter {:?}", filters);
            return ImageData::Missing;
        }

        let int = |key: &[u8]| {
            dict.get(key)
                .ok()
                .and_then(|o| self.resolve(o))
                .and_then(number)
                .map(|n| n as u32)
        };
        let (Some(width), Some(height)) = (int(b"Width"), int(b"Height")) else {
            return ImageData::Missing;
        };
        if int(b"BitsPerComponent").unwrap_or(8) != 8 {
            return ImageData::Missing;
        }
        let Some(components) = dict
            .get(b"ColorSpace")
            .ok()
            .and_then(|o| self.color_components(o))
        else {
            return ImageData::Missing;
        };

        let samples = if filters.is_empty() {
            stream.content.clone()
        } else {
            match stream.decompressed_content() {
                Ok(data) => data,
                Err(e) => {
                    log::debug!("Image stream did not decompress: {}", e);
                    return ImageData::Missing;
                }
            }
        };

        ImageData::Raw {
            width,
            height,
            components,
            samples,
        }
    }

    fn color_components(&self, obj: &Object) -> Option<u8> {
        match self.resolve(obj)? {
            Object::Name(name) => match name.as_slice() {
                b"DeviceGray" | b"CalGray" | b"G" => Some(1),
                b"DeviceRGB" | b"CalRGB" | b"RGB" => Some(3),
                b"DeviceCMYK" | b"CMYK" => Some(4),
                _ => None,
            },
            Object::Array(arr) => {
                let family = arr.first()?.as_name().ok()?;
                match family {
                    b"ICCBased" => {
                        let profile = self.resolve(arr.get(1)?)?.as_stream().ok()?;
                        let n = profile.dict.get(b"N").ok().and_then(number)?;
                        u8::try_from(n as i64).ok()
                    }
                    b"CalGray" => Some(1),
                    b"CalRGB" => Some(3),
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

impl PageSource for PdfSource {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page(&self, index: usize) -> Result<Page> {
        let &(number, page_id) = self
            .pages
            .get(index)
            .ok_or(Error::PageOutOfRange(index as u32 + 1, self.pages.len() as u32))?;

        let media = self.media_box(page_id);
        let fonts = self.doc.get_page_fonts(page_id)?;
        let images = self.image_xobjects(page_id);
        let content = self.doc.get_page_content(page_id)?;
        let operations = Content::decode(&content)?.operations;

        let mut interpreter = Interpreter::new(self, &fonts, &images, media, number);
        for op in &operations {
            interpreter.apply(&op.operator, &op.operands);
        }
        let page = interpreter.finish();

        log::debug!(
            "Page {}: {} primitives ({}x{})",
            page.number,
            page.primitives.len(),
            page.width,
            page.height
        );
        Ok(page)
    }
}

#[derive(Debug, Clone, Copy)]
struct MediaBox {
    x0: f32,
    y0: f32,
    x1: f32,
    y1: f32,
}

impl Default for MediaBox {
    fn default() -> Self {
        Self {
            x0: 0.0,
            y0: 0.0,
            x1: 612.0,
            y1: 792.0,
        }
    }
}

impl MediaBox {
    /// Convert a PDF-space rectangle (y up) to a page box (y down).
    fn to_page(self, x0: f32, y_low: f32, x1: f32, y_high: f32) -> BBox {
        BBox::new(
            x0 - self.x0,
            self.y1 - y_high,
            x1 - self.x0,
            self.y1 - y_low,
        )
    }
}

/// Affine matrix `[a b c d e f]` in PDF row-vector convention.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix {
    const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    fn from_operands(operands: &[Object]) -> Option<Matrix> {
        let v: Vec<f32> = operands.iter().take(6).filter_map(number).collect();
        match v.as_slice() {
            &[a, b, c, d, e, f] => Some(Matrix { a, b, c, d, e, f }),
            _ => None,
        }
    }

    fn translation(tx: f32, ty: f32) -> Matrix {
        Matrix {
            e: tx,
            f: ty,
            ..Self::IDENTITY
        }
    }

    /// `self × other`
    fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            x * self.a + y * self.c + self.e,
            x * self.b + y * self.d + self.f,
        )
    }

    fn horizontal_scale(&self) -> f32 {
        (self.a * self.a + self.b * self.b).sqrt()
    }

    fn vertical_scale(&self) -> f32 {
        (self.c * self.c + self.d * self.d).sqrt()
    }
}

/// Content stream state machine for one page.
struct Interpreter<'a> {
    source: &'a PdfSource,
    fonts: &'a BTreeMap<Vec<u8>, &'a Dictionary>,
    images: &'a BTreeMap<Vec<u8>, &'a Stream>,
    media: MediaBox,
    page: Page,

    ctm: Matrix,
    ctm_stack: Vec<Matrix>,
    tm: Matrix,
    tlm: Matrix,
    font_key: Vec<u8>,
    font_size: f32,
    bold: bool,
    leading: f32,

    in_text: bool,
    lines: Vec<TextLine>,
    runs: Vec<TextRun>,
    baseline: Option<f32>,
}

impl<'a> Interpreter<'a> {
    fn new(
        source: &'a PdfSource,
        fonts: &'a BTreeMap<Vec<u8>, &'a Dictionary>,
        images: &'a BTreeMap<Vec<u8>, &'a Stream>,
        media: MediaBox,
        number: u32,
    ) -> Self {
        Self {
            source,
            fonts,
            images,
            media,
            page: Page::new(number, media.x1 - media.x0, media.y1 - media.y0),
            ctm: Matrix::IDENTITY,
            ctm_stack: Vec::new(),
            tm: Matrix::IDENTITY,
            tlm: Matrix::IDENTITY,
            font_key: Vec::new(),
            font_size: 12.0,
            bold: false,
            leading: 0.0,
            in_text: false,
            lines: Vec::new(),
            runs: Vec::new(),
            baseline: None,
        }
    }

    fn apply(&mut self, operator: &str, operands: &[Object]) {
        match operator {
            "q" => self.ctm_stack.push(self.ctm),
            "Q" => {
                if let Some(ctm) = self.ctm_stack.pop() {
                    self.ctm = ctm;
                }
            }
            "cm" => {
                if let Some(m) = Matrix::from_operands(operands) {
                    self.ctm = m.multiply(&self.ctm);
                }
            }
            "BT" => {
                self.in_text = true;
                self.tm = Matrix::IDENTITY;
                self.tlm = Matrix::IDENTITY;
            }
            "ET" => {
                self.in_text = false;
                self.flush_block();
            }
            "Tf" => {
                if let Some(Object::Name(key)) = operands.first() {
                    self.font_key = key.clone();
                    self.bold = self.font_is_bold(key);
                }
                if let Some(size) = operands.get(1).and_then(number) {
                    self.font_size = size;
                }
            }
            "TL" => {
                if let Some(leading) = operands.first().and_then(number) {
                    self.leading = leading;
                }
            }
            "Td" | "TD" => {
                let tx = operands.first().and_then(number).unwrap_or(0.0);
                let ty = operands.get(1).and_then(number).unwrap_or(0.0);
                if operator == "TD" {
                    self.leading = -ty;
                }
                self.move_line(tx, ty);
            }
            "Tm" => {
                if let Some(m) = Matrix::from_operands(operands) {
                    self.tm = m;
                    self.tlm = m;
                }
            }
            "T*" => self.next_line(),
            "Tj" => {
                if let Some(Object::String(bytes, _)) = operands.first() {
                    let text = self.decode(bytes);
                    self.show(text);
                }
            }
            "'" => {
                self.next_line();
                if let Some(Object::String(bytes, _)) = operands.first() {
                    let text = self.decode(bytes);
                    self.show(text);
                }
            }
            "\"" => {
                self.next_line();
                if let Some(Object::String(bytes, _)) = operands.get(2) {
                    let text = self.decode(bytes);
                    self.show(text);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    let text = self.decode_array(items);
                    self.show(text);
                }
            }
            "Do" => {
                if let Some(Object::Name(name)) = operands.first() {
                    self.paint_image(name);
                }
            }
            _ => {}
        }
    }

    fn finish(mut self) -> Page {
        self.flush_block();
        self.page
    }

    fn font_is_bold(&self, key: &[u8]) -> bool {
        let base_font = self
            .fonts
            .get(key)
            .and_then(|f| f.get(b"BaseFont").ok())
            .and_then(|o| o.as_name().ok())
            .map(|n| String::from_utf8_lossy(n).to_lowercase())
            .unwrap_or_default();
        base_font.contains("bold") || base_font.contains("black") || base_font.contains("heavy")
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.tlm = Matrix::translation(tx, ty).multiply(&self.tlm);
        self.tm = self.tlm;
    }

    fn next_line(&mut self) {
        let leading = if self.leading != 0.0 {
            self.leading
        } else {
            self.font_size * 1.2
        };
        self.move_line(0.0, -leading);
    }

    fn decode(&self, bytes: &[u8]) -> String {
        if let Some(font) = self.fonts.get(&self.font_key) {
            if let Ok(encoding) = font.get_font_encoding(&self.source.doc) {
                if let Ok(text) = LopdfDocument::decode_text(&encoding, bytes) {
                    return text;
                }
            }
        }
        decode_text_simple(bytes)
    }

    /// Concatenate a TJ array, inserting a space at large negative kerning.
    fn decode_array(&self, items: &[Object]) -> String {
        let mut combined = String::new();
        for item in items {
            match item {
                Object::String(bytes, _) => combined.push_str(&self.decode(bytes)),
                other => {
                    let Some(adjustment) = number(other).map(|n| -n) else {
                        continue;
                    };
                    let needs_space = adjustment > TJ_SPACE_THRESHOLD
                        && combined
                            .chars()
                            .last()
                            .is_some_and(|c| !c.is_whitespace() && !is_spaceless_script_char(c));
                    if needs_space {
                        combined.push(' ');
                    }
                }
            }
        }
        combined
    }

    fn show(&mut self, text: String) {
        if !self.in_text {
            return;
        }
        let advance = text.chars().count() as f32 * self.font_size * GLYPH_WIDTH;

        if !text.trim().is_empty() {
            let trm = self.tm.multiply(&self.ctm);
            let size = self.font_size * trm.vertical_scale();
            let width = advance * trm.horizontal_scale();
            let (x, baseline) = (trm.e, trm.f);

            if let Some(current) = self.baseline {
                if (current - baseline).abs() > (size * 0.3).max(1.0) {
                    self.flush_line();
                }
            }
            self.baseline = Some(baseline);

            let bbox = self.media.to_page(
                x,
                baseline - DESCENT * size,
                x + width,
                baseline + ASCENT * size,
            );
            self.runs
                .push(TextRun::new(text.trim_end().to_string(), size, self.bold, bbox));
        }

        self.tm = Matrix::translation(advance, 0.0).multiply(&self.tm);
    }

    fn paint_image(&mut self, name: &[u8]) {
        let Some(stream) = self.images.get(name) else {
            return;
        };
        let corners = [
            self.ctm.apply(0.0, 0.0),
            self.ctm.apply(1.0, 0.0),
            self.ctm.apply(0.0, 1.0),
            self.ctm.apply(1.0, 1.0),
        ];
        let (mut x0, mut y0, mut x1, mut y1) = (f32::MAX, f32::MAX, f32::MIN, f32::MIN);
        for (x, y) in corners {
            x0 = x0.min(x);
            y0 = y0.min(y);
            x1 = x1.max(x);
            y1 = y1.max(y);
        }

        self.flush_block();
        let bbox = self.media.to_page(x0, y0, x1, y1);
        let data = self.source.image_data(stream);
        self.page.add_image(bbox, data);
    }

    fn flush_line(&mut self) {
        if !self.runs.is_empty() {
            let runs = std::mem::take(&mut self.runs);
            self.lines.push(TextLine::from_runs(runs));
        }
        self.baseline = None;
    }

    fn flush_block(&mut self) {
        self.flush_line();
        if !self.lines.is_empty() {
            let lines = std::mem::take(&mut self.lines);
            self.page.add_text(lines);
        }
    }
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

fn filter_names(obj: Option<&Object>) -> Vec<Vec<u8>> {
    match obj {
        Some(Object::Name(name)) => vec![name.clone()],
        Some(Object::Array(arr)) => arr
            .iter()
            .filter_map(|o| o.as_name().ok().map(<[u8]>::to_vec))
            .collect(),
        _ => Vec::new(),
    }
}

/// Scripts written without spaces between words (Han, kana).
fn is_spaceless_script_char(c: char) -> bool {
    let code = c as u32;
    (0x4E00..=0x9FFF).contains(&code)
        || (0x3400..=0x4DBF).contains(&code)
        || (0x20000..=0x2EBEF).contains(&code)
        || (0x3040..=0x30FF).contains(&code)
        || (0x3000..=0x303F).contains(&code)
}

/// Decode string bytes without a font encoding: UTF-16BE with BOM, UTF-8,
/// then Latin-1.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let utf16: Vec<u16> = rest
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }

    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}
