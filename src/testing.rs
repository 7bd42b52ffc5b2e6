//! Test fixtures
//!
//! Builds small PDFs in memory with lopdf so tests never touch disk.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};

use crate::config::Config;
use crate::routes::router;
use crate::state::AppState;

/// In-process server over the full router
pub fn test_server(config: Config) -> axum_test::TestServer {
    axum_test::TestServer::new(router(AppState::new(config))).unwrap()
}

/// Encode a gradient as JPEG
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let picture = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 255 / width.max(1)) as u8, (y * 255 / height.max(1)) as u8, 128])
    });
    let mut output = Cursor::new(Vec::new());
    picture
        .write_with_encoder(JpegEncoder::new_with_quality(&mut output, 90))
        .unwrap();
    output.into_inner()
}

/// Soft mask attached to a [`TestImage`]
enum Mask {
    None,
    Gray,
    /// `/SMask` pointing at the image itself
    OwnStream,
}

/// An image XObject to embed in a test PDF
pub struct TestImage {
    dict: Dictionary,
    content: Vec<u8>,
    width: u32,
    height: u32,
    compress: bool,
    mask: Mask,
    /// Palette whose base is the palette object itself
    cyclic_palette: bool,
}

impl TestImage {
    fn raw(width: u32, height: u32, colorspace: Object, content: Vec<u8>) -> Self {
        Self {
            dict: dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => colorspace,
                "BitsPerComponent" => 8,
            },
            content,
            width,
            height,
            compress: false,
            mask: Mask::None,
            cyclic_palette: false,
        }
    }

    fn pixels(width: u32, height: u32, components: usize, value: u8) -> Vec<u8> {
        vec![value; width as usize * height as usize * components]
    }

    pub fn rgb(width: u32, height: u32) -> Self {
        Self::raw(width, height, "DeviceRGB".into(), Self::pixels(width, height, 3, 180))
    }

    pub fn gray(width: u32, height: u32) -> Self {
        Self::raw(width, height, "DeviceGray".into(), Self::pixels(width, height, 1, 90))
    }

    pub fn cmyk(width: u32, height: u32) -> Self {
        Self::raw(width, height, "DeviceCMYK".into(), Self::pixels(width, height, 4, 60))
    }

    /// Colour space the decoder does not handle
    pub fn unsupported(width: u32, height: u32) -> Self {
        Self::raw(width, height, "Lab".into(), Self::pixels(width, height, 3, 50))
    }

    /// RGB palette image, one byte per index
    pub fn indexed(width: u32, height: u32, palette: Vec<u8>, indices: Vec<u8>) -> Self {
        let hival = (palette.len() / 3) as i64 - 1;
        let colorspace = Object::Array(vec![
            "Indexed".into(),
            "DeviceRGB".into(),
            Object::Integer(hival),
            Object::String(palette, StringFormat::Hexadecimal),
        ]);
        Self::raw(width, height, colorspace, indices)
    }

    /// Stored JPEG stream
    pub fn jpeg(data: Vec<u8>, width: u32, height: u32) -> Self {
        let mut image = Self::raw(width, height, "DeviceRGB".into(), data);
        image.dict.set("Filter", "DCTDecode");
        image
    }

    /// `[/Indexed <self> 1 <palette>]`, a colour space that names itself as base
    pub fn cyclic_indexed(width: u32, height: u32) -> Self {
        let mut image = Self::raw(width, height, Object::Null, vec![0; (width * height) as usize]);
        image.cyclic_palette = true;
        image
    }

    /// Override `/BitsPerComponent`
    pub fn with_bits(mut self, bits: i64) -> Self {
        self.dict.set("BitsPerComponent", bits);
        self
    }

    /// Declare a size in the dictionary without changing the content
    pub fn with_declared_size(mut self, width: i64, height: i64) -> Self {
        self.dict.set("Width", width);
        self.dict.set("Height", height);
        self
    }

    pub fn compressed(mut self) -> Self {
        self.compress = true;
        self
    }

    pub fn with_soft_mask(mut self) -> Self {
        self.mask = Mask::Gray;
        self
    }

    /// `/SMask` referring back to this same image
    pub fn masked_by_itself(mut self) -> Self {
        self.mask = Mask::OwnStream;
        self
    }

    fn add_to(self, doc: &mut Document) -> ObjectId {
        let id = doc.new_object_id();
        let mut dict = self.dict;

        if self.cyclic_palette {
            let palette_id = doc.new_object_id();
            doc.objects.insert(
                palette_id,
                Object::Array(vec![
                    "Indexed".into(),
                    Object::Reference(palette_id),
                    Object::Integer(1),
                    Object::String(vec![0, 0, 0, 255, 255, 255], StringFormat::Hexadecimal),
                ]),
            );
            dict.set("ColorSpace", palette_id);
        }

        if matches!(self.mask, Mask::OwnStream) {
            dict.set("SMask", id);
        }
        if matches!(self.mask, Mask::Gray) {
            let mask = Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => self.width as i64,
                    "Height" => self.height as i64,
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8,
                },
                Self::pixels(self.width, self.height, 1, 128),
            );
            let mask_id = doc.add_object(mask);
            dict.set("SMask", mask_id);
        }

        let mut stream = Stream::new(dict, self.content);
        if self.compress {
            stream.compress().unwrap();
        }
        doc.objects.insert(id, Object::Stream(stream));
        id
    }
}

fn xobject_resources(images: &[ObjectId], prefix: &str) -> Dictionary {
    let mut xobjects = Dictionary::new();
    for (i, id) in images.iter().enumerate() {
        xobjects.set(format!("{}{}", prefix, i), *id);
    }
    dictionary! { "XObject" => xobjects }
}

/// Assembles a PDF page by page
pub struct PdfBuilder {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<ObjectId>,
    page_images: Vec<Vec<ObjectId>>,
    tree_resources: Option<Dictionary>,
}

impl PdfBuilder {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            kids: Vec::new(),
            page_images: Vec::new(),
            tree_resources: None,
        }
    }

    fn add_page(&mut self, resources: Option<Dictionary>, images: Vec<ObjectId>) {
        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        };
        if let Some(resources) = resources {
            page.set("Resources", resources);
        }
        let page_id = self.doc.add_object(page);
        self.kids.push(page_id);
        self.page_images.push(images);
    }

    /// Page whose resources list `images` directly
    pub fn page(mut self, images: Vec<TestImage>) -> Self {
        let ids: Vec<ObjectId> = images
            .into_iter()
            .map(|image| image.add_to(&mut self.doc))
            .collect();
        let resources = xobject_resources(&ids, "Im");
        self.add_page(Some(resources), ids);
        self
    }

    /// Page reusing an image object from an earlier page
    pub fn shared_page(mut self, page: usize, image: usize) -> Self {
        let id = self.page_images[page][image];
        let resources = xobject_resources(&[id], "Im");
        self.add_page(Some(resources), vec![id]);
        self
    }

    /// Page without its own resources, inheriting them from the page tree
    pub fn inherited_page(mut self, image: TestImage) -> Self {
        let id = image.add_to(&mut self.doc);
        self.tree_resources = Some(xobject_resources(&[id], "Im"));
        self.add_page(None, vec![id]);
        self
    }

    /// Page drawing a form XObject that holds the images
    pub fn form_page(mut self, images: Vec<TestImage>) -> Self {
        let ids: Vec<ObjectId> = images
            .into_iter()
            .map(|image| image.add_to(&mut self.doc))
            .collect();
        let form = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "BBox" => vec![0.into(), 0.into(), 100.into(), 100.into()],
                "Resources" => xobject_resources(&ids, "Im"),
            },
            b"q Q".to_vec(),
        );
        let form_id = self.doc.add_object(form);
        let resources = xobject_resources(&[form_id], "Fm");
        self.add_page(Some(resources), ids);
        self
    }

    /// Page with a form whose `/Resources` is not a dictionary, next to `image`
    pub fn broken_form_page(mut self, image: TestImage) -> Self {
        let image_id = image.add_to(&mut self.doc);
        let form = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "BBox" => vec![0.into(), 0.into(), 100.into(), 100.into()],
                "Resources" => 42,
            },
            b"q Q".to_vec(),
        );
        let form_id = self.doc.add_object(form);
        let resources = xobject_resources(&[form_id, image_id], "X");
        self.add_page(Some(resources), vec![image_id]);
        self
    }

    pub fn build(mut self) -> Vec<u8> {
        let kids: Vec<Object> = self.kids.iter().map(|id| Object::Reference(*id)).collect();
        let mut pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => self.kids.len() as i64,
        };
        if let Some(resources) = self.tree_resources.take() {
            pages.set("Resources", resources);
        }
        self.doc
            .objects
            .insert(self.pages_id, Object::Dictionary(pages));

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);

        let mut output = Vec::new();
        self.doc.save_to(&mut output).unwrap();
        output
    }
}
