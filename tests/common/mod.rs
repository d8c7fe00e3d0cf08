//! In-memory EPUB fixtures for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

const SIG_LOCAL_FILE_HEADER: u32 = 0x0403_4b50;
const SIG_CD_ENTRY: u32 = 0x0201_4b50;
const SIG_EOCD: u32 = 0x0605_4b50;

/// Build a ZIP archive. Entries flagged `true` are deflated.
pub fn zip_bytes(files: &[(&str, Vec<u8>, bool)]) -> Vec<u8> {
    let mut zip = Vec::new();
    let mut central = Vec::new();

    for (name, content, deflate) in files {
        let (method, data): (u16, Vec<u8>) = if *deflate {
            (8, miniz_oxide::deflate::compress_to_vec(content, 6))
        } else {
            (0, content.clone())
        };
        let crc = crc32fast::hash(content);
        let offset = zip.len() as u32;

        zip.extend_from_slice(&SIG_LOCAL_FILE_HEADER.to_le_bytes());
        zip.extend_from_slice(&20u16.to_le_bytes());
        zip.extend_from_slice(&0u16.to_le_bytes());
        zip.extend_from_slice(&method.to_le_bytes());
        zip.extend_from_slice(&0u32.to_le_bytes());
        zip.extend_from_slice(&crc.to_le_bytes());
        zip.extend_from_slice(&(data.len() as u32).to_le_bytes());
        zip.extend_from_slice(&(content.len() as u32).to_le_bytes());
        zip.extend_from_slice(&(name.len() as u16).to_le_bytes());
        zip.extend_from_slice(&0u16.to_le_bytes());
        zip.extend_from_slice(name.as_bytes());
        zip.extend_from_slice(&data);

        central.extend_from_slice(&SIG_CD_ENTRY.to_le_bytes());
        central.extend_from_slice(&20u16.to_le_bytes());
        central.extend_from_slice(&20u16.to_le_bytes());
        central.extend_from_slice(&0u16.to_le_bytes());
        central.extend_from_slice(&method.to_le_bytes());
        central.extend_from_slice(&0u32.to_le_bytes());
        central.extend_from_slice(&crc.to_le_bytes());
        central.extend_from_slice(&(data.len() as u32).to_le_bytes());
        central.extend_from_slice(&(content.len() as u32).to_le_bytes());
        central.extend_from_slice(&(name.len() as u16).to_le_bytes());
        central.extend_from_slice(&[0u8; 12]); // extra, comment, disk, attrs
        central.extend_from_slice(&offset.to_le_bytes());
        central.extend_from_slice(name.as_bytes());
    }

    let cd_offset = zip.len() as u32;
    zip.extend_from_slice(&central);
    zip.extend_from_slice(&SIG_EOCD.to_le_bytes());
    zip.extend_from_slice(&0u32.to_le_bytes());
    zip.extend_from_slice(&(files.len() as u16).to_le_bytes());
    zip.extend_from_slice(&(files.len() as u16).to_le_bytes());
    zip.extend_from_slice(&(central.len() as u32).to_le_bytes());
    zip.extend_from_slice(&cd_offset.to_le_bytes());
    zip.extend_from_slice(&0u16.to_le_bytes());
    zip
}

/// Builder for a minimal EPUB 2/3 archive.
pub struct EpubFixture {
    package_path: String,
    write_container: bool,
    title: Option<String>,
    creator: Option<String>,
    cover_meta: Option<String>,
    manifest: Vec<(String, String, String, Option<String>)>,
    spine: Vec<String>,
    files: Vec<(String, Vec<u8>)>,
    deflate: bool,
}

impl EpubFixture {
    pub fn new() -> Self {
        EpubFixture {
            package_path: "OEBPS/content.opf".to_string(),
            write_container: true,
            title: None,
            creator: None,
            cover_meta: None,
            manifest: Vec::new(),
            spine: Vec::new(),
            files: Vec::new(),
            deflate: true,
        }
    }

    pub fn package_path(mut self, path: &str) -> Self {
        self.package_path = path.to_string();
        self
    }

    pub fn without_container(mut self) -> Self {
        self.write_container = false;
        self
    }

    pub fn stored(mut self) -> Self {
        self.deflate = false;
        self
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn creator(mut self, creator: &str) -> Self {
        self.creator = Some(creator.to_string());
        self
    }

    /// Add a manifest item, its content and a spine reference to it.
    pub fn chapter(self, id: &str, href: &str, body: &str) -> Self {
        self.item(id, href, "application/xhtml+xml", None, body.as_bytes())
            .spine_ref(id)
    }

    /// Add a manifest item without referencing it from the spine.
    pub fn item(
        mut self,
        id: &str,
        href: &str,
        media_type: &str,
        properties: Option<&str>,
        content: &[u8],
    ) -> Self {
        self.manifest.push((
            id.to_string(),
            href.to_string(),
            media_type.to_string(),
            properties.map(str::to_string),
        ));
        let path = join(&self.package_path, href);
        self.files.push((path, content.to_vec()));
        self
    }

    /// Manifest entry whose file is absent from the archive.
    pub fn dangling_item(mut self, id: &str, href: &str) -> Self {
        self.manifest.push((
            id.to_string(),
            href.to_string(),
            "application/xhtml+xml".to_string(),
            None,
        ));
        self
    }

    pub fn spine_ref(mut self, idref: &str) -> Self {
        self.spine.push(idref.to_string());
        self
    }

    pub fn cover_meta(mut self, content: &str) -> Self {
        self.cover_meta = Some(content.to_string());
        self
    }

    pub fn opf(&self) -> String {
        let mut metadata = String::new();
        if let Some(title) = &self.title {
            metadata.push_str(&format!("    <dc:title>{}</dc:title>\n", title));
        }
        if let Some(creator) = &self.creator {
            metadata.push_str(&format!("    <dc:creator>{}</dc:creator>\n", creator));
        }
        if let Some(cover) = &self.cover_meta {
            metadata.push_str(&format!("    <meta name=\"cover\" content=\"{}\"/>\n", cover));
        }
        let manifest: String = self
            .manifest
            .iter()
            .map(|(id, href, media_type, properties)| {
                let props = properties
                    .as_ref()
                    .map(|p| format!(" properties=\"{}\"", p))
                    .unwrap_or_default();
                format!(
                    "    <item id=\"{}\" href=\"{}\" media-type=\"{}\"{}/>\n",
                    id, href, media_type, props
                )
            })
            .collect();
        let spine: String = self
            .spine
            .iter()
            .map(|idref| format!("    <itemref idref=\"{}\"/>\n", idref))
            .collect();
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <package xmlns=\"http://www.idpf.org/2007/opf\" version=\"3.0\">\n\
             <metadata xmlns:dc=\"http://purl.org/dc/elements/1.1/\">\n{}</metadata>\n\
             <manifest>\n{}</manifest>\n<spine>\n{}</spine>\n</package>\n",
            metadata, manifest, spine
        )
    }

    pub fn build(&self) -> Vec<u8> {
        let mut files = vec![("mimetype", b"application/epub+zip".to_vec(), false)];
        let container = container_xml(&self.package_path);
        if self.write_container {
            files.push(("META-INF/container.xml", container.into_bytes(), self.deflate));
        }
        files.push((self.package_path.as_str(), self.opf().into_bytes(), self.deflate));
        for (path, content) in &self.files {
            files.push((path.as_str(), content.clone(), self.deflate));
        }
        zip_bytes(&files)
    }

    /// Write the archive to `dir/name` and return its path.
    pub fn write_to(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, self.build()).unwrap();
        path
    }
}

pub fn container_xml(package_path: &str) -> String {
    format!(
        "<?xml version=\"1.0\"?>\n\
         <container version=\"1.0\" xmlns=\"urn:oasis:names:tc:opendocument:xmlns:container\">\n\
         <rootfiles>\n\
         <rootfile full-path=\"{}\" media-type=\"application/oebps-package+xml\"/>\n\
         </rootfiles>\n\
         </container>\n",
        package_path
    )
}

pub fn xhtml(title: Option<&str>, body: &str) -> String {
    let head = title
        .map(|t| format!("<head><title>{}</title></head>", t))
        .unwrap_or_default();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <html xmlns=\"http://www.w3.org/1999/xhtml\">{}<body>{}</body></html>",
        head, body
    )
}

/// Three chapters and a cover image under `OEBPS/`.
pub fn sample_book() -> EpubFixture {
    EpubFixture::new()
        .title("The Long Road")
        .creator("A. Writer")
        .cover_meta("cover-img")
        .item("cover-img", "images/cover.png", "image/png", None, PNG_BYTES)
        .chapter(
            "c1",
            "text/ch1.xhtml",
            &xhtml(Some("Departure"), "<h1>One</h1><p>They left at dawn.</p>"),
        )
        .chapter(
            "c2",
            "text/ch2.xhtml",
            &xhtml(None, "<h1>The River</h1><p>Water, everywhere.</p>"),
        )
        .chapter(
            "c3",
            "text/ch3.xhtml",
            &xhtml(None, "<p>No heading here.</p>"),
        )
}

pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nfake-image-data";

fn join(package_path: &str, href: &str) -> String {
    match package_path.rfind('/') {
        Some(idx) => format!("{}/{}", &package_path[..idx], href),
        None => href.to_string(),
    }
}
