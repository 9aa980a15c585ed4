#![allow(dead_code)]

use flate2::Compression;
use flate2::write::DeflateEncoder;
use std::io::Write;

pub const NO_KEY: u16 = 0xFFFF;

pub fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

pub fn block_map_xml(files: &[(u32, &str)]) -> Vec<u8> {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <BlockMap xmlns=\"http://schemas.microsoft.com/appx/2010/blockmap\" \
         HashMethod=\"http://www.w3.org/2001/04/xmlenc#sha256\">\n",
    );
    for (id, name) in files {
        xml.push_str(&format!(
            "  <File Name=\"{name}\" Size=\"0\" LfhSize=\"30\" Id=\"{id:X}\"><Block Hash=\"AA==\"/></File>\n"
        ));
    }
    xml.push_str("</BlockMap>\n");
    xml.into_bytes()
}

pub fn bundle_manifest_xml(packages: &[(u64, &str)]) -> Vec<u8> {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <Bundle xmlns=\"http://schemas.microsoft.com/appx/2013/bundle\" SchemaVersion=\"5.0\">\n\
         <Identity Name=\"Contoso.App\" Publisher=\"CN=Contoso\" Version=\"1.0.0.0\"/>\n\
         <Packages>\n",
    );
    for (offset, name) in packages {
        xml.push_str(&format!(
            "  <Package Type=\"application\" FileName=\"{name}\" Offset=\"{offset}\" Size=\"0\"/>\n"
        ));
    }
    xml.push_str("</Packages>\n</Bundle>\n");
    xml.into_bytes()
}

struct Stored {
    offset: u64,
    zipped: u16,
    orig_len: u64,
    len: u64,
}

struct Record {
    id: u32,
    flags: u16,
    stored: Stored,
}

/// Lays out a container: header, then side files and parts in the order
/// they are added, then the part table.
pub struct ContainerBuilder {
    magic: [u8; 4],
    header_size: Option<u16>,
    package_name: String,
    keys: Vec<[u8; 16]>,
    block_map_file_id: u64,
    body: Vec<u8>,
    signature: Option<Stored>,
    code_integrity: Option<Stored>,
    records: Vec<Record>,
}

impl ContainerBuilder {
    pub fn new(magic: &[u8; 4]) -> Self {
        Self {
            magic: *magic,
            header_size: None,
            package_name: "Contoso.App_1.0.0.0_x64__8wekyb3d8bbwe".to_string(),
            keys: Vec::new(),
            block_map_file_id: 0,
            body: Vec::new(),
            signature: None,
            code_integrity: None,
            records: Vec::new(),
        }
    }

    /// Declare a shorter header; fields past it are not written.
    pub fn with_header_size(mut self, size: u16) -> Self {
        self.header_size = Some(size);
        self
    }

    pub fn with_key(mut self, key: [u8; 16]) -> Self {
        self.keys.push(key);
        self
    }

    pub fn block_map_file_id(&mut self, id: u64) -> &mut Self {
        self.block_map_file_id = id;
        self
    }

    fn header_len(&self) -> usize {
        match self.header_size {
            Some(size) => size as usize,
            None => self.encode_header(0, 0).len(),
        }
    }

    /// Offset the next added part or side file will be stored at.
    pub fn next_offset(&self) -> u64 {
        (self.header_len() + self.body.len()) as u64
    }

    pub fn pad_to(&mut self, offset: u64) -> &mut Self {
        let current = self.next_offset();
        assert!(offset >= current, "cannot pad backwards");
        self.body.resize(self.body.len() + (offset - current) as usize, 0xCC);
        self
    }

    fn store(&mut self, data: &[u8], compress: bool) -> Stored {
        let offset = self.next_offset();
        let bytes = if compress { deflate(data) } else { data.to_vec() };
        self.body.extend_from_slice(&bytes);
        Stored {
            offset,
            zipped: u16::from(compress),
            orig_len: data.len() as u64,
            len: bytes.len() as u64,
        }
    }

    pub fn signature(&mut self, data: &[u8], compress: bool) -> u64 {
        let stored = self.store(data, compress);
        let offset = stored.offset;
        self.signature = Some(stored);
        offset
    }

    pub fn code_integrity(&mut self, data: &[u8], compress: bool) -> u64 {
        let stored = self.store(data, compress);
        let offset = stored.offset;
        self.code_integrity = Some(stored);
        offset
    }

    /// Add a part and return its offset.
    pub fn part(&mut self, id: u32, flags: u16, data: &[u8], compress: bool) -> u64 {
        let stored = self.store(data, compress);
        let offset = stored.offset;
        self.records.push(Record { id, flags, stored });
        offset
    }

    fn encode_header(&self, footer_offset: u64, footer_length: u64) -> Vec<u8> {
        fn utf16(text: &str) -> Vec<u8> {
            text.encode_utf16().flat_map(|u| u.to_le_bytes()).collect()
        }
        fn descriptor(out: &mut Vec<u8>, stored: Option<&Stored>) {
            let (offset, zipped, orig, len) = stored
                .map(|s| (s.offset, s.zipped, s.orig_len as u32, s.len as u32))
                .unwrap_or_default();
            out.extend_from_slice(&offset.to_le_bytes());
            out.extend_from_slice(&zipped.to_le_bytes());
            out.extend_from_slice(&orig.to_le_bytes());
            out.extend_from_slice(&len.to_le_bytes());
        }

        let mut out = self.magic.to_vec();
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&1u64.to_le_bytes());
        out.extend_from_slice(&footer_offset.to_le_bytes());
        out.extend_from_slice(&footer_length.to_le_bytes());
        out.extend_from_slice(&(self.records.len() as u64).to_le_bytes());
        descriptor(&mut out, self.signature.as_ref());
        descriptor(&mut out, self.code_integrity.as_ref());
        out.extend_from_slice(&self.block_map_file_id.to_le_bytes());
        out.extend_from_slice(&((self.keys.len() * 16) as u32).to_le_bytes());
        out.extend_from_slice(&(self.keys.len() as u16).to_le_bytes());
        for key in &self.keys {
            out.extend_from_slice(key);
        }
        let name = utf16(&self.package_name);
        out.extend_from_slice(&(self.package_name.encode_utf16().count() as u16).to_le_bytes());
        out.extend_from_slice(&(name.len() as u16).to_le_bytes());
        out.extend_from_slice(&name);
        let algo = utf16("AES256_XTS");
        out.extend_from_slice(&(algo.len() as u16).to_le_bytes());
        out.extend_from_slice(&algo);
        out.extend_from_slice(&0u16.to_le_bytes());
        let method = utf16("SHA256");
        out.extend_from_slice(&(method.len() as u16).to_le_bytes());
        out.extend_from_slice(&method);
        out.extend_from_slice(&32u16.to_le_bytes());
        out.extend_from_slice(&[0x5A; 32]);

        let size = self.header_size.map_or(out.len(), |s| s as usize);
        out.resize(size, 0);
        out[4..6].copy_from_slice(&(size as u16).to_le_bytes());
        out
    }

    pub fn build(&self) -> Vec<u8> {
        let footer_offset = self.next_offset();
        let footer_length = (self.records.len() * 40) as u64;

        let mut out = self.encode_header(footer_offset, footer_length);
        out.extend_from_slice(&self.body);
        for record in &self.records {
            let mut rec = [0u8; 40];
            rec[0..2].copy_from_slice(&0x4645u16.to_le_bytes());
            rec[2..4].copy_from_slice(&40u16.to_le_bytes());
            rec[4..6].copy_from_slice(&record.flags.to_le_bytes());
            rec[6..8].copy_from_slice(&record.stored.zipped.to_le_bytes());
            rec[8..12].copy_from_slice(&record.id.to_le_bytes());
            rec[16..24].copy_from_slice(&record.stored.offset.to_le_bytes());
            rec[24..32].copy_from_slice(&record.stored.orig_len.to_le_bytes());
            rec[32..40].copy_from_slice(&record.stored.len.to_le_bytes());
            out.extend_from_slice(&rec);
        }
        out
    }
}

/// A minimal package: an uncompressed manifest, one compressed asset and the block map.
pub fn sample_package(asset: &[u8]) -> Vec<u8> {
    let mut package = ContainerBuilder::new(b"EXPH");
    package.part(0, NO_KEY, b"<Package/>", false);
    package.part(1, 0, asset, true);
    package.block_map_file_id(2);
    package.part(
        2,
        NO_KEY,
        &block_map_xml(&[(0, "AppxManifest.xml"), (1, "Assets\\Logo.png")]),
        true,
    );
    package.build()
}

/// A bundle holding `packages` at or after `pad`, each listed in its manifest.
pub fn sample_bundle(pad: u64, packages: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut bundle = ContainerBuilder::new(b"EXBH");
    let start = pad.max(bundle.next_offset());
    bundle.pad_to(start);

    let mut listed = Vec::new();
    let mut names = Vec::new();
    for (index, (name, data)) in packages.iter().enumerate() {
        let id = index as u32 + 1;
        listed.push((bundle.part(id, NO_KEY, data, false), *name));
        names.push((id, *name));
    }
    let manifest_id = packages.len() as u32 + 1;
    bundle.part(manifest_id, NO_KEY, &bundle_manifest_xml(&listed), true);
    names.push((manifest_id, "AppxMetadata\\AppxBundleManifest.xml"));
    bundle.block_map_file_id(u64::from(manifest_id + 1));
    bundle.part(manifest_id + 1, NO_KEY, &block_map_xml(&names), true);
    bundle.build()
}
