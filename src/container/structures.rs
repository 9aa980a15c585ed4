use std::fmt;

/// Size of one record in the part table.
pub const PART_RECORD_SIZE: usize = 40;

/// Size of the magic plus the header size field.
pub const HEADER_PREFIX_SIZE: usize = 6;

/// Key slot value marking a part that is stored without encryption.
pub const NO_KEY_SLOT: u16 = 0xFFFF;

pub const BLOCK_MAP_PATH: &str = "AppxBlockMap.xml";
pub const BUNDLE_MANIFEST_PATH: &str = "AppxMetadata/AppxBundleManifest.xml";
pub const SIGNATURE_PATH: &str = "AppxSignature.p7x";
pub const CODE_INTEGRITY_PATH: &str = "AppxMetadata/CodeIntegrity.cat";

/// Container flavours, keyed by the magic at the container's base offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// `EXPH`
    Package,
    /// `EXSH`
    PackageAlt,
    /// `EXBH`
    Bundle,
}

impl ContainerKind {
    pub const PACKAGE_MAGIC: u32 = 0x4850_5845;
    pub const PACKAGE_ALT_MAGIC: u32 = 0x4853_5845;
    pub const BUNDLE_MAGIC: u32 = 0x4842_5845;

    pub fn from_magic(magic: u32) -> Option<Self> {
        match magic {
            Self::PACKAGE_MAGIC => Some(ContainerKind::Package),
            Self::PACKAGE_ALT_MAGIC => Some(ContainerKind::PackageAlt),
            Self::BUNDLE_MAGIC => Some(ContainerKind::Bundle),
            _ => None,
        }
    }

    pub fn magic(&self) -> u32 {
        match self {
            ContainerKind::Package => Self::PACKAGE_MAGIC,
            ContainerKind::PackageAlt => Self::PACKAGE_ALT_MAGIC,
            ContainerKind::Bundle => Self::BUNDLE_MAGIC,
        }
    }

    pub fn is_bundle(&self) -> bool {
        *self == ContainerKind::Bundle
    }
}

/// How a stored byte range is encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Stored,
    /// Raw DEFLATE stream, no zlib or gzip envelope
    Deflate,
}

impl Compression {
    pub fn from_u16(value: u16) -> Self {
        match value {
            1 => Compression::Deflate,
            _ => Compression::Stored,
        }
    }
}

/// Location of a side file (signature or code integrity catalog) in the header
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamDescriptor {
    pub offset: u64,
    pub zipped: u16,
    pub orig_len: u32,
    pub len: u32,
}

impl StreamDescriptor {
    pub fn is_present(&self) -> bool {
        self.offset != 0 && self.len != 0
    }

    pub fn compression(&self) -> Compression {
        Compression::from_u16(self.zipped)
    }
}

/// 16-byte key identifier, laid out like a Windows GUID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyId(pub [u8; 16]);

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        let data1 = u32::from_le_bytes([b[0], b[1], b[2], b[3]]);
        let data2 = u16::from_le_bytes([b[4], b[5]]);
        let data3 = u16::from_le_bytes([b[6], b[7]]);
        write!(f, "{data1:08x}-{data2:04x}-{data3:04x}-{:02x}{:02x}-", b[8], b[9])?;
        for byte in &b[10..] {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Decoded container header.
///
/// Fields after `header_size` keep their zero value when the declared
/// header region ends before they are reached.
#[derive(Debug, Clone)]
pub struct ContainerHeader {
    pub kind: ContainerKind,
    pub header_size: u16,
    pub file_version: u64,
    pub footer_offset: u64,
    pub footer_length: u64,
    pub file_count: u64,
    pub signature: StreamDescriptor,
    pub code_integrity: StreamDescriptor,
    /// `None` when the header region ends before this field
    pub block_map_file_id: Option<u64>,
    pub keys: Vec<KeyId>,
    pub package_name: String,
    pub crypto_algorithm: String,
    pub diffusion_enabled: u16,
    pub block_map_hash_method: String,
    pub block_map_hash: Vec<u8>,
}

impl ContainerHeader {
    pub fn new(kind: ContainerKind, header_size: u16) -> Self {
        Self {
            kind,
            header_size,
            file_version: 0,
            footer_offset: 0,
            footer_length: 0,
            file_count: 0,
            signature: StreamDescriptor::default(),
            code_integrity: StreamDescriptor::default(),
            block_map_file_id: None,
            keys: Vec::new(),
            package_name: String::new(),
            crypto_algorithm: String::new(),
            diffusion_enabled: 0,
            block_map_hash_method: String::new(),
            block_map_hash: Vec::new(),
        }
    }
}

impl fmt::Display for ContainerHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Kind:                {:?}", self.kind)?;
        writeln!(f, "Header size:         {:#x}", self.header_size)?;
        writeln!(f, "File version:        {:#x}", self.file_version)?;
        writeln!(f, "Footer offset:       {:#x}", self.footer_offset)?;
        writeln!(f, "Footer length:       {:#x}", self.footer_length)?;
        writeln!(f, "File count:          {}", self.file_count)?;
        writeln!(
            f,
            "Signature:           offset={:#x} zipped={} length={}/{}",
            self.signature.offset,
            self.signature.zipped,
            self.signature.len,
            self.signature.orig_len
        )?;
        writeln!(
            f,
            "Code integrity:      offset={:#x} zipped={} length={}/{}",
            self.code_integrity.offset,
            self.code_integrity.zipped,
            self.code_integrity.len,
            self.code_integrity.orig_len
        )?;
        match self.block_map_file_id {
            Some(id) => writeln!(f, "Block map file id:   {id:#x}")?,
            None => writeln!(f, "Block map file id:   -")?,
        }
        writeln!(f, "Keys:                {}", self.keys.len())?;
        for key in &self.keys {
            writeln!(f, "  - {key}")?;
        }
        writeln!(f, "Package name:        {}", self.package_name)?;
        writeln!(f, "Crypto algorithm:    {}", self.crypto_algorithm)?;
        writeln!(f, "Diffusion enabled:   {}", self.diffusion_enabled)?;
        writeln!(f, "Block map hash:      {}", self.block_map_hash_method)?;
        write!(f, "                     ")?;
        for byte in &self.block_map_hash {
            write!(f, "{byte:02x}")?;
        }
        writeln!(f)
    }
}

/// Interpretation of a part's `flags` field when deciding whether its
/// stored bytes are encrypted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum EncryptionPolicy {
    /// `flags` is a key slot index; only [`NO_KEY_SLOT`] means plaintext.
    #[default]
    KeySlot,
    /// A part is encrypted when `flags` is zero.
    #[value(name = "zero")]
    ZeroFlag,
}

impl EncryptionPolicy {
    pub fn is_encrypted(&self, flags: u16) -> bool {
        match self {
            EncryptionPolicy::KeySlot => flags != NO_KEY_SLOT,
            EncryptionPolicy::ZeroFlag => flags == 0,
        }
    }
}

/// One stored part of a container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartEntry {
    pub id: u32,
    pub flags: u16,
    pub zipped: u16,
    /// Offset of the stored bytes, relative to the container's base offset
    pub pos: u64,
    pub len_orig: u64,
    pub len: u64,
    pub path: String,
    pub is_package: bool,
}

impl PartEntry {
    pub fn placeholder_path(index: usize) -> String {
        format!("part{index}.dat")
    }

    pub fn compression(&self) -> Compression {
        Compression::from_u16(self.zipped)
    }
}
