use std::collections::HashMap;
use std::fmt;
use url::Url;

/// Category of a discovered resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Css,
    Js,
    Image,
    Font,
    Media,
}

impl AssetKind {
    /// Archive folder that same-origin assets of this kind are written to
    pub fn folder(&self) -> &'static str {
        match self {
            Self::Css => "css",
            Self::Js => "js",
            Self::Image => "images",
            Self::Font => "fonts",
            Self::Media => "media",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Css => "css",
            Self::Js => "js",
            Self::Image => "image",
            Self::Font => "font",
            Self::Media => "media",
        };
        write!(f, "{}", name)
    }
}

/// Metadata and eventual bytes for one discoverable resource
///
/// `url`, `kind`, and `local_path` are fixed at creation; only the download
/// phase fills in `size_bytes` and `bytes`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetDescriptor {
    url: Url,
    kind: AssetKind,
    local_path: String,

    /// Size reported by the server or measured after download
    pub size_bytes: Option<u64>,

    /// Downloaded content, present only after a successful fetch
    pub bytes: Option<Vec<u8>>,
}

impl AssetDescriptor {
    /// Creates a descriptor for a resource that has not been fetched yet
    pub fn new(url: Url, kind: AssetKind, local_path: String) -> Self {
        Self {
            url,
            kind,
            local_path,
            size_bytes: None,
            bytes: None,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    /// Archive-relative path this resource occupies
    pub fn local_path(&self) -> &str {
        &self.local_path
    }

    /// Returns true once bytes have been downloaded
    pub fn is_downloaded(&self) -> bool {
        self.bytes.is_some()
    }
}

/// Insertion-ordered map from absolute URL to its descriptor
///
/// Holds exactly one entry per distinct absolute URL. The first descriptor
/// inserted for a URL wins; later inserts for the same URL are ignored.
#[derive(Debug, Clone, Default)]
pub struct AssetMap {
    entries: Vec<AssetDescriptor>,
    index: HashMap<String, usize>,
}

impl AssetMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the descriptor unless its URL is already present
    ///
    /// Returns true if the descriptor was added.
    pub fn insert(&mut self, asset: AssetDescriptor) -> bool {
        let key = asset.url.as_str().to_string();
        if self.index.contains_key(&key) {
            return false;
        }
        self.index.insert(key, self.entries.len());
        self.entries.push(asset);
        true
    }

    /// Merges descriptors, keeping existing entries; returns how many were new
    pub fn merge<I>(&mut self, assets: I) -> usize
    where
        I: IntoIterator<Item = AssetDescriptor>,
    {
        assets
            .into_iter()
            .map(|asset| self.insert(asset))
            .filter(|added| *added)
            .count()
    }

    pub fn get(&self, url: &str) -> Option<&AssetDescriptor> {
        self.index.get(url).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, url: &str) -> bool {
        self.index.contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AssetDescriptor> {
        self.entries.iter()
    }

    pub(crate) fn get_mut_at(&mut self, position: usize) -> Option<&mut AssetDescriptor> {
        self.entries.get_mut(position)
    }

    /// Returns the absolute URL to local path mapping for downloaded assets
    ///
    /// References to failed or skipped assets are left pointing at the live
    /// resource, so they are not part of the mapping.
    pub fn url_map(&self) -> Vec<(String, String)> {
        self.downloaded()
            .map(|asset| (asset.url.to_string(), asset.local_path.clone()))
            .collect()
    }

    /// Iterates over assets that were downloaded successfully
    pub fn downloaded(&self) -> impl Iterator<Item = &AssetDescriptor> {
        self.entries.iter().filter(|asset| asset.is_downloaded())
    }
}
