//! Archive layout: where pages and assets live inside the archive
//!
//! ```text
//! index.html                  seed page
//! pages/<path>.html           other crawled pages (full mode)
//! css/ js/ images/ fonts/ media/
//! external/<host>/            cross-origin resources
//! ```

use crate::state::AssetKind;
use crate::url::{file_extension, file_stem, is_same_origin, sanitize_filename, sanitize_host};
use sha2::{Digest, Sha256};
use url::Url;

/// Archive path of the seed page
pub const INDEX_PATH: &str = "index.html";

/// Directory holding every non-seed page
pub const PAGES_DIR: &str = "pages";

/// Directory holding cross-origin resources
pub const EXTERNAL_DIR: &str = "external";

/// Length of the query discriminator appended to asset filenames
const QUERY_HASH_LEN: usize = 8;

/// Derives the archive path of an asset
///
/// The path depends only on the asset URL, its kind, and the seed origin, so
/// the same URL always lands at the same path no matter which page referenced
/// it.
///
/// - same origin: `<kind-folder>/<stem>[-<q>]<ext>`
/// - cross origin: `external/<host>/<stem>[-<q>]<ext>`
///
/// `<q>` is a short SHA-256 prefix of the query string, present only when the
/// URL has one, so `app.css?v=1` and `app.css?v=2` do not collide.
///
/// # Examples
///
/// ```
/// use site_archiver::output::asset_local_path;
/// use site_archiver::AssetKind;
/// use url::Url;
///
/// let seed = Url::parse("https://example.com/").unwrap();
/// let url = Url::parse("https://example.com/static/site.css").unwrap();
/// assert_eq!(asset_local_path(&url, AssetKind::Css, &seed), "css/site.css");
///
/// let cdn = Url::parse("https://cdn.example.net/lib/jquery.js").unwrap();
/// assert_eq!(
///     asset_local_path(&cdn, AssetKind::Js, &seed),
///     "external/cdn_example_net/jquery.js"
/// );
/// ```
pub fn asset_local_path(url: &Url, kind: AssetKind, seed_url: &Url) -> String {
    let stem = sanitize_filename(&file_stem(url));
    let ext = file_extension(url);
    let discriminator = url
        .query()
        .map(|query| {
            let digest = hex::encode(Sha256::digest(query.as_bytes()));
            format!("-{}", &digest[..QUERY_HASH_LEN])
        })
        .unwrap_or_default();
    let filename = format!("{}{}{}", stem, discriminator, ext);

    if is_same_origin(url, seed_url) {
        format!("{}/{}", kind.folder(), filename)
    } else {
        let host = sanitize_host(url.host_str().unwrap_or("unknown"));
        format!("{}/{}/{}", EXTERNAL_DIR, host, filename)
    }
}

/// Derives the archive path of a crawled page
///
/// The seed page is always `index.html`. Other pages go under `pages/`,
/// mirroring their URL path: a trailing `/` becomes `index.html` and a
/// missing `.html`/`.htm` extension is appended. Each path segment is
/// sanitized.
///
/// # Examples
///
/// ```
/// use site_archiver::output::page_local_path;
/// use url::Url;
///
/// let page = Url::parse("https://example.com/docs/intro").unwrap();
/// assert_eq!(page_local_path(&page, false), "pages/docs/intro.html");
/// assert_eq!(page_local_path(&page, true), "index.html");
/// ```
pub fn page_local_path(url: &Url, is_seed: bool) -> String {
    if is_seed {
        return INDEX_PATH.to_string();
    }

    let mut path = url.path().trim_start_matches('/').to_string();
    if path.is_empty() || path.ends_with('/') {
        path.push_str(INDEX_PATH);
    } else {
        let lowered = path.to_ascii_lowercase();
        if !lowered.ends_with(".html") && !lowered.ends_with(".htm") {
            path.push_str(".html");
        }
    }

    let sanitized: Vec<String> = path
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
        .map(sanitize_filename)
        .collect();

    format!("{}/{}", PAGES_DIR, sanitized.join("/"))
}

/// Relative prefix that climbs from a file back to the archive root
///
/// `index.html` needs none, `pages/a/b.html` needs `../../`.
pub fn root_prefix(local_path: &str) -> String {
    "../".repeat(local_path.matches('/').count())
}
