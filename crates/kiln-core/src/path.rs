// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! URL and path utilities used to address assets.
//!
//! Asset sources are URL-like strings: absolute URLs (`https://cdn/a.png`),
//! root-relative paths (`/assets/a.png`), relative paths (`../a.png`), or data
//! URLs. The loader keys its in-flight map by *absolute* URL, so two different
//! spellings of the same file must normalise to the same string.

use url::Url;

/// Converts Windows separators to forward slashes.
pub fn to_posix(path: &str) -> String {
    path.replace('\\', "/")
}

/// Returns `true` for `data:` URLs.
pub fn is_data_url(url: &str) -> bool {
    url.trim_start()
        .get(..5)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"))
}

/// Returns `true` for `blob:` URLs.
pub fn is_blob_url(url: &str) -> bool {
    url.starts_with("blob:")
}

/// The media type of a data URL (`data:application/json;base64,...` → `application/json`).
pub fn data_url_mime(url: &str) -> Option<&str> {
    if !is_data_url(url) {
        return None;
    }
    let header = url.trim_start()[5..].split(',').next()?;
    header.split(';').next().filter(|mime| !mime.is_empty())
}

/// Returns `true` if `url` starts with a scheme followed by `:/` (`http://`, `file:///`).
pub fn has_protocol(url: &str) -> bool {
    match url.find(':') {
        Some(index) if index > 0 => {
            let scheme = &url[..index];
            !scheme.contains('/') && url[index + 1..].starts_with('/')
        }
        _ => false,
    }
}

/// Returns `true` if `url` is a well-formed absolute URL.
pub fn is_url(url: &str) -> bool {
    has_protocol(url) && Url::parse(url).is_ok()
}

/// Strips the query string and fragment.
pub fn remove_url_params(url: &str) -> &str {
    match url.find(['?', '#']) {
        Some(index) => &url[..index],
        None => url,
    }
}

/// The query string of `url`, without the leading `?` and without the fragment.
pub fn query(url: &str) -> Option<&str> {
    let start = url.find('?')?;
    let rest = &url[start + 1..];
    Some(rest.split('#').next().unwrap_or(rest))
}

/// Copies the query string of `source` onto `target` when `target` has none.
pub fn copy_search_params(target: &str, source: &str) -> String {
    match query(source) {
        Some(params) if !params.is_empty() && !target.contains('?') => {
            format!("{target}?{params}")
        }
        _ => target.to_string(),
    }
}

/// Appends already encoded query parameters to `url`.
pub fn append_search_params(url: &str, params: &str) -> String {
    if params.is_empty() {
        return url.to_string();
    }
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{params}")
}

/// The extension of the last path segment, without the dot, ignoring query and fragment.
pub fn url_extension(url: &str) -> Option<String> {
    let path = remove_url_params(url);
    let file = path.rsplit('/').next().unwrap_or(path);
    let (stem, extension) = file.rsplit_once('.')?;
    (!stem.is_empty() && !extension.is_empty()).then(|| extension.to_string())
}

/// Returns `true` if the extension of `url` is one of `extensions` (case-insensitive).
pub fn has_extension(url: &str, extensions: &[&str]) -> bool {
    url_extension(url).is_some_and(|ext| {
        extensions
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(&ext))
    })
}

/// The root of a path: `http://host/` for URLs, `/` for rooted paths, empty otherwise.
pub fn rootname(path: &str) -> String {
    let path = to_posix(path);
    if has_protocol(&path) {
        if let Ok(url) = Url::parse(&path) {
            if url.cannot_be_a_base() {
                return String::new();
            }
            let mut root = url;
            root.set_path("/");
            root.set_query(None);
            root.set_fragment(None);
            return root.to_string();
        }
    }
    if path.starts_with('/') {
        "/".to_string()
    } else {
        String::new()
    }
}

/// Returns `true` for URLs and rooted paths.
pub fn is_absolute(path: &str) -> bool {
    !rootname(path).is_empty()
}

/// Everything before the last path segment: `a/b/c.json` → `a/b`, `c.json` → `.`.
pub fn dirname(path: &str) -> String {
    let path = remove_url_params(path);
    match path.rfind('/') {
        Some(0) => "/".to_string(),
        Some(index) => {
            let dir = &path[..index];
            match dir.find("://") {
                // `http://host/a.json` keeps the slash after its authority.
                Some(scheme_end) if !dir[scheme_end + 3..].contains('/') => format!("{dir}/"),
                _ => dir.to_string(),
            }
        }
        None => ".".to_string(),
    }
}

/// Collapses `.`/`..` segments and duplicate separators, keeping query and fragment.
pub fn normalize(path: &str) -> String {
    let path = to_posix(path);
    if is_data_url(&path) || is_blob_url(&path) {
        return path;
    }
    if has_protocol(&path) {
        if let Ok(url) = Url::parse(&path) {
            return url.to_string();
        }
    }

    let split = path.find(['?', '#']).unwrap_or(path.len());
    let (body, suffix) = path.split_at(split);
    let rooted = body.starts_with('/');
    let trailing = body.ends_with('/') && body.len() > 1;

    let mut segments: Vec<&str> = Vec::new();
    for segment in body.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(last) if *last != ".." => {
                    segments.pop();
                }
                // Rooted paths cannot climb above the root.
                _ if rooted => {}
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }

    let mut normalized = segments.join("/");
    if rooted {
        normalized.insert(0, '/');
    }
    if trailing && !normalized.ends_with('/') {
        normalized.push('/');
    }
    if normalized.is_empty() {
        normalized.push('.');
    }
    normalized.push_str(suffix);
    normalized
}

/// Joins path segments and normalises the result.
pub fn join(base: &str, relative: &str) -> String {
    let base = to_posix(base);
    let relative = to_posix(relative);
    if base.is_empty() {
        return normalize(&relative);
    }
    if has_protocol(&base) {
        if let Ok(url) = Url::parse(&directory(&base)) {
            if let Ok(joined) = url.join(relative.trim_start_matches('/')) {
                return joined.to_string();
            }
        }
    }
    normalize(&format!("{}/{}", base.trim_end_matches('/'), relative))
}

fn directory(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{path}/")
    }
}

/// Turns `url` into an absolute address.
///
/// - data and blob URLs are returned as is;
/// - `/`-prefixed paths are resolved against `root` (defaulting to the root of `base`);
/// - URLs with a protocol are only normalised;
/// - everything else is joined onto `base`.
///
/// Without any base, relative paths are only normalised, which is still enough
/// for `./a.png` and `b/../a.png` to address the same asset.
pub fn to_absolute(url: &str, base: Option<&str>, root: Option<&str>) -> String {
    if is_data_url(url) || is_blob_url(url) {
        return url.to_string();
    }

    let url = to_posix(url);
    let base = base
        .map(|base| remove_url_params(&to_posix(base)).to_string())
        .unwrap_or_default();
    let root = match root {
        Some(root) => remove_url_params(&to_posix(root)).to_string(),
        None => rootname(&base),
    };

    if let Some(stripped) = url.strip_prefix('/') {
        if root.is_empty() {
            return normalize(&url);
        }
        return join(&root, stripped);
    }

    if is_absolute(&url) {
        normalize(&url)
    } else {
        join(&base, &url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_ignores_params_and_directories() {
        assert_eq!(url_extension("a/b.c/hero.PNG?v=2#x").as_deref(), Some("PNG"));
        assert_eq!(url_extension("a/b.c/readme"), None);
        assert_eq!(url_extension(".hidden"), None);
        assert!(has_extension("hero.PNG", &["png", "jpg"]));
    }

    #[test]
    fn normalize_collapses_segments() {
        assert_eq!(normalize("./a/../b/./c.png"), "b/c.png");
        assert_eq!(normalize("../x/../../y.png"), "../../y.png");
        assert_eq!(normalize("/a/../../b.png"), "/b.png");
        assert_eq!(normalize("a//b/?q=1"), "a/b/?q=1");
        assert_eq!(normalize("http://host/a/../b.png"), "http://host/b.png");
    }

    #[test]
    fn dirname_handles_roots() {
        assert_eq!(dirname("sheets/hero.json"), "sheets");
        assert_eq!(dirname("hero.json"), ".");
        assert_eq!(dirname("/hero.json"), "/");
        assert_eq!(dirname("http://cdn/hero.json"), "http://cdn/");
        assert_eq!(dirname("http://cdn/a/hero.json?v=1"), "http://cdn/a");
    }

    #[test]
    fn to_absolute_resolves_against_base_and_root() {
        assert_eq!(
            to_absolute("hero.png", Some("http://cdn.test/game/assets"), None),
            "http://cdn.test/game/assets/hero.png"
        );
        assert_eq!(
            to_absolute("/hero.png", Some("http://cdn.test/game/assets"), None),
            "http://cdn.test/hero.png"
        );
        assert_eq!(
            to_absolute("/hero.png", Some("assets"), Some("http://cdn.test/game")),
            "http://cdn.test/game/hero.png"
        );
        assert_eq!(to_absolute("./a/../hero.png", None, None), "hero.png");
        assert_eq!(to_absolute("hero.png", Some("assets/"), None), "assets/hero.png");
        assert_eq!(
            to_absolute("https://other.test/x.png", Some("assets"), None),
            "https://other.test/x.png"
        );
        assert_eq!(to_absolute("data:text/plain,hi", Some("assets"), None), "data:text/plain,hi");
    }

    #[test]
    fn search_params_are_appended_once() {
        assert_eq!(append_search_params("a.png", "v=1"), "a.png?v=1");
        assert_eq!(append_search_params("a.png?x=2", "v=1"), "a.png?x=2&v=1");
        assert_eq!(copy_search_params("img.png", "sheet.json?v=3"), "img.png?v=3");
        assert_eq!(copy_search_params("img.png?k=1", "sheet.json?v=3"), "img.png?k=1");
    }

    #[test]
    fn data_url_mime_type() {
        assert_eq!(
            data_url_mime("data:application/json;base64,e30="),
            Some("application/json")
        );
        assert_eq!(data_url_mime("data:,hello"), None);
        assert_eq!(data_url_mime("hello.json"), None);
    }
}
