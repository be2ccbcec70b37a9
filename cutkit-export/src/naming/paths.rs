//! Lexical path helpers parameterized by target OS family
//!
//! Output names are planned before anything touches the disk, possibly for a
//! different OS family than the host, so these helpers work on strings and
//! never consult the filesystem.

use cutkit_common::OsFamily;

/// Last non-empty component of `path`
pub fn base_name(path: &str, os: OsFamily) -> &str {
    path.rsplit(|c: char| os.is_separator(c))
        .find(|c| !c.is_empty())
        .unwrap_or("")
}

/// Byte index of the extension dot in `name`, ignoring leading-dot names
fn extension_dot(name: &str) -> Option<usize> {
    match name.rfind('.') {
        Some(0) | None => None,
        Some(i) => Some(i),
    }
}

/// Base name without its extension (`/a/clip.mp4` -> `clip`)
pub fn file_stem(path: &str, os: OsFamily) -> &str {
    let name = base_name(path, os);
    match extension_dot(name) {
        Some(i) => &name[..i],
        None => name,
    }
}

/// Extension including the dot (`/a/clip.mp4` -> `.mp4`), or empty
pub fn extension(path: &str, os: OsFamily) -> &str {
    let name = base_name(path, os);
    match extension_dot(name) {
        Some(i) => &name[i..],
        None => "",
    }
}

/// Split off a Windows drive (`C:`) or UNC (`\\server\share`) prefix
fn split_prefix(path: &str, os: OsFamily) -> (&str, &str) {
    if os != OsFamily::Windows {
        return ("", path);
    }

    let bytes = path.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        return path.split_at(2);
    }

    let is_sep = |b: u8| b == b'\\' || b == b'/';
    if bytes.len() >= 2 && is_sep(bytes[0]) && is_sep(bytes[1]) {
        // \\server\share
        let mut seps = 0;
        for (i, b) in bytes.iter().enumerate().skip(2) {
            if is_sep(*b) {
                seps += 1;
                if seps == 2 {
                    return path.split_at(i);
                }
            }
        }
        return (path, "");
    }

    ("", path)
}

/// Collapse `.`, `..` and repeated separators, using the preferred separator
pub fn normalize(path: &str, os: OsFamily) -> String {
    let sep = os.separator();
    let (prefix, rest) = split_prefix(path, os);
    let prefix: String = prefix
        .chars()
        .map(|c| if os.is_separator(c) { sep } else { c })
        .collect();
    let absolute = rest.starts_with(|c: char| os.is_separator(c));

    let mut parts: Vec<&str> = Vec::new();
    for part in rest.split(|c: char| os.is_separator(c)) {
        match part {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if absolute => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }

    let joined = parts.join(&sep.to_string());
    let mut out = prefix;
    if absolute {
        out.push(sep);
    }
    out.push_str(&joined);

    if out.is_empty() {
        ".".to_string()
    } else {
        out
    }
}

/// Join `name` onto `dir` and normalize the result
pub fn join(dir: &str, name: &str, os: OsFamily) -> String {
    if dir.is_empty() {
        return normalize(name, os);
    }
    normalize(&format!("{}{}{}", dir, os.separator(), name), os)
}

/// Directory containing `path`, normalized
pub fn dir_name(path: &str, os: OsFamily) -> String {
    if path.is_empty() {
        return ".".to_string();
    }
    join(path, "..", os)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_name_and_stem() {
        assert_eq!(base_name("/a/b/in.mp4", OsFamily::Unix), "in.mp4");
        assert_eq!(base_name("/a/b/", OsFamily::Unix), "b");
        assert_eq!(file_stem("/a/b/in.final.mp4", OsFamily::Unix), "in.final");
        assert_eq!(file_stem("C:\\v\\clip.mov", OsFamily::Windows), "clip");
        assert_eq!(file_stem("/x/.hidden", OsFamily::Unix), ".hidden");
    }

    #[test]
    fn test_extension() {
        assert_eq!(extension("/a/in.mp4", OsFamily::Unix), ".mp4");
        assert_eq!(extension("/a/noext", OsFamily::Unix), "");
        assert_eq!(extension("/a/.profile", OsFamily::Unix), "");
    }

    #[test]
    fn test_normalize_unix() {
        assert_eq!(normalize("/a/b/../c/./d//e", OsFamily::Unix), "/a/c/d/e");
        assert_eq!(normalize("/../x", OsFamily::Unix), "/x");
        assert_eq!(normalize("../x/..", OsFamily::Unix), "..");
        assert_eq!(normalize("", OsFamily::Unix), ".");
    }

    #[test]
    fn test_normalize_windows() {
        assert_eq!(normalize("C:/videos\\out/../in.mp4", OsFamily::Windows), "C:\\videos\\in.mp4");
        assert_eq!(
            normalize("\\\\nas\\share\\a\\..\\b.mkv", OsFamily::Windows),
            "\\\\nas\\share\\b.mkv"
        );
    }

    #[test]
    fn test_join() {
        assert_eq!(join("/a/b", "in.mp4", OsFamily::Unix), "/a/b/in.mp4");
        assert_eq!(join("/a/b", "sub/../in.mp4", OsFamily::Unix), "/a/b/in.mp4");
        assert_eq!(join("", "in.mp4", OsFamily::Unix), "in.mp4");
        assert_eq!(join("D:\\out", "x.mp4", OsFamily::Windows), "D:\\out\\x.mp4");
    }

    #[test]
    fn test_dir_name() {
        assert_eq!(dir_name("/a/b/in.mp4", OsFamily::Unix), "/a/b");
        assert_eq!(dir_name("in.mp4", OsFamily::Unix), ".");
        assert_eq!(dir_name("C:\\v\\clip.mov", OsFamily::Windows), "C:\\v");
    }
}
