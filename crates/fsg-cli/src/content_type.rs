//! Content-Type resolution from metadata and file names

/// Known extensions and their MIME types
pub const CONTENT_TYPES: &[(&str, &str)] = &[
    (".gif", "image/gif"),
    (".png", "image/png"),
    (".jpg", "image/jpeg"),
    (".pdf", "application/pdf"),
    (".xml", "text/xml"),
];

/// Look up a MIME type by extension (with leading dot)
pub fn lookup_extension(ext: &str) -> Option<&'static str> {
    CONTENT_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, mime)| *mime)
}

/// Resolve the Content-Type for a file
///
/// A custom header wins and contributes its last `:` segment, unless that
/// segment is empty.
/// Otherwise the second `.`-separated token of the file name is looked up,
/// so `a.png.bak` resolves as png while `a.b.png` does not. Unknown names
/// resolve to an empty string.
pub fn resolve_content_type(header: &str, file_name: &str) -> String {
    if let Some(last) = header.split(':').next_back().filter(|s| !s.is_empty()) {
        return last.to_string();
    }

    let parts: Vec<&str> = file_name.split('.').collect();
    if parts.len() > 1 {
        if let Some(mime) = lookup_extension(&format!(".{}", parts[1])) {
            return mime.to_string();
        }
    }

    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("a:b:image/png", "x.pdf", "image/png")]
    #[case("Content-Type:text/plain", "x.png", "text/plain")]
    #[case("application/json", "x", "application/json")]
    #[case("", "x.png", "image/png")]
    #[case("", "x.jpg", "image/jpeg")]
    #[case("", "x.unknown", "")]
    #[case("", "noext", "")]
    #[case("", "a.png.bak", "image/png")]
    #[case("", "a.b.png", "")]
    #[case("", "x.PNG", "")]
    fn test_resolve(#[case] header: &str, #[case] file_name: &str, #[case] expected: &str) {
        assert_eq!(resolve_content_type(header, file_name), expected);
    }

    #[test]
    fn test_header_with_trailing_colon_falls_back_to_extension() {
        assert_eq!(resolve_content_type("Content-Type:", "x.png"), "image/png");
    }
}
