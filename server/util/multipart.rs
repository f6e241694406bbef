//! Minimal `multipart/form-data` parsing over a fully buffered body.

use xray_diagnosis::diagnosis::UploadedFile;

/// Returns the index of the first occurrence of `needle` in `haystack`.
pub fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Splits `haystack` on every occurrence of `needle`, returning the pieces
/// between occurrences (excluding the needle itself).
pub fn split_on<'a>(haystack: &'a [u8], needle: &[u8]) -> Vec<&'a [u8]> {
    let mut result = Vec::new();
    let mut start = 0;
    while start <= haystack.len() {
        if let Some(pos) = find_subsequence(&haystack[start..], needle) {
            result.push(&haystack[start..start + pos]);
            start += pos + needle.len();
        } else {
            result.push(&haystack[start..]);
            break;
        }
    }
    result
}

/// Extracts the boundary token from a Content-Type header value like
/// `multipart/form-data; boundary=----WebKitFormBoundaryXXX`.
pub fn extract_boundary(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .map(|s| s.trim())
        .find_map(|s| s.strip_prefix("boundary="))
        .map(|s| s.trim_matches('"').to_owned())
        .filter(|s| !s.is_empty())
}

/// Text fields and file parts of one submission, in body order.
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub fields: Vec<(String, String)>,
    pub files: Vec<(String, UploadedFile)>,
}

impl MultipartForm {
    pub fn parse(body: &[u8], boundary: &str) -> MultipartForm {
        let delimiter = format!("--{boundary}");
        let mut form = MultipartForm::default();

        for part in split_on(body, delimiter.as_bytes()).into_iter().skip(1) {
            // The closing delimiter is followed by "--".
            if part.starts_with(b"--") {
                break;
            }
            let part = part.strip_prefix(b"\r\n").unwrap_or(part);
            let sep = b"\r\n\r\n";
            let Some(sep_pos) = find_subsequence(part, sep) else {
                continue;
            };
            let headers = String::from_utf8_lossy(&part[..sep_pos]);
            let raw = &part[sep_pos + sep.len()..];
            let data = raw.strip_suffix(b"\r\n").unwrap_or(raw);

            let Some(name) = disposition_param(&headers, "name") else {
                continue;
            };
            match disposition_param(&headers, "filename") {
                Some(filename) => {
                    // Browsers send an empty, nameless part for an unselected file input.
                    if filename.is_empty() && data.is_empty() {
                        continue;
                    }
                    form.files.push((name, UploadedFile { filename, bytes: data.to_vec() }));
                }
                None => form.fields.push((name, String::from_utf8_lossy(data).into_owned())),
            }
        }
        form
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    /// Removes and returns the first file uploaded under `name`.
    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        let pos = self.files.iter().position(|(k, _)| k == name)?;
        Some(self.files.remove(pos).1)
    }
}

/// Reads `key="value"` (or unquoted) from the Content-Disposition header.
fn disposition_param(headers: &str, key: &str) -> Option<String> {
    let line = headers
        .lines()
        .find(|l| l.to_ascii_lowercase().starts_with("content-disposition:"))?;
    line.split(';').skip(1).find_map(|param| {
        let (k, v) = param.trim().split_once('=')?;
        k.trim().eq_ignore_ascii_case(key).then(|| v.trim().trim_matches('"').to_owned())
    })
}

/// Builds a multipart body; used by handler tests.
#[cfg(test)]
pub fn encode(boundary: &str, fields: &[(&str, &str)], files: &[(&str, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!("--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n").as_bytes(),
        );
    }
    for (name, filename, bytes) in files {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_from_header() {
        assert_eq!(
            extract_boundary("multipart/form-data; boundary=\"abc\"").as_deref(),
            Some("abc")
        );
        assert_eq!(extract_boundary("multipart/form-data"), None);
    }

    #[test]
    fn parses_text_and_binary_parts() {
        let payload: &[u8] = &[0, 1, 2, b'\r', b'\n', 255];
        let body = encode("XyZ", &[("view_position", "PA")], &[("image_file", "a.png", payload)]);
        let mut form = MultipartForm::parse(&body, "XyZ");

        assert_eq!(form.text("view_position"), Some("PA"));
        let file = form.take_file("image_file").unwrap();
        assert_eq!(file.filename, "a.png");
        assert_eq!(file.bytes, payload);
        assert!(form.take_file("image_file").is_none());
    }

    #[test]
    fn skips_unselected_file_input() {
        let body = encode("b", &[], &[("image_file", "", b"")]);
        assert!(MultipartForm::parse(&body, "b").files.is_empty());
    }
}
