//! Turn the backend's light HTML markup into plain terminal text.

/// Convert `<br>` variants to newlines, drop any other tags, and decode
/// HTML entities.
///
/// A `<` only opens a tag when followed by a letter, `/` or `!`; anything
/// else (`income < 5 lakh`) is literal text.
pub fn render_markup(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find('<') {
        out.push_str(&rest[..start]);
        let after = &rest[start..];
        let opens_tag = after[1..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '/' || c == '!');
        match after.find('>') {
            Some(end) if opens_tag => {
                let tag = after[1..end].trim().trim_end_matches('/').trim();
                if tag.eq_ignore_ascii_case("br") {
                    out.push('\n');
                }
                rest = &after[end + 1..];
            }
            _ => {
                out.push('<');
                rest = &after[1..];
            }
        }
    }
    out.push_str(rest);
    html_escape::decode_html_entities(&out).into_owned()
}
