use crate::ctype::{ispunct, isspace};

pub fn is_space_or_tab(ch: u8) -> bool {
    matches!(ch, 9 | 32)
}

pub fn trim_slice(mut i: &str) -> &str {
    let mut len = i.len();
    while len > 0 && isspace(i.as_bytes()[0]) {
        i = &i[1..];
        len -= 1;
    }
    while len > 0 && isspace(i.as_bytes()[len - 1]) {
        i = &i[..len - 1];
        len -= 1;
    }
    i
}

/// Removes a backslash before every ASCII punctuation character.
pub fn unescape(v: &mut String) {
    let mut r = 0;
    let mut sz = v.len();

    while r < sz {
        if v.as_bytes()[r] == b'\\' && r + 1 < sz && ispunct(v.as_bytes()[r + 1]) {
            v.remove(r);
            sz -= 1;
        }
        if r >= sz {
            break;
        }
        r += 1;
    }
}

/// Produces the resolvable form of a link destination: whitespace trimmed,
/// a `<...>` wrapper removed, backslash escapes undone.
pub fn clean_url(url: &str) -> String {
    let url = trim_slice(url);

    if url.is_empty() {
        return String::new();
    }

    let bytes = url.as_bytes();
    let mut b = if bytes[0] == b'<' && bytes[url.len() - 1] == b'>' {
        url[1..url.len() - 1].to_string()
    } else {
        url.to_string()
    };

    unescape(&mut b);
    b
}

/// Normalizes a reference label: trim, collapse interior whitespace and
/// apply Unicode case folding, per the CommonMark matching rules.
pub fn normalize_label(i: &str) -> String {
    let i = trim_slice(i);
    let mut v = String::with_capacity(i.len());
    let mut last_was_whitespace = false;
    for c in i.chars() {
        if c.is_whitespace() {
            if !last_was_whitespace {
                last_was_whitespace = true;
                v.push(' ');
            }
        } else {
            last_was_whitespace = false;
            v.push(c);
        }
    }
    caseless::default_case_fold_str(&v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_label_folds_and_collapses() {
        assert_eq!(normalize_label("  FoO \t Bar "), "foo bar");
        assert_eq!(normalize_label("ẞ"), "ss");
    }

    #[test]
    fn clean_url_strips_pointy_brackets() {
        assert_eq!(clean_url("<http://x>"), "http://x");
        assert_eq!(clean_url("  /a\\_b "), "/a_b");
    }
}
