//! Conversion between attribute spelling (`data-user-id`) and prop spelling
//! (`dataUserId`).

/// `background-color` -> `backgroundColor`. Only a dash followed by a
/// lowercase ASCII letter is folded.
pub fn attribute_to_prop(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut chars = name.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '-' {
            if let Some(next) = chars.peek().copied().filter(char::is_ascii_lowercase) {
                chars.next();
                out.push(next.to_ascii_uppercase());
                continue;
            }
        }
        out.push(ch);
    }
    out
}

/// `backgroundColor` -> `background-color`.
pub fn prop_to_attribute(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_dash_lowercase_pairs() {
        assert_eq!(attribute_to_prop("data-user-id"), "dataUserId");
        assert_eq!(attribute_to_prop("title"), "title");
        assert_eq!(attribute_to_prop("x-1"), "x-1");
        assert_eq!(attribute_to_prop("trailing-"), "trailing-");
    }

    #[test]
    fn splits_uppercase_letters() {
        assert_eq!(prop_to_attribute("backgroundColor"), "background-color");
        assert_eq!(prop_to_attribute("ariaLabelledBy"), "aria-labelled-by");
        assert_eq!(prop_to_attribute("onclick"), "onclick");
    }

    #[test]
    fn conversions_are_inverse_for_camel_case() {
        for name in ["fontSize", "dataId", "children"] {
            assert_eq!(attribute_to_prop(&prop_to_attribute(name)), name);
        }
    }
}
