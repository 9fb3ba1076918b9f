use std::fmt::Display;

/// Format items as a bulleted list, one per line.
pub fn format_bulleted_list(items: impl IntoIterator<Item = impl Display>) -> String {
    let mut ret = String::new();
    for item in items {
        if !ret.is_empty() {
            ret.push('\n');
        }
        ret.push_str(&format!("• {item}"));
    }
    ret
}
