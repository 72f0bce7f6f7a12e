//! HTML rendering of a [`TextDiff`]

use super::{DiffOp, TextDiff};

/// Render a diff as an HTML fragment
///
/// Equal runs become `<span>`, deletions `<del>` and insertions `<ins>`. All
/// text is escaped; whitespace is preserved by the wrapping `<pre>`.
#[must_use]
pub fn render_html(diff: &TextDiff) -> String {
    let mut out = String::from("<pre class=\"folio-diff\">");
    for op in &diff.operations {
        let (tag, class) = match op.operation {
            DiffOp::Equal => ("span", "diff-equal"),
            DiffOp::Delete => ("del", "diff-delete"),
            DiffOp::Insert => ("ins", "diff-insert"),
        };
        out.push('<');
        out.push_str(tag);
        out.push_str(" class=\"");
        out.push_str(class);
        out.push_str("\">");
        escape_into(&mut out, &op.text);
        out.push_str("</");
        out.push_str(tag);
        out.push('>');
    }
    out.push_str("</pre>");
    out
}

fn escape_into(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{compute_diff, DiffOptions};

    #[test]
    fn renders_each_operation_kind() {
        let diff = compute_diff("keep old", "keep new", DiffOptions::new());
        let html = render_html(&diff);
        assert!(html.starts_with("<pre class=\"folio-diff\"><span class=\"diff-equal\">keep "));
        assert!(html.contains("<del class=\"diff-delete\">"));
        assert!(html.contains("<ins class=\"diff-insert\">"));
        assert!(html.ends_with("</pre>"));
    }

    #[test]
    fn escapes_markup() {
        let diff = compute_diff("", "<b>\"x\" & 'y'</b>", DiffOptions::new());
        let html = render_html(&diff);
        assert!(html.contains("&lt;b&gt;&quot;x&quot; &amp; &#39;y&#39;&lt;/b&gt;"));
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn replacement_renders_delete_then_insert() {
        let diff = compute_diff("a", "b", DiffOptions::new());
        assert_eq!(
            render_html(&diff),
            "<pre class=\"folio-diff\"><del class=\"diff-delete\">a</del><ins class=\"diff-insert\">b</ins></pre>"
        );
    }
}
