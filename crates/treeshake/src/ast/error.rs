use swc_core::common::sync::Lrc;
use swc_core::common::{SourceMap, Span};

/// Renders `path:line:col: message` followed by the offending source line and a caret.
pub fn code_frame(span: Span, message: &str, cm: &Lrc<SourceMap>) -> String {
    let loc = cm.lookup_char_pos(span.lo);
    let line_no = loc.line.to_string();
    let gutter = " ".repeat(line_no.len());
    let source_line = loc
        .file
        .get_line(loc.line.saturating_sub(1))
        .map(|line| line.to_string())
        .unwrap_or_default();
    format!(
        "{}:{}:{}: {}\n{} |\n{} | {}\n{} | {}^",
        loc.file.name,
        loc.line,
        loc.col_display + 1,
        message,
        gutter,
        line_no,
        source_line,
        gutter,
        " ".repeat(loc.col_display),
    )
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use swc_core::common::{BytePos, FileName};

    use super::*;

    #[test]
    fn test_code_frame() {
        let cm: Lrc<SourceMap> = Default::default();
        let fm = cm.new_source_file(
            FileName::Real(PathBuf::from("a.ts")).into(),
            "let a = 1;\nlet b = ;\n".to_string(),
        );
        let lo = fm.start_pos + BytePos(19);
        let frame = code_frame(Span::new(lo, lo), "Expression expected", &cm);
        assert_eq!(
            frame,
            "a.ts:2:9: Expression expected\n  |\n2 | let b = ;\n  |         ^"
        );
    }
}
