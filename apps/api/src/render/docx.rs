//! DOCX template renderer.
//!
//! A `.docx` file is a ZIP package of XML parts. Placeholders are written in
//! the template as `{{ key }}`; Word frequently splits such text across runs
//! (spell-check marks, formatting changes), so the scanner ignores run markup
//! between the braces and drops it from the output. A placeholder never spans
//! paragraphs.

use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};

use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::debit::context::TemplateContext;
use crate::render::{DocumentRenderer, RenderError};

const TEMPLATE_EXTENSION: &str = "docx";
/// Longest placeholder text considered before giving up on a `{{`.
const MAX_KEY_LEN: usize = 64;

/// Renders `<template_dir>/<template_id>.docx`, reading the template on every call.
#[derive(Debug, Clone)]
pub struct DocxTemplateRenderer {
    template_dir: PathBuf,
}

impl DocxTemplateRenderer {
    pub fn new(template_dir: impl Into<PathBuf>) -> Self {
        Self {
            template_dir: template_dir.into(),
        }
    }

    fn template_path(&self, template_id: &str) -> Result<PathBuf, RenderError> {
        let file_name = format!("{template_id}.{TEMPLATE_EXTENSION}");
        let candidate = Path::new(&file_name);
        // Ids are bare names; anything that resolves outside the directory is unknown.
        if template_id.is_empty() || candidate.components().count() != 1 {
            return Err(RenderError::TemplateNotFound(candidate.to_path_buf()));
        }
        Ok(self.template_dir.join(candidate))
    }
}

impl DocumentRenderer for DocxTemplateRenderer {
    fn render(&self, template_id: &str, context: &TemplateContext) -> Result<Vec<u8>, RenderError> {
        let path = self.template_path(template_id)?;
        let template = std::fs::read(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => RenderError::TemplateNotFound(path.clone()),
            _ => RenderError::Io(e),
        })?;
        debug!(
            "Rendering {} ({} bytes) with {} placeholder values",
            path.display(),
            template.len(),
            context.placeholder_count()
        );
        fill_package(&template, context)
    }
}

/// Copies every entry of the package, filling placeholders in `word/*.xml` parts.
pub fn fill_package(template: &[u8], context: &TemplateContext) -> Result<Vec<u8>, RenderError> {
    let mut archive = ZipArchive::new(Cursor::new(template))?;
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let name = entry.name().to_string();
        if entry.is_dir() {
            writer.add_directory(name, options)?;
            continue;
        }

        let mut data = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut data)?;

        if is_content_part(&name) {
            let xml = String::from_utf8(data)
                .map_err(|_| RenderError::InvalidTemplate(format!("{name} is not UTF-8")))?;
            data = fill_placeholders(&xml, context).into_bytes();
        }

        writer.start_file(name, options)?;
        writer.write_all(&data)?;
    }

    Ok(writer.finish()?.into_inner())
}

fn is_content_part(name: &str) -> bool {
    name.starts_with("word/") && name.ends_with(".xml")
}

/// Replaces every `{{ key }}` with the XML-escaped context value. Unknown keys
/// render as empty text; unmatched braces are left as they are.
pub fn fill_placeholders(xml: &str, context: &TemplateContext) -> String {
    let mut out = String::with_capacity(xml.len());
    let mut rest = xml;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match parse_placeholder(after) {
            Some((key, consumed)) => {
                out.push_str(&escape_xml(context.get(key.trim()).unwrap_or_default()));
                rest = &after[consumed..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

/// `input` begins right after a `{`. Returns the placeholder text and the
/// number of bytes consumed up to and including the closing `}}`.
fn parse_placeholder(input: &str) -> Option<(String, usize)> {
    let mut pos = skip_markup(input, 0)?;
    if !input[pos..].starts_with('{') {
        return None;
    }
    pos += 1;

    let mut key = String::new();
    loop {
        pos = skip_markup(input, pos)?;
        let c = input[pos..].chars().next()?;
        match c {
            '}' => {
                let next = skip_markup(input, pos + 1)?;
                return input[next..].starts_with('}').then(|| (key, next + 1));
            }
            '{' => return None,
            _ => {
                key.push(c);
                if key.len() > MAX_KEY_LEN {
                    return None;
                }
                pos += c.len_utf8();
            }
        }
    }
}

/// Skips consecutive tags starting at `pos`. Returns `None` at a paragraph boundary.
fn skip_markup(input: &str, mut pos: usize) -> Option<usize> {
    while input[pos..].starts_with('<') {
        let end = pos + input[pos..].find('>')?;
        let tag = &input[pos..=end];
        if tag.starts_with("<w:p>") || tag.starts_with("<w:p ") || tag.starts_with("</w:p>") {
            return None;
        }
        pos = end + 1;
    }
    Some(pos)
}

fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const DOCUMENT_XML: &str = concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#,
        r#"<w:p><w:r><w:t>Solicitante: {{ s }}</w:t></w:r></w:p>"#,
        r#"<w:p><w:r><w:t>[{{e1}}] ASBZ SP</w:t></w:r></w:p>"#,
        r#"<w:p><w:r><w:t>{{ obs }}</w:t></w:r></w:p>"#,
        r#"</w:body></w:document>"#
    );

    /// Minimal DOCX package with the given `word/document.xml`.
    pub(crate) fn template_package(document_xml: &str) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        writer.start_file("[Content_Types].xml", options).unwrap();
        writer
            .write_all(br#"<?xml version="1.0"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"/>"#)
            .unwrap();
        writer.add_directory("word/", options).unwrap();
        writer.start_file("word/document.xml", options).unwrap();
        writer.write_all(document_xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    pub(crate) fn read_part(package: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(package)).unwrap();
        let mut part = archive.by_name(name).unwrap();
        let mut xml = String::new();
        part.read_to_string(&mut xml).unwrap();
        xml
    }

    fn context(pairs: &[(&'static str, &str)]) -> TemplateContext {
        let mut ctx = TemplateContext::default();
        for (k, v) in pairs {
            ctx.insert(*k, *v);
        }
        ctx
    }

    // ── fill_placeholders ───────────────────────────────────────────────────

    #[test]
    fn test_simple_placeholders_with_and_without_spaces() {
        let ctx = context(&[("s", "JDOE"), ("e1", "X")]);
        assert_eq!(
            fill_placeholders("<w:t>{{ s }} / {{e1}}</w:t>", &ctx),
            "<w:t>JDOE / X</w:t>"
        );
    }

    #[test]
    fn test_unknown_key_renders_empty() {
        let ctx = context(&[]);
        assert_eq!(fill_placeholders("<w:t>[{{ e2 }}]</w:t>", &ctx), "<w:t>[]</w:t>");
    }

    #[test]
    fn test_placeholder_split_across_runs_is_merged() {
        let ctx = context(&[("obs2", "linha")]);
        let xml = concat!(
            "<w:p><w:r><w:t>{{</w:t></w:r><w:proofErr w:type=\"spellStart\"/>",
            "<w:r><w:rPr><w:b/></w:rPr><w:t>obs2</w:t></w:r>",
            "<w:proofErr w:type=\"spellEnd\"/><w:r><w:t>}} fim</w:t></w:r></w:p>"
        );
        assert_eq!(
            fill_placeholders(xml, &ctx),
            "<w:p><w:r><w:t>linha fim</w:t></w:r></w:p>"
        );
    }

    #[test]
    fn test_values_are_xml_escaped() {
        let ctx = context(&[("obs", "A & B <c>")]);
        assert_eq!(
            fill_placeholders("<w:t>{{ obs }}</w:t>", &ctx),
            "<w:t>A &amp; B &lt;c&gt;</w:t>"
        );
    }

    #[test]
    fn test_lone_braces_are_untouched() {
        let ctx = context(&[("s", "JDOE")]);
        let xml = "<w:t>{ s } {x} }} {{ unterminated</w:t>";
        assert_eq!(fill_placeholders(xml, &ctx), xml);
    }

    #[test]
    fn test_placeholder_does_not_cross_paragraphs() {
        let ctx = context(&[("s", "JDOE")]);
        let xml = "<w:p><w:r><w:t>{{ s</w:t></w:r></w:p><w:p><w:r><w:t>}}</w:t></w:r></w:p>";
        assert_eq!(fill_placeholders(xml, &ctx), xml);
    }

    #[test]
    fn test_accented_text_around_placeholders_is_preserved() {
        let ctx = context(&[("c", "X")]);
        assert_eq!(
            fill_placeholders("<w:t>({{ c }}) CARTÓRIO</w:t>", &ctx),
            "<w:t>(X) CARTÓRIO</w:t>"
        );
    }

    // ── renderer ────────────────────────────────────────────────────────────

    #[test]
    fn test_render_fills_document_part() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("debit.docx"), template_package(DOCUMENT_XML)).unwrap();

        let renderer = DocxTemplateRenderer::new(dir.path());
        let ctx = context(&[("s", "JDOE"), ("e1", "X"), ("obs", "Exemplo")]);
        let output = renderer.render("debit", &ctx).unwrap();

        let xml = read_part(&output, "word/document.xml");
        assert!(xml.contains("Solicitante: JDOE"));
        assert!(xml.contains("[X] ASBZ SP"));
        assert!(xml.contains("<w:t>Exemplo</w:t>"));
        assert!(!xml.contains("{{"));
        assert!(read_part(&output, "[Content_Types].xml").contains("content-types"));
    }

    #[test]
    fn test_missing_template_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = DocxTemplateRenderer::new(dir.path());
        let err = renderer.render("absent", &context(&[])).unwrap_err();
        assert!(matches!(err, RenderError::TemplateNotFound(_)));
    }

    #[test]
    fn test_template_id_cannot_leave_directory() {
        let renderer = DocxTemplateRenderer::new("templates");
        let err = renderer.render("../secret", &context(&[])).unwrap_err();
        assert!(matches!(err, RenderError::TemplateNotFound(_)));
    }

    #[test]
    fn test_corrupt_template_is_a_package_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.docx"), b"not a zip").unwrap();
        let renderer = DocxTemplateRenderer::new(dir.path());
        let err = renderer.render("broken", &context(&[])).unwrap_err();
        assert!(matches!(err, RenderError::Package(_)));
    }
}
