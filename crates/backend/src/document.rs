use markmap_shared::models::MarkerRecord;
use markmap_shared::note::Note;
use std::path::Path;

/// Pre-authored markers, served inside the index page.
#[derive(Debug, Default)]
pub struct MarkerDocument {
    pub records: Vec<MarkerRecord>,
}

impl MarkerDocument {
    pub fn load(path: &Path) -> Result<Self, String> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        let records: Vec<MarkerRecord> = serde_json::from_str(&data)
            .map_err(|e| format!("Failed to parse {}: {}", path.display(), e))?;

        tracing::info!(markers = records.len(), path = %path.display(), "Loaded marker document");

        Ok(MarkerDocument { records })
    }

    /// Like [`MarkerDocument::load`], but a missing or broken file serves no markers.
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(error = %e, "Serving without pre-authored markers");
                MarkerDocument::default()
            }
        }
    }

    /// One `<template class="marker">` per record.
    pub fn render_templates(&self) -> String {
        self.records.iter().map(render_template).collect()
    }
}

fn render_template(record: &MarkerRecord) -> String {
    let mut html = format!(
        r#"<template class="marker" data-lon="{}" data-lat="{}""#,
        record.location.lon(),
        record.location.lat()
    );
    if let Some(primary) = &record.color.primary {
        html.push_str(&format!(r#" data-color-primary="{}""#, escape_html(primary)));
    }
    if let Some(secondary) = &record.color.secondary {
        html.push_str(&format!(r#" data-color-secondary="{}""#, escape_html(secondary)));
    }
    let note = Note::new(record.info_html.as_str());
    html.push_str(&format!(
        r#"><span class="name">{}</span><div class="info">{}</div></template>"#,
        escape_html(&record.name),
        note.html()
    ));
    html.push('\n');
    html
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Insert `templates` at the end of the page body.
pub fn inject_templates(index_html: &str, templates: &str) -> String {
    if templates.is_empty() {
        return index_html.to_string();
    }
    match index_html.rfind("</body>") {
        Some(pos) => {
            let mut html = String::with_capacity(index_html.len() + templates.len());
            html.push_str(&index_html[..pos]);
            html.push_str(templates);
            html.push_str(&index_html[pos..]);
            html
        }
        None => format!("{}{}", index_html, templates),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use markmap_shared::models::{Location, PartialColor};

    fn record(name: &str, info: &str) -> MarkerRecord {
        MarkerRecord {
            name: name.to_string(),
            location: Location::new(13.4, 52.5).unwrap(),
            info_html: info.to_string(),
            color: PartialColor::default(),
        }
    }

    #[test]
    fn test_load_reads_info_alias() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("markers.json");
        std::fs::write(
            &path,
            r#"[{"name":"Berlin","location":[13.4,52.5],"info":"<p>capital</p>"}]"#,
        )
        .unwrap();

        let doc = MarkerDocument::load(&path).unwrap();
        assert_eq!(doc.records.len(), 1);
        assert_eq!(doc.records[0].info_html, "<p>capital</p>");
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = MarkerDocument::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(err.contains("Failed to read"));
    }

    #[test]
    fn test_load_or_empty_on_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("markers.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(MarkerDocument::load_or_empty(&path).records.is_empty());
    }

    #[test]
    fn test_render_template_attributes() {
        let mut r = record("Berlin", "<p>capital</p>");
        r.color.primary = Some("#000000".to_string());
        let html = render_template(&r);
        assert!(html.starts_with(r##"<template class="marker" data-lon="13.4" data-lat="52.5" data-color-primary="#000000">"##));
        assert!(!html.contains("data-color-secondary"));
        assert!(html.contains(r#"<span class="name">Berlin</span>"#));
        assert!(html.contains(r#"<div class="info"><p>capital</p></div>"#));
    }

    #[test]
    fn test_render_template_escapes_name() {
        let html = render_template(&record("<script>", ""));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_render_template_cannot_close_template_early() {
        let html = render_template(&record("x", "<p>ok</p></template><script>alert(1)</script>"));
        assert_eq!(html.matches("</template>").count(), 1);
        assert!(!html.contains("<script"));
        assert!(html.contains("<p>ok</p>"));
    }

    #[test]
    fn test_inject_before_body_end() {
        let out = inject_templates("<html><body><div id=\"main\"></div></body></html>", "<template></template>");
        assert_eq!(
            out,
            "<html><body><div id=\"main\"></div><template></template></body></html>"
        );
    }

    #[test]
    fn test_inject_without_body_appends() {
        assert_eq!(inject_templates("<div></div>", "<t/>"), "<div></div><t/>");
        assert_eq!(inject_templates("<body></body>", ""), "<body></body>");
    }
}
