//! crates/draftforge_core/src/render.rs
//!
//! Converts a project and its sections into a downloadable office file.
//! Both formats are OOXML zip containers assembled in memory: a
//! flow-document (`.docx`) with headings and paragraphs, or a slide deck
//! (`.pptx`) with a title slide followed by one slide per section.

use std::io::{Cursor, Write};

use quick_xml::escape::escape;
use zip::{write::FileOptions, ZipWriter};

use crate::domain::{OutputKind, Project, Section};

/// Error type for the rendering pipeline.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("unsupported project type: {0}")]
    UnsupportedKind(String),

    #[error("archive assembly failed: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("archive write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// A fully rendered office file, ready to be streamed to the client.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub content_type: &'static str,
}

/// Renders a project into the container format named by its `output_kind`.
///
/// Sections are sorted by `order_index` here, so callers may pass them in
/// any order. An unknown kind fails before any bytes are produced.
pub fn render_project(project: &Project, sections: &[Section]) -> Result<RenderedDocument, RenderError> {
    let kind = OutputKind::parse(&project.output_kind)
        .map_err(|e| RenderError::UnsupportedKind(e.0))?;

    let mut ordered: Vec<&Section> = sections.iter().collect();
    ordered.sort_by_key(|s| s.order_index);

    let bytes = match kind {
        OutputKind::Document => build_docx(project, &ordered)?,
        OutputKind::SlideDeck => build_pptx(project, &ordered)?,
    };

    Ok(RenderedDocument {
        bytes,
        filename: format!("{}.{}", project.title.replace(' ', "_"), kind.extension()),
        content_type: kind.content_type(),
    })
}

/// Splits flow-document content into paragraph blocks on blank-line
/// boundaries, trimming each block and dropping empty ones.
fn paragraph_blocks(content: &str) -> Vec<&str> {
    content
        .split("\n\n")
        .map(str::trim)
        .filter(|block| !block.is_empty())
        .collect()
}

/// Splits slide content into non-empty trimmed lines.
fn bullet_lines(content: &str) -> Vec<&str> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

fn xml_text(raw: &str) -> String {
    escape(raw).into_owned()
}

//=========================================================================================
// DOCX assembly
//=========================================================================================

fn build_docx(project: &Project, sections: &[&Section]) -> Result<Vec<u8>, RenderError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options: FileOptions = FileOptions::default();

    zip.start_file("[Content_Types].xml", options)?;
    zip.write_all(
        br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
    <Default Extension="xml" ContentType="application/xml"/>
    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
    <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
    <Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>
    <Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
    <Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>
</Types>"#,
    )?;

    zip.start_file("_rels/.rels", options)?;
    zip.write_all(
        br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
    <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
    <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/>
</Relationships>"#,
    )?;

    write_doc_props(&mut zip, &project.title, "Document")?;

    zip.start_file("word/_rels/document.xml.rels", options)?;
    zip.write_all(
        br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#,
    )?;

    zip.start_file("word/styles.xml", options)?;
    zip.write_all(
        br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
    <w:style w:type="paragraph" w:styleId="Heading1">
        <w:name w:val="heading 1"/>
        <w:pPr><w:outlineLvl w:val="0"/></w:pPr>
        <w:rPr><w:b/><w:sz w:val="48"/></w:rPr>
    </w:style>
    <w:style w:type="paragraph" w:styleId="Heading2">
        <w:name w:val="heading 2"/>
        <w:pPr><w:outlineLvl w:val="1"/></w:pPr>
        <w:rPr><w:b/><w:sz w:val="36"/></w:rPr>
    </w:style>
</w:styles>"#,
    )?;

    let mut body = String::new();
    body.push_str(&docx_heading("Heading1", &project.title));
    for section in sections {
        body.push_str(&docx_heading("Heading2", &section.title));
        let content = section.content.as_deref().unwrap_or("");
        for block in paragraph_blocks(content) {
            body.push_str(&docx_paragraph(block));
        }
    }

    zip.start_file("word/document.xml", options)?;
    let document_xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
    <w:body>
{body}        <w:sectPr/>
    </w:body>
</w:document>"#,
        body = body
    );
    zip.write_all(document_xml.as_bytes())?;

    Ok(zip.finish()?.into_inner())
}

fn docx_heading(style: &str, text: &str) -> String {
    format!(
        "        <w:p><w:pPr><w:pStyle w:val=\"{style}\"/></w:pPr><w:r><w:t xml:space=\"preserve\">{text}</w:t></w:r></w:p>\n",
        style = style,
        text = xml_text(text)
    )
}

fn docx_paragraph(text: &str) -> String {
    format!(
        "        <w:p><w:r><w:t xml:space=\"preserve\">{text}</w:t></w:r></w:p>\n",
        text = xml_text(text)
    )
}

//=========================================================================================
// PPTX assembly
//=========================================================================================

// 16:9 slide surface in EMUs.
const SLIDE_CX: u64 = 9144000;
const SLIDE_CY: u64 = 5143500;

fn build_pptx(project: &Project, sections: &[&Section]) -> Result<Vec<u8>, RenderError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options: FileOptions = FileOptions::default();
    let slide_count = sections.len() + 1;

    zip.start_file("[Content_Types].xml", options)?;
    let content_types = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
    <Default Extension="xml" ContentType="application/xml"/>
    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
    <Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>
    <Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
    <Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>
    {slides}
</Types>"#,
        slides = (1..=slide_count)
            .map(|i| format!(
                r#"<Override PartName="/ppt/slides/slide{}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#,
                i
            ))
            .collect::<Vec<String>>()
            .join("\n    ")
    );
    zip.write_all(content_types.as_bytes())?;

    zip.start_file("_rels/.rels", options)?;
    zip.write_all(
        br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/>
    <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
    <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/>
</Relationships>"#,
    )?;

    write_doc_props(&mut zip, &project.title, "Presentation")?;

    zip.start_file("ppt/_rels/presentation.xml.rels", options)?;
    let mut pres_rels = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
"#,
    );
    for i in 1..=slide_count {
        pres_rels.push_str(&format!(
            r#"    <Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide{}.xml"/>"#,
            i, i
        ));
        pres_rels.push('\n');
    }
    pres_rels.push_str("</Relationships>");
    zip.write_all(pres_rels.as_bytes())?;

    zip.start_file("ppt/presentation.xml", options)?;
    let presentation_xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
    <p:sldIdLst>
{slide_ids}
    </p:sldIdLst>
    <p:sldSz cx="{cx}" cy="{cy}"/>
    <p:notesSz cx="6858000" cy="9144000"/>
</p:presentation>"#,
        slide_ids = (1..=slide_count)
            .map(|i| format!(r#"        <p:sldId id="{}" r:id="rId{}"/>"#, 256 + i - 1, i))
            .collect::<Vec<String>>()
            .join("\n"),
        cx = SLIDE_CX,
        cy = SLIDE_CY
    );
    zip.write_all(presentation_xml.as_bytes())?;

    // Slide 1: the project title with an empty subtitle.
    zip.start_file("ppt/slides/slide1.xml", options)?;
    zip.write_all(title_slide_xml(&project.title).as_bytes())?;

    for (i, section) in sections.iter().enumerate() {
        let content = section.content.as_deref().unwrap_or("");
        let lines = bullet_lines(content);
        zip.start_file(format!("ppt/slides/slide{}.xml", i + 2), options)?;
        zip.write_all(content_slide_xml(&section.title, &lines).as_bytes())?;
    }

    Ok(zip.finish()?.into_inner())
}

fn title_slide_xml(title: &str) -> String {
    let title_shape = text_shape(2, "Title", 457200, 1828800, 8229600, 1143000, &[title]);
    let subtitle_shape = text_shape(3, "Subtitle", 457200, 3200400, 8229600, 742950, &[]);
    slide_xml(&format!("{}{}", title_shape, subtitle_shape))
}

fn content_slide_xml(title: &str, lines: &[&str]) -> String {
    let title_shape = text_shape(2, "Title", 457200, 274638, 8229600, 857250, &[title]);
    let body_shape = text_shape(3, "Body", 457200, 1280160, 8229600, 3520440, lines);
    slide_xml(&format!("{}{}", title_shape, body_shape))
}

fn slide_xml(shapes: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
    <p:cSld>
        <p:spTree>
            <p:nvGrpSpPr>
                <p:cNvPr id="1" name=""/>
                <p:cNvGrpSpPr/>
                <p:nvPr/>
            </p:nvGrpSpPr>
            <p:grpSpPr>
                <a:xfrm>
                    <a:off x="0" y="0"/>
                    <a:ext cx="0" cy="0"/>
                    <a:chOff x="0" y="0"/>
                    <a:chExt cx="0" cy="0"/>
                </a:xfrm>
            </p:grpSpPr>
{shapes}        </p:spTree>
    </p:cSld>
</p:sld>"#,
        shapes = shapes
    )
}

/// A plain text box. The first paragraph is the primary body text and each
/// further entry becomes an additional paragraph in the same placeholder.
/// An empty paragraph list still emits one empty `<a:p/>` so the shape has
/// a well-formed, empty body.
fn text_shape(id: u32, name: &str, x: u64, y: u64, cx: u64, cy: u64, paragraphs: &[&str]) -> String {
    let body = if paragraphs.is_empty() {
        "                    <a:p/>\n".to_string()
    } else {
        paragraphs
            .iter()
            .map(|p| {
                format!(
                    "                    <a:p><a:r><a:t>{}</a:t></a:r></a:p>\n",
                    xml_text(p)
                )
            })
            .collect()
    };
    format!(
        r#"            <p:sp>
                <p:nvSpPr>
                    <p:cNvPr id="{id}" name="{name}"/>
                    <p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr>
                    <p:nvPr/>
                </p:nvSpPr>
                <p:spPr>
                    <a:xfrm>
                        <a:off x="{x}" y="{y}"/>
                        <a:ext cx="{cx}" cy="{cy}"/>
                    </a:xfrm>
                    <a:prstGeom prst="rect"><a:avLst/></a:prstGeom>
                </p:spPr>
                <p:txBody>
                    <a:bodyPr/>
                    <a:lstStyle/>
{body}                </p:txBody>
            </p:sp>
"#,
        id = id,
        name = name,
        x = x,
        y = y,
        cx = cx,
        cy = cy,
        body = body
    )
}

//=========================================================================================
// Shared document properties
//=========================================================================================

fn write_doc_props(
    zip: &mut ZipWriter<Cursor<Vec<u8>>>,
    title: &str,
    application_kind: &str,
) -> Result<(), RenderError> {
    let options: FileOptions = FileOptions::default();

    zip.start_file("docProps/core.xml", options)?;
    let core_xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:title>{title}</dc:title>
    <dc:creator>draftforge</dc:creator>
    <cp:revision>1</cp:revision>
</cp:coreProperties>"#,
        title = xml_text(title)
    );
    zip.write_all(core_xml.as_bytes())?;

    zip.start_file("docProps/app.xml", options)?;
    let app_xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties">
    <Application>draftforge</Application>
    <AppVersion>0.1</AppVersion>
    <TitlesOfParts>{kind}</TitlesOfParts>
</Properties>"#,
        kind = application_kind
    );
    zip.write_all(app_xml.as_bytes())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::io::Read;
    use uuid::Uuid;

    fn project(kind: &str, title: &str) -> Project {
        Project {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            title: title.to_string(),
            output_kind: kind.to_string(),
            description: None,
            created_at: Utc::now(),
        }
    }

    fn section(project_id: Uuid, order_index: i32, title: &str, content: &str) -> Section {
        Section {
            id: Uuid::new_v4(),
            project_id,
            order_index,
            title: title.to_string(),
            content: Some(content.to_string()),
            is_liked: None,
            comment: None,
            last_refined_at: Utc::now(),
        }
    }

    fn read_part(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
        let mut part = archive.by_name(name).unwrap();
        let mut out = String::new();
        part.read_to_string(&mut out).unwrap();
        out
    }

    fn part_names(bytes: &[u8]) -> Vec<String> {
        let archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
        archive.file_names().map(str::to_string).collect()
    }

    #[test]
    fn docx_has_title_heading_and_sections_in_order_index_order() {
        let p = project("docx", "Renewable Energy");
        // Passed out of order on purpose.
        let sections = vec![
            section(p.id, 1, "Grid Storage Challenges", "Batteries.\n\nPumped hydro."),
            section(p.id, 0, "Solar Adoption Trends", "Rooftop growth."),
        ];
        let rendered = render_project(&p, &sections).unwrap();

        let doc = read_part(&rendered.bytes, "word/document.xml");
        let h1 = doc.find("Renewable Energy").unwrap();
        let s0 = doc.find("Solar Adoption Trends").unwrap();
        let s1 = doc.find("Grid Storage Challenges").unwrap();
        assert!(h1 < s0 && s0 < s1);
        assert_eq!(doc.matches("Heading1").count(), 1);
        assert_eq!(doc.matches("Heading2").count(), 2);
    }

    #[test]
    fn docx_splits_content_on_blank_lines_and_trims_blocks() {
        let p = project("docx", "Report");
        let sections = vec![section(
            p.id,
            0,
            "Body",
            "  first block  \n\n\n\nsecond block\n\n   \n\nthird block",
        )];
        let rendered = render_project(&p, &sections).unwrap();

        let doc = read_part(&rendered.bytes, "word/document.xml");
        assert!(doc.contains(">first block</w:t>"));
        assert!(doc.contains(">second block</w:t>"));
        assert!(doc.contains(">third block</w:t>"));
        // Headings (title + section) plus exactly three paragraph blocks.
        assert_eq!(doc.matches("<w:p>").count(), 5);
    }

    #[test]
    fn docx_empty_content_renders_heading_with_no_paragraphs() {
        let p = project("docx", "Report");
        let mut s = section(p.id, 0, "Empty", "");
        s.content = Some(String::new());
        let rendered = render_project(&p, &[s]).unwrap();

        let doc = read_part(&rendered.bytes, "word/document.xml");
        assert!(doc.contains("Empty"));
        // Only the two headings.
        assert_eq!(doc.matches("<w:p>").count(), 2);
    }

    #[test]
    fn docx_escapes_markup_in_titles_and_content() {
        let p = project("docx", "R&D <Q3>");
        let sections = vec![section(p.id, 0, "Costs & Margins", "1 < 2 & 3 > 2")];
        let rendered = render_project(&p, &sections).unwrap();

        let doc = read_part(&rendered.bytes, "word/document.xml");
        assert!(doc.contains("R&amp;D &lt;Q3&gt;"));
        assert!(doc.contains("Costs &amp; Margins"));
        assert!(doc.contains("1 &lt; 2 &amp; 3 &gt; 2"));
    }

    #[test]
    fn rendering_is_idempotent_for_text_parts() {
        let p = project("docx", "Stable Output");
        let sections = vec![section(p.id, 0, "Body", "alpha\n\nbeta")];
        let a = render_project(&p, &sections).unwrap();
        let b = render_project(&p, &sections).unwrap();
        assert_eq!(
            read_part(&a.bytes, "word/document.xml"),
            read_part(&b.bytes, "word/document.xml")
        );
    }

    #[test]
    fn pptx_q3_review_scenario() {
        let p = project("pptx", "Q3 Review");
        let sections = vec![section(
            p.id,
            0,
            "Revenue",
            "Up 12%\nCosts flat\nMargin improved",
        )];
        let rendered = render_project(&p, &sections).unwrap();

        assert_eq!(rendered.filename, "Q3_Review.pptx");
        assert_eq!(
            rendered.content_type,
            "application/vnd.openxmlformats-officedocument.presentationml.presentation"
        );

        let names = part_names(&rendered.bytes);
        assert!(names.contains(&"ppt/slides/slide1.xml".to_string()));
        assert!(names.contains(&"ppt/slides/slide2.xml".to_string()));
        assert!(!names.contains(&"ppt/slides/slide3.xml".to_string()));

        let title_slide = read_part(&rendered.bytes, "ppt/slides/slide1.xml");
        assert!(title_slide.contains("Q3 Review"));

        let content_slide = read_part(&rendered.bytes, "ppt/slides/slide2.xml");
        assert!(content_slide.contains("Revenue"));
        let up = content_slide.find("Up 12%").unwrap();
        let costs = content_slide.find("Costs flat").unwrap();
        let margin = content_slide.find("Margin improved").unwrap();
        assert!(up < costs && costs < margin);
        assert_eq!(content_slide.matches("<a:p>").count(), 4); // title + 3 body lines
    }

    #[test]
    fn pptx_section_without_lines_gets_empty_body() {
        let p = project("pptx", "Deck");
        let sections = vec![section(p.id, 0, "Blank", "   \n  \n")];
        let rendered = render_project(&p, &sections).unwrap();

        let slide = read_part(&rendered.bytes, "ppt/slides/slide2.xml");
        assert!(slide.contains("Blank"));
        assert!(slide.contains("<a:p/>"));
    }

    #[test]
    fn pptx_slide_count_matches_sections_plus_title() {
        let p = project("pptx", "Deck");
        let sections = vec![
            section(p.id, 2, "Third", "c"),
            section(p.id, 0, "First", "a"),
            section(p.id, 1, "Second", "b"),
        ];
        let rendered = render_project(&p, &sections).unwrap();

        let presentation = read_part(&rendered.bytes, "ppt/presentation.xml");
        assert_eq!(presentation.matches("<p:sldId ").count(), 4);
        // order_index ordering regardless of insertion order
        assert!(read_part(&rendered.bytes, "ppt/slides/slide2.xml").contains("First"));
        assert!(read_part(&rendered.bytes, "ppt/slides/slide3.xml").contains("Second"));
        assert!(read_part(&rendered.bytes, "ppt/slides/slide4.xml").contains("Third"));
    }

    #[test]
    fn filename_replaces_spaces_with_underscores() {
        let p = project("docx", "My Annual Report");
        let rendered = render_project(&p, &[]).unwrap();
        assert_eq!(rendered.filename, "My_Annual_Report.docx");
        assert_eq!(
            rendered.content_type,
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        );
    }

    #[test]
    fn unsupported_kind_fails_naming_the_value() {
        let p = project("xlsx", "Spreadsheet");
        let err = render_project(&p, &[]).unwrap_err();
        match err {
            RenderError::UnsupportedKind(value) => assert_eq!(value, "xlsx"),
            other => panic!("expected UnsupportedKind, got {:?}", other),
        }
    }
}
