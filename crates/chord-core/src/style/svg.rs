//! SVG clipboard payload for pasting a style.
//!
//! The drawing application accepts a small SVG document on the clipboard
//! whose `<inkscape:clipboard style="..."/>` element carries the style to
//! apply.  When the style references an arrow marker, the marker definition
//! must travel along in a `<defs>` block, otherwise the pasted reference
//! dangles.

use super::StyleDescriptor;

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>"#;

/// Id of the arrow marker sized for `width`.
pub fn marker_id(width: f64) -> String {
    format!("marker-arrow-{width}")
}

/// Arrow marker definition, after TikZ's default arrow tip.
fn marker_defs(width: f64) -> String {
    format!(
        r##"<defs id="marker-defs">
<marker style="overflow:visible" id="{id}" refX="0" refY="0" orient="auto-start-reverse" inkscape:stockid="Arrow1Mend" inkscape:isstock="true">
<path transform="matrix(-0.4,0,0,-0.4,-4,0)" style="fill:#000000;fill-opacity:1;fill-rule:evenodd;stroke:#000000;stroke-width:1pt;stroke-opacity:1" d="M 0,0 5,-5 -12.5,0 5,5 Z" id="path1025-6" />
</marker>
</defs>
"##,
        id = marker_id(width)
    )
}

/// Serializes `style` into the clipboard document.
pub fn clipboard_document(style: &StyleDescriptor) -> String {
    let mut doc = String::with_capacity(512);
    doc.push_str(XML_DECLARATION);
    doc.push('\n');
    doc.push_str("<svg>\n");
    if style.has_marker() {
        doc.push_str(&marker_defs(style.stroke_width()));
    }
    doc.push_str(&format!(
        r#"<inkscape:clipboard style="{}" /></svg>"#,
        style.to_style_string()
    ));
    doc
}
