//! Typed view of the page layout document.
//!
//! Fields the types do not know about are kept in the session's untyped
//! value and in the raw text; they are only dropped when a document is
//! rebuilt from these types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Document a new editing session starts with.
pub const INITIAL_DOCUMENT: &str = r#"title: "My Parallax LP"
sections:
  - type: hero
    bg_image: "images/hero.jpg"
    headline: "Welcome"
"#;

/// A landing page built from a list of sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PageLayout {
    /// Page title.
    pub title: String,
    /// Sections, rendered top to bottom.
    pub sections: Vec<Section>,
}

/// Kind of a page section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Hero,
    Feature,
    Parallax,
    Footer,
}

/// One section of the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Section {
    #[serde(rename = "type")]
    pub kind: SectionKind,
    /// Background image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bg_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtext: Option<String>,
    /// Background color, any CSS color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bg_color: Option<String>,
    /// Feature list of a `feature` section.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<FeatureItem>,
    /// Parallax strength between 0 and 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(range(min = 0.0, max = 1.0))]
    pub strength: Option<f64>,
}

impl Section {
    pub fn new(kind: SectionKind) -> Self {
        Self {
            kind,
            bg_image: None,
            headline: None,
            subtext: None,
            bg_color: None,
            items: Vec::new(),
            strength: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FeatureItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use formsync::{
        Schema, TextCodec,
        codec::YamlCodec,
        data::{FieldKind, validate},
    };
    use serde_json::json;

    #[test]
    fn test_initial_document() {
        let value = YamlCodec.parse(INITIAL_DOCUMENT).unwrap();
        let page: PageLayout = serde_json::from_value(value).unwrap();
        assert_eq!(page.title, "My Parallax LP");
        assert_eq!(page.sections.len(), 1);
        assert_eq!(page.sections[0].kind, SectionKind::Hero);
        assert_eq!(page.sections[0].bg_image.as_deref(), Some("images/hero.jpg"));
        assert_eq!(page.sections[0].headline.as_deref(), Some("Welcome"));
    }

    #[test]
    fn test_derived_schema_matches_rules() {
        let schema = Schema::for_type::<PageLayout>().unwrap();
        assert!(schema.root.is_required("title"));
        assert!(schema.root.is_required("sections"));

        let section = schema.field(&"sections[0]".parse().unwrap()).unwrap();
        assert!(section.is_required("type"));
        assert!(!section.is_required("headline"));
        assert_eq!(section.property("type").unwrap().kind, FieldKind::Enum);

        let report = validate(
            &json!({"title": "T", "sections": [{"type": "footer", "bg_color": "#000"}]}),
            &schema,
        );
        assert!(report.is_valid(), "{report}");
    }

    #[test]
    fn test_serialized_section_omits_empty_fields() {
        let mut section = Section::new(SectionKind::Parallax);
        section.strength = Some(0.4);
        assert_eq!(
            serde_json::to_value(&section).unwrap(),
            json!({"type": "parallax", "strength": 0.4})
        );
    }
}
