use super::*;
use crate::scene::layer::{BlendMode, LayerId, TextAlign, TextContent};
use serde_json::json;

fn doc_json() -> serde_json::Value {
    json!({
        "canvasSettings": {
            "width": 800,
            "height": 600,
            "background": "#202020",
            "grid": { "enabled": true, "size": 16, "color": "#ffffff22", "snap": true },
            "guides": { "enabled": true, "horizontal": [100.5], "vertical": [] },
            "isInfinite": false
        },
        "layers": [
            {
                "id": "a", "type": "text", "text": "Sale", "fontFamily": "Inter",
                "fontSize": 40, "textAlign": "center", "color": "#ff0000",
                "x": 10, "y": 20, "width": 300, "height": 60, "rotation": 15,
                "opacity": 80, "blendMode": "multiply", "isVisible": true, "isLocked": true
            },
            {
                "id": "b", "type": "image", "source": "assets/model.png",
                "x": 0, "y": 0, "width": 800, "height": 600
            }
        ]
    })
}

#[test]
fn parses_full_document() {
    let doc = Document::from_json_str(&doc_json().to_string()).unwrap();
    assert_eq!(doc.canvas_settings.width, 800.0);
    assert!(doc.canvas_settings.grid.snap);
    assert_eq!(doc.layers.len(), 2);
    let a = &doc.layers[0];
    assert_eq!(a.blend_mode, BlendMode::Multiply);
    assert!(a.is_locked);
    assert_eq!(a.text().unwrap().text_align, TextAlign::Center);
}

#[test]
fn rejects_duplicate_ids() {
    let mut v = doc_json();
    v["layers"][1]["id"] = json!("a");
    let err = Document::from_json_str(&v.to_string()).unwrap_err();
    assert!(matches!(err, ComposerError::InvalidDocument(_)));
}

#[test]
fn rejects_missing_required_fields() {
    let mut v = doc_json();
    v["layers"][1].as_object_mut().unwrap().remove("width");
    assert!(Document::from_json_str(&v.to_string()).is_err());
    assert!(Document::from_json_str("{ not json").is_err());
    assert!(Document::from_json_str("{\"layers\": []}").is_err());
}

#[test]
fn rejects_out_of_range_opacity_and_zero_size() {
    let mut v = doc_json();
    v["layers"][0]["opacity"] = json!(150);
    assert!(Document::from_json_str(&v.to_string()).is_err());

    let mut v = doc_json();
    v["layers"][1]["height"] = json!(0);
    assert!(Document::from_json_str(&v.to_string()).is_err());
}

#[test]
fn canvas_bounds_absent_for_infinite_canvas() {
    let mut cs = CanvasSettings::default();
    assert!(cs.bounds().is_some());
    cs.is_infinite = true;
    assert!(cs.bounds().is_none());
}

#[test]
fn transparent_background_maps_to_none() {
    let cs = CanvasSettings {
        background: "transparent".to_string(),
        ..CanvasSettings::default()
    };
    assert_eq!(cs.background_rgba().unwrap(), None);
}

#[test]
fn save_then_load_is_lossless() {
    let mut doc = Document::from_json_str(&doc_json().to_string()).unwrap();
    let mut t = Layer::new_text(
        TextContent {
            text: "Line one and two".to_string(),
            line_height: 1.37,
            ..TextContent::default()
        },
        BoundingBox::new(-12.25, 7.125, 333.3, 90.0),
    );
    t.id = LayerId::from("c");
    t.rotation = 271.5;
    t.opacity = 42.5;
    t.blend_mode = BlendMode::Luminosity;
    doc.layers.push(t);

    let s = doc.to_json_string_pretty().unwrap();
    let back = Document::from_json_str(&s).unwrap();
    assert_eq!(back, doc);
}

#[test]
fn rejects_unparseable_text_color() {
    let mut v = doc_json();
    v["layers"][0]["color"] = json!("nope");
    let err = Document::from_json_str(&v.to_string()).unwrap_err();
    assert!(matches!(err, ComposerError::InvalidDocument(ref m) if m.contains("'a' color")));

    v["layers"][0]["color"] = json!("#00ff0080");
    assert!(Document::from_json_str(&v.to_string()).is_ok());
}
