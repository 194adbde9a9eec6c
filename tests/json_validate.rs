use plakat::{Layer, Template};

#[test]
fn json_fixture_validates() {
    let s = include_str!("data/simple_template.json");
    let template: Template = serde_json::from_str(s).unwrap();
    template.validate().unwrap();

    assert_eq!(template.canvas_width, 1080);
    assert_eq!(template.layers.len(), 4);
    // The legacy "sticker" layer survives parsing as an unknown tag.
    assert!(matches!(template.layers[2], Layer::Unknown));
}

#[test]
fn json_fixture_renders() {
    let s = include_str!("data/simple_template.json");
    let template: Template = serde_json::from_str(s).unwrap();
    template.validate().unwrap();

    let img = plakat::render(&template).unwrap();
    assert_eq!(img.width, 1080);
    assert_eq!(img.height, 1080);
    assert_eq!(img.data.len(), 1080 * 1080 * 4);
    // The backdrop shape covers the center; nothing there is canvas white.
    assert_ne!(img.pixel(540, 900).unwrap(), [255, 255, 255, 255]);
}

#[test]
fn missing_layers_field_is_rejected() {
    let err = serde_json::from_str::<Template>(r#"{"canvasWidth":100,"canvasHeight":100}"#)
        .unwrap_err();
    assert!(err.to_string().contains("layers"));
}

#[test]
fn malformed_color_is_rejected() {
    let json = serde_json::json!({
        "canvasWidth": 100, "canvasHeight": 100,
        "layers": [{
            "type": "shape", "id": "s",
            "x": 0, "y": 0, "width": 10, "height": 10,
            "fillColor": "red"
        }]
    });
    assert!(serde_json::from_value::<Template>(json).is_err());
}
