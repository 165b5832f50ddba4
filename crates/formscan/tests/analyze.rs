use formscan::{analyze, analyze_with, AnalyzerConfig, FieldType, Rect, Strategy};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

/// A widget annotation that is also a terminal AcroForm field.
struct Widget {
    name: &'static str,
    field_type: &'static str,
    rect: [i64; 4],
}

/// A one-page Letter-sized PDF with Helvetica as `/F1`. `form` adds the
/// page's annotations to the document and returns them together with the
/// AcroForm root fields.
fn build_pdf_with(
    content: &str,
    form: impl FnOnce(&mut Document, ObjectId) -> (Vec<Object>, Vec<Object>),
) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let page_id = doc.new_object_id();

    let font = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let contents = doc.add_object(Stream::new(dictionary! {}, content.as_bytes().to_vec()));
    let (annots, fields) = form(&mut doc, page_id);

    doc.objects.insert(
        page_id,
        Object::Dictionary(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => contents,
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font } },
            "Annots" => annots,
        }),
    );
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );

    let mut catalog = dictionary! { "Type" => "Catalog", "Pages" => pages_id };
    if !fields.is_empty() {
        let acroform = doc.add_object(dictionary! { "Fields" => fields });
        catalog.set("AcroForm", acroform);
    }
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

fn rect_object(rect: [i64; 4]) -> Vec<Object> {
    rect.iter().map(|&v| Object::Integer(v)).collect()
}

/// Terminal widgets, each listed both on the page and as a root field.
fn build_pdf(content: &str, widgets: &[Widget]) -> Vec<u8> {
    build_pdf_with(content, |doc, page_id| {
        let annots: Vec<Object> = widgets
            .iter()
            .map(|w| {
                doc.add_object(dictionary! {
                    "Type" => "Annot",
                    "Subtype" => "Widget",
                    "P" => page_id,
                    "T" => Object::string_literal(w.name),
                    "FT" => w.field_type,
                    "Rect" => rect_object(w.rect),
                })
                .into()
            })
            .collect();
        (annots.clone(), annots)
    })
}

#[test]
fn native_text_widget_is_reported_once() {
    let bytes = build_pdf(
        "",
        &[Widget {
            name: "full_name",
            field_type: "Tx",
            rect: [50, 700, 250, 720],
        }],
    );
    let report = analyze(&bytes);
    assert!(report.success, "{:?}", report.error);
    assert_eq!(report.fields.len(), 1);

    let field = &report.fields[0];
    assert_eq!(field.name, "full_name");
    assert_eq!(field.field_type, FieldType::TextField);
    assert_eq!(field.confidence, 1.0);
    assert_eq!(field.page, 1);
    assert_eq!(field.rect, Rect::new(50.0, 72.0, 250.0, 92.0));
    assert_eq!(report.interactive_field_count, 1);
    assert_eq!(report.message, "Found 1 form fields across 1 pages (1 interactive)");
}

#[test]
fn colon_label_and_blank_yield_a_text_field() {
    let bytes = build_pdf(
        "BT /F1 10 Tf 72 700 Td (Name:) Tj ET BT /F1 10 Tf 110 700 Td (____________) Tj ET",
        &[],
    );
    let report = analyze(&bytes);
    assert!(report.success);
    assert_eq!(report.interactive_field_count, 0);

    let text_fields: Vec<_> = report
        .fields
        .iter()
        .filter(|f| f.field_type == FieldType::TextField)
        .collect();
    assert!(!text_fields.is_empty());
    assert!(text_fields
        .iter()
        .any(|f| f.detection_method.contains(formscan::DetectionMethod::LabelBasedPositioning)));
}

#[test]
fn label_and_blank_in_one_span_yield_a_text_field() {
    let bytes = build_pdf("BT /F1 10 Tf 72 700 Td (Name: ____________) Tj ET", &[]);
    let report = analyze(&bytes);
    assert!(report.success);
    assert!(report.fields.iter().any(|f| {
        f.field_type == FieldType::TextField
            && f.detection_method.contains(formscan::DetectionMethod::UnderlinePattern)
    }));
}

#[test]
fn valued_parent_is_reported_beside_its_kid_widgets() {
    let bytes = build_pdf_with("", |doc, page_id| {
        let parent_id = doc.new_object_id();
        let kids: Vec<Object> = [("first", [50, 700, 250, 720]), ("last", [50, 660, 250, 680])]
            .into_iter()
            .map(|(name, rect)| {
                doc.add_object(dictionary! {
                    "Type" => "Annot",
                    "Subtype" => "Widget",
                    "P" => page_id,
                    "Parent" => parent_id,
                    "T" => Object::string_literal(name),
                    "Rect" => rect_object(rect),
                })
                .into()
            })
            .collect();
        doc.objects.insert(
            parent_id,
            Object::Dictionary(dictionary! {
                "T" => Object::string_literal("applicant"),
                "FT" => "Tx",
                "V" => Object::string_literal("Jane"),
                "Kids" => kids.clone(),
            }),
        );
        (kids, vec![parent_id.into()])
    });

    let report = analyze(&bytes);
    assert!(report.success, "{:?}", report.error);
    let mut names: Vec<&str> = report.fields.iter().map(|f| f.name.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["applicant", "applicant.first", "applicant.last"]);
    assert_eq!(report.interactive_field_count, 3);

    let parent = report
        .fields
        .iter()
        .find(|f| f.name == "applicant")
        .unwrap();
    assert_eq!(parent.field_type, FieldType::TextField);
    assert_eq!(parent.rect, Rect::new(50.0, 72.0, 250.0, 132.0));
    assert_eq!(parent.default_value.as_deref(), Some("Jane"));
}

#[test]
fn small_drawn_square_is_a_checkbox() {
    let bytes = build_pdf("100 100 15 15 re S", &[]);
    let report = analyze(&bytes);
    assert!(report.success);
    assert_eq!(report.fields.len(), 1);

    let field = &report.fields[0];
    assert_eq!(field.field_type, FieldType::Checkbox);
    assert_eq!(field.confidence, 0.8);
    assert_eq!(field.detection_method.to_string(), "rectangle_analysis");
    assert_eq!(field.rect, Rect::new(100.0, 677.0, 115.0, 692.0));
    assert_eq!(field.name, "rect_field_1_1");
}

#[test]
fn garbage_bytes_fail_cleanly() {
    let report = analyze(b"this is certainly not a PDF document");
    assert!(!report.success);
    assert!(report.fields.is_empty());
    assert!(report.error.as_deref().is_some_and(|e| !e.is_empty()));
    assert_eq!(report.message, "Failed to analyze document");
}

#[test]
fn adjacent_native_checkboxes_are_not_merged() {
    let bytes = build_pdf(
        "",
        &[
            Widget {
                name: "yes",
                field_type: "Btn",
                rect: [100, 700, 112, 712],
            },
            Widget {
                name: "no",
                field_type: "Btn",
                rect: [103, 700, 115, 712],
            },
        ],
    );
    let report = analyze(&bytes);
    assert!(report.success);
    assert_eq!(report.fields.len(), 2);
    assert!(report
        .fields
        .iter()
        .all(|f| f.field_type == FieldType::Checkbox && f.is_native()));
    let mut names: Vec<&str> = report.fields.iter().map(|f| f.name.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["no", "yes"]);
}

#[test]
fn repeated_analysis_is_identical() {
    let bytes = build_pdf(
        "BT /F1 12 Tf 72 720 Td (Applicant Name) Tj ET \
         BT /F1 10 Tf 72 650 Td (Email:) Tj ET \
         BT /F1 10 Tf 72 600 Td ([ ] Yes  [ ] No) Tj ET \
         72 500 m 300 500 l S \
         100 400 200 20 re S",
        &[Widget {
            name: "agree",
            field_type: "Btn",
            rect: [400, 100, 412, 112],
        }],
    );
    let first = analyze(&bytes);
    let second = analyze(&bytes);
    assert!(first.success);
    assert!(first.fields.len() > 3);
    assert_eq!(first.fields, second.fields);
    assert_eq!(first.summary, second.summary);
}

#[test]
fn native_strategy_skips_heuristics() {
    let bytes = build_pdf(
        "100 100 15 15 re S 72 500 m 300 500 l S",
        &[Widget {
            name: "agree",
            field_type: "Btn",
            rect: [400, 100, 412, 112],
        }],
    );
    let config = AnalyzerConfig::default().with_strategy(Strategy::Native);
    let report = analyze_with(&bytes, &config);
    assert_eq!(report.fields.len(), 1);
    assert_eq!(report.fields[0].name, "agree");

    let heuristic = analyze_with(&bytes, &AnalyzerConfig::default().with_strategy(Strategy::Heuristic));
    assert_eq!(heuristic.interactive_field_count, 0);
    assert_eq!(heuristic.fields.len(), 2);
}

#[test]
fn toml_config_drives_filters() {
    let config = AnalyzerConfig::from_toml_str(
        r#"
        min_confidence = 0.75
        "#,
    )
    .unwrap();
    let bytes = build_pdf("100 100 15 15 re S 72 500 m 300 500 l S", &[]);
    let report = analyze_with(&bytes, &config);
    assert_eq!(report.fields.len(), 1);
    assert_eq!(report.fields[0].field_type, FieldType::Checkbox);
}

#[test]
fn native_strategy_reports_drawn_boxes_it_does_not_list() {
    let bytes = build_pdf(
        "BT /F1 12 Tf 72 740 Td (Form W-9) Tj ET 100 400 200 20 re S 100 300 200 20 re S",
        &[],
    );
    let report = analyze_with(&bytes, &AnalyzerConfig::default().with_strategy(Strategy::Native));
    assert!(report.success);
    assert!(report.fields.is_empty());
    assert_eq!(report.visual_field_count, 2);
    assert_eq!(report.document_type.as_deref(), Some("IRS Form W-9"));
    assert!(report
        .message
        .ends_with("(detected 2 visual form elements that aren't interactive)"));
}
