use steplog::config::READ_BUFFER_SIZE;
use steplog::core::codec;
use steplog::core::step::{StepList, StepRecord};
use steplog::error::FormatError;
use steplog::service::client::demo_payload;

#[test]
fn round_trip_preserves_order_and_duplicates() {
    let list = demo_payload();
    assert_eq!(list.len(), 8);

    let decoded = codec::decode(&codec::encode(&list)).expect("demo payload should decode");
    assert_eq!(decoded, list);

    // Duplicates survive: entries 5..8 repeat entries 1..4 verbatim.
    let steps: Vec<_> = decoded.iter().collect();
    for i in 0..4 {
        assert_eq!(steps[i], steps[i + 4]);
    }
    assert_eq!(steps[0].key(), "1");
    assert_eq!(steps[0].value(), "one");
    assert_eq!(steps[3].key(), "4");
    assert_eq!(steps[3].value(), "four");
}

#[test]
fn round_trip_empty_list() {
    let empty = StepList::new();
    let bytes = codec::encode(&empty);
    assert_eq!(bytes, b"<StepList />");
    assert_eq!(codec::decode(&bytes).unwrap(), empty);
}

#[test]
fn document_shape_is_stable() {
    let list = StepList::from(vec![StepRecord::new("1", "one")]);
    let doc = String::from_utf8(codec::encode(&list)).unwrap();
    assert_eq!(
        doc,
        "<StepList>\n  <Step>\n    <Name>one</Name>\n    <Desc>1</Desc>\n  </Step>\n</StepList>"
    );
}

#[test]
fn wire_fields_carry_value_under_name_and_key_under_desc() {
    let list = StepList::from(vec![StepRecord::new("42", "answer")]);
    let doc = String::from_utf8(codec::encode(&list)).unwrap();
    assert!(doc.contains("<Name>answer</Name>"));
    assert!(doc.contains("<Desc>42</Desc>"));
}

#[test]
fn rejects_wrong_root_element() {
    let err = codec::decode(b"<Steps>\n</Steps>").unwrap_err();
    assert_eq!(
        err,
        FormatError::UnexpectedElement {
            expected: "StepList".to_string(),
            found: "Steps".to_string(),
        }
    );
}

#[test]
fn rejects_step_with_missing_field() {
    let doc = b"<StepList>\n  <Step>\n    <Name>only</Name>\n  </Step>\n</StepList>";
    let err = codec::decode(doc).unwrap_err();
    assert_eq!(
        err,
        FormatError::UnexpectedElement {
            expected: "Desc".to_string(),
            found: "Step".to_string(),
        }
    );
}

#[test]
fn rejects_plain_text() {
    assert!(matches!(
        codec::decode(b"hello there"),
        Err(FormatError::UnexpectedElement { .. })
    ));
}

#[test]
fn rejects_trailing_content_after_root() {
    let doc = b"<StepList />leftover";
    assert_eq!(codec::decode(doc).unwrap_err(), FormatError::TrailingContent);
}

#[test]
fn oversized_document_truncated_to_buffer_fails_decode() {
    let big: StepList = (0..100)
        .map(|i| StepRecord::new(i.to_string(), format!("step number {i}")))
        .collect();
    let bytes = codec::encode(&big);
    assert!(bytes.len() > READ_BUFFER_SIZE);

    // The full document is fine; a single-buffer read of it is not.
    assert!(codec::decode(&bytes).is_ok());
    assert!(codec::decode(&bytes[..READ_BUFFER_SIZE]).is_err());
}
