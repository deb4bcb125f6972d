//! Unit tests for the data URL codec

use inpaint_gateway::codec::data_url;
use inpaint_gateway::AppError;

#[test]
fn test_round_trip_various_lengths() {
    for len in [0usize, 1, 2, 3, 4, 5, 63, 64, 65, 1000, 4099] {
        let bytes: Vec<u8> = (0..len).map(|i| (i * 31 % 251) as u8).collect();
        let url = data_url::encode(&bytes, "image/webp");
        let asset = data_url::decode(&url).unwrap();
        assert_eq!(asset.mime, "image/webp");
        assert_eq!(asset.bytes, bytes, "length {len}");
    }
}

#[test]
fn test_encode_format() {
    assert_eq!(data_url::encode(b"Hello, World!", "image/png"), "data:image/png;base64,SGVsbG8sIFdvcmxkIQ==");
}

#[test]
fn test_strings_without_marker_never_panic() {
    let inputs = [
        "data:image/png;base6,AAAA",
        "data:image/png;BASE64,AAAA",
        "data:;",
        "data:image/png;base64",
        "base64,AAAA",
        "data:\u{1F600};",
    ];
    for input in inputs {
        assert!(matches!(data_url::decode(input), Err(AppError::MalformedInput(_))), "{input}");
    }
}

#[test]
fn test_payload_containing_marker_text_splits_on_first() {
    // Only the first marker frames the payload
    let asset = data_url::decode("data:text/plain;base64,YmFzZTY0LA==").unwrap();
    assert_eq!(asset.bytes, b"base64,");
}
