//! `data:<mime>;base64,<payload>` parsing and serialization

use base64::{
    alphabet,
    engine::{general_purpose::STANDARD, DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};

use crate::error::{AppError, Result};

/// Browsers and canvas exports are not consistent about trailing `=`
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

const PREFIX: &str = "data:";
const MARKER: &str = "base64,";

/// Mime type and raw bytes carried by a data URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedAsset {
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Split a data URL into its mime type and decoded payload
pub fn decode(url: &str) -> Result<DecodedAsset> {
    if !url.starts_with(PREFIX) {
        return Err(AppError::MalformedInput(
            "Expected a data URL with base64, e.g. data:image/png;base64,...".to_string(),
        ));
    }

    let (header, payload) = url.split_once(MARKER).ok_or_else(|| {
        AppError::MalformedInput("Data URL is missing the 'base64,' marker".to_string())
    })?;

    let mime = header[PREFIX.len()..]
        .split(';')
        .next()
        .unwrap_or_default()
        .to_string();

    // Line-wrapped payloads (MIME style) are accepted
    let compact: Vec<u8> = payload.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    let bytes = LENIENT
        .decode(&compact)
        .map_err(|e| AppError::MalformedInput(format!("Invalid base64 payload: {}", e)))?;

    Ok(DecodedAsset { mime, bytes })
}

/// Serialize bytes into a data URL. Never fails.
pub fn encode(bytes: &[u8], mime: &str) -> String {
    format!("{}{};{}{}", PREFIX, mime, MARKER, STANDARD.encode(bytes))
}
