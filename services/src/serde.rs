//! Lenient number fields for indexer payloads, which send counts either as JSON numbers
//! or as decimal strings and sometimes as `null`.

use serde::Deserialize;

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(u64),
    String(String),
    Null(()),
}

pub fn deserialize_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) => s.trim().parse::<u64>().map_err(serde::de::Error::custom),
        NumberOrString::Null(()) => Ok(0),
    }
}

pub fn deserialize_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let n = deserialize_u64(deserializer)?;
    u32::try_from(n).map_err(serde::de::Error::custom)
}

/// Like [`deserialize_u32`], but `null` stays `None`. Pair with `#[serde(default)]`.
pub fn deserialize_option_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let n = match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => n,
        NumberOrString::String(s) => s.trim().parse::<u64>().map_err(serde::de::Error::custom)?,
        NumberOrString::Null(()) => return Ok(None),
    };

    u32::try_from(n).map(Some).map_err(serde::de::Error::custom)
}
