use std::path::Path;

use serde::Serialize;
use tokio::{fs::File, io::AsyncWriteExt};

use crate::normalize::DocumentRecord;
use crate::Result;

/// Writes the full record sequence to `path` as one indented JSON array,
/// overwriting whatever was there. serde_json leaves non-ASCII text
/// unescaped, so accented characters land in the file as-is.
pub async fn write_export(records: &[DocumentRecord], path: impl AsRef<Path>) -> Result<()> {
    let mut buf = Vec::with_capacity(records.len() * 256 + 2);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    records.serialize(&mut serializer)?;

    let mut file = File::create(path).await?;
    file.write_all(&buf).await?;
    Ok(())
}
