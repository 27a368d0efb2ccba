use crate::{error::EngineError, table::TableData};
use model::result_set::ResultDocument;
use std::{
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};
use uuid::Uuid;

/// Write a completed result set to `{dir}/{request_id}.json`. A crashed
/// write leaves a partial file behind; the expiry sweep reclaims it.
pub fn write_spill(
    dir: &Path,
    request_id: Uuid,
    table: &TableData,
) -> Result<PathBuf, EngineError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("{request_id}.json"));
    let file = std::fs::File::create(&path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, &ResultDocument::new(&table.columns, &table.rows))?;
    writer.flush()?;
    Ok(path)
}
