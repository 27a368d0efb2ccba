use crate::error::CliError;

/// Pretty-print a spilled result document.
pub fn print_result(bytes: &[u8]) -> Result<(), CliError> {
    let doc: serde_json::Value = serde_json::from_slice(bytes)?;
    println!("{}", serde_json::to_string_pretty(&doc)?);
    Ok(())
}

pub fn print_json<T: serde::Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
