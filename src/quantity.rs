use thiserror::Error;

/// A quantity string that could not be converted to MiB
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("invalid memory quantity: {0:?}")]
pub struct InvalidQuantity(pub String);

/// Parse a Kubernetes memory quantity (e.g. "6374M", "1024Ki", "2G")
/// into whole MiB
///
/// Only the units the metrics API reports for memory are supported;
/// a missing unit defaults to "M". Fractional quantities are not
/// expressible in this format, and Ki values truncate toward zero.
pub fn parse(value: &str) -> Result<u64, InvalidQuantity> {
  let split = value.find(|c: char| !c.is_ascii_digit()).unwrap_or(value.len());
  let (digits, unit) = value.split_at(split);

  if digits.is_empty() || !unit.chars().all(|c| c.is_ascii_alphabetic()) {
    return Err(InvalidQuantity(value.to_owned()));
  }

  let number: u64 = digits.parse().map_err(|_| InvalidQuantity(value.to_owned()))?;

  match unit {
    "Ki" => Ok(number / 1024),
    "" | "M" | "Mi" => Ok(number),
    "G" | "Gi" => Ok(number * 1024),
    _ => Err(InvalidQuantity(value.to_owned())),
  }
}
