use crate::error::{OptionsError, Result};
use crate::value::{OptionMap, OptionValue};
use std::collections::HashMap;

/// Read a nested value by dotted path, e.g. `redirect.destination`.
pub fn get_path<'a>(map: &'a OptionMap, path: &str) -> Option<&'a OptionValue> {
    let mut parts = path.split('.');
    let first = parts.next()?;
    let mut current = map.get(first)?;

    for part in parts {
        match current {
            OptionValue::Map(m) => current = m.get(part)?,
            _ => return None,
        }
    }
    Some(current)
}

/// Write a nested value by dotted path, creating intermediate sub-maps.
///
/// Fails when an intermediate segment is already occupied by a non-map value;
/// callers decide whether to replace the whole key instead.
pub fn set_path(map: &mut OptionMap, path: &str, value: OptionValue) -> Result<()> {
    let parts: Vec<&str> = path.split('.').collect();
    if parts.is_empty() || parts.iter().any(|p| p.is_empty()) {
        return Err(OptionsError::Path(format!("Invalid option path: '{}'", path)));
    }

    if parts.len() == 1 {
        map.insert(parts[0].to_string(), value);
        return Ok(());
    }

    let mut current = map
        .entry(parts[0].to_string())
        .or_insert_with(|| OptionValue::Map(HashMap::new()));

    for part in &parts[1..parts.len() - 1] {
        match current {
            OptionValue::Map(m) => {
                current = m
                    .entry(part.to_string())
                    .or_insert_with(|| OptionValue::Map(HashMap::new()));
            }
            _ => {
                return Err(OptionsError::Path(format!(
                    "Path segment '{}' in '{}' is not a sub-map",
                    part, path
                )))
            }
        }
    }

    match current {
        OptionValue::Map(m) => {
            m.insert(parts[parts.len() - 1].to_string(), value);
            Ok(())
        }
        _ => Err(OptionsError::Path(format!(
            "Path '{}' ends inside a non-map value",
            path
        ))),
    }
}

/// Delete a nested value by dotted path. Returns whether anything was removed.
pub fn delete_path(map: &mut OptionMap, path: &str) -> bool {
    let parts: Vec<&str> = path.split('.').collect();
    match parts.as_slice() {
        [] => false,
        [single] => map.remove(*single).is_some(),
        [first, rest @ ..] => {
            let Some(OptionValue::Map(m)) = map.get_mut(*first) else {
                return false;
            };
            delete_in_submap(m, rest)
        }
    }
}

fn delete_in_submap(map: &mut HashMap<String, OptionValue>, parts: &[&str]) -> bool {
    match parts {
        [] => false,
        [single] => map.remove(*single).is_some(),
        [first, rest @ ..] => {
            let Some(OptionValue::Map(m)) = map.get_mut(*first) else {
                return false;
            };
            delete_in_submap(m, rest)
        }
    }
}
