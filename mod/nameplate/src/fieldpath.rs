//! Flat field-path codec.
//!
//! Edit forms submit sub-record attributes as flat paths, either dotted
//! (`ict.ratedVoltageAtNoLoad.hv`) or bracketed (`ict[impedanceVoltage][guaranteed][hv_iv]`,
//! `attrs[0].value`). [`nest`] rebuilds the nested document; [`flatten`]
//! produces the flat leaf list used to pre-populate a form from a stored
//! record. Key order follows insertion order throughout.

use serde_json::{Map, Value};

/// Normalize bracket segments to dotted form: `a[b][0].c` -> `a.b.0.c`.
fn normalize(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for ch in path.chars() {
        match ch {
            '[' => {
                if !out.ends_with('.') && !out.is_empty() {
                    out.push('.');
                }
            }
            ']' => {}
            c => out.push(c),
        }
    }
    out
}

/// Build a nested document from flat `(path, value)` pairs.
///
/// All-digit segments address array elements; other segments address object
/// keys. A type conflict at an intermediate level is resolved last-write-wins
/// for that path, without discarding sibling keys that still fit.
pub fn nest<I>(flat: I) -> Map<String, Value>
where
    I: IntoIterator<Item = (String, Value)>,
{
    let mut root = Value::Object(Map::new());
    for (path, value) in flat {
        let normalized = normalize(&path);
        let segments: Vec<&str> = normalized.split('.').filter(|s| !s.is_empty()).collect();
        if segments.is_empty() {
            continue;
        }
        set_path(&mut root, &segments, value);
    }
    match root {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn set_path(target: &mut Value, segments: &[&str], value: Value) {
    let (head, rest) = match segments.split_first() {
        Some(split) => split,
        None => return,
    };
    let index = head.parse::<usize>().ok();

    if let Some(i) = index {
        if !target.is_array() {
            *target = Value::Array(Vec::new());
        }
        let arr = match target.as_array_mut() {
            Some(arr) => arr,
            None => return,
        };
        while arr.len() <= i {
            arr.push(Value::Null);
        }
        if rest.is_empty() {
            arr[i] = value;
        } else {
            if !arr[i].is_object() && !arr[i].is_array() {
                arr[i] = Value::Object(Map::new());
            }
            set_path(&mut arr[i], rest, value);
        }
    } else {
        if !target.is_object() {
            *target = Value::Object(Map::new());
        }
        let map = match target.as_object_mut() {
            Some(map) => map,
            None => return,
        };
        if rest.is_empty() {
            map.insert((*head).to_string(), value);
        } else {
            let slot = map
                .entry((*head).to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            set_path(slot, rest, value);
        }
    }
}

/// Depth-first flatten of a nested document into `(path, leaf)` pairs.
///
/// Array elements get bracketed indices (`attrs[0].key`); empty containers
/// produce no entries. `parent` prefixes every path; pass `""` for the root.
pub fn flatten(nested: &Value, parent: &str) -> Vec<(String, Value)> {
    let mut out = Vec::new();
    flatten_into(nested, parent, &mut out);
    out
}

fn flatten_into(value: &Value, path: &str, out: &mut Vec<(String, Value)>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let child_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", path, key)
                };
                flatten_into(child, &child_path, out);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                flatten_into(child, &format!("{}[{}]", path, i), out);
            }
        }
        leaf => out.push((path.to_string(), leaf.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn nest_pairs(pairs: &[(&str, Value)]) -> Value {
        Value::Object(nest(
            pairs.iter().map(|(p, v)| (p.to_string(), v.clone())),
        ))
    }

    #[test]
    fn nests_dotted_and_bracketed_paths_alike() {
        let doc = nest_pairs(&[
            ("ct.ratedCurrentA", json!(2000.0)),
            ("ct[accuracyClass]", json!("0.2S")),
        ]);
        assert_eq!(
            doc,
            json!({"ct": {"ratedCurrentA": 2000.0, "accuracyClass": "0.2S"}})
        );
    }

    #[test]
    fn sibling_leaves_share_one_parent() {
        let doc = nest_pairs(&[
            ("ict.ratedVoltageAtNoLoad.hv", json!(400.0)),
            ("ict.ratedVoltageAtNoLoad.iv", json!(220.0)),
            ("ict.ratedVoltageAtNoLoad.lv", json!(33.0)),
            ("ict.powerMVA", json!(315.0)),
        ]);
        assert_eq!(
            doc,
            json!({"ict": {
                "ratedVoltageAtNoLoad": {"hv": 400.0, "iv": 220.0, "lv": 33.0},
                "powerMVA": 315.0,
            }})
        );
    }

    #[test]
    fn numeric_segments_build_arrays() {
        let doc = nest_pairs(&[
            ("attrs[0].key", json!("Material")),
            ("attrs[0].value", json!("Copper")),
            ("attrs[1].key", json!("Grade")),
            ("attrs[1].value", json!("E-Cu 58")),
        ]);
        assert_eq!(
            doc,
            json!({"attrs": [
                {"key": "Material", "value": "Copper"},
                {"key": "Grade", "value": "E-Cu 58"},
            ]})
        );
    }

    #[test]
    fn conflicting_levels_are_last_write_wins() {
        let doc = nest_pairs(&[
            ("cb.ratedVoltageKV", json!(420.0)),
            ("cb", json!("scalar")),
        ]);
        assert_eq!(doc, json!({"cb": "scalar"}));
    }

    #[test]
    fn flatten_walks_depth_first_in_key_order() {
        let doc = json!({"ict": {
            "powerMVA": 315.0,
            "losses": {"noLoadKW": 120.0, "loadKW": 680.0},
        }, "attrs": [{"key": "k", "value": "v"}]});
        let flat = flatten(&doc, "");
        let paths: Vec<&str> = flat.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "ict.powerMVA",
                "ict.losses.noLoadKW",
                "ict.losses.loadKW",
                "attrs[0].key",
                "attrs[0].value",
            ]
        );
    }

    #[test]
    fn nest_flatten_nest_is_idempotent() {
        let flat: Vec<(String, Value)> = vec![
            ("ict.ratedVoltageAtNoLoad.hv".into(), json!(400.0)),
            ("ict.ratedVoltageAtNoLoad.iv".into(), json!(220.0)),
            ("ict.impedanceVoltage[guaranteed][hv_iv]".into(), json!(12.5)),
            ("attrs[0].key".into(), json!("Material")),
            ("attrs[0].value".into(), json!("Copper")),
        ];
        let once = Value::Object(nest(flat));
        let again = Value::Object(nest(flatten(&once, "")));
        assert_eq!(again, once);
    }
}
