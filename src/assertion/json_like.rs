use serde_json::Value;

use crate::assertion::types::AssertError;

/// 结构子集匹配
///
/// - expected 中的每个 key 都必须出现在 actual 中且值匹配，actual 多出的 key 忽略
/// - 对象递归同样的规则
/// - 数组：expected 的每个元素都要匹配 actual 中一个不同的元素（与顺序无关），
///   expected 比 actual 长时直接失败
/// - 数字按数值比较（2500 与 2500.0 相等），整数之间不经过 f64
pub fn json_like(expected: &Value, actual: &Value) -> Result<(), AssertError> {
    like_at("$", expected, actual)
}

fn like_at(path: &str, expected: &Value, actual: &Value) -> Result<(), AssertError> {
    match (expected, actual) {
        (Value::Object(expected_map), Value::Object(actual_map)) => {
            for (key, expected_value) in expected_map {
                let child = format!("{}.{}", path, key);
                match actual_map.get(key) {
                    Some(actual_value) => like_at(&child, expected_value, actual_value)?,
                    None => return Err(mismatch(child, expected_value, None)),
                }
            }
            Ok(())
        }

        (Value::Array(expected_items), Value::Array(actual_items)) => {
            if expected_items.len() > actual_items.len() {
                return Err(mismatch(path.to_string(), expected, Some(actual)));
            }

            // candidates[i] 为能匹配 expected[i] 的 actual 下标
            let candidates: Vec<Vec<usize>> = expected_items
                .iter()
                .enumerate()
                .map(|(index, expected_item)| {
                    let child = format!("{}[{}]", path, index);
                    actual_items
                        .iter()
                        .enumerate()
                        .filter(|(_, actual_item)| like_at(&child, expected_item, actual_item).is_ok())
                        .map(|(actual_index, _)| actual_index)
                        .collect()
                })
                .collect();

            // 每个 actual 元素最多被一个 expected 元素使用
            let mut owner: Vec<Option<usize>> = vec![None; actual_items.len()];
            for (index, expected_item) in expected_items.iter().enumerate() {
                let mut visited = vec![false; actual_items.len()];
                if assign(index, &candidates, &mut owner, &mut visited) {
                    continue;
                }

                let child = format!("{}[{}]", path, index);
                // 报告同位置元素的具体差异，便于定位
                return Err(match actual_items.get(index) {
                    Some(actual_item) => like_at(&child, expected_item, actual_item)
                        .err()
                        .unwrap_or_else(|| mismatch(child, expected_item, Some(actual_item))),
                    None => mismatch(child, expected_item, None),
                });
            }
            Ok(())
        }

        (Value::Number(a), Value::Number(b)) => {
            if numbers_equal(a, b) {
                Ok(())
            } else {
                Err(mismatch(path.to_string(), expected, Some(actual)))
            }
        }

        _ if expected == actual => Ok(()),

        _ => Err(mismatch(path.to_string(), expected, Some(actual))),
    }
}

/// 为 expected[index] 寻找一个未占用的 actual 元素，必要时让出已有的分配
fn assign(
    index: usize,
    candidates: &[Vec<usize>],
    owner: &mut [Option<usize>],
    visited: &mut [bool],
) -> bool {
    for &actual_index in &candidates[index] {
        if visited[actual_index] {
            continue;
        }
        visited[actual_index] = true;

        let free = match owner[actual_index] {
            None => true,
            Some(other) => assign(other, candidates, owner, visited),
        };
        if free {
            owner[actual_index] = Some(index);
            return true;
        }
    }
    false
}

/// 整数按整数比较，只有一侧是浮点数时才退回 f64
fn numbers_equal(a: &serde_json::Number, b: &serde_json::Number) -> bool {
    if a.is_f64() || b.is_f64() {
        return a.as_f64() == b.as_f64();
    }
    match (a.as_i64(), b.as_i64()) {
        (Some(x), Some(y)) => x == y,
        _ => a.as_u64().is_some() && a.as_u64() == b.as_u64(),
    }
}

fn mismatch(path: String, expected: &Value, actual: Option<&Value>) -> AssertError {
    AssertError::JsonMismatch {
        path,
        expected: expected.clone(),
        actual: actual.cloned(),
    }
}
