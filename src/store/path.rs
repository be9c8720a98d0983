use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::{Result, SpecError};

/// 路径中的一段
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Index(usize),
}

/// JSON 字段路径
///
/// 语法:
/// - `id`
/// - `user.id`
/// - `items[0].id`
/// - `[2].name`（根为数组）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    raw: String,
    segments: Vec<Segment>,
}

impl FieldPath {
    pub fn parse(input: &str) -> Result<Self> {
        let raw = input.trim();
        if raw.is_empty() {
            return Err(SpecError::InvalidPath("empty path".to_string()));
        }

        let invalid = || SpecError::InvalidPath(raw.to_string());
        let mut segments = Vec::new();

        for (i, part) in raw.split('.').enumerate() {
            let (key, mut rest) = match part.find('[') {
                Some(pos) => (&part[..pos], &part[pos..]),
                None => (part, ""),
            };

            if !key.is_empty() {
                segments.push(Segment::Key(key.to_string()));
            } else if i > 0 || rest.is_empty() {
                // 只有首段可以直接以 [n] 开头
                return Err(invalid());
            }

            while !rest.is_empty() {
                let (index, tail) = rest
                    .strip_prefix('[')
                    .and_then(|r| r.split_once(']'))
                    .ok_or_else(invalid)?;
                let index = index.trim().parse::<usize>().map_err(|_| invalid())?;
                segments.push(Segment::Index(index));
                rest = tail;
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// 在 JSON 中查找该路径，不存在返回 None
    pub fn lookup<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        self.segments
            .iter()
            .try_fold(value, |current, segment| match segment {
                Segment::Key(key) => current.get(key.as_str()),
                Segment::Index(index) => current.get(*index),
            })
    }
}

impl FromStr for FieldPath {
    type Err = SpecError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
