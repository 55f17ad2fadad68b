//! Material descriptions handed from a material function to a back-end.
//!
//! A description is an ordered list of `(kind, parameters)` entries, for
//! example `Steel01(Fy, E, b)` followed by `Elastic(E2)`. Entries act in
//! parallel: their forces and tangents add up.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Parameters of one material entry: a single value or an ordered tuple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MaterialParams {
    Scalar(f64),
    Tuple(Vec<f64>),
}

impl MaterialParams {
    pub fn values(&self) -> &[f64] {
        match self {
            MaterialParams::Scalar(value) => std::slice::from_ref(value),
            MaterialParams::Tuple(values) => values,
        }
    }
}

impl From<f64> for MaterialParams {
    fn from(value: f64) -> Self {
        MaterialParams::Scalar(value)
    }
}

impl From<Vec<f64>> for MaterialParams {
    fn from(values: Vec<f64>) -> Self {
        MaterialParams::Tuple(values)
    }
}

impl<const N: usize> From<[f64; N]> for MaterialParams {
    fn from(values: [f64; N]) -> Self {
        MaterialParams::Tuple(values.to_vec())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialEntry {
    pub kind: String,
    pub params: MaterialParams,
}

/// Ordered mapping from material kind to parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaterialDescription {
    entries: Vec<MaterialEntry>,
}

impl MaterialDescription {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`push`](Self::push).
    pub fn with(mut self, kind: impl Into<String>, params: impl Into<MaterialParams>) -> Self {
        self.push(kind, params);
        self
    }

    pub fn push(&mut self, kind: impl Into<String>, params: impl Into<MaterialParams>) {
        self.entries.push(MaterialEntry {
            kind: kind.into(),
            params: params.into(),
        });
    }

    pub fn entries(&self) -> &[MaterialEntry] {
        &self.entries
    }

    /// Parameters of the first entry of the given kind.
    pub fn get(&self, kind: &str) -> Option<&MaterialParams> {
        self.entries
            .iter()
            .find(|entry| entry.kind == kind)
            .map(|entry| &entry.params)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for MaterialDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, " + ")?;
            }
            write!(f, "{}(", entry.kind)?;
            for (j, value) in entry.params.values().iter().enumerate() {
                if j > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{value}")?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_declaration_order_and_formats_compactly() {
        let description = MaterialDescription::new()
            .with("Steel01", [4.9e6, 157_913.67, 0.02])
            .with("Elastic", 1.0);

        assert_eq!(description.len(), 2);
        assert_eq!(description.entries()[0].kind, "Steel01");
        assert_eq!(description.get("Elastic").unwrap().values(), &[1.0]);
        assert_eq!(
            description.to_string(),
            "Steel01(4900000, 157913.67, 0.02) + Elastic(1)"
        );
    }

    #[test]
    fn serializes_scalars_and_tuples_untagged() {
        let description = MaterialDescription::new()
            .with("Steel01", [300.0, 2.0e5, 0.0])
            .with("Elastic", 10.0);
        let json = serde_json::to_string(&description).unwrap();
        assert_eq!(
            json,
            r#"[{"kind":"Steel01","params":[300.0,200000.0,0.0]},{"kind":"Elastic","params":10.0}]"#
        );
        let back: MaterialDescription = serde_json::from_str(&json).unwrap();
        assert_eq!(back, description);
    }
}
