//! Fitted label encoder.
//!
//! Classes are stored sorted and unique; `classes[i]` encodes to `i`. That is the
//! same dense coding the encoders were fitted with, so codes line up with the
//! model's reference rows.

use serde::{Deserialize, Serialize};

use crate::encoding::EncodeError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
    /// Trained sentinel for values outside `classes` (must itself be a class).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    unknown_label: Option<String>,
}

impl LabelEncoder {
    /// Build an encoder over the distinct labels in `labels`.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut classes: Vec<String> = labels.into_iter().map(Into::into).collect();
        classes.sort();
        classes.dedup();
        Self {
            classes,
            unknown_label: None,
        }
    }

    /// Register `label` as the unknown sentinel, adding it as a class if needed.
    pub fn with_unknown_label(mut self, label: impl Into<String>) -> Self {
        let label = label.into();
        if let Err(pos) = self.classes.binary_search(&label) {
            self.classes.insert(pos, label.clone());
        }
        self.unknown_label = Some(label);
        self
    }

    /// Check the invariants a deserialized encoder must hold.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(w) = self.classes.windows(2).find(|w| w[0] >= w[1]) {
            return Err(format!(
                "classes must be sorted and unique (found '{}' before '{}')",
                w[0], w[1]
            ));
        }
        if let Some(unknown) = &self.unknown_label {
            if !self.contains(unknown) {
                return Err(format!("unknown_label '{unknown}' is not one of the classes"));
            }
        }
        Ok(())
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn unknown_label(&self) -> Option<&str> {
        self.unknown_label.as_deref()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.code(label).is_some()
    }

    /// Integer code of a known label.
    pub fn code(&self, label: &str) -> Option<i64> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(label))
            .ok()
            .map(|i| i as i64)
    }

    /// Label for a code.
    pub fn label(&self, code: i64) -> Option<&str> {
        usize::try_from(code)
            .ok()
            .and_then(|i| self.classes.get(i))
            .map(String::as_str)
    }

    /// Encode labels, failing on the first one that is not a known class.
    pub fn transform<S: AsRef<str>>(&self, column: &'static str, labels: &[S]) -> Result<Vec<i64>, EncodeError> {
        labels
            .iter()
            .map(|label| {
                let label = label.as_ref();
                self.code(label).ok_or_else(|| EncodeError::Unseen {
                    column,
                    label: label.to_string(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classes_are_sorted_and_coded_densely() {
        let enc = LabelEncoder::from_labels(["TX", "CA", "NY", "CA"]);
        assert_eq!(enc.classes(), ["CA", "NY", "TX"]);
        assert_eq!(enc.code("CA"), Some(0));
        assert_eq!(enc.code("TX"), Some(2));
        assert_eq!(enc.code("WA"), None);
        assert_eq!(enc.label(1), Some("NY"));
        assert_eq!(enc.label(-1), None);
    }

    #[test]
    fn transform_rejects_unseen() {
        let enc = LabelEncoder::from_labels(["No", "Yes"]);
        assert_eq!(enc.transform("Tobacco", &["Yes", "No"]).unwrap(), vec![1, 0]);
        let err = enc.transform("Tobacco", &["Maybe"]).unwrap_err();
        assert_eq!(
            err,
            EncodeError::Unseen {
                column: "Tobacco",
                label: "Maybe".into()
            }
        );
    }

    #[test]
    fn validate_catches_unsorted_classes_and_stray_sentinel() {
        let enc: LabelEncoder = serde_json::from_str(r#"{"classes":["b","a"]}"#).unwrap();
        assert!(enc.validate().unwrap_err().contains("sorted"));

        let enc: LabelEncoder =
            serde_json::from_str(r#"{"classes":["a","b"],"unknown_label":"zz"}"#).unwrap();
        assert!(enc.validate().unwrap_err().contains("zz"));

        let enc = LabelEncoder::from_labels(["b", "a"]).with_unknown_label("__unknown__");
        assert!(enc.validate().is_ok());
        assert_eq!(enc.classes()[0], "__unknown__");
    }
}
