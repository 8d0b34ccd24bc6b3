use std::collections::HashMap;

use crate::error::PredictError;

/// A fixed string→code lookup table for one categorical column, loaded
/// read-only from a pre-built artifact.
///
/// The on-disk form is the class list in code order: the code of a class is
/// its position in the list, matching how the encoders were exported by the
/// training side.
#[derive(Debug)]
pub struct CategoryEncoder {
    /// Column name, used in error messages and artifact cross-checks
    field: &'static str,
    /// Classes in code order as exported
    classes: Vec<String>,
    /// Reverse index: class → code
    index: HashMap<String, i64>,
}

impl CategoryEncoder {
    /// Build an encoder from a class list in code order.
    ///
    /// Returns a reason string on a malformed list (empty, or containing
    /// duplicates); the caller attaches the artifact path.
    pub fn from_classes(field: &'static str, classes: Vec<String>) -> Result<Self, String> {
        if classes.is_empty() {
            return Err(format!("{field} encoder has no classes"));
        }

        let mut index = HashMap::with_capacity(classes.len());
        for (code, class) in classes.iter().enumerate() {
            if index.insert(class.clone(), code as i64).is_some() {
                return Err(format!("{field} encoder lists {class:?} more than once"));
            }
        }

        Ok(Self {
            field,
            classes,
            index,
        })
    }

    /// Map a category string to its integer code.
    ///
    /// Values the form presents always come from [`Self::classes`], so this
    /// can only fail for callers that bypass the form.
    pub fn encode(&self, value: &str) -> Result<i64, PredictError> {
        self.index
            .get(value)
            .copied()
            .ok_or_else(|| PredictError::UnknownCategory {
                field: self.field,
                value: value.to_string(),
            })
    }

    /// Column name this encoder belongs to.
    pub fn field(&self) -> &'static str {
        self.field
    }

    /// Classes in code order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Classes in display order for dropdowns.
    pub fn sorted_classes(&self) -> Vec<&str> {
        let mut sorted: Vec<&str> = self.classes.iter().map(String::as_str).collect();
        sorted.sort_unstable();
        sorted
    }

    /// Number of known classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crop_encoder() -> CategoryEncoder {
        let classes = vec![
            "Wheat".to_string(),
            "Rice".to_string(),
            "Maize".to_string(),
        ];
        CategoryEncoder::from_classes("Crop", classes).expect("Should build encoder")
    }

    #[test]
    fn test_codes_are_list_positions() {
        let enc = crop_encoder();
        assert_eq!(enc.encode("Wheat").unwrap(), 0);
        assert_eq!(enc.encode("Rice").unwrap(), 1);
        assert_eq!(enc.encode("Maize").unwrap(), 2);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let enc = crop_encoder();
        for _ in 0..3 {
            assert_eq!(enc.encode("Rice").unwrap(), 1, "Code must be stable across calls");
        }
    }

    #[test]
    fn test_unknown_category_fails_with_field_name() {
        let enc = crop_encoder();
        let err = enc.encode("Barley").unwrap_err();
        match err {
            PredictError::UnknownCategory { field, value } => {
                assert_eq!(field, "Crop");
                assert_eq!(value, "Barley");
            }
            other => panic!("Expected UnknownCategory, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_classes_rejected() {
        let classes = vec!["Rice".to_string(), "Rice".to_string()];
        let err = CategoryEncoder::from_classes("Crop", classes).unwrap_err();
        assert!(err.contains("more than once"), "Unexpected reason: {err}");
    }

    #[test]
    fn test_empty_class_list_rejected() {
        let err = CategoryEncoder::from_classes("Season", Vec::new()).unwrap_err();
        assert!(err.contains("no classes"), "Unexpected reason: {err}");
    }

    #[test]
    fn test_sorted_classes_for_display() {
        let enc = crop_encoder();
        assert_eq!(enc.sorted_classes(), vec!["Maize", "Rice", "Wheat"]);
        // Display order must not disturb code order
        assert_eq!(enc.encode("Wheat").unwrap(), 0);
    }
}
