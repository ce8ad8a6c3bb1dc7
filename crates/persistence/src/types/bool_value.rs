//! Tri-state boolean.

/// A boolean that may also be unset.
///
/// Project flags use this type because "unset" and "false" gate record
/// mutations differently: an update is blocked only by an explicit `False`,
/// while a delete is allowed only by an explicit `True`.
///
/// # Examples
///
/// ```
/// use auditum_persistence::types::BoolValue;
///
/// assert!(BoolValue::Unset.is_unset());
/// assert!(!BoolValue::Unset.is_false());
/// assert_eq!(BoolValue::from(Some(true)), BoolValue::True);
/// assert_eq!(Option::<bool>::from(BoolValue::Unset), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BoolValue {
    /// No value provided.
    #[default]
    Unset,
    /// Explicitly true.
    True,
    /// Explicitly false.
    False,
}

impl BoolValue {
    /// Returns `true` only for an explicit `True`.
    pub fn is_true(self) -> bool {
        self == BoolValue::True
    }

    /// Returns `true` only for an explicit `False`.
    pub fn is_false(self) -> bool {
        self == BoolValue::False
    }

    /// Returns `true` when no value was provided.
    pub fn is_unset(self) -> bool {
        self == BoolValue::Unset
    }

    /// Returns the value as an optional boolean, the shape of a nullable column.
    pub fn to_option(self) -> Option<bool> {
        self.into()
    }
}

impl From<bool> for BoolValue {
    fn from(value: bool) -> Self {
        if value {
            BoolValue::True
        } else {
            BoolValue::False
        }
    }
}

impl From<Option<bool>> for BoolValue {
    fn from(value: Option<bool>) -> Self {
        value.map_or(BoolValue::Unset, BoolValue::from)
    }
}

impl From<BoolValue> for Option<bool> {
    fn from(value: BoolValue) -> Self {
        match value {
            BoolValue::Unset => None,
            BoolValue::True => Some(true),
            BoolValue::False => Some(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unset() {
        assert_eq!(BoolValue::default(), BoolValue::Unset);
    }

    #[test]
    fn test_unset_is_neither_true_nor_false() {
        let value = BoolValue::Unset;
        assert!(!value.is_true());
        assert!(!value.is_false());
        assert_eq!(value.to_option(), None);
    }

    #[test]
    fn test_option_conversions() {
        for option in [None, Some(true), Some(false)] {
            assert_eq!(BoolValue::from(option).to_option(), option);
        }
        assert!(BoolValue::from(false).is_false());
        assert!(BoolValue::from(true).is_true());
    }
}
