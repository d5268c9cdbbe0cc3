//! Macros for declaring record fields.

/// Declare a [`Field`](crate::core::Field) descriptor for a struct member.
///
/// Expands to a `const`-friendly descriptor whose name is the member's
/// identifier and whose accessor borrows that member.
///
/// # Example
///
/// ```
/// use fieldflow::core::Field;
/// use fieldflow::field;
///
/// struct Profile {
///     nickname: String,
/// }
///
/// impl Profile {
///     const NICKNAME: Field<Self, String> = field!(Profile, nickname);
/// }
///
/// let profile = Profile { nickname: "kit".to_string() };
/// assert_eq!(Profile::NICKNAME.name(), "nickname");
/// assert_eq!(Profile::NICKNAME.get(&profile), "kit");
/// ```
#[macro_export]
macro_rules! field {
    ($record:ty, $member:ident) => {
        $crate::core::Field::<$record, _>::new(stringify!($member), |record: &$record| {
            &record.$member
        })
    };
}

#[cfg(test)]
mod tests {
    use crate::core::Field;

    struct Point {
        x: i32,
        label: &'static str,
    }

    const X: Field<Point, i32> = field!(Point, x);
    const LABEL: Field<Point, &'static str> = field!(Point, label);

    #[test]
    fn field_macro_generates_descriptor() {
        let point = Point {
            x: 3,
            label: "origin",
        };

        assert_eq!(X.name(), "x");
        assert_eq!(*X.get(&point), 3);
        assert_eq!(LABEL.name(), "label");
        assert_eq!(*LABEL.get(&point), "origin");
    }
}
