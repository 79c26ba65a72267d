//! Drink customization options and quantity handling.
//!
//! Option values are stored in the `item` table as their display labels,
//! so `label()` / `parse()` are the persistence format too.

use serde::{Deserialize, Serialize};

macro_rules! labelled_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }

            /// Parse a form / column value. Blank input maps to the first
            /// variant; unknown labels are rejected.
            pub fn parse(raw: &str) -> Option<Self> {
                let t = raw.trim();
                if t.is_empty() {
                    return Some(Self::ALL[0]);
                }
                Self::ALL.iter().copied().find(|v| v.label() == t)
            }
        }
    };
}

labelled_enum!(
    /// Cup size.
    Size {
        Medium => "中杯",
        Large => "大杯",
    }
);

labelled_enum!(
    /// Ice level.
    Ice {
        Normal => "正常冰",
        Less => "少冰",
        Light => "微冰",
        NoIce => "去冰",
        Warm => "溫",
        Hot => "熱",
    }
);

labelled_enum!(
    /// Sweetness level.
    Sweetness {
        Normal => "正常糖",
        Less => "少糖",
        Half => "半糖",
        Light => "微糖",
        SugarFree => "無糖",
    }
);

labelled_enum!(
    Topping {
        Plain => "無",
        Pearl => "珍珠",
        NataDeCoco => "椰果",
        GrassJelly => "仙草",
        Pudding => "布丁",
    }
);

/// One complete set of customizations for a line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemOptions {
    pub size: Size,
    pub ice: Ice,
    pub sweet: Sweetness,
    pub topping: Topping,
}

impl ItemOptions {
    /// Parse all four option fields, naming the first field that failed.
    pub fn parse(size: &str, ice: &str, sweet: &str, topping: &str) -> Result<Self, &'static str> {
        Ok(ItemOptions {
            size: Size::parse(size).ok_or("size")?,
            ice: Ice::parse(ice).ok_or("ice")?,
            sweet: Sweetness::parse(sweet).ok_or("sweet")?,
            topping: Topping::parse(topping).ok_or("topping")?,
        })
    }
}

/// What a submitted quantity means for an existing line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
    Set(i32),
    Delete,
}

impl QuantityChange {
    pub fn from_quantity(q: i32) -> Self {
        if q <= 0 {
            QuantityChange::Delete
        } else {
            QuantityChange::Set(q)
        }
    }
}

/// Parse a quantity form field. Blank means 1; anything non-integer is `None`.
pub fn parse_quantity(raw: &str) -> Option<i32> {
    let t = raw.trim();
    if t.is_empty() {
        return Some(1);
    }
    t.parse::<i32>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_options_default_to_first_variant() {
        let o = ItemOptions::parse("", " ", "", "").unwrap();
        assert_eq!(o.size, Size::Medium);
        assert_eq!(o.ice, Ice::Normal);
        assert_eq!(o.sweet, Sweetness::Normal);
        assert_eq!(o.topping, Topping::Plain);
    }

    #[test]
    fn unknown_option_names_the_field() {
        assert_eq!(ItemOptions::parse("大杯", "冰沙", "", ""), Err("ice"));
    }

    #[test]
    fn quantity_parsing() {
        assert_eq!(parse_quantity("3"), Some(3));
        assert_eq!(parse_quantity(" -2 "), Some(-2));
        assert_eq!(parse_quantity(""), Some(1));
        assert_eq!(parse_quantity("three"), None);
    }
}
