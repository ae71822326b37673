use std::path::PathBuf;

use super::{FieldKind, Settings};

/// A type that can sit in a settings field.
///
/// Scalars overwrite; settings nodes merge recursively. Implemented for the
/// primitive scalars here, for nodes by [`settings!`](crate::settings), and
/// for further scalars with [`impl_scalar!`](crate::impl_scalar).
pub trait Merge: Sized {
    const KIND: FieldKind;

    /// Merges `incoming` into the field slot `slot`. Absent incoming values
    /// leave the slot untouched.
    fn merge_into(slot: &mut Option<Self>, incoming: Option<Self>);
}

/// Overwrites `slot` when `incoming` is present.
pub fn merge_scalar<T>(slot: &mut Option<T>, incoming: Option<T>) {
    if let Some(value) = incoming {
        *slot = Some(value);
    }
}

/// Recursively merges a present `incoming` node into `slot`.
///
/// When the slot is empty a fresh `T::default()` becomes the merge target, so
/// fields set only by `incoming` still surface.
pub fn merge_nested<T: Settings>(slot: &mut Option<T>, incoming: Option<T>) {
    let Some(incoming) = incoming else {
        return;
    };
    let base = slot.take().unwrap_or_default();
    *slot = Some(base.override_with(Some(incoming)));
}

/// Merges `incoming` on top of `base`. See [`Settings::override_with`].
pub fn override_settings<T: Settings>(base: T, incoming: Option<T>) -> T {
    base.override_with(incoming)
}

crate::impl_scalar!(Text => String, PathBuf);
crate::impl_scalar!(Bool => bool);
crate::impl_scalar!(Integer => i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
crate::impl_scalar!(Float => f32, f64);
crate::impl_scalar!(TextList => Vec<String>, Vec<PathBuf>);

#[cfg(test)]
mod tests {
    use super::*;

    crate::settings! {
        #[derive(Debug, Default, Clone, PartialEq)]
        pub struct Farm {
            pub name: String,
            pub location: String,
        }
    }

    /// A node whose `Default` carries a domain value instead of being empty.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Site {
        pub region: Option<String>,
        pub rack: Option<String>,
    }

    impl Default for Site {
        fn default() -> Self {
            Self {
                region: Some("unset".into()),
                rack: None,
            }
        }
    }

    impl Settings for Site {
        const FIELDS: &'static [crate::FieldInfo] = &[
            crate::FieldInfo {
                name: "region",
                kind: <String as Merge>::KIND,
            },
            crate::FieldInfo {
                name: "rack",
                kind: <String as Merge>::KIND,
            },
        ];

        fn merge_fields(&mut self, incoming: Self) {
            merge_scalar(&mut self.region, incoming.region);
            merge_scalar(&mut self.rack, incoming.rack);
        }

        fn present_fields(&self) -> Vec<&'static str> {
            let mut present = Vec::new();
            if self.region.is_some() {
                present.push("region");
            }
            if self.rack.is_some() {
                present.push("rack");
            }
            present
        }
    }

    impl Merge for Site {
        const KIND: FieldKind = FieldKind::Nested(<Site as Settings>::FIELDS);

        fn merge_into(slot: &mut Option<Self>, incoming: Option<Self>) {
            merge_nested(slot, incoming);
        }
    }

    crate::settings! {
        #[derive(Debug, Default, Clone, PartialEq)]
        pub struct Estate {
            pub owner: String,
            pub farm: Farm,
            pub site: Site,
        }
    }

    fn farm(name: Option<&str>, location: Option<&str>) -> Farm {
        Farm {
            name: name.map(Into::into),
            location: location.map(Into::into),
        }
    }

    fn site(region: Option<&str>, rack: Option<&str>) -> Site {
        Site {
            region: region.map(Into::into),
            rack: rack.map(Into::into),
        }
    }

    #[test]
    fn test_absent_incoming_field_keeps_base() {
        let base = farm(Some("alpha"), Some("east"));
        let merged = base.override_with(Some(farm(None, None)));
        assert_eq!(merged, farm(Some("alpha"), Some("east")));

        let merged = Farm::default().override_with(Some(farm(None, None)));
        assert_eq!(merged, Farm::default());
    }

    #[test]
    fn test_present_incoming_field_overwrites() {
        let base = farm(Some("alpha"), None);
        let merged = base.override_with(Some(farm(Some("beta"), Some(""))));
        assert_eq!(merged, farm(Some("beta"), Some("")));
    }

    #[test]
    fn test_null_incoming_is_identity() {
        let base = Estate {
            owner: Some("ana".into()),
            farm: Some(farm(Some("alpha"), None)),
            site: None,
        };
        assert_eq!(base.clone().override_with(None), base);
        assert_eq!(override_settings(base.clone(), None), base);
    }

    #[test]
    fn test_nested_fields_merge_recursively() {
        let base = Estate {
            farm: Some(farm(None, Some("east"))),
            ..Default::default()
        };
        let incoming = Estate {
            farm: Some(farm(Some("prod"), None)),
            ..Default::default()
        };
        let merged = override_settings(base, Some(incoming));
        assert_eq!(merged.farm, Some(farm(Some("prod"), Some("east"))));
        assert_eq!(merged.owner, None);
    }

    #[test]
    fn test_nested_absent_on_base_is_created() {
        let incoming = Estate {
            farm: Some(farm(Some("prod"), None)),
            ..Default::default()
        };
        let merged = Estate::default().override_with(Some(incoming));
        assert_eq!(merged.farm, Some(farm(Some("prod"), None)));
    }

    #[test]
    fn test_empty_nested_incoming_creates_empty_node() {
        let incoming = Estate {
            farm: Some(Farm::default()),
            ..Default::default()
        };
        let merged = Estate::default().override_with(Some(incoming));
        assert_eq!(merged.farm, Some(Farm::default()));
    }

    #[test]
    fn test_synthesized_nested_uses_default_impl() {
        let incoming = Estate {
            site: Some(site(None, Some("r9"))),
            ..Default::default()
        };
        let merged = Estate::default().override_with(Some(incoming));
        assert_eq!(merged.site, Some(site(Some("unset"), Some("r9"))));
    }

    #[test]
    fn test_merge_is_not_commutative() {
        let a = farm(Some("alpha"), Some("east"));
        let b = farm(Some("beta"), None);
        let ab = a.clone().override_with(Some(b.clone()));
        let ba = b.override_with(Some(a));
        assert_ne!(ab, ba);
    }

    #[test]
    fn test_chained_merge_is_not_associative() {
        let a = Estate {
            site: Some(site(Some("east"), Some("r1"))),
            ..Default::default()
        };
        let b = Estate::default();
        let c = Estate {
            site: Some(site(None, Some("r9"))),
            ..Default::default()
        };

        let left = a
            .clone()
            .override_with(Some(b.clone()))
            .override_with(Some(c.clone()));
        let right = a.override_with(Some(b.override_with(Some(c))));

        assert_eq!(left.site, Some(site(Some("east"), Some("r9"))));
        assert_eq!(right.site, Some(site(Some("unset"), Some("r9"))));
    }

    #[test]
    fn test_vec_fields_replace_wholesale() {
        let mut slot = Some(vec!["a".to_string(), "b".to_string()]);
        <Vec<String> as Merge>::merge_into(&mut slot, Some(vec!["c".to_string()]));
        assert_eq!(slot, Some(vec!["c".to_string()]));

        <Vec<String> as Merge>::merge_into(&mut slot, None);
        assert_eq!(slot, Some(vec!["c".to_string()]));
    }
}
