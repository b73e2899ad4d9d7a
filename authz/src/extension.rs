//! Typed extension points.
//!
//! Third parties extend resolution by registering an [`Extension`] at
//! engine construction. The aggregator consults the registered list in
//! order after the built-in sources, so extension values fill gaps but
//! never override explicit, inherited, or policy-derived settings.

use options::OptionMap;
use resource::ObjectRef;
use subject::Principal;

pub trait Extension: Send + Sync {
    /// A short name used in diagnostics.
    fn name(&self) -> &str;

    /// Contribute options for one resolution. Return `None` to contribute
    /// nothing for this `(principal, object)`.
    fn on_resolve(&self, principal: &Principal, object: &ObjectRef) -> Option<OptionMap>;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use options::OptionValue;
    use resource::ObjectKind;

    /// Contributes a fixed key for one object kind.
    pub struct FixedExtension {
        pub kind: ObjectKind,
        pub key: &'static str,
        pub value: OptionValue,
    }

    impl Extension for FixedExtension {
        fn name(&self) -> &str {
            "fixed"
        }

        fn on_resolve(&self, _principal: &Principal, object: &ObjectRef) -> Option<OptionMap> {
            if object.kind != self.kind {
                return None;
            }
            let mut map = OptionMap::new();
            map.insert(self.key.to_string(), self.value.clone());
            Some(map)
        }
    }
}
